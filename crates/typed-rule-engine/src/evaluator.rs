//! 规则评估器
//!
//! [`Evaluator`] 在构建时针对根类型 `T` 编译全部规则并按规则身份缓存结果
//! （包括编译错误），之后可被多个线程并发调用。
//! [`DynamicEvaluator`] 面向只在运行时才知道形状的对象，每次调用都按实例形状重新编译。

use crate::compiler::{CompiledPredicate, PredicateCompiler};
use crate::config::EngineConfig;
use crate::error::{Result, RuleError};
use crate::models::{Explanation, Rule};
use crate::operators::OperatorRegistry;
use crate::shape::{Describe, Inspect, Shape};
use crate::validator::Validator;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// 评估器构建选项
#[derive(Debug, Clone, Default)]
pub struct EvaluatorOptions {
    pub registry: Arc<OperatorRegistry>,
    pub config: EngineConfig,
}

impl EvaluatorOptions {
    pub fn with_registry(registry: OperatorRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            config: EngineConfig::default(),
        }
    }
}

/// 按规则身份缓存的编译结果
struct PredicateCache {
    compiler: PredicateCompiler,
    rules: Vec<Arc<Rule>>,
    predicates: HashMap<usize, Result<CompiledPredicate>>,
}

impl PredicateCache {
    #[instrument(skip_all, fields(root_type = %shape.name(), rules = rules.len()))]
    fn build(shape: Shape, rules: Vec<Arc<Rule>>, options: &EvaluatorOptions) -> Self {
        let compiler = PredicateCompiler::new(shape, Arc::clone(&options.registry));
        let validator = options
            .config
            .validate_on_build
            .then(|| Validator::with_registry(&options.registry));

        let mut predicates = HashMap::with_capacity(rules.len());
        for rule in &rules {
            // 同一个 Arc 出现多次时只编译一次
            if predicates.contains_key(&rule.identity()) {
                continue;
            }

            if let Some(validator) = &validator {
                for problem in validator.validate(rule) {
                    warn!(rule_name = %rule.name, "规则校验未通过: {}", problem);
                }
            }

            let compiled = compiler.compile(rule);
            if let Err(e) = &compiled {
                warn!(rule_name = %rule.name, error = %e, "规则编译失败");
            }
            predicates.insert(rule.identity(), compiled);
        }

        debug!("已编译 {} 条规则", predicates.len());

        Self {
            compiler,
            rules,
            predicates,
        }
    }

    /// 按规则顺序返回第一个编译错误
    fn first_error(&self) -> Option<RuleError> {
        self.rules.iter().find_map(|rule| {
            self.predicates
                .get(&rule.identity())
                .and_then(|compiled| compiled.as_ref().err().cloned())
        })
    }

    fn build_checked(shape: Shape, rules: Vec<Arc<Rule>>, options: &EvaluatorOptions) -> Result<Self> {
        let cache = Self::build(shape, rules, options);
        if options.config.strict_compile {
            if let Some(e) = cache.first_error() {
                return Err(e);
            }
        }
        Ok(cache)
    }

    fn matches_rule(&self, instance: &dyn Inspect, rule: &Rule) -> Result<bool> {
        match self.predicates.get(&rule.identity()) {
            Some(compiled) => compiled
                .as_ref()
                .map(|predicate| predicate.evaluate(instance))
                .map_err(Clone::clone),
            None => {
                debug!(rule_name = %rule.name, "规则不在缓存中，临时编译");
                Ok(self.compiler.compile(rule)?.evaluate(instance))
            }
        }
    }

    fn get_matching_rules(&self, instance: &dyn Inspect) -> Result<Vec<Arc<Rule>>> {
        let mut matched = Vec::new();
        for rule in &self.rules {
            if self.matches_rule(instance, rule)? {
                matched.push(Arc::clone(rule));
            }
        }
        Ok(matched)
    }

    fn explain(&self, instance: &dyn Inspect, rule: &Rule) -> Result<Explanation> {
        match self.predicates.get(&rule.identity()) {
            Some(Ok(predicate)) => Ok(predicate.explain(instance)),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(self.compiler.compile(rule)?.explain(instance)),
        }
    }
}

/// 针对根类型 `T` 的类型化评估器
///
/// 构建后不可变，`Send + Sync`，可通过 `Arc` 在线程间共享。
pub struct Evaluator<T> {
    cache: PredicateCache,
    _root: PhantomData<fn(&T)>,
}

impl<T: Describe> Evaluator<T> {
    /// 使用内置操作符和默认配置构建，编译错误延迟到评估时返回
    pub fn new(rules: impl IntoIterator<Item = Arc<Rule>>) -> Self {
        Self {
            cache: PredicateCache::build(
                T::describe(),
                rules.into_iter().collect(),
                &EvaluatorOptions::default(),
            ),
            _root: PhantomData,
        }
    }

    /// 使用指定注册表和配置构建；`strict_compile` 时遇到第一个编译错误即失败
    pub fn with_options(
        rules: impl IntoIterator<Item = Arc<Rule>>,
        options: EvaluatorOptions,
    ) -> Result<Self> {
        Ok(Self {
            cache: PredicateCache::build_checked(
                T::describe(),
                rules.into_iter().collect(),
                &options,
            )?,
            _root: PhantomData,
        })
    }

    /// 判断实例是否满足规则
    ///
    /// 实例缺失时返回 false；规则编译失败时返回缓存的编译错误。
    /// 不在规则集中的规则会被临时编译，结果不缓存。
    pub fn matches_rule(&self, instance: Option<&T>, rule: &Rule) -> Result<bool> {
        let Some(instance) = instance else {
            return Ok(false);
        };
        self.cache.matches_rule(instance, rule)
    }

    /// 按构建时的顺序返回所有匹配的规则
    ///
    /// 实例缺失时返回空列表；遇到编译失败的规则时整个调用失败。
    pub fn get_matching_rules(&self, instance: Option<&T>) -> Result<Vec<Arc<Rule>>> {
        let Some(instance) = instance else {
            return Ok(Vec::new());
        };
        self.cache.get_matching_rules(instance)
    }

    /// 逐条评估规则的所有条件
    pub fn explain(&self, instance: &T, rule: &Rule) -> Result<Explanation> {
        self.cache.explain(instance, rule)
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.cache.rules
    }

    pub fn len(&self) -> usize {
        self.cache.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.rules.is_empty()
    }
}

/// 运行时形状的评估器
///
/// 每次调用都以实例的 [`Inspect::shape`] 为根类型重新编译全部规则，适用于 JSON 文档等
/// 形状随实例变化的对象。需要重复评估同一类型时应使用 [`Evaluator`]。
pub struct DynamicEvaluator {
    rules: Vec<Arc<Rule>>,
    options: EvaluatorOptions,
}

impl DynamicEvaluator {
    pub fn new(rules: impl IntoIterator<Item = Arc<Rule>>) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            options: EvaluatorOptions::default(),
        }
    }

    pub fn with_options(
        rules: impl IntoIterator<Item = Arc<Rule>>,
        options: EvaluatorOptions,
    ) -> Self {
        Self {
            rules: rules.into_iter().collect(),
            options,
        }
    }

    fn cache_for(&self, instance: &dyn Inspect) -> Result<PredicateCache> {
        PredicateCache::build_checked(instance.shape(), self.rules.clone(), &self.options)
    }

    pub fn matches_rule(&self, instance: Option<&dyn Inspect>, rule: &Rule) -> Result<bool> {
        let Some(instance) = instance else {
            return Ok(false);
        };
        self.cache_for(instance)?.matches_rule(instance, rule)
    }

    pub fn get_matching_rules(&self, instance: Option<&dyn Inspect>) -> Result<Vec<Arc<Rule>>> {
        let Some(instance) = instance else {
            return Ok(Vec::new());
        };
        self.cache_for(instance)?.get_matching_rules(instance)
    }

    pub fn explain(&self, instance: &dyn Inspect, rule: &Rule) -> Result<Explanation> {
        self.cache_for(instance)?.explain(instance, rule)
    }

    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
