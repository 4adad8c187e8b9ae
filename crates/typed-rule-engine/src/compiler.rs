//! 规则编译器
//!
//! 针对固定的根类型形状，把规则的每个条件解析为访问链加类型化比较，
//! 再按声明顺序用 AND 组合。同一规则对不同根类型需要分别编译。

use crate::error::Result;
use crate::models::{Criterion, CriterionOutcome, Explanation, Rule};
use crate::operators::{OperatorRegistry, TypedComparison};
use crate::path::{AccessorChain, PropertyResolver};
use crate::shape::{Inspect, Shape};
use std::sync::Arc;

/// 编译后的条件
#[derive(Debug, Clone)]
pub struct CompiledCriterion {
    /// 原始条件（用于诊断）
    pub criterion: Criterion,
    accessor: AccessorChain,
    comparison: TypedComparison,
}

impl CompiledCriterion {
    pub fn comparison(&self) -> &TypedComparison {
        &self.comparison
    }

    /// 常量比较不读取实例
    pub fn evaluate(&self, instance: &dyn Inspect) -> bool {
        if let Some(result) = self.comparison.as_constant() {
            return result;
        }

        let value = self.accessor.read(instance);
        self.comparison.test(&value)
    }
}

/// 编译后的谓词
///
/// 不可变，可被多个线程并发读取。
#[derive(Debug, Clone)]
pub struct CompiledPredicate {
    rule_name: String,
    root_type: String,
    criteria: Vec<CompiledCriterion>,
}

impl CompiledPredicate {
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    pub fn criteria(&self) -> &[CompiledCriterion] {
        &self.criteria
    }

    /// 短路 AND；没有条件时恒为 true
    pub fn evaluate(&self, instance: &dyn Inspect) -> bool {
        self.criteria.iter().all(|c| c.evaluate(instance))
    }

    /// 评估所有条件并记录每条的结果
    pub fn explain(&self, instance: &dyn Inspect) -> Explanation {
        let mut explanation = Explanation::new(self.rule_name.clone());

        for compiled in &self.criteria {
            explanation.outcomes.push(CriterionOutcome {
                criterion: compiled.criterion.to_string(),
                matched: compiled.evaluate(instance),
            });
        }

        explanation.matched = explanation.outcomes.iter().all(|o| o.matched);
        explanation
    }
}

/// 谓词编译器，绑定一个根类型形状和一个操作符注册表
pub struct PredicateCompiler {
    shape: Shape,
    registry: Arc<OperatorRegistry>,
}

impl PredicateCompiler {
    pub fn new(shape: Shape, registry: Arc<OperatorRegistry>) -> Self {
        Self { shape, registry }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// 编译规则，任一条件失败即整条规则失败
    pub fn compile(&self, rule: &Rule) -> Result<CompiledPredicate> {
        let criteria = rule
            .criteria
            .iter()
            .map(|criterion| self.compile_criterion(criterion))
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledPredicate {
            rule_name: rule.name.clone(),
            root_type: self.shape.name().to_string(),
            criteria,
        })
    }

    /// 编译单个条件：先查操作符，再解析路径，最后构建比较
    pub fn compile_criterion(&self, criterion: &Criterion) -> Result<CompiledCriterion> {
        let strategy = self.registry.strategy(&criterion.operator)?;
        let property = PropertyResolver::resolve(&self.shape, &criterion.property_path)?;
        let comparison =
            strategy.build(&criterion.operator, &property, criterion.value.as_deref())?;

        Ok(CompiledCriterion {
            criterion: criterion.clone(),
            accessor: property.accessor,
            comparison,
        })
    }
}
