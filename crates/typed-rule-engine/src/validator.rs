//! 规则语法校验
//!
//! 只做语法层面的尽力检查：条件非空、路径片段符合标识符语法、操作符属于已知集合。
//! 校验时没有目标对象的类型信息，通过校验不代表评估时不会出现类型错误。

use crate::models::Rule;
use crate::operators::OperatorRegistry;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// 路径片段：字母、下划线或 @ 开头，后接字母、数字或下划线
///
/// 只接受 ASCII 字母和数字，含非 ASCII 字母的片段会被报告为非法标识符。
static SEGMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_@][A-Za-z0-9_]*$").expect("path segment pattern is valid")
});

/// 校验发现的语法问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// 规则校验器
pub struct Validator {
    known_operators: HashSet<String>,
}

impl Validator {
    /// 只认识内置操作符的校验器
    pub fn new() -> Self {
        Self::with_registry(&OperatorRegistry::default())
    }

    /// 认识注册表中全部操作符（含自定义操作符）的校验器
    pub fn with_registry(registry: &OperatorRegistry) -> Self {
        Self {
            known_operators: registry.names().map(str::to_string).collect(),
        }
    }

    /// 校验规则，返回空列表表示没有发现语法问题
    pub fn validate(&self, rule: &Rule) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if rule.criteria.is_empty() {
            errors.push(ValidationError::new(format!(
                "规则 '{}' 没有任何条件",
                rule.name
            )));
        }

        for (i, criterion) in rule.criteria.iter().enumerate() {
            let path = &criterion.property_path;
            if path.is_empty() {
                errors.push(ValidationError::new(format!(
                    "条件 criteria[{}] 的属性路径为空",
                    i
                )));
            } else {
                for segment in path.split('.') {
                    if !SEGMENT_PATTERN.is_match(segment) {
                        errors.push(ValidationError::new(format!(
                            "条件 criteria[{}] 的属性路径 '{}' 中的片段 '{}' 不是合法标识符",
                            i, path, segment
                        )));
                    }
                }
            }

            if !self.known_operators.contains(&criterion.operator) {
                errors.push(ValidationError::new(format!(
                    "条件 criteria[{}] 使用了未知操作符 '{}'",
                    i, criterion.operator
                )));
            }
        }

        errors
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}
