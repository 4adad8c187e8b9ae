//! 规则引擎错误类型
//!
//! 所有错误都属于配置错误，不会在引擎内部捕获或重试。

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("无效的属性路径 '{path}': 类型 {type_name} 上没有可读属性 '{segment}'")]
    InvalidPropertyPath {
        path: String,
        segment: String,
        type_name: String,
    },

    #[error("无法识别的操作符: {operator}")]
    UnrecognizedOperator { operator: String },

    #[error("操作符 {operator} 不支持属性 '{path}' 的类型 {property_type}")]
    InvalidOperatorForPropertyType {
        operator: String,
        path: String,
        property_type: String,
    },

    #[error(
        "操作符 {operator} 的参数类型无效: 提供的是 {supplied} {argument:?}, 期望 {expected}"
    )]
    InvalidArgumentTypeForOperator {
        operator: String,
        supplied: String,
        expected: String,
        argument: Option<String>,
    },

    #[error("规则解析失败: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for RuleError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
