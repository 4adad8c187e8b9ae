//! 类型化规则引擎
//!
//! 把声明式规则（属性路径 / 操作符 / 文本参数）编译为针对具体类型的谓词，支持：
//! - JSON 规则定义和解析
//! - 针对根类型的一次性编译和按规则身份缓存
//! - 编译错误延迟到评估时原样返回
//! - 嵌套属性路径、可空属性、大小写无关的文本操作
//! - 自定义操作符注册
//! - 规则语法校验
//!
//! 业务类型通过 [`Inspect`] / [`Describe`] 描述自身属性：
//!
//! ```
//! use rule_engine::{Criterion, Describe, Evaluator, Inspect, PropertyKind, PropertyValue, Rule, Shape};
//! use std::sync::Arc;
//!
//! struct Order {
//!     amount: i64,
//! }
//!
//! impl Inspect for Order {
//!     fn shape(&self) -> Shape {
//!         Self::describe()
//!     }
//!
//!     fn read(&self, slot: usize) -> PropertyValue<'_> {
//!         match slot {
//!             0 => self.amount.to_value(),
//!             _ => PropertyValue::Null,
//!         }
//!     }
//! }
//!
//! impl Describe for Order {
//!     fn describe() -> Shape {
//!         Shape::new("Order").property::<i64>("Amount")
//!     }
//! }
//!
//! let big = Arc::new(Rule::new("big", vec![Criterion::new("Amount", "GreaterThan", "100")]));
//! let evaluator = Evaluator::<Order>::new(vec![Arc::clone(&big)]);
//!
//! assert!(evaluator.matches_rule(Some(&Order { amount: 500 }), &big).unwrap());
//! ```

pub mod coercion;
pub mod compiler;
pub mod config;
pub mod error;
pub mod evaluator;
mod json;
pub mod models;
pub mod operators;
pub mod path;
pub mod shape;
pub mod telemetry;
pub mod validator;

pub use coercion::{Constant, TypeCoercer};
pub use compiler::{CompiledCriterion, CompiledPredicate, PredicateCompiler};
pub use config::EngineConfig;
pub use error::{Result, RuleError};
pub use evaluator::{DynamicEvaluator, Evaluator, EvaluatorOptions};
pub use models::{Criterion, CriterionOutcome, Explanation, Rule};
pub use operators::{CompareOp, Operator, OperatorRegistry, OperatorStrategy, TextOp, TypedComparison};
pub use path::{AccessorChain, PropertyResolver, ResolvedProperty};
pub use shape::{
    Access, Describe, Inspect, PropertyDescriptor, PropertyKind, PropertyType, PropertyValue,
    Shape, ShapeRef,
};
pub use validator::{ValidationError, Validator};
