//! 规则操作符定义
//!
//! 操作符名称通过 [`OperatorRegistry`] 映射到构建策略。策略根据解析后的属性类型
//! 和文本参数生成 [`TypedComparison`]，编译期完成类型检查和参数转换。

use crate::coercion::{Constant, TypeCoercer};
use crate::error::{Result, RuleError};
use crate::path::ResolvedProperty;
use crate::shape::PropertyValue;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// 内置操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    // 比较
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,

    // 字符串操作（大小写不敏感）
    Contains,
    StartsWith,
    EndsWith,
    DoesNotContain,
    DoesNotStartWith,
    DoesNotEndWith,

    // 空值检查
    IsNull,
    IsNotNull,

    // 布尔检查
    IsTrue,
    IsFalse,
}

impl Operator {
    pub const ALL: [Operator; 16] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::Contains,
        Self::StartsWith,
        Self::EndsWith,
        Self::DoesNotContain,
        Self::DoesNotStartWith,
        Self::DoesNotEndWith,
        Self::IsNull,
        Self::IsNotNull,
        Self::IsTrue,
        Self::IsFalse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::GreaterThan => "GreaterThan",
            Self::GreaterThanOrEqual => "GreaterThanOrEqual",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqual => "LessThanOrEqual",
            Self::Contains => "Contains",
            Self::StartsWith => "StartsWith",
            Self::EndsWith => "EndsWith",
            Self::DoesNotContain => "DoesNotContain",
            Self::DoesNotStartWith => "DoesNotStartWith",
            Self::DoesNotEndWith => "DoesNotEndWith",
            Self::IsNull => "IsNull",
            Self::IsNotNull => "IsNotNull",
            Self::IsTrue => "IsTrue",
            Self::IsFalse => "IsFalse",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = RuleError;

    /// 大小写敏感
    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| RuleError::UnrecognizedOperator {
                operator: s.to_string(),
            })
    }
}

/// 比较操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl CompareOp {
    fn accepts(self, ordering: Option<Ordering>) -> bool {
        match self {
            Self::Equal => ordering == Some(Ordering::Equal),
            Self::NotEqual => ordering != Some(Ordering::Equal),
            Self::GreaterThan => ordering == Some(Ordering::Greater),
            Self::GreaterThanOrEqual => {
                matches!(ordering, Some(Ordering::Greater | Ordering::Equal))
            }
            Self::LessThan => ordering == Some(Ordering::Less),
            Self::LessThanOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        }
    }
}

/// 字符串操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
}

/// 编译后的类型化比较
#[derive(Clone)]
pub enum TypedComparison {
    /// 编译期即可确定的结果，不读取实例
    Constant(bool),
    IsNull,
    IsNotNull,
    /// 与转换后的常量比较；运行时空值只满足 `NotEqual`
    Compare { op: CompareOp, constant: Constant },
    /// `needle` 已转为小写；运行时空值使正向操作为 false
    Text {
        op: TextOp,
        needle: String,
        negated: bool,
    },
    /// 空值既不是 true 也不是 false
    IsTrue,
    IsFalse,
    /// 自定义操作符
    Custom(Arc<dyn Fn(&PropertyValue<'_>) -> bool + Send + Sync>),
}

impl TypedComparison {
    /// 常量比较的结果
    pub fn as_constant(&self) -> Option<bool> {
        match self {
            Self::Constant(value) => Some(*value),
            _ => None,
        }
    }

    pub fn test(&self, value: &PropertyValue<'_>) -> bool {
        match self {
            Self::Constant(result) => *result,
            Self::IsNull => value.is_null(),
            Self::IsNotNull => !value.is_null(),
            Self::Compare { op, constant } => {
                if value.is_null() {
                    return *op == CompareOp::NotEqual;
                }
                op.accepts(constant.ordering_of(value))
            }
            Self::Text {
                op,
                needle,
                negated,
            } => {
                let found = match value {
                    PropertyValue::Str(s) => {
                        let haystack = s.to_lowercase();
                        match op {
                            TextOp::Contains => haystack.contains(needle.as_str()),
                            TextOp::StartsWith => haystack.starts_with(needle.as_str()),
                            TextOp::EndsWith => haystack.ends_with(needle.as_str()),
                        }
                    }
                    _ => false,
                };
                found != *negated
            }
            Self::IsTrue => matches!(value, PropertyValue::Bool(true)),
            Self::IsFalse => matches!(value, PropertyValue::Bool(false)),
            Self::Custom(test) => test(value),
        }
    }
}

impl fmt::Debug for TypedComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            Self::IsNull => write!(f, "IsNull"),
            Self::IsNotNull => write!(f, "IsNotNull"),
            Self::Compare { op, constant } => f
                .debug_struct("Compare")
                .field("op", op)
                .field("constant", constant)
                .finish(),
            Self::Text {
                op,
                needle,
                negated,
            } => f
                .debug_struct("Text")
                .field("op", op)
                .field("needle", needle)
                .field("negated", negated)
                .finish(),
            Self::IsTrue => write!(f, "IsTrue"),
            Self::IsFalse => write!(f, "IsFalse"),
            Self::Custom(_) => write!(f, "Custom"),
        }
    }
}

/// 操作符构建策略
///
/// 给定已解析的属性和文本参数，生成类型化比较或返回编译错误。
pub trait OperatorStrategy: Send + Sync {
    fn build(
        &self,
        operator: &str,
        property: &ResolvedProperty,
        argument: Option<&str>,
    ) -> Result<TypedComparison>;
}

impl<F> OperatorStrategy for F
where
    F: Fn(&ResolvedProperty, Option<&str>) -> Result<TypedComparison> + Send + Sync,
{
    fn build(
        &self,
        _operator: &str,
        property: &ResolvedProperty,
        argument: Option<&str>,
    ) -> Result<TypedComparison> {
        self(property, argument)
    }
}

impl OperatorStrategy for Operator {
    fn build(
        &self,
        operator: &str,
        property: &ResolvedProperty,
        argument: Option<&str>,
    ) -> Result<TypedComparison> {
        match self {
            Self::Equal => build_comparison(CompareOp::Equal, operator, property, argument),
            Self::NotEqual => build_comparison(CompareOp::NotEqual, operator, property, argument),
            Self::GreaterThan => {
                build_comparison(CompareOp::GreaterThan, operator, property, argument)
            }
            Self::GreaterThanOrEqual => {
                build_comparison(CompareOp::GreaterThanOrEqual, operator, property, argument)
            }
            Self::LessThan => build_comparison(CompareOp::LessThan, operator, property, argument),
            Self::LessThanOrEqual => {
                build_comparison(CompareOp::LessThanOrEqual, operator, property, argument)
            }
            Self::Contains => build_text(TextOp::Contains, false, operator, property, argument),
            Self::StartsWith => build_text(TextOp::StartsWith, false, operator, property, argument),
            Self::EndsWith => build_text(TextOp::EndsWith, false, operator, property, argument),
            Self::DoesNotContain => build_text(TextOp::Contains, true, operator, property, argument),
            Self::DoesNotStartWith => {
                build_text(TextOp::StartsWith, true, operator, property, argument)
            }
            Self::DoesNotEndWith => build_text(TextOp::EndsWith, true, operator, property, argument),
            Self::IsNull => Ok(build_null_check(true, property)),
            Self::IsNotNull => Ok(build_null_check(false, property)),
            Self::IsTrue => build_bool_check(true, operator, property),
            Self::IsFalse => build_bool_check(false, operator, property),
        }
    }
}

/// 比较操作符
///
/// 可空性只看叶子属性自身，中间对象为空属于运行时情况，由 [`TypedComparison::test`] 处理。
/// 参数缺失时不做转换：不可空属性直接得到常量，可空属性的相等比较变为空值检查（任何类型都可以），
/// 大小比较恒为 false。可空的非字符串属性遇到空字符串时恒为 false，而不是当作空值。
fn build_comparison(
    op: CompareOp,
    operator: &str,
    property: &ResolvedProperty,
    argument: Option<&str>,
) -> Result<TypedComparison> {
    let is_equality = matches!(op, CompareOp::Equal | CompareOp::NotEqual);
    let comparable = property.property_type.is_comparable();

    let Some(text) = argument else {
        if !comparable && !is_equality {
            return Err(invalid_operator(operator, property));
        }
        if !property.nullable {
            return Ok(TypedComparison::Constant(op == CompareOp::NotEqual));
        }
        return Ok(match op {
            CompareOp::Equal => TypedComparison::IsNull,
            CompareOp::NotEqual => TypedComparison::IsNotNull,
            _ => TypedComparison::Constant(false),
        });
    };

    if !comparable {
        return Err(invalid_operator(operator, property));
    }

    if text.is_empty() && property.nullable && !property.property_type.is_string() {
        return Ok(TypedComparison::Constant(false));
    }

    let constant = TypeCoercer::coerce(operator, text, &property.property_type)?;
    Ok(TypedComparison::Compare { op, constant })
}

fn build_text(
    op: TextOp,
    negated: bool,
    operator: &str,
    property: &ResolvedProperty,
    argument: Option<&str>,
) -> Result<TypedComparison> {
    if !property.property_type.is_string() {
        return Err(invalid_operator(operator, property));
    }

    let needle = argument.ok_or_else(|| RuleError::InvalidArgumentTypeForOperator {
        operator: operator.to_string(),
        supplied: "null".to_string(),
        expected: property.property_type.to_string(),
        argument: None,
    })?;

    Ok(TypedComparison::Text {
        op,
        needle: needle.to_lowercase(),
        negated,
    })
}

/// 不可空属性的空值检查在编译期确定
fn build_null_check(is_null: bool, property: &ResolvedProperty) -> TypedComparison {
    match (property.nullable, is_null) {
        (false, _) => TypedComparison::Constant(!is_null),
        (true, true) => TypedComparison::IsNull,
        (true, false) => TypedComparison::IsNotNull,
    }
}

fn build_bool_check(
    expected: bool,
    operator: &str,
    property: &ResolvedProperty,
) -> Result<TypedComparison> {
    if !property.property_type.is_bool() {
        return Err(invalid_operator(operator, property));
    }

    Ok(if expected {
        TypedComparison::IsTrue
    } else {
        TypedComparison::IsFalse
    })
}

fn invalid_operator(operator: &str, property: &ResolvedProperty) -> RuleError {
    RuleError::InvalidOperatorForPropertyType {
        operator: operator.to_string(),
        path: property.path.clone(),
        property_type: property.property_type.to_string(),
    }
}

/// 操作符注册表
///
/// 默认包含全部内置操作符。自定义操作符需要在构建评估器之前注册。
#[derive(Clone)]
pub struct OperatorRegistry {
    strategies: HashMap<String, Arc<dyn OperatorStrategy>>,
}

impl OperatorRegistry {
    /// 不含任何操作符的注册表
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// 注册操作符，同名操作符会被覆盖
    pub fn register(
        &mut self,
        name: impl Into<String>,
        strategy: impl OperatorStrategy + 'static,
    ) -> &mut Self {
        self.strategies.insert(name.into(), Arc::new(strategy));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.strategies.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.strategies.keys().map(String::as_str)
    }

    /// 按名称查找策略（大小写敏感）
    pub fn strategy(&self, name: &str) -> Result<&dyn OperatorStrategy> {
        self.strategies
            .get(name)
            .map(|s| &**s)
            .ok_or_else(|| RuleError::UnrecognizedOperator {
                operator: name.to_string(),
            })
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for op in Operator::ALL {
            registry.register(op.as_str(), op);
        }
        registry
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("OperatorRegistry")
            .field("operators", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PropertyResolver;
    use crate::shape::{PropertyDescriptor, PropertyKind, PropertyType, Shape, ShapeRef};

    fn property<K: PropertyKind>() -> ResolvedProperty {
        let shape = Shape::new("Subject").property::<K>("Value");
        PropertyResolver::resolve(&shape, "Value").unwrap()
    }

    fn build<K: PropertyKind>(op: Operator, argument: Option<&str>) -> Result<TypedComparison> {
        op.build(op.as_str(), &property::<K>(), argument)
    }

    #[test]
    fn test_operator_from_str_is_case_sensitive() {
        assert_eq!("Equal".parse::<Operator>().unwrap(), Operator::Equal);
        assert!(matches!(
            "Equals".parse::<Operator>(),
            Err(RuleError::UnrecognizedOperator { .. })
        ));
        assert!("equal".parse::<Operator>().is_err());
    }

    #[test]
    fn test_numeric_comparisons() {
        let gt = build::<i32>(Operator::GreaterThan, Some("12")).unwrap();
        assert!(gt.test(&PropertyValue::Int(42)));
        assert!(!gt.test(&PropertyValue::Int(12)));

        let lte = build::<i32>(Operator::LessThanOrEqual, Some("12")).unwrap();
        assert!(lte.test(&PropertyValue::Int(12)));
        assert!(!lte.test(&PropertyValue::Int(13)));
    }

    #[test]
    fn test_contains_on_int_is_invalid() {
        let err = build::<i32>(Operator::Contains, Some("1")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperatorForPropertyType { .. }));
    }

    #[test]
    fn test_is_true_on_string_is_invalid() {
        let err = build::<String>(Operator::IsTrue, None).unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperatorForPropertyType { .. }));
    }

    #[test]
    fn test_text_operators_ignore_case() {
        let contains = build::<String>(Operator::Contains, Some("EVE")).unwrap();
        assert!(contains.test(&PropertyValue::Str("Steve")));

        let starts = build::<String>(Operator::StartsWith, Some("st")).unwrap();
        assert!(starts.test(&PropertyValue::Str("Steve")));

        let ends = build::<String>(Operator::DoesNotEndWith, Some("VE")).unwrap();
        assert!(!ends.test(&PropertyValue::Str("Steve")));
    }

    #[test]
    fn test_negated_text_on_null() {
        let contains = build::<Option<String>>(Operator::Contains, Some("a")).unwrap();
        let not_contains = build::<Option<String>>(Operator::DoesNotContain, Some("a")).unwrap();

        assert!(!contains.test(&PropertyValue::Null));
        assert!(not_contains.test(&PropertyValue::Null));
    }

    #[test]
    fn test_text_requires_argument() {
        let err = build::<String>(Operator::Contains, None).unwrap_err();
        assert!(matches!(
            err,
            RuleError::InvalidArgumentTypeForOperator { ref supplied, .. } if supplied == "null"
        ));
    }

    fn nested(path: &str) -> ResolvedProperty {
        let inner = Shape::new("Inner").property::<i32>("Value");
        let shape = Shape::new("Outer").with(PropertyDescriptor::new(
            "Inner",
            PropertyType::Object(ShapeRef::Resolved(Arc::new(inner))),
            true,
        ));
        PropertyResolver::resolve(&shape, path).unwrap()
    }

    #[test]
    fn test_leaf_nullability_decides_constants() {
        let leaf = nested("Inner.Value");
        assert!(!leaf.nullable);

        let is_null = Operator::IsNull.build("IsNull", &leaf, None).unwrap();
        assert_eq!(is_null.as_constant(), Some(false));

        let equal = Operator::Equal.build("Equal", &leaf, None).unwrap();
        assert_eq!(equal.as_constant(), Some(false));
        let not_equal = Operator::NotEqual.build("NotEqual", &leaf, None).unwrap();
        assert_eq!(not_equal.as_constant(), Some(true));

        let err = Operator::Equal.build("Equal", &leaf, Some("")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidArgumentTypeForOperator { .. }));

        // 中间对象为空时，非常量比较读到空值
        let gt = Operator::GreaterThan.build("GreaterThan", &leaf, Some("1")).unwrap();
        assert!(!gt.test(&PropertyValue::Null));
    }

    #[test]
    fn test_missing_argument_equality_on_nullable_object() {
        let object = nested("Inner");

        let equal = Operator::Equal.build("Equal", &object, None).unwrap();
        assert!(matches!(equal, TypedComparison::IsNull));
        let not_equal = Operator::NotEqual.build("NotEqual", &object, None).unwrap();
        assert!(matches!(not_equal, TypedComparison::IsNotNull));

        let err = Operator::GreaterThan.build("GreaterThan", &object, None).unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperatorForPropertyType { .. }));
        let err = Operator::Equal.build("Equal", &object, Some("x")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidOperatorForPropertyType { .. }));
    }

    #[test]
    fn test_null_checks_on_non_nullable_are_constant() {
        assert_eq!(build::<i32>(Operator::IsNull, None).unwrap().as_constant(), Some(false));
        assert_eq!(build::<i32>(Operator::IsNotNull, None).unwrap().as_constant(), Some(true));

        let is_null = build::<Option<i32>>(Operator::IsNull, None).unwrap();
        assert!(is_null.as_constant().is_none());
        assert!(is_null.test(&PropertyValue::Null));
        assert!(!is_null.test(&PropertyValue::Int(1)));
    }

    #[test]
    fn test_missing_argument_on_non_nullable() {
        assert_eq!(build::<i32>(Operator::Equal, None).unwrap().as_constant(), Some(false));
        assert_eq!(build::<i32>(Operator::NotEqual, None).unwrap().as_constant(), Some(true));
        assert_eq!(build::<i32>(Operator::GreaterThan, None).unwrap().as_constant(), Some(false));
    }

    #[test]
    fn test_missing_argument_on_nullable() {
        let eq = build::<Option<i32>>(Operator::Equal, None).unwrap();
        assert!(eq.test(&PropertyValue::Null));
        assert!(!eq.test(&PropertyValue::Int(0)));

        let neq = build::<Option<i32>>(Operator::NotEqual, None).unwrap();
        assert!(!neq.test(&PropertyValue::Null));
        assert!(neq.test(&PropertyValue::Int(0)));

        let gt = build::<Option<i32>>(Operator::GreaterThan, None).unwrap();
        assert_eq!(gt.as_constant(), Some(false));
        let lt = build::<Option<i32>>(Operator::LessThan, None).unwrap();
        assert_eq!(lt.as_constant(), Some(false));
    }

    #[test]
    fn test_empty_string_on_nullable_is_constant_false() {
        for op in [Operator::Equal, Operator::NotEqual, Operator::GreaterThan] {
            let comparison = build::<Option<i32>>(op, Some("")).unwrap();
            assert_eq!(comparison.as_constant(), Some(false), "{}", op);
        }
    }

    #[test]
    fn test_empty_string_on_string_is_a_value() {
        let eq = build::<Option<String>>(Operator::Equal, Some("")).unwrap();
        assert!(eq.test(&PropertyValue::Str("")));
        assert!(!eq.test(&PropertyValue::Null));
    }

    #[test]
    fn test_empty_string_on_non_nullable_fails_coercion() {
        let err = build::<i32>(Operator::Equal, Some("")).unwrap_err();
        assert!(matches!(err, RuleError::InvalidArgumentTypeForOperator { .. }));
    }

    #[test]
    fn test_runtime_null_against_constant() {
        let eq = build::<Option<i32>>(Operator::Equal, Some("5")).unwrap();
        let neq = build::<Option<i32>>(Operator::NotEqual, Some("5")).unwrap();
        let gte = build::<Option<i32>>(Operator::GreaterThanOrEqual, Some("5")).unwrap();

        assert!(!eq.test(&PropertyValue::Null));
        assert!(neq.test(&PropertyValue::Null));
        assert!(!gte.test(&PropertyValue::Null));
    }

    #[test]
    fn test_nullable_bool_checks() {
        let is_true = build::<Option<bool>>(Operator::IsTrue, None).unwrap();
        let is_false = build::<Option<bool>>(Operator::IsFalse, None).unwrap();

        assert!(!is_true.test(&PropertyValue::Null));
        assert!(!is_false.test(&PropertyValue::Null));
        assert!(is_true.test(&PropertyValue::Bool(true)));
        assert!(is_false.test(&PropertyValue::Bool(false)));
    }

    #[test]
    fn test_registry_contains_builtins() {
        let registry = OperatorRegistry::default();
        for op in Operator::ALL {
            assert!(registry.contains(op.as_str()));
        }
        assert!(matches!(
            registry.strategy("Equals"),
            Err(RuleError::UnrecognizedOperator { .. })
        ));
    }

    #[test]
    fn test_register_custom_operator() {
        let mut registry = OperatorRegistry::default();
        registry.register("IsEven", |property: &ResolvedProperty, _: Option<&str>| {
            if !matches!(property.property_type, crate::shape::PropertyType::I32) {
                return Err(invalid_operator("IsEven", property));
            }
            Ok(TypedComparison::Custom(Arc::new(|value: &PropertyValue<'_>| {
                matches!(value, PropertyValue::Int(n) if n % 2 == 0)
            })))
        });

        let strategy = registry.strategy("IsEven").unwrap();
        let comparison = strategy.build("IsEven", &property::<i32>(), None).unwrap();
        assert!(comparison.test(&PropertyValue::Int(4)));
        assert!(!comparison.test(&PropertyValue::Int(5)));

        assert!(strategy.build("IsEven", &property::<String>(), None).is_err());
    }
}
