//! 类型转换
//!
//! 把条件中的文本参数转换为属性的原生类型，供比较操作符使用。
//! 空值和空字符串的处理在 [`operators`](crate::operators) 中完成，这里只负责解析文本。

use crate::error::{Result, RuleError};
use crate::shape::{PropertyType, PropertyValue};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;
use uuid::Uuid;

/// 转换后的比较常量
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Str(String),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),
}

impl Constant {
    /// 运行时值相对于常量的顺序，类型不一致或无法比较（NaN）时返回 `None`
    pub fn ordering_of(&self, value: &PropertyValue<'_>) -> Option<Ordering> {
        match (value, self) {
            (PropertyValue::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (PropertyValue::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (PropertyValue::UInt(a), Self::UInt(b)) => Some(a.cmp(b)),
            (PropertyValue::Int(a), Self::UInt(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (PropertyValue::UInt(a), Self::Int(b)) => Some(i128::from(*a).cmp(&i128::from(*b))),
            (PropertyValue::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (PropertyValue::Decimal(a), Self::Decimal(b)) => Some(a.cmp(b)),
            (PropertyValue::Str(a), Self::Str(b)) => Some((*a).cmp(b.as_str())),
            (PropertyValue::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (PropertyValue::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (PropertyValue::Uuid(a), Self::Uuid(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// 文本参数转换器
pub struct TypeCoercer;

impl TypeCoercer {
    /// 将 `text` 转换为 `target` 类型的常量
    ///
    /// 字符串原样保留，其他类型先去掉首尾空白再解析。
    pub fn coerce(operator: &str, text: &str, target: &PropertyType) -> Result<Constant> {
        if target.is_string() {
            return Ok(Constant::Str(text.to_string()));
        }

        let trimmed = text.trim();
        let parsed = match target {
            PropertyType::Bool => parse_bool(trimmed).map(Constant::Bool),
            PropertyType::I8 => trimmed.parse::<i8>().ok().map(|v| Constant::Int(v.into())),
            PropertyType::I16 => trimmed.parse::<i16>().ok().map(|v| Constant::Int(v.into())),
            PropertyType::I32 => trimmed.parse::<i32>().ok().map(|v| Constant::Int(v.into())),
            PropertyType::I64 => trimmed.parse::<i64>().ok().map(Constant::Int),
            PropertyType::U8 => trimmed.parse::<u8>().ok().map(|v| Constant::UInt(v.into())),
            PropertyType::U16 => trimmed.parse::<u16>().ok().map(|v| Constant::UInt(v.into())),
            PropertyType::U32 => trimmed.parse::<u32>().ok().map(|v| Constant::UInt(v.into())),
            PropertyType::U64 => trimmed.parse::<u64>().ok().map(Constant::UInt),
            PropertyType::F32 => trimmed.parse::<f32>().ok().map(|v| Constant::Float(v.into())),
            PropertyType::F64 => trimmed.parse::<f64>().ok().map(Constant::Float),
            PropertyType::Decimal => Decimal::from_str(trimmed).ok().map(Constant::Decimal),
            PropertyType::DateTime => parse_datetime(trimmed).map(Constant::DateTime),
            PropertyType::Date => parse_date(trimmed).map(Constant::Date),
            PropertyType::Uuid => Uuid::parse_str(trimmed).ok().map(Constant::Uuid),
            PropertyType::String | PropertyType::Object(_) | PropertyType::Other(_) => None,
        };

        parsed.ok_or_else(|| RuleError::InvalidArgumentTypeForOperator {
            operator: operator.to_string(),
            supplied: "String".to_string(),
            expected: target.to_string(),
            argument: Some(text.to_string()),
        })
    }
}

/// 大小写不敏感的 true / false
fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// 解析日期时间，不带时区的值按 UTC 处理
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // ISO 8601 / RFC 3339
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_datetime(s).map(|dt| dt.date_naive()))
}
