//! JSON 文档作为鸭子类型对象
//!
//! 形状从实例本身推断，因此只能配合 [`DynamicEvaluator`](crate::DynamicEvaluator) 使用。
//! 所有属性都视为可空；JSON `null` 推断为可空字符串，数组推断为只支持空值检查的不透明类型。
//! 数字一律按 `f64` 处理，同一条规则对 `9` 和 `9.5` 都能编译；超出 2^53 的整数会丢失精度。

use crate::shape::{Inspect, PropertyDescriptor, PropertyType, PropertyValue, Shape, ShapeRef};
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

const JSON_OBJECT: &str = "JsonObject";

impl Inspect for Value {
    fn shape(&self) -> Shape {
        let mut shape = Shape::new(JSON_OBJECT);
        if let Value::Object(map) = self {
            for (key, value) in map {
                shape = shape.with(PropertyDescriptor::new(
                    key.clone(),
                    infer_type(value),
                    true,
                ));
            }
        }
        shape
    }

    fn read(&self, slot: usize) -> PropertyValue<'_> {
        let Value::Object(map) = self else {
            return PropertyValue::Null;
        };

        match map.values().nth(slot) {
            Some(value) => to_property_value(value),
            None => PropertyValue::Null,
        }
    }
}

fn infer_type(value: &Value) -> PropertyType {
    match value {
        Value::Null | Value::String(_) => PropertyType::String,
        Value::Bool(_) => PropertyType::Bool,
        Value::Number(_) => PropertyType::F64,
        Value::Array(_) => PropertyType::Other(Cow::Borrowed("array")),
        Value::Object(_) => PropertyType::Object(ShapeRef::Resolved(Arc::new(value.shape()))),
    }
}

fn to_property_value(value: &Value) -> PropertyValue<'_> {
    match value {
        Value::Null => PropertyValue::Null,
        Value::Bool(b) => PropertyValue::Bool(*b),
        Value::Number(n) => n.as_f64().map_or(PropertyValue::Null, PropertyValue::Float),
        Value::String(s) => PropertyValue::Str(s),
        Value::Array(_) => PropertyValue::Opaque,
        Value::Object(_) => PropertyValue::Object(value),
    }
}
