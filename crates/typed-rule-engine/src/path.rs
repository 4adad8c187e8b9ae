//! 属性路径解析
//!
//! 在形状上逐段解析点号路径，生成按槽位读取的访问链。解析只依赖类型形状，
//! 与具体实例无关，失败对同一规则和根类型是永久性的。

use crate::error::{Result, RuleError};
use crate::shape::{Inspect, PropertyType, PropertyValue, Shape};
use std::sync::Arc;

/// 访问链：从根对象出发依次读取的槽位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorChain {
    slots: Vec<usize>,
}

impl AccessorChain {
    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    /// 沿访问链读取属性值，中间对象为空时结果为空
    pub fn read<'a>(&self, root: &'a dyn Inspect) -> PropertyValue<'a> {
        let mut current = PropertyValue::Object(root);
        for &slot in &self.slots {
            current = match current {
                PropertyValue::Object(object) => object.read(slot),
                _ => return PropertyValue::Null,
            };
        }
        current
    }
}

/// 解析完成的属性
#[derive(Debug, Clone)]
pub struct ResolvedProperty {
    /// 完整路径
    pub path: String,
    /// 声明该属性的类型名
    pub declaring_type: String,
    pub property_type: PropertyType,
    /// 叶子属性自身是否可空；编译期常量只依据这一项
    pub nullable: bool,
    /// 中间对象可空，运行时读到的叶子可能为空
    pub nullable_parent: bool,
    pub accessor: AccessorChain,
}

/// 属性路径解析器
pub struct PropertyResolver;

impl PropertyResolver {
    /// 在 `root` 形状上解析 `path`
    pub fn resolve(root: &Shape, path: &str) -> Result<ResolvedProperty> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut slots = Vec::with_capacity(segments.len());
        let mut nullable_parent = false;
        let mut nested: Option<Arc<Shape>> = None;

        for (i, segment) in segments.iter().enumerate() {
            let current = nested.as_deref().unwrap_or(root);
            let (slot, descriptor) = current
                .find(segment)
                .filter(|(_, d)| d.is_readable())
                .ok_or_else(|| invalid_path(path, segment, current.name()))?;

            slots.push(slot);

            let Some(next_segment) = segments.get(i + 1) else {
                return Ok(ResolvedProperty {
                    path: path.to_string(),
                    declaring_type: current.name().to_string(),
                    property_type: descriptor.property_type.clone(),
                    nullable: descriptor.nullable,
                    nullable_parent,
                    accessor: AccessorChain { slots },
                });
            };
            nullable_parent |= descriptor.nullable;

            let next = match &descriptor.property_type {
                PropertyType::Object(shape) => shape.resolve(),
                scalar => {
                    return Err(invalid_path(path, next_segment, &scalar.to_string()));
                }
            };
            nested = Some(next);
        }

        Err(invalid_path(path, path, root.name()))
    }
}

fn invalid_path(path: &str, segment: &str, type_name: &str) -> RuleError {
    RuleError::InvalidPropertyPath {
        path: path.to_string(),
        segment: segment.to_string(),
        type_name: type_name.to_string(),
    }
}
