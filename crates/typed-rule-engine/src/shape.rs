//! 对象形状描述
//!
//! Rust 没有运行时反射，业务对象通过 [`Inspect`] / [`Describe`] 描述自身的可读属性。
//! 路径解析在 [`Shape`] 上完成，求值时只按槽位（slot）读取属性值。

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// 可被规则检查的对象
pub trait Inspect {
    /// 对象的运行时形状
    fn shape(&self) -> Shape;

    /// 读取 `slot` 处的属性值，`slot` 与 [`Shape::properties`] 的下标一一对应
    fn read(&self, slot: usize) -> PropertyValue<'_>;
}

/// 拥有静态形状的类型，类型化评估器需要它
pub trait Describe: Inspect {
    fn describe() -> Shape;
}

/// 嵌套对象的形状引用
///
/// `Static` 延迟构造形状，使自引用类型也能被描述。
#[derive(Debug, Clone)]
pub enum ShapeRef {
    Static(fn() -> Shape),
    Resolved(Arc<Shape>),
}

impl ShapeRef {
    pub fn resolve(&self) -> Arc<Shape> {
        match self {
            Self::Static(describe) => Arc::new(describe()),
            Self::Resolved(shape) => Arc::clone(shape),
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Self::Static(describe) => describe().name().to_string(),
            Self::Resolved(shape) => shape.name().to_string(),
        }
    }
}

/// 属性的声明类型
#[derive(Debug, Clone)]
pub enum PropertyType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    /// 定点小数
    Decimal,
    String,
    /// UTC 时间
    DateTime,
    Date,
    Uuid,
    /// 嵌套对象，路径可以继续向下解析
    Object(ShapeRef),
    /// 不透明类型，只支持空值检查
    Other(Cow<'static, str>),
}

impl PropertyType {
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }

    /// 可以参与相等和大小比较的标量类型
    pub fn is_comparable(&self) -> bool {
        !matches!(self, Self::Object(_) | Self::Other(_))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::Date => "Date",
            Self::Uuid => "Uuid",
            Self::Object(shape) => return write!(f, "{}", shape.type_name()),
            Self::Other(name) => name.as_ref(),
        };
        write!(f, "{}", s)
    }
}

/// 属性访问方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    /// 只写属性不能出现在规则路径中
    WriteOnly,
}

/// 属性描述
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    pub name: Cow<'static, str>,
    pub property_type: PropertyType,
    pub nullable: bool,
    pub access: Access,
}

impl PropertyDescriptor {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        property_type: PropertyType,
        nullable: bool,
    ) -> Self {
        Self {
            name: name.into(),
            property_type,
            nullable,
            access: Access::Read,
        }
    }

    pub fn is_readable(&self) -> bool {
        self.access == Access::Read
    }
}

/// 类型形状：类型名加上按槽位排列的属性
#[derive(Debug, Clone)]
pub struct Shape {
    name: Cow<'static, str>,
    properties: Vec<PropertyDescriptor>,
}

impl Shape {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// 添加标量属性，类型和可空性由字段的 Rust 类型决定
    pub fn property<K: PropertyKind>(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.with(PropertyDescriptor::new(
            name,
            K::property_type(),
            K::NULLABLE,
        ))
    }

    /// 添加非空嵌套对象属性
    pub fn object<T: Describe>(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.with(PropertyDescriptor::new(
            name,
            PropertyType::Object(ShapeRef::Static(T::describe)),
            false,
        ))
    }

    /// 添加可空嵌套对象属性
    pub fn optional_object<T: Describe>(self, name: impl Into<Cow<'static, str>>) -> Self {
        self.with(PropertyDescriptor::new(
            name,
            PropertyType::Object(ShapeRef::Static(T::describe)),
            true,
        ))
    }

    /// 添加只写属性，占用槽位但不可被路径解析
    pub fn write_only<K: PropertyKind>(self, name: impl Into<Cow<'static, str>>) -> Self {
        let mut descriptor = PropertyDescriptor::new(name, K::property_type(), K::NULLABLE);
        descriptor.access = Access::WriteOnly;
        self.with(descriptor)
    }

    pub fn with(mut self, descriptor: PropertyDescriptor) -> Self {
        self.properties.push(descriptor);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// 按名称查找属性（大小写敏感），返回槽位和描述
    pub fn find(&self, name: &str) -> Option<(usize, &PropertyDescriptor)> {
        self.properties
            .iter()
            .enumerate()
            .find(|(_, p)| p.name == name)
    }
}

/// 从对象读出的属性值
#[derive(Clone, Copy)]
pub enum PropertyValue<'a> {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Decimal(Decimal),
    Str(&'a str),
    DateTime(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),
    Object(&'a dyn Inspect),
    /// 不透明类型的非空值
    Opaque,
}

impl<'a> PropertyValue<'a> {
    pub fn object<T: Inspect + 'a>(value: &'a T) -> Self {
        Self::Object(value)
    }

    pub fn optional_object<T: Inspect + 'a>(value: Option<&'a T>) -> Self {
        match value {
            Some(value) => Self::Object(value),
            None => Self::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Debug for PropertyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Bool(v) => write!(f, "Bool({})", v),
            Self::Int(v) => write!(f, "Int({})", v),
            Self::UInt(v) => write!(f, "UInt({})", v),
            Self::Float(v) => write!(f, "Float({})", v),
            Self::Decimal(v) => write!(f, "Decimal({})", v),
            Self::Str(v) => write!(f, "Str({:?})", v),
            Self::DateTime(v) => write!(f, "DateTime({})", v),
            Self::Date(v) => write!(f, "Date({})", v),
            Self::Uuid(v) => write!(f, "Uuid({})", v),
            Self::Object(v) => write!(f, "Object({})", v.shape().name()),
            Self::Opaque => write!(f, "Opaque"),
        }
    }
}

/// 字段的 Rust 类型到属性类型的映射
pub trait PropertyKind {
    const NULLABLE: bool = false;

    fn property_type() -> PropertyType;

    fn to_value(&self) -> PropertyValue<'_>;
}

macro_rules! property_kind {
    ($ty:ty, $variant:ident, |$v:ident| $value:expr) => {
        impl PropertyKind for $ty {
            fn property_type() -> PropertyType {
                PropertyType::$variant
            }

            fn to_value(&self) -> PropertyValue<'_> {
                let $v = self;
                $value
            }
        }
    };
}

property_kind!(bool, Bool, |v| PropertyValue::Bool(*v));
property_kind!(i8, I8, |v| PropertyValue::Int(i64::from(*v)));
property_kind!(i16, I16, |v| PropertyValue::Int(i64::from(*v)));
property_kind!(i32, I32, |v| PropertyValue::Int(i64::from(*v)));
property_kind!(i64, I64, |v| PropertyValue::Int(*v));
property_kind!(u8, U8, |v| PropertyValue::UInt(u64::from(*v)));
property_kind!(u16, U16, |v| PropertyValue::UInt(u64::from(*v)));
property_kind!(u32, U32, |v| PropertyValue::UInt(u64::from(*v)));
property_kind!(u64, U64, |v| PropertyValue::UInt(*v));
property_kind!(f32, F32, |v| PropertyValue::Float(f64::from(*v)));
property_kind!(f64, F64, |v| PropertyValue::Float(*v));
property_kind!(Decimal, Decimal, |v| PropertyValue::Decimal(*v));
property_kind!(String, String, |v| PropertyValue::Str(v.as_str()));
property_kind!(DateTime<Utc>, DateTime, |v| PropertyValue::DateTime(*v));
property_kind!(NaiveDate, Date, |v| PropertyValue::Date(*v));
property_kind!(Uuid, Uuid, |v| PropertyValue::Uuid(*v));

impl<K: PropertyKind> PropertyKind for Option<K> {
    const NULLABLE: bool = true;

    fn property_type() -> PropertyType {
        K::property_type()
    }

    fn to_value(&self) -> PropertyValue<'_> {
        match self {
            Some(value) => value.to_value(),
            None => PropertyValue::Null,
        }
    }
}
