//! Tagged setting values.
//!
//! Decoded settings land in untyped slots before they are written back into
//! a member, so every value carries its origin type. The engine compares that
//! tag against the member's declared [`ValueType`] instead of relying on an
//! implicit conversion.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Origin type of a non-null value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
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
    Char,
    String,
}

impl TypeTag {
    /// All tags, in declaration order.
    pub const ALL: [TypeTag; 13] = [
        TypeTag::Bool,
        TypeTag::I8,
        TypeTag::I16,
        TypeTag::I32,
        TypeTag::I64,
        TypeTag::U8,
        TypeTag::U16,
        TypeTag::U32,
        TypeTag::U64,
        TypeTag::F32,
        TypeTag::F64,
        TypeTag::Char,
        TypeTag::String,
    ];

    /// Stable name used on the wire.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Bool => "bool",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::Char => "char",
            TypeTag::String => "string",
        }
    }

    /// Parse a wire name back into a tag.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.name() == name)
    }

    fn is_integer(self) -> bool {
        matches!(
            self,
            TypeTag::I8
                | TypeTag::I16
                | TypeTag::I32
                | TypeTag::I64
                | TypeTag::U8
                | TypeTag::U16
                | TypeTag::U32
                | TypeTag::U64
        )
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Declared type of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValueType {
    pub tag: TypeTag,
    /// Whether the member accepts null (an `Option<_>` member).
    pub nullable: bool,
}

impl ValueType {
    /// A non-nullable type.
    pub const fn new(tag: TypeTag) -> Self {
        Self {
            tag,
            nullable: false,
        }
    }

    /// The nullable version of this type.
    #[must_use]
    pub const fn nullable(self) -> Self {
        Self {
            tag: self.tag,
            nullable: true,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "Option<{}>", self.tag)
        } else {
            write!(f, "{}", self.tag)
        }
    }
}

/// A setting value together with its origin type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
}

impl Value {
    /// Origin type, or `None` for null.
    pub fn type_tag(&self) -> Option<TypeTag> {
        let tag = match self {
            Value::Null => return None,
            Value::Bool(_) => TypeTag::Bool,
            Value::I8(_) => TypeTag::I8,
            Value::I16(_) => TypeTag::I16,
            Value::I32(_) => TypeTag::I32,
            Value::I64(_) => TypeTag::I64,
            Value::U8(_) => TypeTag::U8,
            Value::U16(_) => TypeTag::U16,
            Value::U32(_) => TypeTag::U32,
            Value::U64(_) => TypeTag::U64,
            Value::F32(_) => TypeTag::F32,
            Value::F64(_) => TypeTag::F64,
            Value::Char(_) => TypeTag::Char,
            Value::String(_) => TypeTag::String,
        };
        Some(tag)
    }

    /// Tag name, or `"null"`.
    pub fn type_name(&self) -> &'static str {
        self.type_tag().map_or("null", TypeTag::name)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value can be written into a member of type `ty` as is.
    ///
    /// Null fits only nullable members; anything else needs an exact tag
    /// match. There is no implicit widening.
    pub fn is_assignable_to(&self, ty: ValueType) -> bool {
        match self.type_tag() {
            None => ty.nullable,
            Some(tag) => tag == ty.tag,
        }
    }

    /// Convert to another tag without losing information.
    ///
    /// Returns `None` when the conversion would truncate, round, or has no
    /// sensible meaning (bool to number, multi-char string to char, null).
    pub fn coerce_to(&self, target: TypeTag) -> Option<Value> {
        let source = self.type_tag()?;
        if source == target {
            return Some(self.clone());
        }

        if target.is_integer() {
            let wide = self.as_i128()?;
            return integer_value(target, wide);
        }

        match (self, target) {
            (Value::F32(v), TypeTag::F64) => Some(Value::F64(f64::from(*v))),
            (Value::F64(v), TypeTag::F32) => {
                let narrow = *v as f32;
                (f64::from(narrow) == *v).then_some(Value::F32(narrow))
            }
            (_, TypeTag::F64) => {
                let wide = self.as_i128()?;
                let float = wide as f64;
                (float as i128 == wide && float.abs() <= 9_007_199_254_740_992.0)
                    .then_some(Value::F64(float))
            }
            (_, TypeTag::F32) => {
                let wide = self.as_i128()?;
                let float = wide as f32;
                (float as i128 == wide && float.abs() <= 16_777_216.0).then_some(Value::F32(float))
            }
            (Value::Char(c), TypeTag::String) => Some(Value::String(c.to_string())),
            (Value::String(s), TypeTag::Char) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(Value::Char(c)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Integral view of the value, including floats with no fractional part.
    fn as_i128(&self) -> Option<i128> {
        match self {
            Value::I8(v) => Some(i128::from(*v)),
            Value::I16(v) => Some(i128::from(*v)),
            Value::I32(v) => Some(i128::from(*v)),
            Value::I64(v) => Some(i128::from(*v)),
            Value::U8(v) => Some(i128::from(*v)),
            Value::U16(v) => Some(i128::from(*v)),
            Value::U32(v) => Some(i128::from(*v)),
            Value::U64(v) => Some(i128::from(*v)),
            Value::F32(v) => float_to_i128(f64::from(*v)),
            Value::F64(v) => float_to_i128(*v),
            _ => None,
        }
    }
}

fn float_to_i128(v: f64) -> Option<i128> {
    // Bounds of u64/i64 are all a settings value can hold.
    if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v <= u64::MAX as f64 {
        Some(v as i128)
    } else {
        None
    }
}

fn integer_value(target: TypeTag, wide: i128) -> Option<Value> {
    let value = match target {
        TypeTag::I8 => Value::I8(i8::try_from(wide).ok()?),
        TypeTag::I16 => Value::I16(i16::try_from(wide).ok()?),
        TypeTag::I32 => Value::I32(i32::try_from(wide).ok()?),
        TypeTag::I64 => Value::I64(i64::try_from(wide).ok()?),
        TypeTag::U8 => Value::U8(u8::try_from(wide).ok()?),
        TypeTag::U16 => Value::U16(u16::try_from(wide).ok()?),
        TypeTag::U32 => Value::U32(u32::try_from(wide).ok()?),
        TypeTag::U64 => Value::U64(u64::try_from(wide).ok()?),
        _ => return None,
    };
    Some(value)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::I16(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "{v:?}"),
            Value::String(v) => write!(f, "{v:?}"),
        }
    }
}

/// A Rust type that can be stored in a persisted member.
pub trait SettingValue: Sized {
    /// Declared type of members holding this type.
    fn value_type() -> ValueType;

    /// Current value with its tag.
    fn to_value(&self) -> Value;

    /// Take a value back, or `None` if it does not fit.
    fn from_value(value: Value) -> Option<Self>;
}

macro_rules! copy_setting_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl SettingValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::new(TypeTag::$variant)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(*self)
                }

                fn from_value(value: Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

copy_setting_value! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
}

impl SettingValue for String {
    fn value_type() -> ValueType {
        ValueType::new(TypeTag::String)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

impl<V: SettingValue> SettingValue for Option<V> {
    fn value_type() -> ValueType {
        V::value_type().nullable()
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, SettingValue::to_value)
    }

    fn from_value(value: Value) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        V::from_value(value).map(Some)
    }
}
