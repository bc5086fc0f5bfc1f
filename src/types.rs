//! Base types and dynamic field values.

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, NaiveTime, Utc};

use crate::profile::{Component, Field, FieldType, SubField};

/// Byte order of multibyte scalars, fixed per definition message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// A decoded field value.
///
/// Values read from the wire are "raw"; profile rendering may replace a raw
/// integer with its named constant, and scale/offset transformations produce
/// floats. Invalid-sentinel values are represented as `None` at the
/// [`FieldData`] level, so `Value` itself has no empty variant. A field
/// declared as an array of a base type decodes to [`Value::Tuple`], with
/// invalid elements mapped individually.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    DateTime(DateTime<Utc>),
    TimeOfDay(NaiveTime),
    Tuple(Vec<Option<Value>>),
}

impl Value {
    /// The value as an unsigned integer, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(x) => Some(*x),
            Self::Int(x) => (*x >= 0).then_some(*x as u64),
            _ => None,
        }
    }

    /// The value as a float, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::UInt(x) => Some(*x as f64),
            Self::Int(x) => Some(*x as f64),
            Self::Float(x) => Some(*x),
            _ => None,
        }
    }

    /// The value as a string slice, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(x) => Some(x),
            _ => None,
        }
    }
}

/// A FIT base type: the wire representation of a field element.
#[derive(Debug)]
pub struct BaseType {
    /// Base type identifier as found in definition messages.
    pub id: u8,
    pub name: &'static str,
    /// Size in bytes of one element.
    pub size: u8,
    parse: fn(&[u8], Endian) -> Option<Value>,
}

impl PartialEq for BaseType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl BaseType {
    /// Parse one element, mapping the invalid sentinel to `None`.
    ///
    /// `r` must hold exactly [`size`](Self::size) bytes.
    pub fn parse(&self, r: &[u8], endian: Endian) -> Option<Value> {
        (self.parse)(r, endian)
    }

    /// Decode a whole field payload of this base type.
    ///
    /// The payload length must be a multiple of the element size. A payload of
    /// several elements decodes to [`Value::Tuple`], except for the `byte` and
    /// `string` base types which always decode as a single unit.
    pub fn decode(&self, r: &[u8], endian: Endian) -> Option<Value> {
        match self.id {
            ID_BYTE => parse_byte(r, endian),
            ID_STRING => parse_string(r, endian),
            _ => {
                let size = self.size as usize;
                if r.len() == size {
                    self.parse(r, endian)
                } else {
                    Some(Value::Tuple(
                        r.chunks_exact(size).map(|c| self.parse(c, endian)).collect(),
                    ))
                }
            }
        }
    }
}

const ID_STRING: u8 = 0x07;
const ID_BYTE: u8 = 0x0D;

macro_rules! base_parser {
    ($name:ident, $t:ty, invalid: $invalid:expr, $variant:ident) => {
        fn $name(r: &[u8], endian: Endian) -> Option<Value> {
            let x = match endian {
                Endian::Little => <$t>::from_le_bytes(r.try_into().unwrap()),
                Endian::Big => <$t>::from_be_bytes(r.try_into().unwrap()),
            };

            (x != $invalid).then(|| Value::$variant(x.into()))
        }
    };
    ($name:ident, $t:ty, nan, $variant:ident) => {
        fn $name(r: &[u8], endian: Endian) -> Option<Value> {
            let x = match endian {
                Endian::Little => <$t>::from_le_bytes(r.try_into().unwrap()),
                Endian::Big => <$t>::from_be_bytes(r.try_into().unwrap()),
            };

            (!x.is_nan()).then(|| Value::$variant(x.into()))
        }
    };
}

base_parser!(parse_enum, u8, invalid: u8::MAX, UInt);
base_parser!(parse_sint8, i8, invalid: i8::MAX, Int);
base_parser!(parse_uint8, u8, invalid: u8::MAX, UInt);
base_parser!(parse_uint8z, u8, invalid: u8::MIN, UInt);
base_parser!(parse_sint16, i16, invalid: i16::MAX, Int);
base_parser!(parse_uint16, u16, invalid: u16::MAX, UInt);
base_parser!(parse_uint16z, u16, invalid: u16::MIN, UInt);
base_parser!(parse_sint32, i32, invalid: i32::MAX, Int);
base_parser!(parse_uint32, u32, invalid: u32::MAX, UInt);
base_parser!(parse_uint32z, u32, invalid: u32::MIN, UInt);
base_parser!(parse_sint64, i64, invalid: i64::MAX, Int);
base_parser!(parse_uint64, u64, invalid: u64::MAX, UInt);
base_parser!(parse_uint64z, u64, invalid: u64::MIN, UInt);
base_parser!(parse_float32, f32, nan, Float);
base_parser!(parse_float64, f64, nan, Float);

/// NUL-padded UTF-8; decoded leniently, empty means invalid.
fn parse_string(r: &[u8], _: Endian) -> Option<Value> {
    let end = r.iter().position(|b| *b == 0).unwrap_or(r.len());
    let s = String::from_utf8_lossy(&r[..end]);

    (!s.is_empty()).then(|| Value::String(s.into_owned()))
}

/// Opaque bytes; all-0xFF means invalid.
fn parse_byte(r: &[u8], _: Endian) -> Option<Value> {
    r.iter()
        .any(|b| *b != u8::MAX)
        .then(|| Value::Bytes(r.to_vec()))
}

pub static BASE_TYPE_ENUM: BaseType = BaseType { id: 0x00, name: "enum", size: 1, parse: parse_enum };
pub static BASE_TYPE_SINT8: BaseType = BaseType { id: 0x01, name: "sint8", size: 1, parse: parse_sint8 };
pub static BASE_TYPE_UINT8: BaseType = BaseType { id: 0x02, name: "uint8", size: 1, parse: parse_uint8 };
pub static BASE_TYPE_STRING: BaseType = BaseType { id: 0x07, name: "string", size: 1, parse: parse_uint8z };
pub static BASE_TYPE_UINT8Z: BaseType = BaseType { id: 0x0A, name: "uint8z", size: 1, parse: parse_uint8z };
pub static BASE_TYPE_BYTE: BaseType = BaseType { id: 0x0D, name: "byte", size: 1, parse: parse_uint8 };
pub static BASE_TYPE_SINT16: BaseType = BaseType { id: 0x83, name: "sint16", size: 2, parse: parse_sint16 };
pub static BASE_TYPE_UINT16: BaseType = BaseType { id: 0x84, name: "uint16", size: 2, parse: parse_uint16 };
pub static BASE_TYPE_SINT32: BaseType = BaseType { id: 0x85, name: "sint32", size: 4, parse: parse_sint32 };
pub static BASE_TYPE_UINT32: BaseType = BaseType { id: 0x86, name: "uint32", size: 4, parse: parse_uint32 };
pub static BASE_TYPE_FLOAT32: BaseType = BaseType { id: 0x88, name: "float32", size: 4, parse: parse_float32 };
pub static BASE_TYPE_FLOAT64: BaseType = BaseType { id: 0x89, name: "float64", size: 8, parse: parse_float64 };
pub static BASE_TYPE_UINT16Z: BaseType = BaseType { id: 0x8B, name: "uint16z", size: 2, parse: parse_uint16z };
pub static BASE_TYPE_UINT32Z: BaseType = BaseType { id: 0x8C, name: "uint32z", size: 4, parse: parse_uint32z };
pub static BASE_TYPE_SINT64: BaseType = BaseType { id: 0x8E, name: "sint64", size: 8, parse: parse_sint64 };
pub static BASE_TYPE_UINT64: BaseType = BaseType { id: 0x8F, name: "uint64", size: 8, parse: parse_uint64 };
pub static BASE_TYPE_UINT64Z: BaseType = BaseType { id: 0x90, name: "uint64z", size: 8, parse: parse_uint64z };

static BASE_TYPES: [&BaseType; 17] = [
    &BASE_TYPE_ENUM,
    &BASE_TYPE_SINT8,
    &BASE_TYPE_UINT8,
    &BASE_TYPE_STRING,
    &BASE_TYPE_UINT8Z,
    &BASE_TYPE_BYTE,
    &BASE_TYPE_SINT16,
    &BASE_TYPE_UINT16,
    &BASE_TYPE_SINT32,
    &BASE_TYPE_UINT32,
    &BASE_TYPE_FLOAT32,
    &BASE_TYPE_FLOAT64,
    &BASE_TYPE_UINT16Z,
    &BASE_TYPE_UINT32Z,
    &BASE_TYPE_SINT64,
    &BASE_TYPE_UINT64,
    &BASE_TYPE_UINT64Z,
];

/// Look up a base type by its wire identifier.
pub fn base_type(id: u8) -> Option<&'static BaseType> {
    BASE_TYPES.iter().find(|b| b.id == id).copied()
}

/// Look up a base type, falling back to `byte` for unknown identifiers.
pub fn base_type_or_byte(id: u8) -> &'static BaseType {
    base_type(id).unwrap_or(&BASE_TYPE_BYTE)
}

/// One field slot of a definition message.
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// Matching profile declaration, when the message and field are known.
    pub field: Option<&'static Field>,
    pub def_num: u8,
    pub base_type: &'static BaseType,
    /// Total size in bytes; always a multiple of the base type size.
    pub size: u8,
}

/// One developer field slot of a definition message.
#[derive(Debug, Clone)]
pub struct DevFieldDefinition {
    pub field: Arc<DevField>,
    pub dev_data_index: u8,
    pub def_num: u8,
    pub size: u8,
}

impl DevFieldDefinition {
    pub fn base_type(&self) -> &'static BaseType {
        self.field.base_type
    }
}

/// Either kind of definition slot.
#[derive(Debug, Clone)]
pub enum AnyFieldDefinition {
    Native(FieldDefinition),
    Developer(DevFieldDefinition),
}

impl AnyFieldDefinition {
    pub fn def_num(&self) -> u8 {
        match self {
            Self::Native(d) => d.def_num,
            Self::Developer(d) => d.def_num,
        }
    }

    pub fn is_developer(&self) -> bool {
        matches!(self, Self::Developer(_))
    }
}

/// A developer field declared at runtime by a `field_description` message.
#[derive(Debug, Clone)]
pub struct DevField {
    pub dev_data_index: u8,
    pub name: String,
    pub def_num: u8,
    pub base_type: &'static BaseType,
    pub units: Option<String>,
    pub native_field_num: Option<u8>,
}

/// Developer data registered by a `developer_data_id` message.
#[derive(Debug, Clone)]
pub struct DevDataType {
    pub dev_data_index: u8,
    pub application_id: Option<Value>,
    pub fields: std::collections::HashMap<u8, Arc<DevField>>,
}

/// Handle to the declaration backing a field value.
#[derive(Debug, Clone)]
pub enum FieldRef {
    Field(&'static Field),
    SubField(&'static SubField),
    Dev(Arc<DevField>),
}

impl FieldRef {
    pub fn name(&self) -> &str {
        match self {
            Self::Field(f) => f.name,
            Self::SubField(f) => f.name,
            Self::Dev(f) => &f.name,
        }
    }

    pub fn def_num(&self) -> u8 {
        match self {
            Self::Field(f) => f.def_num,
            Self::SubField(f) => f.def_num,
            Self::Dev(f) => f.def_num,
        }
    }

    pub fn units(&self) -> Option<&str> {
        match self {
            Self::Field(f) => f.units,
            Self::SubField(f) => f.units,
            Self::Dev(f) => f.units.as_deref(),
        }
    }

    pub fn scale(&self) -> Option<f64> {
        match self {
            Self::Field(f) => f.scale,
            Self::SubField(f) => f.scale,
            Self::Dev(_) => None,
        }
    }

    pub fn offset(&self) -> Option<f64> {
        match self {
            Self::Field(f) => f.offset,
            Self::SubField(f) => f.offset,
            Self::Dev(_) => None,
        }
    }

    /// Profile type of the field; developer fields have none.
    pub fn field_type(&self) -> Option<&'static FieldType> {
        match self {
            Self::Field(f) => Some(f.field_type),
            Self::SubField(f) => Some(f.field_type),
            Self::Dev(_) => None,
        }
    }

    pub fn components(&self) -> &'static [Component] {
        match self {
            Self::Field(f) => f.components,
            Self::SubField(f) => f.components,
            Self::Dev(_) => &[],
        }
    }

    pub fn subfields(&self) -> &'static [SubField] {
        match self {
            Self::Field(f) => f.subfields,
            Self::SubField(_) | Self::Dev(_) => &[],
        }
    }

    /// Map a raw scalar to its named constant, when the profile declares one.
    pub fn render(&self, raw: Option<&Value>) -> Option<Value> {
        let raw = raw?;

        if let Some(name) = self
            .field_type()
            .and_then(|t| raw.as_u64().and_then(|x| t.value_name(x)))
        {
            return Some(Value::String(name.to_owned()));
        }

        Some(raw.clone())
    }
}

/// A single rendered value of a data message.
#[derive(Debug, Clone)]
pub struct FieldData {
    /// Definition slot this value was read from. Absent for values expanded
    /// from components or synthesized from a compressed-timestamp header.
    pub field_def: Option<AnyFieldDefinition>,
    /// Resolved declaration; a subfield when one was activated, the component
    /// target for expanded values. Absent for fields unknown to the profile.
    pub field: Option<FieldRef>,
    /// Original field when `field` is a resolved subfield.
    pub parent_field: Option<&'static Field>,
    pub value: Option<Value>,
    pub raw_value: Option<Value>,
    /// Display units; processors may rewrite or clear these.
    pub units: Option<Cow<'static, str>>,
}

impl FieldData {
    /// Display name: the declared name, or `unknown_<def_num>`.
    pub fn name(&self) -> Cow<'static, str> {
        match &self.field {
            Some(FieldRef::Field(f)) => Cow::Borrowed(f.name),
            Some(FieldRef::SubField(f)) => Cow::Borrowed(f.name),
            Some(FieldRef::Dev(f)) => Cow::Owned(f.name.clone()),
            None => Cow::Owned(match self.def_num() {
                Some(n) => format!("unknown_{n}"),
                None => "unknown".to_owned(),
            }),
        }
    }

    pub fn def_num(&self) -> Option<u8> {
        self.field_def
            .as_ref()
            .map(AnyFieldDefinition::def_num)
            .or_else(|| self.field.as_ref().map(FieldRef::def_num))
    }

    /// Whether this value answers to `name`, through its own declaration or
    /// the parent field of a resolved subfield.
    pub fn is_named(&self, name: &str) -> bool {
        if let Some(field) = &self.field
            && field.name() == name
        {
            return true;
        }

        if let Some(parent) = self.parent_field
            && parent.name == name
        {
            return true;
        }

        false
    }

    /// Whether this value answers to definition number `num`, directly or
    /// through the parent field of a resolved subfield.
    pub fn has_def_num(&self, num: u8) -> bool {
        self.def_num() == Some(num) || self.parent_field.is_some_and(|p| p.def_num == num)
    }
}
