//! Frames emitted while decoding a FIT stream.

use std::borrow::Cow;
use std::sync::Arc;

use crate::profile::MesgType;
use crate::types::{DevFieldDefinition, Endian, FieldData, FieldDefinition, Value};

/// Raw-bytes echo of one emitted frame.
///
/// Concatenating the chunks of every frame of a well-formed stream, in
/// emission order, reproduces the stream byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitChunk {
    /// Ordinal of the frame within the stream.
    pub index: usize,
    /// Absolute byte offset of the frame.
    pub offset: usize,
    pub bytes: Vec<u8>,
}

/// A decoded FIT file header, marking the start of a (possibly chained) file.
#[derive(Debug, Clone)]
pub struct FitHeader {
    pub header_size: u8,
    /// Protocol version, `(major, minor)`.
    pub proto_ver: (u8, u8),
    /// Profile version, `(major, minor)`.
    pub profile_ver: (u8, u8),
    /// Byte count of the records between header and CRC footer.
    pub body_size: u32,
    /// Header CRC; a zero on the wire means absent.
    pub crc: Option<u16>,
    /// Whether the header CRC matched; unset when absent or not computed.
    pub crc_matched: Option<bool>,
    pub chunk: Option<FitChunk>,
}

/// A CRC footer.
#[derive(Debug, Clone)]
pub struct FitCrc {
    pub crc: u16,
    /// Meaningless when CRC checking is disabled.
    pub matched: bool,
    pub chunk: Option<FitChunk>,
}

/// A definition message: the layout of subsequent data messages bound to the
/// same local message number.
#[derive(Debug, Clone)]
pub struct FitDefinitionMessage {
    pub is_developer_data: bool,
    pub local_mesg_num: u8,
    pub time_offset: Option<u8>,
    /// Profile declaration, when the global message number is catalogued.
    pub mesg_type: Option<&'static MesgType>,
    pub global_mesg_num: u16,
    pub endian: Endian,
    pub field_defs: Vec<FieldDefinition>,
    pub dev_field_defs: Vec<DevFieldDefinition>,
    pub chunk: Option<FitChunk>,
}

impl FitDefinitionMessage {
    /// Profile name of the message, or `unknown_<global_mesg_num>`.
    pub fn name(&self) -> Cow<'static, str> {
        match self.mesg_type {
            Some(t) => Cow::Borrowed(t.name),
            None => Cow::Owned(format!("unknown_{}", self.global_mesg_num)),
        }
    }
}

/// A data message with its rendered field values.
#[derive(Debug, Clone)]
pub struct FitDataMessage {
    pub is_developer_data: bool,
    pub local_mesg_num: u8,
    pub time_offset: Option<u8>,
    /// The definition this message was decoded against.
    pub def_mesg: Arc<FitDefinitionMessage>,
    /// Values in definition order, component expansions preceding their
    /// parent, a synthesized timestamp last.
    pub fields: Vec<FieldData>,
    pub chunk: Option<FitChunk>,
}

impl FitDataMessage {
    /// Profile name of the message, or `unknown_<global_mesg_num>`.
    pub fn name(&self) -> Cow<'static, str> {
        self.def_mesg.name()
    }

    pub fn mesg_type(&self) -> Option<&'static MesgType> {
        self.def_mesg.mesg_type
    }

    /// The first field answering to `name`, including subfield and
    /// parent-field names.
    pub fn field(&self, name: &str) -> Option<&FieldData> {
        self.fields.iter().find(|f| f.is_named(name))
    }

    /// The first field answering to definition number `num`.
    pub fn field_by_num(&self, num: u8) -> Option<&FieldData> {
        self.fields.iter().find(|f| f.has_def_num(num))
    }

    /// Shorthand for the rendered value of a named field.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(|f| f.value.as_ref())
    }

    /// Shorthand for the raw value of a named field.
    pub fn raw_value(&self, name: &str) -> Option<&Value> {
        self.field(name).and_then(|f| f.raw_value.as_ref())
    }
}

/// One frame of a FIT stream.
///
/// A well-formed stream emits, per chained file, a header, a run of
/// definition and data messages, and a CRC footer.
#[derive(Debug, Clone)]
pub enum Frame {
    Header(FitHeader),
    Definition(Arc<FitDefinitionMessage>),
    Data(FitDataMessage),
    Crc(FitCrc),
}

impl Frame {
    pub fn chunk(&self) -> Option<&FitChunk> {
        match self {
            Self::Header(f) => f.chunk.as_ref(),
            Self::Definition(f) => f.chunk.as_ref(),
            Self::Data(f) => f.chunk.as_ref(),
            Self::Crc(f) => f.chunk.as_ref(),
        }
    }

    pub fn as_header(&self) -> Option<&FitHeader> {
        match self {
            Self::Header(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_definition(&self) -> Option<&FitDefinitionMessage> {
        match self {
            Self::Definition(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&FitDataMessage> {
        match self {
            Self::Data(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_crc(&self) -> Option<&FitCrc> {
        match self {
            Self::Crc(f) => Some(f),
            _ => None,
        }
    }
}
