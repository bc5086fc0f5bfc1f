//! A streaming decoder for Garmin's Flexible and Interoperable Data Transfer
//! files.
//!
//! Freehub reads a FIT byte stream lazily: each pull of a [`FitReader`]
//! decodes exactly one frame, be it a file header, a definition message, a
//! data message with rendered field values, or a CRC footer. Chained files
//! concatenated in one stream are handled transparently.
//!
//! Data messages come back with profile-resolved names, units, subfields and
//! component expansions, plus developer fields registered at runtime by the
//! stream itself. Pluggable [`processors`] post-process values into
//! comfortable shapes (UTC datetimes, friendlier units).

pub mod check;
pub mod error;
pub mod processors;
pub mod profile;
pub mod reader;
pub mod records;
pub mod types;

pub use check::{CrcCheck, compute_crc};
pub use error::Error;
pub use processors::{
    DataProcessor, DefaultDataProcessor, FIT_DATETIME_MIN, FIT_UTC_REFERENCE,
    StandardUnitsDataProcessor,
};
pub use reader::{FitReader, ReaderOptions};
pub use records::{FitChunk, FitCrc, FitDataMessage, FitDefinitionMessage, FitHeader, Frame};
pub use types::{FieldData, Value};
