//! Streaming reader: the FIT wire-format state machine.

use std::any::Any;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use either::Either::{Left, Right};
use tartan_bitfield::bitfield;
use tracing::{debug, trace};
use zerocopy::FromBytes;

use crate::check::{self, CrcCheck};
use crate::error::Error;
use crate::processors::{DataProcessor, DefaultDataProcessor};
use crate::profile::{self, Component, Field};
use crate::records::{
    FitChunk, FitCrc, FitDataMessage, FitDefinitionMessage, FitHeader, Frame,
};
use crate::types::{
    AnyFieldDefinition, DevDataType, DevField, DevFieldDefinition, Endian, FieldData,
    FieldDefinition, FieldRef, Value, base_type_or_byte,
};

/// Delay before retrying a read that would block.
const NONBLOCKING_READ_DELAY: Duration = Duration::from_millis(60);

/// Reader configuration.
pub struct ReaderOptions {
    pub check_crc: CrcCheck,
    /// Attach the raw bytes of each frame as a [`FitChunk`].
    pub keep_raw_chunks: bool,
    /// Post-decode hooks; `None` disables processing entirely.
    pub processor: Option<Box<dyn DataProcessor>>,
    /// Opaque scratch container handed to processor hooks; never inspected by
    /// the reader itself.
    pub data_bag: Box<dyn Any>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            check_crc: CrcCheck::default(),
            keep_raw_chunks: false,
            processor: Some(Box::new(DefaultDataProcessor)),
            data_bag: Box::new(HashMap::<String, String>::new()),
        }
    }
}

/// The one-byte record header, in either of its two forms.
#[derive(Debug, Clone, Copy)]
struct RecordHeader {
    is_definition: bool,
    is_developer_data: bool,
    local_mesg_num: u8,
    time_offset: Option<u8>,
}

fn parse_record_header(r: u8) -> RecordHeader {
    bitfield! {
        struct CompressedHeader(u8) {
            [0..5] time_offset: u8,
            [5..7] local_mesg_num: u8,
            [7] is_compressed,
        }
    }

    let header = CompressedHeader(r);

    if header.is_compressed() {
        RecordHeader {
            is_definition: false,
            is_developer_data: false,
            local_mesg_num: header.local_mesg_num(),
            time_offset: Some(header.time_offset()),
        }
    } else {
        bitfield! {
            struct NormalHeader(u8) {
                [0..4] local_mesg_num: u8,
                [5] is_developer_data,
                [6] is_definition,
            }
        }

        let header = NormalHeader(r);

        RecordHeader {
            is_definition: header.is_definition(),
            is_developer_data: header.is_developer_data(),
            local_mesg_num: header.local_mesg_num(),
            time_offset: None,
        }
    }
}

/// A lazy, pull-based FIT decoder over any byte source.
///
/// Each pull of the iterator consumes bytes up to the next frame boundary and
/// yields exactly one [`Frame`]: a file header, a definition message, a data
/// message, or a CRC footer. Back-to-back chained files in one stream are
/// handled transparently; a new [`Frame::Header`] marks each file boundary.
///
/// ```ignore
/// let mut reader = FitReader::open("activity.fit")?;
/// for frame in &mut reader {
///     if let Frame::Data(message) = frame? {
///         // decoded values, ready for use
///     }
/// }
/// ```
pub struct FitReader<R> {
    src: R,
    check_crc: CrcCheck,
    keep_raw: bool,
    processor: Option<Box<dyn DataProcessor>>,
    data_bag: Box<dyn Any>,
    done: bool,

    // Stream position and per-frame chunk bookkeeping.
    read_offset: usize,
    chunk_index: usize,
    chunk_offset: usize,
    chunk_size: usize,
    chunk_buf: Vec<u8>,

    // Per-file state, reset at every file boundary.
    crc: u16,
    header: Option<FitHeader>,
    file_id: Option<FitDataMessage>,
    body_bytes_left: u32,
    local_mesg_defs: HashMap<u8, Arc<FitDefinitionMessage>>,
    local_dev_types: HashMap<u8, DevDataType>,
    compressed_ts_accumulator: u64,
    accumulators: HashMap<u16, HashMap<u8, u64>>,
    last_timestamp: u64,
    hr_start_timestamp: u64,
}

impl FitReader<BufReader<File>> {
    /// Open a FIT file from disk with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> FitReader<R> {
    /// Decode from a byte source with default options.
    pub fn new(src: R) -> Self {
        Self::with_options(src, ReaderOptions::default())
    }

    pub fn with_options(src: R, options: ReaderOptions) -> Self {
        Self {
            src,
            check_crc: options.check_crc,
            keep_raw: options.keep_raw_chunks,
            processor: options.processor,
            data_bag: options.data_bag,
            done: false,
            read_offset: 0,
            chunk_index: 0,
            chunk_offset: 0,
            chunk_size: 0,
            chunk_buf: Vec::new(),
            crc: check::CRC_START,
            header: None,
            file_id: None,
            body_bytes_left: 0,
            local_mesg_defs: HashMap::new(),
            local_dev_types: HashMap::new(),
            compressed_ts_accumulator: 0,
            accumulators: HashMap::new(),
            last_timestamp: 0,
            hr_start_timestamp: 0,
        }
    }

    /// The header of the file currently being read.
    pub fn last_header(&self) -> Option<&FitHeader> {
        self.header.as_ref()
    }

    /// Raw value of the last `timestamp` field decoded, in FIT seconds.
    pub fn last_timestamp(&self) -> u64 {
        self.last_timestamp
    }

    /// The last `file_id` data message decoded.
    pub fn file_id(&self) -> Option<&FitDataMessage> {
        self.file_id.as_ref()
    }

    /// Local message definitions of the current file.
    pub fn local_mesg_defs(&self) -> &HashMap<u8, Arc<FitDefinitionMessage>> {
        &self.local_mesg_defs
    }

    /// Developer types of the current file.
    pub fn local_dev_types(&self) -> &HashMap<u8, DevDataType> {
        &self.local_dev_types
    }

    pub fn processor(&self) -> Option<&dyn DataProcessor> {
        self.processor.as_deref()
    }

    pub fn data_bag(&self) -> &dyn Any {
        &*self.data_bag
    }

    pub fn data_bag_mut(&mut self) -> &mut dyn Any {
        &mut *self.data_bag
    }

    /// Stop iteration and clear all decoding state. Idempotent; the byte
    /// source itself is released when the reader is dropped.
    pub fn close(&mut self) {
        self.done = true;
        self.read_offset = 0;
        self.chunk_index = 0;
        self.chunk_offset = 0;
        self.chunk_size = 0;
        self.chunk_buf = Vec::new();
        self.crc = check::CRC_START;
        self.header = None;
        self.file_id = None;
        self.body_bytes_left = 0;
        self.local_mesg_defs.clear();
        self.local_dev_types.clear();
        self.compressed_ts_accumulator = 0;
        self.accumulators.clear();
        self.last_timestamp = 0;
        self.hr_start_timestamp = 0;
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        debug_assert_eq!(self.chunk_size, 0);

        if self.header.is_none() {
            return match self.read_header()? {
                None => Ok(None),
                Some(header) => {
                    self.header = Some(header.clone());
                    Ok(Some(Frame::Header(header)))
                }
            };
        }

        if self.body_bytes_left > 0 {
            return Ok(Some(self.read_record()?));
        }

        let crc = self.read_crc()?;

        // End of this chained file; expect a fresh header next.
        self.header = None;

        Ok(Some(Frame::Crc(crc)))
    }

    fn read_header(&mut self) -> Result<Option<FitHeader>, Error> {
        self.crc = check::CRC_START;
        self.body_bytes_left = 0;
        self.local_mesg_defs.clear();
        self.local_dev_types.clear();
        self.compressed_ts_accumulator = 0;
        self.accumulators.clear();
        self.last_timestamp = 0;
        self.hr_start_timestamp = 0;

        let fixed: [u8; 12] = match self.read_array() {
            Ok(bytes) => bytes,
            // A clean EOF where a header would begin ends the stream.
            Err(Error::UnexpectedEof { got: 0, .. }) => return Ok(None),
            Err(Error::UnexpectedEof { .. }) => return Err(Error::Header("file too small")),
            Err(e) => return Err(e),
        };

        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct RawHeader {
            header_size: u8,
            proto_ver: u8,
            profile_ver: [u8; 2],
            body_size: [u8; 4],
            magic: [u8; 4],
        }

        let RawHeader {
            header_size,
            proto_ver,
            profile_ver,
            body_size,
            magic,
        } = zerocopy::transmute!(fixed);

        if header_size < 12 || &magic != b".FIT" {
            return Err(Error::Header("not a FIT file"));
        }

        let profile_ver = u16::from_le_bytes(profile_ver);
        let body_size = u32::from_le_bytes(body_size);

        // The extended header holds a CRC over the fixed part, then possibly
        // further reserved bytes.
        let extra_size = header_size as usize - 12;
        let mut crc = None;
        let mut crc_matched = None;
        if extra_size > 0 {
            if extra_size < 2 {
                return Err(Error::Header("unsupported extended header"));
            }

            let extra = self.read_bytes(extra_size)?;
            let found = u16::from_le_bytes([extra[0], extra[1]]);

            // A zero CRC means absent, per the SDK.
            if found != 0 {
                crc = Some(found);

                if self.check_crc.is_computing() {
                    let calculated = check::compute_crc(check::CRC_START, &fixed);
                    crc_matched = Some(calculated == found);

                    if self.check_crc == CrcCheck::Enabled && calculated != found {
                        return Err(Error::Crc { found, calculated });
                    }
                }
            }
        }

        let header = FitHeader {
            header_size,
            proto_ver: (proto_ver >> 4, proto_ver & 0x0F),
            profile_ver: ((profile_ver / 100) as u8, (profile_ver % 100) as u8),
            body_size,
            crc,
            crc_matched,
            chunk: self.take_chunk(),
        };

        self.body_bytes_left = body_size;

        debug!(header_size, body_size, "read FIT file header");

        if let Some(processor) = self.processor.as_mut() {
            processor.on_header(&mut *self.data_bag, &header);
        }

        Ok(Some(header))
    }

    fn read_crc(&mut self) -> Result<FitCrc, Error> {
        let calculated = self.crc;
        let found = u16::from_le_bytes(self.read_array()?);

        if self.check_crc == CrcCheck::Enabled && calculated != found {
            return Err(Error::Crc { found, calculated });
        }

        trace!(found, calculated, "read CRC footer");

        let crc = FitCrc {
            crc: found,
            matched: calculated == found,
            chunk: self.take_chunk(),
        };

        if let Some(processor) = self.processor.as_mut() {
            processor.on_crc(&mut *self.data_bag, &crc);
        }

        Ok(crc)
    }

    fn read_record(&mut self) -> Result<Frame, Error> {
        let record_header = parse_record_header(self.read_array::<1>()?[0]);

        if record_header.is_definition {
            let def_mesg = self.read_definition_message(record_header)?;
            Ok(Frame::Definition(def_mesg))
        } else {
            let message = self.read_data_message(record_header)?;

            match message.def_mesg.global_mesg_num {
                profile::MESG_NUM_DEVELOPER_DATA_ID => self.register_dev_data_id(&message)?,
                profile::MESG_NUM_FIELD_DESCRIPTION => self.register_dev_field(&message)?,
                _ => {}
            }

            Ok(Frame::Data(message))
        }
    }

    fn read_definition_message(
        &mut self,
        record_header: RecordHeader,
    ) -> Result<Arc<FitDefinitionMessage>, Error> {
        let fixed: [u8; 5] = self.read_array()?;

        #[repr(C, packed)]
        #[derive(FromBytes)]
        struct RawDefinition {
            _reserved: u8,
            architecture: u8,
            global_mesg_num: [u8; 2],
            num_fields: u8,
        }

        let RawDefinition {
            architecture,
            global_mesg_num,
            num_fields,
            ..
        } = zerocopy::transmute!(fixed);

        let endian = if architecture == 0 {
            Endian::Little
        } else {
            Endian::Big
        };
        let global_mesg_num = match endian {
            Endian::Little => u16::from_le_bytes(global_mesg_num),
            Endian::Big => u16::from_be_bytes(global_mesg_num),
        };

        let mesg_type = profile::mesg_type(global_mesg_num);

        let mut field_defs = Vec::with_capacity(num_fields as usize);
        for _ in 0..num_fields {
            let [def_num, size, base_type_id] = self.read_array::<3>()?;

            let field = mesg_type.and_then(|t| t.field(def_num));
            let base_type = base_type_or_byte(base_type_id);

            if size == 0 || size % base_type.size != 0 {
                return Err(Error::Parse {
                    offset: self.chunk_offset,
                    reason: format!(
                        "invalid size {size} for field of type {} (expected a non-zero \
                         multiple of {})",
                        base_type.name, base_type.size
                    ),
                });
            }

            // Accumulating components restart from zero whenever their
            // message is (re)defined.
            if let Some(field) = field {
                for component in field.components {
                    if component.accumulate {
                        self.accumulators
                            .entry(global_mesg_num)
                            .or_default()
                            .insert(component.def_num, 0);
                    }
                }
            }

            field_defs.push(FieldDefinition {
                field,
                def_num,
                base_type,
                size,
            });
        }

        let mut dev_field_defs = Vec::new();
        if record_header.is_developer_data {
            let num_dev_fields = self.read_array::<1>()?[0];

            for _ in 0..num_dev_fields {
                let [def_num, size, dev_data_index] = self.read_array::<3>()?;

                let field = self.dev_field(dev_data_index, def_num)?;
                dev_field_defs.push(DevFieldDefinition {
                    field,
                    dev_data_index,
                    def_num,
                    size,
                });
            }
        }

        self.consume_body()?;

        let def_mesg = Arc::new(FitDefinitionMessage {
            is_developer_data: record_header.is_developer_data,
            local_mesg_num: record_header.local_mesg_num,
            time_offset: record_header.time_offset,
            mesg_type,
            global_mesg_num,
            endian,
            field_defs,
            dev_field_defs,
            chunk: self.take_chunk(),
        });

        trace!(
            local_mesg_num = record_header.local_mesg_num,
            global_mesg_num,
            "registered local message definition"
        );

        // Redefinition is legal and replaces the previous entry outright.
        self.local_mesg_defs
            .insert(record_header.local_mesg_num, Arc::clone(&def_mesg));

        Ok(def_mesg)
    }

    fn read_data_message(&mut self, record_header: RecordHeader) -> Result<FitDataMessage, Error> {
        let def_mesg = self
            .local_mesg_defs
            .get(&record_header.local_mesg_num)
            .cloned()
            .ok_or_else(|| Error::Parse {
                offset: self.chunk_offset,
                reason: format!("local message {} not defined", record_header.local_mesg_num),
            })?;

        let raw_values = self.read_raw_values(&def_mesg)?;
        let mut fields = Vec::with_capacity(raw_values.len());

        let slots = def_mesg
            .field_defs
            .iter()
            .map(Left)
            .chain(def_mesg.dev_field_defs.iter().map(Right));

        for (slot, raw_value) in slots.zip(raw_values.iter()) {
            let declared = match slot {
                Left(def) => def.field.map(FieldRef::Field),
                Right(def) => Some(FieldRef::Dev(Arc::clone(&def.field))),
            };

            let (field, parent_field, value) = match declared {
                Some(field) => {
                    let (field, parent_field) = resolve_subfield(field, &def_mesg, &raw_values);

                    for component in field.components() {
                        self.expand_component(
                            component,
                            &def_mesg,
                            raw_value,
                            &raw_values,
                            &mut fields,
                        );
                    }

                    let rendered = field.render(raw_value.as_ref());
                    let value = apply_scale_offset(field.scale(), field.offset(), rendered);

                    (Some(field), parent_field, value)
                }
                None => (None, None, raw_value.clone()),
            };

            if slot.either(|d| d.def_num, |d| d.def_num) == profile::FIELD_NUM_TIMESTAMP {
                if let Some(ts) = raw_value.as_ref().and_then(Value::as_u64) {
                    self.last_timestamp = ts;
                    self.compressed_ts_accumulator = ts;
                }
            } else if def_mesg.global_mesg_num == profile::MESG_NUM_HR
                && slot.is_left()
                && slot.either(|d| d.def_num, |d| d.def_num)
                    == profile::FIELD_NUM_HR_EVENT_TIMESTAMP
            {
                // Slices of event_timestamp_12 resume from here.
                self.hr_start_timestamp = self.last_timestamp;
            }

            let units = field
                .as_ref()
                .and_then(field_units);

            fields.push(FieldData {
                field_def: Some(match slot {
                    Left(def) => AnyFieldDefinition::Native(def.clone()),
                    Right(def) => AnyFieldDefinition::Developer(def.clone()),
                }),
                field,
                parent_field,
                value,
                raw_value: raw_value.clone(),
                units,
            });
        }

        // A compressed-timestamp header carries a 5-bit delta against the
        // last known timestamp; reconstruct and append the full field.
        if let Some(time_offset) = record_header.time_offset {
            let ts = apply_compressed_accumulation(
                time_offset.into(),
                self.compressed_ts_accumulator,
                5,
            );
            self.compressed_ts_accumulator = ts;

            let field = FieldRef::Field(&profile::FIELD_TIMESTAMP);
            let value = field.render(Some(&Value::UInt(ts)));

            fields.push(FieldData {
                field_def: None,
                units: field_units(&field),
                field: Some(field),
                parent_field: None,
                value,
                raw_value: Some(Value::UInt(ts)),
            });
        }

        if let Some(processor) = self.processor.as_mut() {
            for field_data in &mut fields {
                processor.on_process_type(&mut *self.data_bag, field_data);
                processor.on_process_field(&mut *self.data_bag, field_data);
                processor.on_process_unit(&mut *self.data_bag, field_data);
            }
        }

        self.consume_body()?;

        let mut message = FitDataMessage {
            is_developer_data: record_header.is_developer_data,
            local_mesg_num: record_header.local_mesg_num,
            time_offset: record_header.time_offset,
            def_mesg,
            fields,
            chunk: self.take_chunk(),
        };

        if let Some(processor) = self.processor.as_mut() {
            processor.on_process_message(&mut *self.data_bag, &mut message);
        }

        if message.def_mesg.global_mesg_num == profile::MESG_NUM_FILE_ID {
            self.file_id = Some(message.clone());
        }

        Ok(message)
    }

    /// Read every field payload of a data message, in definition order.
    fn read_raw_values(
        &mut self,
        def_mesg: &FitDefinitionMessage,
    ) -> Result<Vec<Option<Value>>, Error> {
        let sizes = def_mesg
            .field_defs
            .iter()
            .map(|d| (d.size, d.base_type))
            .chain(def_mesg.dev_field_defs.iter().map(|d| (d.size, d.base_type())))
            .collect::<Vec<_>>();

        let mut raw_values = Vec::with_capacity(sizes.len());
        for (size, base_type) in sizes {
            let bytes = self.read_bytes(size as usize)?;
            raw_values.push(base_type.decode(&bytes, def_mesg.endian));
        }

        Ok(raw_values)
    }

    /// Expand one component of a field into its own auxiliary value.
    fn expand_component(
        &mut self,
        component: &'static Component,
        def_mesg: &FitDefinitionMessage,
        raw_value: &Option<Value>,
        raw_values: &[Option<Value>],
        fields: &mut Vec<FieldData>,
    ) {
        let sliced = match raw_value {
            None => None,
            Some(value) => match component.render(value) {
                Some(x) => Some(x),
                // Unsliceable parent shape; skip this component entirely.
                None => return,
            },
        };

        let sliced = match (component.accumulate, sliced) {
            (true, Some(x)) => {
                let accumulator = self
                    .accumulators
                    .entry(def_mesg.global_mesg_num)
                    .or_default()
                    .entry(component.def_num)
                    .or_insert(0);

                let x = apply_compressed_accumulation(x, *accumulator, component.bits);
                *accumulator = x;
                Some(x)
            }
            (_, x) => x,
        };

        // Scale and offset come from the component, not from the target
        // field, as they may differ.
        let cmp_raw_value =
            apply_scale_offset(component.scale, component.offset, sliced.map(Value::UInt));

        let Some(target) = def_mesg
            .mesg_type
            .and_then(|t| t.field(component.def_num))
        else {
            return;
        };

        let (cmp_field, cmp_parent) =
            resolve_subfield(FieldRef::Field(target), def_mesg, raw_values);
        let mut cmp_value = cmp_field.render(cmp_raw_value.as_ref());

        // hr.event_timestamp_12 slices are offsets from the whole-second
        // timestamp captured when hr.event_timestamp was last seen.
        if def_mesg.global_mesg_num == profile::MESG_NUM_HR
            && component.def_num == profile::FIELD_NUM_HR_EVENT_TIMESTAMP
            && self.hr_start_timestamp > 0
            && let Some(x) = cmp_value.as_ref().and_then(Value::as_f64)
        {
            cmp_value = Some(Value::Float(x + self.hr_start_timestamp as f64));
        }

        fields.push(FieldData {
            field_def: None,
            units: field_units(&cmp_field),
            field: Some(cmp_field),
            parent_field: cmp_parent,
            value: cmp_value,
            raw_value: cmp_raw_value,
        });
    }

    fn register_dev_data_id(&mut self, message: &FitDataMessage) -> Result<(), Error> {
        let dev_data_index = self.required_u8(message, "developer_data_index")?;
        let application_id = message.raw_value("application_id").cloned();

        debug!(dev_data_index, "registered developer data id");

        // Declare or overwrite, discarding any previous field descriptions.
        self.local_dev_types.insert(
            dev_data_index,
            DevDataType {
                dev_data_index,
                application_id,
                fields: HashMap::new(),
            },
        );

        Ok(())
    }

    fn register_dev_field(&mut self, message: &FitDataMessage) -> Result<(), Error> {
        let dev_data_index = self.required_u8(message, "developer_data_index")?;
        let def_num = self.required_u8(message, "field_definition_number")?;
        let base_type_id = self.required_u8(message, "fit_base_type_id")?;

        let name = message
            .raw_value("field_name")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| Error::Parse {
                offset: self.chunk_offset,
                reason: "field_description without a field_name".to_owned(),
            })?;

        let units = message
            .raw_value("units")
            .and_then(Value::as_str)
            .map(str::to_owned);
        let native_field_num = message
            .raw_value("native_field_num")
            .and_then(Value::as_u64)
            .and_then(|x| u8::try_from(x).ok());

        let Some(dev_type) = self.local_dev_types.get_mut(&dev_data_index) else {
            return Err(Error::Parse {
                offset: self.chunk_offset,
                reason: format!("developer data index {dev_data_index} not defined"),
            });
        };

        debug!(dev_data_index, def_num, field_name = %name, "registered developer field");

        // Declare or overwrite.
        dev_type.fields.insert(
            def_num,
            Arc::new(DevField {
                dev_data_index,
                name,
                def_num,
                base_type: base_type_or_byte(base_type_id),
                units,
                native_field_num,
            }),
        );

        Ok(())
    }

    /// A required small-integer field of a registry message.
    fn required_u8(&self, message: &FitDataMessage, name: &str) -> Result<u8, Error> {
        message
            .raw_value(name)
            .and_then(Value::as_u64)
            .and_then(|x| u8::try_from(x).ok())
            .ok_or_else(|| Error::Parse {
                offset: self.chunk_offset,
                reason: format!("{} without a valid {name}", message.name()),
            })
    }

    /// Resolve a developer field definition through the registry.
    fn dev_field(&self, dev_data_index: u8, def_num: u8) -> Result<Arc<DevField>, Error> {
        let dev_type =
            self.local_dev_types
                .get(&dev_data_index)
                .ok_or_else(|| Error::Parse {
                    offset: self.chunk_offset,
                    reason: format!(
                        "developer data index {dev_data_index} not defined \
                         (looking up field {def_num})"
                    ),
                })?;

        dev_type
            .fields
            .get(&def_num)
            .cloned()
            .ok_or_else(|| Error::Parse {
                offset: self.chunk_offset,
                reason: format!("no field {def_num} for developer data index {dev_data_index}"),
            })
    }

    /// Account a finished record against the declared body size.
    fn consume_body(&mut self) -> Result<(), Error> {
        self.body_bytes_left = self
            .body_bytes_left
            .checked_sub(self.chunk_size as u32)
            .ok_or_else(|| Error::Parse {
                offset: self.chunk_offset,
                reason: "record overruns the declared body size".to_owned(),
            })?;

        Ok(())
    }

    /// Close out the current frame: hand back its raw bytes when requested,
    /// and advance the chunk cursor.
    fn take_chunk(&mut self) -> Option<FitChunk> {
        let chunk = self.keep_raw.then(|| FitChunk {
            index: self.chunk_index,
            offset: self.chunk_offset,
            bytes: std::mem::take(&mut self.chunk_buf),
        });

        self.chunk_index += 1;
        self.chunk_offset += self.chunk_size;
        self.chunk_size = 0;

        chunk
    }

    /// Read exactly `n` bytes, retrying reads that would block, and fold them
    /// into the running CRC and chunk.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, Error> {
        debug_assert!(n > 0);

        let mut buf = vec![0; n];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    /// Fixed-size variant of [`read_bytes`](Self::read_bytes).
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        let mut buf = [0; N];
        self.fill(&mut buf)?;
        Ok(buf)
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        let mut got = 0;

        while got < buf.len() {
            match self.src.read(&mut buf[got..]) {
                Ok(0) => break,
                Ok(read) => got += read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(NONBLOCKING_READ_DELAY);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if got != buf.len() {
            return Err(Error::UnexpectedEof {
                expected: buf.len(),
                got,
                offset: self.read_offset,
            });
        }

        if self.check_crc.is_computing() {
            self.crc = check::compute_crc(self.crc, buf);
        }

        self.chunk_size += buf.len();
        self.read_offset += buf.len();

        if self.keep_raw {
            self.chunk_buf.extend_from_slice(buf);
        }

        Ok(())
    }
}

impl<R: Read> Iterator for FitReader<R> {
    type Item = Result<Frame, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Resolve a field into the subfield activated by the decoded values of its
/// reference fields, if any.
///
/// Returns the winning subfield together with the original field, or the
/// field itself with no parent.
fn resolve_subfield(
    field: FieldRef,
    def_mesg: &FitDefinitionMessage,
    raw_values: &[Option<Value>],
) -> (FieldRef, Option<&'static Field>) {
    if let FieldRef::Field(f) = &field {
        for subfield in f.subfields {
            for ref_field in subfield.ref_fields {
                for (field_def, raw_value) in def_mesg.field_defs.iter().zip(raw_values) {
                    if field_def.def_num == ref_field.def_num
                        && raw_value.as_ref().and_then(Value::as_u64) == Some(ref_field.raw_value)
                    {
                        return (FieldRef::SubField(subfield), Some(*f));
                    }
                }
            }
        }
    }

    (field, None)
}

/// Reconstruct a monotonic counter from a low-bit delta: the nearest value of
/// the full-width counter, at or after the accumulated one, whose low
/// `num_bits` equal `raw_value`.
fn apply_compressed_accumulation(raw_value: u64, accumulation: u64, num_bits: u8) -> u64 {
    let max_value = 1 << num_bits;
    let max_mask = max_value - 1;

    let mut base_value = raw_value + (accumulation & !max_mask);
    if raw_value < (accumulation & max_mask) {
        base_value += max_value;
    }

    base_value
}

/// Apply scale then offset to a numeric value, element-wise over tuples.
fn apply_scale_offset(
    scale: Option<f64>,
    offset: Option<f64>,
    value: Option<Value>,
) -> Option<Value> {
    fn apply(scale: Option<f64>, offset: Option<f64>, value: Value) -> Value {
        match value {
            Value::Tuple(elements) => Value::Tuple(
                elements
                    .into_iter()
                    .map(|e| e.map(|v| apply(scale, offset, v)))
                    .collect(),
            ),
            value => match value.as_f64() {
                Some(mut x) => {
                    if let Some(scale) = scale {
                        x /= scale;
                    }
                    if let Some(offset) = offset {
                        x -= offset;
                    }
                    Value::Float(x)
                }
                None => value,
            },
        }
    }

    if scale.is_none() && offset.is_none() {
        return value;
    }

    Some(apply(scale, offset, value?))
}

/// Initial display units of a field value.
fn field_units(field: &FieldRef) -> Option<Cow<'static, str>> {
    match field {
        FieldRef::Field(f) => f.units.map(Cow::Borrowed),
        FieldRef::SubField(f) => f.units.map(Cow::Borrowed),
        FieldRef::Dev(f) => f.units.clone().map(Cow::Owned),
    }
}
