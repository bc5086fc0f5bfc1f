//! Post-decode hooks for semantic conversions.

use std::any::Any;
use std::borrow::Cow;

use chrono::{DateTime, NaiveTime};

use crate::records::{FitCrc, FitDataMessage, FitHeader};
use crate::types::{FieldData, Value};

/// Seconds between the Unix epoch and the FIT reference instant,
/// UTC 1989-12-31 00:00:00.
pub const FIT_UTC_REFERENCE: i64 = 631_065_600;

/// Raw `date_time` values below this are relative offsets, not absolute times.
pub const FIT_DATETIME_MIN: u64 = 0x1000_0000;

/// Hooks invoked by the reader after decoding.
///
/// Per data message the reader dispatches, for each field value in order, the
/// type, field and unit hooks, then the message hook once. All hooks default
/// to no-ops.
///
/// `bag` is the reader's data bag: an opaque scratch container for processors
/// that cannot hold per-stream state of their own (an instance shared between
/// readers, for example).
#[allow(unused_variables)]
pub trait DataProcessor {
    fn on_header(&mut self, bag: &mut dyn Any, header: &FitHeader) {}

    fn on_crc(&mut self, bag: &mut dyn Any, crc: &FitCrc) {}

    /// Convert a value according to its profile type (e.g. `date_time`).
    fn on_process_type(&mut self, bag: &mut dyn Any, field_data: &mut FieldData) {}

    /// Convert a value according to its field name (e.g. `distance`).
    fn on_process_field(&mut self, bag: &mut dyn Any, field_data: &mut FieldData) {}

    /// Convert a value according to its units (e.g. `semicircles`).
    fn on_process_unit(&mut self, bag: &mut dyn Any, field_data: &mut FieldData) {}

    fn on_process_message(&mut self, bag: &mut dyn Any, message: &mut FitDataMessage) {}
}

/// Default processor: renders date/time and boolean profile types into
/// comfortable values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDataProcessor;

impl DataProcessor for DefaultDataProcessor {
    fn on_process_type(&mut self, _: &mut dyn Any, field_data: &mut FieldData) {
        let Some(type_name) = field_data
            .field
            .as_ref()
            .and_then(|f| f.field_type())
            .map(|t| t.name)
        else {
            return;
        };

        match type_name {
            "date_time" => convert_date_time(field_data),
            "local_date_time" => convert_local_date_time(field_data),
            "localtime_into_day" => convert_localtime_into_day(field_data),
            "bool" => convert_bool(field_data),
            _ => {}
        }
    }
}

fn convert_date_time(field_data: &mut FieldData) {
    if let Some(Value::UInt(secs)) = &field_data.value
        && *secs >= FIT_DATETIME_MIN
        && let Some(dt) = DateTime::from_timestamp(FIT_UTC_REFERENCE + *secs as i64, 0)
    {
        field_data.value = Some(Value::DateTime(dt));
        field_data.units = None;
    }
}

// Device-local time: without the device timezone the instant cannot be placed,
// so it is decoded as if UTC, which is at least consistent.
fn convert_local_date_time(field_data: &mut FieldData) {
    if let Some(Value::UInt(secs)) = &field_data.value
        && let Some(dt) = DateTime::from_timestamp(FIT_UTC_REFERENCE + *secs as i64, 0)
    {
        field_data.value = Some(Value::DateTime(dt));
        field_data.units = None;
    }
}

fn convert_localtime_into_day(field_data: &mut FieldData) {
    if let Some(Value::UInt(secs)) = &field_data.value
        && let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(*secs as u32, 0)
    {
        field_data.value = Some(Value::TimeOfDay(time));
        field_data.units = None;
    }
}

fn convert_bool(field_data: &mut FieldData) {
    if let Some(Value::UInt(x)) = &field_data.value {
        field_data.value = Some(Value::Bool(*x != 0));
    }
}

/// The default conversions plus friendlier units: km/h speeds, km distances,
/// degrees for coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardUnitsDataProcessor {
    inner: DefaultDataProcessor,
}

impl DataProcessor for StandardUnitsDataProcessor {
    fn on_process_type(&mut self, bag: &mut dyn Any, field_data: &mut FieldData) {
        self.inner.on_process_type(bag, field_data);
    }

    fn on_process_field(&mut self, _: &mut dyn Any, field_data: &mut FieldData) {
        let name = field_data.name();

        if name == "speed" || name.ends_with("_speed") {
            map_numeric(&mut field_data.value, |x| x * 60.0 * 60.0 / 1000.0);
            field_data.units = Some(Cow::Borrowed("km/h"));
        } else if name == "distance" {
            map_numeric(&mut field_data.value, |x| x / 1000.0);
            field_data.units = Some(Cow::Borrowed("km"));
        }
    }

    fn on_process_unit(&mut self, _: &mut dyn Any, field_data: &mut FieldData) {
        if field_data.units.as_deref() == Some("semicircles") {
            map_numeric(&mut field_data.value, |x| x * 180.0 / (1u64 << 31) as f64);
            field_data.units = Some(Cow::Borrowed("deg"));
        }
    }
}

/// Apply `f` to a numeric value, element-wise over tuples.
fn map_numeric(value: &mut Option<Value>, f: impl Fn(f64) -> f64 + Copy) {
    match value {
        Some(Value::Tuple(elements)) => {
            for element in elements {
                map_numeric(element, f);
            }
        }
        Some(v) => {
            if let Some(x) = v.as_f64() {
                *v = Value::Float(f(x));
            }
        }
        None => {}
    }
}
