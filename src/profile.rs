//! Profile catalogue: named message types, fields, subfields and components.
//!
//! A curated subset of the FIT global profile, covering the message types the
//! decoder itself relies on (`developer_data_id`, `field_description`, `hr`)
//! plus the common activity messages. Messages absent from the catalogue still
//! decode; their fields simply surface as `unknown_<def_num>` raw values.

use crate::types::{
    BASE_TYPE_BYTE, BASE_TYPE_ENUM, BASE_TYPE_SINT8, BASE_TYPE_SINT16, BASE_TYPE_SINT32,
    BASE_TYPE_STRING, BASE_TYPE_UINT8, BASE_TYPE_UINT8Z, BASE_TYPE_UINT16, BASE_TYPE_UINT32,
    BASE_TYPE_UINT32Z, BaseType, Value,
};

/// A named profile type, optionally mapping raw integers to named constants.
#[derive(Debug)]
pub struct FieldType {
    pub name: &'static str,
    pub base_type: &'static BaseType,
    pub values: &'static [(u64, &'static str)],
}

impl FieldType {
    /// The named constant for a raw value, if one is declared.
    pub fn value_name(&self, raw: u64) -> Option<&'static str> {
        self.values
            .iter()
            .find_map(|(x, name)| (*x == raw).then_some(*name))
    }
}

/// A bit slice of a composite field, expanding into its own field value.
#[derive(Debug)]
pub struct Component {
    /// Name of the target field, for readability; resolution goes through
    /// [`def_num`](Self::def_num).
    pub name: &'static str,
    /// Definition number of the target field within the same message.
    pub def_num: u8,
    pub bits: u8,
    pub bit_offset: u8,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub units: Option<&'static str>,
    /// Whether the slice is a low-bit delta of a monotonic counter.
    pub accumulate: bool,
}

impl Component {
    /// Extract this component's raw integer from its parent's raw value.
    ///
    /// Byte-array and tuple parents are assembled little-endian before
    /// slicing. Returns `None` when the parent value cannot be sliced, in
    /// which case the component is skipped.
    pub fn render(&self, raw: &Value) -> Option<u64> {
        let composite: u128 = match raw {
            Value::UInt(x) => (*x).into(),
            Value::Int(x) => u64::try_from(*x).ok()?.into(),
            Value::Bytes(bytes) => bytes
                .iter()
                .take(16)
                .rev()
                .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)),
            Value::Tuple(elements) => elements
                .iter()
                .map(|e| match e {
                    Some(Value::UInt(x)) => u8::try_from(*x).ok(),
                    _ => None,
                })
                .collect::<Option<Vec<u8>>>()?
                .iter()
                .rev()
                .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)),
            _ => return None,
        };

        let mask = (1u128 << self.bits) - 1;
        Some(((composite >> self.bit_offset) & mask) as u64)
    }
}

/// A reference activating a subfield: another field of the same message
/// holding a specific raw value.
#[derive(Debug)]
pub struct ReferenceField {
    pub def_num: u8,
    pub raw_value: u64,
}

/// A conditional alternate interpretation of a field.
#[derive(Debug)]
pub struct SubField {
    pub name: &'static str,
    /// Definition number of the field this subfield reinterprets.
    pub def_num: u8,
    pub field_type: &'static FieldType,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub units: Option<&'static str>,
    pub components: &'static [Component],
    pub ref_fields: &'static [ReferenceField],
}

/// A field declaration of a profile message.
#[derive(Debug)]
pub struct Field {
    pub name: &'static str,
    pub def_num: u8,
    pub field_type: &'static FieldType,
    pub scale: Option<f64>,
    pub offset: Option<f64>,
    pub units: Option<&'static str>,
    pub components: &'static [Component],
    pub subfields: &'static [SubField],
}

/// A profile message type.
#[derive(Debug)]
pub struct MesgType {
    pub name: &'static str,
    pub mesg_num: u16,
    pub fields: &'static [Field],
}

impl MesgType {
    /// Look up a field declaration by definition number.
    pub fn field(&self, def_num: u8) -> Option<&'static Field> {
        self.fields.iter().find(|f| f.def_num == def_num)
    }
}

pub const MESG_NUM_FILE_ID: u16 = 0;
pub const MESG_NUM_SESSION: u16 = 18;
pub const MESG_NUM_LAP: u16 = 19;
pub const MESG_NUM_RECORD: u16 = 20;
pub const MESG_NUM_EVENT: u16 = 21;
pub const MESG_NUM_ACTIVITY: u16 = 34;
pub const MESG_NUM_HR: u16 = 132;
pub const MESG_NUM_FIELD_DESCRIPTION: u16 = 206;
pub const MESG_NUM_DEVELOPER_DATA_ID: u16 = 207;

/// Definition number of the `timestamp` field, shared by all messages.
pub const FIELD_NUM_TIMESTAMP: u8 = 253;
/// Definition number of `hr.event_timestamp`.
pub const FIELD_NUM_HR_EVENT_TIMESTAMP: u8 = 9;

// Plain numeric types.

pub static TYPE_SINT8: FieldType = FieldType { name: "sint8", base_type: &BASE_TYPE_SINT8, values: &[] };
pub static TYPE_UINT8: FieldType = FieldType { name: "uint8", base_type: &BASE_TYPE_UINT8, values: &[] };
pub static TYPE_UINT8Z: FieldType = FieldType { name: "uint8z", base_type: &BASE_TYPE_UINT8Z, values: &[] };
pub static TYPE_SINT16: FieldType = FieldType { name: "sint16", base_type: &BASE_TYPE_SINT16, values: &[] };
pub static TYPE_UINT16: FieldType = FieldType { name: "uint16", base_type: &BASE_TYPE_UINT16, values: &[] };
pub static TYPE_SINT32: FieldType = FieldType { name: "sint32", base_type: &BASE_TYPE_SINT32, values: &[] };
pub static TYPE_UINT32: FieldType = FieldType { name: "uint32", base_type: &BASE_TYPE_UINT32, values: &[] };
pub static TYPE_UINT32Z: FieldType = FieldType { name: "uint32z", base_type: &BASE_TYPE_UINT32Z, values: &[] };
pub static TYPE_STRING: FieldType = FieldType { name: "string", base_type: &BASE_TYPE_STRING, values: &[] };
pub static TYPE_BYTE: FieldType = FieldType { name: "byte", base_type: &BASE_TYPE_BYTE, values: &[] };

// Time types, converted by the data processors.

pub static TYPE_DATE_TIME: FieldType =
    FieldType { name: "date_time", base_type: &BASE_TYPE_UINT32, values: &[] };
pub static TYPE_LOCAL_DATE_TIME: FieldType =
    FieldType { name: "local_date_time", base_type: &BASE_TYPE_UINT32, values: &[] };
pub static TYPE_LOCALTIME_INTO_DAY: FieldType =
    FieldType { name: "localtime_into_day", base_type: &BASE_TYPE_UINT32, values: &[] };
pub static TYPE_BOOL: FieldType =
    FieldType { name: "bool", base_type: &BASE_TYPE_UINT8, values: &[] };

pub static TYPE_MESSAGE_INDEX: FieldType =
    FieldType { name: "message_index", base_type: &BASE_TYPE_UINT16, values: &[] };

// Named enumerations.

pub static TYPE_FILE: FieldType = FieldType {
    name: "file",
    base_type: &BASE_TYPE_ENUM,
    values: &[
        (1, "device"),
        (2, "settings"),
        (3, "sport"),
        (4, "activity"),
        (5, "workout"),
        (6, "course"),
        (7, "schedules"),
        (9, "weight"),
        (10, "totals"),
        (11, "goals"),
        (14, "blood_pressure"),
        (15, "monitoring_a"),
        (20, "activity_summary"),
        (28, "monitoring_daily"),
        (32, "monitoring_b"),
        (34, "segment"),
        (35, "segment_list"),
    ],
};

pub static TYPE_MANUFACTURER: FieldType = FieldType {
    name: "manufacturer",
    base_type: &BASE_TYPE_UINT16,
    values: &[
        (1, "garmin"),
        (2, "garmin_fr405_antfs"),
        (3, "zephyr"),
        (6, "srm"),
        (7, "quarq"),
        (9, "saris"),
        (13, "dynastream_oem"),
        (15, "dynastream"),
        (23, "suunto"),
        (32, "wahoo_fitness"),
        (38, "sigma_sport"),
        (48, "pioneer"),
        (63, "specialized"),
        (69, "stages_cycling"),
        (76, "bryton"),
        (89, "tacx"),
        (255, "development"),
        (260, "zwift"),
        (263, "favero_electronics"),
        (265, "strava"),
    ],
};

pub static TYPE_GARMIN_PRODUCT: FieldType = FieldType {
    name: "garmin_product",
    base_type: &BASE_TYPE_UINT16,
    values: &[
        (1, "hrm1"),
        (1036, "edge500"),
        (1124, "fr110"),
        (1169, "edge800"),
        (1328, "fr910xt"),
        (1561, "edge510"),
        (1567, "edge810"),
        (1623, "fr620"),
        (1632, "fr220"),
        (1765, "fenix2"),
        (2067, "edge520"),
        (2147, "edge25"),
        (2530, "edge820"),
        (2604, "fenix5s"),
        (2697, "fenix5"),
        (2713, "edge1030"),
        (2886, "fr935"),
        (2900, "fenix5_plus"),
    ],
};

pub static TYPE_EVENT: FieldType = FieldType {
    name: "event",
    base_type: &BASE_TYPE_ENUM,
    values: &[
        (0, "timer"),
        (3, "workout"),
        (4, "workout_step"),
        (5, "power_down"),
        (6, "power_up"),
        (7, "off_course"),
        (8, "session"),
        (9, "lap"),
        (10, "course_point"),
        (11, "battery"),
        (12, "virtual_partner_pace"),
        (13, "hr_high_alert"),
        (14, "hr_low_alert"),
        (15, "speed_high_alert"),
        (16, "speed_low_alert"),
        (17, "power_high_alert"),
        (18, "power_low_alert"),
        (19, "recovery_hr"),
        (20, "battery_low"),
        (21, "time_duration_alert"),
        (22, "distance_duration_alert"),
        (23, "calorie_duration_alert"),
        (24, "activity"),
        (25, "fitness_equipment"),
        (26, "length"),
        (27, "user_marker"),
        (28, "span_marker"),
        (33, "sport_point"),
        (36, "calibration"),
        (42, "front_gear_change"),
        (43, "rear_gear_change"),
        (44, "rider_position_change"),
        (45, "elev_high_alert"),
        (46, "elev_low_alert"),
        (47, "comm_timeout"),
    ],
};

pub static TYPE_EVENT_TYPE: FieldType = FieldType {
    name: "event_type",
    base_type: &BASE_TYPE_ENUM,
    values: &[
        (0, "start"),
        (1, "stop"),
        (2, "consecutive_depreciated"),
        (3, "marker"),
        (4, "stop_all"),
        (5, "begin_depreciated"),
        (6, "end_depreciated"),
        (7, "end_all_depreciated"),
        (8, "stop_disable"),
        (9, "stop_disable_all"),
    ],
};

pub static TYPE_TIMER_TRIGGER: FieldType = FieldType {
    name: "timer_trigger",
    base_type: &BASE_TYPE_ENUM,
    values: &[(0, "manual"), (1, "auto"), (2, "fitness_equipment")],
};

pub static TYPE_SESSION_TRIGGER: FieldType = FieldType {
    name: "session_trigger",
    base_type: &BASE_TYPE_ENUM,
    values: &[
        (0, "activity_end"),
        (1, "manual"),
        (2, "auto_multi_sport"),
        (3, "fitness_equipment"),
    ],
};

pub static TYPE_SPORT: FieldType = FieldType {
    name: "sport",
    base_type: &BASE_TYPE_ENUM,
    values: &[
        (0, "generic"),
        (1, "running"),
        (2, "cycling"),
        (3, "transition"),
        (4, "fitness_equipment"),
        (5, "swimming"),
        (6, "basketball"),
        (7, "soccer"),
        (8, "tennis"),
        (9, "american_football"),
        (10, "training"),
        (11, "walking"),
        (17, "hiking"),
        (13, "alpine_skiing"),
    ],
};

pub static TYPE_SUB_SPORT: FieldType = FieldType {
    name: "sub_sport",
    base_type: &BASE_TYPE_ENUM,
    values: &[
        (0, "generic"),
        (1, "treadmill"),
        (2, "street"),
        (3, "trail"),
        (4, "track"),
        (5, "spin"),
        (6, "indoor_cycling"),
        (7, "road"),
        (8, "mountain"),
        (9, "downhill"),
        (10, "recumbent"),
        (11, "cyclocross"),
        (12, "hand_cycling"),
        (13, "track_cycling"),
    ],
};

pub static TYPE_ACTIVITY: FieldType = FieldType {
    name: "activity",
    base_type: &BASE_TYPE_ENUM,
    values: &[(0, "manual"), (1, "auto_multi_sport")],
};

/// The `timestamp` field common to all messages; also used to synthesize the
/// trailing field of compressed-timestamp records.
pub static FIELD_TIMESTAMP: Field = Field {
    name: "timestamp",
    def_num: FIELD_NUM_TIMESTAMP,
    field_type: &TYPE_DATE_TIME,
    scale: None,
    offset: None,
    units: Some("s"),
    components: &[],
    subfields: &[],
};

static FILE_ID_FIELDS: [Field; 7] = [
    Field {
        name: "type",
        def_num: 0,
        field_type: &TYPE_FILE,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "manufacturer",
        def_num: 1,
        field_type: &TYPE_MANUFACTURER,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "product",
        def_num: 2,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[SubField {
            name: "garmin_product",
            def_num: 2,
            field_type: &TYPE_GARMIN_PRODUCT,
            scale: None,
            offset: None,
            units: None,
            components: &[],
            ref_fields: &[
                ReferenceField { def_num: 1, raw_value: 1 },
                ReferenceField { def_num: 1, raw_value: 13 },
                ReferenceField { def_num: 1, raw_value: 15 },
            ],
        }],
    },
    Field {
        name: "serial_number",
        def_num: 3,
        field_type: &TYPE_UINT32Z,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "time_created",
        def_num: 4,
        field_type: &TYPE_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "number",
        def_num: 5,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "product_name",
        def_num: 8,
        field_type: &TYPE_STRING,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
];

static RECORD_FIELDS: [Field; 17] = [
    Field {
        name: "position_lat",
        def_num: 0,
        field_type: &TYPE_SINT32,
        scale: None,
        offset: None,
        units: Some("semicircles"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "position_long",
        def_num: 1,
        field_type: &TYPE_SINT32,
        scale: None,
        offset: None,
        units: Some("semicircles"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "altitude",
        def_num: 2,
        field_type: &TYPE_UINT16,
        scale: Some(5.0),
        offset: Some(500.0),
        units: Some("m"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "heart_rate",
        def_num: 3,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("bpm"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "cadence",
        def_num: 4,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("rpm"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "distance",
        def_num: 5,
        field_type: &TYPE_UINT32,
        scale: Some(100.0),
        offset: None,
        units: Some("m"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "speed",
        def_num: 6,
        field_type: &TYPE_UINT16,
        scale: Some(1000.0),
        offset: None,
        units: Some("m/s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "power",
        def_num: 7,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: Some("watts"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "compressed_speed_distance",
        def_num: 8,
        field_type: &TYPE_BYTE,
        scale: None,
        offset: None,
        units: None,
        components: &[
            Component {
                name: "speed",
                def_num: 6,
                bits: 12,
                bit_offset: 0,
                scale: Some(100.0),
                offset: None,
                units: Some("m/s"),
                accumulate: false,
            },
            Component {
                name: "distance",
                def_num: 5,
                bits: 12,
                bit_offset: 12,
                scale: Some(16.0),
                offset: None,
                units: Some("m"),
                accumulate: true,
            },
        ],
        subfields: &[],
    },
    Field {
        name: "grade",
        def_num: 9,
        field_type: &TYPE_SINT16,
        scale: Some(100.0),
        offset: None,
        units: Some("%"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "resistance",
        def_num: 10,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "time_from_course",
        def_num: 11,
        field_type: &TYPE_SINT32,
        scale: Some(1000.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "temperature",
        def_num: 13,
        field_type: &TYPE_SINT8,
        scale: None,
        offset: None,
        units: Some("C"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "cycles",
        def_num: 18,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("cycles"),
        components: &[Component {
            name: "total_cycles",
            def_num: 19,
            bits: 8,
            bit_offset: 0,
            scale: None,
            offset: None,
            units: Some("cycles"),
            accumulate: true,
        }],
        subfields: &[],
    },
    Field {
        name: "total_cycles",
        def_num: 19,
        field_type: &TYPE_UINT32,
        scale: None,
        offset: None,
        units: Some("cycles"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "enhanced_speed",
        def_num: 73,
        field_type: &TYPE_UINT32,
        scale: Some(1000.0),
        offset: None,
        units: Some("m/s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "enhanced_altitude",
        def_num: 78,
        field_type: &TYPE_UINT32,
        scale: Some(5.0),
        offset: Some(500.0),
        units: Some("m"),
        components: &[],
        subfields: &[],
    },
];

static EVENT_DATA_SUBFIELDS: [SubField; 8] = [
    SubField {
        name: "timer_trigger",
        def_num: 3,
        field_type: &TYPE_TIMER_TRIGGER,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        ref_fields: &[ReferenceField { def_num: 0, raw_value: 0 }],
    },
    SubField {
        name: "course_point_index",
        def_num: 3,
        field_type: &TYPE_MESSAGE_INDEX,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        ref_fields: &[ReferenceField { def_num: 0, raw_value: 10 }],
    },
    SubField {
        name: "battery_level",
        def_num: 3,
        field_type: &TYPE_UINT16,
        scale: Some(1000.0),
        offset: None,
        units: Some("V"),
        components: &[],
        ref_fields: &[ReferenceField { def_num: 0, raw_value: 11 }],
    },
    SubField {
        name: "virtual_partner_speed",
        def_num: 3,
        field_type: &TYPE_UINT16,
        scale: Some(1000.0),
        offset: None,
        units: Some("m/s"),
        components: &[],
        ref_fields: &[ReferenceField { def_num: 0, raw_value: 12 }],
    },
    SubField {
        name: "hr_high_alert",
        def_num: 3,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("bpm"),
        components: &[],
        ref_fields: &[ReferenceField { def_num: 0, raw_value: 13 }],
    },
    SubField {
        name: "hr_low_alert",
        def_num: 3,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("bpm"),
        components: &[],
        ref_fields: &[ReferenceField { def_num: 0, raw_value: 14 }],
    },
    SubField {
        name: "sport_point",
        def_num: 3,
        field_type: &TYPE_UINT32,
        scale: None,
        offset: None,
        units: None,
        components: &[
            Component {
                name: "score",
                def_num: 7,
                bits: 16,
                bit_offset: 0,
                scale: None,
                offset: None,
                units: None,
                accumulate: false,
            },
            Component {
                name: "opponent_score",
                def_num: 8,
                bits: 16,
                bit_offset: 16,
                scale: None,
                offset: None,
                units: None,
                accumulate: false,
            },
        ],
        ref_fields: &[ReferenceField { def_num: 0, raw_value: 33 }],
    },
    SubField {
        name: "gear_change_data",
        def_num: 3,
        field_type: &TYPE_UINT32,
        scale: None,
        offset: None,
        units: None,
        components: &[
            Component {
                name: "rear_gear_num",
                def_num: 11,
                bits: 8,
                bit_offset: 0,
                scale: None,
                offset: None,
                units: None,
                accumulate: false,
            },
            Component {
                name: "rear_gear",
                def_num: 12,
                bits: 8,
                bit_offset: 8,
                scale: None,
                offset: None,
                units: None,
                accumulate: false,
            },
            Component {
                name: "front_gear_num",
                def_num: 9,
                bits: 8,
                bit_offset: 16,
                scale: None,
                offset: None,
                units: None,
                accumulate: false,
            },
            Component {
                name: "front_gear",
                def_num: 10,
                bits: 8,
                bit_offset: 24,
                scale: None,
                offset: None,
                units: None,
                accumulate: false,
            },
        ],
        ref_fields: &[
            ReferenceField { def_num: 0, raw_value: 42 },
            ReferenceField { def_num: 0, raw_value: 43 },
        ],
    },
];

static EVENT_FIELDS: [Field; 11] = [
    Field {
        name: "event",
        def_num: 0,
        field_type: &TYPE_EVENT,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event_type",
        def_num: 1,
        field_type: &TYPE_EVENT_TYPE,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "data16",
        def_num: 2,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[Component {
            name: "data",
            def_num: 3,
            bits: 16,
            bit_offset: 0,
            scale: None,
            offset: None,
            units: None,
            accumulate: false,
        }],
        subfields: &[],
    },
    Field {
        name: "data",
        def_num: 3,
        field_type: &TYPE_UINT32,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &EVENT_DATA_SUBFIELDS,
    },
    Field {
        name: "event_group",
        def_num: 4,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "score",
        def_num: 7,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "opponent_score",
        def_num: 8,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "front_gear_num",
        def_num: 9,
        field_type: &TYPE_UINT8Z,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "front_gear",
        def_num: 10,
        field_type: &TYPE_UINT8Z,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "rear_gear_num",
        def_num: 11,
        field_type: &TYPE_UINT8Z,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "rear_gear",
        def_num: 12,
        field_type: &TYPE_UINT8Z,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
];

static SESSION_FIELDS: [Field; 20] = [
    Field {
        name: "event",
        def_num: 0,
        field_type: &TYPE_EVENT,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event_type",
        def_num: 1,
        field_type: &TYPE_EVENT_TYPE,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "start_time",
        def_num: 2,
        field_type: &TYPE_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "start_position_lat",
        def_num: 3,
        field_type: &TYPE_SINT32,
        scale: None,
        offset: None,
        units: Some("semicircles"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "start_position_long",
        def_num: 4,
        field_type: &TYPE_SINT32,
        scale: None,
        offset: None,
        units: Some("semicircles"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "sport",
        def_num: 5,
        field_type: &TYPE_SPORT,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "sub_sport",
        def_num: 6,
        field_type: &TYPE_SUB_SPORT,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "total_elapsed_time",
        def_num: 7,
        field_type: &TYPE_UINT32,
        scale: Some(1000.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "total_timer_time",
        def_num: 8,
        field_type: &TYPE_UINT32,
        scale: Some(1000.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "total_distance",
        def_num: 9,
        field_type: &TYPE_UINT32,
        scale: Some(100.0),
        offset: None,
        units: Some("m"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "total_calories",
        def_num: 11,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: Some("kcal"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "avg_speed",
        def_num: 14,
        field_type: &TYPE_UINT16,
        scale: Some(1000.0),
        offset: None,
        units: Some("m/s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "max_speed",
        def_num: 15,
        field_type: &TYPE_UINT16,
        scale: Some(1000.0),
        offset: None,
        units: Some("m/s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "avg_heart_rate",
        def_num: 16,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("bpm"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "max_heart_rate",
        def_num: 17,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("bpm"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "avg_cadence",
        def_num: 18,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("rpm"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "max_cadence",
        def_num: 19,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("rpm"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "trigger",
        def_num: 28,
        field_type: &TYPE_SESSION_TRIGGER,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "message_index",
        def_num: 254,
        field_type: &TYPE_MESSAGE_INDEX,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "timestamp",
        def_num: 253,
        field_type: &TYPE_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
];

static LAP_FIELDS: [Field; 12] = [
    Field {
        name: "event",
        def_num: 0,
        field_type: &TYPE_EVENT,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event_type",
        def_num: 1,
        field_type: &TYPE_EVENT_TYPE,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "start_time",
        def_num: 2,
        field_type: &TYPE_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "start_position_lat",
        def_num: 3,
        field_type: &TYPE_SINT32,
        scale: None,
        offset: None,
        units: Some("semicircles"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "start_position_long",
        def_num: 4,
        field_type: &TYPE_SINT32,
        scale: None,
        offset: None,
        units: Some("semicircles"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "total_elapsed_time",
        def_num: 7,
        field_type: &TYPE_UINT32,
        scale: Some(1000.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "total_timer_time",
        def_num: 8,
        field_type: &TYPE_UINT32,
        scale: Some(1000.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "total_distance",
        def_num: 9,
        field_type: &TYPE_UINT32,
        scale: Some(100.0),
        offset: None,
        units: Some("m"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "avg_speed",
        def_num: 13,
        field_type: &TYPE_UINT16,
        scale: Some(1000.0),
        offset: None,
        units: Some("m/s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "max_speed",
        def_num: 14,
        field_type: &TYPE_UINT16,
        scale: Some(1000.0),
        offset: None,
        units: Some("m/s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "message_index",
        def_num: 254,
        field_type: &TYPE_MESSAGE_INDEX,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "timestamp",
        def_num: 253,
        field_type: &TYPE_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
];

static ACTIVITY_FIELDS: [Field; 8] = [
    Field {
        name: "total_timer_time",
        def_num: 0,
        field_type: &TYPE_UINT32,
        scale: Some(1000.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "num_sessions",
        def_num: 1,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "type",
        def_num: 2,
        field_type: &TYPE_ACTIVITY,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event",
        def_num: 3,
        field_type: &TYPE_EVENT,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event_type",
        def_num: 4,
        field_type: &TYPE_EVENT_TYPE,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "local_timestamp",
        def_num: 5,
        field_type: &TYPE_LOCAL_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event_group",
        def_num: 6,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "timestamp",
        def_num: 253,
        field_type: &TYPE_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
];

static HR_EVENT_TIMESTAMP_12_COMPONENTS: [Component; 10] = {
    const fn slice(index: u8) -> Component {
        Component {
            name: "event_timestamp",
            def_num: FIELD_NUM_HR_EVENT_TIMESTAMP,
            bits: 12,
            bit_offset: index * 12,
            scale: Some(1024.0),
            offset: None,
            units: Some("s"),
            accumulate: true,
        }
    }

    [
        slice(0),
        slice(1),
        slice(2),
        slice(3),
        slice(4),
        slice(5),
        slice(6),
        slice(7),
        slice(8),
        slice(9),
    ]
};

static HR_FIELDS: [Field; 6] = [
    Field {
        name: "fractional_timestamp",
        def_num: 0,
        field_type: &TYPE_UINT16,
        scale: Some(32768.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "time256",
        def_num: 1,
        field_type: &TYPE_UINT8,
        scale: Some(256.0),
        offset: None,
        units: Some("s"),
        components: &[Component {
            name: "fractional_timestamp",
            def_num: 0,
            bits: 8,
            bit_offset: 0,
            scale: Some(256.0),
            offset: None,
            units: Some("s"),
            accumulate: false,
        }],
        subfields: &[],
    },
    Field {
        name: "filtered_bpm",
        def_num: 6,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: Some("bpm"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event_timestamp",
        def_num: FIELD_NUM_HR_EVENT_TIMESTAMP,
        field_type: &TYPE_UINT32,
        scale: Some(1024.0),
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
    Field {
        name: "event_timestamp_12",
        def_num: 10,
        field_type: &TYPE_BYTE,
        scale: None,
        offset: None,
        units: None,
        components: &HR_EVENT_TIMESTAMP_12_COMPONENTS,
        subfields: &[],
    },
    Field {
        name: "timestamp",
        def_num: 253,
        field_type: &TYPE_DATE_TIME,
        scale: None,
        offset: None,
        units: Some("s"),
        components: &[],
        subfields: &[],
    },
];

static FIELD_DESCRIPTION_FIELDS: [Field; 12] = [
    Field {
        name: "developer_data_index",
        def_num: 0,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "field_definition_number",
        def_num: 1,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "fit_base_type_id",
        def_num: 2,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "field_name",
        def_num: 3,
        field_type: &TYPE_STRING,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "array",
        def_num: 4,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "components",
        def_num: 5,
        field_type: &TYPE_STRING,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "scale",
        def_num: 6,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "offset",
        def_num: 7,
        field_type: &TYPE_SINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "units",
        def_num: 8,
        field_type: &TYPE_STRING,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "native_mesg_num",
        def_num: 14,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "native_field_num",
        def_num: 15,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "fit_base_unit_id",
        def_num: 13,
        field_type: &TYPE_UINT16,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
];

static DEVELOPER_DATA_ID_FIELDS: [Field; 5] = [
    Field {
        name: "developer_id",
        def_num: 0,
        field_type: &TYPE_BYTE,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "application_id",
        def_num: 1,
        field_type: &TYPE_BYTE,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "manufacturer_id",
        def_num: 2,
        field_type: &TYPE_MANUFACTURER,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "developer_data_index",
        def_num: 3,
        field_type: &TYPE_UINT8,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
    Field {
        name: "application_version",
        def_num: 4,
        field_type: &TYPE_UINT32,
        scale: None,
        offset: None,
        units: None,
        components: &[],
        subfields: &[],
    },
];

static MESSAGE_TYPES: [MesgType; 9] = [
    MesgType { name: "file_id", mesg_num: MESG_NUM_FILE_ID, fields: &FILE_ID_FIELDS },
    MesgType { name: "session", mesg_num: MESG_NUM_SESSION, fields: &SESSION_FIELDS },
    MesgType { name: "lap", mesg_num: MESG_NUM_LAP, fields: &LAP_FIELDS },
    MesgType { name: "record", mesg_num: MESG_NUM_RECORD, fields: &RECORD_FIELDS },
    MesgType { name: "event", mesg_num: MESG_NUM_EVENT, fields: &EVENT_FIELDS },
    MesgType { name: "activity", mesg_num: MESG_NUM_ACTIVITY, fields: &ACTIVITY_FIELDS },
    MesgType { name: "hr", mesg_num: MESG_NUM_HR, fields: &HR_FIELDS },
    MesgType {
        name: "field_description",
        mesg_num: MESG_NUM_FIELD_DESCRIPTION,
        fields: &FIELD_DESCRIPTION_FIELDS,
    },
    MesgType {
        name: "developer_data_id",
        mesg_num: MESG_NUM_DEVELOPER_DATA_ID,
        fields: &DEVELOPER_DATA_ID_FIELDS,
    },
];

/// Look up a message type by global message number.
pub fn mesg_type(global_mesg_num: u16) -> Option<&'static MesgType> {
    MESSAGE_TYPES
        .iter()
        .find(|m| m.mesg_num == global_mesg_num)
}
