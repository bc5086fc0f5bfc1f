//! Integration tests over synthetic FIT streams.

use chrono::DateTime;

use freehub::processors::{FIT_UTC_REFERENCE, StandardUnitsDataProcessor};
use freehub::types::{
    BASE_TYPE_BYTE, BASE_TYPE_ENUM, BASE_TYPE_SINT32, BASE_TYPE_STRING, BASE_TYPE_UINT8,
    BASE_TYPE_UINT16, BASE_TYPE_UINT32, BASE_TYPE_UINT32Z, BaseType, Value,
};
use freehub::{CrcCheck, Error, FitReader, Frame, ReaderOptions, compute_crc};

/// A field payload for the synthetic data-record builder.
enum Raw<'a> {
    N(u64),
    B(&'a [u8]),
    S(&'a str),
}

/// `(def_num, base_type, size)` of one definition slot.
type FieldSpec = (u8, &'static BaseType, u8);

fn encode_scalar(out: &mut Vec<u8>, value: u64, size: u8, big_endian: bool) {
    let size = size as usize;
    if big_endian {
        out.extend_from_slice(&value.to_be_bytes()[8 - size..]);
    } else {
        out.extend_from_slice(&value.to_le_bytes()[..size]);
    }
}

fn definition_record(
    local: u8,
    global: u16,
    big_endian: bool,
    fields: &[FieldSpec],
    dev_fields: &[(u8, u8, u8)],
) -> Vec<u8> {
    let mut s = vec![
        0x40 | if dev_fields.is_empty() { 0 } else { 0x20 } | local,
        0,
        big_endian as u8,
    ];
    if big_endian {
        s.extend_from_slice(&global.to_be_bytes());
    } else {
        s.extend_from_slice(&global.to_le_bytes());
    }
    s.push(fields.len() as u8);
    for (def_num, base_type, size) in fields {
        s.extend_from_slice(&[*def_num, *size, base_type.id]);
    }
    if !dev_fields.is_empty() {
        s.push(dev_fields.len() as u8);
        for (def_num, size, index) in dev_fields {
            s.extend_from_slice(&[*def_num, *size, *index]);
        }
    }
    s
}

fn data_record(local: u8, big_endian: bool, fields: &[FieldSpec], values: &[Raw]) -> Vec<u8> {
    assert_eq!(fields.len(), values.len());

    let mut s = vec![local];
    for ((_, _, size), value) in fields.iter().zip(values) {
        match value {
            Raw::N(x) => encode_scalar(&mut s, *x, *size, big_endian),
            Raw::B(bytes) => {
                assert_eq!(bytes.len(), *size as usize);
                s.extend_from_slice(bytes);
            }
            Raw::S(text) => {
                assert!(text.len() < *size as usize);
                s.extend_from_slice(text.as_bytes());
                s.resize(s.len() + *size as usize - text.len(), 0);
            }
        }
    }
    s
}

/// Wrap a record body into a complete file: a 14-byte header (protocol 1.0,
/// profile 1.52) with header CRC, the body, and the file CRC footer.
fn file_of(body: &[u8]) -> Vec<u8> {
    let mut fixed = vec![14, 0x10];
    fixed.extend_from_slice(&152u16.to_le_bytes());
    fixed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    fixed.extend_from_slice(b".FIT");

    let mut out = fixed.clone();
    out.extend_from_slice(&compute_crc(0, &fixed).to_le_bytes());
    out.extend_from_slice(body);

    let footer = compute_crc(0, &out);
    out.extend_from_slice(&footer.to_le_bytes());
    out
}

const FILE_ID_FIELDS: [FieldSpec; 6] = [
    (3, &BASE_TYPE_UINT32Z, 4),
    (4, &BASE_TYPE_UINT32, 4),
    (1, &BASE_TYPE_UINT16, 2),
    (2, &BASE_TYPE_UINT16, 2),
    (5, &BASE_TYPE_UINT16, 2),
    (0, &BASE_TYPE_ENUM, 1),
];

/// Definition and one data message of a `file_id`, local message 0.
fn file_id_messages(big_endian: bool) -> Vec<u8> {
    let mut s = definition_record(0, 0, big_endian, &FILE_ID_FIELDS, &[]);
    s.extend(data_record(
        0,
        big_endian,
        &FILE_ID_FIELDS,
        &[
            Raw::N(558069241),
            Raw::N(723842606),
            Raw::N(1),
            Raw::N(1036),
            Raw::N(u16::MAX as u64),
            Raw::N(4),
        ],
    ));
    s
}

fn minimal_file(extra: &[u8]) -> Vec<u8> {
    let mut body = file_id_messages(false);
    body.extend_from_slice(extra);
    file_of(&body)
}

fn decode_all(bytes: &[u8], options: ReaderOptions) -> Vec<Frame> {
    FitReader::with_options(bytes, options)
        .collect::<Result<Vec<_>, _>>()
        .expect("stream should decode")
}

fn decode_until_error(bytes: &[u8], options: ReaderOptions) -> Error {
    for frame in FitReader::with_options(bytes, options) {
        if let Err(e) = frame {
            return e;
        }
    }
    panic!("stream decoded without an error");
}

#[test]
fn decodes_a_minimal_file() {
    decodes_a_minimal_file_with_endian(false);
}

#[test]
fn decodes_a_minimal_big_endian_file() {
    decodes_a_minimal_file_with_endian(true);
}

fn decodes_a_minimal_file_with_endian(big_endian: bool) {
    let bytes = file_of(&file_id_messages(big_endian));
    let frames = decode_all(&bytes, ReaderOptions::default());
    assert_eq!(frames.len(), 4);

    let header = frames[0].as_header().unwrap();
    assert_eq!(header.proto_ver, (1, 0));
    assert_eq!(header.profile_ver, (1, 52));
    assert_eq!(header.body_size, file_id_messages(big_endian).len() as u32);

    let definition = frames[1].as_definition().unwrap();
    assert_eq!(definition.name(), "file_id");
    assert_eq!(definition.field_defs.len(), 6);

    let file_id = frames[2].as_data().unwrap();
    assert_eq!(file_id.name(), "file_id");

    assert_eq!(file_id.value("type"), Some(&Value::String("activity".into())));
    assert_eq!(file_id.raw_value("type"), Some(&Value::UInt(4)));
    assert_eq!(file_id.field_by_num(0).unwrap().value, Some(Value::String("activity".into())));

    assert_eq!(file_id.value("manufacturer"), Some(&Value::String("garmin".into())));
    assert_eq!(file_id.raw_value("manufacturer"), Some(&Value::UInt(1)));

    // The garmin_product subfield is activated by manufacturer = garmin, and
    // still answers to its original name and definition number.
    for name in ["product", "garmin_product"] {
        assert_eq!(file_id.value(name), Some(&Value::String("edge500".into())));
        assert_eq!(file_id.raw_value(name), Some(&Value::UInt(1036)));
    }
    assert_eq!(
        file_id.field_by_num(2).unwrap().value,
        Some(Value::String("edge500".into()))
    );

    assert_eq!(file_id.value("serial_number"), Some(&Value::UInt(558069241)));

    let expected = DateTime::from_timestamp(FIT_UTC_REFERENCE + 723842606, 0).unwrap();
    assert_eq!(file_id.value("time_created"), Some(&Value::DateTime(expected)));
    assert_eq!(file_id.raw_value("time_created"), Some(&Value::UInt(723842606)));

    // 0xFFFF is the uint16 invalid sentinel.
    let number = file_id.field("number").unwrap();
    assert_eq!(number.value, None);
    assert_eq!(number.raw_value, None);

    let crc = frames[3].as_crc().unwrap();
    assert!(crc.matched);
}

#[test]
fn chunks_reassemble_the_stream() {
    let mut bytes = minimal_file(&[]);
    bytes.extend(file_of(&file_id_messages(true)));

    let options = ReaderOptions {
        keep_raw_chunks: true,
        ..ReaderOptions::default()
    };

    let frames = decode_all(&bytes, options);
    assert_eq!(frames.len(), 8);

    let mut reassembled = Vec::new();
    for (index, frame) in frames.iter().enumerate() {
        let chunk = frame.chunk().expect("chunks were requested");
        assert_eq!(chunk.index, index);
        assert_eq!(chunk.offset, reassembled.len());
        reassembled.extend_from_slice(&chunk.bytes);
    }

    assert_eq!(reassembled, bytes);
}

#[test]
fn omits_chunks_by_default() {
    let frames = decode_all(&minimal_file(&[]), ReaderOptions::default());
    assert!(frames.iter().all(|f| f.chunk().is_none()));
}

#[test]
fn treats_a_zero_header_crc_as_absent() {
    let mut bytes = file_of(&file_id_messages(false));
    bytes[12] = 0;
    bytes[13] = 0;
    // Refresh the footer over the modified stream.
    let body_end = bytes.len() - 2;
    let footer = compute_crc(0, &bytes[..body_end]);
    bytes[body_end..].copy_from_slice(&footer.to_le_bytes());

    let frames = decode_all(&bytes, ReaderOptions::default());
    let header = frames[0].as_header().unwrap();
    assert_eq!(header.crc, None);
    assert_eq!(header.crc_matched, None);
}

#[test]
fn detects_a_corrupt_footer() {
    let mut bytes = file_of(&file_id_messages(false));
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    assert!(matches!(
        decode_until_error(&bytes, ReaderOptions::default()),
        Error::Crc { .. }
    ));
}

#[test]
fn reports_a_mismatched_footer_when_not_enforcing() {
    let mut bytes = file_of(&file_id_messages(false));
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let options = ReaderOptions {
        check_crc: CrcCheck::ReadOnly,
        ..ReaderOptions::default()
    };

    let frames = decode_all(&bytes, options);
    assert!(!frames.last().unwrap().as_crc().unwrap().matched);
}

#[test]
fn detects_a_corrupt_header_crc() {
    let mut bytes = file_of(&file_id_messages(false));
    bytes[12] ^= 0x01;

    assert!(matches!(
        decode_until_error(&bytes, ReaderOptions::default()),
        Error::Crc { .. }
    ));
}

#[test]
fn detects_truncation() {
    let bytes = file_of(&file_id_messages(false));
    let error = decode_until_error(&bytes[..bytes.len() - 10], ReaderOptions::default());

    match error {
        Error::UnexpectedEof { expected, got, .. } => assert!(got < expected),
        other => panic!("expected an EOF error, got {other:?}"),
    }
}

#[test]
fn rejects_a_wrong_magic() {
    let mut bytes = file_of(&file_id_messages(false));
    bytes[8] = b'!';

    assert!(matches!(
        decode_until_error(&bytes, ReaderOptions::default()),
        Error::Header(_)
    ));
}

#[test]
fn rejects_a_lone_header_crc_byte() {
    let mut bytes = file_of(&file_id_messages(false));
    bytes[0] = 13; // extended part of a single byte cannot hold a CRC

    assert!(matches!(
        decode_until_error(&bytes, ReaderOptions::default()),
        Error::Header(_)
    ));
}

#[test]
fn an_empty_stream_yields_no_frames() {
    assert_eq!(decode_all(&[], ReaderOptions::default()).len(), 0);
}

#[test]
fn decodes_chained_files_independently() {
    let mut bytes = file_of(&file_id_messages(false));
    bytes.extend(file_of(&file_id_messages(false)));

    let frames = decode_all(&bytes, ReaderOptions::default());
    assert_eq!(frames.len(), 8);
    assert!(frames[4].as_header().is_some());
    assert_eq!(frames[6].as_data().unwrap().name(), "file_id");
}

#[test]
fn clears_definitions_at_file_boundaries() {
    // The second file reuses local message 0 without redefining it.
    let mut bytes = file_of(&file_id_messages(false));
    let orphan = data_record(
        0,
        false,
        &FILE_ID_FIELDS,
        &[
            Raw::N(1),
            Raw::N(2),
            Raw::N(3),
            Raw::N(4),
            Raw::N(5),
            Raw::N(6),
        ],
    );
    bytes.extend(file_of(&orphan));

    assert!(matches!(
        decode_until_error(&bytes, ReaderOptions::default()),
        Error::Parse { .. }
    ));
}

#[test]
fn a_redefined_local_message_replaces_the_previous_one() {
    let event_fields: [FieldSpec; 2] = [(0, &BASE_TYPE_ENUM, 1), (1, &BASE_TYPE_ENUM, 1)];

    let mut body = file_id_messages(false);
    body.extend(definition_record(0, 21, false, &event_fields, &[]));
    body.extend(data_record(0, false, &event_fields, &[Raw::N(0), Raw::N(4)]));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());

    let event = frames[4].as_data().unwrap();
    assert_eq!(event.name(), "event");
    assert_eq!(event.value("event"), Some(&Value::String("timer".into())));
    assert_eq!(event.value("event_type"), Some(&Value::String("stop_all".into())));
}

#[test]
fn rejects_a_data_message_without_a_definition() {
    let body = data_record(3, false, &[(0, &BASE_TYPE_ENUM, 1)], &[Raw::N(0)]);

    assert!(matches!(
        decode_until_error(&file_of(&body), ReaderOptions::default()),
        Error::Parse { .. }
    ));
}

#[test]
fn rejects_a_field_size_that_breaks_alignment() {
    // Three bytes cannot hold uint16 elements.
    let body = definition_record(0, 20, false, &[(6, &BASE_TYPE_UINT16, 3)], &[]);

    assert!(matches!(
        decode_until_error(&file_of(&body), ReaderOptions::default()),
        Error::Parse { .. }
    ));
}

#[test]
fn resolves_subfields_from_reference_values() {
    let event_fields: [FieldSpec; 3] = [
        (0, &BASE_TYPE_ENUM, 1),
        (1, &BASE_TYPE_ENUM, 1),
        (2, &BASE_TYPE_UINT16, 2),
    ];

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 21, false, &event_fields, &[]));
    body.extend(data_record(
        1,
        false,
        &event_fields,
        &[Raw::N(0), Raw::N(0), Raw::N(2)],
    ));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());
    let event = frames[4].as_data().unwrap();
    assert_eq!(event.name(), "event");

    assert_eq!(event.value("event"), Some(&Value::String("timer".into())));
    assert_eq!(event.value("event_type"), Some(&Value::String("start".into())));

    // data16 expands into data (definition number 3), which resolves to the
    // timer_trigger subfield because event = timer.
    for name in ["timer_trigger", "data"] {
        let field = event.field(name).unwrap();
        assert_eq!(field.value, Some(Value::String("fitness_equipment".into())));
        assert_eq!(field.raw_value, Some(Value::UInt(2)));
    }
    assert_eq!(
        event.field_by_num(3).unwrap().value,
        Some(Value::String("fitness_equipment".into()))
    );

    // The carrier field itself is left as is.
    assert_eq!(event.value("data16"), Some(&Value::UInt(2)));
    assert_eq!(event.field_by_num(2).unwrap().raw_value, Some(Value::UInt(2)));
}

#[test]
fn expands_subfield_components() {
    let event_fields: [FieldSpec; 2] = [(0, &BASE_TYPE_ENUM, 1), (3, &BASE_TYPE_UINT32, 4)];

    let sport_point = 123 + (456 << 16);
    let gear_change = 4 + (20 << 8) + (2 << 16) + (34 << 24);

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 21, false, &event_fields, &[]));
    body.extend(data_record(1, false, &event_fields, &[Raw::N(33), Raw::N(sport_point)]));
    body.extend(data_record(1, false, &event_fields, &[Raw::N(42), Raw::N(gear_change)]));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());

    let message = frames[4].as_data().unwrap();
    assert_eq!(message.value("event"), Some(&Value::String("sport_point".into())));
    for name in ["sport_point", "data"] {
        assert_eq!(message.value(name), Some(&Value::UInt(sport_point)));
    }
    assert_eq!(message.value("score"), Some(&Value::UInt(123)));
    assert_eq!(message.value("opponent_score"), Some(&Value::UInt(456)));
    assert_eq!(message.field_by_num(7).unwrap().value, Some(Value::UInt(123)));
    assert_eq!(message.field_by_num(8).unwrap().value, Some(Value::UInt(456)));

    let message = frames[5].as_data().unwrap();
    assert_eq!(message.value("event"), Some(&Value::String("front_gear_change".into())));
    for name in ["gear_change_data", "data"] {
        assert_eq!(message.value(name), Some(&Value::UInt(gear_change)));
    }
    assert_eq!(message.value("rear_gear_num"), Some(&Value::UInt(4)));
    assert_eq!(message.value("rear_gear"), Some(&Value::UInt(20)));
    assert_eq!(message.value("front_gear_num"), Some(&Value::UInt(2)));
    assert_eq!(message.value("front_gear"), Some(&Value::UInt(34)));
}

#[test]
fn accumulates_compressed_speed_and_distance() {
    let record_fields: [FieldSpec; 2] = [(253, &BASE_TYPE_UINT32, 4), (8, &BASE_TYPE_BYTE, 3)];

    // Low 12 bits carry speed, high 12 bits a distance delta.
    let composite = |speed: u64, distance: u64| Raw::N(speed | (distance << 12));

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 20, false, &record_fields, &[]));
    body.extend(data_record(1, false, &record_fields, &[Raw::N(1000), composite(1000, 4000)]));
    body.extend(data_record(1, false, &record_fields, &[Raw::N(1001), composite(1200, 50)]));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());

    let first = frames[4].as_data().unwrap();
    assert_eq!(first.name(), "record");
    assert_eq!(first.value("speed"), Some(&Value::Float(10.0)));
    assert_eq!(first.value("distance"), Some(&Value::Float(250.0)));
    assert_eq!(first.field("speed").unwrap().units.as_deref(), Some("m/s"));
    assert_eq!(first.field("distance").unwrap().units.as_deref(), Some("m"));

    // 50 is below the previous low bits (4000), so the delta wrapped: the
    // reconstructed counter is 4096 + 50, divided by the 1/16 m scale.
    let second = frames[5].as_data().unwrap();
    assert_eq!(second.value("speed"), Some(&Value::Float(12.0)));
    assert_eq!(second.value("distance"), Some(&Value::Float((4096.0 + 50.0) / 16.0)));
}

#[test]
fn a_redefinition_restarts_accumulators() {
    let record_fields: [FieldSpec; 1] = [(8, &BASE_TYPE_BYTE, 3)];
    let composite = |speed: u64, distance: u64| Raw::N(speed | (distance << 12));

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 20, false, &record_fields, &[]));
    body.extend(data_record(1, false, &record_fields, &[composite(0, 4000)]));
    body.extend(definition_record(1, 20, false, &record_fields, &[]));
    body.extend(data_record(1, false, &record_fields, &[composite(0, 50)]));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());

    // Without the redefinition this would have wrapped to 4096 + 50.
    let second = frames[6].as_data().unwrap();
    assert_eq!(second.value("distance"), Some(&Value::Float(50.0 / 16.0)));
}

#[test]
fn reconstructs_compressed_timestamps() {
    let ts_fields: [FieldSpec; 2] = [(253, &BASE_TYPE_UINT32, 4), (3, &BASE_TYPE_UINT8, 1)];
    let hr_fields: [FieldSpec; 1] = [(3, &BASE_TYPE_UINT8, 1)];

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 20, false, &ts_fields, &[]));
    body.extend(data_record(1, false, &ts_fields, &[Raw::N(1000), Raw::N(120)]));
    body.extend(definition_record(2, 20, false, &hr_fields, &[]));

    // Compressed-timestamp headers: bit 7 set, local message in bits 5-6, a
    // 5-bit offset against the accumulated timestamp in bits 0-4.
    let mut compressed = data_record(2, false, &hr_fields, &[Raw::N(121)]);
    compressed[0] = 0x80 | (2 << 5) | 10;
    body.extend(compressed);

    let mut compressed = data_record(2, false, &hr_fields, &[Raw::N(122)]);
    compressed[0] = 0x80 | (2 << 5) | 5;
    body.extend(compressed);

    let frames = decode_all(&file_of(&body), ReaderOptions::default());

    let first = frames[6].as_data().unwrap();
    assert_eq!(first.time_offset, Some(10));
    assert_eq!(first.value("heart_rate"), Some(&Value::UInt(121)));
    // 1000 = 0b11111_01000: replacing the low five bits with 10 moves forward
    // to 1002.
    assert_eq!(first.value("timestamp"), Some(&Value::UInt(1002)));

    // An offset below the accumulated low bits rolls over.
    let second = frames[7].as_data().unwrap();
    assert_eq!(second.value("timestamp"), Some(&Value::UInt(1029)));
}

#[test]
fn registers_and_decodes_developer_fields() {
    let dev_id_fields: [FieldSpec; 2] = [(3, &BASE_TYPE_UINT8, 1), (1, &BASE_TYPE_BYTE, 16)];
    let desc_fields: [FieldSpec; 5] = [
        (0, &BASE_TYPE_UINT8, 1),
        (1, &BASE_TYPE_UINT8, 1),
        (2, &BASE_TYPE_UINT8, 1),
        (3, &BASE_TYPE_STRING, 16),
        (8, &BASE_TYPE_STRING, 8),
    ];
    let record_fields: [FieldSpec; 1] = [(3, &BASE_TYPE_UINT8, 1)];

    let application_id: [u8; 16] = *b"0123456789abcdef";

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 207, false, &dev_id_fields, &[]));
    body.extend(data_record(
        1,
        false,
        &dev_id_fields,
        &[Raw::N(0), Raw::B(&application_id)],
    ));
    body.extend(definition_record(2, 206, false, &desc_fields, &[]));
    body.extend(data_record(
        2,
        false,
        &desc_fields,
        &[
            Raw::N(0),
            Raw::N(0),
            Raw::N(BASE_TYPE_UINT8.id as u64),
            Raw::S("hr_quality"),
            Raw::S("q"),
        ],
    ));
    body.extend(definition_record(3, 20, false, &record_fields, &[(0, 1, 0)]));
    body.extend(data_record(
        3,
        false,
        &[(3, &BASE_TYPE_UINT8, 1), (0, &BASE_TYPE_UINT8, 1)],
        &[Raw::N(77), Raw::N(5)],
    ));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());

    let definition = frames[7].as_definition().unwrap();
    assert!(definition.is_developer_data);
    assert_eq!(definition.dev_field_defs.len(), 1);
    assert_eq!(definition.dev_field_defs[0].field.name, "hr_quality");

    let record = frames[8].as_data().unwrap();
    assert_eq!(record.value("heart_rate"), Some(&Value::UInt(77)));

    let quality = record.field("hr_quality").unwrap();
    assert_eq!(quality.value, Some(Value::UInt(5)));
    assert_eq!(quality.units.as_deref(), Some("q"));
}

#[test]
fn rejects_an_unregistered_developer_type() {
    let record_fields: [FieldSpec; 1] = [(3, &BASE_TYPE_UINT8, 1)];

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 20, false, &record_fields, &[(0, 1, 9)]));

    assert!(matches!(
        decode_until_error(&file_of(&body), ReaderOptions::default()),
        Error::Parse { .. }
    ));
}

#[test]
fn shifts_hr_event_timestamps_from_the_last_whole_second() {
    let hr_fields: [FieldSpec; 3] = [
        (253, &BASE_TYPE_UINT32, 4),
        (9, &BASE_TYPE_UINT32, 4),
        (10, &BASE_TYPE_BYTE, 15),
    ];

    // Ten 12-bit slices, packed little-endian.
    let mut slices = [0u8; 15];
    let deltas: [u64; 10] = [100, 150, 200, 260, 300, 370, 440, 500, 570, 640];
    for (i, delta) in deltas.iter().enumerate() {
        let bit = i * 12;
        let (byte, shift) = (bit / 8, bit % 8);
        slices[byte] |= (delta << shift) as u8;
        slices[byte + 1] |= (delta >> (8 - shift)) as u8;
    }

    let timestamp = 900_000_000;

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 132, false, &hr_fields, &[]));
    body.extend(data_record(
        1,
        false,
        &hr_fields,
        &[Raw::N(timestamp), Raw::N(1_024_000), Raw::B(&slices)],
    ));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());
    let hr = frames[4].as_data().unwrap();
    assert_eq!(hr.name(), "hr");

    assert_eq!(hr.value("event_timestamp"), Some(&Value::Float(1000.0)));

    // The expanded slices accumulate from zero, scale by 1/1024, and are
    // shifted by the timestamp seen just before them.
    let expansions: Vec<&Value> = hr
        .fields
        .iter()
        .filter(|f| f.field_def.is_none() && f.is_named("event_timestamp"))
        .filter_map(|f| f.value.as_ref())
        .collect();
    assert_eq!(expansions.len(), 10);

    for (delta, value) in deltas.iter().zip(&expansions) {
        let expected = *delta as f64 / 1024.0 + timestamp as f64;
        match value {
            Value::Float(x) => assert!((x - expected).abs() < 1e-9),
            other => panic!("expected a float, got {other:?}"),
        }
    }
}

#[test]
fn converts_values_to_standard_units() {
    let record_fields: [FieldSpec; 3] = [
        (0, &BASE_TYPE_SINT32, 4),
        (5, &BASE_TYPE_UINT32, 4),
        (6, &BASE_TYPE_UINT16, 2),
    ];

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 20, false, &record_fields, &[]));
    body.extend(data_record(
        1,
        false,
        &record_fields,
        &[Raw::N(0x2000_0000), Raw::N(100_000), Raw::N(5860)],
    ));

    let options = ReaderOptions {
        processor: Some(Box::new(StandardUnitsDataProcessor::default())),
        ..ReaderOptions::default()
    };

    let frames = decode_all(&file_of(&body), options);
    let record = frames[4].as_data().unwrap();

    let lat = record.field("position_lat").unwrap();
    assert_eq!(lat.value, Some(Value::Float(45.0)));
    assert_eq!(lat.units.as_deref(), Some("deg"));

    let distance = record.field("distance").unwrap();
    assert_eq!(distance.value, Some(Value::Float(1.0)));
    assert_eq!(distance.units.as_deref(), Some("km"));

    let speed = record.field("speed").unwrap();
    assert_eq!(speed.value, Some(Value::Float(5.86 * 3.6)));
    assert_eq!(speed.units.as_deref(), Some("km/h"));
}

#[test]
fn converts_local_timestamps_without_an_epoch_floor() {
    let activity_fields: [FieldSpec; 2] = [(253, &BASE_TYPE_UINT32, 4), (5, &BASE_TYPE_UINT32, 4)];

    let mut body = file_id_messages(false);
    body.extend(definition_record(1, 34, false, &activity_fields, &[]));
    body.extend(data_record(1, false, &activity_fields, &[Raw::N(1000), Raw::N(1000)]));

    let frames = decode_all(&file_of(&body), ReaderOptions::default());
    let activity = frames[4].as_data().unwrap();

    // A date_time below 0x10000000 is a relative value and stays numeric; a
    // local_date_time converts regardless.
    assert_eq!(activity.value("timestamp"), Some(&Value::UInt(1000)));
    assert_eq!(
        activity.value("local_timestamp"),
        Some(&Value::DateTime(
            DateTime::from_timestamp(FIT_UTC_REFERENCE + 1000, 0).unwrap()
        ))
    );
}

#[test]
fn disabling_processing_leaves_raw_renders() {
    let options = ReaderOptions {
        processor: None,
        ..ReaderOptions::default()
    };

    let frames = decode_all(&file_of(&file_id_messages(false)), options);
    let file_id = frames[2].as_data().unwrap();

    // Without the default processor the timestamp stays a raw count.
    assert_eq!(file_id.value("time_created"), Some(&Value::UInt(723842606)));
}

#[test]
fn tracks_reader_properties() {
    let bytes = file_of(&file_id_messages(false));
    let mut reader = FitReader::new(&bytes[..]);
    assert!(reader.last_header().is_none());
    assert!(reader.file_id().is_none());

    while let Some(frame) = reader.next() {
        frame.unwrap();
    }

    assert_eq!(reader.file_id().unwrap().name(), "file_id");
    // Cleared once the footer closed the file out.
    assert!(reader.last_header().is_none());
}

#[test]
fn close_is_idempotent() {
    let bytes = file_of(&file_id_messages(false));
    let mut reader = FitReader::new(&bytes[..]);

    assert!(reader.next().is_some());
    reader.close();
    reader.close();
    assert!(reader.next().is_none());
    assert!(reader.local_mesg_defs().is_empty());
}

#[test]
fn crc_accumulation_is_incremental() {
    let bytes = file_of(&file_id_messages(false));

    for split in [0, 1, bytes.len() / 2, bytes.len()] {
        let (a, b) = bytes.split_at(split);
        assert_eq!(compute_crc(compute_crc(0, a), b), compute_crc(0, &bytes));
    }
}

#[test]
fn crc_checking_can_be_disabled() {
    let mut bytes = file_of(&file_id_messages(false));
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;

    let options = ReaderOptions {
        check_crc: CrcCheck::Disabled,
        ..ReaderOptions::default()
    };

    // Decodes fully; the CRC frame carries whatever was read.
    let frames = decode_all(&bytes, options);
    assert_eq!(frames.len(), 4);
}
