use protowire::{DecodeError, Decoder, Encoder, Reader, WireType, Writer};

fn single_field(write: impl FnOnce(&mut Writer)) -> Vec<u8> {
    let mut writer = Writer::new();
    write(&mut writer);
    writer.result_buffer()
}

fn with_reader<'a, T>(bytes: &'a [u8], read: impl FnOnce(&mut Reader<'a>) -> T) -> T {
    let mut reader = Reader::new(bytes);
    assert!(reader.next_field().expect("tag must decode"));
    let value = read(&mut reader);
    assert_eq!(reader.next_field(), Ok(false), "field must consume all bytes");
    value
}

#[test]
fn int32_boundaries_round_trip() {
    for v in [0, 1, -1, 127, 128, i32::MIN, i32::MAX] {
        let bytes = single_field(|w| w.write_int32(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_int32()), Ok(v), "int32 {v}");
        let bytes = single_field(|w| w.write_sint32(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_sint32()), Ok(v), "sint32 {v}");
        let bytes = single_field(|w| w.write_sfixed32(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_sfixed32()), Ok(v), "sfixed32 {v}");
        let bytes = single_field(|w| w.write_enum(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_enum()), Ok(v), "enum {v}");
    }
}

#[test]
fn uint32_boundaries_round_trip() {
    for v in [0, 1, 127, 128, u32::MAX] {
        let bytes = single_field(|w| w.write_uint32(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_uint32()), Ok(v));
        let bytes = single_field(|w| w.write_fixed32(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_fixed32()), Ok(v));
    }
}

#[test]
fn int64_boundaries_round_trip_as_numbers_and_strings() {
    for v in [0, 1, -1, i32::MIN as i64, i32::MAX as i64, i64::MIN, i64::MAX] {
        let text = v.to_string();

        let bytes = single_field(|w| w.write_int64(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_int64()), Ok(v));
        assert_eq!(with_reader(&bytes, |r| r.read_int64_string()), Ok(text.clone()));
        assert_eq!(single_field(|w| w.write_int64_string(1, &text).unwrap()), bytes);

        let bytes = single_field(|w| w.write_sint64(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_sint64()), Ok(v));
        assert_eq!(with_reader(&bytes, |r| r.read_sint64_string()), Ok(text.clone()));
        assert_eq!(single_field(|w| w.write_sint64_string(1, &text).unwrap()), bytes);

        let bytes = single_field(|w| w.write_sfixed64(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_sfixed64()), Ok(v));
        assert_eq!(with_reader(&bytes, |r| r.read_sfixed64_string()), Ok(text.clone()));
        assert_eq!(single_field(|w| w.write_sfixed64_string(1, &text).unwrap()), bytes);
    }
}

#[test]
fn uint64_boundaries_round_trip_as_numbers_and_strings() {
    for v in [0, 1, 1 << 53, (1 << 53) + 1, u64::MAX] {
        let text = v.to_string();

        let bytes = single_field(|w| w.write_uint64(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_uint64()), Ok(v));
        assert_eq!(with_reader(&bytes, |r| r.read_uint64_string()), Ok(text.clone()));
        assert_eq!(single_field(|w| w.write_uint64_string(1, &text).unwrap()), bytes);

        let bytes = single_field(|w| w.write_fixed64(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_fixed64()), Ok(v));
        assert_eq!(with_reader(&bytes, |r| r.read_fixed64_string()), Ok(text.clone()));
        assert_eq!(single_field(|w| w.write_fixed64_string(1, &text).unwrap()), bytes);
    }
}

#[test]
fn float_specials_round_trip() {
    for v in [0.0f32, -0.0, 1.5, f32::MIN_POSITIVE, f32::MAX, f32::INFINITY, f32::NEG_INFINITY] {
        let bytes = single_field(|w| w.write_float(1, v));
        let back = with_reader(&bytes, |r| r.read_float()).unwrap();
        assert_eq!(back.to_bits(), v.to_bits(), "float {v}");
    }
    let bytes = single_field(|w| w.write_float(1, f32::NAN));
    assert!(with_reader(&bytes, |r| r.read_float()).unwrap().is_nan());

    for v in [0.0f64, -0.0, 0.1, 5e-324, f64::MAX, f64::INFINITY, f64::NEG_INFINITY] {
        let bytes = single_field(|w| w.write_double(1, v));
        let back = with_reader(&bytes, |r| r.read_double()).unwrap();
        assert_eq!(back.to_bits(), v.to_bits(), "double {v}");
    }
    let bytes = single_field(|w| w.write_double(1, f64::NAN));
    assert!(with_reader(&bytes, |r| r.read_double()).unwrap().is_nan());
}

#[test]
fn bool_string_and_bytes_round_trip() {
    for v in [true, false] {
        let bytes = single_field(|w| w.write_bool(1, v));
        assert_eq!(with_reader(&bytes, |r| r.read_bool()), Ok(v));
    }
    for v in ["", "a", "héllo wörld", "\u{1f600}"] {
        let bytes = single_field(|w| w.write_string(2, v));
        assert_eq!(with_reader(&bytes, |r| r.read_string()), Ok(v));
    }
    for v in [&[][..], &[0u8, 255, 128][..]] {
        let bytes = single_field(|w| w.write_bytes(3, v));
        assert_eq!(with_reader(&bytes, |r| r.read_bytes()), Ok(v));
    }
}

#[test]
fn varint_lengths() {
    let cases: [(i64, usize); 6] = [
        (0, 1),
        (127, 1),
        (128, 2),
        (-1, 10),
        (i64::MAX, 9),
        (i64::MIN, 10),
    ];
    for (value, expected) in cases {
        let mut encoder = Encoder::new();
        encoder.write_signed_varint64(value);
        let bytes = encoder.end();
        assert_eq!(bytes.len(), expected, "varint length of {value}");

        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.read_signed_varint64(), Ok(value));
        assert_eq!(decoder.cursor(), expected);
    }

    let mut encoder = Encoder::new();
    encoder.write_unsigned_varint64(u64::MAX);
    assert_eq!(encoder.end().len(), 10);
}

#[test]
fn int64_zero_is_one_byte_max_is_nine_and_uint64_max_is_ten() {
    let bytes = single_field(|w| w.write_int64(1, 0));
    assert_eq!(bytes, [0x08, 0x00]);
    let bytes = single_field(|w| w.write_int64(1, i64::MAX));
    assert_eq!(bytes.len(), 1 + 9);
    let bytes = single_field(|w| w.write_uint64(1, u64::MAX));
    assert_eq!(bytes.len(), 1 + 10);
}

#[test]
fn known_wire_bytes() {
    assert_eq!(single_field(|w| w.write_int32(1, 150)), [0x08, 0x96, 0x01]);
    assert_eq!(
        single_field(|w| w.write_string(2, "testing")),
        [0x12, 0x07, b't', b'e', b's', b't', b'i', b'n', b'g']
    );
    assert_eq!(single_field(|w| w.write_sint32(1, -2)), [0x08, 0x03]);
    assert_eq!(single_field(|w| w.write_fixed32(1, 1)), [0x0d, 1, 0, 0, 0]);
    assert_eq!(
        single_field(|w| w.write_double(1, 1.0)),
        [0x09, 0, 0, 0, 0, 0, 0, 0xf0, 0x3f]
    );
    assert_eq!(single_field(|w| w.write_packed_int32(4, &[3, 270, 86942])), [
        0x22, 0x06, 0x03, 0x8e, 0x02, 0x9e, 0xa7, 0x05
    ]);
}

#[test]
fn malformed_input_matrix() {
    let cases: Vec<(&str, Vec<u8>, DecodeError)> = vec![
        ("invalid wire type 6", vec![0x0e, 0x00], DecodeError::InvalidWireType(6)),
        ("invalid wire type 7", vec![0x0f, 0x00], DecodeError::InvalidWireType(7)),
        (
            "truncated tag",
            vec![0x80],
            DecodeError::Truncated { offset: 1, needed: 1, end: 1 },
        ),
        ("zero field number", vec![0x00, 0x00], DecodeError::InvalidFieldNumber),
        ("overlong tag", vec![0xff; 11], DecodeError::MalformedVarint),
    ];
    for (name, bytes, expected) in cases {
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.next_field(), Err(expected), "{name}");
        assert!(reader.has_error(), "{name} must be sticky");
        assert_eq!(reader.next_field(), Err(DecodeError::Poisoned), "{name}");
    }
}

#[test]
fn truncated_values_are_fatal() {
    let cases: Vec<(&str, Vec<u8>)> = vec![
        ("varint", vec![0x08, 0x80]),
        ("fixed32", vec![0x0d, 1, 2]),
        ("fixed64", vec![0x09, 1, 2, 3, 4, 5, 6, 7]),
        ("delimited", vec![0x12, 0x03, b'a']),
    ];
    for (name, bytes) in cases {
        let mut reader = Reader::new(&bytes);
        assert!(reader.next_field().unwrap(), "{name}");
        let err = reader.skip_field().unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }), "{name}: {err:?}");
        assert!(reader.has_error(), "{name}");
    }
}

#[test]
fn truncated_packed_runs_are_fatal() {
    let cases: Vec<(&str, Vec<u8>, DecodeError)> = vec![
        (
            "length past end",
            vec![0x22, 0x05, 0x01],
            DecodeError::Truncated { offset: 2, needed: 5, end: 3 },
        ),
        (
            "missing length",
            vec![0x22],
            DecodeError::Truncated { offset: 1, needed: 1, end: 1 },
        ),
        ("element crosses run", vec![0x22, 0x01, 0x80, 0x01], DecodeError::PackedOverrun),
    ];
    for (name, bytes, expected) in cases {
        let mut reader = Reader::new(&bytes);
        assert!(reader.next_field().unwrap(), "{name}");
        let mut values = Vec::new();
        assert_eq!(reader.read_repeated_int32(&mut values), Err(expected), "{name}");
        assert!(values.is_empty(), "{name}");
        assert!(reader.has_error(), "{name}");
    }
}

#[test]
fn deeply_nested_groups_hit_the_recursion_limit() {
    let depth = 100_000;
    let mut bytes = vec![0x13; depth];
    bytes.extend(std::iter::repeat(0x14).take(depth));
    let mut reader = Reader::new(&bytes);
    assert!(reader.next_field().unwrap());
    assert_eq!(
        reader.skip_field(),
        Err(DecodeError::RecursionLimit(protowire::DEFAULT_RECURSION_LIMIT))
    );
    assert_eq!(reader.next_field(), Err(DecodeError::Poisoned));
}

#[test]
fn wire_type_is_reported() {
    let bytes = single_field(|w| {
        w.write_int32(1, 1);
        w.write_fixed64(2, 1);
        w.write_bytes(3, b"x");
        w.write_fixed32(5, 1);
    });
    let mut reader = Reader::new(&bytes);
    let mut seen = Vec::new();
    while reader.next_field().unwrap() {
        seen.push((reader.field_number(), reader.wire_type().unwrap()));
        reader.skip_field().unwrap();
    }
    assert_eq!(
        seen,
        vec![
            (1, WireType::Varint),
            (2, WireType::Fixed64),
            (3, WireType::Delimited),
            (5, WireType::Fixed32),
        ]
    );
}
