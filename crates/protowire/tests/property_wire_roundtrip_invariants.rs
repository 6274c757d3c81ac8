use proptest::prelude::*;
use protowire::{
    decimal_string_to_hash64, hash64_to_decimal_string, DecodeError, Decoder, Encoder, Reader,
    SplitValue64, WireType, Writer, DEFAULT_RECURSION_LIMIT,
};

fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

fn first_field<'a, T>(bytes: &'a [u8], read: impl FnOnce(&mut Reader<'a>) -> T) -> T {
    let mut reader = Reader::new(bytes);
    assert!(reader.next_field().unwrap());
    read(&mut reader)
}

/// A piece of a generated field stream.
#[derive(Debug, Clone)]
enum Chunk {
    Varint(u32, u64),
    Fixed32(u32, u32),
    /// A lone START_GROUP or END_GROUP tag.
    Tag(u32, WireType),
    /// `depth` nested START_GROUP tags, closed again when `closed`.
    Tower {
        field: u32,
        depth: usize,
        closed: bool,
    },
    Group(u32, Vec<Chunk>),
    Message(u32, Vec<Chunk>),
}

fn write_chunks(chunks: &[Chunk], writer: &mut Writer) {
    for chunk in chunks {
        match chunk {
            Chunk::Varint(field, value) => writer.write_uint64(*field, *value),
            Chunk::Fixed32(field, value) => writer.write_fixed32(*field, *value),
            Chunk::Tag(field, wire_type) => writer.write_field_header(*field, *wire_type),
            Chunk::Tower { field, depth, closed } => {
                for _ in 0..*depth {
                    writer.write_field_header(*field, WireType::StartGroup);
                }
                if *closed {
                    for _ in 0..*depth {
                        writer.write_field_header(*field, WireType::EndGroup);
                    }
                }
            }
            Chunk::Group(field, body) => writer.write_group(*field, body.as_slice(), write_chunks),
            Chunk::Message(field, body) => {
                writer.write_message(*field, body.as_slice(), write_chunks)
            }
        }
    }
}

/// Deepest group nesting a reader sees while skipping `chunks`, or `None`
/// when they contain unbalanced group tags. Message bodies are opaque to a
/// skip.
fn group_depth(chunks: &[Chunk]) -> Option<usize> {
    chunks.iter().try_fold(0, |deepest, chunk| {
        let depth = match chunk {
            Chunk::Varint(..) | Chunk::Fixed32(..) | Chunk::Message(..) => 0,
            Chunk::Tag(..) => return None,
            Chunk::Tower { depth, closed, .. } => {
                if !closed && *depth > 0 {
                    return None;
                }
                *depth
            }
            Chunk::Group(_, body) => 1 + group_depth(body)?,
        };
        Some(deepest.max(depth))
    })
}

fn field_number() -> impl Strategy<Value = u32> {
    1u32..16
}

fn chunk() -> impl Strategy<Value = Chunk> {
    let leaf = prop_oneof![
        (field_number(), any::<u64>()).prop_map(|(f, v)| Chunk::Varint(f, v)),
        (field_number(), any::<u32>()).prop_map(|(f, v)| Chunk::Fixed32(f, v)),
        (
            field_number(),
            prop_oneof![Just(WireType::StartGroup), Just(WireType::EndGroup)]
        )
            .prop_map(|(f, w)| Chunk::Tag(f, w)),
        (
            field_number(),
            prop_oneof![0usize..150, 1_000usize..20_000],
            any::<bool>()
        )
            .prop_map(|(field, depth, closed)| Chunk::Tower { field, depth, closed }),
    ];
    leaf.prop_recursive(6, 48, 6, |inner| {
        prop_oneof![
            (field_number(), prop::collection::vec(inner.clone(), 0..6))
                .prop_map(|(f, body)| Chunk::Group(f, body)),
            (field_number(), prop::collection::vec(inner, 0..6))
                .prop_map(|(f, body)| Chunk::Message(f, body)),
        ]
    })
}

fn skip_all(reader: &mut Reader<'_>) -> Result<(), DecodeError> {
    while reader.next_field()? {
        reader.skip_field()?;
    }
    Ok(())
}

proptest! {
    #[test]
    fn unsigned_varint64_round_trips(value in any::<u64>()) {
        let mut encoder = Encoder::new();
        encoder.write_unsigned_varint64(value);
        let bytes = encoder.end();
        prop_assert_eq!(bytes.len(), protowire::varint_len(value));

        let mut decoder = Decoder::new(&bytes);
        prop_assert_eq!(decoder.read_unsigned_varint64(), Ok(value));
        prop_assert!(decoder.at_end());
    }

    #[test]
    fn split_halves_match_the_whole(value in any::<u64>()) {
        let mut encoder = Encoder::new();
        encoder.write_unsigned_varint64(value);
        let bytes = encoder.end();

        let split = Decoder::new(&bytes).read_split_varint64().unwrap();
        prop_assert_eq!(split, SplitValue64::new(value as u32, (value >> 32) as u32));
        prop_assert_eq!(protowire_util::join_uint64(split), value);
    }

    #[test]
    fn zigzag_is_a_bijection(value in any::<i64>()) {
        let mut encoder = Encoder::new();
        encoder.write_zigzag_varint64(value);
        let zigzag = encoder.end();

        let mut encoder = Encoder::new();
        encoder.write_unsigned_varint64(zigzag64(value));
        prop_assert_eq!(&zigzag, &encoder.end());

        prop_assert_eq!(Decoder::new(&zigzag).read_zigzag_varint64(), Ok(value));
    }

    #[test]
    fn signed_32_bit_fields_round_trip(value in any::<i32>()) {
        let mut writer = Writer::new();
        writer.write_int32(1, value);
        writer.write_sint32(2, value);
        writer.write_sfixed32(3, value);
        let bytes = writer.result_buffer();

        let mut reader = Reader::new(&bytes);
        prop_assert!(reader.next_field().unwrap());
        prop_assert_eq!(reader.read_int32(), Ok(value));
        prop_assert!(reader.next_field().unwrap());
        prop_assert_eq!(reader.read_sint32(), Ok(value));
        prop_assert!(reader.next_field().unwrap());
        prop_assert_eq!(reader.read_sfixed32(), Ok(value));
        prop_assert_eq!(reader.next_field(), Ok(false));
    }

    #[test]
    fn sixty_four_bit_strings_are_lossless(value in any::<i64>(), unsigned in any::<u64>()) {
        let text = value.to_string();
        let mut writer = Writer::new();
        writer.write_int64_string(1, &text).unwrap();
        let bytes = writer.result_buffer();
        prop_assert_eq!(first_field(&bytes, |r| r.read_int64_string()), Ok(text.clone()));
        prop_assert_eq!(first_field(&bytes, |r| r.read_int64()), Ok(value));

        let text = unsigned.to_string();
        let hash = decimal_string_to_hash64(&text).unwrap();
        prop_assert_eq!(hash64_to_decimal_string(hash, false), text.clone());

        let mut writer = Writer::new();
        writer.write_fixed64_string(1, &text).unwrap();
        let bytes = writer.result_buffer();
        prop_assert_eq!(first_field(&bytes, |r| r.read_fixed64()), Ok(unsigned));
    }

    #[test]
    fn doubles_round_trip_bit_exactly(bits in any::<u64>()) {
        let value = f64::from_bits(bits);
        prop_assume!(!value.is_nan());
        let mut writer = Writer::new();
        writer.write_double(1, value);
        let bytes = writer.result_buffer();
        let back = first_field(&bytes, |r| r.read_double()).unwrap();
        prop_assert_eq!(back.to_bits(), bits);
    }

    #[test]
    fn floats_round_trip_bit_exactly(bits in any::<u32>()) {
        let value = f32::from_bits(bits);
        prop_assume!(!value.is_nan());
        let mut writer = Writer::new();
        writer.write_float(1, value);
        let bytes = writer.result_buffer();
        let back = first_field(&bytes, |r| r.read_float()).unwrap();
        prop_assert_eq!(back.to_bits(), bits);
    }

    #[test]
    fn packed_and_unpacked_decode_the_same(values in prop::collection::vec(any::<i64>(), 0..32)) {
        let mut writer = Writer::new();
        writer.write_packed_sint64(1, &values);
        writer.write_repeated_sint64(1, &values);
        let bytes = writer.result_buffer();

        let mut reader = Reader::new(&bytes);
        let mut decoded = Vec::new();
        while reader.next_field().unwrap() {
            reader.read_repeated_sint64(&mut decoded).unwrap();
        }
        let mut expected = values.clone();
        expected.extend_from_slice(&values);
        prop_assert_eq!(decoded, expected);
    }

    #[test]
    fn packed_fixed_widths_round_trip(values in prop::collection::vec(any::<u32>(), 1..32)) {
        let mut writer = Writer::new();
        writer.write_packed_fixed32(7, &values);
        let bytes = writer.result_buffer();
        let decoded = first_field(&bytes, |r| r.read_packed_fixed32()).unwrap();
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn strings_round_trip(text in ".*") {
        let mut writer = Writer::new();
        writer.write_string(2, &text);
        let bytes = writer.result_buffer();
        prop_assert_eq!(first_field(&bytes, |r| r.read_string()), Ok(text.as_str()));
    }

    #[test]
    fn nested_lengths_frame_their_bodies(
        inner in prop::collection::vec(any::<u8>(), 0..300),
        sibling in any::<u32>(),
    ) {
        let mut writer = Writer::new();
        writer.write_message(1, &inner, |bytes, w| w.write_bytes(1, bytes));
        writer.write_uint32(2, sibling);
        let bytes = writer.result_buffer();

        let mut reader = Reader::new(&bytes);
        prop_assert!(reader.next_field().unwrap());
        let mut payload = Vec::new();
        reader
            .read_message(&mut payload, |payload, r| {
                while r.next_field()? {
                    payload.extend_from_slice(r.read_bytes()?);
                }
                Ok(())
            })
            .unwrap();
        prop_assert_eq!(payload, inner);
        prop_assert!(reader.next_field().unwrap());
        prop_assert_eq!(reader.read_uint32(), Ok(sibling));
        prop_assert_eq!(reader.next_field(), Ok(false));
    }

    #[test]
    fn nested_tags_are_skipped_or_rejected(chunks in prop::collection::vec(chunk(), 0..6)) {
        let mut writer = Writer::new();
        write_chunks(&chunks, &mut writer);
        let bytes = writer.result_buffer();

        let result = skip_all(&mut Reader::new(&bytes));
        // Unbalanced tags may still pair up by accident, so only balanced
        // streams have a predictable outcome.
        match group_depth(&chunks) {
            Some(depth) if depth <= DEFAULT_RECURSION_LIMIT => {
                prop_assert_eq!(result, Ok(()));
            }
            Some(_) => {
                prop_assert_eq!(result, Err(DecodeError::RecursionLimit(DEFAULT_RECURSION_LIMIT)));
            }
            None => {}
        }
        let _ = protowire::debug::decode_raw(&bytes, &Default::default());
    }

    #[test]
    fn arbitrary_input_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let mut reader = Reader::new(&bytes);
        let mut steps = 0;
        while let Ok(true) = reader.next_field() {
            if reader.skip_field().is_err() {
                break;
            }
            steps += 1;
        }
        prop_assert!(steps <= bytes.len());
        let _ = protowire::debug::decode_raw(&bytes, &Default::default());
    }
}
