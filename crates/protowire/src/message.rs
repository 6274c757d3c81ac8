//! The interface generated message types implement.

use protowire_buffers::ByteSource;

use crate::error::DecodeError;
use crate::reader::Reader;
use crate::writer::Writer;

/// A protobuf message with straight-line encode and per-field decode
/// bodies.
///
/// Implementors supply [`write_fields`](Self::write_fields), which writes
/// every present field in field-number order, and
/// [`read_field`](Self::read_field), which handles the field the reader is
/// positioned at. `read_field` must pass unrecognized field numbers to
/// [`Reader::skip_field`].
///
/// Absent optional fields are usually modeled as `Option`s and simply not
/// written.
///
/// # Example
///
/// ```
/// use protowire::{DecodeError, Message, Reader, Writer};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Ping {
///     field_one: Option<i32>,
/// }
///
/// impl Message for Ping {
///     fn write_fields(&self, writer: &mut Writer) {
///         if let Some(value) = self.field_one {
///             writer.write_int32(1, value);
///         }
///     }
///
///     fn read_field(&mut self, reader: &mut Reader<'_>) -> Result<(), DecodeError> {
///         match reader.field_number() {
///             1 => self.field_one = Some(reader.read_int32()?),
///             _ => reader.skip_field()?,
///         }
///         Ok(())
///     }
/// }
///
/// let ping = Ping { field_one: Some(3) };
/// assert_eq!(ping.encode(), [8, 3]);
/// assert_eq!(Ping::decode(&[8u8, 3][..]).unwrap(), ping);
/// assert_eq!(Ping::decode(Vec::new()).unwrap(), Ping::default());
/// ```
pub trait Message: Default {
    fn write_fields(&self, writer: &mut Writer);

    fn read_field(&mut self, reader: &mut Reader<'_>) -> Result<(), DecodeError>;

    fn encode(&self) -> Vec<u8> {
        let mut writer = Writer::new();
        self.write_fields(&mut writer);
        writer.result_buffer()
    }

    /// Decodes a message from a borrowed or owned buffer, or from base64
    /// text via [`ByteSource::Base64`].
    ///
    /// An END_GROUP tag at the top level is an error, not an early end.
    fn decode<'s>(source: impl Into<ByteSource<'s>>) -> Result<Self, DecodeError> {
        let bytes = source.into().into_bytes()?;
        let mut message = Self::default();
        let mut reader = Reader::new(&bytes);
        message.merge_from(&mut reader)?;
        reader.reject_end_group()?;
        Ok(message)
    }

    /// Reads fields until the end of the reader's window, or until an
    /// END_GROUP tag when the message is a group body. Callers reading a
    /// top-level message follow up with [`Reader::reject_end_group`].
    fn merge_from(&mut self, reader: &mut Reader<'_>) -> Result<(), DecodeError> {
        while reader.next_field()? {
            if reader.is_end_group() {
                break;
            }
            self.read_field(reader)?;
        }
        Ok(())
    }

    /// Writes this message as a submessage field.
    fn write_to_field(&self, field: u32, writer: &mut Writer) {
        writer.write_message(field, self, |message, w| message.write_fields(w));
    }

    /// Reads a submessage field into a fresh message.
    fn read_from_field(reader: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let mut message = Self::default();
        reader.read_message(&mut message, |m, r| m.merge_from(r))?;
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
    }

    impl Message for Point {
        fn write_fields(&self, writer: &mut Writer) {
            if self.x != 0 {
                writer.write_sint32(1, self.x);
            }
            if self.y != 0 {
                writer.write_sint32(2, self.y);
            }
        }

        fn read_field(&mut self, reader: &mut Reader<'_>) -> Result<(), DecodeError> {
            match reader.field_number() {
                1 => self.x = reader.read_sint32()?,
                2 => self.y = reader.read_sint32()?,
                _ => reader.skip_field()?,
            }
            Ok(())
        }
    }

    #[derive(Debug, Default, PartialEq)]
    struct Path {
        points: Vec<Point>,
    }

    impl Message for Path {
        fn write_fields(&self, writer: &mut Writer) {
            for point in &self.points {
                point.write_to_field(1, writer);
            }
        }

        fn read_field(&mut self, reader: &mut Reader<'_>) -> Result<(), DecodeError> {
            match reader.field_number() {
                1 => self.points.push(Point::read_from_field(reader)?),
                _ => reader.skip_field()?,
            }
            Ok(())
        }
    }

    #[test]
    fn test_nested_round_trip() {
        let path = Path {
            points: vec![Point { x: 1, y: -1 }, Point::default(), Point { x: -300, y: 0 }],
        };
        let bytes = path.encode();
        assert_eq!(&bytes[..6], &[0x0a, 0x04, 0x08, 0x02, 0x10, 0x01]);
        assert_eq!(Path::decode(bytes).unwrap(), path);
    }

    #[test]
    fn test_decode_from_base64() {
        assert_eq!(
            Point::decode(ByteSource::Base64("CAI=")).unwrap(),
            Point { x: 1, y: 0 }
        );
        assert!(matches!(
            Point::decode(ByteSource::Base64("not base64!")),
            Err(DecodeError::Source(_))
        ));
    }

    #[test]
    fn test_stray_end_group_is_rejected() {
        // END_GROUP 2, then field 1 = 3
        let bytes = [0x14u8, 0x08, 0x03];
        assert_eq!(Point::decode(&bytes), Err(DecodeError::UnexpectedEndGroup(2)));

        // the same tag inside a submessage of Path
        let bytes = [0x0au8, 0x01, 0x14];
        assert_eq!(Path::decode(&bytes), Err(DecodeError::UnexpectedEndGroup(2)));
    }

    #[test]
    fn test_merge_from_overwrites_and_appends() {
        let mut path = Path::decode(Path { points: vec![Point { x: 1, y: 1 }] }.encode()).unwrap();
        let more = Path { points: vec![Point { x: 2, y: 2 }] }.encode();
        path.merge_from(&mut Reader::new(&more)).unwrap();
        assert_eq!(path.points.len(), 2);
    }
}
