//! Byte source normalization.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::BufferError;

/// Anything a decoder can be pointed at.
///
/// Every variant is normalized once, at the boundary, into a single byte view.
/// Borrowed buffers and UTF-8 text are viewed in place; only `Base64` text has
/// to be materialized.
///
/// # Example
///
/// ```
/// use protowire_buffers::ByteSource;
///
/// let bytes = ByteSource::from(&[8u8, 3][..]).into_bytes().unwrap();
/// assert_eq!(&*bytes, &[8, 3]);
///
/// let bytes = ByteSource::Base64("CAM=").into_bytes().unwrap();
/// assert_eq!(&*bytes, &[8, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteSource<'a> {
    /// A contiguous byte buffer.
    Slice(&'a [u8]),
    /// A growable byte array handed over by value.
    Vec(Vec<u8>),
    /// UTF-8 text whose encoded bytes are the payload.
    Text(&'a str),
    /// Standard (padded) base64 text.
    Base64(&'a str),
}

impl<'a> ByteSource<'a> {
    /// Normalizes the source into a byte view, zero-copy where possible.
    pub fn into_bytes(self) -> Result<Cow<'a, [u8]>, BufferError> {
        match self {
            ByteSource::Slice(bytes) => Ok(Cow::Borrowed(bytes)),
            ByteSource::Vec(bytes) => Ok(Cow::Owned(bytes)),
            ByteSource::Text(text) => Ok(Cow::Borrowed(text.as_bytes())),
            ByteSource::Base64(text) => STANDARD
                .decode(text.trim())
                .map(Cow::Owned)
                .map_err(|_| BufferError::InvalidBase64),
        }
    }
}

impl<'a> From<&'a [u8]> for ByteSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ByteSource::Slice(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for ByteSource<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        ByteSource::Slice(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for ByteSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        ByteSource::Slice(bytes)
    }
}

impl From<Vec<u8>> for ByteSource<'static> {
    fn from(bytes: Vec<u8>) -> Self {
        ByteSource::Vec(bytes)
    }
}

impl<'a> From<&'a str> for ByteSource<'a> {
    fn from(text: &'a str) -> Self {
        ByteSource::Text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_is_borrowed() {
        let data = [1u8, 2, 3];
        let bytes = ByteSource::from(&data).into_bytes().unwrap();
        assert!(matches!(bytes, Cow::Borrowed(_)));
        assert_eq!(&*bytes, &[1, 2, 3]);
    }

    #[test]
    fn test_vec_is_moved() {
        let bytes = ByteSource::from(vec![4u8, 5]).into_bytes().unwrap();
        assert!(matches!(bytes, Cow::Owned(_)));
        assert_eq!(&*bytes, &[4, 5]);
    }

    #[test]
    fn test_text_views_utf8() {
        let bytes = ByteSource::from("hé").into_bytes().unwrap();
        assert_eq!(&*bytes, "hé".as_bytes());
    }

    #[test]
    fn test_base64() {
        let bytes = ByteSource::Base64("SgA=").into_bytes().unwrap();
        assert_eq!(&*bytes, &[74, 0]);
        assert_eq!(
            ByteSource::Base64("not base64!").into_bytes(),
            Err(BufferError::InvalidBase64)
        );
    }
}
