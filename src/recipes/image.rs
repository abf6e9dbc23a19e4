use base64ct::{Base64, Encoding};
use bytes::Bytes;

use crate::error::ApiError;

const DATA_URI_MARKER: &str = "data:image";
const BASE64_DELIMITER: &str = ";base64,";

/// An image field as submitted by a client: either an inline data URI that
/// decodes to bytes, or any other string, passed through untouched (an
/// already-stored reference on update).
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    Inline(DecodedImage),
    Stored(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub bytes: Bytes,
    pub extension: String,
    pub content_type: String,
}

impl DecodedImage {
    pub fn file_name(&self) -> String {
        format!("upload.{}", self.extension)
    }
}

impl ImagePayload {
    pub fn decode(raw: &str) -> Result<Self, ApiError> {
        if !raw.starts_with(DATA_URI_MARKER) {
            return Ok(ImagePayload::Stored(raw.to_string()));
        }

        let (header, body) = raw.split_once(BASE64_DELIMITER).ok_or(ApiError::InvalidField {
            field: "image",
            message: "inline image is missing the ;base64, delimiter".into(),
        })?;

        // header is "data:image/<subtype>"
        let content_type = header.strip_prefix("data:").unwrap_or(header);
        let extension = content_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .filter(|s| !s.is_empty())
            .ok_or(ApiError::InvalidField {
                field: "image",
                message: "inline image is missing its subtype".into(),
            })?;

        let bytes = Base64::decode_vec(body).map_err(|_| ApiError::InvalidField {
            field: "image",
            message: "inline image body is not valid base64".into(),
        })?;

        Ok(ImagePayload::Inline(DecodedImage {
            bytes: Bytes::from(bytes),
            extension: extension.to_string(),
            content_type: content_type.to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_inline_png() {
        // "hello" in base64
        let payload = ImagePayload::decode("data:image/png;base64,aGVsbG8=").unwrap();
        let ImagePayload::Inline(img) = payload else {
            panic!("expected inline image");
        };
        assert_eq!(img.bytes.as_ref(), b"hello");
        assert_eq!(img.extension, "png");
        assert_eq!(img.content_type, "image/png");
        assert_eq!(img.file_name(), "upload.png");
    }

    #[test]
    fn decoded_length_matches_base64_payload() {
        let body = Base64::encode_string(&[0u8; 64]);
        let raw = format!("data:image/jpeg;base64,{body}");
        let ImagePayload::Inline(img) = ImagePayload::decode(&raw).unwrap() else {
            panic!("expected inline image");
        };
        assert_eq!(img.bytes.len(), 64);
        assert_eq!(img.extension, "jpeg");
    }

    #[test]
    fn non_prefixed_string_passes_through_unchanged() {
        let raw = "recipes/4e1f/cover.png";
        assert_eq!(
            ImagePayload::decode(raw).unwrap(),
            ImagePayload::Stored(raw.to_string())
        );
    }

    #[test]
    fn missing_delimiter_is_rejected() {
        let err = ImagePayload::decode("data:image/png,aGVsbG8=").unwrap_err();
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn missing_subtype_is_rejected() {
        let err = ImagePayload::decode("data:image;base64,aGVsbG8=").unwrap_err();
        assert!(err.to_string().contains("subtype"));
    }

    #[test]
    fn malformed_base64_is_rejected() {
        let err = ImagePayload::decode("data:image/png;base64,---not-base64---").unwrap_err();
        assert!(err.to_string().contains("base64"));
    }
}
