use serde::{Deserialize, Serialize};

/// Raw image attachment as it arrives from the submission flow.
/// Ephemeral — consumed by the encoder and discarded.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    /// Declared MIME type. Empty or absent falls back to "image/jpeg".
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: Some(mime_type.into()),
            bytes,
        }
    }

    /// Attachment with no declared MIME type.
    pub fn untyped(bytes: Vec<u8>) -> Self {
        Self {
            mime_type: None,
            bytes,
        }
    }
}

/// Base64-encoded image, ready for the inference wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

/// Validated outbound request: trimmed narrative plus encoded images
/// in original attachment order.
///
/// Invariant: `narrative` is non-empty, or `images` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    pub narrative: String,
    pub images: Vec<EncodedImage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoded_image_serializes_mime_type_camel_case() {
        let image = EncodedImage {
            mime_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        };
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"mimeType\":\"image/png\""));
        assert!(json.contains("\"data\":\"aGVsbG8=\""));
    }

    #[test]
    fn encoded_image_deserializes_browser_payload() {
        let json = r#"{"mimeType": "image/heic", "data": "QUJD"}"#;
        let image: EncodedImage = serde_json::from_str(json).unwrap();
        assert_eq!(image.mime_type, "image/heic");
        assert_eq!(image.data, "QUJD");
    }

    #[test]
    fn untyped_attachment_has_no_mime() {
        let attachment = ImageAttachment::untyped(vec![1, 2, 3]);
        assert!(attachment.mime_type.is_none());
        assert_eq!(attachment.bytes, vec![1, 2, 3]);
    }
}
