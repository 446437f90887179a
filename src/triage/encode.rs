//! Image encoder — turns a raw attachment into a transmittable base64 form.
//!
//! Encoding is fed to the streaming encoder in fixed-size chunks so no
//! single call sees an arbitrarily large input; the encoder carries its
//! remainder across chunk boundaries, so the output is byte-identical to a
//! one-shot encode and fully reversible.

use std::io::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::write::EncoderWriter;

use crate::models::{EncodedImage, ImageAttachment};

/// Fixed chunk size for the streaming encode (32 KiB).
pub const ENCODE_CHUNK_SIZE: usize = 0x8000;

/// MIME type assumed when the attachment declares none.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Base64-encode a byte slice in fixed-size chunks.
pub fn encode_bytes(bytes: &[u8]) -> String {
    let capacity = bytes.len() / 3 * 4 + 4;
    let mut encoder = EncoderWriter::new(Vec::with_capacity(capacity), &STANDARD);

    for chunk in bytes.chunks(ENCODE_CHUNK_SIZE) {
        encoder
            .write_all(chunk)
            .expect("in-memory base64 write cannot fail");
    }

    let encoded = encoder
        .finish()
        .expect("in-memory base64 finish cannot fail");
    String::from_utf8(encoded).expect("base64 output is ASCII")
}

/// Encode one attachment, applying the MIME default.
pub fn encode_image(attachment: ImageAttachment) -> EncodedImage {
    let mime_type = attachment
        .mime_type
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

    EncodedImage {
        mime_type,
        data: encode_bytes(&attachment.bytes),
    }
}
