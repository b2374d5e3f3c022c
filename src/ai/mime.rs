use base64::Engine as _;

/// Base64 image data ready to be sent as an inline media part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

/// Mime type of the formats a browser canvas can export, by magic bytes.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        _ => None,
    }
}

/// Interpret a client image payload as inline base64 data.
///
/// Accepts `data:<mime>;base64,<data>` URLs (as produced by
/// `canvas.toDataURL()`) and bare base64 whose decoded bytes start with a
/// known image signature. Returns `None` for anything else, including plain
/// words that merely happen to be valid base64.
pub fn parse_image_payload(payload: &str) -> Option<InlineImage> {
    if let Some(rest) = payload.strip_prefix("data:") {
        let (header, data) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        let mime_type = if mime_type.is_empty() {
            "image/png"
        } else {
            mime_type
        };
        return Some(InlineImage {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        });
    }

    let data = payload.trim();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .ok()?;

    match sniff_image_mime(&bytes) {
        Some(mime_type) => Some(InlineImage {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        }),
        None => {
            tracing::debug!(
                "Base64 payload has no image signature (first bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}
