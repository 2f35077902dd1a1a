use base64::Engine;
use thiserror::Error;

const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }

    /// Sniffs the format from leading magic bytes. See spec §3/§6.1.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= PNG_MAGIC.len() && bytes[..PNG_MAGIC.len()] == PNG_MAGIC {
            Some(ImageFormat::Png)
        } else if bytes.len() >= JPEG_MAGIC.len() && bytes[..JPEG_MAGIC.len()] == JPEG_MAGIC {
            Some(ImageFormat::Jpeg)
        } else {
            None
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image data URL is missing the 'data:' prefix")]
    NotDataUrl,
    #[error("image data URL is missing a base64 payload")]
    MissingPayload,
    #[error("image data URL payload is not valid base64")]
    InvalidBase64,
    #[error("image bytes do not match a supported format (png, jpeg)")]
    UnknownFormat,
}

/// Decodes a `data:<mime>;base64,<payload>` URL into raw bytes and a
/// sniffed format. The declared mime type is not trusted; the magic
/// bytes are authoritative.
pub fn decode_data_url(data_url: &str) -> Result<(ImageFormat, Vec<u8>), ImageError> {
    let rest = data_url.strip_prefix("data:").ok_or(ImageError::NotDataUrl)?;
    let (_meta, payload) = rest.split_once(',').ok_or(ImageError::MissingPayload)?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| ImageError::InvalidBase64)?;

    let format = ImageFormat::sniff(&bytes).ok_or(ImageError::UnknownFormat)?;
    Ok((format, bytes))
}

/// Encodes raw bytes back into a `data:` URL for a given format.
pub fn encode_data_url(format: ImageFormat, bytes: &[u8]) -> String {
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{}", format.mime(), payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_png_magic_bytes() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        assert_eq!(ImageFormat::sniff(&bytes), Some(ImageFormat::Png));
    }

    #[test]
    fn sniffs_jpeg_magic_bytes() {
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
        assert_eq!(ImageFormat::sniff(&bytes), Some(ImageFormat::Jpeg));
    }

    #[test]
    fn rejects_unknown_bytes() {
        assert_eq!(ImageFormat::sniff(&[0, 1, 2, 3]), None);
    }

    #[test]
    fn round_trips_through_data_url() {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(b"fake-png-body");
        let url = encode_data_url(ImageFormat::Png, &bytes);
        assert!(url.starts_with("data:image/png;base64,"));

        let (format, decoded) = decode_data_url(&url).unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn rejects_non_data_url() {
        let err = decode_data_url("https://example.com/a.png").unwrap_err();
        assert!(matches!(err, ImageError::NotDataUrl));
    }

    #[test]
    fn ignores_a_mismatched_declared_mime_type() {
        // Declared mime says jpeg, bytes say png: magic bytes win.
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(b"body");
        let payload = base64::engine::general_purpose::STANDARD.encode(&bytes);
        let url = format!("data:image/jpeg;base64,{}", payload);
        let (format, _) = decode_data_url(&url).unwrap();
        assert_eq!(format, ImageFormat::Png);
    }
}
