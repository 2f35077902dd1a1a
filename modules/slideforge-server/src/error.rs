use thiserror::Error;

/// Admission-time validation failures. Each maps to `400 {error}` at
/// the HTTP edge. See spec §6.1/§7.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("prompt is required.")]
    PromptRequired,
    #[error("prompt must be at most {0} characters.")]
    PromptTooLong(usize),
    #[error("aspect must be one of 16:9, 4:3.")]
    InvalidAspect,
    #[error("imageBase64 is too long.")]
    ImageTooLong,
    #[error("imageBase64 must decode to at most {0} bytes.")]
    ImageTooLarge(usize),
    #[error("imageBase64 must be a PNG or JPEG image.")]
    InvalidImage,
}
