use thiserror::Error;

/// Errors raised while turning encoded bytes into a raster
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("image data is empty")]
    Empty,
    #[error("failed to decode image: {0}")]
    Malformed(String),
}

impl From<image::ImageError> for DecodeError {
    fn from(err: image::ImageError) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
#[error("failed to encode image: {0}")]
pub struct EncodeError(pub String);

impl From<image::ImageError> for EncodeError {
    fn from(err: image::ImageError) -> Self {
        Self(err.to_string())
    }
}

/// User-facing rejections. No state is mutated when one of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please add source images first")]
    NoSourceImages,
    #[error("Please add at least one logo, text or frame")]
    NoLayers,
    #[error("Please enter a preset name")]
    EmptyPresetName,
    #[error("No saved presets found")]
    NoPresets,
    #[error("Preset not found: {0}")]
    PresetNotFound(String),
}

/// A resize that would shrink a layer to or below the minimum size
#[derive(Debug, Clone, Copy, Error, PartialEq)]
#[error("geometry rejected: {width}x{height} is not larger than the minimum size")]
pub struct GeometryRejected {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Error)]
pub enum PresetError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to (de)serialize preset: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid logo source: {0}")]
    InvalidLogoSource(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type PresetResult<T> = Result<T, PresetError>;

/// Failure of a single image inside an export batch
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExportError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Debug, Error)]
#[error("invalid font data for family {family}")]
pub struct FontError {
    pub family: String,
}
