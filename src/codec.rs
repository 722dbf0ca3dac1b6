use std::future::Future;
use std::io::Cursor;

use image::{ImageFormat, RgbaImage};
use log::debug;

use crate::error::{DecodeError, EncodeError};

/// A decoded raster and its size
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub raster: RgbaImage,
    pub width: u32,
    pub height: u32,
}

impl DecodedImage {
    pub fn new(raster: RgbaImage) -> Self {
        let (width, height) = raster.dimensions();
        Self { raster, width, height }
    }
}

/// Raster decode/encode capability.
///
/// Both directions are asynchronous so that a host may run them off the UI
/// path; the editor only ever awaits them one at a time.
pub trait ImageCodec {
    fn decode(&self, bytes: &[u8]) -> impl Future<Output = Result<DecodedImage, DecodeError>>;

    /// Encode into the codec's single, lossless output format
    fn encode(&self, raster: &RgbaImage) -> impl Future<Output = Result<Vec<u8>, EncodeError>>;
}

/// Decodes anything the `image` crate understands and always encodes PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PngCodec;

impl PngCodec {
    pub const MIME: &'static str = "image/png";

    pub fn decode_blocking(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }
        let image = image::load_from_memory(bytes)?;
        debug!("Decoded image: {}x{}", image.width(), image.height());
        Ok(DecodedImage::new(image.to_rgba8()))
    }

    pub fn encode_blocking(raster: &RgbaImage) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        raster.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

impl ImageCodec for PngCodec {
    fn decode(&self, bytes: &[u8]) -> impl Future<Output = Result<DecodedImage, DecodeError>> {
        async move { Self::decode_blocking(bytes) }
    }

    fn encode(&self, raster: &RgbaImage) -> impl Future<Output = Result<Vec<u8>, EncodeError>> {
        async move { Self::encode_blocking(raster) }
    }
}

/// MIME type of encoded image bytes, as far as the `image` crate can tell
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type())
        .unwrap_or("application/octet-stream")
}
