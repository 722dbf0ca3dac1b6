//! Portable JSON form of a layer store.
//!
//! Frames and texts serialize as-is. Logos carry their original encoded
//! bytes as a `data:<mime>;base64,<payload>` URL in an `image` field, so a
//! preset is self-contained and reloading it gives a pixel-identical raster.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::codec::{ImageCodec, sniff_mime};
use crate::document::Document;
use crate::error::{DecodeError, PresetError, PresetResult, ValidationError};
use crate::layer::{FrameLayer, LayerId, LogoAsset, LogoLayer, PositionMode, TextLayer};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    pub name: String,
    #[serde(default)]
    pub logos: Vec<LogoRecord>,
    #[serde(default, alias = "textWatermarks")]
    pub texts: Vec<TextLayer>,
    #[serde(default)]
    pub frames: Vec<FrameLayer>,
}

/// A logo layer with its raster replaced by a data URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoRecord {
    pub id: LayerId,
    pub opacity: f32,
    pub position_mode: PositionMode,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub rel_x: f32,
    pub rel_y: f32,
    pub rel_width: f32,
    pub image: String,
}

impl LogoRecord {
    pub fn from_layer(logo: &LogoLayer) -> Self {
        Self {
            id: logo.id,
            opacity: logo.opacity,
            position_mode: logo.position_mode,
            x: logo.x,
            y: logo.y,
            width: logo.width,
            height: logo.height(),
            rel_x: logo.rel_x,
            rel_y: logo.rel_y,
            rel_width: logo.rel_width,
            image: to_data_url(logo.asset().source()),
        }
    }

    /// Decode the embedded image and rebuild the layer. The pixel height is
    /// recomputed from the decoded raster rather than trusted.
    pub async fn into_layer<C: ImageCodec>(self, codec: &C) -> PresetResult<LogoLayer> {
        let bytes = parse_data_url(&self.image)?;
        let decoded = codec.decode(&bytes).await?;
        let mut logo = LogoLayer::new(LogoAsset::new(decoded.raster, bytes));
        logo.id = self.id;
        logo.opacity = self.opacity;
        logo.position_mode = self.position_mode;
        logo.x = self.x;
        logo.y = self.y;
        logo.set_width(self.width);
        logo.rel_x = self.rel_x;
        logo.rel_y = self.rel_y;
        logo.rel_width = self.rel_width;
        Ok(logo)
    }
}

impl Preset {
    pub fn from_document(name: impl Into<String>, document: &Document) -> Self {
        Self {
            name: name.into(),
            logos: document.logos().iter().map(LogoRecord::from_layer).collect(),
            texts: document.texts().to_vec(),
            frames: document.frames().to_vec(),
        }
    }

    /// Frames and texts as a ready store, plus the logo records that still
    /// need decoding.
    pub fn split(self) -> (Document, Vec<LogoRecord>) {
        (Document::from_parts(self.frames, Vec::new(), self.texts), self.logos)
    }

    /// Decode every logo and build the full replacement store. Logos that
    /// fail to decode are left out and their errors returned alongside.
    pub async fn into_document<C: ImageCodec>(self, codec: &C) -> (Document, Vec<PresetError>) {
        let name = self.name.clone();
        let (mut document, records) = self.split();
        let mut failures = Vec::new();
        for record in records {
            match record.into_layer(codec).await {
                Ok(logo) => {
                    document.add_logo(logo);
                }
                Err(err) => {
                    warn!("Dropping logo from preset {name}: {err}");
                    failures.push(err);
                }
            }
        }
        (document, failures)
    }
}

pub fn serialize(name: &str, document: &Document) -> PresetResult<String> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyPresetName.into());
    }
    Ok(serde_json::to_string(&Preset::from_document(name, document))?)
}

pub fn deserialize(text: &str) -> PresetResult<Preset> {
    let preset: Preset = serde_json::from_str(text)?;
    debug!(
        "Parsed preset {} ({} frames, {} logos, {} texts)",
        preset.name,
        preset.frames.len(),
        preset.logos.len(),
        preset.texts.len()
    );
    Ok(preset)
}

pub fn to_data_url(bytes: &[u8]) -> String {
    format!("data:{};base64,{}", sniff_mime(bytes), STANDARD.encode(bytes))
}

/// Payload bytes of a base64 `data:` URL
pub fn parse_data_url(url: &str) -> PresetResult<Vec<u8>> {
    let invalid = || PresetError::InvalidLogoSource(truncate(url));
    let rest = url.strip_prefix("data:").ok_or_else(invalid)?;
    let (header, payload) = rest.split_once(',').ok_or_else(invalid)?;
    if !header.ends_with(";base64") {
        return Err(invalid());
    }
    let bytes = STANDARD.decode(payload.trim()).map_err(|err| {
        PresetError::InvalidLogoSource(format!("{}: {err}", truncate(url)))
    })?;
    if bytes.is_empty() {
        return Err(DecodeError::Empty.into());
    }
    Ok(bytes)
}

fn truncate(url: &str) -> String {
    url.chars().take(32).collect()
}
