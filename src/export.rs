//! Batch export: apply the layer store to every source image.

use std::sync::Arc;
use std::task::Poll;

use futures::future::poll_fn;

use image::RgbaImage;
use log::{debug, error, info};

use crate::codec::ImageCodec;
use crate::document::Document;
use crate::error::{ExportError, ValidationError};
use crate::geometry::{image_size, resolve_absolute};
use crate::renderer::Renderer;

/// An encoded input image and the filename it was selected under
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub name: String,
    pub bytes: Arc<[u8]>,
}

impl SourceImage {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// One composited, encoded output. `name` is the source filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedImage {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportReport {
    pub outputs: Vec<ExportedImage>,
    pub failures: Vec<(String, ExportError)>,
}

impl ExportReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Composite `document` onto each source in order and encode the result.
///
/// Every image is resolved against its own dimensions. `on_progress` gets
/// `completed / total` after each image, failed ones included, so the last
/// call is always exactly 1.0. Only one decoded raster is alive at a time.
/// The future suspends between images, so a caller polling it once per frame
/// sees each progress value as it happens.
pub async fn export_batch<C: ImageCodec>(
    sources: &[SourceImage],
    document: &Document,
    renderer: &Renderer,
    codec: &C,
    mut on_progress: impl FnMut(f32),
) -> Result<ExportReport, ValidationError> {
    if sources.is_empty() {
        return Err(ValidationError::NoSourceImages);
    }
    if document.is_empty() {
        return Err(ValidationError::NoLayers);
    }

    let total = sources.len();
    info!("Exporting {total} image(s) with {} layer(s)", document.len());

    let mut report = ExportReport::default();
    for (index, source) in sources.iter().enumerate() {
        match export_one(source, document, renderer, codec).await {
            Ok(bytes) => {
                debug!("Exported {} ({} bytes)", source.name, bytes.len());
                report.outputs.push(ExportedImage {
                    name: source.name.clone(),
                    bytes,
                });
            }
            Err(err) => {
                error!("Failed to export {}: {err}", source.name);
                report.failures.push((source.name.clone(), err));
            }
        }

        let completed = index + 1;
        let progress = if completed == total {
            1.0
        } else {
            completed as f32 / total as f32
        };
        on_progress(progress);
        if completed < total {
            yield_to_executor().await;
        }
    }

    info!(
        "Export finished: {} written, {} failed",
        report.outputs.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Suspend once so the executor's owner regains control between images.
async fn yield_to_executor() {
    let mut yielded = false;
    poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

async fn export_one<C: ImageCodec>(
    source: &SourceImage,
    document: &Document,
    renderer: &Renderer,
    codec: &C,
) -> Result<Vec<u8>, ExportError> {
    let decoded = codec.decode(&source.bytes).await?;
    let layers = resolve_absolute(document, image_size(&decoded.raster));
    let mut surface = RgbaImage::new(decoded.width, decoded.height);
    renderer.composite(&mut surface, &decoded.raster, &layers);
    drop(decoded);
    Ok(codec.encode(&surface).await?)
}

/// A self-contained export: snapshots of the layer store and source set, so
/// the batch can run while the editor keeps changing.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub document: Document,
    pub sources: Vec<SourceImage>,
    pub renderer: Renderer,
}

impl ExportJob {
    pub async fn run<C: ImageCodec>(
        &self,
        codec: &C,
        on_progress: impl FnMut(f32),
    ) -> Result<ExportReport, ValidationError> {
        export_batch(&self.sources, &self.document, &self.renderer, codec, on_progress).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::PngCodec;
    use crate::layer::FrameLayer;
    use futures::executor::block_on;
    use futures::task::noop_waker_ref;
    use image::Rgba;
    use std::cell::RefCell;
    use std::pin::pin;
    use std::task::Context;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let raster = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));
        PngCodec::encode_blocking(&raster).unwrap()
    }

    #[test]
    fn test_empty_inputs_are_rejected_before_progress() {
        let mut calls = 0;
        let doc = Document::new();
        let renderer = Renderer::default();
        let result = block_on(export_batch(&[], &doc, &renderer, &PngCodec, |_| calls += 1));
        assert_eq!(result, Err(ValidationError::NoSourceImages));

        let sources = [SourceImage::new("a.png", png(4, 4))];
        let result = block_on(export_batch(&sources, &doc, &renderer, &PngCodec, |_| calls += 1));
        assert_eq!(result, Err(ValidationError::NoLayers));
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_batch_suspends_after_each_image() {
        let mut doc = Document::new();
        doc.add_frame(FrameLayer::default());
        let sources: Vec<SourceImage> = (0..3)
            .map(|i| SourceImage::new(format!("{i}.png"), png(20, 20)))
            .collect();
        let renderer = Renderer::default();
        let progress = RefCell::new(Vec::new());
        let mut batch = pin!(export_batch(&sources, &doc, &renderer, &PngCodec, |p| {
            progress.borrow_mut().push(p)
        }));
        let mut cx = Context::from_waker(noop_waker_ref());

        assert!(batch.as_mut().poll(&mut cx).is_pending());
        assert_eq!(progress.borrow().len(), 1);
        assert!(batch.as_mut().poll(&mut cx).is_pending());
        assert_eq!(progress.borrow().len(), 2);
        match batch.as_mut().poll(&mut cx) {
            Poll::Ready(Ok(report)) => assert_eq!(report.outputs.len(), 3),
            other => panic!("expected a finished batch, got {other:?}"),
        }
        assert_eq!(*progress.borrow(), vec![1.0 / 3.0, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn test_bad_source_is_reported_and_batch_continues() {
        let mut doc = Document::new();
        doc.add_frame(FrameLayer::default());
        let sources = [
            SourceImage::new("broken.png", b"nope".to_vec()),
            SourceImage::new("good.png", png(40, 30)),
        ];
        let mut progress = Vec::new();
        let report = block_on(export_batch(
            &sources,
            &doc,
            &Renderer::default(),
            &PngCodec,
            |p| progress.push(p),
        ))
        .unwrap();

        assert_eq!(progress, vec![0.5, 1.0]);
        assert_eq!(report.outputs.len(), 1);
        assert_eq!(report.outputs[0].name, "good.png");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "broken.png");
        assert!(!report.is_complete());
    }
}
