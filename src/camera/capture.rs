//! Still-frame capture with aspect correction and mirroring.

use super::binder::DisplaySurface;
use super::canvas::CaptureBuffer;
use super::types::{CameraError, Frame, Resolution};

/// Source region chosen for one capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropGeometry {
    /// Destination width / height
    pub ratio: f64,
    /// Height of the source slice matching the destination aspect ratio
    pub cropped_height: f64,
    /// Vertical offset of the slice; negative when the source is too short
    pub y_offset: f64,
}

impl CropGeometry {
    /// Centre a full-width slice of `source` with `destination`'s aspect ratio.
    ///
    /// The offset is not clamped. When the destination is taller than the
    /// source can fill, `y_offset` is negative and the bands above and below
    /// the source stay unpainted.
    pub fn compute(source: Resolution, destination: Resolution) -> Self {
        let ratio = destination.width as f64 / destination.height as f64;
        let cropped_height = source.width as f64 / ratio;
        let y_offset = (source.height as f64 - cropped_height) / 2.0;
        Self {
            ratio,
            cropped_height,
            y_offset,
        }
    }

    /// Whether part of the destination falls outside the source.
    pub fn overflows_source(&self) -> bool {
        self.y_offset < 0.0
    }
}

/// Copies visual content into a [`CaptureBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct FrameCapturer {
    mirror: bool,
}

impl Default for FrameCapturer {
    fn default() -> Self {
        Self { mirror: true }
    }
}

impl FrameCapturer {
    pub fn new(mirror: bool) -> Self {
        Self { mirror }
    }

    pub fn mirror(&self) -> bool {
        self.mirror
    }

    /// Draw `source` into `destination`, cropped to the destination's aspect
    /// ratio and flipped about the vertical axis when mirroring is on.
    ///
    /// The destination is overwritten in place; the transform is restored
    /// afterwards so nothing leaks into later draws.
    pub fn capture(&self, source: &Frame, destination: &mut CaptureBuffer) -> CropGeometry {
        let geometry = CropGeometry::compute(source.resolution(), destination.resolution());
        let (dw, dh) = (destination.width() as f64, destination.height() as f64);

        let mut ctx = destination.context();
        ctx.save();
        if self.mirror {
            ctx.translate(dw, 0.0);
            ctx.scale(-1.0, 1.0);
        }
        ctx.draw_image(
            source,
            0.0,
            geometry.y_offset,
            source.width as f64,
            geometry.cropped_height,
            0.0,
            0.0,
            dw,
            dh,
        );
        ctx.restore();

        if geometry.overflows_source() {
            log::debug!(
                "Source {} cannot fill {} (y offset {:.1})",
                source.resolution(),
                destination.resolution(),
                geometry.y_offset
            );
        }
        geometry
    }

    /// Capture the current frame of the stream bound to `surface`.
    pub fn capture_surface(
        &self,
        surface: &DisplaySurface,
        destination: &mut CaptureBuffer,
    ) -> Result<CropGeometry, CameraError> {
        if !surface.is_bound() {
            return Err(CameraError::NoActiveStream);
        }
        let frame = surface.current_frame().ok_or(CameraError::NoFrame)?;
        let geometry = self.capture(&frame, destination);
        log::info!(
            "Captured {} frame into {} buffer (mirror: {})",
            frame.resolution(),
            destination.resolution(),
            self.mirror
        );
        Ok(geometry)
    }
}
