//! Fixed-size RGBA capture surface with a minimal 2D drawing context.
//!
//! The context follows 2D-canvas conventions: a current affine transform that
//! `translate`/`scale` post-multiply, a `save`/`restore` stack, and
//! `draw_image` with a source crop rectangle and a destination rectangle.
//! Sampling is nearest-neighbour at destination pixel centres; parts of the
//! source rectangle that fall outside the source image are not painted.

use std::path::Path;

use super::types::{CameraError, Frame, Resolution};

/// Destination pixel surface. Starts fully transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl CaptureBuffer {
    pub const BYTES_PER_PIXEL: usize = 4;

    pub fn new(width: u32, height: u32) -> Result<Self, CameraError> {
        if width == 0 || height == 0 {
            return Err(CameraError::InvalidSurface { width, height });
        }
        Ok(Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * Self::BYTES_PER_PIXEL],
        })
    }

    pub fn with_resolution(resolution: Resolution) -> Result<Self, CameraError> {
        Self::new(resolution.width, resolution.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }

    /// Raw RGBA bytes, row-major.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// RGBA value at (x, y), or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        let p = &self.data[i..i + Self::BYTES_PER_PIXEL];
        Some([p[0], p[1], p[2], p[3]])
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for px in self.data.chunks_exact_mut(Self::BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
    }

    fn put(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 3].copy_from_slice(&rgb);
            self.data[i + 3] = 255;
        }
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL)
    }

    /// Open a drawing context on this buffer.
    pub fn context(&mut self) -> Context2d<'_> {
        Context2d {
            buffer: self,
            transform: Transform::IDENTITY,
            stack: Vec::new(),
        }
    }

    /// Write the buffer as a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<(), CameraError> {
        image::save_buffer_with_format(
            path,
            &self.data,
            self.width,
            self.height,
            image::ExtendedColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .map_err(|source| CameraError::Output {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// 2D affine transform `[a c e; b d f; 0 0 1]`, as in the canvas API.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Map a user-space point to device space.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Transform> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Transform {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Drawing context borrowed from a [`CaptureBuffer`].
#[derive(Debug)]
pub struct Context2d<'a> {
    buffer: &'a mut CaptureBuffer,
    transform: Transform,
    stack: Vec<Transform>,
}

impl Context2d<'_> {
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Push the current transform.
    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    /// Pop the last saved transform; no-op when nothing was saved.
    pub fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        let t = &mut self.transform;
        t.e += t.a * tx + t.c * ty;
        t.f += t.b * tx + t.d * ty;
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        let t = &mut self.transform;
        t.a *= sx;
        t.b *= sx;
        t.c *= sy;
        t.d *= sy;
    }

    /// Draw the source rectangle `(sx, sy, sw, sh)` of `image` into the
    /// destination rectangle `(dx, dy, dw, dh)` under the current transform.
    #[allow(clippy::too_many_arguments)]
    pub fn draw_image(
        &mut self,
        image: &Frame,
        sx: f64,
        sy: f64,
        sw: f64,
        sh: f64,
        dx: f64,
        dy: f64,
        dw: f64,
        dh: f64,
    ) {
        if sw == 0.0 || sh == 0.0 || dw == 0.0 || dh == 0.0 {
            return;
        }
        let Some(inverse) = self.transform.invert() else {
            return;
        };

        let (x0, x1) = (dx.min(dx + dw), dx.max(dx + dw));
        let (y0, y1) = (dy.min(dy + dh), dy.max(dy + dh));
        let (src_w, src_h) = (image.width as f64, image.height as f64);

        for py in 0..self.buffer.height {
            for px in 0..self.buffer.width {
                let (ux, uy) = inverse.apply(px as f64 + 0.5, py as f64 + 0.5);
                if ux < x0 || ux >= x1 || uy < y0 || uy >= y1 {
                    continue;
                }
                let fx = sx + (ux - dx) * sw / dw;
                let fy = sy + (uy - dy) * sh / dh;
                if fx < 0.0 || fy < 0.0 || fx >= src_w || fy >= src_h {
                    continue;
                }
                if let Some(rgb) = image.pixel(fx.floor() as u32, fy.floor() as u32) {
                    self.buffer.put(px, py, rgb);
                }
            }
        }
    }
}
