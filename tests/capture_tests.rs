//! Tests for still capture: crop geometry, aspect correction and mirroring.
//!
//! Covers:
//! - Crop geometry for wider, matching and narrower destinations
//! - The unclamped negative offset and the unpainted bands it leaves
//! - Horizontal mirroring with scaling, checked with an asymmetric pattern

use camsnap::camera::{CaptureBuffer, CropGeometry, Frame, FrameCapturer, Resolution};

const SENTINEL: [u8; 4] = [1, 2, 3, 4];

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Red block in the top-left quadrant, blue elsewhere.
fn quadrant_marker(width: u32, height: u32) -> Frame {
    Frame::from_fn(width, height, |x, y| {
        if x < width / 2 && y < height / 2 {
            [255, 0, 0]
        } else {
            [0, 0, 255]
        }
    })
}

// ==================== Geometry ====================

#[test]
fn test_hd_into_qvga_has_negative_offset() {
    let g = CropGeometry::compute(Resolution::new(1280, 720), Resolution::new(320, 240));
    assert!(approx(g.ratio, 320.0 / 240.0));
    assert!(approx(g.cropped_height, 960.0));
    assert!(approx(g.y_offset, -120.0));
}

#[test]
fn test_geometry_matches_formula_for_many_ratios() {
    let source = Resolution::new(1920, 1080);
    for (w, h) in [(320, 240), (640, 360), (100, 100), (90, 160), (1000, 10)] {
        let g = CropGeometry::compute(source, Resolution::new(w, h));
        let ratio = w as f64 / h as f64;
        assert!(approx(g.ratio, ratio));
        assert!(approx(g.cropped_height, 1920.0 / ratio));
        assert!(approx(g.y_offset, (1080.0 - 1920.0 / ratio) / 2.0));
    }
}

// ==================== Drawing ====================

#[test]
fn test_negative_offset_leaves_bands_unpainted() {
    let frame = Frame::from_fn(1280, 720, |_, _| [9, 9, 9]);
    let mut buffer = CaptureBuffer::new(320, 240).unwrap();
    buffer.fill(SENTINEL);

    let g = FrameCapturer::default().capture(&frame, &mut buffer);
    assert!(g.overflows_source());

    // 120 source rows above and below map to 30 destination rows each
    for y in [0, 15, 29, 210, 225, 239] {
        assert_eq!(buffer.pixel(160, y), Some(SENTINEL), "row {} painted", y);
    }
    for y in [30, 120, 209] {
        assert_eq!(buffer.pixel(160, y), Some([9, 9, 9, 255]), "row {} unpainted", y);
    }
}

#[test]
fn test_wide_destination_crops_centre_rows() {
    // Green channel encodes the source row (halved to fit in a byte)
    let frame = Frame::from_fn(640, 480, |_, y| [0, (y / 2) as u8, 0]);
    let mut buffer = CaptureBuffer::new(320, 180).unwrap();
    let g = FrameCapturer::default().capture(&frame, &mut buffer);
    assert!(approx(g.y_offset, 60.0));

    // Row 0 samples source row 61, the last row samples source row 419
    assert_eq!(buffer.pixel(0, 0), Some([0, 30, 0, 255]));
    assert_eq!(buffer.pixel(0, 179), Some([0, 209, 0, 255]));
}

#[test]
fn test_mirror_moves_marker_to_the_right() {
    let frame = quadrant_marker(8, 6);
    let mut buffer = CaptureBuffer::new(4, 3).unwrap();
    FrameCapturer::default().capture(&frame, &mut buffer);

    let red = Some([255, 0, 0, 255]);
    let blue = Some([0, 0, 255, 255]);
    // Source column x (scaled by 1/2) lands at destination column 3 - x/2
    assert_eq!(buffer.pixel(3, 0), red);
    assert_eq!(buffer.pixel(2, 0), red);
    assert_eq!(buffer.pixel(1, 0), blue);
    assert_eq!(buffer.pixel(0, 0), blue);
    assert_eq!(buffer.pixel(3, 2), blue);
}

#[test]
fn test_unmirrored_marker_stays_left() {
    let frame = quadrant_marker(8, 6);
    let mut buffer = CaptureBuffer::new(4, 3).unwrap();
    FrameCapturer::new(false).capture(&frame, &mut buffer);
    assert_eq!(buffer.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(buffer.pixel(3, 0), Some([0, 0, 255, 255]));
}

#[test]
fn test_mirrored_equals_reversed_columns() {
    let frame = Frame::from_fn(16, 12, |x, y| [x as u8 * 7, y as u8 * 11, (x * y) as u8]);
    let mut mirrored = CaptureBuffer::new(8, 6).unwrap();
    let mut plain = CaptureBuffer::new(8, 6).unwrap();
    FrameCapturer::new(true).capture(&frame, &mut mirrored);
    FrameCapturer::new(false).capture(&frame, &mut plain);

    for y in 0..6 {
        for x in 0..8 {
            assert_eq!(mirrored.pixel(x, y), plain.pixel(7 - x, y), "({}, {})", x, y);
        }
    }
}

#[test]
fn test_capture_overwrites_in_place() {
    let mut buffer = CaptureBuffer::new(4, 3).unwrap();
    let capturer = FrameCapturer::default();

    capturer.capture(&Frame::from_fn(4, 3, |_, _| [10, 10, 10]), &mut buffer);
    capturer.capture(&Frame::from_fn(8, 6, |_, _| [20, 20, 20]), &mut buffer);

    assert!(buffer
        .as_bytes()
        .chunks_exact(4)
        .all(|px| px == [20, 20, 20, 255]));
}

#[test]
fn test_repeated_captures_are_identical() {
    // The mirror transform must not accumulate between captures
    let frame = quadrant_marker(8, 6);
    let capturer = FrameCapturer::default();
    let mut first = CaptureBuffer::new(4, 3).unwrap();
    let mut second = CaptureBuffer::new(4, 3).unwrap();
    capturer.capture(&frame, &mut first);
    capturer.capture(&frame, &mut second);
    capturer.capture(&frame, &mut second);
    assert_eq!(first, second);
}
