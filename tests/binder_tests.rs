//! Tests for stream binding on a display surface.
//!
//! These tests verify the resource rules for camera streams:
//! - At most one live stream per surface
//! - Rebinding stops every track of the previous stream
//! - Overlapping binds resolve to the most recent request
//! - Unbind is idempotent

use camsnap::camera::fake::FakeHost;
use camsnap::camera::{CameraError, DisplaySurface, StreamBinder};
use std::time::Duration;

#[test]
fn test_unbind_without_stream_is_noop() {
    let host = FakeHost::demo();
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    assert_eq!(binder.unbind(&surface), 0);
    assert!(!surface.is_bound());
    assert_eq!(host.open_calls(), 0);
}

#[tokio::test]
async fn test_unbind_then_bind_leaves_one_live_stream() {
    let host = FakeHost::demo().with_tracks_per_stream(3);
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    binder.bind(&surface, "fake-cam-0").await.unwrap();
    assert_eq!(binder.unbind(&surface), 3);
    assert_eq!(binder.unbind(&surface), 0);

    binder.bind(&surface, "fake-cam-1").await.unwrap();
    assert_eq!(host.live_streams().len(), 1);
    assert_eq!(host.stopped_tracks(), 3);
    assert_eq!(surface.bound_device().as_deref(), Some("fake-cam-1"));
}

#[tokio::test]
async fn test_bind_replaces_previous_stream() {
    let host = FakeHost::demo().with_tracks_per_stream(2);
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    for device in ["fake-cam-0", "fake-cam-1", "fake-cam-0", "fake-cam-0"] {
        binder.bind(&surface, device).await.unwrap();
        assert_eq!(host.live_streams().len(), 1);
    }
    // Three replaced streams, two tracks each
    assert_eq!(host.stopped_tracks(), 6);
}

#[tokio::test]
async fn test_overlapping_binds_last_issued_wins() {
    // The first request resolves after the second one
    let host = FakeHost::demo().with_latency("fake-cam-0", Duration::from_millis(50));
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    let (slow, fast) = tokio::join!(
        binder.bind(&surface, "fake-cam-0"),
        binder.bind(&surface, "fake-cam-1"),
    );

    assert!(matches!(
        slow,
        Err(CameraError::Superseded { ref device_id }) if device_id == "fake-cam-0"
    ));
    assert_eq!(fast.unwrap().device_id, "fake-cam-1");
    assert_eq!(surface.bound_device().as_deref(), Some("fake-cam-1"));
    assert_eq!(host.opened_devices(), vec!["fake-cam-1", "fake-cam-0"]);
    assert_eq!(host.live_streams().len(), 1);
}

#[tokio::test]
async fn test_stale_failure_is_superseded() {
    let host = FakeHost::demo()
        .with_latency("fake-cam-0", Duration::from_millis(50))
        .with_failing_device("fake-cam-0", "device busy");
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    let (slow, fast) = tokio::join!(
        binder.bind(&surface, "fake-cam-0"),
        binder.bind(&surface, "fake-cam-1"),
    );

    assert!(matches!(
        slow,
        Err(CameraError::Superseded { ref device_id }) if device_id == "fake-cam-0"
    ));
    assert!(fast.is_ok());
    assert_eq!(surface.bound_device().as_deref(), Some("fake-cam-1"));
}

#[tokio::test]
async fn test_current_failure_is_reported() {
    let host = FakeHost::demo().with_failing_device("fake-cam-0", "device busy");
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    let err = binder.bind(&surface, "fake-cam-0").await.unwrap_err();
    assert!(matches!(err, CameraError::Acquisition { ref reason, .. } if reason == "device busy"));
}

#[tokio::test]
async fn test_overlapping_binds_slow_newest_still_wins() {
    // The first request attaches immediately; the slower, newer one must
    // replace it once it arrives
    let host = FakeHost::demo()
        .with_tracks_per_stream(2)
        .with_latency("fake-cam-1", Duration::from_millis(50));
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    let (first, second) = tokio::join!(
        binder.bind(&surface, "fake-cam-0"),
        binder.bind(&surface, "fake-cam-1"),
    );

    assert!(first.is_ok());
    assert_eq!(second.unwrap().released_tracks, 2);
    assert_eq!(surface.bound_device().as_deref(), Some("fake-cam-1"));
    assert_eq!(host.live_streams().len(), 1);
}

#[tokio::test]
async fn test_unbind_during_pending_bind_discards_stream() {
    let host = FakeHost::demo().with_latency("fake-cam-0", Duration::from_millis(50));
    let binder = StreamBinder::new(&host);
    let surface = DisplaySurface::new("preview");

    let (bound, released) = tokio::join!(binder.bind(&surface, "fake-cam-0"), async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        binder.unbind(&surface)
    });

    assert_eq!(released, 0);
    assert!(matches!(bound, Err(CameraError::Superseded { .. })));
    assert!(!surface.is_bound());
    assert!(host.live_streams().is_empty());
}

#[tokio::test]
async fn test_surfaces_are_independent() {
    let host = FakeHost::demo();
    let binder = StreamBinder::new(&host);
    let left = DisplaySurface::new("left");
    let right = DisplaySurface::new("right");

    binder.bind(&left, "fake-cam-0").await.unwrap();
    binder.bind(&right, "fake-cam-1").await.unwrap();
    assert_eq!(host.live_streams().len(), 2);

    binder.unbind(&left);
    assert!(right.is_bound());
    assert_eq!(host.live_streams().len(), 1);
}
