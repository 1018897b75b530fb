//! End-to-end tests for the camera session.
//!
//! These tests drive the whole flow against the in-memory host:
//! - Startup authorizes, lists cameras and populates the control
//! - Startup failures abort with exactly one alert
//! - Selection failures are alerted and can be retried
//! - Captures are mirrored stills of the selected camera
//! - The event loop releases the camera when it ends

use camsnap::camera::fake::FakeHost;
use camsnap::camera::{
    CameraError, CaptureBuffer, DeviceDescriptor, DeviceKind, Frame, Resolution,
};
use camsnap::selection::{SelectOption, SelectionControl, UiEvent};
use camsnap::session::{CaptureSettings, Session};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Default)]
struct RecordingControl {
    options: Vec<SelectOption>,
    alerts: Vec<String>,
    captures: Vec<CaptureBuffer>,
}

impl SelectionControl for RecordingControl {
    fn set_options(&mut self, options: &[SelectOption]) {
        self.options = options.to_vec();
    }

    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn show_capture(&mut self, buffer: &CaptureBuffer) -> Result<(), CameraError> {
        self.captures.push(buffer.clone());
        Ok(())
    }
}

fn small_settings() -> CaptureSettings {
    CaptureSettings {
        resolution: Resolution::new(4, 3),
        ..CaptureSettings::default()
    }
}

/// Left half red, right half blue.
fn split_frame() -> Frame {
    Frame::from_fn(8, 6, |x, _| if x < 4 { [255, 0, 0] } else { [0, 0, 255] })
}

fn mixed_host() -> FakeHost {
    FakeHost::new()
        .with_camera("cam-a", "Front", split_frame())
        .with_device(DeviceDescriptor::new("mic-a", "Mic A", DeviceKind::AudioInput))
        .with_camera("cam-b", "Rear", split_frame())
        .with_device(DeviceDescriptor::new("mic-b", "Mic B", DeviceKind::AudioInput))
        .with_camera("cam-c", "", split_frame())
}

#[tokio::test]
async fn test_startup_lists_only_cameras_in_order() {
    let host = mixed_host();
    let mut session = Session::new(&host, RecordingControl::default(), small_settings()).unwrap();

    let ids: Vec<String> = session
        .startup()
        .await
        .unwrap()
        .iter()
        .map(|d| d.id.clone())
        .collect();
    assert_eq!(ids, vec!["cam-a", "cam-b", "cam-c"]);

    let control = session.control();
    assert_eq!(control.options.len(), 3);
    assert_eq!(control.options[0].text, "Front");
    // Cameras without a label are numbered by position
    assert_eq!(control.options[2].text, "Camera 3");
    assert_eq!(control.options[2].value, "cam-c");
    assert!(control.alerts.is_empty());
    // The authorization probe is released again
    assert!(host.live_streams().is_empty());
}

#[tokio::test]
async fn test_unsupported_host_aborts_with_single_alert() {
    let host = FakeHost::unsupported();
    let mut session = Session::new(&host, RecordingControl::default(), small_settings()).unwrap();

    let err = session.startup().await.unwrap_err();
    assert!(matches!(err, CameraError::CapabilityUnsupported(_)));
    assert_eq!(session.control().alerts.len(), 1);
    assert!(session.control().options.is_empty());
    assert_eq!(host.enumerate_calls(), 0);
    assert_eq!(host.open_calls(), 0);
}

#[tokio::test]
async fn test_denied_permission_aborts_run() {
    let host = mixed_host();
    host.deny_permission(true);
    let mut session = Session::new(&host, RecordingControl::default(), small_settings()).unwrap();

    let (tx, rx) = mpsc::channel(4);
    tx.send(UiEvent::Select("cam-a".to_string())).await.unwrap();
    let err = session.run(rx).await.unwrap_err();
    assert!(matches!(err, CameraError::PermissionDenied { .. }));
    assert_eq!(session.control().alerts.len(), 1);
    assert_eq!(host.enumerate_calls(), 0);
}

#[tokio::test]
async fn test_select_and_capture_mirrors() {
    let host = mixed_host();
    let mut session = Session::new(&host, RecordingControl::default(), small_settings()).unwrap();
    session.startup().await.unwrap();

    session.select("cam-b").await.unwrap();
    assert_eq!(session.wait_until_flowing().await.unwrap(), Resolution::new(8, 6));
    session.capture().unwrap();

    let still = &session.control().captures[0];
    // Red was on the left of the source, so it is on the right of the still
    assert_eq!(still.pixel(0, 1), Some([0, 0, 255, 255]));
    assert_eq!(still.pixel(3, 1), Some([255, 0, 0, 255]));
}

#[tokio::test]
async fn test_failed_selection_can_be_retried() {
    let host = mixed_host().with_failing_device("cam-b", "device busy");
    let mut session = Session::new(&host, RecordingControl::default(), small_settings()).unwrap();
    session.startup().await.unwrap();

    let err = session.select("cam-b").await.unwrap_err();
    assert!(matches!(err, CameraError::Acquisition { .. }));
    assert_eq!(session.control().alerts.len(), 1);
    assert!(!session.surface().is_bound());

    session.select("cam-a").await.unwrap();
    assert!(session.surface().is_bound());
    assert_eq!(session.control().alerts.len(), 1);
}

#[tokio::test]
async fn test_run_loop_handles_events_and_releases_camera() {
    let host = Arc::new(mixed_host().with_tracks_per_stream(2));
    let mut session =
        Session::new(Arc::clone(&host), RecordingControl::default(), small_settings()).unwrap();

    let (tx, rx) = mpsc::channel(8);
    for event in [
        UiEvent::Capture,
        UiEvent::Select("cam-a".to_string()),
        UiEvent::Select("missing".to_string()),
        UiEvent::Select("cam-c".to_string()),
        UiEvent::Capture,
        UiEvent::Capture,
        UiEvent::Quit,
        UiEvent::Capture,
    ] {
        tx.send(event).await.unwrap();
    }

    session.run(rx).await.unwrap();

    let control = session.control();
    // Capture before selection and the unknown device
    assert_eq!(control.alerts.len(), 2);
    // Events after Quit are ignored
    assert_eq!(control.captures.len(), 2);
    assert!(!session.surface().is_bound());
    assert!(host.live_streams().is_empty());
}

#[tokio::test]
async fn test_run_ends_when_control_goes_away() {
    let host = mixed_host();
    let mut session = Session::new(&host, RecordingControl::default(), small_settings()).unwrap();

    let (tx, rx) = mpsc::channel(4);
    tx.send(UiEvent::Select("cam-a".to_string())).await.unwrap();
    drop(tx);

    session.run(rx).await.unwrap();
    assert!(host.live_streams().is_empty());
}
