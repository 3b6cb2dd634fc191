//! Scene backdrop: solid color, live camera plane, or fallback color.
//!
//! Exactly one [`BackgroundMode`] is active at any time. The live-camera
//! plane keeps its stream allocated across a switch back to a solid color so
//! re-entering camera mode needs no second acquisition. Acquisition itself
//! runs on a worker thread and is drained once per frame, mirroring the
//! import pipeline's completion-queue shape.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::error::{Result, ViewerError};
use crate::gfx::viewport::Viewport;
use crate::media::{CameraAccess, VideoStream};

/// Fixed aspect the backdrop plane is authored against (16:9).
pub const REFERENCE_ASPECT: f32 = 16.0 / 9.0;

/// Color used when camera acquisition fails.
pub const FALLBACK_COLOR: [f32; 3] = [0.0, 0.0, 0.0];

/// Which backdrop source is active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BackgroundMode {
    SolidColor([f32; 3]),
    LiveCamera,
    FallbackColor([f32; 3]),
}

/// Non-uniform scale that makes a reference-aspect plane fully cover a
/// viewport of aspect `viewport_aspect`.
///
/// Wider viewports stretch the plane horizontally by `a / r`; taller ones
/// stretch vertically by `r / a`. The untouched axis stays at 1 so the plane
/// is never smaller than the viewport on either axis.
pub fn cover_scale(viewport_aspect: f32) -> (f32, f32) {
    if viewport_aspect > REFERENCE_ASPECT {
        (viewport_aspect / REFERENCE_ASPECT, 1.0)
    } else {
        (1.0, REFERENCE_ASPECT / viewport_aspect)
    }
}

/// The video-textured plane drawn behind all scene content.
pub struct BackgroundPlane {
    stream: Box<dyn VideoStream>,
    visible: bool,
    scale: (f32, f32),
    frame: Vec<u8>,
}

impl BackgroundPlane {
    fn new(stream: Box<dyn VideoStream>, scale: (f32, f32)) -> Self {
        Self {
            stream,
            // Hidden until the user explicitly toggles it on.
            visible: false,
            scale,
            frame: Vec::new(),
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn scale(&self) -> (f32, f32) {
        self.scale
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.stream.dimensions()
    }

    /// Pulls the newest frame from the stream, returning it when one was
    /// produced.
    pub fn pump_frame(&mut self) -> Option<&[u8]> {
        if self.stream.next_frame(&mut self.frame) {
            Some(&self.frame)
        } else {
            None
        }
    }
}

/// Owns the backdrop mode, the optional plane, and the in-flight
/// acquisition, if any.
pub struct BackgroundProvider {
    mode: BackgroundMode,
    base_color: [f32; 3],
    plane: Option<BackgroundPlane>,
    pending: Option<Receiver<Result<Box<dyn VideoStream>>>>,
}

impl BackgroundProvider {
    pub fn new(initial_color: [f32; 3]) -> Self {
        Self {
            mode: BackgroundMode::SolidColor(initial_color),
            base_color: initial_color,
            plane: None,
            pending: None,
        }
    }

    pub fn mode(&self) -> BackgroundMode {
        self.mode
    }

    pub fn plane(&self) -> Option<&BackgroundPlane> {
        self.plane.as_ref()
    }

    pub fn plane_mut(&mut self) -> Option<&mut BackgroundPlane> {
        self.plane.as_mut()
    }

    pub fn acquisition_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Color to clear the frame with. In live-camera mode the most recent
    /// solid color shows through wherever the plane is hidden.
    pub fn clear_color(&self) -> [f32; 3] {
        match self.mode {
            BackgroundMode::SolidColor(color) | BackgroundMode::FallbackColor(color) => color,
            BackgroundMode::LiveCamera => self.base_color,
        }
    }

    /// Switches to a solid color. A live plane is hidden but its stream
    /// stays allocated for a quick return to camera mode.
    pub fn set_solid_color(&mut self, color: [f32; 3]) {
        self.mode = BackgroundMode::SolidColor(color);
        self.base_color = color;
        if let Some(plane) = self.plane.as_mut() {
            plane.visible = false;
        }
    }

    /// Returns to camera mode using the stream held from an earlier
    /// acquisition. Returns false when no stream is held.
    pub fn resume_live_camera(&mut self) -> bool {
        if self.plane.is_some() {
            self.mode = BackgroundMode::LiveCamera;
            return true;
        }
        false
    }

    /// Requests the live-camera backdrop.
    ///
    /// With a stream already held (from an earlier acquisition) this only
    /// flips the mode. Otherwise acquisition starts on a worker thread and
    /// resolves through [`BackgroundProvider::poll_acquisition`]; a request
    /// already in flight is left alone, there is no cancellation path.
    pub fn activate_live_camera(&mut self, source: Box<dyn CameraAccess>) {
        if self.resume_live_camera() {
            return;
        }
        if self.pending.is_some() {
            return;
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(source.acquire());
        });
        self.pending = Some(rx);
    }

    /// Drains a finished acquisition, if one resolved since the last call.
    ///
    /// On success the plane is built against the current viewport (hidden,
    /// pending an explicit toggle) and the mode becomes `LiveCamera`; on
    /// failure the mode falls back to a solid black backdrop and the error
    /// is returned for surfacing.
    pub fn poll_acquisition(&mut self, viewport: &Viewport) -> Option<Result<()>> {
        let rx = self.pending.as_ref()?;
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                Err(ViewerError::Acquisition("camera worker vanished".into()))
            }
        };
        self.pending = None;

        match outcome {
            Ok(stream) => {
                log::info!("camera stream acquired: {:?}", stream.dimensions());
                self.plane = Some(BackgroundPlane::new(stream, cover_scale(viewport.aspect())));
                self.mode = BackgroundMode::LiveCamera;
                Some(Ok(()))
            }
            Err(err) => {
                log::warn!("camera acquisition failed: {err}");
                self.mode = BackgroundMode::FallbackColor(FALLBACK_COLOR);
                self.base_color = FALLBACK_COLOR;
                Some(Err(err))
            }
        }
    }

    /// Flips the plane's visible sub-state without touching the mode.
    ///
    /// Fails with a precondition error while no plane exists, i.e. before
    /// acquisition completed or after it failed. Returns the new visibility.
    pub fn toggle_visibility(&mut self) -> Result<bool> {
        match self.plane.as_mut() {
            Some(plane) => {
                plane.visible = !plane.visible;
                Ok(plane.visible)
            }
            None => Err(ViewerError::Precondition(
                "camera feed is not ready yet; activate the camera first".into(),
            )),
        }
    }

    /// Recomputes the plane's cover scale for a new viewport size.
    pub fn rescale(&mut self, width: u32, height: u32) {
        if let Some(plane) = self.plane.as_mut() {
            plane.scale = cover_scale(width.max(1) as f32 / height.max(1) as f32);
        }
    }

    /// Whether the renderer should draw the plane this frame.
    pub fn plane_active(&self) -> bool {
        self.mode == BackgroundMode::LiveCamera
            && self.plane.as_ref().is_some_and(|plane| plane.visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SyntheticCamera;
    use std::time::{Duration, Instant};

    struct DeniedCamera;

    impl CameraAccess for DeniedCamera {
        fn acquire(self: Box<Self>) -> Result<Box<dyn VideoStream>> {
            Err(ViewerError::Acquisition("permission denied".into()))
        }
    }

    fn wait_for_acquisition(
        provider: &mut BackgroundProvider,
        viewport: &Viewport,
    ) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(outcome) = provider.poll_acquisition(viewport) {
                return outcome;
            }
            assert!(Instant::now() < deadline, "acquisition never resolved");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_cover_scale_matches_reference_exactly() {
        let (sx, sy) = cover_scale(1920.0 / 1080.0);
        assert!((sx - 1.0).abs() < 1e-6);
        assert!((sy - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cover_scale_widens_on_ultrawide() {
        let aspect = 2560.0 / 1080.0;
        let (sx, sy) = cover_scale(aspect);
        assert!((sx - aspect / REFERENCE_ASPECT).abs() < 1e-6);
        assert!((sx - 1.3333334).abs() < 1e-4);
        assert_eq!(sy, 1.0);
    }

    #[test]
    fn test_cover_scale_stretches_vertically_on_portrait() {
        let aspect = 1080.0 / 1920.0;
        let (sx, sy) = cover_scale(aspect);
        assert_eq!(sx, 1.0);
        assert!((sy - REFERENCE_ASPECT / aspect).abs() < 1e-4);
    }

    #[test]
    fn test_successful_acquisition_builds_hidden_plane() {
        let mut provider = BackgroundProvider::new([0.9, 0.9, 0.9]);
        let viewport = Viewport::new(1920, 1080);

        provider.activate_live_camera(Box::new(SyntheticCamera::new(64, 36)));
        assert!(provider.acquisition_pending());
        wait_for_acquisition(&mut provider, &viewport).expect("synthetic camera succeeds");

        assert_eq!(provider.mode(), BackgroundMode::LiveCamera);
        let plane = provider.plane().expect("plane exists after acquisition");
        assert!(!plane.visible(), "plane starts hidden pending user toggle");
        assert!(!provider.plane_active());

        assert!(provider.toggle_visibility().unwrap());
        assert!(provider.plane_active());
    }

    #[test]
    fn test_failed_acquisition_falls_back_to_black() {
        let mut provider = BackgroundProvider::new([0.9, 0.9, 0.9]);
        let viewport = Viewport::new(1920, 1080);

        provider.activate_live_camera(Box::new(DeniedCamera));
        let outcome = wait_for_acquisition(&mut provider, &viewport);
        assert!(matches!(outcome, Err(ViewerError::Acquisition(_))));

        assert_eq!(provider.mode(), BackgroundMode::FallbackColor(FALLBACK_COLOR));
        assert_eq!(provider.clear_color(), FALLBACK_COLOR);
        // And the plane still does not exist, so toggling stays an error.
        assert!(matches!(
            provider.toggle_visibility(),
            Err(ViewerError::Precondition(_))
        ));
    }

    #[test]
    fn test_toggle_before_acquisition_is_a_precondition_error() {
        let mut provider = BackgroundProvider::new([0.5, 0.5, 0.5]);
        assert!(matches!(
            provider.toggle_visibility(),
            Err(ViewerError::Precondition(_))
        ));
        assert_eq!(provider.mode(), BackgroundMode::SolidColor([0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_solid_color_hides_plane_but_keeps_stream() {
        let mut provider = BackgroundProvider::new([0.9, 0.9, 0.9]);
        let viewport = Viewport::new(1920, 1080);
        provider.activate_live_camera(Box::new(SyntheticCamera::new(64, 36)));
        wait_for_acquisition(&mut provider, &viewport).unwrap();
        provider.toggle_visibility().unwrap();

        provider.set_solid_color([1.0, 0.0, 0.0]);
        assert_eq!(provider.mode(), BackgroundMode::SolidColor([1.0, 0.0, 0.0]));
        assert!(provider.plane().is_some(), "stream stays allocated");
        assert!(!provider.plane().unwrap().visible());

        // Toggling visibility again must not silently reactivate camera mode.
        provider.toggle_visibility().unwrap();
        assert_eq!(provider.mode(), BackgroundMode::SolidColor([1.0, 0.0, 0.0]));
        assert!(!provider.plane_active());

        // Only an explicit activation brings the camera back, reusing the
        // held stream without a second acquisition.
        provider.activate_live_camera(Box::new(DeniedCamera));
        assert_eq!(provider.mode(), BackgroundMode::LiveCamera);
        assert!(!provider.acquisition_pending());
        assert!(provider.plane_active());
    }

    #[test]
    fn test_rescale_follows_viewport_changes() {
        let mut provider = BackgroundProvider::new([0.9, 0.9, 0.9]);
        let viewport = Viewport::new(1920, 1080);
        provider.activate_live_camera(Box::new(SyntheticCamera::new(64, 36)));
        wait_for_acquisition(&mut provider, &viewport).unwrap();

        provider.rescale(2560, 1080);
        let (sx, sy) = provider.plane().unwrap().scale();
        assert!((sx - (2560.0 / 1080.0) / REFERENCE_ASPECT).abs() < 1e-5);
        assert_eq!(sy, 1.0);
    }
}
