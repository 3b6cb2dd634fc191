//! Stage lifecycle: the landing scene, the interactive room, and the one-way
//! transition between them.
//!
//! All formerly-global state lives on the stage structs and is threaded into
//! components explicitly, so the wiring between camera, registry, mediator,
//! background, and imports is visible in one place.

use std::sync::Arc;

use cgmath::Vector3;
use winit::{event::WindowEvent, window::Window};

use crate::error::{Result, ViewerError};
use crate::gfx::background::BackgroundProvider;
use crate::gfx::camera::{CameraController, CameraManager, OrbitCamera};
use crate::gfx::drag::{DragControls, DragEvent};
use crate::gfx::geometry::generate_plane;
use crate::gfx::rendering::RenderEngine;
use crate::gfx::resources::LightConfig;
use crate::gfx::scene::{Mesh, Object, SceneRegistry};
use crate::gfx::viewport::Viewport;
use crate::import::{GltfDecoder, ImportPipeline};
use crate::interaction::InteractionMediator;
use crate::media::CameraAccess;
use crate::ui::{ControlAction, ControlPanel};

/// Feature and appearance configuration for the interactive stage.
///
/// One configurable stage replaces a family of near-identical scene
/// variants: the camera backdrop and the post-processing chain are plain
/// switches here.
#[derive(Debug, Clone)]
pub struct StageConfig {
    pub window_title: String,
    pub window_size: (u32, u32),
    /// Backdrop color of the interactive room.
    pub background_color: [f32; 3],
    /// Backdrop color of the landing scene.
    pub landing_color: [f32; 3],
    pub webcam_background: bool,
    pub post_processing: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            window_title: "atrium".into(),
            window_size: (1200, 800),
            background_color: [0.867, 0.867, 0.867],
            landing_color: [0.10, 0.11, 0.13],
            webcam_background: true,
            post_processing: true,
        }
    }
}

/// The two stages of a session. The transition is one-way: once
/// interactive, there is no path back to the landing scene.
pub enum Stage {
    Landing { registry: SceneRegistry },
    Interactive(Box<InteractiveStage>),
}

impl Stage {
    pub fn landing() -> Self {
        Stage::Landing {
            registry: SceneRegistry::new(),
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Stage::Interactive(_))
    }
}

/// The interactive room: every coordination component plus the scene they
/// share.
pub struct InteractiveStage {
    pub viewport: Viewport,
    pub camera: CameraManager,
    pub registry: SceneRegistry,
    pub mediator: InteractionMediator,
    pub drag: DragControls,
    pub background: BackgroundProvider,
    pub imports: ImportPipeline,
    webcam_enabled: bool,
}

impl InteractiveStage {
    /// Builds the interactive stage in a fixed order: scene, camera,
    /// renderer state, lighting, interaction controls, background provider,
    /// import pipeline, post-processing. Later steps assume earlier ones
    /// succeeded, so the first failure aborts the whole transition as a
    /// [`ViewerError::Setup`].
    pub fn new(engine: &mut RenderEngine, config: &StageConfig) -> Result<Self> {
        // Scene: room fixtures only; models arrive through the import
        // pipeline.
        let registry = build_room().map_err(|reason| ViewerError::Setup {
            step: "scene",
            reason,
        })?;

        // Camera: eye level of the original room, orbiting the room center.
        let (width, height) = engine.get_surface_size();
        let viewport = Viewport::new(width, height);
        let mut orbit = OrbitCamera::new(
            3.1,
            0.2,
            0.0,
            Vector3::new(0.0, 1.0, 0.0),
            viewport.aspect(),
        );
        orbit.bounds.min_distance = Some(0.8);
        let camera = CameraManager::new(orbit, CameraController::new(0.005, 0.1));

        // Renderer state.
        engine.set_clear_color(config.background_color);

        // Lighting.
        engine.set_light(LightConfig::default());

        // Interaction controls.
        let mediator = InteractionMediator::new();
        let drag = DragControls::new();

        // Background provider.
        let background = BackgroundProvider::new(config.background_color);

        // Import pipeline.
        let imports = ImportPipeline::new(Arc::new(GltfDecoder));

        // Post-processing.
        engine.set_post_processing(config.post_processing);

        Ok(Self {
            viewport,
            camera,
            registry,
            mediator,
            drag,
            background,
            imports,
            webcam_enabled: config.webcam_background,
        })
    }

    /// Resize fan-out: viewport first, then camera projection, render
    /// surface (which also resizes post targets), and the backdrop plane.
    /// Unchanged dimensions short-circuit, making repeated events no-ops.
    pub fn handle_resize(&mut self, engine: &mut RenderEngine, width: u32, height: u32) {
        if !self.viewport.resize(width, height) {
            return;
        }
        let (width, height) = self.viewport.size();
        self.camera.camera.resize_projection(width, height);
        engine.resize(width, height);
        self.background.rescale(width, height);
    }

    /// Routes pointer input: drag controls get first refusal; the orbit
    /// controller runs gated on the mediator's flag.
    pub fn handle_window_event(&mut self, event: &WindowEvent, window: &Window) {
        let viewport = (self.viewport.width() as f32, self.viewport.height() as f32);
        if let Some(drag_event) =
            self.drag
                .process_window_event(event, viewport, &self.camera.camera, &mut self.registry)
        {
            match drag_event {
                DragEvent::Started(_) => self.mediator.drag_started(),
                DragEvent::Ended(_) => self.mediator.drag_ended(),
            }
            window.request_redraw();
        }

        self.camera
            .controller
            .set_enabled(self.mediator.orbit_enabled());
        self.camera.process_window_event(event, window);
    }

    /// Per-frame update, in tick order: drain import completions, poll the
    /// camera acquisition, then push camera/scene/backdrop state to the
    /// engine.
    pub fn tick(&mut self, engine: &mut RenderEngine, panel: &mut ControlPanel) {
        let drained = self.imports.drain_completed(&mut self.registry);
        for err in &drained.errors {
            panel.notify(err.to_string());
        }

        if let Some(outcome) = self.background.poll_acquisition(&self.viewport) {
            match outcome {
                Ok(()) => panel.notify("Camera ready - use Show feed to display it"),
                Err(err) => panel.notify(err.to_string()),
            }
        }

        engine.set_clear_color(self.background.clear_color());
        self.camera.camera.update_view_proj();
        engine.update(self.camera.camera.uniform);
        engine.prepare_scene(&mut self.registry);
        engine.prepare_backdrop(&mut self.background);
    }

    /// Applies one control-panel action. Errors become panel notices, never
    /// silent drops.
    pub fn apply_action(
        &mut self,
        action: ControlAction,
        panel: &mut ControlPanel,
        camera_source: &mut Option<Box<dyn CameraAccess>>,
    ) {
        match action {
            ControlAction::EnterRoom => {} // handled by the app before dispatch
            ControlAction::ImportModel(path) => {
                log::info!("importing {}", path.display());
                self.imports.import_file(path);
            }
            ControlAction::PickColor(color) => {
                self.background.set_solid_color(color);
            }
            ControlAction::ActivateCamera => {
                if !self.webcam_enabled {
                    panel.notify("Camera backdrop is disabled in this configuration");
                } else if self.background.resume_live_camera() {
                    // Held stream, no second acquisition needed.
                } else if self.background.acquisition_pending() {
                    panel.notify("Camera request is already in progress");
                } else {
                    match camera_source.take() {
                        Some(source) => {
                            self.background.activate_live_camera(source);
                            panel.notify("Requesting camera access...");
                        }
                        None => panel.notify("No camera source is configured"),
                    }
                }
            }
            ControlAction::ToggleCameraFeed => {
                if let Err(err) = self.background.toggle_visibility() {
                    panel.notify(err.to_string());
                }
            }
        }
    }
}

/// Room fixtures: a floor plane in the graph but outside the draggable set.
fn build_room() -> std::result::Result<SceneRegistry, String> {
    let mut registry = SceneRegistry::new();

    let plane = generate_plane(8.0, 8.0, 1, 1);
    if plane.triangle_count() == 0 {
        return Err("floor geometry is empty".into());
    }
    let mut floor = Object::new(
        "floor",
        vec![Mesh::new(plane.positions, plane.normals, plane.indices)],
    );
    floor.set_color([0.55, 0.55, 0.58, 1.0]);
    registry.insert(floor);

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_enables_both_features() {
        let config = StageConfig::default();
        assert!(config.webcam_background);
        assert!(config.post_processing);
        assert_eq!(config.window_size, (1200, 800));
    }

    #[test]
    fn test_landing_stage_starts_empty() {
        let stage = Stage::landing();
        assert!(!stage.is_interactive());
        match stage {
            Stage::Landing { registry } => assert!(registry.is_empty()),
            Stage::Interactive(_) => unreachable!(),
        }
    }

    #[test]
    fn test_room_floor_is_not_draggable() {
        let registry = build_room().expect("room always builds");
        assert_eq!(registry.len(), 1);
        assert!(registry.current_draggables().is_empty());
    }
}
