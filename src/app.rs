//! Application driver: window lifecycle, event routing, and the per-frame
//! tick order.
//!
//! Every mutation of scene state happens on this event loop. Worker threads
//! (model decoding, camera acquisition) only ever hand results back through
//! channels that the active stage drains at the start of a tick, so there is
//! no locking anywhere in the viewer.

use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes},
};

use crate::gfx::rendering::RenderEngine;
use crate::media::CameraAccess;
use crate::stage::{InteractiveStage, Stage, StageConfig};
use crate::ui::{ControlAction, ControlPanel, PanelStatus, UiManager};

pub struct AtriumApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    ui_manager: Option<UiManager>,
    stage: Stage,
    config: StageConfig,
    panel: ControlPanel,
    camera_source: Option<Box<dyn CameraAccess>>,
    // Actions collected during the UI pass, applied at the start of the
    // next tick.
    pending_actions: Vec<ControlAction>,
}

impl AtriumApp {
    /// Creates the application with default settings.
    pub async fn new() -> Self {
        Self::with_config(StageConfig::default())
    }

    pub fn with_config(config: StageConfig) -> Self {
        let _ = env_logger::try_init();
        let event_loop = EventLoop::new().expect("Failed to create event loop");
        let panel = ControlPanel::new(config.background_color);

        Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                window: None,
                render_engine: None,
                ui_manager: None,
                stage: Stage::landing(),
                panel,
                camera_source: None,
                pending_actions: Vec::new(),
                config,
            },
        }
    }

    /// Installs the camera used for the live backdrop. Without one, the
    /// activate-camera control reports that no source is configured.
    pub fn set_camera_source(&mut self, source: Box<dyn CameraAccess>) {
        self.app_state.camera_source = Some(source);
    }

    /// Runs the application, consuming self and starting the event loop.
    pub fn run(mut self) {
        let event_loop = self.event_loop.take().expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop
            .run_app(&mut self.app_state)
            .expect("Failed to run event loop");
    }
}

impl AppState {
    /// One-way landing-to-interactive transition. Setup failures keep the
    /// landing stage alive and surface a notice; the event loop runs on.
    fn enter_room(&mut self) {
        if self.stage.is_interactive() {
            return;
        }
        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };

        match InteractiveStage::new(engine, &self.config) {
            Ok(stage) => {
                // Replacing the stage drops the landing scene's resources.
                self.stage = Stage::Interactive(Box::new(stage));
                log::info!("entered the interactive room");
            }
            Err(err) => {
                log::error!("{err}");
                self.panel.notify(err.to_string());
            }
        }
    }

    fn redraw(&mut self) {
        // Apply control actions from the previous frame's UI pass before
        // anything else reads stage state this tick.
        let actions = std::mem::take(&mut self.pending_actions);
        for action in actions {
            match action {
                ControlAction::EnterRoom => self.enter_room(),
                other => {
                    if let Stage::Interactive(stage) = &mut self.stage {
                        stage.apply_action(other, &mut self.panel, &mut self.camera_source);
                    }
                }
            }
        }

        let Some(engine) = self.render_engine.as_mut() else {
            return;
        };
        let Some(ui_manager) = self.ui_manager.as_mut() else {
            return;
        };
        let Some(window) = self.window.clone() else {
            return;
        };
        let panel = &mut self.panel;
        let pending = &mut self.pending_actions;

        match &mut self.stage {
            Stage::Landing { registry } => {
                engine.render_frame(
                    registry,
                    Some(
                        |device: &wgpu::Device,
                         queue: &wgpu::Queue,
                         encoder: &mut wgpu::CommandEncoder,
                         view: &wgpu::TextureView| {
                            ui_manager.draw(device, queue, encoder, &window, view, |ui| {
                                panel.draw_landing(ui, pending);
                            });
                        },
                    ),
                );
            }
            Stage::Interactive(stage) => {
                stage.tick(engine, panel);

                let status = PanelStatus {
                    model_count: stage.registry.current_draggables().len(),
                    imports_pending: stage.imports.pending(),
                    camera_pending: stage.background.acquisition_pending(),
                    feed_ready: stage.background.plane().is_some(),
                    feed_visible: stage
                        .background
                        .plane()
                        .map(|plane| plane.visible())
                        .unwrap_or(false),
                };

                engine.render_frame(
                    &stage.registry,
                    Some(
                        |device: &wgpu::Device,
                         queue: &wgpu::Queue,
                         encoder: &mut wgpu::CommandEncoder,
                         view: &wgpu::TextureView| {
                            ui_manager.draw(device, queue, encoder, &window, view, |ui| {
                                panel.draw_interactive(ui, status, pending);
                            });
                        },
                    ),
                );
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let (width, height) = self.config.window_size;
        let attributes = WindowAttributes::default()
            .with_title(self.config.window_title.clone())
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));

        if let Ok(window) = event_loop.create_window(attributes) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            let window_clone = window_handle.clone();
            let mut renderer = pollster::block_on(async move {
                RenderEngine::new(window_clone, width, height).await
            });
            renderer.set_clear_color(self.config.landing_color);

            let ui_manager = UiManager::new(
                renderer.device(),
                renderer.queue(),
                renderer.surface_format(),
                &window_handle,
            );

            self.ui_manager = Some(ui_manager);
            self.render_engine = Some(renderer);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        if self.render_engine.is_none() {
            return;
        }
        let Some(window) = self.window.clone() else {
            return;
        };

        // The overlay gets first refusal on input.
        if let Some(ui_manager) = self.ui_manager.as_mut() {
            let ui_event: winit::event::Event<()> = winit::event::Event::WindowEvent {
                window_id,
                event: event.clone(),
            };
            if ui_manager.handle_input(&window, &ui_event) {
                window.request_redraw();
                return;
            }
        }

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: winit::keyboard::PhysicalKey::Code(key_code),
                        ..
                    },
                ..
            } => {
                if matches!(key_code, winit::keyboard::KeyCode::Escape) {
                    event_loop.exit();
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(engine) = self.render_engine.as_mut() {
                    match &mut self.stage {
                        Stage::Interactive(stage) => stage.handle_resize(engine, width, height),
                        Stage::Landing { .. } => engine.resize(width, height),
                    }
                }
            }
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                self.redraw();
            }
            other => {
                if let Stage::Interactive(stage) = &mut self.stage {
                    stage.handle_window_event(&other, &window);
                }
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}
