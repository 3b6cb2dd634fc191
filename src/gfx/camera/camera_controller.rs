//! Pointer-driven orbit control.
//!
//! Consumes window events (cursor, wheel, buttons, modifiers) and turns them
//! into orbit/zoom/pan on the camera. The `enabled` gate is flipped by the
//! interaction mediator: while a drag gesture owns the pointer, events are
//! still tracked (so button state stays coherent) but the camera is left
//! untouched.

use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    window::Window,
};

use super::orbit_camera::OrbitCamera;

pub struct CameraController {
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    enabled: bool,
    is_mouse_pressed: bool,
    is_shift_held: bool,
    last_cursor: Option<(f64, f64)>,
}

impl CameraController {
    pub fn new(rotate_speed: f32, zoom_speed: f32) -> Self {
        Self {
            rotate_speed,
            zoom_speed,
            pan_speed: 0.01,
            enabled: true,
            is_mouse_pressed: false,
            is_shift_held: false,
            last_cursor: None,
        }
    }

    /// Suspends or resumes orbit input. Disabling mid-gesture also forgets
    /// the last cursor position so re-enabling never produces a jump.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        if !enabled {
            self.last_cursor = None;
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn process_window_event(
        &mut self,
        event: &WindowEvent,
        window: &Window,
        camera: &mut OrbitCamera,
    ) {
        match event {
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state,
                ..
            } => {
                self.is_mouse_pressed = *state == ElementState::Pressed;
                if !self.is_mouse_pressed {
                    self.last_cursor = None;
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.is_shift_held = modifiers.state().shift_key();
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !self.enabled {
                    return;
                }
                let scroll_amount = -match delta {
                    MouseScrollDelta::LineDelta(_, scroll) => *scroll,
                    MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                        *scroll as f32
                    }
                };
                camera.add_distance(scroll_amount * self.zoom_speed);
                window.request_redraw();
            }
            WindowEvent::CursorMoved { position, .. } => {
                let current = (position.x, position.y);
                let delta = self
                    .last_cursor
                    .map(|last| (current.0 - last.0, current.1 - last.1));
                self.last_cursor = Some(current);

                let Some((dx, dy)) = delta else {
                    return;
                };
                if !self.enabled || !self.is_mouse_pressed {
                    return;
                }

                if self.is_shift_held {
                    camera.pan((-dx as f32 * self.pan_speed, dy as f32 * self.pan_speed));
                } else {
                    camera.add_yaw(-dx as f32 * self.rotate_speed);
                    camera.add_pitch(dy as f32 * self.rotate_speed);
                }
                window.request_redraw();
            }
            _ => (),
        }
    }
}
