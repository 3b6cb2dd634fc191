//! Control panel: the thin UI glue between imgui widgets and stage handlers.
//!
//! The panel only collects [`ControlAction`]s; the app applies them on the
//! next tick. Errors surfaced by the stage come back as notices and stay on
//! screen until they scroll out.

use std::collections::VecDeque;
use std::path::PathBuf;

/// One user intent per control, delivered to the active stage.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlAction {
    /// Leave the landing stage for the interactive room.
    EnterRoom,
    /// Import a glTF file from disk.
    ImportModel(PathBuf),
    /// Switch the backdrop to a solid color.
    PickColor([f32; 3]),
    /// Request live-camera backdrop acquisition.
    ActivateCamera,
    /// Flip the camera feed's visibility.
    ToggleCameraFeed,
}

/// Stage facts the interactive panel displays.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStatus {
    pub model_count: usize,
    pub imports_pending: usize,
    pub camera_pending: bool,
    pub feed_ready: bool,
    pub feed_visible: bool,
}

const MAX_NOTICES: usize = 6;

pub struct ControlPanel {
    import_path: String,
    color: [f32; 3],
    notices: VecDeque<String>,
}

impl ControlPanel {
    pub fn new(initial_color: [f32; 3]) -> Self {
        Self {
            import_path: String::new(),
            color: initial_color,
            notices: VecDeque::new(),
        }
    }

    /// Queues a message for display; oldest messages scroll out first.
    pub fn notify(&mut self, text: impl Into<String>) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(text.into());
    }

    pub fn notices(&self) -> impl Iterator<Item = &str> {
        self.notices.iter().map(String::as_str)
    }

    pub fn draw_landing(&mut self, ui: &imgui::Ui, actions: &mut Vec<ControlAction>) {
        ui.window("Welcome")
            .size([300.0, 140.0], imgui::Condition::FirstUseEver)
            .position([40.0, 40.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text("A quiet room awaits.");
                if ui.button("Enter room") {
                    actions.push(ControlAction::EnterRoom);
                }
                self.draw_notices(ui);
            });
    }

    pub fn draw_interactive(
        &mut self,
        ui: &imgui::Ui,
        status: PanelStatus,
        actions: &mut Vec<ControlAction>,
    ) {
        ui.window("Room Controls")
            .size([340.0, 320.0], imgui::Condition::FirstUseEver)
            .position([40.0, 40.0], imgui::Condition::FirstUseEver)
            .build(|| {
                ui.text(format!("Models in room: {}", status.model_count));
                if status.imports_pending > 0 {
                    ui.text(format!("Importing: {}", status.imports_pending));
                }
                ui.separator();

                ui.input_text("glTF path", &mut self.import_path).build();
                if ui.button("Import model") && !self.import_path.trim().is_empty() {
                    actions.push(ControlAction::ImportModel(PathBuf::from(
                        self.import_path.trim(),
                    )));
                }
                ui.separator();

                if ui.color_edit3("Backdrop color", &mut self.color) {
                    actions.push(ControlAction::PickColor(self.color));
                }

                let camera_label = if status.camera_pending {
                    "Requesting camera..."
                } else if status.feed_ready {
                    "Camera backdrop"
                } else {
                    "Activate camera"
                };
                if ui.button(camera_label) {
                    actions.push(ControlAction::ActivateCamera);
                }
                ui.same_line();
                let feed_label = if status.feed_visible {
                    "Hide feed"
                } else {
                    "Show feed"
                };
                if ui.button(feed_label) {
                    actions.push(ControlAction::ToggleCameraFeed);
                }

                self.draw_notices(ui);
            });
    }

    fn draw_notices(&self, ui: &imgui::Ui) {
        if self.notices.is_empty() {
            return;
        }
        ui.separator();
        for notice in self.notices.iter() {
            ui.text_wrapped(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_queue_is_bounded() {
        let mut panel = ControlPanel::new([0.5; 3]);
        for i in 0..10 {
            panel.notify(format!("notice {i}"));
        }
        let notices: Vec<&str> = panel.notices().collect();
        assert_eq!(notices.len(), MAX_NOTICES);
        assert_eq!(notices.first(), Some(&"notice 4"));
        assert_eq!(notices.last(), Some(&"notice 9"));
    }
}
