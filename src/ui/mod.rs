//! ImGui overlay: manager plus the viewer's control panel.

pub mod manager;
pub mod panel;

pub use manager::UiManager;
pub use panel::{ControlAction, ControlPanel, PanelStatus};
