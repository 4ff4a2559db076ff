// UI module - GUI logic and event loop bridge
//
// - UiBridge: marshals work between the tokio runtime and the Slint event loop
// - GuiController: wires the window to state management and the worker

pub mod bridge;
pub mod controller;

pub use bridge::UiBridge;
pub use controller::GuiController;
