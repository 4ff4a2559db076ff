//! Services module - business logic behind the GUI shell.
//!
//! The services are framework-agnostic: no Slint, no dialogs, only the
//! report task collaborator interface and its placeholder implementation.
//! The GUI hands a [`ReportRequest`] to a task and consumes the resulting
//! worker events; nothing in here touches a widget.

pub mod report;

pub use report::{PlaceholderReport, ReportRequest};
