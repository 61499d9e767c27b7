//! The weekly time grid: pure layout math plus the pointer state machine.

pub mod controller;
pub mod drag;
pub mod form;
pub mod handles;
pub mod layout;
pub mod resize;
pub mod selection;

/// Pointer travel, in pixels, before a press turns into a drag.
pub const DRAG_THRESHOLD: f32 = 4.0;

pub use controller::{EmptyTrashReport, GestureOutcome, GestureState, GridController, RestoreConfirmation};
pub use layout::{EventPlacement, GridCell, GridMetrics, PlacementKind};
pub use selection::CreateRequest;
