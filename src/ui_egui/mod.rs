mod app;
pub mod confirm;
pub mod event_form;
pub mod toast;
pub mod trash_panel;
pub mod week_grid;

pub use app::WeekGridApp;
