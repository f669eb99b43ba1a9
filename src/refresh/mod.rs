pub mod controller;
pub mod scheduler;
pub mod settings;
pub mod state;

pub use controller::{ControllerStatus, DashboardView, ErrorReport, RefreshController};
pub use settings::DashboardSettings;
pub use state::{RefreshState, WaitMode};
