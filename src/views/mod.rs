pub mod search;
pub mod view_gate;

pub use search::{Debouncer, filter_projects, filter_users, remove_by_id, suggest_collaborators};
pub use view_gate::{ViewAction, ViewGate, Viewer, capabilities_for};
