pub mod route_guard;
pub mod router;

pub use route_guard::{GuardCheck, GuardDecision, GuardState, RouteGuard};
pub use router::{Route, RouteAccess, Router};
