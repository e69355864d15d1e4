pub mod clock;
pub mod header_utils;
pub mod permissions;
pub mod session;
pub mod storage_trait;
pub mod token_introspection;
pub mod token_persistence;
pub mod token_refresh;
pub mod token_store;

#[cfg(test)]
pub(crate) mod test_support;

pub use clock::{Clock, FixedClock, SystemClock};
pub use permissions::CapabilitySet;
pub use session::{SessionContext, SessionStatus};
pub use storage_trait::KeyValueStore;
pub use token_introspection::{Claims, DecodeError, Roles};
pub use token_store::TokenStore;
