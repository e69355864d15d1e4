use crate::error::AppResult;
use std::fmt::Debug;

/// Persistent key-value backend for session data.
///
/// Writes and removals must be visible to the next `get_item` on any handle
/// sharing the backend; implementations do not buffer.
pub trait KeyValueStore: Send + Sync + Debug {
    fn set_item(&self, key: &str, value: &str) -> AppResult<()>;
    fn get_item(&self, key: &str) -> AppResult<Option<String>>;
    fn remove_item(&self, key: &str) -> AppResult<()>;
}
