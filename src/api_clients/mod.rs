pub mod error_handling;
pub mod indhive_client;

pub use indhive_client::{Elevation, IndhiveClient};
