//! Common types and errors shared across `fieldcrypt` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
pub use protocol::SessionRow;
