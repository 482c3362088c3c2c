//! Data Models
//!
//! Configuration and HTTP request/response types.

pub mod response;
pub mod settings;

pub use response::*;
pub use settings::*;
