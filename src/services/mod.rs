//! Services
//!
//! The prediction pipeline and the collaborators it is built from.

pub mod pipeline;
pub mod record_store;
pub mod uploads;
