//! Resource domain model
//!
//! This module contains the resource entity, its lifecycle statuses, and
//! the guarded transitions between them.

mod entity;
mod status;

pub use entity::{Resource, TransitionError};
pub use status::{ReportedStatus, ResourceStatus};
