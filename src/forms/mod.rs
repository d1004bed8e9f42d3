//! Form workflow - multi-step submissions and the access they unlock.
//!
//! A submission moves from pending, through any number of step writes, to
//! submitted. Submitting grants the feature named in the form's access entry.
//! All state lives in the store; [`FormManager`] keeps nothing between calls.

/// Workflow orchestration over the DAL
pub mod manager;
/// Feature id to UI route lookup
pub mod routes;

pub use manager::{FormInit, FormManager, FormSubmitted};
pub use routes::redirect_path;
