//! Claims Management Domain
//!
//! This crate implements the claim lifecycle from lodgement through
//! assessment to settlement, as an event-sourced aggregate.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Notified -> Acknowledged -> UnderAssessment -> Approved/Declined -> Complete
//!         \___________________________________________/
//!                          -> Withdrawn
//! ```

pub mod claim;
pub mod error;
pub mod events;

pub use claim::{Claim, ClaimStatus};
pub use error::ClaimError;
pub use events::ClaimEvent;
