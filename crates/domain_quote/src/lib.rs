//! Quote Administration Domain
//!
//! This crate implements the quote lifecycle for the insurance platform,
//! following Domain-Driven Design (DDD) and event-sourcing principles.
//!
//! # Architecture
//!
//! The domain layer is infrastructure-agnostic, containing only business logic:
//! - **Aggregate**: Quote is the aggregate root; state is derived by folding
//!   its event stream
//! - **Domain Events**: QuoteEvent variants carry everything needed to replay
//! - **Errors**: structured codes consumable by API layers
//!
//! # Quote Lifecycle
//!
//! ```text
//! Incomplete -> Complete (via submit)
//!           \-> Discarded
//!           \-> Expired
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_quote::Quote;
//!
//! let mut quote = Quote::create_new_business(
//!     tenant_id, organisation_id, product_id, environment, "Q-00042", None,
//! );
//! quote.update_form_data(form_data, Some(user_id))?;
//! quote.submit(Some(user_id))?;
//! ```

pub mod error;
pub mod events;
pub mod quote;

pub use error::QuoteError;
pub use events::QuoteEvent;
pub use quote::{Quote, QuoteStatus, QuoteType};
