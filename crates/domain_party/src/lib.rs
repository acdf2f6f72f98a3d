//! Party Management Domain
//!
//! This crate manages the people and organisations of the platform:
//! customers, users (organisation staff), and organisations themselves.
//! Each is an event-sourced aggregate; their shared person data lives in
//! the [`PersonDetails`] value object.
//!
//! # Aggregates
//!
//! - **Customer**: a person (or their household) buying cover; owns a
//!   primary person record and an optional owning user
//! - **User**: a staff member with a login email, activation state, and
//!   assigned roles
//! - **Organisation**: a tenant's distribution entity with a unique alias
//!   used in portal URLs
//!
//! # Examples
//!
//! ```rust,ignore
//! use domain_party::{Customer, PersonDetails};
//!
//! let details = PersonDetails::new("Ada Lovelace", "ada@example.com");
//! let mut customer = Customer::new_customer(
//!     tenant_id, organisation_id, environment, details, None,
//! )?;
//! customer.assign_owner(user_id, None)?;
//! ```

pub mod customer;
pub mod error;
pub mod organisation;
pub mod person;
pub mod user;

pub use customer::{Customer, CustomerEvent};
pub use error::PartyError;
pub use organisation::{Organisation, OrganisationEvent, OrganisationStatus};
pub use person::PersonDetails;
pub use user::{User, UserEvent, UserStatus};
