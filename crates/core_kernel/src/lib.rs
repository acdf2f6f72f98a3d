//! Core Kernel - Foundational types and utilities for the platform
//!
//! This crate provides the fundamental building blocks used across all domain modules:
//! - Strongly-typed identifiers and the deployment environment
//! - Money types with precise decimal arithmetic
//! - The event-sourcing kernel (envelopes, aggregate contract, event store port)
//! - Structured domain errors with stable error codes

pub mod environment;
pub mod error;
pub mod event;
pub mod identifiers;
pub mod money;

pub use environment::{DeploymentEnvironment, ParseEnvironmentError};
pub use error::DomainError;
pub use event::{
    verify_contiguous, DomainEvent, EventEnvelope, EventSourced, EventStore, EventStoreError,
    RehydrateError, StoredEvent,
};
pub use identifiers::{
    ClaimId, CustomerId, OrganisationId, PersonId, PolicyId, ProductId, QuoteId, SystemEventId,
    TenantId, UserId,
};
pub use money::{Currency, Money, MoneyError};
