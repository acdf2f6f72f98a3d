//! Structured domain errors
//!
//! Domain validation failures carry a stable dotted error code alongside a
//! human-readable title. API layers and automation consumers match on the
//! code, so codes are part of the platform's public contract and never change
//! once shipped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifiers::{CustomerId, OrganisationId, ProductId, TenantId, UserId};

/// A domain validation error with a stable code
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {title}")]
pub struct DomainError {
    /// Stable dotted error code, e.g. `tenant.with.id.not.found`
    pub code: String,
    /// Human-readable summary
    pub title: String,
    /// Optional free-form context lines
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_details: Vec<String>,
}

impl DomainError {
    pub fn new(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            title: title.into(),
            additional_details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.additional_details = details;
        self
    }

    pub fn tenant_not_found(tenant_id: TenantId) -> Self {
        Self::new(
            "tenant.with.id.not.found",
            format!("Tenant with id '{tenant_id}' was not found"),
        )
    }

    pub fn organisation_not_found(organisation_id: OrganisationId) -> Self {
        Self::new(
            "organisation.with.id.not.found",
            format!("Organisation with id '{organisation_id}' was not found"),
        )
    }

    pub fn organisation_alias_not_found(alias: &str) -> Self {
        Self::new(
            "organisation.with.alias.not.found",
            format!("Organisation with alias '{alias}' was not found"),
        )
    }

    pub fn product_not_found(product_id: ProductId) -> Self {
        Self::new(
            "product.with.id.not.found",
            format!("Product with id '{product_id}' was not found"),
        )
    }

    pub fn customer_not_found(customer_id: CustomerId) -> Self {
        Self::new(
            "customer.with.id.not.found",
            format!("Customer with id '{customer_id}' was not found"),
        )
    }

    pub fn user_not_found(user_id: UserId) -> Self {
        Self::new(
            "user.with.id.not.found",
            format!("User with id '{user_id}' was not found"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_well_known_codes() {
        let tenant_id = TenantId::from_uuid(Uuid::from_u128(7));
        let error = DomainError::tenant_not_found(tenant_id);
        assert_eq!(error.code, "tenant.with.id.not.found");
        assert!(error.title.contains("TEN-"));

        let error = DomainError::organisation_alias_not_found("acme");
        assert_eq!(error.code, "organisation.with.alias.not.found");
        assert!(error.title.contains("acme"));
    }

    #[test]
    fn test_details_are_skipped_when_empty() {
        let json = serde_json::to_value(DomainError::new("a.b", "title")).unwrap();
        assert!(json.get("additionalDetails").is_none());
        assert!(json.get("additional_details").is_none());
    }

    #[test]
    fn test_display_includes_code_and_title() {
        let error = DomainError::new("quote.already.discarded", "Quote already discarded");
        assert_eq!(
            error.to_string(),
            "quote.already.discarded: Quote already discarded"
        );
    }
}
