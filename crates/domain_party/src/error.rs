//! Party domain errors
//!
//! This module defines all error types that can occur in the party domain.
//! Every variant carries a stable dotted error code that API layers surface
//! unchanged.

use thiserror::Error;

use core_kernel::DomainError;

/// Errors that can occur in the party domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartyError {
    /// Person details failed validation
    #[error("Person details are invalid")]
    InvalidPersonDetails { problems: Vec<String> },

    /// The customer already has this owner
    #[error("Owner already assigned")]
    OwnerAlreadyAssigned,

    /// The user is already activated
    #[error("User already activated")]
    UserAlreadyActivated,

    /// The user is already blocked
    #[error("User already blocked")]
    UserAlreadyBlocked,

    /// The user is not blocked
    #[error("User is not blocked")]
    UserNotBlocked,

    /// The user already holds this role
    #[error("Role {role} already assigned")]
    RoleAlreadyAssigned { role: String },

    /// The new login email matches the current one
    #[error("Login email unchanged")]
    LoginEmailUnchanged,

    /// The login email is not a valid email address
    #[error("Login email '{email}' is invalid")]
    LoginEmailInvalid { email: String },

    /// Organisation aliases are lowercase alphanumeric segments joined by hyphens
    #[error("Organisation alias '{alias}' is invalid")]
    AliasInvalid { alias: String },

    /// Organisation name must not be empty
    #[error("Organisation name is required")]
    NameRequired,

    /// The organisation is already active
    #[error("Organisation already active")]
    OrganisationAlreadyActive,

    /// The organisation is already disabled
    #[error("Organisation already disabled")]
    OrganisationAlreadyDisabled,
}

impl PartyError {
    /// Returns the stable error code for this variant
    pub fn code(&self) -> &'static str {
        match self {
            PartyError::InvalidPersonDetails { .. } => "person.details.invalid",
            PartyError::OwnerAlreadyAssigned => "customer.owner.already.assigned",
            PartyError::UserAlreadyActivated => "user.already.activated",
            PartyError::UserAlreadyBlocked => "user.already.blocked",
            PartyError::UserNotBlocked => "user.not.blocked",
            PartyError::RoleAlreadyAssigned { .. } => "user.role.already.assigned",
            PartyError::LoginEmailUnchanged => "user.login.email.unchanged",
            PartyError::LoginEmailInvalid { .. } => "user.login.email.invalid",
            PartyError::AliasInvalid { .. } => "organisation.alias.invalid",
            PartyError::NameRequired => "organisation.name.required",
            PartyError::OrganisationAlreadyActive => "organisation.already.active",
            PartyError::OrganisationAlreadyDisabled => "organisation.already.disabled",
        }
    }
}

impl From<PartyError> for DomainError {
    fn from(error: PartyError) -> Self {
        let domain_error = DomainError::new(error.code(), error.to_string());
        match error {
            PartyError::InvalidPersonDetails { problems } => domain_error.with_details(problems),
            _ => domain_error,
        }
    }
}
