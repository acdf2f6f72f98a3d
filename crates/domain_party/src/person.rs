//! Person details value object
//!
//! Shared by the customer and user aggregates: the contact data of one
//! natural person. Validation runs wherever details enter an aggregate, so
//! replayed events never re-validate.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::PartyError;

/// Contact details for one natural person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PersonDetails {
    /// Legal full name
    #[validate(length(min = 1, message = "full name is required"))]
    pub full_name: String,
    /// Name the person prefers to be addressed by
    pub preferred_name: Option<String>,
    /// Primary email address
    #[validate(email(message = "email address is invalid"))]
    pub email: String,
    /// Secondary email address
    #[validate(email(message = "alternative email address is invalid"))]
    pub alternative_email: Option<String>,
    /// Primary phone number
    pub phone_number: Option<String>,
    /// Secondary phone number
    pub alternative_phone_number: Option<String>,
}

impl PersonDetails {
    /// Creates details with just the required fields
    pub fn new(full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            preferred_name: None,
            email: email.into(),
            alternative_email: None,
            phone_number: None,
            alternative_phone_number: None,
        }
    }

    /// Sets the preferred name
    pub fn with_preferred_name(mut self, preferred_name: impl Into<String>) -> Self {
        self.preferred_name = Some(preferred_name.into());
        self
    }

    /// Sets the primary phone number
    pub fn with_phone_number(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self
    }

    /// The name to show in lists and payloads
    pub fn display_name(&self) -> &str {
        self.preferred_name.as_deref().unwrap_or(&self.full_name)
    }

    /// Validates the details, collecting every problem
    ///
    /// # Errors
    ///
    /// Returns `person.details.invalid` with one detail line per failed
    /// field.
    pub fn ensure_valid(&self) -> Result<(), PartyError> {
        self.validate().map_err(|errors| {
            let mut problems: Vec<String> = errors
                .field_errors()
                .into_iter()
                .flat_map(|(field, field_errors)| {
                    field_errors.iter().map(move |error| match &error.message {
                        Some(message) => format!("{field}: {message}"),
                        None => format!("{field}: {}", error.code),
                    })
                })
                .collect();
            problems.sort();
            PartyError::InvalidPersonDetails { problems }
        })
    }
}
