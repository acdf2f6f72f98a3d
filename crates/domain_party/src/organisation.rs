//! Organisation aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{
    verify_contiguous, DeploymentEnvironment, DomainEvent, EventEnvelope, EventSourced,
    OrganisationId, RehydrateError, TenantId, UserId,
};

use crate::error::PartyError;

/// Organisation lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OrganisationStatus {
    /// Trading; portals and forms are reachable
    Active,
    /// Switched off; alias remains reserved
    Disabled,
}

/// Domain events emitted by the Organisation aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OrganisationEvent {
    /// Organisation has been created
    Initialized {
        environment: DeploymentEnvironment,
        name: String,
        alias: String,
    },

    /// Display name has changed
    NameChanged { name: String },

    /// URL alias has changed
    AliasChanged { alias: String },

    /// A disabled organisation has been re-activated
    Activated,

    /// The organisation has been switched off
    Disabled,
}

impl DomainEvent for OrganisationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrganisationEvent::Initialized { .. } => "Initialized",
            OrganisationEvent::NameChanged { .. } => "NameChanged",
            OrganisationEvent::AliasChanged { .. } => "AliasChanged",
            OrganisationEvent::Activated => "Activated",
            OrganisationEvent::Disabled => "Disabled",
        }
    }
}

/// A distribution entity under one tenant
///
/// The alias keys portal and form URLs, so it is validated on every change:
/// lowercase alphanumeric segments joined by single hyphens. An organisation
/// is its own organisation context; its id carries the OrganisationEvent
/// relationship on emitted system events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organisation {
    tenant_id: TenantId,
    id: OrganisationId,
    environment: DeploymentEnvironment,
    name: String,
    alias: String,
    status: OrganisationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sequence: u64,
    #[serde(skip)]
    unsaved: Vec<EventEnvelope<OrganisationId, OrganisationEvent>>,
}

impl Organisation {
    /// Creates an active organisation
    ///
    /// # Errors
    ///
    /// Returns `organisation.name.required` for an empty name and
    /// `organisation.alias.invalid` for a malformed alias.
    pub fn create(
        tenant_id: TenantId,
        environment: DeploymentEnvironment,
        name: impl Into<String>,
        alias: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<Self, PartyError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PartyError::NameRequired);
        }
        let alias = alias.into();
        validate_alias(&alias)?;

        let mut organisation = Self::shell(
            tenant_id,
            OrganisationId::new_v7(),
            environment,
            name.clone(),
            alias.clone(),
        );
        organisation.record(
            OrganisationEvent::Initialized {
                environment,
                name,
                alias,
            },
            performed_by,
            Utc::now(),
        );
        Ok(organisation)
    }

    /// Rebuilds an organisation by folding its historical event stream
    pub fn rehydrate(
        events: Vec<EventEnvelope<OrganisationId, OrganisationEvent>>,
    ) -> Result<Self, RehydrateError> {
        verify_contiguous(Self::AGGREGATE_TYPE, &events)?;
        let first = &events[0];
        let OrganisationEvent::Initialized {
            environment,
            name,
            alias,
        } = &first.event
        else {
            return Err(RehydrateError::NotInitializingEvent {
                aggregate_type: Self::AGGREGATE_TYPE,
                expected: "Initialized",
                found: first.event.event_type().to_string(),
            });
        };

        let mut organisation = Self::shell(
            first.tenant_id,
            first.aggregate_id,
            *environment,
            name.clone(),
            alias.clone(),
        );
        for envelope in &events {
            organisation.apply(envelope);
        }
        Ok(organisation)
    }

    pub fn environment(&self) -> DeploymentEnvironment {
        self.environment
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn status(&self) -> OrganisationStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == OrganisationStatus::Active
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Renames the organisation
    ///
    /// # Errors
    ///
    /// Returns `organisation.name.required` for an empty name.
    pub fn rename(
        &mut self,
        name: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), PartyError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PartyError::NameRequired);
        }
        self.record(OrganisationEvent::NameChanged { name }, performed_by, Utc::now());
        Ok(())
    }

    /// Changes the URL alias
    ///
    /// # Errors
    ///
    /// Returns `organisation.alias.invalid` for a malformed alias.
    pub fn change_alias(
        &mut self,
        alias: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), PartyError> {
        let alias = alias.into();
        validate_alias(&alias)?;
        self.record(
            OrganisationEvent::AliasChanged { alias },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Re-activates a disabled organisation
    ///
    /// # Errors
    ///
    /// Returns `organisation.already.active` when already active.
    pub fn activate(&mut self, performed_by: Option<UserId>) -> Result<(), PartyError> {
        if self.status == OrganisationStatus::Active {
            return Err(PartyError::OrganisationAlreadyActive);
        }
        self.record(OrganisationEvent::Activated, performed_by, Utc::now());
        Ok(())
    }

    /// Switches the organisation off
    ///
    /// # Errors
    ///
    /// Returns `organisation.already.disabled` when already disabled.
    pub fn disable(&mut self, performed_by: Option<UserId>) -> Result<(), PartyError> {
        if self.status == OrganisationStatus::Disabled {
            return Err(PartyError::OrganisationAlreadyDisabled);
        }
        self.record(OrganisationEvent::Disabled, performed_by, Utc::now());
        Ok(())
    }

    fn record(
        &mut self,
        event: OrganisationEvent,
        performed_by: Option<UserId>,
        timestamp: DateTime<Utc>,
    ) {
        let envelope = EventEnvelope {
            tenant_id: self.tenant_id,
            aggregate_id: self.id,
            sequence: self.sequence,
            timestamp,
            performing_user_id: performed_by,
            event,
        };
        self.apply(&envelope);
        self.unsaved.push(envelope);
    }

    fn shell(
        tenant_id: TenantId,
        id: OrganisationId,
        environment: DeploymentEnvironment,
        name: String,
        alias: String,
    ) -> Self {
        Self {
            tenant_id,
            id,
            environment,
            name,
            alias,
            status: OrganisationStatus::Active,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            sequence: 0,
            unsaved: Vec::new(),
        }
    }
}

impl EventSourced for Organisation {
    type Id = OrganisationId;
    type Event = OrganisationEvent;

    const AGGREGATE_TYPE: &'static str = "organisation";

    fn id(&self) -> OrganisationId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn apply(&mut self, envelope: &EventEnvelope<OrganisationId, OrganisationEvent>) {
        match &envelope.event {
            OrganisationEvent::Initialized {
                environment,
                name,
                alias,
            } => {
                self.environment = *environment;
                self.name = name.clone();
                self.alias = alias.clone();
                self.status = OrganisationStatus::Active;
                self.created_at = envelope.timestamp;
            }
            OrganisationEvent::NameChanged { name } => {
                self.name = name.clone();
            }
            OrganisationEvent::AliasChanged { alias } => {
                self.alias = alias.clone();
            }
            OrganisationEvent::Activated => {
                self.status = OrganisationStatus::Active;
            }
            OrganisationEvent::Disabled => {
                self.status = OrganisationStatus::Disabled;
            }
        }
        self.updated_at = envelope.timestamp;
        self.sequence = envelope.sequence + 1;
    }

    fn unsaved_events(&self) -> &[EventEnvelope<OrganisationId, OrganisationEvent>] {
        &self.unsaved
    }

    fn on_saved_changes(&mut self) {
        self.unsaved.clear();
    }
}

/// Checks the alias shape: lowercase alphanumeric segments joined by single
/// hyphens, no leading or trailing hyphen
fn validate_alias(alias: &str) -> Result<(), PartyError> {
    let well_formed = !alias.is_empty()
        && !alias.starts_with('-')
        && !alias.ends_with('-')
        && !alias.contains("--")
        && alias
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        return Err(PartyError::AliasInvalid {
            alias: alias.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_organisation() -> Organisation {
        Organisation::create(
            TenantId::new(),
            DeploymentEnvironment::Development,
            "Harbour Mutual",
            "harbour-mutual",
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_creation_starts_active() {
        let organisation = create_test_organisation();
        assert!(organisation.is_active());
        assert_eq!(organisation.alias(), "harbour-mutual");
    }

    #[test]
    fn test_alias_validation() {
        for bad in ["", "Harbour", "harbour_mutual", "-harbour", "harbour-", "a--b", "über"] {
            let result = Organisation::create(
                TenantId::new(),
                DeploymentEnvironment::Development,
                "Harbour Mutual",
                bad,
                None,
            );
            assert_eq!(
                result.unwrap_err().code(),
                "organisation.alias.invalid",
                "alias {bad:?} should be rejected"
            );
        }

        for good in ["x", "harbour-mutual", "org2", "a-1-b"] {
            assert!(
                Organisation::create(
                    TenantId::new(),
                    DeploymentEnvironment::Development,
                    "Harbour Mutual",
                    good,
                    None,
                )
                .is_ok(),
                "alias {good:?} should be accepted"
            );
        }
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = Organisation::create(
            TenantId::new(),
            DeploymentEnvironment::Development,
            "   ",
            "harbour",
            None,
        );
        assert_eq!(result.unwrap_err(), PartyError::NameRequired);
    }

    #[test]
    fn test_disable_then_activate_round_trip() {
        let mut organisation = create_test_organisation();

        let already = organisation.activate(None);
        assert_eq!(already.unwrap_err(), PartyError::OrganisationAlreadyActive);

        organisation.disable(None).unwrap();
        assert!(!organisation.is_active());
        assert_eq!(
            organisation.disable(None).unwrap_err(),
            PartyError::OrganisationAlreadyDisabled
        );

        organisation.activate(None).unwrap();
        assert!(organisation.is_active());
    }

    #[test]
    fn test_rehydrate_reproduces_live_state() {
        let mut organisation = create_test_organisation();
        organisation.rename("Harbour Mutual Group", None).unwrap();
        organisation.change_alias("harbour-mutual-group", None).unwrap();
        organisation.disable(None).unwrap();

        let history = organisation.unsaved_events().to_vec();
        organisation.on_saved_changes();

        let rebuilt = Organisation::rehydrate(history).unwrap();
        assert_eq!(rebuilt, organisation);
    }
}
