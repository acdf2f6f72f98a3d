//! User aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use core_kernel::{
    verify_contiguous, DeploymentEnvironment, DomainEvent, EventEnvelope, EventSourced,
    OrganisationId, PersonId, RehydrateError, TenantId, UserId,
};

use crate::error::PartyError;

/// User activation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserStatus {
    /// Invited, has not yet accepted
    Invited,
    /// Active and able to sign in
    Active,
    /// Blocked from signing in
    Blocked,
}

/// Domain events emitted by the User aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UserEvent {
    /// User has been invited
    Initialized {
        organisation_id: OrganisationId,
        environment: DeploymentEnvironment,
        person_id: PersonId,
        display_name: String,
        login_email: String,
    },

    /// Login email has changed
    LoginEmailChanged { login_email: String },

    /// The invitation has been accepted
    Activated,

    /// The user has been blocked from signing in
    Blocked,

    /// The block has been lifted
    Unblocked,

    /// The user has been granted a role
    RoleAssigned { role: String },
}

impl DomainEvent for UserEvent {
    fn event_type(&self) -> &'static str {
        match self {
            UserEvent::Initialized { .. } => "Initialized",
            UserEvent::LoginEmailChanged { .. } => "LoginEmailChanged",
            UserEvent::Activated => "Activated",
            UserEvent::Blocked => "Blocked",
            UserEvent::Unblocked => "Unblocked",
            UserEvent::RoleAssigned { .. } => "RoleAssigned",
        }
    }
}

/// A staff member of one organisation
///
/// Users are invited by email; signing in for the first time activates the
/// account. Blocking is reversible and does not touch role assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    tenant_id: TenantId,
    id: UserId,
    organisation_id: OrganisationId,
    environment: DeploymentEnvironment,
    person_id: PersonId,
    display_name: String,
    login_email: String,
    status: UserStatus,
    roles: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    sequence: u64,
    #[serde(skip)]
    unsaved: Vec<EventEnvelope<UserId, UserEvent>>,
}

impl User {
    /// Invites a user into an organisation
    ///
    /// # Errors
    ///
    /// Returns `user.login.email.invalid` when the email address does not
    /// parse.
    pub fn invite(
        tenant_id: TenantId,
        organisation_id: OrganisationId,
        environment: DeploymentEnvironment,
        display_name: impl Into<String>,
        login_email: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<Self, PartyError> {
        let login_email = login_email.into();
        if !login_email.validate_email() {
            return Err(PartyError::LoginEmailInvalid { email: login_email });
        }

        let display_name = display_name.into();
        let person_id = PersonId::new_v7();
        let mut user = Self::shell(
            tenant_id,
            UserId::new_v7(),
            organisation_id,
            environment,
            person_id,
            display_name.clone(),
            login_email.clone(),
        );
        user.record(
            UserEvent::Initialized {
                organisation_id,
                environment,
                person_id,
                display_name,
                login_email,
            },
            performed_by,
            Utc::now(),
        );
        Ok(user)
    }

    /// Rebuilds a user by folding its historical event stream
    pub fn rehydrate(
        events: Vec<EventEnvelope<UserId, UserEvent>>,
    ) -> Result<Self, RehydrateError> {
        verify_contiguous(Self::AGGREGATE_TYPE, &events)?;
        let first = &events[0];
        let UserEvent::Initialized {
            organisation_id,
            environment,
            person_id,
            display_name,
            login_email,
        } = &first.event
        else {
            return Err(RehydrateError::NotInitializingEvent {
                aggregate_type: Self::AGGREGATE_TYPE,
                expected: "Initialized",
                found: first.event.event_type().to_string(),
            });
        };

        let mut user = Self::shell(
            first.tenant_id,
            first.aggregate_id,
            *organisation_id,
            *environment,
            *person_id,
            display_name.clone(),
            login_email.clone(),
        );
        for envelope in &events {
            user.apply(envelope);
        }
        Ok(user)
    }

    pub fn organisation_id(&self) -> OrganisationId {
        self.organisation_id
    }

    pub fn environment(&self) -> DeploymentEnvironment {
        self.environment
    }

    pub fn person_id(&self) -> PersonId {
        self.person_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn login_email(&self) -> &str {
        &self.login_email
    }

    pub fn status(&self) -> UserStatus {
        self.status
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Changes the login email
    ///
    /// # Errors
    ///
    /// Returns `user.login.email.unchanged` when the new email matches the
    /// current one and `user.login.email.invalid` when it does not parse.
    pub fn change_login_email(
        &mut self,
        login_email: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), PartyError> {
        let login_email = login_email.into();
        if login_email == self.login_email {
            return Err(PartyError::LoginEmailUnchanged);
        }
        if !login_email.validate_email() {
            return Err(PartyError::LoginEmailInvalid { email: login_email });
        }
        self.record(
            UserEvent::LoginEmailChanged { login_email },
            performed_by,
            Utc::now(),
        );
        Ok(())
    }

    /// Activates an invited user
    ///
    /// # Errors
    ///
    /// Returns `user.already.activated` unless the user is still invited.
    pub fn activate(&mut self, performed_by: Option<UserId>) -> Result<(), PartyError> {
        if self.status != UserStatus::Invited {
            return Err(PartyError::UserAlreadyActivated);
        }
        self.record(UserEvent::Activated, performed_by, Utc::now());
        Ok(())
    }

    /// Blocks the user from signing in
    ///
    /// # Errors
    ///
    /// Returns `user.already.blocked` when already blocked.
    pub fn block(&mut self, performed_by: Option<UserId>) -> Result<(), PartyError> {
        if self.status == UserStatus::Blocked {
            return Err(PartyError::UserAlreadyBlocked);
        }
        self.record(UserEvent::Blocked, performed_by, Utc::now());
        Ok(())
    }

    /// Lifts a block
    ///
    /// # Errors
    ///
    /// Returns `user.not.blocked` unless the user is blocked.
    pub fn unblock(&mut self, performed_by: Option<UserId>) -> Result<(), PartyError> {
        if self.status != UserStatus::Blocked {
            return Err(PartyError::UserNotBlocked);
        }
        self.record(UserEvent::Unblocked, performed_by, Utc::now());
        Ok(())
    }

    /// Grants a role to the user
    ///
    /// # Errors
    ///
    /// Returns `user.role.already.assigned` when the user already holds the
    /// role.
    pub fn assign_role(
        &mut self,
        role: impl Into<String>,
        performed_by: Option<UserId>,
    ) -> Result<(), PartyError> {
        let role = role.into();
        if self.roles.contains(&role) {
            return Err(PartyError::RoleAlreadyAssigned { role });
        }
        self.record(UserEvent::RoleAssigned { role }, performed_by, Utc::now());
        Ok(())
    }

    fn record(&mut self, event: UserEvent, performed_by: Option<UserId>, timestamp: DateTime<Utc>) {
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
        id: UserId,
        organisation_id: OrganisationId,
        environment: DeploymentEnvironment,
        person_id: PersonId,
        display_name: String,
        login_email: String,
    ) -> Self {
        Self {
            tenant_id,
            id,
            organisation_id,
            environment,
            person_id,
            display_name,
            login_email,
            status: UserStatus::Invited,
            roles: Vec::new(),
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
            sequence: 0,
            unsaved: Vec::new(),
        }
    }
}

impl EventSourced for User {
    type Id = UserId;
    type Event = UserEvent;

    const AGGREGATE_TYPE: &'static str = "user";

    fn id(&self) -> UserId {
        self.id
    }

    fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    fn sequence(&self) -> u64 {
        self.sequence
    }

    fn apply(&mut self, envelope: &EventEnvelope<UserId, UserEvent>) {
        match &envelope.event {
            UserEvent::Initialized {
                organisation_id,
                environment,
                person_id,
                display_name,
                login_email,
            } => {
                self.organisation_id = *organisation_id;
                self.environment = *environment;
                self.person_id = *person_id;
                self.display_name = display_name.clone();
                self.login_email = login_email.clone();
                self.status = UserStatus::Invited;
                self.created_at = envelope.timestamp;
            }
            UserEvent::LoginEmailChanged { login_email } => {
                self.login_email = login_email.clone();
            }
            UserEvent::Activated => {
                self.status = UserStatus::Active;
            }
            UserEvent::Blocked => {
                self.status = UserStatus::Blocked;
            }
            UserEvent::Unblocked => {
                self.status = UserStatus::Active;
            }
            UserEvent::RoleAssigned { role } => {
                self.roles.push(role.clone());
            }
        }
        self.updated_at = envelope.timestamp;
        self.sequence = envelope.sequence + 1;
    }

    fn unsaved_events(&self) -> &[EventEnvelope<UserId, UserEvent>] {
        &self.unsaved
    }

    fn on_saved_changes(&mut self) {
        self.unsaved.clear();
    }
}
