//! The persisted system event record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DeploymentEnvironment, ProductId, SystemEventId, TenantId};

use crate::types::{Relationship, SystemEventType};

/// An externally visible, persisted notification derived from domain events
///
/// Created once by the persistence service and never mutated. Expired records
/// are removed by an external retention sweep; `expiry_timestamp` of `None`
/// means the record is retained indefinitely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemEvent {
    pub id: SystemEventId,
    pub tenant_id: TenantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub environment: DeploymentEnvironment,
    pub event_type: SystemEventType,
    pub created_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SystemEvent {
    pub fn never_expires(&self) -> bool {
        self.expiry_timestamp.is_none()
    }

    /// Whether the retention sweep would remove this record at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expiry_timestamp {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event_expiring_at(expiry: Option<DateTime<Utc>>) -> SystemEvent {
        SystemEvent {
            id: SystemEventId::new(),
            tenant_id: TenantId::new(),
            product_id: None,
            environment: DeploymentEnvironment::Development,
            event_type: SystemEventType::QuoteCreated,
            created_timestamp: Utc::now(),
            expiry_timestamp: expiry,
            payload: None,
            relationships: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_expiry_checks() {
        let now = Utc::now();

        let indefinite = event_expiring_at(None);
        assert!(indefinite.never_expires());
        assert!(!indefinite.is_expired(now + Duration::days(10_000)));

        let bounded = event_expiring_at(Some(now + Duration::hours(1)));
        assert!(!bounded.never_expires());
        assert!(!bounded.is_expired(now));
        assert!(bounded.is_expired(now + Duration::hours(1)));
        assert!(bounded.is_expired(now + Duration::hours(2)));
    }

    #[test]
    fn test_persisted_shape_is_camel_case() {
        let event = event_expiring_at(None);
        let json = serde_json::to_value(&event).unwrap();

        assert!(json["tenantId"].is_string());
        assert_eq!(json["eventType"], "quoteCreated");
        assert!(json["createdTimestamp"].is_string());
        // Absent optionals are omitted from the persisted shape
        assert!(json.get("expiryTimestamp").is_none());
        assert!(json.get("payload").is_none());
    }
}
