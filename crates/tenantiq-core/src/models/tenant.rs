//! Tenant domain model.
//!
//! A tenant is an organization/account managed through its lifecycle:
//! `creating → active ⇄ suspended → deleting → deleted`. The status is
//! never set directly; it only moves through
//! [`Tenant::apply_transition`] with a value computed by a
//! [`TransitionValidator`](crate::validator::TransitionValidator).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{UnknownEvent, UnknownStatus};

/// Opaque tenant identifier (32 lowercase hex characters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TenantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Lifecycle state of a tenant.
///
/// Stored and serialized as the snake_case name, never as an ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Creating,
    Active,
    Suspended,
    Deleting,
    Deleted,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::Creating,
        Status::Active,
        Status::Suspended,
        Status::Deleting,
        Status::Deleted,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Creating => "creating",
            Status::Active => "active",
            Status::Suspended => "suspended",
            Status::Deleting => "deleting",
            Status::Deleted => "deleted",
        }
    }

    /// `deleted` is the only terminal state.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Deleted)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A named trigger requesting a lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    ProvisionComplete,
    Suspend,
    Reactivate,
    Delete,
    DeletionComplete,
}

impl Event {
    pub const ALL: [Event; 5] = [
        Event::ProvisionComplete,
        Event::Suspend,
        Event::Reactivate,
        Event::Delete,
        Event::DeletionComplete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Event::ProvisionComplete => "provision_complete",
            Event::Suspend => "suspend",
            Event::Reactivate => "reactivate",
            Event::Delete => "delete",
            Event::DeletionComplete => "deletion_complete",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}

/// A tenant record.
///
/// Not `Deserialize`: a tenant only comes into being through
/// [`Tenant::new`] or, from storage, [`Tenant::restore`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tenant {
    pub id: TenantId,
    /// Display name, not unique.
    pub name: String,
    /// URL-safe identifier, globally unique.
    pub slug: String,
    status: Status,
    /// Subscription plan tag. Has no lifecycle effect.
    pub plan: String,
    /// Optimistic-concurrency revision, bumped by the repository on
    /// every successful update.
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Build a new tenant in the `creating` state.
    pub fn new(
        id: TenantId,
        name: impl Into<String>,
        slug: impl Into<String>,
        plan: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            status: Status::Creating,
            plan: plan.into(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuild a tenant from stored fields.
    ///
    /// Only storage adapters should call this; the stored status is
    /// trusted because it was written through [`Tenant::apply_transition`].
    #[allow(clippy::too_many_arguments)]
    pub fn restore(
        id: TenantId,
        name: String,
        slug: String,
        status: Status,
        plan: String,
        version: u64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            slug,
            status,
            plan,
            version,
            created_at,
            updated_at,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Move to `next` and refresh `updated_at`.
    ///
    /// `next` must come from a validator. `updated_at` never moves
    /// backwards even if the wall clock does.
    pub fn apply_transition(&mut self, next: Status) {
        self.status = next;
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_tenant_starts_creating() {
        let before = Utc::now();
        let tenant = Tenant::new(TenantId::new("id-1"), "Acme Corp", "acme-corp", "pro");
        let after = Utc::now();

        assert_eq!(tenant.id.as_str(), "id-1");
        assert_eq!(tenant.name, "Acme Corp");
        assert_eq!(tenant.slug, "acme-corp");
        assert_eq!(tenant.plan, "pro");
        assert_eq!(tenant.status(), Status::Creating);
        assert_eq!(tenant.version, 0);
        assert!(tenant.created_at >= before && tenant.created_at <= after);
        assert_eq!(tenant.updated_at, tenant.created_at);
    }

    #[test]
    fn apply_transition_keeps_identity() {
        let mut tenant = Tenant::new(TenantId::new("id-2"), "Acme", "acme", "free");
        let original = tenant.clone();

        tenant.apply_transition(Status::Active);

        assert_eq!(tenant.status(), Status::Active);
        assert!(tenant.updated_at >= original.updated_at);
        assert_eq!(tenant.id, original.id);
        assert_eq!(tenant.slug, original.slug);
        assert_eq!(tenant.created_at, original.created_at);
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
        assert!("archived".parse::<Status>().is_err());
        assert!("Active".parse::<Status>().is_err());
    }

    #[test]
    fn event_serializes_as_snake_case() {
        let json = serde_json::to_string(&Event::ProvisionComplete).unwrap();
        assert_eq!(json, "\"provision_complete\"");
        let parsed: Event = serde_json::from_str("\"deletion_complete\"").unwrap();
        assert_eq!(parsed, Event::DeletionComplete);
        assert!("pause".parse::<Event>().is_err());
    }

    #[test]
    fn only_deleted_is_terminal() {
        let terminal: Vec<_> = Status::ALL.into_iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(terminal, vec![Status::Deleted]);
    }
}
