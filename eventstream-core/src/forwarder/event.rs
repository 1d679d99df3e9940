//! Login event envelope
//!
//! The collector's `/.clickstream/events/batch` endpoint accepts a JSON array
//! of events. A login always produces exactly one:
//!
//! ```json
//! [{
//!   "platform": "magento",
//!   "sdk": "webscale/eventstream:1.0.0",
//!   "event_name": "login",
//!   "event_id": "0b6cfa1e-6c1f-4b8e-9a52-3f1e8b0d1c2a",
//!   "timestamp": "2024-05-01T10:00:00+00:00",
//!   "user": {
//!     "user_id": "42",
//!     "magento": { "store_id": "default", "website_id": "base" }
//!   },
//!   "payload": { "email": "jane@example.com", "wbs_uid": "abc123" }
//! }]
//! ```
//!
//! `event_id` and `timestamp` are taken at send time; nothing is persisted.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Platform identifier, also the key of the scope object under `user`
pub const PLATFORM: &str = "magento";

/// SDK name; the installed module version is appended after the colon
pub const SDK_NAME: &str = "webscale/eventstream";

/// Event name for login events
pub const EVENT_LOGIN: &str = "login";

/// The authenticated principal of a login
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    pub id: Option<u64>,
    pub email: Option<String>,
}

impl Customer {
    pub fn new(id: u64, email: &str) -> Self {
        Self {
            id: Some(id),
            email: Some(email.to_string()),
        }
    }
}

/// "Login succeeded" notification from the host application
#[derive(Debug, Clone, Default)]
pub struct LoginSuccess {
    pub customer: Option<Customer>,
}

impl LoginSuccess {
    pub fn for_customer(customer: Customer) -> Self {
        Self {
            customer: Some(customer),
        }
    }
}

/// Store and website scope the login happened in
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ScopeIds {
    pub store_id: String,
    pub website_id: String,
}

/// `user` object of the envelope
#[derive(Debug, Clone, Serialize)]
pub struct EventUser {
    pub user_id: String,
    #[serde(rename = "magento")]
    pub scope: ScopeIds,
}

/// Business payload of a login event
#[derive(Debug, Clone, Serialize)]
pub struct LoginPayload {
    pub email: String,

    /// Session cookie, keyed by its cookie name. `None` serializes as `null`.
    #[serde(flatten)]
    pub session: BTreeMap<String, Option<String>>,
}

/// A single storefront event as sent to the collector
#[derive(Debug, Clone, Serialize)]
pub struct StorefrontEvent {
    pub platform: &'static str,
    pub sdk: String,
    pub event_name: &'static str,
    pub event_id: String,
    pub timestamp: String,
    pub user: EventUser,
    pub payload: LoginPayload,
}

/// Inputs for a login event that come from the host
#[derive(Debug, Clone)]
pub struct LoginEventParts<'a> {
    pub customer: &'a Customer,
    pub module_version: Option<String>,
    pub scope: ScopeIds,
    pub cookie_name: &'a str,
    pub cookie_value: Option<String>,
}

impl StorefrontEvent {
    /// Build a login event with a fresh id and the current time
    pub fn login(parts: LoginEventParts<'_>) -> Self {
        Self::login_at(parts, Uuid::new_v4(), Utc::now())
    }

    fn login_at(parts: LoginEventParts<'_>, event_id: Uuid, now: DateTime<Utc>) -> Self {
        let customer = parts.customer;
        let mut session = BTreeMap::new();
        session.insert(parts.cookie_name.to_string(), parts.cookie_value);

        StorefrontEvent {
            platform: PLATFORM,
            sdk: sdk_string(parts.module_version.as_deref()),
            event_name: EVENT_LOGIN,
            event_id: event_id.to_string(),
            timestamp: format_timestamp(now),
            user: EventUser {
                user_id: customer.id.map(|id| id.to_string()).unwrap_or_default(),
                scope: parts.scope,
            },
            payload: LoginPayload {
                email: customer.email.clone().unwrap_or_default(),
                session,
            },
        }
    }
}

/// `webscale/eventstream:<version>`, with an empty version when unknown
fn sdk_string(version: Option<&str>) -> String {
    format!("{}:{}", SDK_NAME, version.unwrap_or_default())
}

/// ISO-8601 with a numeric UTC offset, e.g. `2024-05-01T10:00:00+00:00`
fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Events posted in one request
///
/// Serializes as a bare JSON array. Only single-event batches are built today.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct EventBatch(Vec<StorefrontEvent>);

impl EventBatch {
    pub fn single(event: StorefrontEvent) -> Self {
        Self(vec![event])
    }

    pub fn events(&self) -> &[StorefrontEvent] {
        &self.0
    }
}
