//! Login observer that forwards one event per successful login
//!
//! Delivery is best-effort and at-most-once: a single POST with bounded
//! timeouts, no retry, no queue. Whatever happens, [`LoginEventForwarder::on_login_success`]
//! returns normally so the login flow is never failed by this component.

use std::sync::{Arc, OnceLock};

use serde_json::{json, Value};

use crate::config::{XML_PATH_ENABLED, XML_PATH_LOGGING};
use crate::context::{
    ConfigReader, CookieReader, ModuleRegistry, RequestContext, ScopeType, StoreContext,
};
use crate::error::Result;
use crate::logging::LogSink;

use super::event::{EventBatch, LoginEventParts, LoginSuccess, ScopeIds, StorefrontEvent};
use super::transport::{EventTransport, OutboundRequest};

/// Path appended to the store base URL
pub const ENDPOINT_PATH: &str = "/.clickstream/events/batch";

/// Module whose installed version goes into the `sdk` field
pub const MODULE_NAME: &str = "Webscale_EventStream";

/// Inbound header identifying the calling application, forwarded as-is
pub const APP_ID_HEADER: &str = "Webscale-App-Id";

/// Logged in place of a response body that is not JSON
pub const NON_JSON_PLACEHOLDER: &str = "[non-JSON response omitted]";

const LOG_PREFIX: &str = "[Webscale_EventStream]";

/// Everything the forwarder needs from the host application
#[derive(Clone)]
pub struct Collaborators {
    pub config: Arc<dyn ConfigReader>,
    pub store: Arc<dyn StoreContext>,
    pub request: Arc<dyn RequestContext>,
    pub cookies: Arc<dyn CookieReader>,
    pub modules: Arc<dyn ModuleRegistry>,
    pub logger: Arc<dyn LogSink>,
    pub transport: Arc<dyn EventTransport>,
}

/// What happened to a login event. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Forwarder is switched off
    Disabled,
    /// The notification carried no customer
    NoCustomer,
    /// Collector answered 2xx
    Delivered { status: u16 },
    /// Collector answered with any other status
    Rejected { status: u16 },
    /// An error stopped the send; it has been logged
    Failed,
}

/// Reads the developer logging flag at most once per invocation
struct DeveloperLogging<'a> {
    config: &'a dyn ConfigReader,
    value: OnceLock<bool>,
}

impl<'a> DeveloperLogging<'a> {
    fn new(config: &'a dyn ConfigReader) -> Self {
        Self {
            config,
            value: OnceLock::new(),
        }
    }

    fn enabled(&self) -> bool {
        *self.value.get_or_init(|| {
            self.config
                .is_set_flag(XML_PATH_LOGGING, ScopeType::Website)
        })
    }
}

/// Forwards login events to the store's clickstream collector
pub struct LoginEventForwarder {
    deps: Collaborators,
    cookie_name: String,
}

impl LoginEventForwarder {
    /// `cookie_name` is the cookie forwarded as the session identifier
    pub fn new(deps: Collaborators, cookie_name: impl Into<String>) -> Self {
        Self {
            deps,
            cookie_name: cookie_name.into(),
        }
    }

    /// Handle a login-success notification
    ///
    /// Never fails. Errors are logged and reported as [`Outcome::Failed`].
    pub async fn on_login_success(&self, event: &LoginSuccess) -> Outcome {
        let logging = DeveloperLogging::new(self.deps.config.as_ref());

        match self.forward(event, &logging).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.deps.logger.error(
                    &format!("{} Exception while sending login payload", LOG_PREFIX),
                    json!({
                        "message": e.to_string(),
                        "trace": e.trace(),
                    }),
                );
                Outcome::Failed
            }
        }
    }

    async fn forward(
        &self,
        event: &LoginSuccess,
        logging: &DeveloperLogging<'_>,
    ) -> Result<Outcome> {
        if !self.is_enabled() {
            return Ok(Outcome::Disabled);
        }

        let Some(customer) = event.customer.as_ref() else {
            if logging.enabled() {
                self.deps.logger.info(
                    &format!("{} No customer on customer_login event", LOG_PREFIX),
                    json!({}),
                );
            }
            return Ok(Outcome::NoCustomer);
        };

        let endpoint = self.endpoint()?;
        let app_id = self.deps.request.header(APP_ID_HEADER).unwrap_or_default();

        let batch = EventBatch::single(StorefrontEvent::login(LoginEventParts {
            customer,
            module_version: self.deps.modules.version(MODULE_NAME),
            scope: ScopeIds {
                store_id: self.deps.store.store_code()?,
                website_id: self.deps.store.website_code()?,
            },
            cookie_name: &self.cookie_name,
            cookie_value: self.deps.cookies.cookie(&self.cookie_name),
        }));

        // Serialize once so the logged payload is exactly what was sent
        let payload = serde_json::to_value(&batch)?;
        let body = serde_json::to_vec(&payload)?;

        let response = self
            .deps
            .transport
            .post(OutboundRequest {
                url: endpoint.clone(),
                headers: vec![
                    ("Content-Type", "application/json".to_string()),
                    (APP_ID_HEADER, app_id),
                ],
                body,
            })
            .await?;

        if response.is_success() {
            if logging.enabled() {
                self.deps.logger.info(
                    &format!("{} Login payload sent", LOG_PREFIX),
                    json!({
                        "endpoint": endpoint,
                        "payload": payload,
                        "response": response.body,
                    }),
                );
            }
            Ok(Outcome::Delivered {
                status: response.status,
            })
        } else {
            self.deps.logger.warning(
                &format!(
                    "{} HTTP {} while sending login payload",
                    LOG_PREFIX, response.status
                ),
                json!({
                    "endpoint": endpoint,
                    "payload": payload,
                    "response": loggable_body(&response.body),
                }),
            );
            Ok(Outcome::Rejected {
                status: response.status,
            })
        }
    }

    fn is_enabled(&self) -> bool {
        self.deps
            .config
            .is_set_flag(XML_PATH_ENABLED, ScopeType::Website)
    }

    /// Store base URL (trailing slashes stripped) plus [`ENDPOINT_PATH`]
    fn endpoint(&self) -> Result<String> {
        let base_url = self.deps.store.base_web_url()?;
        Ok(endpoint_for(&base_url))
    }
}

/// Collector endpoint for a store base URL
pub fn endpoint_for(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ENDPOINT_PATH)
}

/// Response body as it may appear in a warning: verbatim only when it looks like JSON
fn loggable_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        Value::String(body.to_string())
    } else {
        Value::String(NON_JSON_PLACEHOLDER.to_string())
    }
}

/// Synchronous wrapper for [`LoginEventForwarder`]
///
/// Owns a current-thread runtime, so it must not be called from inside
/// another tokio runtime.
pub struct SyncLoginEventForwarder {
    inner: LoginEventForwarder,
    runtime: tokio::runtime::Runtime,
}

impl SyncLoginEventForwarder {
    pub fn new(inner: LoginEventForwarder) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        Ok(Self { inner, runtime })
    }

    /// Handle a login-success notification (blocking)
    pub fn on_login_success(&self, event: &LoginSuccess) -> Outcome {
        self.runtime.block_on(self.inner.on_login_success(event))
    }
}
