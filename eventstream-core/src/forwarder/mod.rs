//! Webscale EventStream login forwarder
//!
//! On every successful customer login, one `login` event is POSTed to the
//! store's own clickstream collector at `<base_url>/.clickstream/events/batch`.
//!
//! ## Delivery contract
//!
//! - Gated by `webscale_eventstream/general/enabled` (website scope)
//! - One attempt, 1s connect / 5s total timeout, no retry, no queue
//! - Non-2xx responses are logged as warnings; errors are logged and dropped
//! - The login flow never sees an error from here
//!
//! ## Usage
//!
//! Enable the forwarder in `~/.config/eventstream/config.toml`:
//!
//! ```toml
//! [eventstream]
//! enabled = true
//! logging = true
//!
//! [store]
//! base_url = "https://shop.example.com/"
//! ```

mod event;
mod observer;
mod transport;

pub use event::{
    Customer, EventBatch, EventUser, LoginEventParts, LoginPayload, LoginSuccess, ScopeIds,
    StorefrontEvent, EVENT_LOGIN, PLATFORM, SDK_NAME,
};
pub use observer::{
    endpoint_for, Collaborators, LoginEventForwarder, Outcome, SyncLoginEventForwarder,
    APP_ID_HEADER, ENDPOINT_PATH, MODULE_NAME, NON_JSON_PLACEHOLDER,
};
pub use transport::{
    EventTransport, HttpTransport, OutboundRequest, TransportResponse, CONNECT_TIMEOUT,
    REQUEST_TIMEOUT,
};
