//! Host collaborators consumed by the forwarder
//!
//! The forwarder never reaches for ambient globals. Everything it needs from
//! the host application (configuration flags, store scope, the inbound
//! request, cookies, module metadata and the log sink) is injected through
//! the traits in this module.
//!
//! The `Static*` types are plain in-memory implementations. The CLI builds
//! them from `config.toml` and command-line flags, and tests build them by hand.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// Configuration scope a flag is read at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeType {
    /// Global default value
    Default,
    /// Current website
    Website,
    /// Current store view
    Store,
}

/// Read-only access to boolean configuration flags
pub trait ConfigReader: Send + Sync {
    /// Returns true when the flag at `path` is set for `scope`
    fn is_set_flag(&self, path: &str, scope: ScopeType) -> bool;
}

/// Current store/site context
pub trait StoreContext: Send + Sync {
    /// Base web URL of the current store (may carry a trailing slash)
    fn base_web_url(&self) -> Result<String>;

    /// Code of the current store view
    fn store_code(&self) -> Result<String>;

    /// Code of the current website
    fn website_code(&self) -> Result<String>;
}

/// The inbound request that triggered the login
pub trait RequestContext: Send + Sync {
    /// Header value by name. Matching is case-insensitive.
    fn header(&self, name: &str) -> Option<String>;
}

/// Cookie jar of the inbound request
pub trait CookieReader: Send + Sync {
    fn cookie(&self, name: &str) -> Option<String>;
}

/// Installed module metadata
pub trait ModuleRegistry: Send + Sync {
    /// Installed version of `module`, or None when it is not registered
    fn version(&self, module: &str) -> Option<String>;
}

/// Store context with fixed values
#[derive(Debug, Clone, Default)]
pub struct StaticStore {
    pub base_url: Option<String>,
    pub store_code: Option<String>,
    pub website_code: Option<String>,
}

impl StaticStore {
    pub fn new(base_url: &str, store_code: &str, website_code: &str) -> Self {
        Self {
            base_url: Some(base_url.to_string()),
            store_code: Some(store_code.to_string()),
            website_code: Some(website_code.to_string()),
        }
    }
}

impl StoreContext for StaticStore {
    fn base_web_url(&self) -> Result<String> {
        self.base_url
            .clone()
            .ok_or_else(|| Error::Scope("store has no base web URL".to_string()))
    }

    fn store_code(&self) -> Result<String> {
        self.store_code
            .clone()
            .ok_or_else(|| Error::Scope("requested store is not found".to_string()))
    }

    fn website_code(&self) -> Result<String> {
        self.website_code
            .clone()
            .ok_or_else(|| Error::Scope("requested website is not found".to_string()))
    }
}

/// Request with a fixed set of headers
#[derive(Debug, Clone, Default)]
pub struct StaticRequest {
    // keys are lowercased
    headers: HashMap<String, String>,
}

impl StaticRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

impl RequestContext for StaticRequest {
    fn header(&self, name: &str) -> Option<String> {
        self.headers.get(&name.to_ascii_lowercase()).cloned()
    }
}

/// Cookie jar with fixed values
#[derive(Debug, Clone, Default)]
pub struct StaticCookies {
    cookies: HashMap<String, String>,
}

impl StaticCookies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookies.insert(name.to_string(), value.to_string());
        self
    }
}

impl CookieReader for StaticCookies {
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }
}

/// Module registry with fixed versions
#[derive(Debug, Clone, Default)]
pub struct StaticModules {
    versions: HashMap<String, String>,
}

impl StaticModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, name: &str, version: &str) -> Self {
        self.versions.insert(name.to_string(), version.to_string());
        self
    }
}

impl ModuleRegistry for StaticModules {
    fn version(&self, module: &str) -> Option<String> {
        self.versions.get(module).cloned()
    }
}
