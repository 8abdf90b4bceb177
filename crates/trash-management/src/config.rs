//! Service configuration.
//!
//! Layered with the `config` crate: the embedded `config/default.toml`, then an
//! optional user file, then `TRASH_MANAGEMENT_<KEY>` environment variables.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URI every endpoint is resolved against.
    pub proxy_uri: String,
    /// `baseStore` sent when no filter supplies one.
    pub default_store: String,
    /// Prepended to the four request topics.
    pub topic_prefix: String,
    /// Scope the request subscriptions are registered under.
    pub pub_sub_scope: String,
    /// Dispatcher mailbox capacity.
    pub dispatch_buffer: usize,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            proxy_uri: "http://localhost:8080/share/proxy/alfresco/".to_string(),
            default_store: "workspace://SpacesStore".to_string(),
            topic_prefix: String::new(),
            pub_sub_scope: String::new(),
            dispatch_buffer: 64,
            request_timeout_secs: 30,
        }
    }
}

impl ServiceConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            include_str!("../config/default.toml"),
            config::FileFormat::Toml,
        ));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(config::Environment::with_prefix("TRASH_MANAGEMENT"));

        Ok(builder.build()?.try_deserialize()?)
    }

    /// `pub_sub_scope`, or `None` when it is empty.
    pub fn scope(&self) -> Option<&str> {
        Some(self.pub_sub_scope.as_str()).filter(|s| !s.is_empty())
    }
}
