use dotenv::dotenv;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::common::PLUGIN_STORAGE_ROOT;

/// User-facing plugin settings, kept in the camelCase shape the host
/// persists them in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginConfig {
    /// Endpoint of the server that handles image compression. Absence
    /// aborts any workflow before a network call is made.
    pub server_url: Option<String>,
    /// Identifier the host assigned this plugin; namespaces its sandboxed
    /// asset storage.
    pub plugin_id: String,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            plugin_id: "imgpress".to_string(),
        }
    }
}

impl PluginConfig {
    /// Load from the environment (`IMGPRESS_SERVER_URL`,
    /// `IMGPRESS_PLUGIN_ID`), falling back to defaults when unset or
    /// malformed.
    pub fn from_env() -> Self {
        dotenv().ok();
        match envy::prefixed("IMGPRESS_").from_env::<Self>() {
            Ok(config) => config,
            Err(err) => {
                warn!("Failed to read plugin config from environment: {err}");
                Self::default()
            }
        }
    }

    /// The configured compression endpoint, trimmed. `None` when blank.
    pub fn server_url(&self) -> Option<&str> {
        self.server_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// `assets/storages/<plugin-id>/` - the plugin's own storage prefix
    /// inside the graph's assets directory.
    pub fn plugin_assets_prefix(&self) -> String {
        format!("{}/{}/", PLUGIN_STORAGE_ROOT, self.plugin_id)
    }
}

/// Settings descriptor the host renders in its plugin options UI.
pub fn settings_schema() -> serde_json::Value {
    serde_json::json!([
        {
            "key": "serverUrl",
            "type": "string",
            "title": "Compression Server URL",
            "description": "URL of the server that handles image compression",
            "default": "",
        }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_url_is_trimmed_and_blank_is_none() {
        let mut config = PluginConfig::default();
        assert_eq!(config.server_url(), None);

        config.server_url = Some("   ".to_string());
        assert_eq!(config.server_url(), None);

        config.server_url = Some("  https://squash.example/api  ".to_string());
        assert_eq!(config.server_url(), Some("https://squash.example/api"));
    }

    #[test]
    fn assets_prefix_is_namespaced_by_plugin_id() {
        let config = PluginConfig {
            plugin_id: "plugin-x".to_string(),
            ..Default::default()
        };
        assert_eq!(config.plugin_assets_prefix(), "assets/storages/plugin-x/");
    }

    #[test]
    fn config_round_trips_through_camel_case_json() {
        let config = PluginConfig {
            server_url: Some("https://squash.example".to_string()),
            plugin_id: "imgpress".to_string(),
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("serverUrl").is_some());
        let back: PluginConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn schema_exposes_the_server_url_setting() {
        let schema = settings_schema();
        assert_eq!(schema[0]["key"], "serverUrl");
        assert_eq!(schema[0]["type"], "string");
    }
}
