use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub inspector: InspectorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Reflection-engine knobs: preview bounds, page sizes, and the visibility
/// exclusions applied to models and serialized attributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectorConfig {
    /// Bounds relation previews and the default expansion page size.
    pub relation_limit: usize,
    /// Default page size for the record table view.
    pub records_per_page: usize,
    /// Model class names hidden from listing, schema, and record access.
    pub excluded_models: Vec<String>,
    /// Field names stripped from serialized instance attributes. Entries
    /// starting with `_` match as name suffixes.
    pub excluded_attributes: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4040,
        }
    }
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            relation_limit: 5,
            records_per_page: 25,
            excluded_models: Vec::new(),
            excluded_attributes: vec![
                "_id".to_string(),
                "created_at".to_string(),
                "updated_at".to_string(),
            ],
        }
    }
}

impl InspectorConfig {
    pub fn is_excluded_model(&self, name: &str) -> bool {
        self.excluded_models.iter().any(|m| m == name)
    }
}

impl AppConfig {
    /// Load configuration from defaults, an optional config file, and
    /// environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = config::Config::builder();

        // Add default configuration
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Add config file if it exists
        config = config.add_source(config::File::with_name("modelviz").required(false));

        // Add environment variables with prefix "MODELVIZ_"
        config = config.add_source(
            config::Environment::with_prefix("MODELVIZ")
                .separator("_")
                .prefix_separator("_"),
        );

        let config = config.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        Ok(app_config)
    }

    /// Get the server bind address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = InspectorConfig::default();
        assert_eq!(config.relation_limit, 5);
        assert_eq!(config.records_per_page, 25);
        assert!(config.excluded_models.is_empty());
        assert_eq!(
            config.excluded_attributes,
            vec!["_id", "created_at", "updated_at"]
        );
    }

    #[test]
    fn model_exclusion_is_exact_match() {
        let config = InspectorConfig {
            excluded_models: vec!["AuditLog".to_string()],
            ..InspectorConfig::default()
        };
        assert!(config.is_excluded_model("AuditLog"));
        assert!(!config.is_excluded_model("AuditLogEntry"));
    }
}
