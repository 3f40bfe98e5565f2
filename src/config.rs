use std::path::Path;

use serde::Deserialize;

use crate::errors::{Error, Result};

/// The stack-config value that selects public-bucket mode instead of a
/// custom domain.
pub const STAGING_TARGET: &str = "staging";

/// Desired state for one deployment, with defaults applied at
/// construction. Loaded from a TOML file and/or CLI overrides; nothing in
/// the crate reads configuration from module scope.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Prefix for the stack name and for every logical resource id.
    pub project_name: String,
    /// Local directory holding the built site assets.
    pub path: String,
    pub index_document: String,
    pub error_document: String,
    /// `"staging"` provisions a public bucket website with no CDN.
    /// Anything else is treated as a custom domain and provisions the
    /// CDN-gated variant.
    pub target_domain: String,
    /// When set, certificate creation is skipped and this ARN is used on
    /// the distribution directly.
    pub certificate_arn: Option<String>,
    /// Also cover and alias `www.<target_domain>`.
    pub include_www: bool,
    /// Upload the contents of `path` into the content bucket after the
    /// stack deploys.
    pub sync_assets_to_bucket: bool,
    /// Defaults to the project name.
    pub stack_name: String,
    pub region: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            project_name: "static-web-cdn".to_string(),
            path: "./dist".to_string(),
            index_document: "index.html".to_string(),
            error_document: "error.html".to_string(),
            target_domain: STAGING_TARGET.to_string(),
            certificate_arn: None,
            include_www: false,
            sync_assets_to_bucket: false,
            stack_name: String::new(),
            region: "us-east-1".to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SiteConfig =
            toml::from_str(&contents).map_err(|source| Error::ParseConfig {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(config)
    }

    pub fn is_staging(&self) -> bool {
        self.target_domain == STAGING_TARGET
    }

    /// ACM certificates attached to CloudFront must live in us-east-1, so
    /// custom-domain stacks are pinned there. Checked up front, before
    /// anything is sent to the engine.
    pub fn validate(&self) -> Result<()> {
        if self.project_name.is_empty() {
            return Err(Error::InvalidConfig(
                "project_name must not be empty".to_string(),
            ));
        }
        if self.target_domain.is_empty() {
            return Err(Error::InvalidConfig(
                "target_domain must not be empty; use \"staging\" for a plain bucket website"
                    .to_string(),
            ));
        }
        if !self.is_staging() && self.region != "us-east-1" {
            return Err(Error::InvalidConfig(format!(
                "custom-domain deployments must use region us-east-1 (CloudFront certificates live there), got {}",
                self.region
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let config = SiteConfig::default();
        assert_eq!(config.path, "./dist");
        assert_eq!(config.index_document, "index.html");
        assert_eq!(config.error_document, "error.html");
        assert_eq!(config.target_domain, "staging");
        assert!(config.is_staging());
        assert!(config.certificate_arn.is_none());
        assert!(!config.include_www);
        assert!(!config.sync_assets_to_bucket);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_a_partial_toml_file() {
        let config: SiteConfig = toml::from_str(
            r#"
            target_domain = "example.com"
            include_www = true
            sync_assets_to_bucket = true
            "#,
        )
        .unwrap();
        assert_eq!(config.target_domain, "example.com");
        assert!(config.include_www);
        assert!(config.sync_assets_to_bucket);
        // untouched fields keep their defaults
        assert_eq!(config.index_document, "index.html");
        assert_eq!(config.project_name, "static-web-cdn");
    }

    #[test]
    fn rejects_unknown_keys() {
        let parsed: std::result::Result<SiteConfig, _> =
            toml::from_str("target_domian = \"typo.com\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn domain_mode_requires_us_east_1() {
        let config = SiteConfig {
            target_domain: "example.com".to_string(),
            region: "eu-west-1".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SiteConfig {
            target_domain: "example.com".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
