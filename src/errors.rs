use std::path::PathBuf;

/// Everything that can go wrong before or during a deployment.
///
/// Local validation failures (`NoTld`, `InvalidConfig`, `InvalidStackName`,
/// `InvalidResource`) are raised before anything is sent to AWS. `Engine`
/// wraps a failure reported by CloudFormation or another AWS API; those are
/// propagated as-is since nothing at this layer can safely retry them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no top-level domain found on {0}")]
    NoTld(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid stack name {name}: {reason}")]
    InvalidStackName { name: String, reason: String },

    #[error("validation failed on resource '{name}': {reason}")]
    InvalidResource { name: String, reason: String },

    #[error("failed to read config file {path:?}: {source}")]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}: {source}")]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to serialize template: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to read asset directory {path:?}: {source}")]
    AssetWalk {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("provisioning failed: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, Error>;
