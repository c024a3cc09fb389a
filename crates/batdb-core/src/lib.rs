use thiserror::Error;

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod lexicon;
pub mod price;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use catalog::{load_catalog, CatalogFile, CatalogModel};
pub use config::{load_app_config, load_app_config_from_env};
pub use lexicon::{load_lexicon, Lexicon};
pub use price::{percent_change, prices_equal, validate_price};
pub use types::{
    BatInfo, Certification, ListingAttribute, ModelIdentity, RawListing, SizeSpec,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read config file {path}: {source}")]
    FileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    FileParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
