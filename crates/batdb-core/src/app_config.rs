use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub catalog_path: PathBuf,
    pub lexicon_path: Option<PathBuf>,
    pub amazon_api_base_url: String,
    pub amazon_partner_tag: Option<String>,
    pub amazon_access_key: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub retail_request_timeout_secs: u64,
    pub retail_user_agent: String,
    pub retail_min_request_interval_ms: u64,
    pub retail_model_delay_ms: u64,
    pub retail_max_retries: u32,
    pub retail_retry_backoff_base_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("lexicon_path", &self.lexicon_path)
            .field("database_url", &"[redacted]")
            .field("amazon_api_base_url", &self.amazon_api_base_url)
            .field(
                "amazon_partner_tag",
                &self.amazon_partner_tag.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "amazon_access_key",
                &self.amazon_access_key.as_ref().map(|_| "[redacted]"),
            )
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "retail_request_timeout_secs",
                &self.retail_request_timeout_secs,
            )
            .field("retail_user_agent", &self.retail_user_agent)
            .field(
                "retail_min_request_interval_ms",
                &self.retail_min_request_interval_ms,
            )
            .field("retail_model_delay_ms", &self.retail_model_delay_ms)
            .field("retail_max_retries", &self.retail_max_retries)
            .field(
                "retail_retry_backoff_base_secs",
                &self.retail_retry_backoff_base_secs,
            )
            .finish()
    }
}
