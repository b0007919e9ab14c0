use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;

/// Profile name that switches every AWS client over to the local emulator.
pub const LOCAL_PROFILE: &str = "loc";

/// Default endpoint of the local emulator (localstack).
pub const DEFAULT_LOCALSTACK_URL: &str = "http://localhost:4566";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub aws: AwsConfig,
    pub storage: StorageConfig,
    pub queue: QueueConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Profile {
    Local,
    Production(String),
}

impl Profile {
    pub fn from_name(name: &str) -> Self {
        if name.trim() == LOCAL_PROFILE {
            Profile::Local
        } else {
            Profile::Production(name.trim().to_string())
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Profile::Local)
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Profile::Local => write!(f, "{}", LOCAL_PROFILE),
            Profile::Production(name) => write!(f, "{}", name),
        }
    }
}

#[derive(Clone)]
pub struct AwsConfig {
    pub profile: Profile,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub localstack_url: String,
}

impl AwsConfig {
    /// Endpoint override for the active profile. Production talks to the
    /// regional endpoint, so there is nothing to override.
    pub fn endpoint_override(&self) -> Option<&str> {
        match self.profile {
            Profile::Local => Some(self.localstack_url.as_str()),
            Profile::Production(_) => None,
        }
    }
}

// Keeps the secret key out of the startup log line.
impl std::fmt::Debug for AwsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsConfig")
            .field("profile", &self.profile)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &"***")
            .field("localstack_url", &self.localstack_url)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    /// Key prefix every upload lands under.
    pub location: String,
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub default_destination: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", key))
        };

        Ok(Self {
            server: ServerConfig {
                port: var_or("PORT", "8080")
                    .parse()
                    .context("PORT must be a valid port number")?,
                host: var_or("HOST", "0.0.0.0"),
                max_upload_bytes: var_or("MAX_UPLOAD_SIZE", "10485760")
                    .parse()
                    .context("MAX_UPLOAD_SIZE must be a byte count")?,
            },
            aws: AwsConfig {
                profile: Profile::from_name(&var_or("APP_PROFILE", "unknown")),
                region: var_or("AWS_REGION", "us-east-1"),
                access_key: required("AWS_ACCESS_KEY_ID")?,
                secret_key: required("AWS_SECRET_ACCESS_KEY")?,
                localstack_url: var_or("LOCALSTACK_URL", DEFAULT_LOCALSTACK_URL),
            },
            storage: StorageConfig {
                bucket: required("S3_BUCKET")?,
                location: var_or("S3_STORAGE_LOCATION", "uploads"),
                temp_dir: lookup("UPLOAD_TEMP_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(env::temp_dir),
            },
            queue: QueueConfig {
                default_destination: lookup("SQS_QUEUE").filter(|q| !q.trim().is_empty()),
            },
        })
    }
}
