//! Service configuration, read from environment variables

const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_AVATAR_BUCKET: &str = "avatars";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// HTTP port (env: HTTP_PORT)
    pub http_port: u16,
    /// PostgreSQL connection URL (env: DATABASE_URL)
    ///
    /// Members are kept in memory when unset.
    pub database_url: Option<String>,
    /// Size of the connection pool (env: DATABASE_MAX_CONNECTIONS)
    pub database_max_connections: u32,
    /// Supabase Storage credentials, photos are kept in memory when unset
    pub storage: Option<StorageConfig>,
    /// Bucket receiving member photos (env: SUPABASE_AVATAR_BUCKET)
    pub avatar_bucket: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Project URL (env: SUPABASE_URL)
    pub url: String,
    /// Service role key (env: SUPABASE_SERVICE_ROLE_KEY)
    pub service_role_key: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("{0} must be set together with {1}")]
    Incomplete(&'static str, &'static str),
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source
    ///
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let storage = match (var("SUPABASE_URL"), var("SUPABASE_SERVICE_ROLE_KEY")) {
            (Some(url), Some(service_role_key)) => Some(StorageConfig {
                url,
                service_role_key,
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::Incomplete(
                    "SUPABASE_URL",
                    "SUPABASE_SERVICE_ROLE_KEY",
                ))
            }
            (None, Some(_)) => {
                return Err(ConfigError::Incomplete(
                    "SUPABASE_SERVICE_ROLE_KEY",
                    "SUPABASE_URL",
                ))
            }
        };

        Ok(Self {
            http_port: parse_var(var("HTTP_PORT"), "HTTP_PORT")?.unwrap_or(DEFAULT_HTTP_PORT),
            database_url: var("DATABASE_URL"),
            database_max_connections: parse_var(
                var("DATABASE_MAX_CONNECTIONS"),
                "DATABASE_MAX_CONNECTIONS",
            )?
            .unwrap_or(DEFAULT_MAX_CONNECTIONS),
            storage,
            avatar_bucket: var("SUPABASE_AVATAR_BUCKET")
                .unwrap_or_else(|| DEFAULT_AVATAR_BUCKET.to_string()),
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    value: Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value })
        })
        .transpose()
}
