use clap::Parser;
use mongoview_core::services::StoreSettings;
use mongoview_store::schema::{DEFAULT_DATABASE, DEFAULT_MONGODB_URL};
use std::error::Error;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PING_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "mongoviewd", version, about = "Read-only MongoDB browser.")]
struct CliArgs {
    #[arg(long, env = "MONGODB_URL")]
    mongodb_url: Option<String>,

    #[arg(long, env = "DATABASE")]
    database: Option<String>,

    #[arg(long, env = "MONGOVIEW_HOST", default_value = DEFAULT_HOST)]
    host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(
        long,
        env = "MONGOVIEW_CONNECT_TIMEOUT_SECS",
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
    )]
    connect_timeout_secs: u64,

    #[arg(
        long,
        env = "MONGOVIEW_PING_TIMEOUT_SECS",
        default_value_t = DEFAULT_PING_TIMEOUT_SECS
    )]
    ping_timeout_secs: u64,

    #[arg(
        long,
        env = "MONGOVIEW_CONNECT_ATTEMPTS",
        default_value_t = DEFAULT_CONNECT_ATTEMPTS
    )]
    connect_attempts: u32,

    #[arg(
        long,
        env = "MONGOVIEW_REQUEST_TIMEOUT_SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    request_timeout_secs: u64,

    #[arg(long, env = "MONGOVIEW_LOG_LEVEL", default_value = DEFAULT_LOG_LEVEL)]
    log_level: String,
}

/// Runtime configuration loaded from CLI arguments and environment variables.
#[derive(Debug, Clone)]
pub struct MongoviewConfig {
    pub mongodb_url: String,
    pub database: String,
    pub listen_addr: SocketAddr,
    pub connect_timeout: Duration,
    pub ping_timeout: Duration,
    pub connect_attempts: u32,
    pub request_timeout: Duration,
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidSetting { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSetting { name, value } => {
                write!(f, "invalid {name} value: {value}")
            }
        }
    }
}

impl Error for ConfigError {}

impl MongoviewConfig {
    /// Parses CLI arguments, falling back to environment variables.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidSetting` for a zero timeout or zero connect attempts.
    pub fn from_args() -> Result<Self, ConfigError> {
        let args = CliArgs::parse();
        Self::try_from(args)
    }

    #[must_use]
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings::new(self.mongodb_url.clone(), self.database.clone())
            .with_connect_timeout(self.connect_timeout)
            .with_ping_timeout(self.ping_timeout)
            .with_attempts(self.connect_attempts)
    }
}

impl TryFrom<CliArgs> for MongoviewConfig {
    type Error = ConfigError;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let mongodb_url = non_blank(args.mongodb_url).unwrap_or_else(|| DEFAULT_MONGODB_URL.to_string());
        let database = non_blank(args.database).unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        let connect_timeout = positive_secs("MONGOVIEW_CONNECT_TIMEOUT_SECS", args.connect_timeout_secs)?;
        let ping_timeout = positive_secs("MONGOVIEW_PING_TIMEOUT_SECS", args.ping_timeout_secs)?;
        let request_timeout = positive_secs("MONGOVIEW_REQUEST_TIMEOUT_SECS", args.request_timeout_secs)?;

        if args.connect_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "MONGOVIEW_CONNECT_ATTEMPTS",
                value: args.connect_attempts.to_string(),
            });
        }

        Ok(Self {
            mongodb_url,
            database,
            listen_addr: SocketAddr::new(args.host, args.port),
            connect_timeout,
            ping_timeout,
            connect_attempts: args.connect_attempts,
            request_timeout,
            log_level: args.log_level,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn positive_secs(name: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidSetting {
            name,
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
