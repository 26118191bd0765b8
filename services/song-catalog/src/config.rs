use std::net::SocketAddr;
use std::time;
use url::Url;

use crate::errors::CatalogError;

/// Constants for HTTP Config
pub const HTTP_TIMEOUT: u64 = 8000;
pub const HTTP_CONNECT_TIMEOUT: u64 = 2000;
pub const HTTP_POOL_MAX_IDLE: usize = 16;
pub const HTTP_POOL_IDLE_TIMEOUT: u64 = 90000;
pub const HTTP_MAX_REDIRECTS: u8 = 4;

pub const DEFAULT_DB_URL: &str = "sqlite:./data/songs.db";
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 8;
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PROVIDER_URL: &str = "http://localhost:8081/";

/// Source of raw configuration values, `std::env::var` in production
pub trait Lookup: Fn(&str) -> Option<String> {}
impl<F: Fn(&str) -> Option<String>> Lookup for F {}

fn non_empty(env: &impl Lookup, s: &str) -> Option<String> {
    env(s).filter(|v| !v.trim().is_empty())
}

fn env_to_uint(env: &impl Lookup, s: &str, default: u64) -> u64 {
    match non_empty(env, s) {
        Some(v) => v.trim().parse::<u64>().unwrap_or(default),
        None => default
    }
}

/// Ensures the url can be reached with a plain http client
fn ensure_http(url: &Url) -> Result<(), String> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("URL must be http or https: {url} (got {other})"))
    }
}

fn ensure_trailing_slash(url: &mut Url) {
    if !url.path().ends_with('/') {
        let mut path = url.path().to_string();
        path.push('/');
        url.set_path(&path);
    }
}

///
/// Configuration for the listening socket
///
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, CatalogError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| CatalogError::Config(format!("bad bind address: {e}")))
    }
}

fn build_server(env: &impl Lookup) -> Result<ServerConfig, CatalogError> {
    let host = non_empty(env, "HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = match non_empty(env, "PORT") {
        Some(p) => p.trim().parse::<u16>()
            .map_err(|_| CatalogError::Config(format!("PORT invalid: {p}")))?,
        None => DEFAULT_PORT
    };

    let server = ServerConfig { host, port };
    server.addr()?;
    Ok(server)
}

///
/// Configuration for the external song detail provider
///
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub base_url: Url    // http://localhost:8081/
}

fn build_provider(env: &impl Lookup) -> Result<ProviderConfig, CatalogError> {
    let base_url = non_empty(env, "PROVIDER_BASE_URL")
        .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string());

    let mut base_url = Url::parse(&base_url)
        .map_err(|e| CatalogError::Config(
            format!("PROVIDER_BASE_URL invalid {e}")
        ))?;

    ensure_http(&base_url).map_err(CatalogError::Config)?;
    ensure_trailing_slash(&mut base_url);

    Ok( ProviderConfig { base_url } )
}

///
/// Configuration for Http timeouts, pooling, etc.
///
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: time::Duration,
    pub connect_timeout: time::Duration,
    pub pool_max_idle_per_host: usize,
    pub pool_idle_timeout: time::Duration,
    pub max_redirects: u8
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: time::Duration::from_millis(HTTP_TIMEOUT),
            connect_timeout: time::Duration::from_millis(HTTP_CONNECT_TIMEOUT),
            pool_max_idle_per_host: HTTP_POOL_MAX_IDLE,
            pool_idle_timeout: time::Duration::from_millis(HTTP_POOL_IDLE_TIMEOUT),
            max_redirects: HTTP_MAX_REDIRECTS
        }
    }
}

fn build_http(env: &impl Lookup) -> HttpConfig {
    HttpConfig {
        timeout: time::Duration::from_millis(
            env_to_uint(env, "PROVIDER_TIMEOUT_MS", HTTP_TIMEOUT)),
        connect_timeout: time::Duration::from_millis(
            env_to_uint(env, "PROVIDER_CONNECT_TIMEOUT_MS", HTTP_CONNECT_TIMEOUT)),
        ..HttpConfig::default()
    }
}

///
/// Configuration for persistent storage in sqlite
///
#[derive(Debug, Clone)]
pub struct PersistenceConfig {
    pub db_url: String,
    pub max_connections: u32
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            db_url: DEFAULT_DB_URL.to_string(),
            max_connections: DEFAULT_DB_MAX_CONNECTIONS
        }
    }
}

fn build_persistence(env: &impl Lookup) -> PersistenceConfig {
    let db_url = non_empty(env, "DB_DSN").unwrap_or_else(|| DEFAULT_DB_URL.to_string());
    let max_connections = env_to_uint(
        env, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS as u64
    ).clamp(1, u32::MAX as u64) as u32;

    PersistenceConfig { db_url, max_connections }
}

///
/// Configuration for Logger
///

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<LogFormat> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json"   => Some(LogFormat::Json),
            _ => None
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter_directives: String,
    pub format: LogFormat,
    pub with_ansi: bool,
    pub include_file_line: bool,
    pub include_target: bool
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter_directives: "info,song_catalog=debug,sqlx=warn,reqwest=warn".to_string(),
            format: LogFormat::Json,
            with_ansi: true,
            include_file_line: true,
            include_target: true
        }
    }
}

fn build_logging(env: &impl Lookup) -> Result<LoggingConfig, CatalogError> {
    let mut logging = LoggingConfig::default();
    if let Some(raw) = non_empty(env, "LOG_FORMAT") {
        logging.format = LogFormat::parse(&raw)
            .ok_or_else(|| CatalogError::Config(format!("LOG_FORMAT invalid: {raw}")))?;
    }
    Ok(logging)
}

///
/// AppConfig which holds everything main needs to wire the service
///
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub http: HttpConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig
}

///
/// Return all environment variables to caller at program start.
///
pub fn load_config() -> Result<AppConfig, CatalogError> {
    dotenvy::dotenv().ok();
    load_config_from(|key: &str| std::env::var(key).ok())
}

pub fn load_config_from(env: impl Lookup) -> Result<AppConfig, CatalogError> {
    let server      = build_server(&env)?;
    let provider    = build_provider(&env)?;
    let http        = build_http(&env);
    let persistence = build_persistence(&env);
    let logging     = build_logging(&env)?;

    Ok( AppConfig { server, provider, http, persistence, logging } )
}
