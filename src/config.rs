//! Configuration management for the inferd service.
//!
//! Configuration is assembled from multiple sources:
//! 1. Default configuration (embedded in the binary)
//! 2. System-wide configuration file (`/etc/inferd/config.toml`)
//! 3. User-specified configuration file (`--config`)
//! 4. Environment variables (prefixed with `INFERD_`, `__`-separated keys,
//!    e.g. `INFERD_SERVER__PORT=8080`)
//! 5. Command-line arguments
//!
//! Later sources override earlier ones.

use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Command-line arguments
#[derive(Debug, Default, Parser)]
#[clap(version, about)]
pub struct Args {
    /// Configuration file path
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Bind host
    #[clap(long)]
    pub host: Option<String>,

    /// Bind port
    #[clap(long)]
    pub port: Option<u16>,

    /// Content store kind (local or gateway)
    #[clap(long)]
    pub store: Option<String>,

    /// Root directory of the local content store
    #[clap(long)]
    pub store_root: Option<PathBuf>,

    /// Base URL of the content gateway
    #[clap(long)]
    pub gateway_url: Option<String>,

    /// Generation worker endpoint
    #[clap(long)]
    pub engine_endpoint: Option<String>,

    /// Model hashes to load at startup (repeatable)
    #[clap(long = "preload")]
    pub preload: Vec<String>,

    /// Log filter, e.g. "inferd_core=debug"
    #[clap(long)]
    pub log_filter: Option<String>,
}

/// Service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Network and serving settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// LRU capacity of the model cache.
    #[serde(default = "default_max_cached_models")]
    pub max_cached_models: usize,

    /// Hashes warmed at startup; failures are logged and non-fatal.
    #[serde(default)]
    pub preload_models: Vec<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Upper bound on a single generation call.
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_max_cached_models() -> usize {
    5
}
fn default_request_timeout_secs() -> u64 {
    300
}
fn default_generation_timeout_secs() -> u64 {
    600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_cached_models: default_max_cached_models(),
            preload_models: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
            generation_timeout_secs: default_generation_timeout_secs(),
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Allowed origins; `["*"]` allows all and forces credentials off.
    #[serde(default = "default_cors_origins")]
    pub allowed_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub allow_credentials: bool,

    /// Max age for preflight cache (in seconds)
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,

    /// Allow any request header instead of the fixed list.
    #[serde(default = "default_true")]
    pub permissive_headers: bool,
}

fn default_true() -> bool {
    true
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            allowed_origins: default_cors_origins(),
            allow_credentials: default_true(),
            max_age: default_cors_max_age(),
            permissive_headers: default_true(),
        }
    }
}

/// Content store selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "local" or "gateway".
    #[serde(default = "default_store_kind")]
    pub kind: String,

    /// Bundle root for the local store.
    #[serde(default = "default_store_root")]
    pub root: PathBuf,

    /// Gateway base URL, used when kind = "gateway".
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// Staging directory for gateway downloads.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,
}

fn default_store_kind() -> String {
    "local".to_string()
}
fn default_store_root() -> PathBuf {
    PathBuf::from("./models")
}
fn default_gateway_url() -> String {
    "http://127.0.0.1:8080/ipfs".to_string()
}
fn default_staging_dir() -> PathBuf {
    PathBuf::from("./staging")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: default_store_kind(),
            root: default_store_root(),
            gateway_url: default_gateway_url(),
            staging_dir: default_staging_dir(),
        }
    }
}

/// Generation worker settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_engine_endpoint")]
    pub endpoint: String,

    /// "auto", "cuda", or "cpu"; auto is resolved by the worker at bind time.
    #[serde(default = "default_device")]
    pub device: String,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_engine_endpoint() -> String {
    "http://127.0.0.1:8601".to_string()
}
fn default_device() -> String {
    "auto".to_string()
}
fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint: default_engine_endpoint(),
            device: default_device(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from all sources
    pub fn load(args: &Args) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name("/etc/inferd/config.toml").required(false));

        // Load user config if specified
        if let Some(path) = &args.config {
            builder = builder.add_source(config::File::from(path.as_path()));
        }

        // Add environment variables
        builder = builder.add_source(
            config::Environment::with_prefix("INFERD")
                .separator("__")
                .try_parsing(true),
        );

        // Build config
        let mut config: ServiceConfig = builder.build()?.try_deserialize()?;

        // Override with command line args
        if let Some(host) = &args.host {
            config.server.host = host.clone();
        }
        if let Some(port) = args.port {
            config.server.port = port;
        }
        if let Some(kind) = &args.store {
            config.store.kind = kind.clone();
        }
        if let Some(root) = &args.store_root {
            config.store.root = root.clone();
        }
        if let Some(url) = &args.gateway_url {
            config.store.gateway_url = url.clone();
        }
        if let Some(endpoint) = &args.engine_endpoint {
            config.engine.endpoint = endpoint.clone();
        }
        if !args.preload.is_empty() {
            config.server.preload_models = args.preload.clone();
        }

        Ok(config)
    }

    /// Socket address the server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address: {}", e))
    }
}
