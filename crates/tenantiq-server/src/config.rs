//! Server configuration.

use clap::{Parser, ValueEnum};
use tenantiq_db::DbConfig;
use tenantiq_service::{QueueConfig, ServiceConfig};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

/// Tenantiq server configuration, from CLI arguments or environment.
#[derive(Debug, Parser)]
#[command(name = "tenantiq", about = "Tenant lifecycle service", long_about = None)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to
    #[arg(short = 'H', long, env = "TENANTIQ_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// HTTP port
    #[arg(short, long, env = "TENANTIQ_PORT", default_value = "8080")]
    pub port: u16,

    /// SurrealDB endpoint (ignored with --memory)
    #[arg(long, env = "TENANTIQ_DB_URL", default_value = "ws://127.0.0.1:8000")]
    pub db_url: String,

    #[arg(long, env = "TENANTIQ_DB_NAMESPACE", default_value = "tenantiq")]
    pub db_namespace: String,

    #[arg(long, env = "TENANTIQ_DB_DATABASE", default_value = "main")]
    pub db_database: String,

    #[arg(long, env = "TENANTIQ_DB_USER", default_value = "root")]
    pub db_user: String,

    #[arg(
        long,
        env = "TENANTIQ_DB_PASSWORD",
        default_value = "root",
        hide_env_values = true
    )]
    pub db_password: String,

    /// Run on the embedded in-memory engine instead of a remote database
    #[arg(long, env = "TENANTIQ_MEMORY")]
    pub memory: bool,

    #[arg(long, env = "TENANTIQ_LOG_FORMAT", value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Events buffered before publishers wait on the worker
    #[arg(long, env = "TENANTIQ_QUEUE_CAPACITY", default_value = "1024")]
    pub queue_capacity: usize,

    /// Upper bound on the page size of list requests
    #[arg(long, env = "TENANTIQ_MAX_LIST_LIMIT", default_value = "500")]
    pub max_list_limit: u64,

    /// Export spans over OTLP
    #[arg(long, env = "TENANTIQ_OTEL_ENABLED")]
    pub otel_enabled: bool,

    /// OTLP gRPC collector endpoint
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_endpoint: String,

    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "tenantiq")]
    pub otel_service_name: String,

    /// Fraction of root traces to sample, clamped to [0, 1]
    #[arg(long, env = "TENANTIQ_OTEL_SAMPLE_RATIO", default_value = "1.0")]
    pub otel_sample_ratio: f64,

    #[arg(long, env = "TENANTIQ_OTEL_TIMEOUT_SECS", default_value = "10")]
    pub otel_timeout_secs: u64,

    /// Seconds to wait for the event worker to drain on shutdown
    #[arg(long, env = "TENANTIQ_SHUTDOWN_TIMEOUT_SECS", default_value = "10")]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    /// Get the socket address for binding
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        let url = if self.memory {
            DbConfig::memory().url
        } else {
            self.db_url.clone()
        };
        DbConfig {
            url,
            namespace: self.db_namespace.clone(),
            database: self.db_database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            max_list_limit: self.max_list_limit,
        }
    }

    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            capacity: self.queue_capacity,
            ..QueueConfig::default()
        }
    }
}
