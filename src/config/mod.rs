//! # Configuración del Servidor
//! src/config/mod.rs
//!
//! Dos fuentes de configuración:
//!
//! - `Config`: parámetros del proceso, por CLI o variables de entorno
//! - `routes`: archivo JSON con los virtual hosts y sus rutas
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./vhost_http --port 8080 --workers 16 --routes ./routes.json
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 ROUTES_FILE=/etc/vhost/routes.json LOG_LEVEL=debug ./vhost_http
//! ```

pub mod routes;

pub use routes::{RouteConfig, RoutesFile, VirtualHostConfig};

use clap::Parser;
use std::path::PathBuf;
use thiserror::Error;

/// Errores de configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Valor inválido en la configuración del proceso
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Could not read routes file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not parse routes file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid route pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{0}")]
    Method(String),

    #[error("Unknown handler '{0}'")]
    UnknownHandler(String),

    #[error("Handler '{handler}' could not be created: {reason}")]
    Handler { handler: String, reason: String },
}

/// Configuración del proceso
#[derive(Debug, Clone, Parser)]
#[command(name = "vhost_http")]
#[command(about = "Servidor HTTP/1.1 con virtual hosts y reverse proxy")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Cantidad de workers del pool de conexiones
    #[arg(short, long, default_value = "16", env = "WORKERS")]
    pub workers: usize,

    /// Archivo JSON con virtual hosts y rutas
    #[arg(short, long, default_value = "./routes.json", env = "ROUTES_FILE")]
    pub routes: PathBuf,

    /// Nivel de log por defecto (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea la configuración parseando argumentos CLI y entorno
    pub fn new() -> Self {
        Config::parse()
    }

    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use vhost_http::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("Port must be >= 1".to_string()));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("Workers must be >= 1".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("Host must not be empty".to_string()));
        }
        if self.routes.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("Routes file path must not be empty".to_string()));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            workers: 16,
            routes: PathBuf::from("./routes.json"),
            log_level: "info".to_string(),
        }
    }
}
