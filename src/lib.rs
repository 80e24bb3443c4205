//! # vhost_http
//! src/lib.rs
//!
//! Framework HTTP/1.1 sobre threads del sistema operativo: acepta
//! conexiones TCP, parsea requests, las despacha por virtual host y patrón
//! a handlers intercambiables, e incluye un reverse proxy con balanceo
//! round robin.
//!
//! ## Arquitectura
//!
//! - `http`: codec de requests/responses, errores y codificación gzip
//! - `router`: routing en dos niveles (hostname → método + regex)
//! - `pool`: pool de workers con cola de prioridad
//! - `services`: contrato `Handler`, registro, proxy y archivos estáticos
//! - `server`: accept loop, manejo por conexión y páginas de error
//! - `config`: configuración CLI/entorno y archivo de rutas JSON
//! - `logging`: inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use vhost_http::config::{Config, RoutesFile};
//! use vhost_http::server::Server;
//! use vhost_http::services::HandlerRegistry;
//!
//! let config = Config::default();
//! let hosts = RoutesFile::load(&config.routes)?
//!     .build(&HandlerRegistry::with_defaults())?
//!     .freeze();
//!
//! let server = Server::new(config, hosts)?;
//! server.run()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod http;
pub mod logging;
pub mod pool;
pub mod router;
pub mod server;
pub mod services;
