//! # vhost_http - Entry Point
//! src/main.rs
//!
//! Lee la configuración (CLI + entorno), inicializa el logging, carga el
//! archivo de rutas y corre el accept loop. Cualquier error de arranque
//! termina el proceso con código 1.

use vhost_http::config::{Config, RoutesFile};
use vhost_http::logging;
use vhost_http::server::Server;
use vhost_http::services::HandlerRegistry;

fn main() {
    let config = Config::new();
    logging::init(&config.log_level);

    if let Err(e) = run(config) {
        tracing::error!(error = %e, "error fatal");
        std::process::exit(1);
    }
}

fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    tracing::info!(
        address = %config.address(),
        workers = config.workers,
        routes = %config.routes.display(),
        "configuración cargada"
    );

    let hosts = RoutesFile::load(&config.routes)?
        .build(&HandlerRegistry::with_defaults())?
        .freeze();

    tracing::info!(vhosts = hosts.len(), "tablas de routing listas");

    let server = Server::new(config, hosts)?;
    server.run()?;

    Ok(())
}
