//! # Virtual Hosts
//! src/router/host.rs
//!
//! Primer nivel de routing: el hostname de la request (header `Host` sin
//! puerto) elige el `Router` del virtual host. Si no hay entrada exacta se
//! usa la registrada bajo `*`.

use super::Router;
use std::collections::HashMap;
use std::sync::Arc;

/// Hostname comodín que atiende cualquier host no registrado
pub const WILDCARD_HOST: &str = "*";

/// Mapa hostname → Router
#[derive(Debug, Default)]
pub struct HostRouter {
    hosts: HashMap<String, Router>,
}

impl HostRouter {
    pub fn new() -> Self {
        Self {
            hosts: HashMap::new(),
        }
    }

    /// Registra el router de un virtual host, reemplazando el anterior
    ///
    /// Los hostnames se comparan sin distinguir mayúsculas.
    pub fn add_route(&mut self, hostname: &str, router: Router) {
        self.hosts.insert(hostname.to_ascii_lowercase(), router);
    }

    /// Router del virtual host, creándolo vacío si no existe
    pub fn router_mut(&mut self, hostname: &str) -> &mut Router {
        self.hosts.entry(hostname.to_ascii_lowercase()).or_default()
    }

    /// Resuelve el router: entrada exacta, luego `*`, luego ninguno
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::router::{HostRouter, Router};
    ///
    /// let mut hosts = HostRouter::new();
    /// hosts.add_route("*", Router::new());
    ///
    /// assert!(hosts.resolve("unknown.example").is_some());
    /// ```
    pub fn resolve(&self, hostname: &str) -> Option<&Router> {
        self.hosts
            .get(&hostname.to_ascii_lowercase())
            .or_else(|| self.hosts.get(WILDCARD_HOST))
    }

    /// Cantidad de virtual hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Cierra la fase de configuración
    ///
    /// A partir de acá las tablas solo se leen y se comparten entre workers
    /// sin locks.
    pub fn freeze(self) -> Arc<HostRouter> {
        Arc::new(self)
    }
}
