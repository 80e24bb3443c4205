//! # Archivo de Rutas
//! src/config/routes.rs
//!
//! Describe los virtual hosts y sus rutas. Cada ruta nombra un handler del
//! `HandlerRegistry` y le pasa parámetros arbitrarios.
//!
//! ## Formato
//!
//! ```json
//! {
//!   "vhosts": [
//!     {
//!       "hostname": "api.example.com",
//!       "routes": [
//!         {
//!           "methods": ["GET", "POST"],
//!           "pattern": "^/users/(\\w+)",
//!           "captures": ["user"],
//!           "handler": "proxy",
//!           "params": { "pool": "10.0.0.1:8081,10.0.0.2" }
//!         }
//!       ]
//!     },
//!     {
//!       "routes": [
//!         { "pattern": "/", "handler": "static", "params": { "path": "./public" } }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Valores por defecto: `hostname` = `*`, `methods` = `["*"]`,
//! `captures` = `[]`, `params` = `{}`.

use super::ConfigError;
use crate::router::{HostRouter, Method, WILDCARD_HOST};
use crate::services::HandlerRegistry;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Contenido completo del archivo de rutas
#[derive(Debug, Clone, Deserialize)]
pub struct RoutesFile {
    #[serde(default)]
    pub vhosts: Vec<VirtualHostConfig>,
}

/// Un virtual host con su tabla de rutas
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualHostConfig {
    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// Una ruta: métodos + patrón + handler
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,

    pub pattern: String,

    /// Nombres de los grupos de la regex, en orden
    #[serde(default)]
    pub captures: Vec<String>,

    /// Identificador en el registro (`proxy`, `static`, ...)
    pub handler: String,

    #[serde(default = "default_params")]
    pub params: Value,
}

fn default_hostname() -> String {
    WILDCARD_HOST.to_string()
}

fn default_methods() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_params() -> Value {
    Value::Object(serde_json::Map::new())
}

impl RoutesFile {
    /// Lee y parsea el archivo de rutas
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&text)
    }

    /// Parsea el contenido JSON del archivo de rutas
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Construye las tablas de routing
    ///
    /// Cada ruta crea una única instancia de handler, compartida por todos
    /// sus métodos. Un mismo hostname repetido agrega rutas al mismo router.
    ///
    /// # Errores
    ///
    /// * `ConfigError::Pattern` si una regex no compila
    /// * `ConfigError::Method` si un método no es válido
    /// * `ConfigError::UnknownHandler` si el identificador no está registrado
    /// * `ConfigError::Handler` si la factory rechaza los parámetros
    pub fn build(&self, registry: &HandlerRegistry) -> Result<HostRouter, ConfigError> {
        let mut hosts = HostRouter::new();

        for vhost in &self.vhosts {
            let router = hosts.router_mut(&vhost.hostname);

            for route in &vhost.routes {
                let pattern = Regex::new(&route.pattern).map_err(|source| ConfigError::Pattern {
                    pattern: route.pattern.clone(),
                    source,
                })?;

                let methods = route
                    .methods
                    .iter()
                    .map(|m| m.parse::<Method>().map_err(ConfigError::Method))
                    .collect::<Result<Vec<_>, _>>()?;

                let handler = registry
                    .build(&route.handler, &route.params)
                    .ok_or_else(|| ConfigError::UnknownHandler(route.handler.clone()))?
                    .map_err(|reason| ConfigError::Handler {
                        handler: route.handler.clone(),
                        reason,
                    })?;

                for method in methods {
                    router.add_route(method, pattern.clone(), route.captures.clone(), handler.clone());
                }

                tracing::debug!(
                    host = %vhost.hostname,
                    pattern = %route.pattern,
                    handler = %route.handler,
                    "ruta registrada"
                );
            }
        }

        if hosts.is_empty() {
            tracing::warn!("el archivo de rutas no define virtual hosts");
        }

        Ok(hosts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, Request, Response};
    use crate::services::Handler;
    use std::sync::Arc;

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::with_defaults();
        registry.register("echo", |params: &Value| {
            let reply = params.get("reply").and_then(Value::as_str).unwrap_or("").to_string();
            let handler: Arc<dyn Handler> = Arc::new(move |_: &mut Request, res: &mut Response| -> Result<(), HttpError> {
                res.set_body(reply.clone());
                Ok(())
            });
            Ok(handler)
        });
        registry
    }

    #[test]
    fn test_defaults_applied() {
        let file = RoutesFile::from_json(r#"{ "vhosts": [ { "routes": [ { "pattern": "/", "handler": "echo" } ] } ] }"#)
            .unwrap();

        let vhost = &file.vhosts[0];
        assert_eq!(vhost.hostname, "*");
        assert_eq!(vhost.routes[0].methods, ["*"]);
        assert!(vhost.routes[0].captures.is_empty());
        assert!(vhost.routes[0].params.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_build_host_router() {
        let file = RoutesFile::from_json(
            r#"{ "vhosts": [
                { "hostname": "api.example.com", "routes": [
                    { "methods": ["GET", "POST"], "pattern": "^/users/(\\w+)", "captures": ["user"],
                      "handler": "echo", "params": { "reply": "api" } } ] },
                { "hostname": "*", "routes": [
                    { "pattern": "/", "handler": "echo", "params": { "reply": "fallback" } } ] }
            ] }"#,
        )
        .unwrap();

        let hosts = file.build(&registry()).unwrap();
        assert_eq!(hosts.len(), 2);

        let api = hosts.resolve("api.example.com").unwrap();
        assert_eq!(api.len(), 2);

        let mut request = Request::parse(b"POST /users/ana HTTP/1.1\r\n\r\n").unwrap();
        let handler = api.resolve(&mut request).unwrap();
        let mut response = Response::new(Vec::new());
        handler.serve(&mut request, &mut response).unwrap();

        assert_eq!(request.param("user"), Some("ana"));
        assert_eq!(response.body_bytes(), Some(&b"api"[..]));
        assert!(hosts.resolve("other.example.com").is_some());
    }

    #[test]
    fn test_repeated_hostname_merges() {
        let file = RoutesFile::from_json(
            r#"{ "vhosts": [
                { "hostname": "a", "routes": [ { "pattern": "^/x", "handler": "echo" } ] },
                { "hostname": "a", "routes": [ { "pattern": "^/y", "handler": "echo" } ] }
            ] }"#,
        )
        .unwrap();

        let hosts = file.build(&registry()).unwrap();
        assert_eq!(hosts.resolve("a").unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_pattern() {
        let file = RoutesFile::from_json(r#"{ "vhosts": [ { "routes": [ { "pattern": "(", "handler": "echo" } ] } ] }"#)
            .unwrap();

        assert!(matches!(file.build(&registry()), Err(ConfigError::Pattern { .. })));
    }

    #[test]
    fn test_invalid_method() {
        let file = RoutesFile::from_json(
            r#"{ "vhosts": [ { "routes": [ { "methods": ["BREW"], "pattern": "/", "handler": "echo" } ] } ] }"#,
        )
        .unwrap();

        assert!(matches!(file.build(&registry()), Err(ConfigError::Method(_))));
    }

    #[test]
    fn test_unknown_handler() {
        let file = RoutesFile::from_json(r#"{ "vhosts": [ { "routes": [ { "pattern": "/", "handler": "cgi" } ] } ] }"#)
            .unwrap();

        match file.build(&registry()) {
            Err(ConfigError::UnknownHandler(id)) => assert_eq!(id, "cgi"),
            other => panic!("unexpected result: {:?}", other.map(|h| h.len())),
        }
    }

    #[test]
    fn test_handler_rejects_params() {
        let file = RoutesFile::from_json(
            r#"{ "vhosts": [ { "routes": [ { "pattern": "/", "handler": "proxy", "params": { "pool": "" } } ] } ] }"#,
        )
        .unwrap();

        let err = file.build(&registry()).unwrap_err();
        assert!(matches!(err, ConfigError::Handler { .. }));
        assert!(err.to_string().contains("No server pool specified"));
    }

    #[test]
    fn test_missing_required_fields() {
        assert!(matches!(
            RoutesFile::from_json(r#"{ "vhosts": [ { "routes": [ { "pattern": "/" } ] } ] }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.json");
        std::fs::write(&path, r#"{ "vhosts": [ { "routes": [ { "pattern": "/", "handler": "echo" } ] } ] }"#).unwrap();

        let file = RoutesFile::load(&path).unwrap();
        assert_eq!(file.vhosts.len(), 1);

        let missing = RoutesFile::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }
}
