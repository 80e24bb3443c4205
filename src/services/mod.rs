//! # Servicios (Handlers)
//! src/services/mod.rs
//!
//! Un servicio es cualquier cosa que implemente `Handler::serve`: recibe la
//! request ya parseada y modifica la response que luego escribe el servidor.
//!
//! ## Servicios incluidos
//!
//! - `proxy`: reverse proxy con round robin sobre un pool de backends
//! - `static`: archivos estáticos a partir de un directorio raíz
//!
//! ## Registro
//!
//! El archivo de rutas nombra cada servicio con un identificador. El
//! `HandlerRegistry` traduce ese identificador a una factory tipada que
//! recibe los parámetros JSON de la ruta y construye la instancia.

pub mod proxy;
pub mod static_file;

pub use proxy::{Destination, ProxyConfigError, ProxyHandler};
pub use static_file::StaticFileHandler;

use crate::http::{HttpError, Request, Response};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Contrato de todo servicio enrutable
///
/// Los handlers se comparten entre workers, por eso deben ser `Send + Sync`.
/// El estado mutable compartido (por ejemplo el contador del proxy) tiene
/// que ser atómico.
pub trait Handler: Send + Sync {
    /// Atiende la request modificando la response
    ///
    /// No debe llamar a `Response::write`: el servidor lo hace al retornar.
    fn serve(&self, request: &mut Request, response: &mut Response) -> Result<(), HttpError>;
}

/// Cualquier closure con la firma correcta es un handler
///
/// # Ejemplo
/// ```
/// use std::sync::Arc;
/// use vhost_http::http::{HttpError, Request, Response};
/// use vhost_http::services::Handler;
///
/// let hello: Arc<dyn Handler> = Arc::new(|_: &mut Request, res: &mut Response| {
///     res.set_body("hi");
///     Ok::<(), HttpError>(())
/// });
/// ```
impl<F> Handler for F
where
    F: Fn(&mut Request, &mut Response) -> Result<(), HttpError> + Send + Sync,
{
    fn serve(&self, request: &mut Request, response: &mut Response) -> Result<(), HttpError> {
        self(request, response)
    }
}

/// Construye un handler a partir de los parámetros de una ruta
pub type HandlerFactory = Box<dyn Fn(&Value) -> Result<Arc<dyn Handler>, String> + Send + Sync>;

/// Mapa identificador → factory
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    /// Registro vacío
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registro con los servicios incluidos (`proxy` y `static`)
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("proxy", ProxyHandler::from_params);
        registry.register("static", StaticFileHandler::from_params);
        registry
    }

    /// Registra (o reemplaza) la factory de un identificador
    pub fn register<F>(&mut self, id: &str, factory: F)
    where
        F: Fn(&Value) -> Result<Arc<dyn Handler>, String> + Send + Sync + 'static,
    {
        self.factories.insert(id.to_string(), Box::new(factory));
    }

    /// true si el identificador tiene factory
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Construye un handler
    ///
    /// Retorna `None` si el identificador no está registrado, o el error de
    /// la factory si los parámetros son inválidos.
    pub fn build(&self, id: &str, params: &Value) -> Option<Result<Arc<dyn Handler>, String>> {
        self.factories.get(id).map(|factory| factory(params))
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Lee un parámetro string obligatorio de los parámetros de una ruta
pub(crate) fn required_str<'a>(params: &'a Value, key: &str) -> Result<&'a str, String> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing string parameter '{}'", key))
}

/// Escapa los caracteres especiales de HTML
pub(crate) fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_closure_handler() {
        let handler: Arc<dyn Handler> = Arc::new(|req: &mut Request, res: &mut Response| -> Result<(), HttpError> {
            res.set_body(req.path().to_string());
            Ok(())
        });

        let mut request = Request::parse(b"GET /echo?x=1 HTTP/1.1\r\n\r\n").unwrap();
        let mut response = Response::new(Vec::new());
        handler.serve(&mut request, &mut response).unwrap();

        assert_eq!(response.body_bytes(), Some(&b"/echo"[..]));
    }

    #[test]
    fn test_defaults_registered() {
        let registry = HandlerRegistry::with_defaults();

        assert!(registry.contains("proxy"));
        assert!(registry.contains("static"));
        assert!(!registry.contains("cgi"));
    }

    #[test]
    fn test_build_unknown() {
        let registry = HandlerRegistry::with_defaults();

        assert!(registry.build("cgi", &json!({})).is_none());
    }

    #[test]
    fn test_build_proxy() {
        let registry = HandlerRegistry::with_defaults();

        let ok = registry.build("proxy", &json!({ "pool": "10.0.0.1:8081" })).unwrap();
        assert!(ok.is_ok());

        let missing = registry.build("proxy", &json!({})).unwrap();
        assert!(missing.is_err());
    }

    #[test]
    fn test_register_custom() {
        let mut registry = HandlerRegistry::new();
        registry.register("hello", |_params: &Value| {
            let handler: Arc<dyn Handler> = Arc::new(|_: &mut Request, res: &mut Response| -> Result<(), HttpError> {
                res.set_body("hi");
                Ok(())
            });
            Ok(handler)
        });

        assert!(registry.build("hello", &Value::Null).unwrap().is_ok());
    }

    #[test]
    fn test_required_str() {
        let params = json!({ "path": "/srv", "n": 3 });

        assert_eq!(required_str(&params, "path").unwrap(), "/srv");
        assert!(required_str(&params, "n").is_err());
        assert!(required_str(&params, "none").is_err());
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<a href=\"x\">&</a>"), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
