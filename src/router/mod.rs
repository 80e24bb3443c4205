//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Routing en dos niveles:
//!
//! ```text
//! Request → HostRouter (hostname) → Router (método + regex) → Handler
//! ```
//!
//! El `Router` de cada virtual host recorre sus rutas en orden de registro.
//! La primera ruta cuyo método coincide y cuya regex encuentra un match en
//! la location gana; los grupos capturados se agregan como parámetros de la
//! request con los nombres declarados.
//!
//! Las tablas se arman completas antes de servir y luego se congelan en un
//! `Arc<HostRouter>` de solo lectura (ver `HostRouter::freeze`).

pub mod host;

pub use host::{HostRouter, WILDCARD_HOST};

use crate::http::Request;
use crate::services::Handler;
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Método HTTP de una ruta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    /// Cualquier método (`*` en la configuración)
    All,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
            Method::Options => "OPTIONS",
            Method::All => "*",
        }
    }

    /// true si la ruta acepta el método de la request
    pub fn accepts(&self, request_method: &str) -> bool {
        *self == Method::All || self.as_str() == request_method
    }
}

impl FromStr for Method {
    type Err = String;

    /// Parsea un método de la configuración (sin distinguir mayúsculas)
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::router::Method;
    ///
    /// assert_eq!("get".parse::<Method>(), Ok(Method::Get));
    /// assert_eq!("*".parse::<Method>(), Ok(Method::All));
    /// assert!("BREW".parse::<Method>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "HEAD" => Ok(Method::Head),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            "OPTIONS" => Ok(Method::Options),
            "*" | "ALL" => Ok(Method::All),
            other => Err(format!("Unknown HTTP method '{}'", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Una entrada de la tabla de rutas
struct Route {
    method: Method,
    pattern: Regex,
    /// Nombres de los grupos, en el orden de los grupos de la regex
    captures: Vec<String>,
    handler: Arc<dyn Handler>,
}

/// Tabla de rutas de un virtual host
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Crea un router vacío
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Registra una ruta al final de la tabla
    ///
    /// # Ejemplo
    /// ```
    /// use std::sync::Arc;
    /// use regex::Regex;
    /// use vhost_http::http::{HttpError, Request, Response};
    /// use vhost_http::router::{Method, Router};
    /// use vhost_http::services::Handler;
    ///
    /// let hello: Arc<dyn Handler> = Arc::new(|_: &mut Request, res: &mut Response| {
    ///     res.set_body("hi");
    ///     Ok::<(), HttpError>(())
    /// });
    ///
    /// let mut router = Router::new();
    /// router.add_route(Method::Get, Regex::new("^/hello$").unwrap(), Vec::new(), hello);
    /// ```
    pub fn add_route(
        &mut self,
        method: Method,
        pattern: Regex,
        captures: Vec<String>,
        handler: Arc<dyn Handler>,
    ) {
        self.routes.push(Route {
            method,
            pattern,
            captures,
            handler,
        });
    }

    /// Busca el handler para la request
    ///
    /// El match no está anclado: basta con que la regex encuentre una
    /// coincidencia dentro de la location (path + query), salvo que el
    /// patrón use `^`/`$`. Los grupos que no participaron del match se
    /// omiten; los capturados sobrescriben parámetros de la query con el
    /// mismo nombre.
    pub fn resolve(&self, request: &mut Request) -> Option<Arc<dyn Handler>> {
        for route in &self.routes {
            if !route.method.accepts(request.method()) {
                continue;
            }

            let captured: Vec<(String, String)> = match route.pattern.captures(request.location()) {
                Some(caps) => route
                    .captures
                    .iter()
                    .enumerate()
                    .filter_map(|(i, name)| {
                        caps.get(i + 1).map(|m| (name.clone(), m.as_str().to_string()))
                    })
                    .collect(),
                None => continue,
            };

            for (name, value) in captured {
                request.set_param(&name, &value);
            }

            return Some(Arc::clone(&route.handler));
        }

        None
    }

    /// Cantidad de rutas registradas
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.routes
                    .iter()
                    .map(|r| format!("{} {} {:?}", r.method, r.pattern.as_str(), r.captures)),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpError, Response};

    /// Handler que responde con una etiqueta fija
    fn tagged(tag: &'static str) -> Arc<dyn Handler> {
        Arc::new(move |_: &mut Request, res: &mut Response| -> Result<(), HttpError> {
            res.set_body(tag);
            Ok(())
        })
    }

    /// Ejecuta el handler resuelto y retorna su etiqueta
    fn served_tag(handler: Arc<dyn Handler>, request: &mut Request) -> String {
        let mut response = Response::new(Vec::new());
        handler.serve(request, &mut response).unwrap();
        String::from_utf8(response.body_bytes().unwrap().to_vec()).unwrap()
    }

    fn re(pattern: &str) -> Regex {
        Regex::new(pattern).unwrap()
    }

    fn request(raw: &str) -> Request {
        Request::parse(raw.as_bytes()).unwrap()
    }

    #[test]
    fn test_router_creation() {
        let router = Router::new();
        assert!(router.is_empty());
        assert_eq!(router.len(), 0);
    }

    #[test]
    fn test_route_found() {
        let mut router = Router::new();
        router.add_route(Method::Get, re("^/hello$"), vec![], tagged("hello"));

        let mut req = request("GET /hello HTTP/1.1\r\n\r\n");
        let handler = router.resolve(&mut req).unwrap();

        assert_eq!(served_tag(handler, &mut req), "hello");
    }

    #[test]
    fn test_route_not_found() {
        let mut router = Router::new();
        router.add_route(Method::Get, re("^/hello$"), vec![], tagged("hello"));

        let mut req = request("GET /nonexistent HTTP/1.1\r\n\r\n");
        assert!(router.resolve(&mut req).is_none());
    }

    #[test]
    fn test_method_filter() {
        let mut router = Router::new();
        router.add_route(Method::Post, re("^/items"), vec![], tagged("post"));

        let mut get = request("GET /items HTTP/1.1\r\n\r\n");
        assert!(router.resolve(&mut get).is_none());

        let mut post = request("POST /items HTTP/1.1\r\n\r\n");
        assert_eq!(served_tag(router.resolve(&mut post).unwrap(), &mut post), "post");
    }

    #[test]
    fn test_all_matches_any_method() {
        let mut router = Router::new();
        router.add_route(Method::All, re("/"), vec![], tagged("any"));

        for method in ["GET", "DELETE", "PROPFIND"] {
            let mut req = request(&format!("{} /x HTTP/1.1\r\n\r\n", method));
            assert!(router.resolve(&mut req).is_some());
        }
    }

    #[test]
    fn test_unanchored_match() {
        let mut router = Router::new();
        router.add_route(Method::Get, re("api"), vec![], tagged("api"));

        let mut req = request("GET /v2/api/users HTTP/1.1\r\n\r\n");
        assert!(router.resolve(&mut req).is_some());
    }

    #[test]
    fn test_first_registered_wins() {
        let mut router = Router::new();
        router.add_route(Method::Get, re("^/a"), vec![], tagged("first"));
        router.add_route(Method::Get, re("^/a/b"), vec![], tagged("second"));

        let mut req = request("GET /a/b HTTP/1.1\r\n\r\n");
        assert_eq!(served_tag(router.resolve(&mut req).unwrap(), &mut req), "first");
    }

    #[test]
    fn test_captures_populate_params() {
        let mut router = Router::new();
        router.add_route(
            Method::Get,
            re(r"^/users/(\w+)/posts/(\d+)"),
            vec!["user".into(), "post".into()],
            tagged("posts"),
        );

        let mut req = request("GET /users/ana/posts/42 HTTP/1.1\r\n\r\n");
        router.resolve(&mut req).unwrap();

        assert_eq!(req.param("user"), Some("ana"));
        assert_eq!(req.param("post"), Some("42"));
    }

    #[test]
    fn test_fewer_names_than_groups() {
        let mut router = Router::new();
        router.add_route(Method::Get, re(r"^/(\w+)/(\w+)"), vec!["first".into()], tagged("x"));

        let mut req = request("GET /one/two HTTP/1.1\r\n\r\n");
        router.resolve(&mut req).unwrap();

        assert_eq!(req.param("first"), Some("one"));
        assert_eq!(req.params().len(), 1);
    }

    #[test]
    fn test_unmatched_optional_group_skipped() {
        let mut router = Router::new();
        router.add_route(
            Method::Get,
            re(r"^/files(/(\w+))?$"),
            vec!["suffix".into(), "name".into()],
            tagged("files"),
        );

        let mut req = request("GET /files HTTP/1.1\r\n\r\n");
        router.resolve(&mut req).unwrap();

        assert_eq!(req.param("name"), None);
    }

    #[test]
    fn test_capture_overrides_query() {
        let mut router = Router::new();
        router.add_route(Method::Get, re(r"^/item/(\d+)"), vec!["id".into()], tagged("item"));

        let mut req = request("GET /item/7?id=99&sort=asc HTTP/1.1\r\n\r\n");
        router.resolve(&mut req).unwrap();

        assert_eq!(req.param("id"), Some("7"));
        assert_eq!(req.param("sort"), Some("asc"));
    }

    #[test]
    fn test_no_params_on_miss() {
        let mut router = Router::new();
        router.add_route(Method::Post, re(r"^/item/(\d+)"), vec!["id".into()], tagged("item"));

        let mut req = request("GET /item/7 HTTP/1.1\r\n\r\n");
        assert!(router.resolve(&mut req).is_none());
        assert_eq!(req.param("id"), None);
    }

    #[test]
    fn test_method_parse() {
        assert_eq!("POST".parse::<Method>(), Ok(Method::Post));
        assert_eq!("all".parse::<Method>(), Ok(Method::All));
        assert!("".parse::<Method>().is_err());
        assert!(Method::Post.accepts("POST"));
        assert!(!Method::Post.accepts("GET"));
    }
}
