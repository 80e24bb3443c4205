//! # Manejo de Errores por Conexión
//! src/server/error_handler.rs
//!
//! Traduce cualquier `HttpError` ocurrido al parsear, enrutar o atender una
//! request en una página de error HTML. Si los headers ya salieron al
//! socket no hay nada que corregir: solo se loguea y se cierra la salida.

use crate::http::{HttpError, Request, Response};
use crate::services::escape_html;

/// Genera la respuesta de error de una conexión
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorHandler;

impl ErrorHandler {
    pub fn new() -> Self {
        Self
    }

    /// Escribe la página de error (si todavía es posible) y cierra la salida
    pub fn handle(&self, error: &HttpError, request: &Request, response: &mut Response) {
        if response.headers_sent() {
            tracing::warn!(error = %error, "error después de enviar los headers");
            response.close();
            return;
        }

        response.reset();
        response.set_status(error.code());
        response.set_header("content-type", "text/html");
        response.set_body(error_page(error));

        if let Err(e) = response.write(request) {
            tracing::warn!(error = %e, "error durante el manejo del error");
        }

        response.close();
    }
}

/// Página HTML mínima con el código y el mensaje del error
pub fn error_page(error: &HttpError) -> String {
    format!(
        "<html><head><title>Error occurred</title></head><body><h1>Error {}</h1><p>{}</p></body></html>",
        error.code(),
        escape_html(&error.to_string())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn request() -> Request {
        Request::parse(b"GET /missing HTTP/1.1\r\nHost: example.com\r\n\r\n").unwrap()
    }

    #[test]
    fn test_error_page_contents() {
        let page = error_page(&HttpError::HostNotFound);

        assert!(page.contains("<h1>Error 404</h1>"));
        assert!(page.contains("<p>Host not found</p>"));
    }

    #[test]
    fn test_handle_writes_status_and_body() {
        let out = SharedBuffer::default();
        let mut response = Response::new(out.clone());

        ErrorHandler::new().handle(&HttpError::RouteNotFound, &request(), &mut response);

        let text = out.text();
        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("content-type: text/html\r\n"));
        assert!(text.contains("Page not found"));
    }

    #[test]
    fn test_handle_discards_partial_handler_state() {
        let out = SharedBuffer::default();
        let mut response = Response::new(out.clone());
        response.set_header("X-Partial", "yes");
        response.set_body("half done");

        ErrorHandler::new().handle(&HttpError::UpstreamUnreachable, &request(), &mut response);

        let text = out.text();
        assert!(text.starts_with("HTTP/1.1 500 Server Error\r\n"));
        assert!(!text.contains("x-partial"));
        assert!(!text.contains("half done"));
        assert!(text.contains("Error during proxy request processing"));
    }

    #[test]
    fn test_handle_generic_io_error() {
        let out = SharedBuffer::default();
        let mut response = Response::new(out.clone());
        let error = HttpError::from(io::Error::new(io::ErrorKind::Other, "disk on fire"));

        ErrorHandler::new().handle(&error, &request(), &mut response);

        let text = out.text();
        assert!(text.starts_with("HTTP/1.1 500 "));
        assert!(text.contains("Error : disk on fire"));
    }

    #[test]
    fn test_handle_after_headers_sent() {
        let out = SharedBuffer::default();
        let mut response = Response::new(out.clone());
        response.set_body("ok");
        let req = request();
        response.write(&req).unwrap();
        let before = out.text();

        ErrorHandler::new().handle(&HttpError::HeadersAlreadySent, &req, &mut response);

        assert_eq!(out.text(), before);
    }

    #[test]
    fn test_handle_escapes_message() {
        let out = SharedBuffer::default();
        let mut response = Response::new(out.clone());

        ErrorHandler::new().handle(&HttpError::status(400, "<script>"), &request(), &mut response);

        assert!(out.text().contains("&lt;script&gt;"));
    }
}
