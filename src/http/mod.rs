//! # Módulo HTTP
//!
//! Codec HTTP/1.1 implementado sobre streams bloqueantes, sin librerías de
//! alto nivel. Incluye:
//!
//! - Parsing de requests (request line, headers, body, cookies, hostname)
//! - Escritura de responses con negociación de gzip
//! - Parsing de responses de un backend (lado cliente, usado por el proxy)
//! - Taxonomía de errores con su código HTTP
//!
//! ## Limitaciones
//!
//! - Una request por conexión (sin keep-alive)
//! - Sin chunked transfer encoding: el body se delimita solo con `content-length`
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Host: example.com\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```

pub mod encoding;  // Negociación de content-encoding
pub mod error;     // HttpError
pub mod reader;    // Lectura de líneas, headers y bodies
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Escritura de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Permite usar `http::Request` en vez de `http::request::Request`
pub use encoding::Encoding;
pub use error::HttpError;
pub use request::{Cookie, Request};
pub use response::Response;
pub use status::StatusCode;
