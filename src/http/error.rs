//! # Errores de Protocolo
//! src/http/error.rs
//!
//! Taxonomía única de errores del servidor. Cada variante sabe qué código
//! HTTP le corresponde, así el `ErrorHandler` puede traducir cualquier fallo
//! de parseo, routing o servicio en una respuesta.

use thiserror::Error;

/// Error de protocolo/aplicación con código HTTP asociado
#[derive(Debug, Error)]
pub enum HttpError {
    /// La request line no tiene exactamente 3 tokens
    #[error("Invalid HTTP request method")]
    InvalidRequestLine,

    /// Header sin ':' o con nombre vacío
    #[error("Malformed header at line {0}")]
    MalformedHeader(usize),

    /// `content-length` negativo o no numérico
    #[error("Malformed content-length header: {0}")]
    MalformedContentLength(String),

    /// Una línea superó el tamaño máximo sin terminador
    #[error("Entity Too Large")]
    LineTooLarge,

    /// El body declarado supera el máximo permitido
    #[error("Body too large")]
    BodyTooLarge,

    /// Ningún virtual host (ni el wildcard) acepta el hostname
    #[error("Host not found")]
    HostNotFound,

    /// Ninguna ruta del virtual host coincide
    #[error("Page not found")]
    RouteNotFound,

    /// El backend respondió con una status line inválida
    #[error("Bad response from server")]
    BadUpstreamResponse,

    /// No se pudo contactar al backend. La causa real solo se loguea.
    #[error("Error during proxy request processing")]
    UpstreamUnreachable,

    /// `Response::write` llamado por segunda vez
    #[error("Headers already sent")]
    HeadersAlreadySent,

    /// Error arbitrario levantado por un handler
    #[error("{message}")]
    Status { code: u16, message: String },

    /// Fallo inesperado (I/O, etc.), siempre 500
    #[error("Error : {0}")]
    Io(#[from] std::io::Error),
}

impl HttpError {
    /// Construye un error con código y mensaje arbitrarios
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::http::HttpError;
    ///
    /// let err = HttpError::status(404, "File index.html not found");
    /// assert_eq!(err.code(), 404);
    /// ```
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        HttpError::Status {
            code,
            message: message.into(),
        }
    }

    /// Código HTTP que se envía al cliente
    pub fn code(&self) -> u16 {
        match self {
            HttpError::InvalidRequestLine => 405,
            HttpError::MalformedHeader(_) => 400,
            HttpError::MalformedContentLength(_) => 400,
            HttpError::LineTooLarge | HttpError::BodyTooLarge => 413,
            HttpError::HostNotFound | HttpError::RouteNotFound => 404,
            HttpError::BadUpstreamResponse => 502,
            HttpError::UpstreamUnreachable => 500,
            HttpError::HeadersAlreadySent => 500,
            HttpError::Status { code, .. } => *code,
            HttpError::Io(_) => 500,
        }
    }
}
