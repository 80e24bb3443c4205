//! # Códigos de Estado HTTP
//!
//! El servidor trabaja con códigos numéricos (el proxy reenvía lo que diga
//! el backend), pero el texto de razón por defecto sale de una tabla fija:
//!
//! - **200**: OK
//! - **304**: Not Modified
//! - **400**: Bad Request
//! - **404**: Not Found
//! - **500**: Server Error
//!
//! Cualquier otro código sin texto explícito se envía como `Error Unknown`.

/// Código de estado HTTP
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// 200 OK
    pub const OK: StatusCode = StatusCode(200);

    /// 304 Not Modified - el cliente ya tiene la versión actual
    pub const NOT_MODIFIED: StatusCode = StatusCode(304);

    /// 400 Bad Request
    pub const BAD_REQUEST: StatusCode = StatusCode(400);

    /// 404 Not Found
    pub const NOT_FOUND: StatusCode = StatusCode(404);

    /// 500 Internal Server Error
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::http::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Retorna el texto de razón por defecto asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::http::StatusCode;
    /// assert_eq!(StatusCode::OK.reason_phrase(), "OK");
    /// assert_eq!(StatusCode(418).reason_phrase(), "Error Unknown");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            304 => "Not Modified",
            404 => "Not Found",
            400 => "Bad Request",
            500 => "Server Error",
            _ => "Error Unknown",
        }
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}
