//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Encola cada conexión aceptada en el pool de workers
//! 3. Lee la request, la enruta y ejecuta el handler
//! 4. Escribe la response (o la página de error) y cierra la conexión

pub mod error_handler;
pub mod tcp;

pub use error_handler::ErrorHandler;
pub use tcp::{handle_connection, Server};
