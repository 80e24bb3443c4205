//! # Logging
//! src/logging.rs
//!
//! Inicialización del subscriber de `tracing`. `RUST_LOG` tiene prioridad
//! sobre el nivel configurado.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Instala el subscriber `fmt` con el nivel por defecto dado
///
/// Es idempotente: si ya hay un subscriber global (por ejemplo en tests), no
/// hace nada.
pub fn init(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init("debug");
        init("not a valid directive ===");
        tracing::info!("logging inicializado");
    }
}
