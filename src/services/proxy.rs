//! # Reverse Proxy
//! src/services/proxy.rs
//!
//! Reenvía cada request a uno de los backends del pool, elegido en round
//! robin con un contador atómico compartido por todos los workers.
//!
//! ## Flujo
//!
//! ```text
//! cliente → [merge X-Forwarded-For] → backend[i mod N] → parse respuesta → cliente
//! ```
//!
//! Un intento fallido es terminal: no se reintenta con otro backend. La causa
//! real del fallo se loguea y el cliente recibe un 500 genérico.

use super::{required_str, Handler};
use crate::http::{HttpError, Request, Response};
use serde_json::Value;
use std::fmt;
use std::io::{self, BufReader, BufWriter, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Puerto usado cuando una entrada del pool no lo especifica
pub const DEFAULT_PORT: u16 = 80;

/// Header con la cadena de clientes por la que pasó la request
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Errores al construir el pool de destinos
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyConfigError {
    #[error("No server pool specified")]
    EmptyPool,

    #[error("Invalid pool entry '{0}'")]
    InvalidDestination(String),
}

/// Backend `host:port`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    /// Parsea una entrada `host[:port]` del pool
    ///
    /// Las direcciones IPv6 con puerto van entre corchetes (`[::1]:8080`);
    /// sin corchetes, una entrada con varios `:` es una IPv6 sin puerto.
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::services::Destination;
    ///
    /// let d = Destination::parse(" backend.local ").unwrap();
    /// assert_eq!((d.host.as_str(), d.port), ("backend.local", 80));
    ///
    /// let d = Destination::parse("10.0.0.2:8081").unwrap();
    /// assert_eq!(d.port, 8081);
    ///
    /// let d = Destination::parse("[::1]:8080").unwrap();
    /// assert_eq!((d.host.as_str(), d.port), ("::1", 8080));
    /// ```
    pub fn parse(entry: &str) -> Result<Self, ProxyConfigError> {
        let entry = entry.trim();
        let invalid = || ProxyConfigError::InvalidDestination(entry.to_string());
        let parse_port = |port: &str| port.trim().parse::<u16>().map_err(|_| invalid());

        let (host, port) = if let Some(bracketed) = entry.strip_prefix('[') {
            let (host, rest) = bracketed.split_once(']').ok_or_else(invalid)?;
            let port = match rest {
                "" => DEFAULT_PORT,
                rest => parse_port(rest.strip_prefix(':').ok_or_else(invalid)?)?,
            };
            (host, port)
        } else {
            match entry.rsplit_once(':') {
                Some((host, _)) if host.contains(':') => (entry, DEFAULT_PORT),
                Some((host, port)) => (host, parse_port(port)?),
                None => (entry, DEFAULT_PORT),
            }
        };

        let host = host.trim();
        if host.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Handler de reverse proxy con balanceo round robin
#[derive(Debug)]
pub struct ProxyHandler {
    destinations: Vec<Destination>,

    /// Cantidad de requests despachadas; el índice es `counter mod N`
    counter: AtomicUsize,
}

impl ProxyHandler {
    /// Construye el proxy a partir de un pool `host[:port],host[:port],...`
    pub fn new(pool: &str) -> Result<Self, ProxyConfigError> {
        if pool.trim().is_empty() {
            return Err(ProxyConfigError::EmptyPool);
        }

        let destinations = pool
            .split(',')
            .map(Destination::parse)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            destinations,
            counter: AtomicUsize::new(0),
        })
    }

    /// Factory para el registro: parámetros `{ "pool": "..." }`
    pub fn from_params(params: &Value) -> Result<Arc<dyn Handler>, String> {
        let pool = required_str(params, "pool")?;
        let handler = Self::new(pool).map_err(|e| e.to_string())?;
        Ok(Arc::new(handler))
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.destinations
    }

    /// Reserva el siguiente índice y retorna el destino correspondiente
    pub fn next_destination(&self) -> (usize, &Destination) {
        let index = self.counter.fetch_add(1, Ordering::Relaxed);
        (index, &self.destinations[index % self.destinations.len()])
    }

    /// Abre la conexión, envía la request y parsea la respuesta
    fn relay(
        &self,
        destination: &Destination,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), HttpError> {
        let stream = TcpStream::connect((destination.host.as_str(), destination.port))?;

        {
            let mut writer = BufWriter::new(&stream);
            request.write_to(&mut writer)?;
            writer.flush()?;
        }

        response.read_from(BufReader::new(stream))
    }
}

impl Handler for ProxyHandler {
    fn serve(&self, request: &mut Request, response: &mut Response) -> Result<(), HttpError> {
        let (attempt, destination) = self.next_destination();

        tracing::info!(
            attempt,
            host = request.hostname().unwrap_or("-"),
            location = %request.location(),
            destination = %destination,
            "proxy request"
        );

        merge_forwarded_for(request);

        // Una request por conexión: el backend cierra y el body termina en EOF
        request.set_header("connection", "close");

        match self.relay(destination, request, response) {
            Ok(()) => {
                tracing::info!(
                    attempt,
                    destination = %destination,
                    status = response.status(),
                    "respuesta del backend"
                );
                Ok(())
            }
            Err(HttpError::Io(e)) => Err(upstream_unreachable(attempt, destination, e)),
            Err(e) => {
                tracing::warn!(attempt, destination = %destination, error = %e, "respuesta inválida del backend");
                Err(e)
            }
        }
    }
}

/// Loguea la causa real y la reemplaza por un error genérico
fn upstream_unreachable(attempt: usize, destination: &Destination, cause: io::Error) -> HttpError {
    tracing::warn!(
        attempt,
        destination = %destination,
        error = %cause,
        "Error during proxy request processing"
    );
    HttpError::UpstreamUnreachable
}

/// Agrega la IP del cliente a `X-Forwarded-For`
///
/// Si el header ya existe se concatena como `"<previo>, <cliente>"`; si no,
/// queda solo la IP del cliente.
pub fn merge_forwarded_for(request: &mut Request) {
    let client = request
        .client_address()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let value = match request.header(FORWARDED_FOR) {
        Some(prior) if !prior.is_empty() => format!("{}, {}", prior, client),
        _ => client,
    };

    request.set_header(FORWARDED_FOR, &value);
}
