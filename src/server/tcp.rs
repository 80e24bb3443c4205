//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! El accept loop corre en su propio thread y nunca procesa requests: cada
//! conexión aceptada se encola como una tarea de prioridad 1 en el
//! `TaskPool`, y un worker la atiende de principio a fin:
//!
//! ```text
//! read request → HostRouter → Router → Handler::serve → Response::write
//!        └──────────── cualquier error ────────────→ ErrorHandler
//! ```
//!
//! Una request por conexión: al terminar se cierra el socket.

use super::ErrorHandler;
use crate::config::Config;
use crate::http::{HttpError, Request, Response, StatusCode};
use crate::pool::{PoolError, TaskPool};
use crate::router::HostRouter;
use std::io::{self, BufRead, BufReader, Read};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Máximo de bytes sin leer que se descartan antes de cerrar el socket
const MAX_DRAIN_BYTES: u64 = 64 * 1024;

/// Tiempo máximo esperando esos bytes
const DRAIN_TIMEOUT: Duration = Duration::from_millis(50);

/// Servidor HTTP/1.1 con virtual hosts
pub struct Server {
    config: Config,
    hosts: Arc<HostRouter>,
    error_handler: ErrorHandler,
    pool: TaskPool,
}

impl Server {
    /// Crea el servidor y arranca el pool de workers
    ///
    /// Las tablas de routing ya deben estar congeladas (`HostRouter::freeze`).
    pub fn new(config: Config, hosts: Arc<HostRouter>) -> Result<Self, PoolError> {
        let pool = TaskPool::new(config.workers)?;

        Ok(Self {
            config,
            hosts,
            error_handler: ErrorHandler::new(),
            pool,
        })
    }

    /// Hace bind en la dirección configurada y corre el accept loop
    pub fn run(&self) -> io::Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)?;

        tracing::info!(address = %address, workers = self.pool.size(), "servidor escuchando");

        self.serve(listener)
    }

    /// Accept loop sobre un listener ya abierto
    ///
    /// Termina cuando el pool fue detenido.
    pub fn serve(&self, listener: TcpListener) -> io::Result<()> {
        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(error = %e, "error al aceptar conexión");
                    continue;
                }
            };

            let hosts = Arc::clone(&self.hosts);
            let error_handler = self.error_handler;

            let submitted = self
                .pool
                .submit(move || handle_connection(stream, &hosts, &error_handler));

            if let Err(e) = submitted {
                tracing::info!(reason = %e, "accept loop detenido");
                break;
            }
        }

        Ok(())
    }

    /// Detiene el pool
    ///
    /// `serve` sigue bloqueado en `accept` hasta que llega la próxima
    /// conexión. Esa conexión ya no se puede encolar: se cierra sin
    /// respuesta y recién entonces termina el accept loop.
    pub fn stop(&self) {
        self.pool.stop();
    }

    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Atiende una conexión completa y la cierra
pub fn handle_connection(stream: TcpStream, hosts: &HostRouter, error_handler: &ErrorHandler) {
    let start = Instant::now();

    let (client, output) = match stream.peer_addr().and_then(|peer| Ok((peer, stream.try_clone()?))) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::error!(error = %e, "socket error");
            return;
        }
    };

    let mut request = Request::new();
    request.set_client_address(client.ip());
    let mut response = Response::new(output);

    {
        let mut reader = BufReader::new(&stream);

        if let Err(e) = process(&mut reader, &mut request, &mut response, hosts) {
            if StatusCode(e.code()).is_server_error() {
                tracing::error!(client = %client, status = e.code(), error = %e, "HTTP error during processing");
            } else {
                tracing::warn!(client = %client, status = e.code(), error = %e, "HTTP error during processing");
            }
            error_handler.handle(&e, &request, &mut response);
        }
    }

    response.close();
    close_connection(&stream);

    tracing::info!(
        client = %client,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "conexión atendida"
    );
}

/// Parse → routing → servicio → escritura
fn process<R: BufRead + ?Sized>(
    reader: &mut R,
    request: &mut Request,
    response: &mut Response,
    hosts: &HostRouter,
) -> Result<(), HttpError> {
    request.read(reader)?;

    let router = hosts
        .resolve(request.hostname().unwrap_or(""))
        .ok_or(HttpError::HostNotFound)?;

    let handler = router.resolve(request).ok_or(HttpError::RouteNotFound)?;

    handler.serve(request, response)?;
    response.write(request)
}

/// Cierra la escritura y descarta lo que el cliente haya dejado sin leer
///
/// Cerrar con datos pendientes en el buffer de entrada provoca un RST que
/// puede hacer perder la respuesta del lado del cliente.
fn close_connection(stream: &TcpStream) {
    let _ = stream.shutdown(Shutdown::Write);

    if stream.set_read_timeout(Some(DRAIN_TIMEOUT)).is_ok() {
        let _ = io::copy(&mut Read::take(stream, MAX_DRAIN_BYTES), &mut io::sink());
    }

    let _ = stream.shutdown(Shutdown::Both);
}
