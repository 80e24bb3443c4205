//! # Respuestas HTTP
//! src/http/response.rs
//!
//! Una `Response` está ligada al stream de salida de la conexión. El handler
//! la modifica (status, headers, body) y al final se escribe una única vez
//! con `write`.
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! content-type: text/html\r\n
//! content-encoding: gzip\r\n
//! \r\n
//! <body, posiblemente comprimido>
//! ```
//!
//! El mismo tipo sirve del lado cliente: el proxy parsea la respuesta del
//! backend con `read_from` y deja el resto del stream como body.

use super::encoding::Encoding;
use super::reader::{read_headers, read_line};
use super::{HttpError, Request, StatusCode};
use std::collections::HashMap;
use std::io::{self, BufRead, ErrorKind, Read, Write};

/// Tamaño de los bloques en que se copia el body hacia el socket
const BODY_CHUNK_SIZE: usize = 8192;

/// Stream de salida de la conexión
pub type OutputStream = Box<dyn Write + Send>;

/// Stream del que se lee el body de forma perezosa
pub type BodyStream = Box<dyn Read + Send>;

/// Body de la respuesta: bytes en memoria o stream (el último gana)
pub enum Body {
    Empty,
    Bytes(Vec<u8>),
    Stream(BodyStream),
}

/// Representa una respuesta HTTP/1.1
pub struct Response {
    /// Protocolo de la status line
    protocol: String,

    /// Código de estado (200 por defecto)
    status: u16,

    /// Texto de estado explícito; si es None se usa la tabla por defecto
    text_status: Option<String>,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    body: Body,

    /// Codificación del body (Auto hasta el momento de escribir)
    encoding: Encoding,

    /// true una vez que la status line y los headers salieron al socket
    headers_sent: bool,

    /// Stream de salida; None cuando ya fue cerrado
    output: Option<OutputStream>,
}

impl Response {
    /// Crea una respuesta vacía (200, HTTP/1.1) ligada a un stream de salida
    pub fn new<W: Write + Send + 'static>(output: W) -> Self {
        Self {
            protocol: "HTTP/1.1".to_string(),
            status: StatusCode::OK.as_u16(),
            text_status: None,
            headers: HashMap::new(),
            body: Body::Empty,
            encoding: Encoding::Auto,
            headers_sent: false,
            output: Some(Box::new(output)),
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn set_protocol(&mut self, protocol: &str) {
        self.protocol = protocol.to_string();
    }

    /// Obtiene el código de estado
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    /// Texto que se enviará en la status line
    pub fn text_status(&self) -> &str {
        match &self.text_status {
            Some(text) => text,
            None => StatusCode(self.status).reason_phrase(),
        }
    }

    pub fn set_text_status(&mut self, text: &str) {
        self.text_status = Some(text.to_string());
    }

    /// Obtiene un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Obtiene una referencia a los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Agrega un header; si ya existe, se sobrescribe
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::http::Response;
    ///
    /// let mut response = Response::new(Vec::new());
    /// response.set_header("Content-Type", "application/json");
    /// assert_eq!(response.header("content-type"), Some("application/json"));
    /// ```
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_lowercase(), value.to_string());
    }

    /// Establece el body desde bytes o string
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = Body::Bytes(body.into());
    }

    /// Establece el body como un stream que se leerá al escribir
    pub fn set_body_stream<R: Read + Send + 'static>(&mut self, stream: R) {
        self.body = Body::Stream(Box::new(stream));
    }

    /// Bytes del body si está en memoria
    pub fn body_bytes(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// true si el body es un stream pendiente de leer
    pub fn has_body_stream(&self) -> bool {
        matches!(self.body, Body::Stream(_))
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.encoding = encoding;
    }

    /// true si la status line y los headers ya se enviaron
    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    /// Limpia headers, body y texto de estado antes de generar una página
    /// de error. No tiene efecto sobre lo que ya se haya enviado.
    pub fn reset(&mut self) {
        self.headers.clear();
        self.text_status = None;
        self.body = Body::Empty;
        self.encoding = Encoding::Auto;
    }

    /// Escribe la respuesta completa y cierra el stream de salida
    ///
    /// 1. Resuelve la codificación (Auto → según `Accept-Encoding`; un body
    ///    vacío nunca se codifica)
    /// 2. Envía status line + headers + línea vacía, y marca headers enviados
    /// 3. Copia el body por bloques a través del encoder
    /// 4. Cierra encoder, body y salida
    ///
    /// # Errores
    ///
    /// * `HttpError::HeadersAlreadySent` si se llama por segunda vez
    /// * `HttpError::Io` si falla el socket
    pub fn write(&mut self, request: &Request) -> Result<(), HttpError> {
        if self.headers_sent {
            return Err(HttpError::HeadersAlreadySent);
        }

        if matches!(&self.body, Body::Bytes(bytes) if bytes.is_empty()) {
            self.body = Body::Empty;
        }

        // Sin body no hay nada que codificar ni que anunciar
        if matches!(self.body, Body::Empty) {
            self.encoding = Encoding::None;
        } else if self.encoding == Encoding::Auto {
            self.encoding = Encoding::negotiate(request.header("accept-encoding"));
        }

        if let Some(name) = self.encoding.header_name() {
            self.set_header("content-encoding", name);
        }

        let mut output = self.output.take().ok_or_else(|| {
            HttpError::Io(io::Error::new(ErrorKind::NotConnected, "output stream already closed"))
        })?;

        // 1. Status line + headers
        output.write_all(self.head().as_bytes())?;
        output.flush()?;
        self.headers_sent = true;

        // 2. Body
        let body = std::mem::replace(&mut self.body, Body::Empty);
        let output = match body {
            Body::Empty => output,
            Body::Bytes(bytes) => {
                let mut encoder = self.encoding.wrap(output);
                copy_chunks(&mut bytes.as_slice(), &mut encoder)?;
                encoder.finish()?
            }
            Body::Stream(mut stream) => {
                let mut encoder = self.encoding.wrap(output);
                copy_chunks(&mut stream, &mut encoder)?;
                encoder.finish()?
            }
        };

        // 3. Cerrar la salida
        drop(output);

        tracing::info!(
            status = self.status,
            method = %request.method(),
            host = request.hostname().unwrap_or("-"),
            location = %request.location(),
            "respuesta enviada"
        );

        Ok(())
    }

    /// Cierra el stream de salida (idempotente)
    pub fn close(&mut self) {
        if let Some(mut output) = self.output.take() {
            if let Err(e) = output.flush() {
                tracing::debug!(error = %e, "flush al cerrar la salida falló");
            }
        }
    }

    /// Status line + headers + línea vacía
    fn head(&self) -> String {
        let mut head = format!("{} {} {}\r\n", self.protocol, self.status, self.text_status());
        for (name, value) in &self.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str("\r\n");
        head
    }

    /// Parsea una respuesta de un servidor remoto (lado cliente)
    ///
    /// Lee status line y headers; el resto del stream queda como body sin
    /// leerlo todavía. La codificación se fuerza a `None` para no volver a
    /// comprimir lo que el backend ya haya codificado.
    ///
    /// # Errores
    ///
    /// * `HttpError::BadUpstreamResponse` si la status line o los headers
    ///   son inválidos
    pub fn read_from<R: BufRead + Send + 'static>(&mut self, mut reader: R) -> Result<(), HttpError> {
        let line = read_line(&mut reader)?;

        let (protocol, rest) = line.split_once(' ').ok_or(HttpError::BadUpstreamResponse)?;
        let (status, text) = rest.split_once(' ').ok_or(HttpError::BadUpstreamResponse)?;
        let status: u16 = status.trim().parse().map_err(|_| HttpError::BadUpstreamResponse)?;

        let headers = read_headers(&mut reader).map_err(|e| match e {
            HttpError::MalformedHeader(_) => HttpError::BadUpstreamResponse,
            other => other,
        })?;

        self.protocol = protocol.to_string();
        self.status = status;
        self.text_status = Some(text.to_string());
        self.headers.extend(headers);
        self.encoding = Encoding::None;
        self.body = Body::Stream(Box::new(reader));

        Ok(())
    }
}

/// Copia `source` en `sink` en bloques de tamaño fijo
fn copy_chunks<R: Read + ?Sized, W: Write + ?Sized>(source: &mut R, sink: &mut W) -> io::Result<()> {
    let mut buffer = [0u8; BODY_CHUNK_SIZE];

    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buffer[..read])?;
    }

    sink.flush()
}
