//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Este módulo implementa el parser (y el serializador, usado por el proxy)
//! de requests HTTP/1.1 directamente sobre el stream del socket.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /path?param1=value1 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 5\r\n
//! Cookie: session=abc; theme=dark\r\n
//! \r\n
//! hello
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD LOCATION PROTOCOL` (exactamente 3 tokens)
//! 2. **Headers**: Pares `Name: Value`, guardados con el nombre en minúsculas
//! 3. **Empty Line**: separa headers del body
//! 4. **Body**: exactamente `content-length` bytes (vacío si no hay header)

use super::reader::{read_body, read_headers, read_line};
use super::HttpError;
use std::collections::HashMap;
use std::io::{self, BufRead, Cursor, Write};
use std::net::IpAddr;

/// Cookie enviada por el cliente
///
/// Un segmento sin '=' produce una cookie sin nombre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub key: Option<String>,
    pub value: String,
}

/// Representa un request HTTP/1.1
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP tal como vino en la request line (GET, POST, ...)
    method: String,

    /// URI cruda, incluyendo la query string (ej: "/api/users?page=2")
    location: String,

    /// Protocolo (ej: "HTTP/1.1")
    protocol: String,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    /// Parámetros: query string + capturas del router
    params: HashMap<String, String>,

    /// Body del request (puede ser vacío)
    body: Vec<u8>,

    /// Cookies en el orden del header
    cookies: Vec<Cookie>,

    /// IP del cliente conectado
    client_address: Option<IpAddr>,

    /// Header Host sin el sufijo ":port"
    hostname: Option<String>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Crea un request vacío, listo para `read`
    pub fn new() -> Self {
        Self {
            method: String::new(),
            location: String::new(),
            protocol: "HTTP/1.1".to_string(),
            headers: HashMap::new(),
            params: HashMap::new(),
            body: Vec::new(),
            cookies: Vec::new(),
            client_address: None,
            hostname: None,
        }
    }

    /// Parsea un request completo desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use vhost_http::http::Request;
    ///
    /// let raw = b"GET /users?page=2 HTTP/1.1\r\nHost: example.com:8080\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.location(), "/users?page=2");
    /// assert_eq!(request.param("page"), Some("2"));
    /// assert_eq!(request.hostname(), Some("example.com"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, HttpError> {
        let mut request = Request::new();
        request.read(&mut Cursor::new(buffer))?;
        Ok(request)
    }

    /// Lee y parsea el request desde el stream
    ///
    /// El orden es: request line, headers, body, cookies, hostname.
    ///
    /// Sin `content-length` el body queda vacío aunque el cliente haya
    /// enviado bytes (no hay soporte para chunked).
    pub fn read<R: BufRead + ?Sized>(&mut self, reader: &mut R) -> Result<(), HttpError> {
        // 1. Request line
        let line = read_line(reader)?;
        self.parse_request_line(&line)?;

        // 2. Headers
        self.headers = read_headers(reader)?;

        // 3. Body
        if self.headers.contains_key("transfer-encoding") && !self.headers.contains_key("content-length") {
            tracing::debug!(
                location = %self.location,
                "transfer-encoding sin content-length: el body se ignora"
            );
        }
        self.body = read_body(reader, self.header("content-length"))?;

        // 4. Cookies
        self.cookies = self
            .header("cookie")
            .map(Self::parse_cookies)
            .unwrap_or_default();

        // 5. Hostname
        self.hostname = self.header("host").map(|host| Self::strip_port(host).to_string());

        Ok(())
    }

    /// Parsea la request line
    ///
    /// Formato: `GET /path?query HTTP/1.1`
    fn parse_request_line(&mut self, line: &str) -> Result<(), HttpError> {
        let parts: Vec<&str> = line.split(' ').collect();

        // Debe tener exactamente 3 partes: METHOD LOCATION PROTOCOL
        if parts.len() != 3 {
            return Err(HttpError::InvalidRequestLine);
        }

        self.method = parts[0].trim().to_string();
        self.location = parts[1].trim().to_string();
        self.protocol = parts[2].trim().to_string();
        self.params = Self::parse_query_params(&self.location);

        Ok(())
    }

    /// Extrae los query parameters de la location
    ///
    /// Ejemplo: "/fibonacci?num=10&fast"
    /// Retorna: {"num": "10", "fast": ""}
    fn parse_query_params(location: &str) -> HashMap<String, String> {
        let mut params = HashMap::new();

        let query = match location.split_once('?') {
            Some((_, query)) => query,
            None => return params,
        };

        for param in query.split('&') {
            if param.is_empty() {
                continue;
            }

            match param.split_once('=') {
                Some((key, value)) => {
                    params.insert(Self::url_decode(key), Self::url_decode(value));
                }
                None => {
                    // Parámetro sin valor (ej: "?debug")
                    params.insert(Self::url_decode(param), String::new());
                }
            }
        }

        params
    }

    /// Decodifica `%XX` y `+` de un componente de query string
    ///
    /// Las secuencias inválidas se dejan tal cual.
    fn url_decode(s: &str) -> String {
        let bytes = s.as_bytes();
        let mut decoded = Vec::with_capacity(bytes.len());
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'+' => decoded.push(b' '),
                b'%' if i + 2 < bytes.len()
                    && bytes[i + 1].is_ascii_hexdigit()
                    && bytes[i + 2].is_ascii_hexdigit() =>
                {
                    let hex = [bytes[i + 1], bytes[i + 2]];
                    match std::str::from_utf8(&hex).ok().and_then(|h| u8::from_str_radix(h, 16).ok()) {
                        Some(byte) => {
                            decoded.push(byte);
                            i += 2;
                        }
                        None => decoded.push(b'%'),
                    }
                }
                other => decoded.push(other),
            }
            i += 1;
        }

        String::from_utf8_lossy(&decoded).into_owned()
    }

    /// Parsea el header Cookie
    ///
    /// Ejemplo: "session=abc; theme=dark; flag"
    fn parse_cookies(raw: &str) -> Vec<Cookie> {
        raw.split(';')
            .map(|segment| match segment.split_once('=') {
                Some((key, value)) => Cookie {
                    key: Some(key.trim().to_string()),
                    value: value.trim().to_string(),
                },
                None => Cookie {
                    key: None,
                    value: segment.trim().to_string(),
                },
            })
            .collect()
    }

    /// Quita el sufijo ":port" del header Host
    fn strip_port(host: &str) -> &str {
        match host.rsplit_once(':') {
            Some((name, port))
                if !name.is_empty()
                    && !port.is_empty()
                    && port.bytes().all(|b| b.is_ascii_digit())
                    && (!name.contains(':') || name.ends_with(']')) =>
            {
                name
            }
            _ => host,
        }
    }

    /// Serializa el request al stream (usado por el proxy)
    ///
    /// Escribe la request line, los headers, una línea vacía y el body sin
    /// modificar.
    pub fn write_to<W: Write + ?Sized>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{} {} {}\r\n", self.method, self.location, self.protocol)?;
        for (name, value) in &self.headers {
            write!(out, "{}: {}\r\n", name, value)?;
        }
        out.write_all(b"\r\n")?;
        out.write_all(&self.body)?;
        out.flush()
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn set_method(&mut self, method: &str) {
        self.method = method.to_string();
    }

    /// Obtiene la URI completa (path + query)
    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn set_location(&mut self, location: &str) {
        self.location = location.to_string();
    }

    /// Obtiene solo el path, sin la query string
    pub fn path(&self) -> &str {
        match self.location.split_once('?') {
            Some((path, _)) => path,
            None => &self.location,
        }
    }

    /// Obtiene el protocolo
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Obtiene un header específico (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Obtiene todos los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Agrega o reemplaza un header
    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_lowercase(), value.to_string());
    }

    /// Obtiene todos los parámetros (query + capturas)
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Obtiene un parámetro específico
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::http::Request;
    ///
    /// let request = Request::parse(b"GET /test?num=42 HTTP/1.1\r\n\r\n").unwrap();
    ///
    /// assert_eq!(request.param("num"), Some("42"));
    /// assert_eq!(request.param("missing"), None);
    /// ```
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(|s| s.as_str())
    }

    /// Inserta un parámetro (lo usa el router para las capturas)
    pub fn set_param(&mut self, name: &str, value: &str) {
        self.params.insert(name.to_string(), value.to_string());
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Cookies en el orden en que vinieron
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// Busca una cookie por nombre
    pub fn cookie(&self, key: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|cookie| cookie.key.as_deref() == Some(key))
            .map(|cookie| cookie.value.as_str())
    }

    /// Hostname derivado del header Host
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// IP del cliente
    pub fn client_address(&self) -> Option<IpAddr> {
        self.client_address
    }

    pub fn set_client_address(&mut self, address: IpAddr) {
        self.client_address = Some(address);
    }
}
