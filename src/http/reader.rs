//! # Lectura de Líneas y Bodies
//! src/http/reader.rs
//!
//! Primitivas de lectura sobre el stream crudo del socket:
//!
//! - `read_line`: una línea terminada en `\n` (o `\r\n`), con buffer que
//!   crece ~1.5x y tope de 1 MiB
//! - `read_body`: exactamente `content-length` bytes, con tope de 10 MiB
//!
//! No hay soporte para chunked transfer encoding: sin `content-length`
//! el body es vacío.

use super::HttpError;
use std::collections::HashMap;
use std::io::{BufRead, ErrorKind, Read};

/// Tamaño máximo de una línea (request line, status line o header)
pub const MAX_LINE_LENGTH: usize = 1_048_576; // 1 MiB

/// Tamaño máximo de un body leído a memoria
pub const MAX_BODY_SIZE: usize = 10_485_760; // 10 MiB

/// Capacidad inicial del buffer de línea
const INITIAL_LINE_CAPACITY: usize = 1024;

/// Lee una línea del stream y la retorna sin espacios ni terminador
///
/// Si el stream termina antes de encontrar `\n`, retorna lo que se haya
/// leído (posiblemente vacío).
///
/// # Errores
///
/// * `HttpError::LineTooLarge` si la línea supera `MAX_LINE_LENGTH`
/// * `HttpError::Io` si falla la lectura
///
/// # Ejemplo
/// ```
/// use std::io::Cursor;
/// use vhost_http::http::reader::read_line;
///
/// let mut input = Cursor::new(b"GET / HTTP/1.1\r\nHost: a\r\n".to_vec());
/// assert_eq!(read_line(&mut input).unwrap(), "GET / HTTP/1.1");
/// assert_eq!(read_line(&mut input).unwrap(), "Host: a");
/// assert_eq!(read_line(&mut input).unwrap(), "");
/// ```
pub fn read_line<R: BufRead + ?Sized>(reader: &mut R) -> Result<String, HttpError> {
    let mut line: Vec<u8> = Vec::with_capacity(INITIAL_LINE_CAPACITY);

    loop {
        let available = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };

        // Fin del stream
        if available.is_empty() {
            break;
        }

        let (chunk_len, found) = match available.iter().position(|&b| b == b'\n') {
            Some(pos) => (pos + 1, true),
            None => (available.len(), false),
        };

        let needed = line.len() + chunk_len;
        if needed > line.capacity() {
            grow(&mut line, needed)?;
        }

        line.extend_from_slice(&available[..chunk_len]);
        reader.consume(chunk_len);

        if found {
            break;
        }
    }

    Ok(String::from_utf8_lossy(&line).trim().to_string())
}

/// Agranda el buffer de línea en pasos de 1.5x hasta cubrir `needed`
fn grow(buffer: &mut Vec<u8>, needed: usize) -> Result<(), HttpError> {
    if needed > MAX_LINE_LENGTH {
        return Err(HttpError::LineTooLarge);
    }

    let mut capacity = buffer.capacity().max(INITIAL_LINE_CAPACITY);
    while capacity < needed {
        capacity += capacity / 2;
    }
    let capacity = capacity.min(MAX_LINE_LENGTH);

    buffer.reserve_exact(capacity - buffer.len());
    Ok(())
}

/// Lee headers `Name: Value` hasta encontrar una línea vacía
///
/// Los nombres se guardan en minúsculas; el valor va sin espacios en los
/// extremos. Si el stream termina antes de la línea vacía, se retorna lo
/// acumulado.
///
/// # Errores
///
/// * `HttpError::MalformedHeader` si una línea no tiene ':' o el nombre es vacío
pub fn read_headers<R: BufRead + ?Sized>(
    reader: &mut R,
) -> Result<HashMap<String, String>, HttpError> {
    let mut headers = HashMap::new();

    loop {
        let line = read_line(reader)?;

        // La línea vacía marca el fin de los headers
        if line.is_empty() {
            break;
        }

        match line.find(':') {
            Some(colon_pos) if colon_pos > 0 => {
                let name = line[..colon_pos].trim().to_lowercase();
                let value = line[colon_pos + 1..].trim().to_string();
                headers.insert(name, value);
            }
            _ => return Err(HttpError::MalformedHeader(headers.len())),
        }
    }

    Ok(headers)
}

/// Lee el body según el valor crudo del header `content-length`
///
/// * `None` → body vacío (no se intenta leer nada más del stream)
/// * `Some(n)` → exactamente `n` bytes, o menos si el stream termina antes
///
/// # Errores
///
/// * `HttpError::MalformedContentLength` si el valor es negativo o no numérico
/// * `HttpError::BodyTooLarge` si supera `MAX_BODY_SIZE`
pub fn read_body<R: Read + ?Sized>(
    reader: &mut R,
    content_length: Option<&str>,
) -> Result<Vec<u8>, HttpError> {
    let raw = match content_length {
        Some(raw) => raw,
        None => return Ok(Vec::new()),
    };

    let declared: i64 = raw
        .trim()
        .parse()
        .map_err(|_| HttpError::MalformedContentLength(raw.to_string()))?;

    if declared < 0 {
        return Err(HttpError::MalformedContentLength(raw.to_string()));
    }

    let declared = declared as u64;
    if declared > MAX_BODY_SIZE as u64 {
        return Err(HttpError::BodyTooLarge);
    }

    let mut body = Vec::with_capacity(declared as usize);
    Read::take(&mut *reader, declared).read_to_end(&mut body)?;

    // Si el stream terminó antes, el body queda con lo efectivamente leído
    body.shrink_to_fit();
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn test_read_line_crlf_and_lf() {
        let mut input = Cursor::new(b"first\r\nsecond\nthird".to_vec());

        assert_eq!(read_line(&mut input).unwrap(), "first");
        assert_eq!(read_line(&mut input).unwrap(), "second");
        assert_eq!(read_line(&mut input).unwrap(), "third");
        assert_eq!(read_line(&mut input).unwrap(), "");
    }

    #[test]
    fn test_read_line_across_small_buffers() {
        // Un BufReader de 4 bytes obliga a juntar varios fill_buf
        let data = b"a-very-long-header-line: with value\r\nnext\r\n".to_vec();
        let mut input = BufReader::with_capacity(4, Cursor::new(data));

        assert_eq!(
            read_line(&mut input).unwrap(),
            "a-very-long-header-line: with value"
        );
        assert_eq!(read_line(&mut input).unwrap(), "next");
    }

    #[test]
    fn test_read_line_grows_past_initial_capacity() {
        let mut data = vec![b'x'; 5000];
        data.extend_from_slice(b"\r\n");
        let mut input = Cursor::new(data);

        assert_eq!(read_line(&mut input).unwrap().len(), 5000);
    }

    #[test]
    fn test_read_line_too_large() {
        let data = vec![b'x'; MAX_LINE_LENGTH + 10];
        let mut input = Cursor::new(data);

        assert!(matches!(read_line(&mut input), Err(HttpError::LineTooLarge)));
    }

    #[test]
    fn test_read_headers_lowercases_names() {
        let mut input = Cursor::new(b"Content-Type: text/plain\r\nX-Custom:  value \r\n\r\nbody".to_vec());
        let headers = read_headers(&mut input).unwrap();

        assert_eq!(headers.get("content-type").map(String::as_str), Some("text/plain"));
        assert_eq!(headers.get("x-custom").map(String::as_str), Some("value"));
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn test_read_headers_value_with_colons() {
        let mut input = Cursor::new(b"Host: example.com:8080\r\n\r\n".to_vec());
        let headers = read_headers(&mut input).unwrap();

        assert_eq!(headers.get("host").map(String::as_str), Some("example.com:8080"));
    }

    #[test]
    fn test_read_headers_missing_colon() {
        let mut input = Cursor::new(b"Host: a\r\nNoColonHere\r\n\r\n".to_vec());
        let result = read_headers(&mut input);

        assert!(matches!(result, Err(HttpError::MalformedHeader(1))));
    }

    #[test]
    fn test_read_headers_empty_name() {
        let mut input = Cursor::new(b": value\r\n\r\n".to_vec());
        let result = read_headers(&mut input);

        assert!(matches!(result, Err(HttpError::MalformedHeader(0))));
    }

    #[test]
    fn test_read_body_absent_content_length() {
        let mut input = Cursor::new(b"ignored".to_vec());
        let body = read_body(&mut input, None).unwrap();

        assert!(body.is_empty());
    }

    #[test]
    fn test_read_body_exact_length() {
        let mut input = Cursor::new(b"hello world".to_vec());
        let body = read_body(&mut input, Some("5")).unwrap();

        assert_eq!(body, b"hello");
    }

    #[test]
    fn test_read_body_short_stream() {
        let mut input = Cursor::new(b"abc".to_vec());
        let body = read_body(&mut input, Some("10")).unwrap();

        assert_eq!(body, b"abc");
    }

    #[test]
    fn test_read_body_negative() {
        let mut input = Cursor::new(Vec::new());
        let result = read_body(&mut input, Some("-1"));

        assert!(matches!(result, Err(HttpError::MalformedContentLength(_))));
    }

    #[test]
    fn test_read_body_non_numeric() {
        let mut input = Cursor::new(Vec::new());
        let result = read_body(&mut input, Some("twelve"));

        assert!(matches!(result, Err(HttpError::MalformedContentLength(_))));
    }

    #[test]
    fn test_read_body_too_large() {
        let mut input = Cursor::new(Vec::new());
        let declared = (MAX_BODY_SIZE + 1).to_string();
        let result = read_body(&mut input, Some(&declared));

        assert!(matches!(result, Err(HttpError::BodyTooLarge)));
    }
}
