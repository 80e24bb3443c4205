//! # Content Encoding
//! src/http/encoding.rs
//!
//! Negociación y aplicación de la codificación del body de la respuesta.
//! El conjunto de variantes es cerrado: identidad o gzip.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};

/// Modo de codificación del body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Se decide al escribir, según el `Accept-Encoding` del cliente
    #[default]
    Auto,

    /// Body comprimido con gzip
    Gzip,

    /// Body tal cual
    None,
}

impl Encoding {
    /// Valor del header `Content-Encoding` para esta codificación
    pub fn header_name(&self) -> Option<&'static str> {
        match self {
            Encoding::Gzip => Some("gzip"),
            Encoding::Auto | Encoding::None => None,
        }
    }

    /// Elige la codificación a partir del header `Accept-Encoding`
    ///
    /// La comparación es por substring y sin distinguir mayúsculas.
    /// Sin header, no se codifica.
    ///
    /// # Ejemplo
    /// ```
    /// use vhost_http::http::Encoding;
    ///
    /// assert_eq!(Encoding::negotiate(Some("deflate, GZIP;q=0.8")), Encoding::Gzip);
    /// assert_eq!(Encoding::negotiate(Some("br")), Encoding::None);
    /// assert_eq!(Encoding::negotiate(None), Encoding::None);
    /// ```
    pub fn negotiate(accept_encoding: Option<&str>) -> Encoding {
        let accepted = match accept_encoding {
            Some(value) => value.to_lowercase(),
            None => return Encoding::None,
        };

        for candidate in [Encoding::Gzip] {
            if let Some(name) = candidate.header_name() {
                if accepted.contains(name) {
                    return candidate;
                }
            }
        }

        Encoding::None
    }

    /// Envuelve el sink de salida con el encoder correspondiente
    pub fn wrap<W: Write>(self, sink: W) -> EncodedWriter<W> {
        match self {
            Encoding::Gzip => EncodedWriter::Gzip(GzEncoder::new(sink, Compression::default())),
            Encoding::Auto | Encoding::None => EncodedWriter::Identity(sink),
        }
    }
}

/// Sink de salida con la codificación ya aplicada
pub enum EncodedWriter<W: Write> {
    Identity(W),
    Gzip(GzEncoder<W>),
}

impl<W: Write> EncodedWriter<W> {
    /// Escribe el trailer del encoder (si lo hay) y devuelve el sink original
    pub fn finish(self) -> io::Result<W> {
        match self {
            EncodedWriter::Identity(mut sink) => {
                sink.flush()?;
                Ok(sink)
            }
            EncodedWriter::Gzip(encoder) => {
                let mut sink = encoder.finish()?;
                sink.flush()?;
                Ok(sink)
            }
        }
    }
}

impl<W: Write> Write for EncodedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EncodedWriter::Identity(sink) => sink.write(buf),
            EncodedWriter::Gzip(encoder) => encoder.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EncodedWriter::Identity(sink) => sink.flush(),
            EncodedWriter::Gzip(encoder) => encoder.flush(),
        }
    }
}
