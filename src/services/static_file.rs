//! # Archivos Estáticos
//! src/services/static_file.rs
//!
//! Sirve archivos a partir de un directorio raíz. El path de la request (sin
//! query string) se interpreta relativo a la raíz:
//!
//! - Archivo → 200 con el contenido como stream, `last-modified` y
//!   `content-type` según la extensión
//! - Archivo no modificado desde `If-Modified-Since` → 304 sin body
//! - Directorio → listado HTML de sus entradas
//! - Inexistente o con `..` → 404

use super::{escape_html, required_str, Handler};
use crate::http::{HttpError, Request, Response, StatusCode};
use serde_json::Value;
use std::fs::{self, File, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Handler de archivos estáticos
#[derive(Debug, Clone)]
pub struct StaticFileHandler {
    root: PathBuf,
}

impl StaticFileHandler {
    /// Crea el handler; falla si la raíz no es un directorio accesible
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();

        if !root.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "The static directory {} does not exist or is not accessible",
                    root.display()
                ),
            ));
        }

        Ok(Self { root })
    }

    /// Factory para el registro: parámetros `{ "path": "..." }`
    pub fn from_params(params: &Value) -> Result<Arc<dyn Handler>, String> {
        let path = required_str(params, "path")?;
        let handler = Self::new(path).map_err(|e| e.to_string())?;
        Ok(Arc::new(handler))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Traduce el path de la request a un path dentro de la raíz
    fn resolve(&self, request_path: &str) -> Result<PathBuf, HttpError> {
        let mut resolved = self.root.clone();

        for component in request_path.split('/').filter(|c| !c.is_empty() && *c != ".") {
            if component == ".." || component.contains('\\') {
                return Err(not_found(request_path));
            }
            resolved.push(component);
        }

        Ok(resolved)
    }

    fn serve_file(
        &self,
        path: &Path,
        metadata: &Metadata,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), HttpError> {
        let modified = metadata.modified()?;

        response.set_header("last-modified", &httpdate::fmt_http_date(modified));
        response.set_header("content-type", content_type(path));

        if not_modified_since(modified, request.header("if-modified-since")) {
            response.set_status(StatusCode::NOT_MODIFIED.as_u16());
            return Ok(());
        }

        response.set_status(StatusCode::OK.as_u16());
        response.set_body_stream(File::open(path)?);
        Ok(())
    }

    fn serve_directory(
        &self,
        path: &Path,
        request: &Request,
        response: &mut Response,
    ) -> Result<(), HttpError> {
        let mut entries: Vec<(String, bool)> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok())
            .map(|entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                (entry.file_name().to_string_lossy().into_owned(), is_dir)
            })
            .collect();
        entries.sort();

        let base = request.path().trim_end_matches('/');
        let title = match base.rsplit('/').next() {
            Some(name) if !name.is_empty() => escape_html(name),
            _ => "/".to_string(),
        };

        let mut html = format!(
            "<html><head><title>{0}</title></head><body><h1>{0}</h1><ul>",
            title
        );
        for (name, is_dir) in entries {
            let suffix = if is_dir { "/" } else { "" };
            html.push_str(&format!(
                "<li><a href=\"{}/{}{}\">{}{}</a></li>",
                escape_html(base),
                escape_html(&name),
                suffix,
                escape_html(&name),
                suffix
            ));
        }
        html.push_str("</ul></body></html>");

        response.set_status(StatusCode::OK.as_u16());
        response.set_header("content-type", "text/html");
        response.set_body(html);
        Ok(())
    }
}

impl Handler for StaticFileHandler {
    fn serve(&self, request: &mut Request, response: &mut Response) -> Result<(), HttpError> {
        let path = self.resolve(request.path())?;

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(not_found(request.path())),
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            self.serve_directory(&path, request, response)
        } else {
            self.serve_file(&path, &metadata, request, response)
        }
    }
}

fn not_found(request_path: &str) -> HttpError {
    let name = request_path.rsplit('/').next().unwrap_or(request_path);
    HttpError::status(404, format!("File {} not found", name))
}

/// true si el archivo no cambió desde la fecha del header (a resolución de segundos)
fn not_modified_since(modified: SystemTime, header: Option<&str>) -> bool {
    let since = match header.and_then(|h| httpdate::parse_http_date(h).ok()) {
        Some(since) => since,
        None => return false,
    };

    let secs = |t: SystemTime| t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    secs(modified) <= secs(since)
}

/// Tipo MIME según la extensión del archivo
fn content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("html") | Some("htm") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        Some("txt") | Some("log") => "text/plain",
        Some("md") => "text/markdown",
        Some("csv") => "text/csv",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("webp") => "image/webp",
        Some("pdf") => "application/pdf",
        Some("wasm") => "application/wasm",
        _ => "application/octet-stream",
    }
}
