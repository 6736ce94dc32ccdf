use html_escape::encode_text;
use hyper::header::{self, HeaderMap, HeaderValue};
use hyper::http::response::Builder;
use hyper::{Body, Method, Request, Response, StatusCode};
use log::{error, info, warn};
use mime_guess::from_path;
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::future::Future;
use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs::{self, File, read_dir};
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio_util::io::ReaderStream;

/// Characters escaped in listing hrefs. `/` is kept so directory links
/// keep their trailing slash.
const HREF_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b':')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Something that turns a request into a response. The static file server
/// and the auth gate wrapping it both implement this, so the binary can
/// pick either one at startup.
pub trait Handler: Send + Sync + 'static {
    fn handle(
        &self,
        req: Request<Body>,
        remote_addr: SocketAddr,
    ) -> impl Future<Output = Response<Body>> + Send;
}

/// Serves files below `root`.
#[derive(Debug, Clone)]
pub struct FileServer {
    root: PathBuf,
}

impl FileServer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FileServer { root: root.into() }
    }
}

impl Handler for FileServer {
    async fn handle(&self, req: Request<Body>, remote_addr: SocketAddr) -> Response<Body> {
        let (parts, _body) = req.into_parts();
        if parts.method != Method::GET && parts.method != Method::HEAD {
            warn!(
                "Method not allowed | method: {} | uri: {} | status: {} | remote: {}",
                parts.method,
                parts.uri,
                StatusCode::METHOD_NOT_ALLOWED,
                remote_addr
            );
            let mut response =
                text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, HEAD"));
            return response;
        }

        let mut response = match serve_path(
            &self.root,
            parts.uri.path(),
            parts.uri.query(),
            &parts.headers,
            remote_addr,
        )
        .await
        {
            Ok(resp) => resp,
            Err(resp) => resp,
        };
        if parts.method == Method::HEAD {
            *response.body_mut() = Body::empty();
        }
        response
    }
}

async fn serve_path(
    root: &Path,
    request_path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    remote_addr: SocketAddr,
) -> Result<Response<Body>, Response<Body>> {
    let decoded_path = match percent_decode_str(request_path).decode_utf8() {
        Ok(path) => path,
        Err(err) => {
            error!(
                "Invalid URL path decoding | raw: {:?} | error: {} | status: {} | remote: {}",
                request_path,
                err,
                StatusCode::BAD_REQUEST,
                remote_addr
            );
            return Err(text_response(StatusCode::BAD_REQUEST, "400 Bad Request"));
        }
    };

    if decoded_path.ends_with("/index.html") {
        return Ok(redirect("./", query, remote_addr));
    }

    let mut path = root.to_path_buf();
    for part in Path::new(&*decoded_path).components() {
        use std::path::Component::*;
        match part {
            Normal(comp) => path.push(comp),
            CurDir => {}
            RootDir => {}
            _ => {
                warn!(
                    "Directory traversal attempt blocked | input: {:?} | component: {:?} | status: {} | remote: {}",
                    decoded_path,
                    part,
                    StatusCode::FORBIDDEN,
                    remote_addr
                );
                return Err(text_response(StatusCode::FORBIDDEN, "403 Forbidden"));
            }
        }
    }

    let metadata = fs::metadata(&path)
        .await
        .map_err(|err| io_error_response(&path, err, remote_addr))?;

    let trailing_slash = decoded_path.ends_with('/');
    let base = last_segment(request_path);

    if metadata.is_dir() {
        if !trailing_slash {
            return Ok(redirect(&format!("{}/", base), query, remote_addr));
        }
        let index_path = path.join("index.html");
        if fs::metadata(&index_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
        {
            info!(
                "Serving index.html | path: {:?} | requested: {:?} | remote: {}",
                index_path, request_path, remote_addr
            );
            return serve_file(&index_path, headers, remote_addr).await;
        }
        return match render_directory_listing(&path, &decoded_path).await {
            Ok(html) => {
                info!(
                    "Directory listing | path: {:?} | requested: {:?} | status: {} | remote: {}",
                    path,
                    request_path,
                    StatusCode::OK,
                    remote_addr
                );
                Ok(finish(
                    Response::builder()
                        .status(StatusCode::OK)
                        .header(header::CONTENT_TYPE, "text/html; charset=utf-8"),
                    Body::from(html),
                ))
            }
            Err(err) => Err(io_error_response(&path, err, remote_addr)),
        };
    }

    if trailing_slash {
        return Ok(redirect(&format!("../{}", base), query, remote_addr));
    }
    serve_file(&path, headers, remote_addr).await
}

async fn serve_file(
    path: &Path,
    headers: &HeaderMap,
    remote_addr: SocketAddr,
) -> Result<Response<Body>, Response<Body>> {
    let mut file = File::open(path)
        .await
        .map_err(|err| io_error_response(path, err, remote_addr))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|err| io_error_response(path, err, remote_addr))?;

    let file_size = metadata.len();
    let mime = from_path(path).first_or_octet_stream();
    let modified = metadata
        .modified()
        .ok()
        .map(truncate_to_secs)
        .filter(|t| *t > UNIX_EPOCH);

    if let Some(modified) = modified {
        if let Some(since) = header_date(headers, header::IF_UNMODIFIED_SINCE) {
            if modified > since {
                info!(
                    "Precondition failed | path: {:?} | status: {} | remote: {}",
                    path,
                    StatusCode::PRECONDITION_FAILED,
                    remote_addr
                );
                return Err(text_response(
                    StatusCode::PRECONDITION_FAILED,
                    "412 Precondition Failed",
                ));
            }
        }
        if let Some(since) = header_date(headers, header::IF_MODIFIED_SINCE) {
            if modified <= since {
                info!(
                    "Not modified | path: {:?} | status: {} | remote: {}",
                    path,
                    StatusCode::NOT_MODIFIED,
                    remote_addr
                );
                return Ok(finish(
                    Response::builder()
                        .status(StatusCode::NOT_MODIFIED)
                        .header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified)),
                    Body::empty(),
                ));
            }
        }
    }

    let range = headers
        .get(header::RANGE)
        .and_then(|h| h.to_str().ok())
        .filter(|_| if_range_allows(headers, modified))
        .and_then(|h| parse_range_header(h, file_size).map(|r| (h, r)));

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, mime.to_string())
        .header(header::ACCEPT_RANGES, "bytes");
    if let Some(modified) = modified {
        builder = builder.header(header::LAST_MODIFIED, httpdate::fmt_http_date(modified));
    }

    match range {
        Some((range_header, ByteRange::Unsatisfiable)) => {
            error!(
                "Invalid range | range: {} | file_size: {} | status: {} | remote: {}",
                range_header,
                file_size,
                StatusCode::RANGE_NOT_SATISFIABLE,
                remote_addr
            );
            Err(finish(
                Response::builder()
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(header::CONTENT_RANGE, format!("bytes */{}", file_size)),
                Body::empty(),
            ))
        }
        Some((_, ByteRange::Satisfiable { start, end })) => {
            if let Err(err) = file.seek(SeekFrom::Start(start)).await {
                error!(
                    "Seek failed | path: {:?} | error: {} | status: {} | remote: {}",
                    path,
                    err,
                    StatusCode::INTERNAL_SERVER_ERROR,
                    remote_addr
                );
                return Err(text_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "500 Internal Server Error",
                ));
            }
            let chunk_size = end - start + 1;
            let body = Body::wrap_stream(ReaderStream::new(file.take(chunk_size)));
            info!(
                "Partial content | {:?} | range: {}-{} | status: {} | remote: {}",
                path,
                start,
                end,
                StatusCode::PARTIAL_CONTENT,
                remote_addr
            );
            Ok(finish(
                builder
                    .status(StatusCode::PARTIAL_CONTENT)
                    .header(
                        header::CONTENT_RANGE,
                        format!("bytes {}-{}/{}", start, end, file_size),
                    )
                    .header(header::CONTENT_LENGTH, chunk_size.to_string()),
                body,
            ))
        }
        None => {
            let body = Body::wrap_stream(ReaderStream::new(file));
            info!(
                "Full content | path: {:?} | status: {} | remote: {}",
                path,
                StatusCode::OK,
                remote_addr
            );
            Ok(finish(
                builder
                    .status(StatusCode::OK)
                    .header(header::CONTENT_LENGTH, file_size.to_string()),
                body,
            ))
        }
    }
}

pub async fn render_directory_listing(path: &Path, display_path: &str) -> io::Result<String> {
    let mut entries = read_dir(path).await?;
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().await?.is_dir() {
            name.push('/');
        }
        names.push(name);
    }
    names.sort();

    let items: String = names
        .iter()
        .map(|name| {
            format!(
                "<a href=\"{}\">{}</a>\n",
                utf8_percent_encode(name, HREF_SEGMENT),
                encode_text(name)
            )
        })
        .collect();

    let title = encode_text(display_path);
    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width">
<title>Index of {title}</title>
</head>
<body>
<h1>Index of {title}</h1>
<pre>
{items}</pre>
</body>
</html>
"#
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteRange {
    Satisfiable { start: u64, end: u64 },
    Unsatisfiable,
}

/// Parses a single `bytes=` range. `None` means the header should be
/// ignored and the whole file sent.
fn parse_range_header(header: &str, file_size: u64) -> Option<ByteRange> {
    let range = header.strip_prefix("bytes=")?.trim();
    if range.contains(',') {
        return None;
    }
    let (start, end) = range.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        let suffix = end.parse::<u64>().ok()?;
        if suffix == 0 || file_size == 0 {
            return Some(ByteRange::Unsatisfiable);
        }
        let len = suffix.min(file_size);
        return Some(ByteRange::Satisfiable {
            start: file_size - len,
            end: file_size - 1,
        });
    }

    let start = start.parse::<u64>().ok()?;
    let end = match end {
        "" => None,
        e => Some(e.parse::<u64>().ok()?),
    };
    if end.is_some_and(|e| e < start) {
        return None;
    }
    if start >= file_size {
        return Some(ByteRange::Unsatisfiable);
    }
    let end = end.map_or(file_size - 1, |e| e.min(file_size - 1));
    Some(ByteRange::Satisfiable { start, end })
}

/// A range is honoured without `If-Range`, or when `If-Range` carries the
/// file's exact modification date.
fn if_range_allows(headers: &HeaderMap, modified: Option<SystemTime>) -> bool {
    if !headers.contains_key(header::IF_RANGE) {
        return true;
    }
    match (header_date(headers, header::IF_RANGE), modified) {
        (Some(date), Some(modified)) => date == modified,
        _ => false,
    }
}

fn header_date(headers: &HeaderMap, name: header::HeaderName) -> Option<SystemTime> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| httpdate::parse_http_date(v).ok())
}

// HTTP dates have second resolution.
fn truncate_to_secs(time: SystemTime) -> SystemTime {
    match time.duration_since(UNIX_EPOCH) {
        Ok(since) => UNIX_EPOCH + Duration::from_secs(since.as_secs()),
        Err(_) => time,
    }
}

fn last_segment(request_path: &str) -> &str {
    request_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("")
}

fn redirect(location: &str, query: Option<&str>, remote_addr: SocketAddr) -> Response<Body> {
    let location = match query {
        Some(q) => format!("{}?{}", location, q),
        None => location.to_string(),
    };
    info!(
        "Redirect | location: {:?} | status: {} | remote: {}",
        location,
        StatusCode::MOVED_PERMANENTLY,
        remote_addr
    );
    finish(
        Response::builder()
            .status(StatusCode::MOVED_PERMANENTLY)
            .header(header::LOCATION, location),
        Body::empty(),
    )
}

fn io_error_response(path: &Path, err: io::Error, remote_addr: SocketAddr) -> Response<Body> {
    let (status, message) = match err.kind() {
        ErrorKind::NotFound | ErrorKind::NotADirectory => {
            (StatusCode::NOT_FOUND, "404 page not found")
        }
        ErrorKind::PermissionDenied => (StatusCode::FORBIDDEN, "403 Forbidden"),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "500 Internal Server Error",
        ),
    };
    error!(
        "Failed to read | path: {:?} | error: {} | status: {} | remote: {}",
        path, err, status, remote_addr
    );
    text_response(status, message)
}

/// Plain-text error body, newline terminated.
pub(crate) fn text_response(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(format!("{}\n", message)));
    *response.status_mut() = status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response
}

fn finish(builder: Builder, body: Body) -> Response<Body> {
    builder.body(body).unwrap_or_else(|err| {
        error!("Failed to build response | error: {}", err);
        text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "500 Internal Server Error",
        )
    })
}
