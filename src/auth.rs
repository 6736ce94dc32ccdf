use base64::{Engine as _, engine::general_purpose};
use hyper::header::{self, HeaderValue};
use hyper::{Body, Request, Response, StatusCode};
use log::warn;
use std::net::SocketAddr;

use crate::handler::{Handler, text_response};

/// Requires HTTP Basic credentials carrying `password` before handing the
/// request to `inner`. The username is not checked.
#[derive(Debug, Clone)]
pub struct BasicAuth<H> {
    password: String,
    inner: H,
}

impl<H: Handler> BasicAuth<H> {
    pub fn new(password: impl Into<String>, inner: H) -> Self {
        BasicAuth {
            password: password.into(),
            inner,
        }
    }
}

impl<H: Handler> Handler for BasicAuth<H> {
    async fn handle(&self, req: Request<Body>, remote_addr: SocketAddr) -> Response<Body> {
        match basic_credentials(&req) {
            Some((_, password)) if password == self.password => {
                self.inner.handle(req, remote_addr).await
            }
            Some((username, _)) => {
                warn!(
                    "Auth failed | method: {} | uri: {} | user: {:?} | status: {} | remote: {}",
                    req.method(),
                    req.uri(),
                    username,
                    StatusCode::UNAUTHORIZED,
                    remote_addr
                );
                unauthorized_response()
            }
            None => {
                warn!(
                    "Missing or malformed Authorization header | method: {} | uri: {} | status: {} | remote: {}",
                    req.method(),
                    req.uri(),
                    StatusCode::UNAUTHORIZED,
                    remote_addr
                );
                unauthorized_response()
            }
        }
    }
}

/// Username and password from an `Authorization: Basic ...` header.
pub fn basic_credentials<B>(req: &Request<B>) -> Option<(String, String)> {
    let auth_str = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = auth_str.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Basic") {
        return None;
    }
    let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn unauthorized_response() -> Response<Body> {
    let mut response = text_response(StatusCode::UNAUTHORIZED, "Unauthorized");
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(r#"Basic realm="servefolder""#),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts how often it was reached and answers 200.
    #[derive(Clone, Default)]
    struct Recorder {
        hits: Arc<AtomicUsize>,
    }

    impl Handler for Recorder {
        async fn handle(&self, _req: Request<Body>, _remote_addr: SocketAddr) -> Response<Body> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Response::new(Body::from("file content"))
        }
    }

    fn remote() -> SocketAddr {
        "10.0.0.2:41000".parse().unwrap()
    }

    fn request(authorization: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/file.txt");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn basic(user_pass: &str) -> String {
        format!("Basic {}", general_purpose::STANDARD.encode(user_pass))
    }

    fn gate() -> (BasicAuth<Recorder>, Arc<AtomicUsize>) {
        let inner = Recorder::default();
        let hits = Arc::clone(&inner.hits);
        (BasicAuth::new("secret", inner), hits)
    }

    async fn assert_rejected(response: Response<Body>) {
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            r#"Basic realm="servefolder""#
        );
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"Unauthorized\n");
    }

    #[tokio::test]
    async fn correct_password_with_any_username_passes() {
        let (gate, hits) = gate();
        for user in ["alice", "bob", ""] {
            let auth = basic(&format!("{}:secret", user));
            let response = gate.handle(request(Some(&auth)), remote()).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
            assert_eq!(&body[..], b"file content");
        }
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let (gate, hits) = gate();
        let auth = basic("alice:wrong");
        assert_rejected(gate.handle(request(Some(&auth)), remote()).await).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let (gate, hits) = gate();
        assert_rejected(gate.handle(request(None), remote()).await).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_headers_are_rejected() {
        let (gate, hits) = gate();
        let no_colon = basic("secret");
        let bearer = format!("Bearer {}", general_purpose::STANDARD.encode("a:secret"));
        for value in ["Basic", "Basic !!!not-base64!!!", no_colon.as_str(), bearer.as_str()] {
            assert_rejected(gate.handle(request(Some(value)), remote()).await).await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn password_must_match_exactly() {
        let (gate, hits) = gate();
        for candidate in ["a:Secret", "a:secret ", "a:secre"] {
            let auth = basic(candidate);
            assert_rejected(gate.handle(request(Some(&auth)), remote()).await).await;
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let value = format!("basic {}", general_purpose::STANDARD.encode("u:p:with:colons"));
        let req = request(Some(&value));
        assert_eq!(
            basic_credentials(&req),
            Some(("u".to_string(), "p:with:colons".to_string()))
        );
    }
}
