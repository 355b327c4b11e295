//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes, to_bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Form fields whose values must never reach the logs.
const REDACTED_FIELDS: [&str; 6] = [
    "password",
    "confirm_password",
    "pin",
    "current_pin",
    "new_pin",
    "confirm_pin",
];

/// The maximum number of bytes of a body that is logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is truncated
/// and the full body is logged at the `debug` level.
///
/// Bodies are passed on byte for byte. Only the logged copy is decoded.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };
    log_request(&parts, &loggable_body(&parts.headers, &bytes));

    let response = next.run(Request::from_parts(parts, Body::from(bytes))).await;

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            Bytes::new()
        }
    };
    log_response(&parts, &String::from_utf8_lossy(&bytes));

    Response::from_parts(parts, Body::from(bytes))
}

/// The text of a body as it may appear in the logs.
///
/// URL encoded forms have their secret fields redacted, whatever the method.
fn loggable_body(headers: &HeaderMap, bytes: &Bytes) -> String {
    let text = String::from_utf8_lossy(bytes).into_owned();

    let is_form = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        REDACTED_FIELDS
            .iter()
            .fold(text, |text, field| redact_field(&text, field))
    } else {
        text
    }
}

/// Replace the value of every `field_name=...` pair in a URL encoded form.
fn redact_field(form_text: &str, field_name: &str) -> String {
    form_text
        .split('&')
        .map(|pair| match pair.split_once('=') {
            Some((key, _)) if key == field_name => format!("{key}=********"),
            _ => pair.to_owned(),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn truncate(body: &str) -> &str {
    let mut end = LOG_BODY_LENGTH_LIMIT.min(body.len());

    while !body.is_char_boundary(end) {
        end -= 1;
    }

    &body[..end]
}

fn log_request(headers: &axum::http::request::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Received request: {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full request body: {body:?}");
    } else {
        tracing::info!("Received request: {headers:#?}\nbody: {body:?}");
    }
}

fn log_response(headers: &axum::http::response::Parts, body: &str) {
    if body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::info!(
            "Sending response: {headers:#?}\nbody: {:}...",
            truncate(body)
        );
        tracing::debug!("Full response body: {body:?}");
    } else {
        tracing::info!("Sending response: {headers:#?}\nbody: {body:?}");
    }
}


#[cfg(test)]
mod middleware_tests {
    use std::{
        io,
        sync::{Arc, Mutex},
    };

    use axum::{
        Router,
        body::Bytes,
        middleware,
        routing::{get, put},
    };
    use axum_test::TestServer;

    use super::logging_middleware;

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl CapturedLog {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    const FONT_BYTES: &[u8] = &[0x77, 0x4f, 0x46, 0x32, 0xff, 0x00, 0xfe, 0x80];

    async fn echo(body: Bytes) -> Bytes {
        body
    }

    async fn change_pin() -> &'static str {
        "PIN changed"
    }

    async fn font() -> Bytes {
        Bytes::from_static(FONT_BYTES)
    }

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route("/api/accounts/{account_id}/pin", put(change_pin))
            .route("/static/font.woff2", get(font))
            .route("/echo", put(echo))
            .layer(middleware::from_fn(logging_middleware));

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn pin_change_is_redacted_in_logs() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);
        let server = get_test_server();

        let response = server
            .put("/api/accounts/1/pin")
            .form(&[
                ("current_pin", "1234"),
                ("new_pin", "9876"),
                ("confirm_pin", "9876"),
            ])
            .await;

        response.assert_status_ok();
        let text = log.text();
        assert!(text.contains("current_pin=********"), "{text}");
        for secret in ["current_pin=1234", "new_pin=9876", "confirm_pin=9876"] {
            assert!(!text.contains(secret), "{secret} leaked into the log");
        }
        assert!(text.contains("Received request"), "{text}");
    }

    #[tokio::test]
    async fn binary_response_is_forwarded_unchanged() {
        let server = get_test_server();

        let response = server.get("/static/font.woff2").await;

        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), FONT_BYTES);
    }

    #[tokio::test]
    async fn binary_request_is_forwarded_unchanged() {
        let server = get_test_server();

        let response = server.put("/echo").bytes(Bytes::from_static(FONT_BYTES)).await;

        assert_eq!(response.as_bytes().as_ref(), FONT_BYTES);
    }
}
