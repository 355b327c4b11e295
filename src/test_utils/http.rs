use axum::{body::Body, http::StatusCode, response::Response};

#[track_caller]
pub(crate) fn assert_status(response: &Response<Body>, status: StatusCode) {
    assert_eq!(
        response.status(),
        status,
        "unexpected status, headers: {:?}",
        response.headers()
    );
}

#[track_caller]
pub(crate) fn assert_status_ok(response: &Response<Body>) {
    assert_status(response, StatusCode::OK);
}

/// The value of `header_name`, panicking if it is missing or not ASCII.
#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    match response.headers().get(header_name) {
        Some(value) => value
            .to_str()
            .unwrap_or_else(|error| panic!("Header {header_name} is not ASCII: {error}"))
            .to_owned(),
        None => panic!("Headers missing {header_name}"),
    }
}

#[track_caller]
pub(crate) fn assert_content_type(response: &Response<Body>, content_type: &str) {
    assert_eq!(get_header(response, "content-type"), content_type);
}

/// Assert that htmx is told to navigate to `endpoint`.
#[track_caller]
pub(crate) fn assert_hx_redirect(response: &Response<Body>, endpoint: &str) {
    assert_eq!(get_header(response, "hx-redirect"), endpoint);
}

pub(crate) async fn parse_json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&bytes).expect("Response body is not valid JSON")
}
