//! Where to send a user after they log in.
//!
//! Targets are always reduced to a same-origin path and query so the log-in
//! page cannot be used as an open redirect.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Where a candidate URL came from, which decides whether a scheme and host
/// are acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// Query strings and form fields, which must be relative.
    UserInput,
    /// The `HX-Current-URL` header, which htmx sets to the full page URL.
    HtmxHeader,
}

fn safe_target(raw_url: &str, origin: Origin) -> Option<String> {
    let uri = raw_url.parse::<Uri>().ok()?;
    if origin == Origin::UserInput && (uri.scheme().is_some() || uri.authority().is_some()) {
        return None;
    }

    let target = uri.path_and_query()?.as_str();
    let is_local_path =
        target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\");

    (is_local_path && uri.path() != endpoints::LOG_IN_VIEW).then(|| target.to_owned())
}

/// The path and query of `raw_url` if it is a safe place to send the user.
pub fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    safe_target(raw_url, Origin::UserInput)
}

/// The log-in page URL that returns the user to where they were.
///
/// Page requests return to the requested URI. htmx requests to `/api` routes
/// return to the page the request was sent from.
pub fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let target = if request.uri().path().starts_with("/api") {
        htmx_page_url(request)?
    } else {
        safe_target(request.uri().path_and_query()?.as_str(), Origin::UserInput)?
    };

    build_log_in_redirect_url_from_target(&target)
}

pub(super) fn build_log_in_redirect_url_from_target(target: &str) -> Option<String> {
    serde_urlencoded::to_string([("redirect_url", target)])
        .inspect_err(|error| tracing::error!("could not encode redirect URL {target}: {error}"))
        .ok()
        .map(|query| format!("{}?{query}", endpoints::LOG_IN_VIEW))
}

fn htmx_page_url(request: &Request) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    if !header("hx-request").is_some_and(|value| value.eq_ignore_ascii_case("true")) {
        tracing::warn!("/api request without HX-Request header");
        return None;
    }

    let Some(current_url) = header("hx-current-url") else {
        tracing::warn!("/api request without HX-Current-URL header");
        return None;
    };

    let target = safe_target(current_url, Origin::HtmxHeader);
    if target.is_none() {
        tracing::warn!("unusable HX-Current-URL: {current_url}");
    }

    target
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request};

    use crate::endpoints;

    use super::{build_log_in_redirect_url, normalize_redirect_url};

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
        headers
            .iter()
            .fold(Request::builder().uri(uri), |builder, (name, value)| {
                builder.header(*name, *value)
            })
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn keeps_relative_path_and_query() {
        assert_eq!(
            normalize_redirect_url("/book?year=2025&month=3"),
            Some("/book?year=2025&month=3".to_owned())
        );
    }

    #[test]
    fn rejects_urls_that_leave_the_site() {
        for url in [
            "https://evil.example.com/",
            "//evil.example.com/",
            "/\\evil.example.com",
            "dashboard",
        ] {
            assert_eq!(normalize_redirect_url(url), None, "{url}");
        }
    }

    #[test]
    fn never_returns_to_log_in_page() {
        assert_eq!(normalize_redirect_url(endpoints::LOG_IN_VIEW), None);
        assert_eq!(
            normalize_redirect_url("/log_in?redirect_url=%2Fbook"),
            None
        );
    }

    #[test]
    fn page_request_returns_to_page() {
        assert_eq!(
            build_log_in_redirect_url(&request("/accounts/3", &[])),
            Some("/log_in?redirect_url=%2Faccounts%2F3".to_owned())
        );
    }

    #[test]
    fn htmx_request_returns_to_current_page() {
        let request = request(
            endpoints::CASH_API,
            &[
                ("HX-Request", "true"),
                ("HX-Current-URL", "http://localhost:3000/transfers?account=2"),
            ],
        );

        assert_eq!(
            build_log_in_redirect_url(&request),
            Some("/log_in?redirect_url=%2Ftransfers%3Faccount%3D2".to_owned())
        );
    }

    #[test]
    fn api_request_without_htmx_headers_has_no_target() {
        assert_eq!(build_log_in_redirect_url(&request(endpoints::CASH_API, &[])), None);
        assert_eq!(
            build_log_in_redirect_url(&request(endpoints::CASH_API, &[("HX-Request", "true")])),
            None
        );
    }
}
