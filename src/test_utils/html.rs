use axum::{body::Body, response::Response};
use scraper::Html;

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    String::from_utf8(bytes.to_vec()).expect("Response body is not UTF-8")
}

/// Parse a full page, e.g. from a `GET` on a view endpoint.
pub(crate) async fn parse_html_document(response: Response<Body>) -> Html {
    Html::parse_document(&body_text(response).await)
}

/// Parse the partial HTML that htmx swaps into a page.
pub(crate) async fn parse_html_fragment(response: Response<Body>) -> Html {
    Html::parse_fragment(&body_text(response).await)
}

#[track_caller]
pub(crate) fn assert_valid_html(html: &Html) {
    if let Some(first_error) = html.errors.first() {
        panic!("{} HTML parse error(s), first: {first_error}", html.errors.len());
    }
}

/// Get the trimmed text of every element matching `selector`.
#[track_caller]
pub(crate) fn must_select_text(html: &Html, selector: &str) -> Vec<String> {
    let parsed = scraper::Selector::parse(selector)
        .unwrap_or_else(|error| panic!("Invalid selector {selector}: {error:?}"));

    html.select(&parsed)
        .map(|element| element.text().collect::<String>().trim().to_owned())
        .collect()
}
