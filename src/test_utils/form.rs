use scraper::{ElementRef, Html, Selector};

#[track_caller]
fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|error| panic!("Invalid selector {css}: {error:?}"))
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}

/// The first form on the page.
#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&selector("form"))
        .next()
        .expect("No form found")
}

/// Assert that `form` sends its request to `endpoint` via the htmx
/// `attribute`, e.g. `hx-post` or `hx-put`.
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let got = form.value().attr(attribute);

    assert_eq!(
        got,
        Some(endpoint),
        "want form with {attribute}=\"{endpoint}\""
    );
}

/// Assert that `form` has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let input = form
        .select(&selector(&format!("input[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""));

    assert_eq!(
        input.value().attr("type").unwrap_or_default(),
        type_,
        "type of input {name}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input {name} to be required"
    );
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let button = form
        .select(&selector("button"))
        .next()
        .expect("No button found");

    assert_eq!(button.value().attr("type"), Some("submit"));
}

/// Assert that the first paragraph in `form` is `want_error_message`.
#[track_caller]
pub(crate) fn assert_form_error_message(form: &ElementRef<'_>, want_error_message: &str) {
    let paragraph = form
        .select(&selector("p"))
        .next()
        .expect("No error message found");

    assert_eq!(trimmed_text(paragraph), want_error_message);
}

/// Assert the option labels of the select called `name`, in order.
#[track_caller]
pub(crate) fn assert_form_select(form: &ElementRef<'_>, name: &str, want_options: &[&str]) {
    let select = form
        .select(&selector(&format!("select[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));

    let got_options: Vec<String> = select.select(&selector("option")).map(trimmed_text).collect();

    assert_eq!(got_options, want_options, "options for select {name}");
}
