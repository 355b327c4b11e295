#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use db::{get_shared_test_connection, get_test_connection, insert_test_user};
pub(crate) use form::{
    assert_form_error_message, assert_form_input, assert_form_select, assert_form_submit_button,
    assert_hx_endpoint, must_get_form,
};
pub(crate) use html::{
    assert_valid_html, must_select_text, parse_html_document, parse_html_fragment,
};
pub(crate) use http::{
    assert_content_type, assert_hx_redirect, assert_status, assert_status_ok, get_header,
    parse_json_body,
};
