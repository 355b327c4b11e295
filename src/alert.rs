//! Alert system for displaying success and error messages to users.
//!
//! Alerts are swapped out-of-band into the `#alert-container` element that
//! [crate::html::base] places on every page.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// A message shown to the user after an htmx request.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A success message with extra details.
    #[allow(dead_code)]
    Success { message: String, details: String },
    /// A success message on its own.
    SuccessSimple { message: String },
    /// An error message with details on how to fix it.
    Error { message: String, details: String },
    /// An error message on its own.
    ErrorSimple { message: String },
}

impl Alert {
    pub fn into_markup(self) -> Markup {
        let (is_success, message, details) = match self {
            Alert::Success { message, details } => (true, message, details),
            Alert::SuccessSimple { message } => (true, message, String::new()),
            Alert::Error { message, details } => (false, message, details),
            Alert::ErrorSimple { message } => (false, message, String::new()),
        };

        let container_style = if is_success {
            "flex items-start p-4 mb-4 text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400 border border-green-300 dark:border-green-800"
        } else {
            "flex items-start p-4 mb-4 text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400 border border-red-300 dark:border-red-800"
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert" data-alert-kind=(if is_success { "success" } else { "error" })
                {
                    div class="ms-1 text-sm"
                    {
                        p class="font-semibold" { (message) }

                        @if !details.is_empty() {
                            p class="mt-1" { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 inline-flex items-center justify-center h-8 w-8"
                        aria-label="Dismiss"
                        onclick="this.closest('#alert-container').classList.add('hidden')"
                    {
                        "✕"
                    }
                }
            }
        }
    }

    pub fn into_html(self) -> Html<String> {
        Html(self.into_markup().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}
