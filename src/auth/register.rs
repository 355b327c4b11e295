//! The sign-up page and the endpoint that creates new users.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth::{
        DEFAULT_COOKIE_DURATION, PasswordHash, ValidatedPassword, password::MIN_PASSWORD_LENGTH,
        set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    timezone::{get_local_offset, local_now},
    user::{MAX_LOGIN_ID_LENGTH, MAX_PHONE_DIGITS, NewUser, create_user},
};

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// A plain text input with a label and an optional error message underneath.
fn text_input(
    label: &str,
    name: &str,
    type_: &str,
    value: &str,
    required: bool,
    error_message: Option<&str>,
) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            input
                type=(type_)
                name=(name)
                id=(name)
                class=(FORM_TEXT_INPUT_STYLE)
                required[required]
                autofocus[error_message.is_some()]
                value=(value);

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }
    }
}

/// The error messages shown next to the sign-up form fields.
#[derive(Debug, Default, PartialEq)]
struct RegistrationErrors {
    login_id: Option<String>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
}

fn registration_form(form: &RegisterForm, errors: &RegistrationErrors) -> Markup {
    let min_length = MIN_PASSWORD_LENGTH as u8;

    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            (text_input("Login ID", "login_id", "text", &form.login_id, true, errors.login_id.as_deref()))
            (text_input("Name", "name", "text", &form.name, true, errors.name.as_deref()))
            (text_input("Email", "email", "email", &form.email, true, errors.email.as_deref()))
            (text_input("Phone (optional)", "phone", "tel", &form.phone, false, errors.phone.as_deref()))
            (password_input(&form.password, min_length, errors.password.as_deref()))
            (confirm_password_input(min_length, errors.confirm_password.as_deref()))

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Sign up"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the sign-up page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form(&RegisterForm::default(), &Default::default());
    let content = log_in_register("Create your account", &registration_form);
    base("Sign Up", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(
        cookie_secret: &str,
        local_timezone: &str,
        db_connection: Arc<Mutex<Connection>>,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw sign-up form data.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub login_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

/// Check the fields that can be validated without the database.
///
/// Returns the validated password on success so that it only has to be
/// checked by `zxcvbn` once.
fn validate_form(form: &RegisterForm) -> Result<ValidatedPassword, RegistrationErrors> {
    const REQUIRED: &str = "This field is required.";
    let mut errors = RegistrationErrors::default();

    let login_id = form.login_id.trim();
    if login_id.is_empty() {
        errors.login_id = Some(REQUIRED.to_owned());
    } else if login_id.chars().count() > MAX_LOGIN_ID_LENGTH {
        errors.login_id = Some(format!(
            "Login ID must be at most {MAX_LOGIN_ID_LENGTH} characters."
        ));
    }

    if form.name.trim().is_empty() {
        errors.name = Some(REQUIRED.to_owned());
    }

    if form.email.trim().is_empty() {
        errors.email = Some(REQUIRED.to_owned());
    }

    let phone = form.phone.trim();
    if !phone.is_empty()
        && (phone.len() > MAX_PHONE_DIGITS || !phone.chars().all(|c| c.is_ascii_digit()))
    {
        errors.phone = Some(format!(
            "Phone number must be at most {MAX_PHONE_DIGITS} digits."
        ));
    }

    let password = if form.password.is_empty() {
        errors.password = Some(REQUIRED.to_owned());
        None
    } else if form.password != form.confirm_password {
        errors.confirm_password = Some("Passwords do not match.".to_owned());
        None
    } else {
        match ValidatedPassword::new(&form.password) {
            Ok(password) => Some(password),
            Err(error) => {
                errors.password = Some(error.to_string());
                None
            }
        }
    };

    match password {
        Some(password) if errors == RegistrationErrors::default() => Ok(password),
        _ => Err(errors),
    }
}

/// Handler for sign-up requests.
///
/// On success the new user is logged in and redirected to the dashboard.
/// Otherwise the form is returned with the error messages next to the
/// offending fields.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let validated_password = match validate_form(&form) {
        Ok(password) => password,
        Err(errors) => return registration_form(&form, &errors).into_response(),
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let (Some(local_offset), Ok(created_at)) = (
        get_local_offset(&state.local_timezone),
        local_now(&state.local_timezone),
    ) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let phone = form.phone.trim();
    let new_user = NewUser {
        login_id: form.login_id.trim().to_owned(),
        name: form.name.trim().to_owned(),
        email: form.email.trim().to_owned(),
        phone: (!phone.is_empty()).then(|| phone.to_owned()),
        password_hash,
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => create_user(new_user, created_at, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let user = match result {
        Ok(user) => user,
        Err(Error::DuplicateLoginId(_)) => {
            let errors = RegistrationErrors {
                login_id: Some("This login ID is already taken.".to_owned()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(Error::DuplicateEmail(_)) => {
            let errors = RegistrationErrors {
                email: Some("This email is already registered.".to_owned()),
                ..Default::default()
            };
            return registration_form(&form, &errors).into_response();
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while inserting a new user: {error}");
            return get_internal_server_error_redirect();
        }
    };

    tracing::info!("Created user {} ({})", user.login_id, user.id);

    match set_auth_cookie(jar, user.id, state.cookie_duration, local_offset) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            get_internal_server_error_redirect()
        }
    }
}

#[cfg(test)]
mod get_register_page_tests {
    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_status_ok,
            assert_valid_html, must_get_form, must_select_text, parse_html_document,
        },
    };

    use super::get_register_page;

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(must_select_text(&document, "h1"), ["Create your account"]);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::USERS, "hx-post");
        assert_form_input(&form, "login_id", "text");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);

        let links = form
            .select(&scraper::Selector::parse("a[href]").unwrap())
            .collect::<Vec<_>>();
        assert_eq!(links.len(), 1, "want 1 link, got {}", links.len());
        assert_eq!(links[0].value().attr("href"), Some(endpoints::LOG_IN_VIEW));
    }

    #[tokio::test]
    async fn phone_input_is_optional() {
        let response = get_register_page().await;

        let document = parse_html_document(response).await;
        let phone = document
            .select(&scraper::Selector::parse("input[name=phone]").unwrap())
            .next()
            .expect("missing phone input");
        assert_eq!(phone.value().attr("type"), Some("tel"));
        assert_eq!(phone.value().attr("required"), None);
    }
}
