//! The log-in page and the endpoint its form posts to.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Query, State},
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
    AppState, Error, UserID,
    auth::{invalidate_auth_cookie, redirect::normalize_redirect_url, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner,
        log_in_register, password_input,
    },
    timezone::get_local_offset,
    user::get_user_by_login_id,
};

fn log_in_form(login_id: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#login_id, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            div
            {
                label for="login_id" class=(FORM_LABEL_STYLE) { "Login ID" }

                input
                    type="text"
                    name="login_id"
                    id="login_id"
                    autocomplete="username"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    autofocus
                    value=(login_id);
            }

            (password_input("", 0, error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Sign up here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    let redirect_url = raw_url.and_then(normalize_redirect_url);

    if let (None, Some(raw_url)) = (&redirect_url, raw_url) {
        tracing::warn!("Invalid redirect URL from {source}: {raw_url}");
    }

    redirect_url
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = log_in_register("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// How long the auth cookie lasts when "remember me" is ticked.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect login ID or password.";
const INTERNAL_ERROR_MSG: &str = "An internal error occurred. Please try again later.";

/// The state needed to log a user in.
#[derive(Debug, Clone)]
pub struct LoginState {
    pub cookie_key: Key,
    /// How long the auth cookie lasts without "remember me".
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// Why a log-in attempt did not produce a session.
#[derive(Debug, PartialEq)]
enum LogInFailure {
    /// Unknown login ID or wrong password. The two are not told apart.
    BadCredentials,
    /// Something on our side went wrong and has been logged.
    Internal,
}

impl LogInFailure {
    fn message(&self) -> &'static str {
        match self {
            LogInFailure::BadCredentials => INVALID_CREDENTIALS_ERROR_MSG,
            LogInFailure::Internal => INTERNAL_ERROR_MSG,
        }
    }
}

/// Check `password` against the stored hash for `login_id`.
fn authenticate(
    login_id: &str,
    password: &str,
    db_connection: &Mutex<Connection>,
) -> Result<UserID, LogInFailure> {
    let user = {
        let connection = db_connection.lock().map_err(|error| {
            tracing::error!("could not acquire database lock: {error}");
            LogInFailure::Internal
        })?;

        get_user_by_login_id(login_id, &connection).map_err(|error| match error {
            Error::NotFound => LogInFailure::BadCredentials,
            error => {
                tracing::error!("could not load user {login_id}: {error}");
                LogInFailure::Internal
            }
        })?
    };

    match user.password_hash.verify(password) {
        Ok(true) => Ok(user.id),
        Ok(false) => Err(LogInFailure::BadCredentials),
        Err(error) => {
            tracing::error!("could not verify password for {login_id}: {error}");
            Err(LogInFailure::Internal)
        }
    }
}

/// Handler for log-in form submissions.
///
/// A correct login ID and password sets the auth cookie and sends htmx to
/// `redirect_url`, or the dashboard if there is no safe one. Otherwise the
/// form comes back with the login ID kept and an error message.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(log_in): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(log_in.redirect_url.as_deref(), "log-in form");
    let login_id = log_in.login_id.trim();

    let user_id = match authenticate(login_id, &log_in.password, &state.db_connection) {
        Ok(user_id) => user_id,
        Err(failure) => {
            return log_in_form(login_id, Some(failure.message()), redirect_url.as_deref())
                .into_response();
        }
    };

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let cookie_duration = match log_in.remember_me {
        Some(_) => REMEMBER_ME_COOKIE_DURATION,
        None => state.cookie_duration,
    };

    match set_auth_cookie(jar.clone(), user_id, cookie_duration, local_offset) {
        Ok(jar) => {
            tracing::info!("user {user_id} logged in");
            let target = redirect_url.unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

            (StatusCode::SEE_OTHER, HxRedirect(target), jar).into_response()
        }
        Err(error) => {
            tracing::error!("could not set auth cookie: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// The log-in form as submitted. The password is only compared against the
/// stored hash, so it is not validated.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    pub login_id: String,
    pub password: String,
    /// Present, with any value, when the checkbox is ticked.
    pub remember_me: Option<String>,
    pub redirect_url: Option<String>,
}


#[cfg(test)]
mod log_in_tests {
    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::{TestResponse, TestServer};
    use scraper::Html;
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        PasswordHash, ValidatedPassword,
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        endpoints,
        test_utils::{get_shared_test_connection, must_select_text},
        user::{NewUser, create_user},
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInFailure, LoginState, REMEMBER_ME_COOKIE_DURATION,
        authenticate, post_log_in,
    };

    fn get_test_state() -> LoginState {
        let db_connection = get_shared_test_connection();
        create_user(
            NewUser {
                login_id: "jisoo".to_owned(),
                name: "Kim Jisoo".to_owned(),
                email: "jisoo@example.com".to_owned(),
                phone: Some("01012345678".to_owned()),
                password_hash: PasswordHash::new(ValidatedPassword::new_unchecked("hunter2"), 4)
                    .unwrap(),
            },
            datetime!(2025-01-01 09:00 +9),
            &db_connection.lock().unwrap(),
        )
        .unwrap();

        LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: "Asia/Seoul".to_owned(),
            db_connection,
        }
    }

    fn get_test_server() -> TestServer {
        let app = Router::new()
            .route(endpoints::LOG_IN_API, post(post_log_in))
            .with_state(get_test_state());

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[track_caller]
    fn assert_close_to(got: OffsetDateTime, want: OffsetDateTime) {
        assert!(
            (got - want).abs() < Duration::seconds(2),
            "got {got:?}, want {want:?}"
        );
    }

    #[track_caller]
    fn assert_form_error(response: &TestResponse, message: &str) {
        response.assert_status_ok();
        let fragment = Html::parse_fragment(&response.text());

        assert_eq!(must_select_text(&fragment, "p.text-red-500"), [message]);
    }

    #[test]
    fn authenticate_does_not_reveal_which_part_was_wrong() {
        let state = get_test_state();

        assert!(authenticate("jisoo", "hunter2", &state.db_connection).is_ok());
        assert_eq!(
            authenticate("jisoo", "hunter3", &state.db_connection),
            Err(LogInFailure::BadCredentials)
        );
        assert_eq!(
            authenticate("rose", "hunter2", &state.db_connection),
            Err(LogInFailure::BadCredentials)
        );
    }

    #[tokio::test]
    async fn correct_credentials_set_cookie_and_go_to_dashboard() {
        let response = get_test_server()
            .post(endpoints::LOG_IN_API)
            .form(&[("login_id", "jisoo"), ("password", "hunter2")])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
        assert_close_to(
            response.cookie(COOKIE_TOKEN).expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION,
        );
    }

    #[tokio::test]
    async fn login_id_is_trimmed() {
        let response = get_test_server()
            .post(endpoints::LOG_IN_API)
            .form(&[("login_id", "  jisoo "), ("password", "hunter2")])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    async fn returns_to_requested_page() {
        let response = get_test_server()
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("login_id", "jisoo"),
                ("password", "hunter2"),
                ("redirect_url", "/book?year=2025&month=10"),
            ])
            .await;

        assert_eq!(response.header("hx-redirect"), "/book?year=2025&month=10");
    }

    #[tokio::test]
    async fn ignores_external_redirect_url() {
        let response = get_test_server()
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("login_id", "jisoo"),
                ("password", "hunter2"),
                ("redirect_url", "https://example.com/phish"),
            ])
            .await;

        assert_eq!(response.header("hx-redirect"), endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn wrong_password_shows_error_and_keeps_login_id() {
        let response = get_test_server()
            .post(endpoints::LOG_IN_API)
            .form(&[("login_id", "jisoo"), ("password", "wrongpassword")])
            .await;

        assert_form_error(&response, INVALID_CREDENTIALS_ERROR_MSG);
        let fragment = Html::parse_fragment(&response.text());
        let login_id = fragment
            .select(&scraper::Selector::parse("input[name=login_id]").unwrap())
            .next()
            .and_then(|input| input.value().attr("value"));
        assert_eq!(login_id, Some("jisoo"));
        assert!(response.maybe_cookie(COOKIE_TOKEN).is_none());
    }

    #[tokio::test]
    async fn unknown_login_id_shows_same_error() {
        let response = get_test_server()
            .post(endpoints::LOG_IN_API)
            .form(&[("login_id", "rose"), ("password", "hunter2")])
            .await;

        assert_form_error(&response, INVALID_CREDENTIALS_ERROR_MSG);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        get_test_server()
            .post(endpoints::LOG_IN_API)
            .content_type("application/x-www-form-urlencoded")
            .await
            .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn remember_me_keeps_session_for_a_week() {
        let response = get_test_server()
            .post(endpoints::LOG_IN_API)
            .form(&[
                ("login_id", "jisoo"),
                ("password", "hunter2"),
                ("remember_me", "on"),
            ])
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        assert_close_to(
            response.cookie(COOKIE_TOKEN).expires_datetime().unwrap(),
            OffsetDateTime::now_utc() + REMEMBER_ME_COOKIE_DURATION,
        );
    }
}
