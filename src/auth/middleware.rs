//! Guards for the page and htmx routes that require a logged-in user.
//!
//! A request with a valid auth cookie gets the [UserID](crate::UserID) from
//! the cookie inserted as an extension, and the cookie is pushed forward so
//! an active session does not expire. Other requests are sent to the log-in
//! page with a `redirect_url` pointing back at where the user was.

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderValue, StatusCode, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use time::{Duration, UtcOffset};

use crate::{
    AppState,
    auth::{
        cookie::{extend_auth_cookie_duration_if_needed, get_token_from_cookies},
        redirect::{build_log_in_redirect_url, build_log_in_redirect_url_from_target},
    },
    endpoints,
    timezone::get_local_offset,
};

/// How far into the future a valid session is pushed on every authenticated request.
const SESSION_EXTENSION: Duration = Duration::minutes(5);

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The local timezone as a canonical timezone name, e.g. "Asia/Seoul".
    pub local_timezone: String,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            local_timezone: state.local_timezone.clone(),
        }
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// How a rejected request is sent to the log-in page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    /// A plain 303 redirect for full page loads.
    Page,
    /// An `HX-Redirect` header so htmx navigates the whole page instead of
    /// swapping the log-in page into a fragment.
    Htmx,
}

impl Rejection {
    fn respond(self, log_in_url: &str) -> Response {
        match self {
            Rejection::Page => Redirect::to(log_in_url).into_response(),
            Rejection::Htmx => (HxRedirect(log_in_url.to_owned()), StatusCode::OK).into_response(),
        }
    }
}

fn log_in_url_for(request: &Request) -> String {
    build_log_in_redirect_url(request).unwrap_or_else(|| {
        if request.uri().path().starts_with("/api") {
            tracing::warn!("Missing or invalid htmx headers on {}", request.uri().path());
        } else {
            tracing::warn!("Cannot redirect back to {}, using the dashboard", request.uri());
        }

        build_log_in_redirect_url_from_target(endpoints::DASHBOARD_VIEW)
            .unwrap_or_else(|| endpoints::LOG_IN_VIEW.to_owned())
    })
}

/// The `Set-Cookie` headers for the session cookie pushed [SESSION_EXTENSION] ahead.
///
/// If the cookie cannot be extended the request still succeeds and the
/// original cookie is left as it is.
fn refreshed_session_cookies(jar: PrivateCookieJar, local_offset: UtcOffset) -> Vec<HeaderValue> {
    let jar = extend_auth_cookie_duration_if_needed(jar.clone(), SESSION_EXTENSION, local_offset)
        .unwrap_or_else(|error| {
            tracing::error!("Could not extend the session cookie: {error}");
            jar
        });

    jar.into_response()
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .cloned()
        .collect()
}

async fn guard(state: AuthState, request: Request, next: Next, rejection: Rejection) -> Response {
    let log_in_url = log_in_url_for(&request);

    let Some(local_offset) = get_local_offset(&state.local_timezone) else {
        tracing::error!(
            "Unknown timezone {}, sending the user to the log-in page",
            state.local_timezone
        );
        return rejection.respond(&log_in_url);
    };

    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("Could not read the cookie jar: {error:?}");
            return rejection.respond(&log_in_url);
        }
    };
    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(error) => {
            tracing::debug!("Rejected request without a valid auth token: {error}");
            return rejection.respond(&log_in_url);
        }
    };

    parts.extensions.insert(user_id);
    let mut response = next.run(Request::from_parts(parts, body)).await;

    for cookie in refreshed_session_cookies(jar, local_offset) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    response
}

/// Guard for page routes. Requests without a valid auth cookie are
/// redirected to the log-in page.
///
/// Handlers behind the guard can take `Extension(user_id): Extension<UserID>`.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    guard(state, request, next, Rejection::Page).await
}

/// Guard for `/api` routes called by htmx. Requests without a valid auth
/// cookie get an `HX-Redirect` to the log-in page that returns to the page
/// the request came from (`HX-Current-URL`).
///
/// Handlers behind the guard can take `Extension(user_id): Extension<UserID>`.
pub async fn auth_guard_hx(
    State(state): State<AuthState>,
    request: Request,
    next: Next,
) -> Response {
    guard(state, request, next, Rejection::Htmx).await
}
