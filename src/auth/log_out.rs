//! Ends the session.

use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::PrivateCookieJar;

use crate::{auth::invalidate_auth_cookie, endpoints};

/// Overwrite the auth cookie with an expired one and send the user to the
/// log-in page. Works whether or not the user was logged in.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    tracing::debug!("Session ended by the user");

    (
        invalidate_auth_cookie(jar),
        Redirect::to(endpoints::LOG_IN_VIEW),
    )
        .into_response()
}

#[cfg(test)]
mod log_out_tests {
    use axum::{Router, http::header::SET_COOKIE, response::IntoResponse, routing::get};
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use axum_test::TestServer;
    use sha2::{Digest, Sha512};
    use time::{Duration, OffsetDateTime, UtcOffset};

    use crate::{
        UserID,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie},
        endpoints,
    };

    use super::get_log_out;

    fn get_test_server() -> TestServer {
        let key = Key::from(&Sha512::digest("log out key"));
        let app = Router::new()
            .route(endpoints::LOG_OUT, get(get_log_out))
            .with_state(key);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn expires_auth_cookie_and_redirects_to_log_in() {
        let jar = set_auth_cookie(
            PrivateCookieJar::new(Key::from(&Sha512::digest("log out key"))),
            UserID::new(5),
            DEFAULT_COOKIE_DURATION,
            UtcOffset::UTC,
        )
        .unwrap();
        let set_cookie = jar.into_response().headers()[SET_COOKIE]
            .to_str()
            .unwrap()
            .to_owned();
        let token = Cookie::parse(set_cookie).unwrap();
        let server = get_test_server();

        let response = server.get(endpoints::LOG_OUT).add_cookie(token).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
        let cookie = response.cookie(COOKIE_TOKEN);
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }

    #[tokio::test]
    async fn log_out_without_session_still_redirects() {
        let server = get_test_server();

        let response = server.get(endpoints::LOG_OUT).await;

        response.assert_status_see_other();
        assert_eq!(response.header("location"), endpoints::LOG_IN_VIEW);
    }
}
