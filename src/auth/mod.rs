//! Authentication: passwords, the auth cookie, the log-in, log-out and
//! sign-up routes, and the middleware that guards every other route.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{get_register_page, register_user};
pub(crate) use token::Token;

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;

#[cfg(test)]
pub(crate) use middleware::AuthState;
