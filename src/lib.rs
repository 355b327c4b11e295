//! A household ledger web app for tracking cash, bank accounts, transfers and
//! stock holdings.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod account_ledger;
mod alert;
mod app_state;
mod auth;
mod book;
mod cash;
mod category;
mod dashboard;
mod db;
mod demo_data;
mod endpoints;
mod error;
mod export;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod period;
mod routing;
mod stock;
mod timezone;
mod transfer;
pub mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use demo_data::{DEMO_PIN, insert_demo_data};
pub use error::Error;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use user::{User, UserID, get_user_by_id};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
