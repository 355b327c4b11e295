//! The confirmation page shown after a transfer.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, UserID,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, LINK_STYLE, base, format_currency},
    navigation::NavBar,
    transfer::{TransferDetail, TransferId, TransferParty, get_transfer},
};

#[derive(Debug, Clone)]
pub struct TransferDetailState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders a transfer the user sent or received.
pub async fn get_transfer_detail_page(
    State(state): State<TransferDetailState>,
    Extension(user_id): Extension<UserID>,
    Path(transfer_id): Path<TransferId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transfer = get_transfer(transfer_id, user_id, &connection)?;

    Ok(transfer_detail_view(&transfer, user_id).into_response())
}

fn party_row(label: &str, party: &TransferParty) -> Markup {
    html! {
        div class="flex justify-between gap-4"
        {
            dt class="text-gray-500 dark:text-gray-400" { (label) }
            dd class="text-right"
            {
                (party.holder_name)
                br;
                span class="text-sm" { (party.bank.name()) " " (party.account_number) }
            }
        }
    }
}

fn transfer_detail_view(transfer: &TransferDetail, user_id: UserID) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFERS_VIEW).into_html();
    let heading = if transfer.is_sent_by(user_id) {
        "Transfer Complete"
    } else {
        "Transfer Received"
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-6"
            {
                h1 class="text-xl font-bold" { (heading) }

                p class="text-3xl font-semibold tabular-nums" data-transfer-amount
                { (format_currency(transfer.amount)) }

                dl class="space-y-3"
                {
                    (party_row("From", &transfer.from))
                    (party_row("To", &transfer.to))

                    @if !transfer.description.is_empty() {
                        div class="flex justify-between gap-4"
                        {
                            dt class="text-gray-500 dark:text-gray-400" { "Memo" }
                            dd { (transfer.description) }
                        }
                    }

                    div class="flex justify-between gap-4"
                    {
                        dt class="text-gray-500 dark:text-gray-400" { "Date" }
                        dd { (transfer.created_at.date()) " " (format!("{:02}:{:02}", transfer.created_at.hour(), transfer.created_at.minute())) }
                    }
                }

                div class="flex gap-4"
                {
                    @if transfer.is_sent_by(user_id) {
                        a href=(format_endpoint(endpoints::ACCOUNT_VIEW, transfer.from.account_id)) class=(LINK_STYLE)
                        { "Back to account" }
                    }
                    a href=(endpoints::TRANSFERS_VIEW) class=(LINK_STYLE) { "Transfer history" }
                }
            }
        }
    };

    base(heading, &[], &content)
}

#[cfg(test)]
mod transfer_detail_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::datetime;

    use crate::{
        Error,
        account::test_utils::insert_test_account,
        test_utils::{
            assert_valid_html, get_test_connection, insert_test_user, must_select_text,
            parse_html_document,
        },
        transfer::{TransferRequest, create_transfer},
    };

    use super::{TransferDetailState, get_transfer_detail_page};

    #[tokio::test]
    async fn shows_transfer_to_both_parties_only() {
        let connection = get_test_connection();
        let sender = insert_test_user("sender", &connection);
        let recipient = insert_test_user("recipient", &connection);
        let stranger = insert_test_user("stranger", &connection);
        let from = insert_test_account(sender.id, "110-1", 5_000.0, &connection);
        insert_test_account(recipient.id, "220-1", 0.0, &connection);
        let transfer = create_transfer(
            sender.id,
            TransferRequest {
                from_account_id: from.id,
                pin: "1234".to_owned(),
                to_account_number: "220-1".to_owned(),
                amount: 1_200.0,
                description: "tickets".to_owned(),
            },
            datetime!(2025-05-01 09:30 +9),
            &connection,
        )
        .unwrap();
        let state = TransferDetailState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_transfer_detail_page(
            State(state.clone()),
            Extension(sender.id),
            Path(transfer.id),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(must_select_text(&html, "h1"), ["Transfer Complete"]);
        assert_eq!(must_select_text(&html, "[data-transfer-amount]"), ["$1,200.00"]);

        let response = get_transfer_detail_page(
            State(state.clone()),
            Extension(recipient.id),
            Path(transfer.id),
        )
        .await
        .unwrap();
        let html = parse_html_document(response).await;
        assert_eq!(must_select_text(&html, "h1"), ["Transfer Received"]);

        let result = get_transfer_detail_page(
            State(state),
            Extension(stranger.id),
            Path(transfer.id),
        )
        .await;
        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
