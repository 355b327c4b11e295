//! Defines the route handler for the page for opening a bank account.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    account::Bank,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE,
        FORM_TEXT_INPUT_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
};

/// A four digit PIN input.
pub(crate) fn pin_input(id: &str, label: &str) -> Markup {
    html! {
        div
        {
            label for=(id) class=(FORM_LABEL_STYLE) { (label) }

            input
                id=(id)
                type="password"
                name=(id)
                inputmode="numeric"
                pattern="[0-9]{4}"
                minlength="4"
                maxlength="4"
                autocomplete="off"
                required
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn create_account_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();

    let form = html! {
        form
            hx-post=(endpoints::ACCOUNTS_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label for="bank" class=(FORM_LABEL_STYLE) { "Bank" }

                select id="bank" name="bank" required class=(FORM_SELECT_STYLE)
                {
                    @for bank in Bank::ALL {
                        option value=(bank.as_str()) { (bank.name()) }
                    }
                }
            }

            div
            {
                label for="number" class=(FORM_LABEL_STYLE) { "Account Number" }

                input
                    id="number"
                    type="text"
                    name="number"
                    placeholder="110-123-456789"
                    pattern="[0-9][0-9\\-]*[0-9]|[0-9]"
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (pin_input("pin", "PIN"))
            (pin_input("confirm_pin", "Confirm PIN"))

            div
            {
                label for="initial_balance" class=(FORM_LABEL_STYLE) { "Initial Deposit" }

                input
                    id="initial_balance"
                    type="number"
                    name="initial_balance"
                    min="0"
                    step="0.01"
                    value="0"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span id="indicator" class="inline htmx-indicator" { (loading_spinner()) }
                " Open Account"
            }
        }
    };

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="w-full space-y-4"
            {
                h1 class="text-xl font-bold" { "Open Account" }
                (form)
            }
        }
    };

    base("Open Account", &[], &content)
}

/// Renders the page for opening a bank account.
pub async fn get_create_account_page() -> Response {
    create_account_view().into_response()
}
