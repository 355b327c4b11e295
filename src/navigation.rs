//! The navigation bar: a row of links at the top on large screens, and a
//! bottom bar with a "More" menu on small screens.

use maud::{Markup, html};

use crate::endpoints;

/// Where a link goes in the small-screen bottom bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// A slot of its own.
    BottomBar,
    /// Inside the "More" menu.
    MoreMenu,
}

#[derive(Debug, Clone, Copy)]
struct NavLink {
    url: &'static str,
    title: &'static str,
    placement: Placement,
    is_current: bool,
}

const NAV_LINKS: [(&str, &str, Placement); 8] = [
    (endpoints::DASHBOARD_VIEW, "Dashboard", Placement::BottomBar),
    (endpoints::BOOK_VIEW, "Account Book", Placement::BottomBar),
    (endpoints::ACCOUNTS_VIEW, "Accounts", Placement::BottomBar),
    (endpoints::TRANSFERS_VIEW, "Transfers", Placement::MoreMenu),
    (endpoints::STOCKS_VIEW, "Stocks", Placement::MoreMenu),
    (endpoints::CATEGORIES_VIEW, "Categories", Placement::MoreMenu),
    (endpoints::EXPORT_STATEMENT_VIEW, "Export", Placement::MoreMenu),
    (endpoints::LOG_OUT, "Log out", Placement::MoreMenu),
];

const TOP_LINK_CURRENT: &str = "block py-2 px-3 text-white bg-blue-700 rounded-sm \
    lg:bg-transparent lg:text-blue-700 lg:p-0 dark:text-white lg:dark:text-blue-500";
const TOP_LINK: &str = "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100 \
    lg:hover:bg-transparent lg:border-0 lg:hover:text-blue-700 lg:p-0 dark:text-white \
    lg:dark:hover:text-blue-500 dark:hover:bg-gray-700 dark:hover:text-white \
    lg:dark:hover:bg-transparent";

const BOTTOM_ITEM_BASE: &str = "flex w-full min-w-0 items-center justify-center rounded-lg \
    px-2.5 py-2 text-xs font-semibold leading-tight sm:px-4 sm:text-sm";
const BOTTOM_ITEM_CURRENT: &str =
    "bg-blue-50 text-blue-700 shadow-sm dark:bg-blue-900/30 dark:text-blue-200";
const BOTTOM_ITEM: &str = "text-gray-600 hover:bg-blue-50/70 hover:text-blue-700 \
    dark:text-gray-300 dark:hover:bg-blue-900/20 dark:hover:text-blue-200";

const MENU_ITEM_CURRENT: &str =
    "block rounded-lg bg-blue-50 px-3 py-2 text-blue-700 dark:bg-blue-900/30 dark:text-blue-200";
const MENU_ITEM: &str = "block rounded-lg px-3 py-2 text-gray-700 hover:bg-gray-100 \
    hover:text-blue-700 dark:text-gray-200 dark:hover:bg-gray-800/80 dark:hover:text-blue-200";

fn bottom_item_class(is_current: bool) -> String {
    let state = if is_current {
        BOTTOM_ITEM_CURRENT
    } else {
        BOTTOM_ITEM
    };

    format!("{BOTTOM_ITEM_BASE} {state}")
}

fn aria_current(is_current: bool) -> Option<&'static str> {
    is_current.then_some("page")
}

/// The navigation bar with the link for the current page highlighted.
pub struct NavBar {
    links: Vec<NavLink>,
}

impl NavBar {
    /// Build the navigation bar, highlighting the link whose URL is
    /// `active_endpoint`. Pages without their own link, such as the new
    /// account form, highlight nothing.
    pub fn new(active_endpoint: &str) -> NavBar {
        let links = NAV_LINKS
            .iter()
            .map(|&(url, title, placement)| NavLink {
                url,
                title,
                placement,
                is_current: url == active_endpoint,
            })
            .collect();

        NavBar { links }
    }

    fn in_placement(&self, placement: Placement) -> impl Iterator<Item = &NavLink> {
        self.links
            .iter()
            .filter(move |link| link.placement == placement)
    }

    pub fn into_html(self) -> Markup {
        let more_is_current = self
            .in_placement(Placement::MoreMenu)
            .any(|link| link.is_current);

        // Layout from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900" {
                div class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4" {
                    a href=(endpoints::ROOT) class="flex items-center space-x-3 rtl:space-x-reverse" {
                        img src="/static/favicon-128x128.png" alt="Household Ledger Logo" class="h-8";
                        span class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white" {
                            "Household Ledger"
                        }
                    }

                    div class="hidden w-full lg:block lg:w-auto" {
                        ul class="font-medium flex flex-col p-4 lg:p-0 mt-4 border border-gray-100
                            rounded bg-gray-50 lg:flex-row lg:space-x-8 rtl:space-x-reverse lg:mt-0
                            lg:border-0 lg:bg-white dark:bg-gray-800 lg:dark:bg-gray-900
                            dark:border-gray-700"
                        {
                            @for link in &self.links {
                                li {
                                    a
                                        href=(link.url)
                                        class=(if link.is_current { TOP_LINK_CURRENT } else { TOP_LINK })
                                    { (link.title) }
                                }
                            }
                        }
                    }
                }
            }

            nav class="fixed inset-x-0 bottom-0 z-40 lg:hidden" {
                div class="mx-auto max-w-screen-xl px-4 pb-4" {
                    div class="rounded-xl border border-gray-200 bg-white/95 shadow-lg
                        backdrop-blur dark:border-gray-700 dark:bg-gray-900/95"
                    {
                        ul class="grid grid-cols-4 gap-2 px-4 py-3" aria-label="Primary" {
                            @for link in self.in_placement(Placement::BottomBar) {
                                li class="min-w-0" {
                                    a
                                        href=(link.url)
                                        class=(bottom_item_class(link.is_current))
                                        aria-current=[aria_current(link.is_current)]
                                    {
                                        span class="truncate" { (link.title) }
                                    }
                                }
                            }

                            li class="min-w-0" {
                                details class="group relative" {
                                    summary
                                        class={
                                            "list-none [&::-webkit-details-marker]:hidden cursor-pointer "
                                            (bottom_item_class(more_is_current))
                                        }
                                        aria-current=[aria_current(more_is_current)]
                                    {
                                        span class="truncate" { "More" }
                                    }

                                    div class="absolute bottom-full right-0 mb-3 w-40 rounded-xl border
                                        border-gray-200 bg-white/95 p-2 shadow-xl backdrop-blur
                                        dark:border-gray-700 dark:bg-gray-900/95"
                                    {
                                        ul class="flex flex-col gap-1 text-sm font-medium" {
                                            @for link in self.in_placement(Placement::MoreMenu) {
                                                li {
                                                    a
                                                        href=(link.url)
                                                        class=(if link.is_current { MENU_ITEM_CURRENT } else { MENU_ITEM })
                                                        aria-current=[aria_current(link.is_current)]
                                                    { (link.title) }
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        )
    }
}
