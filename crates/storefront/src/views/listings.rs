//! A business's listings page with its transient notification queue.

use std::time::{Duration, Instant};

use crate::api::{ListingPayload, ListingsQuery, MarketplaceApi};
use crate::outcome::{Operation, Outcome, Route, resolve};
use crate::session::Session;

pub const MESSAGE_LIFETIME: Duration = Duration::from_secs(5);
pub const LISTING_DELETED: &str = "Listing successfully deleted.";
pub const LISTING_CREATED: &str = "Listing successfully created.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub is_error: bool,
    pub topic: String,
    pub text: String,
}

#[derive(Debug, Clone)]
struct Posted {
    message: Message,
    at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct ListingsPage {
    pub business_id: u64,
    pub business_name: String,
    pub currency_symbol: String,
    pub currency_code: String,
    pub query: ListingsQuery,
    pub listings: Vec<ListingPayload>,
    pub total_rows: u64,
    pub total_pages: u64,
    pub business_admin: bool,
    loaded: bool,
    messages: Vec<Posted>,
    message_id_counter: u64,
}

impl ListingsPage {
    pub fn new(business_id: u64) -> Self {
        Self {
            business_id,
            ..Default::default()
        }
    }

    /// Business details, admin rights, then the first page of listings.
    pub fn load(&mut self, api: &dyn MarketplaceApi, session: &Session) -> Result<(), Outcome> {
        let business = api
            .get_business(self.business_id)
            .map_err(|failure| resolve(Operation::Other, &failure))?
            .data;
        self.business_name = business.name.clone();
        self.currency_symbol = business.currency_symbol.clone().unwrap_or_default();
        self.currency_code = business.currency_code.clone().unwrap_or_default();

        self.business_admin = match session.user_id() {
            Some(user_id) if business.is_administrator(user_id) => true,
            Some(user_id) => api
                .get_user(user_id)
                .ok()
                .and_then(|reply| reply.data.role)
                .is_some_and(|role| role.is_admin()),
            None => false,
        };
        self.refresh(api)
    }

    pub fn refresh(&mut self, api: &dyn MarketplaceApi) -> Result<(), Outcome> {
        let reply = api
            .sort_listings(self.business_id, &self.query)
            .map_err(|failure| resolve(Operation::Other, &failure))?;
        self.total_rows = reply.total_rows.unwrap_or(reply.data.len() as u64);
        self.total_pages = reply.total_pages.unwrap_or(1);
        self.listings = reply.data;
        self.loaded = true;
        Ok(())
    }

    /// Shown only once a fetch has completed with nothing in it.
    pub fn shows_no_listings(&self) -> bool {
        self.loaded && self.listings.is_empty()
    }

    pub fn messages(&self) -> Vec<&Message> {
        self.messages.iter().map(|p| &p.message).collect()
    }

    pub fn message_id_counter(&self) -> u64 {
        self.message_id_counter
    }

    pub fn creation_success(&self) -> bool {
        self.messages.iter().any(|p| !p.message.is_error)
    }

    fn post(&mut self, is_error: bool, topic: &str, text: &str, at: Instant) {
        self.message_id_counter += 1;
        self.messages.push(Posted {
            message: Message {
                id: self.message_id_counter,
                is_error,
                topic: topic.into(),
                text: text.into(),
            },
            at,
        });
    }

    fn post_success(&mut self, text: &str, at: Instant) {
        self.post(false, "Success", text, at);
    }

    /// Queue the failure's message, if it has one, and hand back its route.
    fn post_failure(&mut self, outcome: Outcome, at: Instant) -> Option<Route> {
        if let Some(text) = outcome.message.as_deref() {
            self.post(true, "Error", text, at);
        }
        outcome.redirect
    }

    /// Drop messages older than [`MESSAGE_LIFETIME`].
    pub fn expire_messages(&mut self, now: Instant) {
        self.messages
            .retain(|p| now.saturating_duration_since(p.at) < MESSAGE_LIFETIME);
    }

    pub fn dismiss(&mut self, id: u64) {
        self.messages.retain(|p| p.message.id != id);
    }

    pub fn after_creation(&mut self, api: &dyn MarketplaceApi, now: Instant) -> Option<Route> {
        self.post_success(LISTING_CREATED, now);
        match self.refresh(api) {
            Ok(()) => None,
            Err(outcome) => self.post_failure(outcome, now),
        }
    }

    /// Delete one listing. Success and failure both land in the message
    /// queue; the returned route is where to go next, if anywhere.
    pub fn delete_listing(
        &mut self,
        api: &dyn MarketplaceApi,
        listing_id: u64,
        now: Instant,
    ) -> Option<Route> {
        match api.delete_listing(self.business_id, listing_id) {
            Ok(_) => {
                tracing::info!(business_id = self.business_id, listing_id, "listing deleted");
                let before = self.listings.len();
                self.listings.retain(|l| l.id != listing_id);
                if self.listings.len() < before {
                    self.total_rows = self.total_rows.saturating_sub(1);
                }
                self.post_success(LISTING_DELETED, now);
                match self.refresh(api) {
                    Ok(()) => None,
                    Err(outcome) => self.post_failure(outcome, now),
                }
            }
            Err(failure) => {
                let outcome = resolve(Operation::DeleteListingFromList, &failure);
                if outcome.revoke_admin {
                    self.business_admin = false;
                }
                if outcome.refresh {
                    if let Err(o) = self.refresh(api) {
                        return self.post_failure(o, now);
                    }
                }
                self.post_failure(outcome, now)
            }
        }
    }
}
