//! Create/edit marketplace card form.

use std::fmt;

use crate::api::{ApiFailure, CardPayload, MarketplaceApi, NewCard, UserPayload};
use crate::config::FormOverrides;
use crate::error::Result;
use crate::forms::{FieldError, FieldState, REQUIRED};
use crate::keywords::{KEYWORD_PREFIX, KeywordInput};
use crate::outcome::{Operation, Outcome, Route, resolve};
use crate::session::Session;
use crate::validation::{RuleSet, card};

pub const SECTION_REQUIRED: &str = "Please select a section.";
pub const INVALID_CREATOR: &str = "Please enter a valid user id.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardSection {
    ForSale,
    Wanted,
    Exchange,
}

impl CardSection {
    pub const ALL: [CardSection; 3] = [CardSection::ForSale, CardSection::Wanted, CardSection::Exchange];

    pub fn as_str(self) -> &'static str {
        match self {
            CardSection::ForSale => "ForSale",
            CardSection::Wanted => "Wanted",
            CardSection::Exchange => "Exchange",
        }
    }

    pub fn backend_name(self) -> &'static str {
        match self {
            CardSection::ForSale => "FORSALE",
            CardSection::Wanted => "WANTED",
            CardSection::Exchange => "EXCHANGE",
        }
    }

    pub fn from_backend(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.backend_name() == raw.trim())
    }

    /// Accepts either spelling, ignoring case.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|s| {
            s.as_str().eq_ignore_ascii_case(raw) || s.backend_name().eq_ignore_ascii_case(raw)
        })
    }
}

impl fmt::Display for CardSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Local validation failed; nothing was sent.
    Blocked,
    /// No logged-in user.
    Redirect(Route),
    Saved { card_id: Option<u64> },
    Failed(Outcome),
}

#[derive(Debug, Clone)]
pub struct CardForm {
    rules: RuleSet,
    card_id: Option<u64>,
    pub title: FieldState,
    pub description: FieldState,
    pub keywords: KeywordInput,
    pub keywords_error: FieldError,
    section: Option<CardSection>,
    pub section_error: FieldError,
    pub creator_id: FieldState,
    modal_error: Option<String>,
    user_full_name: String,
    user_location: String,
}

impl Default for CardForm {
    fn default() -> Self {
        Self::with_rules(card::rules())
    }
}

impl CardForm {
    pub fn with_rules(rules: RuleSet) -> Self {
        Self {
            rules,
            card_id: None,
            title: FieldState::default(),
            description: FieldState::default(),
            keywords: KeywordInput::default(),
            keywords_error: FieldError::default(),
            section: None,
            section_error: FieldError::default(),
            creator_id: FieldState::default(),
            modal_error: None,
            user_full_name: String::new(),
            user_location: String::new(),
        }
    }

    pub fn with_overrides(overrides: Option<&FormOverrides>) -> Result<Self> {
        Ok(Self::with_rules(card::rules().with_overrides(overrides)?))
    }

    pub fn card_id(&self) -> Option<u64> {
        self.card_id
    }

    pub fn section(&self) -> Option<CardSection> {
        self.section
    }

    pub fn modal_error(&self) -> Option<&str> {
        self.modal_error.as_deref()
    }

    pub fn user_full_name(&self) -> &str {
        &self.user_full_name
    }

    pub fn user_location(&self) -> &str {
        &self.user_location
    }

    pub fn select_section(&mut self, section: CardSection) {
        self.section = Some(section);
    }

    /// Section as the backend spells it (`WANTED`); unknown values clear it.
    pub fn convert_section(&mut self, backend: &str) {
        self.section = CardSection::from_backend(backend);
    }

    pub fn set_title(&mut self, title: &str) {
        self.title.set(title);
    }

    pub fn set_description(&mut self, description: &str) {
        self.description.set(description);
    }

    /// Replace the keyword box and normalize it, as typing does.
    pub fn set_keywords(&mut self, text: &str) {
        self.keywords = KeywordInput::new(text);
        self.keywords.cursor_to_end();
        self.keywords.normalize();
    }

    pub fn set_creator_id(&mut self, raw: &str) {
        self.creator_id.set(raw.trim());
    }

    /// Fill in the read-only name and location shown for the creator.
    pub fn prefill_user(&mut self, user: &UserPayload) {
        self.user_full_name = user.full_name();
        self.user_location = user.location();
        if self.creator_id.value.is_empty() {
            self.creator_id.set(user.id.to_string());
        }
    }

    /// Who the card is created for. Without a logged-in user the caller is
    /// sent to the login page. Administrators must name a creator; everyone
    /// else creates for themselves.
    pub fn resolve_creator(&mut self, session: &Session) -> std::result::Result<Option<u64>, Route> {
        let Some(user_id) = session.user_id() else {
            return Err(Route::Login);
        };
        if !session.is_admin() {
            self.creator_id.error.clear();
            return Ok(Some(user_id));
        }
        let raw = self.creator_id.value.trim();
        if raw.is_empty() {
            self.creator_id.error.set(REQUIRED);
            return Ok(None);
        }
        match raw.parse::<u64>() {
            Ok(id) => {
                self.creator_id.error.clear();
                Ok(Some(id))
            }
            Err(_) => {
                self.creator_id.error.set(INVALID_CREATOR);
                Ok(None)
            }
        }
    }

    /// Check every field, recording each one's error. True when all pass.
    pub fn validate(&mut self) -> bool {
        let mut ok = self
            .title
            .error
            .record(self.rules.check(card::TITLE, &self.title.value));
        ok &= self
            .description
            .error
            .record(self.rules.check(card::DESCRIPTION, &self.description.value));

        let keyword_check = self
            .keywords
            .keywords()
            .iter()
            .try_for_each(|k| self.rules.check(card::KEYWORDS, k));
        ok &= self.keywords_error.record(keyword_check);

        if self.section.is_some() {
            self.section_error.clear();
        } else {
            self.section_error.set(SECTION_REQUIRED);
            ok = false;
        }
        ok
    }

    fn keyword_ids(&self, api: &dyn MarketplaceApi) -> std::result::Result<Vec<u64>, ApiFailure> {
        let mut ids = Vec::new();
        for name in self.keywords.keywords() {
            let existing = api
                .search_keywords(&name)?
                .data
                .into_iter()
                .find(|k| k.name.eq_ignore_ascii_case(&name));
            let id = match existing {
                Some(k) => k.id,
                None => api.create_keyword(&name)?.data.keyword_id,
            };
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    fn send(
        &self,
        api: &dyn MarketplaceApi,
        creator_id: u64,
        section: CardSection,
    ) -> std::result::Result<Option<u64>, ApiFailure> {
        let card = NewCard {
            creator_id,
            section: section.backend_name().to_string(),
            title: self.title.value.clone(),
            description: self.description.value.clone(),
            keyword_ids: self.keyword_ids(api)?,
        };
        match self.card_id {
            Some(id) => api.edit_card(id, &card).map(|_| Some(id)),
            None => api.add_new_card(&card).map(|reply| Some(reply.data.card_id)),
        }
    }

    pub fn submit(&mut self, api: &dyn MarketplaceApi, session: &Session) -> SubmitResult {
        self.modal_error = None;
        let creator = match self.resolve_creator(session) {
            Ok(creator) => creator,
            Err(route) => return SubmitResult::Redirect(route),
        };
        let fields_ok = self.validate();
        let (Some(creator_id), Some(section), true) = (creator, self.section, fields_ok) else {
            tracing::debug!("card form blocked by validation");
            return SubmitResult::Blocked;
        };

        match self.send(api, creator_id, section) {
            Ok(card_id) => {
                tracing::info!(creator_id, section = %section, ?card_id, "card saved");
                self.reset();
                SubmitResult::Saved { card_id }
            }
            Err(failure) => {
                let outcome = resolve(Operation::SaveCard, &failure);
                self.modal_error = outcome.message.clone();
                SubmitResult::Failed(outcome)
            }
        }
    }

    /// Populate the form from an existing card for editing.
    pub fn load(&mut self, api: &dyn MarketplaceApi, card_id: u64) -> std::result::Result<(), Outcome> {
        let card = api
            .get_card(card_id)
            .map_err(|failure| resolve(Operation::LoadCard, &failure))?
            .data;
        self.fill_from(&card);
        Ok(())
    }

    fn fill_from(&mut self, card: &CardPayload) {
        self.card_id = Some(card.id);
        self.title.set(card.title.as_str());
        self.description
            .set(card.description.clone().unwrap_or_default());
        let text = card
            .keywords
            .iter()
            .map(|k| format!("{KEYWORD_PREFIX}{}", k.name))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_keywords(&text);
        self.convert_section(&card.section);
        if let Some(creator) = &card.creator {
            self.creator_id.set(creator.id.to_string());
            self.user_full_name = creator.full_name();
            self.user_location = creator.location();
        }
    }

    pub fn reset(&mut self) {
        self.card_id = None;
        self.title.clear();
        self.description.clear();
        self.keywords.clear();
        self.keywords_error.clear();
        self.section = None;
        self.section_error.clear();
        self.creator_id.error.clear();
        self.modal_error = None;
    }
}
