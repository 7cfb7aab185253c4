use crate::api::{Address, BusinessDraft, BusinessType, MarketplaceApi};
use crate::config::FormOverrides;
use crate::error::Result;
use crate::forms::{FieldError, FieldState, REQUIRED};
use crate::outcome::{Operation, Outcome, Route, resolve};
use crate::session::Session;
use crate::validation::{RuleSet, business};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterResult {
    Blocked,
    Redirect(Route),
    Registered { business_id: u64 },
    Failed(Outcome),
}

/// Business registration.
#[derive(Debug, Clone)]
pub struct BusinessForm {
    rules: RuleSet,
    pub name: FieldState,
    pub description: FieldState,
    pub street_number: FieldState,
    pub street_name: FieldState,
    pub suburb: FieldState,
    pub city: FieldState,
    pub postcode: FieldState,
    pub region: FieldState,
    pub country: FieldState,
    // Street number and name together must also satisfy the address rule.
    pub address_error: FieldError,
    business_type: Option<BusinessType>,
    pub business_type_error: FieldError,
    pub form_error: Option<String>,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl BusinessForm {
    pub fn new() -> Result<Self> {
        Self::with_overrides(None)
    }

    pub fn with_overrides(overrides: Option<&FormOverrides>) -> Result<Self> {
        Ok(Self {
            rules: business::rules()?.with_overrides(overrides)?,
            name: FieldState::default(),
            description: FieldState::default(),
            street_number: FieldState::default(),
            street_name: FieldState::default(),
            suburb: FieldState::default(),
            city: FieldState::default(),
            postcode: FieldState::default(),
            region: FieldState::default(),
            country: FieldState::default(),
            address_error: FieldError::default(),
            business_type: None,
            business_type_error: FieldError::default(),
            form_error: None,
        })
    }

    pub fn business_type(&self) -> Option<BusinessType> {
        self.business_type
    }

    pub fn select_business_type(&mut self, business_type: BusinessType) {
        self.business_type = Some(business_type);
    }

    fn street_line(&self) -> String {
        format!("{} {}", self.street_number.value.trim(), self.street_name.value.trim())
            .trim()
            .to_string()
    }

    pub fn validate(&mut self) -> bool {
        let rules = &self.rules;
        let mut ok = true;
        for (field, state) in [
            (business::NAME, &mut self.name),
            (business::DESCRIPTION, &mut self.description),
            (business::STREET_NUMBER, &mut self.street_number),
            (business::STREET_NAME, &mut self.street_name),
            (business::SUBURB, &mut self.suburb),
            (business::CITY, &mut self.city),
            (business::POSTCODE, &mut self.postcode),
            (business::REGION, &mut self.region),
            (business::COUNTRY, &mut self.country),
        ] {
            let value = state.value.trim().to_string();
            ok &= state.error.record(rules.check(field, &value));
        }
        let street = self.street_line();
        ok &= self
            .address_error
            .record(self.rules.check(business::ADDRESS, &street));

        if self.business_type.is_some() {
            self.business_type_error.clear();
        } else {
            self.business_type_error.set(REQUIRED);
            ok = false;
        }
        ok
    }

    fn draft(&self, administrator: u64, business_type: BusinessType) -> BusinessDraft {
        BusinessDraft {
            primary_administrator_id: administrator,
            name: self.name.value.trim().to_string(),
            description: self.description.value.trim().to_string(),
            address: Address {
                street_number: optional(&self.street_number.value),
                street_name: optional(&self.street_name.value),
                suburb: optional(&self.suburb.value),
                city: optional(&self.city.value),
                region: optional(&self.region.value),
                country: optional(&self.country.value),
                postcode: optional(&self.postcode.value),
            },
            business_type: business_type.backend_name().to_string(),
        }
    }

    pub fn submit(&mut self, api: &dyn MarketplaceApi, session: &Session) -> RegisterResult {
        self.form_error = None;
        let Some(user_id) = session.user_id() else {
            return RegisterResult::Redirect(Route::Login);
        };
        let valid = self.validate();
        let (true, Some(business_type)) = (valid, self.business_type) else {
            return RegisterResult::Blocked;
        };
        match api.register_business(&self.draft(user_id, business_type)) {
            Ok(reply) => {
                let business_id = reply.data.business_id;
                tracing::info!(business_id, "business registered");
                RegisterResult::Registered { business_id }
            }
            Err(failure) => {
                let outcome = resolve(Operation::RegisterBusiness, &failure);
                self.form_error = outcome.message.clone();
                RegisterResult::Failed(outcome)
            }
        }
    }
}
