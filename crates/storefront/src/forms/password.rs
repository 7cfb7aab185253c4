use crate::api::MarketplaceApi;
use crate::outcome::{FailureKind, Operation, Route, resolve};
use crate::validation::PasswordCriteria;

pub const PASSWORDS_DIFFER: &str = "Passwords do not match.";
pub const CRITERIA_UNMET: &str = "Invalid password: Please check criteria.";

/// Reset-password page reached from an emailed link.
#[derive(Debug, Clone, Default)]
pub struct PasswordResetForm {
    token: String,
    password: String,
    confirm: String,
    criteria: PasswordCriteria,
    pub error: Option<String>,
    pub invalid_token: bool,
    pub reset_success: bool,
}

impl PasswordResetForm {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.trim().to_string(),
            ..Default::default()
        }
    }

    pub fn criteria(&self) -> PasswordCriteria {
        self.criteria
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
        self.criteria = PasswordCriteria::evaluate(password);
    }

    pub fn set_confirm(&mut self, confirm: &str) {
        self.confirm = confirm.to_string();
    }

    /// Send the new password. Returns where to navigate, if anywhere.
    pub fn submit(&mut self, api: &dyn MarketplaceApi) -> Option<Route> {
        self.error = None;
        if !self.criteria.all_met() {
            self.error = Some(CRITERIA_UNMET.to_string());
            return None;
        }
        if self.password != self.confirm {
            self.error = Some(PASSWORDS_DIFFER.to_string());
            return None;
        }
        match api.reset_password(&self.token, &self.password) {
            Ok(_) => {
                tracing::info!("password reset");
                self.reset_success = true;
                None
            }
            Err(failure) => {
                let outcome = resolve(Operation::ResetPassword, &failure);
                self.invalid_token = outcome.kind == FailureKind::NotFound;
                self.error = outcome.message;
                outcome.redirect
            }
        }
    }
}
