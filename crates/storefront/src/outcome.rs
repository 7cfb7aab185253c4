//! Turns a failed remote call into exactly one thing the user sees: a
//! message, a redirect, or a state reset.

use crate::api::ApiFailure;
use crate::text_sanitize::sanitize_server_text;

pub const PERMISSION_DENIED: &str = "Sorry, you do not have permission to perform this action.";
pub const SOMETHING_WENT_WRONG: &str = "Sorry, something went wrong...";
pub const INVALID_IMAGE: &str = "Sorry, the file you uploaded is not a valid image.";
pub const SERVER_TIMEOUT: &str = "Server Timeout";
pub const UNEXPECTED: &str = "Unexpected error occurred.";
pub const INVALID_PASSWORD: &str = "Invalid password: Please check criteria.";
const CARD_TOKEN_MISSING: &str = "401: Access token missing";
const CARD_FORBIDDEN: &str = "403: Cannot create card for another user if not GAA or DGAA.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    Validation,
    Auth,
    Permission,
    NotFound,
    Timeout,
    Unexpected,
}

impl FailureKind {
    pub fn classify(failure: &ApiFailure) -> Self {
        match failure {
            ApiFailure::Response { status: 400, .. } => FailureKind::Validation,
            ApiFailure::Response { status: 401, .. } => FailureKind::Auth,
            ApiFailure::Response { status: 403, .. } => FailureKind::Permission,
            ApiFailure::Response {
                status: 404 | 406, ..
            } => FailureKind::NotFound,
            ApiFailure::Response { .. } | ApiFailure::Malformed { .. } => FailureKind::Unexpected,
            ApiFailure::NoResponse { .. } => FailureKind::Timeout,
        }
    }
}

/// Front-end routes a view may navigate to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    InvalidToken,
    PageDoesNotExist,
    NoCard,
    NoListing,
    Timeout,
    Back,
    BusinessProfile(u64),
    BusinessSales(u64),
    Search(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".into(),
            Route::InvalidToken => "/invalidtoken".into(),
            Route::PageDoesNotExist => "/pageDoesNotExist".into(),
            Route::NoCard => "/noCard".into(),
            Route::NoListing => "/noListing".into(),
            Route::Timeout => "/timeout".into(),
            Route::Back => "..".into(),
            Route::BusinessProfile(id) => format!("/businessProfile/{id}"),
            // Relative, like the sales summary's "full report" link.
            Route::BusinessSales(id) => format!("businessProfile/{id}/sales"),
            Route::Search(route) => route.clone(),
        }
    }
}

/// Which call failed; each has its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SaveCard,
    LoadCard,
    ChangeImage,
    UploadImage,
    DeleteListing,
    DeleteListingFromList,
    LoadListing,
    ResetPassword,
    RegisterBusiness,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub kind: FailureKind,
    pub message: Option<String>,
    pub redirect: Option<Route>,
    /// Drop the acting-as business.
    pub reset_acting_as: bool,
    /// The user is no longer an administrator of the business on screen.
    pub revoke_admin: bool,
    /// Re-fetch the list the failed item came from.
    pub refresh: bool,
}

impl Outcome {
    fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            message: None,
            redirect: None,
            reset_acting_as: false,
            revoke_admin: false,
            refresh: false,
        }
    }

    fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn redirect(mut self, route: Route) -> Self {
        self.redirect = Some(route);
        self
    }
}

fn server_message(failure: &ApiFailure) -> String {
    match failure {
        ApiFailure::Response {
            message: Some(m), ..
        } => sanitize_server_text(m),
        _ => String::new(),
    }
}

/// Total over every failure: one deterministic outcome per operation and
/// failure.
pub fn resolve(op: Operation, failure: &ApiFailure) -> Outcome {
    tracing::warn!(?op, %failure, "remote call failed");
    let kind = FailureKind::classify(failure);
    let status = failure.status_code();
    let out = Outcome::new(kind);
    match op {
        Operation::SaveCard => match (kind, status) {
            (FailureKind::Validation, _) => out.message(format!("Error: {}", server_message(failure))),
            (FailureKind::Auth, _) => out.message(CARD_TOKEN_MISSING).redirect(Route::InvalidToken),
            (FailureKind::Permission, _) => out.message(CARD_FORBIDDEN),
            (FailureKind::Timeout, _) => out.message(SERVER_TIMEOUT),
            (_, Some(status)) => out.message(format!("{status}: SOMETHING WENT WRONG")),
            (_, None) => out.message(UNEXPECTED),
        },
        Operation::LoadCard => match kind {
            FailureKind::Validation => out.redirect(Route::PageDoesNotExist),
            FailureKind::Auth => out.redirect(Route::InvalidToken),
            _ => out.redirect(Route::NoCard),
        },
        Operation::ChangeImage | Operation::UploadImage => match kind {
            FailureKind::Validation if op == Operation::UploadImage => out.message(INVALID_IMAGE),
            FailureKind::Auth => out.redirect(Route::InvalidToken),
            FailureKind::Permission => out.message(PERMISSION_DENIED),
            FailureKind::Timeout => out.message(SERVER_TIMEOUT).redirect(Route::Timeout),
            _ => out.message(SOMETHING_WENT_WRONG),
        },
        Operation::DeleteListing => match kind {
            FailureKind::Auth => out.redirect(Route::InvalidToken),
            FailureKind::NotFound => out.redirect(Route::NoListing),
            FailureKind::Permission => Outcome {
                reset_acting_as: true,
                ..out.message(PERMISSION_DENIED)
            },
            FailureKind::Timeout => out.redirect(Route::Timeout),
            _ => out.message(SOMETHING_WENT_WRONG),
        },
        Operation::DeleteListingFromList => match kind {
            FailureKind::Auth => out.redirect(Route::InvalidToken),
            FailureKind::Permission => Outcome {
                revoke_admin: true,
                ..out.message(PERMISSION_DENIED)
            },
            FailureKind::NotFound => Outcome {
                refresh: true,
                ..out
            },
            FailureKind::Timeout => out.redirect(Route::Timeout),
            _ => out.message(SOMETHING_WENT_WRONG),
        },
        Operation::LoadListing => match kind {
            FailureKind::Validation => out.redirect(Route::PageDoesNotExist),
            FailureKind::Auth => out.redirect(Route::InvalidToken),
            FailureKind::Timeout => out.redirect(Route::Timeout),
            _ => out.redirect(Route::NoListing),
        },
        Operation::ResetPassword => match (kind, status) {
            (FailureKind::Validation, _) => out.message(INVALID_PASSWORD),
            // The view shows its own expired-link panel.
            (FailureKind::NotFound, _) => out,
            (FailureKind::Timeout, _) => out.redirect(Route::Timeout),
            (_, Some(s)) if s >= 500 => out.redirect(Route::Timeout),
            _ => out.message(UNEXPECTED),
        },
        Operation::RegisterBusiness | Operation::Other => match (kind, status) {
            (FailureKind::Validation, _) => {
                let msg = server_message(failure);
                if msg.is_empty() {
                    out.message(UNEXPECTED)
                } else {
                    out.message(format!("Error: {msg}"))
                }
            }
            (FailureKind::Auth, _) => out.redirect(Route::InvalidToken),
            (FailureKind::Permission, _) => out.message(PERMISSION_DENIED),
            (FailureKind::Timeout, _) => out.redirect(Route::Timeout),
            (_, Some(status)) => out.message(format!("{status}: SOMETHING WENT WRONG")),
            (_, None) => out.message(UNEXPECTED),
        },
    }
}
