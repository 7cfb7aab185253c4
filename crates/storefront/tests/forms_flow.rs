mod common;

use common::{ScriptedApi, user};
use storefront::api::{ApiFailure, BusinessType, CardPayload, KeywordPayload};
use storefront::forms::business::{BusinessForm, RegisterResult};
use storefront::forms::card::{CardForm, CardSection, SubmitResult};
use storefront::forms::password::{CRITERIA_UNMET, PASSWORDS_DIFFER, PasswordResetForm};
use storefront::outcome::{INVALID_PASSWORD, PERMISSION_DENIED, Route, UNEXPECTED};
use storefront::session::{Session, UserRole};

fn keyword(id: u64, name: &str) -> KeywordPayload {
    KeywordPayload {
        id,
        name: name.into(),
    }
}

fn filled_card() -> CardForm {
    let mut form = CardForm::default();
    form.set_title("Vintage car");
    form.set_description("1967 Ford Mustang, runs well");
    form.select_section(CardSection::ForSale);
    form
}

fn failed_message(api: &ScriptedApi, failure: ApiFailure) -> (Option<String>, Option<Route>) {
    api.fail("add_new_card", failure);
    let mut form = filled_card();
    match form.submit(api, &Session::new(Some(7), None)) {
        SubmitResult::Failed(outcome) => {
            assert_eq!(form.modal_error(), outcome.message.as_deref());
            (outcome.message, outcome.redirect)
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn card_is_created_with_resolved_keywords() {
    let api = ScriptedApi::new();
    api.keywords.borrow_mut().push(keyword(1, "Vintage"));
    let mut form = filled_card();
    form.set_keywords("Vintage Car");
    assert_eq!(form.keywords.text(), "#Vintage #Car");

    let result = form.submit(&api, &Session::new(Some(7), None));
    assert!(matches!(result, SubmitResult::Saved { card_id: Some(_) }));

    let sent = api.sent_cards();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].creator_id, 7);
    assert_eq!(sent[0].section, "FORSALE");
    assert_eq!(sent[0].title, "Vintage car");
    assert_eq!(sent[0].keyword_ids, vec![1, 100]);
    assert_eq!(api.called("create_keyword"), 1);

    // A saved form starts over.
    assert_eq!(form.title.value, "");
    assert_eq!(form.section(), None);
    assert_eq!(form.keywords.text(), "");
}

#[test]
fn invalid_card_is_not_sent() {
    let api = ScriptedApi::new();
    let mut form = CardForm::default();
    form.set_title("Title only");
    assert_eq!(form.submit(&api, &Session::new(Some(7), None)), SubmitResult::Blocked);
    assert_eq!(form.section_error.message(), "Please select a section.");
    assert!(api.calls().is_empty());
}

#[test]
fn card_without_login_goes_to_login() {
    let api = ScriptedApi::new();
    let mut form = filled_card();
    assert_eq!(
        form.submit(&api, &Session::default()),
        SubmitResult::Redirect(Route::Login)
    );
}

#[test]
fn admin_must_name_creator() {
    let api = ScriptedApi::new();
    let mut admin = Session::new(Some(1), None);
    admin.set_role(UserRole::DefaultGlobalApplicationAdmin);

    let mut form = filled_card();
    assert_eq!(form.submit(&api, &admin), SubmitResult::Blocked);
    assert_eq!(form.creator_id.error_message(), "This field is required.");

    form.set_creator_id("36");
    assert!(matches!(form.submit(&api, &admin), SubmitResult::Saved { .. }));
    assert_eq!(api.sent_cards()[0].creator_id, 36);
}

#[test]
fn card_failures_map_to_messages() {
    let api = ScriptedApi::new();

    let (message, redirect) = failed_message(&api, ApiFailure::with_message(400, "Title too long"));
    assert_eq!(message.as_deref(), Some("Error: Title too long"));
    assert_eq!(redirect, None);

    let (message, redirect) = failed_message(&api, ApiFailure::status(401));
    assert_eq!(message.as_deref(), Some("401: Access token missing"));
    assert_eq!(redirect, Some(Route::InvalidToken));

    let (message, _) = failed_message(&api, ApiFailure::status(403));
    assert_eq!(
        message.as_deref(),
        Some("403: Cannot create card for another user if not GAA or DGAA.")
    );

    let (message, _) = failed_message(&api, ApiFailure::NoResponse {
        detail: "timed out".into(),
    });
    assert_eq!(message.as_deref(), Some("Server Timeout"));

    let (message, _) = failed_message(&api, ApiFailure::status(500));
    assert_eq!(message.as_deref(), Some("500: SOMETHING WENT WRONG"));

    let (message, _) = failed_message(&api, ApiFailure::Malformed {
        detail: "expected value".into(),
    });
    assert_eq!(message.as_deref(), Some(UNEXPECTED));
}

#[test]
fn existing_card_loads_and_saves_as_edit() {
    let mut api = ScriptedApi::new();
    let mut creator = user(7, "Tom", "Rizzi");
    creator.home_address = Some(storefront::api::Address {
        suburb: Some("Ilam".into()),
        city: Some("Christchurch".into()),
        ..Default::default()
    });
    api.cards.insert(5, CardPayload {
        id: 5,
        creator: Some(creator),
        section: "WANTED".into(),
        title: "Looking for a bike".into(),
        description: None,
        keywords: vec![keyword(3, "Bike"), keyword(4, "Blue")],
        ..Default::default()
    });
    api.keywords.borrow_mut().extend([keyword(3, "Bike"), keyword(4, "Blue")]);

    let mut form = CardForm::default();
    form.load(&api, 5).expect("card loads");
    assert_eq!(form.card_id(), Some(5));
    assert_eq!(form.section(), Some(CardSection::Wanted));
    assert_eq!(form.keywords.text(), "#Bike #Blue");
    assert_eq!(form.user_full_name(), "Tom Rizzi");
    assert_eq!(form.user_location(), "Ilam, Christchurch");

    let result = form.submit(&api, &Session::new(Some(7), None));
    assert_eq!(result, SubmitResult::Saved { card_id: Some(5) });
    assert_eq!(api.called("edit_card 5"), 1);
    assert_eq!(api.called("add_new_card"), 0);
    assert_eq!(api.sent_cards()[0].keyword_ids, vec![3, 4]);
}

#[test]
fn card_load_failures_redirect() {
    let api = ScriptedApi::new();
    let mut form = CardForm::default();
    assert_eq!(form.load(&api, 9).unwrap_err().redirect, Some(Route::NoCard));

    api.fail("get_card", ApiFailure::status(400));
    assert_eq!(
        form.load(&api, 9).unwrap_err().redirect,
        Some(Route::PageDoesNotExist)
    );

    api.fail("get_card", ApiFailure::status(401));
    assert_eq!(form.load(&api, 9).unwrap_err().redirect, Some(Route::InvalidToken));
}

fn valid_business() -> BusinessForm {
    let mut form = BusinessForm::new().expect("business rules");
    form.name.set("Brink Food");
    form.description.set("Fresh food, fast");
    form.street_number.set("86");
    form.street_name.set("High Street");
    form.city.set("Picton");
    form.country.set("New Zealand");
    form.select_business_type(BusinessType::AccommodationAndFoodServices);
    form
}

#[test]
fn business_registration() {
    let api = ScriptedApi::new();
    let mut form = valid_business();
    let result = form.submit(&api, &Session::new(Some(3), None));
    assert!(matches!(result, RegisterResult::Registered { .. }));
    assert_eq!(api.calls(), vec!["register_business Brink Food"]);

    assert_eq!(
        valid_business().submit(&api, &Session::default()),
        RegisterResult::Redirect(Route::Login)
    );
}

#[test]
fn business_registration_failures() {
    let api = ScriptedApi::new();
    let session = Session::new(Some(3), None);

    let mut form = valid_business();
    form.country.set("");
    assert_eq!(form.submit(&api, &session), RegisterResult::Blocked);
    assert!(api.calls().is_empty());

    api.fail("register_business", ApiFailure::with_message(400, "Name taken"));
    let mut form = valid_business();
    assert!(matches!(form.submit(&api, &session), RegisterResult::Failed(_)));
    assert_eq!(form.form_error.as_deref(), Some("Error: Name taken"));

    api.fail("register_business", ApiFailure::status(403));
    let mut form = valid_business();
    form.submit(&api, &session);
    assert_eq!(form.form_error.as_deref(), Some(PERMISSION_DENIED));
}

fn password_form(password: &str, confirm: &str) -> PasswordResetForm {
    let mut form = PasswordResetForm::new("abc123");
    form.set_password(password);
    form.set_confirm(confirm);
    form
}

#[test]
fn password_reset_checks_locally_first() {
    let api = ScriptedApi::new();

    let mut weak = password_form("password", "password");
    assert!(!weak.criteria().all_met());
    assert!(weak.criteria().lower_case);
    assert!(weak.criteria().length);
    assert_eq!(weak.submit(&api), None);
    assert_eq!(weak.error.as_deref(), Some(CRITERIA_UNMET));

    let mut mismatch = password_form("Passw0rd!", "Passw0rd?");
    assert_eq!(mismatch.submit(&api), None);
    assert_eq!(mismatch.error.as_deref(), Some(PASSWORDS_DIFFER));
    assert!(api.calls().is_empty());

    let mut ok = password_form("Passw0rd!", "Passw0rd!");
    assert_eq!(ok.submit(&api), None);
    assert!(ok.reset_success);
    assert_eq!(api.calls(), vec!["reset_password abc123"]);
}

#[test]
fn password_reset_failures() {
    let api = ScriptedApi::new();

    api.fail("reset_password", ApiFailure::status(400));
    let mut form = password_form("Passw0rd!", "Passw0rd!");
    assert_eq!(form.submit(&api), None);
    assert_eq!(form.error.as_deref(), Some(INVALID_PASSWORD));

    api.fail("reset_password", ApiFailure::status(406));
    let mut form = password_form("Passw0rd!", "Passw0rd!");
    assert_eq!(form.submit(&api), None);
    assert!(form.invalid_token);
    assert_eq!(form.error, None);

    api.fail("reset_password", ApiFailure::status(503));
    let mut form = password_form("Passw0rd!", "Passw0rd!");
    assert_eq!(form.submit(&api), Some(Route::Timeout));

    api.fail("reset_password", ApiFailure::status(409));
    let mut form = password_form("Passw0rd!", "Passw0rd!");
    assert_eq!(form.submit(&api), None);
    assert_eq!(form.error.as_deref(), Some(UNEXPECTED));
    assert!(!form.reset_success);
}
