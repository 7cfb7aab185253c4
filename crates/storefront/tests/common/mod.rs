#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use storefront::api::{
    ApiFailure, ApiResult, BusinessCreated, BusinessDraft, BusinessPayload, CardCreated,
    CardPayload, KeywordCreated, KeywordPayload, ListingPayload, ListingsQuery, MarketplaceApi,
    NewCard, Reply, SalesReportEntry, SalesReportQuery, SearchQuery, UserPayload,
};
use storefront::images::{ImageRecord, ImageTarget};

/// In-memory backend. Every call is recorded; a call named in `failures`
/// returns that failure instead of data.
#[derive(Default)]
pub struct ScriptedApi {
    pub users: HashMap<u64, UserPayload>,
    pub businesses: HashMap<u64, BusinessPayload>,
    pub listings: RefCell<Vec<ListingPayload>>,
    pub cards: HashMap<u64, CardPayload>,
    pub keywords: RefCell<Vec<KeywordPayload>>,
    pub sales: Vec<SalesReportEntry>,
    failures: RefCell<HashMap<&'static str, ApiFailure>>,
    calls: RefCell<Vec<String>>,
    sent_cards: RefCell<Vec<NewCard>>,
    next_id: Cell<u64>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        let api = Self::default();
        api.next_id.set(100);
        api
    }

    pub fn fail(&self, call: &'static str, failure: ApiFailure) {
        self.failures.borrow_mut().insert(call, failure);
    }

    pub fn succeed(&self, call: &'static str) {
        self.failures.borrow_mut().remove(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn called(&self, prefix: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub fn sent_cards(&self) -> Vec<NewCard> {
        self.sent_cards.borrow().clone()
    }

    fn record(&self, call: &'static str, detail: String) -> Result<(), ApiFailure> {
        self.calls.borrow_mut().push(format!("{call} {detail}").trim_end().to_string());
        match self.failures.borrow().get(call) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }

    fn fresh_id(&self) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }
}

fn found<T: Clone>(value: Option<&T>) -> ApiResult<T> {
    value
        .cloned()
        .map(Reply::ok)
        .ok_or_else(|| ApiFailure::status(404))
}

impl MarketplaceApi for ScriptedApi {
    fn get_user(&self, user_id: u64) -> ApiResult<UserPayload> {
        self.record("get_user", user_id.to_string())?;
        found(self.users.get(&user_id))
    }

    fn get_business(&self, business_id: u64) -> ApiResult<BusinessPayload> {
        self.record("get_business", business_id.to_string())?;
        found(self.businesses.get(&business_id))
    }

    fn register_business(&self, draft: &BusinessDraft) -> ApiResult<BusinessCreated> {
        self.record("register_business", draft.name.clone())?;
        Ok(Reply::new(201, BusinessCreated {
            business_id: self.fresh_id(),
        }))
    }

    fn sort_listings(&self, business_id: u64, query: &ListingsQuery) -> ApiResult<Vec<ListingPayload>> {
        self.record("sort_listings", query.api_path(business_id))?;
        let listings = self.listings.borrow().clone();
        let mut reply = Reply::ok(listings);
        reply.total_rows = Some(reply.data.len() as u64);
        reply.total_pages = Some(1);
        Ok(reply)
    }

    fn get_listing(&self, business_id: u64, listing_id: u64) -> ApiResult<ListingPayload> {
        self.record("get_listing", format!("{business_id}/{listing_id}"))?;
        found(self.listings.borrow().iter().find(|l| l.id == listing_id))
    }

    fn delete_listing(&self, business_id: u64, listing_id: u64) -> ApiResult<()> {
        self.record("delete_listing", format!("{business_id}/{listing_id}"))?;
        let mut listings = self.listings.borrow_mut();
        let before = listings.len();
        listings.retain(|l| l.id != listing_id);
        if listings.len() == before {
            return Err(ApiFailure::status(406));
        }
        Ok(Reply::ok(()))
    }

    fn toggle_bookmark(&self, listing_id: u64) -> ApiResult<()> {
        self.record("toggle_bookmark", listing_id.to_string())?;
        Ok(Reply::ok(()))
    }

    fn add_new_card(&self, card: &NewCard) -> ApiResult<CardCreated> {
        self.record("add_new_card", card.title.clone())?;
        self.sent_cards.borrow_mut().push(card.clone());
        Ok(Reply::new(201, CardCreated {
            card_id: self.fresh_id(),
        }))
    }

    fn edit_card(&self, card_id: u64, card: &NewCard) -> ApiResult<()> {
        self.record("edit_card", card_id.to_string())?;
        self.sent_cards.borrow_mut().push(card.clone());
        Ok(Reply::ok(()))
    }

    fn get_card(&self, card_id: u64) -> ApiResult<CardPayload> {
        self.record("get_card", card_id.to_string())?;
        found(self.cards.get(&card_id))
    }

    fn search_keywords(&self, query: &str) -> ApiResult<Vec<KeywordPayload>> {
        self.record("search_keywords", query.to_string())?;
        let query = query.to_lowercase();
        let hits = self
            .keywords
            .borrow()
            .iter()
            .filter(|k| k.name.to_lowercase().starts_with(&query))
            .cloned()
            .collect();
        Ok(Reply::ok(hits))
    }

    fn create_keyword(&self, name: &str) -> ApiResult<KeywordCreated> {
        self.record("create_keyword", name.to_string())?;
        let id = self.fresh_id();
        self.keywords.borrow_mut().push(KeywordPayload {
            id,
            name: name.to_string(),
        });
        Ok(Reply::new(201, KeywordCreated { keyword_id: id }))
    }

    fn upload_image(&self, target: &ImageTarget, file_name: &str, bytes: Vec<u8>) -> ApiResult<ImageRecord> {
        self.record("upload_image", format!("{} {file_name} ({} bytes)", target.query_params(), bytes.len()))?;
        Ok(Reply::new(201, ImageRecord::new(self.fresh_id(), file_name, false)))
    }

    fn delete_image(&self, target: &ImageTarget, image_id: u64) -> ApiResult<()> {
        self.record("delete_image", target.image_path(image_id))?;
        Ok(Reply::ok(()))
    }

    fn set_primary_image(&self, target: &ImageTarget, image_id: u64) -> ApiResult<()> {
        self.record("set_primary_image", target.image_path(image_id))?;
        Ok(Reply::ok(()))
    }

    fn sales_report(&self, business_id: u64, query: &SalesReportQuery) -> ApiResult<Vec<SalesReportEntry>> {
        self.record("sales_report", query.api_path(business_id))?;
        Ok(Reply::ok(self.sales.clone()))
    }

    fn search_users(&self, query: &SearchQuery) -> ApiResult<Vec<UserPayload>> {
        self.record("search_users", query.api_path())?;
        Ok(Reply::ok(self.users.values().cloned().collect()))
    }

    fn search_businesses(&self, query: &SearchQuery) -> ApiResult<Vec<BusinessPayload>> {
        self.record("search_businesses", query.api_path())?;
        Ok(Reply::ok(self.businesses.values().cloned().collect()))
    }

    fn reset_password(&self, token: &str, _password: &str) -> ApiResult<()> {
        self.record("reset_password", token.to_string())?;
        Ok(Reply::ok(()))
    }
}

pub fn user(id: u64, first: &str, last: &str) -> UserPayload {
    UserPayload {
        id,
        first_name: first.into(),
        last_name: last.into(),
        ..Default::default()
    }
}

/// The listing the listing page tests use: three images, the second
/// primary, sold by business 1.
pub fn sample_listing() -> ListingPayload {
    serde_json::from_value(serde_json::json!({
        "id": 7,
        "quantity": 4,
        "price": 6.5,
        "moreInfo": "Seller may be willing to consider near offers",
        "created": "2021-05-12T00:00",
        "closes": "2021-09-22T10:11:12",
        "isBookmarked": false,
        "totalBookmarks": 2,
        "inventoryItem": {
            "id": 3,
            "quantity": 10,
            "pricePerItem": 1.5,
            "totalPrice": 15.0,
            "manufactured": "2021-01-01",
            "sellBy": "2021-12-01",
            "bestBefore": "2021-12-10",
            "expires": "2021-12-31",
            "product": {
                "id": "WATT-420-BEANS",
                "name": "Watties Baked Beans",
                "description": "Baked beans in tomato sauce",
                "manufacturer": "Heinz Wattie's",
                "barcode": "9300675024235",
                "images": [
                    { "id": 1, "filename": "/media/a.jpg", "thumbnailFilename": "/media/a_thumb.jpg", "isPrimary": false },
                    { "id": 2, "filename": "/media/b.jpg", "thumbnailFilename": "/media/b_thumb.jpg", "isPrimary": true },
                    { "id": 3, "filename": "/media/c.jpg", "thumbnailFilename": "/media/c_thumb.jpg", "isPrimary": false }
                ],
                "business": {
                    "id": 1,
                    "name": "Brink Food",
                    "primaryAdministratorId": 1,
                    "currencySymbol": "$",
                    "currencyCode": "NZD",
                    "address": {
                        "streetNumber": "86",
                        "streetName": "High Street",
                        "suburb": "Riccarton",
                        "city": "Christchurch",
                        "postcode": "8041",
                        "region": "Canterbury",
                        "country": "New Zealand"
                    }
                }
            }
        }
    }))
    .expect("sample listing fixture")
}
