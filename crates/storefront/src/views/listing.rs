//! Full sale listing page.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::api::{Address, ListingPayload, MarketplaceApi};
use crate::carousel::Carousel;
use crate::images::{self, ImageList, ResourcePath};
use crate::outcome::{Operation, Outcome, Route, resolve};
use crate::session::{Session, UserRole};

const BARCODE_API: &str = "https://bwipjs-api.metafloor.com/";

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// `2021-05-12T00:00` becomes `12th May 2021`.
pub fn format_listing_date(raw: &str) -> Option<String> {
    let date = parse_date(raw)?;
    Some(format!(
        "{}{} {} {}",
        date.day(),
        ordinal_suffix(date.day()),
        date.format("%b"),
        date.year()
    ))
}

fn join_present(parts: &[Option<&str>], sep: &str) -> Option<String> {
    let kept: Vec<&str> = parts.iter().flatten().copied().collect();
    (!kept.is_empty()).then(|| kept.join(sep))
}

/// The four display lines of a business address; missing parts drop out.
pub fn address_lines(addr: &Address) -> [Option<String>; 4] {
    [
        join_present(&[addr.street_number(), addr.street_name()], " "),
        addr.suburb().map(str::to_string),
        join_present(&[addr.city(), addr.postcode()], ", "),
        join_present(&[addr.region(), addr.country()], ", "),
    ]
}

/// Barcode image for a UPC-A (12 digit) or EAN-13 code; empty otherwise.
pub fn barcode_image_url(barcode: &str) -> String {
    let barcode = barcode.trim();
    if !barcode.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }
    let bcid = match barcode.len() {
        12 => "upca",
        13 => "ean13",
        _ => return String::new(),
    };
    format!("{BARCODE_API}?bcid={bcid}&text={barcode}")
}

#[derive(Debug, Clone, Default)]
pub struct SaleListingView {
    pub business_id: u64,
    pub listing_id: u64,

    pub product_id: String,
    pub product_name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub barcode: Option<String>,
    pub price: f64,
    pub quantity: u64,
    pub more_info: Option<String>,

    pub start_date: Option<String>,
    pub close_date: Option<String>,
    pub manufactured: Option<String>,
    pub sell_by: Option<String>,
    pub best_before: Option<String>,
    pub expires: Option<String>,

    pub business_name: String,
    pub business_address: Option<Address>,
    pub address_lines: [Option<String>; 4],
    pub currency_symbol: String,
    pub currency_code: String,

    pub is_bookmarked: bool,
    pub total_bookmarks: u64,

    images: ImageList,
    main_image_index: i64,
    carousel: Carousel,
    fixed_visible: Option<usize>,
    resources: Option<ResourcePath>,
    role: Option<UserRole>,
}

impl SaleListingView {
    /// Fetch and populate. A missing user role is not fatal; the page just
    /// hides admin-only controls.
    pub fn load(
        api: &dyn MarketplaceApi,
        session: &Session,
        business_id: u64,
        listing_id: u64,
        resources: ResourcePath,
        num_visible: Option<usize>,
    ) -> std::result::Result<Self, Outcome> {
        let listing = api
            .get_listing(business_id, listing_id)
            .map_err(|failure| resolve(Operation::LoadListing, &failure))?
            .data;
        let mut view = Self {
            business_id,
            resources: Some(resources),
            fixed_visible: num_visible,
            ..Default::default()
        };
        view.populate(&listing);

        if let Some(user_id) = session.user_id() {
            match api.get_user(user_id) {
                Ok(reply) => view.role = reply.data.role,
                Err(err) => tracing::warn!(user_id, %err, "could not fetch user role"),
            }
        }
        Ok(view)
    }

    pub fn populate(&mut self, listing: &ListingPayload) {
        let item = &listing.inventory_item;
        let product = &item.product;

        self.listing_id = listing.id;
        self.product_id = product.id.clone();
        self.product_name = product.name.clone();
        self.description = product.description.clone();
        self.manufacturer = product.manufacturer.clone();
        self.barcode = product.barcode.clone();
        self.price = listing.price;
        self.quantity = listing.quantity;
        self.more_info = listing.more_info.clone();

        self.images = ImageList::new(product.images.clone());
        let primary = self.images.primary_index().unwrap_or(0);
        self.main_image_index = primary as i64;
        let shown = self.fixed_visible.unwrap_or(self.images.len());
        self.carousel = Carousel::new(primary as i64, shown);

        self.start_date = listing.created.as_deref().and_then(format_listing_date);
        self.close_date = listing.closes.as_deref().and_then(format_listing_date);
        self.manufactured = item.manufactured.clone();
        self.sell_by = item.sell_by.clone();
        self.best_before = item.best_before.clone();
        self.expires = item.expires.clone();

        if let Some(business) = &product.business {
            self.business_id = business.id;
            self.business_name = business.name.clone();
            self.business_address = business.address.clone();
            self.address_lines = business
                .address
                .as_ref()
                .map(address_lines)
                .unwrap_or_default();
            self.currency_symbol = business.currency_symbol.clone().unwrap_or_default();
            self.currency_code = business.currency_code.clone().unwrap_or_default();
        }

        self.is_bookmarked = listing.is_bookmarked;
        self.total_bookmarks = listing.total_bookmarks;
    }

    pub fn images(&self) -> &ImageList {
        &self.images
    }

    pub fn main_image_index(&self) -> i64 {
        self.main_image_index
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    fn resources(&self) -> ResourcePath {
        self.resources
            .clone()
            .unwrap_or_else(|| ResourcePath::new(""))
    }

    pub fn main_image(&self) -> String {
        images::main_image(self.images.as_slice(), self.main_image_index, &self.resources())
    }

    pub fn carousel_image(&self, index: i64) -> String {
        images::carousel_image(self.images.as_slice(), index, &self.resources())
    }

    pub fn visible_images(&self) -> Vec<usize> {
        self.carousel.visible(self.images.len())
    }

    pub fn next_image(&mut self) {
        self.carousel.next_image();
    }

    pub fn previous_image(&mut self) {
        self.carousel.previous_image();
    }

    /// Show the carousel image at `index` as the main image.
    pub fn set_main_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.main_image_index = index as i64;
        }
    }

    pub fn toggle_bookmark(&mut self, api: &dyn MarketplaceApi) -> std::result::Result<(), Outcome> {
        api.toggle_bookmark(self.listing_id)
            .map_err(|failure| resolve(Operation::Other, &failure))?;
        if self.is_bookmarked {
            self.total_bookmarks = self.total_bookmarks.saturating_sub(1);
        } else {
            self.total_bookmarks += 1;
        }
        self.is_bookmarked = !self.is_bookmarked;
        Ok(())
    }

    /// Only people shopping as themselves can buy.
    pub fn can_buy(&self, session: &Session) -> bool {
        session.is_acting_as_user()
    }

    pub fn can_delete(&self, session: &Session) -> bool {
        session.is_acting_as(self.business_id)
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_some_and(UserRole::is_admin)
    }

    pub fn barcode_image(&self) -> String {
        self.barcode
            .as_deref()
            .map(barcode_image_url)
            .unwrap_or_default()
    }

    pub fn business_profile_route(&self) -> Route {
        Route::BusinessProfile(self.business_id)
    }

    /// Delete this listing. Success navigates back; a permission failure
    /// also drops the session's acting-as business.
    pub fn delete_listing(
        &self,
        api: &dyn MarketplaceApi,
        session: &mut Session,
    ) -> std::result::Result<Route, Outcome> {
        if let Err(failure) = api.delete_listing(self.business_id, self.listing_id) {
            let outcome = resolve(Operation::DeleteListing, &failure);
            if outcome.reset_acting_as {
                session.reset_acting_as();
            }
            return Err(outcome);
        }
        tracing::info!(
            business_id = self.business_id,
            listing_id = self.listing_id,
            "listing deleted"
        );
        Ok(Route::Back)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_use_ordinal_day() {
        assert_eq!(format_listing_date("2021-05-12T00:00").as_deref(), Some("12th May 2021"));
        assert_eq!(format_listing_date("2021-09-10T00:00").as_deref(), Some("10th Sep 2021"));
        assert_eq!(format_listing_date("2021-09-01").as_deref(), Some("1st Sep 2021"));
        assert_eq!(format_listing_date("2021-09-22T10:11:12").as_deref(), Some("22nd Sep 2021"));
        assert_eq!(format_listing_date("2021-09-13T00:00").as_deref(), Some("13th Sep 2021"));
        assert_eq!(format_listing_date("2021-09-23T00:00").as_deref(), Some("23rd Sep 2021"));
        assert_eq!(format_listing_date("yesterday"), None);
    }

    #[test]
    fn address_lines_skip_missing_parts() {
        let addr = Address {
            street_number: Some("86".into()),
            street_name: Some("High Street".into()),
            city: Some("Picton".into()),
            region: Some("Marlborough".into()),
            country: Some("New Zealand".into()),
            postcode: Some("7220".into()),
            suburb: None,
        };
        let lines = address_lines(&addr);
        assert_eq!(lines[0].as_deref(), Some("86 High Street"));
        assert_eq!(lines[1], None);
        assert_eq!(lines[2].as_deref(), Some("Picton, 7220"));
        assert_eq!(lines[3].as_deref(), Some("Marlborough, New Zealand"));
    }

    #[test]
    fn barcode_urls() {
        assert_eq!(
            barcode_image_url("036000291452"),
            "https://bwipjs-api.metafloor.com/?bcid=upca&text=036000291452"
        );
        assert_eq!(
            barcode_image_url("9300675024235"),
            "https://bwipjs-api.metafloor.com/?bcid=ean13&text=9300675024235"
        );
        assert_eq!(barcode_image_url("12345"), "");
        assert_eq!(barcode_image_url("03600029145a"), "");
    }

    #[test]
    fn zero_images_is_total() {
        let mut view = SaleListingView::default();
        view.populate(&ListingPayload::default());
        assert!(view.visible_images().is_empty());
        view.next_image();
        view.previous_image();
        assert_eq!(view.main_image(), images::DEFAULT_IMAGE);
        assert_eq!(view.carousel_image(0), images::DEFAULT_IMAGE);
    }

    #[test]
    fn buy_and_delete_depend_on_acting_as() {
        let mut view = SaleListingView::default();
        view.business_id = 1;
        assert!(view.can_buy(&Session::new(Some(1), None)));
        assert!(!view.can_buy(&Session::new(Some(1), Some(25))));
        assert!(view.can_delete(&Session::new(Some(1), Some(1))));
        assert!(!view.can_delete(&Session::new(Some(1), Some(2))));
        assert!(!view.can_delete(&Session::from_raw(Some("1"), Some("Not a Number"))));
    }
}
