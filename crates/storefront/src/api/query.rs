//! Route and backend query strings.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Largest page the backend will return.
pub const MAX_PAGE_SIZE: u32 = 48;
pub const DEFAULT_PAGE_SIZE: u32 = 5;

// Characters a browser's encodeURIComponent leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// `k1=v1&k2=v2` with every value encoded.
pub fn query_string<'a>(params: impl IntoIterator<Item = (&'a str, String)>) -> String {
    params
        .into_iter()
        .map(|(k, v)| format!("{k}={}", encode_component(&v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn backend_page(page: u32) -> u32 {
    page.saturating_sub(1)
}

fn backend_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    User,
    Business,
}

impl SearchType {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchType::User => "User",
            SearchType::Business => "Business",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "User" => Some(SearchType::User),
            "Business" => Some(SearchType::Business),
            _ => None,
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            SearchType::User => "Search all users",
            SearchType::Business => "Search all businesses",
        }
    }

    fn default_order(self) -> &'static str {
        match self {
            SearchType::User => "fullNameASC",
            SearchType::Business => "nameASC",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BusinessType {
    AccommodationAndFoodServices,
    RetailTrade,
    CharitableOrganisation,
    NonProfitOrganisation,
}

impl BusinessType {
    pub const ALL: [BusinessType; 4] = [
        BusinessType::AccommodationAndFoodServices,
        BusinessType::RetailTrade,
        BusinessType::CharitableOrganisation,
        BusinessType::NonProfitOrganisation,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            BusinessType::AccommodationAndFoodServices => "Accommodation and Food Services",
            BusinessType::RetailTrade => "Retail Trade",
            BusinessType::CharitableOrganisation => "Charitable Organisation",
            BusinessType::NonProfitOrganisation => "Non Profit Organisation",
        }
    }

    pub fn backend_name(self) -> &'static str {
        match self {
            BusinessType::AccommodationAndFoodServices => "ACCOMMODATION_AND_FOOD_SERVICES",
            BusinessType::RetailTrade => "RETAIL_TRADE",
            BusinessType::CharitableOrganisation => "CHARITABLE_ORGANISATION",
            BusinessType::NonProfitOrganisation => "NON_PROFIT_ORGANISATION",
        }
    }

    /// Anything the backend sends that is not one of the first three is a
    /// non-profit.
    pub fn from_backend(raw: &str) -> Self {
        match raw {
            "ACCOMMODATION_AND_FOOD_SERVICES" => BusinessType::AccommodationAndFoodServices,
            "RETAIL_TRADE" => BusinessType::RetailTrade,
            "CHARITABLE_ORGANISATION" => BusinessType::CharitableOrganisation,
            _ => BusinessType::NonProfitOrganisation,
        }
    }

    pub fn from_display(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.display_name().eq_ignore_ascii_case(raw.trim()))
    }
}

impl fmt::Display for BusinessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BusinessTypeFilter {
    #[default]
    Any,
    Only(BusinessType),
}

impl BusinessTypeFilter {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("any") {
            return Some(BusinessTypeFilter::Any);
        }
        BusinessType::from_display(raw).map(BusinessTypeFilter::Only)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BusinessTypeFilter::Any => "Any",
            BusinessTypeFilter::Only(t) => t.display_name(),
        }
    }
}

/// A user or business search as it appears in the `/search` route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub search_type: SearchType,
    pub query: String,
    pub business_type: BusinessTypeFilter,
    pub order_by: String,
    /// One-based.
    pub page: u32,
    pub page_size: u32,
}

impl SearchQuery {
    pub fn users(query: &str) -> Self {
        Self::new(SearchType::User, query, BusinessTypeFilter::Any)
    }

    pub fn businesses(query: &str, business_type: BusinessTypeFilter) -> Self {
        Self::new(SearchType::Business, query, business_type)
    }

    fn new(search_type: SearchType, query: &str, business_type: BusinessTypeFilter) -> Self {
        Self {
            search_type,
            query: query.to_string(),
            business_type,
            order_by: search_type.default_order().to_string(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Front-end route, e.g.
    /// `/search?type=User&searchQuery=a%20b&orderBy=fullNameASC&page=1&pageSize=5`.
    pub fn route(&self) -> String {
        let mut params = vec![
            ("type", self.search_type.as_str().to_string()),
            ("searchQuery", self.query.clone()),
        ];
        if self.search_type == SearchType::Business {
            params.push(("businessType", self.business_type.display_name().to_string()));
        }
        params.push(("orderBy", self.order_by.clone()));
        params.push(("page", self.page.to_string()));
        params.push(("pageSize", self.page_size.to_string()));
        format!("/search?{}", query_string(params))
    }

    /// Backend path plus query. Pages are zero-based there and the page
    /// size is capped.
    pub fn api_path(&self) -> String {
        let base = match self.search_type {
            SearchType::User => "/users/search",
            SearchType::Business => "/businesses/search",
        };
        let mut params = vec![("searchQuery", self.query.clone())];
        if let BusinessTypeFilter::Only(t) = self.business_type {
            params.push(("businessType", t.backend_name().to_string()));
        }
        params.push(("orderBy", self.order_by.clone()));
        params.push(("page", backend_page(self.page).to_string()));
        params.push(("pageSize", backend_page_size(self.page_size).to_string()));
        format!("{base}?{}", query_string(params))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListingOrderBy {
    #[default]
    ClosesAsc,
    ClosesDesc,
    CreatedAsc,
    CreatedDesc,
    PriceAsc,
    PriceDesc,
    QuantityAsc,
    QuantityDesc,
}

impl ListingOrderBy {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingOrderBy::ClosesAsc => "closesASC",
            ListingOrderBy::ClosesDesc => "closesDESC",
            ListingOrderBy::CreatedAsc => "createdASC",
            ListingOrderBy::CreatedDesc => "createdDESC",
            ListingOrderBy::PriceAsc => "priceASC",
            ListingOrderBy::PriceDesc => "priceDESC",
            ListingOrderBy::QuantityAsc => "quantityASC",
            ListingOrderBy::QuantityDesc => "quantityDESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingsQuery {
    pub order_by: ListingOrderBy,
    /// One-based.
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListingsQuery {
    fn default() -> Self {
        Self {
            order_by: ListingOrderBy::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListingsQuery {
    pub fn api_path(&self, business_id: u64) -> String {
        let params = [
            ("orderBy", self.order_by.as_str().to_string()),
            ("page", backend_page(self.page).to_string()),
            ("pageSize", backend_page_size(self.page_size).to_string()),
        ];
        format!("/businesses/{business_id}/listings?{}", query_string(params))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Granularity {
    #[default]
    Total,
    Yearly,
    Monthly,
    Weekly,
    Daily,
}

impl Granularity {
    pub fn as_str(self) -> &'static str {
        match self {
            Granularity::Total => "Total",
            Granularity::Yearly => "Yearly",
            Granularity::Monthly => "Monthly",
            Granularity::Weekly => "Weekly",
            Granularity::Daily => "Daily",
        }
    }
}

pub fn format_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SalesReportQuery {
    pub from_date: DateTime<Utc>,
    pub to_date: DateTime<Utc>,
    pub granularity: Granularity,
}

impl SalesReportQuery {
    pub fn api_path(&self, business_id: u64) -> String {
        let params = [
            ("fromDate", format_instant(self.from_date)),
            ("toDate", format_instant(self.to_date)),
            ("granularity", self.granularity.as_str().to_string()),
        ];
        format!("/businesses/{business_id}/salesReport?{}", query_string(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn user_search_route() {
        let q = SearchQuery::users("User Search Enter Test");
        assert_eq!(
            q.route(),
            "/search?type=User&searchQuery=User%20Search%20Enter%20Test&orderBy=fullNameASC&page=1&pageSize=5"
        );
    }

    #[test]
    fn business_search_route_includes_type() {
        let q = SearchQuery::businesses(
            "Business Search",
            BusinessTypeFilter::Only(BusinessType::RetailTrade),
        );
        assert_eq!(
            q.route(),
            "/search?type=Business&searchQuery=Business%20Search&businessType=Retail%20Trade&orderBy=nameASC&page=1&pageSize=5"
        );
        let any = SearchQuery::businesses("x", BusinessTypeFilter::Any);
        assert!(any.route().contains("&businessType=Any&"));
    }

    #[test]
    fn encoding_matches_uri_component() {
        assert_eq!(encode_component("a b&c=d/é"), "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(encode_component("-_.!~*'()"), "-_.!~*'()");
    }

    #[test]
    fn backend_query_is_zero_based_and_capped() {
        let q = SearchQuery::users("bob").with_page(3).with_page_size(500);
        assert_eq!(
            q.api_path(),
            "/users/search?searchQuery=bob&orderBy=fullNameASC&page=2&pageSize=48"
        );
        let q = SearchQuery::businesses("", BusinessTypeFilter::Only(BusinessType::RetailTrade));
        assert_eq!(
            q.api_path(),
            "/businesses/search?searchQuery=&businessType=RETAIL_TRADE&orderBy=nameASC&page=0&pageSize=5"
        );
    }

    #[test]
    fn business_type_conversions() {
        assert_eq!(
            BusinessType::from_backend("ACCOMMODATION_AND_FOOD_SERVICES").display_name(),
            "Accommodation and Food Services"
        );
        assert_eq!(BusinessType::from_backend("RETAIL_TRADE"), BusinessType::RetailTrade);
        assert_eq!(
            BusinessType::from_backend("CHARITABLE_ORGANISATION"),
            BusinessType::CharitableOrganisation
        );
        assert_eq!(
            BusinessType::from_backend("anything else"),
            BusinessType::NonProfitOrganisation
        );
        assert_eq!(
            BusinessTypeFilter::parse("retail trade"),
            Some(BusinessTypeFilter::Only(BusinessType::RetailTrade))
        );
        assert_eq!(BusinessTypeFilter::parse("Any"), Some(BusinessTypeFilter::Any));
        assert_eq!(BusinessTypeFilter::parse("Mining"), None);
    }

    #[test]
    fn listings_and_sales_paths() {
        assert_eq!(
            ListingsQuery::default().api_path(4),
            "/businesses/4/listings?orderBy=closesASC&page=0&pageSize=5"
        );
        let q = SalesReportQuery {
            from_date: Utc.with_ymd_and_hms(2021, 10, 24, 0, 0, 0).unwrap(),
            to_date: Utc.with_ymd_and_hms(2021, 10, 30, 0, 0, 0).unwrap(),
            granularity: Granularity::Total,
        };
        assert_eq!(
            q.api_path(4),
            "/businesses/4/salesReport?fromDate=2021-10-24T00%3A00%3A00.000Z&toDate=2021-10-30T00%3A00%3A00.000Z&granularity=Total"
        );
    }
}
