//! The backend contract: what the views may ask of the marketplace API and
//! how the answers come back.

use std::fmt;

pub mod http;
pub mod model;
pub mod query;

pub use http::HttpApi;
pub use model::*;
pub use query::{
    BusinessType, BusinessTypeFilter, Granularity, ListingOrderBy, ListingsQuery,
    SalesReportQuery, SearchQuery, SearchType,
};

use crate::images::{ImageRecord, ImageTarget};

/// Why a call did not produce a usable reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiFailure {
    /// The server answered with a non-success status.
    Response { status: u16, message: Option<String> },
    /// Nothing came back: timeout, refused connection, DNS.
    NoResponse { detail: String },
    /// A reply arrived but could not be decoded.
    Malformed { detail: String },
}

impl ApiFailure {
    pub fn status(status: u16) -> Self {
        ApiFailure::Response {
            status,
            message: None,
        }
    }

    pub fn with_message(status: u16, message: &str) -> Self {
        ApiFailure::Response {
            status,
            message: Some(message.to_string()),
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiFailure::Response { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiFailure::Response {
                status,
                message: Some(m),
            } => write!(f, "server returned {status}: {m}"),
            ApiFailure::Response { status, .. } => write!(f, "server returned {status}"),
            ApiFailure::NoResponse { detail } => write!(f, "no response from server: {detail}"),
            ApiFailure::Malformed { detail } => write!(f, "malformed server response: {detail}"),
        }
    }
}

impl std::error::Error for ApiFailure {}

impl From<ApiFailure> for crate::Error {
    fn from(err: ApiFailure) -> Self {
        crate::Error::msg(err.to_string())
    }
}

/// A successful reply. Paginated endpoints also report totals through the
/// `Total-Rows` and `Total-Pages` headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub status: u16,
    pub data: T,
    pub total_rows: Option<u64>,
    pub total_pages: Option<u64>,
}

impl<T> Reply<T> {
    pub fn new(status: u16, data: T) -> Self {
        Self {
            status,
            data,
            total_rows: None,
            total_pages: None,
        }
    }

    pub fn ok(data: T) -> Self {
        Self::new(200, data)
    }
}

pub type ApiResult<T> = std::result::Result<Reply<T>, ApiFailure>;

/// Every remote call the front end makes. Implemented over HTTP by
/// [`HttpApi`]; tests script their own.
pub trait MarketplaceApi {
    fn get_user(&self, user_id: u64) -> ApiResult<UserPayload>;

    fn get_business(&self, business_id: u64) -> ApiResult<BusinessPayload>;

    fn register_business(&self, draft: &BusinessDraft) -> ApiResult<BusinessCreated>;

    fn sort_listings(
        &self,
        business_id: u64,
        query: &ListingsQuery,
    ) -> ApiResult<Vec<ListingPayload>>;

    fn get_listing(&self, business_id: u64, listing_id: u64) -> ApiResult<ListingPayload>;

    fn delete_listing(&self, business_id: u64, listing_id: u64) -> ApiResult<()>;

    fn toggle_bookmark(&self, listing_id: u64) -> ApiResult<()>;

    fn add_new_card(&self, card: &NewCard) -> ApiResult<CardCreated>;

    fn edit_card(&self, card_id: u64, card: &NewCard) -> ApiResult<()>;

    fn get_card(&self, card_id: u64) -> ApiResult<CardPayload>;

    fn search_keywords(&self, query: &str) -> ApiResult<Vec<KeywordPayload>>;

    fn create_keyword(&self, name: &str) -> ApiResult<KeywordCreated>;

    fn upload_image(
        &self,
        target: &ImageTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<ImageRecord>;

    fn delete_image(&self, target: &ImageTarget, image_id: u64) -> ApiResult<()>;

    fn set_primary_image(&self, target: &ImageTarget, image_id: u64) -> ApiResult<()>;

    fn sales_report(
        &self,
        business_id: u64,
        query: &SalesReportQuery,
    ) -> ApiResult<Vec<SalesReportEntry>>;

    fn search_users(&self, query: &SearchQuery) -> ApiResult<Vec<UserPayload>>;

    fn search_businesses(&self, query: &SearchQuery) -> ApiResult<Vec<BusinessPayload>>;

    fn reset_password(&self, token: &str, password: &str) -> ApiResult<()>;
}
