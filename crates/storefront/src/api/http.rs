use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use reqwest::header::{COOKIE, HeaderMap};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{
    ApiFailure, ApiResult, BusinessCreated, BusinessDraft, BusinessPayload, CardCreated,
    CardPayload, KeywordCreated, KeywordPayload, ListingPayload, ListingsQuery, MarketplaceApi,
    NewCard, NewPassword, Reply, SalesReportEntry, SalesReportQuery, SearchQuery, UserPayload,
    query,
};
use crate::config::StorefrontConfig;
use crate::error::{Error, Result};
use crate::images::{ImageRecord, ImageTarget};

const SESSION_COOKIE: &str = "JSESSIONID";

/// [`MarketplaceApi`] over the backend's REST interface.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

fn classify_transport(err: reqwest::Error) -> ApiFailure {
    if err.is_decode() {
        ApiFailure::Malformed {
            detail: err.to_string(),
        }
    } else {
        ApiFailure::NoResponse {
            detail: err.to_string(),
        }
    }
}

// The backend puts human-readable failures in a top-level `message`.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .filter(|m| !m.trim().is_empty())
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::msg(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn from_config(cfg: &StorefrontConfig) -> Result<Self> {
        Self::new(
            &cfg.api.resolved_base_url(),
            cfg.api.timeout(),
            cfg.session.token(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        tracing::debug!(%method, path, "api request");
        let mut req = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.token.as_deref() {
            req = req.header(COOKIE, format!("{SESSION_COOKIE}={token}"));
        }
        req
    }

    fn send(&self, req: RequestBuilder) -> std::result::Result<Response, ApiFailure> {
        let res = req.send().map_err(|e| {
            tracing::debug!(error = %e, "api request failed without a response");
            classify_transport(e)
        })?;
        let status = res.status();
        tracing::debug!(status = status.as_u16(), "api response");
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().unwrap_or_default();
        Err(ApiFailure::Response {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }

    fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let res = self.send(req)?;
        let status = res.status().as_u16();
        let total_rows = header_u64(res.headers(), "Total-Rows");
        let total_pages = header_u64(res.headers(), "Total-Pages");
        let bytes = res.bytes().map_err(classify_transport)?;
        let data = serde_json::from_slice(&bytes).map_err(|e| ApiFailure::Malformed {
            detail: e.to_string(),
        })?;
        Ok(Reply {
            status,
            data,
            total_rows,
            total_pages,
        })
    }

    fn empty(&self, req: RequestBuilder) -> ApiResult<()> {
        let res = self.send(req)?;
        Ok(Reply::new(res.status().as_u16(), ()))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.json(self.request(Method::GET, path))
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        self.json(self.request(Method::POST, path).json(body))
    }
}

impl MarketplaceApi for HttpApi {
    fn get_user(&self, user_id: u64) -> ApiResult<UserPayload> {
        self.get(&format!("/users/{user_id}"))
    }

    fn get_business(&self, business_id: u64) -> ApiResult<BusinessPayload> {
        self.get(&format!("/businesses/{business_id}"))
    }

    fn register_business(&self, draft: &BusinessDraft) -> ApiResult<BusinessCreated> {
        self.post("/businesses", draft)
    }

    fn sort_listings(
        &self,
        business_id: u64,
        query: &ListingsQuery,
    ) -> ApiResult<Vec<ListingPayload>> {
        self.get(&query.api_path(business_id))
    }

    fn get_listing(&self, business_id: u64, listing_id: u64) -> ApiResult<ListingPayload> {
        self.get(&format!("/businesses/{business_id}/listings/{listing_id}"))
    }

    fn delete_listing(&self, business_id: u64, listing_id: u64) -> ApiResult<()> {
        self.empty(self.request(
            Method::DELETE,
            &format!("/businesses/{business_id}/listings/{listing_id}"),
        ))
    }

    fn toggle_bookmark(&self, listing_id: u64) -> ApiResult<()> {
        self.empty(self.request(Method::PUT, &format!("/listings/{listing_id}/bookmark")))
    }

    fn add_new_card(&self, card: &NewCard) -> ApiResult<CardCreated> {
        self.post("/cards", card)
    }

    fn edit_card(&self, card_id: u64, card: &NewCard) -> ApiResult<()> {
        self.empty(
            self.request(Method::PUT, &format!("/cards/{card_id}"))
                .json(card),
        )
    }

    fn get_card(&self, card_id: u64) -> ApiResult<CardPayload> {
        self.get(&format!("/cards/{card_id}"))
    }

    fn search_keywords(&self, search: &str) -> ApiResult<Vec<KeywordPayload>> {
        let qs = query::query_string([("searchQuery", search.to_string())]);
        self.get(&format!("/keywords/search?{qs}"))
    }

    fn create_keyword(&self, name: &str) -> ApiResult<KeywordCreated> {
        self.post("/keywords", &serde_json::json!({ "name": name }))
    }

    fn upload_image(
        &self,
        target: &ImageTarget,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<ImageRecord> {
        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("images", part);
        let path = format!("/images{}", target.query_params());
        self.json(self.request(Method::POST, &path).multipart(form))
    }

    fn delete_image(&self, target: &ImageTarget, image_id: u64) -> ApiResult<()> {
        self.empty(self.request(Method::DELETE, &target.image_path(image_id)))
    }

    fn set_primary_image(&self, target: &ImageTarget, image_id: u64) -> ApiResult<()> {
        let path = format!("{}/makeprimary", target.image_path(image_id));
        self.empty(self.request(Method::PUT, &path))
    }

    fn sales_report(
        &self,
        business_id: u64,
        query: &SalesReportQuery,
    ) -> ApiResult<Vec<SalesReportEntry>> {
        self.get(&query.api_path(business_id))
    }

    fn search_users(&self, query: &SearchQuery) -> ApiResult<Vec<UserPayload>> {
        self.get(&query.api_path())
    }

    fn search_businesses(&self, query: &SearchQuery) -> ApiResult<Vec<BusinessPayload>> {
        self.get(&query.api_path())
    }

    fn reset_password(&self, token: &str, password: &str) -> ApiResult<()> {
        let qs = query::query_string([("token", token.to_string())]);
        let body = NewPassword {
            password: password.to_string(),
        };
        self.empty(
            self.request(Method::PUT, &format!("/users/forgotPassword?{qs}"))
                .json(&body),
        )
    }
}
