//! JSON bodies exchanged with the marketplace backend.

use serde::{Deserialize, Serialize};

use crate::images::ImageRecord;
use crate::session::UserRole;

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street_number: Option<String>,
    pub street_name: Option<String>,
    pub suburb: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub country: Option<String>,
    pub postcode: Option<String>,
}

impl Address {
    pub fn street_number(&self) -> Option<&str> {
        present(&self.street_number)
    }

    pub fn street_name(&self) -> Option<&str> {
        present(&self.street_name)
    }

    pub fn suburb(&self) -> Option<&str> {
        present(&self.suburb)
    }

    pub fn city(&self) -> Option<&str> {
        present(&self.city)
    }

    pub fn region(&self) -> Option<&str> {
        present(&self.region)
    }

    pub fn country(&self) -> Option<&str> {
        present(&self.country)
    }

    pub fn postcode(&self) -> Option<&str> {
        present(&self.postcode)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPayload {
    pub id: u64,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub home_address: Option<Address>,
}

impl UserPayload {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// `Suburb, City`, either part alone, or `N/A`.
    pub fn location(&self) -> String {
        let Some(addr) = &self.home_address else {
            return "N/A".to_string();
        };
        match (addr.suburb(), addr.city()) {
            (Some(suburb), Some(city)) => format!("{suburb}, {city}"),
            (Some(part), None) | (None, Some(part)) => part.to_string(),
            (None, None) => "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessPayload {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<Address>,
    pub business_type: Option<String>,
    pub primary_administrator_id: Option<u64>,
    pub administrators: Vec<UserPayload>,
    pub currency_symbol: Option<String>,
    pub currency_code: Option<String>,
    pub created: Option<String>,
}

impl BusinessPayload {
    pub fn is_administrator(&self, user_id: u64) -> bool {
        self.primary_administrator_id == Some(user_id)
            || self.administrators.iter().any(|a| a.id == user_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPayload {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub recommended_retail_price: Option<f64>,
    pub created: Option<String>,
    pub images: Vec<ImageRecord>,
    pub business: Option<BusinessPayload>,
    pub barcode: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct InventoryItemPayload {
    pub id: u64,
    pub product: ProductPayload,
    pub quantity: Option<u64>,
    pub price_per_item: Option<f64>,
    pub total_price: Option<f64>,
    pub manufactured: Option<String>,
    pub sell_by: Option<String>,
    pub best_before: Option<String>,
    pub expires: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ListingPayload {
    pub id: u64,
    pub inventory_item: InventoryItemPayload,
    pub quantity: u64,
    pub price: f64,
    pub more_info: Option<String>,
    pub created: Option<String>,
    pub closes: Option<String>,
    pub is_bookmarked: bool,
    pub total_bookmarks: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordPayload {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CardPayload {
    pub id: u64,
    pub creator: Option<UserPayload>,
    pub section: String,
    pub title: String,
    pub description: Option<String>,
    pub keywords: Vec<KeywordPayload>,
    pub created: Option<String>,
    pub display_period_end: Option<String>,
}

/// Body of `POST /cards` and `PUT /cards/{id}`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewCard {
    pub creator_id: u64,
    pub section: String,
    pub title: String,
    pub description: String,
    pub keyword_ids: Vec<u64>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CardCreated {
    pub card_id: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct KeywordCreated {
    pub keyword_id: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SalesReportEntry {
    pub granularity_name: Option<String>,
    pub total_sales: u64,
    pub total_revenue: f64,
}

/// Body of `POST /businesses`.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDraft {
    pub primary_administrator_id: u64,
    pub name: String,
    pub description: String,
    pub address: Address,
    pub business_type: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BusinessCreated {
    pub business_id: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewPassword {
    pub password: String,
}
