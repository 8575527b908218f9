use super::{DisplayValue, DisplayValues, Operation};
use crate::macros::setter;
use serde::{Deserialize, Serialize};

pub const GET_ITEMS_PATH: &str = "/paapi5/getitems";
pub const GET_ITEMS_TARGET: &str = "com.amazon.paapi5.v1.ProductAdvertisingAPIv1.GetItems";

pub const RESOURCE_TITLE: &str = "ItemInfo.Title";
pub const RESOURCE_FEATURES: &str = "ItemInfo.Features";

// Requests

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItems {
    item_ids: Vec<String>,
    resources: Vec<String>,
    partner_tag: String,
    partner_type: String,
    marketplace: String,
}

impl GetItems {
    pub fn new(item_id: impl Into<String>, partner_tag: impl Into<String>) -> Self {
        Self {
            item_ids: vec![item_id.into()],
            resources: vec![RESOURCE_TITLE.to_string(), RESOURCE_FEATURES.to_string()],
            partner_tag: partner_tag.into(),
            partner_type: "Associates".to_string(),
            marketplace: "www.amazon.com".to_string(),
        }
    }

    setter!(marketplace: String);
}

impl Operation for GetItems {
    type Response = GetItemsResponse;

    fn path(&self) -> &'static str {
        GET_ITEMS_PATH
    }

    fn target(&self) -> &'static str {
        GET_ITEMS_TARGET
    }
}

// Responses

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetItemsResponse {
    #[serde(default)]
    pub items_result: Option<ItemsResult>,
}

impl GetItemsResponse {
    pub fn into_first_item(self) -> Option<Item> {
        self.items_result
            .and_then(|result| result.items.into_iter().next())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemsResult {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Item {
    #[serde(rename = "ASIN", default)]
    pub asin: Option<String>,
    #[serde(rename = "DetailPageURL", default)]
    pub detail_page_url: Option<String>,
    #[serde(default)]
    pub item_info: Option<ItemInfoResources>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ItemInfoResources {
    #[serde(default)]
    pub title: Option<DisplayValue<String>>,
    #[serde(default)]
    pub features: Option<DisplayValues<String>>,
}

/// The subset of an item this crate's callers care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub asin: String,
    /// Affiliate detail page URL; absent when the API did not return one.
    pub url: Option<String>,
    /// Empty when the item has no title resource.
    pub title: String,
    pub features: Vec<String>,
}

impl ItemSummary {
    pub fn from_item(asin: &str, item: Item) -> Self {
        let info = item.item_info;
        let title = info
            .as_ref()
            .and_then(|i| i.title.as_ref())
            .map(|t| t.display_value.clone())
            .unwrap_or_default();
        let features = info
            .and_then(|i| i.features)
            .map(|f| f.display_values)
            .unwrap_or_default();

        Self {
            asin: asin.to_string(),
            url: item.detail_page_url.filter(|url| !url.is_empty()),
            title,
            features,
        }
    }
}
