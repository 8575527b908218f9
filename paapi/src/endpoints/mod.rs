pub mod get_items;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A PA-API 5 operation: a JSON body POSTed to a fixed path with a fixed
/// `x-amz-target` header.
pub trait Operation: Serialize {
    type Response: DeserializeOwned;

    fn path(&self) -> &'static str;

    fn target(&self) -> &'static str;
}

/// `{"DisplayValue": ...}` wrapper used throughout `ItemInfo`.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayValue<T> {
    pub display_value: T,
}

/// `{"DisplayValues": [...]}` wrapper used for multi-valued attributes.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisplayValues<T> {
    #[serde(default = "Vec::new")]
    pub display_values: Vec<T>,
}
