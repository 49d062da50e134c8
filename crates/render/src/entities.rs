//! Wire-format structs for the jsreport OData surface.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct TemplateListResponse {
    #[serde(default, rename = "value")]
    pub templates: Vec<JsTemplate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JsTemplate {
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// jsreport rendering recipe, e.g. `chrome-pdf` or `xlsx`.
    #[serde(default)]
    pub recipe: String,
    #[serde(default)]
    pub data: Option<ShortIdRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShortIdRef {
    #[serde(default)]
    pub shortid: String,
}

#[derive(Debug, Deserialize)]
pub struct DataListResponse {
    #[serde(default, rename = "value")]
    pub entries: Vec<JsData>,
}

#[derive(Debug, Default, Deserialize)]
pub struct JsData {
    #[serde(default, rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "dataJson")]
    pub data_json: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: String,
}
