//! The report model: the user-authored resolver tree and its persisted envelope.
//!
//! A [`ReportObject`] mirrors the template's schema tree but adds a resolver
//! to each node: a literal value, a time-series query, a device-inventory
//! query, or recursion into fields/children. The wire format keeps the flat
//! layout (type tag plus optional resolvers side by side) for compatibility
//! with stored reports.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A node of the user-authored report definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value_type: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub length: usize,
    /// Literal resolver: emit this value verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Time-series resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<TimeseriesQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_options: Option<QueryOptions>,
    /// Device-inventory resolver.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_query: Option<DeviceQuery>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, ReportObject>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, ReportObject>,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

/// Options shaping how a time-series query is rewritten and its result read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    /// `"month"` or `"year"`: reassemble the window start on every run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_end_date: Option<String>,
    /// Minutes subtracted before and re-added after the reassembly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<i64>,
    /// `"key"`, `"array"`, or absent for the default column selection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_key: Option<usize>,
}

/// Projection of the device inventory: which activity log window to read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
}

/// A time-series query request, passed through to the time-series service.
///
/// Only the fields this service needs to touch (the time window and the
/// column list) are modeled; everything else the frontend puts into the
/// query survives in `extra` and is forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeseriesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<QueryTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<QueryColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryColumn {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub math: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl TimeseriesQuery {
    /// A query is dispatchable when it names a data source and a time window.
    pub fn is_valid(&self) -> bool {
        let has_source =
            (self.device_id.is_some() && self.service_id.is_some()) || self.export_id.is_some();
        let has_window = self
            .time
            .as_ref()
            .is_some_and(|t| t.last.is_some() || (t.start.is_some() && t.end.is_some()));
        has_source && has_window
    }
}

/// A rendered artifact registered on a report.
///
/// `link` is an opaque renderer pointer kept server-side only; it is never
/// serialized to clients.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFile {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(skip)]
    pub link: String,
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "type")]
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// The persisted report: resolver tree, schedule, artifacts, mail settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template_name: String,
    /// Owner; always derived from the caller's token, never from the body.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub user_id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, ReportObject>,
    /// `None` on a write means "preserve the stored list" (partial update);
    /// this is why the field is optional rather than defaulting to empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_files: Option<Vec<ReportFile>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cron: String,
    /// Next scheduled fire; internal state, not part of the wire format.
    #[serde(skip)]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub email_receivers: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email_subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty", rename = "emailHTML")]
    pub email_html: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
