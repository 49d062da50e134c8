//! Data materialization: resolving a report-object tree into the plain data
//! document the renderer consumes.
//!
//! The walk is recursive over the report-object tree. Scalar nodes resolve from a
//! literal or the first element of a time-series result; object nodes
//! recurse into fields; array nodes resolve from a literal, index-keyed
//! children, a time-series query, or the device inventory. Keys whose node
//! resolves to nothing are omitted rather than emitted empty.
//!
//! Any upstream error aborts the whole pass; a partial document is never
//! returned. An empty time-series result for a scalar is not an error --
//! the key is simply omitted.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Map, Value};

use tabula_apis::{DevicesClient, TimeseriesClient};
use tabula_core::auth::Claims;
use tabula_core::report::ReportObject;
use tabula_core::rolling::rewrite_rolling_window;
use tabula_core::CoreError;

use crate::error::EngineError;
use crate::metrics::DatapointCounter;

pub struct Materializer<'a> {
    timeseries: &'a TimeseriesClient,
    devices: &'a DevicesClient,
    metrics: &'a DatapointCounter,
}

struct WalkContext<'c> {
    auth: &'c str,
    user_id: &'c str,
    report_id: &'c str,
    now: DateTime<Utc>,
}

impl<'a> Materializer<'a> {
    pub fn new(
        timeseries: &'a TimeseriesClient,
        devices: &'a DevicesClient,
        metrics: &'a DatapointCounter,
    ) -> Self {
        Self {
            timeseries,
            devices,
            metrics,
        }
    }

    /// Materialize a report-object tree into the renderer's data document. `now` is
    /// the reference instant for rolling-window rewriting.
    pub async fn materialize(
        &self,
        data: &BTreeMap<String, ReportObject>,
        auth: &str,
        report_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Map<String, Value>, EngineError> {
        let claims = Claims::parse(auth)?;
        let ctx = WalkContext {
            auth,
            user_id: &claims.sub,
            report_id,
            now,
        };
        self.walk(data, &ctx).await
    }

    fn walk<'b>(
        &'b self,
        data: &'b BTreeMap<String, ReportObject>,
        ctx: &'b WalkContext<'b>,
    ) -> BoxFuture<'b, Result<Map<String, Value>, EngineError>> {
        async move {
            let mut result = Map::new();
            for (key, node) in data {
                match node.value_type.as_str() {
                    "string" | "int" | "float" | "float64" => {
                        if let Some(value) = &node.value {
                            result.insert(key.clone(), value.clone());
                        } else if node.query.is_some() {
                            let values = self.run_query(node, ctx).await?;
                            if let Some(first) = values.into_iter().next() {
                                result.insert(key.clone(), first);
                            }
                        }
                    }
                    "object" => {
                        let nested = self.walk(&node.fields, ctx).await?;
                        if !nested.is_empty() {
                            result.insert(key.clone(), Value::Object(nested));
                        }
                    }
                    "array" => {
                        if let Some(value) = &node.value {
                            result.insert(key.clone(), value.clone());
                        } else if !node.children.is_empty() {
                            let nested = self.walk(&node.children, ctx).await?;
                            let items = into_ordered_sequence(nested)?;
                            if !items.is_empty() {
                                result.insert(key.clone(), Value::Array(items));
                            }
                        } else if node.query.is_some() {
                            let values = self.run_query(node, ctx).await?;
                            result.insert(key.clone(), Value::Array(values));
                        } else if let Some(device_query) = &node.device_query {
                            let last = device_query.last.clone().unwrap_or_default();
                            let devices = self.devices.query(ctx.auth, &last).await?;
                            result.insert(key.clone(), Value::Array(devices));
                        }
                    }
                    // Other inferred tags carry no resolver; the key is omitted.
                    _ => {}
                }
            }
            Ok(result)
        }
        .boxed()
    }

    /// Run a node's time-series query after rewriting its rolling window on
    /// a working copy. The stored report is never mutated.
    async fn run_query(
        &self,
        node: &ReportObject,
        ctx: &WalkContext<'_>,
    ) -> Result<Vec<Value>, EngineError> {
        let mut working = node.clone();
        rewrite_rolling_window(&mut working, ctx.now)?;
        let Some(query) = working.query.as_ref() else {
            return Ok(Vec::new());
        };

        let rows = self
            .timeseries
            .query(ctx.auth, query, working.query_options.as_ref())
            .await?;
        self.metrics
            .add(ctx.user_id, ctx.report_id, rows.len() as u64);
        Ok(filter_null_datapoints(rows))
    }
}

/// Convert an index-keyed mapping into a sequence ordered by numeric index.
fn into_ordered_sequence(mapping: Map<String, Value>) -> Result<Vec<Value>, EngineError> {
    let mut items: Vec<(usize, Value)> = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let index: usize = key.parse().map_err(|_| {
            CoreError::Validation(format!("array child key '{key}' is not a numeric index"))
        })?;
        items.push((index, value));
    }
    items.sort_by_key(|(index, _)| *index);
    Ok(items.into_iter().map(|(_, value)| value).collect())
}

/// Replace null data points with `0`, preserving order.
fn filter_null_datapoints(values: Vec<Value>) -> Vec<Value> {
    values
        .into_iter()
        .map(|value| if value.is_null() { json!(0) } else { value })
        .collect()
}
