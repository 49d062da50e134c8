//! Client for the time-series query service.
//!
//! Queries go out as a single-element batch to `/db/v3/queries/v2`; the
//! response nests rows as `[{data: [[[ts, v, ...], ...]]}]`. Result shaping
//! (`resultObject`) happens here so the materializer only ever sees a flat
//! list of values.

use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;

use tabula_core::report::{QueryOptions, TimeseriesQuery};

use crate::error::ApiError;

pub const RESULT_OBJECT_KEY: &str = "key";
pub const RESULT_OBJECT_ARRAY: &str = "array";

/// Default column read from each row when no shaping is requested: index 1,
/// the first value column after the timestamp.
const DEFAULT_VALUE_COLUMN: usize = 1;

#[derive(Debug, Deserialize)]
struct QueriesResponseElement {
    #[serde(default)]
    data: Vec<Vec<Vec<Value>>>,
}

/// HTTP client for the time-series service.
pub struct TimeseriesClient {
    client: reqwest::Client,
    base_url: String,
}

impl TimeseriesClient {
    pub fn new(url: &str, port: i64) -> Self {
        Self::with_base_url(format!("{url}:{port}"))
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Run one query and shape each returned row into a single value
    /// according to `options.resultObject`.
    pub async fn query(
        &self,
        auth: &str,
        query: &TimeseriesQuery,
        options: Option<&QueryOptions>,
    ) -> Result<Vec<Value>, ApiError> {
        if !query.is_valid() {
            return Err(ApiError::InvalidQuery(
                "time-series query needs a data source and a time window".into(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/db/v3/queries/v2", self.base_url))
            .header(AUTHORIZATION, auth)
            .json(&[query])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::from_response(response).await);
        }

        let parsed = response.json::<Vec<QueriesResponseElement>>().await?;
        let rows = parsed
            .into_iter()
            .next()
            .and_then(|element| element.data.into_iter().next())
            .ok_or_else(|| ApiError::Malformed("time-series response carries no result set".into()))?;

        let mut shaped = Vec::with_capacity(rows.len());
        for row in rows {
            shaped.push(shape_row(row, options)?);
        }
        Ok(shaped)
    }
}

fn shape_row(row: Vec<Value>, options: Option<&QueryOptions>) -> Result<Value, ApiError> {
    let pick = |index: usize, row: Vec<Value>| {
        let len = row.len();
        row.into_iter().nth(index).ok_or_else(|| {
            ApiError::Malformed(format!("row has {len} columns, wanted index {index}"))
        })
    };

    match options.and_then(|o| o.result_object.as_deref()) {
        Some(RESULT_OBJECT_KEY) => {
            let index = options.and_then(|o| o.result_key).unwrap_or(0);
            pick(index, row)
        }
        Some(RESULT_OBJECT_ARRAY) => Ok(Value::Array(row)),
        _ => pick(DEFAULT_VALUE_COLUMN, row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabula_core::report::QueryTime;

    fn valid_query() -> TimeseriesQuery {
        TimeseriesQuery {
            device_id: Some("d1".into()),
            service_id: Some("s1".into()),
            time: Some(QueryTime {
                last: Some("24h".into()),
                ..QueryTime::default()
            }),
            ..TimeseriesQuery::default()
        }
    }

    fn response_body() -> String {
        json!([{"data": [[
            ["2024-07-01T00:00:00Z", 5.0, 7.0],
            ["2024-07-01T01:00:00Z", null, 9.0],
            ["2024-07-01T02:00:00Z", 3.0, 11.0]
        ]]}])
        .to_string()
    }

    #[tokio::test]
    async fn default_shaping_reads_column_one() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/db/v3/queries/v2")
            .match_header("authorization", "Bearer t")
            .with_body(response_body())
            .create_async()
            .await;

        let client = TimeseriesClient::with_base_url(server.url());
        let values = client
            .query("Bearer t", &valid_query(), None)
            .await
            .expect("query");
        mock.assert_async().await;
        assert_eq!(values, vec![json!(5.0), json!(null), json!(3.0)]);
    }

    #[tokio::test]
    async fn key_shaping_reads_the_requested_column() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/v3/queries/v2")
            .with_body(response_body())
            .create_async()
            .await;

        let client = TimeseriesClient::with_base_url(server.url());
        let options = QueryOptions {
            result_object: Some(RESULT_OBJECT_KEY.into()),
            result_key: Some(2),
            ..QueryOptions::default()
        };
        let values = client
            .query("Bearer t", &valid_query(), Some(&options))
            .await
            .expect("query");
        assert_eq!(values, vec![json!(7.0), json!(9.0), json!(11.0)]);
    }

    #[tokio::test]
    async fn array_shaping_keeps_whole_rows() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/v3/queries/v2")
            .with_body(response_body())
            .create_async()
            .await;

        let client = TimeseriesClient::with_base_url(server.url());
        let options = QueryOptions {
            result_object: Some(RESULT_OBJECT_ARRAY.into()),
            ..QueryOptions::default()
        };
        let values = client
            .query("Bearer t", &valid_query(), Some(&options))
            .await
            .expect("query");
        assert_eq!(values[0], json!(["2024-07-01T00:00:00Z", 5.0, 7.0]));
        assert_eq!(values.len(), 3);
    }

    #[tokio::test]
    async fn invalid_queries_are_rejected_locally() {
        let client = TimeseriesClient::with_base_url("http://127.0.0.1:1".into());
        let err = client
            .query("Bearer t", &TimeseriesQuery::default(), None)
            .await
            .expect_err("must fail");
        assert!(matches!(err, ApiError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn upstream_failures_carry_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/v3/queries/v2")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let client = TimeseriesClient::with_base_url(server.url());
        let err = client
            .query("Bearer t", &valid_query(), None)
            .await
            .expect_err("must fail");
        match err {
            ApiError::Api { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn out_of_range_result_key_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/db/v3/queries/v2")
            .with_body(response_body())
            .create_async()
            .await;

        let client = TimeseriesClient::with_base_url(server.url());
        let options = QueryOptions {
            result_object: Some(RESULT_OBJECT_KEY.into()),
            result_key: Some(9),
            ..QueryOptions::default()
        };
        let err = client
            .query("Bearer t", &valid_query(), Some(&options))
            .await
            .expect_err("must fail");
        assert!(matches!(err, ApiError::Malformed(_)));
    }
}
