//! Row model and query arguments for the `reports` table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

use tabula_core::error::CoreError;
use tabula_core::report::{Report, ReportFile, ReportObject};

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow)]
pub struct ReportRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub template_id: String,
    pub template_name: String,
    pub data: Json<BTreeMap<String, ReportObject>>,
    pub report_files: Json<Vec<StoredReportFile>>,
    pub cron: String,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub email_receivers: Json<Vec<String>>,
    pub email_subject: String,
    pub email_text: String,
    pub email_html: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Artifact entry as persisted. Unlike the wire form this keeps the opaque
/// renderer `link`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredReportFile {
    pub id: String,
    #[serde(default)]
    pub link: String,
    #[serde(rename = "type", default)]
    pub file_type: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&ReportFile> for StoredReportFile {
    fn from(file: &ReportFile) -> Self {
        StoredReportFile {
            id: file.id.clone(),
            link: file.link.clone(),
            file_type: file.file_type.clone(),
            created_at: file.created_at,
        }
    }
}

impl From<StoredReportFile> for ReportFile {
    fn from(stored: StoredReportFile) -> Self {
        ReportFile {
            id: stored.id,
            link: stored.link,
            file_type: stored.file_type,
            created_at: stored.created_at,
        }
    }
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Report {
            id: row.id,
            name: row.name,
            template_id: row.template_id,
            template_name: row.template_name,
            user_id: row.user_id,
            data: row.data.0,
            report_files: Some(row.report_files.0.into_iter().map(ReportFile::from).collect()),
            cron: row.cron,
            scheduled_for: row.scheduled_for,
            email_receivers: row.email_receivers.0,
            email_subject: row.email_subject,
            email_text: row.email_text,
            email_html: row.email_html,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

/// Recognized list arguments: `limit`, `offset`, `order`, `search`.
#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order: Option<SortOrder>,
    /// Case-insensitive substring match on the report id.
    pub search: Option<String>,
}

/// A parsed `field:asc|desc` ordering over the sortable column whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: SortColumn,
    pub descending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortColumn {
    Id,
    Name,
    CreatedAt,
    UpdatedAt,
    ScheduledFor,
}

impl SortColumn {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Name => "name",
            SortColumn::CreatedAt => "created_at",
            SortColumn::UpdatedAt => "updated_at",
            SortColumn::ScheduledFor => "scheduled_for",
        }
    }
}

impl SortOrder {
    /// Parse `field:asc|desc`; a missing direction means ascending.
    pub fn parse(input: &str) -> Result<SortOrder, CoreError> {
        let (field, direction) = input.split_once(':').unwrap_or((input, "asc"));
        let column = match field {
            "id" => SortColumn::Id,
            "name" => SortColumn::Name,
            "createdAt" | "created_at" => SortColumn::CreatedAt,
            "updatedAt" | "updated_at" => SortColumn::UpdatedAt,
            "scheduledFor" | "scheduled_for" => SortColumn::ScheduledFor,
            other => {
                return Err(CoreError::Validation(format!(
                    "unsupported order field '{other}'"
                )))
            }
        };
        Ok(SortOrder {
            column,
            descending: direction == "desc",
        })
    }
}
