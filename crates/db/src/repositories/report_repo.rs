//! Repository for the `reports` table.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::QueryBuilder;

use tabula_core::report::Report;

use crate::models::{ListArgs, ReportRow, StoredReportFile};
use crate::DbPool;

const COLUMNS: &str = "id, user_id, name, template_id, template_name, data, report_files, \
     cron, scheduled_for, email_receivers, email_subject, email_text, email_html, \
     created_at, updated_at";

/// CRUD operations for report models. The repository is deliberately dumb:
/// ids, ownership, and schedule computation are the engine's responsibility.
pub struct ReportRepo;

impl ReportRepo {
    /// Insert a new report row. Fails if the id already exists.
    pub async fn insert(pool: &DbPool, report: &Report) -> Result<(), sqlx::Error> {
        let query = format!(
            "INSERT INTO reports ({COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
        );
        sqlx::query(&query)
            .bind(&report.id)
            .bind(&report.user_id)
            .bind(&report.name)
            .bind(&report.template_id)
            .bind(&report.template_name)
            .bind(Json(&report.data))
            .bind(Json(stored_files(report)))
            .bind(&report.cron)
            .bind(report.scheduled_for)
            .bind(Json(&report.email_receivers))
            .bind(&report.email_subject)
            .bind(&report.email_text)
            .bind(&report.email_html)
            .bind(report.created_at.unwrap_or_else(Utc::now))
            .bind(report.updated_at.unwrap_or_else(Utc::now))
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Replace the row matching `(id, user_id)`, inserting when no such row
    /// exists. Ownership is part of the match, so a caller can never take
    /// over another user's record -- an insert attempt on a foreign id fails
    /// on the primary key instead.
    pub async fn upsert(pool: &DbPool, report: &Report) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            "UPDATE reports SET \
                name = ?3, template_id = ?4, template_name = ?5, data = ?6, \
                report_files = ?7, cron = ?8, scheduled_for = ?9, \
                email_receivers = ?10, email_subject = ?11, email_text = ?12, \
                email_html = ?13, created_at = ?14, updated_at = ?15 \
             WHERE id = ?1 AND user_id = ?2",
        )
        .bind(&report.id)
        .bind(&report.user_id)
        .bind(&report.name)
        .bind(&report.template_id)
        .bind(&report.template_name)
        .bind(Json(&report.data))
        .bind(Json(stored_files(report)))
        .bind(&report.cron)
        .bind(report.scheduled_for)
        .bind(Json(&report.email_receivers))
        .bind(&report.email_subject)
        .bind(&report.email_text)
        .bind(&report.email_html)
        .bind(report.created_at.unwrap_or_else(Utc::now))
        .bind(report.updated_at.unwrap_or_else(Utc::now))
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            Self::insert(pool, report).await?;
        }
        Ok(())
    }

    /// Find a report by id, scoped to `owner` unless `None` (admin access).
    pub async fn find_by_id(
        pool: &DbPool,
        id: &str,
        owner: Option<&str>,
    ) -> Result<Option<Report>, sqlx::Error> {
        let row: Option<ReportRow> = match owner {
            Some(user_id) => {
                let query =
                    format!("SELECT {COLUMNS} FROM reports WHERE id = ?1 AND user_id = ?2");
                sqlx::query_as(&query)
                    .bind(id)
                    .bind(user_id)
                    .fetch_optional(pool)
                    .await?
            }
            None => {
                let query = format!("SELECT {COLUMNS} FROM reports WHERE id = ?1");
                sqlx::query_as(&query).bind(id).fetch_optional(pool).await?
            }
        };
        Ok(row.map(Report::from))
    }

    /// List reports scoped to `owner` (`None` bypasses ownership scoping),
    /// applying the recognized list arguments.
    pub async fn list(
        pool: &DbPool,
        owner: Option<&str>,
        args: &ListArgs,
    ) -> Result<Vec<Report>, sqlx::Error> {
        let mut builder = QueryBuilder::new(format!("SELECT {COLUMNS} FROM reports WHERE 1 = 1"));
        if let Some(user_id) = owner {
            builder.push(" AND user_id = ");
            builder.push_bind(user_id);
        }
        if let Some(search) = &args.search {
            builder.push(" AND id LIKE ");
            builder.push_bind(format!("%{}%", escape_like(search)));
            builder.push(" ESCAPE '\\'");
        }
        if let Some(order) = &args.order {
            builder.push(" ORDER BY ");
            builder.push(order.column.as_sql());
            builder.push(if order.descending { " DESC" } else { " ASC" });
        }
        match (args.limit, args.offset) {
            (Some(limit), offset) => {
                builder.push(" LIMIT ");
                builder.push_bind(limit);
                if let Some(offset) = offset {
                    builder.push(" OFFSET ");
                    builder.push_bind(offset);
                }
            }
            (None, Some(offset)) => {
                // SQLite only accepts OFFSET together with LIMIT.
                builder.push(" LIMIT -1 OFFSET ");
                builder.push_bind(offset);
            }
            (None, None) => {}
        }

        let rows: Vec<ReportRow> = builder.build_query_as().fetch_all(pool).await?;
        Ok(rows.into_iter().map(Report::from).collect())
    }

    /// Delete a report row, scoped to `owner` unless `None`. Returns whether
    /// a row was removed.
    pub async fn delete(
        pool: &DbPool,
        id: &str,
        owner: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let result = match owner {
            Some(user_id) => {
                sqlx::query("DELETE FROM reports WHERE id = ?1 AND user_id = ?2")
                    .bind(id)
                    .bind(user_id)
                    .execute(pool)
                    .await?
            }
            None => {
                sqlx::query("DELETE FROM reports WHERE id = ?1")
                    .bind(id)
                    .execute(pool)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    /// All reports whose schedule has elapsed.
    pub async fn find_due(pool: &DbPool, now: DateTime<Utc>) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports \
             WHERE scheduled_for IS NOT NULL AND scheduled_for < ?1"
        );
        let rows: Vec<ReportRow> = sqlx::query_as(&query).bind(now).fetch_all(pool).await?;
        Ok(rows.into_iter().map(Report::from).collect())
    }
}

fn stored_files(report: &Report) -> Vec<StoredReportFile> {
    report
        .report_files
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(StoredReportFile::from)
        .collect()
}

fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
