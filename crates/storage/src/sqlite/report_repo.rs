use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use annotate_core::model::{SessionReport, Task};

use super::SqliteRepository;
use crate::repository::{ReportRecord, ReportRepository, ReportRow, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn map_report_row(row: &sqlx::sqlite::SqliteRow) -> Result<SessionReport, StorageError> {
    let record = ReportRecord {
        task: row.try_get("task").map_err(ser)?,
        started_at: row.try_get("started_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        true_positives: u32_from_i64(
            "true_positives",
            row.try_get::<i64, _>("true_positives").map_err(ser)?,
        )?,
        false_positives: u32_from_i64(
            "false_positives",
            row.try_get::<i64, _>("false_positives").map_err(ser)?,
        )?,
        false_negatives: u32_from_i64(
            "false_negatives",
            row.try_get::<i64, _>("false_negatives").map_err(ser)?,
        )?,
        true_negatives: u32_from_i64(
            "true_negatives",
            row.try_get::<i64, _>("true_negatives").map_err(ser)?,
        )?,
    };
    record.into_report()
}

fn map_report_row_with_id(row: &sqlx::sqlite::SqliteRow) -> Result<ReportRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let report = map_report_row(row)?;
    Ok(ReportRow::new(id, report))
}

#[async_trait]
impl ReportRepository for SqliteRepository {
    async fn append_report(&self, report: &SessionReport) -> Result<i64, StorageError> {
        let record = ReportRecord::from_report(report);

        let res = sqlx::query(
            r"
                INSERT INTO reports (
                    task, started_at, completed_at,
                    true_positives, false_positives, false_negatives, true_negatives
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(&record.task)
        .bind(record.started_at)
        .bind(record.completed_at)
        .bind(i64::from(record.true_positives))
        .bind(i64::from(record.false_positives))
        .bind(i64::from(record.false_negatives))
        .bind(i64::from(record.true_negatives))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn get_report(&self, id: i64) -> Result<SessionReport, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, task, started_at, completed_at,
                       true_positives, false_positives, false_negatives, true_negatives
                FROM reports
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_report_row(&row)
    }

    async fn list_reports(
        &self,
        task: Option<Task>,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<ReportRow>, StorageError> {
        let mut sql = String::from(
            r"
                SELECT id, task, started_at, completed_at,
                       true_positives, false_positives, false_negatives, true_negatives
                FROM reports
                WHERE 1 = 1
            ",
        );
        if task.is_some() {
            sql.push_str(" AND task = ?");
        }
        if completed_from.is_some() {
            sql.push_str(" AND completed_at >= ?");
        }
        if completed_until.is_some() {
            sql.push_str(" AND completed_at <= ?");
        }
        sql.push_str(" ORDER BY completed_at DESC, id DESC LIMIT ?");

        let mut query = sqlx::query(&sql);
        if let Some(task) = task {
            query = query.bind(task.discriminator());
        }
        if let Some(from) = completed_from {
            query = query.bind(from);
        }
        if let Some(until) = completed_until {
            query = query.bind(until);
        }
        query = query.bind(i64::from(limit));

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        rows.iter().map(map_report_row_with_id).collect()
    }
}
