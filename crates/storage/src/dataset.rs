//! Record-oriented dataset files: JSON arrays, JSON lines, and CSV.
//!
//! Field mapping to domain `Item`s lives here so the services layer never
//! sees raw dataset schemas. Fake-news records carry a `label` string
//! ("Real"/"Fake") and a `title`; hate-speech records carry a numeric `HS`
//! column. The optional `target` column is produced by the pre-labeling
//! pipeline.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use annotate_core::model::{Item, ItemError, ItemId, Label, LabelError, Task};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DatasetError {
    #[error("failed to read dataset file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CSV record: {0}")]
    Csv(#[from] csv::Error),

    #[error("record {index} has no usable label for task '{task}'")]
    MissingLabel { index: usize, task: Task },

    #[error("record {index} has unknown label '{raw}'")]
    UnknownLabel { index: usize, raw: String },

    #[error(transparent)]
    InvalidLabelValue(#[from] LabelError),

    #[error(transparent)]
    InvalidItem(#[from] ItemError),
}

//
// ─── RECORDS ──────────────────────────────────────────────────────────────────
//

/// One raw dataset record, covering both task schemas.
///
/// Unknown columns (ids, aggressiveness flags, ...) are ignored on read and
/// absent fields stay absent on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,

    pub text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Fake-news gold label, "Real" or "Fake".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Hate-speech gold label, 0 or 1.
    #[serde(rename = "HS", default, skip_serializing_if = "Option::is_none")]
    pub hs: Option<u8>,

    /// Pre-labeled target of hate, filled in by the pre-labeling pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl DatasetRecord {
    /// Whether this record belongs to the given task.
    ///
    /// Records with an explicit `task` discriminator are matched on it;
    /// records without one (e.g. single-task CSV exports) are matched on
    /// whether they carry the task's label field.
    #[must_use]
    pub fn matches_task(&self, task: Task) -> bool {
        match self.task.as_deref() {
            Some(discriminator) => discriminator.eq_ignore_ascii_case(task.discriminator()),
            None => match task {
                Task::FakeNews => self.label.is_some(),
                Task::HateSpeech => self.hs.is_some(),
            },
        }
    }

    /// Whether the record's hate-speech gold label is positive.
    #[must_use]
    pub fn is_hateful(&self) -> bool {
        self.hs == Some(1)
    }

    /// Map the record to a domain item under the given task's schema.
    ///
    /// # Errors
    ///
    /// Returns `DatasetError` when the task's label field is missing or
    /// unreadable, or when the text fails item validation.
    pub fn to_item(&self, index: usize, task: Task) -> Result<Item, DatasetError> {
        let gold = match task {
            Task::FakeNews => {
                let raw = self
                    .label
                    .as_deref()
                    .ok_or(DatasetError::MissingLabel { index, task })?;
                parse_news_label(raw).ok_or_else(|| DatasetError::UnknownLabel {
                    index,
                    raw: raw.to_string(),
                })?
            }
            Task::HateSpeech => {
                let value = self.hs.ok_or(DatasetError::MissingLabel { index, task })?;
                Label::from_u8(value)?
            }
        };

        let headline = if task.has_headline() {
            self.title.clone()
        } else {
            None
        };

        Ok(Item::new(ItemId::new(index as u64), self.text.clone(), headline, gold)?)
    }
}

fn parse_news_label(raw: &str) -> Option<Label> {
    if raw.eq_ignore_ascii_case("real") {
        Some(Label::Positive)
    } else if raw.eq_ignore_ascii_case("fake") {
        Some(Label::Negative)
    } else {
        None
    }
}

//
// ─── READERS ──────────────────────────────────────────────────────────────────
//

/// Read records from a JSON file, accepting either a top-level array or
/// JSON lines.
///
/// # Errors
///
/// Returns `DatasetError` if the file cannot be read or a record fails to
/// parse.
pub fn read_json(path: impl AsRef<Path>) -> Result<Vec<DatasetRecord>, DatasetError> {
    let contents = std::fs::read_to_string(path)?;
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut records = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        records.push(serde_json::from_str(line)?);
    }
    Ok(records)
}

/// Read records from a CSV file with a header row.
///
/// # Errors
///
/// Returns `DatasetError` if the file cannot be read or a row fails to
/// deserialize.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Vec<DatasetRecord>, DatasetError> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// Read records from a file, dispatching on the `.csv` extension.
///
/// # Errors
///
/// Returns `DatasetError` on read or parse failures.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<DatasetRecord>, DatasetError> {
    let path = path.as_ref();
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
    {
        read_csv(path)
    } else {
        read_json(path)
    }
}

//
// ─── WRITERS ──────────────────────────────────────────────────────────────────
//

/// Write records as a JSON array.
///
/// # Errors
///
/// Returns `DatasetError` on I/O or serialization failures.
pub fn write_json(path: impl AsRef<Path>, records: &[DatasetRecord]) -> Result<(), DatasetError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Write records as JSON lines, one record per line.
///
/// # Errors
///
/// Returns `DatasetError` on I/O or serialization failures.
pub fn write_jsonl(path: impl AsRef<Path>, records: &[DatasetRecord]) -> Result<(), DatasetError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read back a JSON-lines file for inspection in tests and tooling.
///
/// # Errors
///
/// Returns `DatasetError` on read or parse failures.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<Vec<DatasetRecord>, DatasetError> {
    let file = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in file.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn news_record(label: &str) -> DatasetRecord {
        DatasetRecord {
            task: Some("fake news".into()),
            text: "article body".into(),
            title: Some("Headline".into()),
            label: Some(label.into()),
            hs: None,
            target: None,
        }
    }

    fn tweet_record(hs: u8) -> DatasetRecord {
        DatasetRecord {
            task: Some("hate speech".into()),
            text: "some tweet".into(),
            title: None,
            label: None,
            hs: Some(hs),
            target: None,
        }
    }

    #[test]
    fn news_record_maps_label_and_headline() {
        let item = news_record("Real").to_item(3, Task::FakeNews).unwrap();
        assert_eq!(item.gold(), Label::Positive);
        assert_eq!(item.headline(), Some("Headline"));
        assert_eq!(item.id().value(), 3);

        let item = news_record("fake").to_item(0, Task::FakeNews).unwrap();
        assert_eq!(item.gold(), Label::Negative);
    }

    #[test]
    fn tweet_record_maps_hs_and_drops_headline() {
        let mut record = tweet_record(1);
        record.title = Some("should be ignored".into());
        let item = record.to_item(0, Task::HateSpeech).unwrap();
        assert_eq!(item.gold(), Label::Positive);
        assert_eq!(item.headline(), None);
    }

    #[test]
    fn missing_label_field_is_an_error() {
        let mut record = news_record("Real");
        record.label = None;
        let err = record.to_item(5, Task::FakeNews).unwrap_err();
        assert!(matches!(err, DatasetError::MissingLabel { index: 5, .. }));
    }

    #[test]
    fn unknown_label_string_is_an_error() {
        let err = news_record("Satire").to_item(0, Task::FakeNews).unwrap_err();
        assert!(matches!(err, DatasetError::UnknownLabel { .. }));
    }

    #[test]
    fn out_of_range_hs_value_is_an_error() {
        let err = tweet_record(4).to_item(0, Task::HateSpeech).unwrap_err();
        assert!(matches!(err, DatasetError::InvalidLabelValue(_)));
    }

    #[test]
    fn matches_task_uses_discriminator_or_label_shape() {
        assert!(news_record("Real").matches_task(Task::FakeNews));
        assert!(!news_record("Real").matches_task(Task::HateSpeech));

        let mut headerless = tweet_record(0);
        headerless.task = None;
        assert!(headerless.matches_task(Task::HateSpeech));
        assert!(!headerless.matches_task(Task::FakeNews));
    }

    #[test]
    fn json_reader_accepts_arrays_and_lines() {
        let dir = tempfile::tempdir().unwrap();

        let array_path = dir.path().join("data.json");
        std::fs::write(
            &array_path,
            r#"[{"task":"hate speech","text":"a","HS":1},{"task":"hate speech","text":"b","HS":0}]"#,
        )
        .unwrap();
        let records = read_json(&array_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].hs, Some(1));

        let lines_path = dir.path().join("data.jsonl");
        std::fs::write(
            &lines_path,
            "{\"text\":\"a\",\"HS\":1}\n\n{\"text\":\"b\",\"HS\":0}\n",
        )
        .unwrap();
        let records = read_json(&lines_path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].text, "b");
    }

    #[test]
    fn csv_reader_ignores_unknown_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tweets.csv");
        std::fs::write(&path, "id,text,HS,TR,AG\n201,hello there,0,0,0\n202,bad tweet,1,1,0\n")
            .unwrap();

        let records = read_csv(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "hello there");
        assert!(records[1].is_hateful());
    }

    #[test]
    fn jsonl_writer_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let records = vec![tweet_record(1), tweet_record(0)];

        write_jsonl(&path, &records).unwrap();
        let loaded = read_jsonl(&path).unwrap();

        assert_eq!(loaded, records);
    }
}
