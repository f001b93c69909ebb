//! Storage layer for inpsyght.
//!
//! This module provides `SQLite`-based persistent storage for answers given
//! while a questionnaire is in progress, and for the reports of completed
//! attempts.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::model::{Answer, Form, LikertValue};
use crate::scoring::Weighting;
use crate::report::Report;

/// Storage engine for answers and history.
///
/// Answers are keyed by form id and question id. Saving an answer for a
/// question that was already answered replaces it without changing its
/// position in [`Storage::load_answers`].
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    /// Initializes the schema if this is a new database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        migrations::initialize_schema(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Save an answer, replacing any earlier answer to the same question.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn save_answer(&self, form_id: &str, answer: &Answer) -> Result<()> {
        self.conn.execute(
            r"
            INSERT INTO answers (
                form_id, question_id, question_text, value, feedback,
                facet_id, factor_id, answered_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT (form_id, question_id) DO UPDATE SET
                question_text = excluded.question_text,
                value = excluded.value,
                feedback = excluded.feedback,
                facet_id = excluded.facet_id,
                factor_id = excluded.factor_id,
                answered_at = excluded.answered_at
            ",
            params![
                form_id,
                answer.question_id,
                answer.question_text,
                answer.value.get(),
                answer.feedback,
                answer.facet_id,
                answer.factor_id,
                answer.answered_at.to_rfc3339(),
            ],
        )?;
        debug!(
            form_id,
            question_id = %answer.question_id,
            value = answer.value.get(),
            "saved answer"
        );
        Ok(())
    }

    /// Load the answers cached for a form, in first-answered order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn load_answers(&self, form_id: &str) -> Result<Vec<Answer>> {
        let mut stmt = self.conn.prepare(
            r"
            SELECT question_id, question_text, value, feedback, facet_id, factor_id, answered_at
            FROM answers WHERE form_id = ?1
            ORDER BY rowid ASC
            ",
        )?;

        let answers = stmt
            .query_map([form_id], Self::row_to_answer)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(answers)
    }

    /// Delete every cached answer for a form.
    ///
    /// Returns the number of answers removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_answers(&self, form_id: &str) -> Result<usize> {
        let affected = self
            .conn
            .execute("DELETE FROM answers WHERE form_id = ?1", [form_id])?;
        if affected > 0 {
            info!(form_id, cleared = affected, "cleared cached answers");
        }
        Ok(affected)
    }

    /// Count cached answers for a form.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn answer_count(&self, form_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM answers WHERE form_id = ?1",
            [form_id],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Store the report of a completed attempt.
    ///
    /// Returns the id of the history entry.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn archive(&self, report: &Report) -> Result<i64> {
        let snapshot = serde_json::to_string(report)?;
        let answer_count = i64::try_from(report.answered).unwrap_or(i64::MAX);

        self.conn.execute(
            r"
            INSERT INTO history (form_id, form_name, completed_at, answer_count, report)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
            params![
                report.document_id,
                report.form_name,
                report.generated_at.to_rfc3339(),
                answer_count,
                snapshot,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, form_id = %report.document_id, "archived attempt");
        Ok(id)
    }

    /// Score the cached answers for `form`, archiving the report when
    /// `archive` is set.
    ///
    /// The outcome is `None` when archiving was not requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoAnswers`] if nothing usable is cached for the form,
    /// or an error if a database operation fails.
    pub fn score_cached(
        &self,
        form: &Form,
        weighting: Weighting,
        archive: bool,
    ) -> Result<(Report, Option<ArchiveOutcome>)> {
        let answers = self.load_answers(&form.document_id)?;
        let report = Report::build(form, &answers, weighting)?;
        let outcome = if archive {
            Some(self.archive_completed(&report)?)
        } else {
            None
        };
        Ok((report, outcome))
    }

    /// Archive a finished attempt unless it is already in history.
    ///
    /// Partial reports are never stored. A report whose answers match the
    /// newest entry for the same form is not stored again.
    ///
    /// # Errors
    ///
    /// Returns an error if a database operation or (de)serialization fails.
    pub fn archive_completed(&self, report: &Report) -> Result<ArchiveOutcome> {
        if !report.is_complete() {
            debug!(
                answered = report.answered,
                total = report.total_questions,
                "partial results not archived"
            );
            return Ok(ArchiveOutcome::Incomplete);
        }

        if let Some((entry, latest)) = self.latest_history(&report.document_id)? {
            if latest.same_attempt(report) {
                debug!(id = entry.id, "attempt already archived");
                return Ok(ArchiveOutcome::AlreadyArchived(entry.id));
            }
        }

        self.archive(report).map(ArchiveOutcome::Archived)
    }

    /// Newest history entry for a form, with its report.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation or deserialization fails.
    pub fn latest_history(&self, form_id: &str) -> Result<Option<(HistoryEntry, Report)>> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM history WHERE form_id = ?1 ORDER BY id DESC LIMIT 1",
                [form_id],
                |row| row.get(0),
            )
            .optional()?;

        id.map(|id| self.get_history(id)).transpose()
    }

    /// List history entries, newest first, optionally for a single form.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_history(&self, form_id: Option<&str>, limit: usize) -> Result<Vec<HistoryEntry>> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut stmt = self.conn.prepare(
            r"
            SELECT id, form_id, form_name, completed_at, answer_count
            FROM history
            WHERE ?1 IS NULL OR form_id = ?1
            ORDER BY id DESC LIMIT ?2
            ",
        )?;

        let entries = stmt
            .query_map(params![form_id, limit_i64], Self::row_to_history)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// Get a history entry together with its archived report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HistoryNotFound`] for unknown ids, or an error if the
    /// database operation or deserialization fails.
    pub fn get_history(&self, id: i64) -> Result<(HistoryEntry, Report)> {
        let row = self
            .conn
            .query_row(
                r"
                SELECT id, form_id, form_name, completed_at, answer_count, report
                FROM history WHERE id = ?1
                ",
                [id],
                |row| Ok((Self::row_to_history(row)?, row.get::<_, String>(5)?)),
            )
            .optional()?;

        let (entry, snapshot) = row.ok_or(Error::HistoryNotFound { id })?;
        let report: Report = serde_json::from_str(&snapshot)?;
        Ok((entry, report))
    }

    /// Delete a history entry.
    ///
    /// Returns `true` if an entry was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_history(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM history WHERE id = ?1", [id])?;
        Ok(affected > 0)
    }

    /// Get database statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn stats(&self) -> Result<StorageStats> {
        let (cached_answers, forms_in_progress): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT form_id) FROM answers",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        let history_entries: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;

        let last_completed: Option<String> = self
            .conn
            .query_row(
                "SELECT completed_at FROM history ORDER BY completed_at DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let db_size_bytes = if self.path.to_string_lossy() == ":memory:" {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            cached_answers,
            forms_in_progress,
            history_entries,
            last_completed: last_completed.and_then(|s| parse_timestamp(&s)),
            db_size_bytes,
        })
    }

    /// Convert a database row to an Answer.
    fn row_to_answer(row: &rusqlite::Row) -> rusqlite::Result<Answer> {
        let value: i64 = row.get(2)?;
        let value = LikertValue::try_from(value).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(e))
        })?;
        let answered_at: String = row.get(6)?;

        Ok(Answer {
            question_id: row.get(0)?,
            question_text: row.get(1)?,
            value,
            feedback: row.get(3)?,
            facet_id: row.get(4)?,
            factor_id: row.get(5)?,
            answered_at: parse_timestamp(&answered_at).unwrap_or_else(|| {
                warn!("Unparseable answer timestamp: {}", answered_at);
                Utc::now()
            }),
        })
    }

    /// Convert a database row to a `HistoryEntry`.
    fn row_to_history(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        let completed_at: String = row.get(3)?;
        let answer_count: i64 = row.get(4)?;

        Ok(HistoryEntry {
            id: row.get(0)?,
            form_id: row.get(1)?,
            form_name: row.get(2)?,
            completed_at: parse_timestamp(&completed_at).unwrap_or_else(|| {
                warn!("Unparseable history timestamp: {}", completed_at);
                Utc::now()
            }),
            answer_count: usize::try_from(answer_count).unwrap_or(0),
        })
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// What [`Storage::archive_completed`] did with a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// Stored as a new history entry with this id.
    Archived(i64),
    /// The newest entry for the form already holds these answers.
    AlreadyArchived(i64),
    /// Some questions are unanswered; nothing was stored.
    Incomplete,
}

/// A completed attempt stored in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    /// Entry id.
    pub id: i64,
    /// Form document id.
    pub form_id: String,
    /// Form name at the time of completion.
    pub form_name: String,
    /// When the attempt was archived.
    pub completed_at: DateTime<Utc>,
    /// Number of scored answers.
    pub answer_count: usize,
}

/// Statistics about the storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Answers cached across all forms.
    pub cached_answers: i64,
    /// Forms with at least one cached answer.
    pub forms_in_progress: i64,
    /// Archived attempts.
    pub history_entries: i64,
    /// Most recent archived attempt.
    pub last_completed: Option<DateTime<Utc>>,
    /// Size of the database file in bytes.
    pub db_size_bytes: u64,
}
