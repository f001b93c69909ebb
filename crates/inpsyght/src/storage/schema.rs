//! `SQLite` schema definitions for inpsyght.
//!
//! This module contains the SQL statements for creating and managing
//! the database schema.

/// SQL statement to create the answers table.
///
/// One row per answered question per form; re-answering updates the row in
/// place so `rowid` keeps first-answered order.
pub const CREATE_ANSWERS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS answers (
    form_id TEXT NOT NULL,
    question_id TEXT NOT NULL,
    question_text TEXT NOT NULL,
    value INTEGER NOT NULL CHECK (value BETWEEN 1 AND 5),
    feedback TEXT NOT NULL,
    facet_id TEXT NOT NULL,
    factor_id TEXT NOT NULL,
    answered_at TEXT NOT NULL,
    PRIMARY KEY (form_id, question_id)
)
";

/// SQL statement to create an index on `form_id` for per-form queries.
pub const CREATE_ANSWERS_FORM_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_answers_form ON answers(form_id)
";

/// SQL statement to create the history table for completed attempts.
pub const CREATE_HISTORY_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    form_id TEXT NOT NULL,
    form_name TEXT NOT NULL,
    completed_at TEXT NOT NULL,
    answer_count INTEGER NOT NULL,
    report TEXT NOT NULL
)
";

/// SQL statement to create an index on `completed_at` for listing.
pub const CREATE_HISTORY_TIME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_history_completed ON history(completed_at DESC)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_ANSWERS_TABLE,
    CREATE_ANSWERS_FORM_INDEX,
    CREATE_HISTORY_TABLE,
    CREATE_HISTORY_TIME_INDEX,
    CREATE_METADATA_TABLE,
];
