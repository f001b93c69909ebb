//! `inpsyght` - Big Five personality questionnaires
//!
//! This library fetches questionnaire forms from a headless CMS, walks a
//! respondent through them one question at a time, keeps answers in a local
//! database so an attempt can be resumed, and scores the answers per facet
//! and factor.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod cms;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod questionnaire;
pub mod report;
pub mod scoring;
pub mod storage;

pub use cms::{CmsClient, FileSource, FormSource};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Answer, Form, FormSummary, LikertValue};
pub use questionnaire::{Session, Step};
pub use report::Report;
pub use scoring::Weighting;
pub use storage::{ArchiveOutcome, HistoryEntry, Storage, StorageStats};
