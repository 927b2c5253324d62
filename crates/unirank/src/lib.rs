//! `unirank` - A university ranking directory with local ratings and notes
//!
//! This library loads a ranking data set, derives filtered and sorted views of
//! it, keeps per-university star ratings and free-text notes in local storage,
//! optionally shares notes through a remote log, and exports views to CSV.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod persistence;
pub mod query;
pub mod record;
pub mod remote;
pub mod storage;
pub mod view;

pub use app::{App, Notice, QueryEdit, UiEvent};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use persistence::{Note, NoteDraft, Persistence, Ratings};
pub use query::{QuerySpec, RawQuery, SortKey};
pub use record::{RankingEntry, RecordStore};
pub use view::ViewModel;
