//! Application state and event handling.
//!
//! [`App`] owns the record store, the persistence layer, and the current query,
//! and applies [`UiEvent`]s to them. Anything the user should be told once,
//! such as a failed load or a finished export, is queued as a [`Notice`] and
//! drained by whoever draws the screen.

mod debounce;
pub mod session;

pub use debounce::{debounce, DEFAULT_DEBOUNCE};

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::Result;
use crate::export::write_export;
use crate::persistence::{Note, NoteDraft, NoteOutcome, NotesFeed, Persistence, Ratings};
use crate::query::{self, QuerySpec, RawQuery};
use crate::record::{RankingEntry, RecordStore};
use crate::remote::{NoteSubscription, SqliteRemoteLog};
use crate::storage::{MemoryStore, SqliteStore};
use crate::view::ViewModel;

/// A change to one query control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEdit {
    /// Free-text search.
    Text(String),
    /// Country selection; empty for all.
    Country(String),
    /// Minimum rank box.
    RankMin(String),
    /// Maximum rank box.
    RankMax(String),
    /// Sort selection.
    Sort(String),
    /// Restore every control to its default.
    Reset,
}

impl QueryEdit {
    /// Apply the edit to the raw control values.
    pub fn apply(self, raw: &mut RawQuery) {
        match self {
            Self::Text(text) => raw.text = text,
            Self::Country(country) => raw.country = country,
            Self::RankMin(min) => raw.rank_min = min,
            Self::RankMax(max) => raw.rank_max = max,
            Self::Sort(sort) => raw.sort = sort,
            Self::Reset => *raw = RawQuery::default(),
        }
    }
}

/// A user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A query control changed.
    Query(QueryEdit),
    /// Vote `stars` for the university in 1-based `row` of the current view.
    Rate {
        /// Row number as displayed.
        row: usize,
        /// Vote; clamped into 1-5.
        stars: i64,
    },
    /// Submit a note.
    AddNote(NoteDraft),
    /// Export the current view.
    Export,
    /// Remove all local ratings and notes.
    ClearAll {
        /// Whether the user confirmed the destructive action.
        confirmed: bool,
    },
}

/// A one-shot message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The ranking data could not be loaded; the table is empty.
    DataLoadFailed {
        /// What went wrong.
        reason: String,
    },
    /// The remote log rejected a note, which was kept locally.
    RemoteWriteFailed {
        /// What went wrong.
        reason: String,
    },
    /// Export was requested for an empty view.
    NothingToExport,
    /// The export file was written.
    Exported {
        /// Where it was written.
        path: PathBuf,
    },
    /// A clear was requested without confirmation.
    ClearNeedsConfirmation,
    /// Local ratings and notes were removed.
    Cleared,
    /// A row number outside the current view was used.
    NoSuchRow {
        /// The row asked for.
        row: usize,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DataLoadFailed { reason } => {
                write!(f, "Could not load ranking data: {reason}")
            }
            Self::RemoteWriteFailed { reason } => {
                write!(f, "Could not share note ({reason}); saved locally instead")
            }
            Self::NothingToExport => write!(f, "Nothing to export"),
            Self::Exported { path } => write!(f, "Exported to {}", path.display()),
            Self::ClearNeedsConfirmation => write!(
                f,
                "This removes all local ratings and notes; confirm to continue"
            ),
            Self::Cleared => write!(f, "Cleared all local ratings and notes"),
            Self::NoSuchRow { row } => write!(f, "No row {row} in the current view"),
        }
    }
}

/// Application state.
#[derive(Debug)]
pub struct App {
    records: RecordStore,
    persistence: Persistence,
    raw: RawQuery,
    spec: QuerySpec,
    view: Vec<RankingEntry>,
    ratings: Ratings,
    notes: Vec<Note>,
    live_notes: bool,
    export_dir: PathBuf,
    author: Option<String>,
    notices: Vec<Notice>,
}

impl App {
    /// Create the app over loaded records.
    #[must_use]
    pub fn new(records: RecordStore, persistence: Persistence, export_dir: PathBuf) -> Self {
        let spec = QuerySpec::default();
        let view = query::apply(records.entries(), &spec);
        let ratings = persistence.ratings();
        let notes = persistence.notes_local();
        Self {
            records,
            persistence,
            raw: RawQuery::default(),
            spec,
            view,
            ratings,
            notes,
            live_notes: false,
            export_dir,
            author: None,
            notices: Vec::new(),
        }
    }

    /// Create the app from the result of loading the ranking data.
    ///
    /// A failed load leaves the app running with an empty store and a notice.
    #[must_use]
    pub fn bootstrap(
        records: Result<RecordStore>,
        persistence: Persistence,
        export_dir: PathBuf,
    ) -> Self {
        match records {
            Ok(records) => Self::new(records, persistence, export_dir),
            Err(e) => {
                warn!(error = %e, "Ranking data unavailable, starting with an empty table");
                let mut app = Self::new(RecordStore::empty(), persistence, export_dir);
                app.notices.push(Notice::DataLoadFailed {
                    reason: e.to_string(),
                });
                app
            }
        }
    }

    /// Author used for notes submitted without one.
    #[must_use]
    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.trim().is_empty());
        self
    }

    /// Loaded records.
    #[must_use]
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    /// The persistence layer.
    #[must_use]
    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Query controls as entered.
    #[must_use]
    pub fn raw_query(&self) -> &RawQuery {
        &self.raw
    }

    /// The spec the current view was derived from.
    #[must_use]
    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    /// The current view, in display order.
    #[must_use]
    pub fn view(&self) -> &[RankingEntry] {
        &self.view
    }

    /// The notes currently shown.
    #[must_use]
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Build the view model for the current state.
    #[must_use]
    pub fn view_model(&self) -> ViewModel {
        ViewModel::from_view(&self.view, &self.spec, &self.ratings, &self.notes)
    }

    /// Take every pending notice.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Start the notes feed.
    ///
    /// Returns the live subscription when a remote log is in use; its
    /// snapshots should be passed to [`App::set_notes`].
    pub fn attach_feed(&mut self) -> Option<NoteSubscription> {
        match self.persistence.notes_feed() {
            NotesFeed::Local(notes) => {
                self.live_notes = false;
                self.notes = notes;
                None
            }
            NotesFeed::Live(subscription) => {
                self.live_notes = true;
                Some(subscription)
            }
        }
    }

    /// Replace the notes feed with a new snapshot.
    pub fn set_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    /// Update the raw query without re-deriving the view.
    pub fn edit_query(&mut self, edit: QueryEdit) {
        edit.apply(&mut self.raw);
    }

    /// Re-derive the view from the raw query.
    pub fn refresh_view(&mut self) {
        self.spec = QuerySpec::from_raw(&self.raw);
        self.view = query::apply(self.records.entries(), &self.spec);
        debug!(rows = self.view.len(), "View refreshed");
    }

    /// Apply one event.
    ///
    /// # Errors
    ///
    /// Returns an error if local storage or the export file cannot be
    /// written.
    pub async fn dispatch(&mut self, event: UiEvent) -> Result<()> {
        match event {
            UiEvent::Query(edit) => {
                self.edit_query(edit);
                self.refresh_view();
            }
            UiEvent::Rate { row, stars } => self.rate_row(row, stars)?,
            UiEvent::AddNote(draft) => self.add_note(draft).await?,
            UiEvent::Export => self.export()?,
            UiEvent::ClearAll { confirmed } => self.clear_all(confirmed)?,
        }
        Ok(())
    }

    fn rate_row(&mut self, row: usize, stars: i64) -> Result<()> {
        let Some(entry) = row.checked_sub(1).and_then(|index| self.view.get(index)) else {
            self.notices.push(Notice::NoSuchRow { row });
            return Ok(());
        };
        let university = entry.university.clone();
        self.persistence.record_rating(&university, stars)?;
        self.ratings = self.persistence.ratings();
        Ok(())
    }

    async fn add_note(&mut self, mut draft: NoteDraft) -> Result<()> {
        if draft.author.trim().is_empty() {
            if let Some(author) = &self.author {
                draft.author.clone_from(author);
            }
        }

        let outcome = self.persistence.add_note(Note::from_draft(draft)).await?;
        if let NoteOutcome::LocalFallback { reason } = outcome {
            self.notices.push(Notice::RemoteWriteFailed { reason });
        }
        if !self.live_notes {
            self.notes = self.persistence.notes_local();
        }
        Ok(())
    }

    fn export(&mut self) -> Result<()> {
        let notice = match write_export(&self.export_dir, &self.view)? {
            Some(path) => Notice::Exported { path },
            None => Notice::NothingToExport,
        };
        self.notices.push(notice);
        Ok(())
    }

    fn clear_all(&mut self, confirmed: bool) -> Result<()> {
        if !confirmed {
            self.notices.push(Notice::ClearNeedsConfirmation);
            return Ok(());
        }
        self.persistence.clear_all()?;
        self.ratings = Ratings::new();
        if !self.live_notes {
            self.notes.clear();
        }
        self.notices.push(Notice::Cleared);
        Ok(())
    }
}

/// Open the persistence layer described by `config`.
///
/// Storage that cannot be opened degrades instead of failing: the local store
/// falls back to memory and a remote log that cannot be opened is left out.
#[must_use]
pub fn open_persistence(config: &Config) -> Persistence {
    let persistence = match SqliteStore::open(config.database_path()) {
        Ok(store) => Persistence::new(store),
        Err(e) => {
            warn!(error = %e, "Local storage unavailable, changes will not be kept");
            Persistence::new(MemoryStore::new())
        }
    }
    .with_subscribe_limit(config.remote.subscribe_limit);

    if !config.remote.enabled {
        return persistence;
    }
    match SqliteRemoteLog::open(
        config.remote_database_path(),
        config.remote.collection.clone(),
        config.poll_interval(),
    ) {
        Ok(remote) => persistence.with_remote(Arc::new(remote)),
        Err(e) => {
            warn!(error = %e, "Remote note log unavailable, notes stay local");
            persistence
        }
    }
}

/// Load the ranking data and open storage as configured.
#[must_use]
pub fn load_app(config: &Config) -> App {
    App::bootstrap(
        RecordStore::load(config.data_path()),
        open_persistence(config),
        config.export_dir(),
    )
    .with_author(config.ui.default_author.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::export::EXPORT_FILE_NAME;

    fn records() -> RecordStore {
        RecordStore::from_entries(vec![
            RankingEntry::new(1, "A U", "X", Some(90.0)),
            RankingEntry::new(2, "B U", "Y", Some(80.0)),
            RankingEntry::new(3, "C U", "X", None),
        ])
    }

    fn app() -> App {
        App::new(records(), Persistence::new(MemoryStore::new()), PathBuf::from("."))
    }

    fn draft(text: &str) -> NoteDraft {
        NoteDraft {
            university: "A U".to_string(),
            text: text.to_string(),
            ..NoteDraft::default()
        }
    }

    #[test]
    fn test_query_edit_apply() {
        let mut raw = RawQuery::default();
        QueryEdit::Text("u".to_string()).apply(&mut raw);
        QueryEdit::Sort("name-desc".to_string()).apply(&mut raw);
        assert_eq!(raw.text, "u");
        assert_eq!(raw.sort, "name-desc");

        QueryEdit::Reset.apply(&mut raw);
        assert_eq!(raw, RawQuery::default());
    }

    #[tokio::test]
    async fn test_query_events_refresh_view() {
        let mut app = app();
        assert_eq!(app.view().len(), 3);

        app.dispatch(UiEvent::Query(QueryEdit::Country("X".to_string())))
            .await
            .unwrap();
        app.dispatch(UiEvent::Query(QueryEdit::Sort("rank-desc".to_string())))
            .await
            .unwrap();

        let names: Vec<&str> = app.view().iter().map(|e| e.university.as_str()).collect();
        assert_eq!(names, vec!["C U", "A U"]);
        assert_eq!(app.view_model().count_label, "2 results");

        app.dispatch(UiEvent::Query(QueryEdit::Reset)).await.unwrap();
        assert!(app.spec().is_default());
        assert_eq!(app.view().len(), 3);
    }

    #[test]
    fn test_edit_query_defers_view() {
        let mut app = app();
        app.edit_query(QueryEdit::Text("B".to_string()));
        assert_eq!(app.view().len(), 3);
        assert_eq!(app.raw_query().text, "B");

        app.refresh_view();
        assert_eq!(app.view().len(), 1);
    }

    #[tokio::test]
    async fn test_rate_uses_current_view_row() {
        let mut app = app();
        app.dispatch(UiEvent::Query(QueryEdit::Country("Y".to_string())))
            .await
            .unwrap();
        app.dispatch(UiEvent::Rate { row: 1, stars: 4 }).await.unwrap();

        let ratings = app.persistence().ratings();
        assert_eq!(ratings.get("B U").unwrap().count, 1);
        assert!(ratings.get("A U").is_none());
        assert_eq!(app.view_model().rows[0].rating.average, Some(4.0));
    }

    #[tokio::test]
    async fn test_rate_unknown_row_is_a_notice() {
        let mut app = app();
        app.dispatch(UiEvent::Rate { row: 0, stars: 4 }).await.unwrap();
        app.dispatch(UiEvent::Rate { row: 9, stars: 4 }).await.unwrap();

        assert_eq!(
            app.take_notices(),
            vec![Notice::NoSuchRow { row: 0 }, Notice::NoSuchRow { row: 9 }]
        );
        assert!(app.persistence().ratings().is_empty());
    }

    #[tokio::test]
    async fn test_add_note_uses_default_author() {
        let mut app = app().with_author(Some("kim".to_string()));
        app.dispatch(UiEvent::AddNote(draft("hello"))).await.unwrap();

        assert_eq!(app.notes().len(), 1);
        assert_eq!(app.notes()[0].author, "kim");
        assert!(app.take_notices().is_empty());
    }

    #[tokio::test]
    async fn test_add_note_without_author_is_anon() {
        let mut app = app();
        app.dispatch(UiEvent::AddNote(draft("hello"))).await.unwrap();
        assert_eq!(app.notes()[0].author, "anon");
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(
            records(),
            Persistence::new(MemoryStore::new()),
            dir.path().to_path_buf(),
        );
        app.dispatch(UiEvent::Export).await.unwrap();

        let path = dir.path().join(EXPORT_FILE_NAME);
        assert_eq!(app.take_notices(), vec![Notice::Exported { path: path.clone() }]);
        assert_eq!(std::fs::read_to_string(path).unwrap().lines().count(), 4);
    }

    #[tokio::test]
    async fn test_export_empty_view_is_a_notice() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(
            records(),
            Persistence::new(MemoryStore::new()),
            dir.path().to_path_buf(),
        );
        app.dispatch(UiEvent::Query(QueryEdit::Text("nothing matches".to_string())))
            .await
            .unwrap();
        app.dispatch(UiEvent::Export).await.unwrap();

        assert_eq!(app.take_notices(), vec![Notice::NothingToExport]);
        assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_clear_requires_confirmation() {
        let mut app = app();
        app.dispatch(UiEvent::Rate { row: 1, stars: 5 }).await.unwrap();
        app.dispatch(UiEvent::AddNote(draft("note"))).await.unwrap();

        app.dispatch(UiEvent::ClearAll { confirmed: false })
            .await
            .unwrap();
        assert_eq!(app.take_notices(), vec![Notice::ClearNeedsConfirmation]);
        assert_eq!(app.persistence().ratings().len(), 1);

        app.dispatch(UiEvent::ClearAll { confirmed: true })
            .await
            .unwrap();
        assert_eq!(app.take_notices(), vec![Notice::Cleared]);
        assert!(app.persistence().ratings().is_empty());
        assert!(app.notes().is_empty());
        assert!(app.view_model().rows[0].rating.average.is_none());
    }

    #[test]
    fn test_bootstrap_failure_leaves_empty_store_and_notice() {
        let mut app = App::bootstrap(
            Err(Error::data_format("expected a JSON array")),
            Persistence::new(MemoryStore::new()),
            PathBuf::from("."),
        );

        assert!(app.records().is_empty());
        assert_eq!(app.view_model().count_label, "0 results");
        let notices = app.take_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], Notice::DataLoadFailed { .. }));
        assert!(app.take_notices().is_empty());
    }

    #[test]
    fn test_attach_feed_without_remote_is_local() {
        let mut app = app();
        assert!(app.attach_feed().is_none());
    }

    #[tokio::test]
    async fn test_open_persistence_with_remote() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = Some(dir.path().join("local.db"));
        config.remote.enabled = true;
        config.remote.database_path = Some(dir.path().join("remote.db"));

        let persistence = open_persistence(&config);
        assert!(persistence.has_remote());
    }

    #[test]
    fn test_open_persistence_local_only_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.database_path = Some(dir.path().join("local.db"));

        assert!(!open_persistence(&config).has_remote());
    }

    #[test]
    fn test_notice_messages() {
        assert_eq!(Notice::NothingToExport.to_string(), "Nothing to export");
        assert_eq!(
            Notice::NoSuchRow { row: 4 }.to_string(),
            "No row 4 in the current view"
        );
        assert!(Notice::RemoteWriteFailed {
            reason: "offline".to_string()
        }
        .to_string()
        .contains("saved locally"));
    }
}
