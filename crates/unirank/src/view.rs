//! View model and plain-text rendering.
//!
//! [`ViewModel`] is derived from the records, the query, the ratings and the
//! notes and never mutated afterwards; every change produces a new one. The
//! `render_*` functions turn it into text for a terminal.

use std::fmt::Write as _;

use serde::Serialize;

use crate::persistence::{Note, RatingAggregate, Ratings, MAX_STARS};
use crate::query::{self, QuerySpec};
use crate::record::RankingEntry;

/// How far below a star's index the average may fall and still light it.
const STAR_TOLERANCE: f64 = 0.25;

const STAR_ON: char = '★';
const STAR_OFF: char = '☆';

/// Rating cell for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingView {
    /// Mean vote, absent with no votes.
    pub average: Option<f64>,
    /// Number of votes.
    pub count: u64,
    /// Lit state of stars 1 to 5.
    pub stars: [bool; MAX_STARS as usize],
}

impl RatingView {
    /// Build the cell for an aggregate, or an empty cell for `None`.
    #[must_use]
    pub fn from_aggregate(aggregate: Option<&RatingAggregate>) -> Self {
        let average = aggregate.and_then(RatingAggregate::average);
        let mut stars = [false; MAX_STARS as usize];
        if let Some(avg) = average {
            for (index, star) in (1u8..).zip(stars.iter_mut()) {
                *star = avg >= f64::from(index) - STAR_TOLERANCE;
            }
        }
        Self {
            average,
            count: aggregate.map_or(0, |a| a.count),
            stars,
        }
    }

    /// Stars as text, e.g. `★★★★☆`.
    #[must_use]
    pub fn star_text(&self) -> String {
        self.stars
            .iter()
            .map(|lit| if *lit { STAR_ON } else { STAR_OFF })
            .collect()
    }

    /// Average and vote count, e.g. `4.5 (2)`, or `-` with no votes.
    #[must_use]
    pub fn summary(&self) -> String {
        match self.average {
            Some(avg) => format!("{avg:.1} ({})", self.count),
            None => "-".to_string(),
        }
    }
}

/// One row of the results table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowView {
    /// 1-based row number in the current view.
    pub row: usize,
    /// Ranking position.
    pub rank: u32,
    /// University name.
    pub university: String,
    /// Country.
    pub country: String,
    /// Formatted score, empty when absent.
    pub score: String,
    /// Rating widget state.
    pub rating: RatingView,
}

/// One entry of the notes feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteView {
    /// Author.
    pub author: String,
    /// University the note is about; may be empty.
    pub university: String,
    /// Note body.
    pub text: String,
    /// Attached rating, if any.
    pub rating: Option<u8>,
    /// Submission time, formatted.
    pub submitted: String,
}

impl From<&Note> for NoteView {
    fn from(note: &Note) -> Self {
        Self {
            author: note.author.clone(),
            university: note.university.clone(),
            text: note.text.clone(),
            rating: note.rating,
            submitted: note
                .submitted_at()
                .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        }
    }
}

/// Everything needed to draw the screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    /// Results table rows.
    pub rows: Vec<RowView>,
    /// Results count, e.g. `3 results`.
    pub count_label: String,
    /// Active filter summary lines.
    pub active_filters: Vec<String>,
    /// Notes feed, newest first.
    pub notes: Vec<NoteView>,
}

impl ViewModel {
    /// Run the query and build the view model.
    #[must_use]
    pub fn derive(
        records: &[RankingEntry],
        spec: &QuerySpec,
        ratings: &Ratings,
        notes: &[Note],
    ) -> Self {
        Self::from_view(&query::apply(records, spec), spec, ratings, notes)
    }

    /// Build the view model for an already computed view.
    #[must_use]
    pub fn from_view(
        view: &[RankingEntry],
        spec: &QuerySpec,
        ratings: &Ratings,
        notes: &[Note],
    ) -> Self {
        let rows = view
            .iter()
            .enumerate()
            .map(|(index, entry)| RowView {
                row: index + 1,
                rank: entry.rank,
                university: entry.university.clone(),
                country: entry.country.clone(),
                score: entry.score_text(),
                rating: RatingView::from_aggregate(ratings.get(&entry.university)),
            })
            .collect();

        Self {
            rows,
            count_label: format!("{} results", view.len()),
            active_filters: spec.active_filters(),
            notes: notes.iter().map(NoteView::from).collect(),
        }
    }

    /// Check if the results table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Render the results table.
///
/// An empty view renders a single "No results" row under the header.
#[must_use]
pub fn render_table(model: &ViewModel) -> String {
    let header = ["#", "Rank", "University", "Country", "Score", "Rating"];
    let cells: Vec<[String; 6]> = model
        .rows
        .iter()
        .map(|row| {
            [
                row.row.to_string(),
                row.rank.to_string(),
                row.university.clone(),
                row.country.clone(),
                row.score.clone(),
                format!("{} {}", row.rating.star_text(), row.rating.summary()),
            ]
        })
        .collect();

    let mut widths = header.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header.map(str::to_string), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));

    if cells.is_empty() {
        let _ = writeln!(out, "No results");
    }
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    let _ = writeln!(out, "{}", model.count_label);
    out
}

fn push_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.chars().count());
            format!("{cell}{}", " ".repeat(pad))
        })
        .collect();
    let _ = writeln!(out, "{}", padded.join(" | ").trim_end());
}

/// Render the active filter summary.
#[must_use]
pub fn render_filters(model: &ViewModel) -> String {
    if model.active_filters.is_empty() {
        return "No active filters\n".to_string();
    }
    let mut out = String::from("Active filters:\n");
    for filter in &model.active_filters {
        let _ = writeln!(out, "  - {filter}");
    }
    out
}

/// Render the notes feed.
#[must_use]
pub fn render_notes(model: &ViewModel) -> String {
    render_note_list(&model.notes)
}

/// Render a list of notes, newest first as given.
#[must_use]
pub fn render_note_list(notes: &[NoteView]) -> String {
    if notes.is_empty() {
        return "No notes yet\n".to_string();
    }
    let mut out = String::new();
    for note in notes {
        let _ = write!(out, "[{}] {}", note.submitted, note.author);
        if !note.university.is_empty() {
            let _ = write!(out, " on {}", note.university);
        }
        if let Some(rating) = note.rating {
            let _ = write!(out, " ({rating}/{MAX_STARS})");
        }
        let _ = writeln!(out, ": {}", note.text);
    }
    out
}

/// Render the whole screen: filters, table, then notes.
#[must_use]
pub fn render(model: &ViewModel) -> String {
    format!(
        "{}\n{}\nNotes\n{}",
        render_filters(model),
        render_table(model),
        render_notes(model)
    )
}
