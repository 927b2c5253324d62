//! Line-oriented interactive session.
//!
//! Each input line is one command. Query edits go through [`debounce`] so a
//! burst of edits re-derives the view once; other commands apply right away.
//! Live note snapshots are folded in as they arrive.

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{debounce, App, QueryEdit, UiEvent};
use crate::error::Result;
use crate::persistence::{Note, NoteDraft};
use crate::query::SortKey;
use crate::remote::NoteSubscription;
use crate::view;

/// Pending query edits buffered before the debouncer.
const EDIT_BUFFER: usize = 32;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Apply an event.
    Event(UiEvent),
    /// Redraw the screen.
    Show,
    /// Print the command list.
    Help,
    /// End the session.
    Quit,
}

/// Command list printed by `help`.
#[must_use]
pub fn help_text() -> String {
    let sorts: Vec<&str> = SortKey::ALL.iter().map(SortKey::as_str).collect();
    format!(
        "Commands:
  search <text>                    filter by name or country
  country <name>                   show one country (empty for all)
  min <rank> / max <rank>          rank bounds (empty to clear)
  sort <key>                       {}
  reset                            clear every filter
  rate <row> <stars>               vote 1-5 for a row of the table
  note <university> | [<stars> |] <text>
  export                           write the table as CSV
  clear yes                        remove all local ratings and notes
  show | help | quit
",
        sorts.join(", ")
    )
}

fn split_word(line: &str) -> (&str, &str) {
    let line = line.trim();
    line.split_once(char::is_whitespace)
        .map_or((line, ""), |(word, rest)| (word, rest.trim()))
}

/// Parse one input line.
///
/// # Errors
///
/// Returns a usage message for unknown commands and malformed arguments.
pub fn parse_line(line: &str) -> std::result::Result<SessionCommand, String> {
    let (word, rest) = split_word(line);
    let query = |edit: QueryEdit| -> std::result::Result<SessionCommand, String> {
        Ok(SessionCommand::Event(UiEvent::Query(edit)))
    };

    match word.to_lowercase().as_str() {
        "" | "show" => Ok(SessionCommand::Show),
        "help" | "?" => Ok(SessionCommand::Help),
        "quit" | "exit" => Ok(SessionCommand::Quit),
        "search" => query(QueryEdit::Text(rest.to_string())),
        "country" => query(QueryEdit::Country(rest.to_string())),
        "min" => query(QueryEdit::RankMin(rest.to_string())),
        "max" => query(QueryEdit::RankMax(rest.to_string())),
        "sort" => query(QueryEdit::Sort(rest.to_string())),
        "reset" => query(QueryEdit::Reset),
        "rate" => parse_rate(rest),
        "note" => parse_note(rest),
        "export" => Ok(SessionCommand::Event(UiEvent::Export)),
        "clear" => Ok(SessionCommand::Event(UiEvent::ClearAll {
            confirmed: rest.eq_ignore_ascii_case("yes"),
        })),
        other => Err(format!("Unknown command `{other}`; type `help`")),
    }
}

fn parse_rate(rest: &str) -> std::result::Result<SessionCommand, String> {
    const USAGE: &str = "Usage: rate <row> <stars>";
    let (row, stars) = split_word(rest);
    let row = row.parse::<usize>().map_err(|_| USAGE.to_string())?;
    let stars = stars.parse::<i64>().map_err(|_| USAGE.to_string())?;
    Ok(SessionCommand::Event(UiEvent::Rate { row, stars }))
}

fn parse_note(rest: &str) -> std::result::Result<SessionCommand, String> {
    let parts: Vec<&str> = rest.splitn(3, '|').map(str::trim).collect();
    let (university, rating, text) = match parts.as_slice() {
        [university, text] => (*university, None, (*text).to_string()),
        [university, middle, text] => match middle.parse::<i64>() {
            Ok(stars) => (*university, Some(stars), (*text).to_string()),
            Err(_) => (*university, None, format!("{middle} | {text}")),
        },
        _ => return Err("Usage: note <university> | [<stars> |] <text>".to_string()),
    };
    Ok(SessionCommand::Event(UiEvent::AddNote(NoteDraft {
        author: String::new(),
        university: university.to_string(),
        text,
        rating,
    })))
}

fn draw(app: &mut App, out: &mut impl Write) -> Result<()> {
    for notice in app.take_notices() {
        writeln!(out, "! {notice}")?;
    }
    write!(out, "{}", view::render(&app.view_model()))?;
    out.flush()?;
    Ok(())
}

async fn next_snapshot(feed: &mut Option<NoteSubscription>) -> Option<Vec<Note>> {
    match feed {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}

/// Run an interactive session until `quit` or end of input.
///
/// Returns the app so callers can inspect the final state.
///
/// # Errors
///
/// Returns an error if reading input or writing output fails. Failures while
/// applying a command are printed and the session continues.
pub async fn run<R, W>(mut app: App, input: R, out: &mut W, delay: Duration) -> Result<App>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let (edit_tx, edit_rx) = mpsc::channel(EDIT_BUFFER);
    let (settled_tx, mut settled_rx) = mpsc::channel(1);
    tokio::spawn(debounce(edit_rx, delay, settled_tx));

    let mut feed = app.attach_feed();
    let mut pending = false;
    draw(&mut app, out)?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(SessionCommand::Quit) => break,
                    Ok(SessionCommand::Show) => draw(&mut app, out)?,
                    Ok(SessionCommand::Help) => write!(out, "{}", help_text())?,
                    Ok(SessionCommand::Event(UiEvent::Query(edit))) => {
                        app.edit_query(edit);
                        pending = true;
                        // A full buffer already holds a pending refresh
                        let _ = edit_tx.try_send(());
                    }
                    Ok(SessionCommand::Event(event)) => {
                        // Rows and exports refer to the view the edits describe
                        if pending {
                            app.refresh_view();
                            pending = false;
                        }
                        if let Err(e) = app.dispatch(event).await {
                            warn!(error = %e, "Command failed");
                            writeln!(out, "Error: {e}")?;
                        }
                        draw(&mut app, out)?;
                    }
                    Err(usage) => writeln!(out, "{usage}")?,
                }
            }
            Some(()) = settled_rx.recv() => {
                pending = false;
                app.refresh_view();
                draw(&mut app, out)?;
            }
            snapshot = next_snapshot(&mut feed) => match snapshot {
                Some(notes) => {
                    debug!(count = notes.len(), "Notes snapshot");
                    app.set_notes(notes);
                    draw(&mut app, out)?;
                }
                None => feed = None,
            },
        }
    }

    // Closing the edit channel flushes any edit still waiting out its delay
    drop(edit_tx);
    while settled_rx.recv().await.is_some() {
        app.refresh_view();
    }
    if let Some(mut subscription) = feed {
        subscription.cancel();
    }
    Ok(app)
}
