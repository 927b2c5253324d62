//! `unirank` - CLI for the university ranking directory
//!
//! This binary is the terminal front end: it prints tables, records ratings
//! and notes, writes CSV exports, and runs the interactive session.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use anyhow::{bail, Context};
use clap::Parser;

use unirank::app::{self, session};
use unirank::cli::{
    ClearCommand, Cli, Command, ConfigCommand, ExportCommand, FilterArgs, ListCommand,
    NoteCommand, OutputFormat, RateCommand,
};
use unirank::persistence::{NoteOutcome, NotesFeed, Persistence};
use unirank::record::RecordStore;
use unirank::view::{self, NoteView};
use unirank::{init_logging, App, Config, Note, NoteDraft, UiEvent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let mut config =
        Config::load_from(cli.config.clone()).context("failed to load configuration")?;
    if let Some(data) = cli.data.clone() {
        config.data.path = Some(data);
    }

    // Execute the command
    match cli.command {
        Command::List(cmd) => handle_list(&config, &cmd),
        Command::Countries => {
            handle_countries(&config);
            Ok(())
        }
        Command::Rate(cmd) => handle_rate(&config, &cmd),
        Command::Note(cmd) => handle_note(&config, cmd).await,
        Command::Export(cmd) => handle_export(config, cmd).await,
        Command::Clear(cmd) => handle_clear(&config, &cmd).await,
        Command::Browse => handle_browse(&config).await,
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn print_notices(app: &mut App) {
    for notice in app.take_notices() {
        println!("! {notice}");
    }
}

fn load_filtered(config: &Config, filters: &FilterArgs) -> App {
    let mut app = app::load_app(config);
    for edit in filters.edits() {
        app.edit_query(edit);
    }
    app.refresh_view();
    app
}

fn render_notes(notes: &[Note]) -> String {
    let views: Vec<NoteView> = notes.iter().map(NoteView::from).collect();
    view::render_note_list(&views)
}

fn handle_list(config: &Config, cmd: &ListCommand) -> anyhow::Result<()> {
    let mut app = load_filtered(config, &cmd.filters);
    print_notices(&mut app);
    let model = app.view_model();

    match cmd.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&model.rows)?),
        OutputFormat::Table => {
            print!("{}", view::render_filters(&model));
            print!("{}", view::render_table(&model));
        }
        OutputFormat::Plain => {
            for row in &model.rows {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    row.rank,
                    row.university,
                    row.country,
                    row.score,
                    row.rating.summary()
                );
            }
        }
    }
    Ok(())
}

fn handle_countries(config: &Config) {
    let mut app = app::load_app(config);
    print_notices(&mut app);
    for country in app.records().countries() {
        println!("{country}");
    }
}

fn handle_rate(config: &Config, cmd: &RateCommand) -> anyhow::Result<()> {
    let mut app = app::load_app(config);
    print_notices(&mut app);

    let known = app
        .records()
        .entries()
        .iter()
        .any(|entry| entry.university == cmd.university);
    if !known {
        bail!("unknown university: {}", cmd.university);
    }

    let aggregate = app
        .persistence()
        .record_rating(&cmd.university, cmd.stars)
        .context("failed to save rating")?;
    let average = aggregate.average().unwrap_or_default();
    println!(
        "{}: {average:.1} ({} votes)",
        cmd.university, aggregate.count
    );
    Ok(())
}

async fn handle_note(config: &Config, cmd: NoteCommand) -> anyhow::Result<()> {
    let persistence = app::open_persistence(config);

    match cmd {
        NoteCommand::Add {
            university,
            text,
            rating,
            author,
        } => {
            let author = author
                .or_else(|| config.ui.default_author.clone())
                .unwrap_or_default();
            let note = Note::from_draft(NoteDraft {
                author,
                university,
                text,
                rating,
            });
            match persistence
                .add_note(note)
                .await
                .context("failed to save note")?
            {
                NoteOutcome::Local => println!("Note saved locally."),
                NoteOutcome::Remote { id } => println!("Note shared (id {id})."),
                NoteOutcome::LocalFallback { reason } => {
                    println!("Could not share note ({reason}); saved locally instead.");
                }
            }
        }
        NoteCommand::List { format } => {
            let notes = first_snapshot(&persistence).await;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&notes)?),
                OutputFormat::Plain | OutputFormat::Table => print!("{}", render_notes(&notes)),
            }
        }
        NoteCommand::Watch => match persistence.notes_feed() {
            NotesFeed::Local(notes) => {
                println!("No remote note log configured; showing local notes.");
                print!("{}", render_notes(&notes));
            }
            NotesFeed::Live(mut subscription) => {
                loop {
                    tokio::select! {
                        snapshot = subscription.next() => match snapshot {
                            Some(notes) => {
                                println!("--- {} notes ---", notes.len());
                                print!("{}", render_notes(&notes));
                            }
                            None => break,
                        },
                        _ = tokio::signal::ctrl_c() => break,
                    }
                }
                subscription.cancel();
            }
        },
    }
    Ok(())
}

async fn first_snapshot(persistence: &Persistence) -> Vec<Note> {
    match persistence.notes_feed() {
        NotesFeed::Local(notes) => notes,
        NotesFeed::Live(mut subscription) => {
            let notes = subscription.next().await.unwrap_or_default();
            subscription.cancel();
            notes
        }
    }
}

async fn handle_export(mut config: Config, cmd: ExportCommand) -> anyhow::Result<()> {
    if let Some(dir) = cmd.dir {
        config.export.directory = Some(dir);
    }
    let mut app = load_filtered(&config, &cmd.filters);
    app.dispatch(UiEvent::Export)
        .await
        .context("failed to write export")?;
    print_notices(&mut app);
    Ok(())
}

async fn handle_clear(config: &Config, cmd: &ClearCommand) -> anyhow::Result<()> {
    let mut app = App::new(
        RecordStore::empty(),
        app::open_persistence(config),
        config.export_dir(),
    );
    app.dispatch(UiEvent::ClearAll { confirmed: cmd.yes })
        .await
        .context("failed to clear local state")?;
    print_notices(&mut app);
    if !cmd.yes {
        println!("Use --yes to confirm.");
    }
    Ok(())
}

async fn handle_browse(config: &Config) -> anyhow::Result<()> {
    let app = app::load_app(config);
    println!("Type `help` for commands.");

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    session::run(app, stdin, &mut stdout, config.debounce()).await?;
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Data]");
                println!("  Ranking file:       {}", config.data_path().display());
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Remote]");
                println!("  Enabled:            {}", config.remote.enabled);
                println!(
                    "  Database path:      {}",
                    config.remote_database_path().display()
                );
                println!("  Collection:         {}", config.remote.collection);
                println!("  Subscribe limit:    {}", config.remote.subscribe_limit);
                println!("  Poll interval (ms): {}", config.remote.poll_interval_ms);
                println!();
                println!("[UI]");
                println!("  Debounce (ms):      {}", config.ui.debounce_ms);
                println!(
                    "  Default author:     {}",
                    config.ui.default_author.as_deref().unwrap_or("-")
                );
                println!();
                println!("[Export]");
                println!("  Directory:          {}", config.export_dir().display());
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
