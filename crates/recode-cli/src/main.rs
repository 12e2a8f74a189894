//! Recode CLI
//!
//! Command-line front end for the question deck and review sessions.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use recode_core::storage::default_data_dir;
use recode_core::{
    load_catalog, CatalogEntry, LearningState, Pattern, Question, QuestionDifficulty, Rating,
    ReviewSession, Scheduler, SchedulerParameters, SchedulingCandidates, SessionError, Storage,
    TrackedQuestion,
};
use tracing_subscriber::EnvFilter;

const DB_FILE: &str = "recode.db";
const PARAMS_FILE: &str = "params.json";

/// Recode - spaced repetition for coding-interview practice
#[derive(Parser)]
#[command(name = "recode")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Practice coding-interview questions on an FSRS review schedule")]
struct Cli {
    /// Custom data directory (database and params.json)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Scheduler parameters JSON file
    #[arg(long, global = true)]
    params: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import questions from a JSON catalog file
    Import {
        /// Path to catalog JSON
        file: PathBuf,
    },

    /// List catalog questions
    List {
        /// Only questions whose name or pattern contains this text
        #[arg(long)]
        search: Option<String>,
        /// Only tracked questions, soonest due first
        #[arg(long)]
        tracked: bool,
    },

    /// Add a custom question
    Add {
        /// Question title
        name: String,
        /// Link to the problem statement
        #[arg(long, default_value = "")]
        link: String,
        /// Easy, Medium or Hard
        #[arg(long, default_value = "Medium", value_parser = parse_difficulty)]
        difficulty: QuestionDifficulty,
        /// Pattern name, e.g. "Two Pointers"
        #[arg(long, default_value = "Other", value_parser = parse_pattern)]
        pattern: Pattern,
        /// Start reviewing it right away
        #[arg(long)]
        track: bool,
    },

    /// Change a question's title, link, difficulty or pattern
    Edit {
        /// Question id or name
        question: String,
        /// New title
        #[arg(long)]
        name: Option<String>,
        /// New link
        #[arg(long)]
        link: Option<String>,
        /// New difficulty
        #[arg(long, value_parser = parse_difficulty)]
        difficulty: Option<QuestionDifficulty>,
        /// New pattern
        #[arg(long, value_parser = parse_pattern)]
        pattern: Option<Pattern>,
    },

    /// Delete a question with its review card and history
    Delete {
        /// Question id or name
        question: String,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Start reviewing a question
    Track {
        /// Question id or name
        question: String,
    },

    /// Stop reviewing a question and delete its history
    Untrack {
        /// Question id or name
        question: String,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Reset a question's review progress
    Forget {
        /// Question id or name
        question: String,
        /// Skip confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Keep a tracked question out of the review queue
    Pause {
        /// Question id or name
        question: String,
    },

    /// Put a paused question back in the review queue
    Resume {
        /// Question id or name
        question: String,
    },

    /// Edit the note and hints shown during review
    Note {
        /// Question id or name
        question: String,
        /// Replace the note
        #[arg(long)]
        note: Option<String>,
        /// Append a hint (repeatable)
        #[arg(long = "hint")]
        hints: Vec<String>,
        /// Remove existing hints first
        #[arg(long)]
        clear_hints: bool,
    },

    /// Show a tracked question's card and history
    Show {
        /// Question id or name
        question: String,
    },

    /// Show what each rating would schedule right now
    Preview {
        /// Question id or name
        question: String,
    },

    /// Review every due question
    Review {
        /// Offer Forgot and Easy as well as Hard and Good
        #[arg(long)]
        all_ratings: bool,
    },

    /// Show deck statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging to stderr; stdout is for the session
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let storage = open_storage(cli.data_dir.as_deref())?;

    match cli.command {
        Commands::Import { file } => run_import(&storage, &file),
        Commands::List { search, tracked } => run_list(&storage, search.as_deref(), tracked),
        Commands::Add {
            name,
            link,
            difficulty,
            pattern,
            track,
        } => {
            let entry = CatalogEntry {
                name,
                link,
                difficulty,
                pattern,
            };
            run_add(&storage, entry, track)
        }
        Commands::Edit {
            question,
            name,
            link,
            difficulty,
            pattern,
        } => run_edit(&storage, &question, name, link, difficulty, pattern),
        Commands::Delete { question, yes } => run_delete(&storage, &question, yes),
        Commands::Track { question } => run_track(&storage, &question),
        Commands::Untrack { question, yes } => run_untrack(&storage, &question, yes),
        Commands::Forget { question, yes } => run_forget(&storage, &question, yes),
        Commands::Pause { question } => run_set_suspended(&storage, &question, true),
        Commands::Resume { question } => run_set_suspended(&storage, &question, false),
        Commands::Note {
            question,
            note,
            hints,
            clear_hints,
        } => run_note(&storage, &question, note, hints, clear_hints),
        Commands::Show { question } => run_show(&storage, &question),
        Commands::Preview { question } => {
            let scheduler = load_scheduler(cli.params.as_deref(), cli.data_dir.as_deref())?;
            run_preview(&storage, &scheduler, &question)
        }
        Commands::Review { all_ratings } => {
            let scheduler = load_scheduler(cli.params.as_deref(), cli.data_dir.as_deref())?;
            run_review(&storage, scheduler, offered_ratings(all_ratings))
        }
        Commands::Stats => run_stats(&storage),
    }
}

// ============================================================================
// SETUP
// ============================================================================

fn open_storage(data_dir: Option<&Path>) -> anyhow::Result<Storage> {
    let db_path = match data_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
            Some(dir.join(DB_FILE))
        }
        None => None,
    };
    Storage::new(db_path).context("Failed to open storage")
}

/// `--params`, else `params.json` in the data directory, else defaults
fn params_path(params: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    if let Some(path) = params {
        return Ok(Some(path.to_path_buf()));
    }
    let dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => default_data_dir()?,
    };
    let candidate = dir.join(PARAMS_FILE);
    Ok(candidate.exists().then_some(candidate))
}

fn load_scheduler(params: Option<&Path>, data_dir: Option<&Path>) -> anyhow::Result<Scheduler> {
    let params = match params_path(params, data_dir)? {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading scheduler parameters");
            SchedulerParameters::from_file(&path)
                .with_context(|| format!("Invalid parameters in {}", path.display()))?
        }
        None => SchedulerParameters::default(),
    };
    Ok(Scheduler::new(params)?)
}

fn resolve(storage: &Storage, key: &str) -> anyhow::Result<Question> {
    storage
        .find_question(key)?
        .ok_or_else(|| anyhow!("No question matching '{}'", key))
}

fn resolve_tracked(storage: &Storage, key: &str) -> anyhow::Result<TrackedQuestion> {
    let question = resolve(storage, key)?;
    storage
        .get_tracked(&question.id)?
        .ok_or_else(|| anyhow!("'{}' is not tracked. Run `recode track` first.", question.name))
}

fn parse_difficulty(s: &str) -> Result<QuestionDifficulty, String> {
    QuestionDifficulty::parse_name(s).ok_or_else(|| format!("unknown difficulty '{}'", s))
}

/// Unlike catalog parsing, unknown pattern names are rejected here
fn parse_pattern(s: &str) -> Result<Pattern, String> {
    Pattern::ALL
        .into_iter()
        .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| format!("unknown pattern '{}'", s))
}

fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{} {} [y/N] ", "WARNING:".red().bold(), prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

// ============================================================================
// CATALOG
// ============================================================================

fn run_import(storage: &Storage, file: &Path) -> anyhow::Result<()> {
    let entries = load_catalog(file)
        .with_context(|| format!("Failed to read catalog {}", file.display()))?;
    let summary = storage.import_catalog(entries, Utc::now())?;

    println!(
        "{}",
        format!(
            "Imported {} questions ({} already present)",
            summary.imported, summary.skipped
        )
        .green()
        .bold()
    );
    Ok(())
}

fn run_add(storage: &Storage, entry: CatalogEntry, track: bool) -> anyhow::Result<()> {
    let now = Utc::now();
    let question = storage.add_question(entry, now)?;
    println!("{} {}", "Added".green().bold(), question.name);

    if track {
        let card = storage.track(&question.id, now)?;
        println!(
            "{} {} (due {})",
            "Tracking".green().bold(),
            card.question.name,
            card.memory.due.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

fn run_edit(
    storage: &Storage,
    key: &str,
    name: Option<String>,
    link: Option<String>,
    difficulty: Option<QuestionDifficulty>,
    pattern: Option<Pattern>,
) -> anyhow::Result<()> {
    let question = resolve(storage, key)?;
    let entry = CatalogEntry {
        name: name.unwrap_or(question.name),
        link: link.unwrap_or(question.link),
        difficulty: difficulty.unwrap_or(question.difficulty),
        pattern: pattern.unwrap_or(question.pattern),
    };
    let updated = storage.update_question(&question.id, entry)?;
    println!(
        "{} {} ({}, {})",
        "Updated".green().bold(),
        updated.name,
        updated.difficulty,
        updated.pattern
    );
    Ok(())
}

fn run_delete(storage: &Storage, key: &str, yes: bool) -> anyhow::Result<()> {
    let question = resolve(storage, key)?;
    let prompt = format!("Delete '{}' with its review history?", question.name);
    if !yes && !confirm(&prompt)? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }
    storage.delete_question(&question.id)?;
    println!("{} {}", "Deleted".green().bold(), question.name);
    Ok(())
}

fn run_list(storage: &Storage, search: Option<&str>, tracked_only: bool) -> anyhow::Result<()> {
    let now = Utc::now();

    if tracked_only {
        let cards: Vec<TrackedQuestion> = storage
            .tracked_questions()?
            .into_iter()
            .filter(|t| search.is_none_or(|s| recode_core::catalog::matches_search(&t.question, s)))
            .collect();
        if cards.is_empty() {
            println!("{}", "No tracked questions.".dimmed());
            return Ok(());
        }
        for card in &cards {
            println!(
                "  {:45} {:12} {}",
                card.question.name,
                status_label(card),
                due_label(card.memory.due, now)
            );
        }
        return Ok(());
    }

    let questions = match search {
        Some(text) => storage.search_questions(text)?,
        None => storage.list_questions()?,
    };
    if questions.is_empty() {
        println!("{}", "No questions found.".dimmed());
        return Ok(());
    }
    for q in &questions {
        println!(
            "  {:45} {:8} {}",
            q.name,
            difficulty_label(q),
            q.pattern.as_str().dimmed()
        );
    }
    println!();
    println!("{} questions", questions.len());
    Ok(())
}

// ============================================================================
// DECK
// ============================================================================

fn run_track(storage: &Storage, key: &str) -> anyhow::Result<()> {
    let question = resolve(storage, key)?;
    let card = storage.track(&question.id, Utc::now())?;
    println!(
        "{} {} (due {})",
        "Tracking".green().bold(),
        card.question.name,
        card.memory.due.format("%Y-%m-%d %H:%M")
    );
    Ok(())
}

fn run_untrack(storage: &Storage, key: &str, yes: bool) -> anyhow::Result<()> {
    let question = resolve(storage, key)?;
    if !yes && !confirm(&format!("Stop tracking '{}' and delete its history?", question.name))? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }
    if storage.untrack(&question.id)? {
        println!("{} {}", "Untracked".green().bold(), question.name);
    } else {
        println!("{}", format!("'{}' was not tracked.", question.name).dimmed());
    }
    Ok(())
}

fn run_forget(storage: &Storage, key: &str, yes: bool) -> anyhow::Result<()> {
    let card = resolve_tracked(storage, key)?;
    if !yes && !confirm(&format!("Reset all review progress for '{}'?", card.question.name))? {
        println!("{}", "Aborted.".yellow());
        return Ok(());
    }
    storage.forget(&card.question.id, Utc::now())?;
    println!("{} {}", "Reset".green().bold(), card.question.name);
    Ok(())
}

fn run_set_suspended(storage: &Storage, key: &str, suspended: bool) -> anyhow::Result<()> {
    let card = resolve_tracked(storage, key)?;
    storage.set_suspended(&card.question.id, suspended)?;
    let verb = if suspended { "Paused" } else { "Resumed" };
    println!("{} {}", verb.green().bold(), card.question.name);
    Ok(())
}

fn run_note(
    storage: &Storage,
    key: &str,
    note: Option<String>,
    new_hints: Vec<String>,
    clear_hints: bool,
) -> anyhow::Result<()> {
    let card = resolve_tracked(storage, key)?;
    let note = note.unwrap_or(card.note);
    let mut hints = if clear_hints { Vec::new() } else { card.hints };
    hints.extend(new_hints.into_iter().filter(|h| !h.trim().is_empty()));

    storage.update_notes(&card.question.id, &note, &hints)?;
    println!(
        "{} {} ({} hints)",
        "Updated".green().bold(),
        card.question.name,
        hints.len()
    );
    Ok(())
}

fn run_show(storage: &Storage, key: &str) -> anyhow::Result<()> {
    let now = Utc::now();
    let card = resolve_tracked(storage, key)?;
    let m = &card.memory;

    println!("{}", format!("=== {} ===", card.question.name).cyan().bold());
    println!("{}: {}", "Link".white().bold(), card.question.link);
    println!("{}: {}", "Difficulty".white().bold(), difficulty_label(&card.question));
    println!("{}: {}", "Pattern".white().bold(), card.question.pattern);
    println!("{}: {}", "Status".white().bold(), status_label(&card));
    println!("{}: {}", "Due".white().bold(), due_label(m.due, now));
    println!("{}: {:.2} days", "Stability".white().bold(), m.stability);
    println!("{}: {:.2}", "Difficulty (model)".white().bold(), m.difficulty);
    println!("{}: {} ({} lapses)", "Reviews".white().bold(), m.reps, m.lapses);
    println!(
        "{}: {:.1}%",
        "Retrievability".white().bold(),
        m.retrievability_at(now) * 100.0
    );
    if !card.note.is_empty() {
        println!("{}: {}", "Note".white().bold(), card.note);
    }
    for (i, hint) in card.hints.iter().enumerate() {
        println!("{} {}: {}", "Hint".white().bold(), i + 1, hint);
    }

    let logs = storage.review_logs(&card.question.id)?;
    if !logs.is_empty() {
        println!();
        println!("{}", "=== History ===".yellow().bold());
        for log in &logs {
            println!(
                "  {}  {:8} from {:10} -> {} days",
                log.reviewed_at.format("%Y-%m-%d %H:%M"),
                log.rating,
                log.status,
                log.scheduled_days
            );
        }
    }
    Ok(())
}

fn run_preview(storage: &Storage, scheduler: &Scheduler, key: &str) -> anyhow::Result<()> {
    let now = Utc::now();
    let card = resolve_tracked(storage, key)?;
    let candidates = scheduler.schedule(&card.memory, now)?;

    println!("{}", format!("=== {} ===", card.question.name).cyan().bold());
    for (rating, review) in candidates.iter() {
        println!(
            "  {:8} -> {:10} due {} ({} days)",
            rating.to_string().bold(),
            review.state.status,
            review.state.due.format("%Y-%m-%d"),
            review.state.scheduled_days
        );
    }
    Ok(())
}

// ============================================================================
// REVIEW
// ============================================================================

/// Ratings shown in a session. Hard and Good unless all four are requested.
fn offered_ratings(all: bool) -> Vec<Rating> {
    if all {
        Rating::ALL.to_vec()
    } else {
        vec![Rating::Hard, Rating::Good]
    }
}

/// One line of session input
#[derive(Debug, PartialEq)]
enum Answer {
    Rate(Rating),
    Hint,
    Skip,
    Quit,
    Invalid,
}

/// Accepts a rating name or number, or "h"/"s"/"q". Ratings not offered are invalid.
fn parse_answer(input: &str, offered: &[Rating]) -> Answer {
    match input.trim().to_lowercase().as_str() {
        "h" | "hint" => Answer::Hint,
        "s" | "skip" => Answer::Skip,
        "q" | "quit" => Answer::Quit,
        other => match Rating::parse_name(other) {
            Some(rating) if offered.contains(&rating) => Answer::Rate(rating),
            _ => Answer::Invalid,
        },
    }
}

fn rating_menu(candidates: &SchedulingCandidates, offered: &[Rating]) -> String {
    offered
        .iter()
        .map(|r| {
            format!(
                "[{}] {} ({}d)",
                r.as_i32(),
                r,
                candidates.state(*r).scheduled_days
            )
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// A card that cannot be scheduled is reported and left behind; other errors end the session
fn tolerate_unschedulable(result: Result<(), SessionError>) -> anyhow::Result<()> {
    match result {
        Err(SessionError::Scheduler(e)) => {
            eprintln!("{} {}", "Skipping card:".yellow().bold(), e);
            Ok(())
        }
        other => Ok(other?),
    }
}

/// Present the next schedulable card, if any
fn present_next(session: &mut ReviewSession<'_, Storage>) -> anyhow::Result<bool> {
    loop {
        match session.present(Utc::now()).map(|p| p.is_some()) {
            Ok(presenting) => return Ok(presenting),
            Err(e) => tolerate_unschedulable(Err(e))?,
        }
    }
}

fn run_review(storage: &Storage, scheduler: Scheduler, offered: Vec<Rating>) -> anyhow::Result<()> {
    let mut session = ReviewSession::new(storage, scheduler);
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    if !present_next(&mut session)? {
        println!("{}", "Nothing to review.".green());
        return Ok(());
    }

    'session: while let Some(presentation) = session.current() {
        let card = &presentation.item;
        let menu = rating_menu(&presentation.candidates, &offered);
        let remaining = session.remaining(Utc::now())?;

        println!();
        println!(
            "{} {}",
            format!("[{} due]", remaining).dimmed(),
            card.question.name.cyan().bold()
        );
        println!(
            "  {} | {} | {}",
            difficulty_label(&card.question),
            card.question.pattern,
            card.question.link
        );
        if !card.note.is_empty() {
            println!("  {}: {}", "Note".white().bold(), card.note);
        }

        let mut hints_shown = 0;
        let step = loop {
            let hint_prompt = if hints_shown < card.hints.len() { "  [h] hint" } else { "" };
            print!("{}{}  [s] skip  [q] quit > ", menu, hint_prompt);
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                break 'session;
            };
            match parse_answer(&line?, &offered) {
                Answer::Rate(rating) => break Some(rating),
                Answer::Skip => break None,
                Answer::Quit => break 'session,
                Answer::Hint if hints_shown < card.hints.len() => {
                    println!("  {} {}", "Hint:".yellow().bold(), card.hints[hints_shown]);
                    hints_shown += 1;
                }
                Answer::Hint => println!("{}", "  No more hints.".dimmed()),
                Answer::Invalid => println!("{}", "  Unrecognized answer.".red()),
            }
        };

        let outcome = match step {
            Some(rating) => {
                let due = presentation.candidates.state(rating).due;
                println!("  {} next review {}", "Saved.".green(), due.format("%Y-%m-%d"));
                session.answer(rating, Utc::now()).map(|_| ())
            }
            None => {
                println!("  {}", "Skipped.".dimmed());
                session.skip(Utc::now()).map(|_| ())
            }
        };
        tolerate_unschedulable(outcome)?;
        present_next(&mut session)?;
    }

    println!();
    println!(
        "{}",
        format!(
            "Session complete: {} reviewed, {} set aside",
            session.reviewed(),
            session.set_aside()
        )
        .green()
        .bold()
    );
    Ok(())
}

// ============================================================================
// STATS
// ============================================================================

fn run_stats(storage: &Storage) -> anyhow::Result<()> {
    let stats = storage.deck_stats(Utc::now())?;

    println!("{}", "=== Recode Deck Statistics ===".cyan().bold());
    println!();
    println!("{}: {}", "Catalog Questions".white().bold(), stats.total_questions);
    println!("{}: {}", "Tracked".white().bold(), stats.tracked);
    println!("{}: {}", "Due Now".white().bold(), stats.due);
    println!("{}: {}", "Paused".white().bold(), stats.suspended);
    println!("{}: {}", "Total Reviews".white().bold(), stats.total_reviews);
    println!(
        "{}: {:.1}%",
        "Average Retrievability".white().bold(),
        stats.average_retrievability * 100.0
    );

    if stats.tracked > 0 {
        println!();
        println!("{}", "=== Status Distribution ===".yellow().bold());
        let total = stats.tracked as usize;
        print_distribution_bar("New", stats.new as usize, total);
        print_distribution_bar("Learning", stats.learning as usize, total);
        print_distribution_bar("Review", stats.review as usize, total);
        print_distribution_bar("Relearning", stats.relearning as usize, total);
    }

    println!();
    println!(
        "{}",
        format!(
            "recode-core v{} (FSRS-{})",
            recode_core::VERSION,
            recode_core::FSRS_VERSION
        )
        .dimmed()
    );
    Ok(())
}

fn print_distribution_bar(label: &str, count: usize, total: usize) {
    let percentage = if total > 0 {
        (count as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    let bar_width: usize = 30;
    let filled = ((percentage / 100.0) * bar_width as f64) as usize;
    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(bar_width.saturating_sub(filled)));

    println!("  {:12} [{}] {:>4} ({:>5.1}%)", label, bar.green(), count, percentage);
}

// ============================================================================
// FORMATTING
// ============================================================================

fn difficulty_label(q: &Question) -> colored::ColoredString {
    let label = q.difficulty.as_str();
    match q.difficulty {
        recode_core::QuestionDifficulty::Easy => label.green(),
        recode_core::QuestionDifficulty::Medium => label.yellow(),
        recode_core::QuestionDifficulty::Hard => label.red(),
    }
}

fn status_label(card: &TrackedQuestion) -> colored::ColoredString {
    if card.suspended {
        return "paused".dimmed();
    }
    let label = card.memory.status.as_str();
    match card.memory.status {
        LearningState::New => label.white(),
        LearningState::Learning | LearningState::Relearning => label.yellow(),
        LearningState::Review => label.green(),
    }
}

fn due_label(due: DateTime<Utc>, now: DateTime<Utc>) -> String {
    if due <= now {
        return "due now".to_string();
    }
    let days = (due - now).num_days();
    match days {
        0 => format!("due {}", due.format("%H:%M")),
        1 => "due tomorrow".to_string(),
        n => format!("due in {} days", n),
    }
}
