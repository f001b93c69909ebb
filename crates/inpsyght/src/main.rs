//! `inpsyght` - CLI for Big Five questionnaires
//!
//! This binary lists forms from the CMS, runs the interactive questionnaire,
//! and shows scored results and past attempts.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use tracing::debug;

use inpsyght::cli::{
    AnswerCommand, Cli, Command, ConfigCommand, HistoryCommand, OutputFormat, ProgressCommand,
    ResultsCommand, TakeCommand,
};
use inpsyght::{
    init_logging, ArchiveOutcome, CmsClient, Config, FileSource, FormSource, LikertValue,
    Report, Session, Step, Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Config commands must work even when the configuration is broken
    let command = match cli.command {
        Command::Config(config_cmd) => return handle_config(cli.config, config_cmd),
        command => command,
    };

    let config = Config::load_from(cli.config)?;
    let source = form_source(cli.source_file.as_deref(), &config)?;

    let result = match command {
        Command::Forms(cmd) => handle_forms(source.as_ref(), cmd.json).await,
        Command::Take(cmd) => handle_take(&config, source.as_ref(), &cmd).await,
        Command::Answer(cmd) => handle_answer(&config, source.as_ref(), &cmd).await,
        Command::Progress(cmd) => handle_progress(&config, source.as_ref(), &cmd).await,
        Command::Results(cmd) => handle_results(&config, source.as_ref(), &cmd).await,
        Command::Reset(cmd) => handle_reset(&config, &cmd.form_id, cmd.yes),
        Command::History(cmd) => handle_history(&config, cmd),
        Command::Status(cmd) => handle_status(&config, source.as_ref(), cmd.json),
        Command::Config(_) => unreachable!("config commands are handled before loading"),
    };

    if let Err(err) = &result {
        if err
            .downcast_ref::<inpsyght::Error>()
            .is_some_and(inpsyght::Error::is_cms_error)
        {
            eprintln!(
                "Could not load forms from {}. Check `cms.base_url` or pass --source-file.",
                source.describe()
            );
        }
    }
    result
}

fn form_source(source_file: Option<&Path>, config: &Config) -> anyhow::Result<Box<dyn FormSource>> {
    if let Some(path) = source_file {
        debug!("Reading forms from {}", path.display());
        return Ok(Box::new(FileSource::new(path)));
    }
    Ok(Box::new(CmsClient::new(config)?))
}

fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("opening answer cache at {}", path.display()))
}

fn print_report(report: &Report, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Plain => print!("{}", report.render_plain()),
        OutputFormat::Table => print!("{}", report.render_table()),
        OutputFormat::Json => println!("{}", report.render_json()?),
    }
    Ok(())
}

async fn handle_forms(source: &dyn FormSource, json: bool) -> anyhow::Result<()> {
    let forms = source
        .list_forms()
        .await
        .with_context(|| format!("listing forms from {}", source.describe()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&forms)?);
        return Ok(());
    }

    if forms.is_empty() {
        println!("No forms available.");
        return Ok(());
    }

    println!("Available forms");
    println!("===============");
    for form in &forms {
        println!("  {}  {}", form.document_id, form.name);
        if let Some(description) = &form.description {
            println!("      {description}");
        }
    }
    Ok(())
}

async fn handle_take(
    config: &Config,
    source: &dyn FormSource,
    cmd: &TakeCommand,
) -> anyhow::Result<()> {
    let form = source.fetch_form(&cmd.form_id).await?;
    let storage = open_storage(config)?;
    let cached = storage.load_answers(&form.document_id)?;
    let mut session = Session::resume(&form, &cached)?;

    if session.is_complete() {
        println!("Every question of '{}' is already answered.", form.name);
        println!(
            "Run `inpsyght results {0}` to see them or `inpsyght reset {0}` to start over.",
            form.document_id
        );
        return Ok(());
    }

    let mut previous: HashMap<String, LikertValue> = cached
        .into_iter()
        .map(|a| (a.question_id, a.value))
        .collect();

    println!("{}", form.name);
    if let Some(description) = &form.description {
        println!("{description}");
    }
    println!();

    let theme = ColorfulTheme::default();
    loop {
        let Some(current) = session.current().cloned() else {
            break;
        };

        println!(
            "{} ({:.0}%)  {} / {}",
            session.position_label(),
            session.progress_percent(),
            current.factor_name,
            current.facet_name
        );

        let mut items: Vec<String> = LikertValue::all()
            .map(|v| format!("{v} - {}", v.label()))
            .collect();
        let can_go_back = session.position() > 0;
        if can_go_back {
            items.push("Back".to_string());
        }
        let default = previous
            .get(&current.question.id)
            .map_or(0, |v| usize::from(v.get()) - 1);

        let choice = Select::with_theme(&theme)
            .with_prompt(&current.question.text)
            .items(&items)
            .default(default)
            .interact_opt()?;

        let Some(choice) = choice else {
            println!(
                "Progress saved ({} of {} answered).",
                session.answered_count(),
                session.len()
            );
            return Ok(());
        };

        if can_go_back && choice == items.len() - 1 {
            session.back();
            continue;
        }

        let value = LikertValue::try_from(u8::try_from(choice + 1)?)?;
        let (answer, step) = session.answer(value)?;
        storage.save_answer(&form.document_id, &answer)?;
        previous.insert(answer.question_id.clone(), answer.value);

        if step == Step::Finished {
            break;
        }
    }

    let (report, outcome) = storage.score_cached(&form, config.scoring.weighting, true)?;
    println!();
    print_report(&report, OutputFormat::Plain)?;

    println!();
    match outcome {
        Some(ArchiveOutcome::Archived(id)) => println!("Saved to history as #{id}."),
        Some(ArchiveOutcome::AlreadyArchived(id)) => println!("Already in history as #{id}."),
        _ => {}
    }
    Ok(())
}

async fn handle_answer(
    config: &Config,
    source: &dyn FormSource,
    cmd: &AnswerCommand,
) -> anyhow::Result<()> {
    let form = source.fetch_form(&cmd.form_id).await?;
    let storage = open_storage(config)?;
    let cached = storage.load_answers(&form.document_id)?;
    let mut session = Session::resume(&form, &cached)?;

    let value = LikertValue::new(cmd.value)?;
    let answer = session.answer_question(&cmd.question_id, value)?;
    storage.save_answer(&form.document_id, &answer)?;

    println!(
        "Recorded {} ({}) for question {}.",
        value,
        value.label(),
        answer.question_id
    );
    println!("{} of {} answered.", session.answered_count(), session.len());
    Ok(())
}

async fn handle_progress(
    config: &Config,
    source: &dyn FormSource,
    cmd: &ProgressCommand,
) -> anyhow::Result<()> {
    let form = source.fetch_form(&cmd.form_id).await?;
    let storage = open_storage(config)?;
    let cached = storage.load_answers(&form.document_id)?;
    let session = Session::resume(&form, &cached)?;

    if cmd.json {
        let next = session.current().map(|q| {
            serde_json::json!({
                "id": q.question.id,
                "text": q.question.text,
                "factor": q.factor_name,
                "facet": q.facet_name,
            })
        });
        let progress = serde_json::json!({
            "document_id": form.document_id,
            "name": form.name,
            "answered": session.answered_count(),
            "total": session.len(),
            "complete": session.is_complete(),
            "next_question": next,
        });
        println!("{}", serde_json::to_string_pretty(&progress)?);
        return Ok(());
    }

    println!("{}", form.name);
    println!(
        "Answered: {} of {}",
        session.answered_count(),
        session.len()
    );
    match session.current() {
        Some(question) => {
            println!(
                "Next:     {} ({:.0}%) {}",
                session.position_label(),
                session.progress_percent(),
                question.question.text
            );
        }
        None => println!("Complete. Run `inpsyght results {}`.", form.document_id),
    }
    Ok(())
}

async fn handle_results(
    config: &Config,
    source: &dyn FormSource,
    cmd: &ResultsCommand,
) -> anyhow::Result<()> {
    let form = source.fetch_form(&cmd.form_id).await?;
    let storage = open_storage(config)?;
    let archive = !cmd.no_archive;

    let (report, outcome) = match storage.score_cached(&form, config.scoring.weighting, archive) {
        Ok(scored) => scored,
        Err(e) if e.is_no_answers() => {
            println!("No answers recorded for '{}'.", form.name);
            println!("Run `inpsyght take {}` to start.", form.document_id);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    print_report(&report, cmd.format)?;

    if let Some(ArchiveOutcome::Archived(id)) = outcome {
        debug!(id, "results archived");
    }
    Ok(())
}

fn handle_reset(config: &Config, form_id: &str, yes: bool) -> anyhow::Result<()> {
    if !yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Discard all cached answers for '{form_id}'?"))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Nothing changed.");
            return Ok(());
        }
    }

    let storage = open_storage(config)?;
    let cleared = storage.clear_answers(form_id)?;
    println!("Cleared {cleared} answers for '{form_id}'.");
    Ok(())
}

fn handle_history(config: &Config, cmd: HistoryCommand) -> anyhow::Result<()> {
    let storage = open_storage(config)?;

    match cmd {
        HistoryCommand::List { form, limit, json } => {
            let limit = limit.unwrap_or(config.storage.history_limit);
            let entries = storage.list_history(form.as_deref(), limit)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No completed attempts.");
            } else {
                for entry in &entries {
                    println!(
                        "#{:<4} {}  {} ({})  {} answers",
                        entry.id,
                        entry.completed_at.format("%Y-%m-%d %H:%M"),
                        entry.form_name,
                        entry.form_id,
                        entry.answer_count
                    );
                }
            }
        }
        HistoryCommand::Show { id, format } => {
            let (_, report) = storage.get_history(id)?;
            print_report(&report, format)?;
        }
        HistoryCommand::Delete { id } => {
            if !storage.delete_history(id)? {
                bail!("history entry {id} not found");
            }
            println!("Deleted history entry #{id}.");
        }
    }
    Ok(())
}

fn handle_status(config: &Config, source: &dyn FormSource, json: bool) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let stats = storage.stats()?;

    if json {
        let status = serde_json::json!({
            "source": source.describe(),
            "database_path": storage.path(),
            "weighting": config.scoring.weighting,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("inpsyght status");
        println!("---------------");
        println!("Source:            {}", source.describe());
        println!("Database:          {}", storage.path().display());
        println!("Database size:     {} bytes", stats.db_size_bytes);
        println!("Cached answers:    {}", stats.cached_answers);
        println!("Forms in progress: {}", stats.forms_in_progress);
        println!("Completed:         {}", stats.history_entries);
        if let Some(last) = stats.last_completed {
            println!("Last completed:    {}", last.format("%Y-%m-%d %H:%M UTC"));
        }
    }
    Ok(())
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[CMS]");
                println!("  Base URL:           {}", config.cms_base_url());
                println!("  Timeout (secs):     {}", config.cms.timeout_secs);
                println!("  User agent:         {}", config.cms.user_agent);
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  History limit:      {}", config.storage.history_limit);
                println!();
                println!("[Scoring]");
                println!("  Weighting:          {}", config.scoring.weighting);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
