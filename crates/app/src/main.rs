use std::fmt;
use std::io::{BufRead, Write};
use std::sync::Arc;

use annotate_core::model::{Label, SessionReport, Task};
use services::{
    AnnotationLoopService, AnnotatorName, Clock, ReportDelivery, ReportService, SessionError,
};
use services::prelabel::{self, PrelabelService};
use storage::dataset;
use storage::sqlite::SqliteRepository;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidTask { raw: String },
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidTask { raw } => write!(f, "invalid --task value: {raw}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value: {raw}")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<usize, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- annotate [--data <file>] [--task <task>] [--db <sqlite_url>] [--sample <n>]");
    eprintln!("  cargo run -p app -- prelabel [--data <file>] [--out-full <file>] [--out-sample <file>] [--per-target <n>] [--negatives <n>]");
    eprintln!("  cargo run -p app -- reports  [--db <sqlite_url>] [--task <task>] [--days <n>] [--limit <n>]");
    eprintln!();
    eprintln!("Tasks: fake-news, hate-speech (annotate prompts when --task is omitted)");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --data data.json (prelabel: hateval2019_en_test.csv)");
    eprintln!("  --db sqlite:annotate.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ANNOTATE_DATA, ANNOTATE_DB_URL, ANNOTATE_REPORT_URL,");
    eprintln!("  ANNOTATE_LLM_BASE_URL, ANNOTATE_LLM_MODEL");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Annotate,
    Prelabel,
    Reports,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "annotate" => Some(Self::Annotate),
            "prelabel" => Some(Self::Prelabel),
            "reports" => Some(Self::Reports),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct AnnotateArgs {
    data: String,
    task: Option<Task>,
    db_url: String,
    sample_size: Option<usize>,
}

struct PrelabelArgs {
    data: String,
    out_full: String,
    out_sample: String,
    per_target: usize,
    negatives: usize,
}

struct ReportsArgs {
    db_url: String,
    task: Option<Task>,
    days: i64,
    limit: u32,
}

fn env_data(default: &str) -> String {
    std::env::var("ANNOTATE_DATA").unwrap_or_else(|_| default.into())
}

fn env_db_url() -> String {
    std::env::var("ANNOTATE_DB_URL")
        .ok()
        .map_or_else(|| "sqlite://annotate.sqlite3".into(), normalize_sqlite_url)
}

fn parse_task_value(args: &mut impl Iterator<Item = String>) -> Result<Task, ArgsError> {
    let raw = require_value(args, "--task")?;
    raw.parse().map_err(|_| ArgsError::InvalidTask { raw })
}

fn parse_db_value(args: &mut impl Iterator<Item = String>) -> Result<String, ArgsError> {
    let value = require_value(args, "--db")?;
    if value.trim().is_empty() {
        return Err(ArgsError::InvalidDbUrl { raw: value });
    }
    Ok(normalize_sqlite_url(value))
}

impl AnnotateArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            data: env_data("data.json"),
            task: None,
            db_url: env_db_url(),
            sample_size: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => parsed.data = require_value(args, "--data")?,
                "--task" => parsed.task = Some(parse_task_value(args)?),
                "--db" => parsed.db_url = parse_db_value(args)?,
                "--sample" => parsed.sample_size = Some(parse_number(args, "--sample")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

impl PrelabelArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            data: env_data("hateval2019_en_test.csv"),
            out_full: "prelabeled.json".into(),
            out_sample: "sample.jsonl".into(),
            per_target: 10,
            negatives: 15,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data" => parsed.data = require_value(args, "--data")?,
                "--out-full" => parsed.out_full = require_value(args, "--out-full")?,
                "--out-sample" => parsed.out_sample = require_value(args, "--out-sample")?,
                "--per-target" => parsed.per_target = parse_number(args, "--per-target")?,
                "--negatives" => parsed.negatives = parse_number(args, "--negatives")?,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

impl ReportsArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: env_db_url(),
            task: None,
            days: 30,
            limit: 20,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => parsed.db_url = parse_db_value(args)?,
                "--task" => parsed.task = Some(parse_task_value(args)?),
                "--days" => parsed.days = parse_number(args, "--days")? as i64,
                "--limit" => parsed.limit = parse_number(args, "--limit")? as u32,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn open_repository(db_url: &str) -> Result<Arc<SqliteRepository>, Box<dyn std::error::Error>> {
    prepare_sqlite_file(db_url)?;
    let repo = SqliteRepository::connect(db_url).await?;
    repo.migrate().await?;
    Ok(Arc::new(repo))
}

//
// ─── TERMINAL INPUT ───────────────────────────────────────────────────────────
//

fn read_line(input: &mut impl BufRead) -> Result<Option<String>, std::io::Error> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask which task to annotate before anything else is loaded.
fn prompt_task(input: &mut impl BufRead) -> Result<Task, Box<dyn std::error::Error>> {
    loop {
        println!("Please select an option:");
        println!("  [1] Fake news");
        println!("  [2] Hate speech");
        print!("> ");
        std::io::stdout().flush()?;

        match read_line(input)? {
            None => return Err("no task selected".into()),
            Some(line) => match line.as_str() {
                "1" => return Ok(Task::FakeNews),
                "2" => return Ok(Task::HateSpeech),
                _ => eprintln!("Please answer 1 or 2."),
            },
        }
    }
}

/// Map one line of input to a label choice; an empty line is "no selection".
fn parse_choice(line: &str) -> Result<Option<Label>, ()> {
    match line {
        "" => Ok(None),
        "1" => Ok(Some(Label::Positive)),
        "2" => Ok(Some(Label::Negative)),
        _ => Err(()),
    }
}

fn print_scores(report: &SessionReport) {
    println!();
    println!("You have classified all texts.");
    println!("  F1 Score: {:.2}%", report.f1() * 100.0);
    println!("  Accuracy: {:.2}%", report.accuracy() * 100.0);
}

//
// ─── COMMANDS ─────────────────────────────────────────────────────────────────
//

async fn run_annotate(args: AnnotateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = std::io::stdin();
    let mut input = stdin.lock();

    let task = match args.task {
        Some(task) => task,
        None => prompt_task(&mut input)?,
    };

    // Load and sample before touching the terminal loop; a bad dataset should
    // fail here, not mid-session.
    let records = dataset::read_records(&args.data)?;
    let repo = open_repository(&args.db_url).await?;

    let clock = Clock::default_clock();
    let loop_svc = AnnotationLoopService::new(clock, repo).with_sample_size(args.sample_size);
    let mut session = loop_svc.start_session(&records, task)?;

    info!(
        "starting {} session with {} items",
        task,
        session.total_items()
    );

    while let Some(item) = session.current_item() {
        let progress = session.progress();
        println!();
        println!(
            "{} {} of {}  ({:.0}%)",
            capitalize(task.item_noun()),
            progress.answered + 1,
            progress.total,
            progress.percent()
        );
        if let Some(headline) = item.headline() {
            println!("== {headline} ==");
        }
        println!("{}", item.text());
        println!(
            "  [1] {}   [2] {}",
            task.class_name(Label::Positive),
            task.class_name(Label::Negative)
        );
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = read_line(&mut input)? else {
            return Err("input closed before the session completed".into());
        };
        let Ok(choice) = parse_choice(&line) else {
            eprintln!("Please answer 1, 2, or press Enter to skip confirmation.");
            continue;
        };

        match loop_svc.submit_current(&mut session, choice).await {
            Ok(_) => {}
            Err(SessionError::NoSelection) => {
                eprintln!("Please select an option before confirming.");
            }
            Err(SessionError::Storage(error)) if session.is_complete() => {
                // The decisions are safe in memory; retry the report append.
                warn!("failed to persist report: {error}");
                if let Err(retry) = loop_svc.finalize_report(&mut session).await {
                    warn!("report persistence retry failed: {retry}");
                }
            }
            Err(error) => return Err(error.into()),
        }
    }

    let completed_at = session
        .completed_at()
        .ok_or(SessionError::Incomplete)?;
    let report = session.build_report(completed_at)?;
    print_scores(&report);

    let delivery = ReportDelivery::from_env();
    if delivery.enabled() {
        print!("Please enter your name: ");
        std::io::stdout().flush()?;
        let annotator = loop {
            let Some(line) = read_line(&mut input)? else {
                warn!("input closed; skipping report delivery");
                return Ok(());
            };
            match AnnotatorName::parse(line) {
                Ok(name) => break name,
                Err(_) => {
                    print!("Name cannot be empty, please enter your name: ");
                    std::io::stdout().flush()?;
                }
            }
        };

        match delivery.send(&report, &annotator).await {
            Ok(()) => info!("report delivered"),
            Err(error) => warn!("report delivery failed: {error}"),
        }
    }

    Ok(())
}

async fn run_prelabel(args: PrelabelArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut records = dataset::read_records(&args.data)?;
    info!("loaded {} records from {}", records.len(), args.data);

    let service = PrelabelService::from_env();
    let summary = service.prelabel_records(&mut records).await;

    dataset::write_json(&args.out_full, &records)?;
    let sample = prelabel::balanced_sample(&records, args.per_target, args.negatives);
    dataset::write_jsonl(&args.out_sample, &sample)?;

    println!(
        "Pre-labeled {} of {} positive records ({} unmatched, {} failed).",
        summary.targeted, summary.submitted, summary.unmatched, summary.failed
    );
    println!("Full dataset: {}", args.out_full);
    println!("Balanced sample ({} records): {}", sample.len(), args.out_sample);
    Ok(())
}

async fn run_reports(args: ReportsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let repo = open_repository(&args.db_url).await?;
    let service = ReportService::new(Clock::default_clock(), repo);

    let items = service.list_recent(args.task, args.days, args.limit).await?;
    if items.is_empty() {
        println!("No reports in the last {} days.", args.days);
        return Ok(());
    }

    for item in items {
        println!(
            "#{:<4} {:<12} {}  items: {:<3} accuracy: {:>6.2}%  F1: {:>6.2}%",
            item.id,
            item.task,
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.total,
            item.accuracy * 100.0,
            item.f1 * 100.0
        );
    }
    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: annotating when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Annotate,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Annotate,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    match cmd {
        Command::Annotate => {
            let args = AnnotateArgs::parse(&mut iter).map_err(usage_error)?;
            run_annotate(args).await
        }
        Command::Prelabel => {
            let args = PrelabelArgs::parse(&mut iter).map_err(usage_error)?;
            run_prelabel(args).await
        }
        Command::Reports => {
            let args = ReportsArgs::parse(&mut iter).map_err(usage_error)?;
            run_reports(args).await
        }
    }
}

fn usage_error(error: ArgsError) -> Box<dyn std::error::Error> {
    eprintln!("{error}");
    print_usage();
    error.into()
}

#[tokio::main]
async fn main() {
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_choice_maps_options_and_empty_lines() {
        assert_eq!(parse_choice("1"), Ok(Some(Label::Positive)));
        assert_eq!(parse_choice("2"), Ok(Some(Label::Negative)));
        assert_eq!(parse_choice(""), Ok(None));
        assert!(parse_choice("maybe").is_err());
    }

    #[test]
    fn normalize_accepts_memory_and_prefixed_urls() {
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/a.sqlite3".into()),
            "sqlite:///tmp/a.sqlite3"
        );
        assert!(normalize_sqlite_url("relative.sqlite3".into()).starts_with("sqlite://"));
    }

    #[test]
    fn annotate_args_parse_flags() {
        let mut iter = [
            "--data", "news.json", "--task", "fake-news", "--sample", "5",
        ]
        .into_iter()
        .map(String::from);
        let args = AnnotateArgs::parse(&mut iter).unwrap();
        assert_eq!(args.data, "news.json");
        assert_eq!(args.task, Some(Task::FakeNews));
        assert_eq!(args.sample_size, Some(5));
    }

    #[test]
    fn annotate_args_reject_unknown_flags() {
        let mut iter = ["--theme", "solar"].into_iter().map(String::from);
        let err = AnnotateArgs::parse(&mut iter).unwrap_err();
        assert!(matches!(err, ArgsError::UnknownArg(_)));
    }
}
