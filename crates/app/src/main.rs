use std::fmt;
use std::path::PathBuf;

use course_core::entitlement::{self, ContentKind, EntitlementRequest};
use course_core::media::ResolverSettingsDraft;
use course_core::model::{ChapterId, QuizSettingsDraft};
use course_core::MediaResolver;
use tracing_subscriber::EnvFilter;

mod quiz_cli;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { name: &'static str },
    UnknownArg(String),
    InvalidChapterId { raw: String },
    InvalidBatchSize { raw: String },
    InvalidKind { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { name } => write!(f, "missing {name}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidChapterId { raw } => write!(f, "invalid --chapter value: {raw}"),
            ArgsError::InvalidBatchSize { raw } => write!(f, "invalid --batch-size value: {raw}"),
            ArgsError::InvalidKind { raw } => {
                write!(f, "invalid --kind value: {raw} (expected video or document)")
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- resolve <url> [--plan <tier>] [--kind video|document] [--premium] [--branding <url>]");
    eprintln!("  cargo run -p app -- check --kind video|document [--plan <tier>] [--premium]");
    eprintln!("  cargo run -p app -- quiz --chapter <id> --questions <file.json> [--db <sqlite_url>] [--batch-size <n>] [--no-shuffle]");
    eprintln!();
    eprintln!("Global flags:");
    eprintln!("  --verbose   debug logging");
    eprintln!();
    eprintln!("Defaults for quiz:");
    eprintln!("  --db sqlite:course.sqlite3");
    eprintln!("  --batch-size 50");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_DB_URL, COURSE_PLAN, COURSE_BATCH_SIZE, COURSE_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Resolve,
    Check,
    Quiz,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "resolve" => Some(Self::Resolve),
            "check" => Some(Self::Check),
            "quiz" => Some(Self::Quiz),
            _ => None,
        }
    }
}

//
// ─── ARGUMENTS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug)]
struct ResolveArgs {
    url: String,
    plan: Option<String>,
    kind: ContentKind,
    premium: bool,
    branding: Option<String>,
}

#[derive(Debug)]
struct CheckArgs {
    plan: Option<String>,
    kind: ContentKind,
    premium: bool,
}

#[derive(Debug)]
pub(crate) struct QuizArgs {
    pub chapter_id: ChapterId,
    pub questions: PathBuf,
    pub db_url: String,
    pub settings: QuizSettingsDraft,
}

fn plan_from_env() -> Option<String> {
    std::env::var("COURSE_PLAN")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn parse_kind(value: String) -> Result<ContentKind, ArgsError> {
    value
        .parse()
        .map_err(|_| ArgsError::InvalidKind { raw: value })
}

impl ResolveArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut url = None;
        let mut plan = plan_from_env();
        let mut kind = ContentKind::Video;
        let mut premium = false;
        let mut branding = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--plan" => plan = Some(require_value(args, "--plan")?),
                "--kind" => kind = parse_kind(require_value(args, "--kind")?)?,
                "--premium" => premium = true,
                "--branding" => branding = Some(require_value(args, "--branding")?),
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if url.is_none() => url = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            url: url.ok_or(ArgsError::MissingArg { name: "<url>" })?,
            plan,
            kind,
            premium,
            branding,
        })
    }
}

impl CheckArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut plan = plan_from_env();
        let mut kind = None;
        let mut premium = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--plan" => plan = Some(require_value(args, "--plan")?),
                "--kind" => kind = Some(parse_kind(require_value(args, "--kind")?)?),
                "--premium" => premium = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            plan,
            kind: kind.ok_or(ArgsError::MissingArg { name: "--kind" })?,
            premium,
        })
    }
}

impl QuizArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("COURSE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://course.sqlite3".into(), normalize_sqlite_url);
        let mut settings = QuizSettingsDraft {
            batch_size: std::env::var("COURSE_BATCH_SIZE")
                .ok()
                .and_then(|value| value.trim().parse().ok()),
            shuffle: None,
        };
        let mut chapter_id = None;
        let mut questions = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--chapter" => {
                    let value = require_value(args, "--chapter")?;
                    let parsed: ChapterId = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidChapterId { raw: value.clone() })?;
                    chapter_id = Some(parsed);
                }
                "--questions" => {
                    questions = Some(PathBuf::from(require_value(args, "--questions")?));
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--batch-size" => {
                    let value = require_value(args, "--batch-size")?;
                    let parsed: usize = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidBatchSize { raw: value.clone() })?;
                    settings.batch_size = Some(parsed);
                }
                "--no-shuffle" => settings.shuffle = Some(false),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            chapter_id: chapter_id.ok_or(ArgsError::MissingArg { name: "--chapter" })?,
            questions: questions.ok_or(ArgsError::MissingArg { name: "--questions" })?,
            db_url,
            settings,
        })
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

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

fn run_resolve(args: ResolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ResolverSettingsDraft {
        branding_url: args.branding,
        ..ResolverSettingsDraft::default()
    }
    .validate()?;
    let allowed = entitlement::evaluate(&EntitlementRequest::new(
        args.plan.as_deref(),
        args.kind,
        args.premium,
    ));
    let resolved = MediaResolver::new(settings).resolve(&args.url, allowed);

    println!("{}", serde_json::to_string_pretty(&resolved)?);
    println!(
        "download: {}",
        if allowed { "allowed" } else { "denied" }
    );
    Ok(())
}

fn run_check(args: &CheckArgs) {
    let allowed = entitlement::evaluate(&EntitlementRequest::new(
        args.plan.as_deref(),
        args.kind,
        args.premium,
    ));
    let tier = if args.premium { "premium " } else { "" };
    println!(
        "{} download of {tier}{}: {}",
        args.plan.as_deref().unwrap_or("<no plan>"),
        args.kind,
        if allowed { "allow" } else { "deny" }
    );
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

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("COURSE_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();
    let verbose = argv.iter().any(|arg| arg == "--verbose");
    argv.retain(|arg| arg != "--verbose");
    init_logging(verbose);

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    argv.remove(0);

    if argv.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_usage();
        return Ok(());
    }

    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };
    let mut iter = argv.into_iter();
    match cmd {
        Command::Resolve => run_resolve(ResolveArgs::parse(&mut iter).map_err(report)?),
        Command::Check => {
            run_check(&CheckArgs::parse(&mut iter).map_err(report)?);
            Ok(())
        }
        Command::Quiz => {
            let args = QuizArgs::parse(&mut iter).map_err(report)?;
            prepare_sqlite_file(&args.db_url)?;
            quiz_cli::run(args).await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
