//! `heritage` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration from flags with environment fallbacks.
//! - Print one family's tree as pretty JSON on stdout.
//!
//! # Invariants
//! - Usage errors exit with code 2, runtime errors with code 1.
//! - Nothing but the JSON document is written to stdout.

use heritage_core::{
    default_log_level, init_logging, open_db, AssemblyOptions, FamilyId, SharedDescendantPolicy,
    SqliteFamilyRepository, SqlitePersonRepository, SqliteRelationshipRepository, TreeService,
};
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

const EXIT_RUNTIME_ERROR: u8 = 1;
const EXIT_USAGE_ERROR: u8 = 2;

fn usage() -> &'static str {
    "heritage - print a family tree as JSON\n\n\
USAGE:\n\
  heritage --db PATH --family UUID [--simple]\n\
           [--policy duplicate|first-visit] [--max-depth N]\n\
           [--log-dir DIR] [--log-level LEVEL]\n\n\
ENVIRONMENT:\n\
  HERITAGE_DB, HERITAGE_FAMILY, HERITAGE_LOG_DIR, HERITAGE_LOG_LEVEL\n\
  are used when the matching flag is absent.\n\n\
NOTES:\n\
  - Without --simple the output holds the family, the tree, and the raw\n\
    persons and relationships.\n\
  - --policy first-visit attaches a shared descendant under one parent only.\n\
  - Logging is off unless a log directory is given.\n"
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliConfig {
    db_path: PathBuf,
    family_id: FamilyId,
    simple: bool,
    options: AssemblyOptions,
    log_dir: Option<PathBuf>,
    log_level: String,
}

#[derive(Debug, PartialEq, Eq)]
enum ParseOutcome {
    Run(CliConfig),
    Help,
    Version,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_family_id(raw: &str) -> Result<FamilyId, String> {
    FamilyId::parse_str(raw.trim()).map_err(|_| format!("invalid family id `{raw}`"))
}

fn parse_args<F>(args: &[String], env: F) -> Result<ParseOutcome, String>
where
    F: Fn(&str) -> Option<String>,
{
    if args.iter().any(|a| a == "-h" || a == "--help") {
        return Ok(ParseOutcome::Help);
    }
    if args.iter().any(|a| a == "-V" || a == "--version") {
        return Ok(ParseOutcome::Version);
    }

    let mut db_path: Option<PathBuf> = env("HERITAGE_DB").map(PathBuf::from);
    let mut family: Option<String> = env("HERITAGE_FAMILY");
    let mut log_dir: Option<PathBuf> = env("HERITAGE_LOG_DIR").map(PathBuf::from);
    let mut log_level: String =
        env("HERITAGE_LOG_LEVEL").unwrap_or_else(|| default_log_level().to_string());
    let mut simple = false;
    let mut options = AssemblyOptions::default();

    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--db" => {
                i += 1;
                let v = args.get(i).ok_or("--db requires PATH")?;
                db_path = Some(PathBuf::from(v));
            }
            "--family" => {
                i += 1;
                let v = args.get(i).ok_or("--family requires UUID")?;
                family = Some(v.to_string());
            }
            "--simple" => simple = true,
            "--policy" => {
                i += 1;
                let v = args.get(i).ok_or("--policy requires duplicate|first-visit")?;
                options.policy = SharedDescendantPolicy::parse(v)
                    .ok_or_else(|| format!("--policy must be duplicate|first-visit, got `{v}`"))?;
            }
            "--max-depth" => {
                i += 1;
                let v = args.get(i).ok_or("--max-depth requires N")?;
                options.max_depth = Some(
                    v.parse::<usize>()
                        .map_err(|_| "--max-depth must be a non-negative integer")?,
                );
            }
            "--log-dir" => {
                i += 1;
                let v = args.get(i).ok_or("--log-dir requires DIR")?;
                log_dir = Some(PathBuf::from(v));
            }
            "--log-level" => {
                i += 1;
                let v = args.get(i).ok_or("--log-level requires LEVEL")?;
                log_level = v.to_string();
            }
            other => return Err(format!("unknown argument `{other}`")),
        }
        i += 1;
    }

    let db_path = db_path.ok_or("--db (or HERITAGE_DB) is required")?;
    let family = family.ok_or("--family (or HERITAGE_FAMILY) is required")?;
    let family_id = parse_family_id(&family)?;

    Ok(ParseOutcome::Run(CliConfig {
        db_path,
        family_id,
        simple,
        options,
        log_dir,
        log_level,
    }))
}

fn run(cfg: &CliConfig) -> Result<String, Box<dyn std::error::Error>> {
    let started_at = Instant::now();
    let conn = open_db(&cfg.db_path)?;
    let service = TreeService::with_options(
        SqlitePersonRepository::try_new(&conn)?,
        SqliteRelationshipRepository::try_new(&conn)?,
        SqliteFamilyRepository::try_new(&conn)?,
        cfg.options,
    );

    let rendered = if cfg.simple {
        serde_json::to_string_pretty(&service.simple_tree(cfg.family_id)?)?
    } else {
        serde_json::to_string_pretty(&service.family_tree(cfg.family_id)?)?
    };

    info!(
        "event=cli_render module=cli status=ok family_id={} shape={} duration_ms={}",
        cfg.family_id,
        if cfg.simple { "simple" } else { "rich" },
        started_at.elapsed().as_millis()
    );
    Ok(rendered)
}

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = match parse_args(&args, env_var) {
        Ok(ParseOutcome::Run(cfg)) => cfg,
        Ok(ParseOutcome::Help) => {
            print!("{}", usage());
            return ExitCode::SUCCESS;
        }
        Ok(ParseOutcome::Version) => {
            println!("heritage {}", heritage_core::core_version());
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{message}\n\n{}", usage());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    if let Some(log_dir) = &cfg.log_dir {
        if let Err(err) = init_logging(&cfg.log_level, log_dir) {
            eprintln!("{err}");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    }

    match run(&cfg) {
        Ok(rendered) => {
            println!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("event=cli_render module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::from(EXIT_RUNTIME_ERROR)
        }
    }
}
