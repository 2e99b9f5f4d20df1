//! # rinkstat
//!
//! Command-line front end for rinkstatlib: run canned hockey statistics
//! reports against a SQLite database, or render any CSV/JSON table, as
//! column-aligned text.
//!
//! ## Usage
//!
//! ```bash
//! # Create the schema and load data
//! rinkstat --db hockey.db load --init data/*.sql
//!
//! # List available reports
//! rinkstat list
//!
//! # Run reports
//! rinkstat --db hockey.db query teams
//! rinkstat --db hockey.db query top-players -p stat=g -p season=2018-2019
//! rinkstat --db hockey.db query top-officials -p limit=10
//!
//! # Render a file, top 5 rows with ranks
//! rinkstat render standings.csv --limit 5 --rank
//!
//! # JSON instead of a table
//! rinkstat --db hockey.db query teams --output json
//! ```

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use console::style;
use rinkstatlib::{
    source, Config, QueryId, QueryParams, RenderPolicy, Report, SourceFormat,
    SqliteQueryService, TableRenderer, TabularResult,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Text,
    Json,
}

/// Settings shared by every subcommand
struct Session {
    config: Config,
    output: OutputMode,
}

impl Session {
    fn from_matches(matches: &ArgMatches) -> anyhow::Result<Self> {
        let explicit = matches.get_one::<PathBuf>("config");
        let cwd = std::env::current_dir().context("cannot determine working directory")?;
        let mut config = Config::discover(explicit.map(PathBuf::as_path), &cwd)?;
        if let Some(db) = matches.get_one::<PathBuf>("db") {
            config = config.with_database(db);
        }

        let output = match matches.get_one::<String>("output").map(String::as_str) {
            Some("json") => OutputMode::Json,
            _ => OutputMode::Text,
        };

        debug!(?config, ?output, "resolved session");
        Ok(Self { config, output })
    }

    fn renderer(&self) -> TableRenderer {
        self.config.render.renderer()
    }

    fn database(&self) -> anyhow::Result<&Path> {
        self.config.database.as_deref().ok_or_else(|| {
            anyhow!("no database configured; pass --db or set `database` in rinkstat.toml")
        })
    }
}

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("rinkstat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Hockey statistics reports as aligned text tables")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Configuration file (defaults to ./rinkstat.toml when present)"),
        )
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("SQLite database file (overrides the configuration)"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .global(true)
                .value_parser(["text", "json"])
                .default_value("text")
                .help("Output format"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log debug information to stderr"),
        )
        .subcommand(Command::new("list").about("List the available reports"))
        .subcommand(
            Command::new("query")
                .about("Run a report against the database")
                .arg(
                    Arg::new("name")
                        .required(true)
                        .help("Report name (see `rinkstat list`)"),
                )
                .arg(
                    Arg::new("param")
                        .short('p')
                        .long("param")
                        .action(ArgAction::Append)
                        .help("Report parameter as name=value (can be specified multiple times)"),
                ),
        )
        .subcommand(
            Command::new("render")
                .about("Render a CSV or JSON table file")
                .arg(
                    Arg::new("file")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Table file to render"),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_parser(["csv", "json"])
                        .help("Input format (defaults to the file extension)"),
                )
                .arg(
                    Arg::new("limit")
                        .short('n')
                        .long("limit")
                        .value_parser(value_parser!(usize))
                        .help("Show at most this many rows"),
                )
                .arg(
                    Arg::new("rank")
                        .short('r')
                        .long("rank")
                        .action(ArgAction::SetTrue)
                        .requires("limit")
                        .help("Prepend a rank column (requires --limit)"),
                ),
        )
        .subcommand(
            Command::new("load")
                .about("Run SQL scripts against the database")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(PathBuf))
                        .help("SQL files, executed in order, each in its own transaction"),
                )
                .arg(
                    Arg::new("init")
                        .long("init")
                        .action(ArgAction::SetTrue)
                        .help("Create the schema (and the database file) first"),
                ),
        )
}

/// Boxed banner printed above a report
fn boxed_title(title: &str) -> String {
    let border = "-".repeat(title.chars().count() + 4);
    format!("\n{border}\n| {title} |\n{border}\n\n")
}

fn print_table(
    session: &Session,
    result: &TabularResult,
    policy: &RenderPolicy,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match session.output {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, &policy.apply(result))?;
            writeln!(out)?;
        }
        OutputMode::Text => session.renderer().render(&mut out, result, policy)?,
    }
    out.flush()?;
    Ok(())
}

/// Handler for list command
fn list_handler(session: &Session) -> anyhow::Result<()> {
    let mut listing = TabularResult::new(["Query", "Parameters", "Description"]);
    for query in QueryId::ALL {
        listing.push_row([
            query.name().to_string(),
            query.params().join(", "),
            query.description().to_string(),
        ]);
    }
    print_table(session, &listing, &RenderPolicy::new())
}

/// Handler for query command
fn query_handler(matches: &ArgMatches, session: &Session) -> anyhow::Result<()> {
    let name = matches
        .get_one::<String>("name")
        .ok_or_else(|| anyhow!("missing report name"))?;
    let query: QueryId = name.parse()?;
    let params = QueryParams::from_assignments(
        matches
            .get_many::<String>("param")
            .into_iter()
            .flatten(),
    )?;

    let service = SqliteQueryService::open(session.database()?)?;
    let report = Report::run(
        &service,
        query,
        &params,
        &session.config.render.rank_header,
    )?;

    match session.output {
        OutputMode::Json => {
            let value = serde_json::json!({
                "query": report.query,
                "title": &report.title,
                "table": report.displayed(),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        OutputMode::Text => {
            print!("{}", boxed_title(&report.title));
            print_table(session, &report.result, &report.policy)
        }
    }
}

/// Handler for render command
fn render_handler(matches: &ArgMatches, session: &Session) -> anyhow::Result<()> {
    let file = matches
        .get_one::<PathBuf>("file")
        .ok_or_else(|| anyhow!("missing file"))?;
    let format = matches
        .get_one::<String>("format")
        .map(|f| f.parse::<SourceFormat>())
        .transpose()?;
    let result = source::load(file, format)?;

    let mut policy = RenderPolicy::new();
    if let Some(limit) = matches.get_one::<usize>("limit") {
        policy = policy.cap(*limit);
    }
    if matches.get_flag("rank") {
        policy = policy.ranked(session.config.render.rank_header.clone());
    }

    print_table(session, &result, &policy)
}

/// Handler for load command
fn load_handler(matches: &ArgMatches, session: &Session) -> anyhow::Result<()> {
    let db = session.database()?;
    let init = matches.get_flag("init");
    let mut service = if init {
        SqliteQueryService::create(db)?
    } else {
        SqliteQueryService::open(db)?
    };
    if init {
        service.init_schema()?;
    }

    let files: Vec<&PathBuf> = matches
        .get_many::<PathBuf>("files")
        .map(|v| v.collect())
        .unwrap_or_default();
    for file in &files {
        service
            .load_file(file)
            .with_context(|| format!("while loading {}", file.display()))?;
    }

    println!("Loaded {} file(s) into {}", files.len(), db.display());
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no command given"))?;
    let session = Session::from_matches(sub)?;

    match name {
        "list" => list_handler(&session),
        "query" => query_handler(sub, &session),
        "render" => render_handler(sub, &session),
        "load" => load_handler(sub, &session),
        other => Err(anyhow!("unknown command '{}'", other)),
    }
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();

    let verbose = matches
        .subcommand()
        .map(|(_, sub)| sub.get_flag("verbose"))
        .unwrap_or_else(|| matches.get_flag("verbose"));
    init_logging(verbose);

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("Error:").for_stderr().red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
