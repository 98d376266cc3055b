use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Weekday};
use std::path::PathBuf;

use crate::config::AppConfig;
use crate::error::ReportError;
use crate::providers::{self, Tracker};
use crate::report::{self, DatedSummary};
use crate::schedule::{parse_date, parse_weekday, status_dates};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Report,
    Current,
    Dump(PathBuf),
    Help,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    pub weekday: Option<Weekday>,
    pub since: Option<NaiveDate>,
    pub as_of: Option<NaiveDate>,
    pub work_item_type: Option<String>,
    pub json: bool,
    pub keep_going: bool,
    pub verbose: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub command: Command,
    pub options: Options,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    match args.get(i) {
        Some(v) => Ok(v.as_str()),
        None => bail!("Missing value for {flag}"),
    }
}

/// Parse everything after the program name.
///
/// Supported forms:
///   workstate
///   workstate report -w fri -s 2022-07-01 --json
///   workstate current -t "User Story"
///   workstate dump items.json --as-of 2022-07-15
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let mut options = Options::default();
    let mut positional: Vec<&str> = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();
        match arg {
            "-w" | "--weekday" => {
                i += 1;
                options.weekday = Some(parse_weekday(value(args, i, arg)?)?);
            }
            "-s" | "--since" => {
                i += 1;
                options.since = Some(parse_date(value(args, i, arg)?)?);
            }
            "--as-of" => {
                i += 1;
                options.as_of = Some(parse_date(value(args, i, arg)?)?);
            }
            "-t" | "--type" => {
                i += 1;
                let t = value(args, i, arg)?;
                if t.trim().is_empty() {
                    bail!("Work item type cannot be empty");
                }
                options.work_item_type = Some(t.to_string());
            }
            "--json" => options.json = true,
            "--keep-going" => options.keep_going = true,
            "-h" | "--help" => positional.insert(0, "help"),
            v if v.starts_with("-v") && v[1..].chars().all(|c| c == 'v') => {
                options.verbose = options
                    .verbose
                    .saturating_add(u8::try_from(v.len() - 1).unwrap_or(u8::MAX));
            }
            "--verbose" => options.verbose = options.verbose.saturating_add(1),
            other if other.starts_with('-') => bail!("Unknown option: {other}"),
            other => positional.push(other),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        [] | ["report"] => Command::Report,
        ["current"] => Command::Current,
        ["dump", path] => Command::Dump(PathBuf::from(*path)),
        ["dump"] => bail!("Usage: workstate dump <path> [--as-of <YYYY-MM-DD>]"),
        ["help", ..] => Command::Help,
        [other, ..] => bail!("Unknown command: {other}. Run `workstate help` for usage."),
    };
    check_applicable(&command, &options)?;

    Ok(Invocation { command, options })
}

/// Reject options the chosen command would otherwise ignore.
fn check_applicable(command: &Command, options: &Options) -> Result<()> {
    let (name, given) = match command {
        Command::Help => return Ok(()),
        Command::Report => ("report", vec![("--as-of", options.as_of.is_some())]),
        Command::Current => (
            "current",
            vec![
                ("--weekday", options.weekday.is_some()),
                ("--since", options.since.is_some()),
                ("--as-of", options.as_of.is_some()),
                ("--keep-going", options.keep_going),
            ],
        ),
        Command::Dump(_) => (
            "dump",
            vec![
                ("--weekday", options.weekday.is_some()),
                ("--since", options.since.is_some()),
                ("--json", options.json),
                ("--keep-going", options.keep_going),
            ],
        ),
    };
    if let Some((flag, _)) = given.iter().find(|(_, present)| *present) {
        bail!("{flag} does not apply to `{name}`. Run `workstate help` for usage.");
    }
    Ok(())
}

pub async fn run(invocation: &Invocation, config: &AppConfig) -> Result<()> {
    let tracker = providers::create_tracker(config)?;
    run_with(invocation, config, tracker.as_ref()).await
}

pub async fn run_with(
    invocation: &Invocation,
    config: &AppConfig,
    tracker: &dyn Tracker,
) -> Result<()> {
    let options = &invocation.options;
    let work_item_type = options
        .work_item_type
        .clone()
        .unwrap_or_else(|| config.work_item_type());

    match &invocation.command {
        Command::Help => print_help(),
        Command::Current => {
            let summary = report::summarize_date(tracker, &work_item_type, None).await?;
            print_summaries(&[summary], options.json)?;
        }
        Command::Dump(path) => {
            let count = report::dump_raw(tracker, &work_item_type, options.as_of, path).await?;
            println!("Wrote {count} work items to {}", path.display());
        }
        Command::Report => {
            let anchor = match options.weekday {
                Some(day) => day,
                None => config.anchor_weekday()?,
            };
            let earliest = match options.since {
                Some(date) => date,
                None => config.earliest()?,
            };
            let dates = status_dates(anchor, earliest);
            tracing::info!(
                dates = dates.len(),
                anchor = %anchor,
                earliest = %earliest,
                work_item_type = %work_item_type,
                "Building report"
            );

            if options.keep_going {
                run_settled(tracker, &work_item_type, &dates, options.json).await?;
            } else {
                let summaries = report::summarize_dates(tracker, &work_item_type, &dates).await?;
                print_summaries(&summaries, options.json)?;
            }
        }
    }
    Ok(())
}

async fn run_settled(
    tracker: &dyn Tracker,
    work_item_type: &str,
    dates: &[NaiveDate],
    json: bool,
) -> Result<()> {
    let outcomes = report::summarize_dates_settled(tracker, work_item_type, dates).await;
    let total = outcomes.len();
    let mut summaries = Vec::new();
    for (date, outcome) in outcomes {
        match outcome {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                tracing::error!(%date, error = %format!("{e:#}"), "Snapshot failed");
                eprintln!("{date}: {e:#}");
            }
        }
    }
    print_summaries(&summaries, json)?;

    let failed = total - summaries.len();
    if failed > 0 {
        return Err(ReportError::PartialReport { failed, total }.into());
    }
    Ok(())
}

fn print_summaries(summaries: &[DatedSummary], json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(summaries).context("Failed to encode report")?;
        println!("{out}");
    } else {
        for summary in summaries {
            println!("{}", report::render(summary));
        }
    }
    Ok(())
}

pub fn print_help() {
    println!("workstate — weekly work item state snapshots\n");
    println!("USAGE:");
    println!("  workstate [report]   Summarize states for every anchor weekday since a date");
    println!("  workstate current    Summarize states as they are now");
    println!("  workstate dump <path>  Write the raw fetched work items to a JSON file");
    println!();
    println!("OPTIONS:");
    println!("  -w, --weekday <day>  Anchor weekday for report, 0-6 (0 = Sunday) or a name [default: 5]");
    println!("  -s, --since <date>   Earliest report date, YYYY-MM-DD [default: 2022-07-01]");
    println!("  -t, --type <type>    Work item type to query [default: Hybrid Story]");
    println!("      --as-of <date>   Snapshot date (dump only)");
    println!("      --json           Print JSON instead of tables (report, current)");
    println!("      --keep-going     Report the dates that succeeded when others fail (report only)");
    println!("  -v, --verbose        More logging (repeat for more)");
    println!();
    println!("Configuration is read from ~/.workstate/config.toml.");
}
