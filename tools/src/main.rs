//! vp-runner: headless driver for the events generator and the model applier.
//!
//! Usage:
//!   vp-runner generate  --output-dir out --total-events 1000 --seed 42
//!   vp-runner apply     --input out --output-dir applied
//!   vp-runner aggregate --input applied/output_events.json --output-dir report

use anyhow::{bail, Context, Result};
use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use vp_events_core::{
    aggregate_output, apply_labeler,
    export::{self, OUTPUT_EVENTS_FILENAME, OUTPUT_REPORT_FILENAME},
    store::RunStore,
    types::new_run_id,
    AggregatedReport, EventsGenerator, LabelerOutputList, ProfileLabeler, RunConfig,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const DEFAULT_VIRTUAL_PEOPLE: u64 = 10_000;

const GENERATE_FLAGS: &[&str] = &[
    "--output-dir",
    "--config",
    "--text",
    "--db",
    "--seed",
    "--current-timestamp",
    "--total-publishers",
    "--total-events",
    "--unknown-device-count",
    "--email-users-count",
    "--phone-users-count",
    "--proprietary-users-count",
    "--unknown-device-ratio",
    "--total-countries",
    "--regions-per-country",
    "--cities-per-region",
    "--email-events-ratio",
    "--phone-events-ratio",
    "--proprietary-events-ratio",
    "--profile-version-days",
];
const APPLY_FLAGS: &[&str] = &["--input", "--output-dir", "--virtual-people", "--db"];
const AGGREGATE_FLAGS: &[&str] = &["--input", "--output-dir", "--db"];

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        Some("generate") => run_generate(&args),
        Some("apply") => run_apply(&args),
        Some("aggregate") => run_aggregate(&args),
        other => bail!("unknown command {other:?}: expected generate | apply | aggregate"),
    }
}

fn run_generate(args: &[String]) -> Result<()> {
    check_flags(args, GENERATE_FLAGS)?;
    let output_dir = string_arg(args, "--output-dir").context("--output-dir is not set")?;
    let mut config = match string_arg(args, "--config") {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    apply_overrides(args, &mut config)?;
    config.validate()?;

    let text = parse_arg(args, "--text", true)?;
    let db = string_arg(args, "--db");
    if !text && db.is_none() {
        bail!("At least one of --text and --db is required");
    }

    let mut generator = EventsGenerator::new(&config.generator)?;
    let count = config.generator.total_events as usize;
    let events = generator.take_events(&config.event, count)?;

    let dir = Path::new(output_dir);
    export::ensure_dir(dir)?;
    if text {
        for (i, event) in events.iter().enumerate() {
            export::write_json_file(&export::event_file_path(dir, i + 1), event)?;
        }
    }

    let mut run_id = None;
    if let Some(db) = db {
        let mut store = open_store(db)?;
        let id = new_run_id();
        store.insert_run(&id, "generate", Some(generator.seed()), VERSION)?;
        store.insert_events(&id, &events)?;
        run_id = Some(id);
    }

    let with_profiles = events
        .iter()
        .filter(|e| !e.profile_info.is_empty())
        .count();
    println!("=== GENERATION SUMMARY ===");
    println!("  seed:           {}", generator.seed());
    println!("  now (ms):       {}", generator.clock().current_timestamp);
    println!("  events:         {}", events.len());
    println!("  with profiles:  {with_profiles}");
    println!("  output_dir:     {output_dir}");
    if let Some(id) = run_id {
        println!("  run_id:         {id}");
    }
    Ok(())
}

fn run_apply(args: &[String]) -> Result<()> {
    check_flags(args, APPLY_FLAGS)?;
    let input = string_arg(args, "--input").context("--input is not set")?;
    let output_dir = string_arg(args, "--output-dir").context("--output-dir is not set")?;
    let virtual_people = parse_arg(args, "--virtual-people", DEFAULT_VIRTUAL_PEOPLE)?;

    let inputs = export::read_events(Path::new(input))?;
    log::info!("read {} events from {input}", inputs.len());

    let labeler = ProfileLabeler::new(virtual_people)?;
    let outputs = apply_labeler(&labeler, &inputs)?;
    let report = aggregate_output(&outputs.outputs);

    let dir = Path::new(output_dir);
    export::ensure_dir(dir)?;
    export::write_json_file(&dir.join(OUTPUT_EVENTS_FILENAME), &outputs)?;
    export::write_json_file(&dir.join(OUTPUT_REPORT_FILENAME), &report)?;
    store_report(args, "apply", &report)?;
    print_report(&report);
    Ok(())
}

fn run_aggregate(args: &[String]) -> Result<()> {
    check_flags(args, AGGREGATE_FLAGS)?;
    let input = string_arg(args, "--input").context("--input is not set")?;
    let output_dir = string_arg(args, "--output-dir").context("--output-dir is not set")?;

    let outputs: LabelerOutputList = export::read_json_file(Path::new(input))?;
    let report = aggregate_output(&outputs.outputs);

    let dir = Path::new(output_dir);
    export::ensure_dir(dir)?;
    export::write_json_file(&dir.join(OUTPUT_REPORT_FILENAME), &report)?;
    store_report(args, "aggregate", &report)?;
    print_report(&report);
    Ok(())
}

fn apply_overrides(args: &[String], config: &mut RunConfig) -> Result<()> {
    let g = &mut config.generator;
    if let Some(seed) = opt_arg(args, "--seed")? {
        g.seed = Some(seed);
    }
    if let Some(ts) = opt_arg(args, "--current-timestamp")? {
        g.current_timestamp = Some(ts);
    }
    g.total_publishers = parse_arg(args, "--total-publishers", g.total_publishers)?;
    g.total_events = parse_arg(args, "--total-events", g.total_events)?;
    g.unknown_device_count = parse_arg(args, "--unknown-device-count", g.unknown_device_count)?;
    g.email_users_count = parse_arg(args, "--email-users-count", g.email_users_count)?;
    g.phone_users_count = parse_arg(args, "--phone-users-count", g.phone_users_count)?;
    g.proprietary_id_space_1_users_count = parse_arg(
        args,
        "--proprietary-users-count",
        g.proprietary_id_space_1_users_count,
    )?;

    let e = &mut config.event;
    e.unknown_device_ratio = parse_arg(args, "--unknown-device-ratio", e.unknown_device_ratio)?;
    e.geo.total_countries = parse_arg(args, "--total-countries", e.geo.total_countries)?;
    e.geo.regions_per_country =
        parse_arg(args, "--regions-per-country", e.geo.regions_per_country)?;
    e.geo.cities_per_region = parse_arg(args, "--cities-per-region", e.geo.cities_per_region)?;
    e.email_events_ratio = parse_arg(args, "--email-events-ratio", e.email_events_ratio)?;
    e.phone_events_ratio = parse_arg(args, "--phone-events-ratio", e.phone_events_ratio)?;
    e.proprietary_id_space_1_events_ratio = parse_arg(
        args,
        "--proprietary-events-ratio",
        e.proprietary_id_space_1_events_ratio,
    )?;
    e.profile_version_days = parse_arg(args, "--profile-version-days", e.profile_version_days)?;
    Ok(())
}

fn store_report(args: &[String], kind: &str, report: &AggregatedReport) -> Result<()> {
    if let Some(db) = string_arg(args, "--db") {
        let mut store = open_store(db)?;
        let run_id = new_run_id();
        store.insert_run(&run_id, kind, None, VERSION)?;
        store.insert_report(&run_id, report)?;
        println!("  stored report as {run_id} in {db}");
    }
    Ok(())
}

fn open_store(path: &str) -> Result<RunStore> {
    let store = RunStore::open(path).with_context(|| format!("Cannot open database {path}"))?;
    store.migrate()?;
    Ok(store)
}

fn print_report(report: &AggregatedReport) {
    println!("=== REPORT ===");
    if let Some(total) = report.total() {
        println!(
            "  total:          impressions={} reach={}",
            total.impressions, total.reach
        );
    }
    println!("  label rows:     {}", report.label_rows().len());
}

/// Every argument after the subcommand must be a `known` flag followed by
/// a value. Each flag may appear once.
fn check_flags(args: &[String], known: &[&str]) -> Result<()> {
    let mut seen: Vec<&str> = Vec::new();
    let mut rest = args.iter().skip(2);
    while let Some(flag) = rest.next() {
        if !flag.starts_with("--") {
            bail!("Unexpected argument {flag:?}: expected a --flag");
        }
        if !known.contains(&flag.as_str()) {
            bail!("Unknown flag {flag} for {}", args[1]);
        }
        if seen.contains(&flag.as_str()) {
            bail!("{flag} given more than once");
        }
        seen.push(flag.as_str());
        match rest.next() {
            Some(value) if !value.starts_with("--") => {}
            _ => bail!("{flag} requires a value"),
        }
    }
    Ok(())
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn opt_arg<T>(args: &[String], flag: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match string_arg(args, flag) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid value {raw:?} for {flag}: {e}")),
        None if args.last().map(String::as_str) == Some(flag) => {
            bail!("{flag} requires a value")
        }
        None => Ok(None),
    }
}

fn parse_arg<T>(args: &[String], flag: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    Ok(opt_arg(args, flag)?.unwrap_or(default))
}
