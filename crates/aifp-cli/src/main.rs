// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use aifp_core::{
    format_distance, write_airports_file, AifpConfig, AirportPairRoute, DistanceUnit, Flightplan,
    FlightplanPaths, LogSink, MasterAirportCache,
};
use aifp_taxonomy::{DecisionList, Taxonomy};
use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding Aircraft*.txt, Airports*.txt and Flightplans*.txt
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Aircraft file (overrides discovery)
    #[arg(long)]
    aircraft: Option<PathBuf>,

    /// Airports file (overrides discovery)
    #[arg(long)]
    airports: Option<PathBuf>,

    /// Flightplans file (overrides discovery)
    #[arg(long)]
    flightplans: Option<PathBuf>,

    /// Master airports file for codes missing locally
    #[arg(short, long, env = "AIFP_MASTER_AIRPORTS")]
    master: Option<PathBuf>,

    /// User taxonomy JSON, merged ahead of the built-in one
    #[arg(long)]
    taxonomy: Option<PathBuf>,

    /// Config file (defaults to aifp.json in the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ignore inactive (//#) liveries
    #[arg(long)]
    active_only: bool,

    /// More output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall counts for the flightplan
    Summary,
    /// Aircraft types with their counts, and unmatched titles
    Types,
    /// Airport-pair routes
    Routes {
        /// Only routes touching this airport
        #[arg(long)]
        airport: Option<String>,
        /// Only routes served by this ICAO type
        #[arg(long = "type")]
        type_code: Option<String>,
        /// km, mi or nm (defaults to the configured unit)
        #[arg(long)]
        unit: Option<DistanceUnit>,
    },
    /// Regenerate the airports file from the schedule
    Airports {
        /// Overwrite the airports file (a .bak copy is kept)
        #[arg(long)]
        write: bool,
    },
    /// Every problem found while loading
    Diagnostics,
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}

fn resolve_paths(cli: &Cli) -> Result<FlightplanPaths> {
    if let (Some(aircraft), Some(flightplans)) = (&cli.aircraft, &cli.flightplans) {
        return Ok(FlightplanPaths {
            aircraft: aircraft.clone(),
            airports: cli
                .airports
                .clone()
                .unwrap_or_else(|| cli.dir.join("Airports.txt")),
            flightplans: flightplans.clone(),
        });
    }

    let mut paths = FlightplanPaths::discover(&cli.dir)
        .with_context(|| format!("No flightplan found in {:?}", cli.dir))?;
    if let Some(p) = &cli.aircraft {
        paths.aircraft = p.clone();
    }
    if let Some(p) = &cli.airports {
        paths.airports = p.clone();
    }
    if let Some(p) = &cli.flightplans {
        paths.flightplans = p.clone();
    }
    Ok(paths)
}

fn print_route(route: &AirportPairRoute, unit: DistanceUnit) {
    let arrow = if route.bidirectional { "<->" } else { "->" };
    let types: Vec<&str> = route.aircraft_types.iter().map(String::as_str).collect();
    println!(
        "{:>4} {:^3} {:<4}  {:>5}x  {:>10}  {}",
        route.primary,
        arrow,
        route.secondary,
        route.merged_count,
        format_distance(route.distance_m(), unit),
        types.join(" ")
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config = AifpConfig::load(cli.config.as_deref());
    let mut options = config.load_options();
    if cli.active_only {
        options.include_inactive = false;
    }

    let taxonomy_path = cli.taxonomy.clone().or_else(|| config.user_taxonomy.clone());
    let taxonomy = Taxonomy::load_merged(taxonomy_path.as_deref())?;
    let decisions = DecisionList::compile(&taxonomy)?;

    let master_path = cli.master.clone().or_else(|| config.master_airports.clone());
    let cache_file = AifpConfig::master_cache_path();
    let mut master = master_path
        .as_deref()
        .map(|path| MasterAirportCache::load(&cache_file, path));

    let paths = resolve_paths(&cli)?;
    let loaded = Flightplan::load(&paths, &decisions, master.as_mut(), &options, &mut LogSink)
        .with_context(|| format!("Failed to load {:?}", paths.flightplans))?;
    let plan = &loaded.flightplan;

    match &cli.command {
        Commands::Summary => {
            let roster = plan.roster();
            let classification = plan.classification();
            println!("Flightplan: {:?}", paths.flightplans);
            println!("Aircraft scheduled: {}", plan.aircraft().len());
            println!(
                "Liveries: {} active, {} inactive ({} unscheduled)",
                roster.active.len(),
                roster.inactive.len(),
                plan.unscheduled_liveries().len()
            );
            println!(
                "Types: {} ({} liveries unmatched)",
                classification.types.len(),
                classification.non_matched.len()
            );
            println!(
                "Airports: {} ({} from master)",
                plan.airports().len(),
                plan.imported_airports().len()
            );
            println!(
                "Routes: {} airport pairs from {} directional legs",
                plan.routes().len(),
                plan.route_index().leg_count()
            );
            println!("Diagnostics: {}", loaded.diagnostics.len());
        }
        Commands::Types => {
            let classification = plan.classification();
            for t in classification.by_count() {
                println!(
                    "{:>5}  {:<5} {}  ({} liveries)",
                    t.total_count,
                    t.type_code,
                    t.display_name(),
                    t.liveries.len()
                );
            }
            if !classification.non_matched.is_empty() {
                println!();
                println!("Unmatched titles:");
                for title in &classification.non_matched {
                    println!("  {}", title);
                }
            }
        }
        Commands::Routes {
            airport,
            type_code,
            unit,
        } => {
            let unit = unit.unwrap_or(config.distance_unit);
            let mut routes: Vec<&AirportPairRoute> = match airport {
                Some(code) => plan.routes_for_airport(code),
                None => plan.routes().iter().collect(),
            };
            if let Some(code) = type_code {
                let code = code.to_uppercase();
                routes.retain(|r| r.aircraft_types.contains(&code));
            }
            routes.sort_by(|a, b| {
                b.merged_count
                    .cmp(&a.merged_count)
                    .then_with(|| a.primary.cmp(&b.primary))
                    .then_with(|| a.secondary.cmp(&b.secondary))
            });

            if routes.is_empty() {
                println!("No routes match.");
            }
            for route in routes {
                print_route(route, unit);
            }
        }
        Commands::Airports { write } => {
            let (content, diagnostics) = plan.regenerate_airports(master.as_mut());
            for diagnostic in diagnostics.iter() {
                eprintln!("{}", diagnostic);
            }
            if *write {
                write_airports_file(&paths.airports, &content)?;
                println!(
                    "Wrote {} airports to {:?}",
                    content.lines().count(),
                    paths.airports
                );
            } else {
                print!("{}", content);
            }
        }
        Commands::Diagnostics => {
            if loaded.diagnostics.is_empty() {
                println!("No problems found.");
            }
            for diagnostic in loaded.diagnostics.iter() {
                println!("{}", diagnostic);
            }
        }
    }

    if let Some(cache) = &master {
        if let Err(e) = cache.save(&cache_file) {
            log::warn!("[MasterCache] Could not persist cache: {:#}", e);
        }
    }

    Ok(())
}
