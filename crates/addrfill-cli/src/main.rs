use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use addrfill_core::{AddressForm, AppConfig, Candidate, Coordinate, LocationHint};
use addrfill_core::error::ExitCode;
use addrfill_geocode::{Geocoder, NominatimClient, provider_from_config, resolve_location_hint};
use addrfill_tui::app::App;

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "addrfill",
    about = "Street address autocomplete backed by OpenStreetMap Nominatim",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Output in JSON format (for scripts).
    /// Also enabled by setting ADDRFILL_JSON=1.
    #[arg(long, global = true)]
    json: bool,

    /// Read config from this file instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive address form (the default).
    Tui {
        /// Bias suggestions around LAT,LON instead of the configured source.
        #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinate, allow_hyphen_values = true)]
        near: Option<Coordinate>,
    },

    /// Look up an address and print the suggestions.
    Search {
        query: String,
        #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinate, allow_hyphen_values = true)]
        near: Option<Coordinate>,
        /// Send the query without a location bias.
        #[arg(long, conflicts_with = "near")]
        no_bias: bool,
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Look up an address and print the form fields a selection would fill.
    Fill {
        query: String,
        /// Which suggestion to pick (0-based).
        #[arg(long, default_value = "0")]
        index: usize,
        #[arg(long, value_name = "LAT,LON", value_parser = parse_coordinate, allow_hyphen_values = true)]
        near: Option<Coordinate>,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

// ─── Config Actions ──────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the config file location.
    Path,
    /// Show all config values.
    List,
}

fn parse_coordinate(s: &str) -> std::result::Result<Coordinate, String> {
    Coordinate::parse(s).map_err(|e| e.to_string())
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    // ── Env var overrides ──────────────────────────────────────────────────
    let json_output = cli.json || std::env::var("ADDRFILL_JSON").as_deref() == Ok("1");

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let mut config = AppConfig::load_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    let interactive = matches!(cli.command, None | Some(Commands::Tui { .. }));
    init_logging(interactive)?;

    let runtime = tokio::runtime::Runtime::new()?;

    match cli.command {
        None => run_interactive(&config, None, &runtime)?,
        Some(Commands::Tui { near }) => run_interactive(&config, near, &runtime)?,

        // ── Search ─────────────────────────────────────────────────────────
        Some(Commands::Search {
            query,
            near,
            no_bias,
            limit,
        }) => {
            if let Some(limit) = limit {
                config.geocoder.limit = limit;
                config.validate()?;
            }
            let query = require_query(&config, &query, json_output, start)?;
            let hint = if no_bias {
                None
            } else {
                Some(runtime.block_on(location_hint(&config, near))?)
            };
            let candidates = match runtime.block_on(lookup(&config, &query, hint)) {
                Ok(candidates) => candidates,
                Err(e) => network_failure(json_output, &e, start)?,
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": {
                        "items": candidates,
                        "total": candidates.len(),
                        "query": query,
                        "hint": hint,
                    },
                    "meta": { "duration_ms": dur }
                }))?;
            } else if candidates.is_empty() {
                println!("No results for: {query}");
            } else {
                for (i, candidate) in candidates.iter().enumerate() {
                    match candidate.position {
                        Some(position) => println!("{i:>2}  {}  ({position})", candidate.label),
                        None => println!("{i:>2}  {}", candidate.label),
                    }
                }
            }
        }

        // ── Fill ───────────────────────────────────────────────────────────
        Some(Commands::Fill { query, index, near }) => {
            let query = require_query(&config, &query, json_output, start)?;
            let hint = runtime.block_on(location_hint(&config, near))?;
            let candidates = match runtime.block_on(lookup(&config, &query, Some(hint))) {
                Ok(candidates) => candidates,
                Err(e) => network_failure(json_output, &e, start)?,
            };
            let dur = start.elapsed().as_millis();

            let Some(candidate) = candidates.get(index) else {
                if json_output {
                    print_json(&serde_json::json!({
                        "status": "error",
                        "error": "not_found",
                        "message": format!("no suggestion at index {index} ({} found)", candidates.len()),
                        "meta": { "duration_ms": dur }
                    }))?;
                } else {
                    eprintln!("No suggestion at index {index} ({} found)", candidates.len());
                }
                std::process::exit(ExitCode::NotFound as i32);
            };

            let pairs = fill_form(candidate).to_pairs();
            if json_output {
                let fields: BTreeMap<_, _> = pairs.into_iter().collect();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "label": candidate.label, "fields": fields },
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("# {}", candidate.label);
                print_pairs(&pairs);
            }
        }

        // ── Config ─────────────────────────────────────────────────────────
        Some(Commands::Config { action }) => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::Path => {
                    if json_output {
                        print_json(&serde_json::json!({
                            "status": "ok",
                            "data": { "path": config_path, "exists": config_path.exists() },
                            "meta": { "duration_ms": dur }
                        }))?;
                    } else {
                        println!("{}", config_path.display());
                    }
                }
                ConfigAction::List => {
                    let kv = config_key_values(&config);
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":kv,"meta":{"duration_ms":dur}}))?;
                    } else {
                        for (k, v) in &kv {
                            println!("{k} = {v}");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn run_interactive(
    config: &AppConfig,
    near: Option<Coordinate>,
    runtime: &tokio::runtime::Runtime,
) -> Result<()> {
    let geocoder = NominatimClient::from_config(&config.geocoder, config.location.bias_degrees)?;
    let provider = provider_from_config(&config.location, near, &config.geocoder.user_agent)?;
    let fallback = config.location.fallback_coordinate()?;

    let mut app = App::new(config, Arc::new(geocoder), runtime.handle().clone());
    app.start_geolocation(provider, fallback);
    addrfill_tui::run_tui(&mut app)?;

    if app.widget.form().is_revealed() {
        print_pairs(&app.widget.form().to_pairs());
    }
    Ok(())
}

/// Trimmed `query`, or `None` when it is below the autocomplete minimum.
fn lookup_query(query: &str, min_query_chars: usize) -> Option<&str> {
    let query = query.trim();
    (query.chars().count() >= min_query_chars).then_some(query)
}

fn require_query(
    config: &AppConfig,
    query: &str,
    json_output: bool,
    start: Instant,
) -> Result<String> {
    let min = config.autocomplete.min_query_chars;
    if let Some(query) = lookup_query(query, min) {
        return Ok(query.to_string());
    }
    let message = format!("query must have at least {min} characters");
    if json_output {
        print_json(&serde_json::json!({
            "status": "error",
            "error": "invalid_args",
            "message": message,
            "meta": { "duration_ms": start.elapsed().as_millis() }
        }))?;
    } else {
        eprintln!("{message}");
    }
    std::process::exit(ExitCode::InvalidArgs as i32);
}

async fn location_hint(config: &AppConfig, near: Option<Coordinate>) -> Result<LocationHint> {
    let provider = provider_from_config(&config.location, near, &config.geocoder.user_agent)?;
    let fallback = config.location.fallback_coordinate()?;
    Ok(resolve_location_hint(provider.as_ref(), fallback).await)
}

async fn lookup(
    config: &AppConfig,
    query: &str,
    hint: Option<LocationHint>,
) -> addrfill_geocode::Result<Vec<Candidate>> {
    let client = NominatimClient::from_config(&config.geocoder, config.location.bias_degrees)?;
    client.search(query, hint).await
}

/// The fields a Selection Commit of `candidate` would leave in the form.
fn fill_form(candidate: &Candidate) -> AddressForm {
    let mut form = AddressForm::new();
    form.reveal();
    form.fill(&candidate.address);
    form
}

fn network_failure<T>(
    json_output: bool,
    error: &addrfill_geocode::GeocodeError,
    start: Instant,
) -> Result<T> {
    let dur = start.elapsed().as_millis();
    if json_output {
        print_json(&serde_json::json!({
            "status": "error",
            "error": "network",
            "message": error.to_string(),
            "meta": { "duration_ms": dur }
        }))?;
    } else {
        eprintln!("Lookup failed: {error}");
    }
    std::process::exit(ExitCode::NetworkError as i32);
}

fn init_logging(interactive: bool) -> Result<()> {
    let filter = EnvFilter::try_from_env("ADDRFILL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));

    // The TUI owns the terminal, so logs go to a file there.
    if interactive {
        let log_path = AppConfig::log_path();
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&log_path)?;
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter),
            )
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_filter(filter),
            )
            .try_init();
    }
    Ok(())
}

fn print_pairs(pairs: &[(&'static str, String)]) {
    for (id, value) in pairs {
        println!("{id}={value}");
    }
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn config_key_values(config: &AppConfig) -> BTreeMap<&'static str, String> {
    let mut map = BTreeMap::new();
    let position = |p: Option<[f64; 2]>| {
        p.map(|[lat, lon]| format!("{lat},{lon}")).unwrap_or_default()
    };

    map.insert("geocoder.base_url", config.geocoder.base_url.clone());
    map.insert("geocoder.country_codes", config.geocoder.country_codes.clone());
    map.insert("geocoder.language", config.geocoder.language.clone());
    map.insert("geocoder.limit", config.geocoder.limit.to_string());
    map.insert("geocoder.user_agent", config.geocoder.user_agent.clone());
    map.insert("geocoder.min_interval_ms", config.geocoder.min_interval_ms.to_string());
    map.insert("geocoder.timeout_secs", config.geocoder.timeout_secs.to_string());
    map.insert("autocomplete.min_query_chars", config.autocomplete.min_query_chars.to_string());
    map.insert("autocomplete.debounce_ms", config.autocomplete.debounce_ms.to_string());
    map.insert("autocomplete.blur_grace_ms", config.autocomplete.blur_grace_ms.to_string());
    map.insert("location.mode", format!("{:?}", config.location.mode).to_lowercase());
    map.insert("location.position", position(config.location.position));
    map.insert("location.fallback", position(Some(config.location.fallback)));
    map.insert("location.bias_degrees", config.location.bias_degrees.to_string());
    map.insert("location.ip_endpoint", config.location.ip_endpoint.clone());
    map
}
