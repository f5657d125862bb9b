//! `geoanchor` – GeoAnchor Command Line Interface
//!
//! This binary drives a simulated anchoring session from the terminal. It:
//!
//! 1. Checks for `~/.geoanchor/config.toml`; runs a **First-Run Wizard** when
//!    the file is absent.
//! 2. Starts a session over simulated location, compass and tracking drivers
//!    with the configured landmark registry.
//! 3. Drops the user into an **interactive REPL** with slash-commands
//!    (`/fix`, `/heading`, `/track`, `/placements`, `/help`, …).
//! 4. Intercepts **Ctrl-C** to cancel every sensor subscription and exit.

mod config;
mod render;
mod repl;

use colored::Colorize;
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

fn main() {
    // Keep the guard alive so buffered spans are flushed on exit.
    let _telemetry = geoanchor_runtime::init_tracing("geoanchor-cli");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    // While the line editor owns the terminal it reports Ctrl-C itself; this
    // handler covers the rest of the process lifetime.
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – tearing the session down …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── First-Run Wizard ──────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(None) => run_first_run_wizard(),
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    };

    println!(
        "  {} landmark(s), compass sample rate {}°, marker size {} m",
        cfg.landmarks.len().to_string().bold(),
        cfg.compass_sample_rate_degrees,
        cfg.marker_size_m
    );
    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    if let Err(e) = repl::run(&cfg, shutdown) {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║      GeoAnchor First-Run Wizard      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up GeoAnchor.\n");

    let mut cfg = config::Config::default();

    let rate = prompt_line(
        &format!("  Compass sample rate in degrees [{}]: ", cfg.compass_sample_rate_degrees),
        &cfg.compass_sample_rate_degrees.to_string(),
    );
    if let Ok(r) = rate.trim().parse::<f64>()
        && r.is_finite()
        && r >= 0.0
    {
        cfg.compass_sample_rate_degrees = r;
    }

    let size = prompt_line(
        &format!("  Marker size in meters [{}]: ", cfg.marker_size_m),
        &cfg.marker_size_m.to_string(),
    );
    if let Ok(s) = size.trim().parse::<f64>()
        && s.is_finite()
        && s > 0.0
    {
        cfg.marker_size_m = s;
    }

    println!(
        "  Using the {} default Leeds landmarks; edit the config file to add your own.",
        cfg.landmarks.len()
    );

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    config::apply_env_overrides(&mut cfg);
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ______           ___                __          "#.bold().cyan());
    println!("{}", r#"  / ____/__  ____  /   |  ____  _____/ /_  ____  _____"#.bold().cyan());
    println!("{}", r#" / / __/ _ \/ __ \/ /| | / __ \/ ___/ __ \/ __ \/ ___/"#.bold().cyan());
    println!("{}", r#"/ /_/ /  __/ /_/ / ___ |/ / / / /__/ / / / /_/ / /    "#.bold().cyan());
    println!("{}", r#"\____/\___/\____/_/  |_/_/ /_/\___/_/ /_/\____/_/     "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "GeoAnchor".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Geospatial landmark anchoring for AR scenes");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
