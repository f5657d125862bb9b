//! REPL – Read-Eval-Print Loop driving a simulated anchoring session.
//!
//! Supported slash-commands:
//!   /fix <lat> <lon>            – deliver a location fix
//!   /fail                       – deliver a failed location fix
//!   /heading <deg> [accuracy]   – offer a compass sample
//!   /track <normal|limited|unavailable> – deliver a tracking update
//!   /state                      – show location, live and reference heading
//!   /placements                 – show the current marker set
//!   /landmarks                  – list the landmark registry
//!   /offset <lat> <lon> <lat> <lon> – one-off observer → target offset
//!   /help                       – show this list
//!   /quit | /exit               – tear the session down and exit

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use geoanchor_hal::sim::{SimCompass, SimHandles, SimLocationProvider, SimRegistry, SimTracking};
use geoanchor_perception::compute_offset;
use geoanchor_runtime::AnchorSession;
use geoanchor_types::{GeoCoordinate, GeoError, TrackingReason, TrackingState};

use crate::config::Config;
use crate::render::{ConsoleRenderer, format_placements};

/// Accuracy reported for `/heading` when none is given.
const DEFAULT_ACCURACY_DEGREES: f64 = 5.0;

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Fix(GeoCoordinate),
    Fail,
    Heading { degrees: f64, accuracy: f64 },
    Track(TrackingState),
    State,
    Placements,
    Landmarks,
    Offset {
        observer: GeoCoordinate,
        target: GeoCoordinate,
    },
    Help,
    Quit,
}

/// Parse one input line. Errors are user-facing messages.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".to_string());
    };
    let args: Vec<&str> = parts.collect();

    match head {
        "/fix" => {
            let [lat, lon] = numbers::<2>(&args, "/fix <lat> <lon>")?;
            Ok(Command::Fix(coordinate(lat, lon)?))
        }
        "/fail" => Ok(Command::Fail),
        "/heading" => match args.as_slice() {
            [deg] => Ok(Command::Heading {
                degrees: number(deg)?,
                accuracy: DEFAULT_ACCURACY_DEGREES,
            }),
            [deg, acc] => Ok(Command::Heading {
                degrees: number(deg)?,
                accuracy: number(acc)?,
            }),
            _ => Err("usage: /heading <deg> [accuracy]".to_string()),
        },
        "/track" => match args.as_slice() {
            ["normal"] => Ok(Command::Track(TrackingState::Normal)),
            ["limited"] => Ok(Command::Track(TrackingState::Limited)),
            ["unavailable"] => Ok(Command::Track(TrackingState::Unavailable)),
            _ => Err("usage: /track <normal|limited|unavailable>".to_string()),
        },
        "/state" => Ok(Command::State),
        "/placements" => Ok(Command::Placements),
        "/landmarks" => Ok(Command::Landmarks),
        "/offset" => {
            let [a, b, c, d] = numbers::<4>(&args, "/offset <lat> <lon> <lat> <lon>")?;
            Ok(Command::Offset {
                observer: coordinate(a, b)?,
                target: coordinate(c, d)?,
            })
        }
        "/help" => Ok(Command::Help),
        "/quit" | "/exit" => Ok(Command::Quit),
        other => Err(format!("unknown command '{other}'")),
    }
}

fn number(raw: &str) -> Result<f64, String> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{raw}' is not a number"))
}

fn numbers<const N: usize>(args: &[&str], usage: &str) -> Result<[f64; N], String> {
    if args.len() != N {
        return Err(format!("usage: {usage}"));
    }
    let mut out = [0.0; N];
    for (slot, raw) in out.iter_mut().zip(args) {
        *slot = number(raw)?;
    }
    Ok(out)
}

fn coordinate(latitude: f64, longitude: f64) -> Result<GeoCoordinate, String> {
    GeoCoordinate::new(latitude, longitude).map_err(|e: GeoError| e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Session wiring
// ─────────────────────────────────────────────────────────────────────────────

/// Build a session over simulated drivers with the console renderer attached.
pub fn build_session(cfg: &Config) -> Result<(AnchorSession, SimHandles), GeoError> {
    let landmarks = cfg.landmarks()?;
    let (mut registry, sim) = SimRegistry::new()
        .with_location(SimLocationProvider::new("sim_gps"))
        .with_compass(SimCompass::new("sim_compass"))
        .with_tracking(SimTracking::new("sim_tracking"))
        .build_with_handles();
    registry.register_renderer(Box::new(ConsoleRenderer::new(&landmarks, cfg.marker_size_m)));
    Ok((AnchorSession::new(cfg.session_config(), landmarks, registry), sim))
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL tears the session
/// down and returns.
pub fn run(cfg: &Config, shutdown: Arc<AtomicBool>) -> Result<(), String> {
    let (mut session, sim) = build_session(cfg).map_err(|e| format!("Invalid landmark registry: {e}"))?;

    let report = session.start();
    for err in &report.errors {
        println!("  {} {}", "⚠".yellow().bold(), err.to_string().yellow());
    }
    println!(
        "  Session {} – streams: {}",
        session.id().to_string().dimmed(),
        session.active_streams().join(", ").bold()
    );

    let mut editor = DefaultEditor::new().map_err(|e| format!("Failed to open line editor: {e}"))?;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let line = match editor.readline(&format!("{} ", "geoanchor>".bold().cyan())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(line);

        match parse_command(line) {
            Ok(Command::Quit) => {
                println!("{}", "Goodbye.".green());
                break;
            }
            Ok(cmd) => execute(&mut session, &sim, cmd),
            Err(msg) => println!(
                "{} {}. Type {} for available commands.",
                "Error:".red(),
                msg.yellow(),
                "/help".bold()
            ),
        }
    }

    session.shutdown();
    println!("  {}", "✓ Sensor subscriptions cancelled.".green());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn execute(session: &mut AnchorSession, sim: &SimHandles, cmd: Command) {
    match cmd {
        Command::Fix(coordinate) => {
            if !sim.location.push_fix(coordinate) {
                println!("  {}", "Location stream is not running.".yellow());
            }
        }
        Command::Fail => {
            if !sim.location.push_failure(2, "position unavailable") {
                println!("  {}", "Location stream is not running.".yellow());
            }
        }
        Command::Heading { degrees, accuracy } => {
            if !sim.compass.is_subscribed() {
                println!("  {}", "Compass stream is not running.".yellow());
            } else if !sim.compass.push_heading(degrees, accuracy) {
                println!(
                    "  {} (change smaller than {}°)",
                    "Sample filtered".dimmed(),
                    session.config().compass_sample_rate_degrees
                );
            }
        }
        Command::Track(state) => {
            if !sim.tracking.push_state(state, TrackingReason::None) {
                println!("  {}", "Tracking stream is not running.".yellow());
            }
        }
        Command::State => cmd_state(session),
        Command::Placements => cmd_placements(session),
        Command::Landmarks => cmd_landmarks(session),
        Command::Offset { observer, target } => cmd_offset(&observer, &target),
        Command::Help => cmd_help(),
        Command::Quit => {}
    }
    session.drain_pending();
}

fn cmd_help() {
    println!();
    println!("{}", "GeoAnchor Commands".bold().underline());
    println!("  {}        – deliver a location fix", "/fix <lat> <lon>".bold().cyan());
    println!("  {}                    – deliver a failed fix", "/fail".bold().cyan());
    println!("  {} – offer a compass sample", "/heading <deg> [acc]".bold().cyan());
    println!("  {}            – normal | limited | unavailable", "/track <state>".bold().cyan());
    println!("  {}                   – observer location and headings", "/state".bold().cyan());
    println!("  {}              – current marker set", "/placements".bold().cyan());
    println!("  {}               – landmark registry", "/landmarks".bold().cyan());
    println!("  {} – offset between two points", "/offset <a> <b> <c> <d>".bold().cyan());
    println!("  {}             – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_state(session: &AnchorSession) {
    let snap = session.state().snapshot();
    let location = snap
        .location
        .map(|c| format!("{:.6}, {:.6}", c.latitude, c.longitude))
        .unwrap_or_else(|| "none".to_string());
    let heading = snap
        .heading_degrees
        .map(|h| format!("{h:.1}°"))
        .unwrap_or_else(|| "none".to_string());
    let reference = match snap.reference_heading_degrees {
        Some(r) => format!("locked at {r:.1}°").green().to_string(),
        None => "uninitialized".yellow().to_string(),
    };
    println!("  Location  : {}", location.bold());
    println!("  Heading   : {}", heading.bold());
    println!("  Reference : {}", reference);
    println!("  Streams   : {}", session.active_streams().join(", "));
}

fn cmd_placements(session: &AnchorSession) {
    let placements = session.placements();
    if placements.is_empty() {
        println!(
            "  {}",
            "No placements (needs a location fix and a locked heading).".dimmed()
        );
        return;
    }
    let names = session.landmarks();
    for row in format_placements(placements, |id| {
        names
            .iter()
            .find(|l| l.id == id)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| id.to_string())
    }) {
        println!("{row}");
    }
}

fn cmd_landmarks(session: &AnchorSession) {
    for l in session.landmarks() {
        println!(
            "  {:<16} {:>10.4}, {:>10.4}   {}",
            l.name.bold(),
            l.coordinate.latitude,
            l.coordinate.longitude,
            l.id.dimmed()
        );
    }
}

fn cmd_offset(observer: &GeoCoordinate, target: &GeoCoordinate) {
    let offset = compute_offset(observer, target);
    println!(
        "  x = {} m (east), z = {} m (south)   |{:.0}| m",
        offset.x.to_string().bold(),
        offset.z.to_string().bold(),
        offset.magnitude()
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
