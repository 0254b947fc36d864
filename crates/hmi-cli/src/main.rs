//! `hmi-cli` – HMI Panel Command Line Interface
//!
//! This binary is the entry point for the HMI panel stack.  It:
//!
//! 1. Checks for `~/.hmi/config.toml`; runs a **First-Run Wizard** when
//!    the file is absent.
//! 2. Boots the message bus, the panel bridge, the simulated robot
//!    firmware (unless disabled), and the cockpit web UI.
//! 3. Drops the user into an **interactive REPL** with slash-commands
//!    (`/namespace`, `/press`, `/led`, `/display`, `/help`, …).
//! 4. Intercepts **Ctrl-C** to publish a final power-button press and
//!    exit cleanly.

mod config;
mod repl;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

use hmi_bus::{BusAdapter, MessageBus};
use hmi_cockpit::CockpitServer;
use hmi_panel::HmiPanel;
use hmi_sim::SimRobot;
use hmi_types::create3_button;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // Initialise tracing-subscriber using RUST_LOG (defaults to "info").
    // Set HMI_LOG_FORMAT=json to emit newline-delimited JSON logs suitable
    // for log aggregators.  User-facing output still uses println! for UX
    // consistency.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("HMI_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let mut cfg = match config::load() {
        Ok(Some(c)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            c
        }
        Ok(None) => run_first_run_wizard(),
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };
    config::apply_env_overrides(&mut cfg);

    // ── Runtime and core components ───────────────────────────────────────
    let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
    let bus = MessageBus::default();
    let panel = Arc::new(HmiPanel::new(bus.clone()));
    {
        // load_config spawns the nine subscriber tasks on this runtime.
        let _guard = runtime.enter();
        panel.load_config(Some(&cfg.namespace));
    }
    println!(
        "  Panel bound to namespace {}",
        panel.namespace().bold().green()
    );

    // ── Simulated robot firmware ──────────────────────────────────────────
    let robot = if cfg.sim_enabled {
        let robot = Arc::new(SimRobot::new(bus.clone(), &cfg.namespace));
        let runner = Arc::clone(&robot);
        runtime.spawn(async move {
            if let Err(e) = runner.run().await {
                warn!(adapter = runner.name(), "adapter stopped: {e}");
            }
        });
        robot.power_on();
        println!("  Simulated robot firmware {}", "online".green());
        Some(robot)
    } else {
        println!("  Simulated robot firmware {}", "disabled".yellow());
        None
    };

    // ── Cockpit web UI ────────────────────────────────────────────────────
    let cockpit = CockpitServer::new(Arc::clone(&panel)).with_port(cfg.cockpit_port);
    println!(
        "  Cockpit UI on {}",
        format!("http://localhost:{}", cockpit.port()).bold()
    );
    runtime.spawn(async move {
        if let Err(e) = cockpit.run().await {
            warn!(adapter = cockpit.name(), "adapter stopped: {e}");
        }
    });

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    let panel_ctrlc = Arc::clone(&panel);

    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – shutting down …".yellow().bold());

        // Tell the robot the operator hit the power button before we go.
        panel_ctrlc.press_create3_button(create3_button::POWER);

        println!("{}", "  ✓ Power-button press published.".green());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(
        shutdown,
        repl::ReplContext {
            runtime: runtime.handle().clone(),
            bus,
            panel,
            robot,
        },
    );
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║       HMI Panel First-Run Setup      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up the panel.\n");

    let mut cfg = config::Config::default();

    let ns = prompt_line(
        &format!("  Robot namespace [{}]: ", cfg.namespace),
        &cfg.namespace,
    );
    cfg.namespace = ns.trim().to_string();

    let port_str = prompt_line(
        &format!("  Cockpit HTTP port [{}]: ", cfg.cockpit_port),
        &cfg.cockpit_port.to_string(),
    );
    if let Ok(p) = port_str.trim().parse::<u16>() {
        cfg.cockpit_port = p;
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   __ ____  ______"#.bold().cyan());
    println!("{}", r#"  / // /  |/  /  _/"#.bold().cyan());
    println!("{}", r#" / _  / /|_/ // /  "#.bold().cyan());
    println!("{}", r#"/_//_/_/  /_/___/  "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "HMI Panel".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Robot HMI bridge, simulator, and cockpit");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
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
