//! REPL – Read-Eval-Print Loop for the interactive HMI shell.
//!
//! Supported slash-commands:
//!   /help             – show this list
//!   /settings         – interactively edit `~/.hmi/config.toml`
//!   /namespace [ns]   – show or change the robot namespace
//!   /press <1-4>      – press an HMI face button
//!   /base <1|2|power> – press a Create3 base button
//!   /led <name> <0|1> – drive a simulated LED (sim mode only)
//!   /display          – print the current display contents
//!   /status           – show bound topics and subscriber counts
//!   /quit | /exit     – gracefully exit the CLI

use colored::Colorize;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use hmi_bus::MessageBus;
use hmi_panel::HmiPanel;
use hmi_sim::SimRobot;
use hmi_types::{Led, create3_button};

use crate::config::{self, Config};

/// Everything a REPL command may need to touch.
pub struct ReplContext {
    /// Handle onto the runtime the panel's subscriber tasks live on.
    /// Namespace changes spawn tasks and must run inside it.
    pub runtime: tokio::runtime::Handle,
    pub bus: MessageBus,
    pub panel: Arc<HmiPanel>,
    /// Present only when the simulated robot was booted.
    pub robot: Option<Arc<SimRobot>>,
}

/// Entry point for the interactive REPL.
///
/// `shutdown` is polled each iteration; when set the REPL exits cleanly.
pub fn run(shutdown: Arc<AtomicBool>, ctx: ReplContext) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "hmi>".bold().cyan());
        stdout.flush().ok();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break, // EOF
            Ok(_) => {}
            Err(e) => {
                eprintln!("{}: {}", "Read error".red(), e);
                break;
            }
        }

        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else { continue };
        let args: Vec<&str> = parts.collect();

        match cmd {
            "/help" => cmd_help(),
            "/settings" => cmd_settings(),
            "/namespace" => cmd_namespace(&ctx, &args),
            "/press" => cmd_press(&ctx, &args),
            "/base" => cmd_base(&ctx, &args),
            "/led" => cmd_led(&ctx, &args),
            "/display" => cmd_display(&ctx),
            "/status" => cmd_status(&ctx),
            "/quit" | "/exit" => {
                println!("{}", "Goodbye.".green());
                shutdown.store(true, Ordering::SeqCst);
                break;
            }
            other => {
                println!(
                    "{} '{}'. Type {} for available commands.",
                    "Unknown command:".red(),
                    other.yellow(),
                    "/help".bold()
                );
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Command handlers
// ─────────────────────────────────────────────────────────────────────────────

fn cmd_help() {
    println!();
    println!("{}", "HMI Commands".bold().underline());
    println!("  {}          – edit ~/.hmi/config.toml settings", "/settings".bold().cyan());
    println!("  {}    – show or change the robot namespace", "/namespace [ns]".bold().cyan());
    println!("  {}       – press an HMI face button", "/press <1-4>".bold().cyan());
    println!("  {}  – press a Create3 base button", "/base <1|2|power>".bold().cyan());
    println!("  {}  – drive a simulated LED", "/led <name> <0|1>".bold().cyan());
    println!("  {}           – print the current display", "/display".bold().cyan());
    println!("  {}            – bound topics and subscribers", "/status".bold().cyan());
    println!("  {}       – exit the CLI", "/quit  /exit".bold().cyan());
    println!();
}

fn cmd_settings() {
    let mut cfg = match config::load() {
        Ok(Some(c)) => c,
        Ok(None) => Config::default(),
        Err(e) => {
            println!("{}: {}", "Error loading config".red(), e);
            return;
        }
    };

    println!("{}", "Settings Editor".bold().underline());
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
            "  {} Saved to {}. Port changes apply on next launch.",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }
}

fn cmd_namespace(ctx: &ReplContext, args: &[&str]) {
    match args.first() {
        None => println!("  namespace: {}", ctx.panel.namespace().bold()),
        Some(ns) => {
            // set_namespace spawns subscriber tasks; enter the runtime.
            let _guard = ctx.runtime.enter();
            ctx.panel.set_namespace(ns);
            println!(
                "  {} topics rebound to namespace {}",
                "✓".green(),
                ns.bold()
            );
        }
    }
}

fn cmd_press(ctx: &ReplContext, args: &[&str]) {
    match args.first().and_then(|a| a.parse::<i32>().ok()) {
        Some(code @ 1..=4) => {
            ctx.panel.press_hmi_button(code);
            println!("  {} HMI button {} pressed", "✓".green(), code);
        }
        _ => println!("{}", "Usage: /press <1-4>".yellow()),
    }
}

fn cmd_base(ctx: &ReplContext, args: &[&str]) {
    let code = match args.first() {
        Some(&"1") => Some(create3_button::BUTTON_1),
        Some(&"2") => Some(create3_button::BUTTON_2),
        Some(&"power") => Some(create3_button::POWER),
        _ => None,
    };
    match code {
        Some(code) => {
            ctx.panel.press_create3_button(code);
            println!("  {} Create3 button {} pressed", "✓".green(), code);
        }
        None => println!("{}", "Usage: /base <1|2|power>".yellow()),
    }
}

fn cmd_led(ctx: &ReplContext, args: &[&str]) {
    let Some(robot) = &ctx.robot else {
        println!("{}", "Simulated robot is disabled; /led has no target.".yellow());
        return;
    };
    let led = args.first().and_then(|name| Led::from_topic_name(name));
    let state = args.get(1).and_then(|s| s.parse::<i32>().ok());
    match (led, state) {
        (Some(led), Some(state)) => {
            robot.set_led(led, state);
            println!("  {} {} := {}", "✓".green(), led.topic_name(), state);
        }
        _ => println!(
            "{}",
            "Usage: /led <power|motors|comms|wifi|battery|user1|user2> <0|1>".yellow()
        ),
    }
}

fn cmd_display(ctx: &ReplContext) {
    let text = ctx.panel.display_text();
    if text.is_empty() {
        println!("  {}", "(display is empty)".dimmed());
        return;
    }
    println!("  ┌───────────────────────┐");
    for line in text.lines() {
        println!("  │{:<23}│", line);
    }
    println!("  └───────────────────────┘");
}

fn cmd_status(ctx: &ReplContext) {
    println!("  namespace : {}", ctx.panel.namespace().bold());
    let mut topics = ctx.bus.topics();
    topics.sort();
    for topic in topics {
        println!(
            "  {:<45} {} subscriber(s)",
            topic,
            ctx.bus.subscriber_count(&topic)
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    print!("{}", msg);
    io::stdout().flush().ok();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => {
            let t = line.trim().to_string();
            if t.is_empty() { default.to_string() } else { t }
        }
        Err(_) => default.to_string(),
    }
}
