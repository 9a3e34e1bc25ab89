//! Subscribe to dashboard notifications and print them.
//!
//! Demonstrates:
//! - Building a channel from a page origin
//! - Registering a listener and filtering by message kind
//! - Sending an envelope once connected
//! - Disconnecting on Ctrl+C
//!
//! Usage:
//!   MEDIADASH_TOKEN=... cargo run --example listen -- http://localhost:8080
//!   MEDIADASH_TOKEN=... cargo run --example listen -- https://media.example.com srv-1 --debug
//!   MEDIADASH_TOKEN=... cargo run --example listen -- http://localhost:8080 --heartbeat

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use anyhow::Context;
use mediadash_notify::{Message, MessageKind, NotificationChannel};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Constants
// ============================================================================

const DEFAULT_ORIGIN: &str = "http://localhost:8080";
const TOKEN_VAR: &str = "MEDIADASH_TOKEN";

// ============================================================================
// Args
// ============================================================================

#[derive(Debug, Clone)]
struct Args {
    origin: String,
    server_id: Option<String>,
    debug: bool,
    heartbeat: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut positional = args.iter().filter(|a| !a.starts_with("--"));

        Self {
            origin: positional
                .next()
                .cloned()
                .unwrap_or_else(|| DEFAULT_ORIGIN.to_string()),
            server_id: positional.next().cloned(),
            debug: args.iter().any(|a| a == "--debug"),
            heartbeat: args.iter().any(|a| a == "--heartbeat"),
        }
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Dashboard notifications ===\n");

    let token = std::env::var(TOKEN_VAR).with_context(|| format!("{TOKEN_VAR} is not set"))?;

    let mut builder = NotificationChannel::builder().origin(&args.origin);
    if args.heartbeat {
        builder = builder.heartbeat_interval(Duration::from_secs(30));
    }
    let channel = builder.build().context("invalid channel configuration")?;

    println!("[1] Origin: {}", args.origin);
    println!("    Scope:  {}", args.server_id.as_deref().unwrap_or("(all servers)"));

    let subscription = channel.on_message(print_message);

    channel.connect(&token, args.server_id.as_deref());
    println!("[2] Connecting... (Ctrl+C to exit)\n");

    let mut announced = false;
    let mut poll = tokio::time::interval(Duration::from_millis(500));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                match (channel.is_connected(), announced) {
                    (true, false) => {
                        announced = true;
                        println!("    ✓ Connected");
                        channel.send(&Message::new("subscribe", json!({ "client": "listen" })));
                    }
                    (false, true) => {
                        announced = false;
                        println!("    ✗ Connection lost ({})", channel.phase());
                    }
                    _ => {}
                }
            }
        }
    }

    subscription.unsubscribe();
    channel.disconnect();
    println!("\n[3] Disconnected");

    Ok(())
}

// ============================================================================
// Functions
// ============================================================================

fn print_message(message: &Message) {
    let scope = message.server_id().unwrap_or("-");

    match message.kind() {
        MessageKind::Ping | MessageKind::Pong => {}
        MessageKind::Unknown => {
            println!("    [{}] {} ({scope}): {}", message.timestamp(), message.message_type(), message.data());
        }
        kind => {
            println!("    [{}] {kind} ({scope}): {}", message.timestamp(), message.data());
        }
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        "mediadash_notify=debug"
    } else {
        "mediadash_notify=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}
