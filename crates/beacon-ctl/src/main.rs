//! beacon-ctl — command-line interface for the Beacon daemon.

use anyhow::{Context, Result};

mod cmd;

const DEFAULT_PORT: u16 = 8787;

fn print_usage() {
    println!("Usage: beacon-ctl [--port N] <command>");
    println!();
    println!("Commands:");
    println!("  health                                    Daemon and store health");
    println!("  metrics                                   Prometheus metrics");
    println!("  peers <manifest> [chunk...]               Ranked peers for a manifest");
    println!("  announce <client> <manifest> <bitfield>   Announce held chunks (hex bitfield)");
    println!("  signal <from> <to> <type> <payload-json>  Queue a handshake message");
    println!("  poll <client>                             Drain pending signals");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        if args[i] == "--port" {
            i += 1;
            port = args
                .get(i)
                .context("--port requires a value")?
                .parse()
                .context("--port must be a number")?;
        } else {
            remaining.push(&args[i]);
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["health"] | [] => cmd::status::cmd_health(port).await,
        ["metrics"] => cmd::status::cmd_metrics(port).await,
        ["peers", manifest, needed @ ..] => cmd::peers::cmd_peers(port, manifest, needed).await,
        ["announce", client, manifest, bitfield] => {
            cmd::peers::cmd_announce(port, client, manifest, bitfield).await
        }
        ["signal", from, to, kind, payload] => {
            cmd::signals::cmd_signal(port, from, to, kind, payload).await
        }
        ["poll", client] => cmd::signals::cmd_poll(port, client).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
