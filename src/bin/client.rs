use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::*;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "axon-client")]
#[command(about = "Echo round-trip checker for the Axon server", long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(long, default_value = "127.0.0.1:1234")]
    server: String,

    /// Payload to send on each round
    #[arg(long, default_value = "hello")]
    message: String,

    /// Number of echo rounds to run
    #[arg(long, default_value_t = 1)]
    repeat: usize,

    /// Socket read timeout in milliseconds
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{} {:#}", "✗".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let mut stream = TcpStream::connect(&args.server)
        .with_context(|| format!("Failed to connect to {}", args.server))?;
    stream
        .set_read_timeout(Some(Duration::from_millis(args.timeout_ms)))
        .context("Failed to set read timeout")?;

    println!("{}", "Axon echo check".bold());
    println!("Server: {}\n", args.server);

    let payload = args.message.as_bytes();
    let mut echoed = vec![0u8; payload.len()];

    for round in 0..args.repeat {
        let t1 = Instant::now();

        stream.write_all(payload).context("Failed to send payload")?;
        stream
            .read_exact(&mut echoed)
            .context("Failed to read echo")?;

        let elapsed = t1.elapsed();

        if echoed != payload {
            bail!("Round {}: echoed bytes differ from the payload sent", round + 1);
        }

        println!(
            "{} round {}: {} bytes echoed in {:?}",
            "✓".green().bold(),
            round + 1,
            payload.len(),
            elapsed
        );
    }

    Ok(())
}
