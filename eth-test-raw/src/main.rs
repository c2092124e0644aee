//! Entry point for `eth-test-raw`.
//!
//! Parses CLI arguments and dispatches into either **client** or **server**
//! mode.  All protocol work is delegated to library modules; `main.rs` owns
//! only process setup (logging, signal handling, argument parsing, opening
//! the raw socket).

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use eth_test_raw::config::{parse_micros, parse_seconds, ErrorThreshold, SessionConfig};
use eth_test_raw::MacAddr;

/// Simple test tool for Ethernet interfaces.
///
/// Tests an Ethernet NIC against a NIC on a peer machine, which must run
/// this tool in server mode.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Be verbose (log every error and retry).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Send frames to a peer and check the echoes.
    Client {
        /// Name of the local interface (e.g. eth0).
        ifname: String,
        /// Peer's MAC address (e.g. 00:11:22:33:44:55).
        peer: MacAddr,
        /// Runtime in seconds (default: run until interrupted).
        #[arg(short, long, value_parser = parse_seconds)]
        runtime: Option<Duration>,
        /// Delay in microseconds between pings.
        #[arg(short, long, value_parser = parse_micros)]
        delay: Option<Duration>,
        /// Seconds to wait for the peer's reply.
        #[arg(short, long, value_parser = parse_seconds, default_value = "0.1")]
        timeout: Duration,
        /// Stop after N errors, -1 to never stop.
        #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
        error_threshold: ErrorThreshold,
        /// Stop after N retries.
        #[arg(long, default_value_t = 50)]
        max_retries: u64,
        /// Print statistics every N seconds.
        #[arg(short, long, value_parser = parse_seconds, default_value = "0.5")]
        interval: Duration,
    },
    /// Echo every test frame back to its sender.
    Server {
        /// Name of the local interface (e.g. eth0).
        ifname: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG overrides; --verbose raises the default to debug.
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.mode {
        Mode::Client {
            ifname,
            peer,
            runtime,
            delay,
            timeout,
            error_threshold,
            max_retries,
            interval,
        } => {
            let config = SessionConfig {
                runtime,
                delay,
                reply_timeout: timeout,
                error_threshold,
                max_retries,
                interval,
                ..SessionConfig::default()
            };
            run_client(&ifname, peer, config).await
        }
        Mode::Server { ifname } => run_server(&ifname).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Raise `stop` on the first Ctrl-C.
fn stop_on_ctrl_c(stop: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            stop.store(true, Ordering::Relaxed);
        }
    });
}

#[cfg(target_os = "linux")]
async fn run_client(ifname: &str, peer: MacAddr, config: SessionConfig) -> anyhow::Result<ExitCode> {
    use anyhow::Context;
    use eth_test_raw::socket::RawLink;
    use eth_test_raw::{ExchangeEngine, FrameCodec, Session, ETHER_TYPE};

    let local = MacAddr::of_interface(ifname)?;
    println!("Own Mac: Interface={ifname}, {local} dest:{peer}");

    let link = RawLink::open(ifname, ETHER_TYPE).context("client needs CAP_NET_RAW")?;
    let engine = ExchangeEngine::new(
        local,
        peer,
        FrameCodec::new(config.payload_len),
        config.reply_timeout,
    );

    let mut session = Session::new(link, engine, config);
    stop_on_ctrl_c(session.stop_handle());

    let report = session.run().await;
    Ok(ExitCode::from(report.exit_code() as u8))
}

#[cfg(target_os = "linux")]
async fn run_server(ifname: &str) -> anyhow::Result<ExitCode> {
    use anyhow::Context;
    use eth_test_raw::echo::Responder;
    use eth_test_raw::socket::RawLink;
    use eth_test_raw::ETHER_TYPE;

    let mut link = RawLink::open(ifname, ETHER_TYPE).context("server needs CAP_NET_RAW")?;
    let responder = Responder::new();
    stop_on_ctrl_c(responder.stop_handle());

    println!("Start listening on {ifname}");
    let stats = responder.serve(&mut link).await?;
    println!(
        "Stopped: received {}, echoed {}, ignored {}",
        stats.received, stats.echoed, stats.ignored
    );
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(target_os = "linux"))]
async fn run_client(_ifname: &str, _peer: MacAddr, _config: SessionConfig) -> anyhow::Result<ExitCode> {
    anyhow::bail!("raw Ethernet sockets are only supported on Linux")
}

#[cfg(not(target_os = "linux"))]
async fn run_server(_ifname: &str) -> anyhow::Result<ExitCode> {
    anyhow::bail!("raw Ethernet sockets are only supported on Linux")
}
