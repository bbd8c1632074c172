//! Live-update relay demo
//!
//! Run with: cargo run --example relay_server [BIND_ADDR]
//!
//! Serves the subscribe endpoint on `/events`, backed by an in-memory feed
//! that emits a synthetic change every two seconds once a viewer is
//! connected (the feed subscription opens lazily with the first viewer).
//!
//! Watch the stream:
//!   curl -N http://localhost:8080/events

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use relay_rs::feed::{ChangeFeedSource, MemoryFeed, Operation};
use relay_rs::{RelayConfig, RelayService};

/// Parse bind address from command line argument.
///
/// Accepts "localhost", "127.0.0.1", "0.0.0.0:9090", etc.
fn parse_bind_addr(arg: &str) -> Result<SocketAddr, String> {
    const DEFAULT_PORT: u16 = 8080;

    let normalized = arg.replace("localhost", "127.0.0.1");

    if let Ok(addr) = normalized.parse::<SocketAddr>() {
        return Ok(addr);
    }

    if let Ok(ip) = normalized.parse::<std::net::IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_PORT));
    }

    Err(format!(
        "Invalid bind address: '{}'. Expected format: IP:PORT or IP or 'localhost'",
        arg
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr = match std::env::args().nth(1) {
        Some(arg) => match parse_bind_addr(&arg) {
            Ok(addr) => addr,
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!("Usage: relay_server [BIND_ADDR]");
                std::process::exit(1);
            }
        },
        None => "0.0.0.0:8080".parse().unwrap(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("relay_rs=debug".parse()?)
                .add_directive("relay_server=info".parse()?),
        )
        .init();

    let feed = Arc::new(MemoryFeed::new());
    let config = RelayConfig::with_prefix("acme_")
        .keep_alive_interval(Duration::from_secs(25))
        .restart_delay(Duration::from_secs(3));
    let service = Arc::new(RelayService::new(
        config,
        Arc::clone(&feed) as Arc<dyn ChangeFeedSource>,
    ));

    // Synthetic writer: one change every two seconds. Events emitted before
    // the first viewer arrives are dropped by the feed, which also
    // demonstrates that the subscription opens lazily.
    let writer_feed = Arc::clone(&feed);
    tokio::spawn(async move {
        let collections = ["acme_orders", "acme_reports", "acme_users"];
        let operations = [Operation::Insert, Operation::Update, Operation::Delete];
        let mut n = 0usize;

        let mut ticker = tokio::time::interval(Duration::from_secs(2));
        loop {
            ticker.tick().await;
            writer_feed.emit(operations[n % operations.len()], collections[n % collections.len()]);
            n += 1;
        }
    });

    let app = relay_rs::service::router(Arc::clone(&service));
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;

    println!("Relay listening on http://{}", bind_addr);
    println!("Subscribe with: curl -N http://{}/events", bind_addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
            service.shutdown().await;
        }
    }

    Ok(())
}
