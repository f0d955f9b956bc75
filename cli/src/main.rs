// Copyright (c) 2026 Catena Contributors. MIT License.
// See LICENSE for details.

//! # Catena Client
//!
//! Entry point for the `catena` binary. Parses CLI arguments, initializes
//! logging and runs one of:
//!
//! - `listen`: subscribe to node event channels and print events
//! - `decode`: decode a JSON transaction and print its canonical payload
//! - `version`: print build version information

mod cli;
mod logging;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::{json, Value};
use tokio::signal;
use tokio::sync::mpsc;

use catena_protocol::transaction::{EntityType, Transaction};
use catena_protocol::ws::{ClientConfig, Event, EventClient, EventKind, Handler, UnsubscribePolicy};

use cli::{CatenaCli, Commands, DecodeArgs, ListenArgs, PolicyArg};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CatenaCli::parse();

    match cli.command {
        Commands::Listen(args) => {
            logging::init_logging("catena=info,catena_protocol=info", cli.log_format);
            listen(args).await
        }
        Commands::Decode(args) => {
            logging::init_logging("catena=warn,catena_protocol=warn", cli.log_format);
            decode(args)
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Subscribes to the requested channels and prints one line per event
/// until interrupted or `--limit` events have arrived.
async fn listen(args: ListenArgs) -> Result<()> {
    let mut config = ClientConfig::new(args.url.clone());
    config.handshake_timeout = Duration::from_secs(args.handshake_timeout);
    config.max_in_flight_handlers = args.max_in_flight;
    config.unsubscribe_policy = match args.unsubscribe_policy {
        PolicyArg::Always => UnsubscribePolicy::Always,
        PolicyArg::Never => UnsubscribePolicy::Never,
    };

    tracing::info!(
        url = %config.url,
        addresses = args.addresses.len(),
        max_in_flight = config.max_in_flight_handlers,
        "starting listener"
    );

    let client = EventClient::new(config);
    let mut errors = client.errors().context("dispatch error channel already taken")?;
    let (lines_tx, mut lines_rx) = mpsc::unbounded_channel::<String>();

    let follow_blocks = args.blocks || args.channels.contains(&EventKind::Block);
    if follow_blocks {
        client
            .subscribe(EventKind::Block, None, vec![printer(lines_tx.clone())])
            .await
            .context("failed to subscribe to blocks")?;
    }
    for address in &args.addresses {
        for kind in args.channels.iter().filter(|kind| kind.is_address_scoped()) {
            client
                .subscribe(*kind, Some(*address), vec![printer(lines_tx.clone())])
                .await
                .with_context(|| format!("failed to subscribe to {kind} for {address}"))?;
        }
    }
    drop(lines_tx);

    if client.subscriptions().is_empty() {
        bail!("nothing to listen to: pass --address or --blocks");
    }
    tracing::info!(
        subscriptions = client.subscriptions().len(),
        connections = client.connection_count().await,
        "listening"
    );

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut received = 0usize;
    loop {
        tokio::select! {
            line = lines_rx.recv() => {
                let Some(line) = line else { break };
                println!("{line}");
                received += 1;
                if args.limit.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
            Some(error) = errors.recv() => {
                tracing::warn!(%error, "dispatch error");
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    client.close().await;
    tracing::info!(received, "listener stopped");
    Ok(())
}

/// A handler that forwards a one-line description of each event. It retires
/// itself once the printing side has gone away.
fn printer(lines: mpsc::UnboundedSender<String>) -> Handler {
    Arc::new(move |event: &Event| lines.send(describe(event)).is_ok())
}

fn describe(event: &Event) -> String {
    let kind = event.kind();
    match event {
        Event::Block(block) => format!(
            "{kind} height={} hash={} transactions={}",
            block.block.height,
            block.meta.hash,
            block.meta.num_transactions.unwrap_or(0)
        ),
        Event::ConfirmedAdded(tx) | Event::UnconfirmedAdded(tx) | Event::PartialAdded(tx) => {
            let hash = tx.envelope.hash().map(|hash| hash.to_hex());
            format!("{kind} {tx} hash={}", hash.as_deref().unwrap_or("-"))
        }
        Event::UnconfirmedRemoved(hash) | Event::PartialRemoved(hash) => {
            format!("{kind} hash={hash}")
        }
        Event::Status(status) => format!("{kind} hash={} status={}", status.hash, status.status),
        Event::Cosignature(cosignature) => format!(
            "{kind} parent={} signer={}",
            cosignature.parent_hash, cosignature.signer
        ),
    }
}

/// Decodes one JSON transaction, re-encodes it and prints the result.
fn decode(args: DecodeArgs) -> Result<()> {
    let text = if args.input == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
    } else {
        std::fs::read_to_string(&args.input)
            .with_context(|| format!("failed to read {}", args.input.display()))?
    };

    let tx = Transaction::from_json_str(&text).context("failed to decode transaction")?;
    let payload = tx.encode().context("failed to encode transaction")?;
    tracing::debug!(entity_type = %tx.entity_type(), size = payload.len(), "decoded");

    if args.json {
        let summary = summary_json(&tx, &payload);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{tx}");
    println!("  size      : {}", payload.len());
    println!("  max fee   : {}", tx.envelope.max_fee);
    match &tx.envelope.deadline {
        Some(deadline) => println!("  deadline  : {deadline}"),
        None => println!("  deadline  : -"),
    }
    if let Some(aggregate) = tx.body.as_aggregate() {
        println!("  inner     : {}", aggregate.transactions.len());
        for (index, inner) in aggregate.transactions.iter().enumerate() {
            println!("    #{index} {inner} ({} bytes)", inner.embedded_size());
        }
        println!("  cosigners : {}", aggregate.cosignatures.len());
    }
    println!("  payload   : {}", hex::encode_upper(&payload));
    Ok(())
}

fn summary_json(tx: &Transaction, payload: &[u8]) -> Value {
    let inner: Vec<Value> = tx
        .body
        .as_aggregate()
        .map(|aggregate| {
            aggregate
                .transactions
                .iter()
                .map(|inner| {
                    json!({
                        "type": inner.entity_type().name(),
                        "signer": inner.envelope.signer.public_key.to_hex(),
                        "size": inner.embedded_size(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    json!({
        "type": tx.entity_type().name(),
        "code": tx.entity_type().code(),
        "version": tx.envelope.version.0,
        "networkType": tx.envelope.network_type.0,
        "signer": tx.envelope.signer.public_key.to_hex(),
        "maxFee": tx.envelope.max_fee.value(),
        "deadline": tx.envelope.deadline.map(|deadline| deadline.to_string()),
        "hash": tx.envelope.hash().map(|hash| hash.to_hex()),
        "size": payload.len(),
        "inner": inner,
        "payload": hex::encode_upper(payload),
    })
}

fn print_version() {
    println!("catena {}", env!("CARGO_PKG_VERSION"));
    println!("transaction types {}", EntityType::ALL.len());
    println!("rustc {}", rustc_version());
}

fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
