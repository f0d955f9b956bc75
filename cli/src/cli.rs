//! # CLI Interface
//!
//! Argument structure for the `catena` binary: `listen`, `decode` and
//! `version`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use catena_protocol::config::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_MAX_IN_FLIGHT_HANDLERS, DEFAULT_WS_URL,
};
use catena_protocol::model::Address;
use catena_protocol::ws::EventKind;

use crate::logging::LogFormat;

/// Client for Catena nodes.
///
/// Streams node events over the websocket API and decodes transactions
/// from their JSON form into canonical binary.
#[derive(Parser, Debug)]
#[command(name = "catena", about = "Catena node client", version, propagate_version = true)]
pub struct CatenaCli {
    /// Log output format.
    #[arg(long, global = true, env = "CATENA_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Subscribe to event channels and print every event received.
    Listen(ListenArgs),
    /// Decode a JSON transaction and print its summary, size and payload.
    Decode(DecodeArgs),
    /// Print version information and exit.
    Version,
}

/// Unsubscribe behaviour once a channel has no handlers left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Always,
    Never,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Websocket endpoint of the node.
    #[arg(long, env = "CATENA_WS_URL", default_value = DEFAULT_WS_URL)]
    pub url: String,

    /// Account address (hex) to watch. Repeat for several accounts.
    #[arg(long = "address", short = 'a', env = "CATENA_ADDRESSES", value_delimiter = ',')]
    pub addresses: Vec<Address>,

    /// Account channels to subscribe to for every address.
    #[arg(
        long = "channel",
        short = 'c',
        value_delimiter = ',',
        value_parser = parse_channel,
        default_values = ["confirmedAdded", "unconfirmedAdded", "status"]
    )]
    pub channels: Vec<EventKind>,

    /// Also follow new blocks.
    #[arg(long)]
    pub blocks: bool,

    /// Seconds to wait for the node's greeting on a new connection.
    #[arg(long, env = "CATENA_HANDSHAKE_TIMEOUT", default_value_t = DEFAULT_HANDSHAKE_TIMEOUT.as_secs())]
    pub handshake_timeout: u64,

    /// Handler invocations allowed to run at once.
    #[arg(long, env = "CATENA_MAX_IN_FLIGHT", default_value_t = DEFAULT_MAX_IN_FLIGHT_HANDLERS)]
    pub max_in_flight: usize,

    #[arg(long, env = "CATENA_UNSUBSCRIBE_POLICY", value_enum, default_value_t = PolicyArg::Always)]
    pub unsubscribe_policy: PolicyArg,

    /// Stop after this many events.
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding a `{"transaction": .., "meta": ..}` document, or `-`
    /// for stdin.
    pub input: PathBuf,

    /// Print the decoded summary as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

fn parse_channel(name: &str) -> Result<EventKind, String> {
    EventKind::from_channel_name(name).ok_or_else(|| {
        let known: Vec<&str> = EventKind::ALL.iter().map(|kind| kind.channel_name()).collect();
        format!("unknown channel `{name}`, expected one of: {}", known.join(", "))
    })
}
