// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
#![warn(unused_imports)]

use anyhow::Result;
use clap::{Arg, ArgMatches, Command};
use p2pctl::{
  util::{
    cancellation::CallContext,
    validators::{validate_api_endpoint, validate_multiaddr, validate_timeout_secs},
  },
  P2pClient,
};
use tokio_util::sync::CancellationToken;

mod commands;
mod config;

/// Applied when `RUST_LOG` is unset: warnings everywhere, call outcomes from this tool
const DEFAULT_LOG_FILTER: &str = "warn,p2pctl=info,p2pctl_cli=info";

fn close_args(
  command: Command<'static>,
  id_arg: &'static str,
  id_help: &'static str,
) -> Command<'static> {
  command
    .arg(Arg::new(id_arg).help(id_help).required(false))
    .arg(
      Arg::new("all")
        .long("all")
        .short('a')
        .help("Close every match; combined with an identifier, the daemon decides"),
    )
}

fn build_command() -> Command<'static> {
  Command::new(env!("CARGO_BIN_NAME"))
    .version(env!("CARGO_PKG_VERSION"))
    .about(env!("CARGO_PKG_DESCRIPTION"))
    .arg(
      Arg::new("api")
        .long("api")
        .help(concat!(
          "Daemon API as a URL, host:port, or multiaddr ",
          "(default: $P2PCTL_API or http://127.0.0.1:5001)"
        ))
        .global(true)
        .validator(validate_api_endpoint)
        .takes_value(true),
    )
    .arg(
      Arg::new("timeout")
        .long("timeout")
        .help("Seconds to wait for each reply")
        .global(true)
        .validator(validate_timeout_secs)
        .takes_value(true),
    )
    .subcommand(
      Command::new("listener")
        .about("Forward inbound peer connections to local addresses")
        .subcommand(
          Command::new("open")
            .about("Forward connections for a protocol to a target multiaddr")
            .arg(Arg::new("protocol").required(true))
            .arg(
              Arg::new("address")
                .validator(validate_multiaddr)
                .required(true),
            ),
        )
        .subcommand(close_args(
          Command::new("close").about("Close one or all listeners"),
          "protocol",
          "Protocol of the listener to close",
        ))
        .subcommand(Command::new("ls").about("List active listeners"))
        .subcommand_required(true)
        .arg_required_else_help(true),
    )
    .subcommand(
      Command::new("stream")
        .about("Dial peers' listeners and manage open streams")
        .subcommand(
          Command::new("dial")
            .about("Open a stream to a peer's listener")
            .arg(Arg::new("peer").required(true))
            .arg(Arg::new("protocol").required(true))
            .arg(
              Arg::new("address")
                .help("Listener multiaddr used to reach the peer without discovery")
                .validator(validate_multiaddr)
                .required(false),
            ),
        )
        .subcommand(close_args(
          Command::new("close").about("Close one or all streams"),
          "handler-id",
          "Handler ID of the stream to close",
        ))
        .subcommand(Command::new("ls").about("List active streams"))
        .subcommand_required(true)
        .arg_required_else_help(true),
    )
    .subcommand_required(true)
    .arg_required_else_help(true)
}

fn main() {
  let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
  let collector = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_writer(std::io::stderr)
    .finish();
  tracing::subscriber::set_global_default(collector).expect("Logger init must succeed");
  let matches = build_command().get_matches();
  let mode = matches.subcommand_name().unwrap_or("<No subcommand?>");
  let rt = tokio::runtime::Builder::new_multi_thread()
    .thread_name("tokio-reactor-worker")
    .enable_all()
    .build()
    .expect("Tokio Runtime setup failure");
  if let Err(err) = rt.block_on(main_args_handler(&matches)) {
    tracing::debug!(mode = mode, err = ?err, "dispatch_command_failure");
    eprintln!("Error: {:#}", err);
    std::process::exit(1);
  }
}

async fn main_args_handler(matches: &'_ ArgMatches) -> Result<()> {
  // Global options are always visible on the innermost subcommand
  let mut leaf = matches;
  while let Some((_, sub)) = leaf.subcommand() {
    leaf = sub;
  }
  let config = config::cli_arg_handling(leaf)?;
  tracing::debug!("Running with config {:?}", config);
  let client = P2pClient::http(config.gateway)?;

  let cancellation = CancellationToken::new();
  let mut ctx = CallContext::background().with_cancellation(cancellation.clone());
  if let Some(timeout) = config.call_timeout {
    ctx = ctx.with_timeout(timeout);
  }
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      tracing::warn!("Interrupted; abandoning in-flight call");
      cancellation.cancel();
    }
  });

  match matches.subcommand() {
    Some(("listener", opts)) => commands::listener_main(&client, &ctx, opts).await,
    Some(("stream", opts)) => commands::stream_main(&client, &ctx, opts).await,
    _ => unreachable!(),
  }
}
