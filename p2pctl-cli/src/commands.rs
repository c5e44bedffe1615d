// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0

use anyhow::{Context as AnyhowContext, Result};
use clap::ArgMatches;
use p2pctl::{common::protocol::Selector, util::cancellation::CallContext, P2pClient};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}

/// Empty identifiers mean "no target"; the bulk flag is forwarded as given
fn close_selector(args: &'_ ArgMatches, id_arg: &str) -> Selector {
  Selector::from_parts(args.value_of(id_arg).unwrap_or(""), args.is_present("all"))
}

pub async fn listener_main(
  client: &P2pClient,
  ctx: &CallContext,
  args: &'_ ArgMatches,
) -> Result<()> {
  let listeners = client.listeners();
  match args.subcommand() {
    Some(("open", opts)) => {
      let protocol = opts.value_of("protocol").unwrap_or_default();
      let address = opts.value_of("address").unwrap_or_default();
      let listener = listeners
        .open(ctx, protocol, address)
        .await
        .with_context(|| format!("Opening listener for {}", protocol))?;
      tracing::info!(protocol = %listener.protocol, address = %listener.address, "listener opened");
      print_json(&listener)
    }
    Some(("close", opts)) => {
      let selector = close_selector(opts, "protocol");
      listeners
        .close(ctx, selector.clone())
        .await
        .with_context(|| format!("Closing listener {}", selector))?;
      tracing::info!(%selector, "listener closed");
      Ok(())
    }
    Some(("ls", _)) => {
      let set = listeners.list(ctx).await.context("Listing listeners")?;
      print_json(&set)
    }
    _ => unreachable!(),
  }
}

pub async fn stream_main(
  client: &P2pClient,
  ctx: &CallContext,
  args: &'_ ArgMatches,
) -> Result<()> {
  let streams = client.streams();
  match args.subcommand() {
    Some(("dial", opts)) => {
      let peer = opts.value_of("peer").unwrap_or_default();
      let protocol = opts.value_of("protocol").unwrap_or_default();
      let stream = streams
        .dial(ctx, peer, protocol, opts.value_of("address"))
        .await
        .with_context(|| format!("Dialing {} on {}", protocol, peer))?;
      tracing::info!(protocol = %stream.protocol, address = %stream.address, "stream dialed");
      print_json(&stream)
    }
    Some(("close", opts)) => {
      let selector = close_selector(opts, "handler-id");
      streams
        .close(ctx, selector.clone())
        .await
        .with_context(|| format!("Closing stream {}", selector))?;
      tracing::info!(%selector, "stream closed");
      Ok(())
    }
    Some(("ls", _)) => {
      let set = streams.list(ctx).await.context("Listing streams")?;
      print_json(&set)
    }
    _ => unreachable!(),
  }
}
