// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0

use anyhow::{Context as AnyhowContext, Result};
use clap::ArgMatches;
use p2pctl::{
  common::protocol::gateway::http::{ApiEndpoint, HttpGatewayConfig},
  util::validators::{parse_api_endpoint, parse_timeout_secs},
};
use std::time::Duration;

pub const API_ENV_VAR: &str = "P2PCTL_API";

#[derive(Clone, Debug)]
pub struct CliArgs {
  pub gateway: HttpGatewayConfig,
  /// Deadline for each call, covering the request and reading its reply
  pub call_timeout: Option<Duration>,
}

/// Resolves the API endpoint from `--api`, then the environment, then the default
fn resolve_endpoint(flag: Option<&str>, env: Option<String>) -> Result<ApiEndpoint> {
  if let Some(v) = flag {
    return parse_api_endpoint(v);
  }
  match env {
    Some(v) if !v.trim().is_empty() => {
      parse_api_endpoint(&v).with_context(|| format!("Invalid {} value {:?}", API_ENV_VAR, v))
    }
    _ => Ok(ApiEndpoint::default()),
  }
}

pub fn cli_arg_handling(args: &'_ ArgMatches) -> Result<CliArgs> {
  let endpoint = resolve_endpoint(args.value_of("api"), std::env::var(API_ENV_VAR).ok())?;
  let call_timeout = args
    .value_of("timeout")
    .map(parse_timeout_secs)
    // flip Option<Result<T, E>> to Result<Option<T>, E>
    .map_or(Ok(None), |v| v.map(Some))?;
  Ok(CliArgs {
    gateway: HttpGatewayConfig {
      endpoint,
      timeout: None,
    },
    call_timeout,
  })
}
