// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
use anyhow::{Error as AnyErr, Result};
use std::time::Duration;

use crate::common::protocol::{gateway::http::ApiEndpoint, AddressValidator};

pub fn parse_api_endpoint(v: &str) -> Result<ApiEndpoint> {
  v.parse::<ApiEndpoint>().map_err(AnyErr::from)
}

pub fn parse_timeout_secs(v: &str) -> Result<Duration> {
  let secs = v
    .parse::<f64>()
    .map_err(|_| AnyErr::msg("Timeout must be a number of seconds"))?;
  if !secs.is_finite() || secs <= 0.0 {
    return Err(AnyErr::msg("Timeout must be a positive number of seconds"));
  }
  Ok(Duration::from_secs_f64(secs))
}

pub fn validate_api_endpoint(v: &str) -> Result<(), String> {
  parse_api_endpoint(v).map(|_| ()).map_err(|e| e.to_string())
}

pub fn validate_timeout_secs(v: &str) -> Result<(), String> {
  parse_timeout_secs(v).map(|_| ()).map_err(|e| e.to_string())
}

pub fn validate_multiaddr(v: &str) -> Result<(), String> {
  AddressValidator::default()
    .validate(v)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use super::{parse_timeout_secs, validate_api_endpoint, validate_multiaddr};

  #[test]
  fn timeouts() {
    assert_eq!(parse_timeout_secs("2.5").unwrap(), Duration::from_millis(2500));
    assert!(parse_timeout_secs("0").is_err());
    assert!(parse_timeout_secs("-1").is_err());
    assert!(parse_timeout_secs("soon").is_err());
    assert!(parse_timeout_secs("inf").is_err());
  }

  #[test]
  fn endpoints() {
    assert!(validate_api_endpoint("/ip4/127.0.0.1/tcp/5001").is_ok());
    assert!(validate_api_endpoint("localhost:5001").is_ok());
    assert!(validate_api_endpoint("/ip4/127.0.0.1").is_err());
  }

  #[test]
  fn multiaddrs() {
    assert!(validate_multiaddr("/ip4/127.0.0.1/tcp/8080").is_ok());
    assert!(validate_multiaddr("127.0.0.1:8080").is_err());
  }
}
