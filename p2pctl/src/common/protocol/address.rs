// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0

use std::{str::FromStr, sync::Arc};

use multiaddr::Multiaddr;

#[derive(Debug, thiserror::Error)]
pub enum AddressParseError {
  #[error("Addresses must contain at least one /protocol/value segment")]
  Empty,
  #[error("Address is not a valid multiaddr: {0}")]
  Multiaddr(#[from] multiaddr::Error),
  #[error("Address rejected by codec: {0}")]
  Other(String),
}

/// A parser for the network address grammar accepted by the daemon
///
/// Codecs are only asked whether an address parses; the parsed form is discarded,
/// and the caller forwards the original text unaltered.
pub trait AddressCodec: Send + Sync {
  fn parse(&self, address: &str) -> Result<(), AddressParseError>;
}

/// Multiaddr grammar: an ordered list of `/protocol/value` segments,
/// such as `/ip4/127.0.0.1/tcp/4001`
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiaddrCodec;

impl AddressCodec for MultiaddrCodec {
  fn parse(&self, address: &str) -> Result<(), AddressParseError> {
    // The multiaddr crate accepts "" as the empty address; the daemon does not
    if address.is_empty() {
      return Err(AddressParseError::Empty);
    }
    Multiaddr::from_str(address)?;
    Ok(())
  }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid address {address:?}: {source}")]
pub struct InvalidAddress {
  address: String,
  #[source]
  source: AddressParseError,
}

impl InvalidAddress {
  pub fn address(&self) -> &str {
    &self.address
  }

  pub fn reason(&self) -> &AddressParseError {
    &self.source
  }
}

/// Local, side-effect-free pre-flight check for addresses about to be sent to the daemon
#[derive(Clone)]
pub struct AddressValidator {
  codec: Arc<dyn AddressCodec>,
}

impl AddressValidator {
  pub fn new<TCodec: AddressCodec + 'static>(codec: TCodec) -> Self {
    Self {
      codec: Arc::new(codec),
    }
  }

  pub fn validate(&self, address: &str) -> Result<(), InvalidAddress> {
    self
      .codec
      .parse(address)
      .map_err(|source| InvalidAddress {
        address: address.to_owned(),
        source,
      })
  }
}

impl Default for AddressValidator {
  fn default() -> Self {
    Self::new(MultiaddrCodec)
  }
}

impl std::fmt::Debug for AddressValidator {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AddressValidator").finish_non_exhaustive()
  }
}
