// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0

use std::sync::Arc;

use futures::future::BoxFuture;

use super::{call_json, call_unit, rejected, P2pError, Stream, StreamRecordSet};
use crate::{
  common::protocol::{gateway::RpcGateway, AddressValidator, Operation, Request, Selector},
  util::cancellation::CallContext,
};

/// Option key asking the daemon for fully-populated stream records
pub const HEADERS_OPTION: &str = "headers";

/// Dials peers' listeners and manages the resulting streams
#[derive(Clone)]
pub struct StreamManager {
  gateway: Arc<dyn RpcGateway>,
  validator: AddressValidator,
}

impl StreamManager {
  pub fn new(gateway: Arc<dyn RpcGateway>) -> Self {
    Self::with_validator(gateway, AddressValidator::default())
  }

  pub fn with_validator(gateway: Arc<dyn RpcGateway>, validator: AddressValidator) -> Self {
    Self { gateway, validator }
  }

  /// Dials `protocol` on `peer_id`
  ///
  /// A non-empty `listener_address` is validated and sent as a routing hint, letting
  /// the daemon reach the peer's listener without discovery. An absent or empty one
  /// is left off the argument list entirely.
  ///
  /// The handler ID of the new stream is not part of the reply; find it with [`Self::list`].
  pub fn dial<TPeer, TProtocol>(
    &self,
    ctx: &CallContext,
    peer_id: TPeer,
    protocol: TProtocol,
    listener_address: Option<&str>,
  ) -> BoxFuture<'static, Result<Stream, P2pError>>
  where
    TPeer: Into<String>,
    TProtocol: Into<String>,
  {
    let listener_address = listener_address.filter(|addr| !addr.is_empty());
    if let Some(addr) = listener_address {
      if let Err(e) = self.validator.validate(addr) {
        return rejected(e);
      }
    }
    let mut request = Request::new(Operation::StreamDial)
      .arg(peer_id)
      .arg(protocol);
    if let Some(addr) = listener_address {
      request = request.arg(addr);
    }
    call_json(self.gateway.clone(), ctx.clone(), request)
  }

  /// Closes the stream(s) named by `selector`, keyed by handler ID
  pub fn close(
    &self,
    ctx: &CallContext,
    selector: Selector,
  ) -> BoxFuture<'static, Result<(), P2pError>> {
    tracing::debug!(%selector, "closing stream");
    call_unit(
      self.gateway.clone(),
      ctx.clone(),
      selector.into_close_request(Operation::StreamClose),
    )
  }

  pub fn list(&self, ctx: &CallContext) -> BoxFuture<'static, Result<StreamRecordSet, P2pError>> {
    let request = Request::new(Operation::StreamList).flag(HEADERS_OPTION, true);
    call_json(self.gateway.clone(), ctx.clone(), request)
  }
}
