// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0

use std::sync::Arc;

use futures::future::BoxFuture;

use super::{call_json, call_unit, rejected, Listener, ListenerSet, P2pError};
use crate::{
  common::protocol::{gateway::RpcGateway, AddressValidator, Operation, Request, Selector},
  util::cancellation::CallContext,
};

/// Opens, closes, and lists the daemon's protocol listeners
///
/// Listeners are keyed by protocol name on the daemon side. Nothing is cached;
/// each call reflects the daemon's state at the time it is answered.
#[derive(Clone)]
pub struct ListenerRegistry {
  gateway: Arc<dyn RpcGateway>,
  validator: AddressValidator,
}

impl ListenerRegistry {
  pub fn new(gateway: Arc<dyn RpcGateway>) -> Self {
    Self::with_validator(gateway, AddressValidator::default())
  }

  pub fn with_validator(gateway: Arc<dyn RpcGateway>, validator: AddressValidator) -> Self {
    Self { gateway, validator }
  }

  /// Forwards inbound connections for `protocol` to `address`
  ///
  /// `address` must be a valid multiaddr; otherwise this fails without contacting the daemon.
  pub fn open<TProtocol, TAddress>(
    &self,
    ctx: &CallContext,
    protocol: TProtocol,
    address: TAddress,
  ) -> BoxFuture<'static, Result<Listener, P2pError>>
  where
    TProtocol: Into<String>,
    TAddress: Into<String>,
  {
    let address = address.into();
    if let Err(e) = self.validator.validate(&address) {
      return rejected(e);
    }
    let request = Request::new(Operation::ListenerOpen)
      .arg(protocol)
      .arg(address);
    call_json(self.gateway.clone(), ctx.clone(), request)
  }

  /// Closes the listener(s) named by `selector`
  ///
  /// Whether closing an unknown protocol is an error or a no-op is up to the daemon.
  pub fn close(
    &self,
    ctx: &CallContext,
    selector: Selector,
  ) -> BoxFuture<'static, Result<(), P2pError>> {
    tracing::debug!(%selector, "closing listener");
    call_unit(
      self.gateway.clone(),
      ctx.clone(),
      selector.into_close_request(Operation::ListenerClose),
    )
  }

  pub fn list(&self, ctx: &CallContext) -> BoxFuture<'static, Result<ListenerSet, P2pError>> {
    call_json(
      self.gateway.clone(),
      ctx.clone(),
      Request::new(Operation::ListenerList),
    )
  }
}
