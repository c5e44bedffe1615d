// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
//! Listener and stream clients for the daemon's p2p command surface

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use tracing_futures::Instrument;

use crate::{
  common::protocol::{
    gateway::{
      http::{HttpGateway, HttpGatewayConfig},
      GatewayError, RemoteError, RpcGateway, TransportError,
    },
    AddressValidator, InvalidAddress, Operation, Request,
  },
  util::cancellation::CallContext,
};

pub mod listener;
pub mod stream;
pub mod types;

pub use listener::ListenerRegistry;
pub use stream::StreamManager;
pub use types::{HandlerId, Listener, ListenerSet, Stream, StreamRecord, StreamRecordSet};

#[derive(Debug, thiserror::Error)]
#[error("Malformed reply to {operation}: {source}")]
pub struct DecodeError {
  operation: Operation,
  #[source]
  source: serde_json::Error,
}

impl DecodeError {
  pub fn operation(&self) -> Operation {
    self.operation
  }
}

/// Every failure a listener or stream operation can produce; exactly one per failed call
#[derive(Debug, thiserror::Error)]
pub enum P2pError {
  #[error(transparent)]
  InvalidAddress(#[from] InvalidAddress),
  #[error(transparent)]
  Remote(#[from] RemoteError),
  #[error(transparent)]
  Transport(#[from] TransportError),
  #[error(transparent)]
  Decode(#[from] DecodeError),
}

impl From<GatewayError> for P2pError {
  fn from(e: GatewayError) -> Self {
    match e {
      GatewayError::Remote(e) => P2pError::Remote(e),
      GatewayError::Transport(e) => P2pError::Transport(e),
    }
  }
}

fn log_outcome<T>(result: &Result<T, P2pError>) {
  match result {
    Ok(_) => tracing::debug!("completed"),
    Err(P2pError::Remote(e)) => tracing::debug!(error = %e, code = ?e.code(), "daemon refused"),
    Err(e) => tracing::debug!(error = %e, "failed"),
  }
}

/// Sends `request` and discards the reply body
pub(crate) fn call_unit(
  gateway: Arc<dyn RpcGateway>,
  ctx: CallContext,
  request: Request,
) -> BoxFuture<'static, Result<(), P2pError>> {
  let span = tracing::debug_span!("p2p", operation = %request.operation());
  async move {
    let result = ctx
      .guard(async move {
        let _reply = gateway.send(request).await?;
        Ok::<_, GatewayError>(())
      })
      .await
      .map_err(P2pError::from);
    log_outcome(&result);
    result
  }
  .instrument(span)
  .boxed()
}

/// Sends `request` and decodes the whole reply body as `T`
pub(crate) fn call_json<T>(
  gateway: Arc<dyn RpcGateway>,
  ctx: CallContext,
  request: Request,
) -> BoxFuture<'static, Result<T, P2pError>>
where
  T: DeserializeOwned + Send + 'static,
{
  let operation = request.operation();
  let span = tracing::debug_span!("p2p", %operation);
  async move {
    let fetched = ctx
      .guard(async move {
        let reply = gateway.send(request).await?;
        Ok::<_, GatewayError>(reply.into_bytes().await?)
      })
      .await;
    let result = match fetched {
      Ok(body) => {
        tracing::trace!(bytes = body.len(), "reply received");
        serde_json::from_slice::<T>(&body)
          .map_err(|source| P2pError::from(DecodeError { operation, source }))
      }
      Err(e) => Err(P2pError::from(e)),
    };
    log_outcome(&result);
    result
  }
  .instrument(span)
  .boxed()
}

pub(crate) fn rejected<T: Send + 'static>(
  e: InvalidAddress,
) -> BoxFuture<'static, Result<T, P2pError>> {
  tracing::debug!(address = %e.address(), error = %e.reason(), "address rejected before dispatch");
  futures::future::ready(Err(P2pError::from(e))).boxed()
}

/// Both clients over one shared gateway
#[derive(Clone)]
pub struct P2pClient {
  listeners: ListenerRegistry,
  streams: StreamManager,
}

impl P2pClient {
  pub fn new(gateway: Arc<dyn RpcGateway>) -> Self {
    Self::with_validator(gateway, AddressValidator::default())
  }

  pub fn with_validator(gateway: Arc<dyn RpcGateway>, validator: AddressValidator) -> Self {
    Self {
      listeners: ListenerRegistry::with_validator(gateway.clone(), validator.clone()),
      streams: StreamManager::with_validator(gateway, validator),
    }
  }

  /// Client over the daemon's HTTP API
  pub fn http(config: HttpGatewayConfig) -> Result<Self, TransportError> {
    tracing::debug!(endpoint = %config.endpoint, "using HTTP gateway");
    Ok(Self::new(Arc::new(HttpGateway::new(config)?)))
  }

  pub fn listeners(&self) -> &ListenerRegistry {
    &self.listeners
  }

  pub fn streams(&self) -> &StreamManager {
    &self.streams
  }
}

#[cfg(test)]
pub(crate) mod testing {
  use std::sync::{Arc, Mutex};

  use futures::future::{BoxFuture, FutureExt};

  use crate::common::protocol::{
    gateway::{GatewayError, MockRpcGateway, RemoteError, RpcReply},
    Request,
  };

  pub fn reply(body: &'static str) -> BoxFuture<'static, Result<RpcReply, GatewayError>> {
    futures::future::ready(Ok(RpcReply::from_bytes(body))).boxed()
  }

  pub fn refuse(message: &'static str) -> BoxFuture<'static, Result<RpcReply, GatewayError>> {
    futures::future::ready(Err(GatewayError::Remote(RemoteError::new(message)))).boxed()
  }

  /// Gateway that answers every request with `body` and records what it was sent
  pub fn recording(body: &'static str) -> (MockRpcGateway, Arc<Mutex<Vec<Request>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let mut gateway = MockRpcGateway::new();
    gateway.expect_send().returning(move |request| {
      sink.lock().unwrap().push(request);
      reply(body)
    });
    (gateway, seen)
  }
}
