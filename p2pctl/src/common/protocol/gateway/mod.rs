// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
//! Transport boundary between the clients and the daemon

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::request::Request;

pub mod http;

/// Failure reported by the daemon for a request it received and understood
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RemoteError {
  message: String,
  code: Option<i64>,
}

impl RemoteError {
  pub fn new<S: Into<String>>(message: S) -> Self {
    Self {
      message: message.into(),
      code: None,
    }
  }

  pub fn with_code(mut self, code: i64) -> Self {
    self.code = Some(code);
    self
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn code(&self) -> Option<i64> {
    self.code
  }
}

/// The request could not be delivered or its reply could not be received
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
  #[error("Could not reach the daemon: {0}")]
  Connection(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
  #[error("Reply stream failed")]
  Io(#[from] std::io::Error),
  #[error("Call was cancelled before a reply arrived")]
  Cancelled,
  #[error("Call deadline elapsed before a reply arrived")]
  DeadlineExceeded,
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
  #[error(transparent)]
  Remote(#[from] RemoteError),
  #[error(transparent)]
  Transport(#[from] TransportError),
}

/// Body of a successful reply
///
/// Owns the underlying transport resource; dropping the reply releases it.
pub struct RpcReply {
  output: Box<dyn AsyncRead + Send + Unpin + 'static>,
}

impl RpcReply {
  pub fn new<TOutput: AsyncRead + Send + Unpin + 'static>(output: TOutput) -> Self {
    Self {
      output: Box::new(output),
    }
  }

  pub fn from_bytes<B: Into<Vec<u8>>>(bytes: B) -> Self {
    Self::new(std::io::Cursor::new(bytes.into()))
  }

  pub async fn into_bytes(mut self) -> Result<Vec<u8>, TransportError> {
    let mut buffer = Vec::new();
    self.output.read_to_end(&mut buffer).await?;
    Ok(buffer)
  }
}

impl std::fmt::Debug for RpcReply {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RpcReply").finish_non_exhaustive()
  }
}

/// Executes one named remote operation per call
///
/// Implementations map daemon-reported failures to [`GatewayError::Remote`]
/// and everything else that prevents a reply to [`GatewayError::Transport`].
#[cfg_attr(test, mockall::automock)]
pub trait RpcGateway: Send + Sync {
  fn send(&self, request: Request) -> BoxFuture<'static, Result<RpcReply, GatewayError>>;
}
