// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
use futures::future::Future;
use tokio::time::{Duration, Instant};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::common::protocol::gateway::TransportError;

/// A [CancellationToken] that cannot be triggered by its recipient
#[derive(Debug, Clone, Default)]
#[repr(transparent)]
pub struct CancellationListener {
  token: CancellationToken,
}

impl CancellationListener {
  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }

  pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
    self.token.cancelled()
  }
}

impl From<CancellationToken> for CancellationListener {
  fn from(token: CancellationToken) -> Self {
    Self { token }
  }
}

/// Per-call cancellation and deadline
///
/// Either one firing while a call awaits its reply ends the wait with a
/// [`TransportError`]. Whether the daemon already applied a mutating call at
/// that point is unknown; list again to find out.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
  cancellation: CancellationListener,
  deadline: Option<Instant>,
}

impl CallContext {
  /// A context that never cancels and has no deadline
  pub fn background() -> Self {
    Default::default()
  }

  pub fn with_cancellation<TListener: Into<CancellationListener>>(
    mut self,
    listener: TListener,
  ) -> Self {
    self.cancellation = listener.into();
    self
  }

  pub fn with_timeout(self, timeout: Duration) -> Self {
    self.with_deadline(Instant::now() + timeout)
  }

  /// Deadlines only tighten; the earlier of the existing and new deadline wins
  pub fn with_deadline(mut self, deadline: Instant) -> Self {
    self.deadline = Some(match self.deadline {
      Some(existing) => existing.min(deadline),
      None => deadline,
    });
    self
  }

  pub fn deadline(&self) -> Option<Instant> {
    self.deadline
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancellation.is_cancelled()
  }

  /// Runs `work` until it completes, the context is cancelled, or the deadline passes
  ///
  /// Cancellation is checked first, so an already-cancelled context never polls `work`.
  pub async fn guard<T, E, F>(&self, work: F) -> Result<T, E>
  where
    F: Future<Output = Result<T, E>>,
    E: From<TransportError>,
  {
    let deadline = async {
      match self.deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending::<()>().await,
      }
    };
    tokio::select! {
      biased;
      _ = self.cancellation.cancelled() => Err(TransportError::Cancelled.into()),
      _ = deadline => Err(TransportError::DeadlineExceeded.into()),
      result = work => result,
    }
  }
}
