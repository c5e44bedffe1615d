// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
//! Read-only projections of daemon state, as decoded from its replies

use serde::{Deserialize, Deserializer, Serialize};

/// The daemon reports empty collections as `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A forwarding rule: inbound peer connections for `protocol` go to `address`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Listener {
  pub protocol: String,
  pub address: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerSet {
  #[serde(rename = "Listeners", default, deserialize_with = "null_as_empty")]
  listeners: Vec<Listener>,
}

impl ListenerSet {
  pub fn iter(&self) -> std::slice::Iter<'_, Listener> {
    self.listeners.iter()
  }

  pub fn len(&self) -> usize {
    self.listeners.len()
  }

  pub fn is_empty(&self) -> bool {
    self.listeners.is_empty()
  }

  pub fn find(&self, protocol: &str) -> Option<&Listener> {
    self.listeners.iter().find(|l| l.protocol == protocol)
  }

  pub fn into_vec(self) -> Vec<Listener> {
    self.listeners
  }
}

impl IntoIterator for ListenerSet {
  type Item = Listener;
  type IntoIter = std::vec::IntoIter<Listener>;

  fn into_iter(self) -> Self::IntoIter {
    self.listeners.into_iter()
  }
}

impl<'a> IntoIterator for &'a ListenerSet {
  type Item = &'a Listener;
  type IntoIter = std::slice::Iter<'a, Listener>;

  fn into_iter(self) -> Self::IntoIter {
    self.listeners.iter()
  }
}

/// Result of a dial; `address` is the listener address that was dialed, not a local endpoint
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stream {
  pub protocol: String,
  pub address: String,
}

/// Daemon-assigned identifier of one active stream
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerId(String);

impl HandlerId {
  pub fn new<S: Into<String>>(id: S) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<HandlerId> for String {
  fn from(id: HandlerId) -> Self {
    id.0
  }
}

impl std::fmt::Display for HandlerId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(&self.0)
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StreamRecord {
  #[serde(rename = "HandlerID")]
  pub handler_id: HandlerId,
  pub protocol: String,
  pub local_peer: String,
  pub local_address: String,
  pub remote_peer: String,
  pub remote_address: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecordSet {
  #[serde(rename = "Streams", default, deserialize_with = "null_as_empty")]
  streams: Vec<StreamRecord>,
}

impl StreamRecordSet {
  pub fn iter(&self) -> std::slice::Iter<'_, StreamRecord> {
    self.streams.iter()
  }

  pub fn len(&self) -> usize {
    self.streams.len()
  }

  pub fn is_empty(&self) -> bool {
    self.streams.is_empty()
  }

  pub fn find(&self, handler_id: &HandlerId) -> Option<&StreamRecord> {
    self.streams.iter().find(|s| &s.handler_id == handler_id)
  }

  pub fn into_vec(self) -> Vec<StreamRecord> {
    self.streams
  }
}

impl IntoIterator for StreamRecordSet {
  type Item = StreamRecord;
  type IntoIter = std::vec::IntoIter<StreamRecord>;

  fn into_iter(self) -> Self::IntoIter {
    self.streams.into_iter()
  }
}

impl<'a> IntoIterator for &'a StreamRecordSet {
  type Item = &'a StreamRecord;
  type IntoIter = std::slice::Iter<'a, StreamRecord>;

  fn into_iter(self) -> Self::IntoIter {
    self.streams.iter()
  }
}
