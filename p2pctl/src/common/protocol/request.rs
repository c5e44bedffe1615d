// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0

use std::collections::BTreeMap;

/// Remote operations issued by this client
///
/// Wire names must match the daemon's exactly.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
  ListenerOpen,
  ListenerClose,
  ListenerList,
  StreamDial,
  StreamClose,
  StreamList,
}

impl Operation {
  pub fn wire_name(&self) -> &'static str {
    match self {
      Operation::ListenerOpen => "listener-open",
      Operation::ListenerClose => "listener-close",
      Operation::ListenerList => "listener-list",
      Operation::StreamDial => "stream-dial",
      Operation::StreamClose => "stream-close",
      Operation::StreamList => "stream-list",
    }
  }

  /// Path of the operation within the daemon's HTTP command tree
  pub fn command_path(&self) -> &'static str {
    match self {
      Operation::ListenerOpen => "p2p/listener/open",
      Operation::ListenerClose => "p2p/listener/close",
      Operation::ListenerList => "p2p/listener/ls",
      Operation::StreamDial => "p2p/stream/dial",
      Operation::StreamClose => "p2p/stream/close",
      Operation::StreamList => "p2p/stream/ls",
    }
  }
}

impl std::fmt::Display for Operation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.wire_name())
  }
}

/// A named operation with positional arguments and string-valued options
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
  operation: Operation,
  arguments: Vec<String>,
  options: BTreeMap<String, String>,
}

impl Request {
  pub fn new(operation: Operation) -> Self {
    Self {
      operation,
      arguments: Vec::new(),
      options: BTreeMap::new(),
    }
  }

  pub fn arg<S: Into<String>>(mut self, argument: S) -> Self {
    self.arguments.push(argument.into());
    self
  }

  pub fn option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
    self.options.insert(key.into(), value.into());
    self
  }

  /// Flags travel as the literal text `true` or `false`
  pub fn flag<K: Into<String>>(self, key: K, value: bool) -> Self {
    self.option(key, value.to_string())
  }

  pub fn operation(&self) -> Operation {
    self.operation
  }

  pub fn arguments(&self) -> &[String] {
    &self.arguments
  }

  pub fn options(&self) -> &BTreeMap<String, String> {
    &self.options
  }

  pub fn option_value(&self, key: &str) -> Option<&str> {
    self.options.get(key).map(String::as_str)
  }
}

#[cfg(test)]
mod tests {
  use super::{Operation, Request};

  #[test]
  fn wire_names() {
    let names: Vec<_> = [
      Operation::ListenerOpen,
      Operation::ListenerClose,
      Operation::ListenerList,
      Operation::StreamDial,
      Operation::StreamClose,
      Operation::StreamList,
    ]
    .iter()
    .map(Operation::wire_name)
    .collect();
    assert_eq!(
      names,
      [
        "listener-open",
        "listener-close",
        "listener-list",
        "stream-dial",
        "stream-close",
        "stream-list"
      ]
    );
  }

  #[test]
  fn flags_render_as_literal_text() {
    let req = Request::new(Operation::StreamClose)
      .flag("all", true)
      .flag("headers", false);
    assert_eq!(req.option_value("all"), Some("true"));
    assert_eq!(req.option_value("headers"), Some("false"));
    assert!(req.arguments().is_empty());
  }

  #[test]
  fn arguments_keep_insertion_order() {
    let req = Request::new(Operation::StreamDial).arg("peer").arg("proto");
    assert_eq!(req.arguments(), ["peer", "proto"]);
    assert_eq!(req.operation(), Operation::StreamDial);
  }
}
