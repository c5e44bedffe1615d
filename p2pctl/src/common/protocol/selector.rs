// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0

use super::request::{Operation, Request};

/// Option key carrying the bulk-close flag
pub const CLOSE_ALL_OPTION: &str = "all";

/// Target of a close operation
///
/// `Single` and `All` cover the two coherent intents. `Raw` forwards any other
/// combination of target and bulk flag exactly as given; what the daemon does
/// with, say, a named target alongside `all=true` is defined by the daemon alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selector {
  Single(String),
  All,
  Raw { target: Option<String>, all: bool },
}

impl Selector {
  pub fn single<S: Into<String>>(id: S) -> Self {
    Selector::Single(id.into())
  }

  /// Maps the "empty identifier means no target" convention onto a selector
  ///
  /// Coherent pairs become `Single` or `All`; the rest pass through as `Raw`.
  pub fn from_parts(id: &str, close_all: bool) -> Self {
    match (id.is_empty(), close_all) {
      (false, false) => Selector::Single(id.to_owned()),
      (true, true) => Selector::All,
      (true, false) => Selector::Raw {
        target: None,
        all: false,
      },
      (false, true) => Selector::Raw {
        target: Some(id.to_owned()),
        all: true,
      },
    }
  }

  pub fn target(&self) -> Option<&str> {
    match self {
      Selector::Single(id) => Some(id.as_str()),
      Selector::All => None,
      Selector::Raw { target, .. } => target.as_deref(),
    }
  }

  pub fn close_all(&self) -> bool {
    match self {
      Selector::Single(_) => false,
      Selector::All => true,
      Selector::Raw { all, .. } => *all,
    }
  }

  /// Builds the close request for `operation`; the bulk flag is always sent
  ///
  /// An empty identifier is no target at all, and is never sent as an argument.
  pub fn into_close_request(self, operation: Operation) -> Request {
    let close_all = self.close_all();
    let request = match self {
      Selector::Single(id)
      | Selector::Raw {
        target: Some(id), ..
      } if !id.is_empty() => Request::new(operation).arg(id),
      _ => Request::new(operation),
    };
    request.flag(CLOSE_ALL_OPTION, close_all)
  }
}

impl std::fmt::Display for Selector {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Selector::Single(id) => write!(f, "{}", id),
      Selector::All => f.write_str("<all>"),
      Selector::Raw { target, all } => write!(
        f,
        "{}(all={})",
        target.as_deref().unwrap_or("<none>"),
        all
      ),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::{Selector, CLOSE_ALL_OPTION};
  use crate::common::protocol::Operation;

  #[test]
  fn from_parts_coherent_pairs() {
    assert_eq!(Selector::from_parts("p1", false), Selector::single("p1"));
    assert_eq!(Selector::from_parts("", true), Selector::All);
  }

  #[test]
  fn from_parts_passes_through_other_pairs() {
    assert_eq!(
      Selector::from_parts("", false),
      Selector::Raw {
        target: None,
        all: false
      }
    );
    assert_eq!(
      Selector::from_parts("p1", true),
      Selector::Raw {
        target: Some("p1".into()),
        all: true
      }
    );
  }

  #[test]
  fn empty_target_requests_differ_only_in_bulk_flag() {
    let none = Selector::from_parts("", false).into_close_request(Operation::ListenerClose);
    let all = Selector::from_parts("", true).into_close_request(Operation::ListenerClose);
    assert_eq!(none.arguments(), all.arguments());
    assert!(none.arguments().is_empty());
    assert_eq!(none.option_value(CLOSE_ALL_OPTION), Some("false"));
    assert_eq!(all.option_value(CLOSE_ALL_OPTION), Some("true"));
    assert_eq!(none.options().len(), 1);
    assert_eq!(all.options().len(), 1);
  }

  #[test]
  fn single_target_with_bulk_flag_is_forwarded_verbatim() {
    let req = Selector::from_parts("p1", true).into_close_request(Operation::StreamClose);
    assert_eq!(req.arguments(), ["p1"]);
    assert_eq!(req.option_value(CLOSE_ALL_OPTION), Some("true"));
  }

  #[test]
  fn empty_identifiers_are_never_sent() {
    let single = Selector::single("").into_close_request(Operation::ListenerClose);
    assert!(single.arguments().is_empty());
    assert_eq!(single.option_value(CLOSE_ALL_OPTION), Some("false"));

    let raw = Selector::Raw {
      target: Some(String::new()),
      all: true,
    }
    .into_close_request(Operation::StreamClose);
    assert!(raw.arguments().is_empty());
    assert_eq!(raw.option_value(CLOSE_ALL_OPTION), Some("true"));
  }

  #[test]
  fn accessors() {
    let s = Selector::single("h");
    assert_eq!(s.target(), Some("h"));
    assert!(!s.close_all());
    assert_eq!(Selector::All.target(), None);
    assert!(Selector::All.close_all());
  }
}
