// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
//! Request-level building blocks shared by the listener and stream clients
//!
//! Addresses are multiaddrs, validated locally before anything leaves the process.
//! Requests are a named operation with positional arguments and string options;
//! how they reach the daemon is up to the [`gateway::RpcGateway`] in use.

pub mod address;
pub mod gateway;
pub mod request;
pub mod selector;

pub use address::{
  AddressCodec, AddressParseError, AddressValidator, InvalidAddress, MultiaddrCodec,
};
pub use request::{Operation, Request};
pub use selector::Selector;
