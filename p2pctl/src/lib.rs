// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
//! Client for the listener and stream control surface of a peer-to-peer daemon
//!
//! Listeners forward inbound peer connections for a protocol to a local address;
//! streams are outbound connections dialed to a peer's listener. Every call is a
//! single round trip through an [`RpcGateway`](common::protocol::gateway::RpcGateway),
//! and nothing is cached between calls.

pub mod common;
pub mod p2p;
pub mod util;

pub use p2p::{ListenerRegistry, P2pClient, P2pError, StreamManager};
