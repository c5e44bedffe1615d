// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license OR Apache 2.0
//! [`RpcGateway`] over the daemon's HTTP command API
//!
//! Each operation is a `POST` to `/api/v0/<command path>`, with positional
//! arguments as repeated `arg` query parameters and options as named ones.

use std::{str::FromStr, time::Duration};

use futures::{
  future::{BoxFuture, FutureExt},
  TryStreamExt,
};
use multiaddr::{Multiaddr, Protocol};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio_util::io::StreamReader;
use url::Url;

use super::{GatewayError, RemoteError, RpcGateway, RpcReply, TransportError};
use crate::common::protocol::request::{Operation, Request};

pub const DEFAULT_API_ENDPOINT: &str = "http://127.0.0.1:5001";
const API_PREFIX: &str = "api/v0";

#[derive(Debug, thiserror::Error)]
pub enum ApiEndpointError {
  #[error("Invalid API URL: {0}")]
  Url(#[from] url::ParseError),
  #[error("Invalid API multiaddr: {0}")]
  Multiaddr(#[from] multiaddr::Error),
  #[error("API multiaddr must name a host and a TCP port: {0}")]
  UnsupportedMultiaddr(String),
  #[error("API URL scheme must be http or https, got {0:?}")]
  UnsupportedScheme(String),
}

/// Base location of the daemon's HTTP API
///
/// Parses from a URL (`http://127.0.0.1:5001`), a bare `host:port`, or a
/// multiaddr such as `/ip4/127.0.0.1/tcp/5001` or `/dns4/node.local/tcp/443/https`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiEndpoint {
  base: Url,
}

impl ApiEndpoint {
  pub fn command_url(&self, operation: Operation) -> String {
    format!(
      "{}/{}/{}",
      self.base.as_str().trim_end_matches('/'),
      API_PREFIX,
      operation.command_path()
    )
  }

  fn from_multiaddr(s: &str) -> Result<Url, ApiEndpointError> {
    let addr = Multiaddr::from_str(s)?;
    let mut host = None;
    let mut port = None;
    let mut scheme = "http";
    for protocol in addr.iter() {
      match protocol {
        Protocol::Ip4(ip) => host = Some(ip.to_string()),
        Protocol::Ip6(ip) => host = Some(format!("[{}]", ip)),
        Protocol::Dns(name) | Protocol::Dns4(name) | Protocol::Dns6(name) => {
          host = Some(name.to_string())
        }
        Protocol::Tcp(p) => port = Some(p),
        Protocol::Http => scheme = "http",
        Protocol::Https | Protocol::Tls => scheme = "https",
        _ => return Err(ApiEndpointError::UnsupportedMultiaddr(s.to_owned())),
      }
    }
    match (host, port) {
      (Some(host), Some(port)) => Ok(Url::parse(&format!("{}://{}:{}", scheme, host, port))?),
      _ => Err(ApiEndpointError::UnsupportedMultiaddr(s.to_owned())),
    }
  }
}

impl FromStr for ApiEndpoint {
  type Err = ApiEndpointError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    let base = if s.starts_with('/') {
      Self::from_multiaddr(s)?
    } else if s.contains("://") {
      Url::parse(s)?
    } else {
      Url::parse(&format!("http://{}", s))?
    };
    match base.scheme() {
      "http" | "https" => Ok(Self { base }),
      other => Err(ApiEndpointError::UnsupportedScheme(other.to_owned())),
    }
  }
}

impl Default for ApiEndpoint {
  fn default() -> Self {
    Self {
      base: Url::parse(DEFAULT_API_ENDPOINT).expect("Default API endpoint must be a valid URL"),
    }
  }
}

impl std::fmt::Display for ApiEndpoint {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.base.as_str().trim_end_matches('/'))
  }
}

#[derive(Clone, Debug, Default)]
pub struct HttpGatewayConfig {
  pub endpoint: ApiEndpoint,
  /// Applied by the HTTP client to each whole request, independent of any per-call deadline
  pub timeout: Option<Duration>,
}

pub struct HttpGateway {
  client: reqwest::Client,
  endpoint: ApiEndpoint,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
  message: String,
  #[serde(default)]
  code: Option<i64>,
}

impl HttpGateway {
  pub fn new(config: HttpGatewayConfig) -> Result<Self, TransportError> {
    let mut builder = reqwest::Client::builder().user_agent(concat!(
      env!("CARGO_PKG_NAME"),
      "/",
      env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = config.timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder
      .build()
      .map_err(|e| TransportError::Connection(Box::new(e)))?;
    Ok(Self {
      client,
      endpoint: config.endpoint,
    })
  }

  pub fn endpoint(&self) -> &ApiEndpoint {
    &self.endpoint
  }
}

fn query_pairs(request: &Request) -> Vec<(&str, &str)> {
  let mut pairs: Vec<(&str, &str)> = request
    .arguments()
    .iter()
    .map(|arg| ("arg", arg.as_str()))
    .collect();
  pairs.extend(
    request
      .options()
      .iter()
      .map(|(k, v)| (k.as_str(), v.as_str())),
  );
  pairs.push(("encoding", "json"));
  pairs.push(("stream-channels", "true"));
  pairs
}

fn remote_error_from_body(status: StatusCode, body: &[u8]) -> RemoteError {
  match serde_json::from_slice::<ErrorBody>(body) {
    Ok(ErrorBody {
      message,
      code: Some(code),
    }) => RemoteError::new(message).with_code(code),
    Ok(ErrorBody { message, code: None }) => RemoteError::new(message),
    Err(_) => {
      let text = String::from_utf8_lossy(body);
      let text = text.trim();
      if text.is_empty() {
        RemoteError::new(status.to_string())
      } else {
        RemoteError::new(text)
      }
    }
  }
}

fn transport_error(e: reqwest::Error) -> TransportError {
  if e.is_timeout() {
    TransportError::DeadlineExceeded
  } else {
    TransportError::Connection(Box::new(e))
  }
}

impl RpcGateway for HttpGateway {
  fn send(&self, request: Request) -> BoxFuture<'static, Result<RpcReply, GatewayError>> {
    let url = self.endpoint.command_url(request.operation());
    tracing::trace!(
      %url,
      arguments = ?request.arguments(),
      options = ?request.options(),
      "posting command"
    );
    let pending = self.client.post(url).query(&query_pairs(&request)).send();
    async move {
      let response = pending.await.map_err(transport_error)?;
      let status = response.status();
      if !status.is_success() {
        let body = response.bytes().await.map_err(transport_error)?;
        return Err(GatewayError::Remote(remote_error_from_body(status, &body)));
      }
      let body = response
        .bytes_stream()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
      Ok(RpcReply::new(StreamReader::new(Box::pin(body))))
    }
    .boxed()
  }
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use reqwest::StatusCode;
  use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
  };

  use super::{
    query_pairs, remote_error_from_body, ApiEndpoint, ApiEndpointError, HttpGateway,
    HttpGatewayConfig,
  };
  use crate::common::protocol::{
    gateway::{GatewayError, RpcGateway, TransportError},
    Operation, Request,
  };

  /// Answers exactly one HTTP request on loopback, yielding the request head it received
  async fn serve_once(
    status: &'static str,
    body: &'static str,
  ) -> (ApiEndpoint, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = listener
      .local_addr()
      .unwrap()
      .to_string()
      .parse()
      .unwrap();
    let server = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut head = Vec::new();
      let mut chunk = [0u8; 1024];
      while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client hung up before finishing the request head");
        head.extend_from_slice(&chunk[..n]);
      }
      let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
      );
      socket.write_all(response.as_bytes()).await.unwrap();
      socket.shutdown().await.unwrap();
      String::from_utf8(head).unwrap()
    });
    (endpoint, server)
  }

  fn gateway_for(endpoint: ApiEndpoint) -> HttpGateway {
    HttpGateway::new(HttpGatewayConfig {
      endpoint,
      timeout: Some(Duration::from_secs(10)),
    })
    .unwrap()
  }

  #[test]
  fn endpoint_from_url() {
    let e: ApiEndpoint = "http://localhost:5001/".parse().unwrap();
    assert_eq!(e.to_string(), "http://localhost:5001");
    assert_eq!(
      e.command_url(Operation::ListenerOpen),
      "http://localhost:5001/api/v0/p2p/listener/open"
    );
  }

  #[test]
  fn endpoint_from_host_port() {
    let e: ApiEndpoint = "127.0.0.1:5001".parse().unwrap();
    assert_eq!(
      e.command_url(Operation::StreamList),
      "http://127.0.0.1:5001/api/v0/p2p/stream/ls"
    );
  }

  #[test]
  fn endpoint_from_multiaddr() {
    let e: ApiEndpoint = "/ip4/127.0.0.1/tcp/5001".parse().unwrap();
    assert_eq!(e.to_string(), "http://127.0.0.1:5001");
    let e: ApiEndpoint = "/dns4/node.example/tcp/443/https".parse().unwrap();
    assert_eq!(e.to_string(), "https://node.example");
    let e: ApiEndpoint = "/ip6/::1/tcp/5001".parse().unwrap();
    assert_eq!(e.to_string(), "http://[::1]:5001");
  }

  #[test]
  fn endpoint_rejects_unusable_multiaddr() {
    assert!(matches!(
      "/ip4/127.0.0.1".parse::<ApiEndpoint>(),
      Err(ApiEndpointError::UnsupportedMultiaddr(_))
    ));
    assert!(matches!(
      "/ip4/127.0.0.1/udp/5001".parse::<ApiEndpoint>(),
      Err(ApiEndpointError::UnsupportedMultiaddr(_))
    ));
  }

  #[test]
  fn endpoint_rejects_other_schemes() {
    assert!(matches!(
      "ftp://127.0.0.1:5001".parse::<ApiEndpoint>(),
      Err(ApiEndpointError::UnsupportedScheme(s)) if s == "ftp"
    ));
  }

  #[test]
  fn default_endpoint() {
    assert_eq!(ApiEndpoint::default().to_string(), "http://127.0.0.1:5001");
  }

  #[test]
  fn gateway_keeps_configured_endpoint() {
    let gateway = HttpGateway::new(HttpGatewayConfig {
      endpoint: "/ip4/10.1.2.3/tcp/5001".parse().unwrap(),
      timeout: Some(Duration::from_secs(3)),
    })
    .unwrap();
    assert_eq!(gateway.endpoint().to_string(), "http://10.1.2.3:5001");
  }

  #[test]
  fn query_carries_args_in_order_then_options() {
    let req = Request::new(Operation::StreamDial)
      .arg("QmPeer")
      .arg("/x/echo")
      .flag("all", false);
    let pairs = query_pairs(&req);
    assert_eq!(
      pairs,
      vec![
        ("arg", "QmPeer"),
        ("arg", "/x/echo"),
        ("all", "false"),
        ("encoding", "json"),
        ("stream-channels", "true"),
      ]
    );
  }

  #[test]
  fn error_body_decoded() {
    let e = remote_error_from_body(
      StatusCode::INTERNAL_SERVER_ERROR,
      br#"{"Message":"listener not found","Code":0,"Type":"error"}"#,
    );
    assert_eq!(e.message(), "listener not found");
    assert_eq!(e.code(), Some(0));
  }

  #[test]
  fn error_body_falls_back_to_text() {
    let e = remote_error_from_body(StatusCode::NOT_FOUND, b"404 page not found\n");
    assert_eq!(e.message(), "404 page not found");
    let e = remote_error_from_body(StatusCode::BAD_GATEWAY, b"");
    assert_eq!(e.message(), "502 Bad Gateway");
  }

  #[tokio::test]
  async fn send_posts_command_and_streams_reply() {
    let body = r#"{"Streams":[]}"#;
    let (endpoint, server) = serve_once("200 OK", body).await;
    let gateway = gateway_for(endpoint);
    let reply = gateway
      .send(Request::new(Operation::StreamList).flag("headers", true))
      .await
      .unwrap();
    assert_eq!(reply.into_bytes().await.unwrap(), body.as_bytes());
    let head = server.await.unwrap();
    let request_line = head.lines().next().unwrap_or_default();
    assert_eq!(
      request_line,
      "POST /api/v0/p2p/stream/ls?headers=true&encoding=json&stream-channels=true HTTP/1.1"
    );
  }

  #[tokio::test]
  async fn send_decodes_error_status_into_remote_error() {
    let (endpoint, server) =
      serve_once("500 Internal Server Error", r#"{"Message":"not found","Code":0}"#).await;
    let request = Request::new(Operation::ListenerClose)
      .arg("/x/echo")
      .flag("all", false);
    let err = gateway_for(endpoint).send(request).await.unwrap_err();
    match err {
      GatewayError::Remote(e) => {
        assert_eq!(e.message(), "not found");
        assert_eq!(e.code(), Some(0));
      }
      other => panic!("expected a remote error, got {:?}", other),
    }
    let head = server.await.unwrap();
    assert!(head.starts_with("POST /api/v0/p2p/listener/close?arg=%2Fx%2Fecho&all=false&"));
  }

  #[tokio::test]
  async fn send_to_closed_port_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint: ApiEndpoint = listener.local_addr().unwrap().to_string().parse().unwrap();
    drop(listener);
    let err = gateway_for(endpoint)
      .send(Request::new(Operation::ListenerList))
      .await
      .unwrap_err();
    assert!(
      matches!(err, GatewayError::Transport(TransportError::Connection(_))),
      "expected a connection error, got {:?}",
      err
    );
  }
}
