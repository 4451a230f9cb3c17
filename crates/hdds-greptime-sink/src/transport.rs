// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write paths for encoded Line Protocol batches.

use crate::config::GreptimeSetting;
use crate::error::{Result, SinkError};
use std::io::{self, Write};
use std::time::Duration;

/// Sends one encoded batch to the database.
pub trait Transport: Send + Sync {
    /// Write a newline-separated Line Protocol body.
    fn write(&self, body: &str) -> Result<()>;
}

/// Blocking HTTP transport for GreptimeDB's InfluxDB-compatible endpoint.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
    username: String,
    password: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a client for the configured endpoint.
    pub fn new(setting: &GreptimeSetting) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(setting.timeout)
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;
        Ok(Self::with_client(setting, client))
    }

    /// Use a caller-built client. The client's own timeout applies.
    pub fn with_client(setting: &GreptimeSetting, client: reqwest::blocking::Client) -> Self {
        Self {
            client,
            endpoint: setting.endpoint(),
            username: setting.username.clone(),
            password: setting.password.clone(),
            timeout: setting.timeout,
        }
    }

    /// Write endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for HttpTransport {
    fn write(&self, body: &str) -> Result<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body.to_string());
        if !self.username.is_empty() {
            request = request.basic_auth(&self.username, Some(&self.password));
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                SinkError::Timeout(self.timeout)
            } else {
                SinkError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Prints batches to stdout instead of sending them.
#[derive(Debug, Default)]
pub struct StdoutTransport;

impl Transport for StdoutTransport {
    fn write(&self, body: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", body)?;
        out.flush()?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Accept one connection, answer it with `response` and hand back the
    /// raw request.
    fn serve_once(response: &'static str) -> (u16, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];

            let header_end = loop {
                let n = stream.read(&mut chunk).expect("read");
                if n == 0 {
                    break request.len();
                }
                request.extend_from_slice(&chunk[..n]);
                if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while request.len() < header_end + length {
                let n = stream.read(&mut chunk).expect("read body");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }

            stream.write_all(response.as_bytes()).expect("respond");
            String::from_utf8_lossy(&request).into_owned()
        });
        (port, handle)
    }

    fn local_transport(port: u16, username: &str, password: &str) -> HttpTransport {
        let setting = GreptimeSetting {
            port,
            username: username.to_string(),
            password: password.to_string(),
            timeout: Duration::from_secs(5),
            ..Default::default()
        };
        let client = reqwest::blocking::Client::builder()
            .timeout(setting.timeout)
            .no_proxy()
            .build()
            .expect("client");
        HttpTransport::with_client(&setting, client)
    }

    #[test]
    fn test_http_transport_non_success_is_rejected() {
        let (port, server) = serve_once(
            "HTTP/1.1 400 Bad Request\r\nContent-Length: 3\r\nConnection: close\r\n\r\nbad",
        );
        let transport = local_transport(port, "u", "p");

        let body = "logs,node=n1 body=\"x\" 1";
        let err = transport.write(body).unwrap_err();
        match err {
            SinkError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }

        let request = server.join().expect("server thread");
        let lower = request.to_lowercase();
        assert!(
            lower.starts_with("post /v1/influxdb/api/v2/write?db=public&precision=ns http/1.1\r\n"),
            "request line: {}",
            request
        );
        // base64("u:p")
        assert!(lower.contains("\r\nauthorization: basic dtpw\r\n"), "{}", request);
        assert!(lower.contains("\r\ncontent-type: text/plain; charset=utf-8\r\n"));
        assert!(request.ends_with(body));
    }

    #[test]
    fn test_http_transport_success_without_credentials() {
        let (port, server) =
            serve_once("HTTP/1.1 204 No Content\r\nConnection: close\r\n\r\n");
        let transport = local_transport(port, "", "ignored");

        transport.write("logs body=\"ok\" 2").expect("accepted");

        let request = server.join().expect("server thread").to_lowercase();
        assert!(request.starts_with("post /v1/influxdb/api/v2/write?db=public&precision=ns "));
        assert!(!request.contains("authorization:"));
    }

    #[test]
    fn test_http_transport_endpoint() {
        let setting = GreptimeSetting {
            host: "greptime.local".to_string(),
            insecure: false,
            table: "ignored".to_string(),
            ..Default::default()
        };
        let transport = HttpTransport::new(&setting).expect("client");
        assert_eq!(
            transport.endpoint(),
            "https://greptime.local:4000/v1/influxdb/api/v2/write?db=public&precision=ns"
        );
    }

    #[test]
    fn test_http_transport_unreachable_host_errors() {
        let setting = GreptimeSetting {
            // Port 9 (discard) on localhost is closed in test environments
            port: 9,
            timeout: Duration::from_millis(500),
            ..Default::default()
        };
        let transport = HttpTransport::new(&setting).expect("client");
        let err = transport.write("logs body=\"x\" 1").unwrap_err();
        assert!(matches!(
            err,
            SinkError::Transport(_) | SinkError::Timeout(_)
        ));
    }
}
