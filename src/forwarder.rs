//! Serial-to-HTTP bridge.
//!
//! Reads line-delimited JSON frames from the sensor's serial device (or stdin)
//! and POSTs each one to the ingestion endpoint. Every failure is logged and
//! the loop moves on to the next line. Only a read error on the source itself
//! or end of input stops the loop.

use std::time::Duration;

use log::{debug, error, info, warn};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_serial::SerialPortBuilderExt;

use crate::config::ForwarderConfig;

pub const STDIN_SOURCE: &str = "-";

#[derive(Debug, Error)]
pub enum ForwarderError {
    #[error("failed to open serial port {path}: {source}")]
    Source {
        path: String,
        #[source]
        source: tokio_serial::Error,
    },
    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server rejected frame with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// 一次运行的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwardStats {
    pub forwarded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// 解析一行数据；空行、非 JSON、非对象或空对象返回 None
pub fn parse_frame(line: &str) -> Option<Value> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map)),
        Ok(other) => {
            warn!("Ignoring frame that is not a JSON object: {}", other);
            None
        }
        Err(e) => {
            warn!("Failed to parse data: {} - Error: {}", line, e);
            None
        }
    }
}

pub struct Forwarder {
    client: reqwest::Client,
    endpoint: String,
    pause: Duration,
}

impl Forwarder {
    pub fn new(config: &ForwarderConfig) -> Result<Self, ForwarderError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            pause: config.pause(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn send_frame(&self, frame: &Value) -> Result<(), ForwarderError> {
        let response = self.client.post(&self.endpoint).json(frame).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ForwarderError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    /// 逐行转发直到输入结束
    pub async fn forward_lines<R>(&self, reader: R) -> Result<ForwardStats, ForwarderError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut stats = ForwardStats::default();
        let mut reader = reader;
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }

            // 连接时串口上常有乱码
            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!("Discarding line that is not valid UTF-8: {}", e);
                    stats.skipped += 1;
                    continue;
                }
            };
            debug!("Received from device: {}", line.trim());

            let Some(frame) = parse_frame(line) else {
                stats.skipped += 1;
                continue;
            };

            match self.send_frame(&frame).await {
                Ok(()) => {
                    info!("Data sent successfully: {}", frame);
                    stats.forwarded += 1;
                }
                Err(e) => {
                    error!("Failed to send data: {}", e);
                    stats.failed += 1;
                }
            }

            // 每转发一帧后暂停
            if !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
        }

        Ok(stats)
    }
}

fn open_serial(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream, ForwarderError> {
    tokio_serial::new(path, baud_rate)
        .open_native_async()
        .map_err(|source| ForwarderError::Source {
            path: path.to_string(),
            source,
        })
}

/// 打开配置的数据源并一直转发到 EOF
pub async fn run_forwarder(config: &ForwarderConfig) -> Result<ForwardStats, ForwarderError> {
    let forwarder = Forwarder::new(config)?;
    info!("Forwarding frames from {} to {}", config.source, forwarder.endpoint());

    let stats = if config.source == STDIN_SOURCE {
        forwarder.forward_lines(BufReader::new(tokio::io::stdin())).await?
    } else {
        let device = open_serial(&config.source, config.baud_rate)?;
        info!("Serial port {} opened at {} baud", config.source, config.baud_rate);
        forwarder.forward_lines(BufReader::new(device)).await?
    };

    info!(
        "Source closed: {} forwarded, {} failed, {} skipped",
        stats.forwarded, stats.failed, stats.skipped
    );
    Ok(stats)
}
