//! Client side of the daemon socket: one JSON object per line each way.
//!
//! ```text
//! → {"cmd":"status"}
//! → {"cmd":"publish","tenant":"vendor"}
//! → {"cmd":"stop"}
//! ← {"ok":true,"data":{...}}
//! ← {"ok":false,"error":"..."}
//! ```

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{io_err, DaemonError};
use crate::paths::socket_path;

pub const CMD_STATUS: &str = "status";
pub const CMD_PUBLISH: &str = "publish";
pub const CMD_STOP: &str = "stop";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonRequest {
    pub cmd: String,
    /// Restrict `publish` to one tenant's watch entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
}

impl DaemonRequest {
    pub fn new(cmd: &str) -> Self {
        Self {
            cmd: cmd.to_string(),
            tenant: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DaemonResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(message.into()),
        }
    }

    fn into_data(self) -> Result<Value, DaemonError> {
        if self.ok {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(DaemonError::Protocol(
                self.error
                    .unwrap_or_else(|| "unknown daemon error".to_string()),
            ))
        }
    }
}

/// Send one request to the daemon socket and read one response line.
pub fn send_request(home: &Path, request: &DaemonRequest) -> Result<DaemonResponse, DaemonError> {
    let socket = socket_path(home);
    if !socket.exists() {
        return Err(DaemonError::DaemonNotRunning { socket });
    }

    let mut stream = UnixStream::connect(&socket).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound
        | std::io::ErrorKind::ConnectionRefused
        | std::io::ErrorKind::ConnectionReset => DaemonError::DaemonNotRunning {
            socket: socket.clone(),
        },
        _ => io_err(&socket, err),
    })?;

    let mut payload = serde_json::to_string(request)?;
    payload.push('\n');
    stream
        .write_all(payload.as_bytes())
        .and_then(|()| stream.flush())
        .map_err(|e| io_err(&socket, e))?;

    let mut line = String::new();
    let read = BufReader::new(stream)
        .read_line(&mut line)
        .map_err(|e| io_err(&socket, e))?;
    if read == 0 {
        return Err(DaemonError::Protocol(
            "daemon closed connection before responding".to_string(),
        ));
    }

    Ok(serde_json::from_str(line.trim_end())?)
}

/// Query status, retrying briefly while a just-started daemon binds its socket.
pub fn request_status(home: &Path) -> Result<Value, DaemonError> {
    const ATTEMPTS: usize = 5;
    let request = DaemonRequest::new(CMD_STATUS);

    let mut attempt = 0;
    loop {
        attempt += 1;
        match send_request(home, &request) {
            Ok(response) => return response.into_data(),
            Err(DaemonError::DaemonNotRunning { .. }) if attempt < ATTEMPTS => {
                sleep(Duration::from_millis(100));
            }
            Err(err) => return Err(err),
        }
    }
}

pub fn request_stop(home: &Path) -> Result<(), DaemonError> {
    send_request(home, &DaemonRequest::new(CMD_STOP))?
        .into_data()
        .map(|_| ())
}

/// Ask the daemon to publish every watched draft, or only `tenant`'s.
pub fn request_publish(home: &Path, tenant: Option<String>) -> Result<Value, DaemonError> {
    let request = DaemonRequest {
        tenant,
        ..DaemonRequest::new(CMD_PUBLISH)
    };
    send_request(home, &request)?.into_data()
}
