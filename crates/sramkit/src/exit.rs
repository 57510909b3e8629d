use std::fmt;
use std::io;

use sramkit_marshal::MarshalError;
use sramkit_protocol::ProtocolError;
use sramkit_store::StoreError;
use sramkit_transport::TransportError;

// Exit codes. Scripts rely on these staying stable.
pub const SUCCESS: i32 = 0;
pub const TRANSPORT_ERROR: i32 = 3;
pub const SELFTEST_FAILED: i32 = 30;
pub const CAPACITY_EXCEEDED: i32 = 40;
pub const PERMISSION_DENIED: i32 = 50;
pub const NOT_FOUND: i32 = 51;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => NOT_FOUND,
        io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof => DATA_INVALID,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    CliError::new(TRANSPORT_ERROR, format!("{context}: {err}"))
}

pub fn protocol_error(context: &str, err: ProtocolError) -> CliError {
    match err {
        ProtocolError::Transport(err) => transport_error(context, err),
        ProtocolError::InvalidCapacity { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn marshal_error(context: &str, err: MarshalError) -> CliError {
    match err {
        MarshalError::Protocol(err) => protocol_error(context, err),
        MarshalError::OutOfBounds { .. } => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn store_error(context: &str, err: StoreError) -> CliError {
    match err {
        StoreError::Marshal(err) => marshal_error(context, err),
        StoreError::OutOfSpace { .. } | StoreError::CapacityExceeded { .. } => {
            CliError::new(CAPACITY_EXCEEDED, format!("{context}: {err}"))
        }
        StoreError::SourceRead { source, .. } => io_error(context, source),
        StoreError::InvalidChunkSize | StoreError::EmptyAllocation => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
    }
}
