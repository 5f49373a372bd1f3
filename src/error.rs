//! Component C: the closed error taxonomy shared by every fallible operation
//! in the bridge. Errors are values — nothing in this crate panics or raises
//! across a component boundary; a fallible step returns `Result<T, Error>`
//! and the caller decides what to do with the `Err` side.

use std::fmt;

/// One of the fixed ASCOM Alpaca error kinds, plus the two kinds this
/// bridge adds for its own dispatcher (`Http`) and driver-specific faults
/// (`DriverCustom`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotImplemented,
    InvalidValue,
    ValueNotSet,
    NotConnected,
    Parked,
    Slaved,
    InvalidOperation,
    ActionNotImplemented,
    /// Driver-specific fault, code in `0x500..=0xFFF`.
    DriverCustom(u16),
    /// Dispatcher-level rejection that never reaches the envelope; carries
    /// the HTTP status code directly (404, 400, ...).
    Http(u16),
}

impl ErrorKind {
    /// The 16-bit ASCOM error code for this kind, or the raw HTTP status
    /// for `Http`. `Error::code` adds the `0x1000` offset for `Http` so the
    /// two numbering spaces never collide when both appear in logs.
    pub fn code(self) -> u32 {
        match self {
            ErrorKind::NotImplemented => 0x400,
            ErrorKind::InvalidValue => 0x401,
            ErrorKind::ValueNotSet => 0x402,
            ErrorKind::NotConnected => 0x407,
            ErrorKind::Parked => 0x408,
            ErrorKind::Slaved => 0x409,
            ErrorKind::InvalidOperation => 0x40B,
            ErrorKind::ActionNotImplemented => 0x40C,
            ErrorKind::DriverCustom(code) => code as u32,
            ErrorKind::Http(status) => 0x1000 + status as u32,
        }
    }

    fn canonical_message(self) -> &'static str {
        match self {
            ErrorKind::NotImplemented => "Not implemented",
            ErrorKind::InvalidValue => "Invalid value",
            ErrorKind::ValueNotSet => "Value not set",
            ErrorKind::NotConnected => "Not connected",
            ErrorKind::Parked => "Invalid while parked",
            ErrorKind::Slaved => "Invalid while slaved",
            ErrorKind::InvalidOperation => "Invalid operation",
            ErrorKind::ActionNotImplemented => "Action not implemented",
            ErrorKind::DriverCustom(_) => "Driver error",
            ErrorKind::Http(_) => "",
        }
    }

    /// `true` for the dispatcher-level kind that bypasses the envelope and
    /// is rendered as a bare HTTP status instead.
    pub fn is_http(self) -> bool {
        matches!(self, ErrorKind::Http(_))
    }
}

/// A value-type error: a kind plus a message. Two errors of the same kind
/// may carry different messages (e.g. `invalid_value` always carries the
/// field or range that was violated).
#[derive(Debug, Clone, thiserror::Error)]
#[error("{}: {message}", .kind.code())]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Error {
            kind,
            message: message.into(),
        }
    }

    /// An error with the kind's canonical message, no extra detail.
    pub fn canonical(kind: ErrorKind) -> Self {
        Error {
            message: kind.canonical_message().to_string(),
            kind,
        }
    }

    pub fn not_implemented() -> Self {
        Self::canonical(ErrorKind::NotImplemented)
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidValue, message)
    }

    pub fn value_not_set(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueNotSet, message)
    }

    pub fn not_connected() -> Self {
        Self::canonical(ErrorKind::NotConnected)
    }

    pub fn parked() -> Self {
        Self::canonical(ErrorKind::Parked)
    }

    pub fn slaved() -> Self {
        Self::canonical(ErrorKind::Slaved)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOperation, message)
    }

    pub fn action_not_implemented() -> Self {
        Self::canonical(ErrorKind::ActionNotImplemented)
    }

    pub fn driver_custom(code: u16, message: impl Into<String>) -> Self {
        assert!((0x500..=0xFFF).contains(&code), "driver code {code:#x} out of range");
        Self::new(ErrorKind::DriverCustom(code), message)
    }

    /// A field-level parsing failure, reported as a driver-custom error
    /// per spec.md §7 ("Argument parsing errors ... surface as
    /// `driver_custom` errors").
    pub fn field_not_found(field: &str) -> Self {
        Self::new(ErrorKind::DriverCustom(0x500), format!("Field '{field}' not found"))
    }

    pub fn field_invalid(field: &str) -> Self {
        Self::new(ErrorKind::DriverCustom(0x501), format!("Invalid '{field}' field"))
    }

    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Http(status), message)
    }

    pub fn http_status(self) -> Option<u16> {
        match self.kind {
            ErrorKind::Http(status) => Some(status),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.code())
    }
}

/// Component A's `Result<T, E>` specialized to this crate's error type.
/// `map`/`flat_map`/`match` are the standard library's `Result::map`,
/// `Result::and_then`, and a plain `match` expression — reimplementing a
/// second sum type with the same two variants would just be a worse
/// `std::result::Result`. `join` and `flatten`, which the standard library
/// has no equivalent for, live in [`crate::join`].
pub type AlpacaResult<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_passes_through_err() {
        let ok: AlpacaResult<i32> = Ok(2);
        assert_eq!(ok.map(|x| x * 2), Ok(4));

        let err: AlpacaResult<i32> = Err(Error::not_connected());
        assert_eq!(err.clone().map(|x| x * 2).unwrap_err().kind, ErrorKind::NotConnected);
    }

    #[test]
    fn flat_map_short_circuits() {
        let err: AlpacaResult<i32> = Err(Error::invalid_value("bad"));
        let result = err.and_then(|x| Ok::<_, Error>(x + 1));
        assert_eq!(result.unwrap_err().kind, ErrorKind::InvalidValue);
    }

    #[test]
    fn codes_match_spec() {
        assert_eq!(ErrorKind::NotImplemented.code(), 0x400);
        assert_eq!(ErrorKind::InvalidValue.code(), 0x401);
        assert_eq!(ErrorKind::ValueNotSet.code(), 0x402);
        assert_eq!(ErrorKind::NotConnected.code(), 0x407);
        assert_eq!(ErrorKind::Parked.code(), 0x408);
        assert_eq!(ErrorKind::Slaved.code(), 0x409);
        assert_eq!(ErrorKind::InvalidOperation.code(), 0x40B);
        assert_eq!(ErrorKind::ActionNotImplemented.code(), 0x40C);
        assert_eq!(ErrorKind::Http(404).code(), 0x1000 + 404);
    }
}
