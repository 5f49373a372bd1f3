//! Component D: the connection flag and precondition predicates shared by
//! every device-type resource, expressed as the result algebra.

use crate::error::{AlpacaResult, Error};
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared connection flag plus the precondition checks every gated
/// operation composes through [`crate::join`].
#[derive(Debug, Default)]
pub struct DeviceBase {
    connected: AtomicBool,
}

impl DeviceBase {
    pub fn new() -> Self {
        DeviceBase {
            connected: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub fn check_connected(&self) -> AlpacaResult<()> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(Error::not_connected())
        }
    }

    /// `flat_map`s `pred`; a `false` inner value becomes `not_implemented`
    /// so a capability check that itself depends on a fallible read can
    /// still compose through `join`.
    pub fn check_flag(&self, pred: AlpacaResult<bool>) -> AlpacaResult<()> {
        pred.and_then(|ok| if ok { Ok(()) } else { Err(Error::not_implemented()) })
    }

    pub fn check_value(&self, predicate: bool) -> AlpacaResult<()> {
        if predicate {
            Ok(())
        } else {
            Err(Error::invalid_value("value out of range"))
        }
    }

    pub fn check_set(&self, predicate: bool) -> AlpacaResult<()> {
        if predicate {
            Ok(())
        } else {
            Err(Error::value_not_set("value has not been set"))
        }
    }

    pub fn check_op(&self, predicate: bool) -> AlpacaResult<()> {
        if predicate {
            Ok(())
        } else {
            Err(Error::invalid_operation("operation rejected by driver"))
        }
    }

    /// Idempotent: setting `true` while already connected (or `false`
    /// while already disconnected) is a no-op (spec.md §8 "Idempotent
    /// connect").
    pub fn set_connected(&self, value: bool) -> AlpacaResult<()> {
        self.connected.store(value, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_disconnected() {
        let device = DeviceBase::new();
        assert!(!device.is_connected());
        assert!(device.check_connected().is_err());
    }

    #[test]
    fn set_connected_is_idempotent() {
        let device = DeviceBase::new();
        device.set_connected(true).unwrap();
        device.set_connected(true).unwrap();
        assert!(device.is_connected());
        device.set_connected(false).unwrap();
        device.set_connected(false).unwrap();
        assert!(!device.is_connected());
    }

    #[test]
    fn check_flag_maps_false_to_not_implemented() {
        let device = DeviceBase::new();
        let err = device.check_flag(Ok(false)).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NotImplemented);
        assert!(device.check_flag(Ok(true)).is_ok());
    }

    #[test]
    fn check_flag_propagates_err() {
        let device = DeviceBase::new();
        let err = device.check_flag(Err(Error::not_connected())).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::NotConnected);
    }

    #[test]
    fn value_set_and_op_checks_map_to_distinct_kinds() {
        let device = DeviceBase::new();
        assert_eq!(device.check_value(false).unwrap_err().kind, crate::error::ErrorKind::InvalidValue);
        assert_eq!(device.check_set(false).unwrap_err().kind, crate::error::ErrorKind::ValueNotSet);
        assert_eq!(device.check_op(false).unwrap_err().kind, crate::error::ErrorKind::InvalidOperation);
    }
}
