//! Component I: a blocking half-duplex transport over a real serial port.
//! One in-flight transaction at a time; callers (the driver, under the
//! per-device lock — see spec.md §5) are responsible for not overlapping
//! calls.

use crate::error::{AlpacaResult, Error};
use crate::nexstar::transport::Transport;
use serialport::SerialPort;
use std::time::Duration;
use tracing::debug;

/// Per-byte inter-character timeout (spec.md §4.I: "VMIN=0, VTIME=5").
const BYTE_TIMEOUT: Duration = Duration::from_millis(500);

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    pub fn open(path: &str, baud: u32) -> AlpacaResult<SerialTransport> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(BYTE_TIMEOUT)
            .open()
            .map_err(|e| Error::invalid_operation(format!("failed to open {path}: {e}")))?;
        Ok(SerialTransport { port })
    }
}

impl Transport for SerialTransport {
    fn transact(&mut self, request: &[u8], expected_response_len: usize) -> AlpacaResult<Vec<u8>> {
        debug!(bytes = request.len(), "nexstar write");
        self.port
            .write_all(request)
            .map_err(|e| Error::invalid_operation(format!("serial write failed: {e}")))?;

        let mut response = Vec::with_capacity(expected_response_len);
        let mut chunk = [0u8; 32];
        while response.len() < expected_response_len {
            match self.port.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => response.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                Err(e) => return Err(Error::invalid_operation(format!("serial read failed: {e}"))),
            }
        }
        debug!(bytes = response.len(), "nexstar read");
        Ok(response)
    }
}
