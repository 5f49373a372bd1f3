//! Pass-through motor command envelope, opcode `'P'` (spec.md §3, §4.H).
//! Eight request bytes: `'P', arg_count+1, device_id, command_id, data0,
//! data1, data2, expected_response_length`.

pub const DEVICE_AZIMUTH_MOTOR: u8 = 16;
pub const DEVICE_ALTITUDE_MOTOR: u8 = 17;
pub const DEVICE_GPS: u8 = 176;
pub const DEVICE_RTC: u8 = 178;

const SLEW_VARIABLE_POSITIVE: u8 = 6;
const SLEW_VARIABLE_NEGATIVE: u8 = 7;

/// "GPS linked" status query, returning a single byte (0/1).
const GPS_IS_LINKED: u8 = 55;

/// "Get device version", returning two bytes (major, minor).
const GET_DEVICE_VERSION: u8 = 254;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassthroughCommand {
    pub device_id: u8,
    pub command_id: u8,
    pub data: [u8; 3],
    /// Informational per spec.md §9 ("ignored by most handlers").
    pub expected_response_len: u8,
}

impl PassthroughCommand {
    pub fn encode(self) -> [u8; 8] {
        [
            b'P',
            3,
            self.device_id,
            self.command_id,
            self.data[0],
            self.data[1],
            self.data[2],
            self.expected_response_len,
        ]
    }
}

/// Axis 0 -> azimuth/RA motor, axis 1 -> altitude/Dec motor (spec.md §4.H).
pub fn motor_device_for_axis(axis: u8) -> u8 {
    if axis == 0 {
        DEVICE_AZIMUTH_MOTOR
    } else {
        DEVICE_ALTITUDE_MOTOR
    }
}

/// Encode a variable-rate slew for one axis. Rate is carried in
/// quarter-arcseconds per second, clamped to 16 bits, big-endian. Sign
/// lives in the command byte (positive=6, negative=7).
pub fn slew_variable(axis: u8, rate_deg_per_s: f64) -> PassthroughCommand {
    let quarter_arcsec = (rate_deg_per_s.abs() * 3600.0 * 4.0).round();
    let magnitude = quarter_arcsec.clamp(0.0, u16::MAX as f64) as u16;
    let [hi, lo] = magnitude.to_be_bytes();
    PassthroughCommand {
        device_id: motor_device_for_axis(axis),
        command_id: if rate_deg_per_s < 0.0 {
            SLEW_VARIABLE_NEGATIVE
        } else {
            SLEW_VARIABLE_POSITIVE
        },
        data: [hi, lo, 0],
        expected_response_len: 0,
    }
}

/// Query whether the GPS accessory has a satellite lock.
pub fn gps_is_linked() -> PassthroughCommand {
    PassthroughCommand {
        device_id: DEVICE_GPS,
        command_id: GPS_IS_LINKED,
        data: [0, 0, 0],
        expected_response_len: 1,
    }
}

/// Query a device's own firmware version (distinct from the hand
/// controller's `get_version`, spec.md §4.H 'V').
pub fn device_version(device_id: u8) -> PassthroughCommand {
    PassthroughCommand {
        device_id,
        command_id: GET_DEVICE_VERSION,
        data: [0, 0, 0],
        expected_response_len: 2,
    }
}
