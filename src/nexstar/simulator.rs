//! Component J: a deterministic, pure in-memory implementation of the wire
//! protocol. Used by `--conform` and by every test in this crate that
//! needs a mount without real hardware.

use crate::nexstar::angle::{self, normalize_declination};
use crate::nexstar::codec::TrackingMode;
use crate::nexstar::location::Location;
use crate::nexstar::transport::Transport;
use crate::nexstar::utc::RtcPayload;
use crate::error::{AlpacaResult, Error};
use chrono::{DateTime, Utc};
use std::time::Instant;

/// The model code this simulator reports to `m` — Advanced GT, an
/// arbitrary but fixed choice (see `driver::model` for the full table).
const SIMULATED_MODEL_CODE: u8 = 6;
const SIMULATED_FIRMWARE: (u8, u8) = (4, 21);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MotionState {
    Idle,
    Slewing,
    Moving,
}

pub struct SimulatorTransport {
    current_ra_deg: f64,
    current_dec_deg: f64,
    target_ra_deg: f64,
    target_dec_deg: f64,
    site_latitude_deg: f64,
    site_longitude_deg: f64,
    tracking_mode: TrackingMode,
    slew_rate: [f64; 2],
    state: MotionState,
    last_step: Instant,
    stored_utc: DateTime<Utc>,
    utc_set_at: Instant,
}

impl SimulatorTransport {
    pub fn new() -> Self {
        let now = Instant::now();
        SimulatorTransport {
            current_ra_deg: 0.0,
            current_dec_deg: 0.0,
            target_ra_deg: 0.0,
            target_dec_deg: 0.0,
            site_latitude_deg: 0.0,
            site_longitude_deg: 0.0,
            tracking_mode: TrackingMode::Off,
            slew_rate: [0.0, 0.0],
            state: MotionState::Idle,
            last_step: now,
            stored_utc: Utc::now(),
            utc_set_at: now,
        }
    }

    pub fn is_slewing(&self) -> bool {
        self.state == MotionState::Slewing
    }

    fn step(&mut self, now: Instant) {
        let dt = now.duration_since(self.last_step).as_secs_f64();
        match self.state {
            MotionState::Idle => {}
            MotionState::Slewing => {
                let (ra, ra_snapped) = step_axis(self.current_ra_deg, self.target_ra_deg, dt);
                let (dec, dec_snapped) = step_axis(self.current_dec_deg, self.target_dec_deg, dt);
                self.current_ra_deg = ra;
                self.current_dec_deg = dec;
                if ra_snapped && dec_snapped {
                    self.state = MotionState::Idle;
                }
            }
            MotionState::Moving => {
                self.current_ra_deg += self.slew_rate[0] * dt;
                self.current_dec_deg += self.slew_rate[1] * dt;
            }
        }
        self.last_step = now;
    }

    fn current_utc(&self, now: Instant) -> DateTime<Utc> {
        self.stored_utc + chrono::Duration::from_std(now.duration_since(self.utc_set_at)).unwrap_or_default()
    }
}

impl Default for SimulatorTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn step_axis(current: f64, target: f64, dt: f64) -> (f64, bool) {
    let delta = target - current;
    let d = delta.abs();
    if d <= 0.1 {
        return (target, true);
    }
    let speed = if d <= 5.0 {
        0.25
    } else if d <= 10.0 {
        0.5
    } else if d <= 20.0 {
        0.75
    } else {
        1.0
    };
    let step = (delta * speed).clamp(-9.0, 9.0) * dt;
    (current + step, false)
}

fn parse_angle_pair(text: &[u8]) -> AlpacaResult<(u32, u32)> {
    let text = std::str::from_utf8(text).map_err(|_| Error::invalid_operation("non-ASCII request payload"))?;
    let (a, b) = text.split_once(',').ok_or_else(|| Error::invalid_operation("malformed angle pair"))?;
    let a = angle::parse_units(a).ok_or_else(|| Error::invalid_operation("malformed angle field"))?;
    let b = angle::parse_units(b).ok_or_else(|| Error::invalid_operation("malformed angle field"))?;
    Ok((a, b))
}

fn render_angle_pair(a_deg: f64, b_deg: f64, precise: bool) -> Vec<u8> {
    let mut out = format!(
        "{},{}",
        angle::format_units(angle::to_nexstar_units(a_deg, precise), precise),
        angle::format_units(angle::to_nexstar_units(b_deg, precise), precise),
    )
    .into_bytes();
    out.push(b'#');
    out
}

impl Transport for SimulatorTransport {
    fn transact(&mut self, request: &[u8], _expected_response_len: usize) -> AlpacaResult<Vec<u8>> {
        let now = Instant::now();
        self.step(now);

        let opcode = *request.first().ok_or_else(|| Error::invalid_operation("empty request"))?;
        let response = match opcode {
            b'K' => vec![*request.get(1).unwrap_or(&0), b'#'],
            b'V' => vec![SIMULATED_FIRMWARE.0, SIMULATED_FIRMWARE.1, b'#'],
            b'm' => vec![SIMULATED_MODEL_CODE, b'#'],
            b'E' | b'e' => {
                let precise = opcode == b'e';
                render_angle_pair(self.current_ra_deg, normalize_fold(self.current_dec_deg), precise)
            }
            b'R' | b'r' => {
                let precise = opcode == b'r';
                let (ra_units, dec_units) = parse_angle_pair(&request[1..])?;
                self.target_ra_deg = angle::from_nexstar_units(ra_units, precise);
                self.target_dec_deg = normalize_declination(angle::from_nexstar_units(dec_units, precise));
                self.state = MotionState::Slewing;
                vec![b'#']
            }
            b'Z' | b'z' => {
                let precise = opcode == b'z';
                let (az, alt) = self.current_alt_az(now);
                render_angle_pair(az, normalize_fold(alt), precise)
            }
            b'B' | b'b' => {
                let precise = opcode == b'b';
                let (az_units, alt_units) = parse_angle_pair(&request[1..])?;
                let az = angle::from_nexstar_units(az_units, precise);
                let alt = normalize_declination(angle::from_nexstar_units(alt_units, precise));
                let (ha, dec) = crate::astro_math::calculate_ha_dec_from_alt_az(alt, az, self.site_latitude_deg);
                let lst = crate::astro_math::calculate_local_sidereal_time(self.current_utc(now), self.site_longitude_deg);
                let ra_hours = crate::astro_math::modulo(lst - ha, 24.0);
                self.target_ra_deg = ra_hours * 15.0;
                self.target_dec_deg = dec;
                self.state = MotionState::Slewing;
                vec![b'#']
            }
            b'w' => {
                let mut out = Location {
                    latitude_deg: self.site_latitude_deg,
                    longitude_deg: self.site_longitude_deg,
                }
                .encode()
                .to_vec();
                out.push(b'#');
                out
            }
            b'W' => {
                let bytes: [u8; 8] = request[1..9]
                    .try_into()
                    .map_err(|_| Error::invalid_operation("short set-location request"))?;
                let loc = Location::decode(bytes);
                self.site_latitude_deg = loc.latitude_deg;
                self.site_longitude_deg = loc.longitude_deg;
                vec![b'#']
            }
            b'h' => {
                let payload = RtcPayload::from_utc(self.current_utc(now), 0, false);
                let mut out = payload.encode().to_vec();
                out.push(b'#');
                out
            }
            b'H' => {
                let bytes: [u8; 8] = request[1..9]
                    .try_into()
                    .map_err(|_| Error::invalid_operation("short set-RTC request"))?;
                let payload = RtcPayload::decode(bytes).ok_or_else(|| Error::invalid_operation("unrepresentable RTC payload"))?;
                self.stored_utc = payload.to_utc();
                self.utc_set_at = now;
                vec![b'#']
            }
            b't' => {
                let byte: u8 = self.tracking_mode.into();
                vec![byte, b'#']
            }
            b'T' => {
                let byte = *request.get(1).ok_or_else(|| Error::invalid_operation("short set-tracking request"))?;
                self.tracking_mode = TrackingMode::try_from(byte).map_err(|_| Error::invalid_operation("unknown tracking mode"))?;
                vec![b'#']
            }
            b'J' => vec![1, b'#'],
            b'L' => vec![if self.state == MotionState::Slewing { b'1' } else { b'0' }, b'#'],
            b'M' => {
                self.state = MotionState::Idle;
                self.target_ra_deg = self.current_ra_deg;
                self.target_dec_deg = self.current_dec_deg;
                vec![b'#']
            }
            b'P' => self.passthrough(request)?,
            _ => return Err(Error::invalid_operation(format!("unsupported opcode {opcode:#04x}"))),
        };
        Ok(response)
    }
}

/// Altitude and declination share the sign-folding encoding; this fold is
/// applied just before rendering either onto the wire.
fn normalize_fold(deg: f64) -> f64 {
    angle::encode_declination(deg)
}

impl SimulatorTransport {
    fn current_alt_az(&self, now: Instant) -> (f64, f64) {
        let ra_hours = self.current_ra_deg / 15.0;
        let utc = self.current_utc(now);
        let ha = crate::astro_math::calculate_hour_angle(utc, self.site_longitude_deg, ra_hours);
        let alt = crate::astro_math::calculate_alt_from_ha_dec(ha, self.current_dec_deg, self.site_latitude_deg);
        let az = crate::astro_math::calculate_az_from_ha_dec(ha, self.current_dec_deg, self.site_latitude_deg);
        (az, alt)
    }

    fn passthrough(&mut self, request: &[u8]) -> AlpacaResult<Vec<u8>> {
        if request.len() < 8 {
            return Err(Error::invalid_operation("short pass-through request"));
        }
        let device_id = request[2];
        let command_id = request[3];
        let magnitude = u16::from_be_bytes([request[4], request[5]]) as f64;
        let axis = if device_id == crate::nexstar::passthrough::DEVICE_AZIMUTH_MOTOR { 0 } else { 1 };
        match command_id {
            6 | 7 => {
                let rate = magnitude / (3600.0 * 4.0) * if command_id == 7 { -1.0 } else { 1.0 };
                self.slew_rate[axis] = rate;
                self.state = if self.slew_rate.iter().all(|r| *r == 0.0) {
                    MotionState::Idle
                } else {
                    MotionState::Moving
                };
            }
            55 => return Ok(vec![1, b'#']),
            254 => return Ok(vec![SIMULATED_FIRMWARE.0, SIMULATED_FIRMWARE.1, b'#']),
            _ => return Err(Error::invalid_operation(format!("unsupported pass-through command {command_id:#04x}"))),
        }
        Ok(vec![b'#'])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_round_trips() {
        let mut sim = SimulatorTransport::new();
        let resp = sim.transact(&[b'K', b'x'], 2).unwrap();
        assert_eq!(resp, vec![b'x', b'#']);
    }

    #[test]
    fn slew_converges_on_target() {
        let mut sim = SimulatorTransport::new();
        let mut request = vec![b'r'];
        request.extend_from_slice(b"10000000,00000001");
        sim.transact(&request, 1).unwrap();
        assert_eq!(sim.state, MotionState::Slewing);
    }

    #[test]
    fn moveaxis_sets_moving_state() {
        let mut sim = SimulatorTransport::new();
        let resp = sim.transact(&[b'P', 3, 16, 6, 0x38, 0x40, 0, 0], 1).unwrap();
        assert_eq!(resp, vec![b'#']);
        assert_eq!(sim.state, MotionState::Moving);
        assert!(sim.slew_rate[0] > 0.0);
    }

    #[test]
    fn cancel_goto_returns_to_idle() {
        let mut sim = SimulatorTransport::new();
        sim.target_ra_deg = 90.0;
        sim.state = MotionState::Slewing;
        sim.transact(&[b'M'], 1).unwrap();
        assert_eq!(sim.state, MotionState::Idle);
    }
}
