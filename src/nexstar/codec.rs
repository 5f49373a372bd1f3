//! Component H: one function per opcode in spec.md §4.H's command table.
//! Each function performs the full request/response round trip over a
//! [`Transport`], validates framing, and decodes the typed payload.

use crate::error::{AlpacaResult, Error};
use crate::nexstar::angle;
use crate::nexstar::location::Location;
use crate::nexstar::passthrough::PassthroughCommand;
use crate::nexstar::transport::Transport;
use crate::nexstar::utc::RtcPayload;
use num_enum::{IntoPrimitive, TryFromPrimitive};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaDec {
    pub ra_hours: f64,
    pub dec_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AzAlt {
    pub az_deg: f64,
    pub alt_deg: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TrackingMode {
    Off = 0,
    AltAz = 1,
    EqNorth = 2,
    EqSouth = 3,
}

/// Every well-formed response ends in `0x23`. Strip it, or report a
/// framing error (spec.md §4.H "Wire rules", §8 "Framing").
fn strip_terminator(resp: &[u8]) -> AlpacaResult<&[u8]> {
    match resp.split_last() {
        Some((b'#', body)) => Ok(body),
        _ => Err(Error::invalid_operation("response missing '#' terminator")),
    }
}

fn angle_pair_payload(text: &str) -> AlpacaResult<(u32, u32)> {
    let (a, b) = text
        .split_once(',')
        .ok_or_else(|| Error::invalid_operation("malformed angle pair"))?;
    let a = angle::parse_units(a).ok_or_else(|| Error::invalid_operation("malformed angle field"))?;
    let b = angle::parse_units(b).ok_or_else(|| Error::invalid_operation("malformed angle field"))?;
    Ok((a, b))
}

fn decode_angle_pair(body: &[u8], precise: bool) -> AlpacaResult<(f64, f64)> {
    let text = std::str::from_utf8(body).map_err(|_| Error::invalid_operation("non-ASCII angle payload"))?;
    let (a, b) = angle_pair_payload(text)?;
    Ok((angle::from_nexstar_units(a, precise), angle::from_nexstar_units(b, precise)))
}

fn encode_angle_pair(a_deg: f64, b_deg: f64, precise: bool) -> String {
    format!(
        "{},{}",
        angle::format_units(angle::to_nexstar_units(a_deg, precise), precise),
        angle::format_units(angle::to_nexstar_units(b_deg, precise), precise),
    )
}

pub fn echo(transport: &mut dyn Transport, c: u8) -> AlpacaResult<()> {
    let resp = transport.transact(&[b'K', c], 2)?;
    let body = strip_terminator(&resp)?;
    if body.first() == Some(&c) {
        Ok(())
    } else {
        Err(Error::invalid_operation("echo byte mismatch"))
    }
}

pub fn get_version(transport: &mut dyn Transport) -> AlpacaResult<Version> {
    let resp = transport.transact(&[b'V'], 3)?;
    let body = strip_terminator(&resp)?;
    match body {
        [major, minor] => Ok(Version { major: *major, minor: *minor }),
        _ => Err(Error::invalid_operation("short version response")),
    }
}

pub fn get_model(transport: &mut dyn Transport) -> AlpacaResult<u8> {
    let resp = transport.transact(&[b'm'], 2)?;
    let body = strip_terminator(&resp)?;
    body.first().copied().ok_or_else(|| Error::invalid_operation("short model response"))
}

pub fn get_ra_dec(transport: &mut dyn Transport, precise: bool) -> AlpacaResult<RaDec> {
    let opcode = if precise { b'e' } else { b'E' };
    let len = if precise { 18 } else { 10 };
    let resp = transport.transact(&[opcode], len)?;
    let body = strip_terminator(&resp)?;
    let (ra_wire_deg, dec_raw) = decode_angle_pair(body, precise)?;
    Ok(RaDec {
        ra_hours: angle::wire_degrees_to_ra_hours(ra_wire_deg),
        dec_deg: angle::normalize_declination(dec_raw),
    })
}

pub fn goto_ra_dec(transport: &mut dyn Transport, ra_hours: f64, dec_deg: f64, precise: bool) -> AlpacaResult<()> {
    let opcode = if precise { b'r' } else { b'R' };
    let payload = encode_angle_pair(
        angle::ra_hours_to_wire_degrees(ra_hours),
        angle::encode_declination(dec_deg),
        precise,
    );
    let mut request = vec![opcode];
    request.extend_from_slice(payload.as_bytes());
    let resp = transport.transact(&request, 1)?;
    strip_terminator(&resp)?;
    Ok(())
}

pub fn get_az_alt(transport: &mut dyn Transport, precise: bool) -> AlpacaResult<AzAlt> {
    let opcode = if precise { b'z' } else { b'Z' };
    let len = if precise { 18 } else { 10 };
    let resp = transport.transact(&[opcode], len)?;
    let body = strip_terminator(&resp)?;
    let (az, alt_raw) = decode_angle_pair(body, precise)?;
    Ok(AzAlt {
        az_deg: az,
        alt_deg: angle::normalize_declination(alt_raw),
    })
}

pub fn goto_az_alt(transport: &mut dyn Transport, az_deg: f64, alt_deg: f64, precise: bool) -> AlpacaResult<()> {
    let opcode = if precise { b'b' } else { b'B' };
    let payload = encode_angle_pair(az_deg, angle::encode_declination(alt_deg), precise);
    let mut request = vec![opcode];
    request.extend_from_slice(payload.as_bytes());
    let resp = transport.transact(&request, 1)?;
    strip_terminator(&resp)?;
    Ok(())
}

pub fn get_location(transport: &mut dyn Transport) -> AlpacaResult<Location> {
    let resp = transport.transact(&[b'w'], 9)?;
    let body = strip_terminator(&resp)?;
    let bytes: [u8; 8] = body.try_into().map_err(|_| Error::invalid_operation("short location response"))?;
    Ok(Location::decode(bytes))
}

pub fn set_location(transport: &mut dyn Transport, location: Location) -> AlpacaResult<()> {
    let mut request = vec![b'W'];
    request.extend_from_slice(&location.encode());
    let resp = transport.transact(&request, 1)?;
    strip_terminator(&resp)?;
    Ok(())
}

pub fn get_rtc(transport: &mut dyn Transport) -> AlpacaResult<RtcPayload> {
    let resp = transport.transact(&[b'h'], 9)?;
    let body = strip_terminator(&resp)?;
    let bytes: [u8; 8] = body.try_into().map_err(|_| Error::invalid_operation("short RTC response"))?;
    RtcPayload::decode(bytes).ok_or_else(|| Error::invalid_operation("unrepresentable RTC payload"))
}

pub fn set_rtc(transport: &mut dyn Transport, payload: RtcPayload) -> AlpacaResult<()> {
    let mut request = vec![b'H'];
    request.extend_from_slice(&payload.encode());
    let resp = transport.transact(&request, 1)?;
    strip_terminator(&resp)?;
    Ok(())
}

pub fn get_tracking_mode(transport: &mut dyn Transport) -> AlpacaResult<TrackingMode> {
    let resp = transport.transact(&[b't'], 2)?;
    let body = strip_terminator(&resp)?;
    let byte = body.first().copied().ok_or_else(|| Error::invalid_operation("short tracking-mode response"))?;
    TrackingMode::try_from(byte).map_err(|_| Error::invalid_operation("unknown tracking mode byte"))
}

pub fn set_tracking_mode(transport: &mut dyn Transport, mode: TrackingMode) -> AlpacaResult<()> {
    let resp = transport.transact(&[b'T', mode.into()], 1)?;
    strip_terminator(&resp)?;
    Ok(())
}

pub fn is_alignment_complete(transport: &mut dyn Transport) -> AlpacaResult<bool> {
    let resp = transport.transact(&[b'J'], 2)?;
    let body = strip_terminator(&resp)?;
    Ok(body.first() == Some(&1))
}

pub fn is_goto_in_progress(transport: &mut dyn Transport) -> AlpacaResult<bool> {
    let resp = transport.transact(&[b'L'], 2)?;
    let body = strip_terminator(&resp)?;
    match body.first() {
        Some(b'1') => Ok(true),
        Some(b'0') => Ok(false),
        _ => Err(Error::invalid_operation("malformed goto-in-progress response")),
    }
}

pub fn cancel_goto(transport: &mut dyn Transport) -> AlpacaResult<()> {
    let resp = transport.transact(&[b'M'], 1)?;
    strip_terminator(&resp)?;
    Ok(())
}

pub fn passthrough(transport: &mut dyn Transport, command: PassthroughCommand) -> AlpacaResult<Vec<u8>> {
    let expected = command.expected_response_len as usize + 1;
    let resp = transport.transact(&command.encode(), expected)?;
    Ok(strip_terminator(&resp)?.to_vec())
}

/// Whether the GPS accessory reports a satellite lock.
pub fn gps_is_linked(transport: &mut dyn Transport) -> AlpacaResult<bool> {
    let body = passthrough(transport, crate::nexstar::passthrough::gps_is_linked())?;
    Ok(body.first() == Some(&1))
}

/// A sub-device's own firmware version, queried by pass-through rather
/// than the hand controller's own `get_version`.
pub fn device_version(transport: &mut dyn Transport, device_id: u8) -> AlpacaResult<Version> {
    let body = passthrough(transport, crate::nexstar::passthrough::device_version(device_id))?;
    match body.as_slice() {
        [major, minor] => Ok(Version { major: *major, minor: *minor }),
        _ => Err(Error::invalid_operation("short device-version response")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexstar::simulator::SimulatorTransport;

    #[test]
    fn echo_round_trips_through_simulator() {
        let mut sim = SimulatorTransport::new();
        echo(&mut sim, b'x').unwrap();
    }

    #[test]
    fn short_response_is_framing_error() {
        assert!(strip_terminator(b"1234").is_err());
    }

    #[test]
    fn decode_angle_pair_rejects_garbage() {
        assert!(decode_angle_pair(b"not,hex", false).is_err());
    }

    #[test]
    fn tracking_mode_round_trips_through_primitive() {
        assert_eq!(TrackingMode::try_from(2u8).unwrap(), TrackingMode::EqNorth);
        let byte: u8 = TrackingMode::EqNorth.into();
        assert_eq!(byte, 2);
    }
}
