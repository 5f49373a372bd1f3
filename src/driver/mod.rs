//! Component K + the design-note redesign of the inheritance chain
//! `device -> telescope -> driver` (spec.md §9): a capability-bearing
//! trait with default `not_implemented` methods, implemented here for a
//! real Celestron mount talking NexStar. [`crate::telescope`] owns a
//! `Box<dyn TelescopeDriver>` rather than inheriting from it.

pub mod model;

use crate::error::{AlpacaResult, Error};
use crate::nexstar::codec::{self, TrackingMode};
use crate::nexstar::location::Location;
use crate::nexstar::passthrough::slew_variable;
use crate::nexstar::transport::Transport;
use crate::nexstar::utc::RtcPayload;
use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Every operation the telescope facade may delegate to a driver. Default
/// bodies return `not_implemented`, matching a capability bit of 0.
pub trait TelescopeDriver: Send + Sync {
    fn get_altitude(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn get_azimuth(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn get_declination(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn get_right_ascension(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn is_slewing(&self) -> AlpacaResult<bool> {
        Err(Error::not_implemented())
    }
    fn get_sidereal_time(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn is_at_home(&self) -> AlpacaResult<bool> {
        Err(Error::not_implemented())
    }
    fn is_at_park(&self) -> AlpacaResult<bool> {
        Err(Error::not_implemented())
    }
    fn is_pulse_guiding(&self) -> AlpacaResult<bool> {
        Err(Error::not_implemented())
    }
    fn destination_side_of_pier(&self, _ra_hours: f64, _dec_deg: f64) -> AlpacaResult<i32> {
        Err(Error::not_implemented())
    }
    fn get_declination_rate(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_declination_rate(&self, _rate: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_right_ascension_rate(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_right_ascension_rate(&self, _rate: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_guide_rate_declination(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_guide_rate_declination(&self, _rate: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_guide_rate_right_ascension(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_guide_rate_right_ascension(&self, _rate: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_site_elevation(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_site_elevation(&self, _elevation_m: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_site_latitude(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_site_latitude(&self, _lat_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_site_longitude(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_site_longitude(&self, _lon_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_slew_settle_time(&self) -> AlpacaResult<f64> {
        Err(Error::not_implemented())
    }
    fn set_slew_settle_time(&self, _seconds: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_tracking(&self) -> AlpacaResult<bool> {
        Err(Error::not_implemented())
    }
    fn set_tracking(&self, _enabled: bool) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_tracking_rate(&self) -> AlpacaResult<i32> {
        Err(Error::not_implemented())
    }
    fn set_tracking_rate(&self, _rate: i32) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn get_utc_date(&self) -> AlpacaResult<DateTime<Utc>> {
        Err(Error::not_implemented())
    }
    fn set_utc_date(&self, _utc: DateTime<Utc>) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn abort_slew(&self) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn find_home(&self) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn move_axis(&self, _axis: i32, _rate_deg_per_s: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn park(&self) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn set_park(&self) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn unpark(&self) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn pulse_guide(&self, _direction: i32, _duration_ms: i32) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn slew_to_alt_az(&self, _az_deg: f64, _alt_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn slew_to_alt_az_async(&self, _az_deg: f64, _alt_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn slew_to_coordinates(&self, _ra_hours: f64, _dec_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn slew_to_coordinates_async(&self, _ra_hours: f64, _dec_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn sync_to_alt_az(&self, _az_deg: f64, _alt_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn sync_to_coordinates(&self, _ra_hours: f64, _dec_deg: f64) -> AlpacaResult<()> {
        Err(Error::not_implemented())
    }
    fn model_name(&self) -> AlpacaResult<&'static str> {
        Err(Error::not_implemented())
    }
    fn firmware_version(&self) -> AlpacaResult<(u8, u8)> {
        Err(Error::not_implemented())
    }

    /// Custom Celestron-only action (spec.md §3 "Pass-through envelope",
    /// exposed via SPEC_FULL's supplemented `telescope:gps-valid` action).
    fn gps_is_linked(&self) -> AlpacaResult<bool> {
        Err(Error::not_implemented())
    }

    /// Custom Celestron-only action (`telescope:device-version`): a sub-
    /// device's own firmware version, queried by pass-through.
    fn device_version(&self, _device_id: u8) -> AlpacaResult<(u8, u8)> {
        Err(Error::not_implemented())
    }
}

/// Software-only properties the NexStar wire protocol has no opcode for;
/// tracked here rather than round-tripped to the mount.
struct DriverState {
    declination_rate: f64,
    right_ascension_rate: f64,
    guide_rate_declination: f64,
    guide_rate_right_ascension: f64,
    site_elevation_m: f64,
    slew_settle_time_s: f64,
    is_parked: bool,
}

impl Default for DriverState {
    fn default() -> Self {
        DriverState {
            declination_rate: 0.0,
            right_ascension_rate: 0.0,
            guide_rate_declination: 0.5,
            guide_rate_right_ascension: 0.5,
            site_elevation_m: 0.0,
            slew_settle_time_s: 0.0,
            is_parked: false,
        }
    }
}

/// Drives a Celestron mount over the NexStar codec. Holds the transport
/// under a lock for the whole of every wire transaction (spec.md §5): the
/// protocol is half-duplex, so overlapping sends would mis-associate
/// replies.
pub struct CelestronDriver {
    transport: Mutex<Box<dyn Transport>>,
    state: Mutex<DriverState>,
}

impl CelestronDriver {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        CelestronDriver {
            transport: Mutex::new(transport),
            state: Mutex::new(DriverState::default()),
        }
    }

    fn with_transport<T>(&self, f: impl FnOnce(&mut dyn Transport) -> AlpacaResult<T>) -> AlpacaResult<T> {
        let mut guard = self.transport.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(guard.as_mut())
    }
}

impl TelescopeDriver for CelestronDriver {
    fn get_altitude(&self) -> AlpacaResult<f64> {
        self.with_transport(|t| codec::get_az_alt(t, true)).map(|aa| aa.alt_deg)
    }

    fn get_azimuth(&self) -> AlpacaResult<f64> {
        self.with_transport(|t| codec::get_az_alt(t, true)).map(|aa| aa.az_deg)
    }

    fn get_declination(&self) -> AlpacaResult<f64> {
        self.with_transport(|t| codec::get_ra_dec(t, true)).map(|rd| rd.dec_deg)
    }

    fn get_right_ascension(&self) -> AlpacaResult<f64> {
        self.with_transport(|t| codec::get_ra_dec(t, true)).map(|rd| rd.ra_hours)
    }

    fn is_slewing(&self) -> AlpacaResult<bool> {
        self.with_transport(codec::is_goto_in_progress)
    }

    fn get_sidereal_time(&self) -> AlpacaResult<f64> {
        let location = self.with_transport(codec::get_location)?;
        let lst = crate::astro_math::calculate_local_sidereal_time(Utc::now(), location.longitude_deg);
        Ok(lst)
    }

    fn is_at_home(&self) -> AlpacaResult<bool> {
        // The NexStar opcode set this driver speaks has no home-sensor
        // query; a mount never reports itself at home.
        Ok(false)
    }

    fn is_at_park(&self) -> AlpacaResult<bool> {
        Ok(self.state.lock().unwrap().is_parked)
    }

    fn is_pulse_guiding(&self) -> AlpacaResult<bool> {
        Ok(false)
    }

    fn destination_side_of_pier(&self, ra_hours: f64, _dec_deg: f64) -> AlpacaResult<i32> {
        let location = self.with_transport(codec::get_location)?;
        let ha = crate::astro_math::calculate_hour_angle(Utc::now(), location.longitude_deg, ra_hours);
        Ok(if ha < 12.0 { 0 } else { 1 })
    }

    fn get_declination_rate(&self) -> AlpacaResult<f64> {
        Ok(self.state.lock().unwrap().declination_rate)
    }

    fn set_declination_rate(&self, rate: f64) -> AlpacaResult<()> {
        self.state.lock().unwrap().declination_rate = rate;
        Ok(())
    }

    fn get_right_ascension_rate(&self) -> AlpacaResult<f64> {
        Ok(self.state.lock().unwrap().right_ascension_rate)
    }

    fn set_right_ascension_rate(&self, rate: f64) -> AlpacaResult<()> {
        self.state.lock().unwrap().right_ascension_rate = rate;
        Ok(())
    }

    fn get_guide_rate_declination(&self) -> AlpacaResult<f64> {
        Ok(self.state.lock().unwrap().guide_rate_declination)
    }

    fn set_guide_rate_declination(&self, rate: f64) -> AlpacaResult<()> {
        self.state.lock().unwrap().guide_rate_declination = rate;
        Ok(())
    }

    fn get_guide_rate_right_ascension(&self) -> AlpacaResult<f64> {
        Ok(self.state.lock().unwrap().guide_rate_right_ascension)
    }

    fn set_guide_rate_right_ascension(&self, rate: f64) -> AlpacaResult<()> {
        self.state.lock().unwrap().guide_rate_right_ascension = rate;
        Ok(())
    }

    fn get_site_elevation(&self) -> AlpacaResult<f64> {
        Ok(self.state.lock().unwrap().site_elevation_m)
    }

    fn set_site_elevation(&self, elevation_m: f64) -> AlpacaResult<()> {
        self.state.lock().unwrap().site_elevation_m = elevation_m;
        Ok(())
    }

    fn get_site_latitude(&self) -> AlpacaResult<f64> {
        self.with_transport(codec::get_location).map(|l| l.latitude_deg)
    }

    fn set_site_latitude(&self, lat_deg: f64) -> AlpacaResult<()> {
        let longitude_deg = self.with_transport(codec::get_location)?.longitude_deg;
        self.with_transport(|t| codec::set_location(t, Location { latitude_deg: lat_deg, longitude_deg }))
    }

    fn get_site_longitude(&self) -> AlpacaResult<f64> {
        self.with_transport(codec::get_location).map(|l| l.longitude_deg)
    }

    fn set_site_longitude(&self, lon_deg: f64) -> AlpacaResult<()> {
        let latitude_deg = self.with_transport(codec::get_location)?.latitude_deg;
        self.with_transport(|t| codec::set_location(t, Location { latitude_deg, longitude_deg: lon_deg }))
    }

    fn get_slew_settle_time(&self) -> AlpacaResult<f64> {
        Ok(self.state.lock().unwrap().slew_settle_time_s)
    }

    fn set_slew_settle_time(&self, seconds: f64) -> AlpacaResult<()> {
        self.state.lock().unwrap().slew_settle_time_s = seconds;
        Ok(())
    }

    fn get_tracking(&self) -> AlpacaResult<bool> {
        self.with_transport(codec::get_tracking_mode).map(|mode| mode != TrackingMode::Off)
    }

    fn set_tracking(&self, enabled: bool) -> AlpacaResult<()> {
        let mode = if enabled { TrackingMode::EqNorth } else { TrackingMode::Off };
        self.with_transport(|t| codec::set_tracking_mode(t, mode))
    }

    fn get_tracking_rate(&self) -> AlpacaResult<i32> {
        self.with_transport(codec::get_tracking_mode).map(|mode| {
            let byte: u8 = mode.into();
            byte as i32
        })
    }

    fn set_tracking_rate(&self, rate: i32) -> AlpacaResult<()> {
        let mode = TrackingMode::try_from(rate as u8).map_err(|_| Error::invalid_value("TrackingRate"))?;
        self.with_transport(|t| codec::set_tracking_mode(t, mode))
    }

    fn get_utc_date(&self) -> AlpacaResult<DateTime<Utc>> {
        self.with_transport(codec::get_rtc).map(RtcPayload::to_utc)
    }

    fn set_utc_date(&self, utc: DateTime<Utc>) -> AlpacaResult<()> {
        let payload = RtcPayload::from_utc(utc, 0, false);
        self.with_transport(|t| codec::set_rtc(t, payload))
    }

    fn abort_slew(&self) -> AlpacaResult<()> {
        self.with_transport(codec::cancel_goto)
    }

    fn find_home(&self) -> AlpacaResult<()> {
        self.with_transport(|t| codec::goto_ra_dec(t, 0.0, 0.0, false))
    }

    fn move_axis(&self, axis: i32, rate_deg_per_s: f64) -> AlpacaResult<()> {
        let command = slew_variable(axis as u8, rate_deg_per_s);
        self.with_transport(|t| codec::passthrough(t, command)).map(|_| ())
    }

    fn park(&self) -> AlpacaResult<()> {
        self.with_transport(codec::cancel_goto)?;
        self.state.lock().unwrap().is_parked = true;
        Ok(())
    }

    fn set_park(&self) -> AlpacaResult<()> {
        Ok(())
    }

    fn unpark(&self) -> AlpacaResult<()> {
        self.state.lock().unwrap().is_parked = false;
        Ok(())
    }

    fn pulse_guide(&self, direction: i32, duration_ms: i32) -> AlpacaResult<()> {
        let axis: u8 = if direction < 2 { 1 } else { 0 };
        let guide_rate = {
            let state = self.state.lock().unwrap();
            if axis == 1 {
                state.guide_rate_declination
            } else {
                state.guide_rate_right_ascension
            }
        };
        let sign = if direction == 0 || direction == 3 { 1.0 } else { -1.0 };
        self.with_transport(|t| codec::passthrough(t, slew_variable(axis, sign * guide_rate)))?;
        std::thread::sleep(std::time::Duration::from_millis(duration_ms.max(0) as u64));
        self.with_transport(|t| codec::passthrough(t, slew_variable(axis, 0.0))).map(|_| ())
    }

    fn slew_to_alt_az(&self, az_deg: f64, alt_deg: f64) -> AlpacaResult<()> {
        self.with_transport(|t| codec::goto_az_alt(t, az_deg, alt_deg, true))
    }

    fn slew_to_alt_az_async(&self, az_deg: f64, alt_deg: f64) -> AlpacaResult<()> {
        self.slew_to_alt_az(az_deg, alt_deg)
    }

    fn slew_to_coordinates(&self, ra_hours: f64, dec_deg: f64) -> AlpacaResult<()> {
        self.with_transport(|t| codec::goto_ra_dec(t, ra_hours, dec_deg, true))
    }

    fn slew_to_coordinates_async(&self, ra_hours: f64, dec_deg: f64) -> AlpacaResult<()> {
        self.slew_to_coordinates(ra_hours, dec_deg)
    }

    /// The NexStar opcode set available to this driver has no dedicated
    /// alignment-sync command; a sync only recalibrates the mount's own
    /// alignment model, which this protocol subset does not expose, so
    /// this is a capability-gated no-op.
    fn sync_to_alt_az(&self, _az_deg: f64, _alt_deg: f64) -> AlpacaResult<()> {
        Ok(())
    }

    fn sync_to_coordinates(&self, _ra_hours: f64, _dec_deg: f64) -> AlpacaResult<()> {
        Ok(())
    }

    fn model_name(&self) -> AlpacaResult<&'static str> {
        self.with_transport(codec::get_model).map(model::model_name)
    }

    fn firmware_version(&self) -> AlpacaResult<(u8, u8)> {
        self.with_transport(codec::get_version).map(|v| (v.major, v.minor))
    }

    fn gps_is_linked(&self) -> AlpacaResult<bool> {
        self.with_transport(codec::gps_is_linked)
    }

    fn device_version(&self, device_id: u8) -> AlpacaResult<(u8, u8)> {
        self.with_transport(|t| codec::device_version(t, device_id)).map(|v| (v.major, v.minor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nexstar::simulator::SimulatorTransport;

    fn driver() -> CelestronDriver {
        CelestronDriver::new(Box::new(SimulatorTransport::new()))
    }

    #[test]
    fn model_name_resolves_through_simulator() {
        let d = driver();
        assert_eq!(d.model_name().unwrap(), "Advanced GT");
    }

    #[test]
    fn tracking_round_trips() {
        let d = driver();
        assert_eq!(d.get_tracking().unwrap(), false);
        d.set_tracking(true).unwrap();
        assert_eq!(d.get_tracking().unwrap(), true);
    }

    #[test]
    fn park_state_is_software_only() {
        let d = driver();
        assert_eq!(d.is_at_park().unwrap(), false);
        d.park().unwrap();
        assert_eq!(d.is_at_park().unwrap(), true);
        d.unpark().unwrap();
        assert_eq!(d.is_at_park().unwrap(), false);
    }

    #[test]
    fn declination_rate_is_stored_not_sent_to_wire() {
        let d = driver();
        d.set_declination_rate(1.5).unwrap();
        assert_eq!(d.get_declination_rate().unwrap(), 1.5);
    }
}
