//! Component G: the telescope facade. Owns the static metadata, the
//! capability word, the shared connection/target state, and a boxed
//! driver; every API-visible operation is one gated method built from
//! [`crate::join`].

pub mod metadata;

use crate::capabilities::Capabilities;
use crate::device::DeviceBase;
use crate::driver::TelescopeDriver;
use crate::error::{AlpacaResult, Error};
use crate::join::{join1, join2, join3, join4};
pub use metadata::StaticMetadata;
use std::sync::Mutex;

pub struct Telescope {
    pub base: DeviceBase,
    pub capabilities: Capabilities,
    pub metadata: StaticMetadata,
    driver: Box<dyn TelescopeDriver>,
    target_ra_hours: Mutex<Option<f64>>,
    target_dec_deg: Mutex<Option<f64>>,
}

impl Telescope {
    pub fn new(capabilities: Capabilities, metadata: StaticMetadata, driver: Box<dyn TelescopeDriver>) -> Self {
        Telescope {
            base: DeviceBase::new(),
            capabilities,
            metadata,
            driver,
            target_ra_hours: Mutex::new(None),
            target_dec_deg: Mutex::new(None),
        }
    }

    fn cap(&self, bit: Capabilities) -> AlpacaResult<()> {
        self.base.check_flag(Ok(self.capabilities.contains(bit)))
    }

    fn connected(&self) -> AlpacaResult<()> {
        self.base.check_connected()
    }

    // -- plain connected-gated reads -------------------------------------

    pub fn get_altitude(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_altitude(), self.connected())
    }

    pub fn get_azimuth(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_azimuth(), self.connected())
    }

    pub fn get_declination(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_declination(), self.connected())
    }

    pub fn get_right_ascension(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_right_ascension(), self.connected())
    }

    pub fn get_slewing(&self) -> AlpacaResult<bool> {
        join1(|| self.driver.is_slewing(), self.connected())
    }

    pub fn get_sidereal_time(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_sidereal_time(), self.connected())
    }

    pub fn get_at_home(&self) -> AlpacaResult<bool> {
        join1(|| self.driver.is_at_home(), self.connected())
    }

    pub fn get_at_park(&self) -> AlpacaResult<bool> {
        join1(|| self.driver.is_at_park(), self.connected())
    }

    pub fn get_ispulseguiding(&self) -> AlpacaResult<bool> {
        join2(|| self.driver.is_pulse_guiding(), self.connected(), self.cap(Capabilities::CAN_PULSE_GUIDE))
    }

    pub fn get_destination_side_of_pier(&self, ra_hours: f64, dec_deg: f64) -> AlpacaResult<i32> {
        join1(|| self.driver.destination_side_of_pier(ra_hours, dec_deg), self.connected())
    }

    pub fn get_declination_rate(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_declination_rate(), self.connected())
    }

    pub fn set_declination_rate(&self, rate: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_declination_rate(rate), self.connected(), self.cap(Capabilities::CAN_SET_DECLINATION_RATE))
    }

    pub fn get_right_ascension_rate(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_right_ascension_rate(), self.connected())
    }

    pub fn set_right_ascension_rate(&self, rate: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_right_ascension_rate(rate), self.connected(), self.cap(Capabilities::CAN_SET_RIGHT_ASCENSION_RATE))
    }

    pub fn get_guide_rate_declination(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_guide_rate_declination(), self.connected())
    }

    pub fn set_guide_rate_declination(&self, rate: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_guide_rate_declination(rate), self.connected(), self.cap(Capabilities::CAN_SET_GUIDE_RATES))
    }

    pub fn get_guide_rate_right_ascension(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_guide_rate_right_ascension(), self.connected())
    }

    pub fn set_guide_rate_right_ascension(&self, rate: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_guide_rate_right_ascension(rate), self.connected(), self.cap(Capabilities::CAN_SET_GUIDE_RATES))
    }

    pub fn get_site_elevation(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_site_elevation(), self.connected())
    }

    pub fn set_site_elevation(&self, elevation_m: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_site_elevation(elevation_m), self.connected(), self.base.check_value((-300.0..=10000.0).contains(&elevation_m)))
    }

    pub fn get_site_latitude(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_site_latitude(), self.connected())
    }

    pub fn set_site_latitude(&self, lat_deg: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_site_latitude(lat_deg), self.connected(), self.base.check_value((-90.0..=90.0).contains(&lat_deg)))
    }

    pub fn get_site_longitude(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_site_longitude(), self.connected())
    }

    pub fn set_site_longitude(&self, lon_deg: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_site_longitude(lon_deg), self.connected(), self.base.check_value((-180.0..=180.0).contains(&lon_deg)))
    }

    pub fn get_slew_settle_time(&self) -> AlpacaResult<f64> {
        join1(|| self.driver.get_slew_settle_time(), self.connected())
    }

    pub fn set_slew_settle_time(&self, seconds: f64) -> AlpacaResult<()> {
        join2(|| self.driver.set_slew_settle_time(seconds), self.connected(), self.base.check_value(seconds >= 0.0))
    }

    pub fn get_target_declination(&self) -> AlpacaResult<f64> {
        let stored = *self.target_dec_deg.lock().unwrap();
        join2(|| Ok(stored.unwrap()), self.connected(), self.base.check_set(stored.is_some()))
    }

    pub fn set_target_declination(&self, dec_deg: f64) -> AlpacaResult<()> {
        join2(
            || {
                *self.target_dec_deg.lock().unwrap() = Some(dec_deg);
                Ok(())
            },
            self.connected(),
            self.base.check_value((-90.0..=90.0).contains(&dec_deg)),
        )
    }

    pub fn get_target_right_ascension(&self) -> AlpacaResult<f64> {
        let stored = *self.target_ra_hours.lock().unwrap();
        join2(|| Ok(stored.unwrap()), self.connected(), self.base.check_set(stored.is_some()))
    }

    pub fn set_target_right_ascension(&self, ra_hours: f64) -> AlpacaResult<()> {
        join2(
            || {
                *self.target_ra_hours.lock().unwrap() = Some(ra_hours);
                Ok(())
            },
            self.connected(),
            self.base.check_value((0.0..=24.0).contains(&ra_hours)),
        )
    }

    pub fn get_tracking(&self) -> AlpacaResult<bool> {
        join1(|| self.driver.get_tracking(), self.connected())
    }

    pub fn set_tracking(&self, enabled: bool) -> AlpacaResult<()> {
        join1(|| self.driver.set_tracking(enabled), self.connected())
    }

    pub fn get_tracking_rate(&self) -> AlpacaResult<i32> {
        join1(|| self.driver.get_tracking_rate(), self.connected())
    }

    pub fn set_tracking_rate(&self, rate: i32) -> AlpacaResult<()> {
        join2(|| self.driver.set_tracking_rate(rate), self.connected(), self.base.check_value((0..=3).contains(&rate)))
    }

    pub fn get_utc_date(&self) -> AlpacaResult<chrono::DateTime<chrono::Utc>> {
        join1(|| self.driver.get_utc_date(), self.connected())
    }

    pub fn set_utc_date(&self, utc: chrono::DateTime<chrono::Utc>) -> AlpacaResult<()> {
        join1(|| self.driver.set_utc_date(utc), self.connected())
    }

    pub fn abort_slew(&self) -> AlpacaResult<()> {
        join1(|| self.driver.abort_slew(), self.connected())
    }

    pub fn find_home(&self) -> AlpacaResult<()> {
        join2(|| self.driver.find_home(), self.connected(), self.cap(Capabilities::CAN_FIND_HOME))
    }

    pub fn move_axis(&self, axis: i32, rate_deg_per_s: f64) -> AlpacaResult<()> {
        join4(
            || self.driver.move_axis(axis, rate_deg_per_s),
            self.connected(),
            self.base.check_value((0..=2).contains(&axis)),
            self.cap_for_axis(axis),
            self.base.check_value(rate_deg_per_s > -9.0 && rate_deg_per_s < 9.0),
        )
    }

    fn cap_for_axis(&self, axis: i32) -> AlpacaResult<()> {
        self.base.check_flag(Ok(self.capabilities.can_move_axis(axis)))
    }

    pub fn park(&self) -> AlpacaResult<()> {
        join2(|| self.driver.park(), self.connected(), self.cap(Capabilities::CAN_PARK))
    }

    pub fn set_park(&self) -> AlpacaResult<()> {
        join2(|| self.driver.set_park(), self.connected(), self.cap(Capabilities::CAN_SET_PARK))
    }

    pub fn unpark(&self) -> AlpacaResult<()> {
        join2(|| self.driver.unpark(), self.connected(), self.cap(Capabilities::CAN_UNPARK))
    }

    pub fn pulse_guide(&self, direction: i32, duration_ms: i32) -> AlpacaResult<()> {
        join2(|| self.driver.pulse_guide(direction, duration_ms), self.connected(), self.cap(Capabilities::CAN_PULSE_GUIDE))
    }

    pub fn slew_to_alt_az(&self, az_deg: f64, alt_deg: f64) -> AlpacaResult<()> {
        join4(
            || self.driver.slew_to_alt_az(az_deg, alt_deg),
            self.connected(),
            self.cap(Capabilities::CAN_SLEW_ALTAZ),
            self.base.check_value((0.0..=360.0).contains(&az_deg)),
            self.base.check_value((-90.0..=90.0).contains(&alt_deg)),
        )
    }

    pub fn slew_to_alt_az_async(&self, az_deg: f64, alt_deg: f64) -> AlpacaResult<()> {
        join4(
            || self.driver.slew_to_alt_az_async(az_deg, alt_deg),
            self.connected(),
            self.cap(Capabilities::CAN_SLEW_ALTAZ_ASYNC),
            self.base.check_value((0.0..=360.0).contains(&az_deg)),
            self.base.check_value((-90.0..=90.0).contains(&alt_deg)),
        )
    }

    pub fn slew_to_coordinates(&self, ra_hours: f64, dec_deg: f64) -> AlpacaResult<()> {
        join4(
            || {
                *self.target_ra_hours.lock().unwrap() = Some(ra_hours);
                *self.target_dec_deg.lock().unwrap() = Some(dec_deg);
                self.driver.slew_to_coordinates(ra_hours, dec_deg)
            },
            self.connected(),
            self.cap(Capabilities::CAN_SLEW),
            self.base.check_value((0.0..=24.0).contains(&ra_hours)),
            self.base.check_value((-90.0..=90.0).contains(&dec_deg)),
        )
    }

    pub fn slew_to_coordinates_async(&self, ra_hours: f64, dec_deg: f64) -> AlpacaResult<()> {
        join4(
            || {
                *self.target_ra_hours.lock().unwrap() = Some(ra_hours);
                *self.target_dec_deg.lock().unwrap() = Some(dec_deg);
                self.driver.slew_to_coordinates_async(ra_hours, dec_deg)
            },
            self.connected(),
            self.cap(Capabilities::CAN_SLEW_ASYNC),
            self.base.check_value((0.0..=24.0).contains(&ra_hours)),
            self.base.check_value((-90.0..=90.0).contains(&dec_deg)),
        )
    }

    pub fn slew_to_target(&self) -> AlpacaResult<()> {
        let (ra, dec) = self.stored_target();
        join3(
            || self.driver.slew_to_coordinates(ra.unwrap(), dec.unwrap()),
            self.connected(),
            self.cap(Capabilities::CAN_SLEW),
            self.base.check_set(ra.is_some() && dec.is_some()),
        )
    }

    pub fn slew_to_target_async(&self) -> AlpacaResult<()> {
        let (ra, dec) = self.stored_target();
        join3(
            || self.driver.slew_to_coordinates_async(ra.unwrap(), dec.unwrap()),
            self.connected(),
            self.cap(Capabilities::CAN_SLEW_ASYNC),
            self.base.check_set(ra.is_some() && dec.is_some()),
        )
    }

    pub fn sync_to_alt_az(&self, az_deg: f64, alt_deg: f64) -> AlpacaResult<()> {
        join4(
            || self.driver.sync_to_alt_az(az_deg, alt_deg),
            self.connected(),
            self.cap(Capabilities::CAN_SYNC_ALTAZ),
            self.base.check_value((0.0..=360.0).contains(&az_deg)),
            self.base.check_value((-90.0..=90.0).contains(&alt_deg)),
        )
    }

    pub fn sync_to_coordinates(&self, ra_hours: f64, dec_deg: f64) -> AlpacaResult<()> {
        join4(
            || self.driver.sync_to_coordinates(ra_hours, dec_deg),
            self.connected(),
            self.cap(Capabilities::CAN_SYNC),
            self.base.check_value((0.0..=24.0).contains(&ra_hours)),
            self.base.check_value((-90.0..=90.0).contains(&dec_deg)),
        )
    }

    pub fn sync_to_target(&self) -> AlpacaResult<()> {
        let (ra, dec) = self.stored_target();
        join4(
            || self.driver.sync_to_coordinates(ra.unwrap(), dec.unwrap()),
            self.connected(),
            self.base.check_op(!self.base_is_parked()),
            self.cap(Capabilities::CAN_SYNC),
            self.base.check_set(ra.is_some() && dec.is_some()),
        )
    }

    fn base_is_parked(&self) -> bool {
        self.driver.is_at_park().unwrap_or(false)
    }

    fn stored_target(&self) -> (Option<f64>, Option<f64>) {
        (*self.target_ra_hours.lock().unwrap(), *self.target_dec_deg.lock().unwrap())
    }

    /// Axis-rate getter: pure metadata lookup, gated only on the axis
    /// index being in range (spec.md §4.G).
    pub fn get_axis_rates(&self, axis: i32) -> AlpacaResult<Vec<(f64, f64)>> {
        self.base.check_value((0..=2).contains(&axis))?;
        Ok(self.metadata.axis_rates[axis as usize].clone())
    }

    /// `telescope:gps-valid` custom action (SPEC_FULL supplement).
    pub fn action_gps_is_linked(&self) -> AlpacaResult<bool> {
        join1(|| self.driver.gps_is_linked(), self.connected())
    }

    /// `telescope:device-version` custom action (SPEC_FULL supplement).
    pub fn action_device_version(&self, device_id: u8) -> AlpacaResult<(u8, u8)> {
        join1(|| self.driver.device_version(device_id), self.connected())
    }
}
