//! Component E: the operation table and its dispatch rule (spec.md §4.E).
//! One [`TelescopeResource`] owns every configured telescope and the two
//! ordered `name -> handler` maps every request is looked up in.

use crate::error::{AlpacaResult, Error};
use crate::json::Json;
use crate::params::ArgumentMap;
use crate::telescope::Telescope;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

type Getter = fn(&Telescope, &ArgumentMap) -> AlpacaResult<Json>;
type Setter = fn(&Telescope, &ArgumentMap) -> AlpacaResult<()>;
/// A custom action dispatched through the generic `action` verb (spec.md
/// §3 "three no-op setters" note; SPEC_FULL supplements the verb with two
/// real Celestron-only actions). Unlike a [`Setter`], an action returns a
/// value.
type Action = fn(&Telescope, &ArgumentMap) -> AlpacaResult<Json>;

pub struct TelescopeResource {
    devices: Vec<Telescope>,
    getters: IndexMap<&'static str, Getter>,
    setters: IndexMap<&'static str, Setter>,
    actions: IndexMap<&'static str, Action>,
}

impl TelescopeResource {
    pub fn new(devices: Vec<Telescope>) -> Self {
        let mut resource = TelescopeResource {
            devices,
            getters: IndexMap::new(),
            setters: IndexMap::new(),
            actions: IndexMap::new(),
        };
        resource.register_universal();
        resource.register_telescope_operations();
        resource
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device(&self, index: usize) -> Option<&Telescope> {
        self.devices.get(index)
    }

    fn register_universal(&mut self) {
        self.getters.insert("connected", |t, _| Ok(Json::from(t.base.is_connected())));
        self.setters.insert("connected", |t, args| t.base.set_connected(args.get("Connected")?));
        self.getters.insert("description", |t, _| Ok(Json::from(t.metadata.description.clone())));
        self.getters.insert("driverinfo", |t, _| Ok(Json::from(t.metadata.driver_info.clone())));
        self.getters.insert("driverversion", |t, _| Ok(Json::from(t.metadata.driver_version.clone())));
        self.getters.insert("interfaceversion", |t, _| Ok(Json::from(t.metadata.interface_version)));
        self.getters.insert("name", |t, _| Ok(Json::from(t.metadata.name.clone())));
        self.getters.insert("supportedactions", |_, _| {
            Ok(Json::array([Json::from("telescope:gps-valid"), Json::from("telescope:device-version")]))
        });
        self.setters.insert("commandblind", |_, _| Ok(()));
        self.setters.insert("commandbool", |_, _| Ok(()));
        self.setters.insert("commandstring", |_, _| Ok(()));

        self.actions.insert("telescope:gps-valid", |t, _| t.action_gps_is_linked().map(Json::from));
        self.actions.insert("telescope:device-version", |t, args| {
            let device_id: u32 = args.get("DeviceID")?;
            let (major, minor) = t.action_device_version(device_id as u8)?;
            Ok(Json::from(format!("{major}.{minor}")))
        });
    }

    fn register_telescope_operations(&mut self) {
        self.getters.insert("altitude", |t, _| t.get_altitude().map(Json::from));
        self.getters.insert("azimuth", |t, _| t.get_azimuth().map(Json::from));
        self.getters.insert("declination", |t, _| t.get_declination().map(Json::from));
        self.getters.insert("rightascension", |t, _| t.get_right_ascension().map(Json::from));
        self.getters.insert("slewing", |t, _| t.get_slewing().map(Json::from));
        self.getters.insert("siderealtime", |t, _| t.get_sidereal_time().map(Json::from));
        self.getters.insert("athome", |t, _| t.get_at_home().map(Json::from));
        self.getters.insert("atpark", |t, _| t.get_at_park().map(Json::from));
        self.getters.insert("ispulseguiding", |t, _| t.get_ispulseguiding().map(Json::from));
        self.getters.insert("destinationsideofpier", |t, args| {
            let ra: f64 = args.get("RightAscension")?;
            let dec: f64 = args.get("Declination")?;
            t.get_destination_side_of_pier(ra, dec).map(Json::from)
        });

        self.getters.insert("canfindhome", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_FIND_HOME))));
        self.getters.insert("canpark", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_PARK))));
        self.getters.insert("canpulseguide", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_PULSE_GUIDE))));
        self.getters.insert("cansetdeclinationrate", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SET_DECLINATION_RATE))));
        self.getters.insert("cansetguiderates", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SET_GUIDE_RATES))));
        self.getters.insert("cansetpark", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SET_PARK))));
        self.getters.insert("cansetpierside", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SET_PIER_SIDE))));
        self.getters.insert("cansetrightascensionrate", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SET_RIGHT_ASCENSION_RATE))));
        self.getters.insert("cansettracking", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SET_TRACKING))));
        self.getters.insert("canslew", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SLEW))));
        self.getters.insert("canslewaltaz", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SLEW_ALTAZ))));
        self.getters.insert("canslewaltazasync", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SLEW_ALTAZ_ASYNC))));
        self.getters.insert("canslewasync", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SLEW_ASYNC))));
        self.getters.insert("cansync", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SYNC))));
        self.getters.insert("cansyncaltaz", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_SYNC_ALTAZ))));
        self.getters.insert("canunpark", |t, _| Ok(Json::from(t.capabilities.contains(crate::capabilities::Capabilities::CAN_UNPARK))));

        self.getters.insert("declinationrate", |t, _| t.get_declination_rate().map(Json::from));
        self.setters.insert("declinationrate", |t, args| t.set_declination_rate(args.get("DeclinationRate")?));
        self.getters.insert("rightascensionrate", |t, _| t.get_right_ascension_rate().map(Json::from));
        self.setters.insert("rightascensionrate", |t, args| t.set_right_ascension_rate(args.get("RightAscensionRate")?));
        self.getters.insert("guideratedeclination", |t, _| t.get_guide_rate_declination().map(Json::from));
        self.setters.insert("guideratedeclination", |t, args| t.set_guide_rate_declination(args.get("GuideRateDeclination")?));
        self.getters.insert("guideraterightascension", |t, _| t.get_guide_rate_right_ascension().map(Json::from));
        self.setters.insert("guideraterightascension", |t, args| t.set_guide_rate_right_ascension(args.get("GuideRateRightAscension")?));

        self.getters.insert("siteelevation", |t, _| t.get_site_elevation().map(Json::from));
        self.setters.insert("siteelevation", |t, args| t.set_site_elevation(args.get("SiteElevation")?));
        self.getters.insert("sitelatitude", |t, _| t.get_site_latitude().map(Json::from));
        self.setters.insert("sitelatitude", |t, args| t.set_site_latitude(args.get("SiteLatitude")?));
        self.getters.insert("sitelongitude", |t, _| t.get_site_longitude().map(Json::from));
        self.setters.insert("sitelongitude", |t, args| t.set_site_longitude(args.get("SiteLongitude")?));
        self.getters.insert("slewsettletime", |t, _| t.get_slew_settle_time().map(Json::from));
        self.setters.insert("slewsettletime", |t, args| t.set_slew_settle_time(args.get("SlewSettleTime")?));

        self.getters.insert("targetdeclination", |t, _| t.get_target_declination().map(Json::from));
        self.setters.insert("targetdeclination", |t, args| t.set_target_declination(args.get("TargetDeclination")?));
        self.getters.insert("targetrightascension", |t, _| t.get_target_right_ascension().map(Json::from));
        self.setters.insert("targetrightascension", |t, args| t.set_target_right_ascension(args.get("TargetRightAscension")?));

        self.getters.insert("tracking", |t, _| t.get_tracking().map(Json::from));
        self.setters.insert("tracking", |t, args| t.set_tracking(args.get("Tracking")?));
        self.getters.insert("trackingrate", |t, _| t.get_tracking_rate().map(Json::from));
        self.setters.insert("trackingrate", |t, args| t.set_tracking_rate(args.get("TrackingRate")?));

        self.getters.insert("utcdate", |t, _| {
            t.get_utc_date().map(|dt| Json::from(crate::nexstar::utc::format_alpaca_utc(dt)))
        });
        self.setters.insert("utcdate", |t, args| {
            let raw: String = args.get("UTCDate")?;
            let parsed = crate::nexstar::utc::parse_alpaca_utc(&raw).ok_or_else(|| Error::field_invalid("UTCDate"))?;
            t.set_utc_date(parsed)
        });

        self.getters.insert("axisrates", |t, args| {
            let axis: i32 = args.get("Axis")?;
            let ranges = t.get_axis_rates(axis)?;
            Ok(Json::array(ranges.into_iter().map(|(min, max)| {
                Json::object([("Minimum", Json::from(min)), ("Maximum", Json::from(max))])
            })))
        });
        self.getters.insert("trackingrates", |t, _| Ok(Json::array(t.metadata.supported_tracking_rates.iter().map(|r| Json::from(*r)))));

        self.setters.insert("abortslew", |t, _| t.abort_slew());
        self.setters.insert("findhome", |t, _| t.find_home());
        self.setters.insert("moveaxis", |t, args| {
            let axis: i32 = args.get("Axis")?;
            let rate: f64 = args.get("Rate")?;
            t.move_axis(axis, rate)
        });
        self.setters.insert("park", |t, _| t.park());
        self.setters.insert("setpark", |t, _| t.set_park());
        self.setters.insert("unpark", |t, _| t.unpark());
        self.setters.insert("pulseguide", |t, args| {
            let direction: i32 = args.get("Direction")?;
            let duration: i32 = args.get("Duration")?;
            t.pulse_guide(direction, duration)
        });
        self.setters.insert("slewtoaltaz", |t, args| {
            let az: f64 = args.get("Azimuth")?;
            let alt: f64 = args.get("Altitude")?;
            t.slew_to_alt_az(az, alt)
        });
        self.setters.insert("slewtoaltazasync", |t, args| {
            let az: f64 = args.get("Azimuth")?;
            let alt: f64 = args.get("Altitude")?;
            t.slew_to_alt_az_async(az, alt)
        });
        self.setters.insert("slewtocoordinates", |t, args| {
            let ra: f64 = args.get("RightAscension")?;
            let dec: f64 = args.get("Declination")?;
            t.slew_to_coordinates(ra, dec)
        });
        self.setters.insert("slewtocoordinatesasync", |t, args| {
            let ra: f64 = args.get("RightAscension")?;
            let dec: f64 = args.get("Declination")?;
            t.slew_to_coordinates_async(ra, dec)
        });
        self.setters.insert("slewtotarget", |t, _| t.slew_to_target());
        self.setters.insert("slewtotargetasync", |t, _| t.slew_to_target_async());
        self.setters.insert("synctoaltaz", |t, args| {
            let az: f64 = args.get("Azimuth")?;
            let alt: f64 = args.get("Altitude")?;
            t.sync_to_alt_az(az, alt)
        });
        self.setters.insert("synctocoordinates", |t, args| {
            let ra: f64 = args.get("RightAscension")?;
            let dec: f64 = args.get("Declination")?;
            t.sync_to_coordinates(ra, dec)
        });
        self.setters.insert("synctotarget", |t, _| t.sync_to_target());
    }

    /// Dispatch one request (spec.md §4.E steps 1-6). `device_type` and
    /// `device_id` are the raw URL segments; everything here returns an
    /// HTTP-kind [`Error`] for dispatcher-level failures, which never
    /// reaches the envelope.
    pub fn dispatch(&self, device_type: &str, device_id: &str, operation: &str, method: Method, args: &ArgumentMap) -> AlpacaResult<Json> {
        if device_type != "telescope" {
            return Err(Error::http(404, "unknown device type"));
        }
        let index: usize = device_id.parse().map_err(|_| Error::http(404, "invalid device number"))?;
        let telescope = self.devices.get(index).ok_or_else(|| Error::http(404, "unknown device number"))?;
        let operation = operation.to_ascii_lowercase();

        if operation == "action" {
            return match method {
                Method::Put => {
                    let action_name: String = args.get("Action")?;
                    let action = self.actions.get(action_name.as_str()).ok_or_else(Error::action_not_implemented)?;
                    action(telescope, args)
                }
                Method::Get => Err(Error::http(400, "action requires PUT")),
            };
        }

        match method {
            Method::Get => {
                let getter = self.getters.get(operation.as_str()).ok_or_else(|| Error::http(404, "unknown operation"))?;
                getter(telescope, args)
            }
            Method::Put => {
                let setter = self.setters.get(operation.as_str()).ok_or_else(|| Error::http(404, "unknown operation"))?;
                setter(telescope, args).map(|()| Json::Null)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::driver::CelestronDriver;
    use crate::nexstar::simulator::SimulatorTransport;
    use crate::params::Case;
    use crate::telescope::{StaticMetadata, Telescope};

    fn resource(capabilities: Capabilities) -> TelescopeResource {
        let telescope = Telescope::new(
            capabilities,
            StaticMetadata::default_for_tests(),
            Box::new(CelestronDriver::new(Box::new(SimulatorTransport::new()))),
        );
        TelescopeResource::new(vec![telescope])
    }

    #[test]
    fn unknown_device_type_is_http_404() {
        let r = resource(Capabilities::empty());
        let err = r.dispatch("camera", "0", "connected", Method::Get, &ArgumentMap::new(Case::Insensitive)).unwrap_err();
        assert_eq!(err.http_status(), Some(404));
    }

    #[test]
    fn unknown_device_number_is_http_404() {
        let r = resource(Capabilities::empty());
        let err = r.dispatch("telescope", "5", "connected", Method::Get, &ArgumentMap::new(Case::Insensitive)).unwrap_err();
        assert_eq!(err.http_status(), Some(404));
    }

    #[test]
    fn unknown_operation_is_http_404() {
        let r = resource(Capabilities::empty());
        let err = r.dispatch("telescope", "0", "nosuchthing", Method::Get, &ArgumentMap::new(Case::Insensitive)).unwrap_err();
        assert_eq!(err.http_status(), Some(404));
    }

    #[test]
    fn canpark_reflects_capability_word() {
        let r = resource(Capabilities::empty());
        let value = r.dispatch("telescope", "0", "canpark", Method::Get, &ArgumentMap::new(Case::Insensitive)).unwrap();
        assert_eq!(value, Json::Bool(false));
    }

    #[test]
    fn setter_ok_maps_to_json_null() {
        let r = resource(Capabilities::empty());
        let mut args = ArgumentMap::new(Case::Sensitive);
        args.insert("Connected".to_string(), "true".to_string());
        let value = r.dispatch("telescope", "0", "connected", Method::Put, &args).unwrap();
        assert_eq!(value, Json::Null);
    }

    fn connect(r: &TelescopeResource) {
        let mut args = ArgumentMap::new(Case::Sensitive);
        args.insert("Connected".to_string(), "true".to_string());
        r.dispatch("telescope", "0", "connected", Method::Put, &args).unwrap();
    }

    #[test]
    fn gps_valid_action_dispatches_to_driver() {
        let r = resource(Capabilities::empty());
        connect(&r);
        let mut args = ArgumentMap::new(Case::Sensitive);
        args.insert("Action".to_string(), "telescope:gps-valid".to_string());
        let value = r.dispatch("telescope", "0", "action", Method::Put, &args).unwrap();
        assert_eq!(value, Json::Bool(true));
    }

    #[test]
    fn unknown_action_is_action_not_implemented() {
        let r = resource(Capabilities::empty());
        connect(&r);
        let mut args = ArgumentMap::new(Case::Sensitive);
        args.insert("Action".to_string(), "telescope:nosuchaction".to_string());
        let err = r.dispatch("telescope", "0", "action", Method::Put, &args).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ActionNotImplemented);
    }

    #[test]
    fn siteelevation_out_of_range_surfaces_through_dispatch() {
        let r = resource(Capabilities::empty());
        let mut args = ArgumentMap::new(Case::Sensitive);
        args.insert("Connected".to_string(), "true".to_string());
        r.dispatch("telescope", "0", "connected", Method::Put, &args).unwrap();

        let mut args = ArgumentMap::new(Case::Sensitive);
        args.insert("SiteElevation".to_string(), "12000".to_string());
        let err = r.dispatch("telescope", "0", "siteelevation", Method::Put, &args).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::InvalidValue);
    }
}
