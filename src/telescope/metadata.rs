//! Telescope static metadata (spec.md §3): immutable after construction,
//! freely shared across handler threads.

#[derive(Debug, Clone)]
pub struct StaticMetadata {
    pub description: String,
    pub driver_info: String,
    pub driver_version: String,
    pub interface_version: i32,
    pub name: String,
    /// 0 = alt-az, 1 = polar (German equatorial), 2 = polar (fork).
    pub alignment_mode: i32,
    pub aperture_area_m2: f64,
    pub aperture_diameter_m: f64,
    pub focal_length_m: f64,
    /// ASCOM `EquatorialSystem` enum value (e.g. 2 = J2000).
    pub equatorial_system: i32,
    /// One `{minimum, maximum}` range list per axis, indexed 0..3.
    pub axis_rates: [Vec<(f64, f64)>; 3],
    /// ASCOM `DriveRate` values this mount accepts (0..=3).
    pub supported_tracking_rates: Vec<i32>,
}

impl StaticMetadata {
    pub fn for_celestron(model_name: &str, firmware: (u8, u8)) -> Self {
        StaticMetadata {
            description: format!("Celestron {model_name} (NexStar)"),
            driver_info: "nexstar-alpaca bridge".to_string(),
            driver_version: env!("CARGO_PKG_VERSION").to_string(),
            interface_version: 3,
            name: model_name.to_string(),
            alignment_mode: 0,
            aperture_area_m2: 0.0,
            aperture_diameter_m: 0.0,
            focal_length_m: 0.0,
            equatorial_system: 2,
            axis_rates: [
                vec![(0.0, 9.0)],
                vec![(0.0, 9.0)],
                vec![(0.0, 9.0)],
            ],
            supported_tracking_rates: vec![0, 1, 2, 3],
        }
        .with_firmware_note(firmware)
    }

    fn with_firmware_note(mut self, firmware: (u8, u8)) -> Self {
        self.driver_info = format!("{} (hand controller firmware {}.{})", self.driver_info, firmware.0, firmware.1);
        self
    }

    #[cfg(test)]
    pub fn default_for_tests() -> Self {
        StaticMetadata::for_celestron("Test Mount", (4, 21))
    }
}
