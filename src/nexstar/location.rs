//! Site location payload: 8 bytes, `lat_deg, lat_min, lat_sec, lat_is_south,
//! lon_deg, lon_min, lon_sec, lon_is_west` (spec.md §3, §4.H opcodes `w`/`W`).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

fn deg_to_dms(deg: f64) -> (u8, u8, u8) {
    let total_seconds = (deg.abs() * 3600.0).round() as u32;
    let d = (total_seconds / 3600) as u8;
    let m = ((total_seconds % 3600) / 60) as u8;
    let s = (total_seconds % 60) as u8;
    (d, m, s)
}

fn dms_to_deg(d: u8, m: u8, s: u8) -> f64 {
    d as f64 + m as f64 / 60.0 + s as f64 / 3600.0
}

impl Location {
    pub fn encode(self) -> [u8; 8] {
        let (lat_d, lat_m, lat_s) = deg_to_dms(self.latitude_deg);
        let (lon_d, lon_m, lon_s) = deg_to_dms(self.longitude_deg);
        [
            lat_d,
            lat_m,
            lat_s,
            if self.latitude_deg < 0.0 { 1 } else { 0 },
            lon_d,
            lon_m,
            lon_s,
            if self.longitude_deg < 0.0 { 1 } else { 0 },
        ]
    }

    pub fn decode(bytes: [u8; 8]) -> Location {
        let [lat_d, lat_m, lat_s, lat_south, lon_d, lon_m, lon_s, lon_west] = bytes;
        let mut lat = dms_to_deg(lat_d, lat_m, lat_s);
        if lat_south != 0 {
            lat = -lat;
        }
        let mut lon = dms_to_deg(lon_d, lon_m, lon_s);
        if lon_west != 0 {
            lon = -lon;
        }
        Location {
            latitude_deg: lat,
            longitude_deg: lon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_float_eq::*;

    #[test]
    fn round_trips_northern_eastern() {
        let loc = Location {
            latitude_deg: 51.5,
            longitude_deg: 10.25,
        };
        let decoded = Location::decode(loc.encode());
        assert_float_absolute_eq!(decoded.latitude_deg, loc.latitude_deg, 1.0 / 3600.0);
        assert_float_absolute_eq!(decoded.longitude_deg, loc.longitude_deg, 1.0 / 3600.0);
    }

    #[test]
    fn round_trips_southern_western() {
        let loc = Location {
            latitude_deg: -33.9,
            longitude_deg: -118.4,
        };
        let decoded = Location::decode(loc.encode());
        assert_float_absolute_eq!(decoded.latitude_deg, loc.latitude_deg, 1.0 / 3600.0);
        assert_float_absolute_eq!(decoded.longitude_deg, loc.longitude_deg, 1.0 / 3600.0);
        let bytes = loc.encode();
        assert_eq!(bytes[3], 1);
        assert_eq!(bytes[7], 1);
    }
}
