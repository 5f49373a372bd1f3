//! RTC payload: 8 bytes, `hour, minute, second, month, day, year-2000,
//! gmt_offset, isdst` (spec.md §3, §4.H opcodes `h`/`H`). The payload
//! carries **local** time; the driver converts to/from a UTC clock using
//! the carried offset. `gmt_offset` is unsigned on the wire, with
//! 128..=255 representing -128..=-1 hours.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RtcPayload {
    pub local: NaiveDateTime,
    pub gmt_offset_hours: i8,
    pub is_dst: bool,
}

impl RtcPayload {
    pub fn encode(self) -> [u8; 8] {
        let offset_byte = if self.gmt_offset_hours < 0 {
            (256 + self.gmt_offset_hours as i16) as u8
        } else {
            self.gmt_offset_hours as u8
        };
        [
            self.local.hour() as u8,
            self.local.minute() as u8,
            self.local.second() as u8,
            self.local.month() as u8,
            self.local.day() as u8,
            (self.local.year() - 2000).clamp(0, 255) as u8,
            offset_byte,
            self.is_dst as u8,
        ]
    }

    pub fn decode(bytes: [u8; 8]) -> Option<RtcPayload> {
        let [hour, minute, second, month, day, year, gmt_offset, is_dst] = bytes;
        let date = NaiveDate::from_ymd_opt(2000 + year as i32, month as u32, day as u32)?;
        let time = NaiveTime::from_hms_opt(hour as u32, minute as u32, second as u32)?;
        let offset_hours = if gmt_offset >= 128 {
            gmt_offset as i16 - 256
        } else {
            gmt_offset as i16
        } as i8;
        Some(RtcPayload {
            local: NaiveDateTime::new(date, time),
            gmt_offset_hours: offset_hours,
            is_dst: is_dst != 0,
        })
    }

    pub fn from_utc(utc: DateTime<Utc>, gmt_offset_hours: i8, is_dst: bool) -> RtcPayload {
        let local = utc.naive_utc() + Duration::hours(gmt_offset_hours as i64);
        RtcPayload {
            local,
            gmt_offset_hours,
            is_dst,
        }
    }

    pub fn to_utc(self) -> DateTime<Utc> {
        let naive_utc = self.local - Duration::hours(self.gmt_offset_hours as i64);
        Utc.from_utc_datetime(&naive_utc)
    }
}

/// Parse an ASCOM `UTCDate` string (ISO 8601, e.g.
/// `2016-03-04T14:15:21.1234567Z`). Per the open question in spec.md §9,
/// sub-second precision is accepted on input but not required on output.
pub fn parse_alpaca_utc(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Render a `DateTime<Utc>` in the format this bridge returns from
/// `GET utcdate`: whole seconds only, no fractional component.
pub fn format_alpaca_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_positive_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 0).unwrap();
        let payload = RtcPayload::from_utc(utc, 2, true);
        let bytes = payload.encode();
        let decoded = RtcPayload::decode(bytes).unwrap();
        assert_eq!(decoded.to_utc(), utc);
    }

    #[test]
    fn round_trips_negative_offset() {
        let utc = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let payload = RtcPayload::from_utc(utc, -8, false);
        let bytes = payload.encode();
        assert_eq!(bytes[6], (256 - 8) as u8);
        let decoded = RtcPayload::decode(bytes).unwrap();
        assert_eq!(decoded.to_utc(), utc);
    }

    #[test]
    fn parses_fractional_and_plain_iso8601() {
        let a = parse_alpaca_utc("2016-03-04T14:15:21.1234567Z").unwrap();
        let b = parse_alpaca_utc("2016-03-04T14:15:21Z").unwrap();
        assert_eq!(a.date_naive(), b.date_naive());
        assert_eq!(format_alpaca_utc(a), "2016-03-04T14:15:21Z");
    }

    #[test]
    fn drops_sub_second_precision_on_format() {
        let dt = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + Duration::milliseconds(750);
        assert_eq!(format_alpaca_utc(dt), "2020-01-01T00:00:00Z");
    }
}
