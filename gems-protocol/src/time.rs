use crate::error::ProtocolError;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A GEMS instant: Unix seconds plus a nanosecond fraction.
///
/// Two textual forms exist on the wire. The `time` form is
/// `<seconds>.<nanoseconds>` with the fraction printed as nine digits; the
/// `utime` form is an ordinal-date UTC timestamp
/// `YYYY-DDDTHH:MM:SS.nnnnnnnnnZ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GemsTime {
    secs: i64,
    nanos: u32,
}

impl GemsTime {
    pub fn new(secs: i64, nanos: u32) -> Self {
        let extra = (nanos as u64 / NANOS_PER_SEC) as i64;
        GemsTime {
            secs: secs + extra,
            nanos: (nanos as u64 % NANOS_PER_SEC) as u32,
        }
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        let now = Utc::now();
        GemsTime {
            secs: now.timestamp(),
            nanos: now.timestamp_subsec_nanos(),
        }
    }

    pub fn secs(&self) -> i64 {
        self.secs
    }

    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// True for the zero value, which message headers treat as "unset".
    pub fn is_zero(&self) -> bool {
        self.secs == 0 && self.nanos == 0
    }

    /// Parse the `time` form: `<seconds>[.<fraction>]`.
    ///
    /// A short fraction is right-padded with zeros to nanosecond precision,
    /// so `1410819035.28` reads as 280 ms.
    pub fn from_time_str(s: &str) -> Result<Self, ProtocolError> {
        let (sec_str, frac) = match s.split_once('.') {
            Some((sec, frac)) => (sec, Some(frac)),
            None => (s, None),
        };

        let secs: i64 = sec_str
            .parse()
            .map_err(|_| ProtocolError::unmarshal(s, "invalid syntax in time value"))?;

        let mut nanos: u64 = 0;
        if let Some(frac) = frac {
            let mut padded = frac.to_string();
            while padded.len() < 9 {
                padded.push('0');
            }
            nanos = padded
                .parse()
                .map_err(|_| ProtocolError::unmarshal(s, "invalid syntax in time value"))?;
        }

        Ok(GemsTime::new(secs + (nanos / NANOS_PER_SEC) as i64, (nanos % NANOS_PER_SEC) as u32))
    }

    /// Parse the `utime` form: `YYYY-DDDTHH:MM:SS.fffZ`.
    ///
    /// The decimal separator and the `Z` suffix are mandatory; the fraction
    /// may carry fewer than nine digits.
    pub fn from_utime_str(s: &str) -> Result<Self, ProtocolError> {
        let stripped = s
            .strip_suffix('Z')
            .ok_or_else(|| ProtocolError::unmarshal(s, "Utime missing 'Z' time zone character"))?;
        if !stripped.contains('.') {
            return Err(ProtocolError::unmarshal(
                s,
                "Utime missing decimal seconds separator",
            ));
        }

        let dt = NaiveDateTime::parse_from_str(stripped, "%Y-%jT%H:%M:%S%.f")
            .map_err(|e| ProtocolError::unmarshal(s, format!("invalid utime value: {e}")))?;
        let dt = dt.and_utc();
        Ok(GemsTime {
            secs: dt.timestamp(),
            nanos: dt.timestamp_subsec_nanos(),
        })
    }

    /// The `time` wire form, with a full nine-digit fraction.
    pub fn format_time(&self) -> String {
        format!("{}.{:09}", self.secs, self.nanos)
    }

    /// The `utime` wire form (ordinal date, nanosecond precision, UTC).
    pub fn format_utime(&self) -> String {
        match DateTime::<Utc>::from_timestamp(self.secs, self.nanos) {
            Some(dt) => dt.format("%Y-%jT%H:%M:%S.%fZ").to_string(),
            None => String::new(),
        }
    }

    /// The abbreviated form used for XML header attributes: the `time` form
    /// with trailing fraction zeros trimmed.
    pub fn format_attr(&self) -> String {
        let s = self.format_time();
        s.trim_end_matches('0').to_string()
    }
}

impl fmt::Display for GemsTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_fraction_is_right_padded() {
        let t = GemsTime::from_time_str("1410819035.28").unwrap();
        assert_eq!(t.secs(), 1410819035);
        assert_eq!(t.nanos(), 280_000_000);
        assert_eq!(t.format_time(), "1410819035.280000000");
        assert_eq!(t.format_attr(), "1410819035.28");
    }

    #[test]
    fn fraction_is_optional_on_decode() {
        let t = GemsTime::from_time_str("1410819035").unwrap();
        assert_eq!(t.secs(), 1410819035);
        assert_eq!(t.nanos(), 0);
    }

    #[test]
    fn long_fraction_overflows_into_seconds() {
        // Ten fraction digits: 1.5 billion nanoseconds.
        let t = GemsTime::from_time_str("10.1500000000").unwrap();
        assert_eq!(t.secs(), 11);
        assert_eq!(t.nanos(), 500_000_000);
    }

    #[test]
    fn rejects_garbage_seconds() {
        assert!(GemsTime::from_time_str("7:51").is_err());
    }

    #[test]
    fn utime_round_trip() {
        let t = GemsTime::from_utime_str("2009-273T09:14:50.02Z").unwrap();
        assert_eq!(t.format_utime(), "2009-273T09:14:50.020000000Z");

        let again = GemsTime::from_utime_str(&t.format_utime()).unwrap();
        assert_eq!(again, t);
    }

    #[test]
    fn utime_requires_fraction_and_zone() {
        assert!(GemsTime::from_utime_str("2009-273T09:14:50Z").is_err());
        assert!(GemsTime::from_utime_str("2009-273T09:14:50.02").is_err());
    }

    #[test]
    fn utime_matches_time_instant() {
        // 2014-09-15T17:22:58.49023 UTC == 1410801778.49023? Use a known pair:
        let t = GemsTime::from_time_str("1410804178.49023000").unwrap();
        assert_eq!(t.format_time(), "1410804178.490230000");
        let u = GemsTime::from_utime_str(&t.format_utime()).unwrap();
        assert_eq!(u, t);
    }
}
