//! `daten` timestamp conversions.
//!
//! A `daten` is an unsigned 32-bit count of seconds since the Unix epoch as
//! stored in WWIVnet headers. Packet text carries dates as strings, in the
//! WWIVnet style inside WWIVnet payloads and in the FTS-0001 style inside
//! FidoNet envelopes. All conversions here are UTC; the packet layer never
//! consults the local clock or time zone itself.

use chrono::{DateTime, NaiveDateTime, Utc};

/// `strftime` pattern of the date line inside WWIVnet message text.
const WWIVNET_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// FTS-0001 envelope date: `"02 Jan 06  15:04:05"`.
const FIDO_DATE_FORMAT: &str = "%d %b %y  %H:%M:%S";

/// Length of an FTS-0001 date string, excluding the NUL.
pub const FIDO_DATE_LEN: usize = 19;

/// Convert a `daten` to a UTC timestamp.
pub fn daten_to_datetime(daten: u32) -> DateTime<Utc> {
    DateTime::from_timestamp(i64::from(daten), 0).unwrap_or(DateTime::UNIX_EPOCH)
}

/// Convert a UTC timestamp to a `daten`, clamping to the representable range.
pub fn datetime_to_daten(dt: DateTime<Utc>) -> u32 {
    dt.timestamp().clamp(0, i64::from(u32::MAX)) as u32
}

/// Date line used in WWIVnet message text, e.g. `"Mon Jan 02 15:04:05 2006"`.
pub fn daten_to_wwivnet_time(daten: u32) -> String {
    daten_to_datetime(daten)
        .format(WWIVNET_DATE_FORMAT)
        .to_string()
}

/// FTS-0001 envelope date, e.g. `"02 Jan 06  15:04:05"`.
pub fn daten_to_fido(daten: u32) -> String {
    daten_to_datetime(daten).format(FIDO_DATE_FORMAT).to_string()
}

/// Parse a FidoNet envelope date.
///
/// Accepts the FTS-0001 form (`"02 Jan 06  15:04:05"`) and the SEAdog form
/// (`"Mon  2 Jan 06 15:04"`). Returns `None` for anything else.
pub fn fido_to_daten(date: &str) -> Option<u32> {
    let date = date.trim_end_matches('\0').trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(date, FIDO_DATE_FORMAT) {
        return Some(datetime_to_daten(dt.and_utc()));
    }

    // SEAdog: weekday, day, month, two digit year, HH:MM.
    let tokens: Vec<&str> = date.split_whitespace().collect();
    if tokens.len() == 5 && tokens[0].chars().all(|c| c.is_ascii_alphabetic()) {
        let normalized = format!("{} {} {} {}:00", tokens[1], tokens[2], tokens[3], tokens[4]);
        if let Ok(dt) = NaiveDateTime::parse_from_str(&normalized, "%d %b %y %H:%M:%S") {
            return Some(datetime_to_daten(dt.and_utc()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_daten() -> u32 {
        datetime_to_daten(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap())
    }

    #[test]
    fn test_wwivnet_time() {
        assert_eq!(daten_to_wwivnet_time(sample_daten()), "Mon Jan 02 15:04:05 2006");
    }

    #[test]
    fn test_fido_date_format() {
        let s = daten_to_fido(sample_daten());
        assert_eq!(s, "02 Jan 06  15:04:05");
        assert_eq!(s.len(), FIDO_DATE_LEN);
    }

    #[test]
    fn test_fido_to_daten_fts0001() {
        assert_eq!(fido_to_daten("02 Jan 06  15:04:05"), Some(sample_daten()));
    }

    #[test]
    fn test_fido_to_daten_seadog() {
        let expected = datetime_to_daten(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 0).unwrap());
        assert_eq!(fido_to_daten("Mon  2 Jan 06 15:04"), Some(expected));
    }

    #[test]
    fn test_fido_to_daten_garbage() {
        assert_eq!(fido_to_daten("yesterday"), None);
        assert_eq!(fido_to_daten(""), None);
    }

    #[test]
    fn test_daten_clamping() {
        let before_epoch = Utc.with_ymd_and_hms(1960, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(datetime_to_daten(before_epoch), 0);
        assert_eq!(daten_to_datetime(0), DateTime::UNIX_EPOCH);
    }
}
