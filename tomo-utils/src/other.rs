//! Module containing some utility functions that didn't fit anywhere else.

use time::{format_description, OffsetDateTime};

/// Produces a timestamp `String` of the current time in YYYY-MM-DD_HH-mm-SS format.
pub fn get_timestamp() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    match format_description::parse("[year]-[month]-[day]_[hour]-[minute]-[second]")
        .map_err(|e| e.to_string())
        .and_then(|format| now.format(&format).map_err(|e| e.to_string()))
    {
        Ok(ts) => ts,
        Err(e) => {
            log::warn!("Cannot format the current time: {e}");
            now.unix_timestamp().to_string()
        }
    }
}

/// Formats an estimate for human consumption, printing `n/a` for values that are not yet
/// estimable.
pub fn fmt_estimate(x: f64) -> String {
    if x.is_nan() {
        "n/a".to_string()
    } else {
        format!("{x:.4}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamp_format() {
        let ts = get_timestamp();
        // YYYY-MM-DD_HH-mm-SS
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[10..11], "_");
    }

    #[test]
    fn estimate_format() {
        assert_eq!(fmt_estimate(f64::NAN), "n/a");
        assert_eq!(fmt_estimate(0.1), "0.1000");
    }
}
