use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;

/// The zone used to turn instants into calendar dates for plan progress,
/// the two-week check and daily gating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Zone {
    Named(Tz),
    Fixed(FixedOffset),
}

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = match raw.chars().next()? {
        '+' => (1, &raw[1..]),
        '-' => (-1, &raw[1..]),
        _ => return None,
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?),
        None if rest.len() > 2 => {
            let (h, m) = rest.split_at(rest.len() - 2);
            (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
        }
        None => (rest.parse::<i32>().ok()?, 0),
    };

    if hours > 14 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl Zone {
    /// IANA names (`Europe/Kyiv`), `UTC`/`GMT`, and offsets such as
    /// `UTC+2`, `GMT-03:30` or `+0530`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let upper = trimmed.to_ascii_uppercase();
        for prefix in ["UTC", "GMT"] {
            if let Some(offset) = upper.strip_prefix(prefix) {
                if offset.is_empty() {
                    return FixedOffset::east_opt(0).map(Zone::Fixed);
                }
                return parse_fixed_offset(offset).map(Zone::Fixed);
            }
        }
        if let Some(offset) = parse_fixed_offset(trimmed) {
            return Some(Zone::Fixed(offset));
        }

        let name = if trimmed == "Europe/Kiev" { "Europe/Kyiv" } else { trimmed };
        name.parse::<Tz>().ok().map(Zone::Named)
    }

    pub fn date_of(&self, utc: DateTime<Utc>) -> NaiveDate {
        match self {
            Zone::Named(tz) => utc.with_timezone(tz).date_naive(),
            Zone::Fixed(offset) => utc.with_timezone(offset).date_naive(),
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.date_of(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_names_and_offsets() {
        assert!(matches!(Zone::parse("Europe/Kiev"), Some(Zone::Named(_))));
        assert!(matches!(Zone::parse("America/New_York"), Some(Zone::Named(_))));
        assert_eq!(Zone::parse("utc"), FixedOffset::east_opt(0).map(Zone::Fixed));
        assert_eq!(Zone::parse("UTC+2"), FixedOffset::east_opt(7200).map(Zone::Fixed));
        assert_eq!(Zone::parse("+05:30"), FixedOffset::east_opt(19800).map(Zone::Fixed));
        assert_eq!(Zone::parse("GMT-0330"), FixedOffset::west_opt(12600).map(Zone::Fixed));
        assert!(Zone::parse("Mars/Olympus").is_none());
        assert!(Zone::parse("UTC+20").is_none());
        assert!(Zone::parse("  ").is_none());
    }

    #[test]
    fn local_date_crosses_midnight() {
        let instant = Utc.with_ymd_and_hms(2026, 3, 1, 23, 30, 0).unwrap();
        let kyiv = Zone::parse("Europe/Kyiv").unwrap();
        assert_eq!(kyiv.date_of(instant), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        let utc = Zone::parse("UTC").unwrap();
        assert_eq!(utc.date_of(instant), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }
}
