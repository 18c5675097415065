use anyhow::{bail, Context, Result};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use std::time::UNIX_EPOCH;

pub type Timestamp = DateTime<Utc>;

/// Length of a round before the bomb is planted, as shown on the round clock.
pub const ROUND_TIMER_SECS: i64 = 115;
pub const BOMB_TIMER_SECS: i64 = 45;

const OUTPUT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f+00:00";
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub fn epoch() -> Timestamp {
    DateTime::from(UNIX_EPOCH)
}

/// Parses the timestamp shapes the demo exporter has produced over time: RFC 3339, naive ISO
/// 8601 (assumed UTC), ISO with a stray `T:` separator, and Go duration strings measured from
/// the start of the demo.
pub fn parse_timestamp(text: &str) -> Result<Timestamp> {
    let text = text.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Ok(date.with_timezone(&Utc));
    }

    let fixed = text.replacen("T:", "T", 1);
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&fixed, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    let offset = parse_go_duration(text)
        .with_context(|| format!("unrecognized timestamp {:?}", text))?;
    Ok(epoch() + offset)
}

/// Moves `time` so that `reference` lands on the Unix epoch.
pub fn rebase(time: Timestamp, reference: Timestamp) -> Timestamp {
    epoch() + (time - reference)
}

pub fn format_timestamp(time: Timestamp) -> String {
    time.format(OUTPUT_FORMAT).to_string()
}

/// Converts the remaining-time round clock ("1:23") into time elapsed since the round started.
pub fn parse_round_clock(text: &str) -> Result<Duration> {
    let remaining = parse_clock(text)?;
    Ok(Duration::seconds((ROUND_TIMER_SECS - remaining).max(0)))
}

/// Once the bomb is down the clock counts the bomb timer instead, restarting at the plant.
pub fn parse_bomb_clock(text: &str, plant: Duration) -> Result<Duration> {
    let remaining = parse_clock(text)?;
    Ok(plant + Duration::seconds((BOMB_TIMER_SECS - remaining).max(0)))
}

/// Seconds left on an "M:SS" clock.
fn parse_clock(text: &str) -> Result<i64> {
    let (minutes, seconds) = text
        .trim()
        .split_once(':')
        .with_context(|| format!("round clock {:?} is not M:SS", text))?;
    let minutes: i64 = minutes.parse().context("round clock minutes")?;
    let seconds: i64 = seconds.parse().context("round clock seconds")?;
    Ok(minutes * 60 + seconds)
}

fn parse_go_duration(text: &str) -> Result<Duration> {
    let (negative, mut rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if rest == "0" {
        return Ok(Duration::zero());
    }
    if rest.is_empty() {
        bail!("empty duration");
    }

    let mut total = 0_f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or_else(|| rest.len());
        if number_len == 0 {
            bail!("expected a number in {:?}", text);
        }
        let value: f64 = rest[..number_len].parse()?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or_else(|| rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" | "μs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            unit => bail!("unknown duration unit {:?} in {:?}", unit, text),
        };
        rest = &rest[unit_len..];
        total += value * nanos_per_unit;
    }

    #[allow(clippy::cast_possible_truncation)]
    let nanos = total.round() as i64;
    Ok(Duration::nanoseconds(if negative { -nanos } else { nanos }))
}

#[cfg(test)]
mod tests {
    use super::{
        epoch, format_timestamp, parse_bomb_clock, parse_go_duration, parse_round_clock,
        parse_timestamp, rebase,
    };
    use chrono::Duration;

    #[test]
    fn test_parse_timestamp() {
        let expected = "2024-03-01T12:00:05.250+00:00";
        for text in &[
            "2024-03-01T12:00:05.25Z",
            "2024-03-01T14:00:05.250+02:00",
            "2024-03-01T12:00:05.250",
            "2024-03-01 12:00:05.250",
            "2024-03-01T:12:00:05.250",
        ] {
            assert_eq!(format_timestamp(parse_timestamp(text).unwrap()), expected);
        }
        assert_eq!(
            format_timestamp(parse_timestamp("2024-03-01T12:00:05").unwrap()),
            "2024-03-01T12:00:05.000+00:00"
        );
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_go_durations() {
        assert_eq!(parse_go_duration("0").unwrap(), Duration::zero());
        assert_eq!(parse_go_duration("850ms").unwrap(), Duration::milliseconds(850));
        assert_eq!(
            parse_go_duration("1m23.5s").unwrap(),
            Duration::milliseconds(83_500)
        );
        assert_eq!(
            parse_go_duration("1h2m3s").unwrap(),
            Duration::seconds(3723)
        );
        assert_eq!(parse_go_duration("-2s").unwrap(), Duration::seconds(-2));
        assert!(parse_go_duration("3 parsecs").is_err());
        assert!(parse_go_duration("s").is_err());

        assert_eq!(
            format_timestamp(parse_timestamp("1m23.456s").unwrap()),
            "1970-01-01T00:01:23.456+00:00"
        );
    }

    #[test]
    fn test_rebase() {
        let start = parse_timestamp("2024-03-01T12:00:00").unwrap();
        let kill = parse_timestamp("2024-03-01T12:01:02.5").unwrap();
        assert_eq!(
            format_timestamp(rebase(kill, start)),
            "1970-01-01T00:01:02.500+00:00"
        );
        assert_eq!(rebase(start, start), epoch());
        assert!(rebase(start, kill) < epoch());
    }

    #[test]
    fn test_round_clock() {
        assert_eq!(parse_round_clock("1:55").unwrap(), Duration::zero());
        assert_eq!(parse_round_clock("1:23").unwrap(), Duration::seconds(32));
        assert_eq!(parse_round_clock("0:00").unwrap(), Duration::seconds(115));
        // clamped to the round start
        assert_eq!(parse_round_clock("2:30").unwrap(), Duration::zero());
        assert!(parse_round_clock("83").is_err());
    }

    #[test]
    fn test_bomb_clock() {
        let plant = Duration::seconds(100);
        assert_eq!(parse_bomb_clock("0:45", plant).unwrap(), plant);
        assert_eq!(parse_bomb_clock("0:40", plant).unwrap(), Duration::seconds(105));
        assert_eq!(parse_bomb_clock("0:00", plant).unwrap(), Duration::seconds(145));
        assert!(parse_bomb_clock("soon", plant).is_err());
    }
}
