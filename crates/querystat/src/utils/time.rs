use anyhow::{Context, Result, bail};
use time::{OffsetDateTime, Time};

pub const MICROS_PER_MILLI: i64 = 1_000;
pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

const NANOS_PER_MILLI: i128 = 1_000_000;

/// Converts epoch milliseconds into a UTC instant with microsecond resolution.
///
/// The sub-second part is taken with floor semantics, so `-1` maps to
/// `1969-12-31T23:59:59.999Z` rather than rounding toward the epoch.
pub fn to_instant(timestamp_ms: i64) -> Result<OffsetDateTime> {
    let seconds = timestamp_ms.div_euclid(MILLIS_PER_SECOND);
    let milliseconds = timestamp_ms.rem_euclid(MILLIS_PER_SECOND);

    let instant = OffsetDateTime::from_unix_timestamp(seconds)
        .with_context(|| format!("timestamp {timestamp_ms} is outside the supported calendar range"))?;
    let microsecond = u32::try_from(milliseconds * MICROS_PER_MILLI)
        .context("sub-second remainder must be non-negative")?;

    instant
        .replace_microsecond(microsecond)
        .with_context(|| format!("invalid sub-second component for timestamp {timestamp_ms}"))
}

/// Total milliseconds since the epoch, truncated toward zero.
#[must_use]
pub fn to_millis(instant: OffsetDateTime) -> i64 {
    // bounded by the calendar range `time` supports, well inside i64
    (instant.unix_timestamp_nanos() / NANOS_PER_MILLI) as i64
}

/// Clamps to `i64::MIN` when the day begins before the representable range.
#[must_use]
pub const fn day_start(timestamp_ms: i64) -> i64 {
    timestamp_ms.saturating_sub(timestamp_ms.rem_euclid(MILLIS_PER_DAY))
}

/// Same boundary as [`day_start`], computed by zeroing the time of day on the
/// calendar instant.
pub fn day_start_calendar(timestamp_ms: i64) -> Result<i64> {
    let instant = to_instant(timestamp_ms)?;
    Ok(to_millis(instant.replace_time(Time::MIDNIGHT)))
}

#[must_use]
pub const fn day_end_exclusive(day_start_ms: i64) -> i64 {
    day_start_ms.saturating_add(MILLIS_PER_DAY)
}

pub fn parse_millis(raw: &str) -> Result<i64> {
    let candidate = raw.trim();
    if candidate.is_empty() {
        bail!("timestamp input is empty");
    }

    candidate
        .parse::<i64>()
        .with_context(|| format!("invalid literal for integer timestamp: '{candidate}'"))
}

/// `DD.MM.YYYY` in UTC.
pub fn format_date(timestamp_ms: i64) -> Result<String> {
    let dt = to_instant(timestamp_ms)?;
    Ok(format!(
        "{:02}.{:02}.{:04}",
        dt.day(),
        u8::from(dt.month()),
        dt.year()
    ))
}

/// `YYYY-MM-DD HH:MM:SS[.ffffff]+00:00` in UTC. The fraction is left out on
/// whole seconds.
pub fn format_datetime(timestamp_ms: i64) -> Result<String> {
    let dt = to_instant(timestamp_ms)?;
    let fraction = match dt.microsecond() {
        0 => String::new(),
        micros => format!(".{micros:06}"),
    };
    Ok(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}{fraction}+00:00",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    ))
}
