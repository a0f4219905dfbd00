use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Interval of calendar time polled on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl PollingWindow {
    /// Window of `range_secs` total width with `now` in the middle, or `None`
    /// when either bound falls outside the representable date range.
    pub fn centered_on(now: DateTime<Utc>, range_secs: u64) -> Option<Self> {
        let range_ms = i64::try_from(range_secs.checked_mul(1000)?).ok()?;
        let start = now.checked_sub_signed(TimeDelta::try_milliseconds(range_ms / 2)?)?;
        let end = start.checked_add_signed(TimeDelta::try_milliseconds(range_ms)?)?;
        Some(Self { start, end })
    }

    /// Lower bound in the calendar API's timestamp format.
    pub fn time_min(&self) -> String {
        format_timestamp(self.start)
    }

    /// Upper bound in the calendar API's timestamp format.
    pub fn time_max(&self) -> String {
        format_timestamp(self.end)
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
