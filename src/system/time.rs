//! Time keeping

use core::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};

/// Known wall-clock time at a known uptime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeReference {
    /// Clock time (UTC)
    time: NaiveDateTime,
    /// System uptime when `time` was valid
    uptime: Duration,
}

impl Default for TimeReference {
    fn default() -> Self {
        Self {
            time: NaiveDateTime::UNIX_EPOCH,
            uptime: Duration::ZERO,
        }
    }
}

impl TimeReference {
    /// Create new time reference from a UTC time observed at `uptime`
    pub fn from_datetime(time: NaiveDateTime, uptime: Duration) -> Self {
        Self { time, uptime }
    }

    /// Create new time reference from a UNIX timestamp observed at `uptime`
    pub fn from_timestamp(secs: i64, uptime: Duration) -> Self {
        let time = chrono::DateTime::from_timestamp(secs, 0)
            .map(|t| t.naive_utc())
            .unwrap_or(NaiveDateTime::UNIX_EPOCH);
        Self { time, uptime }
    }
}

/// Derives the local time from a reference and the current uptime
#[derive(Debug, Clone, Copy)]
pub struct TimeManager {
    reference: TimeReference,
    /// Offset of local time from UTC in seconds
    utc_offset: i32,
    /// Minute of the last reported tick, counted from the epoch
    last_minute: Option<i64>,
}

impl TimeManager {
    /// Initialize time measurement on boot
    pub fn init(reference: TimeReference, utc_offset: i32) -> Self {
        Self {
            reference,
            utc_offset,
            last_minute: None,
        }
    }

    /// Get current local time
    pub fn get_time(&self, uptime: Duration) -> NaiveDateTime {
        let elapsed = uptime.saturating_sub(self.reference.uptime);
        let elapsed = TimeDelta::try_milliseconds(elapsed.as_millis() as i64).unwrap_or(TimeDelta::zero());
        let offset = TimeDelta::try_seconds(self.utc_offset as i64).unwrap_or(TimeDelta::zero());
        self.reference.time + elapsed + offset
    }

    /// Update time reference
    pub fn set_time(&mut self, reference: TimeReference) {
        self.reference = reference;
        self.last_minute = None;
    }

    /// Update time reference from a local clock reading
    pub fn set_local_time(&mut self, local: NaiveDateTime, uptime: Duration) {
        let offset = TimeDelta::try_seconds(self.utc_offset as i64).unwrap_or(TimeDelta::zero());
        self.set_time(TimeReference::from_datetime(local - offset, uptime));
    }

    /// Return the local time if a new minute started since the last call.
    ///
    /// The first call after boot or after [`set_time`](Self::set_time)
    /// always reports a tick.
    pub fn minute_changed(&mut self, uptime: Duration) -> Option<NaiveDateTime> {
        let now = self.get_time(uptime);
        let minute = now.and_utc().timestamp().div_euclid(60);
        if self.last_minute == Some(minute) {
            return None;
        }
        self.last_minute = Some(minute);
        debug!("Minute tick at {}:{}", now.hour(), now.minute());
        Some(now)
    }
}

/// Local midnight of the day `now` belongs to
pub fn start_of_day(now: NaiveDateTime) -> NaiveDateTime {
    now.date().and_hms_opt(0, 0, 0).unwrap_or(now)
}

/// Decode a Bluetooth Current Time Service "Current Time" value.
///
/// The value holds the local date and time; out of range fields yield `None`.
pub fn cts_datetime(buf: &[u8; 10]) -> Option<NaiveDateTime> {
    let year = u16::from_le_bytes([buf[0], buf[1]]) as i32;
    let (month, day) = (buf[2] as u32, buf[3] as u32);
    let (hour, minute, second) = (buf[4] as u32, buf[5] as u32, buf[6] as u32);
    // buf[7] is the day of week, implied by the date
    let millis = buf[8] as u32 * 1000 / 256;

    Some(NaiveDateTime::new(
        NaiveDate::from_ymd_opt(year, month, day)?,
        NaiveTime::from_hms_milli_opt(hour, minute, second, millis)?,
    ))
}
