//! Time and date labels

use core::fmt::Write;

use chrono::{Datelike, NaiveDateTime, Timelike};
use heapless::String;

use crate::system::config::ClockStyle;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Formatted clock label texts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockReading {
    /// "09:05", or " 9:05" in 12 hour style
    pub time: String<8>,
    /// "Sun 03 Mar"
    pub date: String<16>,
}

impl ClockReading {
    pub fn new(now: NaiveDateTime, style: ClockStyle) -> Self {
        let mut time = String::new();
        // Largest output "23:59" fits
        let _ = match style {
            ClockStyle::TwentyFourHour => write!(time, "{:02}:{:02}", now.hour(), now.minute()),
            ClockStyle::TwelveHour => {
                let (_, hour) = now.hour12();
                write!(time, "{:>2}:{:02}", hour, now.minute())
            }
        };

        let mut date = String::new();
        let _ = write!(
            date,
            "{} {:02} {}",
            WEEKDAYS[now.weekday().num_days_from_monday() as usize],
            now.day(),
            MONTHS[now.month0() as usize],
        );

        Self { time, date }
    }
}
