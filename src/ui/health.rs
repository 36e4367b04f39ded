//! Step and calorie summary

use core::fmt::Write;

use chrono::NaiveDateTime;
use heapless::String;

use super::label::LABEL_LEN;
use crate::system::time::start_of_day;

/// Metrics read from the health service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthMetric {
    StepCount,
    RestingKCalories,
    ActiveKCalories,
}

/// Source of health data
pub trait HealthService {
    /// Current local time as seen by the service
    fn now(&self) -> NaiveDateTime;

    /// Sum of `metric` between `start` and `end`
    fn sum(&self, metric: HealthMetric, start: NaiveDateTime, end: NaiveDateTime) -> i32;

    /// Whether data for `metric` is available between `start` and `end`
    fn is_available(&self, metric: HealthMetric, start: NaiveDateTime, end: NaiveDateTime)
        -> bool;
}

/// Health service of hardware without health sensors. Never has data.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHealth;

impl HealthService for NoHealth {
    fn now(&self) -> NaiveDateTime {
        NaiveDateTime::UNIX_EPOCH
    }

    fn sum(&self, _: HealthMetric, _: NaiveDateTime, _: NaiveDateTime) -> i32 {
        0
    }

    fn is_available(&self, _: HealthMetric, _: NaiveDateTime, _: NaiveDateTime) -> bool {
        false
    }
}

/// Totals for the current day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthSnapshot {
    pub steps_today: i32,
    /// Resting plus active calories
    pub kcal_today: i32,
    pub steps_available: bool,
    pub kcal_available: bool,
}

impl HealthSnapshot {
    /// Query today's totals from midnight up to `now`.
    ///
    /// Calorie availability follows the resting calories metric; the
    /// service reports both calorie metrics together.
    pub fn query<H: HealthService>(service: &H, now: NaiveDateTime) -> Self {
        let start = start_of_day(now);
        let mut snapshot = Self {
            steps_available: service.is_available(HealthMetric::StepCount, start, now),
            kcal_available: service.is_available(HealthMetric::RestingKCalories, start, now),
            ..Self::default()
        };
        if snapshot.steps_available {
            snapshot.steps_today = service.sum(HealthMetric::StepCount, start, now);
        }
        if snapshot.kcal_available {
            snapshot.kcal_today = service
                .sum(HealthMetric::RestingKCalories, start, now)
                .saturating_add(service.sum(HealthMetric::ActiveKCalories, start, now));
        }
        snapshot
    }

    /// Text of the steps label, `None` while no data is available
    pub fn steps_text(&self) -> Option<String<LABEL_LEN>> {
        self.steps_available
            .then(|| summary(self.steps_today, "Steps"))
    }

    /// Text of the calories label, `None` while no data is available
    pub fn kcal_text(&self) -> Option<String<LABEL_LEN>> {
        self.kcal_available.then(|| summary(self.kcal_today, "KCal"))
    }
}

fn summary(value: i32, unit: &str) -> String<LABEL_LEN> {
    let mut text = String::new();
    // An i32 and the unit stay well below LABEL_LEN
    let _ = write!(text, "{} {}", value, unit);
    text
}
