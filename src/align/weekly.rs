//! Daily → weekly alignment.
//!
//! Week numbers are positional: the `i`-th retained record of a location (1-based,
//! ordered by date) belongs to week `ceil(i / 7)`. Calendar weekdays play no part,
//! and a trailing partial week is kept as-is.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{DailyRecord, WeeklyAggregate};

/// Week index of the record at 1-based `position` within its location.
pub fn week_of(position: usize) -> u32 {
    position.div_ceil(7) as u32
}

/// Assign week numbers to one location's records.
///
/// Records after `end` are dropped; the rest are ordered by date (ties keep input
/// order) and numbered by position.
pub fn assign_weeks<'a, I>(records: I, end: NaiveDate) -> Vec<(u32, &'a DailyRecord)>
where
    I: IntoIterator<Item = &'a DailyRecord>,
{
    let mut kept: Vec<&DailyRecord> = records.into_iter().filter(|r| r.date <= end).collect();
    kept.sort_by_key(|r| r.date);
    kept.into_iter()
        .enumerate()
        .map(|(idx, r)| (week_of(idx + 1), r))
        .collect()
}

/// Average daily records into one `WeeklyAggregate` per `(location, week)`.
///
/// Input is expected to be filtered to `date >= start` already. Locations appear
/// in order of first appearance; a location with nothing left after the `end`
/// filter is absent from the output.
pub fn aggregate_weekly(records: &[DailyRecord], end: NaiveDate) -> Vec<WeeklyAggregate> {
    let mut order: Vec<&str> = Vec::new();
    let mut by_location: HashMap<&str, Vec<&DailyRecord>> = HashMap::new();
    for r in records {
        by_location
            .entry(r.location.as_str())
            .or_insert_with(|| {
                order.push(r.location.as_str());
                Vec::new()
            })
            .push(r);
    }

    let mut out = Vec::new();
    for location in order {
        let Some(rows) = by_location.remove(location) else {
            continue;
        };
        let weeks = assign_weeks(rows, end);
        let before = out.len();
        out.extend(aggregate_location(location, &weeks));
        debug!(location, days = weeks.len(), weeks = out.len() - before, "Aggregated location");
    }
    out
}

fn aggregate_location(location: &str, weeks: &[(u32, &DailyRecord)]) -> Vec<WeeklyAggregate> {
    let mut out = Vec::new();
    let mut acc: Option<(u32, WeekAccumulator)> = None;

    for &(week, r) in weeks {
        if let Some((current, a)) = acc.as_mut() {
            if *current == week {
                a.push(r);
                continue;
            }
        }
        if let Some((w, a)) = acc.take() {
            out.push(a.finish(location, w));
        }
        let mut a = WeekAccumulator::default();
        a.push(r);
        acc = Some((week, a));
    }
    if let Some((w, a)) = acc {
        out.push(a.finish(location, w));
    }
    out
}

#[derive(Debug, Default)]
struct WeekAccumulator {
    positive_sum: f64,
    positive_n: usize,
    vaccination_sum: f64,
    days: usize,
}

impl WeekAccumulator {
    fn push(&mut self, r: &DailyRecord) {
        if let Some(p) = r.positive_rate {
            self.positive_sum += p;
            self.positive_n += 1;
        }
        // No vaccination data yet counts as nobody vaccinated.
        self.vaccination_sum += r.vaccinated_per_hundred.unwrap_or(0.0);
        self.days += 1;
    }

    fn finish(self, location: &str, week: u32) -> WeeklyAggregate {
        let avg_positive = (self.positive_n > 0).then(|| self.positive_sum / self.positive_n as f64);
        WeeklyAggregate {
            location: location.to_string(),
            week,
            avg_positive,
            vaccination: self.vaccination_sum / self.days as f64,
        }
    }
}
