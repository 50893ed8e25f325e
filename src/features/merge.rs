//! Join weekly aggregates with search interest and derive the covariates.
//!
//! Precondition for every join here: both series are numbered from the same
//! epoch (the configured start date). The aggregates get their week numbers from
//! `align::assign_weeks`; the search series gets them from its row order via
//! `index_search_weeks`. Nothing checks that week `k` on one side and week `k` on
//! the other cover the same calendar days; that is the caller's contract.
//!
//! The join is an inner join. Weeks present on only one side (typically the
//! boundary weeks) are dropped, not imputed, so the merged table can be shorter
//! than either input.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::domain::{LaggedRecord, MergedRecord, SearchSeries, Target, WeeklyAggregate, WeeklySearchRecord};

/// `(100 − vaccination) × hits`: search volume scaled by the unvaccinated share.
pub fn hit_vac(vaccination: f64, hits: u32) -> f64 {
    (100.0 - vaccination) * f64::from(hits)
}

/// Number the search series `1..=N` by position.
pub fn index_search_weeks(series: &SearchSeries) -> Vec<(u32, &WeeklySearchRecord)> {
    series
        .records
        .iter()
        .enumerate()
        .map(|(idx, r)| (idx as u32 + 1, r))
        .collect()
}

/// Inner-join aggregates and week-indexed search records on `week`.
///
/// Output is in ascending week order with lag fields filled from the previous
/// joined week.
pub fn join_on_week<'a, A>(aggregates: A, search: &[(u32, &WeeklySearchRecord)]) -> Vec<MergedRecord>
where
    A: IntoIterator<Item = &'a WeeklyAggregate>,
{
    let by_week: BTreeMap<u32, &WeeklySearchRecord> = search.iter().map(|&(w, r)| (w, r)).collect();

    let mut aggregates: Vec<&WeeklyAggregate> = aggregates.into_iter().collect();
    aggregates.sort_by_key(|a| a.week);

    let joined: Vec<MergedRecord> = aggregates
        .into_iter()
        .filter_map(|a| {
            let s = by_week.get(&a.week)?;
            Some(MergedRecord {
                week: a.week,
                location: a.location.clone(),
                avg_positive: a.avg_positive,
                vaccination: a.vaccination,
                hits: s.hits,
                hit_vac: s.hits.map(|h| hit_vac(a.vaccination, h)),
                hit_vac_lag: None,
                hits_lag: None,
                vac_lag: None,
            })
        })
        .collect();

    with_lags(joined)
}

/// Build the merged table for one target location.
///
/// Returns an empty table (never an error) when the series share no weeks, or
/// when the search series covers a different region than the target: such series
/// are unrelated even if their week numbers happen to overlap.
pub fn build_merged(aggregates: &[WeeklyAggregate], target: &Target, search: &SearchSeries) -> Vec<MergedRecord> {
    if !covers_target(&search.region, target) {
        warn!(
            location = %target.location,
            target_region = %target.region,
            search_region = %search.region,
            "Search series region does not match target; nothing to join"
        );
        return Vec::new();
    }

    let search_weeks = index_search_weeks(search);
    let merged = join_on_week(
        aggregates.iter().filter(|a| a.location == target.location),
        &search_weeks,
    );

    if merged.is_empty() {
        warn!(location = %target.location, "Weekly aggregates and search series share no weeks");
    } else {
        debug!(
            location = %target.location,
            search_weeks = search_weeks.len(),
            merged = merged.len(),
            "Joined weekly series"
        );
    }
    merged
}

/// The search region names the target by code (`GB`) or by location name.
fn covers_target(search_region: &str, target: &Target) -> bool {
    let region = search_region.trim();
    region.eq_ignore_ascii_case(target.region.trim()) || region.eq_ignore_ascii_case(target.location.trim())
}

/// Attach `*_lag` fields from the row one week earlier.
///
/// A row whose predecessor is not exactly `week − 1` gets no lags. A predecessor
/// with unreadable hits still provides `vac_lag`.
fn with_lags(rows: Vec<MergedRecord>) -> Vec<MergedRecord> {
    let mut out: Vec<MergedRecord> = Vec::with_capacity(rows.len());
    for mut row in rows {
        if let Some(prev) = out.last().filter(|p| p.week + 1 == row.week) {
            row.hit_vac_lag = prev.hit_vac;
            row.hits_lag = prev.hits;
            row.vac_lag = Some(prev.vaccination);
        }
        out.push(row);
    }
    out
}

/// Rows with a known previous week.
///
/// The first week of the merged table never appears here. Search-derived lags
/// stay optional because the previous week's hits may be unreadable.
pub fn lagged_view(merged: &[MergedRecord]) -> Vec<LaggedRecord> {
    merged
        .iter()
        .filter_map(|m| {
            Some(LaggedRecord {
                week: m.week,
                location: m.location.clone(),
                avg_positive: m.avg_positive,
                vaccination: m.vaccination,
                hits: m.hits,
                hit_vac: m.hit_vac,
                hit_vac_lag: m.hit_vac_lag,
                hits_lag: m.hits_lag,
                vac_lag: m.vac_lag?,
            })
        })
        .collect()
}
