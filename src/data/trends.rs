//! Search-interest sources.
//!
//! Two interchangeable sources implement `SearchProvider`:
//!
//! - `TrendsClient`: blocking HTTP JSON endpoint (configured from `.env`)
//! - `CsvSearchSource`: a CSV export saved from the search-interest website
//!
//! Both return the series in provider order. Week numbers are assigned later by
//! position (`features::index_search_weeks`), never from the dates themselves.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use chrono::{Duration, NaiveDate};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{DateWindow, SearchQuery, SearchSeries, WeeklySearchRecord};
use crate::error::AppError;
use crate::io::ingest::{normalize_header_name, parse_date};

const ENV_URL: &str = "TRENDS_API_URL";
const ENV_KEY: &str = "TRENDS_API_KEY";

/// Anything that can answer `(keyword, region, date-range)` with weekly hits.
pub trait SearchProvider {
    fn fetch(&self, query: &SearchQuery) -> Result<SearchSeries, AppError>;
}

/// HTTP client for a search-interest JSON endpoint.
///
/// Request: `GET <url>?keyword=..&geo=..&timeframe=YYYY-MM-DD%20YYYY-MM-DD[&api_key=..]`
/// Response: `{"timeline": [{"date": "YYYY-MM-DD", "value": 42}, ...]}`
pub struct TrendsClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl TrendsClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let base_url = std::env::var(ENV_URL).map_err(|_| {
            AppError::provider(format!(
                "Missing {ENV_URL} in environment (.env); pass --search-csv to use an exported file instead."
            ))
        })?;
        let api_key = std::env::var(ENV_KEY).ok().filter(|k| !k.trim().is_empty());
        Ok(Self::new(base_url, api_key))
    }
}

impl SearchProvider for TrendsClient {
    fn fetch(&self, query: &SearchQuery) -> Result<SearchSeries, AppError> {
        let mut req = self.client.get(&self.base_url).query(&[
            ("keyword", query.keyword.as_str()),
            ("geo", query.region.as_str()),
            ("timeframe", query.timeframe.as_str()),
        ]);
        if let Some(key) = &self.api_key {
            req = req.query(&[("api_key", key.as_str())]);
        }

        debug!(keyword = %query.keyword, geo = %query.region, timeframe = %query.timeframe, "Requesting search interest");
        let resp = req
            .send()
            .map_err(|e| AppError::provider(format!("Search-interest request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::provider(format!(
                "Search-interest request failed with status {}.",
                resp.status()
            )));
        }

        let body: TimelineResponse = resp
            .json()
            .map_err(|e| AppError::provider(format!("Failed to parse search-interest response: {e}")))?;

        // Trust the region the provider says it answered for over the one we asked for.
        let region = body
            .geo
            .clone()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| query.region.clone());
        let records = timeline_to_records(body)?;
        info!(keyword = %query.keyword, geo = %region, weeks = records.len(), "Fetched search interest");

        Ok(SearchSeries {
            keyword: query.keyword.clone(),
            region,
            records,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    geo: Option<String>,
    timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Deserialize)]
struct TimelinePoint {
    date: String,
    #[serde(default)]
    value: Option<u32>,
}

fn timeline_to_records(body: TimelineResponse) -> Result<Vec<WeeklySearchRecord>, AppError> {
    body.timeline
        .into_iter()
        .map(|p| {
            let date = parse_date(&p.date).map_err(AppError::provider)?;
            Ok(WeeklySearchRecord { date, hits: p.value })
        })
        .collect()
}

/// Search interest read from a CSV export.
///
/// The export may start with metadata lines (e.g. `Category: All categories`)
/// followed by a header such as `Week,loss of smell: (United Kingdom)`. The
/// first column holds the week-start date and the second the hits; a value of
/// `<1` is read as 0. The region named in the header's parentheses becomes the
/// series region; without one, the queried region is assumed.
pub struct CsvSearchSource {
    path: PathBuf,
}

impl CsvSearchSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SearchProvider for CsvSearchSource {
    fn fetch(&self, query: &SearchQuery) -> Result<SearchSeries, AppError> {
        let file = File::open(&self.path).map_err(|e| {
            AppError::input(format!("Failed to open search CSV '{}': {e}", self.path.display()))
        })?;
        let export = read_search_csv(file)?;
        let region = match export.region {
            Some(region) => region,
            None => {
                warn!(path = %self.path.display(), region = %query.region, "Search export names no region; assuming the queried one");
                query.region.clone()
            }
        };
        info!(path = %self.path.display(), %region, weeks = export.records.len(), "Loaded search interest export");

        Ok(SearchSeries {
            keyword: query.keyword.clone(),
            region,
            records: export.records,
        })
    }
}

/// Rows of a search-interest export plus the region its header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchExport {
    pub region: Option<String>,
    pub records: Vec<WeeklySearchRecord>,
}

/// Parse a search-interest CSV export from any reader.
///
/// Every row after the header keeps its position. A row whose hits cannot be
/// read gets `hits: None`; a row whose date cannot be read (or that is not valid
/// CSV at all) is placed on the weekly cadence of its neighbours.
pub fn read_search_csv<R: Read>(reader: R) -> Result<SearchExport, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut region = None;
    let mut header_seen = false;
    let mut rows: Vec<(Option<NaiveDate>, Option<u32>)> = Vec::new();
    let mut damaged = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                if header_seen {
                    damaged += 1;
                    rows.push((None, None));
                }
                debug!(line, "Search CSV parse error: {e}");
                continue;
            }
        };

        if !header_seen {
            let first = record.get(0).map(normalize_header_name).unwrap_or_default();
            if matches!(first.as_str(), "week" | "date") && record.len() >= 2 {
                header_seen = true;
                region = record.get(1).and_then(region_from_header);
            }
            continue;
        }

        let date = parse_date(record.get(0).unwrap_or_default()).ok();
        let raw = record.get(1).unwrap_or_default();
        let hits = parse_hits(raw);
        if date.is_none() || hits.is_none() {
            damaged += 1;
            debug!(line, hits = raw, "Unreadable search-interest row kept as missing");
        }
        rows.push((date, hits));
    }

    if !header_seen {
        return Err(AppError::input(
            "Search CSV has no `Week`/`Date` header row followed by a hits column.",
        ));
    }
    if damaged > 0 {
        warn!(count = damaged, "Search-interest rows with missing values");
    }

    let dates = fill_weekly_dates(rows.iter().map(|(d, _)| *d).collect())
        .ok_or_else(|| AppError::input("Search CSV has no readable week dates."))?;
    let records = dates
        .into_iter()
        .zip(rows)
        .map(|(date, (_, hits))| WeeklySearchRecord { date, hits })
        .collect();

    Ok(SearchExport { region, records })
}

/// `"loss of smell: (United Kingdom)"` -> `"United Kingdom"`.
fn region_from_header(cell: &str) -> Option<String> {
    let cell = cell.trim().strip_suffix(')')?;
    let open = cell.rfind('(')?;
    let region = cell[open + 1..].trim();
    (!region.is_empty()).then(|| region.to_string())
}

/// Fill unknown dates from the nearest known one on a 7-day cadence.
///
/// Returns `None` when no date is known (an empty input yields an empty vec).
fn fill_weekly_dates(dates: Vec<Option<NaiveDate>>) -> Option<Vec<NaiveDate>> {
    if dates.is_empty() {
        return Some(Vec::new());
    }
    let first_known = dates.iter().position(Option::is_some)?;
    let anchor = dates[first_known]?;

    let mut out = Vec::with_capacity(dates.len());
    for k in (1..=first_known).rev() {
        out.push(anchor - Duration::weeks(k as i64));
    }
    let mut prev = anchor;
    for d in &dates[first_known..] {
        let date = d.unwrap_or(prev + Duration::weeks(1));
        out.push(date);
        prev = date;
    }
    Some(out)
}

fn parse_hits(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if raw == "<1" {
        return Some(0);
    }
    raw.parse::<u32>().ok()
}

/// Shift provider dates forward by `offset_days`, then keep those inside `window`.
///
/// Order is preserved; it is what week numbers are derived from.
pub fn prepare_search_series(series: &SearchSeries, offset_days: i64, window: &DateWindow) -> SearchSeries {
    let shift = Duration::days(offset_days);
    let records: Vec<WeeklySearchRecord> = series
        .records
        .iter()
        .filter_map(|r| {
            let date: NaiveDate = r.date.checked_add_signed(shift)?;
            window.contains(date).then_some(WeeklySearchRecord { date, hits: r.hits })
        })
        .collect();

    debug!(
        before = series.records.len(),
        after = records.len(),
        offset_days,
        "Prepared search series"
    );

    SearchSeries {
        keyword: series.keyword.clone(),
        region: series.region.clone(),
        records,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn reads_export_with_metadata_preamble() {
        let csv = "Category: All categories\n\
                   \n\
                   Week,loss of smell: (United Kingdom)\n\
                   2020-11-29,45\n\
                   2020-12-06,<1\n\
                   2020-12-13,61\n";
        let export = read_search_csv(csv.as_bytes()).unwrap();
        assert_eq!(export.region.as_deref(), Some("United Kingdom"));
        assert_eq!(export.records.len(), 3);
        assert_eq!(export.records[0], WeeklySearchRecord { date: d(2020, 11, 29), hits: Some(45) });
        assert_eq!(export.records[1].hits, Some(0));
        assert_eq!(export.records[2].date, d(2020, 12, 13));
    }

    #[test]
    fn unreadable_hits_keep_their_position() {
        let csv = "Week,loss of smell: (United Kingdom)\n\
                   2020-12-01,10\n\
                   2020-12-08,oops\n\
                   2020-12-15,30\n\
                   2020-12-22,40\n";
        let export = read_search_csv(csv.as_bytes()).unwrap();
        let hits: Vec<Option<u32>> = export.records.iter().map(|r| r.hits).collect();
        assert_eq!(hits, vec![Some(10), None, Some(30), Some(40)]);
        assert_eq!(export.records[2].date, d(2020, 12, 15));

        let series = SearchSeries {
            keyword: "loss of smell".to_string(),
            region: "United Kingdom".to_string(),
            records: export.records,
        };
        let weeks: Vec<(u32, Option<u32>)> = crate::features::index_search_weeks(&series)
            .iter()
            .map(|(w, r)| (*w, r.hits))
            .collect();
        assert_eq!(weeks, vec![(1, Some(10)), (2, None), (3, Some(30)), (4, Some(40))]);
    }

    #[test]
    fn unreadable_dates_follow_weekly_cadence() {
        let csv = "Week,hits\n\
                   garbage,5\n\
                   2020-12-08,6\n\
                   also bad,7\n\
                   2020-12-22,8\n";
        let export = read_search_csv(csv.as_bytes()).unwrap();
        assert_eq!(export.region, None);
        let dates: Vec<NaiveDate> = export.records.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![d(2020, 12, 1), d(2020, 12, 8), d(2020, 12, 15), d(2020, 12, 22)]);
        assert_eq!(export.records[0].hits, Some(5));
    }

    #[test]
    fn invalid_utf8_row_is_kept_as_missing() {
        let mut bytes = b"Week,loss of smell: (France)\n2020-12-01,10\n".to_vec();
        bytes.extend_from_slice(b"2020-12-08,\xff\xfe\n");
        bytes.extend_from_slice(b"2020-12-15,30\n");
        let export = read_search_csv(bytes.as_slice()).unwrap();
        assert_eq!(export.region.as_deref(), Some("France"));
        assert_eq!(export.records.len(), 3);
        assert_eq!(export.records[1], WeeklySearchRecord { date: d(2020, 12, 8), hits: None });
        assert_eq!(export.records[2], WeeklySearchRecord { date: d(2020, 12, 15), hits: Some(30) });
    }

    #[test]
    fn export_without_header_is_rejected() {
        let csv = "2020-11-29,45\n2020-12-06,50\n";
        assert!(read_search_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn region_is_read_from_header_parentheses() {
        assert_eq!(region_from_header("loss of smell: (United Kingdom)").as_deref(), Some("United Kingdom"));
        assert_eq!(region_from_header("anosmia: (Worldwide)").as_deref(), Some("Worldwide"));
        assert_eq!(region_from_header("hits"), None);
        assert_eq!(region_from_header("x: ()"), None);
    }

    #[test]
    fn offset_is_applied_before_window_filter() {
        let series = SearchSeries {
            keyword: "loss of smell".to_string(),
            region: "GB".to_string(),
            records: vec![
                WeeklySearchRecord { date: d(2020, 11, 22), hits: Some(10) },
                WeeklySearchRecord { date: d(2020, 11, 29), hits: Some(20) },
                WeeklySearchRecord { date: d(2020, 12, 6), hits: None },
            ],
        };
        let window = DateWindow::new(d(2020, 12, 1), d(2021, 8, 11));
        let out = prepare_search_series(&series, 2, &window);

        // 2020-11-29 + 2 days lands on the window start.
        assert_eq!(out.records.len(), 2);
        assert_eq!(out.records[0], WeeklySearchRecord { date: d(2020, 12, 1), hits: Some(20) });
        assert_eq!(out.records[1].hits, None);
        assert_eq!(out.records[1].date, d(2020, 12, 8));

        let unshifted = prepare_search_series(&series, 0, &window);
        assert_eq!(unshifted.records.len(), 1);
    }

    #[test]
    fn timeline_payload_maps_to_records() {
        let body: TimelineResponse =
            serde_json::from_str(r#"{"geo":"GB","timeline":[{"date":"2021-01-03","value":7},{"date":"2021-01-10"}]}"#)
                .unwrap();
        assert_eq!(body.geo.as_deref(), Some("GB"));
        let records = timeline_to_records(body).unwrap();
        assert_eq!(
            records,
            vec![
                WeeklySearchRecord { date: d(2021, 1, 3), hits: Some(7) },
                WeeklySearchRecord { date: d(2021, 1, 10), hits: None },
            ]
        );
    }

    struct FixedProvider(Vec<WeeklySearchRecord>);

    impl SearchProvider for FixedProvider {
        fn fetch(&self, query: &SearchQuery) -> Result<SearchSeries, AppError> {
            Ok(SearchSeries {
                keyword: query.keyword.clone(),
                region: query.region.clone(),
                records: self.0.clone(),
            })
        }
    }

    #[test]
    fn providers_echo_query_identity() {
        let window = DateWindow::new(d(2020, 12, 1), d(2021, 8, 11));
        let query = SearchQuery::new("loss of smell", "GB", &window);
        let provider: &dyn SearchProvider = &FixedProvider(Vec::new());
        let series = provider.fetch(&query).unwrap();
        assert_eq!(series.region, "GB");
        assert_eq!(query.timeframe, "2020-12-01 2021-08-11");
    }
}
