//! Formatted terminal output.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation and output changes are localized.

use crate::domain::{MergedRecord, PipelineConfig, RegressionFit, WeeklyAggregate};
use crate::fit::ModelReport;

/// Header block describing the run.
pub fn format_run_summary(config: &PipelineConfig, n_weekly: usize, n_merged: usize) -> String {
    let mut out = String::new();
    out.push_str("=== hitvac - search interest vs test positivity ===\n");
    out.push_str(&format!(
        "Location: {} | search region: {}\n",
        config.target.location, config.target.region
    ));
    out.push_str(&format!("Keyword: \"{}\"\n", config.keyword));
    out.push_str(&format!(
        "Window: {} .. {} | search date offset: {:+} days\n",
        config.window.start, config.window.end, config.search_offset_days
    ));
    out.push_str(&format!(
        "Weeks: {n_weekly} aggregated | {n_merged} joined with search interest\n"
    ));
    out
}

/// The merged weekly table.
pub fn format_merged_table(rows: &[MergedRecord]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!(
            "{:>4} {:>12} {:>8} {:>5} {:>10} {:>11} {:>8} {:>8}",
            "week", "avg_positive", "vacc", "hits", "hit_vac", "hit_vac_lag", "hits_lag", "vac_lag"
        ),
    );
    push_line(
        &mut out,
        format!(
            "{:-<4} {:-<12} {:-<8} {:-<5} {:-<10} {:-<11} {:-<8} {:-<8}",
            "", "", "", "", "", "", "", ""
        ),
    );
    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:>4} {:>12} {:>8.2} {:>5} {:>10} {:>11} {:>8} {:>8}",
                r.week,
                fmt_opt(r.avg_positive, 4),
                r.vaccination,
                fmt_count(r.hits),
                fmt_opt(r.hit_vac, 1),
                fmt_opt(r.hit_vac_lag, 1),
                fmt_count(r.hits_lag),
                fmt_opt(r.vac_lag, 2),
            ),
        );
    }
    out
}

/// Weekly aggregates, grouped by location.
pub fn format_weekly_table(rows: &[WeeklyAggregate]) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        format!("{:<24} {:>4} {:>12} {:>8}", "location", "week", "avg_positive", "vacc"),
    );
    push_line(&mut out, format!("{:-<24} {:-<4} {:-<12} {:-<8}", "", "", "", ""));
    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:<24} {:>4} {:>12} {:>8.2}",
                truncate(&r.location, 24),
                r.week,
                fmt_opt(r.avg_positive, 4),
                r.vaccination
            ),
        );
    }
    out
}

/// Coefficient tables for fitted models plus the skipped list.
pub fn format_model_report(report: &ModelReport) -> String {
    let mut out = String::new();
    for (spec, fit) in &report.fits {
        out.push_str(&format!("\nModel: {}\n", spec.formula()));
        out.push_str(&format_fit(fit));
    }
    for (spec, reason) in &report.skipped {
        out.push_str(&format!("\n(skipped {}) {reason}\n", spec.formula()));
    }
    out
}

fn format_fit(fit: &RegressionFit) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "n={} | R²={} | adj R²={} | SSE={:.6}\n",
        fit.n,
        fmt_f(fit.r_squared, 4),
        fmt_f(fit.adj_r_squared, 4),
        fit.sse
    ));
    push_line(
        &mut out,
        format!("{:<12} {:>14} {:>14} {:>9}", "term", "estimate", "std_error", "t"),
    );
    for c in &fit.coefficients {
        push_line(
            &mut out,
            format!(
                "{:<12} {:>14.6e} {:>14.6e} {:>9}",
                c.name,
                c.estimate,
                c.std_error,
                fmt_f(c.t_value, 3)
            ),
        );
    }
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(v) => fmt_f(v, decimals),
        None => "-".to_string(),
    }
}

fn fmt_count(v: Option<u32>) -> String {
    v.map(|h| h.to_string()).unwrap_or_else(|| "-".to_string())
}

fn fmt_f(v: f64, decimals: usize) -> String {
    if v.is_finite() {
        format!("{v:.decimals$}")
    } else {
        "-".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Coefficient, ModelSpec};

    #[test]
    fn merged_table_shows_missing_lags_as_dash() {
        let rows = vec![MergedRecord {
            week: 1,
            location: "UK".to_string(),
            avg_positive: None,
            vaccination: 40.0,
            hits: Some(50),
            hit_vac: Some(3000.0),
            hit_vac_lag: None,
            hits_lag: None,
            vac_lag: None,
        }];
        let text = format_merged_table(&rows);
        let last = text.lines().last().unwrap();
        assert!(last.contains("3000.0"));
        assert!(last.ends_with('-'));
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn merged_table_shows_unreadable_hits_as_dash() {
        let rows = vec![MergedRecord {
            week: 2,
            location: "UK".to_string(),
            avg_positive: Some(0.05),
            vaccination: 40.0,
            hits: None,
            hit_vac: None,
            hit_vac_lag: Some(1200.0),
            hits_lag: Some(20),
            vac_lag: Some(40.0),
        }];
        let text = format_merged_table(&rows);
        let cells: Vec<&str> = text.lines().last().unwrap().split_whitespace().collect();
        assert_eq!(cells, vec!["2", "0.0500", "40.00", "-", "-", "1200.0", "20", "40.00"]);
    }

    #[test]
    fn model_report_lists_fits_and_skips() {
        let report = ModelReport {
            fits: vec![(
                ModelSpec::HitVac,
                RegressionFit {
                    n: 10,
                    coefficients: vec![Coefficient {
                        name: "const".to_string(),
                        estimate: 0.05,
                        std_error: 0.01,
                        t_value: 5.0,
                    }],
                    sse: 0.001,
                    r_squared: 0.5,
                    adj_r_squared: f64::NAN,
                },
            )],
            skipped: vec![(ModelSpec::ComponentsLag, "only 2 complete rows".to_string())],
        };
        let text = format_model_report(&report);
        assert!(text.contains("Model: avg_positive ~ hit_vac\n"));
        assert!(text.contains("adj R²=-"));
        assert!(text.contains("5.000"));
        assert!(text.contains("(skipped avg_positive ~ hits_lag + vac_lag) only 2 complete rows"));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("United Kingdom", 24), "United Kingdom");
        assert_eq!(truncate("Democratic Republic of Congo", 10), "Democrati.");
    }
}
