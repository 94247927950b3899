//! Visit-series shaping for the analytics views.
//!
//! The store returns sparse `(date, count)` rows; everything here turns them
//! into a gapless daily series and, for the SVG endpoint, into path
//! coordinates. Days without visits become explicit zero entries so the
//! chart never has holes.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use memoria_db::DateRange;
use memoria_types::api::DailyVisitStat;

/// Longest series the chart renders; wider windows keep the most recent days.
pub const MAX_CHART_DAYS: i64 = 60;

/// Preset aggregation periods accepted by the analytics endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Today,
    Week,
    Month,
    Year,
    All,
}

impl Period {
    pub fn parse(s: &str) -> Option<Period> {
        match s {
            "today" => Some(Period::Today),
            "week" => Some(Period::Week),
            "month" => Some(Period::Month),
            "year" => Some(Period::Year),
            "all" => Some(Period::All),
            _ => None,
        }
    }

    /// Day count charted for the period. `All` filters nothing but still
    /// charts a month of context.
    pub fn days(self) -> i64 {
        match self {
            Period::Today => 1,
            Period::Week => 7,
            Period::Month => 30,
            Period::Year => 365,
            Period::All => 30,
        }
    }

    /// Count-filter range ending today; `All` leaves totals unfiltered.
    pub fn date_range(self, today: NaiveDate) -> Option<DateRange> {
        match self {
            Period::All => None,
            _ => Some(DateRange {
                start: today - Duration::days(self.days() - 1),
                end: today,
            }),
        }
    }
}

/// Inclusive day count of a custom range.
pub fn range_days(range: DateRange) -> i64 {
    (range.end - range.start).num_days() + 1
}

/// The charted window for a series of `days` days ending at `end`:
/// contiguous, capped at [`MAX_CHART_DAYS`].
pub fn chart_window(days: i64, end: NaiveDate) -> DateRange {
    let len = days.clamp(1, MAX_CHART_DAYS);
    DateRange {
        start: end - Duration::days(len - 1),
        end,
    }
}

/// Densifies sparse `(date, count)` rows into a complete contiguous day
/// sequence of exactly `min(days, MAX_CHART_DAYS)` entries ending at `end`,
/// oldest first. Missing days get a zero count; rows outside the window are
/// dropped.
pub fn densify(sparse: &[(String, i64)], days: i64, end: NaiveDate) -> Vec<DailyVisitStat> {
    let window = chart_window(days, end);
    let by_date: HashMap<&str, i64> =
        sparse.iter().map(|(date, count)| (date.as_str(), *count)).collect();

    let mut series = Vec::with_capacity(range_days(window) as usize);
    let mut day = window.start;
    while day <= window.end {
        let date = day.to_string();
        let count = by_date.get(date.as_str()).copied().unwrap_or(0);
        series.push(DailyVisitStat { date, count });
        day = day + Duration::days(1);
    }
    series
}

/// SVG path for a densified series. x spans the width evenly; y normalizes
/// each count against the series maximum, with the denominator floored at 1
/// so an all-zero series draws a flat baseline instead of dividing by zero.
pub fn line_path(series: &[DailyVisitStat], width: f64, height: f64) -> String {
    if series.is_empty() {
        return String::new();
    }

    let max = series.iter().map(|d| d.count).max().unwrap_or(0).max(1) as f64;
    let mut path = String::new();
    for (i, stat) in series.iter().enumerate() {
        let x = if series.len() > 1 {
            i as f64 * width / (series.len() - 1) as f64
        } else {
            width / 2.0
        };
        let y = height - (stat.count as f64 / max) * height;
        if i == 0 {
            path.push_str(&format!("M{:.1},{:.1}", x, y));
        } else {
            path.push_str(&format!(" L{:.1},{:.1}", x, y));
        }
    }
    path
}

/// Standalone SVG document for the series.
pub fn render_svg(series: &[DailyVisitStat], width: u32, height: u32) -> String {
    let pad = 10.0;
    let inner_w = f64::from(width) - pad * 2.0;
    let inner_h = f64::from(height) - pad * 2.0;
    let path = line_path(series, inner_w, inner_h);

    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\
         <rect width=\"{w}\" height=\"{h}\" fill=\"white\"/>\
         <g transform=\"translate({pad},{pad})\">\
         <line x1=\"0\" y1=\"{ih:.1}\" x2=\"{iw:.1}\" y2=\"{ih:.1}\" stroke=\"#e5e7eb\" stroke-width=\"1\"/>\
         <path d=\"{path}\" fill=\"none\" stroke=\"#6366f1\" stroke-width=\"2\" stroke-linejoin=\"round\"/>\
         </g></svg>",
        w = width,
        h = height,
        pad = pad,
        iw = inner_w,
        ih = inner_h,
        path = path,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn week_with_one_point_two_days_ago() {
        let end = date("2024-06-10");
        let sparse = vec![("2024-06-08".to_string(), 4)];

        let series = densify(&sparse, Period::Week.days(), end);
        assert_eq!(series.len(), 7);
        assert_eq!(series.first().unwrap().date, "2024-06-04");
        assert_eq!(series.last().unwrap().date, "2024-06-10");
        assert_eq!(series.iter().filter(|d| d.count == 0).count(), 6);
        assert_eq!(series.iter().find(|d| d.date == "2024-06-08").unwrap().count, 4);
    }

    #[test]
    fn long_periods_cap_at_sixty_days() {
        let end = date("2024-06-10");
        let series = densify(&[], Period::Year.days(), end);
        assert_eq!(series.len(), MAX_CHART_DAYS as usize);
        assert_eq!(series.first().unwrap().date, "2024-04-12");
        assert!(series.iter().all(|d| d.count == 0));
    }

    #[test]
    fn rows_outside_the_window_are_dropped() {
        let end = date("2024-06-10");
        let sparse = vec![
            ("2024-01-01".to_string(), 99),
            ("2024-06-10".to_string(), 2),
        ];
        let series = densify(&sparse, 7, end);
        assert_eq!(series.iter().map(|d| d.count).sum::<i64>(), 2);
    }

    #[test]
    fn custom_range_day_count_is_inclusive() {
        let range = DateRange { start: date("2024-06-01"), end: date("2024-06-07") };
        assert_eq!(range_days(range), 7);
    }

    #[test]
    fn all_zero_series_draws_a_baseline() {
        let series = densify(&[], 3, date("2024-06-10"));
        let path = line_path(&series, 100.0, 50.0);
        // Every point sits on the bottom edge; no NaN from a zero maximum.
        assert_eq!(path, "M0.0,50.0 L50.0,50.0 L100.0,50.0");
    }

    #[test]
    fn path_normalizes_against_the_maximum() {
        let series = vec![
            DailyVisitStat { date: "2024-06-08".into(), count: 0 },
            DailyVisitStat { date: "2024-06-09".into(), count: 5 },
            DailyVisitStat { date: "2024-06-10".into(), count: 10 },
        ];
        let path = line_path(&series, 100.0, 100.0);
        assert_eq!(path, "M0.0,100.0 L50.0,50.0 L100.0,0.0");
    }

    #[test]
    fn single_point_centers_horizontally() {
        let series = vec![DailyVisitStat { date: "2024-06-10".into(), count: 3 }];
        assert_eq!(line_path(&series, 100.0, 50.0), "M50.0,0.0");
        assert_eq!(line_path(&[], 100.0, 50.0), "");
    }

    #[test]
    fn render_svg_embeds_the_path() {
        let series = densify(&[("2024-06-10".to_string(), 1)], 7, date("2024-06-10"));
        let svg = render_svg(&series, 640, 180);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("<path d=\"M"));
    }

    #[test]
    fn period_parsing_and_ranges() {
        assert_eq!(Period::parse("week"), Some(Period::Week));
        assert_eq!(Period::parse("quarter"), None);

        let today = date("2024-06-10");
        let range = Period::Week.date_range(today).unwrap();
        assert_eq!(range.start, date("2024-06-04"));
        assert_eq!(range.end, today);
        assert_eq!(Period::All.date_range(today), None);
        assert_eq!(Period::Today.date_range(today).unwrap().start, today);
    }
}
