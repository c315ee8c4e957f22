//! Read-only projections over a loaded dataset.
//!
//! Series extraction, the KPI panel with month-on-month and year-on-year
//! changes, base-100 indexing, year-on-year transforms and a two-series
//! calculator. All functions are pure; a missing input always yields a
//! missing output rather than an error.

use crate::dataset::Dataset;
use chrono::{Months, NaiveDate};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// One observation of a series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub period_date: NaiveDate,
    pub period_key: String,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(period_date: NaiveDate, value: Option<f64>) -> Self {
        Self {
            period_date,
            period_key: crate::normalize::period_key(period_date),
            value,
        }
    }
}

/// Inclusive range of `YYYY-MM` keys; an open end is unbounded
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodRange {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl PeriodRange {
    pub fn new(from: Option<String>, to: Option<String>) -> Self {
        Self { from, to }
    }

    pub fn all() -> Self {
        Self::default()
    }

    /// `YYYY-MM` keys order lexicographically like the dates they encode
    pub fn contains(&self, period_key: &str) -> bool {
        self.from.as_deref().is_none_or(|from| period_key >= from)
            && self.to.as_deref().is_none_or(|to| period_key <= to)
    }
}

/// Values of `indicator_code` for `entity_label`, ascending by period.
///
/// When a month holds several records the last one in canonical order wins.
pub fn series(
    dataset: &Dataset,
    entity_label: &str,
    indicator_code: &str,
    range: &PeriodRange,
) -> Vec<SeriesPoint> {
    let mut by_period: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();

    for record in dataset.records() {
        if record.entity_label == entity_label
            && record.indicator_code == indicator_code
            && range.contains(&record.period_key)
        {
            by_period.insert(record.period_date, record.value);
        }
    }

    by_period
        .into_iter()
        .map(|(date, value)| SeriesPoint::new(date, value))
        .collect()
}

/// One row of the KPI panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiRow {
    pub indicator_code: String,
    pub indicator_label: String,
    pub value: Option<f64>,
    /// Percent change against the previous month
    pub mom_pct: Option<f64>,
    /// Percent change against the same month a year earlier
    pub yoy_pct: Option<f64>,
}

/// `(current / previous - 1) * 100`; missing when either side is missing
/// or the previous value is zero
pub fn pct_change(current: Option<f64>, previous: Option<f64>) -> Option<f64> {
    match (current, previous) {
        (Some(current), Some(previous)) if previous != 0.0 => {
            Some((current / previous - 1.0) * 100.0)
        }
        _ => None,
    }
}

/// KPI rows for `entity_label` at `month_key` (`YYYY-MM`).
///
/// One row per requested code that has any data for the entity, sorted by
/// value descending with missing values last. An unparseable month key
/// yields rows with every figure missing.
pub fn panel(
    dataset: &Dataset,
    entity_label: &str,
    month_key: &str,
    codes: &[String],
) -> Vec<KpiRow> {
    let month = NaiveDate::parse_from_str(&format!("{}-01", month_key), "%Y-%m-%d").ok();
    let previous_month = month.and_then(|m| m.checked_sub_months(Months::new(1)));
    let previous_year = month.and_then(|m| m.checked_sub_months(Months::new(12)));

    let mut rows: Vec<KpiRow> = Vec::new();
    for code in codes {
        if rows.iter().any(|row| &row.indicator_code == code) {
            continue;
        }

        let mut label: Option<&str> = None;
        let mut values: BTreeMap<NaiveDate, Option<f64>> = BTreeMap::new();
        for record in dataset.records() {
            if record.entity_label == entity_label && &record.indicator_code == code {
                label.get_or_insert(record.indicator_label.as_str());
                values.insert(record.period_date, record.value);
            }
        }

        let Some(label) = label else {
            continue;
        };

        let at = |date: Option<NaiveDate>| date.and_then(|d| values.get(&d).copied().flatten());
        let value = at(month);

        rows.push(KpiRow {
            indicator_code: code.clone(),
            indicator_label: label.to_string(),
            value,
            mom_pct: pct_change(value, at(previous_month)),
            yoy_pct: pct_change(value, at(previous_year)),
        });
    }

    rows.sort_by(|a, b| match (a.value, b.value) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    rows
}

/// Indicator codes preselected for the panel: `preferred` codes present in
/// the catalog first, then the remaining catalog codes, at most `limit`
pub fn panel_codes(dataset: &Dataset, preferred: &[String], limit: usize) -> Vec<String> {
    let catalog = dataset.catalog();
    let mut codes: Vec<String> = Vec::new();

    let present = preferred
        .iter()
        .filter(|code| catalog.iter().any(|e| &e.code == *code));
    let rest = catalog.iter().map(|e| &e.code);

    for code in present.chain(rest) {
        if codes.len() == limit {
            break;
        }
        if !codes.contains(code) {
            codes.push(code.clone());
        }
    }

    codes
}

/// Rebase a series so its first observed value is 100.
///
/// Leading missing points stay missing. Every value is missing when the
/// series has no observed value or the first one is zero.
pub fn index_base100(points: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let base = points
        .iter()
        .find_map(|p| p.value)
        .filter(|base| *base != 0.0);

    points
        .iter()
        .map(|p| {
            let value = match (p.value, base) {
                (Some(v), Some(base)) => Some(v / base * 100.0),
                _ => None,
            };
            SeriesPoint::new(p.period_date, value)
        })
        .collect()
}

/// Percent change of each point against the same calendar month one year
/// earlier
pub fn yoy_change(points: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let by_period: BTreeMap<NaiveDate, Option<f64>> =
        points.iter().map(|p| (p.period_date, p.value)).collect();

    points
        .iter()
        .map(|p| {
            let year_ago = p
                .period_date
                .checked_sub_months(Months::new(12))
                .and_then(|d| by_period.get(&d).copied().flatten());
            SeriesPoint::new(p.period_date, pct_change(p.value, year_ago))
        })
        .collect()
}

/// Optional transform applied to compared series
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Transform {
    #[default]
    Raw,
    Base100,
    Yoy,
}

impl Transform {
    pub fn apply(self, points: Vec<SeriesPoint>) -> Vec<SeriesPoint> {
        match self {
            Transform::Raw => points,
            Transform::Base100 => index_base100(&points),
            Transform::Yoy => yoy_change(&points),
        }
    }
}

/// Arithmetic combining two series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operation {
    /// `None` for a missing operand or division by zero
    pub fn apply(self, a: Option<f64>, b: Option<f64>) -> Option<f64> {
        let (a, b) = (a?, b?);
        match self {
            Operation::Add => Some(a + b),
            Operation::Sub => Some(a - b),
            Operation::Mul => Some(a * b),
            Operation::Div if b == 0.0 => None,
            Operation::Div => Some(a / b),
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Sub => "-",
            Operation::Mul => "×",
            Operation::Div => "÷",
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "add" | "+" => Ok(Operation::Add),
            "sub" | "-" => Ok(Operation::Sub),
            "mul" | "*" | "×" | "x" => Ok(Operation::Mul),
            "div" | "/" | "÷" => Ok(Operation::Div),
            other => Err(format!(
                "unknown operation '{}', expected add, sub, mul or div",
                other
            )),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Sub => "sub",
            Operation::Mul => "mul",
            Operation::Div => "div",
        };
        f.write_str(name)
    }
}

/// Outer join of `a` and `b` by period, combined with `op`
pub fn calculate(a: &[SeriesPoint], b: &[SeriesPoint], op: Operation) -> Vec<SeriesPoint> {
    let mut joined: BTreeMap<NaiveDate, (Option<f64>, Option<f64>)> = BTreeMap::new();
    for point in a {
        joined.entry(point.period_date).or_default().0 = point.value;
    }
    for point in b {
        joined.entry(point.period_date).or_default().1 = point.value;
    }

    joined
        .into_iter()
        .map(|(date, (a, b))| SeriesPoint::new(date, op.apply(a, b)))
        .collect()
}
