use crate::models::point::NormalizedPoint;
use crate::risk::RiskLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RiskFilter {
    #[default]
    All,
    Only(RiskLevel),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PeriodFilter {
    #[default]
    Active,
    Past,
    All,
}

/// Dashboard facets. Defaults to every risk level, active alerts only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterState {
    pub risk: RiskFilter,
    pub period: PeriodFilter,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("unknown risk filter '{0}'")]
    Risk(String),
    #[error("unknown period filter '{0}'")]
    Period(String),
}

impl FromStr for RiskFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "todos" | "all" => Ok(RiskFilter::All),
            _ => RiskLevel::parse(s)
                .map(RiskFilter::Only)
                .ok_or_else(|| FilterError::Risk(s.to_string())),
        }
    }
}

impl FromStr for PeriodFilter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "ativos" | "active" => Ok(PeriodFilter::Active),
            "passados" | "past" => Ok(PeriodFilter::Past),
            "todos" | "all" => Ok(PeriodFilter::All),
            _ => Err(FilterError::Period(s.to_string())),
        }
    }
}

impl FilterState {
    pub fn matches(&self, point: &NormalizedPoint, now: DateTime<Utc>) -> bool {
        let risk_ok = match self.risk {
            RiskFilter::All => true,
            RiskFilter::Only(level) => point.risk == level,
        };
        let period_ok = match self.period {
            PeriodFilter::All => true,
            PeriodFilter::Active => point.is_active(now),
            PeriodFilter::Past => point.is_past(now),
        };
        risk_ok && period_ok
    }

    /// Visible subsequence, in input order.
    pub fn apply<'a>(
        &self,
        points: &'a [NormalizedPoint],
        now: DateTime<Utc>,
    ) -> Vec<&'a NormalizedPoint> {
        points.iter().filter(|p| self.matches(p, now)).collect()
    }
}

/// Dashboard tiles. Always computed over the unfiltered sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    #[serde(rename = "ativos")]
    pub active: usize,
    #[serde(rename = "alto")]
    pub high: usize,
    #[serde(rename = "medio")]
    pub medium: usize,
    #[serde(rename = "baixo")]
    pub low: usize,
}

impl Stats {
    pub fn compute(points: &[NormalizedPoint], now: DateTime<Utc>) -> Self {
        points.iter().fold(Stats::default(), |mut stats, point| {
            stats.total += 1;
            if point.is_active(now) {
                stats.active += 1;
            }
            match point.risk {
                RiskLevel::High => stats.high += 1,
                RiskLevel::Medium => stats.medium += 1,
                RiskLevel::Low => stats.low += 1,
            }
            stats
        })
    }
}
