use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::business_indicator::BusinessIndicatorRecord;
use crate::models::loss_event::LossEventRecord;
use crate::models::supervisor_override::SupervisorOverride;

/// RBI size bucket derived from the averaged business indicator.
///
/// Closed set: classification and ILM gating match on it exhaustively, so a
/// new tier is a compile-time change, not a silent fallthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    One,
    Two,
    Three,
}

impl Bucket {
    pub fn as_number(self) -> u8 {
        match self {
            Bucket::One => 1,
            Bucket::Two => 2,
            Bucket::Three => 3,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_number())
    }
}

/// Everything one engine invocation consumes, already fetched by the
/// caller: the engine itself performs no I/O.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    /// Caller-generated unique run identifier.
    pub run_id: String,
    pub entity_id: String,
    pub calculation_date: NaiveDate,
    /// Most recent periods first; the aggregator uses at most three.
    pub business_indicators: Vec<BusinessIndicatorRecord>,
    /// Unordered loss history spanning at least the lookback window.
    pub loss_events: Vec<LossEventRecord>,
}

/// Immutable output of one SMA calculation run.
///
/// Created exactly once per `run_id`. A supervisor correction never edits
/// a result in place; it produces a new result whose `derived_from_run_id`
/// points back at the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaCalculationResult {
    pub run_id: String,
    pub entity_id: String,
    pub calculation_date: NaiveDate,
    pub bi_current: Decimal,
    pub bi_average: Decimal,
    pub bucket: Bucket,
    pub bic: Decimal,
    /// Per-tier contribution (tier amount x marginal coefficient); the
    /// entries sum to `bic`.
    pub bic_breakdown: BTreeMap<String, Decimal>,
    pub lc: Decimal,
    pub average_annual_loss: Decimal,
    pub loss_data_years: u32,
    pub ilm: Decimal,
    pub ilm_gated: bool,
    pub ilm_gate_reason: Option<String>,
    pub orc: Decimal,
    pub rwa: Decimal,
    pub parameter_version: String,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_from_run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_applied: Option<SupervisorOverride>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_ordering_and_display() {
        assert!(Bucket::One < Bucket::Two);
        assert!(Bucket::Two < Bucket::Three);
        assert_eq!(Bucket::Three.to_string(), "3");
        assert_eq!(Bucket::Two.as_number(), 2);
    }

    #[test]
    fn test_bucket_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Bucket::One).unwrap(), "\"one\"");
        let b: Bucket = serde_json::from_str("\"three\"").unwrap();
        assert_eq!(b, Bucket::Three);
    }
}
