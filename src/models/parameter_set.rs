use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::calculation::Bucket;

/// Resolved, version-pinned regulatory parameters for one calculation.
///
/// Produced by the external parameter-governance workflow; the engine is
/// handed exactly one resolved set per run and uses it consistently across
/// bucket classification and tier computation. Immutable once activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub version: String,
    pub effective_date: NaiveDate,
    pub bucket_threshold_1: Decimal,
    pub bucket_threshold_2: Decimal,
    pub marginal_coefficient_1: Decimal,
    pub marginal_coefficient_2: Decimal,
    pub marginal_coefficient_3: Decimal,
    pub lc_multiplier: Decimal,
    pub rwa_multiplier: Decimal,
    pub min_loss_threshold: Decimal,
    pub min_data_quality_years: u32,
    pub national_discretion_ilm_one: bool,
}

impl ParameterSet {
    /// The RBI Basel III SMA defaults: bucket thresholds of Rs 8,000 crore
    /// and Rs 2,40,000 crore, marginal coefficients 12%/15%/18%, loss
    /// multiplier 15, RWA multiplier 12.5 and a Rs 1 crore minimum loss
    /// threshold.
    pub fn rbi_default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            effective_date: NaiveDate::from_ymd_opt(2023, 4, 1)
                .unwrap_or(NaiveDate::MIN),
            bucket_threshold_1: Decimal::from(80_000_000_000_i64),
            bucket_threshold_2: Decimal::from(2_400_000_000_000_i64),
            marginal_coefficient_1: Decimal::new(12, 2),
            marginal_coefficient_2: Decimal::new(15, 2),
            marginal_coefficient_3: Decimal::new(18, 2),
            lc_multiplier: Decimal::from(15),
            rwa_multiplier: Decimal::new(125, 1),
            min_loss_threshold: Decimal::from(10_000_000),
            min_data_quality_years: 5,
            national_discretion_ilm_one: false,
        }
    }

    /// Marginal coefficient for a tier.
    pub fn marginal_coefficient(&self, bucket: Bucket) -> Decimal {
        match bucket {
            Bucket::One => self.marginal_coefficient_1,
            Bucket::Two => self.marginal_coefficient_2,
            Bucket::Three => self.marginal_coefficient_3,
        }
    }

    /// Consistency checks; every problem found is reported in one message.
    ///
    /// An inconsistent set is fatal for the whole calculation, so this runs
    /// once at engine construction rather than per component.
    pub fn validate(&self) -> Result<(), String> {
        let mut problems = Vec::new();

        if self.version.trim().is_empty() {
            problems.push("parameter version is empty".to_string());
        }
        if self.bucket_threshold_1 >= self.bucket_threshold_2 {
            problems.push(format!(
                "bucket_threshold_1 ({}) must be below bucket_threshold_2 ({})",
                self.bucket_threshold_1, self.bucket_threshold_2
            ));
        }
        if self.bucket_threshold_1 <= Decimal::ZERO {
            problems.push("bucket_threshold_1 must be positive".to_string());
        }
        for (name, value) in [
            ("marginal_coefficient_1", self.marginal_coefficient_1),
            ("marginal_coefficient_2", self.marginal_coefficient_2),
            ("marginal_coefficient_3", self.marginal_coefficient_3),
            ("lc_multiplier", self.lc_multiplier),
            ("min_loss_threshold", self.min_loss_threshold),
        ] {
            if value < Decimal::ZERO {
                problems.push(format!("{name} must not be negative, got {value}"));
            }
        }
        if self.rwa_multiplier <= Decimal::ZERO {
            problems.push(format!(
                "rwa_multiplier must be positive, got {}",
                self.rwa_multiplier
            ));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}
