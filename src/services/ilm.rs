use rust_decimal::{Decimal, MathematicalOps};
use serde::Serialize;
use tracing::debug;

use crate::models::{Bucket, ParameterSet};

/// One gating check and what it concluded. The full trace goes into the
/// audit record so a reviewer can see why the multiplier was or was not
/// applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatingCheck {
    pub check: String,
    pub outcome: GatingOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GatingOutcome {
    Passed,
    Gated,
}

/// Output of the ILM stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IlmOutcome {
    pub ilm: Decimal,
    pub gated: bool,
    pub gate_reason: Option<String>,
    pub checks: Vec<GatingCheck>,
}

/// Internal Loss Multiplier with its regulatory gating rules.
///
/// Gates are evaluated in a fixed order and the first match wins; a gated
/// multiplier is a flagged, explained outcome, never an error.
pub struct IlmCalculator {
    min_data_quality_years: u32,
    national_discretion_ilm_one: bool,
}

impl IlmCalculator {
    pub fn from_parameters(params: &ParameterSet) -> Self {
        Self {
            min_data_quality_years: params.min_data_quality_years,
            national_discretion_ilm_one: params.national_discretion_ilm_one,
        }
    }

    pub fn calculate(
        &self,
        lc: Decimal,
        bic: Decimal,
        bucket: Bucket,
        years_with_data: u32,
    ) -> IlmOutcome {
        let mut checks = Vec::new();

        let gate = |checks: &mut Vec<GatingCheck>, name: &str, reason: String| {
            checks.push(GatingCheck {
                check: name.to_string(),
                outcome: GatingOutcome::Gated,
            });
            debug!(check = name, %reason, "ILM gated");
            IlmOutcome {
                ilm: Decimal::ONE,
                gated: true,
                gate_reason: Some(reason),
                checks: checks.clone(),
            }
        };

        if bucket == Bucket::One {
            return gate(
                &mut checks,
                "bucket_1",
                "Bucket 1 capital uses BIC directly".to_string(),
            );
        }
        checks.push(GatingCheck {
            check: "bucket_1".to_string(),
            outcome: GatingOutcome::Passed,
        });

        if years_with_data < self.min_data_quality_years {
            return gate(
                &mut checks,
                "data_quality",
                format!(
                    "{} years < {} years of high-quality loss data",
                    years_with_data, self.min_data_quality_years
                ),
            );
        }
        checks.push(GatingCheck {
            check: "data_quality".to_string(),
            outcome: GatingOutcome::Passed,
        });

        if self.national_discretion_ilm_one {
            return gate(
                &mut checks,
                "national_discretion",
                "National discretion sets ILM to 1".to_string(),
            );
        }
        checks.push(GatingCheck {
            check: "national_discretion".to_string(),
            outcome: GatingOutcome::Passed,
        });

        if bic.is_zero() {
            return gate(
                &mut checks,
                "zero_bic",
                "BIC is zero, ILM defaulted to avoid division by zero".to_string(),
            );
        }
        checks.push(GatingCheck {
            check: "zero_bic".to_string(),
            outcome: GatingOutcome::Passed,
        });

        // ILM = ln(e - 1 + LC/BIC), floored at 1 so the multiplier never
        // reduces capital below the business-indicator component.
        let ratio = lc / bic;
        let ilm = (Decimal::E - Decimal::ONE + ratio).ln().max(Decimal::ONE);

        IlmOutcome {
            ilm,
            gated: false,
            gate_reason: None,
            checks,
        }
    }
}
