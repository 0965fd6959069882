use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::types::{EngineError, ValidationError};
use crate::models::{OverrideType, ParameterSet, SmaCalculationResult, SupervisorOverride};
use crate::utils::math::round_half_up_2dp;

/// Applies approved supervisor overrides to completed calculations.
///
/// An override never mutates the original result: it yields a new result
/// under a new run id that references the original and carries the
/// override's approval provenance.
pub struct OverrideService {
    rwa_multiplier: Decimal,
}

impl OverrideService {
    pub fn from_parameters(params: &ParameterSet) -> Self {
        Self {
            rwa_multiplier: params.rwa_multiplier,
        }
    }

    pub fn apply(
        &self,
        original: &SmaCalculationResult,
        supervisor_override: &SupervisorOverride,
        new_run_id: &str,
    ) -> Result<SmaCalculationResult, EngineError> {
        let errors = Self::validate(supervisor_override, new_run_id);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        let mut derived = original.clone();
        derived.run_id = new_run_id.to_string();
        derived.derived_from_run_id = Some(original.run_id.clone());
        derived.override_applied = Some(supervisor_override.clone());
        derived.timestamp = Utc::now();

        match supervisor_override.override_type {
            OverrideType::CapitalAdjustment => {
                derived.orc = round_half_up_2dp(supervisor_override.value);
            }
            OverrideType::IlmOverride => {
                derived.ilm = supervisor_override.value;
                derived.ilm_gated = false;
                derived.ilm_gate_reason = None;
                derived.orc = round_half_up_2dp(original.bic * supervisor_override.value);
            }
        }
        derived.rwa = round_half_up_2dp(derived.orc * self.rwa_multiplier);

        info!(
            original_run_id = %original.run_id,
            derived_run_id = %derived.run_id,
            approved_by = %supervisor_override.approved_by,
            "supervisor override applied"
        );

        Ok(derived)
    }

    fn validate(supervisor_override: &SupervisorOverride, new_run_id: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if new_run_id.trim().is_empty() {
            errors.push(ValidationError::new(
                "RUN_ID_MISSING",
                "derived result requires a new run_id",
                "run_id",
            ));
        }
        if supervisor_override.value < Decimal::ZERO {
            errors.push(ValidationError::new(
                "NEGATIVE_OVERRIDE_VALUE",
                format!("override value {} is negative", supervisor_override.value),
                "value",
            ));
        }
        if supervisor_override.approved_by.trim().is_empty() {
            errors.push(ValidationError::new(
                "APPROVER_MISSING",
                "override requires an approver",
                "approved_by",
            ));
        }
        if supervisor_override.approval_reference.trim().is_empty() {
            errors.push(ValidationError::new(
                "APPROVAL_REFERENCE_MISSING",
                "override requires an approval reference",
                "approval_reference",
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use crate::models::{Bucket, OverrideReason};

    fn base_result() -> SmaCalculationResult {
        SmaCalculationResult {
            run_id: "RUN_001".to_string(),
            entity_id: "BANK001".to_string(),
            calculation_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            bi_current: Decimal::from(100_000_000_000_i64),
            bi_average: Decimal::from(100_000_000_000_i64),
            bucket: Bucket::Two,
            bic: Decimal::from(12_600_000_000_i64),
            bic_breakdown: BTreeMap::new(),
            lc: Decimal::from(495_000_000),
            average_annual_loss: Decimal::from(33_000_000),
            loss_data_years: 5,
            ilm: Decimal::ONE,
            ilm_gated: false,
            ilm_gate_reason: None,
            orc: Decimal::from(12_600_000_000_i64),
            rwa: Decimal::from(157_500_000_000_i64),
            parameter_version: "1.0.0".to_string(),
            model_version: "1.0.0".to_string(),
            timestamp: Utc::now(),
            derived_from_run_id: None,
            override_applied: None,
        }
    }

    fn approved(override_type: OverrideType, value: Decimal) -> SupervisorOverride {
        SupervisorOverride {
            override_type,
            value,
            reason: OverrideReason::ConservativeAdjustment,
            justification: "supervisory add-on pending remediation".to_string(),
            approved_by: "supervisor.a".to_string(),
            approval_reference: "RBI/OVR/2024/007".to_string(),
        }
    }

    fn service() -> OverrideService {
        OverrideService::from_parameters(&ParameterSet::rbi_default())
    }

    #[test]
    fn test_capital_adjustment_replaces_orc() {
        let original = base_result();
        let ovr = approved(
            OverrideType::CapitalAdjustment,
            Decimal::from(15_000_000_000_i64),
        );

        let derived = service().apply(&original, &ovr, "RUN_002").unwrap();

        assert_eq!(derived.orc, Decimal::new(1_500_000_000_000, 2));
        assert_eq!(derived.rwa, Decimal::new(18_750_000_000_000, 2));
        assert_eq!(derived.derived_from_run_id.as_deref(), Some("RUN_001"));
        assert_eq!(derived.override_applied, Some(ovr));
        // Original untouched.
        assert_eq!(original.orc, Decimal::from(12_600_000_000_i64));
        assert!(original.override_applied.is_none());
    }

    #[test]
    fn test_ilm_override_recomputes_orc_from_bic() {
        let original = base_result();
        let ovr = approved(OverrideType::IlmOverride, Decimal::new(12, 1));

        let derived = service().apply(&original, &ovr, "RUN_003").unwrap();

        assert_eq!(derived.ilm, Decimal::new(12, 1));
        assert!(!derived.ilm_gated);
        // ORC = 12,600,000,000 * 1.2
        assert_eq!(derived.orc, Decimal::new(1_512_000_000_000, 2));
        assert_eq!(derived.rwa, Decimal::new(18_900_000_000_000, 2));
    }

    #[test]
    fn test_override_validation_collects_all_problems() {
        let original = base_result();
        let mut ovr = approved(OverrideType::CapitalAdjustment, Decimal::from(-5));
        ovr.approved_by = String::new();
        ovr.approval_reference = "  ".to_string();

        let err = service().apply(&original, &ovr, "").unwrap_err();
        let errors = err.validation_errors().unwrap();
        let codes: Vec<&str> = errors.iter().map(|e| e.code.as_str()).collect();
        assert!(codes.contains(&"RUN_ID_MISSING"));
        assert!(codes.contains(&"NEGATIVE_OVERRIDE_VALUE"));
        assert!(codes.contains(&"APPROVER_MISSING"));
        assert!(codes.contains(&"APPROVAL_REFERENCE_MISSING"));
    }
}
