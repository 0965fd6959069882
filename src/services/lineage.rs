use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CalculationContext;
use crate::error::types::EngineError;
use crate::models::{CalculationRequest, ParameterSet, SmaCalculationResult};

/// Tamper-evident lineage record for one calculation run.
///
/// `immutable_hash` is a SHA-256 over a canonical JSON encoding of every
/// field except `record_id`, `recorded_at` and the hash itself. Identical
/// inputs, parameters and outputs therefore always produce an identical
/// hash, and any change to any covered field changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: Uuid,
    pub run_id: String,
    pub operation: String,
    pub input_snapshot: Value,
    pub parameter_version: String,
    pub model_version: String,
    pub environment_id: String,
    pub intermediates: Value,
    pub outputs: Value,
    pub immutable_hash: String,
    pub recorded_at: DateTime<Utc>,
}

/// Whether a run can be exactly reproduced from its lineage record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReproducibilityReport {
    pub run_id: String,
    pub reproducible: bool,
    /// Fraction of expected lineage components that are present (0..=1).
    pub score: f64,
    pub components: BTreeMap<String, bool>,
    pub missing_components: Vec<String>,
}

/// Canonical hash payload: field order is fixed here, and nested JSON
/// objects serialize with sorted keys, so the encoding is deterministic.
#[derive(Serialize)]
struct HashPayload<'a> {
    run_id: &'a str,
    operation: &'a str,
    input_snapshot: &'a Value,
    parameter_version: &'a str,
    model_version: &'a str,
    environment_id: &'a str,
    intermediates: &'a Value,
    outputs: &'a Value,
}

/// Records the lineage of each calculation and certifies its integrity.
pub struct AuditLineageRecorder;

impl AuditLineageRecorder {
    /// Builds the audit record for a completed calculation.
    pub fn record(
        request: &CalculationRequest,
        params: &ParameterSet,
        context: &CalculationContext,
        intermediates: Value,
        result: &SmaCalculationResult,
    ) -> Result<AuditRecord, EngineError> {
        let input_snapshot = Self::input_snapshot(request)?;
        let outputs = Self::canonical_outputs(result);

        let immutable_hash = Self::hash(&HashPayload {
            run_id: &request.run_id,
            operation: "sma_calculation",
            input_snapshot: &input_snapshot,
            parameter_version: &params.version,
            model_version: &context.model_version,
            environment_id: &context.environment_id,
            intermediates: &intermediates,
            outputs: &outputs,
        })?;

        debug!(run_id = %request.run_id, hash = %immutable_hash, "audit record sealed");

        Ok(AuditRecord {
            record_id: Uuid::new_v4(),
            run_id: request.run_id.clone(),
            operation: "sma_calculation".to_string(),
            input_snapshot,
            parameter_version: params.version.clone(),
            model_version: context.model_version.clone(),
            environment_id: context.environment_id.clone(),
            intermediates,
            outputs,
            immutable_hash,
            recorded_at: Utc::now(),
        })
    }

    /// Recomputes the hash and compares; a mismatch means the record was
    /// altered after sealing.
    pub fn verify(record: &AuditRecord) -> bool {
        let recomputed = Self::hash(&HashPayload {
            run_id: &record.run_id,
            operation: &record.operation,
            input_snapshot: &record.input_snapshot,
            parameter_version: &record.parameter_version,
            model_version: &record.model_version,
            environment_id: &record.environment_id,
            intermediates: &record.intermediates,
            outputs: &record.outputs,
        });
        match recomputed {
            Ok(hash) => {
                let ok = hash == record.immutable_hash;
                if !ok {
                    warn!(run_id = %record.run_id, "audit record hash mismatch");
                }
                ok
            }
            Err(_) => false,
        }
    }

    /// Scores how complete the lineage is for exact reproduction.
    ///
    /// Six components are expected: final outputs, intermediates, the
    /// parameter version, the model version, input aggregates and the
    /// environment identifier. The score is the present fraction.
    pub fn reproducibility_check(record: &AuditRecord) -> ReproducibilityReport {
        let mut components = BTreeMap::new();
        components.insert(
            "final_outputs".to_string(),
            !record.outputs.is_null(),
        );
        components.insert(
            "intermediates".to_string(),
            !record.intermediates.is_null(),
        );
        components.insert(
            "parameter_version".to_string(),
            !record.parameter_version.trim().is_empty(),
        );
        components.insert(
            "model_version".to_string(),
            !record.model_version.trim().is_empty(),
        );
        components.insert(
            "input_aggregates".to_string(),
            record.input_snapshot.get("aggregates").is_some(),
        );
        components.insert(
            "environment_id".to_string(),
            !record.environment_id.trim().is_empty(),
        );

        let present = components.values().filter(|&&p| p).count();
        let score = present as f64 / components.len() as f64;
        let missing_components: Vec<String> = components
            .iter()
            .filter(|(_, &present)| !present)
            .map(|(name, _)| name.clone())
            .collect();

        ReproducibilityReport {
            run_id: record.run_id.clone(),
            reproducible: missing_components.is_empty(),
            score,
            components,
            missing_components,
        }
    }

    fn input_snapshot(request: &CalculationRequest) -> Result<Value, EngineError> {
        let total_net_losses: rust_decimal::Decimal =
            request.loss_events.iter().map(|e| e.net_amount).sum();
        Ok(json!({
            "entity_id": request.entity_id,
            "calculation_date": request.calculation_date,
            "business_indicators": serde_json::to_value(&request.business_indicators)?,
            "loss_events": serde_json::to_value(&request.loss_events)?,
            "aggregates": {
                "bi_periods": request.business_indicators.len(),
                "loss_event_count": request.loss_events.len(),
                "total_net_losses": total_net_losses,
            },
        }))
    }

    /// Output fields covered by the hash. The result's wall-clock
    /// timestamp is recorded metadata, never part of the payload.
    fn canonical_outputs(result: &SmaCalculationResult) -> Value {
        json!({
            "bi_current": result.bi_current,
            "bi_average": result.bi_average,
            "bucket": result.bucket,
            "bic": result.bic,
            "bic_breakdown": result.bic_breakdown,
            "lc": result.lc,
            "average_annual_loss": result.average_annual_loss,
            "loss_data_years": result.loss_data_years,
            "ilm": result.ilm,
            "ilm_gated": result.ilm_gated,
            "ilm_gate_reason": result.ilm_gate_reason,
            "orc": result.orc,
            "rwa": result.rwa,
        })
    }

    fn hash(payload: &HashPayload<'_>) -> Result<String, EngineError> {
        let canonical = serde_json::to_vec(payload)?;
        let digest = Sha256::digest(&canonical);
        Ok(hex::encode(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use crate::models::{
        Bucket, BusinessIndicatorRecord, CreateBusinessIndicatorRecord, SmaCalculationResult,
    };

    fn request() -> CalculationRequest {
        CalculationRequest {
            run_id: "RUN_001".to_string(),
            entity_id: "BANK001".to_string(),
            calculation_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            business_indicators: vec![BusinessIndicatorRecord::new(
                CreateBusinessIndicatorRecord {
                    entity_id: "BANK001".to_string(),
                    period: "2023".to_string(),
                    ildc: Decimal::from(50_000_000_000_i64),
                    sc: Decimal::from(20_000_000_000_i64),
                    fc: Decimal::from(10_000_000_000_i64),
                    calculation_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
                },
            )],
            loss_events: vec![],
        }
    }

    fn result() -> SmaCalculationResult {
        SmaCalculationResult {
            run_id: "RUN_001".to_string(),
            entity_id: "BANK001".to_string(),
            calculation_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            bi_current: Decimal::from(80_000_000_000_i64),
            bi_average: Decimal::from(80_000_000_000_i64),
            bucket: Bucket::Two,
            bic: Decimal::from(9_600_000_000_i64),
            bic_breakdown: BTreeMap::new(),
            lc: Decimal::ZERO,
            average_annual_loss: Decimal::ZERO,
            loss_data_years: 0,
            ilm: Decimal::ONE,
            ilm_gated: true,
            ilm_gate_reason: Some("0 years < 5 years of high-quality loss data".to_string()),
            orc: Decimal::from(9_600_000_000_i64),
            rwa: Decimal::from(120_000_000_000_i64),
            parameter_version: "1.0.0".to_string(),
            model_version: "1.0.0".to_string(),
            timestamp: Utc::now(),
            derived_from_run_id: None,
            override_applied: None,
        }
    }

    fn record() -> AuditRecord {
        AuditLineageRecorder::record(
            &request(),
            &ParameterSet::rbi_default(),
            &CalculationContext {
                model_version: "1.0.0".to_string(),
                environment_id: "test".to_string(),
            },
            json!({"stage": "test"}),
            &result(),
        )
        .unwrap()
    }

    #[test]
    fn test_identical_inputs_hash_identically() {
        let a = record();
        let b = record();
        assert_eq!(a.immutable_hash, b.immutable_hash);
        // Different record ids and timestamps, same sealed content.
        assert_ne!(a.record_id, b.record_id);
    }

    #[test]
    fn test_verify_accepts_untouched_record() {
        let record = record();
        assert!(AuditLineageRecorder::verify(&record));
    }

    #[test]
    fn test_verify_detects_tampering() {
        let mut record = record();
        record.outputs["orc"] = json!("999.00");
        assert!(!AuditLineageRecorder::verify(&record));

        let mut record2 = self::record();
        record2.parameter_version = "2.0.0".to_string();
        assert!(!AuditLineageRecorder::verify(&record2));
    }

    #[test]
    fn test_reproducibility_full_score() {
        let report = AuditLineageRecorder::reproducibility_check(&record());
        assert!(report.reproducible);
        assert_eq!(report.score, 1.0);
        assert!(report.missing_components.is_empty());
    }

    #[test]
    fn test_reproducibility_flags_missing_components() {
        let mut record = record();
        record.model_version = String::new();
        record.intermediates = Value::Null;

        let report = AuditLineageRecorder::reproducibility_check(&record);
        assert!(!report.reproducible);
        assert_eq!(report.score, 4.0 / 6.0);
        assert_eq!(
            report.missing_components,
            vec!["intermediates".to_string(), "model_version".to_string()]
        );
    }
}
