use std::collections::BTreeMap;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::config::CalculationContext;
use crate::error::types::{EngineError, ValidationError};
use crate::models::{
    Bucket, BusinessIndicatorRecord, CalculationRequest, ParameterSet, SmaCalculationResult,
};
use crate::services::ilm::IlmCalculator;
use crate::services::lineage::{AuditLineageRecorder, AuditRecord};
use crate::services::loss_component::LossComponentCalculator;
use crate::utils::math::{mean, round_half_up_2dp};

/// Periods entering the trailing business-indicator average.
const BI_AVERAGING_PERIODS: usize = 3;

/// Assignment produced by the bucket classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketAssignment {
    pub bucket: Bucket,
    pub data_quality_years: Option<u32>,
    /// Informational only; the ILM gating logic makes the actual decision.
    pub meets_data_quality: bool,
}

/// Complete output of one engine invocation: the immutable result plus
/// its sealed lineage record.
#[derive(Debug, Clone)]
pub struct CalculationOutcome {
    pub result: SmaCalculationResult,
    pub audit: AuditRecord,
}

/// The SMA capital calculation engine.
///
/// A calculator is a pure function of its inputs: it holds one resolved
/// parameter set and the process context, does no I/O, and may be shared
/// freely across threads for concurrent per-entity calculations.
#[derive(Debug)]
pub struct SmaCalculator {
    params: ParameterSet,
    context: CalculationContext,
}

impl SmaCalculator {
    /// Fails fast on an inconsistent parameter set; no meaningful
    /// calculation can exist under one.
    pub fn new(params: ParameterSet, context: CalculationContext) -> Result<Self, EngineError> {
        params.validate().map_err(EngineError::Configuration)?;
        Ok(Self { params, context })
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    /// Runs the full SMA pipeline for one request.
    ///
    /// Validation runs first and aborts the whole calculation if anything
    /// is wrong; no component executes partial work.
    pub fn calculate(
        &self,
        request: &CalculationRequest,
    ) -> Result<CalculationOutcome, EngineError> {
        let errors = self.validate_inputs(request);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        info!(
            run_id = %request.run_id,
            entity_id = %request.entity_id,
            "starting SMA calculation"
        );

        let (bi_current, bi_average) =
            self.calculate_business_indicator(&request.business_indicators)?;

        let loss_outcome = LossComponentCalculator::from_parameters(&self.params)
            .calculate(&request.loss_events, request.calculation_date);

        let assignment = self.assign_bucket(bi_average, Some(loss_outcome.years_with_data));
        let (bic, bic_breakdown) = self.calculate_bic(bi_average, assignment.bucket);

        let ilm_outcome = IlmCalculator::from_parameters(&self.params).calculate(
            loss_outcome.lc,
            bic,
            assignment.bucket,
            loss_outcome.years_with_data,
        );

        let (orc, rwa) = self.compose_capital(bic, ilm_outcome.ilm);

        info!(
            run_id = %request.run_id,
            bucket = %assignment.bucket,
            %orc,
            %rwa,
            ilm_gated = ilm_outcome.gated,
            "SMA calculation complete"
        );

        let result = SmaCalculationResult {
            run_id: request.run_id.clone(),
            entity_id: request.entity_id.clone(),
            calculation_date: request.calculation_date,
            bi_current,
            bi_average,
            bucket: assignment.bucket,
            bic,
            bic_breakdown: bic_breakdown.clone(),
            lc: loss_outcome.lc,
            average_annual_loss: loss_outcome.average_annual_loss,
            loss_data_years: loss_outcome.years_with_data,
            ilm: ilm_outcome.ilm,
            ilm_gated: ilm_outcome.gated,
            ilm_gate_reason: ilm_outcome.gate_reason.clone(),
            orc,
            rwa,
            parameter_version: self.params.version.clone(),
            model_version: self.context.model_version.clone(),
            timestamp: Utc::now(),
            derived_from_run_id: None,
            override_applied: None,
        };

        let intermediates = json!({
            "business_indicator": {
                "bi_current": bi_current,
                "bi_average": bi_average,
                "periods_used": request.business_indicators.len().min(BI_AVERAGING_PERIODS),
            },
            "bucket_assignment": assignment,
            "bic": {
                "bic": bic,
                "breakdown": bic_breakdown,
            },
            "loss_component": loss_outcome,
            "ilm": ilm_outcome,
        });

        let audit = AuditLineageRecorder::record(
            request,
            &self.params,
            &self.context,
            intermediates,
            &result,
        )?;

        Ok(CalculationOutcome { result, audit })
    }

    /// Collects every validation problem in the request; never stops at
    /// the first.
    pub fn validate_inputs(&self, request: &CalculationRequest) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        errors.extend(Self::bi_record_errors(&request.business_indicators));

        for (i, event) in request.loss_events.iter().enumerate() {
            if event.event_id.trim().is_empty() {
                errors.push(ValidationError::new(
                    "EVENT_ID_MISSING",
                    format!("loss event {i} has no event_id"),
                    format!("loss_events[{i}].event_id"),
                ));
            }
            if event.entity_id.trim().is_empty() {
                errors.push(ValidationError::new(
                    "ENTITY_ID_MISSING",
                    format!("loss event {i} has no entity_id"),
                    format!("loss_events[{i}].entity_id"),
                ));
            }
            if event.gross_amount < Decimal::ZERO {
                errors.push(ValidationError::new(
                    "NEGATIVE_GROSS_AMOUNT",
                    format!(
                        "loss event {} has negative gross amount {}",
                        event.event_id, event.gross_amount
                    ),
                    format!("loss_events[{i}].gross_amount"),
                ));
            }
            if event.net_amount < Decimal::ZERO {
                errors.push(ValidationError::new(
                    "NEGATIVE_NET_AMOUNT",
                    format!(
                        "loss event {} has negative net amount {}",
                        event.event_id, event.net_amount
                    ),
                    format!("loss_events[{i}].net_amount"),
                ));
            }
            if event.occurrence_date > event.discovery_date
                || event.discovery_date > event.accounting_date
            {
                errors.push(ValidationError::new(
                    "DATE_ORDER_INVALID",
                    format!(
                        "loss event {} dates must satisfy occurrence <= discovery <= accounting",
                        event.event_id
                    ),
                    format!("loss_events[{i}]"),
                ));
            }
        }

        errors
    }

    fn bi_record_errors(records: &[BusinessIndicatorRecord]) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if records.is_empty() {
            errors.push(ValidationError::new(
                "BI_DATA_EMPTY",
                "business indicator data cannot be empty",
                "business_indicators",
            ));
        }
        for (i, record) in records.iter().enumerate() {
            if record.entity_id.trim().is_empty() {
                errors.push(ValidationError::new(
                    "ENTITY_ID_MISSING",
                    format!("business indicator record {i} has no entity_id"),
                    format!("business_indicators[{i}].entity_id"),
                ));
            }
            if record.period.trim().is_empty() {
                errors.push(ValidationError::new(
                    "PERIOD_MISSING",
                    format!("business indicator record {i} has no period"),
                    format!("business_indicators[{i}].period"),
                ));
            }
        }
        errors
    }

    /// Current business indicator and its trailing average.
    ///
    /// Uses the first `BI_AVERAGING_PERIODS` records of the
    /// period-descending input; the average spans however many periods are
    /// actually present.
    pub fn calculate_business_indicator(
        &self,
        records: &[BusinessIndicatorRecord],
    ) -> Result<(Decimal, Decimal), EngineError> {
        let errors = Self::bi_record_errors(records);
        if !errors.is_empty() {
            return Err(EngineError::Validation(errors));
        }

        let window = &records[..records.len().min(BI_AVERAGING_PERIODS)];
        let totals: Vec<Decimal> = window.iter().map(|r| r.bi_total).collect();
        let bi_current = totals[0];
        let bi_average = mean(&totals);

        Ok((bi_current, bi_average))
    }

    /// Maps the averaged indicator to its RBI bucket.
    ///
    /// Thresholds are inclusive on the lower bound only: a value exactly
    /// at a threshold belongs to the higher bucket.
    pub fn assign_bucket(
        &self,
        bi_average: Decimal,
        data_quality_years: Option<u32>,
    ) -> BucketAssignment {
        let bucket = if bi_average < self.params.bucket_threshold_1 {
            Bucket::One
        } else if bi_average < self.params.bucket_threshold_2 {
            Bucket::Two
        } else {
            Bucket::Three
        };

        let meets_data_quality = data_quality_years
            .map(|years| years >= self.params.min_data_quality_years)
            .unwrap_or(false);

        BucketAssignment {
            bucket,
            data_quality_years,
            meets_data_quality,
        }
    }

    /// Business Indicator Component: marginal coefficients applied
    /// tier-by-tier up to the assigned bucket.
    ///
    /// The breakdown maps each applicable tier to its contribution (tier
    /// amount x coefficient), so the entries sum to the returned BIC.
    /// Piecewise-linear in `bi_average` with non-negative slopes, so BIC
    /// never decreases as the indicator grows.
    pub fn calculate_bic(
        &self,
        bi_average: Decimal,
        bucket: Bucket,
    ) -> (Decimal, BTreeMap<String, Decimal>) {
        let p = &self.params;
        let mut breakdown = BTreeMap::new();

        let tier_1_amount = bi_average.min(p.bucket_threshold_1);
        breakdown.insert(
            "bucket_1".to_string(),
            tier_1_amount * p.marginal_coefficient_1,
        );

        if bucket >= Bucket::Two {
            let tier_2_amount = (bi_average.min(p.bucket_threshold_2) - p.bucket_threshold_1)
                .max(Decimal::ZERO);
            breakdown.insert(
                "bucket_2".to_string(),
                tier_2_amount * p.marginal_coefficient_2,
            );
        }

        if bucket >= Bucket::Three {
            let tier_3_amount = (bi_average - p.bucket_threshold_2).max(Decimal::ZERO);
            breakdown.insert(
                "bucket_3".to_string(),
                tier_3_amount * p.marginal_coefficient_3,
            );
        }

        let bic = breakdown.values().copied().sum();
        (bic, breakdown)
    }

    /// Final composition: the only two rounding sites in the engine.
    pub fn compose_capital(&self, bic: Decimal, ilm: Decimal) -> (Decimal, Decimal) {
        let orc = round_half_up_2dp(bic * ilm);
        let rwa = round_half_up_2dp(orc * self.params.rwa_multiplier);
        (orc, rwa)
    }
}
