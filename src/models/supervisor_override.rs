use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of supervisor override applied to a completed calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideType {
    /// Replace ORC with an absolute capital figure.
    CapitalAdjustment,
    /// Force a specific ILM and recompute ORC from BIC.
    IlmOverride,
}

/// Standardized override reasons for disclosure reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideReason {
    DataQualityIssue,
    ExceptionalCircumstances,
    RegulatoryGuidance,
    BusinessRestructuring,
    SystemLimitation,
    ConservativeAdjustment,
    TemporaryAdjustment,
    Other,
}

/// A supervisor override with its approval provenance.
///
/// Overrides originate in the external governance workflow; the engine only
/// applies an already-approved override and stamps the provenance onto the
/// derived result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorOverride {
    pub override_type: OverrideType,
    pub value: Decimal,
    pub reason: OverrideReason,
    pub justification: String,
    pub approved_by: String,
    pub approval_reference: String,
}
