use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::utils::math::{bi_component_cap, clamp_abs};

/// One reporting period of business-indicator data for an entity.
///
/// ILDC is the interest/lease/dividend component, SC the services component
/// and FC the financial component. Records are append-only per
/// entity/period: once ingested they are never mutated, so the struct
/// exposes no setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessIndicatorRecord {
    pub entity_id: String,
    pub period: String,
    pub ildc: Decimal,
    pub sc: Decimal,
    pub fc: Decimal,
    pub bi_total: Decimal,
    pub calculation_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBusinessIndicatorRecord {
    pub entity_id: String,
    pub period: String,
    pub ildc: Decimal,
    pub sc: Decimal,
    pub fc: Decimal,
    pub calculation_date: NaiveDate,
}

impl BusinessIndicatorRecord {
    /// Builds a record, deriving `bi_total` with the regulatory
    /// max/min/abs rule: each component is clamped to the +/-1e15 band and
    /// its absolute value summed.
    pub fn new(create: CreateBusinessIndicatorRecord) -> Self {
        let cap = bi_component_cap();
        let bi_total = clamp_abs(create.ildc, cap)
            + clamp_abs(create.sc, cap)
            + clamp_abs(create.fc, cap);
        Self {
            entity_id: create.entity_id,
            period: create.period,
            ildc: create.ildc,
            sc: create.sc,
            fc: create.fc,
            bi_total,
            calculation_date: create.calculation_date,
        }
    }
}
