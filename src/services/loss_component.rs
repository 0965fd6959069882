use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::{LossEventRecord, ParameterSet};
use crate::utils::time::{calendar_year, lookback_start, within_window};

/// Rolling loss-history horizon mandated by the SMA methodology.
pub const LOSS_LOOKBACK_YEARS: i32 = 10;

/// Output of the loss-component stage, kept whole for the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LossComponentOutcome {
    pub lc: Decimal,
    pub average_annual_loss: Decimal,
    /// Distinct calendar years with at least one qualifying loss.
    pub years_with_data: u32,
    pub qualifying_events: usize,
    pub total_net_losses: Decimal,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
}

/// Aggregates the entity's loss history into the SMA loss component.
pub struct LossComponentCalculator {
    min_loss_threshold: Decimal,
    lc_multiplier: Decimal,
    lookback_years: i32,
}

impl LossComponentCalculator {
    pub fn from_parameters(params: &ParameterSet) -> Self {
        Self {
            min_loss_threshold: params.min_loss_threshold,
            lc_multiplier: params.lc_multiplier,
            lookback_years: LOSS_LOOKBACK_YEARS,
        }
    }

    /// Filters and aggregates qualifying losses.
    ///
    /// Qualifying means: not excluded, net amount at or above the minimum
    /// threshold, and accounting date inside the inclusive lookback window
    /// ending at `calculation_date`. Events failing any test are filtered,
    /// never errors. `average_annual_loss` divides total net losses by the
    /// number of distinct calendar years that contributed at least one
    /// qualifying event, and is zero when no event qualifies.
    pub fn calculate(
        &self,
        loss_events: &[LossEventRecord],
        calculation_date: NaiveDate,
    ) -> LossComponentOutcome {
        let window_start = lookback_start(calculation_date, self.lookback_years);

        let mut years_with_data: BTreeSet<i32> = BTreeSet::new();
        let mut total_net_losses = Decimal::ZERO;
        let mut qualifying_events = 0_usize;

        for event in loss_events {
            if event.is_excluded {
                continue;
            }
            if event.net_amount < self.min_loss_threshold {
                continue;
            }
            if !within_window(event.accounting_date, window_start, calculation_date) {
                continue;
            }
            years_with_data.insert(calendar_year(event.accounting_date));
            total_net_losses += event.net_amount;
            qualifying_events += 1;
        }

        let years = years_with_data.len() as u32;
        let average_annual_loss = if years == 0 {
            Decimal::ZERO
        } else {
            total_net_losses / Decimal::from(years)
        };
        let lc = average_annual_loss * self.lc_multiplier;

        debug!(
            qualifying_events,
            years_with_data = years,
            %total_net_losses,
            "loss component aggregated"
        );

        LossComponentOutcome {
            lc,
            average_annual_loss,
            years_with_data: years,
            qualifying_events,
            total_net_losses,
            window_start,
            window_end: calculation_date,
        }
    }
}
