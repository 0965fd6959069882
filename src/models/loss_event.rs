use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::types::EngineError;

/// Recovery received against a loss event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryRecord {
    pub loss_event_id: String,
    pub amount: Decimal,
    pub receipt_date: NaiveDate,
}

/// An operational loss event in the entity's loss history.
///
/// `gross_amount` and the three dates are immutable once the event is
/// created. `net_amount` changes only through [`LossEventRecord::apply_recovery`],
/// and exclusion is a one-way transition through [`LossEventRecord::exclude`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossEventRecord {
    pub event_id: String,
    pub entity_id: String,
    pub occurrence_date: NaiveDate,
    pub discovery_date: NaiveDate,
    pub accounting_date: NaiveDate,
    pub gross_amount: Decimal,
    pub net_amount: Decimal,
    pub is_excluded: bool,
    pub exclusion_reason: Option<String>,
    pub rbi_approval_reference: Option<String>,
    #[serde(default)]
    pub recoveries: Vec<RecoveryRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLossEventRecord {
    pub event_id: String,
    pub entity_id: String,
    pub occurrence_date: NaiveDate,
    pub discovery_date: NaiveDate,
    pub accounting_date: NaiveDate,
    pub gross_amount: Decimal,
}

impl LossEventRecord {
    /// A fresh loss event starts with `net_amount == gross_amount` and no
    /// recoveries or exclusion.
    pub fn new(create: CreateLossEventRecord) -> Self {
        Self {
            event_id: create.event_id,
            entity_id: create.entity_id,
            occurrence_date: create.occurrence_date,
            discovery_date: create.discovery_date,
            accounting_date: create.accounting_date,
            gross_amount: create.gross_amount,
            net_amount: create.gross_amount,
            is_excluded: false,
            exclusion_reason: None,
            rbi_approval_reference: None,
            recoveries: Vec::new(),
        }
    }

    /// Sum of all recoveries applied so far.
    pub fn total_recoveries(&self) -> Decimal {
        self.recoveries.iter().map(|r| r.amount).sum()
    }

    /// Applies a recovery, maintaining `net = gross - sum(recoveries)`.
    ///
    /// Rejected if the running recovery total would exceed the gross
    /// amount; this is the only way `net_amount` ever changes.
    pub fn apply_recovery(&mut self, recovery: RecoveryRecord) -> Result<(), EngineError> {
        let total = self.total_recoveries() + recovery.amount;
        if total > self.gross_amount {
            return Err(EngineError::RecoveryExceedsGross {
                event_id: self.event_id.clone(),
                total,
                gross: self.gross_amount,
            });
        }
        self.recoveries.push(recovery);
        self.net_amount = self.gross_amount - self.total_recoveries();
        Ok(())
    }

    /// Excludes the event from loss-component aggregation.
    ///
    /// One-way transition: there is no API to clear the flag, and an
    /// approval reference from the regulator is mandatory.
    pub fn exclude(
        &mut self,
        reason: impl Into<String>,
        approval_reference: impl Into<String>,
    ) -> Result<(), EngineError> {
        if self.is_excluded {
            return Err(EngineError::AlreadyExcluded(self.event_id.clone()));
        }
        let approval_reference = approval_reference.into();
        if approval_reference.trim().is_empty() {
            return Err(EngineError::MissingApprovalReference(self.event_id.clone()));
        }
        self.is_excluded = true;
        self.exclusion_reason = Some(reason.into());
        self.rbi_approval_reference = Some(approval_reference);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(gross: i64) -> LossEventRecord {
        LossEventRecord::new(CreateLossEventRecord {
            event_id: "LOSS001".to_string(),
            entity_id: "BANK001".to_string(),
            occurrence_date: NaiveDate::from_ymd_opt(2023, 5, 1).unwrap(),
            discovery_date: NaiveDate::from_ymd_opt(2023, 5, 20).unwrap(),
            accounting_date: NaiveDate::from_ymd_opt(2023, 6, 15).unwrap(),
            gross_amount: Decimal::from(gross),
        })
    }

    fn recovery(amount: i64) -> RecoveryRecord {
        RecoveryRecord {
            loss_event_id: "LOSS001".to_string(),
            amount: Decimal::from(amount),
            receipt_date: NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
        }
    }

    #[test]
    fn test_new_event_nets_to_gross() {
        let e = event(50_000_000);
        assert_eq!(e.net_amount, e.gross_amount);
        assert!(!e.is_excluded);
    }

    #[test]
    fn test_apply_recovery_reduces_net() {
        let mut e = event(50_000_000);
        e.apply_recovery(recovery(10_000_000)).unwrap();
        assert_eq!(e.net_amount, Decimal::from(40_000_000));

        e.apply_recovery(recovery(15_000_000)).unwrap();
        assert_eq!(e.net_amount, Decimal::from(25_000_000));
        assert_eq!(e.total_recoveries(), Decimal::from(25_000_000));
    }

    #[test]
    fn test_recovery_cannot_exceed_gross() {
        let mut e = event(50_000_000);
        e.apply_recovery(recovery(30_000_000)).unwrap();

        let err = e.apply_recovery(recovery(30_000_000)).unwrap_err();
        assert!(matches!(err, EngineError::RecoveryExceedsGross { .. }));
        // Net must be untouched by the rejected recovery.
        assert_eq!(e.net_amount, Decimal::from(20_000_000));
        assert_eq!(e.recoveries.len(), 1);
    }

    #[test]
    fn test_recovery_up_to_exact_gross_is_allowed() {
        let mut e = event(50_000_000);
        e.apply_recovery(recovery(50_000_000)).unwrap();
        assert_eq!(e.net_amount, Decimal::ZERO);
    }

    #[test]
    fn test_exclusion_requires_approval_reference() {
        let mut e = event(50_000_000);
        let err = e.exclude("approved exclusion", "  ").unwrap_err();
        assert!(matches!(err, EngineError::MissingApprovalReference(_)));
        assert!(!e.is_excluded);
    }

    #[test]
    fn test_exclusion_is_one_way() {
        let mut e = event(50_000_000);
        e.exclude("RBI approved exclusion", "RBI/2023/1142").unwrap();
        assert!(e.is_excluded);
        assert_eq!(
            e.rbi_approval_reference.as_deref(),
            Some("RBI/2023/1142")
        );

        let err = e.exclude("again", "RBI/2023/9999").unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExcluded(_)));
    }
}
