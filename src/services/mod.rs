pub mod ilm;
pub mod lineage;
pub mod loss_component;
pub mod override_service;
pub mod sma_calculator;

pub use ilm::{GatingCheck, GatingOutcome, IlmCalculator, IlmOutcome};
pub use lineage::{AuditLineageRecorder, AuditRecord, ReproducibilityReport};
pub use loss_component::{LossComponentCalculator, LossComponentOutcome, LOSS_LOOKBACK_YEARS};
pub use override_service::OverrideService;
pub use sma_calculator::{BucketAssignment, CalculationOutcome, SmaCalculator};
