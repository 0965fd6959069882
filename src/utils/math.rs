use rust_decimal::{Decimal, RoundingStrategy};

/// Regulatory cap applied to each business-indicator component before its
/// absolute value is taken (plus/minus 1e15).
pub fn bi_component_cap() -> Decimal {
    Decimal::from(1_000_000_000_000_000_i64)
}

/// Clamp a component into `[-cap, cap]` and take its absolute value.
///
/// This is the regulatory max/min/abs rule: a single outlier component can
/// neither drive the business-indicator total negative nor unbounded.
pub fn clamp_abs(value: Decimal, cap: Decimal) -> Decimal {
    value.clamp(-cap, cap).abs()
}

/// Round half-up to two decimal places.
///
/// The engine rounds in exactly two places (ORC and RWA); intermediates are
/// carried at full precision.
pub fn round_half_up_2dp(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Arithmetic mean of a slice of decimals, zero for an empty slice.
pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().copied().sum();
    sum / Decimal::from(values.len() as u64)
}
