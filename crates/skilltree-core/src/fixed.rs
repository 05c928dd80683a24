use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Convert an f64 to Fixed64. Use only for initialization and tests.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Exact ratio `numerator / denominator` as Fixed64. Returns zero when the
/// denominator is zero.
#[inline]
pub fn ratio(numerator: u32, denominator: u32) -> Fixed64 {
    Fixed64::from_num(numerator)
        .checked_div(Fixed64::from_num(denominator))
        .unwrap_or(Fixed64::ZERO)
}
