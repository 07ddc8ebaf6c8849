//! Progress percentage contract.

/// Converts `(bytes_sent, bytes_total)` to an integer percentage.
///
/// The divisor is floored at 1 so an unknown total (libcurl reports 0 until
/// the size is known) cannot divide by zero; the result is clamped to 100.
pub fn percent(sent: u64, total: u64) -> u8 {
    let pct = (sent as u128 * 100) / (total.max(1) as u128);
    pct.min(100) as u8
}
