//! String-cell coercion into the numeric tiers the sort comparator uses.
//!
//! Failure is not an error anywhere in this module: callers substitute the
//! tier sentinels (`0` for the integer tier, NaN for the float tier) and the
//! comparator falls through to the next tier.

/// Parse a decimal unsigned integer. No sign, no whitespace, no separators.
pub fn try_parse_uint64(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u64>().ok()
}

/// Parse a decimal signed integer with an optional leading `-`.
///
/// The minimum is asymmetric: `-9223372036854775808` is representable even
/// though its magnitude overflows the positive range.
pub fn try_parse_int64(s: &str) -> Option<i64> {
    let (is_minus, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let u = try_parse_uint64(digits)?;
    if is_minus {
        if u > (i64::MAX as u64) + 1 {
            return None;
        }
        // u == 2^63 maps onto i64::MIN, which is its own wrapping negation.
        Some((u as i64).wrapping_neg())
    } else {
        if u > i64::MAX as u64 {
            return None;
        }
        Some(u as i64)
    }
}

/// Parse a dotted-quad IPv4 address into its big-endian `u32` form.
pub fn try_parse_ipv4(s: &str) -> Option<u32> {
    let mut octets = s.split('.');
    let mut addr: u32 = 0;
    for _ in 0..4 {
        let part = octets.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let v = part.parse::<u32>().ok()?;
        if v > 255 {
            return None;
        }
        addr = (addr << 8) | v;
    }
    if octets.next().is_some() {
        return None;
    }
    Some(addr)
}

/// IEEE-754 parse of a float cell.
pub fn try_parse_float64(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Pre-parse a column of cells into the integer-tier side array.
///
/// Cells that parse as int64 keep that value; otherwise the IPv4 form is
/// used, which leaves `0` as the not-numeric sentinel. Timestamps and
/// durations are deliberately not attempted here: they may be negative,
/// which would collide with ordinary integers.
pub fn parse_i64_cells(values: &[String]) -> Vec<i64> {
    values
        .iter()
        .map(|v| match try_parse_int64(v) {
            Some(i) => i,
            None => i64::from(try_parse_ipv4(v).unwrap_or(0)),
        })
        .collect()
}

/// Pre-parse a column of cells into the float-tier side array, with NaN as
/// the not-numeric sentinel.
pub fn parse_f64_cells(values: &[String]) -> Vec<f64> {
    values
        .iter()
        .map(|v| try_parse_float64(v).unwrap_or(f64::NAN))
        .collect()
}
