//! `L <-> (amount0, amount1)` liquidity math across all three price regions.
//!
//! All arithmetic here is on exact 256-bit unsigned integers; products of
//! two `U256` values are carried through a 512-bit intermediate (`U512`,
//! from `ruint`) before narrowing back, so nothing silently wraps. Overflow
//! on the final narrowing step surfaces as [`MathError::MathOverflow`].

use crate::error::MathError;
use alloy::primitives::U256;

type U512 = ruint::Uint<512, 8>;

fn u256_to_u512(v: U256) -> U512 {
    let bytes = v.to_be_bytes::<32>();
    let mut buf = [0u8; 64];
    buf[32..].copy_from_slice(&bytes);
    U512::from_be_bytes(buf)
}

fn u512_to_u256(v: U512, op: &'static str) -> Result<U256, MathError> {
    let bytes = v.to_be_bytes::<64>();
    if bytes[..32].iter().any(|&b| b != 0) {
        return Err(MathError::MathOverflow(op));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes[32..]);
    Ok(U256::from_be_bytes(out))
}

fn check_range(s_lo: U256, s_hi: U256) -> Result<(), MathError> {
    if s_hi <= s_lo {
        return Err(MathError::BadRange {
            sqrt_lo: s_lo.to_string(),
            sqrt_hi: s_hi.to_string(),
        });
    }
    Ok(())
}

/// `L = a0 * s_hi * s_lo / (s_hi - s_lo)`, integer division truncating
/// toward zero.
pub fn l_from_amount0(s_lo: U256, s_hi: U256, a0: U256) -> Result<U256, MathError> {
    check_range(s_lo, s_hi)?;
    let diff = u256_to_u512(s_hi - s_lo);
    let numerator = u256_to_u512(a0)
        .checked_mul(u256_to_u512(s_hi))
        .and_then(|v| v.checked_mul(u256_to_u512(s_lo)))
        .ok_or(MathError::MathOverflow("l_from_amount0"))?;
    let l = numerator
        .checked_div(diff)
        .ok_or(MathError::MathOverflow("l_from_amount0: division by zero"))?;
    u512_to_u256(l, "l_from_amount0")
}

/// `L = a1 / (s_hi - s_lo)`.
pub fn l_from_amount1(s_lo: U256, s_hi: U256, a1: U256) -> Result<U256, MathError> {
    check_range(s_lo, s_hi)?;
    let diff = s_hi - s_lo;
    Ok(a1 / diff)
}

/// `amount0 = L * (s_hi - s_lo) / (s_hi * s_lo)`.
pub fn amount0_from_l(s_lo: U256, s_hi: U256, l: U256) -> Result<U256, MathError> {
    check_range(s_lo, s_hi)?;
    let diff = u256_to_u512(s_hi - s_lo);
    let numerator = u256_to_u512(l) * diff;
    let denominator = u256_to_u512(s_hi) * u256_to_u512(s_lo);
    let amount = numerator
        .checked_div(denominator)
        .ok_or(MathError::MathOverflow("amount0_from_l: division by zero"))?;
    u512_to_u256(amount, "amount0_from_l")
}

/// `amount1 = L * (s_hi - s_lo)`.
pub fn amount1_from_l(s_lo: U256, s_hi: U256, l: U256) -> Result<U256, MathError> {
    check_range(s_lo, s_hi)?;
    let diff = u256_to_u512(s_hi - s_lo);
    let product = u256_to_u512(l) * diff;
    u512_to_u256(product, "amount1_from_l")
}

/// Dispatches on the current sqrt-price's position relative to the range:
/// below range needs `a0`, above range needs `a1`, inside range takes the
/// minimum of whichever sides are supplied.
pub fn liquidity(
    s_cur: U256,
    s_lo: U256,
    s_hi: U256,
    a0: Option<U256>,
    a1: Option<U256>,
) -> Result<U256, MathError> {
    check_range(s_lo, s_hi)?;
    if s_cur < s_lo {
        let a0 = a0.ok_or(MathError::MissingSide("amount0"))?;
        return l_from_amount0(s_lo, s_hi, a0);
    }
    if s_cur > s_hi {
        let a1 = a1.ok_or(MathError::MissingSide("amount1"))?;
        return l_from_amount1(s_lo, s_hi, a1);
    }
    let l0 = a0.map(|a| l_from_amount0(s_cur, s_hi, a)).transpose()?;
    let l1 = a1.map(|a| l_from_amount1(s_lo, s_cur, a)).transpose()?;
    match (l0, l1) {
        (Some(x), Some(y)) => Ok(x.min(y)),
        (Some(x), None) => Ok(x),
        (None, Some(y)) => Ok(y),
        (None, None) => Err(MathError::MissingSide("amount0 or amount1")),
    }
}

/// Symmetric dispatcher: `(amount0, amount1)` for a given `L`, across the
/// same three price regions.
pub fn amounts(s_cur: U256, s_lo: U256, s_hi: U256, l: U256) -> Result<(U256, U256), MathError> {
    check_range(s_lo, s_hi)?;
    if s_cur < s_lo {
        let a0 = amount0_from_l(s_lo, s_hi, l)?;
        return Ok((a0, U256::ZERO));
    }
    if s_cur > s_hi {
        let a1 = amount1_from_l(s_lo, s_hi, l)?;
        return Ok((U256::ZERO, a1));
    }
    let a0 = amount0_from_l(s_cur, s_hi, l)?;
    let a1 = amount1_from_l(s_lo, s_cur, l)?;
    Ok((a0, a1))
}

/// Display-only USD -> `L` estimate used by the planner to populate
/// `SubPosition.liquidity_estimate` (spec.md §4.C step 10). This is NOT used
/// to derive the actual mint amounts; those come from the orientation
/// resolver's exact wei assignment. Ported from
/// `original_source/src/math/liquidity.py::calculate_liquidity_from_usd`.
pub fn liquidity_from_usd_estimate(
    usd_amount: f64,
    price_lower: f64,
    price_upper: f64,
    current_price: f64,
    token0_decimals: u8,
    token1_decimals: u8,
    token1_is_stable: bool,
) -> Result<U256, MathError> {
    use crate::math::tick::sqrt_price_x96_from_price;

    let s_lo = sqrt_price_x96_from_price(price_lower)
        .map_err(|_| MathError::MathOverflow("liquidity_from_usd_estimate: price_lower"))?;
    let s_hi = sqrt_price_x96_from_price(price_upper)
        .map_err(|_| MathError::MathOverflow("liquidity_from_usd_estimate: price_upper"))?;
    let s_cur = sqrt_price_x96_from_price(current_price)
        .map_err(|_| MathError::MathOverflow("liquidity_from_usd_estimate: current_price"))?;

    let position_below = s_cur >= s_hi;
    let position_above = s_cur <= s_lo;

    let (amount0, amount1) = if token1_is_stable {
        if position_below || !position_above {
            let a1 = usd_to_wei(usd_amount, token1_decimals);
            (None, Some(a1))
        } else {
            let avg_price = (price_lower + price_upper) / 2.0;
            let amount0_in_tokens = usd_amount / avg_price;
            (Some(usd_to_wei(amount0_in_tokens, token0_decimals)), None)
        }
    } else if position_above || !position_below {
        let a0 = usd_to_wei(usd_amount, token0_decimals);
        (Some(a0), None)
    } else {
        let avg_price = (price_lower + price_upper) / 2.0;
        let amount1_in_tokens = usd_amount / avg_price;
        (None, Some(usd_to_wei(amount1_in_tokens, token1_decimals)))
    };

    liquidity(s_cur, s_lo, s_hi, amount0, amount1)
}

/// Exact USD (or other decimal display unit) -> wei conversion, truncating
/// toward zero. The only place a floating-point USD amount is allowed to
/// become an on-chain integer; callers that need the *exact* mint amount
/// (not a display estimate) must instead route through the orientation
/// resolver which works in integer cents-of-wei throughout.
pub fn usd_to_wei(amount: f64, decimals: u8) -> U256 {
    if amount <= 0.0 || !amount.is_finite() {
        return U256::ZERO;
    }
    // Scale in a string-stable way to avoid f64 precision loss compounding
    // over 18-decimal multipliers.
    let scaled = amount * 10f64.powi(decimals as i32);
    if scaled >= (u128::MAX as f64) {
        // astronomically large for any realistic ladder input; saturate
        return U256::MAX;
    }
    U256::from(scaled as u128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::tick::tick_to_sqrt_price_x96;

    #[test]
    fn liquidity_round_trip_below_range() {
        let s_lo = tick_to_sqrt_price_x96(-1000);
        let s_hi = tick_to_sqrt_price_x96(1000);
        let s_cur = tick_to_sqrt_price_x96(-2000); // below range
        let a0 = U256::from(1_000_000_000_000_000_000u128);
        let l = liquidity(s_cur, s_lo, s_hi, Some(a0), None).unwrap();
        let (a0_back, a1_back) = amounts(s_cur, s_lo, s_hi, l).unwrap();
        assert_eq!(a1_back, U256::ZERO);
        let diff = if a0_back > a0 { a0_back - a0 } else { a0 - a0_back };
        assert!(diff <= U256::from(2u8), "diff={diff}");
    }

    #[test]
    fn liquidity_round_trip_above_range() {
        let s_lo = tick_to_sqrt_price_x96(-1000);
        let s_hi = tick_to_sqrt_price_x96(1000);
        let s_cur = tick_to_sqrt_price_x96(2000); // above range
        let a1 = U256::from(5_000_000_000_000_000_000u128);
        let l = liquidity(s_cur, s_lo, s_hi, None, Some(a1)).unwrap();
        let (a0_back, a1_back) = amounts(s_cur, s_lo, s_hi, l).unwrap();
        assert_eq!(a0_back, U256::ZERO);
        let diff = if a1_back > a1 { a1_back - a1 } else { a1 - a1_back };
        assert!(diff <= U256::from(2u8));
    }

    #[test]
    fn liquidity_round_trip_in_range() {
        let s_lo = tick_to_sqrt_price_x96(-1000);
        let s_hi = tick_to_sqrt_price_x96(1000);
        let s_cur = tick_to_sqrt_price_x96(0);
        let a0 = U256::from(1_000_000_000_000_000_000u128);
        let a1 = U256::from(1_000_000_000_000_000_000u128);
        let l = liquidity(s_cur, s_lo, s_hi, Some(a0), Some(a1)).unwrap();
        let (a0_back, a1_back) = amounts(s_cur, s_lo, s_hi, l).unwrap();
        assert!(a0_back <= a0 + U256::from(2u8));
        assert!(a1_back <= a1 + U256::from(2u8));
    }

    #[test]
    fn bad_range_rejected() {
        let s = tick_to_sqrt_price_x96(0);
        assert!(matches!(l_from_amount0(s, s, U256::from(1u8)), Err(MathError::BadRange { .. })));
    }

    #[test]
    fn missing_side_rejected() {
        let s_lo = tick_to_sqrt_price_x96(-1000);
        let s_hi = tick_to_sqrt_price_x96(1000);
        let s_cur = tick_to_sqrt_price_x96(-2000);
        assert!(matches!(
            liquidity(s_cur, s_lo, s_hi, None, None),
            Err(MathError::MissingSide(_))
        ));
    }
}
