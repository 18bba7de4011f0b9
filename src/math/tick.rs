//! Q64.96 fixed-point sqrt-price and tick math.
//!
//! Ticks and sqrt-prices are exact integers; only the tick<->price
//! conversions touch real-valued (`f64`) arithmetic, and only at points
//! where the result is immediately floored to a tick or used purely for
//! display. Every on-chain amount and every `L` elsewhere in this crate
//! stays in `U256`.

use crate::error::{InputError, MathError};
use alloy::primitives::U256;
use once_cell::sync::Lazy;

pub const Q96: u32 = 96;
pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = 887272;

/// `4295128739`
pub static MIN_SQRT_RATIO: Lazy<U256> = Lazy::new(|| U256::from(4295128739u64));
/// `1461446703485210103287273052203988822378723970342`
pub static MAX_SQRT_RATIO: Lazy<U256> =
    Lazy::new(|| U256::from_str_radix("1461446703485210103287273052203988822378723970342", 10).unwrap());

const LN_1_0001: f64 = 0.00009999500033330834; // ln(1.0001), precomputed to avoid repeated libm calls

fn clamp_tick(tick: i64) -> i32 {
    tick.clamp(MIN_TICK as i64, MAX_TICK as i64) as i32
}

/// `tick = floor(ln(price) / ln(1.0001))`, clamped to `[MIN_TICK, MAX_TICK]`.
///
/// With `invert`, `price` is replaced by `1/price` before the log. Fails on
/// non-positive price.
pub fn price_to_tick(price: f64, invert: bool) -> Result<i32, InputError> {
    if !(price > 0.0) || !price.is_finite() {
        return Err(InputError::InvalidPrice(price));
    }
    let p = if invert { 1.0 / price } else { price };
    let tick = (p.ln() / LN_1_0001).floor();
    Ok(clamp_tick(tick as i64))
}

/// `p = 1.0001^tick`; if `invert`, returns `1/p`. Stable across the whole
/// tick range: uses log-space evaluation so extreme ticks produce `+inf`/`0`
/// instead of overflowing or panicking.
pub fn tick_to_price(tick: i32, invert: bool) -> f64 {
    // 1.0001^tick = exp(tick * ln(1.0001)); evaluating in log space keeps
    // this finite (or a clean 0/inf) across the full +-887272 tick range,
    // where a naive powf can overflow intermediate magnitudes.
    let ln_price = tick as f64 * LN_1_0001;
    let price = ln_price.exp();
    if invert {
        if price == 0.0 {
            f64::INFINITY
        } else {
            1.0 / price
        }
    } else {
        price
    }
}

/// `(price_lower, price_upper)` display range for a tick range, in the same
/// orientation as `tick_to_price`.
pub fn tick_range_to_price_range(tick_lower: i32, tick_upper: i32, invert: bool) -> (f64, f64) {
    let a = tick_to_price(tick_lower, invert);
    let b = tick_to_price(tick_upper, invert);
    if invert {
        (b, a)
    } else {
        (a, b)
    }
}

/// Aligns `tick` to a multiple of `spacing`. `round_down` selects floor
/// toward `-inf` vs. ceil toward `+inf`; already-aligned ticks are returned
/// unchanged either way.
pub fn align_tick(tick: i32, spacing: i32, round_down: bool) -> i32 {
    if tick % spacing == 0 {
        return tick;
    }
    let q = tick.div_euclid(spacing);
    if round_down {
        q * spacing
    } else {
        (q + 1) * spacing
    }
}

/// `s = floor(sqrt(price) * 2^96)`, clamped into `[MIN_SQRT_RATIO, MAX_SQRT_RATIO]`.
pub fn sqrt_price_x96_from_price(price: f64) -> Result<U256, InputError> {
    if !(price > 0.0) || !price.is_finite() {
        return Err(InputError::InvalidPrice(price));
    }
    let sqrt_price = price.sqrt();
    // f64 mantissa is 52 bits; scale in two steps to preserve precision
    // across the full legal sqrt-price band before narrowing to U256.
    let scaled = sqrt_price * (2f64.powi(52));
    let hi_shift = U256::from(1u8) << (Q96 - 52);
    let low = U256::from(scaled as u128);
    let s = low.saturating_mul(hi_shift);
    Ok(s.clamp(*MIN_SQRT_RATIO, *MAX_SQRT_RATIO))
}

/// `(s / 2^96)^2`.
pub fn price_from_sqrt_price_x96(s: U256) -> f64 {
    let s_f = u256_to_f64(s);
    let denom = 2f64.powi(96);
    let ratio = s_f / denom;
    ratio * ratio
}

fn u256_to_f64(v: U256) -> f64 {
    // U256::to::<f64>() or a direct `as` conversion isn't provided by
    // alloy_primitives; go through the decimal string for values that don't
    // fit in u128, else take the fast path.
    if let Ok(v128) = u128::try_from(v) {
        v128 as f64
    } else {
        let s = v.to_string();
        s.parse::<f64>().unwrap_or(f64::INFINITY)
    }
}

pub fn tick_to_sqrt_price_x96(tick: i32) -> U256 {
    let price = tick_to_price(tick, false);
    sqrt_price_x96_from_price(price).unwrap_or_else(|_| {
        if tick < 0 {
            *MIN_SQRT_RATIO
        } else {
            *MAX_SQRT_RATIO
        }
    })
}

pub fn sqrt_price_x96_to_tick(s: U256) -> i32 {
    let price = price_from_sqrt_price_x96(s);
    price_to_tick(price, false).unwrap_or(if s <= *MIN_SQRT_RATIO { MIN_TICK } else { MAX_TICK })
}

/// `fee -> tick spacing` table for the standard V3 fee tiers. When `fee` is
/// not in the table: `allow_custom=false` fails `UnknownFeeTier`;
/// `allow_custom=true` applies the V4 heuristic `max(1, round(fee/10000 * 200))`.
pub fn get_tick_spacing(fee: u32, allow_custom: bool) -> Result<i32, InputError> {
    let spacing = match fee {
        100 => 1,
        500 => 10,
        2500 => 50,
        3000 => 60,
        10000 => 200,
        _ => {
            if !allow_custom {
                return Err(InputError::UnknownFeeTier { fee });
            }
            let fee_percent = fee as f64 / 10000.0;
            ((fee_percent * 200.0).round() as i32).max(1)
        }
    };
    Ok(spacing)
}

/// Tick shift reconciling human-readable prices with the pool's raw
/// `(currency0, currency1)` price convention when the two tokens have
/// different decimals, in already-sorted pool order. Zero when `dec0 == dec1`.
pub fn decimal_tick_offset_ordered(dec0: u8, dec1: u8) -> i32 {
    if dec0 == dec1 {
        return 0;
    }
    let exp = dec0 as i32 - dec1 as i32;
    let ratio = 10f64.powi(exp);
    (ratio.ln() / LN_1_0001).round() as i32
}

/// Same as [`decimal_tick_offset_ordered`], but takes the two tokens in
/// arbitrary order and sorts by address (lower address first = currency0)
/// before computing the offset, per the on-chain `(currency0, currency1)`
/// convention.
pub fn decimal_tick_offset(
    addr_a: alloy::primitives::Address,
    dec_a: u8,
    addr_b: alloy::primitives::Address,
    dec_b: u8,
) -> i32 {
    if addr_a < addr_b {
        decimal_tick_offset_ordered(dec_a, dec_b)
    } else {
        decimal_tick_offset_ordered(dec_b, dec_a)
    }
}

/// Aligns a possibly-unaligned tick offset to a multiple of `spacing` via
/// round-to-nearest (not floor/ceil — the offset is a constant shift, not a
/// range boundary).
pub fn align_offset_round_nearest(offset: i32, spacing: i32) -> i32 {
    if spacing == 0 {
        return offset;
    }
    let q = offset as f64 / spacing as f64;
    (q.round() as i32) * spacing
}

pub fn check_alignment(tick_lower: i32, tick_upper: i32, spacing: i32) -> Result<(), MathError> {
    let lo_rem = tick_lower.rem_euclid(spacing);
    let hi_rem = tick_upper.rem_euclid(spacing);
    if lo_rem != 0 || hi_rem != 0 {
        return Err(MathError::TicksNotAligned {
            expected_spacing: spacing,
            lo_rem,
            hi_rem,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_round_trip_samples() {
        for t in [
            MIN_TICK, MIN_TICK + 1, -500000, -100000, -1, 0, 1, 100000, 500000, MAX_TICK - 1, MAX_TICK,
        ] {
            let p = tick_to_price(t, false);
            if p.is_finite() && p > 0.0 {
                let back = price_to_tick(p, false).unwrap();
                assert!((back - t).abs() <= 1, "tick {t} round-tripped to {back}");
            }
        }
    }

    #[test]
    fn sqrt_price_round_trip() {
        for t in [-443636, -200000, -1000, 0, 1000, 200000, 443636] {
            let price = tick_to_price(t, false);
            let s = sqrt_price_x96_from_price(price).unwrap();
            let back_price = price_from_sqrt_price_x96(s);
            let rel_err = ((back_price - price) / price).abs();
            assert!(rel_err < 1e-6, "tick {t}: rel_err {rel_err}");
        }
    }

    #[test]
    fn align_tick_floor_and_ceil() {
        assert_eq!(align_tick(100, 60, true), 60);
        assert_eq!(align_tick(100, 60, false), 120);
        assert_eq!(align_tick(-100, 60, true), -120);
        assert_eq!(align_tick(-100, 60, false), -60);
        assert_eq!(align_tick(120, 60, true), 120);
        assert_eq!(align_tick(120, 60, false), 120);
    }

    #[test]
    fn tick_spacing_table() {
        assert_eq!(get_tick_spacing(100, false).unwrap(), 1);
        assert_eq!(get_tick_spacing(500, false).unwrap(), 10);
        assert_eq!(get_tick_spacing(2500, false).unwrap(), 50);
        assert_eq!(get_tick_spacing(3000, false).unwrap(), 60);
        assert_eq!(get_tick_spacing(10000, false).unwrap(), 200);
        assert!(get_tick_spacing(1234, false).is_err());
        assert_eq!(get_tick_spacing(1234, true).unwrap(), 25);
    }

    #[test]
    fn decimal_offset_zero_when_equal_decimals() {
        assert_eq!(decimal_tick_offset_ordered(18, 18), 0);
    }

    #[test]
    fn decimal_offset_usdc_weth() {
        // dec0=6 (USDC), dec1=18 (WETH): offset should land near -276325
        let offset = decimal_tick_offset_ordered(6, 18);
        assert!((offset - (-276325)).abs() <= 2, "offset was {offset}");
    }

    #[test]
    fn invalid_price_errors() {
        assert!(price_to_tick(0.0, false).is_err());
        assert!(price_to_tick(-1.0, false).is_err());
    }
}
