//! Ladder distribution planner: converts a price range, total capital, and
//! weight shape into an ordered set of tick-aligned, non-overlapping
//! sub-positions.

use crate::error::{InputError, MathError};
use crate::math::liquidity::liquidity_from_usd_estimate;
use crate::math::tick::{align_offset_round_nearest, align_tick, get_tick_spacing, price_to_tick, tick_to_price};
use crate::types::{DistributionType, SubPosition};
use std::fmt;

/// Output of a single planning call, one-sided or already-merged two-sided.
#[derive(Debug, Clone)]
pub struct LadderPlan {
    pub sub_positions: Vec<SubPosition>,
    pub tick_spacing: i32,
}

impl LadderPlan {
    pub fn summarize(&self) -> PlanSummary {
        PlanSummary {
            bucket_count: self.sub_positions.len(),
            total_usd: self.sub_positions.iter().map(|p| p.usd_amount).sum(),
            tick_spacing: self.tick_spacing,
            span: self
                .sub_positions
                .first()
                .zip(self.sub_positions.last())
                .map(|(a, b)| (a.tick_lower.min(b.tick_lower), a.tick_upper.max(b.tick_upper))),
        }
    }
}

impl fmt::Display for LadderPlan {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "ladder plan: {} buckets, spacing {}", self.sub_positions.len(), self.tick_spacing)?;
        for p in &self.sub_positions {
            writeln!(
                f,
                "  [{:>2}] ticks [{:>7}, {:>7}) price [{:.6}, {:.6}) usd={:.2} ({:.2}%) L~{}",
                p.index, p.tick_lower, p.tick_upper, p.price_lower_display, p.price_upper_display,
                p.usd_amount, p.percentage, p.liquidity_estimate
            )?;
        }
        Ok(())
    }
}

/// Small report struct rendered by the CLI; ports the source's
/// `print_distribution` debug dump as data instead of a print function.
#[derive(Debug, Clone)]
pub struct PlanSummary {
    pub bucket_count: usize,
    pub total_usd: f64,
    pub tick_spacing: i32,
    pub span: Option<(i32, i32)>,
}

fn weights(n: u32, shape: DistributionType) -> Vec<f64> {
    let n = n as usize;
    match shape {
        DistributionType::Linear => (1..=n).map(|i| i as f64).collect(),
        DistributionType::Quadratic => (1..=n).map(|i| (i as f64).powi(2)).collect(),
        DistributionType::Exponential => (0..n).map(|i| 1.5f64.powi(i as i32)).collect(),
        DistributionType::Fibonacci => {
            let mut w = Vec::with_capacity(n);
            let (mut a, mut b) = (1.0, 1.0);
            for i in 0..n {
                if i == 0 {
                    w.push(1.0);
                } else if i == 1 {
                    w.push(1.0);
                } else {
                    let next = a + b;
                    w.push(next);
                    a = b;
                    b = next;
                }
            }
            w
        }
    }
}

/// One-sided planner, spec.md §4.C steps 1-10.
#[allow(clippy::too_many_arguments)]
pub fn plan_one_sided(
    current_price: f64,
    limit_price: f64,
    total_usd: f64,
    n: u32,
    fee: u32,
    shape: DistributionType,
    token1_is_stable: bool,
    invert_price: bool,
    tick_spacing_override: Option<i32>,
    decimal_offset: i32,
    allow_custom_fee: bool,
) -> Result<LadderPlan, crate::error::CoreError> {
    if n < 1 {
        return Err(InputError::InvalidRange("n_positions must be >= 1".into()).into());
    }
    if total_usd <= 0.0 {
        return Err(InputError::InvalidRange("total_usd must be positive".into()).into());
    }
    if current_price == limit_price {
        return Err(InputError::InvalidRange("current_price must differ from limit_price".into()).into());
    }

    let spacing = match tick_spacing_override {
        Some(s) => s,
        None => get_tick_spacing(fee, allow_custom_fee)?,
    };

    let t_cur = price_to_tick(current_price, invert_price)?;
    let t_lim = price_to_tick(limit_price, invert_price)?;

    let descending = t_cur > t_lim;
    let (mut t_lo, mut t_hi) = if descending {
        (align_tick(t_lim, spacing, true), align_tick(t_cur, spacing, true))
    } else {
        (align_tick(t_cur, spacing, false), align_tick(t_lim, spacing, false))
    };
    if t_hi <= t_lo {
        t_hi = t_lo + spacing;
    }

    let span = (t_hi - t_lo) as f64;
    let raw_width = (span / n as f64 / spacing as f64).ceil() as i32 * spacing;
    let width = raw_width.max(spacing);

    let w = weights(n, shape);
    let w_sum: f64 = w.iter().sum();

    let mut usd = vec![0.0f64; n as usize];
    let mut running = 0.0f64;
    for (i, wi) in w.iter().enumerate() {
        if i + 1 == n as usize {
            usd[i] = total_usd - running;
        } else {
            let share = wi / w_sum;
            usd[i] = total_usd * share;
            running += usd[i];
        }
    }

    let inner_tick = if descending { t_hi } else { t_lo };
    let mut sub_positions = Vec::with_capacity(n as usize);
    for i in 0..n as usize {
        let (human_lo, human_hi) = if descending {
            let hi = inner_tick - (i as i32) * width;
            let lo = hi - width;
            (lo, hi)
        } else {
            let lo = inner_tick + (i as i32) * width;
            let hi = lo + width;
            (lo, hi)
        };

        let pool_lo = align_offset_round_nearest(human_lo + decimal_offset, spacing);
        let pool_hi = align_offset_round_nearest(human_hi + decimal_offset, spacing);
        let (pool_lo, pool_hi) = if pool_hi <= pool_lo {
            (pool_lo, pool_lo + spacing)
        } else {
            (pool_lo, pool_hi)
        };

        let price_human_lo = tick_to_price(human_lo, invert_price);
        let price_human_hi = tick_to_price(human_hi, invert_price);
        let (price_lower_display, price_upper_display) = if invert_price {
            (price_human_hi, price_human_lo)
        } else {
            (price_human_lo, price_human_hi)
        };

        let price_pool_lo = tick_to_price(pool_lo, false);
        let price_pool_hi = tick_to_price(pool_hi, false);
        let current_pool_price = tick_to_price(price_to_tick(current_price, invert_price)?, false);
        let liquidity_estimate = liquidity_from_usd_estimate(
            usd[i],
            price_pool_lo,
            price_pool_hi,
            current_pool_price,
            18,
            18,
            token1_is_stable,
        )
        .map(|l| l.to_string())
        .unwrap_or_else(|_| "0".to_string());

        sub_positions.push(SubPosition {
            index: i,
            tick_lower: pool_lo,
            tick_upper: pool_hi,
            price_lower_display,
            price_upper_display,
            usd_amount: usd[i],
            percentage: usd[i] / total_usd * 100.0,
            liquidity_estimate,
        });
    }

    Ok(LadderPlan { sub_positions, tick_spacing: spacing })
}

/// Two-sided wrapper, spec.md §4.C `calculate_bid_ask_from_percent`.
#[allow(clippy::too_many_arguments)]
pub fn calculate_bid_ask_from_percent(
    current_price: f64,
    pct_from: f64,
    pct_to: f64,
    total_usd: f64,
    n: u32,
    fee: u32,
    shape: DistributionType,
    token1_is_stable: bool,
    invert_price: bool,
    tick_spacing_override: Option<i32>,
    decimal_offset: i32,
    allow_custom_fee: bool,
) -> Result<LadderPlan, crate::error::CoreError> {
    let (pct_lo, pct_hi) = (pct_from.min(pct_to), pct_from.max(pct_to));
    let p_lo = current_price * (1.0 + pct_lo / 100.0);
    let p_hi = current_price * (1.0 + pct_hi / 100.0);

    // Strictly one-sided: delegate to the range's own edges (upper, lower),
    // not (current_price, edge) — `current_price` may sit well inside or
    // even outside the requested span, but the ladder must anchor at the
    // range's own top, not at market current (original_source's
    // `calculate_bid_ask_from_percent` always passes `upper_price` as the
    // one-sided planner's "current" and `lower_price` as its "limit").
    if p_hi <= current_price {
        return plan_one_sided(
            p_hi, p_lo, total_usd, n, fee, shape, token1_is_stable, invert_price,
            tick_spacing_override, decimal_offset, allow_custom_fee,
        );
    }
    if p_lo >= current_price {
        return plan_one_sided(
            p_hi, p_lo, total_usd, n, fee, shape, token1_is_stable, invert_price,
            tick_spacing_override, decimal_offset, allow_custom_fee,
        );
    }

    let spacing = match tick_spacing_override {
        Some(s) => s,
        None => get_tick_spacing(fee, allow_custom_fee)?,
    };
    // Split on price-space distance (current - lower, upper - current), not
    // tick-space distance: ticks are a log scale, so a symmetric percent
    // range around current (e.g. +-30%) is asymmetric in tick space and
    // would mis-split an evenly-balanced two-sided ladder
    // (original_source's `range_below`/`range_above`).
    let dist_below = (current_price - p_lo).abs();
    let dist_above = (p_hi - current_price).abs();
    let total_dist = dist_below + dist_above;
    if total_dist == 0.0 {
        return Err(MathError::MathOverflow("calculate_bid_ask_from_percent: zero price distance").into());
    }

    let mut n_below = ((n as f64) * dist_below / total_dist).round() as i64;
    n_below = n_below.clamp(1, n as i64 - 1);
    let n_above = n as i64 - n_below;

    let usd_below = total_usd * dist_below / total_dist;
    let usd_above = total_usd - usd_below;

    let mut below = plan_one_sided(
        current_price, p_lo, usd_below, n_below as u32, fee, shape, token1_is_stable, invert_price,
        Some(spacing), decimal_offset, allow_custom_fee,
    )?;
    let above = plan_one_sided(
        current_price, p_hi, usd_above, n_above as u32, fee, shape, token1_is_stable, invert_price,
        Some(spacing), decimal_offset, allow_custom_fee,
    )?;

    below.sub_positions.extend(above.sub_positions);
    for (i, p) in below.sub_positions.iter_mut().enumerate() {
        p.index = i;
    }
    Ok(below)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distribution_sum_exact() {
        let plan = plan_one_sided(
            600.0, 360.0, 1000.0, 7, 2500, DistributionType::Linear, true, false, None, 0, false,
        )
        .unwrap();
        let sum: f64 = plan.sub_positions.iter().map(|p| p.usd_amount).sum();
        assert!((sum - 1000.0).abs() < 1e-6);
    }

    #[test]
    fn weight_monotonicity_linear() {
        let plan = plan_one_sided(
            600.0, 360.0, 1000.0, 7, 2500, DistributionType::Linear, true, false, None, 0, false,
        )
        .unwrap();
        for w in plan.sub_positions.windows(2) {
            assert!(w[1].usd_amount >= w[0].usd_amount);
        }
    }

    #[test]
    fn tick_alignment_and_equal_width() {
        let plan = plan_one_sided(
            600.0, 360.0, 1000.0, 7, 2500, DistributionType::Linear, true, false, None, 0, false,
        )
        .unwrap();
        let widths: Vec<i32> = plan.sub_positions.iter().map(|p| p.tick_upper - p.tick_lower).collect();
        assert!(widths.windows(2).all(|w| w[0] == w[1]));
        for p in &plan.sub_positions {
            assert_eq!(p.tick_lower % plan.tick_spacing, 0);
            assert_eq!(p.tick_upper % plan.tick_spacing, 0);
        }
    }

    #[test]
    fn contiguity() {
        let plan = plan_one_sided(
            600.0, 360.0, 1000.0, 7, 2500, DistributionType::Linear, true, false, None, 0, false,
        )
        .unwrap();
        for w in plan.sub_positions.windows(2) {
            assert_eq!(w[0].tick_lower, w[1].tick_upper);
        }
    }

    #[test]
    fn two_sided_splits_and_renumbers() {
        let plan = calculate_bid_ask_from_percent(
            100.0, -30.0, 30.0, 2000.0, 10, 3000, DistributionType::Linear, true, false, None, 0, false,
        )
        .unwrap();
        assert_eq!(plan.sub_positions.len(), 10);
        for (i, p) in plan.sub_positions.iter().enumerate() {
            assert_eq!(p.index, i);
        }
        let sum: f64 = plan.sub_positions.iter().map(|p| p.usd_amount).sum();
        assert!((sum - 2000.0).abs() < 1e-6);

        // symmetric +-30% around 100 is price-space symmetric, so the split
        // must land exactly 5/5, not the 6/4 a tick-space (log-scale) split
        // would produce.
        let t_cur = price_to_tick(100.0, false).unwrap();
        let below = plan.sub_positions.iter().filter(|p| p.tick_upper <= t_cur).count();
        let above = plan.sub_positions.iter().filter(|p| p.tick_lower >= t_cur).count();
        assert_eq!(below, 5);
        assert_eq!(above, 5);
    }

    #[test]
    fn one_sided_anchors_at_range_upper_not_current() {
        // S1 (spec.md §8): current=600, -5%/-40% must span the aligned tick
        // at ~=$570 (=p_hi) down to ~=$360 (=p_lo), not current(600)->360.
        let plan = calculate_bid_ask_from_percent(
            600.0, -5.0, -40.0, 1000.0, 7, 2500, DistributionType::Linear, true, false, None, 0, false,
        )
        .unwrap();
        let outer_tick = plan.sub_positions.iter().map(|p| p.tick_lower).min().unwrap();
        let inner_tick = plan.sub_positions.iter().map(|p| p.tick_upper).max().unwrap();

        let p_hi = 600.0 * (1.0 - 5.0 / 100.0);
        let p_lo = 600.0 * (1.0 - 40.0 / 100.0);
        let spacing = plan.tick_spacing;
        let expected_inner = align_tick(price_to_tick(p_hi, false).unwrap(), spacing, true);
        let expected_outer = align_tick(price_to_tick(p_lo, false).unwrap(), spacing, true);

        assert_eq!(inner_tick, expected_inner, "inner (nearest-current) tick must anchor at ~$570, not $600");
        assert_eq!(outer_tick, expected_outer);
    }

    #[test]
    fn rejects_degenerate_inputs() {
        assert!(plan_one_sided(100.0, 100.0, 1000.0, 5, 3000, DistributionType::Linear, true, false, None, 0, false).is_err());
        assert!(plan_one_sided(100.0, 90.0, 0.0, 5, 3000, DistributionType::Linear, true, false, None, 0, false).is_err());
        assert!(plan_one_sided(100.0, 90.0, 1000.0, 0, 3000, DistributionType::Linear, true, false, None, 0, false).is_err());
    }
}
