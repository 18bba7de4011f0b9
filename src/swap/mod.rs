//! Post-close swap planner (spec.md §4.I): routes a single non-stable
//! token into the target stablecoin across v2 and v3 venues, gates on
//! price impact, and submits through the shared batch executor.

pub mod encode;
pub mod planner;

pub use planner::{Route, SwapInput, SwapOutcome, SwapPlan, SwapPlanner, Venue, FEE_TIERS};
