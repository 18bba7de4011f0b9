//! Pure math: tick/sqrt-price conversions and liquidity <-> amount algebra.
//!
//! Nothing in this module touches the network; every function is a closed
//! form over integers (`U256`) or, where the spec calls for it, `f64` used
//! only for display-facing conversions.

pub mod liquidity;
pub mod tick;
