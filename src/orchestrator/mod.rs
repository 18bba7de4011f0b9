//! Ladder orchestrator (spec.md §4.H): end-to-end
//! `plan -> validate -> approve -> (create-pool?) -> batch-mint -> index`,
//! and the `close-ladder`/`batch-close` reverse path.
//!
//! Grounded on `original_source/src/liquidity_provider.py`'s
//! `LiquidityProvider` pipeline, split per spec.md §9 design notes into a
//! pure planner (already `planner::distribution`/`planner::orientation`), a
//! read-only pool reader (`pool::discovery`), a write-path approver, and a
//! write-path executor (`executor::batch`) — each independently testable.

pub mod ladder;

pub use ladder::LadderOrchestrator;
