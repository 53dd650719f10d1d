//! Tagged failure values, per spec.md §7.
//!
//! `OutOfOrderSeed` has no variant here: spec.md is explicit that it is
//! "silently normalised" rather than reported, which [`crate::bit_engine`]
//! handles at construction by forcing the stream increment odd.

use thiserror::Error;

/// The error taxonomy this crate reports.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
  /// A parameter was out of its valid domain: negative `scale`, negative
  /// `rate`, `k < 0`, `high <= low`, or an empty `out[]` where the
  /// operation requires a non-empty buffer.
  #[error("invalid parameter for {operation}: {detail}")]
  InvalidParameter { operation: &'static str, detail: &'static str },

  /// A quantile evaluation produced a non-finite result for a given
  /// parameter regime (e.g. `gamma` with `alpha < 1` near `u = 0` or
  /// `u = 1`). Vectorised `draw` does not raise this — it writes `NaN`
  /// per spec.md §7 and leaves filtering to the caller; this variant is
  /// for the scalar `quantile`/`cdf` entry points that choose to report
  /// rather than propagate `NaN`.
  #[error("{distribution} quantile is non-finite at input {input}")]
  DistributionDomain { distribution: &'static str, input: f64 },

  /// `align`/`next`/`prev` would need to move a `CumsumChunk` behind an
  /// anchor it does not have recorded (spec.md §4.5.2 `prev`).
  #[error("alignment to index {requested} is unreachable from anchor at index {anchor_index}")]
  AlignmentUnreachable { requested: i128, anchor_index: u64 },
}

pub type Result<T> = core::result::Result<T, Error>;
