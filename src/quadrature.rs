//! Fixed-degree Gauss–Legendre quadrature, used to approximate the
//! expected batched sum of `n` quantile draws without materialising them.

/// 16-point Gauss–Legendre nodes on `[-1, 1]`, positive half only (the
/// rule is symmetric: node `-x` carries the same weight as node `x`).
const NODES: [f64; 8] = [
  0.095_012_509_837_637_44,
  0.281_603_550_779_258_9,
  0.458_016_777_657_227_4,
  0.617_876_244_402_643_7,
  0.755_404_408_355_003,
  0.865_631_202_387_831_7,
  0.944_575_023_073_232_6,
  0.989_400_934_991_65,
];

/// Weights paired with [`NODES`].
const WEIGHTS: [f64; 8] = [
  0.189_450_610_455_068_5,
  0.182_603_415_044_923_6,
  0.169_156_519_395_002_5,
  0.149_595_988_816_576_7,
  0.124_631_563_020_002_2,
  0.095_158_511_682_492_8,
  0.062_253_523_938_647_9,
  0.027_152_459_411_754_1,
];

/// Approximate `n * integral_0^1 f(u) du` via 16-point Gauss–Legendre
/// quadrature. Used for the batched cumsum of distributions whose
/// quantile has no cheap direct summation (spec.md §4.2).
pub fn integrate_scaled<F: Fn(f64) -> f64>(n: u64, f: F) -> f64 {
  let mut total = 0.0;
  for i in 0..NODES.len() {
    // Map node `x in [-1,1]` to `u in [0,1]`: `u = 0.5*x + 0.5`, with
    // Jacobian `0.5`.
    let half_node = 0.5 * NODES[i];
    let u_pos = 0.5 + half_node;
    let u_neg = 0.5 - half_node;
    total += WEIGHTS[i] * (f(u_pos) + f(u_neg));
  }
  (n as f64) * 0.5 * total
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn integrates_constant_function_exactly() {
    let result = integrate_scaled(1, |_u| 3.0);
    assert!((result - 3.0).abs() < 1e-12);
  }

  #[test]
  fn integrates_linear_function_to_known_mean() {
    // integral_0^1 u du = 0.5
    let result = integrate_scaled(10, |u| u);
    assert!((result - 5.0).abs() < 1e-9);
  }
}
