//! A thin typed facade over [`BitEngine`], exposing one method per
//! distribution named in spec.md §4.3 plus state/advance/distance.

use crate::bit_engine::BitEngine;
use crate::distributions::{decide, decide_masked, randint, Distribution};
use crate::error::{Error, Result};

/// One seeded PCG32-backed generator, with convenience draw methods for
/// every built-in distribution.
#[derive(Debug, Clone)]
pub struct Generator {
  engine: BitEngine,
}

impl Default for Generator {
  fn default() -> Self {
    Self { engine: BitEngine::default() }
  }
}

impl Generator {
  /// Seed a new generator from `(init_state, init_seq)`.
  pub const fn new(init_state: u64, init_seq: u64) -> Self {
    Self { engine: BitEngine::seed(init_state, init_seq) }
  }

  /// Seed a new generator using the crate-default `(init_state,
  /// init_seq)` pair, identical to [`Generator::default`]. Named
  /// separately so call sites reading "seed a generator" don't have to
  /// reach for the `Default` trait.
  pub fn seeded() -> Self {
    Self::default()
  }

  /// Seed a new generator with random bytes from the OS, via
  /// [`getrandom`]. Ported from the teacher crate's
  /// `PCG32::from_getrandom`.
  #[cfg(feature = "getrandom")]
  pub fn from_getrandom() -> core::result::Result<Self, getrandom::Error> {
    use bytemuck::bytes_of_mut;
    let mut buf = [0_u64; 2];
    getrandom::getrandom(bytes_of_mut(&mut buf))?;
    Ok(Self::new(buf[0], buf[1]))
  }

  /// Direct access to the underlying bit engine, for code (e.g.
  /// [`crate::chunk::CumsumChunk`]) that needs to borrow the raw PCG32
  /// rather than go through a named distribution method.
  pub(crate) fn engine_mut(&mut self) -> &mut BitEngine {
    &mut self.engine
  }

  pub(crate) fn engine(&self) -> &BitEngine {
    &self.engine
  }

  /// The generator's current raw state.
  pub fn state(&self) -> u64 {
    self.engine.state()
  }

  /// Overwrite the generator's state, leaving its seed material
  /// (`init_state`/`init_seq`) untouched.
  pub fn restore(&mut self, state: u64) {
    self.engine.restore(state);
  }

  /// Advance (or rewind, for negative `k`) the generator's position by
  /// `k` steps in `O(log|k|)` time.
  pub fn advance(&mut self, k: i64) {
    self.engine.advance(k);
  }

  /// Signed distance from `self` to `other`; both must share a stream
  /// (i.e. be constructed with the same `init_seq`).
  pub fn distance(&self, other: &Generator) -> i64 {
    self.engine.distance(&other.engine)
  }

  /// The constructor-supplied `init_state`.
  pub fn initstate(&self) -> u64 {
    self.engine.init_state()
  }

  /// The constructor-supplied `init_seq`.
  pub fn initseq(&self) -> u64 {
    self.engine.init_seq()
  }

  /// Draw `out.len()` uniforms in `[0, 1)`.
  pub fn random(&mut self, out: &mut [f64]) {
    Distribution::Random { scale: 1.0, offset: 0.0 }.draw(&mut self.engine, out);
  }

  /// Draw `out.len()` uniforms in `[offset, offset + scale)`.
  pub fn random_scaled(&mut self, out: &mut [f64], scale: f64, offset: f64) -> Result<()> {
    if scale < 0.0 {
      return Err(Error::InvalidParameter { operation: "random", detail: "scale must be non-negative" });
    }
    Distribution::Random { scale, offset }.draw(&mut self.engine, out);
    Ok(())
  }

  /// Fill `out` with the constant `mu`, without advancing the
  /// generator (spec.md's delta exception).
  pub fn delta(&mut self, out: &mut [f64], mu: f64) {
    Distribution::Delta { mu }.draw(&mut self.engine, out);
  }

  pub fn normal(&mut self, out: &mut [f64], mu: f64, sigma: f64) -> Result<()> {
    if sigma < 0.0 {
      return Err(Error::InvalidParameter { operation: "normal", detail: "sigma must be non-negative" });
    }
    Distribution::Normal { mu, sigma }.draw(&mut self.engine, out);
    Ok(())
  }

  pub fn exponential(&mut self, out: &mut [f64], rate: f64) -> Result<()> {
    if rate <= 0.0 {
      return Err(Error::InvalidParameter { operation: "exponential", detail: "rate must be positive" });
    }
    Distribution::Exponential { rate }.draw(&mut self.engine, out);
    Ok(())
  }

  pub fn weibull(&mut self, out: &mut [f64], k: f64, lambda: f64) -> Result<()> {
    if k <= 0.0 || lambda < 0.0 {
      return Err(Error::InvalidParameter { operation: "weibull", detail: "k must be positive and lambda non-negative" });
    }
    Distribution::Weibull { k, lambda }.draw(&mut self.engine, out);
    Ok(())
  }

  pub fn gamma(&mut self, out: &mut [f64], alpha: f64, theta: f64) -> Result<()> {
    if alpha < 0.0 || theta < 0.0 {
      return Err(Error::InvalidParameter { operation: "gamma", detail: "alpha and theta must be non-negative" });
    }
    Distribution::Gamma { alpha, theta }.draw(&mut self.engine, out);
    Ok(())
  }

  pub fn pareto(&mut self, out: &mut [f64], alpha: f64) -> Result<()> {
    if alpha <= 0.0 {
      return Err(Error::InvalidParameter { operation: "pareto", detail: "alpha must be positive" });
    }
    Distribution::Pareto { alpha }.draw(&mut self.engine, out);
    Ok(())
  }

  pub fn power(&mut self, out: &mut [f64], k: f64) -> Result<()> {
    if k <= 0.0 {
      return Err(Error::InvalidParameter { operation: "power", detail: "k must be positive" });
    }
    Distribution::Power { k }.draw(&mut self.engine, out);
    Ok(())
  }

  /// Draw `out.len()` integers uniformly in `[low, high)`.
  pub fn randint(&mut self, out: &mut [i64], low: i64, high: i64) -> Result<()> {
    if high <= low {
      return Err(Error::InvalidParameter { operation: "randint", detail: "high must be greater than low" });
    }
    randint(&mut self.engine, low, high, out);
    Ok(())
  }

  /// `out[i] = (uniform() <= p[i])` for every position; advances by
  /// `p.len()`.
  pub fn decide(&mut self, p: &[f64], out: &mut [bool]) {
    decide(&mut self.engine, p, out);
  }

  /// As [`Generator::decide`], but only draws at positions where `mask`
  /// is true; other positions keep their existing `out` value and do
  /// not consume a generator step.
  pub fn decide_masked(&mut self, p: &[f64], mask: &[bool], out: &mut [bool]) {
    decide_masked(&mut self.engine, p, mask, out);
  }

  pub fn cumsum_random(&mut self, n: u64) -> f64 {
    Distribution::Random { scale: 1.0, offset: 0.0 }.cumsum(&mut self.engine, n)
  }

  pub fn cumsum_delta(&mut self, n: u64, mu: f64) -> f64 {
    Distribution::Delta { mu }.cumsum(&mut self.engine, n)
  }

  pub fn cumsum_normal(&mut self, n: u64, mu: f64, sigma: f64) -> Result<f64> {
    if sigma < 0.0 {
      return Err(Error::InvalidParameter { operation: "cumsum_normal", detail: "sigma must be non-negative" });
    }
    Ok(Distribution::Normal { mu, sigma }.cumsum(&mut self.engine, n))
  }

  pub fn cumsum_exponential(&mut self, n: u64, rate: f64) -> Result<f64> {
    if rate <= 0.0 {
      return Err(Error::InvalidParameter { operation: "cumsum_exponential", detail: "rate must be positive" });
    }
    Ok(Distribution::Exponential { rate }.cumsum(&mut self.engine, n))
  }

  pub fn cumsum_weibull(&mut self, n: u64, k: f64, lambda: f64) -> Result<f64> {
    if k <= 0.0 || lambda < 0.0 {
      return Err(Error::InvalidParameter { operation: "cumsum_weibull", detail: "k must be positive and lambda non-negative" });
    }
    Ok(Distribution::Weibull { k, lambda }.cumsum(&mut self.engine, n))
  }

  pub fn cumsum_gamma(&mut self, n: u64, alpha: f64, theta: f64) -> Result<f64> {
    if alpha < 0.0 || theta < 0.0 {
      return Err(Error::InvalidParameter { operation: "cumsum_gamma", detail: "alpha and theta must be non-negative" });
    }
    Ok(Distribution::Gamma { alpha, theta }.cumsum(&mut self.engine, n))
  }

  pub fn cumsum_pareto(&mut self, n: u64, alpha: f64) -> Result<f64> {
    if alpha <= 0.0 {
      return Err(Error::InvalidParameter { operation: "cumsum_pareto", detail: "alpha must be positive" });
    }
    Ok(Distribution::Pareto { alpha }.cumsum(&mut self.engine, n))
  }

  pub fn cumsum_power(&mut self, n: u64, k: f64) -> Result<f64> {
    if k <= 0.0 {
      return Err(Error::InvalidParameter { operation: "cumsum_power", detail: "k must be positive" });
    }
    Ok(Distribution::Power { k }.cumsum(&mut self.engine, n))
  }
}
