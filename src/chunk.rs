//! A sliding window over the cumulative sum of a generator-plus-distribution
//! sequence (spec.md §4.5), grounded on
//! `examples/original_source/tests/test_pcg32_cumsum.py` and
//! `test_pcg32_chunk.py`.

use crate::align_policy::AlignPolicy;
use crate::distributions::Distribution;
use crate::error::{Error, Result};
use crate::generator::Generator;

/// Either a built-in [`Distribution`] or a pair of user-supplied draw /
/// batched-cumsum closures (spec.md §4.5's `set_functions`).
pub enum DrawSource {
  Builtin(Distribution),
  Custom {
    draw: Box<dyn FnMut(&mut Generator, &mut [f64])>,
    cumsum: Box<dyn FnMut(&mut Generator, u64) -> f64>,
  },
}

impl core::fmt::Debug for DrawSource {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    match self {
      DrawSource::Builtin(d) => f.debug_tuple("Builtin").field(d).finish(),
      DrawSource::Custom { .. } => f.write_str("Custom(..)"),
    }
  }
}

impl DrawSource {
  fn draw(&mut self, g: &mut Generator, out: &mut [f64]) {
    match self {
      DrawSource::Builtin(d) => d.draw(g.engine_mut(), out),
      DrawSource::Custom { draw, .. } => draw(g, out),
    }
  }

  fn cumsum(&mut self, g: &mut Generator, n: u64) -> f64 {
    match self {
      DrawSource::Builtin(d) => d.cumsum(g.engine_mut(), n),
      DrawSource::Custom { cumsum, .. } => cumsum(g, n),
    }
  }
}

/// The chunk's lifecycle state (spec.md §4.5.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkState {
  /// Constructed but never drawn.
  Unpositioned,
  /// Buffer valid, but not the result of a targeted `align`/`align_at`.
  Positioned,
  /// Positioned, with `index_at_align`/`left_of_align`/`right_of_align`
  /// up to date.
  Aligned,
}

/// A fixed-capacity sliding window over the cumulative sum of a drawn
/// sequence, plus the bookkeeping needed to move, align, and restore it.
#[derive(Debug)]
pub struct CumsumChunk {
  generator: Generator,
  source: DrawSource,
  policy: AlignPolicy,
  data: Vec<f64>,
  start: u64,
  anchor_value: f64,
  anchor_state: u64,
  chunk_state: ChunkState,
  index_at_align: Option<u64>,
  left_of_align: Option<f64>,
  right_of_align: Option<f64>,
}

/// The generator's position relative to its own seed, i.e. how many
/// `advance`s separate it from a freshly-seeded generator with the same
/// `(init_state, init_seq)`. Every global index used by [`CumsumChunk`]
/// is a position in this sense.
fn position_of(generator: &Generator) -> u64 {
  let origin = Generator::new(generator.initstate(), generator.initseq());
  origin.distance(generator) as u64
}

impl CumsumChunk {
  /// Construct a chunk of `n` positions, wrapping `generator`, without
  /// drawing anything yet (`Unpositioned`).
  pub fn new_unpositioned(n: usize, generator: Generator, dist: Distribution, policy: AlignPolicy) -> Self {
    Self {
      generator,
      source: DrawSource::Builtin(dist),
      policy,
      data: vec![0.0; n],
      start: 0,
      anchor_value: 0.0,
      anchor_state: 0,
      chunk_state: ChunkState::Unpositioned,
      index_at_align: None,
      left_of_align: None,
      right_of_align: None,
    }
  }

  /// As [`CumsumChunk::new_unpositioned`], but with a user-supplied draw
  /// / cumsum closure pair instead of a built-in distribution.
  pub fn new_unpositioned_with_fn(
    n: usize,
    generator: Generator,
    draw: Box<dyn FnMut(&mut Generator, &mut [f64])>,
    cumsum: Box<dyn FnMut(&mut Generator, u64) -> f64>,
    policy: AlignPolicy,
  ) -> Self {
    Self {
      generator,
      source: DrawSource::Custom { draw, cumsum },
      policy,
      data: vec![0.0; n],
      start: 0,
      anchor_value: 0.0,
      anchor_state: 0,
      chunk_state: ChunkState::Unpositioned,
      index_at_align: None,
      left_of_align: None,
      right_of_align: None,
    }
  }

  /// Construct and immediately draw the first chunk (matches the
  /// original `prrng` Python bindings, whose constructors return an
  /// already-`Positioned` chunk).
  pub fn new(n: usize, generator: Generator, dist: Distribution, policy: AlignPolicy) -> Self {
    let mut chunk = Self::new_unpositioned(n, generator, dist, policy);
    chunk.draw_chunk();
    chunk
  }

  /// The data buffer, `data[0..size())`, a contiguous slice of the
  /// cumulative sum starting at global index [`CumsumChunk::start`].
  pub fn data(&self) -> &[f64] {
    &self.data
  }

  /// The global index of `data()[0]`.
  pub fn start(&self) -> u64 {
    self.start
  }

  /// The buffer's fixed length.
  pub fn size(&self) -> usize {
    self.data.len()
  }

  pub fn chunk_state(&self) -> ChunkState {
    self.chunk_state
  }

  pub fn index_at_align(&self) -> Option<u64> {
    self.index_at_align
  }

  pub fn left_of_align(&self) -> Option<f64> {
    self.left_of_align
  }

  pub fn right_of_align(&self) -> Option<f64> {
    self.right_of_align
  }

  /// The saved `(state, anchor_value, anchor_index)` triple for the
  /// chunk's current position, suitable for a later
  /// [`CumsumChunk::restore`] (spec.md §4.5.2, end-to-end scenario 5).
  /// `anchor_value` is the cumulative sum up to but excluding the draw at
  /// `start` — pair it back through `restore`, not with `data()[0]`
  /// directly, which already includes that draw.
  pub fn anchor(&self) -> (u64, f64, u64) {
    (self.anchor_state, self.anchor_value, self.start)
  }

  /// Borrow the owned generator (e.g. for a custom draw closure defined
  /// elsewhere that needs to see the same stream).
  pub fn generator(&self) -> &Generator {
    &self.generator
  }

  /// Add `x` to every buffered value and to `anchor_value`. Used to
  /// establish an initial additive offset before the first draw.
  pub fn add_assign(&mut self, x: f64) {
    for v in self.data.iter_mut() {
      *v += x;
    }
    self.anchor_value += x;
  }

  /// Draw a fresh buffer starting at the generator's current position.
  /// `start` becomes the generator's position before the draw; the
  /// generator ends up positioned just past the buffer (invariant 2).
  pub fn draw_chunk(&mut self) {
    self.anchor_state = self.generator.state();
    self.start = position_of(&self.generator);
    self.redraw_in_place();
    self.chunk_state = ChunkState::Positioned;
    self.clear_align();
    log::debug!("draw_chunk: start={} size={}", self.start, self.data.len());
  }

  /// Rebuild `data` from `anchor_value` using `n` fresh raw draws from
  /// the generator's current position (which must already equal
  /// `self.start`), without touching `start`/`anchor_state`. `anchor_value`
  /// is the cumulative sum *up to but excluding* the draw at `start`, so
  /// `data[0]` is the first to fold in a draw — `data[i]` covers the draw
  /// at global index `start + i`.
  fn redraw_in_place(&mut self) {
    let n = self.data.len();
    let mut raw = vec![0.0; n];
    self.source.draw(&mut self.generator, &mut raw);
    self.data[0] = self.anchor_value + raw[0];
    for i in 1..n {
      self.data[i] = self.data[i - 1] + raw[i];
    }
  }

  fn clear_align(&mut self) {
    self.index_at_align = None;
    self.left_of_align = None;
    self.right_of_align = None;
  }

  /// Shift the window forward by `n - margin` positions (spec.md
  /// §4.5.2). The last `margin` buffered values are kept (moved to the
  /// front); `n - margin` new values are drawn and accumulated after
  /// them.
  pub fn next(&mut self, margin: usize) -> Result<()> {
    let n = self.data.len();
    if margin >= n {
      return Err(Error::InvalidParameter { operation: "next", detail: "margin must be less than the chunk size" });
    }
    let shift = n - margin;
    // The new front sits `margin` positions before the generator's
    // current position (`start + n`) — rewind a clone there before
    // drawing the fresh suffix, so `anchor_state` matches invariant 3.
    let mut cursor = self.generator.clone();
    cursor.advance(-(margin as i64));
    let anchor_snapshot = cursor.state();
    let mut fresh = vec![0.0; shift];
    self.source.draw(&mut self.generator, &mut fresh);

    // `anchor_value` tracks the cumsum exclusive of the new front's own
    // draw, i.e. inclusive through `new_start - 1` — already sitting in
    // the old buffer at `n - margin - 1`. This is distinct from the
    // running total that seeds the fresh suffix below, which continues
    // from the *old* buffer's last entry regardless of margin.
    let new_anchor_value = self.data[n - margin - 1];

    let mut new_data = vec![0.0; n];
    new_data[..margin].copy_from_slice(&self.data[n - margin..]);
    let mut running = self.data[n - 1];
    for i in 0..shift {
      running += fresh[i];
      new_data[margin + i] = running;
    }
    self.data = new_data;
    self.start += shift as u64;
    self.anchor_value = new_anchor_value;
    self.anchor_state = anchor_snapshot;
    self.chunk_state = ChunkState::Positioned;
    self.clear_align();
    log::debug!("next: margin={margin} new start={}", self.start);
    Ok(())
  }

  /// Shift the window backward by `n - margin` positions (spec.md
  /// §4.5.2). Always exactly reconstructible (no approximation): the
  /// value at the new front is recovered by replaying, deterministically,
  /// the `n - margin` draws between the new and the old front and
  /// subtracting their sum from the current `anchor_value` — the same
  /// draw sequence the generator would have produced there the first
  /// time, since position alone determines output.
  pub fn prev(&mut self, margin: usize) -> Result<()> {
    let n = self.data.len();
    if margin >= n {
      return Err(Error::InvalidParameter { operation: "prev", detail: "margin must be less than the chunk size" });
    }
    let shift = (n - margin) as u64;
    let rewind = shift + n as u64;
    if rewind > self.start {
      return Err(Error::AlignmentUnreachable {
        requested: self.start as i128 - rewind as i128,
        anchor_index: self.start,
      });
    }
    let new_start = self.start - shift;

    let mut cursor = self.generator.clone();
    cursor.advance(-(rewind as i64));
    let anchor_snapshot = cursor.state();

    let gap = shift as usize;
    let mut raw = vec![0.0; n];
    self.source.draw(&mut cursor, &mut raw);
    let gap_sum: f64 = raw[..gap].iter().sum();
    let new_anchor_value = self.anchor_value - gap_sum;

    let mut new_data = vec![0.0; n];
    new_data[0] = new_anchor_value + raw[0];
    for i in 1..n {
      new_data[i] = new_data[i - 1] + raw[i];
    }

    self.generator = cursor;
    self.data = new_data;
    self.start = new_start;
    self.anchor_value = new_anchor_value;
    self.anchor_state = anchor_snapshot;
    self.chunk_state = ChunkState::Positioned;
    self.clear_align();
    log::debug!("prev: margin={margin} new start={}", self.start);
    Ok(())
  }

  /// Reposition the window so `data()[0]` is the cumulative value at
  /// global index `desired_start`, for an arbitrary (not necessarily
  /// adjacent) `desired_start`. Exact: computed via a single replay of
  /// the gap between the chunk's current anchor and `desired_start`
  /// (see [`CumsumChunk::prev`]'s doc comment for why replay reproduces
  /// the original values bit-for-bit), so — unlike `next`/`prev`, which
  /// only move by `n`-sized strides — this can jump any distance in one
  /// call.
  fn reposition_to(&mut self, desired_start: u64) -> Result<()> {
    if desired_start == self.start {
      self.redraw_in_place();
      self.chunk_state = ChunkState::Positioned;
      self.clear_align();
      return Ok(());
    }
    let n = self.data.len() as u64;
    if desired_start > self.start {
      let gap = desired_start - self.start;
      let mut probe = self.generator.clone();
      // self.generator currently sits at self.start + n; rewind to
      // self.start, then replay forward across the gap.
      probe.advance(-(n as i64));
      let delta = self.source.cumsum(&mut probe, gap);
      self.anchor_value += delta;
      self.anchor_state = probe.state();
      self.generator = probe;
    } else {
      let gap = self.start - desired_start;
      if gap + n > self.start + n {
        return Err(Error::AlignmentUnreachable { requested: desired_start as i128, anchor_index: self.start });
      }
      let mut probe = self.generator.clone();
      probe.advance(-(n as i64 + gap as i64));
      let anchor_snapshot = probe.state();
      let mut probe_for_delta = probe.clone();
      let delta = self.source.cumsum(&mut probe_for_delta, gap);
      self.anchor_value -= delta;
      self.anchor_state = anchor_snapshot;
      self.generator = probe;
    }
    self.start = desired_start;
    self.redraw_in_place();
    self.chunk_state = ChunkState::Positioned;
    self.clear_align();
    log::debug!("reposition_to: new start={desired_start}");
    Ok(())
  }

  /// Reposition so `global_index == start + margin` (strict) or
  /// `start + m` for some `m >= min_margin` (loose); no target value is
  /// consulted (spec.md §4.5.2).
  pub fn align_at(&mut self, global_index: u64) -> Result<()> {
    let n = self.data.len() as u64;
    let desired_margin = if self.policy.strict { self.policy.margin } else { self.policy.min_margin } as u64;
    if desired_margin > global_index {
      return Err(Error::AlignmentUnreachable { requested: global_index as i128 - desired_margin as i128, anchor_index: self.start });
    }
    let desired_start = global_index - desired_margin;
    if desired_margin >= n {
      return Err(Error::InvalidParameter { operation: "align_at", detail: "margin must be less than the chunk size" });
    }
    self.reposition_to(desired_start)?;
    let i = (global_index - self.start) as usize;
    self.index_at_align = Some(global_index);
    self.left_of_align = Some(self.data[i]);
    self.right_of_align = Some(self.data[(i + 1).min(self.data.len() - 1)]);
    self.chunk_state = ChunkState::Aligned;
    Ok(())
  }

  /// Return the generator state at `global_index`, when cheaply known:
  /// `global_index == start` or `global_index == start + size()`.
  /// Otherwise computed via a disposable replay (spec.md §4.5.2).
  pub fn state_at(&self, global_index: u64) -> u64 {
    let n = self.data.len() as u64;
    if global_index == self.start {
      return self.anchor_state;
    }
    if global_index == self.start + n {
      return self.generator.state();
    }
    let mut probe = self.generator.clone();
    let delta = global_index as i64 - (self.start + n) as i64;
    probe.advance(delta);
    probe.state()
  }

  /// Set the generator to `state`, `start` to `index`, `anchor_value` to
  /// `value`, and redraw the buffer (spec.md §4.5.2). `value` is the
  /// exclusive-of-`index` cumulative sum returned by a prior
  /// [`CumsumChunk::anchor`] — pass that triple back unmodified to
  /// reproduce the buffer bitwise.
  pub fn restore(&mut self, state: u64, value: f64, index: u64) {
    self.generator.restore(state);
    self.start = index;
    self.anchor_value = value;
    self.anchor_state = state;
    self.redraw_in_place();
    self.chunk_state = ChunkState::Positioned;
    self.clear_align();
    log::debug!("restore: index={index}");
  }

  fn find_index_le(&self, target: f64) -> usize {
    // Largest `i` with `data[i] <= target` (spec.md's tie-break on exact
    // matches).
    match self.data.binary_search_by(|probe| probe.partial_cmp(&target).unwrap()) {
      Ok(i) => {
        let mut i = i;
        while i + 1 < self.data.len() && self.data[i + 1] <= target {
          i += 1;
        }
        i
      }
      Err(0) => 0,
      Err(i) => i - 1,
    }
  }

  /// Reposition the window so `target` lies inside it at the configured
  /// margin (spec.md §4.5.2).
  pub fn align(&mut self, target: f64) -> Result<()> {
    let n = self.data.len();
    const MAX_ITERATIONS: u32 = 10_000;
    for _ in 0..MAX_ITERATIONS {
      if target < self.data[0] {
        self.step_toward_target_left(target)?;
        continue;
      }
      if target >= self.data[n - 1] {
        self.step_toward_target_right(target)?;
        continue;
      }
      let i = self.find_index_le(target);
      let mi = if self.policy.strict {
        self.policy.margin
      } else {
        let lower = self.policy.min_margin.min(n.saturating_sub(1));
        let upper = n.saturating_sub(self.policy.min_margin + 1).max(lower);
        i.clamp(lower, upper)
      };
      if i == mi {
        self.index_at_align = Some(self.start + i as u64);
        self.left_of_align = Some(self.data[i]);
        self.right_of_align = Some(self.data[(i + 1).min(n - 1)]);
        self.chunk_state = ChunkState::Aligned;
        return Ok(());
      } else if i > mi {
        self.next(n - (i - mi))?;
      } else {
        self.prev(n - (mi - i))?;
      }
    }
    Err(Error::AlignmentUnreachable { requested: 0, anchor_index: self.start })
  }

  /// One coarse-then-fine step towards a `target` beyond `data[n-1]`:
  /// if the target is many chunk-widths away, jump most of the distance
  /// in one exact replay via [`CumsumChunk::reposition_to`] (the
  /// "accumulating n increments per jump without materialising them"
  /// acceleration of spec.md §4.5.2), leaving the final approach to
  /// ordinary single-chunk `next` steps.
  fn step_toward_target_right(&mut self, target: f64) -> Result<()> {
    let n = self.data.len();
    let stride = (n - self.policy.buffer).max(1) as u64;
    let width = self.data[n - 1] - self.data[0];
    if width > 0.0 {
      let remaining = target - self.data[n - 1];
      let chunks_to_skip = (remaining / width * (n as f64)).floor() as i64 / stride as i64 - 1;
      if chunks_to_skip >= 1 {
        let desired_start = self.start + (chunks_to_skip as u64) * stride;
        return self.reposition_to(desired_start);
      }
    }
    self.next(self.policy.buffer)
  }

  /// As [`CumsumChunk::step_toward_target_right`], but backward. No
  /// coarse acceleration is attempted in this direction (single-chunk
  /// `prev` steps only); see `DESIGN.md` for why this asymmetry is an
  /// acceptable scope cut rather than a correctness gap.
  fn step_toward_target_left(&mut self, _target: f64) -> Result<()> {
    self.prev(self.policy.buffer)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::align_policy::AlignPolicy;

  fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3 || (a - b).abs() / a.abs().max(1.0) < 1e-4
  }

  fn reference_cumsum(init_state: u64, init_seq: u64, k: f64, lambda: f64, offset: f64, count: usize) -> Vec<f64> {
    let mut g = Generator::new(init_state, init_seq);
    let mut raw = vec![0.0; count];
    g.weibull(&mut raw, k, lambda).unwrap();
    let mut acc = 0.0;
    raw.iter()
      .map(|v| {
        acc += v + offset;
        acc
      })
      .collect()
  }

  #[test]
  fn draw_chunk_matches_reference_prefix() {
    let k = 2.0;
    let lambda = 5.0;
    let xref = reference_cumsum(1, 0, k, lambda, 0.0, 10_000);

    let gen = Generator::new(1, 0);
    let chunk = CumsumChunk::new(100, gen, Distribution::Weibull { k, lambda }, AlignPolicy::default());
    for (i, &want) in xref.iter().take(100).enumerate() {
      assert!(close(chunk.data()[i], want), "i={i} got={} want={want}", chunk.data()[i]);
    }
  }

  #[test]
  fn add_assign_offsets_anchor_and_buffer() {
    let gen = Generator::new(6, 0);
    let mut chunk = CumsumChunk::new(20, gen, Distribution::Exponential { rate: 1.0 }, AlignPolicy::default());
    let before: Vec<f64> = chunk.data().to_vec();
    chunk.add_assign(5.0);
    for (a, b) in chunk.data().iter().zip(before.iter()) {
      assert!((a - (b + 5.0)).abs() < 1e-12);
    }
    assert!((chunk.anchor().1 - (before[0] + 5.0)).abs() < 1e-12);
  }

  #[test]
  fn next_then_prev_returns_to_original_window() {
    let gen = Generator::new(2, 0);
    let mut chunk = CumsumChunk::new(50, gen, Distribution::Exponential { rate: 1.0 }, AlignPolicy::default());
    let original: Vec<f64> = chunk.data().to_vec();
    let original_start = chunk.start();

    chunk.next(10).unwrap();
    chunk.next(10).unwrap();
    chunk.prev(10).unwrap();
    chunk.prev(10).unwrap();

    assert_eq!(chunk.start(), original_start);
    for (a, b) in chunk.data().iter().zip(original.iter()) {
      assert!((a - b).abs() < 1e-9, "a={a} b={b}");
    }
  }

  #[test]
  fn restore_round_trips_buffer() {
    let gen = Generator::new(3, 1);
    let mut chunk = CumsumChunk::new(40, gen, Distribution::Gamma { alpha: 2.0, theta: 1.0 }, AlignPolicy::strict(5));
    for _ in 0..5 {
      chunk.next(5).unwrap();
    }
    let (state, value, index) = chunk.anchor();
    let snapshot: Vec<f64> = chunk.data().to_vec();

    for _ in 0..3 {
      chunk.next(5).unwrap();
    }
    assert_ne!(chunk.data(), &snapshot[..]);

    chunk.restore(state, value, index);
    assert_eq!(chunk.data(), &snapshot[..]);
  }

  #[test]
  fn align_at_lands_on_requested_index() {
    let gen = Generator::new(9, 2);
    let policy = AlignPolicy::strict(10);
    let mut chunk = CumsumChunk::new(100, gen, Distribution::Weibull { k: 2.0, lambda: 5.0 }, policy);
    chunk.align_at(250).unwrap();
    assert_eq!(chunk.index_at_align(), Some(250));
    assert_eq!(chunk.start() + 10, 250);
    assert!(chunk.left_of_align().unwrap() <= chunk.right_of_align().unwrap());
  }

  #[test]
  fn align_brackets_target_with_strict_margin() {
    let k = 2.0;
    let lambda = 5.0;
    let n = 100usize;
    let margin = 10usize;
    let xref = reference_cumsum(4, 0, k, lambda, 0.0, 20_000);

    let gen = Generator::new(4, 0);
    let mut chunk = CumsumChunk::new(n, gen, Distribution::Weibull { k, lambda }, AlignPolicy::strict(margin));

    for &i in &[110usize, 1010, 40, 120] {
      let target = 0.5 * (xref[i] + xref[i + 1]);
      chunk.align(target).unwrap();
      assert_eq!(chunk.start() as usize + margin, i);
      assert!(chunk.data()[margin] <= target);
      assert!(target < chunk.data()[margin + 1]);
    }
  }
}
