//! End-to-end scenarios straight off the invariants this crate is
//! built to satisfy: historic reproducibility, restore/advance
//! equivalence, row-major flattening, chunk alignment, chunk restore,
//! and array independence.

use reprng::{AlignPolicy, ChunkArray, Distribution, Generator, GeneratorArray};

#[test]
fn historic_uniform_vector() {
  let mut g = Generator::default();
  let mut out = [0.0; 100];
  g.random(&mut out);
  let expected = [
    0.108379, 0.90696, 0.406692, 0.875239, 0.694849, 0.7435, 0.167443, 0.621512, 0.221678, 0.895998,
  ];
  for (got, want) in out.iter().zip(expected.iter()) {
    assert!((got - want).abs() < 1e-3, "got={got} want={want}");
  }
}

#[test]
fn advance_matches_draw() {
  let mut g = Generator::new(0, 0);
  let mut warmup = [0.0; 123];
  g.random(&mut warmup);
  let state = g.state();

  let mut a = [0.0; 100];
  g.random(&mut a);

  g.restore(state);
  let mut b = [0.0; 100];
  g.random(&mut b);

  assert_eq!(a, b);
}

#[test]
fn row_major_equivalence() {
  let mut g = Generator::new(0, 0);
  let mut warmup = [0.0; 123];
  g.random(&mut warmup);
  let state = g.state();

  // A single flat draw of length 100*5*11, read as row-major [100, 5, 11].
  let (d0, d1, d2) = (100usize, 5usize, 11usize);
  let mut a = vec![0.0; d0 * d1 * d2];
  g.random(&mut a);

  g.restore(state);
  g.advance((99 * d1 * d2) as i64);
  let mut b = vec![0.0; d1 * d2];
  g.random(&mut b);

  let slice_99 = &a[99 * d1 * d2..100 * d1 * d2];
  assert_eq!(slice_99, &b[..]);
}

#[test]
fn chunk_alignment_brackets_weibull_targets() {
  let k = 2.0;
  let lambda = 5.0;
  let offset = 0.1;
  let n = 100usize;
  let margin = 10usize;

  let mut reference = Generator::new(0, 0);
  let mut raw = vec![0.0; 10_000];
  reference.weibull(&mut raw, k, lambda).unwrap();
  let mut acc = 0.0;
  let xref: Vec<f64> = raw
    .iter()
    .map(|v| {
      acc += v + offset;
      acc
    })
    .collect();

  // The built-in Weibull distribution has no additive-offset parameter,
  // so compare against a zero-offset chunk and fold `offset * position`
  // into the expected target instead, matching how `xref` was built.
  let gen = Generator::new(0, 0);
  let mut chunk = reprng::CumsumChunk::new(n, gen, Distribution::Weibull { k, lambda }, AlignPolicy::strict(margin));

  for &i in &[110usize, 1010, 40, 120] {
    let target_raw = {
      // xref is built from (raw + offset) cumulatively; recover the
      // matching zero-offset target for the chunk under test.
      0.5 * ((xref[i] - offset * (i as f64 + 1.0)) + (xref[i + 1] - offset * (i as f64 + 2.0)))
    };
    chunk.align(target_raw).unwrap();
    assert_eq!(chunk.start() as usize + margin, i);
    assert!(chunk.data()[margin] <= target_raw);
    assert!(target_raw < chunk.data()[margin + 1]);
  }
}

#[test]
fn chunk_restore_round_trip() {
  let gen = Generator::new(1, 1);
  let mut chunk = reprng::CumsumChunk::new(60, gen, Distribution::Exponential { rate: 1.0 }, AlignPolicy::strict(10));
  for _ in 0..4 {
    chunk.next(10).unwrap();
  }
  let (state, value, index) = chunk.anchor();
  let snapshot: Vec<f64> = chunk.data().to_vec();

  for _ in 0..6 {
    chunk.next(10).unwrap();
  }

  chunk.restore(state, value, index);
  assert_eq!(chunk.data(), &snapshot[..]);
}

#[test]
fn array_cells_are_independent_and_reproducible() {
  let init_state: Vec<u64> = (0..10).collect();
  let init_seq = vec![0u64; 10];
  let mut arr = GeneratorArray::new(vec![2, 5], &init_state, &init_seq);

  let states_before = arr.state();
  let first = arr.random(&[4, 5]);

  for i in 0..10 {
    for j in (i + 1)..10 {
      let a = &first[i * 20..(i + 1) * 20];
      let b = &first[j * 20..(j + 1) * 20];
      assert_ne!(a, b, "cells {i} and {j} should not draw identical sequences");
    }
  }

  arr.restore(&states_before);
  let second = arr.random(&[4, 5]);
  assert_eq!(first, second);
}

#[test]
fn chunk_array_aligns_each_cell_independently() {
  let init_state = [3u64, 4];
  let init_seq = [0u64, 0];
  let mut arr = ChunkArray::new(30, vec![2], &init_state, &init_seq, Distribution::Normal { mu: 0.0, sigma: 1.0 }, AlignPolicy::strict(3));

  let targets = [arr.get(&[0]).data()[15], arr.get(&[1]).data()[15]];
  arr.align(&targets).unwrap();
  assert_eq!(arr.get(&[0]).index_at_align(), Some(arr.get(&[0]).start() + 3));
  assert_eq!(arr.get(&[1]).index_at_align(), Some(arr.get(&[1]).start() + 3));
}
