//! Portable, reconstructible pseudo-random sequences: a PCG32-backed
//! [`Generator`] with O(log n) jump-ahead and distance recovery,
//! inverse-CDF [`distributions`], a cumulative-sum sliding window
//! ([`chunk::CumsumChunk`]), and a shape-preserving [`array`] facade over
//! either.
//!
//! NOT FOR CRYPTOGRAPHIC PURPOSES.

pub mod align_policy;
pub mod array;
pub mod bit_engine;
pub mod chunk;
pub mod distributions;
pub mod error;
pub mod generator;
pub mod quadrature;

pub use align_policy::AlignPolicy;
pub use array::{ChunkArray, GeneratorArray};
pub use bit_engine::BitEngine;
pub use chunk::{ChunkState, CumsumChunk, DrawSource};
pub use distributions::Distribution;
pub use error::{Error, Result};
pub use generator::Generator;
