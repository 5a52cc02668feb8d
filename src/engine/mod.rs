//! Audio Engine Module
//!
//! Everything between encoded bytes and the canonical signal:
//! - Signal type and level measurements
//! - Decoding and resampling
//! - Normalization (size/duration ceilings, silence trimming)

pub mod buffer;
pub mod io;
pub mod normalize;

pub use buffer::{calculate_peak, calculate_rms, linear_to_db, NormalizedSignal};
pub use io::{decode_audio, AudioFormat, DecodedAudio};
pub use normalize::Normalizer;
