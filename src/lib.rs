//! Offline audio feature extraction.
//!
//! A decoded PCM buffer is resampled to a fixed analysis rate, downmixed to
//! mono and run through a windowed STFT. The magnitude grid feeds the
//! spectral descriptors (RMS, centroid, rolloff, flux, band balance) and an
//! autocorrelation tempo estimate, all collected into one [`FeatureSet`].
//! The grid can then be rendered as a spectrogram image, and the features
//! summarized into a prompt for an image-generation service.
//!
//! ```text
//! bytes -> decode -> resample -> downmix -> STFT -> descriptors + tempo -> FeatureSet
//!                                                                           |-> render
//!                                                                           '-> prompt
//! ```

pub mod audio;
pub mod error;
pub mod generate;
pub mod render;

pub use audio::analysis::{analyze_pcm, analyze_signal, AnalysisConfig};
pub use audio::decode::{AudioDecoder, DecodeError, SymphoniaDecoder};
pub use audio::features::{BandEnergy, FeatureSet, Spectrogram};
pub use audio::pcm::PcmBuffer;
pub use error::AnalysisError;
pub use render::spectrogram::{render_spectrogram, RenderOptions, WidthMode};
