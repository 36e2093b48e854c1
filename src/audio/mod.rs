pub mod analysis;
pub mod decode;
pub mod descriptors;
pub mod features;
pub mod pcm;
pub mod resample;
pub mod stft;
pub mod tempo;
pub mod utils;
