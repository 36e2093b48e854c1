pub mod colormap;
pub mod frame;
pub mod spectrogram;
pub mod waveform;
