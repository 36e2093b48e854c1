use clap::Parser;
use std::path::PathBuf;

use sonoscope::WidthMode;

#[derive(Parser, Debug)]
#[command(name = "sonoscope", about = "Audio feature extraction and spectrogram rendering")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG, AAC)
    pub input: PathBuf,

    /// Config file (defaults to ./sonoscope.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the full feature set as JSON
    #[arg(long)]
    pub features_json: Option<PathBuf>,

    /// Write the spectrogram as PNG
    #[arg(short, long)]
    pub spectrogram: Option<PathBuf>,

    /// Write the mono waveform as PNG
    #[arg(long)]
    pub waveform: Option<PathBuf>,

    /// Image width in pixels, or "fit" for one column per analysis frame
    #[arg(long, value_parser = parse_width)]
    pub width: Option<WidthMode>,

    /// Image height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Device pixel ratio (1.0-3.0)
    #[arg(long)]
    pub dpr: Option<f32>,

    /// Bottom of the displayed dB range
    #[arg(long, allow_hyphen_values = true)]
    pub db_min: Option<f32>,

    /// Top of the displayed dB range
    #[arg(long, allow_hyphen_values = true)]
    pub db_max: Option<f32>,

    /// Analysis sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// FFT size (power of two)
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Hop size in samples (defaults to fft-size / 4)
    #[arg(long)]
    pub hop_size: Option<usize>,

    /// Lower bound of the tempo search
    #[arg(long)]
    pub min_bpm: Option<f32>,

    /// Upper bound of the tempo search
    #[arg(long)]
    pub max_bpm: Option<f32>,

    /// Print the image-generation prompt
    #[arg(long)]
    pub prompt: bool,

    /// Send the prompt to the configured image service
    #[arg(long)]
    pub generate: bool,

    /// Number of images to request (1-3)
    #[arg(long)]
    pub count: Option<u32>,
}

fn parse_width(s: &str) -> Result<WidthMode, String> {
    if s.eq_ignore_ascii_case("fit") {
        return Ok(WidthMode::FitToContainer);
    }
    s.parse::<u32>()
        .map(WidthMode::Fixed)
        .map_err(|_| format!("expected a pixel count or \"fit\", got {:?}", s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_width_modes() {
        assert_eq!(parse_width("fit").unwrap(), WidthMode::FitToContainer);
        assert_eq!(parse_width("1200").unwrap(), WidthMode::Fixed(1200));
        assert!(parse_width("wide").is_err());
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::try_parse_from([
            "sonoscope",
            "song.wav",
            "--spectrogram",
            "out.png",
            "--width",
            "fit",
            "--db-min",
            "-60",
            "--generate",
        ])
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("song.wav"));
        assert_eq!(cli.width, Some(WidthMode::FitToContainer));
        assert_eq!(cli.db_min, Some(-60.0));
        assert!(cli.generate);
        assert!(!cli.prompt);
    }
}
