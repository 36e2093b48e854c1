mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use cli::Cli;
use config::Config;
use sonoscope::audio::utils::downmix;
use sonoscope::generate::client::{HttpImageGenerator, ImageGenerator};
use sonoscope::generate::prompt::build_prompt;
use sonoscope::render::waveform::render_waveform;
use sonoscope::{analyze_pcm, render_spectrogram, AudioDecoder, FeatureSet, SymphoniaDecoder};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(config::discover);
    let mut cfg = Config::default();
    if let Some(ref path) = config_path {
        if let Some(loaded) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            cfg = loaded;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    apply_overrides(&cli, &mut cfg);

    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    cfg.analysis.validate().context("Invalid analysis settings")?;

    log::info!("sonoscope - audio feature extraction");
    log::info!("Input: {}", cli.input.display());

    let stages = 2
        + cli.features_json.is_some() as u64
        + cli.spectrogram.is_some() as u64
        + cli.waveform.is_some() as u64;
    let pb = ProgressBar::new(stages);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    // 1. Decode
    pb.set_message("decoding");
    let pcm = SymphoniaDecoder
        .decode_file(&cli.input)
        .with_context(|| format!("Failed to decode {}", cli.input.display()))?;
    log::info!(
        "Decoded {} channel(s), {:.2}s @ {}Hz",
        pcm.channel_count(),
        pcm.duration(),
        pcm.sample_rate()
    );
    let waveform_signal = match cli.waveform {
        Some(_) => Some(downmix(pcm.channels())?),
        None => None,
    };
    pb.inc(1);

    // 2. Analyze
    pb.set_message("analyzing");
    let features = analyze_pcm(pcm, &cfg.analysis).context("Analysis failed")?;
    pb.inc(1);

    // 3. Exports
    if let Some(ref path) = cli.features_json {
        pb.set_message("writing features");
        write_features(&features, path)?;
        pb.inc(1);
    }

    if let Some(ref path) = cli.spectrogram {
        pb.set_message("rendering spectrogram");
        let options = cfg.render.options();
        // "fit" gives one column per analysis frame
        let container = Some(features.frame_count().max(1) as u32);
        let frame = render_spectrogram(&features.spectrogram, &options, container)
            .context("Spectrogram rendering failed")?;
        frame
            .save_png(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Spectrogram {}x{} -> {}", frame.width, frame.height, path.display());
        pb.inc(1);
    }

    if let (Some(path), Some(signal)) = (&cli.waveform, waveform_signal) {
        pb.set_message("rendering waveform");
        let options = cfg.render.options();
        let container = Some(features.frame_count().max(1) as u32);
        let (width, height) = options.resolve_size(container)?;
        let frame = render_waveform(&signal, width, height).context("Waveform rendering failed")?;
        frame
            .save_png(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Waveform {}x{} -> {}", width, height, path.display());
        pb.inc(1);
    }

    pb.finish_with_message("done");

    println!("{}", features.summary());

    if cli.prompt || cli.generate {
        let prompt = build_prompt(&features);
        if cli.prompt {
            println!("\n{}", prompt);
        }
        if cli.generate {
            generate_images(&cfg, &prompt)?;
        }
    }

    Ok(())
}

fn apply_overrides(cli: &Cli, cfg: &mut Config) {
    let analysis = &mut cfg.analysis;
    if let Some(rate) = cli.sample_rate { analysis.target_sample_rate = rate; }
    if let Some(fft) = cli.fft_size { analysis.fft_size = fft; }
    if cli.hop_size.is_some() { analysis.hop_size = cli.hop_size; }
    if let Some(bpm) = cli.min_bpm { analysis.min_bpm = bpm; }
    if let Some(bpm) = cli.max_bpm { analysis.max_bpm = bpm; }

    let render = &mut cfg.render;
    if let Some(width) = cli.width {
        render.width = width.into();
    }
    if let Some(h) = cli.height { render.height = h; }
    if let Some(dpr) = cli.dpr { render.dpr = dpr; }
    if let Some(db) = cli.db_min { render.db_min = db; }
    if let Some(db) = cli.db_max { render.db_max = db; }

    if let Some(count) = cli.count { cfg.generator.count = count; }
}

fn write_features(features: &FeatureSet, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer(std::io::BufWriter::new(file), features)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Features -> {}", path.display());
    Ok(())
}

fn generate_images(cfg: &Config, prompt: &str) -> Result<()> {
    let generator = HttpImageGenerator::from_env(cfg.generator.endpoint.clone())
        .context("Set [generator] endpoint in the config file")?
        .with_timeout(Duration::from_secs(cfg.generator.timeout_secs));

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("waiting for image service");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let result = generator.generate(prompt, cfg.generator.count);
    spinner.finish_and_clear();

    let images = result.context("Image generation failed")?;
    println!();
    for url in &images.image_urls {
        println!("{}", url);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let cli = Cli::try_parse_from([
            "sonoscope",
            "in.wav",
            "--fft-size",
            "2048",
            "--width",
            "800",
            "--db-max",
            "-10",
            "--count",
            "3",
        ])
        .unwrap();
        let mut cfg = Config::default();
        cfg.analysis.max_bpm = 180.0;
        apply_overrides(&cli, &mut cfg);

        assert_eq!(cfg.analysis.fft_size, 2048);
        assert_eq!(cfg.analysis.max_bpm, 180.0);
        assert_eq!(cfg.analysis.hop_size(), 512);
        let options = cfg.render.options();
        assert_eq!(options.width, sonoscope::WidthMode::Fixed(800));
        assert_eq!(options.db_range, (-80.0, -10.0));
        assert_eq!(cfg.generator.count, 3);
    }
}
