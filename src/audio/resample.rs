use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::pcm::PcmBuffer;
use crate::error::{AnalysisError, Result};

const CHUNK_SIZE: usize = 1024;

/// Number of output samples for `len` input samples: `ceil(len * to / from)`.
pub fn output_len(len: usize, from_rate: u32, to_rate: u32) -> usize {
    let num = len as u64 * to_rate as u64;
    num.div_ceil(from_rate as u64) as usize
}

/// Convert `pcm` to `target_rate`, channel by channel.
///
/// The output holds exactly `ceil(duration * target_rate)` samples per
/// channel. A buffer already at the target rate is returned as-is.
pub fn resample(pcm: PcmBuffer, target_rate: u32) -> Result<PcmBuffer> {
    if target_rate == 0 {
        return Err(AnalysisError::invalid("target sample rate must be positive"));
    }
    let source_rate = pcm.sample_rate();
    if source_rate == target_rate {
        return Ok(pcm);
    }

    let target_len = output_len(pcm.len(), source_rate, target_rate);
    let channel_count = pcm.channel_count();
    log::info!(
        "Resampling {} ch: {}Hz -> {}Hz ({} -> {} samples)",
        channel_count,
        source_rate,
        target_rate,
        pcm.len(),
        target_len
    );

    if pcm.is_empty() {
        return PcmBuffer::new(target_rate, vec![Vec::new(); channel_count]);
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = target_rate as f64 / source_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, CHUNK_SIZE, channel_count)
        .map_err(|e| AnalysisError::Resample(e.to_string()))?;

    let delay = resampler.output_delay();
    let wanted = target_len + delay;
    let input = pcm.channels();
    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(wanted); channel_count];

    let mut pos = 0;
    while pos + CHUNK_SIZE <= pcm.len() {
        let block: Vec<&[f32]> = input.iter().map(|c| &c[pos..pos + CHUNK_SIZE]).collect();
        let chunk = resampler
            .process(&block, None)
            .map_err(|e| AnalysisError::Resample(e.to_string()))?;
        append(chunk, &mut output);
        pos += CHUNK_SIZE;
    }
    if pos < pcm.len() {
        let tail: Vec<&[f32]> = input.iter().map(|c| &c[pos..]).collect();
        let chunk = resampler
            .process_partial(Some(tail.as_slice()), None)
            .map_err(|e| AnalysisError::Resample(e.to_string()))?;
        append(chunk, &mut output);
    }

    // Flush the filter delay line with silence until the tail is out.
    while output[0].len() < wanted {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| AnalysisError::Resample(e.to_string()))?;
        if append(chunk, &mut output) == 0 {
            break;
        }
    }

    for channel in &mut output {
        channel.drain(..delay.min(channel.len()));
        channel.resize(target_len, 0.0);
    }

    PcmBuffer::new(target_rate, output)
}

/// Append a resampler block to the per-channel output, returning frames added.
fn append(chunk: Vec<Vec<f32>>, output: &mut [Vec<f32>]) -> usize {
    let produced = chunk.first().map_or(0, Vec::len);
    for (dst, src) in output.iter_mut().zip(chunk) {
        dst.extend_from_slice(&src);
    }
    produced
}
