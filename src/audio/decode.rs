use std::io::Cursor;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use super::pcm::PcmBuffer;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read audio: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported audio format: {0}")]
    Unsupported(String),

    #[error("no decodable audio track found")]
    NoAudioTrack,

    #[error("audio track does not declare a sample rate")]
    UnknownSampleRate,

    #[error("corrupt audio stream: {0}")]
    Corrupt(String),
}

impl From<SymphoniaError> for DecodeError {
    fn from(err: SymphoniaError) -> Self {
        match err {
            SymphoniaError::IoError(e) => DecodeError::Io(e),
            SymphoniaError::Unsupported(what) => DecodeError::Unsupported(what.to_string()),
            other => DecodeError::Corrupt(other.to_string()),
        }
    }
}

/// Turns an encoded byte stream into planar PCM.
pub trait AudioDecoder {
    /// `extension` is a container hint such as `"wav"` or `"mp3"`.
    fn decode(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer, DecodeError>;

    fn decode_file(&self, path: &Path) -> Result<PcmBuffer, DecodeError> {
        let bytes = std::fs::read(path)?;
        let ext = path.extension().and_then(|e| e.to_str());
        self.decode(bytes, ext)
    }
}

/// Decoder backed by symphonia's default codec registry.
#[derive(Clone, Copy, Debug, Default)]
pub struct SymphoniaDecoder;

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: Vec<u8>, extension: Option<&str>) -> Result<PcmBuffer, DecodeError> {
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(DecodeError::NoAudioTrack)?;

        let track_id = track.id;
        let channel_count = track.codec_params.channels.map_or(1, |c| c.count());
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or(DecodeError::UnknownSampleRate)?;

        let mut decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut channels: Vec<Vec<f32>> = vec![Vec::new(); channel_count];
        let mut skipped = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(_)) => {
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            let stride = spec.channels.count();
            if stride != channel_count {
                return Err(DecodeError::Corrupt(format!(
                    "channel count changed mid-stream ({} -> {})",
                    channel_count, stride
                )));
            }
            for frame in sample_buf.samples().chunks_exact(stride) {
                for (channel, &sample) in channels.iter_mut().zip(frame) {
                    channel.push(sample);
                }
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} undecodable packets", skipped);
        }

        let pcm = PcmBuffer::new(sample_rate, channels)
            .map_err(|e| DecodeError::Corrupt(e.to_string()))?;

        log::info!(
            "Decoded audio: {} samples x {} ch, {}Hz, {:.2}s",
            pcm.len(),
            pcm.channel_count(),
            sample_rate,
            pcm.duration()
        );

        Ok(pcm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(sample_rate: u32, frames: &[[i16; 2]]) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut bytes = Vec::new();
        {
            let mut writer = hound::WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
            for frame in frames {
                writer.write_sample(frame[0]).unwrap();
                writer.write_sample(frame[1]).unwrap();
            }
            writer.finalize().unwrap();
        }
        bytes
    }

    #[test]
    fn decodes_stereo_wav_planar() {
        let frames: Vec<[i16; 2]> = (0..1000).map(|_| [16384, -16384]).collect();
        let pcm = SymphoniaDecoder
            .decode(wav_bytes(8000, &frames), Some("wav"))
            .unwrap();

        assert_eq!(pcm.sample_rate(), 8000);
        assert_eq!(pcm.channel_count(), 2);
        assert_eq!(pcm.len(), 1000);
        assert!((pcm.channels()[0][10] - 0.5).abs() < 1e-3);
        assert!((pcm.channels()[1][10] + 0.5).abs() < 1e-3);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = SymphoniaDecoder.decode(vec![0x13; 512], None);
        assert!(result.is_err());
    }
}
