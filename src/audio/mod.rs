//! G.711 mu-law codec and mono PCM resampling
//!
//! Wire-level helpers for the telephony audio path: 16-bit little-endian
//! PCM fragments to and from ITU-T G.711 mu-law bytes, plus a linear
//! interpolation rate converter. Mono only; that is all the media stream
//! carries.

use thiserror::Error;

/// Mu-law encoding bias (ITU-T G.711)
const BIAS: i32 = 0x84;
/// Clip level before bias is applied
const CLIP: i32 = 32635;

/// Audio conversion error
#[derive(Debug, Error, PartialEq)]
pub enum AudioError {
    #[error("PCM fragment length must be even (16-bit samples)")]
    OddFragment,
    #[error("Sample rates must be positive")]
    InvalidRate,
}

/// Convert a single 16-bit PCM sample to an 8-bit mu-law code.
fn linear_to_ulaw(sample: i16) -> u8 {
    let mut magnitude = i32::from(sample);
    let sign = if magnitude < 0 {
        magnitude = -magnitude;
        if magnitude > 32767 {
            magnitude = 32767;
        }
        0x80
    } else {
        0x00
    };

    if magnitude > CLIP {
        magnitude = CLIP;
    }
    magnitude += BIAS;

    // Segment boundaries double from 0x100 up to 0x4000
    let segment = match magnitude {
        m if m < 0x100 => 0,
        m if m < 0x200 => 1,
        m if m < 0x400 => 2,
        m if m < 0x800 => 3,
        m if m < 0x1000 => 4,
        m if m < 0x2000 => 5,
        m if m < 0x4000 => 6,
        _ => 7,
    };

    let mantissa = (magnitude >> (segment + 3)) & 0x0F;
    !(sign | (segment << 4) | mantissa) as u8
}

/// Convert a single mu-law code back to a 16-bit PCM sample.
fn ulaw_to_linear(ulaw: u8) -> i16 {
    let code = !ulaw as i32 & 0xFF;
    let sign = code & 0x80;
    let segment = (code >> 4) & 0x07;
    let mantissa = code & 0x0F;

    let mut sample = ((mantissa | 0x10) << (segment + 3)) - BIAS;
    if sign != 0 {
        sample = -sample;
    }
    sample.clamp(-32768, 32767) as i16
}

/// PCM16 (little-endian, mono) -> G.711 mu-law bytes
pub fn lin2ulaw(fragment: &[u8]) -> Result<Vec<u8>, AudioError> {
    if fragment.len() % 2 != 0 {
        return Err(AudioError::OddFragment);
    }

    let mut out = Vec::with_capacity(fragment.len() / 2);
    for pair in fragment.chunks_exact(2) {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        out.push(linear_to_ulaw(sample));
    }
    Ok(out)
}

/// G.711 mu-law bytes -> PCM16 (little-endian, mono)
pub fn ulaw2lin(fragment: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(fragment.len() * 2);
    for &code in fragment {
        out.extend_from_slice(&ulaw_to_linear(code).to_le_bytes());
    }
    out
}

/// Resample mono PCM16 with linear interpolation.
///
/// Adequate for 8 kHz <-> 24 kHz voice bandwidth. Identical rates return
/// the input unchanged.
pub fn resample(fragment: &[u8], in_rate: u32, out_rate: u32) -> Result<Vec<u8>, AudioError> {
    if fragment.len() % 2 != 0 {
        return Err(AudioError::OddFragment);
    }
    if in_rate == 0 || out_rate == 0 {
        return Err(AudioError::InvalidRate);
    }
    if in_rate == out_rate {
        return Ok(fragment.to_vec());
    }

    let src: Vec<i16> = fragment
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let n = src.len();

    if n == 0 {
        return Ok(Vec::new());
    }

    let ratio = f64::from(out_rate) / f64::from(in_rate);
    let out_len = ((n as f64) * ratio).round() as usize;

    if n == 1 {
        let mut out = Vec::with_capacity(out_len * 2);
        for _ in 0..out_len {
            out.extend_from_slice(&src[0].to_le_bytes());
        }
        return Ok(out);
    }

    let mut out = Vec::with_capacity(out_len * 2);
    for j in 0..out_len {
        let pos = j as f64 / ratio;
        let i0 = pos as usize;
        let sample = if i0 >= n - 1 {
            src[n - 1]
        } else {
            let frac = pos - i0 as f64;
            let interpolated =
                f64::from(src[i0]) * (1.0 - frac) + f64::from(src[i0 + 1]) * frac;
            interpolated.round() as i16
        };
        out.extend_from_slice(&sample.to_le_bytes());
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn test_known_codes() {
        // Silence encodes to 0xFF; full negative scale to 0x00.
        assert_eq!(linear_to_ulaw(0), 0xFF);
        assert_eq!(linear_to_ulaw(-32768), 0x00);

        // 0xFF and 0x7F decode to the smallest quantized magnitudes.
        assert_eq!(ulaw_to_linear(0xFF), -4);
        assert_eq!(ulaw_to_linear(0x7F), 4);
    }

    #[test]
    fn test_round_trip_within_quantization_step() {
        for &sample in &[0i16, 100, -100, 1000, -1000, 8000, -8000, 30000, -30000] {
            let code = linear_to_ulaw(sample);
            let decoded = i32::from(ulaw_to_linear(code));
            let err = (decoded - i32::from(sample)).abs();
            // Step size grows with magnitude; 1/8 of the value plus the
            // bias bounds every segment.
            let tolerance = i32::from(sample).abs() / 8 + BIAS;
            assert!(
                err <= tolerance,
                "sample {sample}: decoded {decoded}, err {err} > {tolerance}"
            );
        }
    }

    #[test]
    fn test_lin2ulaw_rejects_odd_fragment() {
        assert_eq!(lin2ulaw(&[0x00]), Err(AudioError::OddFragment));
    }

    #[test]
    fn test_fragment_round_trip_lengths() {
        let input = pcm(&[0, 1000, -1000, 30000]);
        let encoded = lin2ulaw(&input).expect("encode");
        assert_eq!(encoded.len(), 4);
        let decoded = ulaw2lin(&encoded);
        assert_eq!(decoded.len(), input.len());
    }

    #[test]
    fn test_resample_identity() {
        let input = pcm(&[1, 2, 3, 4]);
        assert_eq!(resample(&input, 8000, 8000).expect("identity"), input);
    }

    #[test]
    fn test_resample_doubles_length() {
        let input = pcm(&[0, 1000, 2000, 3000]);
        let out = resample(&input, 8000, 16000).expect("upsample");
        assert_eq!(out.len(), input.len() * 2);
    }

    #[test]
    fn test_resample_single_sample_repeats() {
        let input = pcm(&[1234]);
        let out = resample(&input, 8000, 24000).expect("upsample");
        assert_eq!(out, pcm(&[1234, 1234, 1234]));
    }

    #[test]
    fn test_resample_empty_and_errors() {
        assert_eq!(resample(&[], 8000, 16000).expect("empty"), Vec::<u8>::new());
        assert_eq!(resample(&pcm(&[1]), 0, 8000), Err(AudioError::InvalidRate));
        assert_eq!(resample(&[0x01], 8000, 16000), Err(AudioError::OddFragment));
    }
}
