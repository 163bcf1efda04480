//! rANS 4×8 block decompression (order-0 and order-1), CRAM's primary
//! entropy codec for CORE and EXTERNAL block payloads.
//!
//! The compressed stream is `order(u8), compSize(u32LE), uncompSize(u32LE)`
//! followed by one (order 0) or 256 (order 1, one per preceding-symbol
//! context) frequency tables, four interleaved 32-bit rANS states, and the
//! coded body. Frequencies normalize to 4096; each table's entry list
//! terminates once its frequencies sum to 4096 rather than on a sentinel
//! byte, since byte value 0 is itself a legal symbol. The coded body is
//! split into four contiguous quarters, each decoded by one of the four
//! states.

use gview_core::error::{Error, Result};

const TOTAL_FREQ: u32 = 4096;
const RENORM_LOWER_BOUND: u32 = 1 << 23;

struct FreqTable {
    freq: [u32; 256],
    cum_freq: [u32; 256],
    lookup: Vec<u8>,
}

impl FreqTable {
    fn read(cursor: &mut Cursor) -> Result<Self> {
        let mut freq = [0u32; 256];
        let mut total = 0u32;

        while total < TOTAL_FREQ {
            let sym = cursor.read_u8()? as usize;
            let b0 = cursor.read_u8()?;
            let f = if b0 & 0x80 != 0 {
                let b1 = cursor.read_u8()?;
                (u32::from(b0 & 0x7f) << 8) | u32::from(b1)
            } else {
                u32::from(b0)
            };
            let run_len = cursor.read_u8()? as usize;

            for k in 0..=run_len {
                let s = sym + k;
                if s > 255 {
                    return Err(Error::DecompressionFailure {
                        reason: "rANS frequency table run overruns symbol alphabet".to_string(),
                    });
                }
                freq[s] = f;
                total += f;
                if total > TOTAL_FREQ {
                    return Err(Error::DecompressionFailure {
                        reason: "rANS frequency table exceeds normalized total".to_string(),
                    });
                }
            }
        }

        let mut cum_freq = [0u32; 256];
        let mut lookup = vec![0u8; TOTAL_FREQ as usize];
        let mut acc = 0u32;
        for sym in 0..256 {
            cum_freq[sym] = acc;
            for slot in acc..acc + freq[sym] {
                lookup[slot as usize] = sym as u8;
            }
            acc += freq[sym];
        }

        Ok(Self {
            freq,
            cum_freq,
            lookup,
        })
    }

    fn decode_step(&self, state: &mut u32) -> u8 {
        let f = *state & (TOTAL_FREQ - 1);
        let sym = self.lookup[f as usize];
        *state = self.freq[sym as usize] * (*state >> 12) + f - self.cum_freq[sym as usize];
        sym
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self.data.get(self.pos).ok_or(Error::UnexpectedEof)?;
        self.pos += 1;
        Ok(b)
    }

    fn try_read_u8(&mut self) -> Option<u8> {
        let b = self.data.get(self.pos).copied()?;
        self.pos += 1;
        Some(b)
    }

    fn read_u32_le(&mut self) -> Result<u32> {
        let mut value = 0u32;
        for i in 0..4 {
            value |= u32::from(self.read_u8()?) << (8 * i);
        }
        Ok(value)
    }
}

fn quarter_lengths(total: usize) -> [usize; 4] {
    let quarter = total / 4;
    [quarter, quarter, quarter, total - quarter * 3]
}

fn renormalize(cursor: &mut Cursor, state: &mut u32) -> bool {
    while *state < RENORM_LOWER_BOUND {
        match cursor.try_read_u8() {
            Some(b) => *state = (*state << 8) | u32::from(b),
            None => return false,
        }
    }
    true
}

/// Decompresses a rANS 4×8 block payload, stopping early and returning a
/// truncated buffer if the coded stream underruns mid-decode.
pub fn decode(compressed: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(compressed);
    let order = cursor.read_u8()?;
    let _compressed_size = cursor.read_u32_le()?;
    let uncompressed_size = cursor.read_u32_le()? as usize;

    match order {
        0 => decode_order0(&mut cursor, uncompressed_size),
        1 => decode_order1(&mut cursor, uncompressed_size),
        other => Err(Error::DecompressionFailure {
            reason: format!("unsupported rANS order {other}"),
        }),
    }
}

fn decode_order0(cursor: &mut Cursor, uncompressed_size: usize) -> Result<Vec<u8>> {
    let table = FreqTable::read(cursor)?;
    let mut states = [0u32; 4];
    for state in states.iter_mut() {
        *state = cursor.read_u32_le()?;
    }

    let mut out = vec![0u8; uncompressed_size];
    let mut offset = 0;
    for (i, qlen) in quarter_lengths(uncompressed_size).into_iter().enumerate() {
        for j in 0..qlen {
            let sym = table.decode_step(&mut states[i]);
            out[offset + j] = sym;
            if !renormalize(cursor, &mut states[i]) {
                out.truncate(offset + j + 1);
                return Ok(out);
            }
        }
        offset += qlen;
    }
    Ok(out)
}

fn decode_order1(cursor: &mut Cursor, uncompressed_size: usize) -> Result<Vec<u8>> {
    let mut tables = Vec::with_capacity(256);
    for _ in 0..256 {
        tables.push(FreqTable::read(cursor)?);
    }
    let mut states = [0u32; 4];
    for state in states.iter_mut() {
        *state = cursor.read_u32_le()?;
    }

    let mut out = vec![0u8; uncompressed_size];
    let mut offset = 0;
    for (i, qlen) in quarter_lengths(uncompressed_size).into_iter().enumerate() {
        let mut last_sym: usize = 0;
        for j in 0..qlen {
            let sym = tables[last_sym].decode_step(&mut states[i]);
            out[offset + j] = sym;
            if !renormalize(cursor, &mut states[i]) {
                out.truncate(offset + j + 1);
                return Ok(out);
            }
            last_sym = sym as usize;
        }
        offset += qlen;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A minimal order-0 encoder, used only to produce fixtures for the
    /// decoder tests below.
    fn encode_order0(data: &[u8], freq: &[u32; 256]) -> Vec<u8> {
        let mut cum_freq = [0u32; 256];
        let mut acc = 0u32;
        for sym in 0..256 {
            cum_freq[sym] = acc;
            acc += freq[sym];
        }
        assert_eq!(acc, TOTAL_FREQ);

        let quarters = split_into_quarters(data);
        let mut state_bodies: Vec<Vec<u8>> = Vec::with_capacity(4);
        let mut final_states = [0u32; 4];
        for (i, quarter) in quarters.iter().enumerate() {
            let mut state = RENORM_LOWER_BOUND;
            let mut body = Vec::new();
            for &sym in quarter.iter().rev() {
                let s = sym as usize;
                let x_max = ((RENORM_LOWER_BOUND >> 12) << 8) * freq[s];
                while state >= x_max {
                    body.push((state & 0xff) as u8);
                    state >>= 8;
                }
                state = (state / freq[s]) * TOTAL_FREQ + (state % freq[s]) + cum_freq[s];
            }
            body.reverse();
            state_bodies.push(body);
            final_states[i] = state;
        }

        let mut out = Vec::new();
        out.push(0); // order
        // placeholder sizes, filled below
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&encode_freq_table(freq));
        for s in final_states {
            out.extend_from_slice(&s.to_le_bytes());
        }
        for body in &state_bodies {
            out.extend_from_slice(body);
        }
        let comp_size = (out.len() - 9) as u32;
        out[1..5].copy_from_slice(&comp_size.to_le_bytes());
        out
    }

    fn split_into_quarters(data: &[u8]) -> [Vec<u8>; 4] {
        let lens = quarter_lengths(data.len());
        let mut out: [Vec<u8>; 4] = Default::default();
        let mut offset = 0;
        for (i, len) in lens.into_iter().enumerate() {
            out[i] = data[offset..offset + len].to_vec();
            offset += len;
        }
        out
    }

    fn encode_freq_table(freq: &[u32; 256]) -> Vec<u8> {
        let mut out = Vec::new();
        for sym in 0..256 {
            if freq[sym] == 0 {
                continue;
            }
            out.push(sym as u8);
            if freq[sym] >= 128 {
                let hi = 0x80 | ((freq[sym] >> 8) as u8);
                let lo = (freq[sym] & 0xff) as u8;
                out.push(hi);
                out.push(lo);
            } else {
                out.push(freq[sym] as u8);
            }
            out.push(0); // run_len = 0, no RLE grouping in this fixture encoder
        }
        out
    }

    fn uniform_freq_for(alphabet: &[u8]) -> [u32; 256] {
        let mut freq = [0u32; 256];
        let share = TOTAL_FREQ / alphabet.len() as u32;
        let mut remainder = TOTAL_FREQ - share * alphabet.len() as u32;
        for &b in alphabet {
            let mut f = share;
            if remainder > 0 {
                f += 1;
                remainder -= 1;
            }
            freq[b as usize] = f;
        }
        freq
    }

    #[test]
    fn test_rans_order0_round_trip() {
        let alphabet = [b'A', b'C', b'G', b'T'];
        let freq = uniform_freq_for(&alphabet);
        let data: Vec<u8> = b"ACGTACGTACGTACGTACGTACGTACGTACGT".to_vec();

        let encoded = encode_order0(&data, &freq);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn test_rans_underrun_truncates_gracefully() {
        let alphabet = [b'A', b'C', b'G', b'T'];
        let freq = uniform_freq_for(&alphabet);
        let data: Vec<u8> = b"ACGTACGTACGTACGTACGTACGTACGTACGT".to_vec();
        let mut encoded = encode_order0(&data, &freq);
        encoded.truncate(encoded.len() - 4);

        let decoded = decode(&encoded).unwrap();
        assert!(decoded.len() <= data.len());
    }
}
