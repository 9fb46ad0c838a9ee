//! PackBits run length compression.
//!
//! Each packet starts with a control byte `n`:
//! - `0..=127`: `n + 1` literal bytes follow
//! - `129..=255`: the next byte is repeated `257 - n` times
//! - `128`: no-op
use crate::error::{ChrError, Result};

const MAX_PACKET: usize = 128;
// Runs shorter than this are stored as literals
const MIN_RUN: usize = 3;

fn run_length(data: &[u8]) -> usize {
    match data.first() {
        Some(&first) => data
            .iter()
            .take(MAX_PACKET)
            .take_while(|&&b| b == first)
            .count(),
        None => 0,
    }
}

fn flush_literals(out: &mut Vec<u8>, literals: &[u8]) {
    for chunk in literals.chunks(MAX_PACKET) {
        out.push((chunk.len() - 1) as u8);
        out.extend_from_slice(chunk);
    }
}

pub fn pack(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / MAX_PACKET + 1);
    let mut literal_start = 0;
    let mut i = 0;
    while i < data.len() {
        let run = run_length(&data[i..]);
        if run >= MIN_RUN {
            flush_literals(&mut out, &data[literal_start..i]);
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
            literal_start = i;
        } else {
            i += run;
        }
    }
    flush_literals(&mut out, &data[literal_start..]);
    out
}

/// PackBits output preceded by the uncompressed size (modulo 65536) as a
/// 16-bit big endian value.
pub fn pack_with_header(data: &[u8]) -> Vec<u8> {
    let size = (data.len() % 0x10000) as u16;
    let mut out = size.to_be_bytes().to_vec();
    out.extend(pack(data));
    out
}

pub fn unpack(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let n = data[i] as usize;
        i += 1;
        match n {
            0..=127 => {
                let end = i + n + 1;
                if end > data.len() {
                    return Err(ChrError::Packbits(format!(
                        "literal packet of {} bytes at offset {} runs past the end",
                        n + 1,
                        i - 1
                    )));
                }
                out.extend_from_slice(&data[i..end]);
                i = end;
            }
            128 => {}
            _ => {
                let b = *data.get(i).ok_or_else(|| {
                    ChrError::Packbits(format!("run packet at offset {} has no value", i - 1))
                })?;
                out.extend(std::iter::repeat(b).take(257 - n));
                i += 1;
            }
        }
    }
    Ok(out)
}
