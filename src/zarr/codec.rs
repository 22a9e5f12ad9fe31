use std::io::Read;
use flate2::read::{GzDecoder, ZlibDecoder};
use crate::error::{Result, ViewerError};
use crate::zarr::metadata::Compressor;
const BLOSC_HEADER_LEN: usize = 16;
const BLOSC_DOSHUFFLE: u8 = 0x01;
const BLOSC_MEMCPYED: u8 = 0x02;
const BLOSC_DOBITSHUFFLE: u8 = 0x04;
const BLOSC_DONT_SPLIT: u8 = 0x10;
const BLOSC_CODEC_LZ4: u8 = 1;
const BLOSC_CODEC_ZLIB: u8 = 3;
/// Undo the array's compressor, returning exactly `expected_len` raw element bytes of one chunk.
pub fn decompress(compressor: Option<Compressor>, raw: Vec<u8>, expected_len: usize) -> Result<Vec<u8>> {
    let out = match compressor {
        None => raw,
        Some(Compressor::Zlib) => read_capped(ZlibDecoder::new(raw.as_slice()), expected_len)?,
        Some(Compressor::Gzip) => read_capped(GzDecoder::new(raw.as_slice()), expected_len)?,
        Some(Compressor::Blosc) => decompress_blosc(&raw, expected_len)?,
    };
    if out.len() != expected_len {
        return Err(ViewerError::format(format!(
            "decoded {} bytes, expected {expected_len}",
            out.len()
        )));
    }
    Ok(out)
}
// One byte past the limit is enough to detect an oversized stream.
fn read_capped(decoder: impl Read, expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    decoder.take(expected_len as u64 + 1).read_to_end(&mut out)?;
    Ok(out)
}
fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| ViewerError::format("blosc frame is truncated"))
}
/// Decode a Blosc1 frame (16-byte header, block offsets, per-block streams).
/// A header announcing anything but `expected_len` bytes is rejected before decoding.
pub fn decompress_blosc(frame: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    if frame.len() < BLOSC_HEADER_LEN {
        return Err(ViewerError::format("blosc frame is shorter than its header"));
    }
    let flags = frame[2];
    let typesize = frame[3] as usize;
    let nbytes = read_u32(frame, 4)? as usize;
    let blocksize = read_u32(frame, 8)? as usize;
    let cbytes = read_u32(frame, 12)? as usize;
    if nbytes != expected_len {
        return Err(ViewerError::format(format!(
            "blosc frame holds {nbytes} bytes, expected {expected_len}"
        )));
    }
    if cbytes > frame.len() {
        return Err(ViewerError::format("blosc frame is truncated"));
    }
    if flags & BLOSC_MEMCPYED != 0 {
        return frame
            .get(BLOSC_HEADER_LEN..BLOSC_HEADER_LEN + nbytes)
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ViewerError::format("blosc frame is truncated"));
    }
    if flags & BLOSC_DOBITSHUFFLE != 0 {
        return Err(ViewerError::format("blosc bit-shuffle is not supported"));
    }
    let codec = flags >> 5;
    if codec != BLOSC_CODEC_LZ4 && codec != BLOSC_CODEC_ZLIB {
        return Err(ViewerError::format(format!(
            "blosc inner codec {codec} is not supported"
        )));
    }
    if nbytes == 0 {
        return Ok(Vec::new());
    }
    if typesize == 0 || blocksize == 0 {
        return Err(ViewerError::format("blosc header has zero typesize or blocksize"));
    }
    let nblocks = nbytes.div_ceil(blocksize);
    let leftover = nbytes % blocksize;
    let mut out = vec![0u8; nbytes];
    let mut block = vec![0u8; blocksize];
    for j in 0..nblocks {
        let is_leftover = leftover > 0 && j == nblocks - 1;
        let bsize = if is_leftover { leftover } else { blocksize };
        let nsplits = if flags & BLOSC_DONT_SPLIT == 0 && !is_leftover {
            typesize
        } else {
            1
        };
        if bsize % nsplits != 0 {
            return Err(ViewerError::format("blosc block does not split evenly"));
        }
        let neblock = bsize / nsplits;
        let mut pos = read_u32(frame, BLOSC_HEADER_LEN + 4 * j)? as usize;
        let decoded = &mut block[..bsize];
        for split in decoded.chunks_exact_mut(neblock) {
            let csize = read_u32(frame, pos)? as usize;
            pos += 4;
            let src = frame
                .get(pos..pos + csize)
                .ok_or_else(|| ViewerError::format("blosc stream is truncated"))?;
            if csize == neblock {
                split.copy_from_slice(src);
            } else if codec == BLOSC_CODEC_LZ4 {
                let written = lz4_flex::block::decompress_into(src, split)?;
                if written != neblock {
                    return Err(ViewerError::format("lz4 stream decoded to the wrong length"));
                }
            } else {
                ZlibDecoder::new(src).read_exact(split)?;
            }
            pos += csize;
        }
        let target = &mut out[j * blocksize..j * blocksize + bsize];
        if flags & BLOSC_DOSHUFFLE != 0 && typesize > 1 {
            unshuffle(decoded, typesize, target);
        } else {
            target.copy_from_slice(decoded);
        }
    }
    Ok(out)
}
/// Inverse of the byte-shuffle filter: element bytes were grouped by significance.
fn unshuffle(src: &[u8], typesize: usize, dst: &mut [u8]) {
    let nelem = src.len() / typesize;
    for byte in 0..typesize {
        for elem in 0..nelem {
            dst[elem * typesize + byte] = src[byte * nelem + elem];
        }
    }
    let tail = nelem * typesize;
    dst[tail..].copy_from_slice(&src[tail..]);
}
