//! Decompression codecs for protector-embedded payloads.
//!
//! Decrypted resource blobs are compressed with one of two codecs. The protector's
//! own runtime tries them in a fixed order, and so does the decryption pipeline.
//!
//! # QuickLZ Format
//!
//! The protector prefixes a QuickLZ 1.4 frame with a signature:
//! - 4 bytes: `QCLZ` signature (little-endian `0x5A4C4351`)
//! - 1 byte: flags (bit 0: compressed, bit 1: 4-byte length fields)
//! - 1 or 4 bytes: compressed size
//! - 1 or 4 bytes: decompressed size
//! - Rest: the stored bytes, or a control-word driven literal/match stream
//!
//! # Deflate Format
//!
//! Raw Deflate streams without zlib header, as produced by `System.IO.Compression.DeflateStream`.

use std::io::Read;

use flate2::read::DeflateDecoder;

/// Signature in front of every QuickLZ frame (`QCLZ`).
pub const QUICKLZ_SIGNATURE: u32 = 0x5A4C_4351;

/// Result type for decompression operations.
pub type DecompressResult<T> = std::result::Result<T, DecompressError>;

/// Error type for decompression operations.
#[derive(Debug)]
pub enum DecompressError {
    /// Missing `QCLZ` signature or unusable frame header.
    InvalidQuickLzHeader,
    /// QuickLZ stream is malformed.
    QuickLzError(String),
    /// Deflate decompression failed.
    DeflateError(String),
    /// Input buffer too small.
    BufferTooSmall,
    /// Decompressed size exceeds the configured ceiling.
    SizeLimit(usize),
}

impl std::fmt::Display for DecompressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuickLzHeader => write!(f, "Invalid QuickLZ header"),
            Self::QuickLzError(msg) => write!(f, "QuickLZ decompression error: {msg}"),
            Self::DeflateError(msg) => write!(f, "Deflate decompression error: {msg}"),
            Self::BufferTooSmall => write!(f, "Input buffer too small"),
            Self::SizeLimit(size) => write!(f, "Decompressed size {size} exceeds the limit"),
        }
    }
}

impl std::error::Error for DecompressError {}

fn read_u32(data: &[u8], index: usize) -> DecompressResult<u32> {
    let bytes = data
        .get(index..index + 4)
        .ok_or(DecompressError::BufferTooSmall)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Reads up to four bytes, zero-padding past the end of the stream.
///
/// Match tokens are one to four bytes long and the decoder always fetches a full word,
/// so the last token of a stream may sit closer than four bytes to its end.
fn peek_u32(data: &[u8], index: usize) -> u32 {
    let mut word = [0u8; 4];
    if let Some(tail) = data.get(index..) {
        let len = tail.len().min(4);
        word[..len].copy_from_slice(&tail[..len]);
    }
    u32::from_le_bytes(word)
}

/// Checks if the given data starts with a QuickLZ frame header.
#[must_use]
pub fn is_quicklz(data: &[u8]) -> bool {
    read_u32(data, 0).is_ok_and(|sig| sig == QUICKLZ_SIGNATURE) && data.len() >= 7
}

/// Decompresses a `QCLZ` framed QuickLZ payload.
///
/// # Arguments
///
/// * `data` - The framed payload.
/// * `max_size` - Upper bound for the decompressed size announced by the header.
///
/// # Returns
///
/// The decompressed data, or an error if the frame is malformed. Every read and
/// back-reference is bounds-checked, malformed input never panics.
///
/// # Format
///
/// ```text
/// [0..4]  : "QCLZ"
/// [4]     : flags
/// [5..]   : compressed size, decompressed size (1 or 4 bytes each)
/// [..]    : stored bytes or compressed stream
/// ```
pub fn decompress_quicklz(data: &[u8], max_size: usize) -> DecompressResult<Vec<u8>> {
    if read_u32(data, 0)? != QUICKLZ_SIGNATURE {
        return Err(DecompressError::InvalidQuickLzHeader);
    }

    let flags = *data.get(4).ok_or(DecompressError::BufferTooSmall)?;
    let mut index = 5;

    let (compressed_size, decompressed_size) = if flags & 2 != 0 {
        let compressed = read_u32(data, index)? as usize;
        let decompressed = read_u32(data, index + 4)? as usize;
        index += 8;
        (compressed, decompressed)
    } else {
        let sizes = data
            .get(index..index + 2)
            .ok_or(DecompressError::BufferTooSmall)?;
        index += 2;
        (sizes[0] as usize, sizes[1] as usize)
    };

    // The compressed size counts from the flags byte and must fit the buffer
    if compressed_size > data.len() - 4 {
        return Err(DecompressError::BufferTooSmall);
    }
    if decompressed_size > max_size {
        return Err(DecompressError::SizeLimit(decompressed_size));
    }

    let mut decompressed = vec![0u8; decompressed_size];
    if flags & 1 != 0 {
        decode_stream(data, index, &mut decompressed)?;
    } else {
        let stored = data
            .get(index..index + decompressed_size)
            .ok_or(DecompressError::BufferTooSmall)?;
        decompressed.copy_from_slice(stored);
    }

    Ok(decompressed)
}

/// Copies a back-reference byte by byte, source and destination may overlap.
fn copy_match(out: &mut [u8], dst: usize, offset: usize, len: usize) -> DecompressResult<()> {
    if offset == 0 || offset > dst {
        return Err(DecompressError::QuickLzError(format!(
            "back-reference offset {offset} at position {dst}"
        )));
    }
    if dst + len > out.len() {
        return Err(DecompressError::QuickLzError(format!(
            "match of {len} bytes at position {dst} overruns {} byte output",
            out.len()
        )));
    }

    for i in 0..len {
        out[dst + i] = out[dst + i - offset];
    }
    Ok(())
}

fn decode_stream(input: &[u8], mut src: usize, out: &mut [u8]) -> DecompressResult<()> {
    let size = out.len();
    let mut dst = 0usize;
    let mut control: u32 = 1;

    while dst + 4 < size {
        if control == 1 {
            control = read_u32(input, src)?;
            src += 4;
        }

        if control & 1 == 1 {
            control >>= 1;
            let token = peek_u32(input, src);

            let (offset, len, consumed) = if token & 3 == 0 {
                (((token & 0xFF) >> 2) as usize, 3, 1)
            } else if token & 2 == 0 {
                (((token & 0xFFFF) >> 2) as usize, 3, 2)
            } else if token & 1 == 0 {
                (
                    ((token & 0xFFFF) >> 6) as usize,
                    ((token >> 2) & 0x0F) as usize + 3,
                    2,
                )
            } else if token & 4 == 0 {
                (
                    ((token & 0x00FF_FFFF) >> 8) as usize,
                    ((token >> 3) & 0x1F) as usize + 3,
                    3,
                )
            } else if token & 8 == 0 {
                let offset = (token >> 15) as usize;
                if offset != 0 {
                    (offset, ((token >> 4) & 0x07FF) as usize + 3, 4)
                } else {
                    let len = read_u32(input, src + 4)? as usize;
                    let offset = read_u32(input, src + 8)? as usize;
                    (offset, len, 12)
                }
            } else {
                // Run of a single byte
                let value = (token >> 16) as u8;
                let mut len = ((token >> 4) & 0x0FFF) as usize;
                let mut consumed = 3;
                if len == 0 {
                    len = read_u32(input, src + 3)? as usize;
                    consumed = 7;
                }
                if dst + len > size {
                    return Err(DecompressError::QuickLzError(format!(
                        "run of {len} bytes at position {dst} overruns {size} byte output"
                    )));
                }
                out[dst..dst + len].fill(value);
                dst += len;
                src += consumed;
                continue;
            };

            copy_match(out, dst, offset, len)?;
            dst += len;
            src += consumed;
        } else {
            let literals = input
                .get(src..src + 4)
                .ok_or(DecompressError::BufferTooSmall)?;
            out[dst..dst + 4].copy_from_slice(literals);

            // Consecutive literal bits in the low nibble, 4 when the whole nibble is clear
            let advance = (control & 0x0F).trailing_zeros().min(4);
            dst += advance as usize;
            src += advance as usize;
            control >>= advance;
        }
    }

    while dst < size {
        if control == 1 {
            src += 4;
            control = 0x8000_0000;
        }
        out[dst] = *input.get(src).ok_or(DecompressError::BufferTooSmall)?;
        dst += 1;
        src += 1;
        control >>= 1;
    }

    Ok(())
}

/// Decompresses raw Deflate data using flate2.
///
/// # Arguments
///
/// * `data` - The Deflate compressed data.
/// * `max_size` - Upper bound for the decompressed size.
///
/// # Returns
///
/// The decompressed data, or an error if decompression fails.
pub fn decompress_deflate(data: &[u8], max_size: usize) -> DecompressResult<Vec<u8>> {
    let decoder = DeflateDecoder::new(data);
    let mut decompressed = Vec::new();

    decoder
        .take(max_size as u64 + 1)
        .read_to_end(&mut decompressed)
        .map_err(|e| DecompressError::DeflateError(e.to_string()))?;

    if decompressed.len() > max_size {
        return Err(DecompressError::SizeLimit(decompressed.len()));
    }

    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::DeflateEncoder, Compression};

    use super::*;

    const LIMIT: usize = 1024 * 1024;

    fn stored_frame(payload: &[u8]) -> Vec<u8> {
        let mut frame = b"QCLZ".to_vec();
        frame.push(0x00);
        frame.push((payload.len() + 3) as u8);
        frame.push(payload.len() as u8);
        frame.extend_from_slice(payload);
        frame
    }

    /// Literal "abcd", match (offset 4, length 4), literal "XYZW", tail "QRST".
    fn compressed_frame() -> Vec<u8> {
        let mut stream = vec![0x10, 0x00, 0x00, 0x80];
        stream.extend_from_slice(b"abcd");
        stream.extend_from_slice(&[0x06, 0x01]);
        stream.extend_from_slice(b"XYZW");
        stream.extend_from_slice(b"QRST");

        let mut frame = b"QCLZ".to_vec();
        frame.push(0x01);
        frame.push((stream.len() + 3) as u8);
        frame.push(16);
        frame.extend_from_slice(&stream);
        frame
    }

    #[test]
    fn test_is_quicklz() {
        assert!(is_quicklz(&stored_frame(b"hi")));
        assert!(!is_quicklz(b"QCL"));
        assert!(!is_quicklz(&[0xFF; 16]));
    }

    #[test]
    fn test_decompress_quicklz_stored() {
        let decompressed = decompress_quicklz(&stored_frame(b"hello"), LIMIT).unwrap();
        assert_eq!(decompressed, b"hello");
    }

    #[test]
    fn test_decompress_quicklz_stream() {
        let decompressed = decompress_quicklz(&compressed_frame(), LIMIT).unwrap();
        assert_eq!(decompressed, b"abcdabcdXYZWQRST");
    }

    #[test]
    fn test_decompress_quicklz_long_header() {
        let mut frame = b"QCLZ".to_vec();
        frame.push(0x02);
        frame.extend_from_slice(&12u32.to_le_bytes());
        frame.extend_from_slice(&3u32.to_le_bytes());
        frame.extend_from_slice(b"xyz");
        assert_eq!(decompress_quicklz(&frame, LIMIT).unwrap(), b"xyz");
    }

    #[test]
    fn test_decompress_quicklz_rejects_bad_signature() {
        assert!(matches!(
            decompress_quicklz(b"ABCD\x00\x05\x01x", LIMIT),
            Err(DecompressError::InvalidQuickLzHeader)
        ));
    }

    #[test]
    fn test_decompress_quicklz_size_limit() {
        let result = decompress_quicklz(&stored_frame(b"hello"), 4);
        assert!(matches!(result, Err(DecompressError::SizeLimit(5))));
    }

    #[test]
    fn test_decompress_quicklz_bad_back_reference() {
        let mut frame = compressed_frame();
        // Point the match 9 bytes back while only 4 bytes were produced
        let token = 7 + 8;
        frame[token] = 0x46;
        frame[token + 1] = 0x02;
        assert!(matches!(
            decompress_quicklz(&frame, LIMIT),
            Err(DecompressError::QuickLzError(_))
        ));
    }

    #[test]
    fn test_decompress_quicklz_truncated() {
        let frame = compressed_frame();
        assert!(decompress_quicklz(&frame[..frame.len() - 6], LIMIT).is_err());
    }

    #[test]
    fn test_decompress_deflate() {
        let original = b"Hello, World! This is a test of deflate compression.";

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = decompress_deflate(&compressed, LIMIT).unwrap();
        assert_eq!(&decompressed, original);
    }

    #[test]
    fn test_decompress_deflate_limit() {
        let original = vec![0x41u8; 4096];

        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        assert!(matches!(
            decompress_deflate(&compressed, 1024),
            Err(DecompressError::SizeLimit(1025))
        ));
    }

    #[test]
    fn test_decompress_deflate_garbage() {
        // BFINAL=1 with the reserved block type 11
        assert!(decompress_deflate(&[0xFF; 16], LIMIT).is_err());
    }
}
