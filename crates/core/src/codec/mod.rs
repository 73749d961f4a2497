//! Stream filter codecs.
//!
//! This module contains the filters needed to read annotation data, content
//! streams, and cross-reference streams:
//! - `flate_decode`: FlateDecode (zlib), lenient on corrupted tails
//! - `predictor`: PNG row predictors used by xref streams
//! - `asciihex`: ASCIIHexDecode
//! - `runlength`: RunLengthDecode
//!
//! Everything else surfaces as `UnsupportedFilter`.

pub mod asciihex;
pub mod predictor;
pub mod runlength;

pub use asciihex::asciihex_decode;
pub use predictor::apply_png_predictor;
pub use runlength::runlength_decode;

/// Decompress zlib data.
///
/// Returns partial output up to the point the decoder fails when the stream
/// is truncated or has a bad checksum, mirroring how lenient PDF readers
/// treat the (common) corrupted tail.
pub fn flate_decode(data: &[u8]) -> Vec<u8> {
    use std::io::Read;

    let mut out = Vec::new();
    let mut decoder = flate2::read::ZlibDecoder::new(data);
    if decoder.read_to_end(&mut out).is_ok() {
        return out;
    }

    use flate2::{Decompress, FlushDecompress, Status};
    let mut decomp = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut buf = [0u8; 8192];
    let mut pos = 0usize;
    while pos < data.len() {
        let before_in = decomp.total_in();
        let before_out = decomp.total_out();
        let res = decomp.decompress(&data[pos..], &mut buf, FlushDecompress::None);
        let consumed = (decomp.total_in() - before_in) as usize;
        let produced = (decomp.total_out() - before_out) as usize;
        out.extend_from_slice(&buf[..produced]);
        match res {
            Ok(Status::StreamEnd) | Err(_) => break,
            Ok(_) if consumed == 0 && produced == 0 => break,
            Ok(_) => {}
        }
        pos += consumed;
    }
    out
}
