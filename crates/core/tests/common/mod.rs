//! In-memory synthetic PDF builder for integration tests.
//!
//! Assembles object bodies, a classic xref table with 20-byte entries, and
//! a trailer. Object ids need not be added in order; gaps become free
//! entries.

use std::collections::HashMap;

pub struct PdfBuilder {
    buf: Vec<u8>,
    offsets: Vec<(u32, usize)>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self {
            buf: b"%PDF-1.4\n".to_vec(),
            offsets: Vec::new(),
        }
    }

    pub fn object(&mut self, id: u32, body: &str) -> &mut Self {
        self.offsets.push((id, self.buf.len()));
        self.buf
            .extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
        self
    }

    /// Add a stream object; /Length is computed, `dict` holds any extra
    /// entries (e.g. "/Filter /FlateDecode").
    pub fn stream_object(&mut self, id: u32, dict: &str, data: &[u8]) -> &mut Self {
        self.offsets.push((id, self.buf.len()));
        self.buf.extend_from_slice(
            format!("{id} 0 obj\n<< /Length {} {dict} >>\nstream\n", data.len()).as_bytes(),
        );
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream\nendobj\n");
        self
    }

    pub fn finish(&mut self, root_id: u32) -> Vec<u8> {
        self.finish_with_trailer(root_id, "")
    }

    pub fn finish_with_trailer(&mut self, root_id: u32, trailer_extra: &str) -> Vec<u8> {
        let xref_pos = self.buf.len();
        let map: HashMap<u32, usize> = self.offsets.iter().copied().collect();
        let max_id = self.offsets.iter().map(|(id, _)| *id).max().unwrap_or(0);

        self.buf
            .extend_from_slice(format!("xref\n0 {}\n", max_id + 1).as_bytes());
        self.buf.extend_from_slice(b"0000000000 65535 f \n");
        for id in 1..=max_id {
            match map.get(&id) {
                Some(offset) => self
                    .buf
                    .extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes()),
                None => self.buf.extend_from_slice(b"0000000000 65535 f \n"),
            }
        }

        self.buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {} /Root {root_id} 0 R {trailer_extra} >>\nstartxref\n{xref_pos}\n%%EOF",
                max_id + 1
            )
            .as_bytes(),
        );

        std::mem::take(&mut self.buf)
    }
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Compress bytes the way FlateDecode expects them.
pub fn zlib_compress(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}
