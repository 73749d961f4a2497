//! PDF document: xref chain loading, object resolution, catalog access.
//!
//! Handles:
//! - locating the trailer (`startxref` backward scan)
//! - classic xref tables and PDF 1.5+ xref/object streams
//! - incremental updates (`/Prev` chain, later updates win)
//! - memoized indirect-object resolution
//! - named destinations and the document outline

use crate::codec;
use crate::error::{PdfError, Result};
use crate::model::{Dict, PdfObject, PdfStream};
use crate::parser::pdf_parser::ObjectParser;
use crate::utils::decode_text;
use bytes::Bytes;
use memmap2::Mmap;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use super::page::{Page, PageIndex};

/// Location of an indirect object.
#[derive(Debug, Clone)]
struct XRefEntry {
    /// Byte offset in the file, or index within an object stream.
    offset: usize,
    /// Object stream holding this object, for compressed entries.
    stream_objid: Option<u32>,
}

/// One cross-reference section plus its trailer dictionary.
#[derive(Debug, Default)]
struct XRef {
    offsets: FxHashMap<u32, XRefEntry>,
    trailer: Dict,
}

/// An entry in the document outline (table of contents).
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub title: String,
    /// 0-based index into the page list.
    pub page_index: usize,
    /// Nesting depth, 0 for top-level entries.
    pub level: usize,
}

/// An open PDF document.
///
/// Owns the raw bytes and the cross-reference index for its lifetime; all
/// other components borrow views or hold object ids. The object cache is
/// never evicted, so resolving the same id twice always returns the same
/// `Arc` and identity comparisons against resolved objects stay valid.
pub struct Document {
    data: Bytes,
    /// Xref sections in load order: the most recent update first.
    xrefs: Vec<XRef>,
    catalog: Dict,
    cache: Mutex<FxHashMap<u32, Arc<PdfObject>>>,
    page_index: OnceLock<PageIndex>,
}

impl Document {
    /// Open a PDF from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(Bytes::from(data))
    }

    /// Open a PDF from a byte slice (copies the data).
    pub fn new<D: AsRef<[u8]>>(data: D) -> Result<Self> {
        Self::from_bytes(Bytes::copy_from_slice(data.as_ref()))
    }

    /// Open a PDF from a memory-mapped file. The mapping is released when
    /// the document is dropped, on every exit path.
    pub fn from_mmap(mmap: Mmap) -> Result<Self> {
        Self::from_bytes(Bytes::from_owner(mmap))
    }

    /// Open a PDF from shared bytes (zero-copy).
    pub fn from_bytes(data: Bytes) -> Result<Self> {
        let mut doc = Self {
            data,
            xrefs: Vec::new(),
            catalog: Dict::new(),
            cache: Mutex::new(FxHashMap::default()),
            page_index: OnceLock::new(),
        };
        doc.load()?;
        // Materialize the page list once; all later lookups index into it.
        let _ = doc.page_index();
        Ok(doc)
    }

    /// Raw document bytes.
    pub fn bytes(&self) -> &[u8] {
        self.data.as_ref()
    }

    /// The document catalog dictionary.
    pub fn catalog(&self) -> &Dict {
        &self.catalog
    }

    pub(crate) fn page_index(&self) -> &PageIndex {
        self.page_index.get_or_init(|| PageIndex::new(self))
    }

    /// Number of leaf pages reachable from the catalog's page tree.
    pub fn page_count(&self) -> usize {
        self.page_index().len()
    }

    /// Build the page at the given 0-based index.
    pub fn page(&self, index: usize) -> Result<Page> {
        let page_ref = self
            .page_index()
            .get(index)
            .ok_or(PdfError::ObjectNotFound(0))?;
        Page::build(self, index, page_ref)
    }

    fn load(&mut self) -> Result<()> {
        let startxref = self.find_startxref()?;
        self.load_xrefs(startxref).map_err(|e| {
            log::debug!("xref chain failed: {e}");
            PdfError::NoValidXRef
        })?;
        if self.xrefs.is_empty() {
            return Err(PdfError::NoValidXRef);
        }

        // No decryption support: refuse encrypted documents outright rather
        // than extracting garbage.
        if self.xrefs.iter().any(|x| x.trailer.contains_key("Encrypt")) {
            return Err(PdfError::ExtractionDenied);
        }

        let root_ref = self
            .xrefs
            .iter()
            .find_map(|x| x.trailer.get("Root"))
            .cloned()
            .ok_or(PdfError::NoValidXRef)?;
        let root = self.resolve(&root_ref)?;
        self.catalog = root.as_dict()?.clone();
        Ok(())
    }

    /// Find the `startxref` offset by scanning backward from end of file.
    fn find_startxref(&self) -> Result<usize> {
        let data = self.data.as_ref();
        let needle = b"startxref";
        if data.len() < needle.len() {
            return Err(PdfError::NoValidXRef);
        }
        let search_start = data.len().saturating_sub(1024);
        let hay = &data[search_start..];
        let mut found = None;
        for pos in 0..=hay.len() - needle.len() {
            if &hay[pos..pos + needle.len()] == needle {
                found = Some(search_start + pos);
            }
        }
        let i = found.ok_or(PdfError::NoValidXRef)?;

        let rest = &data[i + needle.len()..];
        let pos = skip_ws(rest, 0);
        let (value, _) = read_uint(rest, pos).map_err(|_| PdfError::NoValidXRef)?;
        Ok(value as usize)
    }

    /// Follow the xref chain from the given position. Later updates are
    /// loaded first and shadow earlier ones during resolution.
    fn load_xrefs(&mut self, start: usize) -> Result<()> {
        let mut pos = start;
        let mut visited = HashSet::new();

        while visited.insert(pos) {
            let xref = self.load_xref_at(pos)?;

            let xref_stm = xref
                .trailer
                .get("XRefStm")
                .and_then(|p| p.as_int().ok())
                .map(|n| n as usize);
            let prev = xref
                .trailer
                .get("Prev")
                .and_then(|p| p.as_int().ok())
                .map(|n| n as usize);

            self.xrefs.push(xref);

            // Hybrid-reference files: the xref stream shadows entries of the
            // classic table it sits next to, so it loads right after it.
            if let Some(stm_pos) = xref_stm
                && visited.insert(stm_pos)
                && let Ok(stm) = self.load_xref_stream(stm_pos)
            {
                self.xrefs.push(stm);
            }

            match prev {
                Some(p) => pos = p,
                None => break,
            }
        }

        Ok(())
    }

    fn load_xref_at(&self, pos: usize) -> Result<XRef> {
        let data = self.data.as_ref();
        if pos >= data.len() {
            return Err(PdfError::NoValidXRef);
        }
        if data[pos..].starts_with(b"xref") {
            self.load_traditional_xref(pos)
        } else {
            self.load_xref_stream(pos)
        }
    }

    /// Parse a classic `xref` table with its trailer dictionary.
    fn load_traditional_xref(&self, pos: usize) -> Result<XRef> {
        let data = self.data.as_ref();
        let mut xref = XRef::default();
        let mut cursor = pos + 4; // past "xref"

        loop {
            cursor = skip_ws(data, cursor);
            if cursor >= data.len() {
                break;
            }
            if data[cursor..].starts_with(b"trailer") {
                cursor += 7;
                break;
            }

            let (start_objid, c) = read_uint(data, cursor)?;
            cursor = skip_ws(data, c);
            let (count, c) = read_uint(data, cursor)?;
            cursor = c;

            let mut base = start_objid as u32;
            for i in 0..count {
                cursor = skip_ws(data, cursor);
                let (offset, c) = read_uint(data, cursor)?;
                cursor = skip_ws(data, c);
                let (genno, c) = read_uint(data, cursor)?;
                cursor = skip_ws(data, c);
                let marker = data.get(cursor).copied().unwrap_or(b'f');
                cursor += 1;

                // Some writers start the first subsection at 1 while still
                // emitting the object-0 free entry; realign when that happens.
                if i == 0 && base > 0 && marker == b'f' && offset == 0 && genno == 65535 {
                    base -= 1;
                }
                let objid = base + i as u32;

                if marker == b'n' {
                    xref.offsets.insert(
                        objid,
                        XRefEntry {
                            offset: offset as usize,
                            stream_objid: None,
                        },
                    );
                }
            }
        }

        cursor = skip_ws(data, cursor);
        if cursor < data.len() && data[cursor..].starts_with(b"<<") {
            let mut parser = ObjectParser::new(&data[cursor..]);
            if let Ok(PdfObject::Dict(dict)) = parser.parse_object() {
                xref.trailer = dict;
            }
        }

        Ok(xref)
    }

    /// Parse a PDF 1.5+ cross-reference stream.
    fn load_xref_stream(&self, pos: usize) -> Result<XRef> {
        let obj = self.parse_object_at(pos)?;
        let stream = obj.as_stream()?;

        let w = stream
            .get("W")
            .ok_or_else(|| PdfError::KeyError("W".into()))?
            .as_array()?;
        if w.len() != 3 {
            return Err(PdfError::Syntax {
                pos,
                msg: "xref stream /W must have 3 elements".into(),
            });
        }
        let w0 = w[0].as_int()? as usize;
        let w1 = w[1].as_int()? as usize;
        let w2 = w[2].as_int()? as usize;
        let entry_size = w0 + w1 + w2;
        if entry_size == 0 {
            return Err(PdfError::Syntax {
                pos,
                msg: "xref stream with empty entries".into(),
            });
        }

        let size = stream
            .get("Size")
            .ok_or_else(|| PdfError::KeyError("Size".into()))?
            .as_int()? as usize;

        let index = match stream.get("Index") {
            Some(idx) => {
                let arr = idx.as_array()?;
                let mut pairs = Vec::new();
                let mut i = 0;
                while i + 1 < arr.len() {
                    pairs.push((arr[i].as_int()? as u32, arr[i + 1].as_int()? as usize));
                    i += 2;
                }
                pairs
            }
            None => vec![(0, size)],
        };

        let data = self.decode_stream(stream)?;

        let mut xref = XRef::default();
        let mut data_pos = 0;

        for (start_objid, count) in index {
            for i in 0..count {
                if data_pos + entry_size > data.len() {
                    break;
                }
                let objid = start_objid + i as u32;

                let entry_type = if w0 > 0 {
                    read_be_int(&data[data_pos..data_pos + w0])
                } else {
                    1
                };
                let field1 = read_be_int(&data[data_pos + w0..data_pos + w0 + w1]);
                let field2 = read_be_int(&data[data_pos + w0 + w1..data_pos + entry_size]);
                data_pos += entry_size;

                match entry_type {
                    1 => {
                        xref.offsets.insert(
                            objid,
                            XRefEntry {
                                offset: field1 as usize,
                                stream_objid: None,
                            },
                        );
                    }
                    2 => {
                        xref.offsets.insert(
                            objid,
                            XRefEntry {
                                offset: field2 as usize,
                                stream_objid: Some(field1 as u32),
                            },
                        );
                    }
                    // Type 0 = free; anything else is reserved.
                    _ => {}
                }
            }
        }

        for (key, value) in &stream.attrs {
            if !matches!(
                key.as_str(),
                "Length" | "Filter" | "DecodeParms" | "W" | "Index" | "Type"
            ) {
                xref.trailer.insert(key.clone(), value.clone());
            }
        }

        Ok(xref)
    }

    /// Parse the indirect object at a byte offset ("objid genno obj ...").
    fn parse_object_at(&self, offset: usize) -> Result<PdfObject> {
        let data = self.data.as_ref();
        if offset >= data.len() {
            return Err(PdfError::Syntax {
                pos: offset,
                msg: "object offset beyond end of file".into(),
            });
        }

        let (_objid, c) = read_uint(data, offset)?;
        let cursor = skip_ws(data, c);
        let (_genno, c) = read_uint(data, cursor)?;
        let mut cursor = skip_ws(data, c);
        if !data[cursor..].starts_with(b"obj") {
            return Err(PdfError::Syntax {
                pos: cursor,
                msg: "expected 'obj'".into(),
            });
        }
        cursor += 3;
        cursor = skip_ws(data, cursor);

        let mut parser = ObjectParser::new(&data[cursor..]);
        let obj = parser.parse_object()?;

        let dict = match obj {
            PdfObject::Dict(dict) => dict,
            other => return Ok(other),
        };

        // A dictionary immediately followed by `stream` is a stream object.
        let rest = parser.remaining();
        let mut p = skip_ws(rest, 0);
        if !rest[p..].starts_with(b"stream") {
            return Ok(PdfObject::Dict(dict));
        }
        p += 6;
        if rest.get(p) == Some(&b'\r') {
            p += 1;
        }
        if rest.get(p) == Some(&b'\n') {
            p += 1;
        }
        let abs_start = cursor + parser.tell() + p;

        // /Length may itself be indirect; resolving it can reenter the
        // resolver. During xref bootstrap that resolve fails and we fall
        // back to scanning for `endstream`.
        let length = dict
            .get("Length")
            .and_then(|obj| self.resolve(obj).ok())
            .and_then(|resolved| resolved.as_int().ok())
            .filter(|&len| len > 0)
            .map(|len| len as usize);

        let raw = match length {
            Some(len) if abs_start + len <= data.len() => self.data.slice(abs_start..abs_start + len),
            _ => match find_endstream(&data[abs_start..]) {
                Some(end) => self.data.slice(abs_start..abs_start + end),
                None => self.data.slice(abs_start..),
            },
        };

        Ok(PdfObject::Stream(Box::new(PdfStream::new(dict, raw))))
    }

    /// Parse one member of an object stream (`/Type /ObjStm`).
    fn parse_object_from_stream(&self, stream_objid: u32, index: usize) -> Result<PdfObject> {
        let stream_obj = self.getobj_shared(stream_objid)?;
        let stream = stream_obj.as_stream()?;
        let data = self.decode_stream(stream)?;

        let n = stream
            .get("N")
            .ok_or_else(|| PdfError::KeyError("N".into()))?
            .as_int()? as usize;
        let first = stream
            .get("First")
            .ok_or_else(|| PdfError::KeyError("First".into()))?
            .as_int()? as usize;
        if index >= n || first > data.len() {
            return Err(PdfError::Syntax {
                pos: 0,
                msg: format!("object stream index {index} out of range"),
            });
        }

        // Header: objid1 offset1 objid2 offset2 ...
        let mut header = ObjectParser::new(&data[..first]);
        let mut offsets = Vec::with_capacity(n);
        for _ in 0..n {
            let _objid = header.parse_object()?.as_int()?;
            offsets.push(header.parse_object()?.as_int()? as usize);
        }

        let obj_offset = first + offsets.get(index).copied().unwrap_or(0);
        if obj_offset > data.len() {
            return Err(PdfError::Syntax {
                pos: obj_offset,
                msg: "object stream offset out of range".into(),
            });
        }
        ObjectParser::new(&data[obj_offset..]).parse_object()
    }

    /// Get an object by id, cloning out of the cache.
    pub fn getobj(&self, objid: u32) -> Result<PdfObject> {
        Ok((*self.getobj_shared(objid)?).clone())
    }

    /// Get an object by id. The first call parses it from its recorded
    /// location; subsequent calls return the same cached `Arc`.
    pub fn getobj_shared(&self, objid: u32) -> Result<Arc<PdfObject>> {
        if objid == 0 {
            return Err(PdfError::ObjectNotFound(0));
        }

        // Per-thread in-flight set: a reentrant resolve of an id already on
        // this thread's stack is a reference cycle, not a cache miss.
        thread_local! {
            static RESOLVING: RefCell<HashSet<u32>> = RefCell::new(HashSet::new());
        }

        struct InFlightGuard {
            objid: u32,
        }

        impl Drop for InFlightGuard {
            fn drop(&mut self) {
                RESOLVING.with(|set| {
                    set.borrow_mut().remove(&self.objid);
                });
            }
        }

        let is_cycle = RESOLVING.with(|set| !set.borrow_mut().insert(objid));
        if is_cycle {
            return Err(PdfError::Syntax {
                pos: 0,
                msg: format!("circular reference through obj {objid}"),
            });
        }
        let _guard = InFlightGuard { objid };

        if let Ok(mut cache) = self.cache.lock()
            && let Some(obj) = cache.get(&objid)
        {
            return Ok(Arc::clone(obj));
        }

        for xref in &self.xrefs {
            let Some(entry) = xref.offsets.get(&objid) else {
                continue;
            };
            let parsed = match entry.stream_objid {
                Some(container) => self.parse_object_from_stream(container, entry.offset),
                None => self.parse_object_at(entry.offset),
            };
            let obj = match parsed {
                Ok(o) => o,
                // A stale entry in one update may be shadowed by a valid one
                // in an older section; keep looking.
                Err(_) => continue,
            };

            let obj = Arc::new(obj);
            // Another page worker may have resolved this id while we were
            // parsing; the first insertion wins so identity stays stable.
            if let Ok(mut cache) = self.cache.lock() {
                let entry = cache.entry(objid).or_insert(obj);
                return Ok(Arc::clone(entry));
            }
            return Ok(obj);
        }

        Err(PdfError::ObjectNotFound(objid))
    }

    /// Resolve an object, following reference chains to the target value.
    pub fn resolve(&self, obj: &PdfObject) -> Result<Arc<PdfObject>> {
        let mut seen = HashSet::new();
        let mut current = match obj {
            PdfObject::Ref(r) => {
                seen.insert(r.objid);
                self.getobj_shared(r.objid)?
            }
            _ => return Ok(Arc::new(obj.clone())),
        };
        loop {
            match current.as_ref() {
                PdfObject::Ref(r) => {
                    if !seen.insert(r.objid) {
                        return Err(PdfError::Syntax {
                            pos: 0,
                            msg: format!("circular reference through obj {}", r.objid),
                        });
                    }
                    current = self.getobj_shared(r.objid)?;
                }
                _ => return Ok(current),
            }
        }
    }

    /// Decode a stream's bytes, applying its declared filter chain.
    pub fn decode_stream(&self, stream: &PdfStream) -> Result<Vec<u8>> {
        let filters = self.filter_chain(stream)?;
        let mut data = stream.rawdata().to_vec();
        for (name, parms) in filters {
            data = match name.as_str() {
                "FlateDecode" => {
                    let inflated = codec::flate_decode(&data);
                    self.apply_predictor(inflated, parms.as_ref())?
                }
                "ASCIIHexDecode" => codec::asciihex_decode(&data)?,
                "RunLengthDecode" => codec::runlength_decode(&data),
                other => return Err(PdfError::UnsupportedFilter(other.to_string())),
            };
        }
        Ok(data)
    }

    /// Normalize /Filter and /DecodeParms into a list of (name, parms).
    fn filter_chain(&self, stream: &PdfStream) -> Result<Vec<(String, Option<Dict>)>> {
        let Some(filter) = stream.get("Filter") else {
            return Ok(Vec::new());
        };
        let filter = self.resolve(filter)?;
        let parms = match stream.get("DecodeParms").or_else(|| stream.get("DP")) {
            Some(p) => Some(self.resolve(p)?),
            None => None,
        };

        let parm_at = |i: usize| -> Option<Dict> {
            let parms = parms.as_deref()?;
            match parms {
                PdfObject::Dict(d) if i == 0 => Some(d.clone()),
                PdfObject::Array(arr) => {
                    let entry = arr.get(i)?;
                    let resolved = self.resolve(entry).ok()?;
                    match resolved.as_ref() {
                        PdfObject::Dict(d) => Some(d.clone()),
                        _ => None,
                    }
                }
                _ => None,
            }
        };

        match filter.as_ref() {
            PdfObject::Name(name) => Ok(vec![(name.clone(), parm_at(0))]),
            PdfObject::Array(arr) => {
                let mut chain = Vec::with_capacity(arr.len());
                for (i, entry) in arr.iter().enumerate() {
                    let resolved = self.resolve(entry)?;
                    chain.push((resolved.as_name()?.to_string(), parm_at(i)));
                }
                Ok(chain)
            }
            other => Err(PdfError::TypeError {
                expected: "name or array",
                got: if other.is_null() { "null" } else { "object" },
            }),
        }
    }

    fn apply_predictor(&self, data: Vec<u8>, parms: Option<&Dict>) -> Result<Vec<u8>> {
        let Some(parms) = parms else {
            return Ok(data);
        };
        let get_int = |key: &str, default: i64| -> i64 {
            parms
                .get(key)
                .and_then(|v| self.resolve(v).ok())
                .and_then(|v| v.as_int().ok())
                .unwrap_or(default)
        };
        let predictor = get_int("Predictor", 1);
        if predictor < 2 {
            return Ok(data);
        }
        if predictor < 10 {
            // TIFF predictor 2 never shows up in the streams we read.
            return Err(PdfError::UnsupportedFilter(format!(
                "Predictor {predictor}"
            )));
        }
        let columns = get_int("Columns", 1).max(1) as usize;
        let colors = get_int("Colors", 1).max(1) as usize;
        let bits = get_int("BitsPerComponent", 8).max(1) as usize;
        codec::apply_png_predictor(&data, columns, colors, bits)
    }

    /// Resolve a named destination through the Names/Dests name tree
    /// (PDF 1.2+) or the catalog Dests dictionary (PDF 1.1).
    pub fn get_dest(&self, name: &[u8]) -> Result<PdfObject> {
        if let Some(names_ref) = self.catalog.get("Names")
            && let Ok(names) = self.resolve(names_ref)
            && let Ok(names_dict) = names.as_dict()
            && let Some(dests_ref) = names_dict.get("Dests")
            && let Ok(dests) = self.resolve(dests_ref)
            && let Some(result) = self.lookup_name_tree(&dests, name)?
        {
            return Ok(result);
        }

        if let Some(dests_ref) = self.catalog.get("Dests")
            && let Ok(dests) = self.resolve(dests_ref)
            && let Ok(dests_dict) = dests.as_dict()
        {
            let key = String::from_utf8_lossy(name);
            if let Some(dest) = dests_dict.get(key.as_ref()) {
                let resolved = self.resolve(dest)?;
                return Ok((*resolved).clone());
            }
        }

        Err(PdfError::DestinationNotFound(
            String::from_utf8_lossy(name).to_string(),
        ))
    }

    fn lookup_name_tree(&self, tree: &PdfObject, name: &[u8]) -> Result<Option<PdfObject>> {
        let dict = match tree.as_dict() {
            Ok(d) => d,
            Err(_) => return Ok(None),
        };

        // Leaf node: Names array of [key1, value1, key2, value2, ...].
        if let Some(names_obj) = dict.get("Names") {
            let names = self.resolve(names_obj)?;
            if let Ok(arr) = names.as_array() {
                let mut i = 0;
                while i + 1 < arr.len() {
                    if let Ok(key) = arr[i].as_str()
                        && key == name
                    {
                        let resolved = self.resolve(&arr[i + 1])?;
                        return Ok(Some((*resolved).clone()));
                    }
                    i += 2;
                }
            }
        }

        // Intermediate node: recurse into Kids, pruning by Limits.
        if let Some(kids_obj) = dict.get("Kids") {
            let kids = self.resolve(kids_obj)?;
            if let Ok(kids_arr) = kids.as_array() {
                for kid in kids_arr {
                    let Ok(kid_obj) = self.resolve(kid) else {
                        continue;
                    };
                    if let Ok(kid_dict) = kid_obj.as_dict()
                        && let Some(limits) = kid_dict.get("Limits")
                        && let Ok(limits_arr) = limits.as_array()
                        && limits_arr.len() >= 2
                    {
                        let min = limits_arr[0].as_str().unwrap_or(&[]);
                        let max = limits_arr[1].as_str().unwrap_or(&[]);
                        if name < min || name > max {
                            continue;
                        }
                    }
                    if let Some(result) = self.lookup_name_tree(&kid_obj, name)? {
                        return Ok(Some(result));
                    }
                }
            }
        }

        Ok(None)
    }

    /// Map a destination (array, named destination, or dict with /D) to a
    /// 0-based page index by identity against the materialized page list.
    pub fn dest_page_index(&self, dest: &PdfObject) -> Option<usize> {
        self.dest_page_index_inner(dest, 0)
    }

    fn dest_page_index_inner(&self, dest: &PdfObject, depth: usize) -> Option<usize> {
        if depth > 4 {
            return None;
        }
        let resolved = self.resolve(dest).ok()?;
        match resolved.as_ref() {
            PdfObject::Str(s) => {
                let named = self.get_dest(s).ok()?;
                self.dest_page_index_inner(&named, depth + 1)
            }
            PdfObject::Name(n) => {
                let named = self.get_dest(n.as_bytes()).ok()?;
                self.dest_page_index_inner(&named, depth + 1)
            }
            PdfObject::Dict(d) => self.dest_page_index_inner(d.get("D")?, depth + 1),
            PdfObject::Array(arr) => {
                let target = self.resolve(arr.first()?).ok()?;
                self.find_page_by_identity(&target)
            }
            _ => None,
        }
    }

    fn find_page_by_identity(&self, target: &Arc<PdfObject>) -> Option<usize> {
        let index = self.page_index();
        (0..index.len()).find(|&i| {
            index
                .objid_at(i)
                .and_then(|objid| self.getobj_shared(objid).ok())
                .is_some_and(|obj| Arc::ptr_eq(&obj, target))
        })
    }

    /// Walk the document outline tree. Entries whose destination cannot be
    /// matched to a page are dropped; their children are still visited.
    pub fn outline(&self) -> Vec<OutlineEntry> {
        let mut entries = Vec::new();
        let Some(outlines_ref) = self.catalog.get("Outlines") else {
            return entries;
        };
        let Ok(outlines) = self.resolve(outlines_ref) else {
            return entries;
        };
        let Ok(dict) = outlines.as_dict() else {
            return entries;
        };
        let mut visited = HashSet::new();
        if let Some(first) = dict.get("First") {
            self.walk_outline(first, 0, &mut visited, &mut entries);
        }
        entries
    }

    fn walk_outline(
        &self,
        item_ref: &PdfObject,
        level: usize,
        visited: &mut HashSet<u32>,
        out: &mut Vec<OutlineEntry>,
    ) {
        let mut current = Some(item_ref.clone());
        while let Some(node) = current {
            if let Ok(r) = node.as_reference()
                && !visited.insert(r.objid)
            {
                return;
            }
            let Ok(item) = self.resolve(&node) else {
                return;
            };
            let Ok(dict) = item.as_dict() else {
                return;
            };

            let title = dict
                .get("Title")
                .and_then(|t| self.resolve(t).ok())
                .and_then(|t| t.as_str().ok().map(decode_text))
                .unwrap_or_default();

            let dest_obj = if let Some(d) = dict.get("Dest") {
                Some(d.clone())
            } else {
                dict.get("A")
                    .and_then(|a| self.resolve(a).ok())
                    .and_then(|action| {
                        let adict = action.as_dict().ok()?;
                        match adict.get("S") {
                            Some(PdfObject::Name(n)) if n != "GoTo" => None,
                            _ => adict.get("D").cloned(),
                        }
                    })
            };

            if let Some(dest) = dest_obj
                && let Some(page_index) = self.dest_page_index(&dest)
            {
                out.push(OutlineEntry {
                    title,
                    page_index,
                    level,
                });
            }

            if let Some(first) = dict.get("First") {
                self.walk_outline(first, level + 1, visited, out);
            }
            current = dict.get("Next").cloned();
        }
    }
}

fn skip_ws(data: &[u8], pos: usize) -> usize {
    let mut p = pos.min(data.len());
    while p < data.len() && matches!(data[p], b' ' | b'\t' | b'\r' | b'\n' | b'\x00') {
        p += 1;
    }
    p
}

/// Read a decimal number; returns (value, position past the digits).
fn read_uint(data: &[u8], pos: usize) -> Result<(u64, usize)> {
    let start = pos.min(data.len());
    let mut p = start;
    let mut value: u64 = 0;
    while p < data.len() && data[p].is_ascii_digit() {
        value = value.saturating_mul(10).saturating_add((data[p] - b'0') as u64);
        p += 1;
    }
    if p == start {
        return Err(PdfError::Syntax {
            pos: start,
            msg: "expected number".into(),
        });
    }
    Ok((value, p))
}

fn read_be_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

/// Find the end of stream data: the `endstream` keyword, with any directly
/// preceding end-of-line whitespace trimmed off.
fn find_endstream(data: &[u8]) -> Option<usize> {
    let needle = b"endstream";
    let pos = data.windows(needle.len()).position(|w| w == needle)?;
    let mut end = pos;
    while end > 0 && matches!(data[end - 1], b' ' | b'\r' | b'\n') {
        end -= 1;
    }
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_uint_consumes_digits() {
        assert_eq!(read_uint(b"123 rest", 0).unwrap(), (123, 3));
        assert!(read_uint(b"abc", 0).is_err());
    }

    #[test]
    fn find_endstream_trims_eol() {
        assert_eq!(find_endstream(b"abc\r\nendstream"), Some(3));
        assert_eq!(find_endstream(b"abcendstream"), Some(3));
        assert_eq!(find_endstream(b"abc"), None);
    }

    #[test]
    fn read_be_int_widths() {
        assert_eq!(read_be_int(&[0x01]), 1);
        assert_eq!(read_be_int(&[0x01, 0x00]), 256);
        assert_eq!(read_be_int(&[]), 0);
    }
}
