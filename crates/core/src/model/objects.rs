//! PDF object types.

use crate::error::{PdfError, Result};
use crate::utils::Rect;
use bytes::Bytes;
use std::collections::HashMap;

/// A PDF dictionary: name keys mapped to objects.
pub type Dict = HashMap<String, PdfObject>;

/// The fundamental PDF value type.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    /// Null object
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Real (floating point) value
    Real(f64),
    /// Name object (e.g., /Type, /Subtype)
    Name(String),
    /// String (raw bytes; encoding is context-dependent)
    Str(Vec<u8>),
    /// Array of objects
    Array(Vec<Self>),
    /// Dictionary
    Dict(Dict),
    /// Stream (dictionary + raw bytes)
    Stream(Box<PdfStream>),
    /// Indirect object reference
    Ref(ObjRef),
}

impl PdfObject {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn as_bool(&self) -> Result<bool> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(self.type_error("bool")),
        }
    }

    pub const fn as_int(&self) -> Result<i64> {
        match self {
            Self::Int(n) => Ok(*n),
            _ => Err(self.type_error("int")),
        }
    }

    /// Numeric value, coercing integers to f64.
    pub const fn as_num(&self) -> Result<f64> {
        match self {
            Self::Int(n) => Ok(*n as f64),
            Self::Real(n) => Ok(*n),
            _ => Err(self.type_error("number")),
        }
    }

    pub fn as_name(&self) -> Result<&str> {
        match self {
            Self::Name(s) => Ok(s),
            _ => Err(self.type_error("name")),
        }
    }

    pub fn as_str(&self) -> Result<&[u8]> {
        match self {
            Self::Str(s) => Ok(s),
            _ => Err(self.type_error("string")),
        }
    }

    pub const fn as_array(&self) -> Result<&Vec<Self>> {
        match self {
            Self::Array(arr) => Ok(arr),
            _ => Err(self.type_error("array")),
        }
    }

    pub const fn as_dict(&self) -> Result<&Dict> {
        match self {
            Self::Dict(d) => Ok(d),
            _ => Err(self.type_error("dict")),
        }
    }

    pub fn as_stream(&self) -> Result<&PdfStream> {
        match self {
            Self::Stream(s) => Ok(s),
            _ => Err(self.type_error("stream")),
        }
    }

    pub const fn as_reference(&self) -> Result<&ObjRef> {
        match self {
            Self::Ref(r) => Ok(r),
            _ => Err(self.type_error("ref")),
        }
    }

    const fn type_error(&self, expected: &'static str) -> PdfError {
        PdfError::TypeError {
            expected,
            got: self.type_name(),
        }
    }

    const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Name(_) => "name",
            Self::Str(_) => "string",
            Self::Array(_) => "array",
            Self::Dict(_) => "dict",
            Self::Stream(_) => "stream",
            Self::Ref(_) => "ref",
        }
    }
}

/// Look up a required dictionary key.
pub fn require<'a>(dict: &'a Dict, key: &str) -> Result<&'a PdfObject> {
    dict.get(key).ok_or_else(|| PdfError::KeyError(key.into()))
}

/// A PDF indirect object reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjRef {
    pub objid: u32,
    pub genno: u32,
}

impl ObjRef {
    pub const fn new(objid: u32, genno: u32) -> Self {
        Self { objid, genno }
    }
}

/// A PDF stream: attribute dictionary plus raw (still encoded) bytes.
///
/// The bytes are a zero-copy slice of the document buffer. Filter decoding
/// is performed by the document, which can resolve indirect filter entries.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    pub attrs: Dict,
    raw: Bytes,
}

impl PdfStream {
    pub fn new(attrs: Dict, raw: impl Into<Bytes>) -> Self {
        Self {
            attrs,
            raw: raw.into(),
        }
    }

    /// Raw (undecoded) stream bytes.
    pub fn rawdata(&self) -> &[u8] {
        self.raw.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&PdfObject> {
        self.attrs.get(name)
    }
}

/// Lenient numeric conversion; `None` for non-numbers.
pub fn safe_num(obj: &PdfObject) -> Option<f64> {
    match obj {
        PdfObject::Int(n) => Some(*n as f64),
        PdfObject::Real(n) => Some(*n),
        _ => None,
    }
}

/// Lenient rectangle conversion from a 4-element numeric array.
pub fn safe_rect(obj: &PdfObject) -> Option<Rect> {
    let arr = match obj {
        PdfObject::Array(arr) if arr.len() >= 4 => arr,
        _ => return None,
    };
    Some((
        safe_num(&arr[0])?,
        safe_num(&arr[1])?,
        safe_num(&arr[2])?,
        safe_num(&arr[3])?,
    ))
}
