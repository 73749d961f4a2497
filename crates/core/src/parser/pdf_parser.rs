//! PDF object and content-stream parsing on top of the lexer.

use crate::error::{PdfError, Result};
use crate::model::{Dict, ObjRef, PdfObject};
use crate::parser::lexer::{Keyword, Lexer, Token};

/// Maximum inline nesting depth for arrays and dictionaries.
///
/// Indirect references do not count: reference cycles are legal PDF and are
/// handled at resolution time, not here.
pub const MAX_NESTING: usize = 64;

/// Parses PDF objects from a byte buffer.
///
/// Each `parse_object` call consumes exactly the tokens that constitute one
/// object. `objid genno R` sequences fold into [`PdfObject::Ref`] via
/// two-token lookahead.
pub struct ObjectParser<'a> {
    lexer: Lexer<'a>,
    lookahead: Vec<Token>,
}

impl<'a> ObjectParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            lexer: Lexer::new(data),
            lookahead: Vec::new(),
        }
    }

    /// Current lexer position (past the last consumed token).
    pub fn tell(&self) -> usize {
        self.lexer.tell()
    }

    /// Unconsumed remainder of the buffer.
    pub fn remaining(&self) -> &'a [u8] {
        self.lexer.remaining()
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(tok) = self.lookahead.pop() {
            return Ok(Some(tok));
        }
        match self.lexer.next_token() {
            Some(Ok((_, tok))) => Ok(Some(tok)),
            Some(Err(e)) => Err(e),
            None => Ok(None),
        }
    }

    fn push_back(&mut self, tok: Token) {
        self.lookahead.push(tok);
    }

    /// Parse the next object from the stream.
    pub fn parse_object(&mut self) -> Result<PdfObject> {
        let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
        self.token_to_object(token, 0)
    }

    fn token_to_object(&mut self, token: Token, depth: usize) -> Result<PdfObject> {
        match token {
            Token::Int(n) => {
                // Possible indirect reference: objid genno R.
                if n >= 0
                    && let Ok(Some(tok2)) = self.next_token()
                {
                    if let Token::Int(m) = tok2 {
                        if m >= 0
                            && let Ok(Some(tok3)) = self.next_token()
                        {
                            if tok3 == Token::Keyword(Keyword::R) {
                                return Ok(PdfObject::Ref(ObjRef::new(n as u32, m as u32)));
                            }
                            self.push_back(tok3);
                        }
                        self.push_back(Token::Int(m));
                    } else {
                        self.push_back(tok2);
                    }
                }
                Ok(PdfObject::Int(n))
            }
            Token::Real(n) => Ok(PdfObject::Real(n)),
            Token::Bool(b) => Ok(PdfObject::Bool(b)),
            Token::Name(s) => Ok(PdfObject::Name(s)),
            Token::Str(s) => Ok(PdfObject::Str(s)),
            Token::Keyword(Keyword::Null) => Ok(PdfObject::Null),
            Token::Keyword(Keyword::ArrayStart) => self.parse_array(depth + 1),
            Token::Keyword(Keyword::DictStart) => self.parse_dict(depth + 1),
            Token::Keyword(kw) => Err(PdfError::Syntax {
                pos: self.lexer.tell(),
                msg: format!(
                    "unexpected keyword: {}",
                    String::from_utf8_lossy(kw.as_bytes())
                ),
            }),
        }
    }

    fn parse_array(&mut self, depth: usize) -> Result<PdfObject> {
        if depth > MAX_NESTING {
            return Err(PdfError::StructureTooDeep(MAX_NESTING));
        }
        let mut arr = Vec::new();
        loop {
            let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
            if token == Token::Keyword(Keyword::ArrayEnd) {
                break;
            }
            arr.push(self.token_to_object(token, depth)?);
        }
        Ok(PdfObject::Array(arr))
    }

    fn parse_dict(&mut self, depth: usize) -> Result<PdfObject> {
        if depth > MAX_NESTING {
            return Err(PdfError::StructureTooDeep(MAX_NESTING));
        }
        let mut dict = Dict::new();
        loop {
            let token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
            if token == Token::Keyword(Keyword::DictEnd) {
                break;
            }
            let key = match token {
                Token::Name(name) => name,
                _ => {
                    return Err(PdfError::Syntax {
                        pos: self.lexer.tell(),
                        msg: "expected name as dict key".into(),
                    });
                }
            };
            let value_token = self.next_token()?.ok_or(PdfError::UnexpectedEof)?;
            let value = self.token_to_object(value_token, depth)?;
            dict.insert(key, value);
        }
        Ok(PdfObject::Dict(dict))
    }
}

/// One content-stream operation: operator plus its operands.
#[derive(Debug, Clone)]
pub struct Operation {
    pub operator: Vec<u8>,
    pub operands: Vec<PdfObject>,
}

/// Splits a content stream into a flat sequence of [`Operation`]s.
///
/// Inline arrays and dicts are assembled via a context stack; inline images
/// (`BI` .. `ID` .. `EI`) are skipped wholesale, since their binary payload
/// is not lexable.
pub struct ContentParser;

impl ContentParser {
    pub fn parse(data: &[u8]) -> Result<Vec<Operation>> {
        let mut lexer = Lexer::new(data);
        let mut ops = Vec::new();
        let mut operands: Vec<PdfObject> = Vec::new();
        let mut context: Vec<Vec<PdfObject>> = Vec::new();

        while let Some(result) = lexer.next_token() {
            let (_, token) = result?;

            let kw = match token {
                Token::Int(n) => {
                    operands.push(PdfObject::Int(n));
                    continue;
                }
                Token::Real(n) => {
                    operands.push(PdfObject::Real(n));
                    continue;
                }
                Token::Bool(b) => {
                    operands.push(PdfObject::Bool(b));
                    continue;
                }
                Token::Name(s) => {
                    operands.push(PdfObject::Name(s));
                    continue;
                }
                Token::Str(s) => {
                    operands.push(PdfObject::Str(s));
                    continue;
                }
                Token::Keyword(kw) => kw,
            };

            match kw {
                Keyword::Null => operands.push(PdfObject::Null),
                Keyword::ArrayStart | Keyword::DictStart => {
                    context.push(std::mem::take(&mut operands));
                }
                Keyword::ArrayEnd => {
                    let contents = std::mem::take(&mut operands);
                    operands = context.pop().unwrap_or_default();
                    operands.push(PdfObject::Array(contents));
                }
                Keyword::DictEnd => {
                    let contents = std::mem::take(&mut operands);
                    operands = context.pop().unwrap_or_default();
                    operands.push(PdfObject::Dict(pairs_to_dict(contents)));
                }
                Keyword::Other(op) if op == b"BI" => {
                    // Skip the inline image: its params, the raw data after
                    // ID, and the closing EI.
                    match lexer.find_forward(b"EI") {
                        Some(pos) => lexer.set_pos(pos + 2),
                        None => break,
                    }
                    operands.clear();
                }
                kw => {
                    ops.push(Operation {
                        operator: kw.as_bytes().to_vec(),
                        operands: std::mem::take(&mut operands),
                    });
                }
            }
        }

        Ok(ops)
    }
}

/// Build a dict from an even-length [name, value, ...] sequence.
fn pairs_to_dict(items: Vec<PdfObject>) -> Dict {
    let mut dict = Dict::new();
    let mut iter = items.into_iter();
    while let Some(key) = iter.next() {
        if let PdfObject::Name(name) = key
            && let Some(value) = iter.next()
        {
            dict.insert(name, value);
        }
    }
    dict
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scalars() {
        let mut p = ObjectParser::new(b"42 3.5 /Name (str) true null");
        assert_eq!(p.parse_object().unwrap(), PdfObject::Int(42));
        assert_eq!(p.parse_object().unwrap(), PdfObject::Real(3.5));
        assert_eq!(p.parse_object().unwrap(), PdfObject::Name("Name".into()));
        assert_eq!(p.parse_object().unwrap(), PdfObject::Str(b"str".to_vec()));
        assert_eq!(p.parse_object().unwrap(), PdfObject::Bool(true));
        assert_eq!(p.parse_object().unwrap(), PdfObject::Null);
    }

    #[test]
    fn parses_indirect_reference() {
        let mut p = ObjectParser::new(b"12 0 R");
        assert_eq!(
            p.parse_object().unwrap(),
            PdfObject::Ref(ObjRef::new(12, 0))
        );
    }

    #[test]
    fn two_ints_are_not_a_reference() {
        let mut p = ObjectParser::new(b"12 0 7");
        assert_eq!(p.parse_object().unwrap(), PdfObject::Int(12));
        assert_eq!(p.parse_object().unwrap(), PdfObject::Int(0));
        assert_eq!(p.parse_object().unwrap(), PdfObject::Int(7));
    }

    #[test]
    fn parses_dict_with_nested_array() {
        let mut p = ObjectParser::new(b"<< /Kids [1 0 R 2 0 R] /Count 2 >>");
        let obj = p.parse_object().unwrap();
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict.get("Count"), Some(&PdfObject::Int(2)));
        let kids = dict.get("Kids").unwrap().as_array().unwrap();
        assert_eq!(kids.len(), 2);
        assert_eq!(kids[0], PdfObject::Ref(ObjRef::new(1, 0)));
    }

    #[test]
    fn nesting_cap_is_enforced() {
        let mut data = Vec::new();
        data.extend(std::iter::repeat_n(b'[', 70));
        data.extend(std::iter::repeat_n(b']', 70));
        let mut p = ObjectParser::new(&data);
        assert!(matches!(
            p.parse_object(),
            Err(PdfError::StructureTooDeep(MAX_NESTING))
        ));
    }

    #[test]
    fn nesting_below_cap_is_fine() {
        let mut data = Vec::new();
        data.extend(std::iter::repeat_n(b'[', 60));
        data.extend(std::iter::repeat_n(b']', 60));
        let mut p = ObjectParser::new(&data);
        assert!(p.parse_object().is_ok());
    }

    #[test]
    fn content_operations() {
        let ops = ContentParser::parse(b"BT /F1 12 Tf 100 700 Td (Hi) Tj ET").unwrap();
        let names: Vec<&[u8]> = ops.iter().map(|o| o.operator.as_slice()).collect();
        assert_eq!(names, vec![b"BT" as &[u8], b"Tf", b"Td", b"Tj", b"ET"]);
        assert_eq!(ops[1].operands.len(), 2);
        assert_eq!(ops[3].operands, vec![PdfObject::Str(b"Hi".to_vec())]);
    }

    #[test]
    fn content_array_operand() {
        let ops = ContentParser::parse(b"[(A) -120 (B)] TJ").unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].operator, b"TJ");
        let arr = ops[0].operands[0].as_array().unwrap();
        assert_eq!(arr.len(), 3);
    }

    #[test]
    fn inline_image_is_skipped() {
        let ops =
            ContentParser::parse(b"q BI /W 1 /H 1 ID \x00\xff\x00 EI Q (x) Tj").unwrap();
        let names: Vec<&[u8]> = ops.iter().map(|o| o.operator.as_slice()).collect();
        assert_eq!(names, vec![b"q" as &[u8], b"Q", b"Tj"]);
    }
}
