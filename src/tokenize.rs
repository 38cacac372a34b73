// SPDX-License-Identifier: Apache-2.0

//! JSON token cursor
//!
//! A pull parser over a padded byte buffer. Each call to [`Parser::next_token`] moves
//! one token forward: the structural index supplies the next interesting byte, a flat
//! state machine over (current token, innermost scope) decides what it means, and
//! values are only decoded when the caller asks for them.
//!
//! No DOM is built. Strings without escapes are handed out as slices of the input;
//! escaped strings are unescaped into a scratch buffer owned by the parser. Both kinds
//! of slice borrow the parser, so they cannot outlive the next call to `next_token`.
//!
//! ```rust
//! use hwkit::{PaddedBuffer, ParserFactory, Token};
//!
//! let json = PaddedBuffer::from_slice(br#"{"id": 7}"#)?;
//! let factory = ParserFactory::new();
//! let mut parser = factory.create_parser(json.as_input())?;
//!
//! assert_eq!(parser.next_token(), Token::StartObject);
//! assert_eq!(parser.next_token(), Token::FieldName);
//! assert_eq!(parser.current_name(), b"id");
//! assert_eq!(parser.next_token(), Token::ValueNumber);
//! assert_eq!(parser.long_value(), 7);
//! assert_eq!(parser.next_token(), Token::EndObject);
//! assert_eq!(parser.next_token(), Token::End);
//! # Ok::<(), hwkit::HwkitError>(())
//! ```

use log::{debug, trace};

use crate::classify::classify_value_start;
use crate::constants::{scratch_capacity, JSON_PADDING};
use crate::scanner::StructuralIndex;
use crate::strings;
use crate::types::{HwkitError, NumberType, ParserConfig, Result, Token};

// =============================================================================
// PADDED INPUT
// =============================================================================

/// A JSON document copied into an allocation with [`JSON_PADDING`] zeroed bytes after it.
#[derive(Debug, Clone)]
pub struct PaddedBuffer {
    bytes: Vec<u8>,
    len: usize,
}

impl PaddedBuffer {
    pub fn from_slice(json: &[u8]) -> Result<Self> {
        let capacity = json.len() + JSON_PADDING;
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(capacity)?;
        bytes.extend_from_slice(json);
        bytes.resize(capacity, 0);
        Ok(Self {
            bytes,
            len: json.len(),
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the whole allocation, padding included.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn as_input(&self) -> PaddedInput<'_> {
        PaddedInput {
            bytes: &self.bytes,
            len: self.len,
        }
    }
}

/// A borrowed document: `len` bytes of content inside an allocation of `bytes.len()`
/// bytes that is at least [`JSON_PADDING`] larger.
#[derive(Debug, Clone, Copy)]
pub struct PaddedInput<'a> {
    bytes: &'a [u8],
    len: usize,
}

impl<'a> PaddedInput<'a> {
    pub fn new(bytes: &'a [u8], len: usize) -> Result<Self> {
        if bytes.len() < len.saturating_add(JSON_PADDING) {
            return Err(HwkitError::InvalidInput(format!(
                "buffer of {} bytes cannot hold {} bytes of content plus {} bytes of padding",
                bytes.len(),
                len,
                JSON_PADDING
            )));
        }
        Ok(Self { bytes, len })
    }

    /// The document content, without padding.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        &self.bytes[..self.len]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

// =============================================================================
// FACTORY
// =============================================================================

/// Creates parsers that share one configuration.
#[derive(Debug, Clone, Default)]
pub struct ParserFactory {
    config: ParserConfig,
}

impl ParserFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Bind a new parser to `input`. Fails only if scratch space cannot be reserved.
    pub fn create_parser<'a>(&self, input: PaddedInput<'a>) -> Result<Parser<'a>> {
        trace!(
            "CREATE_PARSER: len={}, capacity={}",
            input.len(),
            input.capacity()
        );
        let mut parser = Parser {
            input,
            index: StructuralIndex::new(),
            token: Token::Begin,
            value_pos: 0,
            scopes: Vec::new(),
            name: Vec::new(),
            name_text: Text::Scratch,
            value: Vec::new(),
            scratch_capacity: 0,
            last_error: None,
            max_depth: self.config.max_depth,
        };
        parser.bind(input)?;
        Ok(parser)
    }
}

// =============================================================================
// CURSOR
// =============================================================================

/// One open container. The count is the number of fields or items seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Object { fields: u32 },
    Array { items: u32 },
}

/// Where the bytes of a decoded string live.
#[derive(Debug, Clone, Copy)]
enum Text {
    Input { start: usize, end: usize },
    Scratch,
}

pub struct Parser<'a> {
    input: PaddedInput<'a>,
    index: StructuralIndex,
    token: Token,
    // Offset of the first byte of the current value.
    value_pos: usize,
    scopes: Vec<Scope>,
    name: Vec<u8>,
    name_text: Text,
    value: Vec<u8>,
    scratch_capacity: usize,
    last_error: Option<String>,
    max_depth: usize,
}

impl std::fmt::Debug for Parser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("token", &self.token)
            .field("depth", &self.depth())
            .field("len", &self.input.len())
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

fn syntax(message: impl Into<String>) -> HwkitError {
    HwkitError::Syntax(message.into())
}

fn ensure_capacity(buf: &mut Vec<u8>, wanted: usize) -> Result<()> {
    if buf.capacity() < wanted {
        buf.try_reserve_exact(wanted - buf.len())?;
    }
    Ok(())
}

impl<'a> Parser<'a> {
    /// Point the parser at a new document and reset it to `BEGIN`.
    ///
    /// Scratch buffers only grow. When they do, slices handed out for the previous
    /// document are gone; the borrow checker already rules out holding them here,
    /// but FFI callers must drop their pointers.
    pub fn rebind(&mut self, input: PaddedInput<'a>) -> Result<()> {
        self.bind(input)
    }

    fn bind(&mut self, input: PaddedInput<'a>) -> Result<()> {
        // Reserve everything before touching any state.
        let wanted = scratch_capacity(input.capacity());
        if wanted > self.scratch_capacity {
            ensure_capacity(&mut self.name, wanted)?;
            ensure_capacity(&mut self.value, wanted)?;
            self.scratch_capacity = wanted;
        }
        self.index.build(input.data())?;

        self.input = input;
        self.token = Token::Begin;
        self.value_pos = 0;
        self.scopes.clear();
        self.name.clear();
        self.name_text = Text::Scratch;
        self.value.clear();
        self.last_error = None;
        Ok(())
    }

    #[inline]
    pub fn current_token(&self) -> Token {
        self.token
    }

    /// Nesting level of the current token. A container counts from its start token
    /// up to, not including, its end token.
    #[inline]
    pub fn depth(&self) -> usize {
        self.scopes.len() + matches!(self.token, Token::StartObject | Token::StartArray) as usize
    }

    /// Fields or items consumed so far in the innermost container.
    pub fn scope_entries(&self) -> usize {
        match self.scopes.last() {
            Some(Scope::Object { fields }) => *fields as usize,
            Some(Scope::Array { items }) => *items as usize,
            None => 0,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bytes reserved for each scratch buffer.
    pub fn scratch_capacity(&self) -> usize {
        self.scratch_capacity
    }

    /// Move to the next token. `END` and `ERROR` are sticky.
    pub fn next_token(&mut self) -> Token {
        let step = match self.token {
            Token::End | Token::Error => return self.token,
            Token::Begin => self.begin(),
            Token::StartObject => self.enter_object(),
            Token::StartArray => self.enter_array(),
            Token::FieldName => self.after_field_name(),
            Token::ValueString
            | Token::ValueNumber
            | Token::ValueBoolean
            | Token::ValueNull
            | Token::EndObject
            | Token::EndArray => self.after_value(),
        };
        match step {
            Ok(token) => self.token = token,
            Err(err) => {
                debug!("json cursor failed: {}", err);
                self.last_error = Some(err.message().to_string());
                self.token = Token::Error;
            }
        }
        self.token
    }

    /// On `START_OBJECT`/`START_ARRAY`, advance to the matching end token.
    /// Any other token is left as is.
    pub fn skip_children(&mut self) -> Token {
        if !matches!(self.token, Token::StartObject | Token::StartArray) {
            return self.token;
        }
        let mut open = 1usize;
        while open > 0 {
            match self.next_token() {
                Token::StartObject | Token::StartArray => open += 1,
                Token::EndObject | Token::EndArray => open -= 1,
                Token::End | Token::Error => break,
                _ => {}
            }
        }
        self.token
    }

    // -------------------------------------------------------------------------
    // transitions
    // -------------------------------------------------------------------------

    fn begin(&mut self) -> Result<Token> {
        if let Some(err) = self.index.error() {
            return Err(syntax(err));
        }
        let pos = self
            .index
            .advance()
            .ok_or_else(|| syntax("document is empty"))?;
        match self.byte(pos) {
            b'{' => {
                if !self.closes_document(b'}') {
                    return Err(syntax("starting brace unmatched"));
                }
                self.value_pos = pos;
                Ok(Token::StartObject)
            }
            b'[' => {
                if !self.closes_document(b']') {
                    return Err(syntax("starting bracket unmatched"));
                }
                self.value_pos = pos;
                Ok(Token::StartArray)
            }
            _ => self.classify_at(pos),
        }
    }

    fn enter_object(&mut self) -> Result<Token> {
        self.push_scope(Scope::Object { fields: 0 })?;
        let pos = self.next_structural()?;
        match self.byte(pos) {
            b'"' => self.read_key(pos),
            b'}' => {
                self.scopes.pop();
                Ok(Token::EndObject)
            }
            _ => Err(syntax("Object does not start with a key")),
        }
    }

    fn enter_array(&mut self) -> Result<Token> {
        self.push_scope(Scope::Array { items: 0 })?;
        let pos = self.next_structural()?;
        if self.byte(pos) == b']' {
            self.scopes.pop();
            return Ok(Token::EndArray);
        }
        self.count_entry();
        self.classify_at(pos)
    }

    fn after_field_name(&mut self) -> Result<Token> {
        let pos = self.next_structural()?;
        if self.byte(pos) != b':' {
            return Err(syntax("Missing colon after key in object"));
        }
        let pos = self.next_structural()?;
        self.classify_at(pos)
    }

    fn after_value(&mut self) -> Result<Token> {
        let Some(scope) = self.scopes.last().copied() else {
            return Ok(Token::End);
        };
        let pos = self.next_structural()?;
        match (scope, self.byte(pos)) {
            (Scope::Object { .. }, b',') => {
                let pos = self.next_structural()?;
                if self.byte(pos) != b'"' {
                    return Err(syntax("Missing key after comma in object"));
                }
                self.read_key(pos)
            }
            (Scope::Object { .. }, b'}') => {
                self.scopes.pop();
                Ok(Token::EndObject)
            }
            (Scope::Object { .. }, _) => Err(syntax("Missing comma between object fields")),
            (Scope::Array { .. }, b',') => {
                let pos = self.next_structural()?;
                self.count_entry();
                self.classify_at(pos)
            }
            (Scope::Array { .. }, b']') => {
                self.scopes.pop();
                Ok(Token::EndArray)
            }
            (Scope::Array { .. }, _) => Err(syntax("Missing comma between array values")),
        }
    }

    // -------------------------------------------------------------------------
    // helpers
    // -------------------------------------------------------------------------

    #[inline]
    fn byte(&self, pos: usize) -> u8 {
        self.input.data()[pos]
    }

    #[inline]
    fn next_structural(&mut self) -> Result<usize> {
        self.index
            .advance()
            .ok_or_else(|| syntax("unexpected end of document"))
    }

    fn closes_document(&self, close: u8) -> bool {
        self.index.is_balanced() && self.index.last().map(|p| self.byte(p)) == Some(close)
    }

    fn classify_at(&mut self, pos: usize) -> Result<Token> {
        let b = self.byte(pos);
        let token = classify_value_start(b).ok_or_else(|| {
            syntax(format!(
                "unrecognized token '{}' at byte {}",
                b.escape_ascii(),
                pos
            ))
        })?;
        self.value_pos = pos;
        Ok(token)
    }

    fn push_scope(&mut self, scope: Scope) -> Result<()> {
        if self.scopes.len() >= self.max_depth {
            return Err(syntax(format!(
                "Exceeded maximum nesting depth of {}",
                self.max_depth
            )));
        }
        self.scopes.push(scope);
        Ok(())
    }

    fn count_entry(&mut self) {
        match self.scopes.last_mut() {
            Some(Scope::Object { fields }) => *fields += 1,
            Some(Scope::Array { items }) => *items += 1,
            None => {}
        }
    }

    fn read_key(&mut self, quote: usize) -> Result<Token> {
        let data = self.input.data();
        let start = quote + 1;
        let (end, escaped) = strings::string_span(data, start)
            .ok_or_else(|| syntax(format!("unterminated key at byte {}", quote)))?;
        if escaped {
            self.name.clear();
            strings::unescape_into(data, start, &mut self.name)
                .map_err(|e| syntax(format!("invalid key: {}", e.message())))?;
            self.name_text = Text::Scratch;
        } else {
            self.name_text = Text::Input { start, end };
        }
        self.value_pos = quote;
        self.count_entry();
        Ok(Token::FieldName)
    }

    fn value_text(&self, text: Text) -> &[u8] {
        match text {
            Text::Input { start, end } => &self.input.data()[start..end],
            Text::Scratch => &self.value,
        }
    }

    fn record(&mut self, err: HwkitError) {
        debug!("value decode failed: {}", err);
        self.last_error = Some(err.message().to_string());
    }

    // -------------------------------------------------------------------------
    // values
    // -------------------------------------------------------------------------

    /// Name of the most recent `FIELD_NAME`, unescaped.
    pub fn current_name(&self) -> &[u8] {
        match self.name_text {
            Text::Input { start, end } => &self.input.data()[start..end],
            Text::Scratch => &self.name,
        }
    }

    fn expect(&self, token: Token, what: &str) -> Result<()> {
        if self.token != token {
            return Err(HwkitError::Decode(format!(
                "current token {:?} is not {}",
                self.token, what
            )));
        }
        Ok(())
    }

    fn decode_string(&mut self) -> Result<Text> {
        self.expect(Token::ValueString, "a string")?;
        let data = self.input.data();
        let start = self.value_pos + 1;
        let (end, escaped) = strings::string_span(data, start)
            .ok_or_else(|| HwkitError::Decode("unterminated string".to_string()))?;
        if !escaped {
            return Ok(Text::Input { start, end });
        }
        self.value.clear();
        strings::unescape_into(data, start, &mut self.value)?;
        Ok(Text::Scratch)
    }

    /// Unescaped bytes of the current `VALUE_STRING`.
    pub fn try_string_value(&mut self) -> Result<&[u8]> {
        let text = self.decode_string()?;
        Ok(self.value_text(text))
    }

    /// Like [`Self::try_string_value`], additionally checked to be UTF-8.
    pub fn try_str(&mut self) -> Result<&str> {
        let text = self.decode_string()?;
        std::str::from_utf8(self.value_text(text))
            .map_err(|e| HwkitError::Decode(e.to_string()))
    }

    /// Unescaped bytes of the current `VALUE_STRING`, or an empty slice with the
    /// failure recorded in [`Self::last_error`].
    pub fn string_value(&mut self) -> &[u8] {
        match self.decode_string() {
            Ok(text) => self.value_text(text),
            Err(err) => {
                self.record(err);
                &[]
            }
        }
    }

    pub fn try_long_value(&self) -> Result<i64> {
        self.expect(Token::ValueNumber, "a number")?;
        strings::parse_i64(self.input.data(), self.value_pos)
    }

    /// The current number as `i64`, or 0 with the failure recorded.
    pub fn long_value(&mut self) -> i64 {
        match self.try_long_value() {
            Ok(v) => v,
            Err(err) => {
                self.record(err);
                0
            }
        }
    }

    pub fn try_double_value(&self) -> Result<f64> {
        self.expect(Token::ValueNumber, "a number")?;
        strings::parse_f64(self.input.data(), self.value_pos)
    }

    /// The current number as `f64`, or 0.0 with the failure recorded.
    pub fn double_value(&mut self) -> f64 {
        match self.try_double_value() {
            Ok(v) => v,
            Err(err) => {
                self.record(err);
                0.0
            }
        }
    }

    pub fn try_boolean_value(&self) -> Result<bool> {
        self.expect(Token::ValueBoolean, "a boolean")?;
        strings::parse_bool(self.input.data(), self.value_pos)
    }

    /// The current boolean, or `false` with the failure recorded.
    pub fn boolean_value(&mut self) -> bool {
        match self.try_boolean_value() {
            Ok(v) => v,
            Err(err) => {
                self.record(err);
                false
            }
        }
    }

    pub fn number_type(&self) -> Result<NumberType> {
        self.expect(Token::ValueNumber, "a number")?;
        strings::number_type(self.input.data(), self.value_pos)
    }
}
