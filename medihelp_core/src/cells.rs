//! Encoding of container-typed cells in the medicines CSV file.
//!
//! Cells are written as JSON documents: string sets as sorted arrays
//! (`["cold","flu"]`), recipient sets as integer arrays (`[0,1]`) and notes as
//! an object keyed by author id (`{"1":"text"}`).
//!
//! Older files stored literal set/dict syntax (`{'cold', 'flu'}`, `set()`,
//! `{1: 'text'}`); the decoders still accept that form.

use crate::types::UserId;
use crate::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

pub fn encode_string_set(set: &BTreeSet<String>) -> Result<String> {
    Ok(serde_json::to_string(set)?)
}

pub fn encode_id_set(set: &BTreeSet<UserId>) -> Result<String> {
    Ok(serde_json::to_string(set)?)
}

pub fn encode_notes(notes: &BTreeMap<UserId, String>) -> Result<String> {
    Ok(serde_json::to_string(notes)?)
}

pub fn decode_string_set(cell: &str) -> Result<Vec<String>> {
    let cell = cell.trim();
    if let Ok(set) = serde_json::from_str::<Vec<String>>(cell) {
        return Ok(set);
    }
    match parse_literal(cell)? {
        Literal::Seq(items) => items
            .into_iter()
            .map(|item| match item {
                Literal::Str(s) => Ok(s),
                _ => Err(invalid(cell)),
            })
            .collect(),
        Literal::Map(entries) if entries.is_empty() => Ok(Vec::new()),
        _ => Err(invalid(cell)),
    }
}

pub fn decode_id_set(cell: &str) -> Result<Vec<UserId>> {
    let cell = cell.trim();
    if let Ok(set) = serde_json::from_str::<Vec<UserId>>(cell) {
        return Ok(set);
    }
    match parse_literal(cell)? {
        Literal::Seq(items) => items
            .into_iter()
            .map(|item| as_id(item).ok_or_else(|| invalid(cell)))
            .collect(),
        Literal::Map(entries) if entries.is_empty() => Ok(Vec::new()),
        _ => Err(invalid(cell)),
    }
}

pub fn decode_notes(cell: &str) -> Result<BTreeMap<UserId, String>> {
    let cell = cell.trim();
    if let Ok(notes) = serde_json::from_str::<BTreeMap<UserId, String>>(cell) {
        return Ok(notes);
    }
    match parse_literal(cell)? {
        Literal::Map(entries) => entries
            .into_iter()
            .map(|(key, value)| match (as_id(key), value) {
                (Some(author), Literal::Str(note)) => Ok((author, note)),
                _ => Err(invalid(cell)),
            })
            .collect(),
        // Oldest layout: list indexed by author id with None for "no note"
        Literal::Seq(items) => {
            let mut notes = BTreeMap::new();
            for (author, item) in items.into_iter().enumerate() {
                match item {
                    Literal::None => {}
                    Literal::Str(note) => {
                        let author = UserId::try_from(author).map_err(|_| invalid(cell))?;
                        notes.insert(author, note);
                    }
                    _ => return Err(invalid(cell)),
                }
            }
            Ok(notes)
        }
        _ => Err(invalid(cell)),
    }
}

fn invalid(cell: &str) -> Error {
    Error::InvalidCell(cell.to_string())
}

fn as_id(literal: Literal) -> Option<UserId> {
    match literal {
        Literal::Int(value) => UserId::try_from(value).ok(),
        _ => None,
    }
}

// ----------------------------------------------------------------------------
// Legacy literal syntax
// ----------------------------------------------------------------------------

#[derive(Debug, PartialEq)]
enum Literal {
    Str(String),
    Int(i64),
    None,
    Seq(Vec<Literal>),
    Map(Vec<(Literal, Literal)>),
}

/// Deepest container nesting the legacy parser accepts
const MAX_LITERAL_DEPTH: usize = 32;

fn parse_literal(cell: &str) -> Result<Literal> {
    let mut parser = LiteralParser {
        chars: cell.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let value = parser.value().ok_or_else(|| invalid(cell))?;
    parser.skip_whitespace();
    if parser.pos != parser.chars.len() {
        return Err(invalid(cell));
    }
    Ok(value)
}

struct LiteralParser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl LiteralParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_whitespace();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn keyword(&mut self, word: &str) -> bool {
        let end = self.pos + word.chars().count();
        if end <= self.chars.len() && self.chars[self.pos..end].iter().copied().eq(word.chars()) {
            self.pos = end;
            true
        } else {
            false
        }
    }

    fn value(&mut self) -> Option<Literal> {
        self.skip_whitespace();
        match self.peek()? {
            c @ ('{' | '[') => {
                if self.depth >= MAX_LITERAL_DEPTH {
                    return None;
                }
                self.depth += 1;
                let value = if c == '{' { self.braced() } else { self.list() };
                self.depth -= 1;
                value
            }
            '\'' | '"' => self.string().map(Literal::Str),
            c if c == '-' || c.is_ascii_digit() => self.integer(),
            _ if self.keyword("None") => Some(Literal::None),
            _ if self.keyword("set()") => Some(Literal::Seq(Vec::new())),
            _ => None,
        }
    }

    /// `{}` / `{a, b}` / `{k: v, ...}`
    fn braced(&mut self) -> Option<Literal> {
        self.bump();
        if self.eat('}') {
            return Some(Literal::Map(Vec::new()));
        }
        let first = self.value()?;
        if self.eat(':') {
            let mut entries = vec![(first, self.value()?)];
            while self.eat(',') {
                if self.eat('}') {
                    return Some(Literal::Map(entries));
                }
                let key = self.value()?;
                if !self.eat(':') {
                    return None;
                }
                entries.push((key, self.value()?));
            }
            return self.eat('}').then_some(Literal::Map(entries));
        }
        let mut items = vec![first];
        while self.eat(',') {
            if self.eat('}') {
                return Some(Literal::Seq(items));
            }
            items.push(self.value()?);
        }
        self.eat('}').then_some(Literal::Seq(items))
    }

    fn list(&mut self) -> Option<Literal> {
        self.bump();
        let mut items = Vec::new();
        if self.eat(']') {
            return Some(Literal::Seq(items));
        }
        items.push(self.value()?);
        while self.eat(',') {
            if self.eat(']') {
                return Some(Literal::Seq(items));
            }
            items.push(self.value()?);
        }
        self.eat(']').then_some(Literal::Seq(items))
    }

    fn string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut value = String::new();
        loop {
            match self.bump()? {
                c if c == quote => return Some(value),
                '\\' => match self.bump()? {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    'x' => value.push(self.hex_escape(2)?),
                    'u' => value.push(self.hex_escape(4)?),
                    other => value.push(other),
                },
                c => value.push(c),
            }
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Option<char> {
        let end = self.pos + digits;
        let hex: String = self.chars.get(self.pos..end)?.iter().collect();
        self.pos = end;
        char::from_u32(u32::from_str_radix(&hex, 16).ok()?)
    }

    fn integer(&mut self) -> Option<Literal> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits.parse().ok().map(Literal::Int)
    }
}
