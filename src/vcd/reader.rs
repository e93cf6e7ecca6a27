// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! Splits a VCD character source into whitespace delimited tokens.
//!
//! VCD identifiers may contain any printable character, so there is no
//! lexical analysis beyond finding runs of non-whitespace bytes. The lexer
//! is byte oriented and never re-encodes its input.

use std::io::Read;

use log::trace;

use super::error::{ErrorKind, ParserError};
use super::types::ParserState;

const INITIAL_TOKEN_CAPACITY: usize = 10;

pub(super) fn is_whitespace(chr: u8) -> bool {
    matches!(chr, b' ' | b'\t' | b'\n' | b'\r')
}

/// An immutable run of non-whitespace bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: Box<[u8]>,
}

impl Token {
    /// Copies `bytes` into an exactly sized token. Fails only if the copy
    /// cannot be allocated.
    pub fn from_bytes(bytes: &[u8]) -> Result<Token, std::collections::TryReserveError> {
        let mut text = Vec::new();
        text.try_reserve_exact(bytes.len())?;
        text.extend_from_slice(bytes);
        Ok(Token {
            text: text.into_boxed_slice(),
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.text
    }

    /// Number of bytes consumed from the input to build this token.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn to_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        &*self.text == other.as_bytes()
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        &*self.text == other.as_bytes()
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str_lossy())
    }
}

/// Where the lexer draws characters from.
pub enum Source<'a> {
    /// A fully materialized input. Its length is the slice length.
    Buffer(&'a [u8]),
    /// An unbounded stream. Reading from it is not supported yet; the
    /// first character read fails with [`ErrorKind::General`].
    Stream(Box<dyn Read + 'a>),
}

impl<'a> Source<'a> {
    /// Length of a buffer source, `None` for streams.
    pub fn len(&self) -> Option<usize> {
        match self {
            Source::Buffer(buf) => Some(buf.len()),
            Source::Stream(_) => None,
        }
    }
}

impl<'a> std::fmt::Debug for Source<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Buffer(buf) => write!(f, "Buffer({} bytes)", buf.len()),
            Source::Stream(_) => write!(f, "Stream"),
        }
    }
}

#[derive(Debug)]
pub struct Lexer<'a> {
    source: Source<'a>,
    state: ParserState,
    position: usize,
    // 1-based, incremented on every consumed `\n`
    line: usize,
    cursor: Option<u8>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: Source<'a>) -> Lexer<'a> {
        Lexer {
            source,
            state: ParserState::Initialized,
            position: 0,
            line: 1,
            cursor: None,
        }
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub(super) fn set_state(&mut self, state: ParserState) {
        self.state = state;
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// The character under the cursor, `None` before the first read and
    /// after the end of input.
    pub fn current_char(&self) -> Option<u8> {
        self.cursor
    }

    /// Moves the cursor one character forward.
    ///
    /// The first call moves the lexer from `Initialized` to `Running`. Once
    /// the position reaches the end of the input the lexer is `Eof`. In any
    /// other state this does nothing.
    pub fn advance_character(&mut self) -> Result<(), ParserError> {
        match self.state {
            ParserState::Initialized => {
                self.state = ParserState::Running;
                self.position = 0;
            }
            ParserState::Running => self.position += 1,
            _ => return Ok(()),
        }

        match &self.source {
            Source::Buffer(buf) => match buf.get(self.position) {
                Some(&chr) => {
                    self.cursor = Some(chr);
                    if chr == b'\n' {
                        self.line += 1;
                    }
                }
                None => {
                    self.state = ParserState::Eof;
                    self.cursor = None;
                }
            },
            Source::Stream(_) => {
                self.state = ParserState::Error;
                self.cursor = None;
                return Err(ParserError::new(
                    ErrorKind::General,
                    "reading from a stream source is not implemented",
                ));
            }
        }

        Ok(())
    }

    /// Reads the next whitespace delimited token, or `None` once the input
    /// is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>, ParserError> {
        if !matches!(self.state, ParserState::Initialized | ParserState::Running) {
            return Ok(None);
        }

        // eat whitespace up to the first character of the token
        loop {
            self.advance_character()?;
            match self.cursor {
                Some(chr) if is_whitespace(chr) => continue,
                _ => break,
            }
        }

        let mut text: Vec<u8> = Vec::new();
        while let Some(chr) = self.cursor {
            if is_whitespace(chr) {
                break;
            }

            // double the buffer whenever it fills up
            if text.len() == text.capacity() {
                let additional = text.capacity().max(INITIAL_TOKEN_CAPACITY);
                if text.try_reserve_exact(additional).is_err() {
                    self.state = ParserState::Error;
                    return Err(ParserError::new(
                        ErrorKind::AllocFailed,
                        "failed to allocate space to read next token",
                    ));
                }
            }
            text.push(chr);

            self.advance_character()?;
        }

        if text.is_empty() {
            return Ok(None);
        }

        let token = Token::from_bytes(&text).map_err(|_| {
            self.state = ParserState::Error;
            ParserError::new(
                ErrorKind::Token,
                format!(
                    "failed to create token from text '{}' of length {}",
                    String::from_utf8_lossy(&text),
                    text.len()
                ),
            )
        })?;
        trace!("token `{token}` on line {}", self.line);

        Ok(Some(token))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, ParserError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tokens(input: &[u8]) -> Vec<String> {
        Lexer::new(Source::Buffer(input))
            .map(|t| t.unwrap().to_string())
            .collect()
    }

    #[test]
    fn lexing() {
        let input = b"tok1 $tok2 \\~`tok3 tok4!__ 1234tok5\ntok6\ttok7 looooooooonnnnngggggggggggtok8";
        let mut lexer = Lexer::new(Source::Buffer(input));

        let expected = [
            "tok1",
            "$tok2",
            "\\~`tok3",
            "tok4!__",
            "1234tok5",
            "tok6",
            "tok7",
            "looooooooonnnnngggggggggggtok8",
        ];
        for word in expected {
            let token = lexer.next_token().unwrap().unwrap();
            assert_eq!(token.to_string(), word);
        }

        assert_eq!(lexer.next_token().unwrap(), None);
        assert_eq!(lexer.state(), ParserState::Eof);
        assert_eq!(lexer.line(), 2);
    }

    #[test]
    fn symbols_stay_inside_token() {
        let mut lexer = Lexer::new(Source::Buffer(b"XXX\\~`tok3"));
        let token = lexer.next_token().unwrap().unwrap();
        assert_eq!(token.as_bytes()[3], 0x5c);
        assert_eq!(token.as_bytes()[4], 0x7e);
        assert_eq!(token.as_bytes()[5], 0x60);
        assert!(token == "XXX\\~`tok3");
        assert_eq!(lexer.next_token().unwrap(), None);
    }

    #[test]
    fn token_length_is_character_count() {
        // 10 is the initial buffer capacity; lengths around the doubling
        // points must still be exact
        for len in [1usize, 9, 10, 11, 19, 20, 21, 40, 41, 1000] {
            let word = "a".repeat(len);
            let input = format!("  {word}\n");
            let mut lexer = Lexer::new(Source::Buffer(input.as_bytes()));
            let token = lexer.next_token().unwrap().unwrap();
            assert_eq!(token.len(), len);
            assert_eq!(token.len(), token.as_bytes().len());
        }
    }

    #[test]
    fn rejoining_tokens_collapses_whitespace() {
        let inputs = [
            "  $date\n\tMon Feb 22 19:49:29 2021\r\n $end  ",
            "a",
            "a  b\t\tc\n\n\nd",
            "\n\n",
            "",
        ];
        for input in inputs {
            let rejoined = tokens(input.as_bytes()).join(" ");
            let collapsed = input.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
            assert_eq!(rejoined, collapsed);
        }
    }

    #[test]
    fn empty_buffer_goes_straight_to_eof() {
        let mut lexer = Lexer::new(Source::Buffer(b""));
        assert_eq!(lexer.state(), ParserState::Initialized);
        lexer.advance_character().unwrap();
        assert_eq!(lexer.state(), ParserState::Eof);
        assert_eq!(lexer.current_char(), None);
        assert_eq!(lexer.next_token().unwrap(), None);
    }

    #[test]
    fn advance_character_walks_the_buffer() {
        let mut lexer = Lexer::new(Source::Buffer(b"a\nb"));
        lexer.advance_character().unwrap();
        assert_eq!(lexer.state(), ParserState::Running);
        assert_eq!(lexer.current_char(), Some(b'a'));
        assert_eq!(lexer.position(), 0);

        lexer.advance_character().unwrap();
        assert_eq!(lexer.current_char(), Some(b'\n'));
        assert_eq!(lexer.line(), 2);

        lexer.advance_character().unwrap();
        assert_eq!(lexer.current_char(), Some(b'b'));
        assert_eq!(lexer.state(), ParserState::Running);

        lexer.advance_character().unwrap();
        assert_eq!(lexer.state(), ParserState::Eof);
        assert_eq!(lexer.position(), 3);

        // no-op once exhausted
        lexer.advance_character().unwrap();
        assert_eq!(lexer.position(), 3);
    }

    #[test]
    fn stream_source_fails_fast() {
        let stream: Box<dyn Read> = Box::new(std::io::empty());
        let mut lexer = Lexer::new(Source::Stream(stream));
        let err = lexer.next_token().unwrap_err();
        assert_eq!(err.kind, ErrorKind::General);
        assert_eq!(lexer.state(), ParserState::Error);
        assert_eq!(lexer.next_token().unwrap(), None);
    }
}
