// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use log::debug;

use super::error::{ErrorKind, ParserError};
use super::reader::{Lexer, Source, Token};
use super::types::{Header, ParserState, ScopeIdx, Version};

mod combinator_atoms;
mod types;

mod metadata;
pub(crate) use metadata::parse_date_time;

mod scopes;
pub use scopes::ORPHANED_SCOPE;

/// Recursive descent parser over a one token lookahead window.
///
/// The first failure is latched: the parser moves to
/// [`ParserState::Error`], every later token advancing call does nothing,
/// and the error stays available through [`Parser::error`] until
/// [`Parser::clear_error`] is called.
#[derive(Debug)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    error: Option<ParserError>,
    current_token: Option<Token>,
    lookahead_token: Option<Token>,
}

impl<'a> Parser<'a> {
    /// A buffer source must hold at least one byte; an empty buffer leaves
    /// the parser in `Error` with [`ErrorKind::NoLength`].
    pub fn new(source: Source<'a>) -> Parser<'a> {
        let no_length = source.len() == Some(0);
        let mut parser = Parser {
            lexer: Lexer::new(source),
            error: None,
            current_token: None,
            lookahead_token: None,
        };

        if no_length {
            parser.fail(ParserError::new(
                ErrorKind::NoLength,
                "Parser allocated with non-stream input type, but no length provided.",
            ));
        }

        parser
    }

    pub fn from_bytes(input: &'a [u8]) -> Parser<'a> {
        Parser::new(Source::Buffer(input))
    }

    pub fn state(&self) -> ParserState {
        self.lexer.state()
    }

    /// The latched error, only ever set while in `Error`.
    pub fn error(&self) -> Option<&ParserError> {
        self.error.as_ref()
    }

    /// Current 1-based line of the lexer.
    pub fn line(&self) -> usize {
        self.lexer.line()
    }

    pub fn current_token(&self) -> Option<&Token> {
        self.current_token.as_ref()
    }

    pub fn lookahead_token(&self) -> Option<&Token> {
        self.lookahead_token.as_ref()
    }

    /// Releases the latched error and resets an errored parser to
    /// `Uninitialized`. Such a parser cannot tokenize again.
    pub fn clear_error(&mut self) -> Option<ParserError> {
        if self.state() == ParserState::Error {
            self.lexer.set_state(ParserState::Uninitialized);
        }
        self.error.take()
    }

    fn fail(&mut self, err: ParserError) -> ParserError {
        self.lexer.set_state(ParserState::Error);
        if self.error.is_none() {
            self.error = Some(err.clone());
        }
        err
    }

    /// Fails with the latched error, or a general one when the parser was
    /// never started or has been cleared.
    fn ensure_live(&self) -> Result<(), ParserError> {
        match self.state() {
            ParserState::Running | ParserState::Eof => Ok(()),
            ParserState::Error => Err(self.error.clone().unwrap_or_else(|| {
                ParserError::new(ErrorKind::General, "parser is in an error state")
            })),
            state => Err(ParserError::new(
                ErrorKind::General,
                format!("parser is not running, current state is {state:?}"),
            )),
        }
    }

    fn pull(&mut self) -> Result<Option<Token>, ParserError> {
        self.lexer.next_token().map_err(|err| self.fail(err))
    }

    /// Fills the lookahead slot with the first token of the input. Does
    /// nothing unless the parser is freshly `Initialized`.
    pub fn start(&mut self) -> Result<(), ParserError> {
        if self.state() == ParserState::Initialized {
            self.current_token = None;
            self.lookahead_token = self.pull()?;
            return Ok(());
        }
        self.ensure_live()
    }

    /// Drops the current token, promotes the lookahead and reads a new
    /// lookahead. A no-op unless the parser is `Running`.
    pub fn advance(&mut self) -> Result<(), ParserError> {
        if self.state() != ParserState::Running {
            return Ok(());
        }

        self.current_token = self.lookahead_token.take();
        self.lookahead_token = self.pull()?;
        Ok(())
    }

    /// Like `advance`, but once the input is exhausted it still moves the
    /// final lookahead token into the current slot.
    fn bump(&mut self) -> Result<(), ParserError> {
        match self.state() {
            ParserState::Running => self.advance(),
            ParserState::Eof => {
                self.current_token = self.lookahead_token.take();
                Ok(())
            }
            _ => Ok(()),
        }
    }

    pub fn lookahead_is(&self, text: &str) -> bool {
        self.lookahead_token
            .as_ref()
            .map_or(false, |token| *token == text)
    }

    fn eof_while_parsing(&mut self, construct: &str) -> ParserError {
        let err = ParserError::syntax(self.line(), format!("got EOF while parsing {construct}"));
        self.fail(err)
    }

    /// Consumes the lookahead token, which must be `keyword`.
    fn consume(&mut self, keyword: &str, construct: &str) -> Result<(), ParserError> {
        self.ensure_live()?;
        if self.lookahead_is(keyword) {
            return self.bump();
        }

        match self.lookahead_token.as_ref().map(Token::to_string) {
            Some(found) => {
                let msg = format!(
                    "found keyword `{found}` but expected `{keyword}` while parsing {construct}"
                );
                let err = ParserError::syntax(self.line(), msg);
                Err(self.fail(err))
            }
            None => Err(self.eof_while_parsing(construct)),
        }
    }

    /// Consumes and returns whatever token is in the lookahead slot.
    fn expect_word(&mut self, construct: &str) -> Result<Token, ParserError> {
        self.ensure_live()?;
        match self.lookahead_token.clone() {
            Some(token) => {
                self.bump()?;
                Ok(token)
            }
            None => Err(self.eof_while_parsing(construct)),
        }
    }

    /// Advances until `terminator` is the lookahead, returning the consumed
    /// tokens joined by single spaces. The terminator itself is left in the
    /// lookahead slot.
    pub fn parse_until(&mut self, terminator: &str, construct: &str) -> Result<String, ParserError> {
        let mut text = String::new();

        while !self.lookahead_is(terminator) {
            self.advance()?;

            if self.state() == ParserState::Eof && !self.lookahead_is(terminator) {
                return Err(self.eof_while_parsing(construct));
            }

            // errored or never started: keep whatever error is latched
            self.ensure_live()?;

            if let Some(token) = &self.current_token {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&token.to_str_lossy());
            }

            if self.state() == ParserState::Eof {
                break;
            }
        }

        Ok(text)
    }

    /// Parses header directives up to and including `$enddefinitions $end`,
    /// or to the end of the input. The value change section is left unread.
    pub fn parse(&mut self) -> Result<Header, ParserError> {
        self.start()?;

        let mut header = Header::default();
        // `None` entries are nameless scopes, which are transparent
        let mut open_scopes: Vec<Option<ScopeIdx>> = vec![];

        loop {
            let word = match &self.lookahead_token {
                Some(token) => token.to_str_lossy().into_owned(),
                None => break,
            };

            match word.as_str() {
                "$version" => {
                    let version = self.parse_version()?;
                    header.metadata.version = Some(Version(version));
                }
                "$date" => header.metadata.date = Some(self.parse_date()?),
                "$timescale" => header.metadata.timescale = Some(self.parse_timescale()?),
                "$comment" => {
                    let comment = self.parse_comment()?;
                    header.metadata.comments.push(comment);
                }
                "$scope" => self.parse_scope(&mut header.scopes, &mut open_scopes)?,
                "$upscope" => self.parse_upscope(&mut open_scopes)?,
                "$var" => {
                    let parent = open_scopes.iter().rev().find_map(|scope| *scope);
                    self.parse_var(&mut header.scopes, parent)?;
                }
                "$enddefinitions" => {
                    self.consume("$enddefinitions", "$enddefinitions")?;
                    self.consume("$end", "$enddefinitions")?;
                    debug!("reached $enddefinitions on line {}", self.line());
                    break;
                }
                _ => {
                    if self.state() != ParserState::Running {
                        break;
                    }
                    self.advance()?;
                }
            }
        }

        Ok(header)
    }
}

/// Parses the header of an in-memory VCD file.
pub fn parse_vcd_header(input: &[u8]) -> Result<Header, ParserError> {
    Parser::from_bytes(input).parse()
}
