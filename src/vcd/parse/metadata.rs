// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use chrono::prelude::*;
use itertools::Itertools;
use log::debug;

use super::combinator_atoms::{char_filter, digit, take_while};
use super::types::ParseResult;
use super::Parser;
use crate::vcd::error::ParserError;
use crate::vcd::types::{Magnitude, TimeUnit, Timescale};

const DIGITS: &str = "0123456789";
const UNIT_CHARS: &str = "smunpf";

/// Decodes a captured `$date` body such as `Mon Feb 22 19:49:29 2021`.
///
/// Simulators disagree on the order of the five words, so every
/// permutation is tried against the canonical layout.
pub(crate) fn parse_date_time(date: &str) -> Option<DateTime<Utc>> {
    let words = date.split_ascii_whitespace().collect::<Vec<&str>>();
    if words.len() != 5 {
        return None;
    }

    words
        .iter()
        .permutations(words.len())
        .map(|words| words.into_iter().join(" "))
        .find_map(|candidate| {
            NaiveDateTime::parse_from_str(&candidate, "%a %b %e %T %Y").ok()
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Splits a captured timescale such as `100ps` into its
/// magnitude and unit. On failure returns the text of a syntax error.
fn classify_timescale(captured: &str) -> Result<Timescale, String> {
    // leading digits, then nothing but unit characters
    let ParseResult { matched, residual } = take_while(captured, digit);
    if matched.is_empty() {
        return Err(format!("invalid timescale '{captured}'"));
    }
    if let Some(chr) = residual.chars().find(|chr| !UNIT_CHARS.contains(*chr)) {
        return Err(format!("invalid character '{chr}' in timescale"));
    }

    let magnitude = Magnitude::from_digits(&char_filter(captured, DIGITS));
    let unit = TimeUnit::from_suffix(&char_filter(captured, UNIT_CHARS));
    match (magnitude, unit) {
        (Some(magnitude), Some(unit)) => Ok(Timescale { magnitude, unit }),
        _ => Err(format!("invalid timescale '{captured}'")),
    }
}

impl<'a> Parser<'a> {
    /// `$version <text> $end`
    pub fn parse_version(&mut self) -> Result<String, ParserError> {
        self.parse_text_block("$version")
    }

    /// `$date <text> $end`
    pub fn parse_date(&mut self) -> Result<String, ParserError> {
        self.parse_text_block("$date")
    }

    /// `$comment <text> $end`
    pub fn parse_comment(&mut self) -> Result<String, ParserError> {
        self.parse_text_block("$comment")
    }

    fn parse_text_block(&mut self, keyword: &str) -> Result<String, ParserError> {
        self.start()?;
        self.consume(keyword, keyword)?;
        let text = self.parse_until("$end", keyword)?;
        self.consume("$end", keyword)?;
        debug!("{keyword} `{text}`");

        Ok(text)
    }

    /// `$timescale <magnitude><unit> $end`, where magnitude is one of 1, 10
    /// or 100 and unit one of s, ms, us, ns, ps or fs.
    pub fn parse_timescale(&mut self) -> Result<Timescale, ParserError> {
        self.start()?;
        self.consume("$timescale", "$timescale")?;
        let captured = self.parse_until("$end", "$timescale")?;

        let timescale = match classify_timescale(&captured) {
            Ok(timescale) => timescale,
            Err(msg) => {
                let err = ParserError::syntax(self.line(), msg);
                return Err(self.fail(err));
            }
        };

        self.consume("$end", "$timescale")?;
        debug!("$timescale {timescale}");

        Ok(timescale)
    }
}
