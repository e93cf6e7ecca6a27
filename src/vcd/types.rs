// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use chrono::prelude::*;

use super::scope_tree::ScopeTree;

/// Lifecycle of a parser and of the lexer underneath it.
///
/// `Uninitialized -> Initialized -> Running -> Eof`. `Error` can be entered
/// from `Initialized` or `Running` and is only left through
/// [`Parser::clear_error`](super::parse::Parser::clear_error), which lands in
/// `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    Uninitialized,
    Error,
    Initialized,
    Running,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    S,
    Ms,
    Us,
    Ns,
    Ps,
    Fs,
}

impl TimeUnit {
    pub fn from_suffix(suffix: &str) -> Option<TimeUnit> {
        match suffix {
            "s" => Some(TimeUnit::S),
            "ms" => Some(TimeUnit::Ms),
            "us" => Some(TimeUnit::Us),
            "ns" => Some(TimeUnit::Ns),
            "ps" => Some(TimeUnit::Ps),
            "fs" => Some(TimeUnit::Fs),
            _ => None,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::S => "s",
            TimeUnit::Ms => "ms",
            TimeUnit::Us => "us",
            TimeUnit::Ns => "ns",
            TimeUnit::Ps => "ps",
            TimeUnit::Fs => "fs",
        }
    }
}

/// The multiplier in front of a timescale unit. VCD allows no others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magnitude {
    One,
    Ten,
    Hundred,
}

impl Magnitude {
    pub fn from_digits(digits: &str) -> Option<Magnitude> {
        match digits {
            "1" => Some(Magnitude::One),
            "10" => Some(Magnitude::Ten),
            "100" => Some(Magnitude::Hundred),
            _ => None,
        }
    }

    pub fn value(&self) -> u32 {
        match self {
            Magnitude::One => 1,
            Magnitude::Ten => 10,
            Magnitude::Hundred => 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timescale {
    pub magnitude: Magnitude,
    pub unit: TimeUnit,
}

impl std::fmt::Display for Timescale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.magnitude.value(), self.unit.suffix())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// The `$date` text exactly as captured, words joined by single spaces.
    pub date: Option<String>,
    pub version: Option<Version>,
    pub timescale: Option<Timescale>,
    pub comments: Vec<String>,
}

impl Metadata {
    /// Decodes `date` into a calendar timestamp, if it holds one.
    pub fn date_time(&self) -> Option<DateTime<Utc>> {
        self.date.as_deref().and_then(super::parse::parse_date_time)
    }
}

/// Everything found between the start of a VCD file and
/// `$enddefinitions`.
#[derive(Debug, Default)]
pub struct Header {
    pub metadata: Metadata,
    pub scopes: ScopeTree,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Begin,
    Fork,
    Function,
    Module,
    Task,
}

impl ScopeKind {
    pub fn from_keyword(word: &str) -> Option<ScopeKind> {
        match word {
            "begin" => Some(ScopeKind::Begin),
            "fork" => Some(ScopeKind::Fork),
            "function" => Some(ScopeKind::Function),
            "module" => Some(ScopeKind::Module),
            "task" => Some(ScopeKind::Task),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarType {
    Event,
    Integer,
    Parameter,
    Real,
    Realtime,
    Reg,
    Supply0,
    Supply1,
    Time,
    Tri,
    TriAnd,
    TriOr,
    TriReg,
    Tri0,
    Tri1,
    Wand,
    Wire,
    Wor,
}

impl VarType {
    pub fn from_keyword(word: &str) -> Option<VarType> {
        match word {
            "event" => Some(VarType::Event),
            "integer" => Some(VarType::Integer),
            "parameter" => Some(VarType::Parameter),
            "real" => Some(VarType::Real),
            "realtime" => Some(VarType::Realtime),
            "reg" => Some(VarType::Reg),
            "supply0" => Some(VarType::Supply0),
            "supply1" => Some(VarType::Supply1),
            "time" => Some(VarType::Time),
            "tri" => Some(VarType::Tri),
            "triand" => Some(VarType::TriAnd),
            "trior" => Some(VarType::TriOr),
            "trireg" => Some(VarType::TriReg),
            "tri0" => Some(VarType::Tri0),
            "tri1" => Some(VarType::Tri1),
            "wand" => Some(VarType::Wand),
            "wire" => Some(VarType::Wire),
            "wor" => Some(VarType::Wor),
            _ => None,
        }
    }
}

/// Slot and generation of a scope in a
/// [`ScopeTree`](super::scope_tree::ScopeTree). Slots are recycled, the
/// generation is not, so a handle to a freed scope never resolves again.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ScopeIdx(pub usize, pub u32);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VarIdx(pub usize, pub u32);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn timescale_display() {
        let ts = Timescale {
            magnitude: Magnitude::Hundred,
            unit: TimeUnit::Fs,
        };
        assert_eq!(ts.to_string(), "100fs");
    }

    #[test]
    fn closed_sets() {
        assert_eq!(Magnitude::from_digits("1000"), None);
        assert_eq!(Magnitude::from_digits("01"), None);
        assert_eq!(TimeUnit::from_suffix("sa"), None);
        assert_eq!(ScopeKind::from_keyword("module"), Some(ScopeKind::Module));
        assert_eq!(VarType::from_keyword("trireg"), Some(VarType::TriReg));
        assert_eq!(VarType::from_keyword("logic"), None);
    }
}
