// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

//! part of the vcd parser that handles `$scope`, `$var` and `$upscope`
//! and builds the resulting scope tree

use log::{debug, warn};

use super::Parser;
use crate::vcd::error::{ErrorKind, ParserError, TreeError};
use crate::vcd::scope_tree::{Reference, ScopeTree};
use crate::vcd::types::{ScopeIdx, ScopeKind, VarType};

/// Home of variables declared before any `$scope`.
pub const ORPHANED_SCOPE: &str = "Orphaned Signals";

/// Parses a bit select such as `[7:0]` or `[3]` into `(msb, lsb)`.
fn parse_bit_select(select: &str) -> Option<(i64, i64)> {
    let inner = select.strip_prefix('[')?.strip_suffix(']')?;
    match inner.split_once(':') {
        Some((msb, lsb)) => Some((msb.trim().parse().ok()?, lsb.trim().parse().ok()?)),
        None => {
            let bit = inner.trim().parse().ok()?;
            Some((bit, bit))
        }
    }
}

impl<'a> Parser<'a> {
    fn tree_error(&mut self, err: TreeError) -> ParserError {
        let kind = match err {
            TreeError::AllocFailed(_) => ErrorKind::AllocFailed,
            _ => ErrorKind::General,
        };
        let err = ParserError::new(kind, format!("{err} (line {})", self.line()));
        self.fail(err)
    }

    fn syntax_error(&mut self, msg: String) -> ParserError {
        let err = ParserError::syntax(self.line(), msg);
        self.fail(err)
    }

    /// `$scope <kind> <identifier> $end`
    ///
    /// Opens the scope under the innermost open scope. Reopening a scope
    /// that already exists re-enters it. A scope without a name is
    /// transparent: its contents belong to the enclosing scope.
    pub(super) fn parse_scope(
        &mut self,
        tree: &mut ScopeTree,
        open_scopes: &mut Vec<Option<ScopeIdx>>,
    ) -> Result<(), ParserError> {
        self.consume("$scope", "$scope")?;

        // $scope module reg_mag_i $end
        //        ^^^^^^ - scope kind
        let keyword = self.expect_word("$scope")?.to_string();
        let Some(kind) = ScopeKind::from_keyword(&keyword) else {
            let expected = ["module", "begin", "task", "function", "fork"];
            return Err(self.syntax_error(format!(
                "found keyword `{keyword}` but expected one of {expected:?}"
            )));
        };

        let parent = open_scopes.iter().rev().find_map(|scope| *scope);

        // $scope module reg_mag_i $end
        //               ^^^^^^^^^ - scope name
        if self.lookahead_is("$end") {
            self.consume("$end", "$scope")?;
            debug!("entering nameless scope on line {}", self.line());
            open_scopes.push(None);
            return Ok(());
        }
        let name = self.expect_word("$scope")?.to_string();
        self.consume("$end", "$scope")?;

        let existing = match parent {
            Some(parent) => tree.child_scope(parent, &name),
            None => tree.root_named(&name),
        };
        let scope_idx = match existing {
            Some(scope_idx) => scope_idx,
            None => tree
                .allocate_scope(parent, &name, kind)
                .map_err(|err| self.tree_error(err))?,
        };
        open_scopes.push(Some(scope_idx));

        Ok(())
    }

    /// `$upscope $end`
    pub(super) fn parse_upscope(
        &mut self,
        open_scopes: &mut Vec<Option<ScopeIdx>>,
    ) -> Result<(), ParserError> {
        self.consume("$upscope", "$upscope")?;
        self.consume("$end", "$upscope")?;

        if open_scopes.pop().is_none() {
            return Err(self.syntax_error("found `$upscope` without an open scope".to_string()));
        }
        Ok(())
    }

    /// `$var <type> <width> <identifier code> <reference> $end`
    ///
    /// The reference is a name optionally followed by a bit select, which
    /// may or may not be separated from the name by whitespace.
    pub(super) fn parse_var(
        &mut self,
        tree: &mut ScopeTree,
        parent: Option<ScopeIdx>,
    ) -> Result<(), ParserError> {
        self.consume("$var", "$var")?;

        // $var wire 8 # data [7:0] $end
        //      ^^^^ - var type
        let keyword = self.expect_word("$var")?.to_string();
        let Some(var_type) = VarType::from_keyword(&keyword) else {
            return Err(self.syntax_error(format!(
                "found keyword `{keyword}` but expected a variable type"
            )));
        };

        // $var wire 8 # data [7:0] $end
        //           ^ - width
        let word = self.expect_word("$var")?.to_string();
        let Ok(width) = word.parse::<u32>() else {
            return Err(self.syntax_error(format!(
                "failed to parse width `{word}` as an unsigned integer"
            )));
        };

        // $var wire 8 # data [7:0] $end
        //             ^ - identifier code
        let identifier_code = self.expect_word("$var")?.to_string();

        // $var wire 8 # data [7:0] $end
        //               ^^^^^^^^^^ - reference (can extend until $end)
        let mut name_parts = Vec::<String>::new();
        let mut select = String::new();
        while !self.lookahead_is("$end") {
            let word = self.expect_word("$var")?.to_string();
            match word.find('[') {
                Some(0) => select.push_str(&word),
                Some(idx) if select.is_empty() => {
                    name_parts.push(word[..idx].to_string());
                    select.push_str(&word[idx..]);
                }
                _ if !select.is_empty() => select.push_str(&word),
                _ => name_parts.push(word),
            }
        }
        self.consume("$end", "$var")?;

        let name = name_parts.join(" ");
        if name.is_empty() {
            return Err(self.syntax_error(format!(
                "missing reference for variable `{identifier_code}`"
            )));
        }

        let (msb, lsb) = if select.is_empty() {
            (i64::from(width.saturating_sub(1)), 0)
        } else {
            match parse_bit_select(&select) {
                Some(indices) => indices,
                None => {
                    return Err(self.syntax_error(format!(
                        "malformed bit select `{select}` on `{name}`"
                    )))
                }
            }
        };
        let reference = Reference::new(name, lsb, msb);

        let parent = match parent {
            Some(parent) => parent,
            None => match tree.root_named(ORPHANED_SCOPE) {
                Some(orphans) => orphans,
                None => tree
                    .allocate_scope(None, ORPHANED_SCOPE, ScopeKind::Module)
                    .map_err(|err| self.tree_error(err))?,
            },
        };

        match tree.allocate_var(Some(parent), var_type, width, Some(reference), &identifier_code) {
            Ok(_) => Ok(()),
            Err(TreeError::DuplicateVariable(code)) => {
                warn!(
                    "skipping variable with duplicated identifier code `{code}` on line {}",
                    self.line()
                );
                Ok(())
            }
            Err(err) => Err(self.tree_error(err)),
        }
    }
}
