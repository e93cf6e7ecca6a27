// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

/// A word split in two by one of the combinators: the prefix that
/// matched and whatever is left over.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct ParseResult<'a> {
    pub(super) matched  : &'a str,
    pub(super) residual : &'a str}
