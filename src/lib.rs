// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.

mod vcd;
pub use vcd::error::{ErrorKind, ParserError, TreeError};
pub use vcd::parse::{parse_vcd_header, Parser, ORPHANED_SCOPE};
pub use vcd::reader::{Lexer, Source, Token};
pub use vcd::scope_tree::{Reference, Scope, ScopeTree, Variable};
pub use vcd::types::{Header, Magnitude, Metadata, ParserState, TimeUnit, Timescale, Version};
pub use vcd::types::{ScopeIdx, ScopeKind, VarIdx, VarType};
