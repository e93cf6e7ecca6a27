pub(crate) mod error;
pub(crate) mod reader;
pub(crate) mod types;
pub(crate) mod scope_tree;
pub(crate) mod parse;
