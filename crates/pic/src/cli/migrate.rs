//! The `pic migrate` and hidden `pic update` commands.
//!
//! Both were index-rewriting operations for formats that predate the
//! versioned index envelope. With only one format version in the wild
//! they have nothing to do and say so.

use anyhow::bail;

pub fn execute(name: &str) -> anyhow::Result<u8> {
    bail!(
        "'{name}' has no effect: all repositories use index format version 1. \
         It will return when a newer index format exists."
    );
}
