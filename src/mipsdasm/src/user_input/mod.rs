/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod splits_csv;
mod symbol_addrs;

pub use splits_csv::{SplitEntry, SplitEntryType, SplitsParseError};
pub use symbol_addrs::{SymbolAddrsParseError, UserSymbolDeclaration};
