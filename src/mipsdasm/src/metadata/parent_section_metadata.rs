/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;

use crate::addresses::Vram;

/// Info about the section that created a symbol, kept for name generation
/// and for diagnostics.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParentSectionMetadata {
    name: String,
    vram: Vram,
}

impl ParentSectionMetadata {
    #[must_use]
    pub const fn new(name: String, vram: Vram) -> Self {
        Self { name, vram }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn vram(&self) -> Vram {
        self.vram
    }
}
