/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;

use crate::addresses::Vram;

/// What a relocation points at: either a raw address resolved lazily
/// through the context, or a literal name (for symbols the context doesn't
/// know about, like the ones coming from an ELF symtab or a GOT entry).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelocReferencedSym {
    Address(Vram),
    SymName(String, i32),
}

impl RelocReferencedSym {
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        RelocReferencedSym::SymName(name.into(), 0)
    }
}
