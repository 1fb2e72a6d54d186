/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::{string::String, vec::Vec};
use core::fmt;

use super::{AddressRange, Size, Vram};

/// The Global Offset Table of a position independent (PIC) binary.
///
/// The local part holds page addresses that get completed by a `%got_lo`/
/// `%lo` pairing, the global part holds the resolved address of every
/// preemptible symbol. Index 0 of the local part points at the lazy
/// resolver.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GlobalOffsetTable {
    vram: AddressRange<Vram>,
    locals: Vec<Vram>,
    globals: Vec<GotGlobalEntry>,
}

impl GlobalOffsetTable {
    #[must_use]
    pub fn new(vram: Vram, locals: Vec<Vram>, globals: Vec<GotGlobalEntry>) -> Self {
        let count = (locals.len() + globals.len()) as u32;
        let vram = AddressRange::new(vram, vram + Size::new(count * 4));

        Self {
            vram,
            locals,
            globals,
        }
    }

    #[must_use]
    pub const fn vram(&self) -> &AddressRange<Vram> {
        &self.vram
    }
    #[must_use]
    pub fn locals(&self) -> &[Vram] {
        &self.locals
    }
    #[must_use]
    pub fn globals(&self) -> &[GotGlobalEntry] {
        &self.globals
    }

    /// Fetch the entry a `lw $reg, offset($gp)` would load, given the
    /// resulting absolute address.
    #[must_use]
    pub fn request_address(&self, vram: Vram) -> Option<GotEntry<'_>> {
        if !self.vram.in_range(vram) {
            return None;
        }

        let index = ((vram - self.vram.start()).inner() / 4) as usize;
        if let Some(x) = self.locals.get(index) {
            if index == 0 {
                Some(GotEntry::LazyResolver(*x))
            } else {
                Some(GotEntry::Local(*x))
            }
        } else {
            self.globals
                .get(index - self.locals.len())
                .map(GotEntry::Global)
        }
    }
}

/// An address from the global part of the GOT.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GotGlobalEntry {
    initial: u32,
    sym_value: u32,
    undef_com_or_abs: bool,
    sym_name: String,
}

impl GotGlobalEntry {
    #[must_use]
    pub fn new(initial: u32, sym_value: u32, undef_com_or_abs: bool, sym_name: String) -> Self {
        Self {
            initial,
            sym_value,
            undef_com_or_abs,
            sym_name,
        }
    }

    #[must_use]
    pub fn sym_name(&self) -> &str {
        &self.sym_name
    }

    /// Runtime address of this entry, preferring the symtab value over the
    /// initial got word when the symbol is actually defined.
    #[must_use]
    pub const fn address(&self) -> Vram {
        if self.sym_value != 0 && !self.undef_com_or_abs {
            Vram::new(self.sym_value)
        } else {
            Vram::new(self.initial)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GotEntry<'got> {
    LazyResolver(Vram),
    Local(Vram),
    Global(&'got GotGlobalEntry),
}

impl GotEntry<'_> {
    #[must_use]
    pub const fn address(&self) -> Vram {
        match self {
            GotEntry::LazyResolver(x) | GotEntry::Local(x) => *x,
            GotEntry::Global(x) => x.address(),
        }
    }

    #[must_use]
    pub const fn is_global(&self) -> bool {
        matches!(self, GotEntry::Global(..))
    }
}

impl fmt::Display for GotEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GotEntry::LazyResolver(x) => write!(f, "lazy resolver (0x{:08X})", x.inner()),
            GotEntry::Local(x) => write!(f, "local 0x{:08X}", x.inner()),
            GotEntry::Global(x) => write!(f, "global {}", x.sym_name()),
        }
    }
}
