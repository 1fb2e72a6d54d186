/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size, Vram},
    collections::addended_ordered_map::FindSettings,
    context::Context,
    metadata::SymbolMetadata,
    parent_segment_info::ParentSegmentInfo,
    relocation::RelocationInfo,
    section_type::SectionType,
};

/// Anything a section slices out and the emitter prints on its own: a
/// function, a data blob, a bss span.
pub trait Symbol {
    fn vram_range(&self) -> &AddressRange<Vram>;

    fn parent_segment_info(&self) -> &ParentSegmentInfo;

    fn section_type(&self) -> SectionType;

    fn size(&self) -> Size {
        self.vram_range().size()
    }

    /// The context entry this symbol registered for itself on creation.
    fn find_own_metadata<'ctx>(&self, context: &'ctx Context) -> &'ctx SymbolMetadata {
        context
            .find_owned_segment(self.parent_segment_info())
            .ok()
            .and_then(|segment| {
                segment.find_symbol(self.vram_range().start(), FindSettings::new(false))
            })
            .expect("Symbols register their own metadata when created")
    }
}

/// A symbol that exists on the ROM image (so, not bss).
pub trait RomSymbol: Symbol {
    fn rom_vram_range(&self) -> &RomVramRange;

    /// One slot per word (per instruction for functions).
    fn relocs(&self) -> &[Option<RelocationInfo>];

    fn rom_from_vram(&self, vram: Vram) -> Option<Rom> {
        self.rom_vram_range().rom_from_vram(vram)
    }
}
