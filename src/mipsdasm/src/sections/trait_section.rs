/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{
    addresses::{AddressRange, RomVramRange, Vram},
    collections::UnorderedSet,
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
};

/// One analyzed section of some segment.
pub trait Section {
    fn name(&self) -> &str;

    fn vram_range(&self) -> &AddressRange<Vram>;

    fn parent_segment_info(&self) -> &ParentSegmentInfo;

    fn section_type(&self) -> SectionType;

    /// The vram of every symbol this section was split into.
    fn symbols_vrams(&self) -> &UnorderedSet<Vram>;
}

/// A section with actual bytes on the ROM (so, not bss).
pub trait RomSection: Section {
    fn rom_vram_range(&self) -> &RomVramRange;
}
