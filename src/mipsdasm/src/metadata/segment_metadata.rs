/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use alloc::vec::Vec;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size, Vram},
    collections::addended_ordered_map::{self, AddendedOrderedMap, FindSettings},
    section_type::SectionType,
};

use super::{GeneratedBy, OverlayCategoryName, SymbolMetadata, SymbolType};

// Addresses that must never be symbolized, no matter what. Trap handlers
// love `lui $reg, 0x8000` / `ori` pairs that produce these.
static DEFAULT_BANNED_ADDRESSES: [u32; 2] = [0, 0x7FFFFFFF];

/// The symbol store of one segment: either the global segment or a single
/// overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentMetadata {
    ranges: RomVramRange,
    name: Option<String>,

    category_name: Option<OverlayCategoryName>,

    symbols: AddendedOrderedMap<Vram, SymbolMetadata>,

    /// Word values found on data that look like pointers into a not yet
    /// analyzed section. Confirmed (symbolized) when that section runs.
    new_pointer_in_data: AddendedOrderedMap<Vram, PossiblePointerInData>,

    /// Address ranges the user banned from symbolization.
    ignored_ranges: Vec<AddressRange<Vram>>,

    /// Overlays (by name) this segment may reference even though they live
    /// on other categories.
    prioritised_overlays: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct PossiblePointerInData {
    referencing_roms: Vec<Rom>,
}

impl crate::addresses::SizedAddress for PossiblePointerInData {
    fn size(&self) -> Option<Size> {
        Some(Size::new(4))
    }
}

impl SegmentMetadata {
    pub(crate) const fn new(
        ranges: RomVramRange,
        name: Option<String>,
        category_name: Option<OverlayCategoryName>,
    ) -> Self {
        Self {
            ranges,
            name,
            category_name,
            symbols: AddendedOrderedMap::new(),
            new_pointer_in_data: AddendedOrderedMap::new(),
            ignored_ranges: Vec::new(),
            prioritised_overlays: Vec::new(),
        }
    }

    #[must_use]
    pub const fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }
    #[must_use]
    pub const fn rom_range(&self) -> &AddressRange<Rom> {
        self.ranges.rom()
    }
    #[must_use]
    pub const fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }
    #[must_use]
    pub fn in_rom_range(&self, rom: Rom) -> bool {
        self.ranges.in_rom_range(rom)
    }
    #[must_use]
    pub fn in_vram_range(&self, vram: Vram) -> bool {
        self.ranges.in_vram_range(vram)
    }

    pub(crate) fn expand_ranges(&mut self, other: &RomVramRange) {
        self.ranges.expand_ranges(other);
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub const fn category_name(&self) -> Option<&OverlayCategoryName> {
        self.category_name.as_ref()
    }

    #[must_use]
    pub const fn symbols(&self) -> &AddendedOrderedMap<Vram, SymbolMetadata> {
        &self.symbols
    }

    #[must_use]
    pub fn prioritised_overlays(&self) -> &[String] {
        &self.prioritised_overlays
    }
    pub(crate) fn add_prioritised_overlay(&mut self, name: String) {
        self.prioritised_overlays.push(name);
    }
}

impl SegmentMetadata {
    /// Addresses in here never become symbols.
    #[must_use]
    pub fn is_vram_ignored(&self, vram: Vram) -> bool {
        DEFAULT_BANNED_ADDRESSES.contains(&vram.inner())
            || self.ignored_ranges.iter().any(|x| x.in_range(vram))
    }

    pub(crate) fn add_ignored_address_range(&mut self, range: AddressRange<Vram>) {
        self.ignored_ranges.push(range);
    }
}

impl SegmentMetadata {
    pub(crate) fn add_symbol(
        &mut self,
        vram: Vram,
        generated_by: GeneratedBy,
        allow_sym_with_addend: bool,
    ) -> &mut SymbolMetadata {
        let (sym, _newly_created) = self.symbols.find_mut_or_insert_with(
            vram,
            FindSettings::new(allow_sym_with_addend),
            || (vram, SymbolMetadata::new(generated_by, vram)),
        );
        sym
    }

    pub(crate) fn add_symbol_with_rom(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
        section_type: Option<SectionType>,
        allow_sym_with_addend: bool,
    ) -> &mut SymbolMetadata {
        let sym = self.add_symbol(vram, generated_by, allow_sym_with_addend);
        if let Some(rom) = rom {
            *sym.rom_mut() = Some(rom);
        }
        if let Some(section_type) = section_type {
            if sym.section_type().is_none() {
                *sym.section_type_mut() = Some(section_type);
            }
        }
        sym
    }

    pub(crate) fn add_function(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym =
            self.add_symbol_with_rom(vram, rom, generated_by, Some(SectionType::Text), false);
        sym.set_type(SymbolType::Function, generated_by);
        sym
    }

    pub(crate) fn add_branch_label(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym =
            self.add_symbol_with_rom(vram, rom, generated_by, Some(SectionType::Text), false);
        match sym.sym_type() {
            Some(
                SymbolType::Function | SymbolType::JumptableLabel | SymbolType::GccExceptTableLabel,
            ) => {
                // Function starts and the fancier label kinds win over plain
                // branch labels. Still record what we detected, since the
                // winning type may have come from the user.
                if generated_by == GeneratedBy::Autogenerated {
                    match sym.autodetected_type() {
                        Some(
                            SymbolType::Function
                            | SymbolType::JumptableLabel
                            | SymbolType::GccExceptTableLabel,
                        ) => {}
                        _ => sym.set_type(SymbolType::BranchLabel, generated_by),
                    }
                }
            }
            _ => sym.set_type(SymbolType::BranchLabel, generated_by),
        }
        sym
    }

    pub(crate) fn add_jumptable(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym =
            self.add_symbol_with_rom(vram, rom, generated_by, Some(SectionType::Rodata), false);
        sym.set_type(SymbolType::Jumptable, generated_by);
        sym
    }

    pub(crate) fn add_jumptable_label(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym =
            self.add_symbol_with_rom(vram, rom, generated_by, Some(SectionType::Text), false);
        match sym.sym_type() {
            Some(SymbolType::Function | SymbolType::GccExceptTableLabel) => {
                if generated_by == GeneratedBy::Autogenerated {
                    match sym.autodetected_type() {
                        Some(SymbolType::Function | SymbolType::GccExceptTableLabel) => {}
                        _ => sym.set_type(SymbolType::JumptableLabel, generated_by),
                    }
                }
            }
            _ => sym.set_type(SymbolType::JumptableLabel, generated_by),
        }
        sym
    }

    pub(crate) fn add_gcc_except_table(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym = self.add_symbol_with_rom(
            vram,
            rom,
            generated_by,
            Some(SectionType::GccExceptTable),
            false,
        );
        sym.set_type(SymbolType::GccExceptTable, generated_by);
        sym
    }

    pub(crate) fn add_gcc_except_table_label(
        &mut self,
        vram: Vram,
        rom: Option<Rom>,
        generated_by: GeneratedBy,
    ) -> &mut SymbolMetadata {
        let sym =
            self.add_symbol_with_rom(vram, rom, generated_by, Some(SectionType::Text), false);
        match sym.sym_type() {
            Some(SymbolType::Function) => {
                if generated_by == GeneratedBy::Autogenerated {
                    match sym.autodetected_type() {
                        Some(SymbolType::Function) => {}
                        _ => sym.set_type(SymbolType::GccExceptTableLabel, generated_by),
                    }
                }
            }
            _ => sym.set_type(SymbolType::GccExceptTableLabel, generated_by),
        }
        sym
    }
}

impl SegmentMetadata {
    #[must_use]
    pub fn find_symbol(&self, vram: Vram, settings: FindSettings) -> Option<&SymbolMetadata> {
        self.symbols.find(&vram, settings)
    }

    #[must_use]
    pub fn find_symbol_mut(
        &mut self,
        vram: Vram,
        settings: FindSettings,
    ) -> Option<&mut SymbolMetadata> {
        self.symbols.find_mut(&vram, settings)
    }

    pub(crate) fn find_symbols_range(
        &self,
        vram_start: Vram,
        vram_end: Vram,
    ) -> addended_ordered_map::Range<'_, Vram, SymbolMetadata> {
        self.symbols.range(vram_start..vram_end)
    }
}

impl SegmentMetadata {
    pub(crate) fn add_possible_pointer_in_data(
        &mut self,
        possible_pointer: Vram,
        rom_referencing_it: Rom,
    ) {
        let (entry, _) = self.new_pointer_in_data.find_mut_or_insert_with(
            possible_pointer,
            FindSettings::new(false),
            || {
                (
                    possible_pointer,
                    PossiblePointerInData {
                        referencing_roms: Vec::new(),
                    },
                )
            },
        );
        entry.referencing_roms.push(rom_referencing_it);
    }

    #[must_use]
    pub(crate) fn is_vram_a_possible_pointer_in_data(&self, vram: Vram) -> bool {
        self.new_pointer_in_data
            .find(&vram, FindSettings::new(false))
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_segment() -> SegmentMetadata {
        let rom_range = AddressRange::new(Rom::new(0x1000), Rom::new(0x2000));
        let vram_range = AddressRange::new(Vram::new(0x80001000), Vram::new(0x80002000));
        SegmentMetadata::new(RomVramRange::new(rom_range, vram_range), None, None)
    }

    #[test]
    fn symbols_are_unique_per_vram() {
        let mut segment = test_segment();

        segment.add_symbol(Vram::new(0x80001000), GeneratedBy::Autogenerated, false);
        segment.add_symbol(Vram::new(0x80001000), GeneratedBy::Autogenerated, false);

        assert_eq!(segment.symbols().len(), 1);
    }

    #[test]
    fn addended_find_lands_on_the_covering_symbol() {
        let mut segment = test_segment();

        let sym = segment.add_symbol(Vram::new(0x80001000), GeneratedBy::Autogenerated, false);
        sym.set_autodetected_size(Size::new(0x10));
        segment.add_symbol(Vram::new(0x80001010), GeneratedBy::Autogenerated, false);

        let found = segment
            .find_symbol(Vram::new(0x80001008), FindSettings::new(true))
            .expect("should land inside the first symbol");
        assert_eq!(found.vram(), Vram::new(0x80001000));

        assert!(segment
            .find_symbol(Vram::new(0x80001008), FindSettings::new(false))
            .is_none());
    }

    #[test]
    fn user_labels_are_not_downgraded_by_autodetection() {
        let mut segment = test_segment();

        let sym = segment.add_function(Vram::new(0x80001100), None, GeneratedBy::UserDeclared);
        assert_eq!(sym.sym_type(), Some(SymbolType::Function));

        // A branch into a known function start must not turn it into a label.
        let sym =
            segment.add_branch_label(Vram::new(0x80001100), None, GeneratedBy::Autogenerated);
        assert_eq!(sym.sym_type(), Some(SymbolType::Function));
    }

    #[test]
    fn default_banned_addresses_are_ignored() {
        let segment = test_segment();
        assert!(segment.is_vram_ignored(Vram::new(0)));
        assert!(segment.is_vram_ignored(Vram::new(0x7FFFFFFF)));
        assert!(!segment.is_vram_ignored(Vram::new(0x80001000)));
    }

    #[test]
    fn user_ranges_shadow_symbolization() {
        let mut segment = test_segment();
        segment.add_ignored_address_range(AddressRange::new(
            Vram::new(0x80001800),
            Vram::new(0x80001900),
        ));

        assert!(segment.is_vram_ignored(Vram::new(0x80001880)));
        assert!(!segment.is_vram_ignored(Vram::new(0x80001900)));
    }
}
