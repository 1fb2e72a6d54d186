/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::vec::Vec;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size, Vram},
    collections::addended_ordered_map::FindSettings,
    config::Compiler,
    context::Context,
    metadata::{GeneratedBy, ParentSectionMetadata, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    relocation::{RelocReferencedSym, RelocationInfo, RelocationType},
    section_type::SectionType,
    str_decoding::Encoding,
    symbols::SymbolCreationError,
};

use super::{
    display::{SymDataDisplay, SymDataDisplaySettings, SymDisplayError},
    RomSymbol, Symbol,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolDataProperties {
    pub parent_metadata: ParentSectionMetadata,
    pub compiler: Option<Compiler>,
    pub auto_pad_by: Option<Vram>,
    pub detected_type: Option<SymbolType>,
    pub encoding: Encoding,
}

/// A slice of a data-like section (data, rodata or an exception table),
/// with a relocation slot per word.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SymbolData {
    ranges: RomVramRange,
    raw_bytes: Vec<u8>,
    parent_segment_info: ParentSegmentInfo,
    in_section_offset: usize,
    section_type: SectionType,
    encoding: Encoding,

    relocs: Vec<Option<RelocationInfo>>,
}

impl SymbolData {
    #[expect(clippy::too_many_arguments)]
    pub(crate) fn new(
        context: &mut Context,
        raw_bytes: Vec<u8>,
        rom: Rom,
        vram: Vram,
        in_section_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        section_type: SectionType,
        properties: SymbolDataProperties,
    ) -> Result<Self, SymbolCreationError> {
        let size = Size::new(raw_bytes.len() as u32);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        let endian = context.global_config().endian();
        let is_pic = context
            .global_config()
            .gp_config()
            .is_some_and(|x| x.pic());

        let sym_type = {
            let owned_segment = context.find_owned_segment_mut(&parent_segment_info)?;
            let sym = owned_segment.add_symbol_with_rom(
                vram,
                Some(rom),
                GeneratedBy::Autogenerated,
                Some(section_type),
                false,
            );
            sym.set_defined();
            sym.set_autodetected_size(size);
            sym.set_parent_metadata(properties.parent_metadata.clone());
            sym.set_compiler(properties.compiler);
            if let Some(detected_type) = properties.detected_type {
                sym.set_type(detected_type, GeneratedBy::Autogenerated);
            }
            if let Some(pad_by) = properties.auto_pad_by {
                sym.set_autocreated_pad_by(pad_by);
            }
            sym.sym_type()
        };

        let mut relocs = vec![None; raw_bytes.len().div_ceil(4)];

        let should_search_for_address =
            sym_type.is_none_or(|x| x.can_reference_symbols());
        let is_table = sym_type.is_some_and(|x| x.is_table());

        if vram.inner() % 4 == 0 && should_search_for_address {
            for (i, word_bytes) in raw_bytes.chunks_exact(4).enumerate() {
                let word_rom = rom + Size::new((i * 4) as u32);

                if let Some(user_reloc) = context.user_relocs().get(word_rom) {
                    relocs[i] = Some(user_reloc.clone());
                    continue;
                }

                let word_vram = Vram::new(endian.word_from_bytes(word_bytes));

                let referenced = context
                    .find_referenced_segment(word_vram, &parent_segment_info)
                    .is_some_and(|segment| {
                        !segment.is_vram_ignored(word_vram)
                            && segment
                                .find_symbol(
                                    word_vram,
                                    FindSettings::new(true)
                                        .with_reject_sizeless_addended(false),
                                )
                                .is_some_and(|sym| sym.can_be_referenced())
                    });

                if referenced {
                    if let Some(segment) =
                        context.find_referenced_segment_mut(word_vram, &parent_segment_info)
                    {
                        if let Some(target) =
                            segment.find_symbol_mut(word_vram, FindSettings::new(true))
                        {
                            target.add_reference_symbol(vram);
                        }
                    }

                    let reloc_type = if is_table && is_pic {
                        // PIC jumptables hold `$gp`-relative words.
                        RelocationType::R_MIPS_GPREL32
                    } else {
                        RelocationType::R_MIPS_32
                    };
                    relocs[i] =
                        Some(reloc_type.new_reloc_info(RelocReferencedSym::Address(word_vram)));
                }
            }
        }

        Ok(Self {
            ranges,
            raw_bytes,
            parent_segment_info,
            in_section_offset,
            section_type,
            encoding: properties.encoding,
            relocs,
        })
    }
}

impl SymbolData {
    #[must_use]
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw_bytes
    }

    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }

    #[must_use]
    pub const fn in_section_offset(&self) -> usize {
        self.in_section_offset
    }

    pub fn display<'ctx, 'sym, 'flg>(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg SymDataDisplaySettings,
    ) -> Result<SymDataDisplay<'ctx, 'sym, 'flg>, SymDisplayError> {
        SymDataDisplay::new(context, self, settings)
    }
}

impl Symbol for SymbolData {
    fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    fn section_type(&self) -> SectionType {
        self.section_type
    }
}

impl RomSymbol for SymbolData {
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }

    fn relocs(&self) -> &[Option<RelocationInfo>] {
        &self.relocs
    }
}
