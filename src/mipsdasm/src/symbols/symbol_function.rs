/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_set::BTreeSet;
use alloc::vec::Vec;

use rabbitizer::Instruction;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size, Vram},
    analysis::{InstructionAnalysisResult, InstructionAnalyzer},
    config::Compiler,
    context::Context,
    metadata::{GeneratedBy, ParentSectionMetadata},
    parent_segment_info::ParentSegmentInfo,
    relocation::{RelocReferencedSym, RelocationInfo, RelocationType},
    section_type::SectionType,
    symbols::SymbolCreationError,
};

use super::{
    display::{FunctionDisplay, FunctionDisplaySettings, SymDisplayError},
    RomSymbol, Symbol,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFunctionProperties {
    pub parent_metadata: ParentSectionMetadata,
    pub compiler: Option<Compiler>,
    pub auto_pad_by: Option<Vram>,
}

/// A single function: its decoded instructions plus one relocation slot per
/// instruction, produced from the stream analysis.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SymbolFunction {
    ranges: RomVramRange,
    instructions: Vec<Instruction>,
    parent_segment_info: ParentSegmentInfo,
    in_section_offset: usize,

    relocs: Vec<Option<RelocationInfo>>,

    referenced_vrams: BTreeSet<Vram>,
    gp_rel_vrams: BTreeSet<Vram>,
    cpload_roms: BTreeSet<Rom>,
    handwritten_instrs: BTreeSet<Rom>,
}

impl SymbolFunction {
    pub(crate) fn new(
        context: &mut Context,
        instructions: Vec<Instruction>,
        rom: Rom,
        vram: Vram,
        in_section_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        properties: SymbolFunctionProperties,
    ) -> Result<Self, SymbolCreationError> {
        let size = Size::new((instructions.len() * 4) as u32);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        let analysis =
            InstructionAnalyzer::analyze(context, ranges, &instructions, properties.compiler);

        Self::register_own_symbol(context, &parent_segment_info, ranges, &properties)?;
        Self::register_referenced_symbols(context, &parent_segment_info, ranges, &analysis)?;

        let relocs = Self::generate_relocs(context, &instructions, rom, &analysis);

        let gp_rel_vrams = analysis.gp_rel_per_instr().values().copied().collect();

        Ok(Self {
            ranges,
            instructions,
            parent_segment_info,
            in_section_offset,
            relocs,
            referenced_vrams: analysis.referenced_vrams().clone(),
            gp_rel_vrams,
            cpload_roms: analysis.cpload_roms().clone(),
            handwritten_instrs: analysis.handwritten_instrs().clone(),
        })
    }

    fn register_own_symbol(
        context: &mut Context,
        parent_segment_info: &ParentSegmentInfo,
        ranges: RomVramRange,
        properties: &SymbolFunctionProperties,
    ) -> Result<(), SymbolCreationError> {
        let vram = ranges.vram().start();
        let owned_segment = context.find_owned_segment_mut(parent_segment_info)?;

        let sym = owned_segment.add_function(
            vram,
            Some(ranges.rom().start()),
            GeneratedBy::Autogenerated,
        );
        sym.set_defined();
        sym.set_autodetected_size(ranges.vram().size());
        sym.set_parent_metadata(properties.parent_metadata.clone());
        sym.set_compiler(properties.compiler);
        if let Some(pad_by) = properties.auto_pad_by {
            sym.set_autocreated_pad_by(pad_by);
        }

        Ok(())
    }

    fn register_referenced_symbols(
        context: &mut Context,
        parent_segment_info: &ParentSegmentInfo,
        ranges: RomVramRange,
        analysis: &InstructionAnalysisResult,
    ) -> Result<(), SymbolCreationError> {
        let self_vram = ranges.vram().start();

        // Branch targets stay inside the function, so they always land on
        // the owned segment.
        let owned_segment = context.find_owned_segment_mut(parent_segment_info)?;
        for target_vram in analysis.branch_targets().values() {
            let label_rom = ranges.rom_from_vram(*target_vram);
            let label =
                owned_segment.add_branch_label(*target_vram, label_rom, GeneratedBy::Autogenerated);
            label.set_parent_function(self_vram);
        }

        for target_vram in analysis.func_calls().values() {
            if let Some(segment) = context.find_referenced_segment_mut(*target_vram, parent_segment_info)
            {
                if segment.is_vram_ignored(*target_vram) {
                    continue;
                }
                let callee = segment.add_function(*target_vram, None, GeneratedBy::Autogenerated);
                callee.add_reference_function(self_vram);
            }
        }

        for (table_vram, _is_pic) in analysis.referenced_jumptables().values() {
            if let Some(segment) =
                context.find_referenced_segment_mut(*table_vram, parent_segment_info)
            {
                if segment.is_vram_ignored(*table_vram) {
                    continue;
                }
                let table = segment.add_jumptable(*table_vram, None, GeneratedBy::Autogenerated);
                table.set_parent_function(self_vram);
                table.add_reference_function(self_vram);
            }
        }

        // Everything the hi/lo and %gp_rel pairings resolved.
        let mut paired_addresses: BTreeSet<Vram> = BTreeSet::new();
        paired_addresses.extend(analysis.address_per_lo_instr().values().copied());
        paired_addresses.extend(analysis.gp_rel_per_instr().values().copied());

        for address in paired_addresses {
            let Some(segment) = context.find_referenced_segment_mut(address, parent_segment_info)
            else {
                continue;
            };
            if segment.is_vram_ignored(address) {
                continue;
            }

            // Attach to a covering symbol when one exists; `sym + addend`
            // references shouldn't split their target.
            let sym = segment.add_symbol(address, GeneratedBy::Autogenerated, true);
            sym.add_reference_function(self_vram);
        }

        for (address, accesses) in analysis.access_per_address() {
            if let Some(segment) = context.find_referenced_segment_mut(*address, parent_segment_info)
            {
                if segment.is_vram_ignored(*address) {
                    continue;
                }
                if let Some(sym) =
                    segment.find_symbol_mut(*address, crate::collections::addended_ordered_map::FindSettings::new(true))
                {
                    for (access_type, unsigned) in accesses {
                        sym.add_access_type(*access_type, *unsigned);
                        if sym.vram() == *address && sym.autodetected_type().is_none() {
                            if let Some(t) =
                                crate::metadata::SymbolType::from_access_type(*access_type, *unsigned)
                            {
                                sym.set_type(t, GeneratedBy::Autogenerated);
                            }
                        }
                    }
                }
            }
        }

        for address in analysis.gp_rel_per_instr().values() {
            if let Some(segment) = context.find_referenced_segment_mut(*address, parent_segment_info)
            {
                if let Some(sym) = segment.find_symbol_mut(
                    *address,
                    crate::collections::addended_ordered_map::FindSettings::new(true),
                ) {
                    sym.set_gp_rel_accessed();
                }
            }
        }

        Ok(())
    }

    fn generate_relocs(
        context: &Context,
        instructions: &[Instruction],
        rom: Rom,
        analysis: &InstructionAnalysisResult,
    ) -> Vec<Option<RelocationInfo>> {
        let mut relocs = vec![None; instructions.len()];

        for (i, reloc) in relocs.iter_mut().enumerate() {
            let instr_rom = rom + Size::new((i * 4) as u32);

            if let Some(user_reloc) = context.user_relocs().get(instr_rom) {
                // External relocs always win, including `R_MIPS_NONE`
                // ("leave this word alone").
                *reloc = Some(user_reloc.clone());
                continue;
            }

            *reloc = Self::reloc_for_rom(analysis, instr_rom);
        }

        relocs
    }

    fn reloc_for_rom(analysis: &InstructionAnalysisResult, instr_rom: Rom) -> Option<RelocationInfo> {
        if let Some(target_vram) = analysis.func_calls().get(&instr_rom) {
            return Some(
                RelocationType::R_MIPS_26
                    .new_reloc_info(RelocReferencedSym::Address(*target_vram)),
            );
        }
        if let Some(target_vram) = analysis.branch_targets().get(&instr_rom) {
            return Some(
                RelocationType::R_MIPS_PC16
                    .new_reloc_info(RelocReferencedSym::Address(*target_vram)),
            );
        }
        if let Some(access) = analysis.got_per_instr().get(&instr_rom) {
            let reloc_type = if access.call16 {
                RelocationType::R_MIPS_CALL16
            } else {
                RelocationType::R_MIPS_GOT16
            };
            let referenced = match &access.sym_name {
                Some(name) => RelocReferencedSym::SymName(name.clone(), 0),
                None => RelocReferencedSym::Address(access.address),
            };
            return Some(reloc_type.new_reloc_info(referenced));
        }
        if let Some(address) = analysis.address_per_hi_instr().get(&instr_rom) {
            return Some(
                RelocationType::R_MIPS_HI16.new_reloc_info(RelocReferencedSym::Address(*address)),
            );
        }
        if let Some(address) = analysis.address_per_lo_instr().get(&instr_rom) {
            return Some(
                RelocationType::R_MIPS_LO16.new_reloc_info(RelocReferencedSym::Address(*address)),
            );
        }
        if let Some(address) = analysis.gp_rel_per_instr().get(&instr_rom) {
            return Some(
                RelocationType::R_MIPS_GPREL16
                    .new_reloc_info(RelocReferencedSym::Address(*address)),
            );
        }
        if let Some(constant) = analysis.constant_per_instr().get(&instr_rom) {
            let reloc_type = if analysis.is_hi_instr(instr_rom) {
                RelocationType::R_CUSTOM_CONSTANT_HI
            } else {
                RelocationType::R_CUSTOM_CONSTANT_LO
            };
            return Some(
                reloc_type.new_reloc_info(RelocReferencedSym::SymName(
                    format!("0x{:X}", constant),
                    0,
                )),
            );
        }

        None
    }
}

impl SymbolFunction {
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    #[must_use]
    pub fn referenced_vrams(&self) -> &BTreeSet<Vram> {
        &self.referenced_vrams
    }

    #[must_use]
    pub fn gp_rel_vrams(&self) -> &BTreeSet<Vram> {
        &self.gp_rel_vrams
    }

    #[must_use]
    pub fn cpload_roms(&self) -> &BTreeSet<Rom> {
        &self.cpload_roms
    }

    #[must_use]
    pub fn handwritten_instrs(&self) -> &BTreeSet<Rom> {
        &self.handwritten_instrs
    }

    #[must_use]
    pub const fn in_section_offset(&self) -> usize {
        self.in_section_offset
    }

    #[must_use]
    pub fn is_likely_handwritten(&self) -> bool {
        !self.handwritten_instrs.is_empty()
    }

    pub fn display<'ctx, 'sym, 'flg>(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg FunctionDisplaySettings,
    ) -> Result<FunctionDisplay<'ctx, 'sym, 'flg>, SymDisplayError> {
        FunctionDisplay::new(context, self, settings)
    }
}

impl Symbol for SymbolFunction {
    fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    fn section_type(&self) -> SectionType {
        SectionType::Text
    }
}

impl RomSymbol for SymbolFunction {
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }

    fn relocs(&self) -> &[Option<RelocationInfo>] {
        &self.relocs
    }
}
