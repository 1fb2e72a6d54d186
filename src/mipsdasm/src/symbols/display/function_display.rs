/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use alloc::collections::btree_map::BTreeMap;
use alloc::string::{String, ToString};

use rabbitizer::{display_flags::InstructionDisplayFlags, Instruction};

use crate::{
    addresses::Vram,
    collections::addended_ordered_map::FindSettings,
    context::Context,
    metadata::{SegmentMetadata, SymbolMetadata, SymbolType},
    relocation::{RelocationInfo, RelocationType},
    symbols::{RomSymbol, Symbol, SymbolFunction},
};

use super::{InternalSymDisplSettings, SymCommonDisplaySettings, SymDisplayError, WordComment};

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDisplaySettings {
    common: SymCommonDisplaySettings,
    display_flags: InstructionDisplayFlags,
    gp_rel_hack: bool,
}

impl FunctionDisplaySettings {
    pub fn new(display_flags: InstructionDisplayFlags) -> Self {
        Self {
            common: SymCommonDisplaySettings::new(),
            display_flags,
            gp_rel_hack: false,
        }
    }

    pub fn with_common(self, common: SymCommonDisplaySettings) -> Self {
        Self { common, ..self }
    }

    /// Emit `%gp_rel` accesses as plain symbols plus `.extern` stubs, so an
    /// assembler invoked with the right `-G` reproduces the original words.
    pub fn with_gp_rel_hack(self, gp_rel_hack: bool) -> Self {
        Self {
            gp_rel_hack,
            ..self
        }
    }

    #[must_use]
    pub const fn common(&self) -> &SymCommonDisplaySettings {
        &self.common
    }
}

/// `fmt::Display` view of one function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym SymbolFunction,
    settings: &'flg FunctionDisplaySettings,

    owned_segment: &'ctx SegmentMetadata,
    metadata: &'ctx SymbolMetadata,

    /// Branch label indices for `.L_<func>_<n>` sequential naming.
    sequential_label_indices: BTreeMap<Vram, usize>,

    internal_settings: InternalSymDisplSettings,
}

impl<'ctx, 'sym, 'flg> FunctionDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym SymbolFunction,
        settings: &'flg FunctionDisplaySettings,
    ) -> Result<Self, SymDisplayError> {
        Self::new_internal(context, sym, settings, InternalSymDisplSettings::new(false))
    }

    pub(crate) fn new_internal(
        context: &'ctx Context,
        sym: &'sym SymbolFunction,
        settings: &'flg FunctionDisplaySettings,
        internal_settings: InternalSymDisplSettings,
    ) -> Result<Self, SymDisplayError> {
        let owned_segment = context.find_owned_segment(sym.parent_segment_info())?;
        let metadata = owned_segment
            .find_symbol(sym.vram_range().start(), FindSettings::new(false))
            .ok_or(SymDisplayError::SelfSymNotFound())?;

        let mut sequential_label_indices = BTreeMap::new();
        if context.global_config().naming().sequential_label_names() {
            let range = sym.vram_range();
            for (label_vram, label) in
                owned_segment.find_symbols_range(range.start(), range.end())
            {
                if label.sym_type() == Some(SymbolType::BranchLabel) {
                    let index = sequential_label_indices.len();
                    sequential_label_indices.insert(*label_vram, index);
                }
            }
        }

        Ok(Self {
            context,
            sym,
            settings,
            owned_segment,
            metadata,
            sequential_label_indices,
            internal_settings,
        })
    }
}

impl FunctionDisplay<'_, '_, '_> {
    fn line_end(&self) -> &str {
        self.settings.common.line_end()
    }

    fn sequential_label_name(&self, label_vram: Vram) -> Option<String> {
        let index = self.sequential_label_indices.get(&label_vram)?;
        let func_name = self
            .metadata
            .display_name(self.context.global_config().naming());
        Some(format!(".L_{}_{}", func_name, index))
    }

    fn display_label(&self, f: &mut fmt::Formatter<'_>, current_vram: Vram) -> fmt::Result {
        if current_vram == self.sym.vram_range().start() {
            // The symbol's own label was already emitted.
            return Ok(());
        }

        let Some(sym_label) = self
            .owned_segment
            .find_symbol(current_vram, FindSettings::new(false))
        else {
            return Ok(());
        };
        let Some(label_type) = sym_label.sym_type() else {
            return Ok(());
        };

        let indentation = self.settings.common.asm_indentation_labels();
        if indentation > 0 {
            write!(f, "{:width$}", " ", width = indentation as usize)?;
        }

        let config = self.context.global_config();
        let name = sym_label.display_name(config.naming());
        match label_type {
            SymbolType::Function => {
                // A function that couldn't be split out, usually because it
                // shares its body with the current one.
                write!(f, "{} {}{}", config.macro_labels().func(), name, self.line_end())
            }
            SymbolType::JumptableLabel => {
                write!(
                    f,
                    "{} {}{}",
                    config.macro_labels().jtbl_label(),
                    name,
                    self.line_end()
                )
            }
            SymbolType::GccExceptTableLabel => {
                write!(
                    f,
                    "{} {}{}",
                    config.macro_labels().ehtbl_label(),
                    name,
                    self.line_end()
                )
            }
            _ => {
                if let Some(sequential) = self.sequential_label_name(current_vram) {
                    write!(f, "{}:{}", sequential, self.line_end())
                } else {
                    write!(f, "{}:{}", name, self.line_end())
                }
            }
        }
    }

    fn get_reloc(&self, instr: &Instruction) -> Option<&RelocationInfo> {
        let index = (instr.vram() - self.sym.vram_range().start()).inner() / 4;
        self.sym.relocs()[index as usize]
            .as_ref()
            .filter(|x| !x.reloc_type().is_none())
    }

    fn reloc_override_string(&self, instr: &Instruction) -> Option<String> {
        let reloc = self.get_reloc(instr)?;

        if self.context.global_config().naming().sequential_label_names()
            && reloc.reloc_type() == RelocationType::R_MIPS_PC16
        {
            if let crate::relocation::RelocReferencedSym::Address(target) = reloc.referenced_sym()
            {
                if let Some(sequential) = self.sequential_label_name(*target) {
                    return Some(sequential);
                }
            }
        }

        let find_settings =
            FindSettings::new(true).with_reject_sizeless_addended(false);
        reloc
            .display(
                self.context,
                self.sym.parent_segment_info(),
                find_settings,
                self.metadata.compiler(),
                self.internal_settings.migrate(),
                self.settings.gp_rel_hack,
            )
            .map(|x| x.to_string())
    }

    fn display_instruction(
        &self,
        f: &mut fmt::Formatter<'_>,
        instr: &Instruction,
        prev_instr_had_delay_slot: bool,
    ) -> fmt::Result {
        let current_vram = instr.vram();
        let rom = self.sym.rom_from_vram(current_vram);

        self.settings.common.display_asm_comment(
            f,
            rom,
            current_vram,
            WordComment::U32(instr.word()),
        )?;
        write!(f, "  ")?;
        if prev_instr_had_delay_slot {
            write!(f, " ")?;
        }

        let imm_override = self.reloc_override_string(instr);
        let line = instr
            .display(
                &self.settings.display_flags,
                imm_override.as_deref(),
                0,
            )
            .to_string();

        // The gpRelHack form drops the `($gp)` base so the assembler picks
        // the expansion itself from its `-G` setting.
        let line = if self.settings.gp_rel_hack
            && self
                .get_reloc(instr)
                .is_some_and(|x| x.reloc_type() == RelocationType::R_MIPS_GPREL16)
        {
            line.strip_suffix("($gp)").unwrap_or(&line).to_string()
        } else {
            line
        };

        write!(f, "{}{}", line, self.line_end())
    }

    fn display_cpload(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.settings.common.display_asm_comment(
            f,
            None,
            self.sym.vram_range().start(),
            WordComment::No,
        )?;
        write!(f, "  .cpload $t9{}", self.line_end())
    }

    fn display_extern_stubs(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.settings.gp_rel_hack {
            return Ok(());
        }

        let naming = self.context.global_config().naming();
        for gp_rel_vram in self.sym.gp_rel_vrams() {
            if let Some(segment) = self
                .context
                .find_referenced_segment(*gp_rel_vram, self.sym.parent_segment_info())
            {
                if let Some(sym) = segment.find_symbol(
                    *gp_rel_vram,
                    FindSettings::new(true).with_reject_sizeless_addended(false),
                ) {
                    write!(
                        f,
                        ".extern {}, {}{}",
                        sym.display_name(naming),
                        sym.size_or_default(),
                        self.line_end()
                    )?;
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for FunctionDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.context.global_config();

        self.settings
            .common
            .display_sym_prev_alignment(f, self.metadata)?;
        self.display_extern_stubs(f)?;
        self.settings
            .common
            .display_symbol_name(f, config, self.metadata)?;

        let emit_cpload = config.emit_cpload() && !self.sym.cpload_roms().is_empty();
        let first_cpload_rom = self.sym.cpload_roms().iter().next().copied();
        let mut cpload_emitted = false;

        let mut prev_instr_had_delay_slot = false;
        for instr in self.sym.instructions() {
            let current_vram = instr.vram();
            self.display_label(f, current_vram)?;

            let rom = self
                .sym
                .rom_from_vram(current_vram)
                .expect("Instructions always have a rom address");
            if emit_cpload && self.sym.cpload_roms().contains(&rom) {
                // The whole preamble collapses into one `.cpload`.
                if Some(rom) == first_cpload_rom && !cpload_emitted {
                    self.display_cpload(f)?;
                    cpload_emitted = true;
                }
                prev_instr_had_delay_slot = false;
                continue;
            }

            self.display_instruction(f, instr, prev_instr_had_delay_slot)?;
            prev_instr_had_delay_slot = instr.opcode().has_delay_slot();
        }

        self.settings
            .common
            .display_sym_end(f, config, self.metadata)
    }
}
