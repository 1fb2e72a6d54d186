/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use alloc::vec::Vec;

use rabbitizer::{Instruction, InstructionFlags, VramOffset};

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size, UserSize, Vram},
    collections::{addended_ordered_map::FindSettings, UnorderedSet},
    config::Compiler,
    context::Context,
    metadata::{GeneratedBy, ParentSectionMetadata},
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::{SymbolFunction, SymbolFunctionProperties},
};

use super::{RomSection, Section, SectionCreationError};

/// An executable section, split into functions by walking its instruction
/// stream.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SectionText {
    name: String,

    ranges: RomVramRange,

    parent_segment_info: ParentSegmentInfo,

    functions: Vec<SymbolFunction>,

    symbol_vrams: UnorderedSet<Vram>,
}

impl SectionText {
    pub(crate) fn new(
        context: &mut Context,
        settings: &SectionTextSettings,
        name: String,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, SectionCreationError> {
        if raw_bytes.is_empty() {
            return Err(SectionCreationError::EmptySection { name });
        }
        if raw_bytes.len() % 4 != 0 {
            return Err(SectionCreationError::BadBytesSize {
                name,
                size: raw_bytes.len(),
                multiple_of: 4,
            });
        }
        if vram.inner() % 4 != 0 {
            return Err(SectionCreationError::UnalignedVram { name, vram });
        }
        if rom.inner() % 4 != 0 {
            return Err(SectionCreationError::UnalignedRom { name, rom });
        }

        let size = Size::new(raw_bytes.len() as u32);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        let instrs = instrs_from_bytes(settings, context, raw_bytes, vram);
        let funcs_start_data = find_functions(settings, context, &parent_segment_info, ranges, &instrs)?;

        let mut functions = Vec::new();
        let mut symbol_vrams = UnorderedSet::new();

        for (i, (start, _contains_invalid)) in funcs_start_data.iter().enumerate() {
            let end = if i + 1 < funcs_start_data.len() {
                funcs_start_data[i + 1].0
            } else {
                instrs.len()
            };
            debug_assert!(*start < end, "{:?} {:?} {} {}", rom, vram, *start, end);

            let local_offset = start * 4;
            let offset_size = Size::new(local_offset as u32);
            let current_vram = vram + offset_size;
            let current_rom = rom + offset_size;

            symbol_vrams.insert(current_vram);

            let properties = SymbolFunctionProperties {
                parent_metadata: ParentSectionMetadata::new(name.clone(), vram),
                compiler: settings.compiler,
                auto_pad_by: (i > 0).then_some(vram),
            };
            let func = SymbolFunction::new(
                context,
                instrs[*start..end].into(),
                current_rom,
                current_vram,
                local_offset,
                parent_segment_info.clone(),
                properties,
            )?;

            functions.push(func);
        }

        Ok(Self {
            name,
            ranges,
            parent_segment_info,
            functions,
            symbol_vrams,
        })
    }

    pub fn functions(&self) -> &[SymbolFunction] {
        &self.functions
    }
}

fn instrs_from_bytes(
    settings: &SectionTextSettings,
    context: &Context,
    raw_bytes: &[u8],
    mut vram: Vram,
) -> Vec<Instruction> {
    let mut instrs = Vec::new();
    let endian = context.global_config().endian();

    for b in raw_bytes.chunks_exact(4) {
        let word = endian.word_from_bytes(b);

        instrs.push(Instruction::new(word, vram, settings.instruction_flags));
        vram += VramOffset::new(4);
    }

    instrs
}

/// Phase A: function boundary discovery.
///
/// Returns `(instruction index, contains_invalid)` for each detected
/// function start.
fn find_functions(
    settings: &SectionTextSettings,
    context: &mut Context,
    parent_segment_info: &ParentSegmentInfo,
    section_ranges: RomVramRange,
    instrs: &[Instruction],
) -> Result<Vec<(usize, bool)>, SectionCreationError> {
    if instrs.is_empty() {
        return Ok(vec![(0, false)]);
    }

    let mut starts_data = Vec::new();

    let mut function_ended = false;
    let mut farthest_branch = VramOffset::new(0);

    let mut index = 0;
    let mut local_offset = 0;
    let mut current_function_start = local_offset;
    let mut current_function_sym = find_sym_at(
        context,
        parent_segment_info,
        section_ranges.vram().start(),
    )?;

    let mut prev_start = index;
    let mut contains_invalid = false;
    let mut is_likely_handwritten = settings.is_handwritten;

    let mut prev_func_had_user_declared_size = false;

    if instrs[0].is_nop() {
        // Leading nops are inter-function padding, not part of whatever
        // comes afterwards.
        while index < instrs.len() {
            if current_function_sym.is_some() || !instrs[index].is_nop() {
                break;
            }

            index += 1;
            local_offset += 4;
            current_function_start = local_offset;
            current_function_sym = find_sym_at(
                context,
                parent_segment_info,
                section_ranges.vram().start() + Size::new(local_offset as u32),
            )?;
        }

        if index != 0 {
            starts_data.push((prev_start, contains_invalid));
            prev_start = index;
        }
    }

    while index < instrs.len() {
        if !instrs[index].is_valid() {
            contains_invalid = true;
        }

        if function_ended {
            function_ended = false;
            is_likely_handwritten = settings.is_handwritten;
            index += 1;
            local_offset += 4;

            let mut aux_sym = find_sym_at(
                context,
                parent_segment_info,
                section_ranges.vram().start() + Size::new(local_offset as u32),
            )?;

            // Skip the padding between functions.
            while index < instrs.len() {
                if aux_sym.is_some() || !instrs[index].is_nop() {
                    break;
                }

                index += 1;
                local_offset += 4;

                aux_sym = find_sym_at(
                    context,
                    parent_segment_info,
                    section_ranges.vram().start() + Size::new(local_offset as u32),
                )?;
            }

            current_function_start = local_offset;
            current_function_sym = aux_sym;

            starts_data.push((prev_start, contains_invalid));
            prev_start = index;

            if index >= instrs.len() {
                return Ok(starts_data);
            }

            if prev_func_had_user_declared_size {
                // The previous function was cut by its declared size, so
                // whatever comes next starts a function even if nothing
                // else hints at it.
                let vram = section_ranges.vram().start() + Size::new(local_offset as u32);
                let rom = section_ranges.rom().start() + Size::new(local_offset as u32);
                let aux_sym = context
                    .find_owned_segment_mut(parent_segment_info)?
                    .add_function(vram, Some(rom), GeneratedBy::Autogenerated);
                aux_sym.set_autocreated_pad_by(section_ranges.vram().start());

                current_function_sym =
                    find_sym_at(context, parent_segment_info, vram)?;
            }

            prev_func_had_user_declared_size = false;
            contains_invalid = !instrs[index].is_valid();
        }

        let instr = &instrs[index];

        if !is_likely_handwritten {
            is_likely_handwritten = instr.is_likely_handwritten();
        }

        if instr.opcode().is_branch() || instr.is_unconditional_branch() {
            let halt_function_searching;
            (farthest_branch, halt_function_searching) = find_functions_branch_checker(
                context,
                parent_segment_info,
                section_ranges,
                local_offset,
                instr,
                &mut starts_data,
                farthest_branch,
                is_likely_handwritten,
                contains_invalid,
            )?;
            if halt_function_searching {
                break;
            }
        }

        (function_ended, prev_func_had_user_declared_size) = find_functions_check_function_ended(
            context,
            settings,
            parent_segment_info,
            local_offset,
            instr,
            instrs,
            section_ranges,
            current_function_sym,
            farthest_branch,
            current_function_start,
        )?;

        index += 1;
        farthest_branch = VramOffset::new(farthest_branch.inner() - 4);
        local_offset += 4;
    }

    if prev_start != index {
        starts_data.push((prev_start, contains_invalid));
    }

    if context.global_config().detect_redundant_function_end() {
        // IDO with `-g` duplicates the `jr $ra`/`nop` epilogue; the copy is
        // not a real function, just unreachable bytes of the previous one.
        let mut i = 1;
        while i < starts_data.len() {
            let (start, _) = starts_data[i];
            let end = if i + 1 < starts_data.len() {
                starts_data[i + 1].0
            } else {
                instrs.len()
            };

            let vram = section_ranges.vram().start() + Size::new((start * 4) as u32);
            let is_declared = find_sym_at(context, parent_segment_info, vram)?.is_some();

            if end - start == 2
                && !is_declared
                && instrs[start].is_return()
                && instrs[start + 1].is_nop()
            {
                starts_data.remove(i);
            } else {
                i += 1;
            }
        }
    }

    Ok(starts_data)
}

// Copied out of the metadata so the borrow doesn't outlive one loop step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FuncSymInfo {
    vram: Vram,
    user_declared_size: Option<UserSize>,
}

fn find_sym_at(
    context: &Context,
    parent_segment_info: &ParentSegmentInfo,
    vram: Vram,
) -> Result<Option<FuncSymInfo>, SectionCreationError> {
    Ok(context
        .find_owned_segment(parent_segment_info)?
        .find_symbol(vram, FindSettings::new(false))
        .map(|sym| FuncSymInfo {
            vram: sym.vram(),
            user_declared_size: sym.user_declared_size(),
        }))
}

#[expect(clippy::too_many_arguments)]
fn find_functions_branch_checker(
    context: &Context,
    parent_segment_info: &ParentSegmentInfo,
    section_ranges: RomVramRange,
    local_offset: usize,
    instr: &Instruction,
    starts_data: &mut Vec<(usize, bool)>,
    mut farthest_branch: VramOffset,
    is_likely_handwritten: bool,
    contains_invalid: bool,
) -> Result<(VramOffset, bool), SectionCreationError> {
    let mut halt_function_searching = false;

    if instr.opcode().is_jump_with_address() {
        // A `j` into a known function is a tail call, not a branch; don't
        // let it mess with the boundary tracking.
        if let Some(target_vram) = instr.get_instr_index_as_vram() {
            if let Some(aux_sym) = context.find_owned_segment(parent_segment_info)?.find_symbol(
                target_vram,
                FindSettings::new(false).with_reject_sizeless_addended(false),
            ) {
                if aux_sym.is_trustable_function() {
                    return Ok((farthest_branch, halt_function_searching));
                }
            }
        }
    }

    if let Some(branch_offset) = instr.get_branch_offset_generic() {
        if branch_offset > farthest_branch {
            farthest_branch = branch_offset;
        }
        if branch_offset.is_negative() {
            if branch_offset.inner() + (local_offset as i32) < 0
                && (!instr.opcode().is_jump() || instr.flags().j_as_branch())
            {
                // A branch before the section start means this is not real
                // code. `j` is exempt when treated as a jump: jumping
                // backwards out of the function is legal.
                halt_function_searching = true;
            } else if !is_likely_handwritten && !contains_invalid {
                // A backwards branch into what we thought was an earlier
                // function merges the two: drop the starts in between,
                // unless something trustable claims they are functions.
                let owned_segment = context.find_owned_segment(parent_segment_info)?;
                let mut j = starts_data.len() as i32 - 1;
                while j >= 0 {
                    let other_func_start_offset = starts_data[j as usize].0 * 4;
                    if branch_offset.inner() + (local_offset as i32)
                        < other_func_start_offset as i32
                    {
                        let vram = section_ranges.vram().start()
                            + Size::new(other_func_start_offset as u32);

                        if let Some(func_symbol) =
                            owned_segment.find_symbol(vram, FindSettings::new(false))
                        {
                            if func_symbol.is_trustable_function() {
                                j -= 1;
                                continue;
                            }
                        }
                        starts_data.remove(j as usize);
                    } else {
                        break;
                    }
                    j -= 1;
                }
            }
        }
    }

    Ok((farthest_branch, halt_function_searching))
}

#[expect(clippy::too_many_arguments)]
fn find_functions_check_function_ended(
    context: &Context,
    settings: &SectionTextSettings,
    parent_segment_info: &ParentSegmentInfo,
    local_offset: usize,
    instr: &Instruction,
    instrs: &[Instruction],
    section_ranges: RomVramRange,
    current_function_sym: Option<FuncSymInfo>,
    farthest_branch: VramOffset,
    current_function_start: usize,
) -> Result<(bool, bool), SectionCreationError> {
    if !instr.is_valid() {
        // An invalid word in the middle of a function means we ran off the
        // actual code; cut here and let the rest be data. Chunks that start
        // invalid keep accumulating instead, so a data blob misdecoded as
        // text stays one chunk.
        let chunk_started_valid = instrs[current_function_start / 4].is_valid();
        return Ok((chunk_started_valid && local_offset != current_function_start, false));
    }

    if let Some(sym) = current_function_sym {
        if let Some(user_declared_size) = sym.user_declared_size {
            // A user-declared size beats every detection heuristic.
            let ended = local_offset + 8
                == current_function_start + user_declared_size.inner().get() as usize;
            return Ok((ended, ended));
        }
    }

    let current_vram = section_ranges.vram().start() + Size::new(local_offset as u32);
    let current_rom = section_ranges.rom().start() + Size::new(local_offset as u32);

    let owned_segment = context.find_owned_segment(parent_segment_info)?;
    let next_sym = owned_segment.find_symbol(
        current_vram + VramOffset::new(8),
        FindSettings::new(false),
    );
    if let Some(sym) = next_sym {
        // A function declared right after this instruction's delay slot
        // ends the current one.
        if sym.is_trustable_function() {
            if let Some(sym_rom) = sym.rom() {
                if current_rom + Size::new(8) == sym_rom {
                    return Ok((true, false));
                }
            } else {
                return Ok((true, false));
            }
        }
    }

    if !farthest_branch.is_positive() && instr.opcode().is_jump() {
        if instr.is_return() {
            // `jr $ra` with no branch reaching past it.
            return Ok((true, false));
        }
        if instr.is_jumptable_jump() || instr.opcode().does_link() {
            // Jumptables don't end functions, neither do calls.
            return Ok((false, false));
        }
        if instr.opcode().is_jump_with_address() {
            // A tail-call `j` out of the function.
            if !settings.instruction_flags.j_as_branch() {
                return Ok((true, false));
            }
            // Treated as a branch, a `j` only ends the function when it
            // targets a different known function.
            if let Some(target_vram) = instr.get_instr_index_as_vram() {
                if let Some(aux_sym) =
                    owned_segment.find_symbol(target_vram, FindSettings::new(false))
                {
                    if aux_sym.is_trustable_function()
                        && Some(aux_sym.vram()) != current_function_sym.map(|x| x.vram)
                    {
                        return Ok((true, false));
                    }
                }
            }
        }
    }

    Ok((false, false))
}

impl Section for SectionText {
    fn name(&self) -> &str {
        &self.name
    }

    fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    fn section_type(&self) -> SectionType {
        SectionType::Text
    }

    fn symbols_vrams(&self) -> &UnorderedSet<Vram> {
        &self.symbol_vrams
    }
}

impl RomSection for SectionText {
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SectionTextSettings {
    compiler: Option<Compiler>,
    instruction_flags: InstructionFlags,
    is_handwritten: bool,
}

impl SectionTextSettings {
    pub fn new(compiler: Option<Compiler>, instruction_flags: InstructionFlags) -> Self {
        Self {
            compiler,
            instruction_flags,
            is_handwritten: false,
        }
    }

    /// Treat the whole section as handwritten assembly, skipping the
    /// handwritten-instruction sniffing.
    pub fn with_is_handwritten(self, is_handwritten: bool) -> Self {
        Self {
            is_handwritten,
            ..self
        }
    }

    #[must_use]
    pub const fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }
    #[must_use]
    pub const fn instruction_flags(&self) -> InstructionFlags {
        self.instruction_flags
    }
}
