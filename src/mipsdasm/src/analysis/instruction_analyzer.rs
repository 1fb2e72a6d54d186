/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_set::BTreeSet;

use rabbitizer::Instruction;

use crate::{addresses::RomVramRange, config::Compiler, context::Context};

use super::{InstructionAnalysisResult, RegisterTracker};

/// Drives the register tracker over a function's instructions, forking at
/// every conditional branch so pairs on both paths are found.
#[derive(Debug)]
pub struct InstructionAnalyzer {
    /// Local offsets of branches already walked, so loops don't recurse
    /// forever.
    branches_taken: BTreeSet<u32>,

    result: InstructionAnalysisResult,
}

impl InstructionAnalyzer {
    #[must_use]
    pub(crate) fn analyze(
        context: &Context,
        ranges: RomVramRange,
        instrs: &[Instruction],
        compiler: Option<Compiler>,
    ) -> InstructionAnalysisResult {
        assert!(
            !instrs.is_empty(),
            "Empty instruction list? {:?}",
            ranges.vram().start(),
        );

        let mut analyzer = Self {
            branches_taken: BTreeSet::new(),
            result: InstructionAnalysisResult::new(ranges, compiler),
        };
        let mut regs_tracker = RegisterTracker::new();

        analyzer
            .result
            .process_instr(context, &mut regs_tracker, &instrs[0], None);

        for (i, w) in instrs.windows(2).enumerate() {
            let prev_instr = w[0];
            let instr = w[1];
            let local_offset = (i + 1) * 4;

            if !instr.is_valid() {
                continue;
            }

            if !prev_instr.opcode().is_branch_likely() {
                // The delay slot of a branch-likely only runs on the taken
                // path, so it is processed inside the fork instead.
                analyzer
                    .result
                    .process_instr(context, &mut regs_tracker, &instr, Some(&prev_instr));
            }

            analyzer.look_ahead(context, &regs_tracker, instrs, &instr, &prev_instr, local_offset);

            let prev_opcode = prev_instr.opcode();
            if prev_opcode.is_jump_with_address() && !prev_opcode.does_link() {
                if let Some(target_vram) = prev_instr.get_branch_vram_generic() {
                    if !ranges.in_vram_range(target_vram) {
                        // A tail call left the function; every tracked
                        // register is garbage from here on.
                        regs_tracker.clear();
                    }
                } else if let Some(target_vram) = prev_instr.get_instr_index_as_vram() {
                    if !ranges.in_vram_range(target_vram) {
                        regs_tracker.clear();
                    }
                }
            }

            analyzer
                .result
                .process_prev_func_call(&mut regs_tracker, &instr, &prev_instr);
        }

        analyzer.result
    }

    #[expect(clippy::too_many_arguments)]
    fn look_ahead(
        &mut self,
        context: &Context,
        original_regs_tracker: &RegisterTracker,
        instrs: &[Instruction],
        instr: &Instruction,
        prev_instr: &Instruction,
        local_offset: usize,
    ) {
        let Some(branch_offset) = prev_instr.get_branch_offset_generic() else {
            return;
        };

        if !self.branches_taken.insert(local_offset as u32) {
            // Already walked this one.
            return;
        }

        let prev_local_offset = local_offset - 4;
        let mut target_local_offset = {
            let temp = prev_local_offset as i32 + branch_offset.inner();
            if temp <= 0 {
                // Branching before the function start; whatever this is, it
                // isn't a path worth walking.
                return;
            }
            temp as usize
        };

        let mut regs_tracker = *original_regs_tracker;

        if prev_instr.opcode().is_branch_likely() {
            self.result
                .process_instr(context, &mut regs_tracker, instr, Some(prev_instr));
        }

        while target_local_offset / 4 < instrs.len() {
            let prev_target_instr = instrs[target_local_offset / 4 - 1];
            let target_instr = instrs[target_local_offset / 4];

            if !prev_target_instr.opcode().is_branch_likely() {
                self.result.process_instr(
                    context,
                    &mut regs_tracker,
                    &target_instr,
                    Some(&prev_target_instr),
                );
            }
            self.look_ahead(
                context,
                &regs_tracker,
                instrs,
                &target_instr,
                &prev_target_instr,
                target_local_offset,
            );

            if prev_target_instr.is_unconditional_branch() {
                // The fork itself just branched away; the `look_ahead` call
                // above already walked that path.
                return;
            }
            if prev_target_instr.opcode().is_jump() && !prev_target_instr.opcode().does_link() {
                // `jr`/`j`: another way of leaving unconditionally.
                return;
            }

            self.result
                .process_prev_func_call(&mut regs_tracker, &target_instr, &prev_target_instr);

            target_local_offset += 4;
        }
    }
}
