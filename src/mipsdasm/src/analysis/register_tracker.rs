/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::{registers::Gpr, registers_meta::Register, Instruction};

use crate::addresses::Rom;

use super::{tracked_register_state::HiInfo, JrRegData, LoPairingInfo, TrackedRegisterState};

/// Tracks the abstract value every GPR holds while walking a function.
///
/// `Copy` on purpose: the look-ahead forks the whole tracker at every
/// conditional branch.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[must_use]
pub(crate) struct RegisterTracker {
    registers: [TrackedRegisterState; Gpr::count()],
}

impl RegisterTracker {
    pub(crate) const fn new() -> Self {
        Self {
            registers: [TrackedRegisterState::new(); Gpr::count()],
        }
    }

    pub(crate) fn clear(&mut self) {
        for state in self.registers.iter_mut() {
            state.clear();
        }
    }

    fn state(&self, reg: Gpr) -> &TrackedRegisterState {
        &self.registers[reg.as_index()]
    }

    fn state_mut(&mut self, reg: Gpr) -> &mut TrackedRegisterState {
        &mut self.registers[reg.as_index()]
    }

    fn clear_reg(&mut self, reg: Gpr) {
        if reg.as_index() != 0 {
            self.state_mut(reg).clear();
        }
    }
}

impl RegisterTracker {
    /// Mark the registers a conditional branch compares.
    ///
    /// A register that was null-checked right before a `jr` is a function
    /// pointer, not a jumptable, and this is how we can tell.
    pub(crate) fn process_branch(&mut self, instr: &Instruction, instr_rom: Rom) {
        if instr.opcode().reads_rs() {
            if let Some(rs) = instr.field().rs() {
                self.state_mut(rs).set_branching(instr_rom);
            }
        }
        if !instr.opcode().modifies_rt() {
            if let Some(rt) = instr.field().rt() {
                self.state_mut(rt).set_branching(instr_rom);
            }
        }
    }

    pub(crate) fn process_hi(
        &mut self,
        instr: &Instruction,
        instr_rom: Rom,
        _prev_instr: Option<&Instruction>,
    ) {
        if let (Some(reg), Some(imm)) =
            (instr.get_destination_gpr(), instr.get_processed_immediate())
        {
            if reg.as_index() != 0 {
                self.state_mut(reg).set_hi(imm as u32, instr_rom);
            }
        }
    }

    /// `$gp` got reloaded (usually from the stack); whatever we knew about
    /// registers derived from it is stale now.
    pub(crate) fn process_gp_load(&mut self, instr: &Instruction, _instr_rom: Rom) {
        if let Some(reg) = instr.get_destination_gpr() {
            self.clear_reg(reg);
        }
    }

    /// The destination register now holds a value fetched from the GOT.
    pub(crate) fn process_got_load(
        &mut self,
        instr: &Instruction,
        instr_rom: Rom,
        entry_value: u32,
        global: bool,
    ) {
        if let Some(reg) = instr.get_destination_gpr() {
            if reg.as_index() != 0 {
                self.state_mut(reg)
                    .set_got_loaded(entry_value, instr_rom, global);
            }
        }
    }

    #[must_use]
    pub(crate) fn get_hi_info_for_constant(&self, instr: &Instruction) -> Option<HiInfo> {
        instr.field().rs().and_then(|rs| self.state(rs).hi_info())
    }

    pub(crate) fn process_constant(&mut self, instr: &Instruction, value: u32, instr_rom: Rom) {
        if let Some(reg) = instr.get_destination_gpr() {
            if reg.as_index() != 0 {
                self.state_mut(reg).set_lo(value, instr_rom);
            }
        }
    }

    /// Figure out what the base register of a `%lo`-capable instruction was
    /// holding, without mutating anything yet.
    #[must_use]
    pub(crate) fn preprocess_lo_and_get_info(
        &mut self,
        instr: &Instruction,
        instr_rom: Rom,
    ) -> Option<LoPairingInfo> {
        let rs = instr.field().rs()?;
        let state = self.state(rs);

        if let Some(hi_info) = state.hi_info() {
            return Some(LoPairingInfo {
                instr_rom: hi_info.instr_rom,
                value: hi_info.upper_imm as i64,
                is_gp_rel: false,
                is_gp_got: false,
            });
        }

        if rs.is_global_pointer(instr.abi()) {
            return Some(LoPairingInfo {
                instr_rom,
                value: 0,
                is_gp_rel: true,
                is_gp_got: false,
            });
        }

        if let Some(got_info) = state.got_info() {
            if !got_info.global {
                // A page address loaded from the local GOT; the immediate
                // completes it like a plain `%lo` would.
                return Some(LoPairingInfo {
                    instr_rom: got_info.load_rom,
                    value: state.value() as i64,
                    is_gp_rel: false,
                    is_gp_got: true,
                });
            }
        }

        None
    }

    #[must_use]
    pub(crate) fn has_lo_but_not_hi(&self, instr: &Instruction) -> bool {
        instr.field().rs().is_some_and(|rs| {
            let state = self.state(rs);
            state.lo_info().is_some() && state.hi_info().is_none()
        })
    }

    /// Commit a resolved pairing: the involved register now holds `value`.
    pub(crate) fn process_lo(&mut self, instr: &Instruction, value: u32, instr_rom: Rom) {
        let opcode = instr.opcode();

        if opcode.does_dereference() {
            if opcode.does_load() {
                if let (Some(rt), Some(rs)) = (instr.field().rt(), instr.field().rs()) {
                    if rt.as_index() != 0 {
                        let mut src_state = *self.state(rs);
                        src_state.set_lo(value, instr_rom);
                        self.state_mut(rt).dereference_from(src_state, instr_rom);
                    }
                }
            }
            // Stores don't modify any GPR.
        } else if let Some(reg) = instr.get_destination_gpr() {
            if reg.as_index() != 0 {
                let state = self.state_mut(reg);
                state.set_lo(value, instr_rom);
                state.clear_branch();
            }
        }
    }

    #[must_use]
    pub(crate) fn get_jr_reg_data(&self, instr: &Instruction) -> Option<JrRegData> {
        instr
            .field().rs()
            .and_then(|rs| self.state(rs).get_jr_reg_data())
    }

    #[must_use]
    pub(crate) fn get_got_info_for_jalr(
        &self,
        instr: &Instruction,
    ) -> Option<super::tracked_register_state::GotInfo> {
        instr.field().rs().and_then(|rs| self.state(rs).got_info())
    }

    /// Apply the register-clobbering effect of `instr`, preserving pairing
    /// state through copies (`move`) and through table-index additions.
    pub(crate) fn overwrite_registers(&mut self, instr: &Instruction, instr_rom: Rom, pic: bool) {
        let abi = instr.abi();
        let opcode = instr.opcode();

        if opcode.adds_registers() || opcode.ors_registers() {
            if let (Some(rd), Some(rs), Some(rt)) =
                (instr.field().rd(), instr.field().rs(), instr.field().rt())
            {
                if rd.as_index() == 0 {
                    return;
                }

                // `move rd, rs` spelled as `or rd, rs, $zero` or
                // `addu rd, rs, $zero`.
                let src = if rt.as_index() == 0 {
                    rs
                } else if rs.as_index() == 0 {
                    rt
                } else if self.state(rs).has_any_value() && !self.state(rt).has_any_value() {
                    // Adding a plain index to a tracked base keeps the
                    // pairing alive, the way jumptables are dereferenced.
                    rs
                } else if self.state(rt).has_any_value() && !self.state(rs).has_any_value() {
                    rt
                } else {
                    self.clear_reg(rd);
                    return;
                };

                let copied = *self.state(src);
                let added_gp = pic
                    && (rs.is_global_pointer(abi) || rt.is_global_pointer(abi))
                    && !src.is_global_pointer(abi);

                let dst = self.state_mut(rd);
                *dst = copied;
                if added_gp {
                    dst.set_added_with_gp();
                }
                return;
            }
        }

        if let Some(reg) = instr.get_destination_gpr() {
            if !self.state(reg).was_set_by_current_instr(instr_rom) {
                self.clear_reg(reg);
            }
        }
    }

    /// A function call just happened; everything the callee is allowed to
    /// clobber is garbage now.
    pub(crate) fn unset_registers_after_func_call(
        &mut self,
        _instr: &Instruction,
        prev_instr: &Instruction,
    ) {
        if !prev_instr.opcode().does_link() {
            return;
        }

        for (index, state) in self.registers.iter_mut().enumerate() {
            // Saved registers ($s0-$s7), $sp, $fp/$s8, $gp and $k0/$k1
            // survive calls.
            let preserved = matches!(index, 0 | 16..=23 | 26..=30);
            if !preserved {
                state.clear();
            }
        }
    }
}
