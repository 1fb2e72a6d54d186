/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::addresses::Rom;

use super::JrRegData;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct HiInfo {
    pub(crate) instr_rom: Rom,
    /// The full upper half, already shifted.
    pub(crate) upper_imm: u32,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct GotInfo {
    pub(crate) load_rom: Rom,
    /// Loaded from the global part (a full symbol address) instead of the
    /// local part (a page address that still needs a `%lo`).
    pub(crate) global: bool,
}

/// The abstract value one GPR holds at some point of the walk.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct TrackedRegisterState {
    value: u32,

    hi_info: Option<HiInfo>,
    gp_info: Option<Rom>,
    lo_info: Option<Rom>,
    got_info: Option<GotInfo>,
    dereferenced: Option<Rom>,
    branch_info: Option<Rom>,
    added_with_gp: bool,
}

impl TrackedRegisterState {
    pub(crate) const fn new() -> Self {
        Self {
            value: 0,
            hi_info: None,
            gp_info: None,
            lo_info: None,
            got_info: None,
            dereferenced: None,
            branch_info: None,
            added_with_gp: false,
        }
    }

    pub(crate) const fn value(&self) -> u32 {
        self.value
    }
    pub(crate) const fn hi_info(&self) -> Option<HiInfo> {
        self.hi_info
    }
    pub(crate) const fn gp_info(&self) -> Option<Rom> {
        self.gp_info
    }
    pub(crate) const fn lo_info(&self) -> Option<Rom> {
        self.lo_info
    }
    pub(crate) const fn got_info(&self) -> Option<GotInfo> {
        self.got_info
    }
    pub(crate) const fn dereferenced(&self) -> Option<Rom> {
        self.dereferenced
    }

    pub(crate) fn get_jr_reg_data(&self) -> Option<JrRegData> {
        // Only a register that went through a memory load can be a
        // jumptable jump.
        self.dereferenced?;
        self.lo_info
            .map(|lo_rom| JrRegData::new(lo_rom, self.value, self.branch_info, self.added_with_gp))
    }
}

impl TrackedRegisterState {
    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    pub(crate) fn clear_branch(&mut self) {
        self.branch_info = None;
    }

    pub(crate) fn set_hi(&mut self, imm: u32, instr_rom: Rom) {
        self.clear();
        self.value = imm << 16;
        self.hi_info = Some(HiInfo {
            instr_rom,
            upper_imm: self.value,
        });
    }

    pub(crate) fn set_lo(&mut self, value: u32, instr_rom: Rom) {
        self.value = value;
        self.lo_info = Some(instr_rom);
        self.dereferenced = None;
    }

    pub(crate) fn set_gp_rel(&mut self, value: u32, instr_rom: Rom) {
        self.value = value;
        self.gp_info = Some(instr_rom);
        self.lo_info = Some(instr_rom);
        self.dereferenced = None;
    }

    pub(crate) fn set_got_loaded(&mut self, value: u32, load_rom: Rom, global: bool) {
        self.clear();
        self.value = value;
        self.lo_info = Some(load_rom);
        self.got_info = Some(GotInfo { load_rom, global });
    }

    pub(crate) fn set_branching(&mut self, instr_rom: Rom) {
        self.branch_info = Some(instr_rom);
    }

    pub(crate) fn set_deref(&mut self, instr_rom: Rom) {
        self.dereferenced = Some(instr_rom);
    }

    pub(crate) fn dereference_from(&mut self, other: Self, instr_rom: Rom) {
        *self = other;
        self.set_deref(instr_rom);
    }

    pub(crate) fn set_added_with_gp(&mut self) {
        self.added_with_gp = true;
    }
}

impl TrackedRegisterState {
    pub(crate) fn has_any_value(&self) -> bool {
        self.hi_info.is_some() || self.gp_info.is_some() || self.lo_info.is_some()
    }

    pub(crate) fn was_set_by_current_instr(&self, instr_rom: Rom) -> bool {
        self.lo_info == Some(instr_rom)
            || self.dereferenced == Some(instr_rom)
            || self.hi_info.map(|x| x.instr_rom) == Some(instr_rom)
            || self.gp_info == Some(instr_rom)
    }
}
