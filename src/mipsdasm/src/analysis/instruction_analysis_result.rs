/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::{btree_map::BTreeMap, btree_set::BTreeSet};
use alloc::string::String;
use alloc::vec::Vec;

use rabbitizer::{
    access_type::AccessType, registers::Gpr, registers_meta::Register, Instruction, VramOffset,
};

use crate::{
    addresses::{GotEntry, Rom, RomVramRange, Vram},
    config::Compiler,
    context::Context,
};

use super::RegisterTracker;

/// A GOT access discovered on the instruction stream.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GotAccess {
    /// The address the access resolves to. For local entries that got a
    /// `%lo` pairing this is the full symbol address, not the page.
    pub(crate) address: Vram,
    /// Symbol name from the dynamic symtab, when the entry had one.
    pub(crate) sym_name: Option<String>,
    /// Loaded from the global part of the GOT.
    pub(crate) global: bool,
    /// The loaded value ended up being called through `jalr`, making this a
    /// `%call16` access instead of a plain `%got` one.
    pub(crate) call16: bool,
}

/// Everything the instruction-stream analysis learned about one function.
///
/// Pure data: registering symbols into the context from these tables is the
/// function symbol's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionAnalysisResult {
    ranges: RomVramRange,

    /// Every address this function references.
    referenced_vrams: BTreeSet<Vram>,

    /// Key is the rom of the branch instruction, value its target.
    branch_targets: BTreeMap<Rom, Vram>,

    /// Key is the rom of the `jal`/`j`, value the callee.
    func_calls: BTreeMap<Rom, Vram>,

    /// Key is the rom of the load that fetched a jumptable entry, value the
    /// table address and whether the table holds `$gp`-relative words.
    referenced_jumptables: BTreeMap<Rom, (Vram, bool)>,

    hi_instrs: BTreeMap<Rom, (Gpr, u16)>,
    non_lo_instrs: BTreeSet<Rom>,

    constant_per_instr: BTreeMap<Rom, u32>,

    address_per_hi_instr: BTreeMap<Rom, Vram>,
    address_per_lo_instr: BTreeMap<Rom, Vram>,
    hi_to_lo: BTreeMap<Rom, Rom>,
    lo_to_hi: BTreeMap<Rom, Rom>,

    gp_rel_per_instr: BTreeMap<Rom, Vram>,
    got_per_instr: BTreeMap<Rom, GotAccess>,

    /// Access widths observed per referenced address.
    access_per_address: BTreeMap<Vram, Vec<(AccessType, bool)>>,

    /// Roms of the `.cpload` preamble (and `$gp` set pairs on non-PIC).
    cpload_roms: BTreeSet<Rom>,

    handwritten_instrs: BTreeSet<Rom>,

    pair_multiple_hi_to_same_low: bool,
}

impl InstructionAnalysisResult {
    #[must_use]
    pub(crate) fn new(ranges: RomVramRange, compiler: Option<Compiler>) -> Self {
        Self {
            ranges,
            referenced_vrams: BTreeSet::new(),
            branch_targets: BTreeMap::new(),
            func_calls: BTreeMap::new(),
            referenced_jumptables: BTreeMap::new(),
            hi_instrs: BTreeMap::new(),
            non_lo_instrs: BTreeSet::new(),
            constant_per_instr: BTreeMap::new(),
            address_per_hi_instr: BTreeMap::new(),
            address_per_lo_instr: BTreeMap::new(),
            hi_to_lo: BTreeMap::new(),
            lo_to_hi: BTreeMap::new(),
            gp_rel_per_instr: BTreeMap::new(),
            got_per_instr: BTreeMap::new(),
            access_per_address: BTreeMap::new(),
            cpload_roms: BTreeSet::new(),
            handwritten_instrs: BTreeSet::new(),
            pair_multiple_hi_to_same_low: compiler
                .is_none_or(|x| x.pair_multiple_hi_to_same_low()),
        }
    }

    #[must_use]
    pub fn referenced_vrams(&self) -> &BTreeSet<Vram> {
        &self.referenced_vrams
    }
    #[must_use]
    pub fn branch_targets(&self) -> &BTreeMap<Rom, Vram> {
        &self.branch_targets
    }
    #[must_use]
    pub fn func_calls(&self) -> &BTreeMap<Rom, Vram> {
        &self.func_calls
    }
    #[must_use]
    pub fn referenced_jumptables(&self) -> &BTreeMap<Rom, (Vram, bool)> {
        &self.referenced_jumptables
    }
    #[must_use]
    pub fn constant_per_instr(&self) -> &BTreeMap<Rom, u32> {
        &self.constant_per_instr
    }
    #[must_use]
    pub fn address_per_hi_instr(&self) -> &BTreeMap<Rom, Vram> {
        &self.address_per_hi_instr
    }
    #[must_use]
    pub fn address_per_lo_instr(&self) -> &BTreeMap<Rom, Vram> {
        &self.address_per_lo_instr
    }
    #[must_use]
    pub fn gp_rel_per_instr(&self) -> &BTreeMap<Rom, Vram> {
        &self.gp_rel_per_instr
    }
    #[must_use]
    pub fn got_per_instr(&self) -> &BTreeMap<Rom, GotAccess> {
        &self.got_per_instr
    }
    #[must_use]
    pub fn access_per_address(&self) -> &BTreeMap<Vram, Vec<(AccessType, bool)>> {
        &self.access_per_address
    }
    #[must_use]
    pub fn cpload_roms(&self) -> &BTreeSet<Rom> {
        &self.cpload_roms
    }
    #[must_use]
    pub fn handwritten_instrs(&self) -> &BTreeSet<Rom> {
        &self.handwritten_instrs
    }

    /// Whether this rom belongs to a `lui` that got paired.
    #[must_use]
    pub fn is_hi_instr(&self, rom: Rom) -> bool {
        self.hi_instrs.contains_key(&rom)
    }
}

impl InstructionAnalysisResult {
    pub(crate) fn process_prev_func_call(
        &mut self,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        prev_instr: &Instruction,
    ) {
        regs_tracker.unset_registers_after_func_call(instr, prev_instr);
    }

    pub(crate) fn process_instr(
        &mut self,
        context: &Context,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        prev_instr: Option<&Instruction>,
    ) {
        if !instr.is_valid() {
            return;
        }

        let instr_rom = self.rom_from_instr(instr);
        let pic = self.is_pic(context);

        if instr.is_likely_handwritten() {
            self.handwritten_instrs.insert(instr_rom);
        }

        if let Some(target_vram) = instr.get_branch_vram_generic() {
            // Branches, and `j` when the flags treat it as one.
            self.process_branch(context, regs_tracker, instr, instr_rom, target_vram);
        } else if let Some(target_vram) = instr.get_instr_index_as_vram() {
            // `jal`, and `j` used as a tail call.
            self.process_func_call(context, instr_rom, target_vram);
        } else if instr.is_jumptable_jump() {
            self.process_jumptable_jump(context, regs_tracker, instr, instr_rom);
        } else if instr.opcode().is_jump() && instr.opcode().does_link() {
            self.process_jump_and_link_register(regs_tracker, instr, instr_rom);
        } else if instr.opcode().can_be_hi() {
            self.process_hi(regs_tracker, instr, instr_rom, prev_instr);
        } else if instr.opcode().can_be_unsigned_lo() {
            self.process_unsigned_lo(regs_tracker, instr, instr_rom);
        } else if instr.opcode().can_be_lo() {
            self.process_signed_lo(context, regs_tracker, instr, instr_rom);
        }

        self.detect_cpload_gp_addition(instr, instr_rom, pic);

        regs_tracker.overwrite_registers(instr, instr_rom, pic);
    }
}

impl InstructionAnalysisResult {
    fn process_branch(
        &mut self,
        context: &Context,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        instr_rom: Rom,
        target_vram: Vram,
    ) {
        if !self.ranges.in_vram_range(target_vram) {
            return;
        }

        regs_tracker.process_branch(instr, instr_rom);

        self.add_referenced_vram(context, target_vram);
        self.branch_targets.insert(instr_rom, target_vram);
    }

    fn process_func_call(&mut self, context: &Context, instr_rom: Rom, target_vram: Vram) {
        self.add_referenced_vram(context, target_vram);
        self.func_calls.insert(instr_rom, target_vram);
    }

    fn process_jumptable_jump(
        &mut self,
        context: &Context,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        _instr_rom: Rom,
    ) {
        if let Some(jr_reg_data) = regs_tracker.get_jr_reg_data(instr) {
            if jr_reg_data.branch_info().is_some() {
                // A checked register is a function pointer call, not a
                // jumptable: jumptables never validate their entries.
                return;
            }

            let address = Vram::new(jr_reg_data.address());
            self.referenced_jumptables
                .insert(jr_reg_data.lo_rom(), (address, jr_reg_data.added_with_gp()));
            self.add_referenced_vram(context, address);
        }
    }

    fn process_jump_and_link_register(
        &mut self,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        _instr_rom: Rom,
    ) {
        if let Some(got_info) = regs_tracker.get_got_info_for_jalr(instr) {
            if got_info.global {
                // The loaded address gets called, so the load was a
                // `%call16` after all.
                if let Some(access) = self.got_per_instr.get_mut(&got_info.load_rom) {
                    access.call16 = true;
                }
            }
        }
    }

    fn process_hi(
        &mut self,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        instr_rom: Rom,
        prev_instr: Option<&Instruction>,
    ) {
        regs_tracker.process_hi(instr, instr_rom, prev_instr);

        if let (Some(reg), Some(imm)) =
            (instr.get_destination_gpr(), instr.get_processed_immediate())
        {
            self.hi_instrs.insert(instr_rom, (reg, imm as u16));
        }
    }

    fn process_unsigned_lo(
        &mut self,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        instr_rom: Rom,
    ) {
        // An `ori` paired with a `lui` materializes a constant, not an
        // address.
        if let Some(hi_info) = regs_tracker.get_hi_info_for_constant(instr) {
            if let Some(lower) = instr.get_processed_immediate() {
                let constant = hi_info.upper_imm | (lower as u32 & 0xFFFF);

                self.constant_per_instr.insert(hi_info.instr_rom, constant);
                self.constant_per_instr.insert(instr_rom, constant);

                regs_tracker.process_constant(instr, constant, instr_rom);
            }
        }
    }

    fn process_signed_lo(
        &mut self,
        context: &Context,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        instr_rom: Rom,
    ) {
        let pic = self.is_pic(context);

        if instr.opcode().does_load()
            && instr
                .get_destination_gpr()
                .is_some_and(|reg| reg.is_global_pointer(instr.abi()))
            && !instr
                .field().rs()
                .is_some_and(|rs| rs.is_global_pointer(instr.abi()))
        {
            // Restoring `$gp` from the stack.
            regs_tracker.process_gp_load(instr, instr_rom);
            return;
        }

        let Some(pairing_info) = regs_tracker.preprocess_lo_and_get_info(instr, instr_rom) else {
            if regs_tracker.has_lo_but_not_hi(instr) {
                self.non_lo_instrs.insert(instr_rom);
            }
            return;
        };

        if pairing_info.is_gp_rel && context.global_config().gp_config().is_none() {
            return;
        }

        // `lui $gp` + `addiu $gp, $gp` is either a `.cpload` chunk (PIC) or
        // a plain `$gp` bootstrap; neither is a symbol reference.
        if !pairing_info.is_gp_rel && !pairing_info.is_gp_got {
            if let Some((hi_reg, _)) = self.hi_instrs.get(&pairing_info.instr_rom) {
                if hi_reg.is_global_pointer(instr.abi())
                    && instr
                        .get_destination_gpr()
                        .is_some_and(|reg| reg.is_global_pointer(instr.abi()))
                {
                    if pic {
                        // Only PIC code gets the pair folded into the
                        // `.cpload` directive.
                        self.cpload_roms.insert(pairing_info.instr_rom);
                        self.cpload_roms.insert(instr_rom);
                    }
                    return;
                }
            }
        }

        let Some(lower) = instr.get_processed_immediate() else {
            return;
        };
        let lower = VramOffset::new(lower);

        if pairing_info.is_gp_rel {
            let Some(gp_config) = context.global_config().gp_config() else {
                return;
            };

            if pic {
                // A `$gp`-relative load in PIC code goes through the GOT.
                let address = gp_config.gp_value().add_offset(lower);
                self.process_got_access(context, regs_tracker, instr, instr_rom, address);
                return;
            }

            if lower.is_negative()
                && lower.inner().unsigned_abs() > gp_config.gp_value().inner()
            {
                return;
            }
            let address = gp_config.gp_value().add_offset(lower);
            self.gp_rel_per_instr.insert(instr_rom, address);
            self.add_referenced_vram(context, address);
            self.record_access_type(instr, address);
            regs_tracker.process_lo(instr, address.inner(), instr_rom);
            return;
        }

        let upper_half = pairing_info.value;
        if upper_half < 0
            || (lower.is_negative() && lower.inner().unsigned_abs() > upper_half as u32)
        {
            return;
        }
        let address = Vram::new(upper_half as u32) + lower;

        if !self.check_existing_lo_pairing(instr_rom, &pairing_info, address) {
            return;
        }

        if pairing_info.is_gp_got {
            // Completing a page address from the local GOT; point the
            // original load at the full symbol.
            if let Some(access) = self.got_per_instr.get_mut(&pairing_info.instr_rom) {
                access.address = address;
            }
        }

        self.process_address(context, address, &pairing_info, instr, instr_rom);
        regs_tracker.process_lo(instr, address.inner(), instr_rom);
    }

    fn process_got_access(
        &mut self,
        context: &Context,
        regs_tracker: &mut RegisterTracker,
        instr: &Instruction,
        instr_rom: Rom,
        got_entry_vram: Vram,
    ) {
        let Some(got) = context.global_offset_table() else {
            return;
        };

        match got.request_address(got_entry_vram) {
            Some(GotEntry::Global(entry)) => {
                let address = entry.address();
                self.got_per_instr.insert(
                    instr_rom,
                    GotAccess {
                        address,
                        sym_name: Some(entry.sym_name().into()),
                        global: true,
                        call16: false,
                    },
                );
                regs_tracker.process_got_load(instr, instr_rom, address.inner(), true);
            }
            Some(GotEntry::Local(page) | GotEntry::LazyResolver(page)) => {
                self.got_per_instr.insert(
                    instr_rom,
                    GotAccess {
                        address: page,
                        sym_name: None,
                        global: false,
                        call16: false,
                    },
                );
                regs_tracker.process_got_load(instr, instr_rom, page.inner(), false);
            }
            None => {}
        }
    }

    /// Gate for re-pairing a `%lo` that was already paired on another path.
    ///
    /// Returns whether the new pairing may proceed.
    fn check_existing_lo_pairing(
        &self,
        lo_rom: Rom,
        pairing_info: &super::LoPairingInfo,
        address: Vram,
    ) -> bool {
        let Some(existing) = self.address_per_lo_instr.get(&lo_rom) else {
            return true;
        };

        // Reject when a different `lui` with a different immediate claims
        // this `%lo`.
        if let Some(other_hi_rom) = self.lo_to_hi.get(&lo_rom) {
            if let Some((_, other_hi_imm)) = self.hi_instrs.get(other_hi_rom) {
                if pairing_info.value != ((*other_hi_imm as i64) << 16) {
                    return false;
                }
            }
        }

        if !self.pair_multiple_hi_to_same_low {
            // IDO never shares a `%lo` across several `%hi`s.
            return false;
        }

        if self.hi_to_lo.get(&pairing_info.instr_rom) == Some(&lo_rom) {
            // This exact pair was processed on another look-ahead path.
            return false;
        }

        // A `lui` right before the `%lo` is always a real pair; so is one
        // that lands on the same address.
        pairing_info.instr_rom + crate::addresses::Size::new(4) == lo_rom || *existing == address
    }

    fn process_address(
        &mut self,
        context: &Context,
        address: Vram,
        pairing_info: &super::LoPairingInfo,
        instr: &Instruction,
        instr_rom: Rom,
    ) {
        self.add_referenced_vram(context, address);

        self.address_per_lo_instr.entry(instr_rom).or_insert(address);
        self.lo_to_hi.insert(instr_rom, pairing_info.instr_rom);

        // A hi half only gets the reloc when it's an actual `lui`; a GOT
        // load already carries its own `%got`.
        if self.hi_instrs.contains_key(&pairing_info.instr_rom) {
            self.address_per_hi_instr
                .entry(pairing_info.instr_rom)
                .or_insert(address);
            self.hi_to_lo.insert(pairing_info.instr_rom, instr_rom);
        }

        self.record_access_type(instr, address);
    }

    fn record_access_type(&mut self, instr: &Instruction, address: Vram) {
        if let Some(access_type) = instr.opcode().access_type() {
            let unsigned = instr.opcode().does_unsigned_memory_access();
            let entry = self.access_per_address.entry(address).or_default();
            if !entry.contains(&(access_type, unsigned)) {
                entry.push((access_type, unsigned));
            }
        }
    }

    fn detect_cpload_gp_addition(&mut self, instr: &Instruction, instr_rom: Rom, pic: bool) {
        if !pic || !instr.opcode().adds_registers() {
            return;
        }
        let abi = instr.abi();
        if let (Some(rd), Some(rs), Some(rt)) =
            (instr.field().rd(), instr.field().rs(), instr.field().rt())
        {
            // `addu $gp, $gp, $t9`, the tail of `.cpload $t9`.
            if rd.is_global_pointer(abi)
                && (rs.is_global_pointer(abi) || rt.is_global_pointer(abi))
                && (rs.as_index() == 25 || rt.as_index() == 25)
            {
                self.cpload_roms.insert(instr_rom);
            }
        }
    }
}

impl InstructionAnalysisResult {
    fn rom_from_instr(&self, instr: &Instruction) -> Rom {
        self.ranges
            .rom_from_vram(instr.vram())
            .expect("Analyzed instructions always live inside their own function")
    }

    fn is_pic(&self, context: &Context) -> bool {
        context
            .global_config()
            .gp_config()
            .is_some_and(|x| x.pic())
    }

    fn add_referenced_vram(&mut self, _context: &Context, referenced_vram: Vram) {
        self.referenced_vrams.insert(referenced_vram);
    }
}
