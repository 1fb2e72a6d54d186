/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use mipsdasm::{config::Endian, rabbitizer::IsaVersion};

// Size of an Elf_MIPS_ABIFlags_v0 record.
const ABIFLAGS_SIZE: usize = 24;

/// The `.MIPS.abiflags` section: which ISA revision and float ABI the
/// object was built for.
///
/// The ISA level feeds the instruction decoder, so a mips2 object doesn't
/// get its words decoded as mips3 doubleword instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipsAbiFlags {
    pub version: u16,
    pub isa_level: u8,
    pub isa_rev: u8,
    pub gpr_size: u8,
    pub cpr1_size: u8,
    pub cpr2_size: u8,
    pub fp_abi: u8,
    pub isa_ext: u32,
    pub ases: u32,
    pub flags1: u32,
}

impl MipsAbiFlags {
    pub fn parse(data: &[u8], endian: Endian) -> Option<Self> {
        if data.len() < ABIFLAGS_SIZE {
            return None;
        }

        let version = endian.short_from_bytes(&data[0..2]);
        if version != 0 {
            // Only the v0 layout is defined.
            return None;
        }

        Some(Self {
            version,
            isa_level: data[2],
            isa_rev: data[3],
            gpr_size: data[4],
            cpr1_size: data[5],
            cpr2_size: data[6],
            fp_abi: data[7],
            isa_ext: endian.word_from_bytes(&data[8..12]),
            ases: endian.word_from_bytes(&data[12..16]),
            flags1: endian.word_from_bytes(&data[16..20]),
        })
    }

    /// The decoder ISA matching this object, when it maps to one.
    pub fn isa_version(&self) -> Option<IsaVersion> {
        match self.isa_level {
            1 => Some(IsaVersion::MIPS_I),
            2 => Some(IsaVersion::MIPS_II),
            3 => Some(IsaVersion::MIPS_III),
            4 => Some(IsaVersion::MIPS_IV),
            _ => None,
        }
    }
}
