/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use mipsdasm::{addresses::GpValue, config::Endian};

// Size of an Elf32_RegInfo record.
const REGINFO_SIZE: usize = 24;
// Offset of ri_gp_value inside it.
const GP_VALUE_OFFSET: usize = 20;

/// The `.reginfo` section: register usage masks plus the `$gp` the program
/// runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MipsReginfo {
    pub ri_gprmask: u32,
    pub ri_gp_value: GpValue,
}

impl MipsReginfo {
    pub fn parse(data: &[u8], endian: Endian) -> Option<Self> {
        if data.len() < REGINFO_SIZE {
            return None;
        }

        Some(Self {
            ri_gprmask: endian.word_from_bytes(&data[0..4]),
            ri_gp_value: GpValue::new(endian.word_from_bytes(
                &data[GP_VALUE_OFFSET..GP_VALUE_OFFSET + 4],
            )),
        })
    }
}
