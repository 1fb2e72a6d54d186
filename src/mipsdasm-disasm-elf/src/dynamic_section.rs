/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use mipsdasm::config::Endian;

const DT_PLTGOT: u32 = 3;
const DT_MIPS_LOCAL_GOTNO: u32 = 0x7000000A;
const DT_MIPS_SYMTABNO: u32 = 0x70000011;
const DT_MIPS_GOTSYM: u32 = 0x70000013;

/// The `.dynamic` entries needed to lay out the GOT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DynamicSection {
    pub pltgot: Option<u32>,
    pub local_gotno: Option<u32>,
    pub symtabno: Option<u32>,
    pub gotsym: Option<u32>,
}

impl DynamicSection {
    pub fn parse(data: &[u8], endian: Endian) -> Self {
        let mut parsed = Self::default();

        for entry in data.chunks_exact(8) {
            let d_tag = endian.word_from_bytes(&entry[0..4]);
            let d_val = endian.word_from_bytes(&entry[4..8]);

            match d_tag {
                0 => break, // DT_NULL
                DT_PLTGOT => parsed.pltgot = Some(d_val),
                DT_MIPS_LOCAL_GOTNO => parsed.local_gotno = Some(d_val),
                DT_MIPS_SYMTABNO => parsed.symtabno = Some(d_val),
                DT_MIPS_GOTSYM => parsed.gotsym = Some(d_val),
                _ => {}
            }
        }

        parsed
    }

    pub fn is_pic_layout(&self) -> bool {
        self.pltgot.is_some() && self.local_gotno.is_some() && self.gotsym.is_some()
    }
}
