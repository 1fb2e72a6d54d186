/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use object::ObjectSection;

/// What we intend to do with a PROGBITS section.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProgbitsType {
    Text,
    Data,
    Rodata,
    GccExceptTable,
    Got,
    Unknown,
}

/// The section kinds this tool consumes.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ElfSectionType {
    Progbits(ProgbitsType),
    Nobits,
    Reloc,
    Dynamic,
    MipsReginfo,
    MipsAbiFlags,
}

impl ElfSectionType {
    pub fn from_section(section: &object::Section<'_, '_>) -> Option<(Self, String)> {
        let name = section.name().ok()?.to_string();

        let section_type = match name.as_str() {
            ".text" => ElfSectionType::Progbits(ProgbitsType::Text),
            ".data" | ".sdata" | ".data1" => ElfSectionType::Progbits(ProgbitsType::Data),
            ".rodata" | ".rdata" | ".rodata1" => ElfSectionType::Progbits(ProgbitsType::Rodata),
            ".gcc_except_table" => ElfSectionType::Progbits(ProgbitsType::GccExceptTable),
            ".got" => ElfSectionType::Progbits(ProgbitsType::Got),
            ".bss" | ".sbss" | ".scommon" => ElfSectionType::Nobits,
            ".dynamic" => ElfSectionType::Dynamic,
            ".reginfo" => ElfSectionType::MipsReginfo,
            ".MIPS.abiflags" => ElfSectionType::MipsAbiFlags,
            _ if name.starts_with(".rel.") || name.starts_with(".rela.") => {
                ElfSectionType::Reloc
            }
            _ => return Some((ElfSectionType::Progbits(ProgbitsType::Unknown), name)),
        };

        Some((section_type, name))
    }
}

/// A section plus everything we need from its header.
#[derive(Debug, Clone)]
pub struct RawElfSection {
    pub name: String,
    pub section_type: ElfSectionType,
    pub address: u32,
    pub size: u32,
    pub file_offset: Option<u32>,
    pub data: Vec<u8>,
}

impl RawElfSection {
    pub fn new(section: &object::Section<'_, '_>) -> Option<Self> {
        let (section_type, name) = ElfSectionType::from_section(section)?;

        let data = match section_type {
            ElfSectionType::Nobits => Vec::new(),
            _ => section.data().ok()?.to_vec(),
        };

        Some(Self {
            name,
            section_type,
            address: section.address() as u32,
            size: section.size() as u32,
            file_offset: section.file_range().map(|(offset, _)| offset as u32),
            data,
        })
    }
}

// Sections we knowingly skip. `.vutext` is PS2 VU code, which has no MIPS
// decoding; the rest is debug-only metadata.
pub fn is_known_unhandled_section(name: &str) -> bool {
    matches!(
        name,
        ".pdr" | ".vutext" | ".vudata" | ".mdebug" | ".comment" | ".options"
    )
}
