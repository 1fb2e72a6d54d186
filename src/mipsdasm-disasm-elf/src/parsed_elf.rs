/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use anyhow::{bail, Context as _, Result};
use object::{Object, ObjectSection, RelocationTarget};
use tracing::warn;

use mipsdasm::{
    addresses::{GlobalOffsetTable, GotGlobalEntry, GpValue, Rom, Vram},
    config::Endian,
    relocation::{RelocReferencedSym, RelocationInfo, RelocationType},
};

use crate::{
    dynamic_section::DynamicSection,
    elf_section_type::{is_known_unhandled_section, ElfSectionType, ProgbitsType, RawElfSection},
    elf_symbol::{gather_symbols, ElfSymbol},
    mips_abiflags::MipsAbiFlags,
    mips_reginfo::MipsReginfo,
};

/// One relocation row lifted out of a `.rel.*` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReloc {
    /// Rom address of the word the reloc applies to.
    pub rom: Rom,
    pub reloc: RelocationInfo,
}

/// Everything pulled out of the ELF before the core analysis starts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedElf {
    pub endian: Endian,
    pub is_pic: bool,

    pub executable_sections: Vec<RawElfSection>,
    pub data_sections: Vec<RawElfSection>,
    pub rodata_sections: Vec<RawElfSection>,
    pub gcc_except_table_sections: Vec<RawElfSection>,
    pub nobits_sections: Vec<RawElfSection>,

    pub symbols: Vec<ElfSymbol>,
    pub relocs: Vec<ParsedReloc>,

    pub gp_value: Option<GpValue>,
    pub got: Option<GlobalOffsetTable>,
    pub abiflags: Option<MipsAbiFlags>,
}

impl ParsedElf {
    pub fn parse(binary_data: &[u8]) -> Result<Self> {
        let elf_file = object::File::parse(binary_data).context("Not a valid ELF file")?;

        let endian = if elf_file.is_little_endian() {
            Endian::Little
        } else {
            Endian::Big
        };

        if !matches!(elf_file.architecture(), object::Architecture::Mips) {
            bail!("Not a MIPS ELF: {:?}", elf_file.architecture());
        }

        let mut executable_sections = Vec::new();
        let mut data_sections = Vec::new();
        let mut rodata_sections = Vec::new();
        let mut gcc_except_table_sections = Vec::new();
        let mut nobits_sections = Vec::new();

        let mut got_section = None;
        let mut reginfo = None;
        let mut dynamic = None;
        let mut abiflags = None;

        for section in elf_file.sections() {
            let Some(raw_section) = RawElfSection::new(&section) else {
                continue;
            };

            match raw_section.section_type {
                ElfSectionType::Progbits(ProgbitsType::Text) => {
                    executable_sections.push(raw_section)
                }
                ElfSectionType::Progbits(ProgbitsType::Data) => data_sections.push(raw_section),
                ElfSectionType::Progbits(ProgbitsType::Rodata) => {
                    rodata_sections.push(raw_section)
                }
                ElfSectionType::Progbits(ProgbitsType::GccExceptTable) => {
                    gcc_except_table_sections.push(raw_section)
                }
                ElfSectionType::Progbits(ProgbitsType::Got) => got_section = Some(raw_section),
                ElfSectionType::Progbits(ProgbitsType::Unknown) => {
                    if !is_known_unhandled_section(&raw_section.name)
                        && !raw_section.name.is_empty()
                    {
                        warn!("Unhandled section '{}', skipping", raw_section.name);
                    }
                }
                ElfSectionType::Nobits => nobits_sections.push(raw_section),
                ElfSectionType::Reloc => {
                    // Handled below through object's unified reloc iterator.
                }
                ElfSectionType::Dynamic => {
                    dynamic = Some(DynamicSection::parse(&raw_section.data, endian));
                }
                ElfSectionType::MipsReginfo => {
                    reginfo = MipsReginfo::parse(&raw_section.data, endian);
                }
                ElfSectionType::MipsAbiFlags => {
                    abiflags = MipsAbiFlags::parse(&raw_section.data, endian);
                    if abiflags.is_none() {
                        warn!("Can't parse .MIPS.abiflags, falling back to the default ISA");
                    }
                }
            }
        }

        let symbols = gather_symbols(&elf_file);
        let relocs = gather_relocs(&elf_file);

        let is_pic = dynamic.is_some_and(|x| x.is_pic_layout());
        let gp_value = reginfo.map(|x| x.ri_gp_value).or_else(|| {
            dynamic
                .and_then(|x| x.pltgot)
                // The runtime points `$gp` 0x7FF0 past the GOT start.
                .map(|pltgot| GpValue::new(pltgot.wrapping_add(0x7FF0)))
        });

        let got = got_section.and_then(|section| {
            build_got(&elf_file, &section, dynamic.as_ref()?, endian)
        });

        Ok(Self {
            endian,
            is_pic,
            executable_sections,
            data_sections,
            rodata_sections,
            gcc_except_table_sections,
            nobits_sections,
            symbols,
            relocs,
            gp_value,
            got,
            abiflags,
        })
    }
}

fn gather_relocs(elf_file: &object::File<'_>) -> Vec<ParsedReloc> {
    let mut relocs = Vec::new();

    for section in elf_file.sections() {
        let Some((section_file_offset, _)) = section.file_range() else {
            continue;
        };

        for (offset, reloc) in section.relocations() {
            let raw_kind = match reloc.flags() {
                object::RelocationFlags::Elf { r_type } => r_type,
                _ => continue,
            };

            let Some(reloc_type) = RelocationType::from_elf_id(raw_kind) else {
                warn!(
                    "Unhandled reloc type {} on section {:?} offset 0x{:X}",
                    raw_kind,
                    section.name().unwrap_or("?"),
                    offset
                );
                continue;
            };

            let referenced_sym = match reloc.target() {
                RelocationTarget::Symbol(sym_index) => {
                    match elf_file.symbol_by_index(sym_index) {
                        Ok(sym) =>

                            match (object::ObjectSymbol::name(&sym), object::ObjectSymbol::address(&sym)) {
                                (Ok(name), _) if !name.is_empty() => {
                                    RelocReferencedSym::SymName(
                                        name.to_string(),
                                        reloc.addend() as i32,
                                    )
                                }
                                (_, address) => RelocReferencedSym::Address(Vram::new(
                                    (address as u32).wrapping_add(reloc.addend() as u32),
                                )),
                            },
                        Err(_) => continue,
                    }
                }
                _ => continue,
            };

            relocs.push(ParsedReloc {
                rom: Rom::new(section_file_offset as u32 + offset as u32),
                reloc: reloc_type.new_reloc_info(referenced_sym),
            });
        }
    }

    relocs
}

fn build_got(
    elf_file: &object::File<'_>,
    got_section: &RawElfSection,
    dynamic: &DynamicSection,
    endian: Endian,
) -> Option<GlobalOffsetTable> {
    let local_gotno = dynamic.local_gotno? as usize;
    let gotsym = dynamic.gotsym? as usize;
    let symtabno = dynamic.symtabno? as usize;

    let words: Vec<u32> = got_section
        .data
        .chunks_exact(4)
        .map(|chunk| endian.word_from_bytes(chunk))
        .collect();

    let locals: Vec<Vram> = words
        .iter()
        .take(local_gotno)
        .map(|x| Vram::new(*x))
        .collect();

    // Each global GOT entry pairs with one dynsym entry, starting at gotsym.
    let dyn_symbols: Vec<_> = elf_file.dynamic_symbols().collect();
    let mut globals = Vec::new();
    for (i, initial) in words.iter().skip(local_gotno).enumerate() {
        let sym_index = gotsym + i;
        if sym_index >= symtabno {
            break;
        }

        let (sym_value, undef_com_or_abs, name) = match dyn_symbols.get(sym_index) {
            Some(sym) => {
                let undef = object::ObjectSymbol::is_undefined(sym)
                    || object::ObjectSymbol::is_common(sym);
                (
                    object::ObjectSymbol::address(sym) as u32,
                    undef,
                    object::ObjectSymbol::name(sym)
                        .unwrap_or_default()
                        .to_string(),
                )
            }
            None => (0, true, String::new()),
        };

        globals.push(GotGlobalEntry::new(*initial, sym_value, undef_com_or_abs, name));
    }

    Some(GlobalOffsetTable::new(
        Vram::new(got_section.address),
        locals,
        globals,
    ))
}
