/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use mipsdasm::metadata::SymbolType;
use object::{Object, ObjectSymbol, SymbolKind};

/// A symtab entry reduced to what the context builder consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfSymbol {
    pub name: String,
    pub address: u32,
    pub size: Option<u32>,
    pub sym_type: Option<SymbolType>,
    pub is_weak: bool,
    pub is_global: bool,
}

impl ElfSymbol {
    pub fn from_object_symbol(sym: &object::Symbol<'_, '_>) -> Option<Self> {
        let name = sym.name().ok()?;
        if name.is_empty() || sym.is_undefined() {
            return None;
        }

        let sym_type = match sym.kind() {
            SymbolKind::Text => Some(SymbolType::Function),
            SymbolKind::Data | SymbolKind::Unknown => None,
            // Sections, files and the rest aren't addressable symbols.
            _ => return None,
        };

        Some(Self {
            name: name.to_string(),
            address: sym.address() as u32,
            size: (sym.size() != 0).then_some(sym.size() as u32),
            sym_type,
            is_weak: sym.is_weak(),
            is_global: sym.is_global(),
        })
    }
}

/// Gather every usable symbol of the object, symtab and dynsym both.
pub fn gather_symbols(elf_file: &object::File<'_>) -> Vec<ElfSymbol> {
    let mut symbols: Vec<ElfSymbol> = elf_file
        .symbols()
        .filter_map(|sym| ElfSymbol::from_object_symbol(&sym))
        .collect();

    symbols.extend(
        elf_file
            .dynamic_symbols()
            .filter_map(|sym| ElfSymbol::from_object_symbol(&sym)),
    );

    symbols.sort_by_key(|x| x.address);
    symbols.dedup_by(|a, b| a.address == b.address && a.name == b.name);

    symbols
}
