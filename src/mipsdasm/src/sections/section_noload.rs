/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use alloc::vec::Vec;

use crate::{
    addresses::{AddressRange, UserSize, Vram},
    collections::UnorderedSet,
    config::Compiler,
    context::Context,
    metadata::ParentSectionMetadata,
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::{SymbolNoload, SymbolNoloadProperties},
};

use super::{Section, SectionCreationError};

/// A bss section. No bytes to chase pointers on; splitting is driven purely
/// by user-declared symbols and previously referenced addresses.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SectionNoload {
    name: String,

    vram_range: AddressRange<Vram>,

    parent_segment_info: ParentSegmentInfo,

    noload_symbols: Vec<SymbolNoload>,

    symbol_vrams: UnorderedSet<Vram>,
}

impl SectionNoload {
    pub(crate) fn new(
        context: &mut Context,
        settings: &SectionNoloadSettings,
        name: String,
        vram_range: AddressRange<Vram>,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<Self, SectionCreationError> {
        if vram_range.start() == vram_range.end() {
            return Err(SectionCreationError::EmptySection { name });
        }

        // Every known address inside the range splits it: user declarations
        // and whatever text/data analysis found referenced in here.
        let mut splits: Vec<(Vram, Option<UserSize>)> = vec![(vram_range.start(), None)];
        {
            let owned_segment = context.find_owned_segment(&parent_segment_info)?;
            for (sym_vram, sym) in
                owned_segment.find_symbols_range(vram_range.start(), vram_range.end())
            {
                if *sym_vram != vram_range.start() {
                    splits.push((*sym_vram, sym.user_declared_size()));
                } else {
                    splits[0].1 = sym.user_declared_size();
                }
            }
        }

        let mut noload_symbols = Vec::new();
        let mut symbol_vrams = UnorderedSet::new();

        for (i, (sym_vram, user_size)) in splits.iter().enumerate() {
            let next_vram = if i + 1 < splits.len() {
                splits[i + 1].0
            } else {
                vram_range.end()
            };

            symbol_vrams.insert(*sym_vram);

            // A user size smaller than the detected span cuts the symbol,
            // and the tail becomes an autogenerated pad.
            let declared_end = user_size
                .map(|size| size.add_vram(sym_vram))
                .filter(|end| *end < next_vram);

            let in_section_offset = (*sym_vram - vram_range.start()).inner() as usize;
            let properties = SymbolNoloadProperties {
                parent_metadata: ParentSectionMetadata::new(name.clone(), vram_range.start()),
                compiler: settings.compiler,
                auto_pad_by: None,
            };
            let sym = SymbolNoload::new(
                context,
                AddressRange::new(*sym_vram, declared_end.unwrap_or(next_vram)),
                in_section_offset,
                parent_segment_info.clone(),
                properties,
            )?;
            noload_symbols.push(sym);

            if let Some(pad_start) = declared_end {
                symbol_vrams.insert(pad_start);

                let pad_properties = SymbolNoloadProperties {
                    parent_metadata: ParentSectionMetadata::new(
                        name.clone(),
                        vram_range.start(),
                    ),
                    compiler: settings.compiler,
                    auto_pad_by: Some(*sym_vram),
                };
                let pad = SymbolNoload::new(
                    context,
                    AddressRange::new(pad_start, next_vram),
                    (pad_start - vram_range.start()).inner() as usize,
                    parent_segment_info.clone(),
                    pad_properties,
                )?;
                noload_symbols.push(pad);
            }
        }

        Ok(Self {
            name,
            vram_range,
            parent_segment_info,
            noload_symbols,
            symbol_vrams,
        })
    }

    pub fn noload_symbols(&self) -> &[SymbolNoload] {
        &self.noload_symbols
    }
}

impl Section for SectionNoload {
    fn name(&self) -> &str {
        &self.name
    }

    fn vram_range(&self) -> &AddressRange<Vram> {
        &self.vram_range
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    fn section_type(&self) -> SectionType {
        SectionType::Bss
    }

    fn symbols_vrams(&self) -> &UnorderedSet<Vram> {
        &self.symbol_vrams
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SectionNoloadSettings {
    compiler: Option<Compiler>,
}

impl SectionNoloadSettings {
    pub fn new(compiler: Option<Compiler>) -> Self {
        Self { compiler }
    }

    #[must_use]
    pub const fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }
}
