/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{
    addresses::{AddressRange, Vram},
    config::Compiler,
    context::Context,
    metadata::{GeneratedBy, ParentSectionMetadata},
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    symbols::SymbolCreationError,
};

use super::{
    display::{SymDisplayError, SymNoloadDisplay, SymNoloadDisplaySettings},
    Symbol,
};

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolNoloadProperties {
    pub parent_metadata: ParentSectionMetadata,
    pub compiler: Option<Compiler>,
    pub auto_pad_by: Option<Vram>,
}

/// A span of bss. No bytes, no relocs; emitted as a single `.space`.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SymbolNoload {
    vram_range: AddressRange<Vram>,
    parent_segment_info: ParentSegmentInfo,
    in_section_offset: usize,
}

impl SymbolNoload {
    pub(crate) fn new(
        context: &mut Context,
        vram_range: AddressRange<Vram>,
        in_section_offset: usize,
        parent_segment_info: ParentSegmentInfo,
        properties: SymbolNoloadProperties,
    ) -> Result<Self, SymbolCreationError> {
        let owned_segment = context.find_owned_segment_mut(&parent_segment_info)?;

        let sym = owned_segment.add_symbol_with_rom(
            vram_range.start(),
            None,
            GeneratedBy::Autogenerated,
            Some(SectionType::Bss),
            false,
        );
        sym.set_defined();
        sym.set_autodetected_size(vram_range.size());
        sym.set_parent_metadata(properties.parent_metadata.clone());
        sym.set_compiler(properties.compiler);
        if let Some(pad_by) = properties.auto_pad_by {
            sym.set_autocreated_pad_by(pad_by);
        }

        Ok(Self {
            vram_range,
            parent_segment_info,
            in_section_offset,
        })
    }

    #[must_use]
    pub const fn in_section_offset(&self) -> usize {
        self.in_section_offset
    }

    pub fn display<'ctx, 'sym, 'flg>(
        &'sym self,
        context: &'ctx Context,
        settings: &'flg SymNoloadDisplaySettings,
    ) -> Result<SymNoloadDisplay<'ctx, 'sym, 'flg>, SymDisplayError> {
        SymNoloadDisplay::new(context, self, settings)
    }
}

impl Symbol for SymbolNoload {
    fn vram_range(&self) -> &AddressRange<Vram> {
        &self.vram_range
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    fn section_type(&self) -> SectionType {
        SectionType::Bss
    }
}
