/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::{error, fmt};

use crate::{
    addresses::{AddressRange, GlobalOffsetTable, Rom, RomVramRange, Vram},
    collections::UnorderedMap,
    config::GlobalConfig,
    metadata::{
        GeneratedBy, OverlayCategory, OverlayCategoryName, SegmentMetadata, SymbolMetadata,
        SymbolType,
    },
    relocation::{RelocationInfo, UserRelocs},
};

use super::Context;

/// Stages everything the analysis needs to know beforehand: segments, user
/// symbols, banned ranges, the GOT and external relocs.
///
/// ```no_run
/// # use mipsdasm::addresses::{AddressRange, Rom, RomVramRange, Vram};
/// # use mipsdasm::config::{Endian, GlobalConfig};
/// # use mipsdasm::context::ContextBuilder;
/// let ranges = RomVramRange::new(
///     AddressRange::new(Rom::new(0x1000), Rom::new(0x10000)),
///     AddressRange::new(Vram::new(0x80000400), Vram::new(0x8000F400)),
/// );
/// let mut builder = ContextBuilder::new(GlobalConfig::new(Endian::Big), ranges);
/// builder
///     .add_user_function("entrypoint".into(), Vram::new(0x80000400), None)
///     .unwrap();
/// let context = builder.build();
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ContextBuilder {
    global_config: GlobalConfig,
    global_segment: SegmentMetadata,
    overlay_segments: UnorderedMap<OverlayCategoryName, OverlayCategory>,
    global_offset_table: Option<GlobalOffsetTable>,
    user_relocs: UserRelocs,
}

impl ContextBuilder {
    pub fn new(global_config: GlobalConfig, global_ranges: RomVramRange) -> Self {
        Self {
            global_config,
            global_segment: SegmentMetadata::new(global_ranges, None, None),
            overlay_segments: UnorderedMap::new(),
            global_offset_table: None,
            user_relocs: UserRelocs::new(),
        }
    }

    fn check_vram_in_range(&self, name: &str, vram: Vram) -> Result<(), AddUserSymbolError> {
        let range = *self.global_segment.vram_range();

        if !range.in_range(vram) {
            return Err(AddUserSymbolError::OutOfRange {
                name: name.into(),
                vram,
                range,
            });
        }
        Ok(())
    }

    /// Declare a symbol on the global segment before analysis runs.
    pub fn add_user_symbol(
        &mut self,
        name: String,
        vram: Vram,
        sym_type: Option<SymbolType>,
    ) -> Result<&mut SymbolMetadata, AddUserSymbolError> {
        self.check_vram_in_range(&name, vram)?;

        let sym = self
            .global_segment
            .add_symbol(vram, GeneratedBy::UserDeclared, false);
        if let Some(previous) = sym.user_declared_name() {
            if previous != name {
                let previous = String::from(previous);
                return Err(AddUserSymbolError::Duplicated {
                    name,
                    vram,
                    previous,
                });
            }
        }
        sym.set_user_declared_name(name);
        if let Some(sym_type) = sym_type {
            sym.set_type(sym_type, GeneratedBy::UserDeclared);
        }
        Ok(sym)
    }

    pub fn add_user_function(
        &mut self,
        name: String,
        vram: Vram,
        rom: Option<Rom>,
    ) -> Result<&mut SymbolMetadata, AddUserSymbolError> {
        self.check_vram_in_range(&name, vram)?;

        let sym = self
            .global_segment
            .add_function(vram, rom, GeneratedBy::UserDeclared);
        sym.set_user_declared_name(name);
        Ok(sym)
    }

    /// Ban a vram range: nothing in it will ever be symbolized.
    pub fn add_ignored_address_range(&mut self, range: AddressRange<Vram>) {
        self.global_segment.add_ignored_address_range(range);
    }

    /// Register an overlay segment, creating its category on first use.
    pub fn add_overlay(&mut self, overlay: OverlaySegmentBuilder) {
        let category = overlay.category.clone();
        let ranges = overlay.ranges;

        let overlay_category = match self.overlay_segments.get_mut(&category) {
            Some(x) => x,
            None => {
                let new = OverlayCategory::new(category.clone(), ranges);
                self.overlay_segments.insert(category.clone(), new);
                self.overlay_segments
                    .get_mut(&category)
                    .expect("Just inserted")
            }
        };

        overlay_category.add_segment(overlay.finish());
    }

    pub fn set_global_offset_table(&mut self, got: GlobalOffsetTable) {
        self.global_offset_table = Some(got);
    }

    /// Attach an externally supplied relocation to the word at `rom`.
    pub fn add_user_reloc(&mut self, rom: Rom, reloc: RelocationInfo) {
        self.user_relocs.add_reloc(rom, reloc);
    }

    #[must_use]
    pub fn build(self) -> Context {
        Context::new(
            self.global_config,
            self.global_segment,
            self.overlay_segments,
            self.global_offset_table,
            self.user_relocs,
        )
    }
}

/// Stages one overlay segment: its ranges, user symbols and the overlays it
/// may resolve symbols from, before it gets registered on the
/// [`ContextBuilder`] through [`ContextBuilder::add_overlay`].
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct OverlaySegmentBuilder {
    category: OverlayCategoryName,
    ranges: RomVramRange,
    segment: SegmentMetadata,
}

impl OverlaySegmentBuilder {
    pub fn new(category: OverlayCategoryName, ranges: RomVramRange, name: String) -> Self {
        Self {
            category: category.clone(),
            ranges,
            segment: SegmentMetadata::new(ranges, Some(name), Some(category)),
        }
    }

    #[must_use]
    pub const fn category(&self) -> &OverlayCategoryName {
        &self.category
    }

    /// Declare a symbol on this overlay before analysis runs.
    pub fn add_user_symbol(
        &mut self,
        name: String,
        vram: Vram,
        sym_type: Option<SymbolType>,
    ) -> Result<&mut SymbolMetadata, AddUserSymbolError> {
        if !self.ranges.in_vram_range(vram) {
            return Err(AddUserSymbolError::OutOfRange {
                name,
                vram,
                range: *self.ranges.vram(),
            });
        }

        let sym = self
            .segment
            .add_symbol(vram, GeneratedBy::UserDeclared, false);
        if let Some(previous) = sym.user_declared_name() {
            if previous != name {
                let previous = String::from(previous);
                return Err(AddUserSymbolError::Duplicated {
                    name,
                    vram,
                    previous,
                });
            }
        }
        sym.set_user_declared_name(name);
        if let Some(sym_type) = sym_type {
            sym.set_type(sym_type, GeneratedBy::UserDeclared);
        }
        Ok(sym)
    }

    /// Let this overlay resolve symbols from the named overlay even across
    /// categories.
    pub fn add_prioritised_overlay(&mut self, overlay_name: String) {
        self.segment.add_prioritised_overlay(overlay_name);
    }

    fn finish(self) -> SegmentMetadata {
        self.segment
    }
}

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AddUserSymbolError {
    OutOfRange {
        name: String,
        vram: Vram,
        range: AddressRange<Vram>,
    },
    Duplicated {
        name: String,
        vram: Vram,
        previous: String,
    },
}

impl fmt::Display for AddUserSymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddUserSymbolError::OutOfRange { name, vram, range } => write!(
                f,
                "Symbol '{}' (vram 0x{:08X}) is outside the mapped range {:?}",
                name,
                vram.inner(),
                range
            ),
            AddUserSymbolError::Duplicated {
                name,
                vram,
                previous,
            } => write!(
                f,
                "Symbol '{}' at vram 0x{:08X} was already declared as '{}'",
                name,
                vram.inner(),
                previous
            ),
        }
    }
}
impl error::Error for AddUserSymbolError {}
