/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::{error, fmt};

use crate::{
    addresses::{AddressRange, GlobalOffsetTable, Rom, Vram},
    collections::{addended_ordered_map::FindSettings, UnorderedMap},
    config::GlobalConfig,
    metadata::{OverlayCategory, OverlayCategoryName, SegmentMetadata, SymbolMetadata},
    parent_segment_info::ParentSegmentInfo,
    relocation::UserRelocs,
    sections::{
        SectionCreationError, SectionData, SectionDataSettings, SectionNoload,
        SectionNoloadSettings, SectionText, SectionTextSettings,
    },
    section_type::SectionType,
};

/// The single mutable store every analysis pass reads from and writes to.
///
/// Built once through [`ContextBuilder`], then handed by `&mut` to each
/// section analysis in order: text, rodata, data, bss.
///
/// [`ContextBuilder`]: super::ContextBuilder
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    global_config: GlobalConfig,

    global_segment: SegmentMetadata,
    overlay_segments: UnorderedMap<OverlayCategoryName, OverlayCategory>,

    global_offset_table: Option<GlobalOffsetTable>,
    user_relocs: UserRelocs,
}

impl Context {
    pub(crate) fn new(
        global_config: GlobalConfig,
        global_segment: SegmentMetadata,
        overlay_segments: UnorderedMap<OverlayCategoryName, OverlayCategory>,
        global_offset_table: Option<GlobalOffsetTable>,
        user_relocs: UserRelocs,
    ) -> Self {
        Self {
            global_config,
            global_segment,
            overlay_segments,
            global_offset_table,
            user_relocs,
        }
    }

    #[must_use]
    pub const fn global_config(&self) -> &GlobalConfig {
        &self.global_config
    }
    #[must_use]
    pub const fn global_segment(&self) -> &SegmentMetadata {
        &self.global_segment
    }
    #[must_use]
    pub const fn overlay_segments(&self) -> &UnorderedMap<OverlayCategoryName, OverlayCategory> {
        &self.overlay_segments
    }
    #[must_use]
    pub const fn global_offset_table(&self) -> Option<&GlobalOffsetTable> {
        self.global_offset_table.as_ref()
    }
    #[must_use]
    pub const fn user_relocs(&self) -> &UserRelocs {
        &self.user_relocs
    }
}

impl Context {
    pub fn create_section_text(
        &mut self,
        settings: &SectionTextSettings,
        name: String,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionText, SectionCreationError> {
        SectionText::new(
            self,
            settings,
            name,
            raw_bytes,
            rom,
            vram,
            parent_segment_info,
        )
    }

    pub fn create_section_data(
        &mut self,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionData, SectionCreationError> {
        SectionData::new(
            self,
            settings,
            name,
            raw_bytes,
            rom,
            vram,
            parent_segment_info,
            SectionType::Data,
        )
    }

    pub fn create_section_rodata(
        &mut self,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionData, SectionCreationError> {
        SectionData::new(
            self,
            settings,
            name,
            raw_bytes,
            rom,
            vram,
            parent_segment_info,
            SectionType::Rodata,
        )
    }

    pub fn create_section_gcc_except_table(
        &mut self,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionData, SectionCreationError> {
        SectionData::new(
            self,
            settings,
            name,
            raw_bytes,
            rom,
            vram,
            parent_segment_info,
            SectionType::GccExceptTable,
        )
    }

    pub fn create_section_bss(
        &mut self,
        settings: &SectionNoloadSettings,
        name: String,
        vram_range: AddressRange<Vram>,
        parent_segment_info: ParentSegmentInfo,
    ) -> Result<SectionNoload, SectionCreationError> {
        SectionNoload::new(self, settings, name, vram_range, parent_segment_info)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub struct OwnedSegmentNotFoundError {
    info: ParentSegmentInfo,
}

impl fmt::Display for OwnedSegmentNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Can't find the owned segment for ")?;
        if let Some(overlay_name) = self.info.overlay_category_name() {
            write!(f, "overlay '{}'", overlay_name)?;
        } else {
            write!(f, "the global segment")?;
        }
        write!(
            f,
            ". Expected parent segment addresses: Rom: 0x{:08X}, Vram: 0x{:08X}",
            self.info.segment_rom().inner(),
            self.info.segment_vram().inner()
        )
    }
}
impl error::Error for OwnedSegmentNotFoundError {}

impl Context {
    pub(crate) fn find_owned_segment(
        &self,
        info: &ParentSegmentInfo,
    ) -> Result<&SegmentMetadata, OwnedSegmentNotFoundError> {
        if let Some(overlay_name) = info.overlay_category_name() {
            if let Some(segments_per_rom) = self.overlay_segments.get(overlay_name) {
                if let Some(segment) = segments_per_rom.segments().get(&info.segment_rom()) {
                    debug_assert!(segment.category_name() == Some(overlay_name));
                    return Ok(segment);
                }
            }
        } else if self.global_segment.in_rom_range(info.segment_rom())
            || self.global_segment.in_vram_range(info.segment_vram())
        {
            // The vram fallback covers segments made only of bss sections,
            // which have no rom data at all.
            return Ok(&self.global_segment);
        }
        Err(OwnedSegmentNotFoundError { info: info.clone() })
    }

    pub(crate) fn find_owned_segment_mut(
        &mut self,
        info: &ParentSegmentInfo,
    ) -> Result<&mut SegmentMetadata, OwnedSegmentNotFoundError> {
        if let Some(overlay_name) = info.overlay_category_name() {
            if let Some(segments_per_rom) = self.overlay_segments.get_mut(overlay_name) {
                if let Some(segment) = segments_per_rom.segments_mut().get_mut(&info.segment_rom())
                {
                    debug_assert!(segment.category_name() == Some(overlay_name));
                    return Ok(segment);
                }
            }
        } else if self.global_segment.in_rom_range(info.segment_rom())
            || self.global_segment.in_vram_range(info.segment_vram())
        {
            return Ok(&mut self.global_segment);
        }
        Err(OwnedSegmentNotFoundError { info: info.clone() })
    }
}

// Where a referenced vram should be looked up (or created). Resolved first
// so the mutable path doesn't fight the borrow checker.
#[derive(Debug, Clone, PartialEq)]
enum SegmentLocator {
    Global,
    Overlay(OverlayCategoryName, Rom),
    Placeholder(OverlayCategoryName),
}

impl Context {
    fn locate_referenced_segment(
        &self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<SegmentLocator> {
        if self.global_segment.in_vram_range(vram) {
            return Some(SegmentLocator::Global);
        }

        if let Some(overlay_category_name) = info.overlay_category_name() {
            // Prioritize the segment the reference comes from.
            if let Some(segments_per_rom) = self.overlay_segments.get(overlay_category_name) {
                if let Some(owned_segment) = segments_per_rom.segments().get(&info.segment_rom()) {
                    if owned_segment.in_vram_range(vram) {
                        return Some(SegmentLocator::Overlay(
                            overlay_category_name.clone(),
                            info.segment_rom(),
                        ));
                    }

                    // Then any overlay this segment explicitly prioritizes.
                    for prioritised_overlay in owned_segment.prioritised_overlays() {
                        for (ovl_cat, segments_per_rom) in self.overlay_segments.iter() {
                            for (segment_rom, segment) in segments_per_rom.segments() {
                                if segment.name() == Some(prioritised_overlay)
                                    && segment.in_vram_range(vram)
                                {
                                    return Some(SegmentLocator::Overlay(
                                        ovl_cat.clone(),
                                        *segment_rom,
                                    ));
                                }
                            }
                        }
                    }
                }
            }
        }

        let own_category = info.overlay_category_name();

        // Sibling categories with a single segment first: less likely to
        // grab the wrong overlay's symbol.
        for (ovl_cat, segments_per_rom) in self.overlay_segments.iter() {
            if own_category == Some(ovl_cat) {
                continue;
            }
            let segments = segments_per_rom.segments();
            if segments.len() == 1 {
                let (segment_rom, segment) = segments
                    .iter()
                    .next()
                    .expect("len was just checked to be 1");
                if segment.in_vram_range(vram) {
                    return Some(SegmentLocator::Overlay(ovl_cat.clone(), *segment_rom));
                }
            }
        }

        for (ovl_cat, segments_per_rom) in self.overlay_segments.iter() {
            if own_category == Some(ovl_cat) {
                continue;
            }
            let segments = segments_per_rom.segments();
            if segments.len() != 1 {
                for (segment_rom, segment) in segments {
                    if segment.in_vram_range(vram) {
                        return Some(SegmentLocator::Overlay(ovl_cat.clone(), *segment_rom));
                    }
                }
            }
        }

        // Nothing owns this address yet; fall back to the category-wide
        // placeholder so the symbol is at least not lost.
        for (ovl_cat, segments_per_rom) in self.overlay_segments.iter() {
            if own_category == Some(ovl_cat) {
                continue;
            }
            if segments_per_rom.placeholder_segment().in_vram_range(vram) {
                return Some(SegmentLocator::Placeholder(ovl_cat.clone()));
            }
        }

        None
    }

    #[must_use]
    pub(crate) fn find_referenced_segment(
        &self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<&SegmentMetadata> {
        match self.locate_referenced_segment(vram, info)? {
            SegmentLocator::Global => Some(&self.global_segment),
            SegmentLocator::Overlay(cat, rom) => {
                self.overlay_segments.get(&cat)?.segments().get(&rom)
            }
            SegmentLocator::Placeholder(cat) => {
                Some(self.overlay_segments.get(&cat)?.placeholder_segment())
            }
        }
    }

    #[must_use]
    pub(crate) fn find_referenced_segment_mut(
        &mut self,
        vram: Vram,
        info: &ParentSegmentInfo,
    ) -> Option<&mut SegmentMetadata> {
        match self.locate_referenced_segment(vram, info)? {
            SegmentLocator::Global => Some(&mut self.global_segment),
            SegmentLocator::Overlay(cat, rom) => self
                .overlay_segments
                .get_mut(&cat)?
                .segments_mut()
                .get_mut(&rom),
            SegmentLocator::Placeholder(cat) => Some(
                self.overlay_segments
                    .get_mut(&cat)?
                    .placeholder_segment_mut(),
            ),
        }
    }

    #[must_use]
    pub(crate) fn find_symbol_from_any_segment<F>(
        &self,
        vram: Vram,
        info: &ParentSegmentInfo,
        settings: FindSettings,
        ovl_sym_validation: F,
    ) -> Option<&SymbolMetadata>
    where
        F: Fn(&SymbolMetadata) -> bool,
    {
        if self.global_segment.in_vram_range(vram) {
            return self.global_segment.find_symbol(vram, settings);
        }

        let segment = self.find_referenced_segment(vram, info)?;
        segment
            .find_symbol(vram, settings)
            .filter(|sym| ovl_sym_validation(sym))
    }
}
