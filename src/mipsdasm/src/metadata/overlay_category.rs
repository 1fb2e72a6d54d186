/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::BTreeMap;

use crate::addresses::{Rom, RomVramRange};

use super::{OverlayCategoryName, SegmentMetadata};

/// Every overlay segment of one category, keyed by the rom address each one
/// starts at.
///
/// The placeholder segment spans the whole category's vram range and
/// collects symbols referenced on category siblings before (or without) the
/// owning overlay being analyzed.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayCategory {
    placeholder_segment: SegmentMetadata,
    segments: BTreeMap<Rom, SegmentMetadata>,
}

impl OverlayCategory {
    pub(crate) fn new(name: OverlayCategoryName, combined_ranges: RomVramRange) -> Self {
        Self {
            placeholder_segment: SegmentMetadata::new(combined_ranges, None, Some(name)),
            segments: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn placeholder_segment(&self) -> &SegmentMetadata {
        &self.placeholder_segment
    }
    pub(crate) fn placeholder_segment_mut(&mut self) -> &mut SegmentMetadata {
        &mut self.placeholder_segment
    }

    #[must_use]
    pub const fn segments(&self) -> &BTreeMap<Rom, SegmentMetadata> {
        &self.segments
    }
    pub(crate) fn segments_mut(&mut self) -> &mut BTreeMap<Rom, SegmentMetadata> {
        &mut self.segments
    }

    pub(crate) fn add_segment(&mut self, segment: SegmentMetadata) {
        self.placeholder_segment
            .expand_ranges(segment.rom_vram_range());
        self.segments
            .insert(segment.rom_range().start(), segment);
    }
}
