/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{addresses::Rom, addresses::Vram, metadata::OverlayCategoryName};

/// Which segment a section (and everything inside it) belongs to.
///
/// A `None` category means the global segment. Overlays are identified by
/// their category plus the rom address their segment starts at, since many
/// overlays of one category can share a vram range.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParentSegmentInfo {
    segment_rom: Rom,
    segment_vram: Vram,
    overlay_category_name: Option<OverlayCategoryName>,
}

impl ParentSegmentInfo {
    #[must_use]
    pub const fn new(
        segment_rom: Rom,
        segment_vram: Vram,
        overlay_category_name: Option<OverlayCategoryName>,
    ) -> Self {
        Self {
            segment_rom,
            segment_vram,
            overlay_category_name,
        }
    }

    #[must_use]
    pub const fn segment_rom(&self) -> Rom {
        self.segment_rom
    }
    #[must_use]
    pub const fn segment_vram(&self) -> Vram {
        self.segment_vram
    }
    #[must_use]
    pub const fn overlay_category_name(&self) -> Option<&OverlayCategoryName> {
        self.overlay_category_name.as_ref()
    }
}
