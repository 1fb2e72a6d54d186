/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use super::{AddressRange, Rom, Vram};

/// The rom and vram spans of a chunk of the image, tied together.
///
/// The vram range must be at least as large as the rom range. A vram range
/// larger than the rom one happens on segments that contain trailing noload
/// (bss) sections.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RomVramRange {
    rom: AddressRange<Rom>,
    vram: AddressRange<Vram>,
}

impl RomVramRange {
    #[must_use]
    pub fn new(rom: AddressRange<Rom>, vram: AddressRange<Vram>) -> Self {
        assert!(
            vram.size() >= rom.size(),
            "Can't create a RomVramRange with a vram range ({:?}) smaller than its rom range ({:?})",
            vram,
            rom,
        );
        assert!(
            vram.start().inner() % 4 == rom.start().inner() % 4,
            "vram ({:?}) and rom ({:?}) must have the same alignment",
            vram,
            rom
        );

        Self { rom, vram }
    }

    #[must_use]
    pub const fn rom(&self) -> &AddressRange<Rom> {
        &self.rom
    }
    #[must_use]
    pub const fn vram(&self) -> &AddressRange<Vram> {
        &self.vram
    }

    #[must_use]
    pub fn in_rom_range(&self, rom: Rom) -> bool {
        self.rom.in_range(rom)
    }
    #[must_use]
    pub fn in_vram_range(&self, vram: Vram) -> bool {
        self.vram.in_range(vram)
    }

    #[must_use]
    pub fn vram_from_rom(&self, rom: Rom) -> Option<Vram> {
        self.rom.in_range(rom).then(|| {
            let diff = rom - self.rom.start();
            self.vram.start() + diff
        })
    }

    #[must_use]
    pub fn rom_from_vram(&self, vram: Vram) -> Option<Rom> {
        self.vram.in_range(vram).then(|| {
            let diff = (vram - self.vram.start())
                .try_into()
                .expect("`vram` is checked to not precede the range start");
            self.rom.start() + diff
        })
    }

    pub fn expand_ranges(&mut self, other: &Self) {
        self.rom.expand_range(&other.rom);
        self.vram.expand_range(&other.vram);
    }
}
