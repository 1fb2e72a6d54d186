/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use super::{Vram, VramOffset};

/// The value the `$gp` register holds during execution.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct GpValue {
    inner: u32,
}

impl GpValue {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self { inner: value }
    }

    #[must_use]
    pub const fn inner(&self) -> u32 {
        self.inner
    }

    #[must_use]
    pub const fn as_vram(&self) -> Vram {
        Vram::new(self.inner)
    }

    #[must_use]
    pub fn add_offset(&self, offset: VramOffset) -> Vram {
        self.as_vram() + offset
    }
}

impl fmt::Debug for GpValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpValue {{ 0x{:08X} }}", self.inner)
    }
}
