/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::fmt;

/// The user-defined category an overlay belongs to.
///
/// Overlays in the same category share a vram range and are never loaded at
/// the same time, like the actor overlays of a Zelda64 game.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct OverlayCategoryName {
    inner: String,
}

impl OverlayCategoryName {
    #[must_use]
    pub const fn new(name: String) -> Self {
        Self { inner: name }
    }

    #[must_use]
    pub fn inner(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for OverlayCategoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}
