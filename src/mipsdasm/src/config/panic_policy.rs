/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

/// Upgrades selected recoverable problems into hard errors.
///
/// The default keeps everything recoverable: mismatches get reported and
/// analysis continues with the best guess.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Default)]
pub struct PanicPolicy {
    range_check: bool,
    size_mismatch: bool,
}

impl PanicPolicy {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            range_check: false,
            size_mismatch: false,
        }
    }

    /// A user-declared symbol outside every mapped vram range becomes fatal.
    #[must_use]
    pub const fn range_check(&self) -> bool {
        self.range_check
    }
    #[must_use]
    pub const fn with_range_check(self, range_check: bool) -> Self {
        Self {
            range_check,
            ..self
        }
    }

    /// A user-declared size disagreeing with the detected one becomes fatal.
    #[must_use]
    pub const fn size_mismatch(&self) -> bool {
        self.size_mismatch
    }
    #[must_use]
    pub const fn with_size_mismatch(self, size_mismatch: bool) -> Self {
        Self {
            size_mismatch,
            ..self
        }
    }
}
