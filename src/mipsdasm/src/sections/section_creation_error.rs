/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::{error, fmt};

use crate::{
    addresses::{Rom, Vram},
    context::OwnedSegmentNotFoundError,
    symbols::SymbolCreationError,
};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SectionCreationError {
    OwnedSegmentNotFound(OwnedSegmentNotFoundError),
    EmptySection {
        name: String,
    },
    UnalignedVram {
        name: String,
        vram: Vram,
    },
    UnalignedRom {
        name: String,
        rom: Rom,
    },
    BadBytesSize {
        name: String,
        size: usize,
        multiple_of: usize,
    },
}

impl fmt::Display for SectionCreationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionCreationError::OwnedSegmentNotFound(x) => write!(f, "{}", x),
            SectionCreationError::EmptySection { name } => {
                write!(f, "Can't create section '{}' with no bytes", name)
            }
            SectionCreationError::UnalignedVram { name, vram } => write!(
                f,
                "Section '{}' must have a word-aligned vram, got 0x{:08X}",
                name,
                vram.inner()
            ),
            SectionCreationError::UnalignedRom { name, rom } => write!(
                f,
                "Section '{}' must have a word-aligned rom, got 0x{:08X}",
                name,
                rom.inner()
            ),
            SectionCreationError::BadBytesSize {
                name,
                size,
                multiple_of,
            } => write!(
                f,
                "Section '{}' has 0x{:X} bytes, which is not a multiple of 0x{:X}",
                name, size, multiple_of
            ),
        }
    }
}
impl error::Error for SectionCreationError {}

impl From<OwnedSegmentNotFoundError> for SectionCreationError {
    fn from(value: OwnedSegmentNotFoundError) -> Self {
        SectionCreationError::OwnedSegmentNotFound(value)
    }
}

impl From<SymbolCreationError> for SectionCreationError {
    fn from(value: SymbolCreationError) -> Self {
        match value {
            SymbolCreationError::OwnedSegmentNotFound(x) => {
                SectionCreationError::OwnedSegmentNotFound(x)
            }
        }
    }
}
