/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use core::{error, fmt};

use crate::symbols::display::SymDisplayError;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum PairingError {
    MissingTextSection,
    MissingRodataSection,
    FunctionOutOfBounds {
        index: usize,
        len: usize,
        section_name: String,
    },
    RodataOutOfBounds {
        index: usize,
        len: usize,
        section_name: String,
    },
    SymDisplayFail(SymDisplayError),
}

impl fmt::Display for PairingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PairingError::MissingTextSection => {
                write!(f, "The pairing references a function but no text section was given")
            }
            PairingError::MissingRodataSection => {
                write!(f, "The pairing references rodata but no rodata section was given")
            }
            PairingError::FunctionOutOfBounds {
                index,
                len,
                section_name,
            } => write!(
                f,
                "Function index {} is out of bounds for section '{}' ({} functions)",
                index, section_name, len
            ),
            PairingError::RodataOutOfBounds {
                index,
                len,
                section_name,
            } => write!(
                f,
                "Rodata index {} is out of bounds for section '{}' ({} symbols)",
                index, section_name, len
            ),
            PairingError::SymDisplayFail(x) => write!(f, "{}", x),
        }
    }
}
impl error::Error for PairingError {}

impl From<SymDisplayError> for PairingError {
    fn from(value: SymDisplayError) -> Self {
        PairingError::SymDisplayFail(value)
    }
}
