/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::{error, fmt};

use crate::context::OwnedSegmentNotFoundError;

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SymDisplayError {
    OwnedSegmentNotFound(OwnedSegmentNotFoundError),
    SelfSymNotFound(),
}

impl fmt::Display for SymDisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymDisplayError::OwnedSegmentNotFound(x) => write!(f, "{}", x),
            SymDisplayError::SelfSymNotFound() => {
                write!(f, "Can't find the metadata of the symbol itself")
            }
        }
    }
}
impl error::Error for SymDisplayError {}

impl From<OwnedSegmentNotFoundError> for SymDisplayError {
    fn from(value: OwnedSegmentNotFoundError) -> Self {
        SymDisplayError::OwnedSegmentNotFound(value)
    }
}
