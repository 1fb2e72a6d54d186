/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{sections::SectionData, symbols::SymbolData};

use super::FuncRodataPairing;

/// Iterates every rodata symbol of a pairing: the normal ones first, then
/// the late rodata ones.
#[must_use]
pub struct RodataIterator<'pairing, 'rodata> {
    pairing: &'pairing FuncRodataPairing,
    rodata_section: Option<&'rodata SectionData>,
    index: usize,
}

impl<'pairing, 'rodata> RodataIterator<'pairing, 'rodata> {
    pub(crate) const fn new(
        pairing: &'pairing FuncRodataPairing,
        rodata_section: Option<&'rodata SectionData>,
    ) -> Self {
        Self {
            pairing,
            rodata_section,
            index: 0,
        }
    }
}

impl<'rodata> Iterator for RodataIterator<'_, 'rodata> {
    type Item = &'rodata SymbolData;

    fn next(&mut self) -> Option<Self::Item> {
        let rodata_section = self.rodata_section?;

        let rodata_index = match self.pairing {
            FuncRodataPairing::SingleFunction { .. } => None,
            FuncRodataPairing::SingleRodata { rodata_index } => {
                (self.index == 0).then_some(*rodata_index)
            }
            FuncRodataPairing::Pairing {
                rodata_indices,
                late_rodata_indices,
                ..
            } => rodata_indices
                .get(self.index)
                .or_else(|| late_rodata_indices.get(self.index - rodata_indices.len()))
                .copied(),
        }?;

        self.index += 1;
        rodata_section.data_symbols().get(rodata_index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let total = match self.pairing {
            FuncRodataPairing::SingleFunction { .. } => 0,
            FuncRodataPairing::SingleRodata { .. } => 1,
            FuncRodataPairing::Pairing {
                rodata_indices,
                late_rodata_indices,
                ..
            } => rodata_indices.len() + late_rodata_indices.len(),
        };
        let left = total.saturating_sub(self.index);

        (left, Some(left))
    }
}
