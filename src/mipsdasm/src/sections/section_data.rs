/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_map::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;

use crate::{
    addresses::{AddressRange, Rom, RomVramRange, Size, Vram},
    analysis::{PascalStringGuesserLevel, StringGuesserLevel},
    collections::{addended_ordered_map::FindSettings, UnorderedMap, UnorderedSet},
    config::Compiler,
    context::Context,
    metadata::{GeneratedBy, ParentSectionMetadata, SymbolType},
    parent_segment_info::ParentSegmentInfo,
    section_type::SectionType,
    str_decoding::Encoding,
    symbols::{SymbolData, SymbolDataProperties},
};

use super::{RomSection, Section, SectionCreationError};

/// A data-like section (data, rodata or an exception table), split into
/// symbols by chasing pointers, user declarations, strings and jumptables.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct SectionData {
    name: String,

    ranges: RomVramRange,

    parent_segment_info: ParentSegmentInfo,

    section_type: SectionType,

    data_symbols: Vec<SymbolData>,

    symbol_vrams: UnorderedSet<Vram>,
}

// The extent of the jumptable being walked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct JumptableState {
    table_vram: Vram,
    owner_range: AddressRange<Vram>,
    remaining_user_size: Option<u32>,
}

impl SectionData {
    #[expect(clippy::too_many_arguments)]
    pub(crate) fn new(
        context: &mut Context,
        settings: &SectionDataSettings,
        name: String,
        raw_bytes: &[u8],
        rom: Rom,
        vram: Vram,
        parent_segment_info: ParentSegmentInfo,
        section_type: SectionType,
    ) -> Result<Self, SectionCreationError> {
        if raw_bytes.is_empty() {
            return Err(SectionCreationError::EmptySection { name });
        }

        let size = Size::new(raw_bytes.len() as u32);
        let rom_range = AddressRange::new(rom, rom + size);
        let vram_range = AddressRange::new(vram, vram + size);
        let ranges = RomVramRange::new(rom_range, vram_range);

        let endian = context.global_config().endian();

        // Where each symbol starts, and the type the walk detected for it.
        let mut symbols_info: BTreeMap<Vram, Option<SymbolType>> = BTreeMap::new();
        let mut auto_pads: UnorderedMap<Vram, Vram> = UnorderedMap::new();
        let mut maybe_pointers_to_other_sections: Vec<(Vram, Rom)> = Vec::new();

        // Make sure the section itself starts a symbol.
        context
            .find_owned_segment_mut(&parent_segment_info)?
            .add_symbol(vram, GeneratedBy::Autogenerated, false);
        symbols_info.insert(vram, None);

        let mut remaining_string_size: i32 = 0;
        let mut prev_sym_type: Option<SymbolType> = None;
        let mut jumptable: Option<JumptableState> = None;

        // `maybe` means the previous symbol suggested late_rodata; confirmed
        // once a second hint shows up.
        let mut maybe_reached_late_rodata = false;
        let mut reached_late_rodata = false;
        let mut float_counter = 0;
        let mut float_padding_counter = 0;

        let displacement = ((4 - vram.inner() % 4) % 4) as usize;
        for (i, word_bytes) in raw_bytes[displacement..].chunks_exact(4).enumerate() {
            let local_offset = i * 4 + displacement;
            let current_vram = vram + Size::new(local_offset as u32);
            let current_rom = rom + Size::new(local_offset as u32);
            let word = endian.word_from_bytes(word_bytes);

            if let Some(state) = jumptable {
                match Self::process_jumptable_entry(
                    context,
                    &parent_segment_info,
                    &state,
                    current_vram,
                    word,
                )? {
                    Some(next_state) => {
                        jumptable = Some(next_state);
                        prev_sym_type = Some(SymbolType::Jumptable);
                        continue;
                    }
                    None => {
                        // First non-entry word: the table ends here.
                        jumptable = None;
                        if ((current_vram - vram).inner() as usize) < raw_bytes.len() {
                            symbols_info.entry(current_vram).or_default();
                            auto_pads.insert(current_vram, state.table_vram);
                        }
                    }
                }
            }

            let owned_segment = context.find_owned_segment(&parent_segment_info)?;

            if remaining_string_size <= 0 && !owned_segment.is_vram_ignored(current_vram) {
                let current_ref =
                    owned_segment.find_symbol(current_vram, FindSettings::new(true));

                // Jumptables referenced by already-analyzed functions.
                if section_type == SectionType::Rodata {
                    if let Some(current_ref) = current_ref {
                        if current_ref.vram() == current_vram && current_ref.is_jumptable() {
                            if let Some(state) = Self::jumptable_state_for(
                                context,
                                &parent_segment_info,
                                current_ref.vram(),
                                current_ref.parent_function(),
                                current_ref.user_declared_size().map(|x| x.inner().get()),
                            ) {
                                symbols_info.insert(current_vram, Some(SymbolType::Jumptable));

                                match Self::process_jumptable_entry(
                                    context,
                                    &parent_segment_info,
                                    &state,
                                    current_vram,
                                    word,
                                )? {
                                    Some(next_state) => {
                                        jumptable = Some(next_state);
                                        prev_sym_type = Some(SymbolType::Jumptable);
                                        continue;
                                    }
                                    None => jumptable = None,
                                }
                            }
                        }
                    }
                }

                let owned_segment = context.find_owned_segment(&parent_segment_info)?;
                let current_ref =
                    owned_segment.find_symbol(current_vram, FindSettings::new(true));

                if current_ref.is_none_or(|x| x.vram() == current_vram) {
                    let guessed_size = settings
                        .string_guesser_level
                        .guess(
                            current_ref,
                            current_vram,
                            &raw_bytes[local_offset..],
                            settings.encoding,
                            settings.compiler,
                            maybe_reached_late_rodata || reached_late_rodata,
                        )
                        .map(|x| (x, SymbolType::CString))
                        .or_else(|| {
                            settings
                                .pascal_string_guesser_level
                                .guess(
                                    current_ref,
                                    current_vram,
                                    &raw_bytes[local_offset..],
                                    settings.encoding,
                                    maybe_reached_late_rodata || reached_late_rodata,
                                )
                                .map(|x| (x, SymbolType::PascalString))
                        });

                    if let Some((str_size, str_type)) = guessed_size {
                        let str_sym_size = str_size.next_multiple_of(4);
                        let in_between_sym = owned_segment.find_symbol(
                            current_vram + Size::new(str_sym_size as u32 - 1),
                            FindSettings::new(true).with_reject_sizeless_addended(false),
                        );

                        let conflict_free = in_between_sym.is_none_or(|x| {
                            let other_sym_vram = x.vram();
                            match other_sym_vram.cmp(&current_vram) {
                                Ordering::Greater => false,
                                Ordering::Equal => true,
                                Ordering::Less => x
                                    .size()
                                    .is_some_and(|siz| other_sym_vram + siz <= current_vram),
                            }
                        });

                        if conflict_free {
                            remaining_string_size = str_size as i32;

                            *symbols_info.entry(current_vram).or_default() = Some(str_type);
                            if !auto_pads.contains_key(&current_vram) {
                                auto_pads.insert(current_vram, current_vram);
                            }

                            let next_vram = current_vram + Size::new(str_sym_size as u32);
                            if ((next_vram - vram).inner() as usize) < raw_bytes.len()
                                && !owned_segment.is_vram_ignored(next_vram)
                            {
                                // Avoid a dangling symbol at the section end.
                                symbols_info.entry(next_vram).or_default();
                                auto_pads.insert(next_vram, current_vram);
                            }

                            // The next symbol must not inherit this type.
                            prev_sym_type = None;
                        }
                    }
                }
            }

            if remaining_string_size <= 0 {
                let b_vram = current_vram + Size::new(1);
                let c_vram = current_vram + Size::new(2);
                let d_vram = current_vram + Size::new(3);

                let owned_segment = context.find_owned_segment(&parent_segment_info)?;
                let a = owned_segment.find_symbol(current_vram, FindSettings::new(false));
                let b = owned_segment.find_symbol(b_vram, FindSettings::new(false));
                let c = owned_segment.find_symbol(c_vram, FindSettings::new(false));
                let d = owned_segment.find_symbol(d_vram, FindSettings::new(false));

                if b.is_none() && c.is_none() && d.is_none() {
                    // No mid-word symbol, this word may hold a pointer.

                    let current_type = match a {
                        None => prev_sym_type,
                        Some(sym) => sym.sym_type(),
                    };
                    let should_search_for_address =
                        current_type.is_none_or(|x| x.can_reference_symbols());

                    if should_search_for_address {
                        let word_vram = Vram::new(word);
                        if vram_range.in_range(word_vram) {
                            // Points into this very section.
                            if !owned_segment.is_vram_ignored(word_vram) {
                                let reference = owned_segment
                                    .find_symbol(word_vram, FindSettings::new(true));
                                if reference.is_none_or(|x| x.vram() == word_vram) {
                                    // Addended hits belong to an existing
                                    // symbol; don't split it.
                                    symbols_info.entry(word_vram).or_default();
                                }
                            }
                        } else if word % 4 == 0 && word_vram.inner() > 0 {
                            let reference = context.find_symbol_from_any_segment(
                                word_vram,
                                &parent_segment_info,
                                FindSettings::new(true),
                                |_| true,
                            );
                            if reference.is_none()
                                && context
                                    .find_referenced_segment(word_vram, &parent_segment_info)
                                    .is_some()
                            {
                                maybe_pointers_to_other_sections.push((word_vram, current_rom));
                            }
                        }
                    }

                    if maybe_reached_late_rodata
                        && matches!(
                            current_type,
                            Some(SymbolType::Float32 | SymbolType::Float64)
                        )
                        && a.is_some()
                    {
                        reached_late_rodata = true;
                    }

                    if let Some(a) = a {
                        if matches!(
                            a.sym_type(),
                            Some(SymbolType::Float32 | SymbolType::Float64)
                        ) {
                            float_counter = 1;
                            float_padding_counter = 0;
                        } else {
                            float_counter = 0;
                            float_padding_counter = 0;
                        }
                    } else if current_type == Some(SymbolType::Float32) {
                        float_counter += 1;
                        if word == 0 {
                            float_padding_counter += 1;
                        }
                    } else if current_type == Some(SymbolType::Float64) {
                        if current_vram.inner() % 8 == 0 {
                            if local_offset + 8 <= raw_bytes.len() {
                                float_counter += 1;
                                if endian
                                    .dword_from_bytes(&raw_bytes[local_offset..local_offset + 8])
                                    == 0
                                {
                                    float_padding_counter += 1;
                                }
                            } else {
                                float_counter = 0;
                                float_padding_counter = 0;
                            }
                        }
                    } else {
                        float_counter = 0;
                        float_padding_counter = 0;
                    }
                }

                for (x_vram, x) in [(current_vram, a), (b_vram, b), (c_vram, c), (d_vram, d)] {
                    if owned_segment.is_vram_ignored(x_vram) {
                        continue;
                    }
                    if let Some(reference) = x {
                        symbols_info.entry(reference.vram()).or_default();
                        if let Some(size) = reference.user_declared_size() {
                            let next_vram = reference.vram() + size.as_size();
                            if ((next_vram - vram).inner() as usize) < raw_bytes.len() {
                                // The user-declared size cuts the symbol
                                // early; the tail becomes a pad.
                                symbols_info.entry(next_vram).or_default();
                                auto_pads.insert(next_vram, reference.vram());
                            }
                        }
                        prev_sym_type = reference.sym_type();
                    } else if owned_segment.is_vram_a_possible_pointer_in_data(x_vram) {
                        symbols_info.entry(x_vram).or_default();
                    }
                }
            }

            maybe_reached_late_rodata = false;
            if !reached_late_rodata
                && section_type == SectionType::Rodata
                && prev_sym_type.is_some_and(|x| x.is_late_rodata(settings.compiler))
            {
                if prev_sym_type == Some(SymbolType::Jumptable) {
                    reached_late_rodata = true;
                } else if float_padding_counter + 1 == float_counter {
                    // A float is not proof by itself: we could be inside a
                    // const float array. Only zero-padded runs qualify.
                    maybe_reached_late_rodata = true;
                }
            }
            remaining_string_size -= 4;
        }

        let symbols_info_vec: Vec<(Vram, Option<SymbolType>)> = symbols_info.into_iter().collect();

        let mut data_symbols = Vec::new();
        let mut symbol_vrams = UnorderedSet::new();

        for (i, (new_sym_vram, detected_type)) in symbols_info_vec.iter().enumerate() {
            let start = (*new_sym_vram - vram).inner() as usize;
            let end = if i + 1 < symbols_info_vec.len() {
                (symbols_info_vec[i + 1].0 - vram).inner() as usize
            } else {
                raw_bytes.len()
            };
            debug_assert!(start < end, "{:?} {:?} {} {}", rom, vram, start, end);

            let sym_rom = rom + Size::new(start as u32);

            symbol_vrams.insert(*new_sym_vram);

            let detected_type = detected_type.or_else(|| {
                Self::guess_float_type(
                    context,
                    &parent_segment_info,
                    settings,
                    section_type,
                    *new_sym_vram,
                    &raw_bytes[start..end],
                    endian,
                )
            });

            let properties = SymbolDataProperties {
                parent_metadata: ParentSectionMetadata::new(name.clone(), vram),
                compiler: settings.compiler,
                auto_pad_by: auto_pads.get(new_sym_vram).copied(),
                detected_type,
                encoding: settings.encoding,
            };
            let sym = SymbolData::new(
                context,
                raw_bytes[start..end].into(),
                sym_rom,
                *new_sym_vram,
                start,
                parent_segment_info.clone(),
                section_type,
                properties,
            )?;

            data_symbols.push(sym);
        }

        let owned_segment_mut = context.find_owned_segment_mut(&parent_segment_info)?;
        for (possible_pointer, rom_referencing_it) in maybe_pointers_to_other_sections {
            owned_segment_mut.add_possible_pointer_in_data(possible_pointer, rom_referencing_it);
        }

        Ok(Self {
            name,
            ranges,
            parent_segment_info,
            section_type,
            data_symbols,
            symbol_vrams,
        })
    }

    fn jumptable_state_for(
        context: &Context,
        parent_segment_info: &ParentSegmentInfo,
        table_vram: Vram,
        owner_function: Option<Vram>,
        user_size: Option<u32>,
    ) -> Option<JumptableState> {
        let owner_vram = owner_function?;
        let segment = context.find_referenced_segment(owner_vram, parent_segment_info)?;
        let owner = segment.find_symbol(owner_vram, FindSettings::new(false))?;

        let owner_size = owner.size_or_default();
        Some(JumptableState {
            table_vram,
            owner_range: AddressRange::new(owner_vram, owner_vram + owner_size),
            remaining_user_size: user_size,
        })
    }

    /// Check one word as a jumptable entry; a label is created for valid
    /// ones. Returns the state for the next word, or `None` when the table
    /// ends here.
    fn process_jumptable_entry(
        context: &mut Context,
        parent_segment_info: &ParentSegmentInfo,
        state: &JumptableState,
        current_vram: Vram,
        word: u32,
    ) -> Result<Option<JumptableState>, SectionCreationError> {
        if let Some(remaining) = state.remaining_user_size {
            if remaining == 0 {
                return Ok(None);
            }
        }

        if current_vram != state.table_vram {
            // A declared symbol cuts the table short.
            let owned_segment = context.find_owned_segment(parent_segment_info)?;
            if let Some(sym) = owned_segment.find_symbol(current_vram, FindSettings::new(false)) {
                if sym.is_user_declared() || !sym.reference_functions().is_empty() {
                    return Ok(None);
                }
            }
        }

        let target = Vram::new(word);
        if word % 4 != 0 || !state.owner_range.in_range(target) {
            return Ok(None);
        }

        // An entry can't point at the start of a different known function.
        {
            let owned_segment = context.find_owned_segment(parent_segment_info)?;
            if let Some(existing) = owned_segment.find_symbol(target, FindSettings::new(false)) {
                if existing.sym_type() == Some(SymbolType::Function)
                    && existing.vram() != state.owner_range.start()
                {
                    return Ok(None);
                }
            }
        }

        if let Some(segment) = context.find_referenced_segment_mut(target, parent_segment_info) {
            let label = segment.add_jumptable_label(target, None, GeneratedBy::Autogenerated);
            label.set_parent_function(state.owner_range.start());
            label.add_reference_symbol(state.table_vram);
        }

        Ok(Some(JumptableState {
            remaining_user_size: state.remaining_user_size.map(|x| x.saturating_sub(4)),
            ..*state
        }))
    }

    /// Floats and doubles on rodata, recognized by their bit pattern.
    #[expect(clippy::too_many_arguments)]
    fn guess_float_type(
        context: &Context,
        parent_segment_info: &ParentSegmentInfo,
        settings: &SectionDataSettings,
        section_type: SectionType,
        sym_vram: Vram,
        bytes: &[u8],
        endian: crate::config::Endian,
    ) -> Option<SymbolType> {
        if section_type != SectionType::Rodata || !settings.guess_floats {
            return None;
        }

        let referenced = context
            .find_owned_segment(parent_segment_info)
            .ok()?
            .find_symbol(sym_vram, FindSettings::new(false))
            .is_some_and(|x| x.reference_counter() > 0);
        if !referenced {
            return None;
        }

        if bytes.len() == 4 && sym_vram.inner() % 4 == 0 {
            let float32 = f32::from_bits(endian.word_from_bytes(bytes));
            if float32 == 0.0
                || (float32.is_normal() && (1e-10..1e10).contains(&(float32.abs() as f64)))
            {
                return Some(SymbolType::Float32);
            }
        } else if bytes.len() == 8 && sym_vram.inner() % 8 == 0 {
            let float64 = f64::from_bits(endian.dword_from_bytes(bytes));
            if float64 == 0.0 || (float64.is_normal() && (1e-10..1e10).contains(&float64.abs())) {
                return Some(SymbolType::Float64);
            }
        }

        None
    }
}

impl SectionData {
    pub fn data_symbols(&self) -> &[SymbolData] {
        &self.data_symbols
    }
}

impl Section for SectionData {
    fn name(&self) -> &str {
        &self.name
    }

    fn vram_range(&self) -> &AddressRange<Vram> {
        self.ranges.vram()
    }

    fn parent_segment_info(&self) -> &ParentSegmentInfo {
        &self.parent_segment_info
    }

    fn section_type(&self) -> SectionType {
        self.section_type
    }

    fn symbols_vrams(&self) -> &UnorderedSet<Vram> {
        &self.symbol_vrams
    }
}

impl RomSection for SectionData {
    fn rom_vram_range(&self) -> &RomVramRange {
        &self.ranges
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SectionDataSettings {
    compiler: Option<Compiler>,
    string_guesser_level: StringGuesserLevel,
    pascal_string_guesser_level: PascalStringGuesserLevel,
    encoding: Encoding,
    guess_floats: bool,
}

impl SectionDataSettings {
    pub fn new(compiler: Option<Compiler>) -> Self {
        Self {
            compiler,
            string_guesser_level: StringGuesserLevel::default(),
            pascal_string_guesser_level: PascalStringGuesserLevel::default(),
            encoding: compiler
                .map(|x| x.default_rodata_encoding())
                .unwrap_or(Encoding::default()),
            guess_floats: true,
        }
    }

    #[must_use]
    pub const fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }

    #[must_use]
    pub const fn string_guesser_level(&self) -> StringGuesserLevel {
        self.string_guesser_level
    }
    pub fn with_string_guesser_level(self, string_guesser_level: StringGuesserLevel) -> Self {
        Self {
            string_guesser_level,
            ..self
        }
    }

    #[must_use]
    pub const fn pascal_string_guesser_level(&self) -> PascalStringGuesserLevel {
        self.pascal_string_guesser_level
    }
    pub fn with_pascal_string_guesser_level(
        self,
        pascal_string_guesser_level: PascalStringGuesserLevel,
    ) -> Self {
        Self {
            pascal_string_guesser_level,
            ..self
        }
    }

    #[must_use]
    pub const fn encoding(&self) -> Encoding {
        self.encoding
    }
    pub fn with_encoding(self, encoding: Encoding) -> Self {
        Self { encoding, ..self }
    }

    #[must_use]
    pub const fn guess_floats(&self) -> bool {
        self.guess_floats
    }
    pub fn with_guess_floats(self, guess_floats: bool) -> Self {
        Self {
            guess_floats,
            ..self
        }
    }
}
