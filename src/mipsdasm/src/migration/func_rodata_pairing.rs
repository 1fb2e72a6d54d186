/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::borrow::Cow;
use alloc::collections::{btree_set::BTreeSet, vec_deque::VecDeque};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::{
    addresses::Vram,
    context::Context,
    metadata::{RodataMigrationBehavior, SymbolMetadata, SymbolType},
    sections::{Section, SectionData, SectionText},
    symbols::{
        display::{FunctionDisplaySettings, SymDataDisplaySettings},
        Symbol, SymbolData, SymbolFunction,
    },
};

use super::{pairing_display::FuncRodataPairingDisplay, PairingError, RodataIterator};

/// The emission plan for one function: which rodata (and late rodata)
/// symbols ride along with it.
///
/// A list of these, in order, is the whole emission plan of a text/rodata
/// section pair; orphaned symbols of either side become `Single*` entries
/// at the spot that preserves the original order of both sections.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum FuncRodataPairing {
    SingleFunction {
        function_index: usize,
    },
    SingleRodata {
        rodata_index: usize,
    },
    Pairing {
        function_index: usize,
        rodata_indices: Vec<usize>,
        late_rodata_indices: Vec<usize>,
    },
}

impl FuncRodataPairing {
    pub fn pair_sections(
        context: &Context,
        text_section: Option<&SectionText>,
        rodata_section: Option<&SectionData>,
    ) -> Vec<Self> {
        let mut all_entries = Vec::new();

        // The simplest way to know which symbols have not been migrated yet
        // while preserving order is keeping a queue of pending symbols and
        // dropping them as they get handled.
        let all_rodata_syms: &[SymbolData] = rodata_section.map_or(&[], |x| x.data_symbols());
        let mut remaining_rodata_symbols: VecDeque<(usize, &SymbolData)> =
            all_rodata_syms.iter().enumerate().collect();
        let mut handled_symbols = BTreeSet::new();

        for (func_index, func_sym) in text_section
            .iter()
            .flat_map(|x| x.functions().iter().enumerate())
        {
            let entry =
                Self::pair_function_to_rodata_section(context, func_index, func_sym, rodata_section);

            for rodata in entry.iter_rodata(rodata_section) {
                handled_symbols.insert(rodata.vram_range().start());
            }

            // Unhandled symbols that sit before this function's first
            // migrated symbol can't belong to any later function; emit them
            // now so the rodata order survives.
            if let FuncRodataPairing::Pairing { rodata_indices, .. } = &entry {
                if let Some(first_rodata_index) = rodata_indices.first() {
                    let first_rodata_sym = &all_rodata_syms[*first_rodata_index];

                    while let Some((rodata_index, rodata_sym)) = remaining_rodata_symbols.front() {
                        if handled_symbols.contains(&rodata_sym.vram_range().start()) {
                            remaining_rodata_symbols.pop_front();
                            continue;
                        }

                        if rodata_sym.vram_range().start() >= first_rodata_sym.vram_range().start()
                        {
                            break;
                        }

                        all_entries.push(FuncRodataPairing::SingleRodata {
                            rodata_index: *rodata_index,
                        });
                        handled_symbols.insert(rodata_sym.vram_range().start());
                        remaining_rodata_symbols.pop_front();
                    }
                }
            }

            all_entries.push(entry);
        }

        for (rodata_index, rodata_sym) in remaining_rodata_symbols {
            if !handled_symbols.contains(&rodata_sym.vram_range().start()) {
                all_entries.push(FuncRodataPairing::SingleRodata { rodata_index });
            }
        }

        all_entries
    }

    fn pair_function_to_rodata_section(
        context: &Context,
        function_index: usize,
        function: &SymbolFunction,
        rodata_section: Option<&SectionData>,
    ) -> Self {
        let Some(rodata_section) = rodata_section else {
            return FuncRodataPairing::SingleFunction { function_index };
        };

        let intersection: BTreeSet<Vram> = function
            .referenced_vrams()
            .iter()
            .filter(|x| rodata_section.symbols_vrams().contains(x))
            .copied()
            .collect();

        let func_metadata = function.find_own_metadata(context);
        let func_name = func_metadata
            .display_name(context.global_config().naming())
            .to_string();
        let compiler = func_metadata.compiler();
        let compiler_has_late_rodata = compiler.is_some_and(|x| x.has_late_rodata());
        let allow_migrated_somewhere_else =
            compiler.is_some_and(|x| x.allow_rdata_migration());

        let mut migrable_rodata_syms = BTreeSet::new();
        let mut migrable_late_rodata_syms = BTreeSet::new();
        let mut maybe_migrable_rodata_syms = BTreeSet::new();
        let mut maybe_migrable_late_rodata_syms = BTreeSet::new();
        let mut rodata_migrated_somewhere_else = false;
        let mut late_rodata_migrated_somewhere_else = false;

        for rodata_sym in rodata_section.data_symbols() {
            if rodata_migrated_somewhere_else {
                if !compiler_has_late_rodata || late_rodata_migrated_somewhere_else {
                    break;
                }
            }

            let rodata_metadata = rodata_sym.find_own_metadata(context);
            let is_late_rodata = compiler_has_late_rodata
                && rodata_metadata
                    .sym_type()
                    .is_some_and(|x| {
                        matches!(
                            x,
                            SymbolType::Jumptable | SymbolType::Float32 | SymbolType::Float64
                        )
                    });

            if is_late_rodata {
                late_rodata_migrated_somewhere_else = Self::update_migrable_symbols_sets(
                    rodata_metadata,
                    &intersection,
                    &func_name,
                    allow_migrated_somewhere_else,
                    &mut migrable_late_rodata_syms,
                    &mut maybe_migrable_late_rodata_syms,
                    late_rodata_migrated_somewhere_else,
                );
            } else {
                rodata_migrated_somewhere_else = Self::update_migrable_symbols_sets(
                    rodata_metadata,
                    &intersection,
                    &func_name,
                    allow_migrated_somewhere_else,
                    &mut migrable_rodata_syms,
                    &mut maybe_migrable_rodata_syms,
                    rodata_migrated_somewhere_else,
                );
            }
        }

        let mut rodata_indices = Vec::new();
        let mut late_rodata_indices = Vec::new();
        for (rodata_index, rodata_sym) in rodata_section.data_symbols().iter().enumerate() {
            let rodata_vram = rodata_sym.vram_range().start();

            if migrable_late_rodata_syms.contains(&rodata_vram) {
                late_rodata_indices.push(rodata_index);
            } else if migrable_rodata_syms.contains(&rodata_vram) {
                rodata_indices.push(rodata_index);
            }
        }

        FuncRodataPairing::Pairing {
            function_index,
            rodata_indices,
            late_rodata_indices,
        }
    }

    // We decide which symbols to migrate walking left to right. Completely
    // unreferenced symbols may ride along when they sit between two symbols
    // that do migrate to this function; they are kept on a tentative set
    // that gets promoted when the next migrable symbol shows up.
    fn update_migrable_symbols_sets(
        rodata_metadata: &SymbolMetadata,
        intersection: &BTreeSet<Vram>,
        func_name: &str,
        allow_migrated_somewhere_else: bool,
        migrable_rodata_syms: &mut BTreeSet<Vram>,
        maybe_migrable_rodata_syms: &mut BTreeSet<Vram>,
        mut rodata_migrated_somewhere_else: bool,
    ) -> bool {
        if rodata_migrated_somewhere_else {
            return rodata_migrated_somewhere_else;
        }

        if Self::should_migrate_rodata_symbol_to_function(
            rodata_metadata,
            intersection,
            func_name,
            allow_migrated_somewhere_else,
        ) {
            migrable_rodata_syms.insert(rodata_metadata.vram());

            // Promote the tentative in-between symbols.
            migrable_rodata_syms.append(maybe_migrable_rodata_syms);
        } else if !migrable_rodata_syms.is_empty() {
            if rodata_metadata.reference_counter() > 0 {
                rodata_migrated_somewhere_else = true;
            } else if rodata_metadata.is_migrable() {
                maybe_migrable_rodata_syms.insert(rodata_metadata.vram());
            } else {
                rodata_migrated_somewhere_else = true;
            }
        }

        rodata_migrated_somewhere_else
    }

    fn should_migrate_rodata_symbol_to_function(
        rodata_metadata: &SymbolMetadata,
        intersection: &BTreeSet<Vram>,
        func_name: &str,
        allow_migrated_somewhere_else: bool,
    ) -> bool {
        if let RodataMigrationBehavior::MigrateToSpecificFunction(owner_name) =
            rodata_metadata.rodata_migration_behavior()
        {
            // An explicit owner beats every reference-based rule.
            return owner_name == func_name;
        }

        if !intersection.contains(&rodata_metadata.vram()) {
            return false;
        }
        if !rodata_metadata.is_migrable() {
            return false;
        }

        // Rodata referenced by several functions only migrates on compilers
        // known to emit per-file rodata anyway (SN64-style).
        rodata_metadata.reference_functions().len() <= 1 || allow_migrated_somewhere_else
    }
}

impl FuncRodataPairing {
    /// The name of the entry, which is the function's name or the rodata's
    /// name for orphaned entries.
    pub fn display_name(
        &self,
        context: &Context,
        text_section: Option<&SectionText>,
        rodata_section: Option<&SectionData>,
    ) -> Result<String, PairingError> {
        let metadata = match self {
            FuncRodataPairing::Pairing { function_index, .. }
            | FuncRodataPairing::SingleFunction { function_index } => {
                let text_section = text_section.ok_or(PairingError::MissingTextSection)?;
                let functions = text_section.functions();

                functions
                    .get(*function_index)
                    .ok_or_else(|| PairingError::FunctionOutOfBounds {
                        index: *function_index,
                        len: functions.len(),
                        section_name: text_section.name().into(),
                    })?
                    .find_own_metadata(context)
            }
            FuncRodataPairing::SingleRodata { rodata_index } => {
                let rodata_section = rodata_section.ok_or(PairingError::MissingRodataSection)?;
                let data_symbols = rodata_section.data_symbols();

                data_symbols
                    .get(*rodata_index)
                    .ok_or_else(|| PairingError::RodataOutOfBounds {
                        index: *rodata_index,
                        len: data_symbols.len(),
                        section_name: rodata_section.name().into(),
                    })?
                    .find_own_metadata(context)
            }
        };

        Ok(metadata
            .display_name(context.global_config().naming())
            .to_string())
    }

    pub fn iter_rodata<'pairing, 'rodata>(
        &'pairing self,
        rodata_section: Option<&'rodata SectionData>,
    ) -> RodataIterator<'pairing, 'rodata> {
        RodataIterator::new(self, rodata_section)
    }

    #[expect(clippy::too_many_arguments)]
    pub fn display<'ctx, 'text, 'rodata, 'flg, 'lbl>(
        &self,
        context: &'ctx Context,
        text_section: Option<&'text SectionText>,
        function_display_settings: &'flg FunctionDisplaySettings,
        rodata_section: Option<&'rodata SectionData>,
        rodata_display_settings: &'flg SymDataDisplaySettings,
        section_label_text: Option<Cow<'lbl, str>>,
        section_label_rodata: Option<Cow<'lbl, str>>,
        section_label_late_rodata: Option<Cow<'lbl, str>>,
    ) -> Result<FuncRodataPairingDisplay<'ctx, 'text, 'rodata, 'flg, 'lbl>, PairingError> {
        FuncRodataPairingDisplay::new(
            self,
            context,
            text_section,
            function_display_settings,
            rodata_section,
            rodata_display_settings,
            section_label_text,
            section_label_rodata,
            section_label_late_rodata,
        )
    }
}
