/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt;

use crate::{
    context::Context,
    sections::{Section, SectionData, SectionText},
    symbols::{
        display::{
            FunctionDisplay, FunctionDisplaySettings, InternalSymDisplSettings, SymDataDisplay,
            SymDataDisplaySettings,
        },
        SymbolData,
    },
};

use super::{FuncRodataPairing, PairingError};

/// `fmt::Display` of one emission-plan entry: the function followed by its
/// migrated rodata (and late rodata), each under its section label.
#[must_use]
pub struct FuncRodataPairingDisplay<'ctx, 'text, 'rodata, 'flg, 'lbl> {
    func_display: Option<FunctionDisplay<'ctx, 'text, 'flg>>,

    rodata_displays: Vec<SymDataDisplay<'ctx, 'rodata, 'flg>>,
    late_rodata_displays: Vec<SymDataDisplay<'ctx, 'rodata, 'flg>>,

    section_label_text: Option<Cow<'lbl, str>>,
    section_label_rodata: Option<Cow<'lbl, str>>,
    section_label_late_rodata: Option<Cow<'lbl, str>>,

    line_end: &'flg str,
}

impl<'ctx, 'text, 'rodata, 'flg, 'lbl> FuncRodataPairingDisplay<'ctx, 'text, 'rodata, 'flg, 'lbl> {
    #[expect(clippy::too_many_arguments)]
    pub(crate) fn new(
        pairing: &FuncRodataPairing,
        context: &'ctx Context,
        text_section: Option<&'text SectionText>,
        function_display_settings: &'flg FunctionDisplaySettings,
        rodata_section: Option<&'rodata SectionData>,
        rodata_display_settings: &'flg SymDataDisplaySettings,
        section_label_text: Option<Cow<'lbl, str>>,
        section_label_rodata: Option<Cow<'lbl, str>>,
        section_label_late_rodata: Option<Cow<'lbl, str>>,
    ) -> Result<Self, PairingError> {
        // Everything inside a pairing is emitted as a migrated symbol, so
        // relocs get the old-assembler treatment when the compiler needs it.
        let is_migration = matches!(
            pairing,
            FuncRodataPairing::Pairing { rodata_indices, late_rodata_indices, .. }
                if !rodata_indices.is_empty() || !late_rodata_indices.is_empty()
        );
        let internal = InternalSymDisplSettings::new(is_migration);

        let func_display = match pairing {
            FuncRodataPairing::Pairing { function_index, .. }
            | FuncRodataPairing::SingleFunction { function_index } => {
                let text_section = text_section.ok_or(PairingError::MissingTextSection)?;
                let functions = text_section.functions();
                let function = functions.get(*function_index).ok_or_else(|| {
                    PairingError::FunctionOutOfBounds {
                        index: *function_index,
                        len: functions.len(),
                        section_name: text_section.name().into(),
                    }
                })?;

                Some(
                    FunctionDisplay::new_internal(
                        context,
                        function,
                        function_display_settings,
                        internal,
                    )
                    .map_err(PairingError::from)?,
                )
            }
            FuncRodataPairing::SingleRodata { .. } => None,
        };

        let rodata_display_for = |rodata_index: usize| -> Result<
            SymDataDisplay<'ctx, 'rodata, 'flg>,
            PairingError,
        > {
            let rodata_section = rodata_section.ok_or(PairingError::MissingRodataSection)?;
            let data_symbols = rodata_section.data_symbols();
            let sym: &'rodata SymbolData =
                data_symbols
                    .get(rodata_index)
                    .ok_or_else(|| PairingError::RodataOutOfBounds {
                        index: rodata_index,
                        len: data_symbols.len(),
                        section_name: rodata_section.name().into(),
                    })?;

            SymDataDisplay::new_internal(context, sym, rodata_display_settings, internal)
                .map_err(PairingError::from)
        };

        let mut rodata_displays = Vec::new();
        let mut late_rodata_displays = Vec::new();
        match pairing {
            FuncRodataPairing::SingleFunction { .. } => {}
            FuncRodataPairing::SingleRodata { rodata_index } => {
                rodata_displays.push(rodata_display_for(*rodata_index)?);
            }
            FuncRodataPairing::Pairing {
                rodata_indices,
                late_rodata_indices,
                ..
            } => {
                for rodata_index in rodata_indices {
                    rodata_displays.push(rodata_display_for(*rodata_index)?);
                }
                for rodata_index in late_rodata_indices {
                    late_rodata_displays.push(rodata_display_for(*rodata_index)?);
                }
            }
        }

        Ok(Self {
            func_display,
            rodata_displays,
            late_rodata_displays,
            section_label_text,
            section_label_rodata,
            section_label_late_rodata,
            line_end: function_display_settings.common().line_end(),
        })
    }
}

impl fmt::Display for FuncRodataPairingDisplay<'_, '_, '_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(func_display) = &self.func_display {
            if let Some(label) = &self.section_label_text {
                write!(f, "{}{}{}", label, self.line_end, self.line_end)?;
            }
            write!(f, "{}", func_display)?;
        }

        if !self.rodata_displays.is_empty() {
            if self.func_display.is_some() {
                write!(f, "{}", self.line_end)?;
            }
            if let Some(label) = &self.section_label_rodata {
                write!(f, "{}{}{}", label, self.line_end, self.line_end)?;
            }
            for rodata in &self.rodata_displays {
                write!(f, "{}", rodata)?;
            }
        }

        if !self.late_rodata_displays.is_empty() {
            write!(f, "{}", self.line_end)?;
            if let Some(label) = &self.section_label_late_rodata {
                write!(f, "{}{}{}", label, self.line_end, self.line_end)?;
            }
            for rodata in &self.late_rodata_displays {
                write!(f, "{}", rodata)?;
            }
        }

        Ok(())
    }
}
