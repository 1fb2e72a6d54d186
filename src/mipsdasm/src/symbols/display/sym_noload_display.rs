/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use crate::{
    collections::addended_ordered_map::FindSettings,
    context::Context,
    metadata::SymbolMetadata,
    symbols::{Symbol, SymbolNoload},
};

use super::{SymCommonDisplaySettings, SymDisplayError, WordComment};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymNoloadDisplaySettings {
    common: SymCommonDisplaySettings,
}

impl SymNoloadDisplaySettings {
    pub fn new() -> Self {
        Self {
            common: SymCommonDisplaySettings::new(),
        }
    }

    pub fn with_common(self, common: SymCommonDisplaySettings) -> Self {
        Self { common }
    }
}

impl Default for SymNoloadDisplaySettings {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Display` view of a bss span.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymNoloadDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym SymbolNoload,
    settings: &'flg SymNoloadDisplaySettings,

    metadata: &'ctx SymbolMetadata,
}

impl<'ctx, 'sym, 'flg> SymNoloadDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym SymbolNoload,
        settings: &'flg SymNoloadDisplaySettings,
    ) -> Result<Self, SymDisplayError> {
        let owned_segment = context.find_owned_segment(sym.parent_segment_info())?;
        let metadata = owned_segment
            .find_symbol(sym.vram_range().start(), FindSettings::new(false))
            .ok_or(SymDisplayError::SelfSymNotFound())?;

        Ok(Self {
            context,
            sym,
            settings,
            metadata,
        })
    }
}

impl fmt::Display for SymNoloadDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.context.global_config();

        self.settings
            .common
            .display_symbol_name(f, config, self.metadata)?;

        let vram = self.sym.vram_range().start();
        self.settings
            .common
            .display_asm_comment(f, None, vram, WordComment::No)?;
        write!(
            f,
            " .space {}{}",
            self.sym.vram_range().size(),
            self.settings.common.line_end()
        )?;

        self.settings.common.display_sym_end(f, config, self.metadata)
    }
}
