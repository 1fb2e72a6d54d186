/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use alloc::string::String;

use crate::{
    addresses::{Rom, Vram},
    config::GlobalConfig,
    metadata::{SymbolMetadata, SymbolType},
};

/// The word dumped on the per-line comment, if any.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum WordComment {
    No,
    U32(u32),
    U64(u64),
}

/// Emission knobs shared by every symbol kind.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymCommonDisplaySettings {
    line_end: Option<String>,

    emit_asm_comment: bool,

    asm_indentation: u8,
    asm_indentation_labels: u8,

    emit_size_directive: bool,
}

impl SymCommonDisplaySettings {
    pub fn new() -> Self {
        Self {
            line_end: None,
            emit_asm_comment: true,
            asm_indentation: 4,
            asm_indentation_labels: 2,
            emit_size_directive: false,
        }
    }

    /// Pick up the emission toggles the user set on the global config.
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self {
            line_end: None,
            emit_asm_comment: true,
            asm_indentation: config.asm_indentation(),
            asm_indentation_labels: config.asm_indentation_labels(),
            emit_size_directive: config.emit_size_directive(),
        }
    }

    pub fn with_line_end(self, line_end: Option<String>) -> Self {
        Self { line_end, ..self }
    }
    pub fn with_emit_asm_comment(self, emit_asm_comment: bool) -> Self {
        Self {
            emit_asm_comment,
            ..self
        }
    }
    pub fn with_emit_size_directive(self, emit_size_directive: bool) -> Self {
        Self {
            emit_size_directive,
            ..self
        }
    }

    pub fn line_end(&self) -> &str {
        self.line_end.as_deref().unwrap_or("\n")
    }

    #[must_use]
    pub(crate) const fn asm_indentation_labels(&self) -> u8 {
        self.asm_indentation_labels
    }
}

impl SymCommonDisplaySettings {
    pub(crate) fn display_asm_comment(
        &self,
        f: &mut fmt::Formatter<'_>,
        rom: Option<Rom>,
        vram: Vram,
        word: WordComment,
    ) -> fmt::Result {
        if self.asm_indentation > 0 {
            write!(f, "{:width$}", " ", width = self.asm_indentation as usize)?;
        }

        if !self.emit_asm_comment {
            return Ok(());
        }

        write!(f, "/* ")?;
        if let Some(rom) = rom {
            write!(f, "{:06X} ", rom.inner())?;
        }
        write!(f, "{:08X} ", vram.inner())?;
        match word {
            WordComment::No => {}
            WordComment::U32(word) => write!(f, "{:08X} ", word)?,
            WordComment::U64(dword) => write!(f, "{:016X} ", dword)?,
        }

        write!(f, "*/")
    }

    /// The `glabel`/`dlabel` line that opens a symbol.
    pub(crate) fn display_symbol_name(
        &self,
        f: &mut fmt::Formatter<'_>,
        config: &GlobalConfig,
        metadata: &SymbolMetadata,
    ) -> fmt::Result {
        let name = metadata.display_name(config.naming());
        let macro_labels = config.macro_labels();

        let label_macro = match metadata.sym_type() {
            Some(SymbolType::Function) => macro_labels.func(),
            Some(SymbolType::GccExceptTable) => macro_labels.data(),
            _ => macro_labels.data(),
        };

        write!(f, "{} {}{}", label_macro, name, self.line_end())
    }

    /// `.size`, end labels; everything that closes a symbol.
    pub(crate) fn display_sym_end(
        &self,
        f: &mut fmt::Formatter<'_>,
        config: &GlobalConfig,
        metadata: &SymbolMetadata,
    ) -> fmt::Result {
        let name = metadata.display_name(config.naming());
        let macro_labels = config.macro_labels();

        if self.emit_size_directive {
            write!(f, ".size {}, . - {}{}", name, name, self.line_end())?;
        }

        if let Some(name_end) = metadata.user_declared_name_end() {
            write!(f, "{}:{}", name_end, self.line_end())?;
        }

        let end_macro = match metadata.sym_type() {
            Some(SymbolType::Function) => macro_labels.func_end(),
            _ => macro_labels.data_end(),
        };
        if let Some(end_macro) = end_macro {
            write!(f, "{} {}{}", end_macro, name, self.line_end())?;
        }

        Ok(())
    }

    pub(crate) fn display_sym_prev_alignment(
        &self,
        f: &mut fmt::Formatter<'_>,
        metadata: &SymbolMetadata,
    ) -> fmt::Result {
        if let (Some(compiler), Some(sym_type)) = (metadata.compiler(), metadata.sym_type()) {
            if let Some(shift) = compiler.prev_align_for_type(sym_type) {
                write!(f, ".align {}{}", shift, self.line_end())?;
            }
        }
        Ok(())
    }

    pub(crate) fn display_sym_post_alignment(
        &self,
        f: &mut fmt::Formatter<'_>,
        metadata: &SymbolMetadata,
    ) -> fmt::Result {
        if let (Some(compiler), Some(sym_type)) = (metadata.compiler(), metadata.sym_type()) {
            if let Some(shift) = compiler.post_align_for_type(sym_type) {
                write!(f, ".align {}{}", shift, self.line_end())?;
            }
        }
        Ok(())
    }
}

impl Default for SymCommonDisplaySettings {
    fn default() -> Self {
        Self::new()
    }
}
