/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use alloc::string::ToString;

use crate::{
    addresses::{Rom, Size, Vram},
    collections::addended_ordered_map::FindSettings,
    config::Endian,
    context::Context,
    metadata::{SymbolMetadata, SymbolType},
    relocation::RelocationType,
    str_decoding,
    symbols::{RomSymbol, Symbol, SymbolData},
};

use super::{InternalSymDisplSettings, SymCommonDisplaySettings, SymDisplayError, WordComment};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymDataDisplaySettings {
    common: SymCommonDisplaySettings,
}

impl SymDataDisplaySettings {
    pub fn new() -> Self {
        Self {
            common: SymCommonDisplaySettings::new(),
        }
    }

    pub fn with_common(self, common: SymCommonDisplaySettings) -> Self {
        Self { common }
    }

    #[must_use]
    pub const fn common(&self) -> &SymCommonDisplaySettings {
        &self.common
    }
}

impl Default for SymDataDisplaySettings {
    fn default() -> Self {
        Self::new()
    }
}

/// `fmt::Display` view of a data/rodata symbol: per-word directives with
/// type-driven formatting, degrading to `.word`s whenever a fancier form
/// wouldn't reassemble byte-exact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymDataDisplay<'ctx, 'sym, 'flg> {
    context: &'ctx Context,
    sym: &'sym SymbolData,
    settings: &'flg SymDataDisplaySettings,
    endian: Endian,

    metadata: &'ctx SymbolMetadata,

    internal_settings: InternalSymDisplSettings,
}

impl<'ctx, 'sym, 'flg> SymDataDisplay<'ctx, 'sym, 'flg> {
    pub(crate) fn new(
        context: &'ctx Context,
        sym: &'sym SymbolData,
        settings: &'flg SymDataDisplaySettings,
    ) -> Result<Self, SymDisplayError> {
        Self::new_internal(context, sym, settings, InternalSymDisplSettings::new(false))
    }

    pub(crate) fn new_internal(
        context: &'ctx Context,
        sym: &'sym SymbolData,
        settings: &'flg SymDataDisplaySettings,
        internal_settings: InternalSymDisplSettings,
    ) -> Result<Self, SymDisplayError> {
        let owned_segment = context.find_owned_segment(sym.parent_segment_info())?;
        let metadata = owned_segment
            .find_symbol(sym.vram_range().start(), FindSettings::new(false))
            .ok_or(SymDisplayError::SelfSymNotFound())?;

        Ok(Self {
            context,
            sym,
            settings,
            endian: context.global_config().endian(),
            metadata,
            internal_settings,
        })
    }
}

impl SymDataDisplay<'_, '_, '_> {
    fn line_end(&self) -> &str {
        self.settings.common.line_end()
    }

    fn is_byte(&self, i: usize) -> bool {
        i % 2 != 0
            || self.sym.rom_vram_range().rom().start().inner() % 2 != 0
            || self.sym.raw_bytes().len() - i < 2
    }

    fn is_short(&self, i: usize) -> bool {
        let rom = self.sym.rom_vram_range().rom().start().inner();

        (i % 4 != 0 && i % 2 == 0)
            || (rom % 4 != 0 && rom % 2 == 0)
            || self.sym.raw_bytes().len() - i < 4
    }

    fn display_as_byte(
        &self,
        f: &mut fmt::Formatter<'_>,
        i: usize,
        current_rom: Rom,
        current_vram: Vram,
    ) -> Result<usize, fmt::Error> {
        let byte = self.sym.raw_bytes()[i];

        self.settings
            .common
            .display_asm_comment(f, Some(current_rom), current_vram, WordComment::No)?;
        write!(f, " .byte 0x{:02X}{}", byte, self.line_end())?;

        Ok(1)
    }

    fn display_as_short(
        &self,
        f: &mut fmt::Formatter<'_>,
        i: usize,
        current_rom: Rom,
        current_vram: Vram,
    ) -> Result<usize, fmt::Error> {
        let short = self
            .endian
            .short_from_bytes(&self.sym.raw_bytes()[i..i + 2]);

        self.settings
            .common
            .display_asm_comment(f, Some(current_rom), current_vram, WordComment::No)?;
        write!(f, " .short 0x{:04X}{}", short, self.line_end())?;

        Ok(2)
    }

    fn display_as_word(
        &self,
        f: &mut fmt::Formatter<'_>,
        i: usize,
        current_rom: Rom,
        current_vram: Vram,
    ) -> Result<usize, fmt::Error> {
        let word = self.endian.word_from_bytes(&self.sym.raw_bytes()[i..i + 4]);

        self.settings.common.display_asm_comment(
            f,
            Some(current_rom),
            current_vram,
            WordComment::U32(word),
        )?;

        let find_settings = FindSettings::new(self.metadata.allow_ref_with_addend());
        if let Some(rel) = self.sym.relocs()[i / 4]
            .as_ref()
            .filter(|x| !x.reloc_type().is_none())
            .and_then(|x| {
                x.display(
                    self.context,
                    self.sym.parent_segment_info(),
                    find_settings,
                    self.metadata.compiler(),
                    self.internal_settings.migrate(),
                    false,
                )
            })
        {
            let prefixed = matches!(
                self.sym.relocs()[i / 4].as_ref().map(|x| x.reloc_type()),
                Some(RelocationType::R_MIPS_32 | RelocationType::R_MIPS_GPREL32)
            );
            if prefixed {
                write!(f, " {}", rel)?;
            } else {
                write!(f, " .word {}", rel)?;
            }
        } else if let Some(name) = self.late_symbol_for_word(word) {
            // The pointed-at section wasn't analyzed yet when this symbol
            // was sliced; resolve the pointer now that it has been.
            write!(f, " .word {}", name)?;
        } else {
            write!(f, " .word 0x{:08X}", word)?;
        }

        write!(f, "{}", self.line_end())?;

        Ok(4)
    }

    // Pointers confirmed after this symbol was built.
    fn late_symbol_for_word(&self, word: u32) -> Option<alloc::string::String> {
        let word_vram = Vram::new(word);
        if word % 4 != 0 {
            return None;
        }
        if !self
            .metadata
            .sym_type()
            .is_none_or(|x| x.can_reference_symbols())
        {
            return None;
        }

        let segment = self
            .context
            .find_referenced_segment(word_vram, self.sym.parent_segment_info())?;
        if segment.is_vram_ignored(word_vram) {
            return None;
        }
        let sym = segment.find_symbol(word_vram, FindSettings::new(false))?;
        if !sym.can_be_referenced() {
            return None;
        }

        Some(
            sym.display_name(self.context.global_config().naming())
                .to_string(),
        )
    }

    fn display_as_float32(
        &self,
        f: &mut fmt::Formatter<'_>,
        i: usize,
        current_rom: Rom,
        current_vram: Vram,
    ) -> Result<usize, fmt::Error> {
        let word = self.endian.word_from_bytes(&self.sym.raw_bytes()[i..i + 4]);
        let float32 = f32::from_bits(word);
        if float32.is_nan() || float32.is_infinite() || float32.is_subnormal() {
            return self.display_as_word(f, i, current_rom, current_vram);
        }

        self.settings.common.display_asm_comment(
            f,
            Some(current_rom),
            current_vram,
            WordComment::U32(word),
        )?;
        write!(f, " .float {:?}{}", float32, self.line_end())?;

        Ok(4)
    }

    fn display_as_float64(
        &self,
        f: &mut fmt::Formatter<'_>,
        i: usize,
        current_rom: Rom,
        current_vram: Vram,
    ) -> Result<usize, fmt::Error> {
        let dword = self
            .endian
            .dword_from_bytes(&self.sym.raw_bytes()[i..i + 8]);
        let float64 = f64::from_bits(dword);
        if float64.is_nan() || float64.is_infinite() || float64.is_subnormal() {
            return self.display_as_word(f, i, current_rom, current_vram);
        }

        self.settings.common.display_asm_comment(
            f,
            Some(current_rom),
            current_vram,
            WordComment::U64(dword),
        )?;
        write!(f, " .double {:?}{}", float64, self.line_end())?;

        Ok(8)
    }

    fn display_as_c_string(
        &self,
        f: &mut fmt::Formatter<'_>,
        i: usize,
        current_rom: Rom,
        current_vram: Vram,
    ) -> Result<usize, fmt::Error> {
        let bytes = &self.sym.raw_bytes()[i..];
        let str_end = match bytes.iter().position(|x| *x == b'\0') {
            Some(0) | None => return self.display_as_word(f, i, current_rom, current_vram),
            Some(str_end) => str_end,
        };

        let Some(decoded) = self.sym.encoding().decode_to_string(&bytes[..str_end]) else {
            return self.display_as_word(f, i, current_rom, current_vram);
        };

        let escaped = str_decoding::escape_string(&decoded);

        self.settings
            .common
            .display_asm_comment(f, Some(current_rom), current_vram, WordComment::No)?;
        write!(f, " .asciz \"{}\"{}", escaped, self.line_end())?;

        Ok((str_end + 1).next_multiple_of(4))
    }

    fn display_as_pascal_string(
        &self,
        f: &mut fmt::Formatter<'_>,
        i: usize,
        current_rom: Rom,
        current_vram: Vram,
    ) -> Result<usize, fmt::Error> {
        let bytes = &self.sym.raw_bytes()[i..];
        let Ok(total) = self.sym.encoding().check_valid_pascal(bytes) else {
            return self.display_as_word(f, i, current_rom, current_vram);
        };
        let len = bytes[0] as usize;
        let Some(decoded) = self.sym.encoding().decode_to_string(&bytes[1..1 + len]) else {
            return self.display_as_word(f, i, current_rom, current_vram);
        };

        self.settings
            .common
            .display_asm_comment(f, Some(current_rom), current_vram, WordComment::No)?;
        write!(f, " .byte 0x{:02X}{}", len, self.line_end())?;

        let escaped = str_decoding::escape_string(&decoded);
        self.settings
            .common
            .display_asm_comment(f, Some(current_rom), current_vram, WordComment::No)?;
        write!(f, " .ascii \"{}\"{}", escaped, self.line_end())?;

        for (pad_index, pad) in bytes[1 + len..total].iter().enumerate() {
            let offset = Size::new((1 + len + pad_index) as u32);
            self.settings.common.display_asm_comment(
                f,
                Some(current_rom + offset),
                current_vram + offset,
                WordComment::No,
            )?;
            write!(f, " .byte 0x{:02X}{}", pad, self.line_end())?;
        }

        Ok(total)
    }
}

impl fmt::Display for SymDataDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.context.global_config();
        let sym_type = self.metadata.sym_type();

        self.settings
            .common
            .display_sym_prev_alignment(f, self.metadata)?;
        self.settings
            .common
            .display_symbol_name(f, config, self.metadata)?;

        let ranges = self.sym.rom_vram_range();
        let rom = ranges.rom().start();
        let vram = ranges.vram().start();
        let bytes_len = self.sym.raw_bytes().len();

        let mut i = 0;
        while i < bytes_len {
            let offset = Size::new(i as u32);
            let current_rom = rom + offset;
            let current_vram = vram + offset;
            let x = current_rom.inner();

            // Dodge alignment and leftover-bytes issues first; only nicely
            // aligned data gets the typed treatment.
            let advance = match (bytes_len - i, x % 4) {
                (1, _) | (_, 1 | 3) => self.display_as_byte(f, i, current_rom, current_vram)?,
                (2 | 3, _) | (_, 2) => {
                    if sym_type == Some(SymbolType::Byte) || self.is_byte(i) {
                        self.display_as_byte(f, i, current_rom, current_vram)?
                    } else {
                        self.display_as_short(f, i, current_rom, current_vram)?
                    }
                }
                _ => match sym_type {
                    Some(SymbolType::Byte) => {
                        self.display_as_byte(f, i, current_rom, current_vram)?
                    }
                    Some(SymbolType::Short) => {
                        self.display_as_short(f, i, current_rom, current_vram)?
                    }
                    Some(SymbolType::Float32) => {
                        self.display_as_float32(f, i, current_rom, current_vram)?
                    }
                    Some(SymbolType::Float64)
                        if current_vram.inner() % 8 == 0 && bytes_len - i >= 8 =>
                    {
                        self.display_as_float64(f, i, current_rom, current_vram)?
                    }
                    Some(SymbolType::CString) => {
                        self.display_as_c_string(f, i, current_rom, current_vram)?
                    }
                    Some(SymbolType::PascalString) => {
                        self.display_as_pascal_string(f, i, current_rom, current_vram)?
                    }
                    Some(
                        SymbolType::Word
                        | SymbolType::Jumptable
                        | SymbolType::GccExceptTable
                        | SymbolType::Function
                        | SymbolType::BranchLabel
                        | SymbolType::JumptableLabel
                        | SymbolType::GccExceptTableLabel
                        | SymbolType::UserCustom,
                    ) => self.display_as_word(f, i, current_rom, current_vram)?,
                    None | Some(SymbolType::DWord | SymbolType::Float64) => {
                        if self.is_byte(i) {
                            self.display_as_byte(f, i, current_rom, current_vram)?
                        } else if self.is_short(i) {
                            self.display_as_short(f, i, current_rom, current_vram)?
                        } else {
                            self.display_as_word(f, i, current_rom, current_vram)?
                        }
                    }
                },
            };

            debug_assert!(advance > 0);
            i += advance;
        }

        self.settings.common.display_sym_end(f, config, self.metadata)?;
        self.settings
            .common
            .display_sym_post_alignment(f, self.metadata)?;

        Ok(())
    }
}
