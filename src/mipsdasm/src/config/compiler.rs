/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::{metadata::SymbolType, str_decoding::Encoding};

/// The compiler that produced the code being analyzed.
///
/// Each variant bundles the quirks the analyzer and the emitter must honor
/// to reproduce that compiler's output byte-for-byte.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum Compiler {
    // N64
    IDO,
    KMC,
    SN64,

    // iQue
    EGCS,

    // PS1
    PSYQ,

    // PS2
    MWCCPS2,
    EEGCC,

    // PSP
    PSPSNC,
}

impl Compiler {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "IDO" => Some(Compiler::IDO),
            "KMC" => Some(Compiler::KMC),
            "SN64" => Some(Compiler::SN64),
            "EGCS" => Some(Compiler::EGCS),
            "PSYQ" => Some(Compiler::PSYQ),
            "MWCCPS2" => Some(Compiler::MWCCPS2),
            "EEGCC" => Some(Compiler::EEGCC),
            "PSPSNC" => Some(Compiler::PSPSNC),
            _ => None,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Compiler::IDO => "IDO",
            Compiler::KMC => "KMC",
            Compiler::SN64 => "SN64",
            Compiler::EGCS => "EGCS",
            Compiler::PSYQ => "PSYQ",
            Compiler::MWCCPS2 => "MWCCPS2",
            Compiler::EEGCC => "EEGCC",
            Compiler::PSPSNC => "PSPSNC",
        }
    }
}

impl Compiler {
    /// IDO emits doubles and jumptables on its own `.late_rodata` chunk at
    /// the end of each object's rodata.
    pub(crate) const fn has_late_rodata(&self) -> bool {
        matches!(self, Compiler::IDO)
    }

    /// IDO does not pair multiple `%hi`s to the same `%lo`.
    pub(crate) const fn pair_multiple_hi_to_same_low(&self) -> bool {
        !matches!(self, Compiler::IDO)
    }

    /// Whether a rodata symbol referenced by multiple functions may still be
    /// migrated to the first of them.
    pub(crate) const fn allow_rdata_migration(&self) -> bool {
        matches!(self, Compiler::SN64 | Compiler::PSYQ)
    }

    /// Old assemblers choke on `%lo` addends outside the signed 16-bit
    /// range, so migrated functions need the `(x & 0xFFFF)` compensation on
    /// every toolchain that still routes individual functions through the
    /// compiler's own assembler. Modern GAS handles big addends fine, which
    /// is what unmigrated files are assembled with either way.
    pub(crate) const fn big_addend_workaround_for_migrated_functions(&self) -> bool {
        !matches!(self, Compiler::IDO)
    }

    /// Default string encoding of `.rodata` for this compiler's usual
    /// projects.
    pub(crate) const fn default_rodata_encoding(&self) -> Encoding {
        match self {
            Compiler::IDO => Encoding::EucJp,
            _ => Encoding::Ascii,
        }
    }

    const fn prev_align_function(&self) -> Option<u8> {
        match self {
            Compiler::EEGCC => Some(3),
            _ => None,
        }
    }
    const fn prev_align_jumptable(&self) -> Option<u8> {
        match self {
            Compiler::KMC => Some(3),
            Compiler::SN64 => Some(3),
            Compiler::EGCS => Some(3),
            Compiler::PSYQ => Some(3),
            Compiler::MWCCPS2 => Some(4),
            Compiler::EEGCC => Some(3),
            _ => None,
        }
    }
    const fn prev_align_float64(&self) -> Option<u8> {
        match self {
            Compiler::SN64 => Some(3),
            Compiler::PSYQ => Some(3),
            _ => None,
        }
    }
    const fn prev_align_c_string(&self) -> Option<u8> {
        match self {
            Compiler::EEGCC => Some(3),
            _ => Some(2),
        }
    }

    /// Alignment directive (as a shift amount) to emit right before a symbol
    /// of the given type, if any.
    pub(crate) const fn prev_align_for_type(&self, sym_type: SymbolType) -> Option<u8> {
        match sym_type {
            SymbolType::Function => self.prev_align_function(),
            SymbolType::Jumptable => self.prev_align_jumptable(),
            SymbolType::Float64 => self.prev_align_float64(),
            SymbolType::CString | SymbolType::PascalString => self.prev_align_c_string(),
            SymbolType::GccExceptTable
            | SymbolType::BranchLabel
            | SymbolType::JumptableLabel
            | SymbolType::GccExceptTableLabel
            | SymbolType::Byte
            | SymbolType::Short
            | SymbolType::Word
            | SymbolType::DWord
            | SymbolType::Float32
            | SymbolType::UserCustom => None,
        }
    }

    /// Alignment directive (as a shift amount) to emit right after a symbol
    /// of the given type, if any.
    pub(crate) const fn post_align_for_type(&self, sym_type: SymbolType) -> Option<u8> {
        match sym_type {
            SymbolType::CString | SymbolType::PascalString => Some(2),
            _ => None,
        }
    }
}
