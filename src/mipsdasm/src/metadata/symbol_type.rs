/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::access_type::AccessType;

use crate::config::Compiler;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SymbolType {
    Function,
    BranchLabel,
    Jumptable,
    JumptableLabel,
    GccExceptTable,
    GccExceptTableLabel,

    Byte,
    Short,
    Word,
    DWord,

    Float32,
    Float64,
    CString,
    PascalString,

    UserCustom,
}

impl SymbolType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "func" => Some(SymbolType::Function),
            "branchlabel" => Some(SymbolType::BranchLabel),
            "jtbl" => Some(SymbolType::Jumptable),
            "jtbl_label" => Some(SymbolType::JumptableLabel),
            "@gccexcepttable" => Some(SymbolType::GccExceptTable),
            "@gccexcepttablelabel" => Some(SymbolType::GccExceptTableLabel),
            "u8" | "s8" => Some(SymbolType::Byte),
            "u16" | "s16" => Some(SymbolType::Short),
            "u32" | "s32" => Some(SymbolType::Word),
            "u64" | "s64" => Some(SymbolType::DWord),
            "f32" | "Vec3f" => Some(SymbolType::Float32),
            "f64" => Some(SymbolType::Float64),
            "char" | "asciz" => Some(SymbolType::CString),
            "pascal_str" => Some(SymbolType::PascalString),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_label(&self) -> bool {
        matches!(
            self,
            SymbolType::BranchLabel | SymbolType::JumptableLabel | SymbolType::GccExceptTableLabel
        )
    }

    #[must_use]
    pub const fn is_table(&self) -> bool {
        matches!(self, SymbolType::Jumptable | SymbolType::GccExceptTable)
    }

    #[must_use]
    pub const fn valid_branch_target(&self) -> bool {
        matches!(
            self,
            SymbolType::Function
                | SymbolType::BranchLabel
                | SymbolType::JumptableLabel
                | SymbolType::GccExceptTableLabel
        )
    }

    /// Whether a symbol of this type may contain pointers worth chasing
    /// during data analysis.
    #[must_use]
    pub const fn can_reference_symbols(&self) -> bool {
        match self {
            SymbolType::Jumptable | SymbolType::GccExceptTable => true,
            SymbolType::Word | SymbolType::UserCustom => true,
            SymbolType::Function
            | SymbolType::BranchLabel
            | SymbolType::JumptableLabel
            | SymbolType::GccExceptTableLabel => false,
            SymbolType::Byte | SymbolType::Short | SymbolType::DWord => false,
            SymbolType::Float32 | SymbolType::Float64 => false,
            SymbolType::CString | SymbolType::PascalString => false,
        }
    }

    /// Whether finding this type on rodata hints the IDO `.late_rodata`
    /// chunk may have started.
    #[must_use]
    pub fn is_late_rodata(&self, compiler: Option<Compiler>) -> bool {
        compiler.is_some_and(|x| x.has_late_rodata())
            && matches!(
                self,
                SymbolType::Jumptable | SymbolType::Float32 | SymbolType::Float64
            )
    }

    /// The type implied by a memory access of the given width/signedness.
    #[must_use]
    pub fn from_access_type(access_type: AccessType, unsigned_memory_access: bool) -> Option<Self> {
        // Unaligned accesses (lwl/lwr and friends) get realigned before the
        // symbol is created, so they map like their aligned counterparts.
        match access_type {
            AccessType::BYTE => Some(SymbolType::Byte),
            AccessType::SHORT => Some(SymbolType::Short),
            AccessType::WORD | AccessType::UNALIGNED_WORD_LEFT | AccessType::UNALIGNED_WORD_RIGHT => {
                Some(SymbolType::Word)
            }
            AccessType::DOUBLEWORD | AccessType::UNALIGNED_DOUBLEWORD_LEFT | AccessType::UNALIGNED_DOUBLEWORD_RIGHT => {
                Some(SymbolType::DWord)
            }
            AccessType::FLOAT => Some(SymbolType::Float32),
            AccessType::DOUBLEFLOAT => Some(SymbolType::Float64),
            _ => {
                let _ = unsigned_memory_access;
                None
            }
        }
    }

    /// Minimum alignment (in bytes) data of this type requires.
    #[must_use]
    pub const fn min_alignment(&self) -> u32 {
        match self {
            SymbolType::Byte => 1,
            SymbolType::Short => 2,
            SymbolType::DWord | SymbolType::Float64 => 8,
            _ => 4,
        }
    }
}
