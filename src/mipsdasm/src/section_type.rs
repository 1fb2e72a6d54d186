/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum SectionType {
    Text = 1,
    Data,
    Rodata,
    Bss,
    GccExceptTable,
}

impl SectionType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(SectionType::Text),
            "data" => Some(SectionType::Data),
            "rodata" => Some(SectionType::Rodata),
            "bss" => Some(SectionType::Bss),
            "gcc_except_table" => Some(SectionType::GccExceptTable),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_section_name(&self) -> &'static str {
        match self {
            SectionType::Text => ".text",
            SectionType::Data => ".data",
            SectionType::Rodata => ".rodata",
            SectionType::Bss => ".bss",
            SectionType::GccExceptTable => ".gcc_except_table",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectionType::Text => write!(f, "Text"),
            SectionType::Data => write!(f, "Data"),
            SectionType::Rodata => write!(f, "Rodata"),
            SectionType::Bss => write!(f, "Bss"),
            SectionType::GccExceptTable => write!(f, "GccExceptTable"),
        }
    }
}
