/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use crate::{config::SymbolNamingSettings, section_type::SectionType};

use super::{SymbolMetadata, SymbolType};

/// Lazy `Display` for a symbol's name.
///
/// User-declared names are printed as-is (quoted if they carry characters
/// the assembler would trip on). Everything else gets the deterministic
/// `<prefix><zero-padded hex vram><suffix>` autogenerated form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymbolNameDisplay<'sym, 'cfg> {
    metadata: &'sym SymbolMetadata,
    naming: &'cfg SymbolNamingSettings,
}

impl<'sym, 'cfg> SymbolNameDisplay<'sym, 'cfg> {
    pub(crate) const fn new(
        metadata: &'sym SymbolMetadata,
        naming: &'cfg SymbolNamingSettings,
    ) -> Self {
        Self { metadata, naming }
    }
}

impl SymbolMetadata {
    #[must_use]
    pub fn display_name<'sym, 'cfg>(
        &'sym self,
        naming: &'cfg SymbolNamingSettings,
    ) -> SymbolNameDisplay<'sym, 'cfg> {
        SymbolNameDisplay::new(self, naming)
    }
}

// Characters the assembler only accepts on a quoted symbol name.
fn needs_quoting(name: &str) -> bool {
    name.contains(['@', '<', '\\', '-', '+'])
}

impl SymbolNameDisplay<'_, '_> {
    fn prefix(&self) -> &'static str {
        match self.metadata.sym_type() {
            Some(SymbolType::Function) => "func_",
            Some(SymbolType::Jumptable) => "jtbl_",
            Some(SymbolType::JumptableLabel | SymbolType::BranchLabel) => ".L",
            Some(SymbolType::GccExceptTable) => "ehtbl_",
            Some(SymbolType::GccExceptTableLabel) => "$LEH_",
            Some(SymbolType::CString | SymbolType::PascalString)
                if self.naming.name_vars_by_type() =>
            {
                "STR_"
            }
            Some(SymbolType::Float32) if self.naming.name_vars_by_type() => "FLT_",
            Some(SymbolType::Float64) if self.naming.name_vars_by_type() => "DBL_",
            _ => self.section_prefix(),
        }
    }

    fn section_prefix(&self) -> &'static str {
        if self.naming.name_vars_by_section() {
            match self.metadata.section_type() {
                Some(SectionType::Rodata) => "RO_",
                Some(SectionType::Bss) => "B_",
                _ => "D_",
            }
        } else {
            "D_"
        }
    }
}

impl fmt::Display for SymbolNameDisplay<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = self.metadata.user_declared_name() {
            return if needs_quoting(name) {
                write!(f, "\"{}\"", name)
            } else {
                write!(f, "{}", name)
            };
        }

        write!(f, "{}", self.prefix())?;

        if self.naming.name_vars_by_file() {
            if let Some(parent) = self.metadata.parent_metadata() {
                write!(f, "{}_", parent.name())?;
            }
        }

        if self.naming.legacy_zero_padding() {
            write!(f, "{:06X}", self.metadata.vram().inner())?;
        } else {
            write!(f, "{:08X}", self.metadata.vram().inner())?;
        }

        if let Some(suffix) = self.naming.custom_suffix() {
            write!(f, "{}", suffix)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use crate::{
        addresses::Vram,
        metadata::{GeneratedBy, SymbolMetadata, SymbolType},
    };

    use super::*;

    fn autogenerated(vram: u32, sym_type: Option<SymbolType>) -> SymbolMetadata {
        let mut sym = SymbolMetadata::new(GeneratedBy::Autogenerated, Vram::new(vram));
        if let Some(t) = sym_type {
            sym.set_type(t, GeneratedBy::Autogenerated);
        }
        sym
    }

    #[test]
    fn autogenerated_prefixes() {
        let naming = SymbolNamingSettings::new();

        let func = autogenerated(0x80001234, Some(SymbolType::Function));
        assert_eq!(func.display_name(&naming).to_string(), "func_80001234");

        let jtbl = autogenerated(0x80001234, Some(SymbolType::Jumptable));
        assert_eq!(jtbl.display_name(&naming).to_string(), "jtbl_80001234");

        let label = autogenerated(0x80001234, Some(SymbolType::BranchLabel));
        assert_eq!(label.display_name(&naming).to_string(), ".L80001234");

        let plain = autogenerated(0x80001234, None);
        assert_eq!(plain.display_name(&naming).to_string(), "D_80001234");
    }

    #[test]
    fn legacy_padding_and_suffix() {
        let mut naming = SymbolNamingSettings::new();
        naming.set_legacy_zero_padding(true);
        naming.set_custom_suffix(Some("_us".to_string()));

        let sym = autogenerated(0x801234, Some(SymbolType::Function));
        assert_eq!(sym.display_name(&naming).to_string(), "func_801234_us");
    }

    #[test]
    fn user_names_with_special_characters_get_quoted() {
        let naming = SymbolNamingSettings::new();

        let mut sym = SymbolMetadata::new(GeneratedBy::UserDeclared, Vram::new(0x80000000));
        sym.set_user_declared_name("sym@plt".to_string());
        assert_eq!(sym.display_name(&naming).to_string(), "\"sym@plt\"");

        let mut plain = SymbolMetadata::new(GeneratedBy::UserDeclared, Vram::new(0x80000000));
        plain.set_user_declared_name("osSendMesg".to_string());
        assert_eq!(plain.display_name(&naming).to_string(), "osSendMesg");
    }
}
