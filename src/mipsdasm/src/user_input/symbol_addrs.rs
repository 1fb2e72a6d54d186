/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use alloc::vec::Vec;
use core::{error, fmt};

use crate::{
    addresses::{UserSize, Vram},
    metadata::SymbolType,
};

/// One parsed user symbol declaration.
///
/// Two input formats produce these:
///
/// - splat's `symbol_addrs.txt`: `name = 0xADDR; // type:T size:S`
/// - plain CSV: `name,vram[,size[,type]]`
///
/// Sizes of `0`, `-` or empty mean "unknown".
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UserSymbolDeclaration {
    pub name: String,
    pub vram: Vram,
    pub size: Option<UserSize>,
    pub sym_type: Option<SymbolType>,
}

impl UserSymbolDeclaration {
    /// Parse a whole `symbol_addrs.txt`-style buffer. Empty lines and pure
    /// comment lines are skipped.
    pub fn parse_symbol_addrs(input: &str) -> Result<Vec<Self>, SymbolAddrsParseError> {
        let mut declarations = Vec::new();

        for (line_number, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            declarations.push(Self::parse_symbol_addrs_line(line, line_number + 1)?);
        }

        Ok(declarations)
    }

    fn parse_symbol_addrs_line(
        line: &str,
        line_number: usize,
    ) -> Result<Self, SymbolAddrsParseError> {
        let err = |reason: &'static str| SymbolAddrsParseError {
            line_number,
            reason,
        };

        let (declaration, attributes) = match line.split_once("//") {
            Some((declaration, attributes)) => (declaration.trim(), attributes.trim()),
            None => (line, ""),
        };

        let declaration = declaration
            .strip_suffix(';')
            .ok_or(err("missing trailing `;`"))?
            .trim();
        let (name, value) = declaration
            .split_once('=')
            .ok_or(err("missing `=` between name and address"))?;

        let name = name.trim();
        if name.is_empty() {
            return Err(err("empty symbol name"));
        }

        let vram = parse_hex_or_dec(value.trim()).ok_or(err("invalid address"))?;

        let mut size = None;
        let mut sym_type = None;
        for attribute in attributes.split_whitespace() {
            if let Some(raw_size) = attribute.strip_prefix("size:") {
                size = parse_size(raw_size);
            } else if let Some(raw_type) = attribute.strip_prefix("type:") {
                sym_type = SymbolType::from_name(raw_type);
            }
            // Unknown attributes are other tools' business; skip them.
        }

        Ok(Self {
            name: name.into(),
            vram: Vram::new(vram),
            size,
            sym_type,
        })
    }

    /// Parse a `name,vram[,size[,type]]` CSV buffer.
    pub fn parse_csv(input: &str) -> Result<Vec<Self>, SymbolAddrsParseError> {
        let mut declarations = Vec::new();

        for (line_number, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |reason: &'static str| SymbolAddrsParseError {
                line_number: line_number + 1,
                reason,
            };

            let mut fields = line.split(',').map(str::trim);
            let name = fields.next().filter(|x| !x.is_empty()).ok_or(err("empty symbol name"))?;
            let vram = fields
                .next()
                .and_then(parse_hex_or_dec)
                .ok_or(err("invalid address"))?;
            let size = fields.next().and_then(parse_size);
            let sym_type = fields.next().and_then(SymbolType::from_name);

            declarations.push(Self {
                name: name.into(),
                vram: Vram::new(vram),
                size,
                sym_type,
            });
        }

        Ok(declarations)
    }
}

fn parse_hex_or_dec(value: &str) -> Option<u32> {
    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse().ok()
    }
}

fn parse_size(value: &str) -> Option<UserSize> {
    if value.is_empty() || value == "-" {
        return None;
    }
    UserSize::new_checked(parse_hex_or_dec(value)?)
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SymbolAddrsParseError {
    line_number: usize,
    reason: &'static str,
}

impl fmt::Display for SymbolAddrsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line_number, self.reason)
    }
}
impl error::Error for SymbolAddrsParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use core::num::NonZeroU32;

    #[test]
    fn parses_splat_style_lines() {
        let input = "\
osSendMesg = 0x80001234; // type:func size:0x40
D_80012340 = 0x80012340; // type:u32
// a comment line
gStr = 0x80054321; // type:asciz size:-
";
        let declarations = UserSymbolDeclaration::parse_symbol_addrs(input).unwrap();

        assert_eq!(declarations.len(), 3);
        assert_eq!(declarations[0].name, "osSendMesg");
        assert_eq!(declarations[0].vram, Vram::new(0x80001234));
        assert_eq!(
            declarations[0].size,
            Some(UserSize::new(NonZeroU32::new(0x40).unwrap()))
        );
        assert_eq!(declarations[0].sym_type, Some(SymbolType::Function));

        assert_eq!(declarations[1].sym_type, Some(SymbolType::Word));
        assert_eq!(declarations[1].size, None);

        assert_eq!(declarations[2].sym_type, Some(SymbolType::CString));
        assert_eq!(declarations[2].size, None);
    }

    #[test]
    fn zero_sizes_mean_unknown() {
        let input = "sym = 0x80000000; // size:0\n";
        let declarations = UserSymbolDeclaration::parse_symbol_addrs(input).unwrap();
        assert_eq!(declarations[0].size, None);
    }

    #[test]
    fn rejects_missing_semicolon() {
        assert!(UserSymbolDeclaration::parse_symbol_addrs("sym = 0x80000000\n").is_err());
    }

    #[test]
    fn parses_csv_rows() {
        let input = "entrypoint,0x80000400,0x100,func\nD_800,0x80001000,,\n";
        let declarations = UserSymbolDeclaration::parse_csv(input).unwrap();

        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[0].sym_type, Some(SymbolType::Function));
        assert_eq!(declarations[1].size, None);
        assert_eq!(declarations[1].sym_type, None);
    }
}
