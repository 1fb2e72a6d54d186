/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;
use alloc::vec::Vec;
use core::{error, fmt};

use crate::addresses::{Rom, Vram};

/// The section kind column of a split table.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum SplitEntryType {
    Text,
    Data,
    Rodata,
    Bss,
    Reloc,
    /// A placeholder row; carries an offset so the previous section's end
    /// is known, but produces no output.
    Dummy,
}

impl SplitEntryType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" | ".text" => Some(SplitEntryType::Text),
            "data" | ".data" => Some(SplitEntryType::Data),
            "rodata" | ".rodata" => Some(SplitEntryType::Rodata),
            "bss" | ".bss" => Some(SplitEntryType::Bss),
            "reloc" => Some(SplitEntryType::Reloc),
            "dummy" => Some(SplitEntryType::Dummy),
            _ => None,
        }
    }
}

/// One row of a `offset,vram,type,name` split table.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitEntry {
    pub rom: Rom,
    pub vram: Vram,
    pub entry_type: SplitEntryType,
    pub name: String,
}

impl SplitEntry {
    /// Parse a whole split table. Empty lines and `#` comments are skipped.
    pub fn parse_csv(input: &str) -> Result<Vec<Self>, SplitsParseError> {
        let mut entries = Vec::new();

        for (line_number, line) in input.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |reason: &'static str| SplitsParseError {
                line_number: line_number + 1,
                reason,
            };

            let mut fields = line.split(',').map(str::trim);
            let rom = fields
                .next()
                .and_then(parse_hex)
                .ok_or(err("invalid offset"))?;
            let vram = fields
                .next()
                .and_then(parse_hex)
                .ok_or(err("invalid vram"))?;
            let entry_type = fields
                .next()
                .and_then(SplitEntryType::from_name)
                .ok_or(err("unknown section type"))?;
            let name = fields.next().ok_or(err("missing name"))?;

            entries.push(SplitEntry {
                rom: Rom::new(rom),
                vram: Vram::new(vram),
                entry_type,
                name: name.into(),
            });
        }

        Ok(entries)
    }
}

fn parse_hex(value: &str) -> Option<u32> {
    let value = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(value, 16).ok()
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitsParseError {
    line_number: usize,
    reason: &'static str,
}

impl fmt::Display for SplitsParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line_number, self.reason)
    }
}
impl error::Error for SplitsParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_split_table() {
        let input = "\
# offset,vram,type,name
001050,80000400,text,boot
021F50,80021300,data,boot
024000,800233B0,bss,boot
028000,0,dummy,end
";
        let entries = SplitEntry::parse_csv(input).unwrap();

        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].rom, Rom::new(0x1050));
        assert_eq!(entries[0].vram, Vram::new(0x80000400));
        assert_eq!(entries[0].entry_type, SplitEntryType::Text);
        assert_eq!(entries[0].name, "boot");
        assert_eq!(entries[3].entry_type, SplitEntryType::Dummy);
    }

    #[test]
    fn rejects_unknown_section_kinds() {
        assert!(SplitEntry::parse_csv("0,0,vutext,vu0\n").is_err());
    }
}
