/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use rabbitizer::access_type::AccessType;

use crate::{
    addresses::Vram, config::Compiler, metadata::SymbolMetadata, metadata::SymbolType,
    str_decoding::Encoding,
};

/// How aggressively data bytes get classified as C strings.
///
/// Regardless of the level, a candidate must start on a properly aligned
/// address, be `'\0'`-terminated and be padded with `'\0'`s up to the next
/// word boundary. There is no way around those; the levels only relax which
/// symbols are considered at all.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum StringGuesserLevel {
    /// Never guess.
    No,

    /// Only symbols with no type info whatsoever (user or detected), that
    /// are referenced exactly once, and decode to a non-empty string.
    Conservative,

    /// Drop the referenced-exactly-once requirement. Compilers deduplicate
    /// identical strings, which produces multi-referenced ones.
    MultipleReferences,

    /// Allow empty strings. Likely to yield false positives.
    EmptyStrings,

    /// Allow guessing over autodetected (but never user-declared) type
    /// info.
    IgnoreDetectedType,
}

impl StringGuesserLevel {
    pub const fn default() -> Self {
        StringGuesserLevel::MultipleReferences
    }

    #[must_use]
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => StringGuesserLevel::No,
            1 => StringGuesserLevel::Conservative,
            2 => StringGuesserLevel::MultipleReferences,
            3 => StringGuesserLevel::EmptyStrings,
            _ => StringGuesserLevel::IgnoreDetectedType,
        }
    }

    /// Decide if the bytes at `vram` are a string, returning its size
    /// (terminator and padding included) when they are.
    pub(crate) fn guess(
        &self,
        reference: Option<&SymbolMetadata>,
        vram: Vram,
        bytes: &[u8],
        encoding: Encoding,
        compiler: Option<Compiler>,
        reached_late_rodata: bool,
    ) -> Option<usize> {
        if let Some(reference) = reference {
            if reference.user_declared_type() == Some(SymbolType::CString) {
                // The user says it is a string, so it is, terminator or not.
                let size = if let Some(size) = reference.user_declared_size() {
                    size.inner().get() as usize
                } else {
                    bytes.iter().position(|x| *x == 0)? + 1
                };
                return Some(size);
            }
            if reference.user_declared_type().is_some() {
                return None;
            }
        }

        if *self <= StringGuesserLevel::No {
            return None;
        }

        if reached_late_rodata {
            // Late rodata only holds floats, doubles and jumptables.
            return None;
        }

        let expected_alignment = {
            let shift = compiler
                .and_then(|x| x.prev_align_for_type(SymbolType::CString))
                .unwrap_or(2);
            1u32 << shift
        };
        if vram.inner() % expected_alignment != 0 {
            return None;
        }

        if *self < StringGuesserLevel::MultipleReferences
            && reference.is_some_and(|x| x.reference_counter() > 1)
        {
            return None;
        }

        if *self < StringGuesserLevel::EmptyStrings && bytes.first() == Some(&b'\0') {
            return None;
        }

        if *self < StringGuesserLevel::IgnoreDetectedType {
            if reference.is_some_and(|x| {
                x.autodetected_type()
                    .is_some_and(|t| t != SymbolType::CString)
            }) {
                return None;
            }
            // A dereferenced address is data, not text. Left/right unaligned
            // accesses are fine: that's how strings get copied to the stack.
            if reference.is_some_and(|x| {
                x.all_access_types().iter().any(|(t, _)| {
                    !matches!(
                        t,
                        AccessType::UNALIGNED_WORD_LEFT
                            | AccessType::UNALIGNED_WORD_RIGHT
                            | AccessType::UNALIGNED_DOUBLEWORD_LEFT
                            | AccessType::UNALIGNED_DOUBLEWORD_RIGHT
                    )
                })
            }) {
                return None;
            }
        }

        encoding.check_valid(bytes).ok()
    }
}

impl Default for StringGuesserLevel {
    fn default() -> Self {
        Self::default()
    }
}

/// [`StringGuesserLevel`], but for Pascal strings (leading length byte, no
/// terminator). Same level semantics.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[non_exhaustive]
pub enum PascalStringGuesserLevel {
    No,
    Conservative,
    MultipleReferences,
    EmptyStrings,
    IgnoreDetectedType,
}

impl PascalStringGuesserLevel {
    pub const fn default() -> Self {
        PascalStringGuesserLevel::No
    }

    #[must_use]
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => PascalStringGuesserLevel::No,
            1 => PascalStringGuesserLevel::Conservative,
            2 => PascalStringGuesserLevel::MultipleReferences,
            3 => PascalStringGuesserLevel::EmptyStrings,
            _ => PascalStringGuesserLevel::IgnoreDetectedType,
        }
    }

    pub(crate) fn guess(
        &self,
        reference: Option<&SymbolMetadata>,
        vram: Vram,
        bytes: &[u8],
        encoding: Encoding,
        reached_late_rodata: bool,
    ) -> Option<usize> {
        if let Some(reference) = reference {
            if reference.user_declared_type() == Some(SymbolType::PascalString) {
                let size = if let Some(size) = reference.user_declared_size() {
                    size.inner().get() as usize
                } else {
                    encoding.check_valid_pascal(bytes).ok()?
                };
                return Some(size);
            }
            if reference.user_declared_type().is_some() {
                return None;
            }
        }

        if *self <= PascalStringGuesserLevel::No || reached_late_rodata {
            return None;
        }

        if vram.inner() % 4 != 0 {
            return None;
        }

        if *self < PascalStringGuesserLevel::MultipleReferences
            && reference.is_some_and(|x| x.reference_counter() > 1)
        {
            return None;
        }

        if *self < PascalStringGuesserLevel::EmptyStrings && bytes.first() == Some(&0) {
            return None;
        }

        if *self < PascalStringGuesserLevel::IgnoreDetectedType
            && reference.is_some_and(|x| x.autodetected_type().is_some())
        {
            return None;
        }

        encoding.check_valid_pascal(bytes).ok()
    }
}

impl Default for PascalStringGuesserLevel {
    fn default() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::GeneratedBy;

    #[test]
    fn guess_string_ending_in_word_of_zeroes() {
        static BYTES: [u8; 16] = [
            0x6E, 0x6F, 0x74, 0x20, 0x61, 0x20, 0x67, 0x61, 0x6D, 0x65, 0x2E, 0x00, 0x00, 0x00,
            0x00, 0x00,
        ];
        let guesser = StringGuesserLevel::MultipleReferences;

        let maybe_size = guesser.guess(
            None,
            Vram::new(0x80000000),
            &BYTES,
            Encoding::Ascii,
            None,
            false,
        );

        assert_eq!(maybe_size, Some(12));
    }

    #[test]
    fn multiref_string_needs_level_two() {
        static BYTES: [u8; 8] = *b"Hello\0\0\0";
        let vram = Vram::new(0x80000000);

        let mut reference = SymbolMetadata::new(GeneratedBy::Autogenerated, vram);
        reference.add_reference_function(Vram::new(0x80000100));
        reference.add_reference_function(Vram::new(0x80000200));

        let conservative = StringGuesserLevel::Conservative.guess(
            Some(&reference),
            vram,
            &BYTES,
            Encoding::Ascii,
            None,
            false,
        );
        assert_eq!(conservative, None);

        let multiref = StringGuesserLevel::MultipleReferences.guess(
            Some(&reference),
            vram,
            &BYTES,
            Encoding::Ascii,
            None,
            false,
        );
        assert_eq!(multiref, Some(6));
    }

    #[test]
    fn empty_string_needs_level_three() {
        static BYTES: [u8; 4] = [0, 0, 0, 0];
        let vram = Vram::new(0x80000000);

        assert_eq!(
            StringGuesserLevel::MultipleReferences.guess(
                None,
                vram,
                &BYTES,
                Encoding::Ascii,
                None,
                false
            ),
            None
        );
        assert_eq!(
            StringGuesserLevel::EmptyStrings.guess(
                None,
                vram,
                &BYTES,
                Encoding::Ascii,
                None,
                false
            ),
            Some(1)
        );
    }

    #[test]
    fn guesses_are_monotonic_across_levels() {
        // Candidates crafted to be accepted starting at different levels.
        let vram = Vram::new(0x80000000);
        let plain: &[u8] = b"ok\0\0";
        let empty: &[u8] = &[0, 0, 0, 0];

        let levels = [
            StringGuesserLevel::No,
            StringGuesserLevel::Conservative,
            StringGuesserLevel::MultipleReferences,
            StringGuesserLevel::EmptyStrings,
            StringGuesserLevel::IgnoreDetectedType,
        ];

        for candidate in [plain, empty] {
            let mut accepted_before = false;
            for level in levels {
                let accepted = level
                    .guess(None, vram, candidate, Encoding::Ascii, None, false)
                    .is_some();
                assert!(
                    accepted || !accepted_before,
                    "level {:?} rejected a candidate a lower level accepted",
                    level
                );
                accepted_before |= accepted;
            }
        }
    }
}
