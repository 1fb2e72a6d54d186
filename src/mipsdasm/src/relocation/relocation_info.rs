/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use core::fmt;

use crate::{
    addresses::Vram,
    collections::addended_ordered_map::FindSettings,
    config::Compiler,
    context::Context,
    metadata::SymbolMetadata,
    parent_segment_info::ParentSegmentInfo,
};

use super::{RelocReferencedSym, RelocationType};

/// A relocation the analysis (or the user) attached to a single word of the
/// image.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RelocationInfo {
    reloc_type: RelocationType,
    referenced_sym: RelocReferencedSym,
}

impl RelocationInfo {
    #[must_use]
    pub(crate) fn new(reloc_type: RelocationType, referenced_sym: RelocReferencedSym) -> Self {
        Self {
            reloc_type,
            referenced_sym,
        }
    }

    #[must_use]
    pub const fn reloc_type(&self) -> RelocationType {
        self.reloc_type
    }

    #[must_use]
    pub const fn referenced_sym(&self) -> &RelocReferencedSym {
        &self.referenced_sym
    }

    #[must_use]
    pub(crate) fn display<'ctx, 'rel, 'prnt>(
        &'rel self,
        context: &'ctx Context,
        segment_info: &'prnt ParentSegmentInfo,
        find_settings: FindSettings,
        compiler: Option<Compiler>,
        migrate: bool,
        gp_rel_hack: bool,
    ) -> Option<RelocationInfoDisplay<'ctx, 'rel, 'prnt>> {
        RelocationInfoDisplay::new(
            context,
            self,
            segment_info,
            find_settings,
            compiler,
            migrate,
            gp_rel_hack,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum RelocSymState<'name, 'meta> {
    LiteralSymName(&'name str, i32),
    Sym(Vram, &'meta SymbolMetadata),
    // Both kept distinct instead of a plain `None` since naming which lookup
    // failed makes the emitted comment actually actionable.
    SymbolNotFound(Vram),
    SegmentNotFound(Vram),
}

/// `fmt::Display` view of a [`RelocationInfo`], with the referenced symbol
/// already resolved through the context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelocationInfoDisplay<'ctx, 'rel, 'prnt> {
    context: &'ctx Context,
    rel: &'rel RelocationInfo,
    reloc_sym_state: RelocSymState<'rel, 'ctx>,
    compiler: Option<Compiler>,
    migrate: bool,
    gp_rel_hack: bool,

    _segment_info: core::marker::PhantomData<&'prnt ParentSegmentInfo>,
}

impl<'ctx, 'rel, 'prnt> RelocationInfoDisplay<'ctx, 'rel, 'prnt> {
    pub(crate) fn new(
        context: &'ctx Context,
        rel: &'rel RelocationInfo,
        segment_info: &'prnt ParentSegmentInfo,
        find_settings: FindSettings,
        compiler: Option<Compiler>,
        migrate: bool,
        gp_rel_hack: bool,
    ) -> Option<Self> {
        let reloc_sym_state = match &rel.referenced_sym {
            RelocReferencedSym::SymName(name, addend) => {
                RelocSymState::LiteralSymName(name, *addend)
            }
            RelocReferencedSym::Address(vram) => {
                if let Some(referenced_segment) =
                    context.find_referenced_segment(*vram, segment_info)
                {
                    if let Some(sym_metadata) =
                        referenced_segment.find_symbol(*vram, find_settings)
                    {
                        RelocSymState::Sym(*vram, sym_metadata)
                    } else {
                        RelocSymState::SymbolNotFound(*vram)
                    }
                } else {
                    RelocSymState::SegmentNotFound(*vram)
                }
            }
        };

        Some(Self {
            context,
            rel,
            reloc_sym_state,
            compiler,
            migrate,
            gp_rel_hack,
            _segment_info: core::marker::PhantomData,
        })
    }
}

impl RelocationInfoDisplay<'_, '_, '_> {
    fn display_addend(&self, f: &mut fmt::Formatter<'_>, addend: i32) -> fmt::Result {
        if addend == 0 {
            return Ok(());
        }

        // Old assemblers reject `%lo` addends outside the signed 16-bit
        // band, so migrated functions get the masked compensation form.
        if self
            .compiler
            .is_some_and(|x| x.big_addend_workaround_for_migrated_functions())
            && self.migrate
            && self.rel.reloc_type == RelocationType::R_MIPS_LO16
        {
            if addend < -0x8000 {
                return write!(f, " - (0x{:X} & 0xFFFF)", -addend);
            }
            if addend > 0x7FFF {
                return write!(f, " + (0x{:X} & 0xFFFF)", addend);
            }
        }

        if addend < 0 {
            write!(f, " - 0x{:X}", -addend)
        } else {
            write!(f, " + 0x{:X}", addend)
        }
    }

    fn hacked_gp_rel(&self) -> bool {
        self.gp_rel_hack && self.rel.reloc_type == RelocationType::R_MIPS_GPREL16
    }
}

impl fmt::Display for RelocationInfoDisplay<'_, '_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plain = self.hacked_gp_rel();

        if !plain {
            write!(f, "{}", self.rel.reloc_type.operator())?;
            if self.rel.reloc_type.uses_parenthesis() {
                write!(f, "(")?;
            }
        }

        let naming = self.context.global_config().naming();
        let addend = match &self.reloc_sym_state {
            RelocSymState::LiteralSymName(name, addend) => {
                write!(f, "{}", name)?;
                *addend
            }
            RelocSymState::Sym(vram, sym_metadata) => {
                write!(f, "{}", sym_metadata.display_name(naming))?;
                (*vram - sym_metadata.vram()).inner()
            }
            RelocSymState::SymbolNotFound(vram) => {
                write!(
                    f,
                    "/* ERROR: symbol for address 0x{:08X} not found */",
                    vram.inner()
                )?;
                0
            }
            RelocSymState::SegmentNotFound(vram) => {
                write!(
                    f,
                    "/* ERROR: segment for address 0x{:08X} not found */",
                    vram.inner()
                )?;
                0
            }
        };

        self.display_addend(f, addend)?;

        if !plain {
            write!(f, "{}", self.rel.reloc_type.closing_operator())?;
            if self.rel.reloc_type.uses_parenthesis() {
                write!(f, ")")?;
            }
        }

        Ok(())
    }
}
