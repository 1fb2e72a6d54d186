/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::collections::btree_set::BTreeSet;
use alloc::string::String;
use alloc::vec::Vec;

use rabbitizer::access_type::AccessType;

use crate::{
    addresses::{Rom, Size, SizedAddress, UserSize, Vram},
    config::Compiler,
    section_type::SectionType,
};

use super::{ParentSectionMetadata, RodataMigrationBehavior, SymbolType};

/// Who created a symbol.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum GeneratedBy {
    /// Declared by the user before the analysis started.
    UserDeclared,

    /// Discovered by the analysis itself.
    Autogenerated,
}

/// Everything known about a single address.
///
/// User-declared info always wins over what the analysis detects; both are
/// kept around so late passes can still tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolMetadata {
    generated_by: GeneratedBy,
    vram: Vram,
    rom: Option<Rom>,

    user_declared_name: Option<String>,
    user_declared_name_end: Option<String>,

    user_declared_type: Option<SymbolType>,
    autodetected_type: Option<SymbolType>,

    user_declared_size: Option<UserSize>,
    autodetected_size: Option<Size>,

    section_type: Option<SectionType>,

    /// Every (access type, unsigned) pair instructions used on this address.
    access_types: Vec<(AccessType, bool)>,

    reference_counter: usize,
    /// Functions referencing this symbol, by vram.
    reference_functions: BTreeSet<Vram>,
    /// Non-function symbols referencing this symbol, by vram.
    reference_symbols: BTreeSet<Vram>,

    visibility: Option<String>,

    is_defined: bool,
    /// Set when this symbol only exists to cover the tail of `pad_by` after
    /// its user-declared size ran out.
    autocreated_pad_by: Option<Vram>,

    allow_ref_with_addend: bool,
    can_be_referenced: bool,

    got_index: Option<usize>,
    is_gp_rel_accessed: bool,

    rodata_migration_behavior: RodataMigrationBehavior,
    /// The function this label or jumptable belongs to.
    parent_function: Option<Vram>,

    parent_metadata: Option<ParentSectionMetadata>,
    compiler: Option<Compiler>,
}

impl SymbolMetadata {
    pub(crate) fn new(generated_by: GeneratedBy, vram: Vram) -> Self {
        Self {
            generated_by,
            vram,
            rom: None,
            user_declared_name: None,
            user_declared_name_end: None,
            user_declared_type: None,
            autodetected_type: None,
            user_declared_size: None,
            autodetected_size: None,
            section_type: None,
            access_types: Vec::new(),
            reference_counter: 0,
            reference_functions: BTreeSet::new(),
            reference_symbols: BTreeSet::new(),
            visibility: None,
            is_defined: false,
            autocreated_pad_by: None,
            allow_ref_with_addend: true,
            can_be_referenced: true,
            got_index: None,
            is_gp_rel_accessed: false,
            rodata_migration_behavior: RodataMigrationBehavior::ByReferences,
            parent_function: None,
            parent_metadata: None,
            compiler: None,
        }
    }
}

impl SymbolMetadata {
    #[must_use]
    pub const fn generated_by(&self) -> GeneratedBy {
        self.generated_by
    }
    #[must_use]
    pub const fn is_user_declared(&self) -> bool {
        matches!(self.generated_by, GeneratedBy::UserDeclared)
    }

    #[must_use]
    pub const fn vram(&self) -> Vram {
        self.vram
    }
    #[must_use]
    pub const fn rom(&self) -> Option<Rom> {
        self.rom
    }
    pub(crate) fn rom_mut(&mut self) -> &mut Option<Rom> {
        &mut self.rom
    }

    #[must_use]
    pub fn user_declared_name(&self) -> Option<&str> {
        self.user_declared_name.as_deref()
    }
    pub fn set_user_declared_name(&mut self, name: String) {
        self.user_declared_name = Some(name);
    }
    #[must_use]
    pub fn user_declared_name_end(&self) -> Option<&str> {
        self.user_declared_name_end.as_deref()
    }
    pub fn set_user_declared_name_end(&mut self, name_end: String) {
        self.user_declared_name_end = Some(name_end);
    }

    #[must_use]
    pub const fn user_declared_type(&self) -> Option<SymbolType> {
        self.user_declared_type
    }
    #[must_use]
    pub const fn autodetected_type(&self) -> Option<SymbolType> {
        self.autodetected_type
    }
    /// The effective type: what the user said, else what was detected.
    #[must_use]
    pub const fn sym_type(&self) -> Option<SymbolType> {
        if self.user_declared_type.is_some() {
            self.user_declared_type
        } else {
            self.autodetected_type
        }
    }
    pub(crate) fn set_type(&mut self, sym_type: SymbolType, generated_by: GeneratedBy) {
        match generated_by {
            GeneratedBy::UserDeclared => self.user_declared_type = Some(sym_type),
            GeneratedBy::Autogenerated => self.autodetected_type = Some(sym_type),
        }
    }

    #[must_use]
    pub const fn user_declared_size(&self) -> Option<UserSize> {
        self.user_declared_size
    }
    pub fn set_user_declared_size(&mut self, size: UserSize) {
        self.user_declared_size = Some(size);
    }
    #[must_use]
    pub const fn autodetected_size(&self) -> Option<Size> {
        self.autodetected_size
    }
    pub(crate) fn set_autodetected_size(&mut self, size: Size) {
        self.autodetected_size = Some(size);
    }

    /// The known size, preferring the user-declared one.
    #[must_use]
    pub fn size(&self) -> Option<Size> {
        if let Some(size) = self.user_declared_size {
            Some(size.as_size())
        } else {
            self.autodetected_size
        }
    }

    /// Like [`SymbolMetadata::size`], but guesses from the type when nothing
    /// is known. Used for reference containment windows.
    #[must_use]
    pub fn size_or_default(&self) -> Size {
        self.size().unwrap_or_else(|| {
            match self.sym_type() {
                Some(SymbolType::DWord | SymbolType::Float64) => Size::new(8),
                Some(SymbolType::Short) => Size::new(2),
                Some(SymbolType::Byte) => Size::new(1),
                _ => Size::new(4),
            }
        })
    }

    #[must_use]
    pub const fn section_type(&self) -> Option<SectionType> {
        self.section_type
    }
    pub(crate) fn section_type_mut(&mut self) -> &mut Option<SectionType> {
        &mut self.section_type
    }

    #[must_use]
    pub fn all_access_types(&self) -> &[(AccessType, bool)] {
        &self.access_types
    }
    pub(crate) fn add_access_type(&mut self, access_type: AccessType, unsigned: bool) {
        if !self.access_types.contains(&(access_type, unsigned)) {
            self.access_types.push((access_type, unsigned));
        }
    }

    #[must_use]
    pub const fn reference_counter(&self) -> usize {
        self.reference_counter
    }
    #[must_use]
    pub const fn reference_functions(&self) -> &BTreeSet<Vram> {
        &self.reference_functions
    }
    #[must_use]
    pub const fn reference_symbols(&self) -> &BTreeSet<Vram> {
        &self.reference_symbols
    }
    pub(crate) fn add_reference_function(&mut self, function_vram: Vram) {
        self.reference_counter += 1;
        self.reference_functions.insert(function_vram);
    }
    pub(crate) fn add_reference_symbol(&mut self, symbol_vram: Vram) {
        self.reference_counter += 1;
        self.reference_symbols.insert(symbol_vram);
    }

    #[must_use]
    pub fn visibility(&self) -> Option<&str> {
        self.visibility.as_deref()
    }
    pub fn set_visibility(&mut self, visibility: String) {
        self.visibility = Some(visibility);
    }

    #[must_use]
    pub const fn is_defined(&self) -> bool {
        self.is_defined
    }
    pub(crate) fn set_defined(&mut self) {
        self.is_defined = true;
    }

    #[must_use]
    pub const fn autocreated_pad_by(&self) -> Option<Vram> {
        self.autocreated_pad_by
    }
    pub(crate) fn set_autocreated_pad_by(&mut self, pad_by: Vram) {
        self.autocreated_pad_by = Some(pad_by);
    }

    #[must_use]
    pub const fn allow_ref_with_addend(&self) -> bool {
        self.allow_ref_with_addend
    }
    pub fn set_allow_ref_with_addend(&mut self, value: bool) {
        self.allow_ref_with_addend = value;
    }
    #[must_use]
    pub const fn can_be_referenced(&self) -> bool {
        self.can_be_referenced
    }
    pub fn set_can_be_referenced(&mut self, value: bool) {
        self.can_be_referenced = value;
    }

    #[must_use]
    pub const fn got_index(&self) -> Option<usize> {
        self.got_index
    }
    pub(crate) fn set_got_index(&mut self, got_index: usize) {
        self.got_index = Some(got_index);
    }
    #[must_use]
    pub const fn is_gp_rel_accessed(&self) -> bool {
        self.is_gp_rel_accessed
    }
    pub(crate) fn set_gp_rel_accessed(&mut self) {
        self.is_gp_rel_accessed = true;
    }

    #[must_use]
    pub const fn rodata_migration_behavior(&self) -> &RodataMigrationBehavior {
        &self.rodata_migration_behavior
    }
    pub fn set_rodata_migration_behavior(&mut self, behavior: RodataMigrationBehavior) {
        self.rodata_migration_behavior = behavior;
    }

    #[must_use]
    pub const fn parent_function(&self) -> Option<Vram> {
        self.parent_function
    }
    pub(crate) fn set_parent_function(&mut self, function_vram: Vram) {
        self.parent_function = Some(function_vram);
    }

    #[must_use]
    pub const fn parent_metadata(&self) -> Option<&ParentSectionMetadata> {
        self.parent_metadata.as_ref()
    }
    pub(crate) fn set_parent_metadata(&mut self, parent_metadata: ParentSectionMetadata) {
        self.parent_metadata = Some(parent_metadata);
    }

    #[must_use]
    pub const fn compiler(&self) -> Option<Compiler> {
        self.compiler
    }
    pub(crate) fn set_compiler(&mut self, compiler: Option<Compiler>) {
        if compiler.is_some() {
            self.compiler = compiler;
        }
    }
}

impl SymbolMetadata {
    /// Whether branch-boundary logic should trust this address really is the
    /// start of a function.
    ///
    /// User-declared functions are always trusted. Autodetected ones are
    /// trusted once something actually calls them, which filters out
    /// unreached code after tail calls being mistaken for function starts.
    #[must_use]
    pub fn is_trustable_function(&self) -> bool {
        match self.sym_type() {
            Some(SymbolType::Function) => {
                self.is_user_declared() || self.reference_counter > 0 || self.is_defined
            }
            Some(_) => false,
            None => self.is_user_declared(),
        }
    }

    #[must_use]
    pub fn is_jumptable(&self) -> bool {
        self.sym_type() == Some(SymbolType::Jumptable)
    }

    /// Whether the migration pass may move this rodata symbol next to a
    /// function.
    #[must_use]
    pub fn is_migrable(&self) -> bool {
        match &self.rodata_migration_behavior {
            RodataMigrationBehavior::ForceMigrate => true,
            RodataMigrationBehavior::ForceNotMigrated => false,
            RodataMigrationBehavior::MigrateToSpecificFunction(_) => true,
            RodataMigrationBehavior::ByReferences => {
                // Only rodata referenced exclusively from functions can be
                // migrated without breaking other referencing symbols.
                if !self.reference_symbols.is_empty() {
                    return false;
                }
                match self.sym_type() {
                    Some(SymbolType::Jumptable | SymbolType::GccExceptTable) => true,
                    _ => self.section_type == Some(crate::section_type::SectionType::Rodata),
                }
            }
        }
    }
}

impl SizedAddress for SymbolMetadata {
    fn size(&self) -> Option<Size> {
        SymbolMetadata::size(self)
    }
}
