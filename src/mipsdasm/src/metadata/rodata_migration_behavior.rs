/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;

/// Overrides for the rodata-to-function migration logic.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum RodataMigrationBehavior {
    /// Decide by the usual reference-based rules.
    #[default]
    ByReferences,

    /// Force migration onto the function with this name, and only onto it.
    MigrateToSpecificFunction(String),

    /// Never migrate this symbol.
    ForceNotMigrated,

    /// Migrate even if the reference rules would reject it.
    ForceMigrate,
}
