/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;

use super::{Endian, GpConfig, MacroLabels, PanicPolicy};

/// How autogenerated symbol names are built.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct SymbolNamingSettings {
    name_vars_by_type: bool,
    name_vars_by_section: bool,
    name_vars_by_file: bool,
    legacy_zero_padding: bool,
    sequential_label_names: bool,
    custom_suffix: Option<String>,
}

impl SymbolNamingSettings {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name_vars_by_type: true,
            name_vars_by_section: true,
            name_vars_by_file: false,
            legacy_zero_padding: false,
            sequential_label_names: false,
            custom_suffix: None,
        }
    }

    /// `STR_`/`FLT_`/`DBL_` prefixes instead of the plain section prefix.
    #[must_use]
    pub const fn name_vars_by_type(&self) -> bool {
        self.name_vars_by_type
    }
    /// `RO_`/`B_` prefixes for rodata/bss instead of `D_`.
    #[must_use]
    pub const fn name_vars_by_section(&self) -> bool {
        self.name_vars_by_section
    }
    /// Include the section file name on autogenerated names.
    #[must_use]
    pub const fn name_vars_by_file(&self) -> bool {
        self.name_vars_by_file
    }
    /// Pad addresses to 6 hex digits instead of 8, like ancient versions of
    /// this tool did.
    #[must_use]
    pub const fn legacy_zero_padding(&self) -> bool {
        self.legacy_zero_padding
    }
    /// `.L_<function>_<n>` branch labels instead of `.L<vram>`.
    #[must_use]
    pub const fn sequential_label_names(&self) -> bool {
        self.sequential_label_names
    }
    #[must_use]
    pub fn custom_suffix(&self) -> Option<&str> {
        self.custom_suffix.as_deref()
    }

    pub fn set_name_vars_by_type(&mut self, value: bool) {
        self.name_vars_by_type = value;
    }
    pub fn set_name_vars_by_section(&mut self, value: bool) {
        self.name_vars_by_section = value;
    }
    pub fn set_name_vars_by_file(&mut self, value: bool) {
        self.name_vars_by_file = value;
    }
    pub fn set_legacy_zero_padding(&mut self, value: bool) {
        self.legacy_zero_padding = value;
    }
    pub fn set_sequential_label_names(&mut self, value: bool) {
        self.sequential_label_names = value;
    }
    pub fn set_custom_suffix(&mut self, value: Option<String>) {
        self.custom_suffix = value;
    }
}

impl Default for SymbolNamingSettings {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide knobs, threaded explicitly into analysis and display code.
///
/// Build one through [`GlobalConfigBuilder`]; after that the configuration
/// is read-only for the rest of the run.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct GlobalConfig {
    endian: Endian,
    gp_config: Option<GpConfig>,
    macro_labels: MacroLabels,
    naming: SymbolNamingSettings,
    panic_policy: PanicPolicy,

    emit_size_directive: bool,
    emit_cpload: bool,
    detect_redundant_function_end: bool,
    asm_indentation: u8,
    asm_indentation_labels: u8,
}

impl GlobalConfig {
    pub fn new(endian: Endian) -> Self {
        GlobalConfigBuilder::new(endian).build()
    }

    #[must_use]
    pub const fn endian(&self) -> Endian {
        self.endian
    }
    #[must_use]
    pub const fn gp_config(&self) -> Option<GpConfig> {
        self.gp_config
    }
    #[must_use]
    pub const fn macro_labels(&self) -> &MacroLabels {
        &self.macro_labels
    }
    #[must_use]
    pub const fn naming(&self) -> &SymbolNamingSettings {
        &self.naming
    }
    #[must_use]
    pub const fn panic_policy(&self) -> PanicPolicy {
        self.panic_policy
    }

    /// Emit `.size name, . - name` after each symbol.
    #[must_use]
    pub const fn emit_size_directive(&self) -> bool {
        self.emit_size_directive
    }
    /// Emit the `.cpload` preamble for PIC functions instead of its raw
    /// instructions.
    #[must_use]
    pub const fn emit_cpload(&self) -> bool {
        self.emit_cpload
    }
    /// Fold duplicated `jr $ra` epilogues (IDO `-g`) into the previous
    /// function instead of treating them as their own one.
    #[must_use]
    pub const fn detect_redundant_function_end(&self) -> bool {
        self.detect_redundant_function_end
    }
    #[must_use]
    pub const fn asm_indentation(&self) -> u8 {
        self.asm_indentation
    }
    #[must_use]
    pub const fn asm_indentation_labels(&self) -> u8 {
        self.asm_indentation_labels
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
#[must_use]
pub struct GlobalConfigBuilder {
    config: GlobalConfig,
}

impl GlobalConfigBuilder {
    pub fn new(endian: Endian) -> Self {
        Self {
            config: GlobalConfig {
                endian,
                gp_config: None,
                macro_labels: MacroLabels::new(),
                naming: SymbolNamingSettings::new(),
                panic_policy: PanicPolicy::new(),
                emit_size_directive: false,
                emit_cpload: true,
                detect_redundant_function_end: false,
                asm_indentation: 4,
                asm_indentation_labels: 2,
            },
        }
    }

    pub fn with_gp_config(mut self, gp_config: Option<GpConfig>) -> Self {
        self.config.gp_config = gp_config;
        self
    }
    pub fn with_macro_labels(mut self, macro_labels: MacroLabels) -> Self {
        self.config.macro_labels = macro_labels;
        self
    }
    pub fn with_naming(mut self, naming: SymbolNamingSettings) -> Self {
        self.config.naming = naming;
        self
    }
    pub fn with_panic_policy(mut self, panic_policy: PanicPolicy) -> Self {
        self.config.panic_policy = panic_policy;
        self
    }
    pub fn with_emit_size_directive(mut self, value: bool) -> Self {
        self.config.emit_size_directive = value;
        self
    }
    pub fn with_emit_cpload(mut self, value: bool) -> Self {
        self.config.emit_cpload = value;
        self
    }
    pub fn with_detect_redundant_function_end(mut self, value: bool) -> Self {
        self.config.detect_redundant_function_end = value;
        self
    }
    pub fn with_asm_indentation(mut self, value: u8) -> Self {
        self.config.asm_indentation = value;
        self
    }
    pub fn with_asm_indentation_labels(mut self, value: u8) -> Self {
        self.config.asm_indentation_labels = value;
        self
    }

    pub fn naming_mut(&mut self) -> &mut SymbolNamingSettings {
        &mut self.config.naming
    }

    /// Apply `MIPSDASM_*` environment variables on top of the current
    /// values. Call this before handing CLI overrides in, so the precedence
    /// is defaults < environment < CLI.
    #[cfg(feature = "std")]
    pub fn apply_env_overrides(mut self) -> Self {
        fn env_bool(name: &str) -> Option<bool> {
            match std::env::var(name).ok()?.as_str() {
                "1" | "true" | "True" => Some(true),
                "0" | "false" | "False" => Some(false),
                _ => None,
            }
        }
        fn env_u8(name: &str) -> Option<u8> {
            std::env::var(name).ok()?.parse().ok()
        }

        if let Some(x) = env_bool("MIPSDASM_ASM_EMIT_SIZE_DIRECTIVE") {
            self.config.emit_size_directive = x;
        }
        if let Some(x) = env_bool("MIPSDASM_EMIT_CPLOAD") {
            self.config.emit_cpload = x;
        }
        if let Some(x) = env_bool("MIPSDASM_DETECT_REDUNDANT_FUNCTION_END") {
            self.config.detect_redundant_function_end = x;
        }
        if let Some(x) = env_u8("MIPSDASM_ASM_INDENTATION") {
            self.config.asm_indentation = x;
        }
        if let Some(x) = env_u8("MIPSDASM_ASM_INDENTATION_LABELS") {
            self.config.asm_indentation_labels = x;
        }
        if let Some(x) = env_bool("MIPSDASM_SEQUENTIAL_LABEL_NAMES") {
            self.config.naming.sequential_label_names = x;
        }
        if let Some(x) = env_bool("MIPSDASM_NAME_VARS_BY_TYPE") {
            self.config.naming.name_vars_by_type = x;
        }
        if let Some(x) = env_bool("MIPSDASM_NAME_VARS_BY_SECTION") {
            self.config.naming.name_vars_by_section = x;
        }
        if let Some(x) = env_bool("MIPSDASM_NAME_VARS_BY_FILE") {
            self.config.naming.name_vars_by_file = x;
        }
        if let Some(x) = env_bool("MIPSDASM_LEGACY_SYM_ADDR_ZERO_PADDING") {
            self.config.naming.legacy_zero_padding = x;
        }
        if let Ok(x) = std::env::var("MIPSDASM_CUSTOM_SUFFIX") {
            self.config.naming.custom_suffix = (!x.is_empty()).then_some(x);
        }
        if let Some(x) = env_bool("MIPSDASM_PANIC_RANGE_CHECK") {
            self.config.panic_policy = self.config.panic_policy.with_range_check(x);
        }
        if let Some(x) = env_bool("MIPSDASM_PANIC_SIZE_MISMATCH") {
            self.config.panic_policy = self.config.panic_policy.with_size_mismatch(x);
        }

        self
    }

    #[must_use]
    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
