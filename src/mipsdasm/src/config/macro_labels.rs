/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use alloc::string::String;

/// The label macros used on the emitted assembly.
///
/// Decomp projects define these macros on an include file so the linker can
/// see global symbols while labels inside functions stay local.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct MacroLabels {
    func: String,
    alt_func: String,
    func_end: Option<String>,

    jtbl_label: String,
    ehtbl_label: String,

    data: String,
    data_end: Option<String>,
}

impl MacroLabels {
    pub fn new() -> Self {
        Self {
            func: "glabel".into(),
            alt_func: "alabel".into(),
            func_end: None,

            jtbl_label: "jlabel".into(),
            ehtbl_label: "ehlabel".into(),

            data: "dlabel".into(),
            data_end: None,
        }
    }

    pub fn func(&self) -> &str {
        &self.func
    }
    pub fn alt_func(&self) -> &str {
        &self.alt_func
    }
    pub fn func_end(&self) -> Option<&str> {
        self.func_end.as_deref()
    }

    pub fn jtbl_label(&self) -> &str {
        &self.jtbl_label
    }
    pub fn ehtbl_label(&self) -> &str {
        &self.ehtbl_label
    }

    pub fn data(&self) -> &str {
        &self.data
    }
    pub fn data_end(&self) -> Option<&str> {
        self.data_end.as_deref()
    }

    pub fn with_func(self, func: String) -> Self {
        Self { func, ..self }
    }
    pub fn with_func_end(self, func_end: Option<String>) -> Self {
        Self { func_end, ..self }
    }
    pub fn with_jtbl_label(self, jtbl_label: String) -> Self {
        Self { jtbl_label, ..self }
    }
    pub fn with_ehtbl_label(self, ehtbl_label: String) -> Self {
        Self {
            ehtbl_label,
            ..self
        }
    }
    pub fn with_data(self, data: String) -> Self {
        Self { data, ..self }
    }
    pub fn with_data_end(self, data_end: Option<String>) -> Self {
        Self { data_end, ..self }
    }
}

impl Default for MacroLabels {
    fn default() -> Self {
        Self::new()
    }
}
