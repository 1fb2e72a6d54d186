/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod compiler;
mod endian;
mod global_config;
mod gp_config;
mod macro_labels;
mod panic_policy;

pub use compiler::Compiler;
pub use endian::Endian;
pub use global_config::{GlobalConfig, GlobalConfigBuilder, SymbolNamingSettings};
pub use gp_config::GpConfig;
pub use macro_labels::MacroLabels;
pub use panic_policy::PanicPolicy;
