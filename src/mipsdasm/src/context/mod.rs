/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod context_builder;
#[allow(clippy::module_inception)]
mod context;

pub use context::{Context, OwnedSegmentNotFoundError};
pub use context_builder::{AddUserSymbolError, ContextBuilder, OverlaySegmentBuilder};
