/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

use crate::addresses::Rom;

/// How a `%lo`-capable instruction pairs with whatever its base register was
/// holding.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct LoPairingInfo {
    /// Rom of the instruction that produced the upper half.
    pub(crate) instr_rom: Rom,
    /// The upper half value. Not meaningful when `is_gp_rel` is set.
    pub(crate) value: i64,
    /// The base register is `$gp` itself.
    pub(crate) is_gp_rel: bool,
    /// The base register holds a value that was loaded from the GOT.
    pub(crate) is_gp_got: bool,
}
