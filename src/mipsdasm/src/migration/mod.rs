/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod func_rodata_pairing;
mod pairing_display;
mod pairing_error;
mod rodata_iterator;

pub use func_rodata_pairing::FuncRodataPairing;
pub use pairing_display::FuncRodataPairingDisplay;
pub use pairing_error::PairingError;
pub use rodata_iterator::RodataIterator;
