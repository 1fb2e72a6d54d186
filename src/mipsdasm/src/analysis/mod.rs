/* SPDX-FileCopyrightText: © 2025 Decompollaborate */
/* SPDX-License-Identifier: MIT */

mod instruction_analysis_result;
mod instruction_analyzer;
mod jr_reg_data;
mod lo_pairing_info;
mod register_tracker;
mod string_guesser;
mod tracked_register_state;

pub use instruction_analysis_result::InstructionAnalysisResult;
pub use instruction_analyzer::InstructionAnalyzer;
pub use string_guesser::{PascalStringGuesserLevel, StringGuesserLevel};

pub(crate) use jr_reg_data::JrRegData;
pub(crate) use lo_pairing_info::LoPairingInfo;
pub(crate) use register_tracker::RegisterTracker;
pub(crate) use tracked_register_state::TrackedRegisterState;
