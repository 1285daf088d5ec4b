// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod selection;
pub mod user;

pub use selection::PhraseSelection;
pub use user::User;
