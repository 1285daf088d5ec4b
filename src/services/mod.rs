// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod catalog;
pub mod engine;
pub mod push;
pub mod reroll;
pub mod scanner;
pub mod selection;
pub mod session;

pub use catalog::PhraseCatalog;
pub use engine::DailyUpdateEngine;
pub use push::FcmClient;
pub use reroll::{RerollOutcome, RerollPolicy};
pub use scanner::{MidnightScanner, ScanOutcome};
pub use selection::SelectionStore;
pub use session::SessionRegistry;
