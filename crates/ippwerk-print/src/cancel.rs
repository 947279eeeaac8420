// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Cooperative cancellation flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use ippwerk_core::error::{IppwerkError, Result};

/// Shared flag checked between submission steps.  Setting it never
/// interrupts a transmission already on the wire.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once the token has been set.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(IppwerkError::Cancelled)
        } else {
            Ok(())
        }
    }
}
