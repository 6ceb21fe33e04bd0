//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::cell::RefCell;

use indicatif::ProgressBar;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// On a TTY a `step()` runs a spinner until the next event; elsewhere it
/// prints `"  → {message}"`. Everything is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    active: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            active: RefCell::new(None),
        }
    }

    fn take_spinner(&self) -> Option<ProgressBar> {
        self.active.borrow_mut().take()
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if let Some(pb) = self.take_spinner() {
            progress::abandon(&pb);
        }
        if self.ctx.show_progress() {
            *self.active.borrow_mut() = Some(progress::spinner(message));
        } else {
            self.ctx.step(message);
        }
    }

    fn success(&self, message: &str) {
        match self.take_spinner() {
            Some(pb) => progress::finish_ok(&pb, message),
            None => self.ctx.success(message),
        }
    }

    fn warn(&self, message: &str) {
        if let Some(pb) = self.take_spinner() {
            progress::abandon(&pb);
        }
        self.ctx.warn(message);
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = self.take_spinner() {
            progress::abandon(&pb);
        }
    }
}
