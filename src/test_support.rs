//! Shared fixtures for unit tests

use crate::di::Dependencies;
use crate::error::HookResult;
use crate::lifecycle::{Behaviour, Hook};
use std::cell::RefCell;
use std::rc::Rc;

/// Ordered record of hook invocations, shared between probes
#[derive(Clone, Default)]
pub(crate) struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub(crate) fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(crate) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Behaviour that records each hook as `<label>:<hook>` and can be told to
/// fail one of them
pub(crate) struct Probe {
    label: String,
    journal: Journal,
    failing: Option<Hook>,
}

impl Probe {
    pub(crate) fn new(label: impl Into<String>, journal: &Journal) -> Self {
        Self {
            label: label.into(),
            journal: journal.clone(),
            failing: None,
        }
    }

    pub(crate) fn failing_on(mut self, hook: Hook) -> Self {
        self.failing = Some(hook);
        self
    }

    fn hit(&self, hook: Hook) -> HookResult {
        self.journal.record(format!("{}:{}", self.label, hook));
        if self.failing == Some(hook) {
            anyhow::bail!("{} failed in {}", self.label, hook);
        }
        Ok(())
    }
}

impl Behaviour for Probe {
    fn setup(&mut self, _dependencies: &Dependencies) -> HookResult {
        self.hit(Hook::Setup)
    }

    fn start(&mut self, _dependencies: &Dependencies) -> HookResult {
        self.hit(Hook::Start)
    }

    fn end(&mut self, _dependencies: &Dependencies) -> HookResult {
        self.hit(Hook::End)
    }

    fn dispose(&mut self, _dependencies: &Dependencies) -> HookResult {
        self.hit(Hook::Dispose)
    }
}

/// Route `tracing` output through the test harness
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}
