//! Recording fakes for every port, shared across the unit test files.

#![allow(dead_code, clippy::expect_used)]

use std::collections::{HashSet, VecDeque};
use std::process::Output;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use murmur_config::Protocol;
use murmur_setup::application::ports::{
    CommandRunner, NetworkExposer, ProgressReporter, Prompter, Provisioner, ServiceDriver,
    SuperUserAdmin,
};
use murmur_setup::domain::FirewallOutcome;

use crate::helpers::ok_output;

// ── MockCommandRunner ────────────────────────────────────────────────────────

/// A `CommandRunner` that records every `program args...` line and answers
/// from canned responses keyed by command-line prefix.
///
/// Clones share the same call log, so one mock can back several adapters.
#[derive(Clone, Default)]
pub struct MockCommandRunner {
    calls: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<Vec<(String, Output)>>>,
    tools: Arc<Mutex<HashSet<String>>>,
}

impl MockCommandRunner {
    /// A runner where every program in `tools` is on `PATH`.
    pub fn with_tools(tools: &[&str]) -> Self {
        let runner = Self::default();
        runner
            .tools
            .lock()
            .expect("mutex poisoned")
            .extend(tools.iter().map(|t| (*t).to_string()));
        runner
    }

    /// Answer commands starting with `prefix` with `output`. First match wins.
    pub fn respond(self, prefix: &str, output: Output) -> Self {
        self.responses
            .lock()
            .expect("mutex poisoned")
            .push((prefix.to_string(), output));
        self
    }

    /// Every command line run so far, in order.
    pub fn recorded_calls(&self) -> Vec<String> {
        self.calls.lock().expect("mutex poisoned").clone()
    }
}

impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        self.run_with_timeout(program, args, Duration::from_secs(1))
            .await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Duration,
    ) -> Result<Output> {
        let line = std::iter::once(program)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        self.calls.lock().expect("mutex poisoned").push(line.clone());
        let responses = self.responses.lock().expect("mutex poisoned");
        Ok(responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map_or_else(|| ok_output(b""), |(_, out)| out.clone()))
    }

    fn command_exists(&self, program: &str) -> bool {
        self.tools.lock().expect("mutex poisoned").contains(program)
    }
}

// ── Reporter ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub steps: Mutex<Vec<String>>,
    pub successes: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().expect("mutex poisoned").clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.lock().expect("mutex poisoned").push(message.to_string());
    }
    fn success(&self, message: &str) {
        self.successes
            .lock()
            .expect("mutex poisoned")
            .push(message.to_string());
    }
    fn warn(&self, message: &str) {
        self.warnings
            .lock()
            .expect("mutex poisoned")
            .push(message.to_string());
    }
}

// ── Prompter ─────────────────────────────────────────────────────────────────

/// Answers prompts from a script and records what was asked.
///
/// Confirm prompts read `y` / `n`; an empty answer takes the default.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    pub asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| (*a).to_string()).collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().expect("mutex poisoned").clone()
    }

    fn next(&self, prompt: &str) -> Result<String> {
        self.asked.lock().expect("mutex poisoned").push(prompt.to_string());
        match self.answers.lock().expect("mutex poisoned").pop_front() {
            Some(answer) => Ok(answer),
            None => bail!("no scripted answer for '{prompt}'"),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&self, prompt: &str, _default: &str) -> Result<String> {
        self.next(prompt)
    }
    fn password(&self, prompt: &str) -> Result<String> {
        self.next(prompt)
    }
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        Ok(match self.next(prompt)?.as_str() {
            "y" => true,
            "n" => false,
            _ => default,
        })
    }
}

// ── Host fakes ───────────────────────────────────────────────────────────────

/// Shared, ordered log of what the host fakes were asked to do.
pub type Journal = Arc<Mutex<Vec<String>>>;

fn note(journal: &Journal, entry: impl Into<String>) {
    journal.lock().expect("mutex poisoned").push(entry.into());
}

pub struct FakeProvisioner {
    pub journal: Journal,
    pub fail_install: bool,
    pub fail_runtime: bool,
}

impl FakeProvisioner {
    pub fn ok(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            fail_install: false,
            fail_runtime: false,
        }
    }
}

impl Provisioner for FakeProvisioner {
    async fn ensure_installed(&self, package: &str) -> Result<()> {
        note(&self.journal, format!("install {package}"));
        if self.fail_install {
            bail!("E: Unable to locate package {package}");
        }
        Ok(())
    }
    async fn ensure_runtime_active(&self) -> Result<()> {
        note(&self.journal, "runtime");
        if self.fail_runtime {
            bail!("Cannot connect to the Docker daemon");
        }
        Ok(())
    }
}

pub struct FakeExposer {
    pub journal: Journal,
    pub fail: bool,
}

impl FakeExposer {
    pub fn ok(journal: &Journal) -> Self {
        Self {
            journal: Arc::clone(journal),
            fail: false,
        }
    }
}

impl NetworkExposer for FakeExposer {
    async fn open_port(&self, port: u16, protocols: &[Protocol]) -> Result<FirewallOutcome> {
        note(&self.journal, format!("open {port}"));
        if self.fail {
            bail!("ERROR: Couldn't determine iptables version");
        }
        Ok(FirewallOutcome::Opened {
            tool: "ufw".to_string(),
            port,
            protocols: protocols.to_vec(),
        })
    }
}

pub struct FakeDriver {
    pub journal: Journal,
    pub active: bool,
    pub logs: String,
    /// `restart()` never completes.
    pub hang_on_restart: bool,
}

impl FakeDriver {
    pub fn running(journal: &Journal, logs: &str) -> Self {
        Self {
            journal: Arc::clone(journal),
            active: true,
            logs: logs.to_string(),
            hang_on_restart: false,
        }
    }
}

impl ServiceDriver for FakeDriver {
    async fn restart(&self) -> Result<()> {
        note(&self.journal, "restart");
        if self.hang_on_restart {
            std::future::pending::<()>().await;
        }
        Ok(())
    }
    async fn is_active(&self) -> Result<bool> {
        Ok(self.active)
    }
    async fn logs(&self) -> Result<String> {
        note(&self.journal, "logs");
        Ok(self.logs.clone())
    }
    fn inspect_hint(&self) -> String {
        "journalctl -u fake".to_string()
    }
}

impl SuperUserAdmin for FakeDriver {
    async fn set_superuser_password(&self, password: &str) -> Result<()> {
        note(&self.journal, format!("supw {password}"));
        Ok(())
    }
}

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().expect("mutex poisoned").clone()
}
