//! Application context — unified state passed to every command handler.
//!
//! Adding a new cross-cutting concern requires only one field change here;
//! command signatures stay the same.

use anyhow::Result;

use crate::application::ports::Prompter;
use crate::infra::config::YamlConfigStore;
use crate::infra::prompt::DialoguerPrompter;
use crate::output::{HumanRenderer, JsonRenderer, OutputContext, Renderer};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `MURMUR_SETUP_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Installer defaults file.
    pub config_store: YamlConfigStore,
    /// Operator input.
    pub prompter: DialoguerPrompter,
    /// When `true`, never prompt: use overrides and defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or
    /// `MURMUR_SETUP_YES` environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("MURMUR_SETUP_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        let mode = if flags.output.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };

        // progress lines would corrupt the JSON document on stdout
        let quiet = flags.output.quiet || flags.output.json;

        Self {
            output: OutputContext::new(flags.output.no_color, quiet),
            mode,
            config_store: YamlConfigStore::new(),
            prompter: DialoguerPrompter,
            non_interactive,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Returns the appropriate `Renderer` variant for the current output mode.
    #[must_use]
    pub fn renderer(&self) -> Renderer<'_> {
        match self.mode {
            OutputMode::Human => Renderer::Human(HumanRenderer::new(&self.output)),
            OutputMode::Json => Renderer::Json(JsonRenderer),
        }
    }

    /// Ask the user for confirmation.
    ///
    /// When `non_interactive` is `true`, returns `default` immediately
    /// without prompting.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    pub fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            return Ok(default);
        }
        self.prompter.confirm(prompt, default)
    }
}
