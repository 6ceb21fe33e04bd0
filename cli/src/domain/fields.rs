//! Field catalog: what the installer asks, in which order, and with which
//! validator and fallback.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::collections::HashMap;
use std::fmt;

use murmur_config::{ConfigurationSet, Validator, keys};
use serde::Serialize;

use crate::domain::config::InstallerConfig;
use crate::domain::error::SetupError;

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// `mumblevoip/mumble-server` under Docker Compose.
    Docker,
    /// Distribution package under systemd.
    Native,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Docker => "docker",
            Self::Native => "native",
        })
    }
}

/// How a field is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Read without echo.
    Secret,
    /// Yes/no question.
    Confirm,
}

/// Value used when the operator gives no answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    Value(String),
    /// `Welcome to <server name>!`
    Welcome,
    /// Copy of an earlier field.
    SameAs(&'static str),
    Empty,
}

impl Fallback {
    /// Resolve against the fields collected so far.
    #[must_use]
    pub fn resolve(&self, collected: &ConfigurationSet) -> String {
        match self {
            Self::Value(v) => v.clone(),
            Self::Welcome => format!("Welcome to {}!", collected.value(keys::SERVER_NAME)),
            Self::SameAs(key) => collected.value(key).to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub prompt: &'static str,
    pub kind: FieldKind,
    pub validator: Option<Validator>,
    pub required: bool,
    /// Only asked when public listing is on.
    pub gated: bool,
    pub fallback: Fallback,
}

impl FieldSpec {
    fn new(key: &'static str, prompt: &'static str) -> Self {
        Self {
            key,
            prompt,
            kind: FieldKind::Text,
            validator: None,
            required: false,
            gated: false,
            fallback: Fallback::Empty,
        }
    }

    fn required(mut self, validator: Validator) -> Self {
        self.required = true;
        self.validator = Some(validator);
        self
    }

    fn validated(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    fn fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = fallback;
        self
    }

    /// Check a raw answer: required fields reject empty answers, optional
    /// fields accept them unvalidated.
    ///
    /// # Errors
    ///
    /// Returns the reason the answer was rejected.
    pub fn check(&self, raw: &str) -> Result<(), String> {
        if raw.trim().is_empty() {
            return if self.required {
                Err("a value is required".to_string())
            } else {
                Ok(())
            };
        }
        self.validator.map_or(Ok(()), |v| v.check(raw))
    }
}

/// Fields for `mode`, in prompting order, with fallbacks from `config`.
#[must_use]
pub fn catalog(mode: Mode, config: &InstallerConfig) -> Vec<FieldSpec> {
    let welcome = if config.defaults.welcome_text.trim().is_empty() {
        Fallback::Welcome
    } else {
        Fallback::Value(config.defaults.welcome_text.clone())
    };

    let mut fields = vec![
        FieldSpec::new(keys::SERVER_NAME, "Server name")
            .required(Validator::NonEmpty)
            .fallback(Fallback::Value(config.defaults.server_name.clone())),
        FieldSpec::new(keys::WELCOME_TEXT, "Welcome message").fallback(welcome),
        FieldSpec::new(keys::PORT, "Port (TCP and UDP)")
            .required(Validator::Port)
            .fallback(Fallback::Value(config.defaults.port.to_string())),
        FieldSpec::new(keys::MAX_USERS, "Maximum concurrent users")
            .required(Validator::PositiveInteger)
            .fallback(Fallback::Value(config.defaults.max_users.to_string())),
        FieldSpec::new(keys::SERVER_PASSWORD, "Server password (empty for none)")
            .kind(FieldKind::Secret),
        FieldSpec::new(keys::PUBLIC, "List this server on the public server list?")
            .kind(FieldKind::Confirm)
            .validated(Validator::Boolean)
            .fallback(Fallback::Value("false".to_string())),
        FieldSpec::new(keys::REGISTER_NAME, "Public listing name")
            .required(Validator::NonEmpty)
            .gated()
            .fallback(Fallback::SameAs(keys::SERVER_NAME)),
        FieldSpec::new(keys::REGISTER_HOSTNAME, "Public hostname or IP address")
            .required(Validator::Hostname)
            .gated(),
        FieldSpec::new(keys::REGISTER_PASSWORD, "Listing password (empty for none)")
            .kind(FieldKind::Secret)
            .gated(),
        FieldSpec::new(keys::REGISTER_URL, "Website URL (optional)")
            .validated(Validator::Url)
            .gated(),
    ];

    if mode == Mode::Native {
        fields.push(
            FieldSpec::new(
                keys::SUPERUSER_PASSWORD,
                "SuperUser password (empty to use the generated one)",
            )
            .kind(FieldKind::Secret),
        );
    }
    fields
}

/// Values the group takes when public listing is off.
#[must_use]
pub fn gated_off_value(key: &str, collected: &ConfigurationSet) -> String {
    if key == keys::REGISTER_NAME {
        collected.value(keys::SERVER_NAME).to_string()
    } else {
        String::new()
    }
}

// ── Overrides ────────────────────────────────────────────────────────────────

/// Split a `KEY=VALUE` override.
///
/// # Errors
///
/// Returns an error if there is no `=` or the key is empty.
pub fn parse_override(raw: &str) -> Result<(String, String), SetupError> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(SetupError::BadOverride(raw.to_string())),
    }
}

/// Parse every override and check each key belongs to `catalog`.
///
/// # Errors
///
/// Returns an error on a malformed override or a key the catalog does not have.
pub fn parse_overrides(
    raw: &[String],
    catalog: &[FieldSpec],
) -> Result<HashMap<String, String>, SetupError> {
    let mut out = HashMap::new();
    for item in raw {
        let (key, value) = parse_override(item)?;
        if !catalog.iter().any(|f| f.key == key) {
            return Err(SetupError::UnknownField {
                key,
                valid: catalog.iter().map(|f| f.key).collect::<Vec<_>>().join(", "),
            });
        }
        out.insert(key, value);
    }
    Ok(out)
}
