//! Configuration fields collected from the operator.
//!
//! Pure data only: no prompting, no I/O. A [`ConfigurationSet`] is built once
//! per run and handed to the transformer by reference.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;

use crate::error::ArtifactError;

/// Logical field keys shared by both deployment modes.
pub mod keys {
    pub const SERVER_NAME: &str = "server_name";
    pub const WELCOME_TEXT: &str = "welcome_text";
    pub const PORT: &str = "port";
    pub const MAX_USERS: &str = "max_users";
    pub const SERVER_PASSWORD: &str = "server_password";
    /// Gate: enable public listing.
    pub const PUBLIC: &str = "public";
    pub const REGISTER_NAME: &str = "register_name";
    pub const REGISTER_HOSTNAME: &str = "register_hostname";
    pub const REGISTER_PASSWORD: &str = "register_password";
    pub const REGISTER_URL: &str = "register_url";
    /// Native mode only.
    pub const SUPERUSER_PASSWORD: &str = "superuser_password";

    /// Fields governed by the [`PUBLIC`] gate.
    pub const PUBLIC_GROUP: &[&str] = &[
        REGISTER_HOSTNAME,
        REGISTER_NAME,
        REGISTER_PASSWORD,
        REGISTER_URL,
    ];
}

/// Default Mumble server port (TCP and UDP).
pub const DEFAULT_PORT: u16 = 64738;

static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^(?i)[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$")
        .expect("valid regex")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid regex")
});

/// Predicate over the raw string an operator typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Validator {
    NonEmpty,
    Port,
    PositiveInteger,
    /// DNS name or IPv4 address.
    Hostname,
    Url,
    Boolean,
}

impl Validator {
    /// Check `raw`, returning a message suitable for a re-prompt on failure.
    ///
    /// # Errors
    ///
    /// Returns the reason `raw` was rejected.
    pub fn check(self, raw: &str) -> Result<(), String> {
        let raw = raw.trim();
        match self {
            Self::NonEmpty if raw.is_empty() => Err("a value is required".to_string()),
            Self::NonEmpty => Ok(()),
            Self::Port => match raw.parse::<u16>() {
                Ok(p) if p > 0 => Ok(()),
                _ => Err(format!("'{raw}' is not a port number (1-65535)")),
            },
            Self::PositiveInteger => match raw.parse::<u32>() {
                Ok(n) if n > 0 => Ok(()),
                _ => Err(format!("'{raw}' is not a positive whole number")),
            },
            Self::Hostname if HOSTNAME_RE.is_match(raw) => Ok(()),
            Self::Hostname => Err(format!("'{raw}' is not a valid hostname or address")),
            Self::Url if URL_RE.is_match(raw) => Ok(()),
            Self::Url => Err(format!("'{raw}' must start with http:// or https://")),
            Self::Boolean if parse_bool(raw).is_some() => Ok(()),
            Self::Boolean => Err(format!("'{raw}' is not yes or no")),
        }
    }
}

/// Parse the usual spellings of a yes/no answer.
#[must_use]
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" | "on" => Some(true),
        "false" | "no" | "n" | "0" | "off" | "" => Some(false),
        _ => None,
    }
}

/// One collected key/value pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationField {
    pub key: String,
    pub value: String,
    pub required: bool,
    #[serde(skip)]
    pub validator: Option<Validator>,
    #[serde(skip)]
    pub default: Option<String>,
}

impl ConfigurationField {
    /// A field with no validator, not required, and no default.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            required: false,
            validator: None,
            default: None,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// Ordered mapping from key to field, gathered for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationSet {
    fields: IndexMap<String, ConfigurationField>,
}

impl ConfigurationSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing any earlier field with the same key while
    /// keeping its original position.
    pub fn insert(&mut self, field: ConfigurationField) {
        self.fields.insert(field.key.clone(), field);
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, field: ConfigurationField) -> Self {
        self.insert(field);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigurationField> {
        self.fields.get(key)
    }

    /// The value for `key`, or `""` when the key was never collected.
    #[must_use]
    pub fn value(&self, key: &str) -> &str {
        self.fields.get(key).map_or("", |f| f.value.as_str())
    }

    /// Whether a gate field is switched on.
    #[must_use]
    pub fn is_enabled(&self, key: &str) -> bool {
        parse_bool(self.value(key)).unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigurationField> {
        self.fields.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Check that every required field carries a non-empty value.
    pub fn ensure_complete(&self) -> Result<(), ArtifactError> {
        match self
            .iter()
            .find(|f| f.required && f.value.trim().is_empty())
        {
            Some(f) => Err(ArtifactError::Incomplete(f.key.clone())),
            None => Ok(()),
        }
    }
}

impl FromIterator<ConfigurationField> for ConfigurationSet {
    fn from_iter<I: IntoIterator<Item = ConfigurationField>>(iter: I) -> Self {
        let mut set = Self::new();
        for field in iter {
            set.insert(field);
        }
        set
    }
}
