//! Application service — collect the configuration set from the operator.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Prompts go through the injected `Prompter`; warnings through the
//! injected `ProgressReporter`.

use std::collections::HashMap;

use anyhow::Result;
use murmur_config::{ConfigurationField, ConfigurationSet, keys, parse_bool};

use crate::application::ports::{ProgressReporter, Prompter};
use crate::domain::SetupError;
use crate::domain::fields::{FieldKind, FieldSpec, gated_off_value};

/// Where answers come from besides the prompter.
pub struct CollectOptions<'a, R: ProgressReporter> {
    pub reporter: &'a R,
    /// `--set KEY=VALUE` values, already checked against the catalog.
    pub overrides: &'a HashMap<String, String>,
    /// Never prompt: overrides, then fallbacks. Invalid values are fatal.
    pub non_interactive: bool,
}

/// Collect one value per catalog entry, in order.
///
/// Fields in the public-listing group are not asked when the gate is off;
/// they take fixed values instead. Public listing is refused while a server
/// password is set.
///
/// # Errors
///
/// Returns an error if the prompter fails, or in non-interactive mode if a
/// value does not pass its validator.
pub fn collect<R: ProgressReporter>(
    catalog: &[FieldSpec],
    prompter: &impl Prompter,
    opts: &CollectOptions<'_, R>,
) -> Result<ConfigurationSet> {
    let mut set = ConfigurationSet::new();
    for spec in catalog {
        let gated_off = spec.gated && !set.is_enabled(keys::PUBLIC);
        let value = if gated_off {
            gated_off_value(spec.key, &set)
        } else if spec.key == keys::PUBLIC && !set.value(keys::SERVER_PASSWORD).is_empty() {
            refuse_public_with_password(opts);
            "false".to_string()
        } else {
            resolve(spec, &set, prompter, opts)?
        };
        set.insert(field(spec, value, gated_off, &set));
    }
    Ok(set)
}

fn refuse_public_with_password<R: ProgressReporter>(opts: &CollectOptions<'_, R>) {
    let asked_for = opts
        .overrides
        .get(keys::PUBLIC)
        .and_then(|v| parse_bool(v))
        .unwrap_or(false);
    if asked_for {
        opts.reporter.warn(
            "Public listing is not available for password-protected servers; listing disabled",
        );
    }
}

fn field(spec: &FieldSpec, value: String, gated_off: bool, set: &ConfigurationSet) -> ConfigurationField {
    let mut field = ConfigurationField::new(spec.key, value);
    if spec.required && !gated_off {
        field = field.required();
    }
    if let Some(v) = spec.validator {
        field = field.with_validator(v);
    }
    let fallback = spec.fallback.resolve(set);
    if !fallback.is_empty() {
        field = field.with_default(fallback);
    }
    field
}

fn resolve<R: ProgressReporter>(
    spec: &FieldSpec,
    set: &ConfigurationSet,
    prompter: &impl Prompter,
    opts: &CollectOptions<'_, R>,
) -> Result<String> {
    let fallback = spec.fallback.resolve(set);

    if let Some(raw) = opts.overrides.get(spec.key) {
        match spec.check(raw) {
            Ok(()) => return Ok(normalize(spec, raw)),
            Err(reason) if opts.non_interactive => {
                return Err(SetupError::InvalidInput {
                    key: spec.key.to_string(),
                    reason,
                }
                .into());
            }
            Err(reason) => opts.reporter.warn(&format!("--set {}: {reason}", spec.key)),
        }
    }

    if opts.non_interactive {
        spec.check(&fallback).map_err(|reason| SetupError::InvalidInput {
            key: spec.key.to_string(),
            reason,
        })?;
        return Ok(normalize(spec, &fallback));
    }

    loop {
        let answer = match spec.kind {
            FieldKind::Text => prompter.input(spec.prompt, &fallback)?,
            FieldKind::Secret => prompter.password(spec.prompt)?,
            FieldKind::Confirm => prompter
                .confirm(spec.prompt, parse_bool(&fallback).unwrap_or(false))?
                .to_string(),
        };
        let answer = if answer.trim().is_empty() && spec.kind == FieldKind::Text {
            fallback.clone()
        } else {
            answer
        };
        match spec.check(&answer) {
            Ok(()) => return Ok(normalize(spec, &answer)),
            Err(reason) => opts.reporter.warn(&reason),
        }
    }
}

/// Canonical spelling of an accepted answer.
fn normalize(spec: &FieldSpec, raw: &str) -> String {
    match spec.kind {
        FieldKind::Confirm => parse_bool(raw).unwrap_or(false).to_string(),
        FieldKind::Secret => raw.to_string(),
        FieldKind::Text => raw.trim().to_string(),
    }
}
