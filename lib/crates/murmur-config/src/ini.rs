//! Rule table for the native `mumble-server.ini`.

use crate::dialect::{Dialect, ValueKind};
use crate::field::keys;
use crate::rules::{Policy, Rule, RuleTable};

/// Default location installed by the Debian/Ubuntu package.
pub const DEFAULT_PATH: &str = "/etc/mumble-server.ini";

fn group(key: &str, field: &str) -> Rule {
    Rule::directive(
        key,
        Policy::ConditionalGroup {
            gate: keys::PUBLIC.to_string(),
            field: field.to_string(),
        },
        ValueKind::Text,
    )
}

/// Rules for `mumble-server.ini`.
#[must_use]
pub fn rules() -> RuleTable {
    RuleTable::new(
        Dialect::Ini,
        vec![
            Rule::directive("host", Policy::ForceSet("0.0.0.0".into()), ValueKind::Bare),
            Rule::directive(
                "port",
                Policy::SubstituteIfPresent(keys::PORT.into()),
                ValueKind::Bare,
            ),
            Rule::directive(
                "users",
                Policy::SubstituteIfPresent(keys::MAX_USERS.into()),
                ValueKind::Bare,
            ),
            Rule::directive(
                "welcometext",
                Policy::SubstituteIfPresent(keys::WELCOME_TEXT.into()),
                ValueKind::Text,
            ),
            Rule::directive(
                "serverpassword",
                Policy::SubstituteIfPresent(keys::SERVER_PASSWORD.into()),
                ValueKind::Text,
            ),
            group("registerName", keys::REGISTER_NAME),
            group("registerHostname", keys::REGISTER_HOSTNAME),
            group("registerPassword", keys::REGISTER_PASSWORD),
            group("registerUrl", keys::REGISTER_URL),
        ],
    )
}
