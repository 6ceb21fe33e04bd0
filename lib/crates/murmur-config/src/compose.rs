//! Rule table and template for the `mumblevoip/mumble-server` compose file.

use crate::dialect::{Dialect, ValueKind};
use crate::field::{DEFAULT_PORT, keys};
use crate::rules::{Policy, Protocol, Rule, RuleTable};

/// Directive prefix the image maps onto `mumble-server.ini` keys.
pub const CONFIG_PREFIX: &str = "MUMBLE_CONFIG_";

/// Environment variable holding a preset SuperUser password.
pub const SUPERUSER_PASSWORD_VAR: &str = "MUMBLE_SUPERUSER_PASSWORD";

/// Compose service name used by the template.
pub const SERVICE: &str = "mumble-server";

/// Compose file written when the operator asks for one to be generated.
pub const TEMPLATE: &str = r#"services:
  mumble-server:
    image: mumblevoip/mumble-server:latest
    container_name: mumble-server
    hostname: mumble-server
    restart: unless-stopped
    ports:
      - "64738:64738"
      - "64738:64738/udp"
    volumes:
      - ./data:/data
    environment:
      - MUMBLE_CONFIG_host=0.0.0.0
      - MUMBLE_CONFIG_port=64738
      - MUMBLE_CONFIG_users=100
      - MUMBLE_CONFIG_welcometext=Welcome to Mumble Server!
"#;

fn directive(key: &str, policy: Policy, kind: ValueKind) -> Rule {
    Rule::directive(format!("{CONFIG_PREFIX}{key}"), policy, kind)
}

fn group(key: &str, field: &str) -> Rule {
    directive(
        key,
        Policy::ConditionalGroup {
            gate: keys::PUBLIC.to_string(),
            field: field.to_string(),
        },
        ValueKind::Text,
    )
}

/// Rules for a compose file whose port mappings currently use `old_port`.
#[must_use]
pub fn rules(old_port: u16) -> RuleTable {
    RuleTable::new(
        Dialect::Compose,
        vec![
            directive("host", Policy::ForceSet("0.0.0.0".into()), ValueKind::Bare),
            directive(
                "port",
                Policy::SubstituteIfPresent(keys::PORT.into()),
                ValueKind::Bare,
            ),
            directive(
                "users",
                Policy::SubstituteIfPresent(keys::MAX_USERS.into()),
                ValueKind::Bare,
            ),
            directive(
                "welcometext",
                Policy::SubstituteIfPresent(keys::WELCOME_TEXT.into()),
                ValueKind::Text,
            ),
            directive(
                "serverpassword",
                Policy::SubstituteIfPresent(keys::SERVER_PASSWORD.into()),
                ValueKind::Text,
            ),
            group("registerName", keys::REGISTER_NAME),
            group("registerHostname", keys::REGISTER_HOSTNAME),
            group("registerPassword", keys::REGISTER_PASSWORD),
            group("registerUrl", keys::REGISTER_URL),
            Rule::directive(SUPERUSER_PASSWORD_VAR, Policy::DropAlways, ValueKind::Text),
            Rule::port_pair(old_port, Protocol::Tcp, keys::PORT),
            Rule::port_pair(old_port, Protocol::Udp, keys::PORT),
        ],
    )
}

/// Port currently configured in a compose file, from its `port` directive.
#[must_use]
pub fn detect_port(content: &str) -> u16 {
    let key = format!("{CONFIG_PREFIX}port");
    content
        .lines()
        .filter_map(|line| Dialect::Compose.parse(line))
        .find(|d| !d.commented && d.key == key)
        .and_then(|d| d.value.trim().parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Rules matched to the port mappings already present in `content`.
#[must_use]
pub fn rules_for(content: &str) -> RuleTable {
    rules(detect_port(content))
}
