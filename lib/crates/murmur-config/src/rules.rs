//! Declarative rewrite rules.
//!
//! A rule pairs a matcher with a policy. [`RuleTable::apply_line`] is the pure
//! per-line function; whole-artifact concerns (de-duplication, uncommenting,
//! inserting missing directives) live in [`crate::transform`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::dialect::{Dialect, Directive, ValueKind};
use crate::field::ConfigurationSet;

static PORT_PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r#"^(?P<prefix>\s*-\s*)(?P<quote>["']?)(?P<host>\d+):(?P<container>\d+)(?P<proto>/(?:tcp|udp))?["']?\s*$"#,
    )
    .expect("valid regex")
});

/// Transport protocol of a port mapping or firewall rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
        })
    }
}

/// Which lines a rule claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// A directive whose key equals this string exactly.
    Directive(String),
    /// A `"PORT:PORT"` mapping (or `"PORT:PORT/udp"`) on port `from`.
    PortPair { from: u16, protocol: Protocol },
}

/// What happens to a matched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// Always emit this value.
    ForceSet(String),
    /// Emit the field's value when non-empty, else leave the line alone.
    SubstituteIfPresent(String),
    /// Drop the line when `gate` is off; otherwise emit the field's value,
    /// empty included.
    ConditionalGroup { gate: String, field: String },
    /// Never emit.
    DropAlways,
    /// Rewrite a port mapping to the field's port on both sides.
    PortBind(String),
}

/// One entry of a [`RuleTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub matcher: Matcher,
    pub policy: Policy,
    pub kind: ValueKind,
}

impl Rule {
    #[must_use]
    pub fn directive(key: impl Into<String>, policy: Policy, kind: ValueKind) -> Self {
        Self {
            matcher: Matcher::Directive(key.into()),
            policy,
            kind,
        }
    }

    #[must_use]
    pub fn port_pair(from: u16, protocol: Protocol, field: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::PortPair { from, protocol },
            policy: Policy::PortBind(field.into()),
            kind: ValueKind::Bare,
        }
    }

    /// Directive key for directive rules.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match &self.matcher {
            Matcher::Directive(k) => Some(k),
            Matcher::PortPair { .. } => None,
        }
    }

    /// The policy's verdict for this run, independent of line position.
    #[must_use]
    pub fn emission(&self, set: &ConfigurationSet) -> Emission {
        match &self.policy {
            Policy::ForceSet(v) => Emission::Value(v.clone()),
            Policy::SubstituteIfPresent(field) | Policy::PortBind(field) => {
                match set.value(field).trim() {
                    "" => Emission::Keep,
                    v => Emission::Value(v.to_string()),
                }
            }
            Policy::ConditionalGroup { gate, field } => {
                if set.is_enabled(gate) {
                    Emission::Value(set.value(field).trim().to_string())
                } else {
                    Emission::Drop
                }
            }
            Policy::DropAlways => Emission::Drop,
        }
    }
}

/// Verdict of a policy for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emission {
    /// The directive must be present with this value.
    Value(String),
    /// Leave whatever the artifact has.
    Keep,
    /// The directive must be absent.
    Drop,
}

/// Result of applying the rule table to one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    PassThrough,
    Replace(String),
    Omit,
}

/// A line claimed by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Hit<'a> {
    Directive(Directive<'a>),
    PortPair {
        prefix: &'a str,
        quote: &'a str,
        suffix: &'a str,
    },
}

/// Ordered rules for one artifact format. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    pub dialect: Dialect,
    pub rules: Vec<Rule>,
}

impl RuleTable {
    #[must_use]
    pub fn new(dialect: Dialect, rules: Vec<Rule>) -> Self {
        Self { dialect, rules }
    }

    /// Find the first rule claiming `line`.
    pub(crate) fn find<'a>(&self, line: &'a str) -> Option<(usize, Hit<'a>)> {
        let directive = self.dialect.parse(line);
        let pair = PORT_PAIR_RE.captures(line);
        self.rules.iter().enumerate().find_map(|(idx, rule)| {
            match (&rule.matcher, &directive, &pair) {
                (Matcher::Directive(key), Some(d), _) if d.key == key.as_str() => {
                    Some((idx, Hit::Directive(d.clone())))
                }
                (Matcher::PortPair { from, protocol }, _, Some(caps)) => {
                    let host = caps.name("host")?.as_str().parse::<u16>().ok()?;
                    let container = caps.name("container")?.as_str().parse::<u16>().ok()?;
                    let suffix = caps.name("proto").map_or("", |m| m.as_str());
                    let line_proto = if suffix == "/udp" {
                        Protocol::Udp
                    } else {
                        Protocol::Tcp
                    };
                    (host == *from && container == *from && line_proto == *protocol).then(|| {
                        (
                            idx,
                            Hit::PortPair {
                                prefix: caps.name("prefix").map_or("", |m| m.as_str()),
                                quote: caps.name("quote").map_or("", |m| m.as_str()),
                                suffix,
                            },
                        )
                    })
                }
                _ => None,
            }
        })
    }

    /// Apply the table to a single line, with no knowledge of the rest of the
    /// artifact. A commented directive is removed when its key must be
    /// absent and passes through otherwise.
    #[must_use]
    pub fn apply_line(&self, line: &str, set: &ConfigurationSet) -> LineOutcome {
        match self.find(line) {
            None => LineOutcome::PassThrough,
            Some((idx, Hit::Directive(d))) if d.commented => self.commented_outcome(idx, set),
            Some((idx, hit)) => self.outcome(idx, &hit, set),
        }
    }

    pub(crate) fn commented_outcome(&self, idx: usize, set: &ConfigurationSet) -> LineOutcome {
        match self.rules[idx].emission(set) {
            Emission::Drop => LineOutcome::Omit,
            Emission::Keep | Emission::Value(_) => LineOutcome::PassThrough,
        }
    }

    pub(crate) fn outcome(&self, idx: usize, hit: &Hit<'_>, set: &ConfigurationSet) -> LineOutcome {
        let rule = &self.rules[idx];
        match rule.emission(set) {
            Emission::Keep => LineOutcome::PassThrough,
            Emission::Drop => LineOutcome::Omit,
            Emission::Value(value) => LineOutcome::Replace(self.render_hit(rule, hit, &value)),
        }
    }

    fn render_hit(&self, rule: &Rule, hit: &Hit<'_>, value: &str) -> String {
        match hit {
            Hit::Directive(d) => self.dialect.render(d.prefix, d.key, value, rule.kind),
            Hit::PortPair {
                prefix,
                quote,
                suffix,
            } => format!("{prefix}{quote}{value}:{value}{suffix}{quote}"),
        }
    }
}
