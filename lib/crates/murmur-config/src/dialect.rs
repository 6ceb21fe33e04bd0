//! Line syntax of the two artifact formats.
//!
//! Neither format is parsed structurally. A line is either a directive this
//! module recognizes or opaque text the transformer copies through.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ArtifactError;

static COMPOSE_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r#"^(?P<comment>\s*#\s*)?(?P<prefix>\s*-\s+)"?(?P<key>[A-Za-z_][A-Za-z0-9_]*)=(?P<value>.*?)"?\s*$"#)
        .expect("valid regex")
});

static INI_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(
        r"^(?P<prefix>\s*)(?P<comment>[#;]\s*)?(?P<key>[A-Za-z][A-Za-z0-9_.]*)\s*=\s*(?P<value>.*?)\s*$",
    )
    .expect("valid regex")
});

static INI_SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^\s*\[[^\]]+\]\s*$").expect("valid regex")
});

/// Indentation used for compose list entries when none can be copied.
const COMPOSE_LIST_STEP: usize = 2;

/// How a value is written into the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Free text: quoted in INI files.
    Text,
    /// Numbers and addresses: written bare.
    Bare,
}

/// A recognized `key=value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    /// Everything before the key, minus any comment marker.
    pub prefix: &'a str,
    pub key: &'a str,
    pub value: &'a str,
    /// `#key=` / `;key=` in INI files, `# - KEY=` in compose files.
    pub commented: bool,
}

/// Artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Compose file with `      - KEY=VALUE` environment entries.
    Compose,
    /// Flat INI file with `key=value` and commented `#key=value` lines.
    Ini,
}

impl Dialect {
    /// Recognize a directive line, or `None` for opaque text.
    #[must_use]
    pub fn parse(self, line: &str) -> Option<Directive<'_>> {
        let re = match self {
            Self::Compose => &*COMPOSE_DIRECTIVE_RE,
            Self::Ini => &*INI_DIRECTIVE_RE,
        };
        let caps = re.captures(line)?;
        let get = |name: &str| caps.name(name).map_or("", |m| m.as_str());
        Some(Directive {
            prefix: get("prefix"),
            key: get("key"),
            value: get("value"),
            commented: caps.name("comment").is_some(),
        })
    }

    /// Whether a commented directive may be uncommented in place to carry a
    /// value. Commented compose entries are only ever removed.
    #[must_use]
    pub fn uncomments(self) -> bool {
        matches!(self, Self::Ini)
    }

    /// Render a directive line.
    #[must_use]
    pub fn render(self, prefix: &str, key: &str, value: &str, kind: ValueKind) -> String {
        match self {
            Self::Compose => {
                let value = value.replace('$', "$$");
                if needs_yaml_quotes(&value) {
                    format!("{prefix}\"{key}={}\"", escape_quoted(&value))
                } else {
                    format!("{prefix}{key}={value}")
                }
            }
            Self::Ini => match kind {
                ValueKind::Bare => format!("{prefix}{key}={value}"),
                ValueKind::Text => format!("{prefix}{key}=\"{}\"", escape_quoted(value)),
            },
        }
    }

    /// Where directives missing from the artifact are inserted, and the prefix
    /// they are rendered with.
    ///
    /// `hint` is the index of a line known to hold a recognized directive; in
    /// compose files it selects which `environment:` list receives inserts.
    pub fn insertion_point(
        self,
        lines: &[String],
        hint: Option<usize>,
    ) -> Result<(usize, String), ArtifactError> {
        match self {
            Self::Ini => Ok((ini_insertion_index(lines), String::new())),
            Self::Compose => compose_insertion_point(lines, hint)
                .ok_or(ArtifactError::MissingSection("environment")),
        }
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// A plain YAML scalar would be misread: `a: b` turns the entry into a map,
/// ` #` starts a comment.
fn needs_yaml_quotes(value: &str) -> bool {
    value.contains(": ")
        || value.ends_with(':')
        || value.contains(" #")
        || value.contains(['"', '\\', '\t'])
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// End of the global part of an INI file: before the first section header,
/// and before the blank lines that lead up to it.
fn ini_insertion_index(lines: &[String]) -> usize {
    let Some(header) = lines.iter().position(|l| INI_SECTION_RE.is_match(l)) else {
        return lines.len();
    };
    let mut idx = header;
    while idx > 0 && lines[idx - 1].trim().is_empty() {
        idx -= 1;
    }
    idx
}

/// Line after the last entry of the chosen `environment:` list.
fn compose_insertion_point(lines: &[String], hint: Option<usize>) -> Option<(usize, String)> {
    let blocks: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.trim() == "environment:")
        .map(|(i, _)| i)
        .collect();
    let start = hint
        .and_then(|h| blocks.iter().rev().copied().find(|&b| b < h))
        .or_else(|| blocks.first().copied())?;

    let base = indent_of(&lines[start]);
    let mut last_entry = None;
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        if line.trim().is_empty() {
            continue;
        }
        if indent_of(line) <= base {
            break;
        }
        if line.trim_start().starts_with('-') {
            last_entry = Some(i);
        }
    }

    Some(match last_entry {
        Some(i) => {
            let prefix = COMPOSE_DIRECTIVE_RE
                .captures(&lines[i])
                .and_then(|c| c.name("prefix"))
                .map_or_else(
                    || format!("{}- ", " ".repeat(indent_of(&lines[i]))),
                    |m| m.as_str().to_string(),
                );
            (i + 1, prefix)
        }
        None => (
            start + 1,
            format!("{}- ", " ".repeat(base + COMPOSE_LIST_STEP)),
        ),
    })
}
