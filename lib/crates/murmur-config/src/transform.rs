//! Whole-artifact transformation.
//!
//! Two passes over the lines: the first finds, for each directive rule, the
//! line that owns the directive (first active line, else, in INI files, the
//! first commented line); the second streams every line through the rule
//! table. Commented lines of a key that must be absent are removed too. Directives
//! that must be present but own no line are inserted at the dialect's
//! insertion point.

use crate::error::ArtifactError;
use crate::field::ConfigurationSet;
use crate::rules::{Emission, Hit, LineOutcome, RuleTable};

/// Line terminator style of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    CrLf,
}

impl LineEnding {
    #[must_use]
    pub fn detect(content: &str) -> Self {
        if content.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Slots {
    active: Option<usize>,
    commented: Option<usize>,
}

impl RuleTable {
    /// Rewrite `content` according to the table.
    ///
    /// Unrecognized lines are copied through unchanged and in order. Each
    /// recognized key appears at most once in the result.
    pub fn transform(&self, content: &str, set: &ConfigurationSet) -> Result<String, ArtifactError> {
        let ending = LineEnding::detect(content);
        let trailing_newline = content.ends_with('\n');
        let lines: Vec<&str> = content.lines().collect();

        let mut slots = vec![Slots::default(); self.rules.len()];
        for (i, line) in lines.iter().enumerate() {
            if let Some((idx, Hit::Directive(d))) = self.find(line) {
                let slot = &mut slots[idx];
                if d.commented {
                    slot.commented.get_or_insert(i);
                } else {
                    slot.active.get_or_insert(i);
                }
            }
        }

        let mut out: Vec<String> = Vec::with_capacity(lines.len());
        let mut present = vec![false; self.rules.len()];
        let mut anchor = None;
        for (i, line) in lines.iter().enumerate() {
            let Some((idx, hit)) = self.find(line) else {
                out.push((*line).to_string());
                continue;
            };
            let (outcome, owns) = match &hit {
                Hit::PortPair { .. } => (self.outcome(idx, &hit, set), false),
                Hit::Directive(d) if !d.commented => {
                    let owns = slots[idx].active == Some(i);
                    let outcome = if owns {
                        self.outcome(idx, &hit, set)
                    } else {
                        LineOutcome::Omit
                    };
                    (outcome, owns)
                }
                Hit::Directive(_) => {
                    let owns = self.dialect.uncomments()
                        && slots[idx].active.is_none()
                        && slots[idx].commented == Some(i)
                        && matches!(self.rules[idx].emission(set), Emission::Value(_));
                    let outcome = if owns {
                        self.outcome(idx, &hit, set)
                    } else {
                        self.commented_outcome(idx, set)
                    };
                    (outcome, owns)
                }
            };
            present[idx] |= owns;
            match outcome {
                LineOutcome::PassThrough => out.push((*line).to_string()),
                LineOutcome::Replace(new) => out.push(new),
                LineOutcome::Omit => continue,
            }
            if owns {
                anchor = Some(out.len() - 1);
            }
        }

        let missing: Vec<(usize, String)> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(idx, rule)| !present[*idx] && rule.key().is_some())
            .filter_map(|(idx, rule)| match rule.emission(set) {
                Emission::Value(v) => Some((idx, v)),
                Emission::Keep | Emission::Drop => None,
            })
            .collect();

        if !missing.is_empty() {
            let (at, prefix) = self.dialect.insertion_point(&out, anchor)?;
            let inserted = missing.into_iter().filter_map(|(idx, value)| {
                let rule = &self.rules[idx];
                rule.key()
                    .map(|key| self.dialect.render(&prefix, key, &value, rule.kind))
            });
            out.splice(at..at, inserted);
        }

        let mut result = out.join(ending.as_str());
        if trailing_newline || (content.is_empty() && !result.is_empty()) {
            result.push_str(ending.as_str());
        }
        Ok(result)
    }
}
