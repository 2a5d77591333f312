//! Dependency manifests (`requirements.txt`)
//!
//! Entries are `name[==version]` lines. Names compare case-insensitively with
//! `_` and `.` folded to `-`. Comments, blank lines and option lines are kept
//! verbatim when a manifest is rewritten.

use serde::Serialize;

/// A declared dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Name as written (extras included)
    pub name: String,
    /// Version specifier with whitespace removed, e.g. `==1.2` or `>=2,<3`
    pub spec: Option<String>,
    key: String,
}

impl Requirement {
    /// Parse one line; `None` for blanks, comments and option lines
    pub fn parse(line: &str) -> Option<Self> {
        let text = strip_comment(line).trim();
        if text.is_empty() || text.starts_with('-') {
            return None;
        }
        let split = text
            .find(|c: char| matches!(c, '<' | '>' | '=' | '!' | '~' | ';' | '@' | ' ' | '\t'))
            .unwrap_or(text.len());
        let name = text[..split].trim();
        if name.is_empty() {
            return None;
        }
        let spec: String = text[split..].chars().filter(|c| !c.is_whitespace()).collect();
        Some(Self {
            name: name.to_string(),
            spec: (!spec.is_empty()).then_some(spec),
            key: normalize_name(name),
        })
    }

    /// Normalized identity of this dependency
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Canonical comparison form of a dependency name
pub fn normalize_name(name: &str) -> String {
    let base = name.split('[').next().unwrap_or(name);
    base.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '_' || c == '.' { '-' } else { c })
        .collect()
}

fn strip_comment(line: &str) -> &str {
    if line.trim_start().starts_with('#') {
        return "";
    }
    match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Changed,
}

/// A dependency that needs installing in stable
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyChange {
    pub name: String,
    pub kind: ChangeKind,
    /// Specifier previously declared in stable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Specifier declared in experimental
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// Result of comparing two manifests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub changes: Vec<DependencyChange>,
    /// Stable's manifest text after applying `changes`
    pub content: String,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Bring `stable` in line with `experimental`
///
/// Entries missing from stable are appended in experimental's order; entries
/// whose specifier differs are replaced in place. Entries only stable declares
/// are left alone. When nothing differs, `content` equals `stable` exactly.
pub fn reconcile(stable: &str, experimental: &str) -> Reconciliation {
    let mut lines: Vec<String> = stable.lines().map(ToString::to_string).collect();
    let mut changes = Vec::new();
    let mut appended: Vec<String> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for raw in experimental.lines() {
        let Some(wanted) = Requirement::parse(raw) else {
            continue;
        };
        if seen.iter().any(|k| k == wanted.key()) {
            continue;
        }
        seen.push(wanted.key().to_string());

        let existing = lines.iter().enumerate().find_map(|(idx, line)| {
            Requirement::parse(line)
                .filter(|r| r.key() == wanted.key())
                .map(|r| (idx, r))
        });

        match existing {
            None => {
                appended.push(raw.trim().to_string());
                changes.push(DependencyChange {
                    name: wanted.name.clone(),
                    kind: ChangeKind::Added,
                    from: None,
                    to: wanted.spec.clone(),
                });
            }
            Some((idx, current)) if current.spec != wanted.spec => {
                lines[idx] = raw.trim().to_string();
                changes.push(DependencyChange {
                    name: wanted.name.clone(),
                    kind: ChangeKind::Changed,
                    from: current.spec,
                    to: wanted.spec.clone(),
                });
            }
            Some(_) => {}
        }
    }

    if changes.is_empty() {
        return Reconciliation {
            changes,
            content: stable.to_string(),
        };
    }

    lines.extend(appended);
    let mut content = lines.join("\n");
    content.push('\n');
    Reconciliation { changes, content }
}
