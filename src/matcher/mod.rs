//! Match Engine
//!
//! Ranks packages against what a project is made of. Three rules each score
//! a package/extension pair or abstain:
//!
//! - direct: the extension's stem is part of the package name (0.9)
//! - semantic: the description uses vocabulary of the extension's technology
//!   family (0.7 to 0.8, more distinct terms score higher)
//! - ecosystem: a stack marker file sits next to the extension and the
//!   description names that stack (0.6 to 0.7)
//!
//! A package's confidence is its best score. Scoring is a pure function of
//! the inventory and the package list.

pub mod catalog;
pub mod inventory;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Serialize;

use crate::config::ScanConfig;
use crate::error::Result;
use crate::manifest::Package;

pub use inventory::{ProjectInventory, scan};

pub const DIRECT_CONFIDENCE: f64 = 0.9;
pub const THRESHOLD: f64 = 0.6;
/// Best confidence above this asks the user instead of suggesting
pub const PROMPT_ABOVE: f64 = 0.75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Direct,
    Semantic,
    Ecosystem,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub package: String,
    pub confidence: f64,
    pub rule: Rule,
    /// Every project extension at least one rule fired on, sorted
    pub matched_extensions: Vec<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    None,
    Suggest,
    Prompt,
}

impl Recommendation {
    fn classify(best: Option<f64>) -> Self {
        match best {
            None => Recommendation::None,
            Some(c) if c > PROMPT_ABOVE => Recommendation::Prompt,
            Some(_) => Recommendation::Suggest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub matches: Vec<Match>,
    pub recommendation: Recommendation,
    /// Project extensions no returned match covers
    pub unmatched_extensions: Vec<String>,
    pub project_extensions: BTreeMap<String, usize>,
}

/// One rule firing for one extension
struct Hit {
    confidence: f64,
    rule: Rule,
    extension: String,
    reason: String,
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Within-band score: one term sits at the floor and each extra term
/// closes half of the remaining distance to the ceiling.
fn banded(floor: f64, terms: usize) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let n = terms as f64;
    round3(floor + 0.1 * (1.0 - 1.0 / n))
}

fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether a package name mentions an extension stem
///
/// Stems of two or more characters match anywhere in the name. Single-letter
/// stems like `c` or `r` occur inside almost every name (`code-reviewer`
/// contains both), so they only count as a whole `-`/`_`/`.`/space separated
/// segment, e.g. `c` in `c-linter` but not in `docs`.
fn name_contains(name: &str, stem: &str) -> bool {
    if stem.chars().count() > 1 {
        return name.contains(stem);
    }
    name.split(['-', '_', '.', ' ']).any(|segment| segment == stem)
}

fn vocabulary_hits<'v>(vocabulary: &[&'v str], tokens: &BTreeSet<String>) -> Vec<&'v str> {
    vocabulary
        .iter()
        .copied()
        .filter(|term| tokens.contains(*term))
        .collect()
}

fn hits_for(inventory: &ProjectInventory, package: &Package) -> Vec<Hit> {
    let name = package.name.to_lowercase();
    let tokens = words(&package.description);
    let mut hits = Vec::new();

    for ext in inventory.extensions.keys() {
        let stem = ext.trim_start_matches('.');
        if stem.is_empty() {
            continue;
        }

        if name_contains(&name, stem) {
            hits.push(Hit {
                confidence: DIRECT_CONFIDENCE,
                rule: Rule::Direct,
                extension: ext.clone(),
                reason: format!("package name contains '{stem}'"),
            });
        }

        for family in catalog::families_for(ext) {
            let terms = vocabulary_hits(family.vocabulary, &tokens);
            if !terms.is_empty() {
                hits.push(Hit {
                    confidence: banded(0.7, terms.len()),
                    rule: Rule::Semantic,
                    extension: ext.clone(),
                    reason: format!(
                        "description mentions {} ({} files)",
                        terms.join(", "),
                        family.name
                    ),
                });
            }
        }

        for eco in catalog::ECOSYSTEMS {
            if !eco.extensions.contains(&ext.as_str()) {
                continue;
            }
            let Some(marker) = eco
                .markers
                .iter()
                .find(|m| inventory.markers.contains(**m))
            else {
                continue;
            };
            let terms = vocabulary_hits(eco.vocabulary, &tokens);
            if !terms.is_empty() {
                hits.push(Hit {
                    confidence: banded(0.6, terms.len()),
                    rule: Rule::Ecosystem,
                    extension: ext.clone(),
                    reason: format!(
                        "{marker} with {ext} files and description mentions {}",
                        terms.join(", ")
                    ),
                });
            }
        }
    }
    hits
}

fn score(inventory: &ProjectInventory, package: &Package) -> Option<Match> {
    let hits = hits_for(inventory, package);
    // first hit wins ties, so the rule order above decides
    let best = hits.iter().fold(None::<&Hit>, |best, hit| match best {
        Some(b) if b.confidence >= hit.confidence => Some(b),
        _ => Some(hit),
    })?;
    if best.confidence < THRESHOLD {
        return None;
    }
    let matched: BTreeSet<&str> = hits.iter().map(|h| h.extension.as_str()).collect();
    Some(Match {
        package: package.name.clone(),
        confidence: best.confidence,
        rule: best.rule,
        matched_extensions: matched.into_iter().map(str::to_string).collect(),
        reason: best.reason.clone(),
    })
}

/// Rank `packages` against an already scanned project
pub fn match_packages(inventory: &ProjectInventory, packages: &[Package]) -> MatchReport {
    let mut matches: Vec<Match> = packages
        .iter()
        .filter_map(|package| score(inventory, package))
        .collect();
    matches.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.package.cmp(&b.package))
    });

    let covered: BTreeSet<&str> = matches
        .iter()
        .flat_map(|m| m.matched_extensions.iter().map(String::as_str))
        .collect();
    let unmatched_extensions = inventory
        .extensions
        .keys()
        .filter(|ext| !covered.contains(ext.as_str()))
        .cloned()
        .collect();

    MatchReport {
        recommendation: Recommendation::classify(matches.first().map(|m| m.confidence)),
        matches,
        unmatched_extensions,
        project_extensions: inventory.extensions.clone(),
    }
}

/// Scan `project` and rank `packages` against it
pub fn match_project(
    project: &Path,
    packages: &[Package],
    scan_config: &ScanConfig,
) -> Result<MatchReport> {
    let inventory = scan(project, scan_config)?;
    Ok(match_packages(&inventory, packages))
}
