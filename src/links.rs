//! Project links
//!
//! A project opts into the experimental workspace through an alias at
//! `<project>/.claude/skills`. The registry creates, removes and reports that
//! alias and refuses to touch anything it did not create unless the caller
//! confirms.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::LabConfig;
use crate::error::{LabError, Result};
use crate::platform::{AliasState, LinkAdapter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LinkOutcome {
    Created { link: PathBuf },
    AlreadyManaged { link: PathBuf },
    ConflictsWithForeignAlias { link: PathBuf, existing_target: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnlinkOutcome {
    Removed { link: PathBuf },
    NotLinked { link: PathBuf },
    ForeignAliasRequiresConfirmation { link: PathBuf, existing_target: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkStatus {
    Unlinked,
    LinkedToExperimental,
    LinkedElsewhere { target: PathBuf },
    /// A real file or directory sits where the link would go
    Occupied,
}

pub struct LinkRegistry<'a> {
    config: &'a LabConfig,
    links: &'a dyn LinkAdapter,
}

impl<'a> LinkRegistry<'a> {
    pub fn new(config: &'a LabConfig, links: &'a dyn LinkAdapter) -> Self {
        Self { config, links }
    }

    /// Where the link for `project` lives
    pub fn link_path(&self, project: &Path) -> PathBuf {
        project.join(&self.config.project_link)
    }

    fn classify(&self, project: &Path) -> Result<(PathBuf, AliasState)> {
        if !project.is_dir() {
            return Err(LabError::InvalidProjectPath {
                path: project.display().to_string(),
            });
        }
        let link = self.link_path(project);
        let state = self.links.classify(&link, &self.config.experimental_root)?;
        Ok((link, state))
    }

    /// Point `project` at the experimental workspace
    #[tracing::instrument(skip(self))]
    pub fn link(&self, project: &Path) -> Result<LinkOutcome> {
        let (link, state) = self.classify(project)?;
        let experimental = &self.config.experimental_root;
        match state {
            AliasState::Absent => {
                if !experimental.is_dir() {
                    return Err(LabError::WorkspaceMissing {
                        workspace: "Experimental".to_string(),
                        path: experimental.display().to_string(),
                    });
                }
                self.links.create_alias(&link, experimental)?;
                tracing::info!(link = %link.display(), adapter = self.links.name(), "linked project");
                Ok(LinkOutcome::Created { link })
            }
            AliasState::ManagedAlias { .. } => Ok(LinkOutcome::AlreadyManaged { link }),
            AliasState::ForeignAlias { target } => Ok(LinkOutcome::ConflictsWithForeignAlias {
                link,
                existing_target: target,
            }),
            AliasState::RealDirectory | AliasState::RealFile => Err(LabError::PathOccupied {
                path: link.display().to_string(),
            }),
        }
    }

    /// Remove the project's link
    ///
    /// A link to anywhere but experimental stays unless `confirm_foreign`.
    #[tracing::instrument(skip(self))]
    pub fn unlink(&self, project: &Path, confirm_foreign: bool) -> Result<UnlinkOutcome> {
        let (link, state) = self.classify(project)?;
        match state {
            AliasState::Absent | AliasState::RealDirectory | AliasState::RealFile => {
                Ok(UnlinkOutcome::NotLinked { link })
            }
            AliasState::ForeignAlias { target } if !confirm_foreign => {
                Ok(UnlinkOutcome::ForeignAliasRequiresConfirmation {
                    link,
                    existing_target: target,
                })
            }
            AliasState::ManagedAlias { .. } | AliasState::ForeignAlias { .. } => {
                self.links.remove_alias(&link)?;
                tracing::info!(link = %link.display(), "unlinked project");
                Ok(UnlinkOutcome::Removed { link })
            }
        }
    }

    pub fn status(&self, project: &Path) -> Result<LinkStatus> {
        let (_, state) = self.classify(project)?;
        Ok(match state {
            AliasState::Absent => LinkStatus::Unlinked,
            AliasState::ManagedAlias { .. } => LinkStatus::LinkedToExperimental,
            AliasState::ForeignAlias { target } => LinkStatus::LinkedElsewhere { target },
            AliasState::RealDirectory | AliasState::RealFile => LinkStatus::Occupied,
        })
    }
}
