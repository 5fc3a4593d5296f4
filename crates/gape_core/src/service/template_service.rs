//! Template catalogue provider.
//!
//! # Responsibility
//! - Load the active block templates in catalogue order.
//! - Degrade to an unavailable catalogue instead of failing the session.
//!
//! # Invariants
//! - Inactive templates never reach the catalogue.
//! - The catalogue hands out templates by reference; instantiation copies data.

use crate::model::block::BlockType;
use crate::model::template::BlockTemplate;
use crate::repo::error::RepoError;
use crate::repo::template_repo::TemplateRepository;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Why the catalogue could not be loaded.
#[derive(Debug)]
pub struct TemplateLoadError {
    source: RepoError,
}

impl TemplateLoadError {
    pub fn repo_error(&self) -> &RepoError {
        &self.source
    }
}

impl Display for TemplateLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "block templates unavailable: {}", self.source)
    }
}

impl Error for TemplateLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Loaded catalogue state.
#[derive(Debug)]
pub enum TemplateCatalog {
    /// Active templates sorted by `order_index`.
    Available(Vec<BlockTemplate>),
    /// Provider failed; inserting from templates is disabled, the layout
    /// stays editable.
    Unavailable(TemplateLoadError),
}

impl TemplateCatalog {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Templates offered for insertion; empty when unavailable.
    pub fn templates(&self) -> &[BlockTemplate] {
        match self {
            Self::Available(templates) => templates,
            Self::Unavailable(_) => &[],
        }
    }

    pub fn find(&self, block_type: BlockType) -> Option<&BlockTemplate> {
        self.templates()
            .iter()
            .find(|template| template.block_type == block_type)
    }

    pub fn error(&self) -> Option<&TemplateLoadError> {
        match self {
            Self::Available(_) => None,
            Self::Unavailable(err) => Some(err),
        }
    }
}

/// Use-case service over a template repository.
pub struct TemplateService<R: TemplateRepository> {
    repo: R,
}

impl<R: TemplateRepository> TemplateService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads the catalogue; never fails, see [`TemplateCatalog::Unavailable`].
    pub fn load(&self) -> TemplateCatalog {
        match self.repo.list_templates() {
            Ok(templates) => {
                let mut active: Vec<BlockTemplate> =
                    templates.into_iter().filter(|t| t.is_active).collect();
                active.sort_by_key(|template| template.order_index);
                info!(
                    "event=template_load module=template status=ok count={}",
                    active.len()
                );
                TemplateCatalog::Available(active)
            }
            Err(err) => {
                error!(
                    "event=template_load module=template status=error error_code=template_load_failed error={}",
                    err
                );
                TemplateCatalog::Unavailable(TemplateLoadError { source: err })
            }
        }
    }
}
