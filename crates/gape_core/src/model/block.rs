//! Block domain model.
//!
//! # Responsibility
//! - Define the identified, typed content unit arranged by the layout engine.
//! - Provide the type tag catalogue and its stable wire names.
//!
//! # Invariants
//! - `BlockId` is stable for the block lifetime and never reused.
//! - `Block::block_type` and `Block::id` are immutable once constructed;
//!   only `data` may be replaced.
//! - `data` is opaque to the layout engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable block identifier.
///
/// Persisted ids are arbitrary strings; freshly generated ids are UUID v4.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Generates a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing id, e.g. one loaded from storage.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Size class shared by every block family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockSize {
    /// Large card.
    L,
    /// Medium card.
    M,
}

/// Content family of a block type, independent of its size class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFamily {
    Profile,
    Project,
    Education,
    Publication,
    Experience,
}

/// Type tag selecting rendering and form behavior.
///
/// Serialized as the stable names stored in `gape_blocks.type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    #[serde(rename = "InfoBlock_L")]
    ProfileL,
    #[serde(rename = "InfoBlock_M")]
    ProfileM,
    #[serde(rename = "ProjectBlock_L")]
    ProjectL,
    #[serde(rename = "ProjectBlock_M")]
    ProjectM,
    #[serde(rename = "EducationBlock_L")]
    EducationL,
    #[serde(rename = "EducationBlock_M")]
    EducationM,
    #[serde(rename = "PublicationBlock_L")]
    PublicationL,
    #[serde(rename = "PublicationBlock_M")]
    PublicationM,
    #[serde(rename = "ExperienceBlock_L")]
    ExperienceL,
    #[serde(rename = "ExperienceBlock_M")]
    ExperienceM,
}

impl BlockType {
    /// Every known type, in catalogue order.
    pub const ALL: [BlockType; 10] = [
        BlockType::ProfileL,
        BlockType::ProfileM,
        BlockType::ProjectL,
        BlockType::ProjectM,
        BlockType::EducationL,
        BlockType::EducationM,
        BlockType::PublicationL,
        BlockType::PublicationM,
        BlockType::ExperienceL,
        BlockType::ExperienceM,
    ];

    /// Stable storage/wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProfileL => "InfoBlock_L",
            Self::ProfileM => "InfoBlock_M",
            Self::ProjectL => "ProjectBlock_L",
            Self::ProjectM => "ProjectBlock_M",
            Self::EducationL => "EducationBlock_L",
            Self::EducationM => "EducationBlock_M",
            Self::PublicationL => "PublicationBlock_L",
            Self::PublicationM => "PublicationBlock_M",
            Self::ExperienceL => "ExperienceBlock_L",
            Self::ExperienceM => "ExperienceBlock_M",
        }
    }

    /// Parses a stable storage/wire name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|block_type| block_type.as_str() == value)
    }

    pub fn size(self) -> BlockSize {
        match self {
            Self::ProfileL
            | Self::ProjectL
            | Self::EducationL
            | Self::PublicationL
            | Self::ExperienceL => BlockSize::L,
            Self::ProfileM
            | Self::ProjectM
            | Self::EducationM
            | Self::PublicationM
            | Self::ExperienceM => BlockSize::M,
        }
    }

    pub fn family(self) -> BlockFamily {
        match self {
            Self::ProfileL | Self::ProfileM => BlockFamily::Profile,
            Self::ProjectL | Self::ProjectM => BlockFamily::Project,
            Self::EducationL | Self::EducationM => BlockFamily::Education,
            Self::PublicationL | Self::PublicationM => BlockFamily::Publication,
            Self::ExperienceL | Self::ExperienceM => BlockFamily::Experience,
        }
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field value in a block payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the text content, or `None` for list values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            Self::List(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Type-specific payload: field name to value.
///
/// Ordered so that serialized payloads are deterministic.
pub type BlockData = BTreeMap<String, FieldValue>;

/// Identified content unit placed in a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    id: BlockId,
    #[serde(rename = "type")]
    block_type: BlockType,
    /// Replaceable payload. Never inspected by the layout engine.
    pub data: BlockData,
}

impl Block {
    /// Creates a block with a generated id.
    pub fn new(block_type: BlockType, data: BlockData) -> Self {
        Self::with_id(BlockId::generate(), block_type, data)
    }

    /// Creates a block with a caller-provided id.
    ///
    /// Used by load paths where identity already exists in storage.
    pub fn with_id(id: BlockId, block_type: BlockType, data: BlockData) -> Self {
        Self {
            id,
            block_type,
            data,
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }
}
