//! # Domain Models
//!
//! A Page owns three flat, id-keyed collections: Modes, Option Groups and
//! Options. Modes and Option Groups reference their children by id through
//! ordered inclusion lists.
//!
//! Entities are held behind `Arc` so that cloning a page produces new
//! containers that still share every untouched entity. Edits replace the
//! `Arc` of the one entity they change and never mutate through it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// An id-keyed entity collection.
pub type Collection<T> = BTreeMap<String, Arc<T>>;

/// Plan level of a page. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Supporter,
    Partner,
    /// Also the fallback for tiers this build does not know.
    #[default]
    #[serde(other)]
    Free,
}

/// A streamer's configured bingo site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    /// Display name of the owning account; also the page's storage key.
    pub owner: String,
    /// The URL slug (e.g., "lydlbutton" for /lydlbutton)
    pub root: String,
    pub tier: Tier,
    pub default_mode: String,
    pub external_link: String,
    pub external_link_text: String,
    pub modes: Collection<Mode>,
    pub option_groups: Collection<OptionGroup>,
    pub options: Collection<BingoOption>,
}

/// A named board variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mode {
    pub id: String,
    /// Board heading shown to viewers
    pub title: String,
    /// Admin-facing label
    pub display_name: String,
    pub use_free_space: bool,
    /// Stored and round-tripped; the generator does not read it.
    pub group_per_column: bool,
    pub disabled: bool,
    #[serde(default)]
    pub deleted: bool,
    /// Included Option Group ids, in board order.
    pub option_groups: Vec<String>,
}

/// A reusable bundle of Options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionGroup {
    pub id: String,
    pub display_name: String,
    pub disabled: bool,
    #[serde(default)]
    pub deleted: bool,
    /// Included Option ids, in board order.
    pub options: Vec<String>,
}

/// A single candidate bingo cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BingoOption {
    pub id: String,
    pub display_name: String,
    pub tooltip: String,
    pub disabled: bool,
    #[serde(default)]
    pub deleted: bool,
}

impl Mode {
    /// Present and enabled.
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.deleted
    }

    /// Heading for the viewer; the admin label stands in for an empty title.
    pub fn heading(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.display_name
        } else {
            &self.title
        }
    }
}

impl OptionGroup {
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.deleted
    }
}

impl BingoOption {
    pub fn is_active(&self) -> bool {
        !self.disabled && !self.deleted
    }
}

/// Addresses one entity of a page, for operations that work on any kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum EntityRef {
    Mode(String),
    OptionGroup(String),
    Option(String),
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Mode(id) | EntityRef::OptionGroup(id) | EntityRef::Option(id) => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EntityRef::Mode(_) => "mode",
            EntityRef::OptionGroup(_) => "option group",
            EntityRef::Option(_) => "option",
        }
    }
}

impl PageData {
    /// Whether the referenced entity exists and is flagged for deletion.
    pub fn is_deleted(&self, target: &EntityRef) -> Option<bool> {
        match target {
            EntityRef::Mode(id) => self.modes.get(id).map(|m| m.deleted),
            EntityRef::OptionGroup(id) => self.option_groups.get(id).map(|g| g.deleted),
            EntityRef::Option(id) => self.options.get(id).map(|o| o.deleted),
        }
    }

    /// Modes sorted by display name, the order the manage listing uses.
    pub fn modes_by_name(&self) -> Vec<Arc<Mode>> {
        let mut modes: Vec<_> = self.modes.values().cloned().collect();
        modes.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        modes
    }

    pub fn option_groups_by_name(&self) -> Vec<Arc<OptionGroup>> {
        let mut groups: Vec<_> = self.option_groups.values().cloned().collect();
        groups.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        groups
    }

    /// The page with every `deleted` entity removed, as it looks after a save.
    pub fn without_deleted(&self) -> PageData {
        let mut next = self.clone();
        next.modes.retain(|_, m| !m.deleted);
        next.option_groups.retain(|_, g| !g.deleted);
        next.options.retain(|_, o| !o.deleted);
        next
    }
}
