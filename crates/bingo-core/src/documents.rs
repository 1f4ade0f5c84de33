//! # Page Persistence
//!
//! Maps a `PageData` tree onto the document store: one root document per
//! page under `pages/{owner}`, and three sub-collections `modes`,
//! `optionGroups` and `options` keyed by entity id.
//!
//! The `deleted` flag is never written. A deleted entity is removed from its
//! collection instead.

use crate::models::{BingoOption, Collection, Mode, OptionGroup, PageData, Tier};
use crate::traits::DocumentStore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub const PAGES: &str = "pages";
pub const MODES: &str = "modes";
pub const OPTION_GROUPS: &str = "optionGroups";
pub const OPTIONS: &str = "options";

pub fn sub_collection(owner: &str, name: &str) -> String {
    format!("{PAGES}/{owner}/{name}")
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageDoc {
    pub root: String,
    pub tier: Tier,
    pub default_mode: String,
    pub external_link: String,
    pub external_link_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModeDoc {
    pub display_name: String,
    pub title: String,
    pub use_free_space: bool,
    pub group_per_column: bool,
    pub disabled: bool,
    pub option_groups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionGroupDoc {
    pub display_name: String,
    pub disabled: bool,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionDoc {
    pub display_name: String,
    pub tooltip: String,
    pub disabled: bool,
}

impl From<&PageData> for PageDoc {
    fn from(page: &PageData) -> Self {
        PageDoc {
            root: page.root.to_lowercase(),
            tier: page.tier,
            default_mode: page.default_mode.clone(),
            external_link: page.external_link.clone(),
            external_link_text: page.external_link_text.clone(),
        }
    }
}

impl From<&Mode> for ModeDoc {
    fn from(mode: &Mode) -> Self {
        ModeDoc {
            display_name: mode.display_name.clone(),
            title: mode.title.clone(),
            use_free_space: mode.use_free_space,
            group_per_column: mode.group_per_column,
            disabled: mode.disabled,
            option_groups: mode.option_groups.clone(),
        }
    }
}

impl ModeDoc {
    fn into_mode(self, id: String) -> Mode {
        Mode {
            id,
            title: self.title,
            display_name: self.display_name,
            use_free_space: self.use_free_space,
            group_per_column: self.group_per_column,
            disabled: self.disabled,
            deleted: false,
            option_groups: self.option_groups,
        }
    }
}

impl From<&OptionGroup> for OptionGroupDoc {
    fn from(group: &OptionGroup) -> Self {
        OptionGroupDoc {
            display_name: group.display_name.clone(),
            disabled: group.disabled,
            options: group.options.clone(),
        }
    }
}

impl OptionGroupDoc {
    fn into_group(self, id: String) -> OptionGroup {
        OptionGroup {
            id,
            display_name: self.display_name,
            disabled: self.disabled,
            deleted: false,
            options: self.options,
        }
    }
}

impl From<&BingoOption> for OptionDoc {
    fn from(option: &BingoOption) -> Self {
        OptionDoc {
            display_name: option.display_name.clone(),
            tooltip: option.tooltip.clone(),
            disabled: option.disabled,
        }
    }
}

impl OptionDoc {
    fn into_option(self, id: String) -> BingoOption {
        BingoOption {
            id,
            display_name: self.display_name,
            tooltip: self.tooltip,
            disabled: self.disabled,
            deleted: false,
        }
    }
}

/// Reads and writes whole page trees through a `DocumentStore`.
#[derive(Clone)]
pub struct PageRepo {
    store: Arc<dyn DocumentStore>,
}

impl PageRepo {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Loads the page owned by `owner`, or `None` if it does not exist yet.
    pub async fn get_page(&self, owner: &str) -> anyhow::Result<Option<PageData>> {
        match self.store.get(PAGES, owner).await? {
            Some(doc) => Ok(Some(self.load_tree(owner.to_owned(), serde_json::from_value(doc)?).await?)),
            None => {
                log::info!("attempted to retrieve non-existent page {}", owner);
                Ok(None)
            }
        }
    }

    /// Loads the page whose URL slug is `root` (case-insensitive).
    pub async fn find_by_root(&self, root: &str) -> anyhow::Result<Option<PageData>> {
        let slug = Value::String(root.to_lowercase());
        let mut matches = self.store.find_by_field(PAGES, "root", &slug).await?;
        if matches.len() > 1 {
            log::warn!("{} pages share root {:?}; using the first", matches.len(), root);
        }
        if matches.is_empty() {
            return Ok(None);
        }
        let (owner, doc) = matches.swap_remove(0);
        Ok(Some(self.load_tree(owner, serde_json::from_value(doc)?).await?))
    }

    /// Writes the page document, then upserts or removes every entity.
    /// There is no transaction: a failure part way leaves earlier writes in
    /// place, and the last writer wins.
    pub async fn write_page(&self, page: &PageData) -> anyhow::Result<()> {
        let owner = page.owner.as_str();
        self.store
            .set(PAGES, owner, serde_json::to_value(PageDoc::from(page))?)
            .await?;

        let modes = sub_collection(owner, MODES);
        for mode in page.modes.values() {
            self.write_entity(&modes, &mode.id, mode.deleted, || ModeDoc::from(mode.as_ref()))
                .await?;
        }

        let groups = sub_collection(owner, OPTION_GROUPS);
        for group in page.option_groups.values() {
            self.write_entity(&groups, &group.id, group.deleted, || OptionGroupDoc::from(group.as_ref()))
                .await?;
        }

        let options = sub_collection(owner, OPTIONS);
        for option in page.options.values() {
            self.write_entity(&options, &option.id, option.deleted, || OptionDoc::from(option.as_ref()))
                .await?;
        }

        log::info!(
            "saved page {} ({} modes, {} groups, {} options)",
            owner,
            page.modes.len(),
            page.option_groups.len(),
            page.options.len()
        );
        Ok(())
    }

    async fn write_entity<D: Serialize>(
        &self,
        collection: &str,
        id: &str,
        deleted: bool,
        doc: impl FnOnce() -> D,
    ) -> anyhow::Result<()> {
        if deleted {
            self.store.delete(collection, id).await
        } else {
            self.store.set(collection, id, serde_json::to_value(doc())?).await
        }
    }

    async fn load_tree(&self, owner: String, doc: PageDoc) -> anyhow::Result<PageData> {
        let modes = self
            .load_collection(&sub_collection(&owner, MODES), ModeDoc::into_mode)
            .await?;
        let option_groups = self
            .load_collection(&sub_collection(&owner, OPTION_GROUPS), OptionGroupDoc::into_group)
            .await?;
        let options = self
            .load_collection(&sub_collection(&owner, OPTIONS), OptionDoc::into_option)
            .await?;

        Ok(PageData {
            owner,
            root: doc.root,
            tier: doc.tier,
            default_mode: doc.default_mode,
            external_link: doc.external_link,
            external_link_text: doc.external_link_text,
            modes,
            option_groups,
            options,
        })
    }

    async fn load_collection<D, T>(&self, collection: &str, build: fn(D, String) -> T) -> anyhow::Result<Collection<T>>
    where
        D: DeserializeOwned,
    {
        let mut entities = Collection::new();
        for (id, doc) in self.store.list(collection).await? {
            match serde_json::from_value::<D>(doc) {
                Ok(doc) => {
                    entities.insert(id.clone(), Arc::new(build(doc, id)));
                }
                Err(err) => log::warn!("skipping malformed document {}/{}: {}", collection, id, err),
            }
        }
        Ok(entities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit;
    use crate::models::EntityRef;
    use crate::traits::MockDocumentStore;
    use serde_json::json;

    #[test]
    fn test_page_doc_lowercases_root() {
        let page = edit::new_page("LydlButton", "LydlButton");
        let doc = serde_json::to_value(PageDoc::from(&page)).unwrap();
        assert_eq!(doc["root"], "lydlbutton");
        assert!(doc.get("owner").is_none());
        assert!(doc.get("modes").is_none());
    }

    #[test]
    fn test_entity_docs_omit_deleted() {
        let page = edit::new_page("o", "o");
        let mode = page.modes.values().next().unwrap();
        let doc = serde_json::to_value(ModeDoc::from(mode.as_ref())).unwrap();
        assert!(doc.get("deleted").is_none());
        assert_eq!(doc["useFreeSpace"], true);
        assert_eq!(doc["groupPerColumn"], false);
        assert_eq!(doc["optionGroups"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_docs_tolerate_missing_fields() {
        let doc: OptionGroupDoc = serde_json::from_value(json!({ "displayName": "Pie" })).unwrap();
        assert_eq!(doc.display_name, "Pie");
        assert!(!doc.disabled);
        assert!(doc.options.is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_page_is_none() {
        let mut store = MockDocumentStore::new();
        store
            .expect_get()
            .withf(|c, id| c == PAGES && id == "nobody")
            .times(1)
            .returning(|_, _| Ok(None));

        let repo = PageRepo::new(Arc::new(store));
        assert!(repo.get_page("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_root_loads_tree() {
        let mut store = MockDocumentStore::new();
        store
            .expect_find_by_field()
            .withf(|c, f, v| c == PAGES && f == "root" && *v == json!("lydlbutton"))
            .returning(|_, _, _| Ok(vec![("lydlbutton".into(), json!({ "root": "lydlbutton", "defaultMode": "m1" }))]));
        store.expect_list().returning(|collection| {
            Ok(match collection {
                "pages/lydlbutton/modes" => vec![(
                    "m1".into(),
                    json!({ "displayName": "Default", "title": "t", "useFreeSpace": true, "optionGroups": ["g1"] }),
                )],
                "pages/lydlbutton/optionGroups" => vec![("g1".into(), json!({ "displayName": "G", "options": ["o1"] }))],
                "pages/lydlbutton/options" => vec![
                    ("o1".into(), json!({ "displayName": "APEX WIN", "tooltip": "they get a win" })),
                    ("bad".into(), json!("not an object")),
                ],
                _ => Vec::new(),
            })
        });

        let repo = PageRepo::new(Arc::new(store));
        let page = repo.find_by_root("LydlButton").await.unwrap().unwrap();

        assert_eq!(page.owner, "lydlbutton");
        assert_eq!(page.modes["m1"].option_groups, vec!["g1".to_string()]);
        assert_eq!(page.options.len(), 1);
        assert_eq!(page.options["o1"].tooltip, "they get a win");
        assert!(!page.options["o1"].deleted);
    }

    #[tokio::test]
    async fn test_write_page_deletes_flagged_entities() {
        let page = edit::new_page("lydlbutton", "LydlButton");
        let (page, doomed) = edit::new_option(&page, "Tech Issues", None, None);
        let (page, kept) = edit::new_option(&page, "Top 3", None, None);
        let page = edit::toggle_deletion(&page, &EntityRef::Option(doomed.id.clone()));

        let mut store = MockDocumentStore::new();
        let doomed_id = doomed.id.clone();
        store
            .expect_delete()
            .withf(move |c, id| c == "pages/lydlbutton/options" && id == doomed_id)
            .times(1)
            .returning(|_, _| Ok(()));
        let kept_id = kept.id.clone();
        store
            .expect_set()
            .withf(move |c, id, _| c == "pages/lydlbutton/options" && id == kept_id)
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_set()
            .withf(|c, id, doc| c == PAGES && id == "lydlbutton" && doc["root"] == "lydlbutton")
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_set()
            .withf(|c, _, _| c == "pages/lydlbutton/modes" || c == "pages/lydlbutton/optionGroups")
            .times(2)
            .returning(|_, _, _| Ok(()));

        let repo = PageRepo::new(Arc::new(store));
        repo.write_page(&page).await.unwrap();
    }
}
