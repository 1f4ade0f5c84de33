//! # Edit Operations
//!
//! Every operation takes the current page by reference and returns a new
//! page. The input is never modified: containers are cloned, and the one
//! entity being changed is replaced by a fresh `Arc`. Callers chain each
//! call from the page the previous call returned.
//!
//! Operations that name a missing entity return an unchanged copy.

use crate::board::Candidate;
use crate::ids::new_id;
use crate::models::{BingoOption, Collection, EntityRef, Mode, OptionGroup, PageData, Tier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_MODE_NAME: &str = "Default";
pub const DEFAULT_GROUP_NAME: &str = "Options";

/// Page-level fields to overwrite. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagePatch {
    pub root: Option<String>,
    pub tier: Option<Tier>,
    pub default_mode: Option<String>,
    pub external_link: Option<String>,
    pub external_link_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModePatch {
    pub title: Option<String>,
    pub display_name: Option<String>,
    pub use_free_space: Option<bool>,
    pub group_per_column: Option<bool>,
    pub disabled: Option<bool>,
    pub option_groups: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionGroupPatch {
    pub display_name: Option<String>,
    pub disabled: Option<bool>,
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptionPatch {
    pub display_name: Option<String>,
    pub tooltip: Option<String>,
    pub disabled: Option<bool>,
}

fn merge<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

impl PagePatch {
    fn apply(self, page: &mut PageData) {
        merge(&mut page.root, self.root);
        merge(&mut page.tier, self.tier);
        merge(&mut page.default_mode, self.default_mode);
        merge(&mut page.external_link, self.external_link);
        merge(&mut page.external_link_text, self.external_link_text);
    }
}

impl ModePatch {
    fn apply(self, mode: &mut Mode) {
        merge(&mut mode.title, self.title);
        merge(&mut mode.display_name, self.display_name);
        merge(&mut mode.use_free_space, self.use_free_space);
        merge(&mut mode.group_per_column, self.group_per_column);
        merge(&mut mode.disabled, self.disabled);
        merge(&mut mode.option_groups, self.option_groups);
    }
}

impl OptionGroupPatch {
    fn apply(self, group: &mut OptionGroup) {
        merge(&mut group.display_name, self.display_name);
        merge(&mut group.disabled, self.disabled);
        merge(&mut group.options, self.options);
    }
}

impl OptionPatch {
    fn apply(self, option: &mut BingoOption) {
        merge(&mut option.display_name, self.display_name);
        merge(&mut option.tooltip, self.tooltip);
        merge(&mut option.disabled, self.disabled);
    }
}

/// How bulk-import text is split into options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ImportFormat {
    /// `a, b, c`
    #[default]
    Plain,
    /// `a, tooltip for a, b, tooltip for b`
    WithTooltips,
}

/// Shallow clone: new containers holding the same entity references.
pub fn copy_page(page: &PageData) -> PageData {
    page.clone()
}

/// Replaces entity `id` in `collection` with an edited copy.
/// Returns false when the id is unknown.
fn replace_entity<T: Clone>(collection: &mut Collection<T>, id: &str, edit: impl FnOnce(&mut T)) -> bool {
    let Some(current) = collection.get(id) else {
        return false;
    };
    let mut next = T::clone(current);
    edit(&mut next);
    collection.insert(id.to_owned(), Arc::new(next));
    true
}

fn toggle_membership(list: &mut Vec<String>, id: &str) {
    match list.iter().position(|member| member == id) {
        Some(index) => {
            list.remove(index);
        }
        None => list.push(id.to_owned()),
    }
}

/// A fresh page with one default mode that includes one empty option group.
/// A page URL: non-empty, and only `a-z`, `0-9`, `_` or `-` once lower-cased.
pub fn is_valid_root(root: &str) -> bool {
    !root.is_empty()
        && root
            .to_lowercase()
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

pub fn new_page(owner: &str, root: &str) -> PageData {
    let page = PageData {
        owner: owner.to_owned(),
        root: root.to_owned(),
        tier: Tier::default(),
        default_mode: String::new(),
        external_link: String::new(),
        external_link_text: String::new(),
        modes: Collection::new(),
        option_groups: Collection::new(),
        options: Collection::new(),
    };
    let (page, mode) = new_mode(&page, DEFAULT_MODE_NAME);
    let (page, _) = new_option_group(&page, DEFAULT_GROUP_NAME, Some(&mode.id));
    edit_page(
        &page,
        PagePatch {
            default_mode: Some(mode.id.clone()),
            ..PagePatch::default()
        },
    )
}

pub fn new_mode(page: &PageData, name: &str) -> (PageData, Arc<Mode>) {
    let mut next = copy_page(page);
    let mode = Arc::new(Mode {
        id: new_id(),
        title: String::new(),
        display_name: name.to_owned(),
        use_free_space: true,
        group_per_column: false,
        disabled: false,
        deleted: false,
        option_groups: Vec::new(),
    });
    next.modes.insert(mode.id.clone(), Arc::clone(&mode));
    (next, mode)
}

/// Creates an option group, registering it with `parent_mode` when given.
pub fn new_option_group(page: &PageData, name: &str, parent_mode: Option<&str>) -> (PageData, Arc<OptionGroup>) {
    let mut next = copy_page(page);
    let group = Arc::new(OptionGroup {
        id: new_id(),
        display_name: name.to_owned(),
        disabled: false,
        deleted: false,
        options: Vec::new(),
    });
    next.option_groups.insert(group.id.clone(), Arc::clone(&group));

    if let Some(mode_id) = parent_mode {
        if !replace_entity(&mut next.modes, mode_id, |m| m.option_groups.push(group.id.clone())) {
            log::warn!("new option group {}: parent mode {} not found", group.id, mode_id);
        }
    }
    (next, group)
}

/// Creates an option, registering it with `parent_group` when given.
pub fn new_option(
    page: &PageData,
    name: &str,
    tooltip: Option<&str>,
    parent_group: Option<&str>,
) -> (PageData, Arc<BingoOption>) {
    let mut next = copy_page(page);
    let option = insert_option(&mut next, name, tooltip.unwrap_or_default(), parent_group);
    (next, option)
}

fn insert_option(page: &mut PageData, name: &str, tooltip: &str, parent_group: Option<&str>) -> Arc<BingoOption> {
    let option = Arc::new(BingoOption {
        id: new_id(),
        display_name: name.to_owned(),
        tooltip: tooltip.to_owned(),
        disabled: false,
        deleted: false,
    });
    page.options.insert(option.id.clone(), Arc::clone(&option));

    if let Some(group_id) = parent_group {
        if !replace_entity(&mut page.option_groups, group_id, |g| g.options.push(option.id.clone())) {
            log::warn!("new option {}: parent group {} not found", option.id, group_id);
        }
    }
    option
}

pub fn edit_page(page: &PageData, patch: PagePatch) -> PageData {
    let mut next = copy_page(page);
    patch.apply(&mut next);
    next
}

pub fn edit_mode(page: &PageData, id: &str, patch: ModePatch) -> PageData {
    let mut next = copy_page(page);
    if !replace_entity(&mut next.modes, id, |m| patch.apply(m)) {
        log::warn!("edit skipped: mode {} not found", id);
    }
    next
}

pub fn edit_option_group(page: &PageData, id: &str, patch: OptionGroupPatch) -> PageData {
    let mut next = copy_page(page);
    if !replace_entity(&mut next.option_groups, id, |g| patch.apply(g)) {
        log::warn!("edit skipped: option group {} not found", id);
    }
    next
}

pub fn edit_option(page: &PageData, id: &str, patch: OptionPatch) -> PageData {
    let mut next = copy_page(page);
    if !replace_entity(&mut next.options, id, |o| patch.apply(o)) {
        log::warn!("edit skipped: option {} not found", id);
    }
    next
}

/// Flips the soft-delete flag of `target`.
pub fn toggle_deletion(page: &PageData, target: &EntityRef) -> PageData {
    let mut next = copy_page(page);
    let found = match target {
        EntityRef::Mode(id) => replace_entity(&mut next.modes, id, |m| m.deleted = !m.deleted),
        EntityRef::OptionGroup(id) => replace_entity(&mut next.option_groups, id, |g| g.deleted = !g.deleted),
        EntityRef::Option(id) => replace_entity(&mut next.options, id, |o| o.deleted = !o.deleted),
    };
    if !found {
        log::warn!("toggle deletion skipped: {} {} not found", target.kind(), target.id());
    }
    next
}

/// Whether flipping the delete flag of `target` keeps the page usable:
/// restoring is always allowed, but the last remaining mode or option group
/// may not be deleted.
pub fn can_toggle_deletion(page: &PageData, target: &EntityRef) -> bool {
    match page.is_deleted(target) {
        None => false,
        Some(true) => true,
        Some(false) => match target {
            EntityRef::Mode(_) => page.modes.values().filter(|m| !m.deleted).count() > 1,
            EntityRef::OptionGroup(_) => page.option_groups.values().filter(|g| !g.deleted).count() > 1,
            EntityRef::Option(_) => true,
        },
    }
}

/// Adds `group_id` to the mode's included groups, or removes it if present.
pub fn toggle_group_included(page: &PageData, mode_id: &str, group_id: &str) -> PageData {
    let mut next = copy_page(page);
    if !replace_entity(&mut next.modes, mode_id, |m| toggle_membership(&mut m.option_groups, group_id)) {
        log::warn!("toggle inclusion skipped: mode {} not found", mode_id);
    }
    next
}

/// Adds `option_id` to the group's included options, or removes it if present.
pub fn toggle_option_included(page: &PageData, group_id: &str, option_id: &str) -> PageData {
    let mut next = copy_page(page);
    if !replace_entity(&mut next.option_groups, group_id, |g| {
        toggle_membership(&mut g.options, option_id)
    }) {
        log::warn!("toggle inclusion skipped: option group {} not found", group_id);
    }
    next
}

/// Number of modes that include the group.
pub fn group_usage(page: &PageData, group_id: &str) -> usize {
    page.modes
        .values()
        .filter(|m| m.option_groups.iter().any(|id| id == group_id))
        .count()
}

/// Number of option groups that include the option.
pub fn option_usage(page: &PageData, option_id: &str) -> usize {
    page.option_groups
        .values()
        .filter(|g| g.options.iter().any(|id| id == option_id))
        .count()
}

/// Splits import text into candidates. Tokens are trimmed and blank ones
/// skipped; in tooltip format a trailing text without a tooltip gets none.
pub fn parse_import(text: &str, format: ImportFormat) -> Vec<Candidate> {
    match format {
        ImportFormat::Plain => text
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(Candidate::from)
            .collect(),
        ImportFormat::WithTooltips => {
            let flattened: String = text.chars().filter(|c| *c != '\r' && *c != '\n').collect();
            let tokens: Vec<&str> = flattened.split(',').map(str::trim).collect();
            tokens
                .chunks(2)
                .filter(|pair| !pair[0].is_empty())
                .map(|pair| Candidate::Tooltipped {
                    text: pair[0].to_owned(),
                    tooltip: pair.get(1).copied().unwrap_or_default().to_owned(),
                })
                .collect()
        }
    }
}

/// Creates one option per imported item, registering each with
/// `target_group` when given. Returns the new page and the created options
/// in import order.
pub fn import_options(
    page: &PageData,
    text: &str,
    format: ImportFormat,
    target_group: Option<&str>,
) -> (PageData, Vec<Arc<BingoOption>>) {
    let mut next = copy_page(page);
    let created = parse_import(text, format)
        .iter()
        .map(|c| insert_option(&mut next, c.text(), c.tooltip().unwrap_or_default(), target_group))
        .collect();
    (next, created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PageData {
        let page = new_page("lydlbutton", "lydlbutton");
        let group = page.option_groups.keys().next().unwrap().clone();
        let (page, _) = new_option(&page, "Kill Leader", Some("announced on screen"), Some(&group));
        let (page, _) = new_option(&page, "Respawn", None, Some(&group));
        page
    }

    fn group_id(page: &PageData) -> String {
        page.option_groups.keys().next().unwrap().clone()
    }

    #[test]
    fn test_new_page_shape() {
        let page = new_page("owner", "Root");
        assert_eq!(page.modes.len(), 1);
        assert_eq!(page.option_groups.len(), 1);
        let mode = &page.modes[&page.default_mode];
        assert_eq!(mode.display_name, DEFAULT_MODE_NAME);
        assert_eq!(mode.option_groups, vec![group_id(&page)]);
        assert!(mode.use_free_space);
        assert!(!mode.group_per_column);
    }

    #[test]
    fn test_copy_page_shares_entities() {
        let page = sample();
        let copy = copy_page(&page);
        assert_eq!(copy, page);
        for (id, option) in &page.options {
            assert!(Arc::ptr_eq(option, &copy.options[id]));
        }
    }

    #[test]
    fn test_edit_mode_is_copy_on_write() {
        let page = sample();
        let snapshot = page.clone();
        let mode_id = page.default_mode.clone();

        let edited = edit_mode(
            &page,
            &mode_id,
            ModePatch {
                title: Some("lydlbutton stream bingo".into()),
                ..ModePatch::default()
            },
        );

        assert_eq!(page, snapshot);
        assert_eq!(edited.modes[&mode_id].title, "lydlbutton stream bingo");
        assert_eq!(edited.modes[&mode_id].display_name, DEFAULT_MODE_NAME);
        assert!(!Arc::ptr_eq(&page.modes[&mode_id], &edited.modes[&mode_id]));
        assert_eq!(edited.options, page.options);
    }

    #[test]
    fn test_every_operation_leaves_input_untouched() {
        let page = sample();
        let snapshot = page.clone();
        let mode = page.default_mode.clone();
        let gid = group_id(&page);
        let option = page.options.keys().next().unwrap().clone();

        let operations: Vec<(&str, Box<dyn Fn(&PageData) -> PageData + '_>)> = vec![
            ("new_mode", Box::new(|p: &PageData| new_mode(p, "Valorant").0)),
            ("new_option_group", Box::new(|p: &PageData| new_option_group(p, "Pie", Some(&mode)).0)),
            ("new_option", Box::new(|p: &PageData| new_option(p, "Top 3", Some("tip"), Some(&gid)).0)),
            (
                "edit_page",
                Box::new(|p: &PageData| {
                    edit_page(
                        p,
                        PagePatch {
                            root: Some("coco".into()),
                            tier: Some(Tier::Partner),
                            ..PagePatch::default()
                        },
                    )
                }),
            ),
            (
                "edit_mode",
                Box::new(|p: &PageData| {
                    edit_mode(
                        p,
                        &mode,
                        ModePatch {
                            use_free_space: Some(false),
                            ..ModePatch::default()
                        },
                    )
                }),
            ),
            (
                "edit_option_group",
                Box::new(|p: &PageData| {
                    edit_option_group(
                        p,
                        &gid,
                        OptionGroupPatch {
                            disabled: Some(true),
                            ..OptionGroupPatch::default()
                        },
                    )
                }),
            ),
            (
                "edit_option",
                Box::new(|p: &PageData| {
                    edit_option(
                        p,
                        &option,
                        OptionPatch {
                            tooltip: Some("changed".into()),
                            ..OptionPatch::default()
                        },
                    )
                }),
            ),
            ("toggle_deletion", Box::new(|p: &PageData| toggle_deletion(p, &EntityRef::Option(option.clone())))),
            ("toggle_group_included", Box::new(|p: &PageData| toggle_group_included(p, &mode, &gid))),
            ("toggle_option_included", Box::new(|p: &PageData| toggle_option_included(p, &gid, &option))),
            (
                "import_options",
                Box::new(|p: &PageData| import_options(p, "Tech Issues, Respawn", ImportFormat::Plain, Some(&gid)).0),
            ),
        ];

        for (name, operation) in &operations {
            let next = operation(&page);
            assert_eq!(page, snapshot, "{name} changed its input");
            assert_ne!(next, snapshot, "{name} produced no change");
        }
    }

    #[test]
    fn test_edit_option_and_group() {
        let page = sample();
        let option_id = page.options.values().find(|o| o.display_name == "Respawn").unwrap().id.clone();
        let gid = group_id(&page);

        let page2 = edit_option(
            &page,
            &option_id,
            OptionPatch {
                tooltip: Some("someone on the team is respawned".into()),
                ..OptionPatch::default()
            },
        );
        let page3 = edit_option_group(
            &page2,
            &gid,
            OptionGroupPatch {
                disabled: Some(true),
                ..OptionGroupPatch::default()
            },
        );

        assert_eq!(page.options[&option_id].tooltip, "");
        assert_eq!(page3.options[&option_id].tooltip, "someone on the team is respawned");
        assert!(page3.option_groups[&gid].disabled);
        assert!(!page2.option_groups[&gid].disabled);
    }

    #[test]
    fn test_edit_page_fields() {
        let page = sample();
        let edited = edit_page(
            &page,
            PagePatch {
                external_link: Some("https://my-rules.com".into()),
                external_link_text: Some("Rules & Glossary".into()),
                ..PagePatch::default()
            },
        );
        assert_eq!(edited.external_link, "https://my-rules.com");
        assert_eq!(edited.root, page.root);
        assert_eq!(page.external_link, "");
    }

    #[test]
    fn test_edit_missing_entity_is_noop() {
        let page = sample();
        assert_eq!(edit_mode(&page, "missing", ModePatch::default()), page);
        assert_eq!(edit_option(&page, "missing", OptionPatch::default()), page);
        assert_eq!(toggle_deletion(&page, &EntityRef::OptionGroup("missing".into())), page);
    }

    #[test]
    fn test_toggle_deletion_round_trip() {
        let page = sample();
        let option_id = page.options.keys().next().unwrap().clone();
        let target = EntityRef::Option(option_id.clone());

        let deleted = toggle_deletion(&page, &target);
        assert!(deleted.options[&option_id].deleted);
        assert!(!page.options[&option_id].deleted);

        let restored = toggle_deletion(&deleted, &target);
        assert_eq!(restored, page);
    }

    #[test]
    fn test_last_mode_cannot_be_deleted() {
        let page = sample();
        let only = EntityRef::Mode(page.default_mode.clone());
        assert!(!can_toggle_deletion(&page, &only));

        let (page, second) = new_mode(&page, "Coco");
        assert!(can_toggle_deletion(&page, &only));
        let page = toggle_deletion(&page, &only);
        assert!(!can_toggle_deletion(&page, &EntityRef::Mode(second.id.clone())));
        assert!(can_toggle_deletion(&page, &only));
    }

    #[test]
    fn test_toggle_group_included_twice_restores() {
        let page = sample();
        let mode_id = page.default_mode.clone();
        let (page, extra) = new_option_group(&page, "Coco", None);
        let before = page.modes[&mode_id].option_groups.clone();

        let once = toggle_group_included(&page, &mode_id, &extra.id);
        assert_eq!(once.modes[&mode_id].option_groups.last(), Some(&extra.id));
        let twice = toggle_group_included(&once, &mode_id, &extra.id);
        assert_eq!(twice.modes[&mode_id].option_groups, before);
    }

    #[test]
    fn test_toggle_option_included_removes_existing() {
        let page = sample();
        let gid = group_id(&page);
        let first = page.option_groups[&gid].options[0].clone();

        let removed = toggle_option_included(&page, &gid, &first);
        assert!(!removed.option_groups[&gid].options.contains(&first));
        let back = toggle_option_included(&removed, &gid, &first);
        assert_eq!(back.option_groups[&gid].options.iter().filter(|id| **id == first).count(), 1);
    }

    #[test]
    fn test_new_option_group_registers_with_mode() {
        let page = sample();
        let mode_id = page.default_mode.clone();
        let (next, group) = new_option_group(&page, "Pie", Some(&mode_id));
        assert!(next.modes[&mode_id].option_groups.contains(&group.id));
        assert!(!page.option_groups.contains_key(&group.id));
    }

    #[test]
    fn test_usage_counts() {
        let page = sample();
        let gid = group_id(&page);
        let (page, second) = new_mode(&page, "Coco");
        assert_eq!(group_usage(&page, &gid), 1);
        let page = toggle_group_included(&page, &second.id, &gid);
        assert_eq!(group_usage(&page, &gid), 2);

        let option_id = page.option_groups[&gid].options[0].clone();
        assert_eq!(option_usage(&page, &option_id), 1);
        let (page, other) = new_option_group(&page, "Other", None);
        let page = toggle_option_included(&page, &other.id, &option_id);
        assert_eq!(option_usage(&page, &option_id), 2);
        assert_eq!(option_usage(&page, "nobody"), 0);
    }

    #[test]
    fn test_parse_import_plain() {
        let parsed = parse_import("APEX WIN, APEX LAST,, Top 3 ", ImportFormat::Plain);
        assert_eq!(
            parsed,
            vec![Candidate::from("APEX WIN"), Candidate::from("APEX LAST"), Candidate::from("Top 3")]
        );
    }

    #[test]
    fn test_parse_import_with_tooltips() {
        let parsed = parse_import(
            "Top 3,get to top 3 situation,\r\nRespawn,someone is respawned,Orphan",
            ImportFormat::WithTooltips,
        );
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[0].text(), "Top 3");
        assert_eq!(parsed[0].tooltip(), Some("get to top 3 situation"));
        assert_eq!(parsed[1].tooltip(), Some("someone is respawned"));
        assert_eq!(parsed[2].text(), "Orphan");
        assert_eq!(parsed[2].tooltip(), None);
    }

    #[test]
    fn test_import_options_into_group() {
        let page = sample();
        let gid = group_id(&page);
        let before = page.option_groups[&gid].options.len();

        let (next, created) = import_options(&page, "a, b, c", ImportFormat::Plain, Some(&gid));

        assert_eq!(created.len(), 3);
        assert_eq!(next.options.len(), page.options.len() + 3);
        let included = &next.option_groups[&gid].options;
        assert_eq!(included.len(), before + 3);
        assert_eq!(included[before..], created.iter().map(|o| o.id.clone()).collect::<Vec<_>>()[..]);
        assert_eq!(page.option_groups[&gid].options.len(), before);
    }
}
