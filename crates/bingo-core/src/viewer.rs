//! Viewer read path: pick a mode, resolve its options, build the board.

use crate::board::{generate_board, Board, Candidate};
use crate::models::{Mode, PageData};
use std::sync::Arc;

/// Flattens the mode's included, active option groups into their included,
/// active options, in inclusion order. Dangling ids are skipped and
/// duplicates across groups are kept.
pub fn resolve_options(page: &PageData, mode: &Mode) -> Vec<Candidate> {
    mode.option_groups
        .iter()
        .filter_map(|id| page.option_groups.get(id))
        .filter(|group| group.is_active())
        .flat_map(|group| group.options.iter())
        .filter_map(|id| page.options.get(id))
        .filter(|option| option.is_active())
        .map(|option| Candidate::from(option.as_ref()))
        .collect()
}

/// Modes a viewer may pick from, sorted by display name.
pub fn selectable_modes(page: &PageData) -> Vec<Arc<Mode>> {
    page.modes_by_name().into_iter().filter(|m| m.is_active()).collect()
}

/// The requested mode if it is selectable, otherwise the page default,
/// otherwise the first selectable mode by display name.
pub fn select_mode(page: &PageData, requested: Option<&str>) -> Option<Arc<Mode>> {
    let active = |id: &str| page.modes.get(id).filter(|m| m.is_active()).cloned();
    requested
        .and_then(active)
        .or_else(|| active(&page.default_mode))
        .or_else(|| selectable_modes(page).into_iter().next())
}

/// Everything the viewer page renders.
#[derive(Debug, Clone)]
pub struct ViewerBoard {
    pub title: String,
    pub mode: Option<Arc<Mode>>,
    pub modes: Vec<Arc<Mode>>,
    pub board: Board,
}

/// Builds the viewer's board for `seed`. A page without any selectable
/// mode gets a padded board with no free space, headed by the page root.
pub fn build_viewer(page: &PageData, requested_mode: Option<&str>, seed: &str, free_space_label: &str) -> ViewerBoard {
    let mode = select_mode(page, requested_mode);
    let (title, options, free_space) = match &mode {
        Some(m) => (
            m.heading().to_owned(),
            resolve_options(page, m),
            m.use_free_space.then_some(free_space_label),
        ),
        None => {
            log::warn!("page {} has no selectable mode", page.root);
            (page.root.clone(), Vec::new(), None)
        }
    };

    ViewerBoard {
        title,
        board: generate_board(&options, seed, free_space),
        modes: selectable_modes(page),
        mode,
    }
}
