//! # Board Generator
//!
//! Turns a list of candidate options and a seed string into a reproducible
//! 5x5 board. Generation never fails: a short pool is padded with numbered
//! filler labels.

use crate::models::BingoOption;
use crate::rng::SeededRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const GRID_SIZE: usize = 5;
pub const CELL_COUNT: usize = GRID_SIZE * GRID_SIZE;
/// Flat index of the grid centre (row 2, column 2).
pub const FREE_SPACE_INDEX: usize = 12;

/// A candidate cell: bare text, or text with a detail tooltip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Candidate {
    Plain(String),
    Tooltipped { text: String, tooltip: String },
}

impl Candidate {
    pub fn text(&self) -> &str {
        match self {
            Candidate::Plain(text) | Candidate::Tooltipped { text, .. } => text,
        }
    }

    /// The tooltip, if one is present and non-empty.
    pub fn tooltip(&self) -> Option<&str> {
        match self {
            Candidate::Tooltipped { tooltip, .. } if !tooltip.is_empty() => Some(tooltip),
            _ => None,
        }
    }

    fn into_cell(self) -> BingoCell {
        let tooltip = self.tooltip().map(str::to_owned);
        let content = match self {
            Candidate::Plain(text) | Candidate::Tooltipped { text, .. } => text,
        };
        BingoCell {
            marked: false,
            content,
            tooltip,
        }
    }
}

impl From<&str> for Candidate {
    fn from(text: &str) -> Self {
        Candidate::Plain(text.to_owned())
    }
}

impl From<String> for Candidate {
    fn from(text: String) -> Self {
        Candidate::Plain(text)
    }
}

impl From<&BingoOption> for Candidate {
    fn from(option: &BingoOption) -> Self {
        if option.tooltip.is_empty() {
            Candidate::Plain(option.display_name.clone())
        } else {
            Candidate::Tooltipped {
                text: option.display_name.clone(),
                tooltip: option.tooltip.clone(),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BingoCell {
    pub marked: bool,
    pub content: String,
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    pub cells: [BingoCell; GRID_SIZE],
}

/// A 5x5 board. Rows are shared between a board and the boards derived from
/// it by `toggle`, so untouched rows keep their identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Board {
    pub rows: [Arc<BoardRow>; GRID_SIZE],
}

impl Board {
    pub fn cell(&self, row: usize, col: usize) -> Option<&BingoCell> {
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    pub fn cells(&self) -> impl Iterator<Item = &BingoCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }

    pub fn has_tooltips(&self) -> bool {
        self.cells().any(|c| c.tooltip.is_some())
    }

    /// Returns a new board with cell (row, col) flipped. Only the affected
    /// row is rebuilt; an out-of-range position yields an unchanged copy.
    pub fn toggle(&self, row: usize, col: usize) -> Board {
        let mut next = self.clone();
        if row < GRID_SIZE && col < GRID_SIZE {
            let mut new_row = BoardRow::clone(&self.rows[row]);
            new_row.cells[col].marked = !new_row.cells[col].marked;
            next.rows[row] = Arc::new(new_row);
        }
        next
    }

    fn from_cells(cells: Vec<BingoCell>) -> Board {
        debug_assert_eq!(cells.len(), CELL_COUNT);
        let rows = std::array::from_fn(|r| {
            Arc::new(BoardRow {
                cells: std::array::from_fn(|c| cells[r * GRID_SIZE + c].clone()),
            })
        });
        Board { rows }
    }
}

/// Builds the board for `seed` from `options`.
///
/// With a free-space label, 24 shuffled options surround the label at the
/// centre; without one, all 25 cells come from the pool. Options with blank
/// text are not eligible.
pub fn generate_board(options: &[Candidate], seed: &str, free_space_label: Option<&str>) -> Board {
    let free_space = free_space_label.filter(|l| !l.trim().is_empty());
    let num_tiles = if free_space.is_some() { CELL_COUNT - 1 } else { CELL_COUNT };

    let mut pool: Vec<Candidate> = options
        .iter()
        .filter(|o| !o.text().trim().is_empty())
        .cloned()
        .collect();

    if pool.len() < num_tiles {
        log::warn!(
            "board for seed {:?} has {} eligible options, {} needed; padding with filler",
            seed,
            pool.len(),
            num_tiles
        );
        for n in pool.len() + 1..=num_tiles {
            pool.push(Candidate::Plain(n.to_string()));
        }
    }

    SeededRng::from_seed(seed).shuffle(&mut pool);
    pool.truncate(num_tiles);

    if let Some(label) = free_space {
        pool.insert(FREE_SPACE_INDEX, Candidate::Plain(label.to_owned()));
    }

    Board::from_cells(pool.into_iter().map(Candidate::into_cell).collect())
}
