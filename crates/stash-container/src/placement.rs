//! Free-area queries and the row-major free-position search.
//!
//! These are pure functions over an entry map so the container can run
//! them under its lock and tests can run them without one. The search is
//! a brute-force scan over every candidate origin, O(grid area × entries)
//! per call. Callers rely on its result being the *first* free origin in
//! row-major order (top-to-bottom, then left-to-right), so any faster
//! index must reproduce exactly that choice.

use stash_core::{Rect, Vec2i};

use crate::entry::Entries;

/// The whole grid as a rectangle anchored at `(0, 0)`.
pub(crate) fn grid_rect(grid: Vec2i) -> Rect {
    Rect::new(Vec2i::ZERO, grid)
}

/// `true` iff `rect` is non-empty, inside the grid, and overlaps no
/// non-excluded entry.
pub(crate) fn area_free(entries: &Entries, grid: Vec2i, rect: &Rect) -> bool {
    if rect.is_empty() || !grid_rect(grid).contains_rect(rect) {
        return false;
    }
    entries
        .values()
        .filter(|e| !e.is_excluded())
        .all(|e| !e.rect().overlaps(rect))
}

/// Every origin at which a `size` rectangle lies inside the grid, in
/// row-major order.
pub(crate) fn candidate_origins(grid: Vec2i, size: Vec2i) -> impl Iterator<Item = Vec2i> {
    let last = if size.is_positive() {
        grid - size
    } else {
        Vec2i::new(-1, -1)
    };
    (0..=last.y).flat_map(move |y| (0..=last.x).map(move |x| Vec2i::new(x, y)))
}

/// First origin, in row-major order, where a `size` rectangle is free.
pub(crate) fn first_free(entries: &Entries, grid: Vec2i, size: Vec2i) -> Option<Vec2i> {
    candidate_origins(grid, size).find(|&origin| area_free(entries, grid, &Rect::new(origin, size)))
}

/// Cells not covered by any entry.
pub(crate) fn free_cells(entries: &Entries, grid: Vec2i) -> u64 {
    let used: u64 = entries.values().map(|e| e.item().size.area()).sum();
    grid.area().saturating_sub(used)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::StoredEntry;
    use stash_core::{CategoryId, Item, ItemId};

    fn place(entries: &mut Entries, id: u64, x: i32, y: i32, w: i32, h: i32) {
        let item = Item::new(ItemId(id), Vec2i::new(w, h), CategoryId(0));
        entries.insert(item.id, StoredEntry::new(item, Vec2i::new(x, y)));
    }

    // ── Candidate enumeration ───────────────────────────────────

    #[test]
    fn candidates_are_row_major() {
        let got: Vec<Vec2i> = candidate_origins(Vec2i::new(3, 2), Vec2i::new(2, 1)).collect();
        assert_eq!(
            got,
            vec![
                Vec2i::new(0, 0),
                Vec2i::new(1, 0),
                Vec2i::new(0, 1),
                Vec2i::new(1, 1),
            ]
        );
    }

    #[test]
    fn oversized_item_has_no_candidates() {
        assert_eq!(candidate_origins(Vec2i::new(2, 2), Vec2i::new(3, 1)).count(), 0);
        assert_eq!(candidate_origins(Vec2i::new(0, 0), Vec2i::ONE).count(), 0);
    }

    #[test]
    fn empty_size_has_no_candidates() {
        assert_eq!(candidate_origins(Vec2i::new(4, 4), Vec2i::new(0, 2)).count(), 0);
    }

    // ── Free-area checks ────────────────────────────────────────

    #[test]
    fn out_of_bounds_is_never_free() {
        let entries = Entries::new();
        let grid = Vec2i::new(4, 4);
        assert!(area_free(&entries, grid, &Rect::from_xywh(0, 0, 4, 4)));
        assert!(!area_free(&entries, grid, &Rect::from_xywh(-1, 0, 1, 1)));
        assert!(!area_free(&entries, grid, &Rect::from_xywh(3, 3, 2, 1)));
        assert!(!area_free(&entries, grid, &Rect::from_xywh(0, 0, 0, 1)));
    }

    #[test]
    fn occupied_cells_are_not_free() {
        let mut entries = Entries::new();
        place(&mut entries, 1, 1, 1, 2, 2);
        let grid = Vec2i::new(4, 4);
        assert!(!area_free(&entries, grid, &Rect::from_xywh(2, 2, 1, 1)));
        assert!(area_free(&entries, grid, &Rect::from_xywh(3, 0, 1, 4)));
    }

    #[test]
    fn excluded_entries_are_ignored() {
        let mut entries = Entries::new();
        place(&mut entries, 1, 0, 0, 2, 2);
        entries[0].set_excluded(true);
        assert!(area_free(&entries, Vec2i::new(2, 2), &Rect::from_xywh(0, 0, 2, 2)));
    }

    // ── Search ──────────────────────────────────────────────────

    #[test]
    fn first_free_skips_occupied_prefix() {
        let mut entries = Entries::new();
        place(&mut entries, 1, 0, 0, 1, 1);
        place(&mut entries, 2, 1, 0, 1, 1);
        let grid = Vec2i::new(3, 3);
        assert_eq!(first_free(&entries, grid, Vec2i::ONE), Some(Vec2i::new(2, 0)));
        assert_eq!(first_free(&entries, grid, Vec2i::new(2, 1)), Some(Vec2i::new(0, 1)));
        assert_eq!(first_free(&entries, grid, Vec2i::new(3, 3)), None);
    }

    #[test]
    fn free_cells_counts_uncovered_area() {
        let mut entries = Entries::new();
        place(&mut entries, 1, 0, 0, 2, 2);
        place(&mut entries, 2, 2, 0, 1, 3);
        assert_eq!(free_cells(&entries, Vec2i::new(3, 3)), 2);
    }
}
