//! Vertical write position and page-break decisions.

use crate::model::PageGeometry;

/// Tracks the baseline of the next line on the current page.
///
/// Pages fill top-down: `y` starts at `height - margin` and decreases as
/// lines are placed. A break happens when placing a line would push the
/// cursor below the bottom margin.
#[derive(Debug, Clone)]
pub struct PageCursor {
    geometry: PageGeometry,
    page: usize,
    y: f32,
    /// Whether anything has been placed on the current page.
    dirty: bool,
}

impl PageCursor {
    /// Start at the top of the first page.
    pub fn new(geometry: PageGeometry) -> Self {
        Self {
            geometry,
            page: 0,
            y: geometry.top(),
            dirty: false,
        }
    }

    /// Zero-based index of the current page.
    pub fn page_index(&self) -> usize {
        self.page
    }

    /// Current baseline.
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Reserve room for one line of `line_height` and return where it goes.
    ///
    /// Returns `(page_index, y)`. If `y - line_height` would fall below the
    /// bottom margin, a new page is started first. The trailing `gap` is
    /// applied after placement and plays no part in the break check. A fresh
    /// page is never broken again, so a line taller than the content box
    /// still lands.
    pub fn advance(&mut self, line_height: f32, gap: f32) -> (usize, f32) {
        if self.y - line_height < self.geometry.margin && self.dirty_or_moved() {
            self.break_page();
        }
        let placed = (self.page, self.y);
        self.y -= line_height + gap;
        self.dirty = true;
        placed
    }

    /// Move down by `amount` without placing anything.
    ///
    /// Blank space never starts a page on its own; the next placed line
    /// performs the break check.
    pub fn skip(&mut self, amount: f32) {
        self.y -= amount;
    }

    /// Start a new page and reset to the top.
    pub fn break_page(&mut self) {
        self.page += 1;
        self.y = self.geometry.top();
        self.dirty = false;
        log::debug!("page break: now on page {}", self.page + 1);
    }

    /// Number of pages touched so far.
    pub fn pages_used(&self) -> usize {
        self.page + 1
    }

    fn dirty_or_moved(&self) -> bool {
        self.dirty || self.y < self.geometry.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> PageGeometry {
        // Content box is 100pt tall: y runs from 150 down to 50.
        PageGeometry::new(200.0, 200.0, 50.0)
    }

    #[test]
    fn test_starts_at_top() {
        let cursor = PageCursor::new(geometry());
        assert_eq!(cursor.page_index(), 0);
        assert_eq!(cursor.y(), 150.0);
    }

    #[test]
    fn test_advance_places_then_moves() {
        let mut cursor = PageCursor::new(geometry());
        assert_eq!(cursor.advance(20.0, 0.0), (0, 150.0));
        assert_eq!(cursor.advance(20.0, 0.0), (0, 130.0));
        assert_eq!(cursor.y(), 110.0);
    }

    #[test]
    fn test_advance_breaks_page() {
        let mut cursor = PageCursor::new(geometry());
        for expected in [150.0, 125.0, 100.0, 75.0] {
            assert_eq!(cursor.advance(25.0, 0.0), (0, expected));
        }
        // y is now 50; 50 - 25 < 50 so the next line goes to page 2.
        assert_eq!(cursor.advance(25.0, 0.0), (1, 150.0));
        assert_eq!(cursor.pages_used(), 2);
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        let mut cursor = PageCursor::new(geometry());
        assert_eq!(cursor.advance(100.0, 0.0), (0, 150.0));
        assert_eq!(cursor.y(), 50.0);
    }

    #[test]
    fn test_gap_ignored_by_break_check() {
        let mut cursor = PageCursor::new(geometry());
        cursor.skip(80.0);
        // 70 - 20 = 50 fits; the 5pt gap would not.
        assert_eq!(cursor.advance(20.0, 5.0), (0, 70.0));
        assert_eq!(cursor.y(), 45.0);
        assert_eq!(cursor.advance(20.0, 5.0), (1, 150.0));
    }

    #[test]
    fn test_skip_does_not_break() {
        let mut cursor = PageCursor::new(geometry());
        cursor.skip(95.0);
        assert_eq!(cursor.page_index(), 0);
        assert_eq!(cursor.advance(10.0, 0.0), (1, 150.0));
    }

    #[test]
    fn test_oversized_line_on_fresh_page() {
        let mut cursor = PageCursor::new(geometry());
        assert_eq!(cursor.advance(500.0, 0.0), (0, 150.0));
        assert_eq!(cursor.advance(10.0, 0.0), (1, 150.0));
    }
}
