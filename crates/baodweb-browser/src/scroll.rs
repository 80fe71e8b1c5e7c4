//! Viewport and scroll offset management.
//!
//! Offsets count render lines. The offset is kept within
//! `0 ..= max(0, total_lines - viewport_height)` after every change.

/// Fraction of the viewport one `page_down` moves.
pub const SCROLL_PAGE_FRACTION: f32 = 0.9;

/// Scroll state for the page region between the bars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    /// First visible render line.
    offset: usize,
    /// Number of render lines in the current page.
    total_lines: usize,
    /// Visible rows.
    height: usize,
}

impl Viewport {
    pub fn new(height: usize) -> Self {
        Self {
            offset: 0,
            total_lines: 0,
            height,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.offset = self.offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.offset = self.offset.saturating_add(lines);
        self.clamp();
    }

    /// Scroll down by one page.
    pub fn page_down(&mut self) {
        self.scroll_down(self.page_amount());
    }

    /// Scroll up by one page.
    pub fn page_up(&mut self) {
        self.scroll_up(self.page_amount());
    }

    /// Scroll to an absolute line.
    pub fn scroll_to(&mut self, line: usize) {
        self.offset = line;
        self.clamp();
    }

    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max_scroll();
    }

    /// Update the line count (after layout).
    pub fn set_total_lines(&mut self, total: usize) {
        self.total_lines = total;
        self.clamp();
    }

    /// Update the visible height (after a terminal resize).
    pub fn set_height(&mut self, height: usize) {
        self.height = height;
        self.clamp();
    }

    /// Largest valid offset.
    pub fn max_scroll(&self) -> usize {
        self.total_lines.saturating_sub(self.height)
    }

    /// Index range of the visible render lines.
    pub fn visible(&self) -> std::ops::Range<usize> {
        let end = (self.offset + self.height).min(self.total_lines);
        self.offset.min(end)..end
    }

    pub fn at_top(&self) -> bool {
        self.offset == 0
    }

    pub fn at_bottom(&self) -> bool {
        self.offset >= self.max_scroll()
    }

    fn page_amount(&self) -> usize {
        ((self.height as f32 * SCROLL_PAGE_FRACTION) as usize).max(1)
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_scroll());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(total: usize, height: usize) -> Viewport {
        let mut v = Viewport::new(height);
        v.set_total_lines(total);
        v
    }

    #[test]
    fn starts_at_top() {
        let v = viewport(100, 20);
        assert!(v.at_top());
        assert_eq!(v.visible(), 0..20);
    }

    #[test]
    fn scroll_down_clamps_at_bottom() {
        let mut v = viewport(100, 20);
        v.scroll_down(500);
        assert_eq!(v.offset(), 80);
        assert!(v.at_bottom());
        assert_eq!(v.visible(), 80..100);
    }

    #[test]
    fn scroll_up_saturates() {
        let mut v = viewport(100, 20);
        v.scroll_down(5);
        v.scroll_up(50);
        assert_eq!(v.offset(), 0);
    }

    #[test]
    fn short_page_cannot_scroll() {
        let mut v = viewport(5, 20);
        v.scroll_down(3);
        assert_eq!(v.offset(), 0);
        assert_eq!(v.visible(), 0..5);
    }

    #[test]
    fn shrinking_content_reclamps() {
        let mut v = viewport(100, 20);
        v.scroll_to_bottom();
        v.set_total_lines(30);
        assert_eq!(v.offset(), 10);
    }

    #[test]
    fn growing_viewport_reclamps() {
        let mut v = viewport(50, 10);
        v.scroll_to(40);
        v.set_height(45);
        assert_eq!(v.offset(), 5);
    }

    #[test]
    fn page_moves_most_of_a_screen() {
        let mut v = viewport(100, 20);
        v.page_down();
        assert_eq!(v.offset(), 18);
        v.page_up();
        assert_eq!(v.offset(), 0);
    }

    #[test]
    fn zero_height_viewport() {
        let mut v = viewport(10, 0);
        v.scroll_down(3);
        assert_eq!(v.offset(), 3);
        assert!(v.visible().is_empty());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Down(usize),
            Up(usize),
            To(usize),
            Total(usize),
            Height(usize),
            Bottom,
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0usize..200).prop_map(Op::Down),
                (0usize..200).prop_map(Op::Up),
                (0usize..400).prop_map(Op::To),
                (0usize..300).prop_map(Op::Total),
                (0usize..80).prop_map(Op::Height),
                Just(Op::Bottom),
            ]
        }

        proptest! {
            #[test]
            fn offset_stays_in_range(ops in proptest::collection::vec(arb_op(), 0..40)) {
                let mut v = Viewport::new(24);
                for op in ops {
                    match op {
                        Op::Down(n) => v.scroll_down(n),
                        Op::Up(n) => v.scroll_up(n),
                        Op::To(n) => v.scroll_to(n),
                        Op::Total(n) => v.set_total_lines(n),
                        Op::Height(n) => v.set_height(n),
                        Op::Bottom => v.scroll_to_bottom(),
                    }
                    prop_assert!(v.offset() <= v.total_lines().saturating_sub(v.height()));
                }
            }
        }
    }
}
