use crate::api::types::Pagination;

pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_BUTTONS: u32 = 7;

/// Page bookkeeping for the robot listing. Totals always come from the
/// server's last answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaginationManager {
    current_page: u32,
    page_size: u32,
    total_pages: u32,
    total_count: u64,
}

impl Default for PaginationManager {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_pages: 0,
            total_count: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageControl {
    Previous { target: Option<u32> },
    Page { number: u32, active: bool },
    Ellipsis,
    Next { target: Option<u32> },
}

/// The contiguous run of numbered buttons around the current page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageWindow {
    pub start: u32,
    pub end: u32,
}

impl PageWindow {
    pub fn len(&self) -> u32 {
        if self.end < self.start {
            0
        } else {
            self.end - self.start + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= self.start && page <= self.end
    }
}

/// Window of at most `width` pages, centred on `current` where the ends allow.
pub fn page_window(current: u32, total_pages: u32, width: u32) -> PageWindow {
    // u64 so pages near u32::MAX cannot overflow
    let current = u64::from(current);
    let total_pages = u64::from(total_pages);
    let width = u64::from(width);
    let half = width / 2;
    let mut start = current.saturating_sub(half).max(1);
    let end = total_pages.min(start + width - 1);
    if end + 1 < start + width {
        start = (end + 1).saturating_sub(width).max(1);
    }
    // start <= max(current, 1) and end <= total_pages, so both fit in u32
    PageWindow {
        start: start as u32,
        end: end as u32,
    }
}

impl PaginationManager {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn update_pagination(&mut self, pagination: &Pagination) {
        self.total_pages = pagination.total_pages;
        self.total_count = pagination.total;
    }

    /// No clamping: callers only navigate to pages offered by [`Self::controls`].
    pub fn go_to_page(&mut self, page: u32) -> u32 {
        self.current_page = page;
        self.current_page
    }

    pub fn change_page_size(&mut self, page_size: u32) {
        self.page_size = page_size;
        self.current_page = 1;
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn window(&self) -> PageWindow {
        page_window(self.current_page, self.total_pages, MAX_PAGE_BUTTONS)
    }

    /// Empty when there is at most one page.
    pub fn controls(&self) -> Vec<PageControl> {
        if self.total_pages <= 1 {
            return Vec::new();
        }

        let window = self.window();
        let mut out = Vec::new();

        out.push(PageControl::Previous {
            target: (self.current_page > 1).then(|| self.current_page - 1),
        });

        if window.start > 1 {
            out.push(PageControl::Page {
                number: 1,
                active: false,
            });
            if window.start > 2 {
                out.push(PageControl::Ellipsis);
            }
        }

        for number in window.start..=window.end {
            out.push(PageControl::Page {
                number,
                active: number == self.current_page,
            });
        }

        if window.end < self.total_pages {
            if window.end + 1 < self.total_pages {
                out.push(PageControl::Ellipsis);
            }
            out.push(PageControl::Page {
                number: self.total_pages,
                active: false,
            });
        }

        out.push(PageControl::Next {
            target: (self.current_page < self.total_pages).then(|| self.current_page + 1),
        });

        out
    }

    pub fn render_controls(&self) -> String {
        let controls = self.controls();
        if controls.is_empty() {
            return String::new();
        }
        let buttons = controls
            .iter()
            .map(|c| match c {
                PageControl::Previous { target: Some(_) } => "< prev".to_string(),
                PageControl::Previous { target: None } => "  -   ".to_string(),
                PageControl::Page { number, active: true } => format!("[{number}]"),
                PageControl::Page { number, .. } => number.to_string(),
                PageControl::Ellipsis => "...".to_string(),
                PageControl::Next { target: Some(_) } => "next >".to_string(),
                PageControl::Next { target: None } => "  -   ".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        format!(
            "{buttons} | page size: {} | total: {} robots",
            self.page_size, self.total_count
        )
    }
}

pub fn is_valid_page_size(value: u32) -> bool {
    PAGE_SIZES.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager(current: u32, total_pages: u32) -> PaginationManager {
        let mut pm = PaginationManager::default();
        pm.update_pagination(&Pagination {
            total: u64::from(total_pages) * 20,
            total_pages,
        });
        pm.go_to_page(current);
        pm
    }

    fn numbered(controls: &[PageControl]) -> Vec<u32> {
        controls
            .iter()
            .filter_map(|c| match c {
                PageControl::Page { number, .. } => Some(*number),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn window_is_bounded_and_contains_current() {
        for total in 1..=30 {
            for current in 1..=total {
                let w = page_window(current, total, MAX_PAGE_BUTTONS);
                assert!(w.len() <= MAX_PAGE_BUTTONS, "current={current} total={total}");
                assert_eq!(w.len(), total.min(MAX_PAGE_BUTTONS));
                assert!(w.contains(current));
                assert!(w.start >= 1 && w.end <= total);
            }
        }
    }

    #[test]
    fn window_is_centered_away_from_edges() {
        assert_eq!(page_window(10, 20, 7), PageWindow { start: 7, end: 13 });
        assert_eq!(page_window(1, 20, 7), PageWindow { start: 1, end: 7 });
        assert_eq!(page_window(20, 20, 7), PageWindow { start: 14, end: 20 });
        assert_eq!(page_window(2, 3, 7), PageWindow { start: 1, end: 3 });
    }

    #[test]
    fn first_and_last_pages_appear_outside_window() {
        for total in 2..=25 {
            for current in 1..=total {
                let pm = manager(current, total);
                let w = pm.window();
                let controls = pm.controls();
                let pages = numbered(&controls);
                assert!(pages.contains(&1));
                assert!(pages.contains(&total));

                let ellipses = controls
                    .iter()
                    .filter(|c| matches!(c, PageControl::Ellipsis))
                    .count();
                let expected = usize::from(w.start > 2) + usize::from(w.end + 1 < total);
                assert_eq!(ellipses, expected, "current={current} total={total}");
            }
        }
    }

    #[test]
    fn controls_mark_active_page_and_nav_targets() {
        let pm = manager(5, 12);
        let controls = pm.controls();
        assert_eq!(
            controls.first(),
            Some(&PageControl::Previous { target: Some(4) })
        );
        assert_eq!(controls.last(), Some(&PageControl::Next { target: Some(6) }));
        assert!(controls.contains(&PageControl::Page {
            number: 5,
            active: true
        }));

        let last = manager(12, 12).controls();
        assert_eq!(last.last(), Some(&PageControl::Next { target: None }));
    }

    #[test]
    fn out_of_range_page_keeps_window_inside_totals() {
        let mut pm = PaginationManager::default();
        pm.update_pagination(&Pagination {
            total: 60,
            total_pages: 3,
        });
        pm.go_to_page(u32::MAX);

        assert_eq!(pm.window(), PageWindow { start: 1, end: 3 });
        let controls = pm.controls();
        assert_eq!(numbered(&controls), vec![1, 2, 3]);
        assert_eq!(
            controls.first(),
            Some(&PageControl::Previous {
                target: Some(u32::MAX - 1)
            })
        );
        assert_eq!(controls.last(), Some(&PageControl::Next { target: None }));
        assert_eq!(
            page_window(u32::MAX, u32::MAX, MAX_PAGE_BUTTONS),
            PageWindow {
                start: u32::MAX - 6,
                end: u32::MAX
            }
        );
    }

    #[test]
    fn single_page_has_no_controls() {
        assert!(manager(1, 1).controls().is_empty());
        assert!(manager(1, 0).controls().is_empty());
        assert_eq!(manager(1, 0).render_controls(), "");
    }

    #[test]
    fn change_page_size_resets_current_page() {
        for current in [1, 2, 7, 40] {
            let mut pm = manager(current, 50);
            pm.change_page_size(50);
            assert_eq!(pm.current_page(), 1);
            assert_eq!(pm.page_size(), 50);
        }
    }

    #[test]
    fn update_pagination_takes_server_totals() {
        let mut pm = PaginationManager::default();
        pm.update_pagination(&Pagination {
            total: 41,
            total_pages: 3,
        });
        assert_eq!(pm.total_pages(), 3);
        assert_eq!(pm.total_count(), 41);
        assert_eq!(pm.current_page(), 1);
    }

    #[test]
    fn render_controls_shows_ellipsis_and_totals() {
        let rendered = manager(10, 20).render_controls();
        assert_eq!(
            rendered,
            "< prev 1 ... 7 8 9 [10] 11 12 13 ... 20 next > | page size: 20 | total: 400 robots"
        );
    }
}
