use serde::Serialize;

/// Where a requested page falls in a listing of `total` items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageWindow {
    pub number: u32,
    pub num_pages: u32,
    pub per_page: u32,
    pub total: u64,
}

impl PageWindow {
    /// Resolves `?page=` the way the feeds accept it: absent means 1, `last`
    /// means the final page, anything else must be a number within range.
    /// Page 1 always exists, even for an empty listing.
    pub fn resolve(requested: Option<&str>, total: u64, per_page: u32) -> Option<PageWindow> {
        let per_page = per_page.max(1);
        let num_pages = total.div_ceil(u64::from(per_page)).max(1) as u32;

        let number = match requested.map(str::trim) {
            None | Some("") => 1,
            Some("last") => num_pages,
            Some(raw) => raw.parse::<u32>().ok()?,
        };

        if number == 0 || number > num_pages {
            return None;
        }
        Some(PageWindow { number, num_pages, per_page, total })
    }

    pub fn offset(&self) -> u32 {
        (self.number - 1) * self.per_page
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }
}

/// One page of a listing, ready for a template.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub number: u32,
    pub num_pages: u32,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: u32,
    pub next_page_number: u32,
}

impl<T: Serialize> Page<T> {
    pub fn new(window: &PageWindow, items: Vec<T>) -> Self {
        Page {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total: window.total,
            has_previous: window.has_previous(),
            has_next: window.has_next(),
            previous_page_number: window.number.saturating_sub(1).max(1),
            next_page_number: (window.number + 1).min(window.num_pages),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_still_has_a_first_page() {
        let window = PageWindow::resolve(None, 0, 10).unwrap();
        assert_eq!(window.num_pages, 1);
        assert_eq!(window.offset(), 0);
        assert!(PageWindow::resolve(Some("2"), 0, 10).is_none());
    }

    #[test]
    fn pages_split_on_per_page() {
        let window = PageWindow::resolve(Some("3"), 21, 10).unwrap();
        assert_eq!(window.num_pages, 3);
        assert_eq!(window.offset(), 20);
        assert!(window.has_previous());
        assert!(!window.has_next());
        assert_eq!(PageWindow::resolve(Some("last"), 21, 10).unwrap().number, 3);
    }

    #[test]
    fn out_of_range_or_garbage_is_rejected() {
        assert!(PageWindow::resolve(Some("0"), 21, 10).is_none());
        assert!(PageWindow::resolve(Some("4"), 21, 10).is_none());
        assert!(PageWindow::resolve(Some("two"), 21, 10).is_none());
    }
}
