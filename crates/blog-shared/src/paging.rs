//! Pager links rendered under every post listing.

/// Previous/next navigation for page `number` of `total_pages`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLinks {
    pub number: u64,
    pub total_pages: u64,
    pub previous: Option<u64>,
    pub next: Option<u64>,
}

impl PageLinks {
    pub fn new(number: u64, total_pages: u64) -> Self {
        Self {
            number,
            total_pages,
            previous: (number > 1).then(|| number - 1),
            next: (number < total_pages).then(|| number + 1),
        }
    }

    /// A single page needs no pager.
    pub fn is_paginated(&self) -> bool {
        self.total_pages > 1
    }

    pub fn href(page: u64) -> String {
        format!("?page={page}")
    }

    pub fn previous_href(&self) -> Option<String> {
        self.previous.map(Self::href)
    }

    pub fn next_href(&self) -> Option<String> {
        self.next.map(Self::href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_page_links_both_ways() {
        let links = PageLinks::new(2, 3);

        assert_eq!(links.previous, Some(1));
        assert_eq!(links.next, Some(3));
        assert!(links.is_paginated());
    }

    #[test]
    fn single_page_has_no_links() {
        let links = PageLinks::new(1, 1);

        assert_eq!(links.previous, None);
        assert_eq!(links.next, None);
        assert!(!links.is_paginated());
    }

    #[test]
    fn href_targets_query_string() {
        assert_eq!(PageLinks::href(4), "?page=4");
        assert_eq!(PageLinks::new(1, 2).next_href().as_deref(), Some("?page=2"));
        assert_eq!(PageLinks::new(1, 2).previous_href(), None);
    }
}
