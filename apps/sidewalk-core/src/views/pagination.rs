use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub has_previous: bool,
    pub has_next: bool,
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    total_items.div_ceil(page_size.max(1))
}

/// Clamps a requested 1-based page into `[1, total_pages]`. An empty list
/// still reports page 1.
pub fn clamp_page(requested: i64, total_pages: usize) -> usize {
    let last = total_pages.max(1) as i64;
    requested.clamp(1, last) as usize
}

pub fn paginate<T: Clone>(items: &[T], page_size: usize, requested_page: i64) -> Page<T> {
    let page_size = page_size.max(1);
    let total_pages = total_pages(items.len(), page_size);
    let page = clamp_page(requested_page, total_pages);
    let start = ((page - 1) * page_size).min(items.len());
    let end = (start + page_size).min(items.len());
    Page {
        items: items[start..end].to_vec(),
        page,
        page_size,
        total_pages,
        total_items: items.len(),
        has_previous: page > 1,
        has_next: page < total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<u32> {
        (1..=26).collect()
    }

    #[test]
    fn twenty_six_items_make_six_pages() {
        let page = paginate(&items(), 5, 1);
        assert_eq!(page.total_pages, 6);
        assert_eq!(page.items, vec![1, 2, 3, 4, 5]);
        assert!(!page.has_previous);
        assert!(page.has_next);
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let page = paginate(&items(), 5, 6);
        assert_eq!(page.items, vec![26]);
        assert!(page.has_previous);
        assert!(!page.has_next);
    }

    #[test]
    fn out_of_range_pages_clamp() {
        assert_eq!(paginate(&items(), 5, 0).page, 1);
        assert_eq!(paginate(&items(), 5, -3).page, 1);
        let page = paginate(&items(), 5, 7);
        assert_eq!(page.page, 6);
        assert_eq!(page.items, vec![26]);
    }

    #[test]
    fn empty_list_reports_first_page() {
        let page = paginate::<u32>(&[], 5, 3);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 0);
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }
}
