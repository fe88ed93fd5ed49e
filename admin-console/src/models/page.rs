//! Pagination metadata for the admin user list.

use serde::{Deserialize, Serialize};

use super::user::SessionUser;

/// Pagination metadata exactly as the platform API reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
}

impl PageMeta {
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.last_page
    }

    /// Whether pagination controls should render at all.
    pub fn has_pages(&self) -> bool {
        self.total > 0 && self.last_page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Pages live in `[1, last_page]`; a request outside that window must
/// never reach the network. `known_last_page` is the bound as of the last
/// fetch; before any fetch only the lower bound applies.
pub fn page_in_bounds(page: u64, known_last_page: Option<u64>) -> bool {
    page >= 1 && known_last_page.map_or(true, |last| page <= last)
}

/// One page of the user list. Replaced wholesale on every fetch; never
/// merged incrementally.
#[derive(Debug, Clone, Deserialize)]
pub struct UserPage {
    pub data: Vec<SessionUser>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(current: u64, last: u64, total: u64) -> PageMeta {
        PageMeta {
            current_page: current,
            last_page: last,
            per_page: 15,
            total,
        }
    }

    #[test]
    fn page_zero_is_never_in_bounds() {
        assert!(!page_in_bounds(0, Some(5)));
        assert!(!page_in_bounds(0, None));
    }

    #[test]
    fn page_past_the_end_is_out_of_bounds() {
        assert!(!page_in_bounds(6, Some(5)));
        assert!(page_in_bounds(5, Some(5)));
        assert!(page_in_bounds(1, Some(5)));
    }

    #[test]
    fn unknown_bound_only_checks_the_floor() {
        assert!(page_in_bounds(12, None));
    }

    #[test]
    fn empty_result_hides_pagination() {
        let m = meta(1, 1, 0);
        assert!(m.is_empty());
        assert!(!m.has_pages());
    }

    #[test]
    fn single_page_hides_pagination() {
        assert!(!meta(1, 1, 10).has_pages());
        assert!(meta(1, 2, 20).has_pages());
    }

    #[test]
    fn previous_and_next_follow_bounds() {
        let first = meta(1, 3, 40);
        assert!(!first.has_previous());
        assert!(first.has_next());

        let last = meta(3, 3, 40);
        assert!(last.has_previous());
        assert!(!last.has_next());
    }
}
