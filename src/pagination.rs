//! Total-count estimation from GitHub's pagination links.
//!
//! GitHub does not report a total for list endpoints. The `rel="last"` entry of the
//! `Link` header names the highest reachable page, which multiplied by the page size
//! gives an upper bound on the item count.

/// Approximates the number of items reachable through the `rel="last"` link.
///
/// `last_page` is `None` when there is no last link, which GitHub omits on single-page
/// results and on the final page itself.
pub fn estimate_total(last_page: Option<u32>, page_size: u32) -> Option<u64> {
    last_page.and_then(|last_page| u64::from(last_page).checked_mul(u64::from(page_size)))
}
