//! Pagination and sort primitives shared by every `Store::list_*` query.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Pagination {
    /// Builds a page request, clamping `page` to `>= 1` and `limit` to
    /// `1..=max_limit`, falling back to `default_limit` when unset
    /// (defaults are `page=1`, `limit=20`, max `100`).
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32, max_limit: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(default_limit).clamp(1, max_limit.max(1));
        Self { page, limit }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(None, None, 20, 100)
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Which key a `list_*` query orders by. `CreatedAt` is the default and
/// always available; `Secondary` lets a given entity expose one additional
/// sortable field (e.g. an asset's total value) without a full dynamic
/// field-name abstraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Secondary,
}

#[derive(Debug, Clone, Copy)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl Sort {
    pub fn by_secondary(direction: SortDirection) -> Self {
        Self {
            field: SortField::Secondary,
            direction,
        }
    }

    pub fn apply<T, K1, K2>(
        &self,
        items: &mut [T],
        created_at: impl Fn(&T) -> K1,
        secondary: impl Fn(&T) -> K2,
    ) where
        K1: Ord,
        K2: Ord,
    {
        let reverse = self.direction == SortDirection::Desc;
        match self.field {
            SortField::CreatedAt => items.sort_by(|a, b| {
                let ord = created_at(a).cmp(&created_at(b));
                if reverse {
                    ord.reverse()
                } else {
                    ord
                }
            }),
            SortField::Secondary => items.sort_by(|a, b| {
                let ord = secondary(a).cmp(&secondary(b));
                if reverse {
                    ord.reverse()
                } else {
                    ord
                }
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_limit_to_max() {
        let p = Pagination::new(Some(1), Some(9999), 20, 100);
        assert_eq!(p.limit, 100);
    }

    #[test]
    fn pagination_defaults_page_to_one() {
        let p = Pagination::new(None, None, 20, 100);
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 20);
    }
}
