//! Read-only page of items

use crate::errors::PaginationError;
use serde::Serialize;
use std::ops::Index;

/// One page of a larger result set.
///
/// `page` is 1-based. A page of size `usize::MAX` holds everything and is
/// the only page; an empty result set also has exactly one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WarehousePagination<T> {
    items: Vec<T>,
    count: usize,
    page: usize,
    size: usize,
}

impl<T> WarehousePagination<T> {
    pub fn new(items: Vec<T>, count: usize, size: usize, page: usize) -> Result<Self, PaginationError> {
        if size < 1 {
            return Err(PaginationError::InvalidSize);
        }
        if page < 1 {
            return Err(PaginationError::InvalidPage);
        }
        if items.len() > size {
            return Err(PaginationError::TooManyItems {
                items: items.len(),
                size,
            });
        }
        if items.len() > count {
            return Err(PaginationError::ItemsExceedCount {
                items: items.len(),
                count,
            });
        }

        let pagination = Self {
            items,
            count,
            page,
            size,
        };
        if page > pagination.pages() {
            return Err(PaginationError::PageOutOfRange {
                page,
                pages: pagination.pages(),
            });
        }
        Ok(pagination)
    }

    /// All items on a single page
    pub fn single(items: Vec<T>) -> Self {
        Self {
            count: items.len(),
            items,
            page: 1,
            size: usize::MAX,
        }
    }

    /// Total number of items across all pages
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pages(&self) -> usize {
        if self.size == usize::MAX || self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.size)
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.pages()
    }

    /// Number of items on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Index<usize> for WarehousePagination<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IntoIterator for WarehousePagination<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a WarehousePagination<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> Vec<&'static str> {
        vec!["one", "two", "three"]
    }

    #[test]
    fn test_single_page() {
        let page = WarehousePagination::single(three());

        assert_eq!(page.count(), 3);
        assert_eq!(page.page(), 1);
        assert_eq!(page.size(), usize::MAX);
        assert_eq!(page.pages(), 1);
        assert!(!page.has_previous());
        assert!(!page.has_next());
        assert!(WarehousePagination::<&str>::single(vec![]).is_empty());
    }

    #[test]
    fn test_derived_properties() {
        let page = WarehousePagination::new(vec!["d", "e"], 5, 2, 2).unwrap();

        assert_eq!(page.pages(), 3);
        assert!(page.has_previous());
        assert!(page.has_next());
        assert_eq!(page[1], "e");

        let last = WarehousePagination::new(vec!["e"], 5, 2, 3).unwrap();
        assert!(!last.has_next());
    }

    #[test]
    fn test_empty_result_has_one_page() {
        let page = WarehousePagination::<&str>::new(vec![], 0, 10, 1).unwrap();
        assert_eq!(page.pages(), 1);
        assert!(page.is_empty());
    }

    #[test]
    fn test_construction_invariants() {
        assert_eq!(
            WarehousePagination::new(three(), 3, 0, 1).unwrap_err(),
            PaginationError::InvalidSize
        );
        assert_eq!(
            WarehousePagination::new(three(), 3, 10, 0).unwrap_err(),
            PaginationError::InvalidPage
        );
        assert_eq!(
            WarehousePagination::new(three(), 3, 2, 1).unwrap_err(),
            PaginationError::TooManyItems { items: 3, size: 2 }
        );
        assert_eq!(
            WarehousePagination::new(three(), 2, 10, 1).unwrap_err(),
            PaginationError::ItemsExceedCount { items: 3, count: 2 }
        );
        assert_eq!(
            WarehousePagination::new(three(), 3, 10, 2).unwrap_err(),
            PaginationError::PageOutOfRange { page: 2, pages: 1 }
        );
    }

    #[test]
    fn test_iteration() {
        let page = WarehousePagination::new(three(), 30, 10, 1).unwrap();
        let collected: Vec<_> = page.iter().copied().collect();
        assert_eq!(collected, three());
        assert_eq!(page.into_iter().count(), 3);
    }
}
