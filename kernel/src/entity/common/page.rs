use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

/// Number of rows returned by every cursor-paginated listing.
pub const PAGE_SIZE: i64 = 10;

/// Cursor of a paginated listing: the id of the last row already seen, `0` for the first page.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Fromln, AsRefln, Serialize, Deserialize,
)]
pub struct PageId(i64);

impl PageId {
    pub fn new(id: impl Into<i64>) -> Self {
        Self(id.into())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    next_page_id: Option<PageId>,
}

impl<T> Page<T> {
    /// Builds a page from rows fetched with `id > cursor ORDER BY id LIMIT PAGE_SIZE`.
    ///
    /// A full page points at its last row, anything shorter is the end of the listing.
    pub fn from_rows(items: Vec<T>, id_of: impl Fn(&T) -> i64) -> Self {
        let next_page_id = if items.len() as i64 == PAGE_SIZE {
            items.last().map(|last| PageId::new(id_of(last)))
        } else {
            None
        };
        Self {
            items,
            next_page_id,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn next_page_id(&self) -> Option<&PageId> {
        self.next_page_id.as_ref()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_page_id: self.next_page_id,
        }
    }

    pub fn into_parts(self) -> (Vec<T>, Option<PageId>) {
        (self.items, self.next_page_id)
    }
}
