use kernel::prelude::entity::Page;

#[derive(Debug, Clone, PartialEq)]
pub struct PageDto<T> {
    pub items: Vec<T>,
    pub next_page_id: Option<i64>,
}

impl<E, T: From<E>> From<Page<E>> for PageDto<T> {
    fn from(value: Page<E>) -> Self {
        let (items, next_page_id) = value.into_parts();
        Self {
            items: items.into_iter().map(T::from).collect(),
            next_page_id: next_page_id.map(i64::from),
        }
    }
}

#[derive(Debug)]
pub struct GetPageDto {
    pub page_id: i64,
}
