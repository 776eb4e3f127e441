use axum::response::{IntoResponse, Response};
use serde::Serialize;

use application::transfer::PageDto;

/// One page of a listing. `next_page_id` is omitted on the last page.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_page_id: Option<i64>,
}

impl<D, T: From<D>> From<PageDto<D>> for PageResponse<T> {
    fn from(value: PageDto<D>) -> Self {
        Self {
            items: value.items.into_iter().map(T::from).collect(),
            next_page_id: value.next_page_id,
        }
    }
}

impl<T: Serialize> IntoResponse for PageResponse<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

#[cfg(test)]
mod test {
    use application::transfer::PageDto;

    use super::PageResponse;

    #[test]
    fn last_page_has_no_cursor() {
        let last: PageResponse<i64> = PageDto {
            items: vec![21, 22],
            next_page_id: None,
        }
        .into();
        assert_eq!(
            serde_json::to_value(last).unwrap(),
            serde_json::json!({ "items": [21, 22] })
        );

        let full: PageResponse<i64> = PageDto {
            items: (1..=10).collect(),
            next_page_id: Some(10),
        }
        .into();
        assert_eq!(serde_json::to_value(full).unwrap()["next_page_id"], 10);
    }
}
