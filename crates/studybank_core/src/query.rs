//! crates/studybank_core/src/query.rs
//!
//! List-query parameters. Sequence-valued filters serialize as repeated keys
//! (`tags=a&tags=b`), which is what the backend's argument parser expects.

use crate::domain::{Id, ItemStatus, Pagination};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        })
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(format!("unknown sort direction '{}'", other)),
        }
    }
}

/// Caller-supplied filters for a list fetch. `page`/`per_page`, when set,
/// override the store's current pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub collection_id: Option<Id>,
    pub subject: Option<String>,
    pub difficulty: Option<u8>,
    pub status: Option<ItemStatus>,
    pub tags: Vec<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<SortDirection>,
}

impl ListFilter {
    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Merges the current pagination with these filters into query pairs.
    pub fn to_query(&self, pagination: &Pagination) -> Vec<(String, String)> {
        let mut query = QueryPairs::default();
        query.push("page", self.page.unwrap_or(pagination.page));
        query.push("per_page", self.per_page.unwrap_or(pagination.per_page));
        query.push_opt("collection_id", self.collection_id);
        query.push_opt("subject", self.subject.as_deref());
        query.push_opt("difficulty", self.difficulty);
        query.push_opt("status", self.status.map(ItemStatus::as_str));
        query.push_all("tags", &self.tags);
        query.push_opt("sort_by", self.sort_by.as_deref());
        query.push_opt("sort_direction", self.sort_direction);
        query.into_pairs()
    }
}

/// Ordered query pairs; keys may repeat.
#[derive(Debug, Clone, Default)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// One pair per value, all under the same key.
    pub fn push_all<V: fmt::Display>(&mut self, key: &str, values: &[V]) {
        for value in values {
            self.push(key, value);
        }
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(query: &[(String, String)]) -> Vec<(&str, &str)> {
        query.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect()
    }

    #[test]
    fn tags_repeat_the_key() {
        let filter = ListFilter::default().tag("algebra").tag("geometry");
        let query = filter.to_query(&Pagination::default());

        assert_eq!(
            pairs(&query),
            vec![
                ("page", "1"),
                ("per_page", "10"),
                ("tags", "algebra"),
                ("tags", "geometry"),
            ]
        );
    }

    #[test]
    fn caller_values_override_pagination() {
        let pagination = Pagination {
            page: 3,
            per_page: 20,
            total: 55,
            pages: 3,
        };
        let filter = ListFilter {
            page: Some(1),
            status: Some(ItemStatus::NeedReview),
            sort_direction: Some(SortDirection::Asc),
            ..Default::default()
        };

        let query = filter.to_query(&pagination);

        assert_eq!(
            pairs(&query),
            vec![
                ("page", "1"),
                ("per_page", "20"),
                ("status", "NEED_REVIEW"),
                ("sort_direction", "asc"),
            ]
        );
    }

    #[test]
    fn push_all_accepts_any_displayable_value() {
        let mut query = QueryPairs::default();
        query.push_all("difficulty", &[1u8, 3]);
        query.push_all("subject", &["MATHS"]);

        assert_eq!(
            pairs(&query.into_pairs()),
            vec![("difficulty", "1"), ("difficulty", "3"), ("subject", "MATHS")]
        );
    }
}
