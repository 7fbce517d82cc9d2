use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::BrowseError;
use crate::models::MovieQuery;

/// Discovery sort fields understood by the upstream provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    Popularity,
    VoteAverage,
    VoteCount,
    PrimaryReleaseDate,
    Revenue,
    Title,
    OriginalTitle,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Popularity => "popularity",
            SortField::VoteAverage => "vote_average",
            SortField::VoteCount => "vote_count",
            SortField::PrimaryReleaseDate => "primary_release_date",
            SortField::Revenue => "revenue",
            SortField::Title => "title",
            SortField::OriginalTitle => "original_title",
        }
    }
}

impl FromStr for SortField {
    type Err = BrowseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "popularity" => Ok(SortField::Popularity),
            "vote_average" | "rating" => Ok(SortField::VoteAverage),
            "vote_count" | "votes" => Ok(SortField::VoteCount),
            "primary_release_date" | "release_date" => Ok(SortField::PrimaryReleaseDate),
            "revenue" => Ok(SortField::Revenue),
            "title" => Ok(SortField::Title),
            "original_title" => Ok(SortField::OriginalTitle),
            _ => Err(BrowseError::InvalidSortField(s.to_string())),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl FromStr for SortOrder {
    type Err = BrowseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            _ => Err(BrowseError::InvalidSortOrder(s.to_string())),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user currently wants to see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchIntent {
    pub page: u32,
    pub query: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
}

impl Default for SearchIntent {
    fn default() -> Self {
        Self {
            page: 1,
            query: String::new(),
            sort_field: SortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl SearchIntent {
    /// `"<field>.<order>"`, e.g. `popularity.desc`.
    pub fn sort_key(&self) -> String {
        format!("{}.{}", self.sort_field, self.sort_order)
    }

    /// A non-empty query is a free-text search and carries no sort key.
    pub fn to_query(&self) -> MovieQuery {
        if self.query.is_empty() {
            MovieQuery::discover(self.page, self.sort_key())
        } else {
            MovieQuery::search(self.page, self.query.clone())
        }
    }
}
