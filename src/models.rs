//! Movie metadata shapes shared by the gateway and the browse controller.
//!
//! These mirror the upstream provider's JSON. The gateway only uses them to
//! check the shape of a body before relaying it unchanged; the browse client
//! reads its pages through them.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SORT_KEY: &str = "popularity.desc";

/// Normalized movie listing request: one page of either a free-text search
/// or a sorted discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieQuery {
    pub page: u32,
    pub query: String,
    pub sort_by: Option<String>,
}

impl MovieQuery {
    pub fn search(page: u32, query: impl Into<String>) -> Self {
        Self {
            page,
            query: query.into(),
            sort_by: None,
        }
    }

    pub fn discover(page: u32, sort_by: impl Into<String>) -> Self {
        Self {
            page,
            query: String::new(),
            sort_by: Some(sort_by.into()),
        }
    }

    pub fn is_search(&self) -> bool {
        !self.query.is_empty()
    }

    /// Sort key for a discovery call. Empty or missing keys fall back to
    /// popularity, descending.
    pub fn sort_key(&self) -> &str {
        self.sort_by
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SORT_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_title: Option<String>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre_ids: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

/// One page of movie results plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub page: u32,
    #[serde(default)]
    pub results: Vec<MovieSummary>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenresResponse {
    pub genres: Vec<Genre>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub aspect_ratio: f64,
    pub height: u32,
    pub iso_639_1: Option<String>,
    pub file_path: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u64,
    pub width: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesResponse {
    pub id: u64,
    #[serde(default)]
    pub backdrops: Vec<Image>,
    #[serde(default)]
    pub logos: Vec<Image>,
    #[serde(default)]
    pub posters: Vec<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(default)]
    pub size: u32,
    #[serde(rename = "type")]
    pub video_type: String,
    #[serde(default)]
    pub official: bool,
    #[serde(default)]
    pub published_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideosResponse {
    pub id: u64,
    #[serde(default)]
    pub results: Vec<Video>,
}
