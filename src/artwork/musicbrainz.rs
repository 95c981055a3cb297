//! HTTP client for MusicBrainz release-group search and the Cover Art
//! Archive.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const DEFAULT_COVER_ART_BASE_URL: &str = "https://coverartarchive.org";

// MusicBrainz rejects requests without a meaningful user agent.
const USER_AGENT: &str = concat!("shelfsync/", env!("CARGO_PKG_VERSION"));

/// Release-group search response, reduced to the fields we read.
#[derive(Debug, Deserialize)]
struct ReleaseGroupSearch {
    #[serde(rename = "release-groups", default)]
    release_groups: Vec<ReleaseGroup>,
}

#[derive(Debug, Deserialize)]
struct ReleaseGroup {
    id: String,
}

/// Client for resolving an artist/album pair to front cover art bytes.
pub struct MusicBrainzClient {
    client: reqwest::Client,
    api_base_url: String,
    cover_art_base_url: String,
}

impl MusicBrainzClient {
    /// Create a client against the public MusicBrainz/Cover Art Archive
    /// endpoints.
    pub fn new(timeout_sec: u64) -> Self {
        Self::with_base_urls(
            DEFAULT_API_BASE_URL,
            DEFAULT_COVER_ART_BASE_URL,
            timeout_sec,
        )
    }

    /// Create a client against custom endpoints. Used by tests.
    pub fn with_base_urls(api_base_url: &str, cover_art_base_url: &str, timeout_sec: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            cover_art_base_url: cover_art_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Search for the release group of an album. Returns the first
    /// match's MBID, or `None` when the search comes up empty.
    pub async fn find_release_group(&self, artist: &str, album: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/release-group/?query=artist:{}%20AND%20releasegroup:{}&fmt=json",
            self.api_base_url,
            urlencoding::encode(artist),
            urlencoding::encode(album),
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to query MusicBrainz release-group search")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "MusicBrainz search for {} - {} failed: status {}",
                artist,
                album,
                response.status()
            );
        }

        let search: ReleaseGroupSearch = response
            .json()
            .await
            .context("Failed to parse MusicBrainz search response")?;

        Ok(search.release_groups.into_iter().next().map(|rg| rg.id))
    }

    /// Fetch the front cover of a release group. Returns `None` when the
    /// archive has no art for it (404).
    pub async fn fetch_front_cover(&self, release_group_id: &str) -> Result<Option<Vec<u8>>> {
        let url = format!(
            "{}/release-group/{}/front",
            self.cover_art_base_url, release_group_id
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch cover art")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!(
                "Cover art fetch for {} failed: status {}",
                release_group_id,
                response.status()
            );
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read cover art body")?;
        Ok(Some(bytes.to_vec()))
    }
}
