// src/podcast.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

// === IDENTITIES ===

/// Feed URI identifying a podcast. Normalized on construction so the same
/// feed with and without a trailing slash compares equal and keys one map
/// entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct PodcastUri(String);

impl PodcastUri {
    pub fn new(s: &str) -> Self {
        PodcastUri(s.trim_end_matches('/').to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for PodcastUri {
    fn from(s: String) -> Self {
        PodcastUri::new(&s)
    }
}

impl AsRef<str> for PodcastUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PodcastUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EpisodeUri(String);

impl EpisodeUri {
    pub fn new(s: &str) -> Self {
        EpisodeUri(s.to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for EpisodeUri {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EpisodeUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// === CATEGORIES ===

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryInfo {
    pub name: String,
}

impl CategoryInfo {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string() }
    }
}

impl fmt::Display for CategoryInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// === PODCAST STRUCTURES ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    uri: PodcastUri,
    title: String,
    description: Option<String>,
    author: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    categories: Vec<CategoryInfo>,
}

impl Podcast {
    pub fn new(
        uri: PodcastUri,
        title: String,
        description: Option<String>,
        author: Option<String>,
        image_url: Option<String>,
        categories: Vec<CategoryInfo>,
    ) -> Self {
        Self { uri, title, description, author, image_url, categories }
    }

    pub fn uri(&self) -> &PodcastUri {
        &self.uri
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn categories(&self) -> &[CategoryInfo] {
        &self.categories
    }
}

impl fmt::Display for Podcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Title    : {}", self.title)?;
        writeln!(f, "URI      : {}", self.uri)?;
        if let Some(desc) = &self.description {
            writeln!(f, "About    : {}", desc)?;
        }
        writeln!(f, "Categories: {}", self.categories.len())
    }
}

// === EPISODE STRUCTURES ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    uri: EpisodeUri,
    podcast_uri: PodcastUri,
    title: String,
    author: Option<String>,
    summary: Option<String>,
    published: DateTime<Utc>,
    duration: Option<Duration>,
}

impl Episode {
    pub fn new(
        uri: EpisodeUri,
        podcast_uri: PodcastUri,
        title: String,
        author: Option<String>,
        summary: Option<String>,
        published: DateTime<Utc>,
        duration: Option<Duration>,
    ) -> Self {
        Self { uri, podcast_uri, title, author, summary, published, duration }
    }

    pub fn uri(&self) -> &EpisodeUri {
        &self.uri
    }

    pub fn podcast_uri(&self) -> &PodcastUri {
        &self.podcast_uri
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn published(&self) -> DateTime<Utc> {
        self.published
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }
}

// === PROJECTIONS ===

/// An episode paired with a snapshot of its owning podcast. Rebuilt on every
/// upstream emission, never mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeToPodcast {
    pub episode: Episode,
    pub podcast: Podcast,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PodcastWithExtraInfo {
    pub podcast: Podcast,
    pub last_episode_date: Option<DateTime<Utc>>,
    pub is_followed: bool,
}

/// Flattened record the playback queue works with.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerEpisode {
    pub uri: EpisodeUri,
    pub title: String,
    pub podcast_name: String,
    pub author: String,
    pub summary: String,
    pub duration: Option<Duration>,
    pub podcast_image_url: String,
}

impl From<&EpisodeToPodcast> for PlayerEpisode {
    fn from(pair: &EpisodeToPodcast) -> Self {
        Self {
            uri: pair.episode.uri().clone(),
            title: pair.episode.title().to_string(),
            podcast_name: pair.podcast.title().to_string(),
            author: pair
                .episode
                .author()
                .or(pair.podcast.author())
                .unwrap_or_default()
                .to_string(),
            summary: pair.episode.summary().unwrap_or_default().to_string(),
            duration: pair.episode.duration(),
            podcast_image_url: pair.podcast.image_url().unwrap_or_default().to_string(),
        }
    }
}
