//! Bundled, read-only kiosk content (`content.json`).
//!
//! Loaded once at start-up and shared behind an `Arc`.  Dashboard tab
//! payloads stay as raw JSON until a view asks for them; [`TabDataset::parse`]
//! turns them into typed chart data or an `Unavailable` marker.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{Playlist, PlaylistEntry, ScheduleError};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid screensaver playlist: {0}")]
    Playlist(#[from] ScheduleError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub dashboards: Dashboards,
    #[serde(default)]
    pub maturity_presentation: Deck,
    #[serde(default)]
    pub ngfw_presentation: Deck,
    #[serde(default)]
    pub products_presentation: Deck,
    /// Shift applied to the wall clock before resolving the playlist.
    #[serde(default)]
    pub video_sync_offset: f64,
    #[serde(default)]
    pub screensaver: ScreensaverContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: u32,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub icon: String,
    pub route: String,
}

impl Card {
    /// Bare icon file names live under `icons/`; anything with a slash is
    /// taken as a bundle path already.
    pub fn icon_path(&self) -> String {
        if self.icon.is_empty() || self.icon.contains('/') {
            self.icon.clone()
        } else {
            format!("icons/{}", self.icon)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dashboards {
    #[serde(default)]
    pub tabs: Vec<DashboardTab>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardTab {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub slides: Vec<Slide>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    pub id: u32,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreensaverContent {
    #[serde(default)]
    pub playlist: Vec<PlaylistEntry>,
}

/// The three bundled slide decks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeckId {
    Maturity,
    Ngfw,
    Products,
}

impl DeckId {
    pub const ALL: [DeckId; 3] = [DeckId::Maturity, DeckId::Ngfw, DeckId::Products];

    pub fn title(self) -> &'static str {
        match self {
            DeckId::Maturity => "Maturity level",
            DeckId::Ngfw => "PT NGFW",
            DeckId::Products => "Products",
        }
    }
}

/// Kind of a referenced asset, for preflight reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Icon,
    Slide,
    Thumbnail,
    Media,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRef {
    pub kind: AssetKind,
    pub path: String,
}

impl Content {
    /// Read and validate `content.json`.  The playlist must be usable;
    /// everything else degrades to placeholders at render time.
    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let content = Self::from_json_str(&raw).map_err(|source| ContentError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        content.playlist()?;
        Ok(content)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub fn playlist(&self) -> Result<Playlist, ScheduleError> {
        Playlist::new(self.screensaver.playlist.clone())
    }

    pub fn deck(&self, id: DeckId) -> &Deck {
        match id {
            DeckId::Maturity => &self.maturity_presentation,
            DeckId::Ngfw => &self.ngfw_presentation,
            DeckId::Products => &self.products_presentation,
        }
    }

    pub fn tab(&self, id: &str) -> Option<&DashboardTab> {
        self.dashboards.tabs.iter().find(|t| t.id == id)
    }

    /// Every asset path the content refers to, deduplicated, in content order.
    pub fn referenced_assets(&self) -> Vec<AssetRef> {
        let mut out: Vec<AssetRef> = Vec::new();
        let mut push = |kind: AssetKind, path: &str| {
            if path.is_empty() || out.iter().any(|a| a.path == path) {
                return;
            }
            out.push(AssetRef {
                kind,
                path: path.to_string(),
            });
        };

        for card in &self.cards {
            push(AssetKind::Icon, &card.icon_path());
        }
        for id in DeckId::ALL {
            for slide in &self.deck(id).slides {
                push(AssetKind::Slide, &slide.image);
                if let Some(thumb) = &slide.thumbnail {
                    push(AssetKind::Thumbnail, thumb);
                }
            }
        }
        for entry in &self.screensaver.playlist {
            push(AssetKind::Media, &entry.media_file);
        }
        out
    }
}

/// Map a content-relative path (`/video/a.mp4`, `./video/a.mp4`) onto the
/// assets directory.  Absolute filesystem paths outside the bundle are not
/// supported; a leading slash means "bundle root".
pub fn resolve_asset(assets_dir: &Path, path: &str) -> PathBuf {
    let trimmed = path.trim_start_matches("./").trim_start_matches('/');
    assets_dir.join(trimmed)
}

// ── Dashboard datasets ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentPoint {
    pub year: i32,
    pub value: f64,
    #[serde(default)]
    pub growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorShare {
    pub label: String,
    pub value: f64,
    #[serde(default = "default_sector_color")]
    pub color: String,
}

fn default_sector_color() -> String {
    "#6A7F98".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotivationBar {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportGroup {
    pub year: String,
    pub foreign: f64,
    pub domestic: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanBoard {
    pub columns: Vec<KanbanColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanColumn {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub coverage: Option<f64>,
    #[serde(default)]
    pub techniques: Vec<Technique>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub progress: Option<Progress>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub subtechniques: Vec<Subtechnique>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub done: u32,
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtechnique {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigatorItem {
    pub solution_class: String,
    pub foreign_vendors: ForeignVendors,
    #[serde(rename = "productPT")]
    pub product_pt: String,
    pub certification_and_description: Certification,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignVendors {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub vm_solutions: Option<Vec<String>>,
    #[serde(default)]
    pub vulnerability_scanners: Option<Vec<String>>,
    #[serde(default)]
    pub vendors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default)]
    pub certification: Option<String>,
    #[serde(default)]
    pub description: Vec<String>,
}

/// Typed payload of one dashboard tab.
#[derive(Debug, Clone, PartialEq)]
pub enum TabDataset {
    Incidents(Vec<IncidentPoint>),
    Sectors(Vec<SectorShare>),
    Motivation(Vec<MotivationBar>),
    Import(Vec<ImportGroup>),
    Kanban(KanbanBoard),
    Navigator(Vec<NavigatorItem>),
    /// Missing, empty or malformed data; rendered as a placeholder.
    Unavailable(String),
}

impl TabDataset {
    /// Interpret a tab's raw JSON according to its id.  Never fails: bad data
    /// becomes [`TabDataset::Unavailable`] with a human-readable reason.
    pub fn parse(tab_id: &str, data: &serde_json::Value) -> Self {
        if data.is_null() {
            return TabDataset::Unavailable("no data".to_string());
        }
        let parsed = match tab_id {
            "incidents" => non_empty_list(data).map(TabDataset::Incidents),
            "sectors" => non_empty_list(data).and_then(|v: Vec<SectorShare>| {
                if v.iter().map(|s| s.value).sum::<f64>() > 0.0 {
                    Ok(TabDataset::Sectors(v))
                } else {
                    Err("sector values sum to zero".to_string())
                }
            }),
            "motivation" => non_empty_list(data).map(TabDataset::Motivation),
            "import" => non_empty_list(data).map(TabDataset::Import),
            "kanban" => serde_json::from_value::<KanbanBoard>(data.clone())
                .map_err(|e| e.to_string())
                .and_then(|board| {
                    if board.columns.is_empty() {
                        Err("no data".to_string())
                    } else {
                        Ok(TabDataset::Kanban(board))
                    }
                }),
            "positive-import" => non_empty_list(data).map(TabDataset::Navigator),
            other => Err(format!("unknown dashboard '{}'", other)),
        };
        parsed.unwrap_or_else(TabDataset::Unavailable)
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, TabDataset::Unavailable(_))
    }
}

fn non_empty_list<T: serde::de::DeserializeOwned>(
    data: &serde_json::Value,
) -> Result<Vec<T>, String> {
    let items: Vec<T> = serde_json::from_value(data.clone()).map_err(|e| e.to_string())?;
    if items.is_empty() {
        return Err("no data".to_string());
    }
    Ok(items)
}
