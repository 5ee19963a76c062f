use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::WindowSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn center(self) -> (f64, f64) {
        (self.left + self.width / 2.0, self.top + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Viewport minus the taskbar strip reserved at the bottom.
    pub fn work_area(self, taskbar_height: f64) -> Self {
        Self {
            width: self.width,
            height: (self.height - taskbar_height).max(0.0),
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

/// Saved geometry; `None` fields mean "natural size" / "not positioned".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowGeometry {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub left: Option<f64>,
    pub top: Option<f64>,
}

/// Window center expressed as a fraction of viewport width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionRatio {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreSnapshot {
    pub geometry: WindowGeometry,
    pub anchor: Option<PositionRatio>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SnapType {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Left,
    Right,
}

impl SnapType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "tl",
            Self::TopRight => "tr",
            Self::BottomLeft => "bl",
            Self::BottomRight => "br",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        match token.trim() {
            "tl" => Some(Self::TopLeft),
            "tr" => Some(Self::TopRight),
            "bl" => Some(Self::BottomLeft),
            "br" => Some(Self::BottomRight),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

/// Target of a drag release over a screen edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnapZone {
    Tile(SnapType),
    Maximize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowMode {
    #[default]
    Free,
    Tiled(SnapType),
    /// `from_tile` remembers the tile to return to on unmaximize.
    Maximized { from_tile: Option<SnapType> },
}

impl WindowMode {
    pub fn is_free(self) -> bool {
        matches!(self, Self::Free)
    }

    pub fn is_maximized(self) -> bool {
        matches!(self, Self::Maximized { .. })
    }

    pub fn tile(self) -> Option<SnapType> {
        match self {
            Self::Tiled(snap) => Some(snap),
            Self::Maximized { from_tile } => from_tile,
            Self::Free => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Entity a window's content depends on; closing triggers when it is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub category: String,
    pub id: String,
}

impl Dependency {
    pub fn new(category: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            id: id.into(),
        }
    }

    /// Parses `"category:id|category:id"`, skipping malformed entries.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split('|')
            .filter_map(|entry| {
                let (category, id) = entry.trim().split_once(':')?;
                let (category, id) = (category.trim(), id.trim());
                if category.is_empty() || id.is_empty() {
                    return None;
                }
                Some(Self::new(category, id))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionKind {
    Appearing,
    Toggling,
    DraggingRestore,
    Disappearing,
}

impl TransitionKind {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::Appearing => "nd-appearing",
            Self::Toggling => "nd-toggling",
            Self::DraggingRestore => "nd-dragging-restore",
            Self::Disappearing => "nd-disappearing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowTransition {
    pub kind: TransitionKind,
    pub token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub top: f64,
    pub left: f64,
}

/// Non-zero scroll offsets keyed by element path (`"root"` for the surface itself).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollState(pub BTreeMap<String, ScrollOffset>);

impl ScrollState {
    pub const ROOT: &'static str = "root";

    pub fn record(&mut self, path: impl Into<String>, offset: ScrollOffset) {
        let path = path.into();
        if offset.top > 0.0 || offset.left > 0.0 {
            self.0.insert(path, offset);
        } else {
            self.0.remove(&path);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowRecord {
    pub id: WindowId,
    pub endpoint: String,
    pub surface: WindowSurface,
    pub rect: WindowRect,
    pub mode: WindowMode,
    pub position_ratio: Option<PositionRatio>,
    pub restore: Option<RestoreSnapshot>,
    pub z_index: u32,
    pub is_focused: bool,
    pub busy: bool,
    pub depends_on: Vec<Dependency>,
    pub transition: Option<WindowTransition>,
    pub transition_epoch: u64,
    pub scroll: ScrollState,
    pub cascade_index: usize,
    pub opened_at_ms: u64,
    /// A rendered size was reported during layout stabilization. Until then a free window
    /// without a declared size is rendered at its natural size.
    #[serde(default)]
    pub measured: bool,
}

impl WindowRecord {
    /// Sets a transitional flag and returns the token its clear timer must present.
    pub fn begin_transition(&mut self, kind: TransitionKind) -> u64 {
        self.transition_epoch = self.transition_epoch.saturating_add(1);
        self.transition = Some(WindowTransition {
            kind,
            token: self.transition_epoch,
        });
        self.transition_epoch
    }

    /// Clears the transition if `token` still identifies the current one.
    pub fn settle_transition(&mut self, token: u64) -> bool {
        match self.transition {
            Some(current) if current.token == token => {
                self.transition = None;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOptions {
    /// Re-fetch even when open or cooling down; refreshes an open window in place.
    pub force: bool,
    /// Element inside the surface to focus once the content is in place.
    pub focus_selector: Option<String>,
    /// Focus the window after opening; `false` for background refreshes.
    pub activate: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            force: false,
            focus_selector: None,
            activate: true,
        }
    }
}

impl OpenOptions {
    pub fn background_refresh() -> Self {
        Self {
            force: true,
            focus_selector: None,
            activate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowEvent {
    Opened { window_id: WindowId, endpoint: String },
    Closed { window_id: WindowId, endpoint: String },
    Focused { window_id: WindowId, endpoint: String },
}

impl WindowEvent {
    pub fn endpoint(&self) -> &str {
        match self {
            Self::Opened { endpoint, .. }
            | Self::Closed { endpoint, .. }
            | Self::Focused { endpoint, .. } => endpoint,
        }
    }
}
