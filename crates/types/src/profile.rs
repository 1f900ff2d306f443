//! Profile: one panel's canvas settings and its scene tree.
//!
//! The renderer consumes an already-materialized profile; the editing
//! operations here (duplicate, move, hit-test) keep the tree invariants that
//! the editor relies on: every item has at most one parent and locked groups
//! keep their membership.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;
use crate::geometry::Point;
use crate::items::DisplayItem;
use crate::sensor::SensorSource;
use crate::text::FontSpec;

/// Errors from tree editing operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("item {0} not found")]
    NotFound(Uuid),
    #[error("item {0} is not a group")]
    NotAGroup(Uuid),
    #[error("group '{0}' is locked")]
    LockedGroup(String),
    #[error("cannot move an item into itself or one of its descendants")]
    IntoItself,
}

/// Editor snap grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    #[serde(default)]
    pub show: bool,
    #[serde(default = "default_grid_size")]
    pub size: u32,
    #[serde(default = "default_grid_color")]
    pub color: Color,
}

fn default_grid_size() -> u32 {
    10
}

fn default_grid_color() -> Color {
    Color::new(0.5, 0.5, 0.5, 0.3)
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            show: false,
            size: default_grid_size(),
            color: default_grid_color(),
        }
    }
}

/// Where the panel window sits on the desktop; carried, not interpreted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowPlacement {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub monitor: Option<String>,
    #[serde(default)]
    pub always_on_top: bool,
    #[serde(default)]
    pub click_through: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_width")]
    pub width: i32,
    #[serde(default = "default_height")]
    pub height: i32,
    #[serde(default = "default_background")]
    pub background_color: Color,
    #[serde(default)]
    pub background_image: Option<String>,
    /// Default font for text that has no style of its own (tables, HUDs)
    #[serde(default)]
    pub font: FontSpec,
    #[serde(default = "default_text_color")]
    pub text_color: Color,
    #[serde(default = "default_frame_rate")]
    pub target_frame_rate: u32,
    /// Minimum milliseconds between two samples pushed into chart queues
    #[serde(default = "default_graph_update_rate")]
    pub target_graph_update_rate_ms: u64,
    #[serde(default)]
    pub grid: GridSettings,
    #[serde(default)]
    pub show_fps: bool,
    #[serde(default)]
    pub window: WindowPlacement,
    /// Directory relative image paths resolve against
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
    #[serde(default)]
    pub items: Vec<DisplayItem>,
}

fn default_width() -> i32 {
    480
}

fn default_height() -> i32 {
    320
}

fn default_background() -> Color {
    Color::BLACK
}

fn default_text_color() -> Color {
    Color::WHITE
}

fn default_frame_rate() -> u32 {
    30
}

fn default_graph_update_rate() -> u64 {
    1000
}

impl Default for Profile {
    fn default() -> Self {
        Self::new("Default", default_width(), default_height())
    }
}

impl Profile {
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            width,
            height,
            background_color: default_background(),
            background_image: None,
            font: FontSpec::default(),
            text_color: default_text_color(),
            target_frame_rate: default_frame_rate(),
            target_graph_update_rate_ms: default_graph_update_rate(),
            grid: GridSettings::default(),
            show_fps: false,
            window: WindowPlacement::default(),
            base_dir: None,
            items: Vec::new(),
        }
    }

    /// Load a profile from JSON; relative image paths resolve next to the file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut profile: Profile = serde_json::from_str(&text)?;
        profile.base_dir = path.parent().map(Path::to_path_buf);
        log::info!(
            "Loaded profile '{}' ({} root items) from {:?}",
            profile.name,
            profile.items.len(),
            path
        );
        Ok(profile)
    }

    /// Frame rate clamped to a usable range
    pub fn frame_rate(&self) -> u32 {
        self.target_frame_rate.clamp(1, 240)
    }

    /// Absolute path (or URL) for an image reference
    pub fn resolve_path(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        let candidate = Path::new(path);
        match &self.base_dir {
            Some(dir) if candidate.is_relative() => dir.join(candidate).to_string_lossy().into_owned(),
            _ => path.to_string(),
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&DisplayItem> {
        self.items.iter().find_map(|item| item.find(id))
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut DisplayItem> {
        self.items.iter_mut().find_map(|item| item.find_mut(id))
    }

    /// Total number of items including group members
    pub fn item_count(&self) -> usize {
        let mut count = 0;
        for item in &self.items {
            item.walk(&mut |_| count += 1);
        }
        count
    }

    /// Parent group (`None` for root) and index of an item
    fn locate(&self, id: Uuid) -> Option<(Option<Uuid>, usize)> {
        fn search(list: &[DisplayItem], parent: Option<Uuid>, id: Uuid) -> Option<(Option<Uuid>, usize)> {
            for (index, item) in list.iter().enumerate() {
                if item.id() == id {
                    return Some((parent, index));
                }
                if let Some(children) = item.children() {
                    if let Some(found) = search(children, Some(item.id()), id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        search(&self.items, None, id)
    }

    fn list_mut(&mut self, parent: Option<Uuid>) -> Result<&mut Vec<DisplayItem>, SceneError> {
        match parent {
            None => Ok(&mut self.items),
            Some(group_id) => self
                .find_mut(group_id)
                .ok_or(SceneError::NotFound(group_id))?
                .children_mut()
                .ok_or(SceneError::NotAGroup(group_id)),
        }
    }

    fn check_unlocked(&self, group: Option<Uuid>) -> Result<(), SceneError> {
        let Some(group_id) = group else {
            return Ok(());
        };
        let item = self.find(group_id).ok_or(SceneError::NotFound(group_id))?;
        if item.children().is_none() {
            return Err(SceneError::NotAGroup(group_id));
        }
        if item.base().locked {
            return Err(SceneError::LockedGroup(item.name().to_string()));
        }
        Ok(())
    }

    /// Duplicate an item and insert the copy right after the original.
    /// Returns the id of the copy.
    pub fn duplicate_item(&mut self, id: Uuid) -> Result<Uuid, SceneError> {
        let (parent, index) = self.locate(id).ok_or(SceneError::NotFound(id))?;
        let copy = self
            .find(id)
            .ok_or(SceneError::NotFound(id))?
            .duplicate();
        let copy_id = copy.id();
        self.list_mut(parent)?.insert(index + 1, copy);
        log::debug!("Duplicated item {} as {}", id, copy_id);
        Ok(copy_id)
    }

    /// Move an item into `target` (a group, or root when `None`) at `index`.
    ///
    /// The item leaves its old list, so it is never in two places. Neither the
    /// source nor the target group may be locked.
    pub fn move_item(
        &mut self,
        id: Uuid,
        target: Option<Uuid>,
        index: usize,
    ) -> Result<(), SceneError> {
        let (source, source_index) = self.locate(id).ok_or(SceneError::NotFound(id))?;

        if let Some(target_id) = target {
            let moving = self.find(id).ok_or(SceneError::NotFound(id))?;
            if moving.find(target_id).is_some() {
                return Err(SceneError::IntoItself);
            }
        }
        self.check_unlocked(source)?;
        self.check_unlocked(target)?;

        let item = self.list_mut(source)?.remove(source_index);
        let list = self.list_mut(target)?;
        let index = if source == target && index > source_index {
            index - 1
        } else {
            index
        };
        let index = index.min(list.len());
        list.insert(index, item);
        log::debug!("Moved item {} to {:?}[{}]", id, target, index);
        Ok(())
    }

    /// Topmost visible item whose rotated box contains `point`.
    ///
    /// Items are tested in reverse z-order so the last-drawn item wins. Groups
    /// are transparent: only their children can be hit.
    pub fn hit_test(&self, point: Point, source: &dyn SensorSource) -> Option<&DisplayItem> {
        fn hit<'a>(
            list: &'a [DisplayItem],
            point: Point,
            source: &dyn SensorSource,
        ) -> Option<&'a DisplayItem> {
            for item in list.iter().rev() {
                if !item.is_visible(source) {
                    continue;
                }
                match item.children() {
                    Some(children) => {
                        if let Some(found) = hit(children, point, source) {
                            return Some(found);
                        }
                    }
                    None => {
                        let base = item.base();
                        let rect = base.rect();
                        let local = point.rotate_about(rect.center(), -(base.rotation as f64));
                        if rect.contains(local) {
                            return Some(item);
                        }
                    }
                }
            }
            None
        }
        hit(&self.items, point, source)
    }

    /// Select exactly one item (or none), clearing every other selection
    pub fn select_only(&mut self, id: Option<Uuid>) {
        fn visit(list: &mut [DisplayItem], id: Option<Uuid>) {
            for item in list.iter_mut() {
                let selected = Some(item.id()) == id;
                item.base_mut().selected = selected;
                if let Some(children) = item.children_mut() {
                    visit(children, id);
                }
            }
        }
        visit(&mut self.items, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{GroupItem, ItemBase, TextItem};
    use crate::sensor::NullSensorSource;

    fn text(name: &str, x: i32) -> DisplayItem {
        let mut t = TextItem::literal(name);
        t.base = ItemBase::new(name, x, 0, 50, 20);
        DisplayItem::Text(t)
    }

    fn sample() -> (Profile, Uuid, Uuid, Uuid) {
        let a = text("a", 0);
        let b = text("b", 100);
        let group = DisplayItem::Group(GroupItem::new("g", vec![b]));
        let (a_id, g_id) = (a.id(), group.id());
        let b_id = group.children().unwrap()[0].id();
        let mut profile = Profile::new("test", 200, 100);
        profile.items = vec![a, group];
        (profile, a_id, g_id, b_id)
    }

    #[test]
    fn test_duplicate_inserts_after_original() {
        let (mut profile, a_id, _, b_id) = sample();
        let copy = profile.duplicate_item(a_id).unwrap();
        assert_eq!(profile.items[1].id(), copy);
        assert_eq!(profile.items.len(), 3);

        let nested = profile.duplicate_item(b_id).unwrap();
        assert_eq!(profile.items[2].children().unwrap()[1].id(), nested);
    }

    #[test]
    fn test_move_between_groups() {
        let (mut profile, a_id, g_id, b_id) = sample();
        profile.move_item(a_id, Some(g_id), 0).unwrap();
        assert_eq!(profile.items.len(), 1);
        let children = profile.items[0].children().unwrap();
        assert_eq!(children[0].id(), a_id);
        assert_eq!(children[1].id(), b_id);
        assert_eq!(profile.item_count(), 3);
    }

    #[test]
    fn test_move_respects_locked_group() {
        let (mut profile, _, g_id, b_id) = sample();
        profile.find_mut(g_id).unwrap().base_mut().locked = true;
        assert_eq!(
            profile.move_item(b_id, None, 0),
            Err(SceneError::LockedGroup("g".to_string()))
        );
        assert!(profile.find(b_id).is_some());
    }

    #[test]
    fn test_move_group_into_itself() {
        let (mut profile, _, g_id, b_id) = sample();
        assert_eq!(profile.move_item(g_id, Some(g_id), 0), Err(SceneError::IntoItself));
        assert_eq!(profile.move_item(b_id, Some(b_id), 0), Err(SceneError::IntoItself));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let (mut profile, a_id, _, b_id) = sample();
        assert_eq!(profile.hit_test(Point::new(110.0, 10.0), &NullSensorSource).map(|i| i.id()), Some(b_id));
        assert_eq!(profile.hit_test(Point::new(10.0, 10.0), &NullSensorSource).map(|i| i.id()), Some(a_id));

        // Overlap: move b on top of a; b is later in z-order
        profile.find_mut(b_id).unwrap().base_mut().x = 0;
        assert_eq!(profile.hit_test(Point::new(10.0, 10.0), &NullSensorSource).map(|i| i.id()), Some(b_id));
        assert!(profile.hit_test(Point::new(190.0, 90.0), &NullSensorSource).is_none());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let mut profile = Profile::default();
        profile.base_dir = Some(PathBuf::from("/panels"));
        assert_eq!(profile.resolve_path("img/a.png"), "/panels/img/a.png");
        assert_eq!(profile.resolve_path("/abs/b.png"), "/abs/b.png");
        assert_eq!(profile.resolve_path("https://x/y.png"), "https://x/y.png");
    }

    #[test]
    fn test_profile_defaults_from_json() {
        let profile: Profile = serde_json::from_str(r#"{"name": "p"}"#).unwrap();
        assert_eq!(profile.width, 480);
        assert_eq!(profile.target_frame_rate, 30);
        assert!(profile.items.is_empty());
    }

    #[test]
    fn test_load_from_file_sets_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.json");
        let (profile, ..) = sample();
        std::fs::write(&path, serde_json::to_string(&profile).unwrap()).unwrap();

        let loaded = Profile::from_json_file(&path).unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.base_dir.as_deref(), Some(dir.path()));
        assert_eq!(
            loaded.resolve_path("a.png"),
            dir.path().join("a.png").to_string_lossy()
        );
    }
}
