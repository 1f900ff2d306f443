//! The scene model: one `DisplayItem` per visual node in a panel.
//!
//! `DisplayItem` is a closed sum type. Each variant knows how to evaluate
//! its own text and color from a sensor binding, its own bounds including
//! rotation, and whether it is visible at all, so the compositor never has
//! to special-case sensor resolution.

mod arc;
mod chart;
mod group;
mod image;
mod shape;
mod text;

pub use arc::ArcItem;
pub use chart::{BarItem, ChartStyle, DonutItem, GraphItem, GraphMode};
pub use group::GroupItem;
pub use image::{GaugeImages, ImageItem, ImageSource};
pub use shape::{ShapeItem, ShapeKind};
pub use text::{
    format_time, resolve_macros, SensorText, TableColumn, TableText, TextContent, TextItem,
    ThresholdColors,
};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::color::Color;
use crate::geometry::Rect;
use crate::sensor::{SensorCondition, SensorId, SensorSource};

/// Attributes shared by every item variant.
///
/// Position and size are integers in profile space; the renderer applies its
/// scale factor only while projecting and never writes back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemBase {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    /// Degrees, clockwise
    #[serde(default)]
    pub rotation: i32,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub locked: bool,
    /// Editor selection; never persisted
    #[serde(skip)]
    pub selected: bool,
    /// Hide the item unless this sensor condition holds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<SensorCondition>,
    /// Line of the import file this item was created from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imported_line: Option<u32>,
}

impl ItemBase {
    pub fn new(name: impl Into<String>, x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            x,
            y,
            width,
            height,
            rotation: 0,
            hidden: false,
            locked: false,
            selected: false,
            condition: None,
            imported_line: None,
        }
    }

    /// Unrotated box in profile space
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.height as f64,
        )
    }

    /// Axis-aligned bounds of the rotated box
    pub fn rotated_bounds(&self) -> Rect {
        self.rect().rotated_bounds(self.rotation as f64)
    }

    /// Fresh identity, provenance dropped, selection cleared
    fn reset_identity(&mut self) {
        self.id = Uuid::new_v4();
        self.imported_line = None;
        self.selected = false;
    }
}

impl Default for ItemBase {
    fn default() -> Self {
        Self::new("", 0, 0, 0, 0)
    }
}

/// One visual node in a panel's scene tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayItem {
    Text(TextItem),
    Image(ImageItem),
    Graph(GraphItem),
    Bar(BarItem),
    Donut(DonutItem),
    Shape(ShapeItem),
    Arc(ArcItem),
    Group(GroupItem),
}

impl DisplayItem {
    pub fn base(&self) -> &ItemBase {
        match self {
            DisplayItem::Text(i) => &i.base,
            DisplayItem::Image(i) => &i.base,
            DisplayItem::Graph(i) => &i.base,
            DisplayItem::Bar(i) => &i.base,
            DisplayItem::Donut(i) => &i.base,
            DisplayItem::Shape(i) => &i.base,
            DisplayItem::Arc(i) => &i.base,
            DisplayItem::Group(i) => &i.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ItemBase {
        match self {
            DisplayItem::Text(i) => &mut i.base,
            DisplayItem::Image(i) => &mut i.base,
            DisplayItem::Graph(i) => &mut i.base,
            DisplayItem::Bar(i) => &mut i.base,
            DisplayItem::Donut(i) => &mut i.base,
            DisplayItem::Shape(i) => &mut i.base,
            DisplayItem::Arc(i) => &mut i.base,
            DisplayItem::Group(i) => &mut i.base,
        }
    }

    pub fn id(&self) -> Uuid {
        self.base().id
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// Short variant name, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            DisplayItem::Text(_) => "text",
            DisplayItem::Image(_) => "image",
            DisplayItem::Graph(_) => "graph",
            DisplayItem::Bar(_) => "bar",
            DisplayItem::Donut(_) => "donut",
            DisplayItem::Shape(_) => "shape",
            DisplayItem::Arc(_) => "arc",
            DisplayItem::Group(_) => "group",
        }
    }

    pub fn children(&self) -> Option<&[DisplayItem]> {
        match self {
            DisplayItem::Group(g) => Some(&g.items),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<DisplayItem>> {
        match self {
            DisplayItem::Group(g) => Some(&mut g.items),
            _ => None,
        }
    }

    /// Whether the item should be drawn this frame.
    ///
    /// Hidden items are never drawn; sensor-conditional items suppress
    /// themselves while their condition does not hold.
    pub fn is_visible(&self, source: &dyn SensorSource) -> bool {
        let base = self.base();
        if base.hidden {
            return false;
        }
        match &base.condition {
            Some(condition) => condition.evaluate(source),
            None => true,
        }
    }

    /// Pixel bounds in profile space including rotation.
    ///
    /// A group's bounds are the union of its children's bounds.
    pub fn evaluate_bounds(&self) -> Rect {
        match self {
            DisplayItem::Group(g) => g
                .items
                .iter()
                .map(DisplayItem::evaluate_bounds)
                .reduce(|a, b| a.union(&b))
                .unwrap_or_default(),
            other => other.base().rotated_bounds(),
        }
    }

    /// Display text and color for text-bearing items, `None` for others
    pub fn evaluate_text_and_color(
        &self,
        source: &dyn SensorSource,
        now: &DateTime<Local>,
    ) -> Option<(String, Color)> {
        match self {
            DisplayItem::Text(t) => Some(t.evaluate_text_and_color(source, now)),
            _ => None,
        }
    }

    /// Sensor this item's live value comes from, if any
    pub fn sensor(&self) -> Option<&SensorId> {
        match self {
            DisplayItem::Text(t) => t.content.sensor(),
            DisplayItem::Image(i) => match &i.source {
                ImageSource::Gauge(g) => Some(&g.sensor),
                _ => None,
            },
            DisplayItem::Graph(g) => Some(&g.chart.sensor),
            DisplayItem::Bar(b) => Some(&b.chart.sensor),
            DisplayItem::Donut(d) => Some(&d.chart.sensor),
            DisplayItem::Arc(a) => Some(&a.sensor),
            DisplayItem::Shape(_) | DisplayItem::Group(_) => None,
        }
    }

    /// Deep copy with a fresh identity and no import provenance.
    ///
    /// Group children are duplicated recursively so no id is shared with the
    /// original subtree.
    pub fn duplicate(&self) -> DisplayItem {
        let mut copy = self.clone();
        copy.reset_identity_recursive();
        copy
    }

    fn reset_identity_recursive(&mut self) {
        self.base_mut().reset_identity();
        if let Some(children) = self.children_mut() {
            for child in children.iter_mut() {
                child.reset_identity_recursive();
            }
        }
    }

    /// Depth-first search for an item by id, including self
    pub fn find(&self, id: Uuid) -> Option<&DisplayItem> {
        if self.id() == id {
            return Some(self);
        }
        self.children()?.iter().find_map(|c| c.find(id))
    }

    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut DisplayItem> {
        if self.id() == id {
            return Some(self);
        }
        self.children_mut()?.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Visit every item of this subtree in z-order (parents before children)
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a DisplayItem)) {
        f(self);
        if let Some(children) = self.children() {
            for child in children {
                child.walk(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{Comparison, NullSensorSource, SensorReading};
    use crate::text::TextStyle;

    fn text_item(x: i32) -> DisplayItem {
        let mut item = TextItem::literal("hello");
        item.base = ItemBase::new("label", x, 10, 100, 20);
        item.base.imported_line = Some(12);
        item.style = TextStyle {
            color: Color::new(1.0, 0.0, 0.0, 1.0),
            ..Default::default()
        };
        DisplayItem::Text(item)
    }

    #[test]
    fn test_duplicate_resets_identity_only() {
        let original = text_item(5);
        let copy = original.duplicate();

        assert_ne!(copy.id(), original.id());
        assert_eq!(copy.base().imported_line, None);

        let (DisplayItem::Text(a), DisplayItem::Text(b)) = (&original, &copy) else {
            panic!("variant changed");
        };
        assert_eq!(a.style, b.style);
        assert_eq!(a.content, b.content);
        assert_eq!(a.base.rect(), b.base.rect());
        assert_eq!(a.base.rotation, b.base.rotation);
        assert_eq!(a.base.name, b.base.name);
    }

    #[test]
    fn test_duplicate_group_recurses() {
        let group = DisplayItem::Group(GroupItem::new("g", vec![text_item(0), text_item(50)]));
        let copy = group.duplicate();
        let originals: Vec<Uuid> = group.children().unwrap().iter().map(|c| c.id()).collect();
        for child in copy.children().unwrap() {
            assert!(!originals.contains(&child.id()));
            assert_eq!(child.base().imported_line, None);
        }
    }

    #[test]
    fn test_group_bounds_union() {
        let group = DisplayItem::Group(GroupItem::new("g", vec![text_item(0), text_item(200)]));
        let b = group.evaluate_bounds();
        assert_eq!(b, Rect::new(0.0, 10.0, 300.0, 20.0));
    }

    #[test]
    fn test_conditional_visibility() {
        struct Load;
        impl SensorSource for Load {
            fn read(&self, _id: &SensorId) -> Option<SensorReading> {
                Some(SensorReading::numeric(80.0, "%"))
            }
        }

        let mut item = text_item(0);
        item.base_mut().condition = Some(SensorCondition {
            sensor: SensorId::plugin("load"),
            comparison: Comparison::Greater,
            threshold: 75.0,
        });
        assert!(item.is_visible(&Load));
        assert!(!item.is_visible(&NullSensorSource));

        item.base_mut().hidden = true;
        assert!(!item.is_visible(&Load));
    }

    #[test]
    fn test_item_serialization_tagged() {
        let item = text_item(1);
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"type\":\"text\""));
        assert!(!json.contains("selected"));
        let back: DisplayItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), item.id());
    }
}
