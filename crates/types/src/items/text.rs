//! Text items: literal/macro text, clock, calendar, sensor values and tables.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ItemBase;
use crate::color::Color;
use crate::sensor::{SensorId, SensorReading, SensorSource};
use crate::text::TextStyle;

const DEFAULT_CLOCK_FORMAT: &str = "%H:%M:%S";
const DEFAULT_CALENDAR_FORMAT: &str = "%A, %d %B %Y";

/// `{time}`, `{time:%H:%M}`, `{date}`, `{date:%d.%m}`, `{weekday}`, `{nl}`
static MACRO_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(time|date|weekday|nl)(?::([^}]*))?\}").expect("macro pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextItem {
    #[serde(flatten)]
    pub base: ItemBase,
    #[serde(default)]
    pub style: TextStyle,
    pub content: TextContent,
}

/// Where a text item's content comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TextContent {
    /// Literal text with optional `{macro}` placeholders
    Literal { text: String },
    Clock {
        #[serde(default = "default_clock_format")]
        format: String,
    },
    Calendar {
        #[serde(default = "default_calendar_format")]
        format: String,
    },
    Sensor(SensorText),
    Table(TableText),
}

fn default_clock_format() -> String {
    DEFAULT_CLOCK_FORMAT.to_string()
}

fn default_calendar_format() -> String {
    DEFAULT_CALENDAR_FORMAT.to_string()
}

impl TextContent {
    pub fn sensor(&self) -> Option<&SensorId> {
        match self {
            TextContent::Sensor(s) => Some(&s.sensor),
            TextContent::Table(t) => Some(&t.sensor),
            _ => None,
        }
    }
}

/// Color switches applied as a sensor value climbs past thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdColors {
    pub warn_at: f64,
    pub warn_color: Color,
    pub critical_at: f64,
    pub critical_color: Color,
}

impl ThresholdColors {
    fn pick(&self, value: f64, normal: Color) -> Color {
        if value >= self.critical_at {
            self.critical_color
        } else if value >= self.warn_at {
            self.warn_color
        } else {
            normal
        }
    }
}

/// Live sensor value rendered as text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorText {
    pub sensor: SensorId,
    #[serde(default)]
    pub decimals: u8,
    #[serde(default = "default_true")]
    pub show_unit: bool,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub thresholds: Option<ThresholdColors>,
}

fn default_true() -> bool {
    true
}

impl SensorText {
    pub fn new(sensor: SensorId) -> Self {
        Self {
            sensor,
            decimals: 0,
            show_unit: true,
            prefix: String::new(),
            thresholds: None,
        }
    }

    /// Format a reading; textual values from the source win over numbers
    pub fn format(&self, reading: &SensorReading) -> String {
        let mut out = self.prefix.clone();
        match &reading.value_text {
            Some(text) => out.push_str(text),
            None => out.push_str(&format!(
                "{:.*}",
                self.decimals as usize,
                reading.value_now
            )),
        }
        if self.show_unit && !reading.unit.is_empty() {
            out.push_str(&reading.unit);
        }
        out
    }
}

/// One column picked from a tabular sensor result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableColumn {
    pub index: usize,
    /// Fixed width in pixels; 0 sizes the column to its content
    #[serde(default)]
    pub width: u32,
}

/// Tabular sensor result rendered as a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableText {
    pub sensor: SensorId,
    /// Empty selects every column at auto width
    #[serde(default)]
    pub columns: Vec<TableColumn>,
    #[serde(default = "default_true")]
    pub show_header: bool,
    #[serde(default)]
    pub max_rows: Option<usize>,
}

impl TableText {
    /// Cells to draw: header (if enabled) followed by the selected rows
    pub fn cells(&self, reading: &SensorReading) -> Vec<Vec<String>> {
        let Some(table) = &reading.value_table else {
            return Vec::new();
        };
        let indices: Vec<usize> = if self.columns.is_empty() {
            (0..table.columns.len()).collect()
        } else {
            self.columns.iter().map(|c| c.index).collect()
        };
        let pick = |row: &[String]| -> Vec<String> {
            indices
                .iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        };

        let mut cells = Vec::new();
        if self.show_header {
            cells.push(pick(table.columns.as_slice()));
        }
        let limit = self.max_rows.unwrap_or(usize::MAX);
        cells.extend(table.rows.iter().take(limit).map(|r| pick(r.as_slice())));
        cells
    }

    /// Fixed width for a column position, `None` for auto
    pub fn fixed_width(&self, column: usize) -> Option<f64> {
        self.columns
            .get(column)
            .filter(|c| c.width > 0)
            .map(|c| c.width as f64)
    }
}

impl TextItem {
    pub fn new(base: ItemBase, content: TextContent) -> Self {
        Self {
            base,
            style: TextStyle::default(),
            content,
        }
    }

    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(
            ItemBase::default(),
            TextContent::Literal { text: text.into() },
        )
    }

    /// Resolve what this item shows right now and in which color.
    ///
    /// A missing sensor reading yields an empty string in the base color.
    pub fn evaluate_text_and_color(
        &self,
        source: &dyn SensorSource,
        now: &DateTime<Local>,
    ) -> (String, Color) {
        let color = self.style.color;
        match &self.content {
            TextContent::Literal { text } => (resolve_macros(text, now), color),
            TextContent::Clock { format } => (format_time(now, format, DEFAULT_CLOCK_FORMAT), color),
            TextContent::Calendar { format } => {
                (format_time(now, format, DEFAULT_CALENDAR_FORMAT), color)
            }
            TextContent::Sensor(binding) => match source.read(&binding.sensor) {
                Some(reading) => {
                    let color = binding
                        .thresholds
                        .map(|t| t.pick(reading.value_now, color))
                        .unwrap_or(color);
                    (binding.format(&reading), color)
                }
                None => {
                    log::trace!("No reading for {} ({})", binding.sensor, self.base.name);
                    (String::new(), color)
                }
            },
            TextContent::Table(table) => {
                let text = source
                    .read(&table.sensor)
                    .map(|r| {
                        table
                            .cells(&r)
                            .iter()
                            .map(|row| row.join("\t"))
                            .collect::<Vec<_>>()
                            .join("\n")
                    })
                    .unwrap_or_default();
                (text, color)
            }
        }
    }
}

/// strftime formatting that never panics on a bad format string
pub fn format_time(now: &DateTime<Local>, format: &str, fallback: &str) -> String {
    let valid = !StrftimeItems::new(format).any(|item| matches!(item, Item::Error));
    if valid {
        now.format(format).to_string()
    } else {
        log::warn!("Invalid time format '{}', using '{}'", format, fallback);
        now.format(fallback).to_string()
    }
}

/// Replace `{macro}` placeholders with their current values
pub fn resolve_macros(text: &str, now: &DateTime<Local>) -> String {
    if !text.contains('{') {
        return text.to_string();
    }
    MACRO_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let arg = caps.get(2).map(|m| m.as_str());
            match &caps[1] {
                "time" => format_time(now, arg.unwrap_or(DEFAULT_CLOCK_FORMAT), DEFAULT_CLOCK_FORMAT),
                "date" => format_time(now, arg.unwrap_or("%Y-%m-%d"), "%Y-%m-%d"),
                "weekday" => now.format("%A").to_string(),
                "nl" => "\n".to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorTable;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 15, 12, 34, 56).unwrap()
    }

    struct Reading(SensorReading);

    impl SensorSource for Reading {
        fn read(&self, _id: &SensorId) -> Option<SensorReading> {
            Some(self.0.clone())
        }
    }

    #[test]
    fn test_macro_resolution() {
        let now = noon();
        assert_eq!(resolve_macros("at {time:%H:%M}", &now), "at 12:34");
        assert_eq!(resolve_macros("{date}", &now), "2024-03-15");
        assert_eq!(resolve_macros("{weekday}{nl}x", &now), "Friday\nx");
        assert_eq!(resolve_macros("{unknown}", &now), "{unknown}");
    }

    #[test]
    fn test_bad_format_falls_back() {
        let now = noon();
        assert_eq!(format_time(&now, "%Q", "%H"), "12");
    }

    #[test]
    fn test_sensor_text_with_thresholds() {
        let mut binding = SensorText::new(SensorId::plugin("cpu"));
        binding.decimals = 1;
        binding.thresholds = Some(ThresholdColors {
            warn_at: 60.0,
            warn_color: Color::new(1.0, 1.0, 0.0, 1.0),
            critical_at: 90.0,
            critical_color: Color::new(1.0, 0.0, 0.0, 1.0),
        });
        let item = TextItem::new(ItemBase::default(), TextContent::Sensor(binding));
        let source = Reading(SensorReading::numeric(72.26, "%"));

        let (text, color) = item.evaluate_text_and_color(&source, &noon());
        assert_eq!(text, "72.3%");
        assert_eq!(color, Color::new(1.0, 1.0, 0.0, 1.0));
    }

    #[test]
    fn test_missing_sensor_is_blank() {
        let item = TextItem::new(
            ItemBase::default(),
            TextContent::Sensor(SensorText::new(SensorId::aida("none"))),
        );
        let (text, color) = item.evaluate_text_and_color(&crate::sensor::NullSensorSource, &noon());
        assert!(text.is_empty());
        assert_eq!(color, item.style.color);
    }

    #[test]
    fn test_table_cells_selection() {
        let reading = SensorReading {
            value_table: Some(SensorTable {
                columns: vec!["Name".into(), "CPU".into(), "Mem".into()],
                rows: vec![
                    vec!["a".into(), "1".into(), "10".into()],
                    vec!["b".into(), "2".into(), "20".into()],
                    vec!["c".into(), "3".into(), "30".into()],
                ],
            }),
            ..Default::default()
        };
        let table = TableText {
            sensor: SensorId::plugin("procs"),
            columns: vec![
                TableColumn { index: 2, width: 0 },
                TableColumn { index: 0, width: 80 },
            ],
            show_header: true,
            max_rows: Some(2),
        };
        let cells = table.cells(&reading);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], vec!["Mem", "Name"]);
        assert_eq!(cells[2], vec!["20", "b"]);
        assert_eq!(table.fixed_width(0), None);
        assert_eq!(table.fixed_width(1), Some(80.0));
    }
}
