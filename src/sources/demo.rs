//! Demo sensor source and profile
//!
//! Provides oscillating values for a handful of plugin sensors so a panel
//! can be rendered without any hardware backend.

use std::collections::HashMap;
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use sensor_panel_types::{
    ArcItem, BarItem, ChartStyle, Color, DisplayItem, DonutItem, FontSpec, GradientSpec,
    GradientStyle, GraphItem, GraphMode, GroupItem, ItemBase, Marquee, Profile, SensorId,
    SensorReading, SensorSource, SensorTable, SensorText, ShapeItem, ShapeKind, TableColumn,
    TableText, TextAlign, TextContent, TextItem, VerticalAlign,
};

/// Value generation mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    /// Static value at the middle of the range
    #[default]
    Constant,
    SineWave,
    /// Linear ramp
    Sawtooth,
    Triangle,
    Square,
}

/// One simulated sensor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoSensor {
    pub waveform: Waveform,
    pub min: f64,
    pub max: f64,
    /// Wave period in seconds
    pub period: f64,
    pub unit: String,
}

impl DemoSensor {
    pub fn new(waveform: Waveform, min: f64, max: f64, period: f64, unit: &str) -> Self {
        Self {
            waveform,
            min,
            max,
            period,
            unit: unit.to_string(),
        }
    }

    /// Value `elapsed` into the wave
    pub fn value_at(&self, elapsed: Duration) -> f64 {
        let range = self.max - self.min;
        let t = if self.period > 0.0 {
            (elapsed.as_secs_f64() / self.period).fract()
        } else {
            0.0
        };
        let normalized = match self.waveform {
            Waveform::Constant => 0.5,
            Waveform::SineWave => ((t * TAU).sin() + 1.0) / 2.0,
            Waveform::Sawtooth => t,
            Waveform::Triangle => {
                let phase = t * 2.0;
                if phase <= 1.0 {
                    phase
                } else {
                    2.0 - phase
                }
            }
            Waveform::Square => {
                if t < 0.5 {
                    0.0
                } else {
                    1.0
                }
            }
        };
        self.min + normalized * range
    }
}

/// Sensor source backed by simulated waveforms
pub struct DemoSensorSource {
    sensors: HashMap<String, DemoSensor>,
    start: Instant,
}

impl DemoSensorSource {
    pub fn new() -> Self {
        let mut source = Self {
            sensors: HashMap::new(),
            start: Instant::now(),
        };
        source.insert(SensorId::plugin("demo.cpu"), DemoSensor::new(Waveform::SineWave, 5.0, 95.0, 8.0, "%"));
        source.insert(SensorId::plugin("demo.gpu"), DemoSensor::new(Waveform::Triangle, 20.0, 80.0, 12.0, "%"));
        source.insert(SensorId::plugin("demo.temp"), DemoSensor::new(Waveform::Sawtooth, 35.0, 85.0, 20.0, "°C"));
        source.insert(SensorId::plugin("demo.fan"), DemoSensor::new(Waveform::Square, 800.0, 1800.0, 6.0, "RPM"));
        source.insert(SensorId::plugin("demo.memory"), DemoSensor::new(Waveform::Constant, 0.0, 100.0, 1.0, "%"));
        source
    }

    pub fn insert(&mut self, id: SensorId, sensor: DemoSensor) {
        self.sensors.insert(id.key(), sensor);
    }

    /// Reading `elapsed` after start, independent of the wall clock
    pub fn read_at(&self, id: &SensorId, elapsed: Duration) -> Option<SensorReading> {
        if *id == process_table_sensor() {
            return Some(self.process_table(elapsed));
        }
        let sensor = self.sensors.get(&id.key())?;
        Some(SensorReading::numeric(sensor.value_at(elapsed), sensor.unit.clone()))
    }

    fn process_table(&self, elapsed: Duration) -> SensorReading {
        let rows = ["compositor", "sampler", "decoder"]
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let wave = DemoSensor::new(Waveform::SineWave, 0.0, 30.0, 5.0 + i as f64 * 3.0, "%");
                vec![name.to_string(), format!("{:.1}", wave.value_at(elapsed))]
            })
            .collect();
        SensorReading {
            value_now: 3.0,
            value_table: Some(SensorTable {
                columns: vec!["Process".to_string(), "CPU".to_string()],
                rows,
            }),
            ..Default::default()
        }
    }
}

impl Default for DemoSensorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorSource for DemoSensorSource {
    fn read(&self, id: &SensorId) -> Option<SensorReading> {
        self.read_at(id, self.start.elapsed())
    }
}

fn process_table_sensor() -> SensorId {
    SensorId::plugin("demo.processes")
}

fn chart(sensor: &str, color: Color) -> ChartStyle {
    ChartStyle {
        color,
        background: Some(Color::new(1.0, 1.0, 1.0, 0.06)),
        ..ChartStyle::new(SensorId::plugin(sensor))
    }
}

fn label(name: &str, text: &str, x: i32, y: i32, width: i32) -> DisplayItem {
    let mut item = TextItem::new(
        ItemBase::new(name, x, y, width, 20),
        TextContent::Literal {
            text: text.to_string(),
        },
    );
    item.style.font = FontSpec::new("Sans", 12.0);
    item.style.color = Color::new(0.7, 0.7, 0.75, 1.0);
    DisplayItem::Text(item)
}

/// Profile seeded when no profile file is given
pub fn demo_profile() -> Profile {
    let mut profile = Profile::new("Demo", 480, 320);
    profile.background_color = Color::new(0.06, 0.07, 0.09, 1.0);

    let mut backdrop = ShapeItem::new(ItemBase::new("Backdrop", 8, 8, 464, 304), ShapeKind::Rectangle);
    backdrop.corner_radius = 12.0;
    backdrop.fill_gradient = Some(GradientSpec {
        angle: 90.0,
        ..GradientSpec::new(
            GradientStyle::Linear,
            Color::new(0.12, 0.14, 0.2, 1.0),
            Color::new(0.05, 0.05, 0.08, 1.0),
        )
    });

    let mut clock = TextItem::new(
        ItemBase::new("Clock", 20, 16, 200, 36),
        TextContent::Clock {
            format: "%H:%M:%S".to_string(),
        },
    );
    clock.style.font = FontSpec::new("Sans", 28.0).bold();
    clock.style.color = Color::WHITE;

    let mut date = TextItem::new(
        ItemBase::new("Date", 240, 16, 220, 36),
        TextContent::Literal {
            text: "{weekday} {date:%d.%m.%Y}".to_string(),
        },
    );
    date.style.font = FontSpec::new("Sans", 14.0);
    date.style.align = TextAlign::Right;
    date.style.vertical_align = VerticalAlign::Middle;
    date.style.color = Color::new(0.8, 0.8, 0.85, 1.0);

    let mut cpu_text = TextItem::new(
        ItemBase::new("CPU value", 20, 60, 120, 24),
        TextContent::Sensor(SensorText {
            prefix: "CPU ".to_string(),
            ..SensorText::new(SensorId::plugin("demo.cpu"))
        }),
    );
    cpu_text.style.font = FontSpec::new("Sans", 16.0).bold();
    cpu_text.style.color = Color::WHITE;

    let mut graph = GraphItem::new(ItemBase::new("CPU graph", 20, 88, 280, 80), chart("demo.cpu", Color::new(0.2, 0.7, 1.0, 1.0)));
    graph.fill = Some(Color::new(0.2, 0.7, 1.0, 0.25));
    graph.chart.frame = Some(Color::new(1.0, 1.0, 1.0, 0.2));

    let mut histogram = GraphItem::new(
        ItemBase::new("GPU histogram", 20, 176, 280, 50),
        chart("demo.gpu", Color::new(0.4, 1.0, 0.5, 1.0)),
    );
    histogram.mode = GraphMode::Histogram;
    histogram.thickness = 4.0;
    histogram.chart.auto_scale = true;

    let mut bar = BarItem::new(
        ItemBase::new("Memory bar", 20, 240, 280, 14),
        chart("demo.memory", Color::new(1.0, 0.6, 0.2, 1.0)),
    );
    bar.chart.gradient_color = Some(Color::new(1.0, 0.2, 0.3, 1.0));
    bar.corner_radius = 7.0;

    let mut donut = DonutItem::new(
        ItemBase::new("GPU donut", 320, 70, 130, 130),
        chart("demo.gpu", Color::new(0.4, 1.0, 0.5, 1.0)),
    );
    donut.thickness = 14.0;
    donut.span = 270.0;
    donut.rotation_offset = 135.0;

    let mut arc = ArcItem::new(ItemBase::new("Temperature", 330, 210, 110, 90), SensorId::plugin("demo.temp"));
    arc.min = 30.0;
    arc.max = 90.0;
    arc.show_value = true;
    arc.value_font = FontSpec::new("Sans", 14.0).bold();

    let mut ticker = TextItem::new(
        ItemBase::new("Ticker", 20, 288, 280, 20),
        TextContent::Literal {
            text: "sensor-panel demo - values are simulated waveforms - {time:%H:%M}".to_string(),
        },
    );
    ticker.style.font = FontSpec::new("Sans", 12.0);
    ticker.style.color = Color::new(0.6, 0.8, 1.0, 1.0);
    ticker.style.marquee = Some(Marquee {
        speed: 40.0,
        spacing: 50.0,
    });

    let mut table = TextItem::new(
        ItemBase::new("Processes", 320, 16, 140, 48),
        TextContent::Table(TableText {
            sensor: process_table_sensor(),
            columns: vec![
                TableColumn { index: 0, width: 90 },
                TableColumn { index: 1, width: 0 },
            ],
            show_header: false,
            max_rows: Some(3),
        }),
    );
    table.style.font = FontSpec::new("Monospace", 10.0);
    table.style.color = Color::new(0.7, 0.7, 0.75, 1.0);
    table.base.hidden = true;

    let mut fan_star = ShapeItem::new(ItemBase::new("Fan", 270, 56, 28, 28), ShapeKind::Star);
    fan_star.base.rotation = 18;
    fan_star.fill_gradient = Some(GradientSpec::new(
        GradientStyle::Sweep,
        Color::new(1.0, 0.8, 0.2, 1.0),
        Color::new(1.0, 0.3, 0.1, 1.0),
    ));

    let gauges = GroupItem::new(
        "Gauges",
        vec![
            DisplayItem::Graph(graph),
            DisplayItem::Graph(histogram),
            DisplayItem::Bar(bar),
            DisplayItem::Donut(donut),
            DisplayItem::Arc(arc),
        ],
    );

    profile.items = vec![
        DisplayItem::Shape(backdrop),
        DisplayItem::Text(clock),
        DisplayItem::Text(date),
        DisplayItem::Text(cpu_text),
        DisplayItem::Shape(fan_star),
        DisplayItem::Group(gauges),
        label("Memory label", "Memory", 20, 254, 100),
        DisplayItem::Text(ticker),
        DisplayItem::Text(table),
    ];
    profile
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waveforms_stay_in_range() {
        let modes = [
            Waveform::Constant,
            Waveform::SineWave,
            Waveform::Sawtooth,
            Waveform::Triangle,
            Waveform::Square,
        ];
        for mode in modes {
            let sensor = DemoSensor::new(mode, 10.0, 20.0, 4.0, "");
            for ms in (0..8000).step_by(250) {
                let v = sensor.value_at(Duration::from_millis(ms));
                assert!((10.0..=20.0).contains(&v), "{:?} gave {}", mode, v);
            }
        }
    }

    #[test]
    fn test_waveform_shapes() {
        let saw = DemoSensor::new(Waveform::Sawtooth, 0.0, 100.0, 10.0, "");
        assert!((saw.value_at(Duration::from_secs(5)) - 50.0).abs() < 1e-9);
        let tri = DemoSensor::new(Waveform::Triangle, 0.0, 100.0, 10.0, "");
        assert!((tri.value_at(Duration::from_secs(5)) - 100.0).abs() < 1e-9);
        let square = DemoSensor::new(Waveform::Square, 0.0, 100.0, 10.0, "");
        assert_eq!(square.value_at(Duration::from_secs(2)), 0.0);
        assert_eq!(square.value_at(Duration::from_secs(7)), 100.0);
    }

    #[test]
    fn test_unknown_sensor_reads_none() {
        let source = DemoSensorSource::new();
        assert!(source.read(&SensorId::plugin("nope")).is_none());
        let cpu = source.read_at(&SensorId::plugin("demo.cpu"), Duration::ZERO).unwrap();
        assert_eq!(cpu.unit, "%");
        let table = source.read(&process_table_sensor()).unwrap();
        assert_eq!(table.value_table.unwrap().rows.len(), 3);
    }

    #[test]
    fn test_demo_profile_loads_back_from_json() {
        let profile = demo_profile();
        assert!(profile.item_count() > 10);
        let json = serde_json::to_string(&profile).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back.item_count(), profile.item_count());
        let names: Vec<&str> = back.items.iter().map(|i| i.name()).collect();
        assert_eq!(names[1], "Clock");
    }
}
