//! Built-in sensor sources

mod demo;

pub use demo::{demo_profile, DemoSensor, DemoSensorSource, Waveform};
