pub mod data;
pub mod sensor;

pub use data::RawEvent;
pub use sensor::{
    MotionState, SensorState, TelemetryMessage, TelemetryUpdate, key_to_counter,
};
