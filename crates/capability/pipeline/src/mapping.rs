//! 汇聚状态到点表的固定映射。
//!
//! | 点 | 索引 | 来源 |
//! |---|---|---|
//! | Binary | 0 | 在线标志 |
//! | Analog | 0 | ENV.TEMP |
//! | Analog | 1 | ENV.HUM |
//! | Analog | 2 | SENSOR.STATE |
//! | Analog | 3 | ROTARY.L |
//! | Analog | 4 | ROTARY.R |
//! | Counter | 0 | KEYPAD.KEY |

use domain::SensorState;
use scada_protocol::{DatabaseConfig, UpdateBuilder, Updates};

pub const ONLINE_BINARY: u16 = 0;
pub const TEMPERATURE_ANALOG: u16 = 0;
pub const HUMIDITY_ANALOG: u16 = 1;
pub const MOTION_ANALOG: u16 = 2;
pub const ROTARY_LEFT_ANALOG: u16 = 3;
pub const ROTARY_RIGHT_ANALOG: u16 = 4;
pub const KEYPAD_COUNTER: u16 = 0;

/// 映射所需的点表声明。
pub fn database_config() -> DatabaseConfig {
    DatabaseConfig {
        binary_count: 1,
        analog_count: 5,
        counter_count: 1,
    }
}

/// 由快照和在线标志生成一个周期的点更新。
pub fn build_updates(state: &SensorState, online: bool) -> Updates {
    UpdateBuilder::new()
        .binary(ONLINE_BINARY, online)
        .analog(TEMPERATURE_ANALOG, state.temperature)
        .analog(HUMIDITY_ANALOG, state.humidity)
        .analog(MOTION_ANALOG, flag(state.motion.is_active()))
        .analog(ROTARY_LEFT_ANALOG, flag(state.rotary_left_active))
        .analog(ROTARY_RIGHT_ANALOG, flag(state.rotary_right_active))
        .counter(KEYPAD_COUNTER, state.keypad_last_key)
        .build()
}

fn flag(active: bool) -> f64 {
    if active { 1.0 } else { 0.0 }
}
