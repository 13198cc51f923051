//! 传感器汇聚状态与遥测更新类型。

use std::time::{Duration, Instant};

/// 人体感应（PIR）状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionState {
    #[default]
    Inactive,
    Active,
}

impl MotionState {
    /// 报文中的 0/1 标志转换为状态。
    pub fn from_flag(flag: bool) -> Self {
        if flag { Self::Active } else { Self::Inactive }
    }

    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// 单条报文解析后的类型化更新。
#[derive(Debug, Clone, PartialEq)]
pub enum TelemetryUpdate {
    /// 温湿度（TYPE=ENV）
    Environment { temperature: f64, humidity: f64 },
    /// 键盘按键（TYPE=KEYPAD）
    Keypad { key: char },
    /// 人体感应（TYPE=SENSOR），gpio 仅用于诊断
    Motion { gpio: u32, state: MotionState },
    /// 旋转编码器方向（TYPE=ROTARY）
    Rotary { left: bool, right: bool },
}

impl TelemetryUpdate {
    /// 报文 TYPE 字段对应的名称。
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Environment { .. } => "ENV",
            Self::Keypad { .. } => "KEYPAD",
            Self::Motion { .. } => "SENSOR",
            Self::Rotary { .. } => "ROTARY",
        }
    }
}

/// 解析成功的遥测报文。
///
/// `device_id` 只保留用于诊断，不参与状态寻址：同类设备共享同一份状态。
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryMessage {
    pub device_id: i64,
    pub update: TelemetryUpdate,
}

/// 按键字符编码为计数值：数字取其数值，其余字符取字符码。
pub fn key_to_counter(key: char) -> u32 {
    match key.to_digit(10) {
        Some(digit) => digit,
        None => key as u32,
    }
}

/// 网关汇聚的最新传感器状态（进程内单例）。
///
/// `last_update` 为 `None` 表示启动以来从未收到有效报文，此时视为离线。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorState {
    pub temperature: f64,
    pub humidity: f64,
    pub motion: MotionState,
    pub keypad_last_key: u32,
    pub rotary_left_active: bool,
    pub rotary_right_active: bool,
    pub last_device_id: Option<i64>,
    pub last_update: Option<Instant>,
}

impl SensorState {
    /// 应用一条报文：只覆盖该类型涉及的字段，并刷新全局 `last_update`。
    pub fn apply(&mut self, message: &TelemetryMessage, at: Instant) {
        match &message.update {
            TelemetryUpdate::Environment {
                temperature,
                humidity,
            } => {
                self.temperature = *temperature;
                self.humidity = *humidity;
            }
            TelemetryUpdate::Keypad { key } => {
                self.keypad_last_key = key_to_counter(*key);
            }
            TelemetryUpdate::Motion { state, .. } => {
                self.motion = *state;
            }
            TelemetryUpdate::Rotary { left, right } => {
                self.rotary_left_active = *left;
                self.rotary_right_active = *right;
            }
        }
        self.last_device_id = Some(message.device_id);
        self.last_update = Some(at);
    }

    /// 距上次有效报文的时长；从未更新时返回 `None`。
    pub fn elapsed_since_update(&self, now: Instant) -> Option<Duration> {
        self.last_update
            .map(|last| now.saturating_duration_since(last))
    }

    /// 在线判定：`now - last_update < window`。
    pub fn is_live(&self, now: Instant, window: Duration) -> bool {
        match self.elapsed_since_update(now) {
            Some(elapsed) => elapsed < window,
            None => false,
        }
    }
}
