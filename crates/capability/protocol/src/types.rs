//! 点表相关类型定义

use std::fmt;

/// 点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    Binary,
    Analog,
    Counter,
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Binary => "binary",
            Self::Analog => "analog",
            Self::Counter => "counter",
        };
        f.write_str(name)
    }
}

/// 点值
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointValue {
    Binary(bool),
    Analog(f64),
    Counter(u32),
}

impl PointValue {
    pub fn kind(&self) -> PointKind {
        match self {
            Self::Binary(_) => PointKind::Binary,
            Self::Analog(_) => PointKind::Analog,
            Self::Counter(_) => PointKind::Counter,
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(v) => write!(f, "{}", v),
            Self::Analog(v) => write!(f, "{}", v),
            Self::Counter(v) => write!(f, "{}", v),
        }
    }
}

/// 单点更新
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointUpdate {
    pub index: u16,
    pub value: PointValue,
}

/// 一个发布周期内的全部点更新（按加入顺序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Updates {
    items: Vec<PointUpdate>,
}

impl Updates {
    pub fn iter(&self) -> impl Iterator<Item = &PointUpdate> {
        self.items.iter()
    }
}

impl IntoIterator for Updates {
    type Item = PointUpdate;
    type IntoIter = std::vec::IntoIter<PointUpdate>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// 更新批次构造器
#[derive(Debug, Default)]
pub struct UpdateBuilder {
    items: Vec<PointUpdate>,
}

impl UpdateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, index: u16, value: bool) -> Self {
        self.items.push(PointUpdate {
            index,
            value: PointValue::Binary(value),
        });
        self
    }

    pub fn analog(mut self, index: u16, value: f64) -> Self {
        self.items.push(PointUpdate {
            index,
            value: PointValue::Analog(value),
        });
        self
    }

    pub fn counter(mut self, index: u16, value: u32) -> Self {
        self.items.push(PointUpdate {
            index,
            value: PointValue::Counter(value),
        });
        self
    }

    pub fn build(self) -> Updates {
        Updates { items: self.items }
    }
}
