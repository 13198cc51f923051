use std::time::Instant;

/// 接入层收到的原始报文（一连接一报文）。
#[derive(Debug, Clone)]
pub struct RawEvent {
    pub connection_id: String,
    pub peer: String,
    pub payload: Vec<u8>,
    pub received_at: Instant,
}
