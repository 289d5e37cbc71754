/// Maximum number of members a room admits.
pub const ROOM_CAPACITY: usize = 2;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Path the relay serves its WebSocket endpoint on.
pub const SIGNALING_PATH: &str = "/ws";
