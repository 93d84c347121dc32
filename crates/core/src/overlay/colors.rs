//! RGB colors shared by the overlays.

pub const WHITE: [u8; 3] = [255, 255, 255];
pub const RED: [u8; 3] = [255, 0, 0];
pub const BLUE: [u8; 3] = [0, 0, 255];
pub const MAGENTA: [u8; 3] = [255, 0, 255];
