//! Register definitions for the SX127x radio in LoRa mode
//! Generated from the SX1276/77/78/79 datasheet rev. 7, section 6.4

mod dio;
mod modem;
mod packet;
mod rf;
mod system;

pub use dio::*;
pub use modem::*;
pub use packet::*;
pub use rf::*;
pub use system::*;
