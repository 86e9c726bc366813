/// Pixel buffers for sources and destination surfaces
pub mod buffer;
/// Rectangular work units over a surface
pub mod chunk;
/// Accounting of live surface memory
pub mod ledger;
/// Scaled tile size under texture limits
pub mod size;
