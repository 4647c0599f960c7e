pub mod device;
pub mod wav;
