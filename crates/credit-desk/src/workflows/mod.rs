pub mod desk;
pub mod gates;
pub mod progress;
