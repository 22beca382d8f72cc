pub mod local_alert;
pub mod meteorological;
pub mod point;
pub mod user;
