pub mod options;
pub mod response;
pub mod shipping;
