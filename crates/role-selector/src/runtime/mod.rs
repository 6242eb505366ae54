pub mod boot;
pub mod serve;
pub mod shutdown;
