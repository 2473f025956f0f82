pub mod http_sms;
pub mod log_only;

pub use http_sms::HttpSmsSender;
pub use log_only::LogOnlySender;
