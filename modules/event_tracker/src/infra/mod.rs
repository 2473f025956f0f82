pub mod events;
pub mod notify;
pub mod storage;
pub mod suggest;
