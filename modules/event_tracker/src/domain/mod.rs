pub mod accounts;
pub mod conflict;
pub mod datetime;
pub mod error;
pub mod events;
pub mod export;
pub mod index;
pub mod ports;
pub mod repo;
pub mod service;
pub mod suggestion;
pub mod validation;
