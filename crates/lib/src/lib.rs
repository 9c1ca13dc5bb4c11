//! Chatbridge core library — Google Chat webhook adapter: inbound normalization,
//! outbound rendering and delivery, configuration.

pub mod channels;
pub mod config;
pub mod gateway;
pub mod init;
