//! Member administration service for a gym
//!
//! Staff manage member records, their plans and renewal dates, monthly check-ins and profile
//! photos through a small JSON API.

pub mod adapters;
pub mod commands;
pub mod config;
pub mod domain;
pub mod http;
pub mod ports;
