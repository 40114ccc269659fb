// Live equipment telemetry - streaming reassembly of sensor events into chart tables
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
