// Infrastructure layer - External dependencies and adapters
pub mod backend_message;
pub mod config;
pub mod http_history;
pub mod json_lines_source;
pub mod simulated_source;
