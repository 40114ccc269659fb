// Application layer - view lifecycle and the ports it depends on
pub mod equipment_view;
pub mod event_hub;
pub mod event_source;
pub mod history_source;
pub mod view_service;
