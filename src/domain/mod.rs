// Domain layer - sensor events and the pure windowing engine
pub mod chart;
pub mod event_buffer;
pub mod feature;
pub mod pivot;
pub mod sensor_event;
pub mod time_axis;
