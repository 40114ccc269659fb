// Event buffer - arrival-ordered history of readings for the viewed equipment
use super::sensor_event::SensorEvent;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("event for equipment {got} refused by buffer for {expected}")]
    ForeignEquipment { expected: String, got: String },
}

/// Append-only log scoped to a single equipment unit.
///
/// Never pruned while the view lives; the window slides over the full history.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    equipment_id: String,
    events: Vec<SensorEvent>,
}

impl EventBuffer {
    pub fn new(equipment_id: impl Into<String>) -> Self {
        Self {
            equipment_id: equipment_id.into(),
            events: Vec::new(),
        }
    }

    pub fn equipment_id(&self) -> &str {
        &self.equipment_id
    }

    pub fn append(&mut self, event: SensorEvent) -> Result<(), BufferError> {
        if event.equipment_id != self.equipment_id {
            return Err(BufferError::ForeignEquipment {
                expected: self.equipment_id.clone(),
                got: event.equipment_id,
            });
        }
        self.events.push(event);
        Ok(())
    }

    pub fn events(&self) -> &[SensorEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop all history and retarget the buffer at another equipment unit.
    pub fn reset(&mut self, equipment_id: impl Into<String>) {
        self.equipment_id = equipment_id.into();
        self.events.clear();
    }
}
