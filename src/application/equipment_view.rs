// Equipment view - owns one buffer and recomputes the chart on every append
use crate::domain::chart::{ChartTable, TimeFormatter};
use crate::domain::event_buffer::{BufferError, EventBuffer};
use crate::domain::feature::{FeatureRegistry, FeatureSelection};
use crate::domain::pivot::pivot;
use crate::domain::sensor_event::SensorEvent;
use crate::domain::time_axis::{DEFAULT_WINDOW, TimeAxis};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ViewSettings {
    pub window: Duration,
    pub formatter: TimeFormatter,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            formatter: TimeFormatter::default(),
        }
    }
}

/// Immutable copy of a view's derived state, handed to readers.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub equipment_id: String,
    pub event_count: usize,
    pub table: ChartTable,
    pub features: FeatureRegistry,
    pub selected: FeatureSelection,
}

impl ViewSnapshot {
    pub fn visible_features(&self) -> Vec<String> {
        self.selected.visible(&self.features).into_iter().collect()
    }

    /// The chart restricted to the features the user chose to display.
    pub fn visible_table(&self) -> ChartTable {
        if self.selected.is_empty() {
            return self.table.clone();
        }
        self.table.restrict_to(&self.selected.visible(&self.features))
    }
}

/// State of the equipment detail chart.
///
/// The buffer and registry belong to this view alone; the chart table is a
/// derived value rebuilt from scratch after each mutation.
#[derive(Debug)]
pub struct EquipmentView {
    buffer: EventBuffer,
    registry: FeatureRegistry,
    selection: FeatureSelection,
    settings: ViewSettings,
    table: ChartTable,
}

impl EquipmentView {
    pub fn open(equipment_id: impl Into<String>, settings: ViewSettings) -> Self {
        Self {
            buffer: EventBuffer::new(equipment_id),
            registry: FeatureRegistry::new(),
            selection: FeatureSelection::default(),
            settings,
            table: ChartTable::default(),
        }
    }

    pub fn equipment_id(&self) -> &str {
        self.buffer.equipment_id()
    }

    pub fn append(&mut self, event: SensorEvent) -> Result<(), BufferError> {
        self.push(event)?;
        self.recompute();
        Ok(())
    }

    /// Load a historical batch. Seeded events are treated exactly like live
    /// ones; the table is rebuilt once at the end. Returns how many were kept.
    pub fn seed(&mut self, events: Vec<SensorEvent>) -> usize {
        let mut accepted = 0;
        for event in events {
            match self.push(event) {
                Ok(()) => accepted += 1,
                Err(e) => tracing::debug!(error = %e, "dropping seed event"),
            }
        }
        self.recompute();
        accepted
    }

    fn push(&mut self, event: SensorEvent) -> Result<(), BufferError> {
        let sensor_type = event.sensor_type.clone();
        self.buffer.append(event)?;
        if self.registry.observe(&sensor_type) {
            tracing::debug!(
                equipment_id = %self.buffer.equipment_id(),
                sensor_type = %sensor_type,
                "new feature observed"
            );
        }
        Ok(())
    }

    fn recompute(&mut self) {
        let axis = TimeAxis::compute(self.buffer.events(), self.settings.window);
        self.table = pivot(self.buffer.events(), &axis, &self.settings.formatter);
    }

    /// Move the view to another equipment unit, discarding all history.
    pub fn switch_to(&mut self, equipment_id: impl Into<String>) {
        self.buffer.reset(equipment_id);
        self.registry = FeatureRegistry::new();
        self.selection.clear();
        self.table = ChartTable::default();
    }

    pub fn table(&self) -> &ChartTable {
        &self.table
    }

    pub fn features(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn selection(&self) -> &FeatureSelection {
        &self.selection
    }

    pub fn select<I, S>(&mut self, features: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.replace(features);
    }

    pub fn toggle(&mut self, feature: &str) -> bool {
        self.selection.toggle(feature)
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn event_count(&self) -> usize {
        self.buffer.len()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        ViewSnapshot {
            equipment_id: self.equipment_id().to_string(),
            event_count: self.buffer.len(),
            table: self.table.clone(),
            features: self.registry.clone(),
            selected: self.selection.clone(),
        }
    }
}
