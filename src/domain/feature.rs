// Feature registry - every sensor type seen by a view, plus display selection
use serde::Serialize;
use std::collections::BTreeSet;

/// Alphabetically ordered set of sensor types ever observed.
///
/// Entries are never removed: a sensor that stops reporting stays selectable
/// for the life of the view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureRegistry {
    features: BTreeSet<String>,
}

impl FeatureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the sensor type had not been seen before.
    pub fn observe(&mut self, sensor_type: &str) -> bool {
        if self.features.contains(sensor_type) {
            return false;
        }
        self.features.insert(sensor_type.to_string())
    }

    pub fn contains(&self, sensor_type: &str) -> bool {
        self.features.contains(sensor_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Which features the user asked to display. Empty means "show everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureSelection {
    selected: BTreeSet<String>,
}

impl FeatureSelection {
    pub fn replace<I, S>(&mut self, features: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = features.into_iter().map(Into::into).collect();
    }

    /// Flip one feature in or out of the selection; returns whether it is now selected.
    pub fn toggle(&mut self, feature: &str) -> bool {
        if self.selected.remove(feature) {
            false
        } else {
            self.selected.insert(feature.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }

    pub fn is_visible(&self, feature: &str) -> bool {
        self.selected.is_empty() || self.selected.contains(feature)
    }

    /// Registry entries currently shown, in registry order.
    pub fn visible(&self, registry: &FeatureRegistry) -> BTreeSet<String> {
        registry
            .iter()
            .filter(|f| self.is_visible(f))
            .map(str::to_string)
            .collect()
    }
}
