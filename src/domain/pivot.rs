// Pivot/windowing engine - event-per-row to timestamp-per-row, sensor-per-column
use super::chart::{ChartRow, ChartTable, TimeFormatter};
use super::sensor_event::SensorEvent;
use super::time_axis::TimeAxis;
use std::collections::{BTreeMap, BTreeSet};

/// Pivot the windowed events onto the axis.
///
/// Every row gets the same column set: each sensor type with at least one event
/// on the axis. Cells without an observation stay `None`. When several events
/// land on the same `(instant, sensor_type)`, the one appended last wins.
pub fn pivot(events: &[SensorEvent], axis: &TimeAxis, formatter: &TimeFormatter) -> ChartTable {
    if axis.is_empty() {
        return ChartTable::default();
    }

    let placed: Vec<(usize, &SensorEvent)> = events
        .iter()
        .filter_map(|event| {
            let position = event.epoch_ms().and_then(|ms| axis.position(ms))?;
            Some((position, event))
        })
        .collect();

    let columns: BTreeSet<&str> = placed
        .iter()
        .map(|(_, event)| event.sensor_type.as_str())
        .collect();

    let empty_cells: BTreeMap<String, Option<f64>> =
        columns.iter().map(|c| (c.to_string(), None)).collect();

    let mut rows: Vec<ChartRow> = axis
        .instants()
        .iter()
        .enumerate()
        .map(|(index, &t)| ChartRow {
            t,
            index,
            display_time: formatter.format(t),
            values: empty_cells.clone(),
        })
        .collect();

    for (position, event) in placed {
        rows[position]
            .values
            .insert(event.sensor_type.clone(), Some(event.value.coerce()));
    }

    ChartTable {
        columns: columns.into_iter().map(str::to_string).collect(),
        rows,
    }
}
