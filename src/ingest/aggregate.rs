//! Statistics aggregation: validated records -> `Summary`.

use std::collections::BTreeMap;

use crate::model::{EquipmentRecord, Summary};

/// Arithmetic mean, defined as 0.0 for an empty input.
///
/// Zero-row uploads are valid, so the averages of an empty summary are 0.0
/// rather than NaN; rendering formats them the same way.
///
/// Finite inputs always give a finite mean: when the plain sum overflows,
/// each value is scaled by `1/count` before summing instead.
fn mean(values: impl Iterator<Item = f64> + Clone, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let n = count as f64;
    let sum: f64 = values.clone().sum();
    if sum.is_finite() {
        return sum / n;
    }
    values.map(|v| v / n).sum::<f64>().clamp(f64::MIN, f64::MAX)
}

/// Reduce validated records to a summary.
///
/// Pure: the same records always produce the same summary. The records are
/// carried through verbatim as the summary's `table`.
pub fn aggregate(records: &[EquipmentRecord]) -> Summary {
    let n = records.len();

    let mut type_distribution: BTreeMap<String, u64> = BTreeMap::new();
    for record in records {
        *type_distribution
            .entry(record.equipment_type.clone())
            .or_insert(0) += 1;
    }

    Summary {
        total_count: n as u64,
        avg_flowrate: mean(records.iter().map(|r| r.flowrate), n),
        avg_pressure: mean(records.iter().map(|r| r.pressure), n),
        avg_temperature: mean(records.iter().map(|r| r.temperature), n),
        type_distribution,
        table: records.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, ty: &str, flow: f64, pressure: f64, temp: f64) -> EquipmentRecord {
        EquipmentRecord {
            name: name.to_string(),
            equipment_type: ty.to_string(),
            flowrate: flow,
            pressure,
            temperature: temp,
        }
    }

    #[test]
    fn test_pump_valve_scenario() {
        let records = vec![
            record("P-1", "Pump", 10.0, 1.0, 100.0),
            record("P-2", "Pump", 20.0, 2.0, 200.0),
            record("V-1", "Valve", 30.0, 3.0, 300.0),
        ];
        let summary = aggregate(&records);

        assert_eq!(summary.total_count, 3);
        assert!((summary.avg_flowrate - 20.0).abs() < 1e-9);
        assert!((summary.avg_pressure - 2.0).abs() < 1e-9);
        assert!((summary.avg_temperature - 200.0).abs() < 1e-9);
        assert_eq!(summary.type_distribution.len(), 2);
        assert_eq!(summary.type_distribution["Pump"], 2);
        assert_eq!(summary.type_distribution["Valve"], 1);
        assert_eq!(summary.table, records);
    }

    #[test]
    fn test_empty_records_average_to_zero() {
        let summary = aggregate(&[]);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.avg_flowrate, 0.0);
        assert_eq!(summary.avg_pressure, 0.0);
        assert_eq!(summary.avg_temperature, 0.0);
        assert!(summary.type_distribution.is_empty());
        assert!(summary.table.is_empty());
    }

    #[test]
    fn test_distribution_counts_sum_to_total() {
        let types = ["Pump", "Valve", "Pump", "Compressor", "HeatExchanger", "Valve", "Pump"];
        let records: Vec<EquipmentRecord> = types
            .iter()
            .enumerate()
            .map(|(i, ty)| record(&format!("E-{i}"), ty, i as f64, 1.0, 2.0))
            .collect();
        let summary = aggregate(&records);

        let sum: u64 = summary.type_distribution.values().sum();
        assert_eq!(sum, summary.total_count);
        assert_eq!(summary.total_count, types.len() as u64);
        assert_eq!(summary.type_distribution["Pump"], 3);
    }

    #[test]
    fn test_aggregate_is_referentially_transparent() {
        let records = vec![
            record("A", "Pump", 0.1, 0.2, 0.3),
            record("B", "Valve", 1e-3, 7.7, 19.1),
            record("C", "Pump", 3.3, 1.1, 2.2),
        ];
        let first = aggregate(&records);
        let second = aggregate(&records);
        assert_eq!(first, second);
        assert_eq!(first.avg_flowrate.to_bits(), second.avg_flowrate.to_bits());
    }

    #[test]
    fn test_large_magnitudes_average_without_overflow() {
        let records = vec![
            record("A", "Pump", 1e308, -1e308, f64::MAX),
            record("B", "Pump", 1e308, -1e308, f64::MAX),
        ];
        let summary = aggregate(&records);

        assert!(summary.averages_are_finite());
        assert_eq!(summary.avg_flowrate, 1e308);
        assert_eq!(summary.avg_pressure, -1e308);
        assert_eq!(summary.avg_temperature, f64::MAX);
    }

    #[test]
    fn test_opposite_extremes_average_to_zero() {
        let records = vec![
            record("A", "Pump", f64::MAX, 1.0, 1.0),
            record("B", "Pump", f64::MAX, 1.0, 1.0),
            record("C", "Pump", -f64::MAX, 1.0, 1.0),
            record("D", "Pump", -f64::MAX, 1.0, 1.0),
        ];
        let summary = aggregate(&records);
        assert!(summary.avg_flowrate.is_finite());
        assert!(summary.avg_flowrate.abs() < 1e300);
    }

    #[test]
    fn test_table_preserves_input_order() {
        let records = vec![
            record("Z", "Valve", 1.0, 1.0, 1.0),
            record("A", "Pump", 2.0, 2.0, 2.0),
        ];
        let summary = aggregate(&records);
        assert_eq!(summary.table[0].name, "Z");
        assert_eq!(summary.table[1].name, "A");
    }
}
