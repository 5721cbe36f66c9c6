use std::collections::BTreeMap;

use crate::model::{DepartmentCount, Employee, EmployeeStatistics, PositionCount};

/// Aggregate a full roster in one pass.
///
/// Groups are keyed by exact string value and emitted in ascending key order.
pub fn summarize(records: &[Employee]) -> EmployeeStatistics {
    if records.is_empty() {
        return EmployeeStatistics::empty();
    }

    let mut age_sum: i64 = 0;
    let mut by_position: BTreeMap<&str, u64> = BTreeMap::new();
    let mut by_department: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        age_sum += i64::from(record.age);
        *by_position.entry(record.position.as_str()).or_default() += 1;
        *by_department.entry(record.department.as_str()).or_default() += 1;
    }

    let total = records.len() as u64;
    EmployeeStatistics {
        total,
        average_age: round_to_hundredths(age_sum as f64 / total as f64),
        count_by_position: by_position
            .into_iter()
            .map(|(position, count)| PositionCount {
                position: position.to_string(),
                count,
            })
            .collect(),
        count_by_department: by_department
            .into_iter()
            .map(|(department, count)| DepartmentCount {
                department: department.to_string(),
                count,
            })
            .collect(),
    }
}

/// Round to two decimals, halves away from zero.
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
