// Copyright 2024 by the degopt contributors
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except in compliance with
// the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied. See the License for the
// specific language governing permissions and limitations under the License.

//! Readers for the documented input formats (`params.props`, `cls.csv`,
//! `*.grp`, the per-student lists and `estimated_grades.txt`) and the JSON
//! schedule export. All files are read once during startup; parse errors are
//! fatal and name the offending file row.

pub mod courses;
pub mod groups;
pub mod params;
pub mod student;

use serde_json::json;

use crate::catalog::Catalog;
use crate::groups::GroupRegistry;
use crate::solution::Schedule;

/// Iterate the significant lines of a line-oriented input file: empty lines
/// and lines starting with `#` are skipped. Yields 1-based line numbers for
/// diagnostics.
pub(crate) fn significant_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Split a data line into its semicolon-separated fields, trimming each.
pub(crate) fn split_fields(line: &str) -> Vec<&str> {
    line.split(';').map(str::trim).collect()
}

/// Write the calculated schedule as simple JSON representation (canonical
/// serde_json serialization of the `Schedule` term array) to a Writer (e.g.
/// an output file).
pub fn write_schedule<W: std::io::Write>(writer: W, schedule: &Schedule) -> Result<(), String> {
    let s: serde_json::Value = serde_json::to_value(schedule).map_err(|e| format!("{}", e))?;
    let data = json!({
        "format": "X-degreeplan-simple",
        "version": "1.0",
        "schedule": s
    });
    serde_json::to_writer(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}

/// Assert that the loaded catalog and group data is consistent (in terms of
/// dense course indexes and cross-referenced codes). Run in debug builds
/// after loading, in addition to the fatal `validate()` passes.
pub fn assert_data_consistency(catalog: &Catalog, groups: &GroupRegistry) {
    for (i, course) in catalog.courses().iter().enumerate() {
        assert_eq!(i, course.index, "Index of course {} is {}", i, course.index);
        assert!(course.credits > 0, "Course {} has zero credits", course.code);
        assert!(
            course.difficulty <= 10,
            "Difficulty of course {} is out of range",
            course.code
        );
        for clause in course.prereqs.iter() {
            for code in clause.iter() {
                assert!(
                    catalog.get(code).is_some(),
                    "Prerequisite {} of course {} is invalid",
                    code,
                    course.code
                );
            }
        }
        for code in course.coreqs.iter() {
            assert!(
                catalog.get(code).is_some(),
                "Co-requisite {} of course {} is invalid",
                code,
                course.code
            );
        }
    }
    for group in groups.iter() {
        for code in group.members.iter() {
            assert!(
                catalog.get(code).is_some(),
                "Member {} of group {} is invalid",
                code,
                group.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significant_lines() {
        let text = "# comment\n\nA;B\n  # another\nC\n";
        let lines: Vec<(usize, &str)> = significant_lines(text).collect();
        assert_eq!(lines, vec![(3, "A;B"), (5, "C")]);
    }

    #[test]
    fn test_write_schedule() {
        let schedule = Schedule::new(vec![Some(0), Some(2), None]);
        let mut buf = Vec::new();
        write_schedule(&mut buf, &schedule).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["format"], "X-degreeplan-simple");
        assert_eq!(value["schedule"], serde_json::json!([0, 2, null]));
    }
}
