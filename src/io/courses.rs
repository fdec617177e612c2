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

//! Reader for the semicolon-separated course table `cls.csv` and for the
//! per-student `estimated_grades.txt`.

use std::collections::{BTreeSet, HashMap};
use std::io::Read;

use log::debug;

use crate::catalog::{Catalog, Course, OfferingSpec};

/// Read the course catalog from `cls.csv`.
///
/// Each non-comment line holds
/// `code ; title ; synonyms ; credits ; prereqsCNF ; coreqs ; offeringSpec ;
/// [displayName] ; [difficultyLevel]`. `prereqsCNF` is comma-separated
/// clauses of `+`-separated codes. If `header` is given, a first significant
/// line starting with it is skipped.
///
/// # Errors
///
/// Fails with a message naming the line number on any malformed row.
/// Referential integrity (prerequisites and co-requisites resolving to
/// catalog codes) is checked by [`Catalog::validate`] afterwards.
pub fn read<R: Read>(mut reader: R, header: Option<&str>) -> Result<Catalog, String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| format!("Could not read course file: {}", e))?;

    let mut courses = Vec::new();
    let mut first = true;
    for (lineno, line) in super::significant_lines(&text) {
        if first {
            first = false;
            if let Some(header) = header {
                if line.starts_with(header) {
                    continue;
                }
            }
        }
        courses.push(
            parse_course_line(line)
                .map_err(|e| format!("cls.csv line {}: {}", lineno, e))?,
        );
    }
    debug!("Read {} courses from the course table.", courses.len());
    Catalog::new(courses)
}

fn parse_course_line(line: &str) -> Result<Course, String> {
    let fields = super::split_fields(line);
    if fields.len() < 7 {
        return Err(format!(
            "expected at least 7 fields, got {}",
            fields.len()
        ));
    }
    let code = fields[0];
    if code.is_empty() {
        return Err("empty course code".to_owned());
    }
    let credits: u32 = fields[3]
        .parse()
        .map_err(|_| format!("invalid credits '{}'", fields[3]))?;
    if credits == 0 {
        return Err(format!("course '{}' must have positive credits", code));
    }

    let mut prereqs: Vec<BTreeSet<String>> = if fields[4].is_empty() {
        Vec::new()
    } else {
        fields[4]
            .split(',')
            .map(|clause| {
                let disjuncts: BTreeSet<String> = clause
                    .split('+')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
                    .collect();
                if disjuncts.is_empty() {
                    Err(format!("empty prerequisite clause in '{}'", fields[4]))
                } else {
                    Ok(disjuncts)
                }
            })
            .collect::<Result<_, _>>()?
    };
    // stable clause order keeps the emitted model diffable
    prereqs.sort();
    prereqs.dedup();
    let coreqs: BTreeSet<String> = fields[5]
        .split_whitespace()
        .map(str::to_owned)
        .collect();

    let offering = OfferingSpec::parse(fields[6])?;

    let display_name = fields
        .get(7)
        .filter(|f| !f.is_empty())
        .map(|f| (*f).to_owned());
    let difficulty = match fields.get(8).filter(|f| !f.is_empty()) {
        Some(f) => {
            let level: u32 = f
                .parse()
                .map_err(|_| format!("invalid difficulty level '{}'", f))?;
            if level > 10 {
                return Err(format!("difficulty level {} out of range 0..=10", level));
            }
            level
        }
        None => 0,
    };

    Ok(Course {
        index: 0,
        code: code.to_owned(),
        title: fields[1].to_owned(),
        synonyms: fields[2].split_whitespace().map(str::to_owned).collect(),
        credits,
        prereqs,
        coreqs,
        offering,
        display_name,
        difficulty,
        est_grade: 0.0,
    })
}

/// Read `estimated_grades.txt` (`code,grade` lines). Grades below the
/// threshold are ignored; grades outside `[0, 4.0]` are rejected.
pub fn read_estimated_grades<R: Read>(
    mut reader: R,
    min_grade_thres: f32,
) -> Result<HashMap<String, f32>, String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| format!("Could not read grades file: {}", e))?;

    let mut grades = HashMap::new();
    for (lineno, line) in super::significant_lines(&text) {
        let (code, grade) = line
            .split_once(',')
            .ok_or_else(|| format!("grades line {}: expected code,grade", lineno))?;
        let grade: f32 = grade
            .trim()
            .parse()
            .map_err(|_| format!("grades line {}: invalid grade '{}'", lineno, grade.trim()))?;
        if !(0.0..=4.0).contains(&grade) {
            return Err(format!(
                "grades line {}: grade {} out of range [0, 4.0]",
                lineno, grade
            ));
        }
        if grade >= min_grade_thres {
            grades.insert(code.trim().to_owned(), grade);
        }
    }
    Ok(grades)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OfferingRule;

    #[test]
    fn test_read_course_table() {
        let text = "# the catalog\n\
                    CS101;Intro to Programming;;4;;;alltimes;;2\n\
                    CS201;Data Structures;CS201X;4;CS101;;everyfall everyspring;Structures;5\n\
                    MA210;Linear Algebra;;3;MA101+MA102,CS101;CS201;next2terms\n";
        let catalog = read(text.as_bytes(), None).unwrap();
        assert_eq!(catalog.len(), 3);

        let cs201 = catalog.get("CS201").unwrap();
        assert_eq!(cs201.credits, 4);
        assert_eq!(cs201.synonyms, vec!["CS201X"]);
        assert_eq!(cs201.display_name.as_deref(), Some("Structures"));
        assert_eq!(cs201.difficulty, 5);
        assert_eq!(cs201.prereqs.len(), 1);
        assert_eq!(
            cs201.offering.0,
            vec![OfferingRule::EveryFall, OfferingRule::EverySpring]
        );
        assert_eq!(catalog.get("CS201X").unwrap().code, "CS201");

        let ma210 = catalog.get("MA210").unwrap();
        assert_eq!(ma210.prereqs.len(), 2);
        // clauses are sorted for stable emission
        assert!(ma210.prereqs[0].contains("CS101"));
        assert!(ma210.prereqs[1].contains("MA101"));
        assert!(ma210.prereqs[1].contains("MA102"));
        assert!(ma210.coreqs.contains("CS201"));
        assert_eq!(ma210.difficulty, 0);
    }

    #[test]
    fn test_header_line_skipped() {
        let text = "code;title;synonyms;credits\nCS101;Intro;;4;;;alltimes\n";
        let catalog = read(text.as_bytes(), Some("code;")).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_malformed_rows() {
        let err = read("CS101;Intro;;4\n".as_bytes(), None).unwrap_err();
        assert!(err.contains("line 1"), "{}", err);
        let err = read("CS101;Intro;;four;;;alltimes\n".as_bytes(), None).unwrap_err();
        assert!(err.contains("invalid credits"), "{}", err);
        let err = read("CS101;Intro;;4;;;alltimes;;11\n".as_bytes(), None).unwrap_err();
        assert!(err.contains("difficulty"), "{}", err);
        let err = read("CS101;Intro;;0;;;alltimes\n".as_bytes(), None).unwrap_err();
        assert!(err.contains("positive credits"), "{}", err);
    }

    #[test]
    fn test_read_estimated_grades() {
        let text = "CS101,3.7\nCS201,2.5\n# comment\nMA210,3.0\n";
        let grades = read_estimated_grades(text.as_bytes(), 3.0).unwrap();
        assert_eq!(grades.len(), 2);
        assert!((grades["CS101"] - 3.7).abs() < f32::EPSILON);
        // below the threshold
        assert!(!grades.contains_key("CS201"));

        assert!(read_estimated_grades("CS101,5.0\n".as_bytes(), 3.0).is_err());
        assert!(read_estimated_grades("CS101 3.7\n".as_bytes(), 3.0).is_err());
    }
}
