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

//! Reader for the line-oriented `params.props` file (`key=value` pairs,
//! `#` comments).

use std::collections::HashMap;
use std::io::Read;
use std::str::FromStr;

use crate::{Params, ProgramCodeBonus};

/// Read the program parameters.
///
/// # Errors
///
/// Fails with a message naming the key if a required key is missing or any
/// value does not parse.
pub fn read<R: Read>(mut reader: R) -> Result<Params, String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| format!("Could not read params file: {}", e))?;

    let mut pairs = HashMap::new();
    for (lineno, line) in super::significant_lines(&text) {
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| format!("params line {}: expected key=value, got '{}'", lineno, line))?;
        pairs.insert(key.trim().to_owned(), value.trim().to_owned());
    }

    Ok(Params {
        tc: required(&pairs, "Tc")?,
        cmax: required(&pairs, "Cmax")?,
        cmax_honor: required(&pairs, "CmaxHonor")?,
        summer_cmax: required(&pairs, "SummerCmax")?,
        summer_cmax_honor: required(&pairs, "SummerCmaxHonor")?,
        smax: required(&pairs, "Smax")?,
        max_le_term: required(&pairs, "MaxLETerm")?,
        summer_conc_n_max: required(&pairs, "SummerConcNMax")?,
        thesis_course_code: pairs
            .get("ThesisCourseCode")
            .cloned()
            .ok_or("Missing required parameter 'ThesisCourseCode'")?,
        freshman_max_courses_per_term: optional(&pairs, "FreshmanMaxNumCoursesPerTerm", 0)?,
        min_courses_for_sophomore: optional(&pairs, "MinNumCourses4Sophomore", 0)?,
        program_codes_to_maximize: parse_program_codes(
            pairs.get("ProgramCodes2Maximize").map(String::as_str),
        )?,
        program_code: pairs
            .get("ProgramCode")
            .cloned()
            .ok_or("Missing required parameter 'ProgramCode'")?,
        course_csv_file_header: pairs.get("CourseCSVFileHeader").cloned(),
        min_grade_thres: optional(&pairs, "MinGradeThres", 3.0)?,
        allow_edit: optional(&pairs, "AllowEdit", false)?,
    })
}

fn required<T: FromStr>(pairs: &HashMap<String, String>, key: &str) -> Result<T, String> {
    let value = pairs
        .get(key)
        .ok_or_else(|| format!("Missing required parameter '{}'", key))?;
    value
        .parse()
        .map_err(|_| format!("Could not parse parameter '{}': '{}'", key, value))
}

fn optional<T: FromStr>(
    pairs: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, String> {
    match pairs.get(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| format!("Could not parse parameter '{}': '{}'", key, value)),
    }
}

/// Parse the `ProgramCodes2Maximize` list: semicolon-separated items, each
/// either `CODE` or `CODE\EXCEPTION_GROUP`.
fn parse_program_codes(value: Option<&str>) -> Result<Vec<ProgramCodeBonus>, String> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(Vec::new()),
    };
    let mut result = Vec::new();
    for item in value.split(';').map(str::trim).filter(|i| !i.is_empty()) {
        let (code, exception) = match item.split_once('\\') {
            Some((code, group)) => (code.trim(), Some(group.trim().to_owned())),
            None => (item, None),
        };
        if code.is_empty() {
            return Err(format!(
                "Empty program code in ProgramCodes2Maximize item '{}'",
                item
            ));
        }
        result.push(ProgramCodeBonus {
            code: code.to_owned(),
            exception_group: exception,
        });
    }
    Ok(result)
}
