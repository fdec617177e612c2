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

//! Readers for the per-student files `passedcourses.txt` and
//! `desiredcourses.txt`.
//!
//! Both files are semicolon-separated, but they stay separate readers with
//! separate result types: passed courses are a bare code set while desired
//! entries carry an allowed-terms expression.

use std::collections::BTreeSet;
use std::io::Read;

use crate::calendar;
use crate::{DesiredCourse, TermPref};

/// Read `passedcourses.txt`: semicolon-separated course codes, any number of
/// codes per line.
pub fn read_passed<R: Read>(mut reader: R) -> Result<BTreeSet<String>, String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| format!("Could not read passed-courses file: {}", e))?;

    let mut passed = BTreeSet::new();
    for (_, line) in super::significant_lines(&text) {
        for code in super::split_fields(line) {
            if !code.is_empty() {
                passed.insert(code.to_owned());
            }
        }
    }
    Ok(passed)
}

/// Read `desiredcourses.txt`: one course per line, `code[;terms]`.
///
/// The terms field is one of `allterms`, `allotherterms`, a space-separated
/// list of term tokens, or empty for NOT-TO-TAKE. A line without the field is
/// a plain desired course (`allterms`). Term tokens are validated here;
/// resolving them against the calendar happens at solve time.
pub fn read_desired<R: Read>(mut reader: R) -> Result<Vec<DesiredCourse>, String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| format!("Could not read desired-courses file: {}", e))?;

    let mut desired = Vec::new();
    for (lineno, line) in super::significant_lines(&text) {
        let fields = super::split_fields(line);
        let code = fields[0];
        if code.is_empty() {
            return Err(format!("desired line {}: empty course code", lineno));
        }
        let terms = match fields.get(1) {
            None => TermPref::AllTerms,
            Some(expr) => parse_term_pref(expr)
                .map_err(|e| format!("desired line {}: {}", lineno, e))?,
        };
        desired.push(DesiredCourse {
            code: code.to_owned(),
            terms,
        });
    }
    Ok(desired)
}

fn parse_term_pref(expr: &str) -> Result<TermPref, String> {
    match expr {
        "" => Ok(TermPref::NotToTake),
        "allterms" => Ok(TermPref::AllTerms),
        "allotherterms" => Ok(TermPref::AllOtherTerms),
        tokens => {
            let tokens: Vec<String> = tokens
                .split_whitespace()
                .map(str::to_owned)
                .collect();
            for token in tokens.iter() {
                calendar::parse_term_token(token)?;
            }
            Ok(TermPref::Explicit(tokens))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_passed() {
        let text = "# passed so far\nCS101;MA101\nPH101\n";
        let passed = read_passed(text.as_bytes()).unwrap();
        assert_eq!(
            passed,
            ["CS101", "MA101", "PH101"]
                .iter()
                .map(|c| (*c).to_owned())
                .collect()
        );
    }

    #[test]
    fn test_read_desired() {
        let text = "CS301\nCS302;allterms\nCS303;\nCS304;allotherterms\nCS305;FA2024 SP2025\n";
        let desired = read_desired(text.as_bytes()).unwrap();
        assert_eq!(desired.len(), 5);
        assert_eq!(desired[0].terms, TermPref::AllTerms);
        assert_eq!(desired[1].terms, TermPref::AllTerms);
        assert_eq!(desired[2].terms, TermPref::NotToTake);
        assert_eq!(desired[3].terms, TermPref::AllOtherTerms);
        assert_eq!(
            desired[4].terms,
            TermPref::Explicit(vec!["FA2024".to_owned(), "SP2025".to_owned()])
        );
    }

    #[test]
    fn test_desired_rejects_bad_tokens() {
        let err = read_desired("CS301;FA24\n".as_bytes()).unwrap_err();
        assert!(err.contains("line 1"), "{}", err);
        assert!(err.contains("FA24"), "{}", err);
    }
}
