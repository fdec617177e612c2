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

//! The in-memory course catalog: course records with CNF prerequisites,
//! co-requisites and offering rules, plus the closure queries the model
//! builder and the solution views rely on.

use std::collections::{BTreeSet, HashMap, HashSet};

use log::warn;

use crate::calendar::{self, Calendar, Season};

/// A single rule of an offering specification.
#[derive(Clone, Debug, PartialEq)]
pub enum OfferingRule {
    /// `alltimes`: every future slot
    AllTimes,
    /// `everyfall`
    EveryFall,
    /// `everyspring`
    EverySpring,
    /// `everysummerterm`: every ST slot
    EverySummerTerm,
    /// `next2terms`: slots 1 and 2
    NextTwoTerms,
    /// `next4terms`: slots 1 through 4
    NextFourTerms,
    /// An explicit term token such as `FA2023`
    Term(String),
}

/// Symbolic offering specification: the union of its rules. An empty rule list
/// (spec `-`) means the course is offered nowhere.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OfferingSpec(pub Vec<OfferingRule>);

impl OfferingSpec {
    /// Parse a space-separated offering expression. `-` yields the empty spec.
    pub fn parse(expr: &str) -> Result<OfferingSpec, String> {
        let expr = expr.trim();
        if expr == "-" || expr.is_empty() {
            return Ok(OfferingSpec(Vec::new()));
        }
        let mut rules = Vec::new();
        for token in expr.split_whitespace() {
            let rule = match token {
                "alltimes" => OfferingRule::AllTimes,
                "everyfall" => OfferingRule::EveryFall,
                "everyspring" => OfferingRule::EverySpring,
                "everysummerterm" => OfferingRule::EverySummerTerm,
                "next2terms" => OfferingRule::NextTwoTerms,
                "next4terms" => OfferingRule::NextFourTerms,
                t => {
                    calendar::parse_term_token(t)?;
                    OfferingRule::Term(t.to_owned())
                }
            };
            rules.push(rule);
        }
        Ok(OfferingSpec(rules))
    }
}

/// A catalog course.
///
/// Prerequisites are carried in CNF: every inner set is a disjunction of codes
/// of which at least one must be completed earlier; all sets must hold.
/// Co-requisites are a flat set of codes that may also be taken in the same
/// slot. The sets are ordered (`BTreeSet`) so that constraint emission is
/// deterministic.
#[derive(Clone, Debug)]
pub struct Course {
    /// Index of the course in the catalog's course list
    pub index: usize,
    /// Unique course code, e.g. `CS101`
    pub code: String,
    /// Course title. Mainly used for info/debug output
    pub title: String,
    /// Alternate codes that resolve to this course
    pub synonyms: Vec<String>,
    /// Credit value (positive)
    pub credits: u32,
    /// CNF prerequisites
    pub prereqs: Vec<BTreeSet<String>>,
    /// Co-requisites
    pub coreqs: BTreeSet<String>,
    /// When the course is offered
    pub offering: OfferingSpec,
    /// Name shown when a hidden distribution slot is scheduled
    pub display_name: Option<String>,
    /// Difficulty level in 0..=10
    pub difficulty: u32,
    /// Estimated grade in [0, 4.0]; 0.0 when unknown
    pub est_grade: f32,
}

impl Course {
    /// The course's discipline: the leading alphabetic prefix of its code,
    /// with `/` stripped.
    pub fn discipline(&self) -> String {
        self.code
            .chars()
            .filter(|c| *c != '/')
            .take_while(|c| c.is_alphabetic())
            .collect()
    }
}

/// The read-only course table, with code lookup covering synonyms.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    courses: Vec<Course>,
    by_code: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from a course list, assigning dense indexes and
    /// registering codes and synonyms for lookup.
    ///
    /// Fails on duplicate codes; referential integrity is checked separately
    /// by [`Catalog::validate`] once all courses are present.
    pub fn new(mut courses: Vec<Course>) -> Result<Catalog, String> {
        let mut by_code = HashMap::new();
        for (index, course) in courses.iter_mut().enumerate() {
            course.index = index;
            if by_code.insert(course.code.clone(), index).is_some() {
                return Err(format!("Duplicate course code '{}'", course.code));
            }
            for synonym in course.synonyms.iter() {
                if by_code.insert(synonym.clone(), index).is_some() {
                    return Err(format!(
                        "Course synonym '{}' clashes with an existing code",
                        synonym
                    ));
                }
            }
        }
        Ok(Catalog { courses, by_code })
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn course(&self, index: usize) -> &Course {
        &self.courses[index]
    }

    /// Look up a course by code or synonym.
    pub fn get(&self, code: &str) -> Option<&Course> {
        self.by_code.get(code).map(|i| &self.courses[*i])
    }

    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.by_code.get(code).copied()
    }

    /// Set per-student estimated grades (applied once during startup, before
    /// the catalog is shared). Unknown codes are reported back to the caller.
    pub fn apply_estimated_grades(
        &mut self,
        grades: &HashMap<String, f32>,
    ) -> Result<(), String> {
        for (code, grade) in grades {
            let index = self
                .by_code
                .get(code)
                .copied()
                .ok_or_else(|| format!("Estimated grade given for unknown course '{}'", code))?;
            self.courses[index].est_grade = *grade;
        }
        Ok(())
    }

    /// Check referential integrity: every code referenced by a prerequisite or
    /// co-requisite must exist. Group references are checked by the group
    /// registry.
    pub fn validate(&self) -> Result<(), String> {
        for course in self.courses.iter() {
            for clause in course.prereqs.iter() {
                for code in clause.iter() {
                    if !self.by_code.contains_key(code) {
                        return Err(format!(
                            "Course '{}' has unknown prerequisite '{}'",
                            course.code, code
                        ));
                    }
                }
            }
            for code in course.coreqs.iter() {
                if !self.by_code.contains_key(code) {
                    return Err(format!(
                        "Course '{}' has unknown co-requisite '{}'",
                        course.code, code
                    ));
                }
            }
        }
        Ok(())
    }

    /// Resolve a course's offering specification into the sorted list of
    /// allowed slots for the given horizon. Re-evaluated per solve so that a
    /// changed current date refreshes the offerings.
    pub fn offering_terms(&self, course: &Course, cal: &Calendar, smax: u32) -> Vec<u32> {
        let mut slots = BTreeSet::new();
        for rule in course.offering.0.iter() {
            match rule {
                OfferingRule::AllTimes => slots.extend(1..=smax),
                OfferingRule::EveryFall => {
                    slots.extend((1..=smax).filter(|s| cal.is_fall_term(*s)))
                }
                OfferingRule::EverySpring => {
                    slots.extend((1..=smax).filter(|s| cal.season_of(*s) == Season::Spring))
                }
                OfferingRule::EverySummerTerm => {
                    slots.extend((1..=smax).filter(|s| cal.is_summer_term(*s)))
                }
                OfferingRule::NextTwoTerms => slots.extend((1..=2).filter(|s| *s <= smax)),
                OfferingRule::NextFourTerms => slots.extend((1..=4).filter(|s| *s <= smax)),
                OfferingRule::Term(token) => match cal.term_no(token) {
                    Ok(0) => warn!(
                        "Offering term {} of course {} lies in the past; ignored.",
                        token, course.code
                    ),
                    Ok(s) if s <= smax => {
                        slots.insert(s);
                    }
                    Ok(_) => {}
                    // validated at parse time
                    Err(_) => {}
                },
            }
        }
        slots.into_iter().collect()
    }

    /// True iff `b` appears anywhere in the prerequisite or co-requisite
    /// closure of `a` (depth-first search over all CNF disjuncts).
    pub fn requires_course(&self, a: &str, b: &str) -> bool {
        let (start, target) = match (self.index_of(a), self.index_of(b)) {
            (Some(start), Some(target)) => (start, target),
            _ => return false,
        };
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            if !visited.insert(i) {
                continue;
            }
            let course = &self.courses[i];
            for code in course
                .prereqs
                .iter()
                .flat_map(|clause| clause.iter())
                .chain(course.coreqs.iter())
            {
                if let Some(j) = self.index_of(code) {
                    if j == target {
                        return true;
                    }
                    stack.push(j);
                }
            }
        }
        false
    }

    /// Strict variant of [`Catalog::requires_course`]: within the chosen set,
    /// is `b` the only way to satisfy some requirement of `a`?
    ///
    /// A prerequisite clause pins `b` when `b` is its single chosen disjunct;
    /// co-requisites always pin their course. The query follows such pinned
    /// requirements transitively through other chosen courses.
    pub fn schedule_requires_course(&self, a: &str, b: &str, chosen: &HashSet<usize>) -> bool {
        let (start, target) = match (self.index_of(a), self.index_of(b)) {
            (Some(start), Some(target)) => (start, target),
            _ => return false,
        };
        if !chosen.contains(&target) {
            return false;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            if !visited.insert(i) {
                continue;
            }
            let course = &self.courses[i];
            let mut pinned: Vec<usize> = course
                .coreqs
                .iter()
                .filter_map(|code| self.index_of(code))
                .filter(|j| chosen.contains(j))
                .collect();
            for clause in course.prereqs.iter() {
                let satisfiers: Vec<usize> = clause
                    .iter()
                    .filter_map(|code| self.index_of(code))
                    .filter(|j| chosen.contains(j))
                    .collect();
                if satisfiers.len() == 1 {
                    pinned.push(satisfiers[0]);
                }
            }
            for j in pinned {
                if j == target {
                    return true;
                }
                stack.push(j);
            }
        }
        false
    }
}
