//! The typed result of a solve: which course lands in which term, plus the
//! derived views the surrounding application renders.

use std::collections::HashSet;
use std::fmt::Write;

use serde::Serialize;

use crate::calendar::Calendar;
use crate::catalog::Catalog;
use crate::{DesiredCourse, TermPref};

/// A term assignment: for each course index, the slot it is taken in (0 for
/// already passed) or `None` if it is not part of the plan.
///
/// Serializes as a plain array indexed by course id.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Schedule {
    terms: Vec<Option<u32>>,
}

impl Schedule {
    pub fn new(terms: Vec<Option<u32>>) -> Schedule {
        Schedule { terms }
    }

    /// Slot of a course, `None` if unscheduled.
    pub fn term_of(&self, course: usize) -> Option<u32> {
        self.terms.get(course).copied().flatten()
    }

    pub fn is_scheduled(&self, course: usize) -> bool {
        self.term_of(course).is_some()
    }

    /// Sum of credits of the courses in slot 0 (already passed).
    pub fn credits_taken_so_far(&self, catalog: &Catalog) -> u32 {
        self.terms
            .iter()
            .enumerate()
            .filter(|(_, term)| **term == Some(0))
            .map(|(i, _)| catalog.course(i).credits)
            .sum()
    }

    /// Sum of credits of the courses scheduled in future slots.
    pub fn credits_to_take(&self, catalog: &Catalog) -> u32 {
        self.terms
            .iter()
            .enumerate()
            .filter(|(_, term)| matches!(term, Some(s) if *s >= 1))
            .map(|(i, _)| catalog.course(i).credits)
            .sum()
    }

    /// Course indexes scheduled in the given slot, in catalog order.
    pub fn courses_in_term(&self, term: u32) -> Vec<usize> {
        self.terms
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Some(term))
            .map(|(i, _)| i)
            .collect()
    }

    /// The latest slot holding a course (0 if nothing is scheduled).
    pub fn latest_term(&self) -> u32 {
        self.terms.iter().flatten().copied().max().unwrap_or(0)
    }

    /// True iff the course is, within this schedule, a hard requirement of
    /// one of the desired courses (directly or transitively the only way to
    /// satisfy a prerequisite or co-requisite).
    pub fn required_by_desired(
        &self,
        catalog: &Catalog,
        desired: &[DesiredCourse],
        course: usize,
    ) -> bool {
        let chosen: HashSet<usize> = self
            .terms
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_some())
            .map(|(i, _)| i)
            .collect();
        let code = &catalog.course(course).code;
        desired
            .iter()
            .filter(|entry| entry.terms != TermPref::NotToTake)
            .any(|entry| catalog.schedule_requires_course(&entry.code, code, &chosen))
    }
}

/// Format the calculated schedule into a human readable String (e.g. to print
/// it to stdout).
///
/// The output format will look like
/// ```text
/// ===== SP2024 (term 1, 9 credits) =====
/// - CS101 Introduction to Programming (3 cr)
/// - MA101 Calculus I (3 cr)
/// …
/// ```
pub fn format_schedule(
    schedule: &Schedule,
    catalog: &Catalog,
    calendar: &Calendar,
    smax: u32,
) -> String {
    let mut result = String::new();
    for term in 1..=smax {
        let courses = schedule.courses_in_term(term);
        if courses.is_empty() {
            continue;
        }
        let credits: u32 = courses.iter().map(|i| catalog.course(*i).credits).sum();
        write!(
            result,
            "\n===== {} (term {}, {} credits) =====\n",
            calendar.term_name(term),
            term,
            credits
        )
        .unwrap();
        for i in courses {
            let course = catalog.course(i);
            writeln!(
                result,
                "- {} {} ({} cr)",
                course.code,
                course.display_name.as_deref().unwrap_or(&course.title),
                course.credits
            )
            .unwrap();
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Season;
    use crate::catalog::tests::course;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            course("A", 3, &[], &[]),
            course("B", 4, &[&["A"]], &[]),
            course("C", 3, &[], &[]),
        ])
        .unwrap()
    }

    #[test]
    fn test_credit_views() {
        let catalog = catalog();
        let schedule = Schedule::new(vec![Some(0), Some(2), None]);
        assert_eq!(schedule.credits_taken_so_far(&catalog), 3);
        assert_eq!(schedule.credits_to_take(&catalog), 4);
        assert_eq!(schedule.courses_in_term(2), vec![1]);
        assert_eq!(schedule.latest_term(), 2);
        assert!(!schedule.is_scheduled(2));
    }

    #[test]
    fn test_required_by_desired() {
        let catalog = catalog();
        let schedule = Schedule::new(vec![Some(1), Some(2), None]);
        let desired = vec![DesiredCourse {
            code: "B".to_owned(),
            terms: TermPref::AllTerms,
        }];
        // A is the only way to satisfy B's prerequisite
        assert!(schedule.required_by_desired(&catalog, &desired, 0));
        assert!(!schedule.required_by_desired(&catalog, &desired, 2));
    }

    #[test]
    fn test_format_schedule() {
        let catalog = catalog();
        let calendar = Calendar::at_term(Season::Fall, 2023);
        let schedule = Schedule::new(vec![Some(1), Some(1), None]);
        let text = format_schedule(&schedule, &catalog, &calendar, 4);
        assert!(text.contains("===== SP2024 (term 1, 7 credits) ====="));
        assert!(text.contains("- A Course A (3 cr)"));
        assert!(text.contains("- B Course B (4 cr)"));
    }
}
