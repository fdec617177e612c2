//! Core of the degree-plan optimizer: catalog and group data model, term
//! calendar, MILP model builder and solver driver.
//!
//! The crate-level types below are the program-wide parameter set and the
//! per-student input. Both are constructed once (from `params.props` and the
//! student files, or programmatically in tests) and passed by reference into
//! [`model::ModelBuilder`]; nothing mutates them during a solve.

pub mod calendar;
pub mod catalog;
pub mod groups;
pub mod io;
pub mod lp;
pub mod model;
pub mod solution;
pub mod solver;

use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::catalog::Catalog;
use crate::lp::Sense;

/// Program-wide scalar parameters, read from `params.props`.
///
/// All credit and count fields are in the units their name suggests; `smax` is
/// the number of future term slots the planner may use (slot 0 is reserved for
/// already-passed courses).
#[derive(Clone, Debug)]
pub struct Params {
    /// Minimum total credits for graduation (`Tc`)
    pub tc: u32,
    /// Per-term credit cap for regular students (`Cmax`)
    pub cmax: u32,
    /// Per-term credit cap for honors students
    pub cmax_honor: u32,
    /// Credit cap over a whole summer window (S1+S2+ST) for regular students
    pub summer_cmax: u32,
    /// Credit cap over a whole summer window for honors students
    pub summer_cmax_honor: u32,
    /// Planning horizon: number of future term slots
    pub smax: u32,
    /// Last slot in which an LE (distribution) course may be scheduled
    pub max_le_term: u32,
    /// Maximum number of courses taken concurrently across overlapping summer
    /// sessions (S1 or S2 together with ST)
    pub summer_conc_n_max: u32,
    /// Course code of the thesis course
    pub thesis_course_code: String,
    /// Per-term course cap applied to freshmen; 0 disables the cap
    pub freshman_max_courses_per_term: u32,
    /// A student with fewer passed courses than this is treated as a freshman
    pub min_courses_for_sophomore: u32,
    /// Department codes whose courses get a small objective bonus, each with an
    /// optional group whose members are exempted from the bonus
    pub program_codes_to_maximize: Vec<ProgramCodeBonus>,
    /// The home program's course-code prefix
    pub program_code: String,
    /// If set, the first line of `cls.csv` starting with this text is a header
    /// and is skipped
    pub course_csv_file_header: Option<String>,
    /// Estimated grades below this threshold do not participate in the
    /// objective
    pub min_grade_thres: f32,
    /// Whether catalog editing is enabled in the hosting application
    pub allow_edit: bool,
}

impl Params {
    /// Per-term credit cap for the given honors status.
    pub fn cmax(&self, honors: bool) -> u32 {
        if honors {
            self.cmax_honor
        } else {
            self.cmax
        }
    }

    /// Summer-window credit cap for the given honors status.
    pub fn summer_cmax(&self, honors: bool) -> u32 {
        if honors {
            self.summer_cmax_honor
        } else {
            self.summer_cmax
        }
    }
}

/// One entry of `ProgramCodes2Maximize`: a course-code prefix and an optional
/// exception group whose members do not receive the bonus.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramCodeBonus {
    pub code: String,
    pub exception_group: Option<String>,
}

/// Term preference carried by a desired-course entry.
#[derive(Clone, Debug, PartialEq)]
pub enum TermPref {
    /// `allterms`: the course must be taken, in any slot
    AllTerms,
    /// Empty expression: the course must not be taken at all
    NotToTake,
    /// `allotherterms`: any slot except the immediately upcoming one
    AllOtherTerms,
    /// Explicit term tokens (e.g. `FA2023 SP2024`); tokens are validated at
    /// parse time and resolved against the calendar at solve time
    Explicit(Vec<String>),
}

/// A desired-course entry: a catalog code plus the terms the student allows
/// for it.
#[derive(Clone, Debug, PartialEq)]
pub struct DesiredCourse {
    pub code: String,
    pub terms: TermPref,
}

/// A per-term course-count bound given by the student, e.g. `<=3` for term 2.
///
/// Strict comparisons are normalized at parse time (`<N` becomes `<= N-1`,
/// `>N` becomes `>= N+1`); a bare integer means an exact count.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TermCountBound {
    pub sense: Sense,
    pub n: u32,
}

impl TermCountBound {
    /// Parse a count expression. Accepted forms: `N`, `=N`, `<=N`, `>=N`,
    /// `<N`, `>N` (whitespace around the number is ignored).
    pub fn parse(expr: &str) -> Result<TermCountBound, String> {
        let expr = expr.trim();
        let (sense, num, strict) = if let Some(rest) = expr.strip_prefix("<=") {
            (Sense::Le, rest, false)
        } else if let Some(rest) = expr.strip_prefix(">=") {
            (Sense::Ge, rest, false)
        } else if let Some(rest) = expr.strip_prefix('<') {
            (Sense::Le, rest, true)
        } else if let Some(rest) = expr.strip_prefix('>') {
            (Sense::Ge, rest, true)
        } else if let Some(rest) = expr.strip_prefix('=') {
            (Sense::Eq, rest, false)
        } else {
            (Sense::Eq, expr, false)
        };
        let n: u32 = num
            .trim()
            .parse()
            .map_err(|_| format!("Unrecognized count expression '{}'", expr))?;
        let n = match (sense, strict) {
            (Sense::Le, true) => n
                .checked_sub(1)
                .ok_or_else(|| format!("Count expression '{}' excludes every value", expr))?,
            (Sense::Ge, true) => n + 1,
            _ => n,
        };
        Ok(TermCountBound { sense, n })
    }
}

/// Objective coefficient tuple `(DN, DL, Cr, Gr)` supplied by the caller.
///
/// `dn` weighs the latest used term, `dl` the maximum per-term difficulty
/// load, `cr` each scheduled course's credits and `gr` its estimated grade
/// (only grades at or above `Params::min_grade_thres` participate).
#[derive(Clone, Copy, Debug)]
pub struct ObjectiveWeights {
    pub dn: f64,
    pub dl: f64,
    pub cr: f64,
    pub gr: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights {
            dn: 1.0,
            dl: 1.0,
            cr: 1.0,
            gr: 0.0,
        }
    }
}

/// Immutable per-run student input.
#[derive(Clone, Debug)]
pub struct StudentInput {
    /// Codes of courses the student has already passed
    pub passed: BTreeSet<String>,
    /// Desired (or explicitly undesired) courses
    pub desired: Vec<DesiredCourse>,
    /// Per-term course-count bounds, keyed by term slot
    pub per_term_counts: BTreeMap<u32, TermCountBound>,
    /// Honors status (selects the honors credit caps and unlocks honors-only
    /// courses)
    pub honors: bool,
    /// Forbid the first summer session
    pub s1_off: bool,
    /// Forbid the second summer session
    pub s2_off: bool,
    /// Forbid the summer term
    pub st_off: bool,
    /// General per-term course cap; `None` leaves only the program defaults
    pub max_courses_per_term: Option<u32>,
    /// Number of courses allowed alongside the thesis course (at least 1)
    pub max_courses_during_thesis: u32,
    /// Chosen concentration area name (empty: none chosen)
    pub concentration: String,
    /// OU courses already taken in the current academic year
    pub num_ou_this_year: u32,
    /// Objective coefficients
    pub weights: ObjectiveWeights,
}

impl StudentInput {
    /// Check the input against the catalog and apply the derived rules:
    /// desired entries for already-passed courses are dropped (with a warning)
    /// and unknown codes are rejected.
    pub fn validated(mut self, catalog: &Catalog) -> Result<StudentInput, String> {
        for code in self.passed.iter() {
            if catalog.get(code).is_none() {
                return Err(format!("Passed course '{}' is not in the catalog", code));
            }
        }
        for entry in self.desired.iter() {
            if catalog.get(&entry.code).is_none() {
                return Err(format!(
                    "Desired course '{}' is not in the catalog",
                    entry.code
                ));
            }
        }
        if self.max_courses_during_thesis < 1 {
            return Err("maxNumCrsDurThesis must be at least 1".to_owned());
        }
        let passed = &self.passed;
        self.desired.retain(|entry| {
            let keep = !passed.contains(&entry.code);
            if !keep {
                warn!(
                    "Ignoring desired course '{}', which is already passed.",
                    entry.code
                );
            }
            keep
        });
        Ok(self)
    }
}
