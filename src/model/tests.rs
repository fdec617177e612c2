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

use std::collections::BTreeSet;

use super::ModelBuilder;
use crate::calendar::{Calendar, Season};
use crate::catalog::{Catalog, Course, OfferingSpec};
use crate::groups::{CountReq, CourseGroup, CreditReq, GroupRegistry};
use crate::solution::Schedule;
use crate::solver::{self, SolveError, SolveStats};
use crate::{DesiredCourse, ObjectiveWeights, Params, StudentInput, TermPref};

fn course(code: &str, credits: u32, prereqs: &[&[&str]], coreqs: &[&str], offering: &str) -> Course {
    Course {
        index: 0,
        code: code.to_owned(),
        title: format!("Course {}", code),
        synonyms: Vec::new(),
        credits,
        prereqs: prereqs
            .iter()
            .map(|clause| clause.iter().map(|c| (*c).to_owned()).collect())
            .collect(),
        coreqs: coreqs.iter().map(|c| (*c).to_owned()).collect(),
        offering: OfferingSpec::parse(offering).unwrap(),
        display_name: None,
        difficulty: 0,
        est_grade: 0.0,
    }
}

/// Catalog with the given courses plus the thesis course every model needs.
fn catalog_with(mut courses: Vec<Course>) -> Catalog {
    courses.push(course("THESIS", 3, &[], &[], "alltimes"));
    Catalog::new(courses).unwrap()
}

fn group(name: &str, members: &[&str], count: &str, credits: &str) -> CourseGroup {
    CourseGroup::new(
        name.to_owned(),
        false,
        members.iter().map(|m| (*m).to_owned()).collect(),
        CountReq::parse(count).unwrap(),
        CreditReq::parse(credits).unwrap(),
    )
}

fn params(tc: u32, smax: u32) -> Params {
    Params {
        tc,
        cmax: 18,
        cmax_honor: 21,
        summer_cmax: 12,
        summer_cmax_honor: 15,
        smax,
        max_le_term: smax,
        summer_conc_n_max: 2,
        thesis_course_code: "THESIS".to_owned(),
        freshman_max_courses_per_term: 0,
        min_courses_for_sophomore: 0,
        program_codes_to_maximize: Vec::new(),
        program_code: "CS".to_owned(),
        course_csv_file_header: None,
        min_grade_thres: 3.0,
        allow_edit: false,
    }
}

fn student() -> StudentInput {
    StudentInput {
        passed: BTreeSet::new(),
        desired: Vec::new(),
        per_term_counts: Default::default(),
        honors: false,
        s1_off: false,
        s2_off: false,
        st_off: false,
        max_courses_per_term: None,
        max_courses_during_thesis: 1,
        concentration: String::new(),
        num_ou_this_year: 0,
        weights: ObjectiveWeights::default(),
    }
}

fn desired(codes: &[&str]) -> Vec<DesiredCourse> {
    codes
        .iter()
        .map(|code| DesiredCourse {
            code: (*code).to_owned(),
            terms: TermPref::AllTerms,
        })
        .collect()
}

fn run(
    catalog: &Catalog,
    groups: &GroupRegistry,
    params: &Params,
    student: &StudentInput,
    calendar: &Calendar,
) -> Result<(Schedule, SolveStats), SolveError> {
    let (model, vars) = ModelBuilder::new(catalog, groups, params, student, calendar)
        .build()
        .expect("model assembly should succeed");
    solver::solve(&model, &vars, None, None)
}

fn no_groups() -> GroupRegistry {
    GroupRegistry::new(Vec::new()).unwrap()
}

#[test]
fn test_trivial_plan() {
    // A feeds B; the plan must be A in the first slot, B in the second.
    let catalog = catalog_with(vec![
        course("A", 3, &[], &[], "alltimes"),
        course("B", 3, &[&["A"]], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = desired(&["B"]);

    let (schedule, _) = run(&catalog, &no_groups(), &params(6, 4), &student, &calendar).unwrap();
    assert_eq!(schedule.term_of(catalog.index_of("A").unwrap()), Some(1));
    assert_eq!(schedule.term_of(catalog.index_of("B").unwrap()), Some(2));
    assert_eq!(schedule.credits_to_take(&catalog), 6);
}

#[test]
fn test_coreq_same_term() {
    let catalog = catalog_with(vec![
        course("C", 3, &[], &[], "alltimes"),
        course("D", 3, &[], &["C"], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = desired(&["D"]);

    let (schedule, _) = run(&catalog, &no_groups(), &params(6, 2), &student, &calendar).unwrap();
    let tc = schedule.term_of(catalog.index_of("C").unwrap()).unwrap();
    let td = schedule.term_of(catalog.index_of("D").unwrap()).unwrap();
    assert_eq!(tc, 1);
    assert_eq!(td, 1);
}

#[test]
fn test_xor_group_with_passed_member() {
    // "Exactly 2" with X already passed leaves exactly one of Y, Z to take.
    let catalog = catalog_with(vec![
        course("X", 3, &[], &[], "alltimes"),
        course("Y", 3, &[], &[], "alltimes"),
        course("Z", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups = GroupRegistry::new(vec![group("SCI", &["X", "Y", "Z"], "=2", "")]).unwrap();
    let mut student = student();
    student.passed.insert("X".to_owned());

    let (schedule, _) = run(&catalog, &groups, &params(6, 4), &student, &calendar).unwrap();
    assert_eq!(schedule.term_of(catalog.index_of("X").unwrap()), Some(0));
    let y = schedule.is_scheduled(catalog.index_of("Y").unwrap());
    let z = schedule.is_scheduled(catalog.index_of("Z").unwrap());
    assert!(y != z, "exactly one of Y and Z must be scheduled");
    assert_eq!(schedule.credits_taken_so_far(&catalog), 3);
    assert_eq!(schedule.credits_to_take(&catalog), 3);
}

#[test]
fn test_per_semester_group_cap() {
    // At most one group course per term window forces three distinct slots.
    // Current term ST2023 makes the next three slots FA, SP, S1.
    let catalog = catalog_with(vec![
        course("M", 3, &[], &[], "alltimes"),
        course("N", 3, &[], &[], "alltimes"),
        course("O", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::SummerTerm, 2023);
    let groups = GroupRegistry::new(vec![group("SCI", &["M", "N", "O"], "<=1", "")]).unwrap();
    let mut student = student();
    student.desired = desired(&["M", "N", "O"]);

    let (schedule, _) = run(&catalog, &groups, &params(9, 3), &student, &calendar).unwrap();
    let terms: BTreeSet<u32> = ["M", "N", "O"]
        .iter()
        .map(|c| schedule.term_of(catalog.index_of(c).unwrap()).unwrap())
        .collect();
    assert_eq!(terms, [1, 2, 3].iter().copied().collect());
}

#[test]
fn test_soft_order_distance() {
    let catalog = catalog_with(vec![
        course("P", 3, &[], &[], "alltimes"),
        course("Q", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups = GroupRegistry::new(vec![group("softorderPQ", &["P", "Q"], "2", "")]).unwrap();
    let mut student = student();
    student.desired = desired(&["P", "Q"]);

    let (schedule, _) = run(&catalog, &groups, &params(6, 6), &student, &calendar).unwrap();
    let tp = schedule.term_of(catalog.index_of("P").unwrap()).unwrap();
    let tq = schedule.term_of(catalog.index_of("Q").unwrap()).unwrap();
    assert!(tp < tq, "P must precede Q (got {} and {})", tp, tq);
    assert!(tq - tp <= 2, "Q must follow P within 2 terms");
}

#[test]
fn test_capstone_credit_gate() {
    // The capstone needs 18 credits completed strictly before it, so it lands
    // in the latest used slot with six 3-credit courses ahead of it.
    let mut courses: Vec<Course> = (1..=8)
        .map(|i| course(&format!("C{}", i), 3, &[], &[], "alltimes"))
        .collect();
    courses.push(course("K", 3, &[], &[], "alltimes"));
    let catalog = catalog_with(courses);
    let calendar = Calendar::at_term(Season::SummerTerm, 2023);
    let groups = GroupRegistry::new(vec![group("capstoneK", &["K"], "0", "18")]).unwrap();
    let mut params = params(21, 5);
    params.cmax = 9;
    let mut student = student();
    student.desired = desired(&["K"]);

    let (schedule, _) = run(&catalog, &groups, &params, &student, &calendar).unwrap();
    let k = catalog.index_of("K").unwrap();
    let tk = schedule.term_of(k).unwrap();
    assert_eq!(tk, schedule.latest_term());
    let predecessors: Vec<usize> = (0..catalog.len())
        .filter(|i| *i != k)
        .filter(|i| matches!(schedule.term_of(*i), Some(t) if t >= 1 && t < tk))
        .collect();
    assert_eq!(predecessors.len(), 6);
    let credits_before: u32 = predecessors.iter().map(|i| catalog.course(*i).credits).sum();
    assert!(credits_before >= 18);
}

#[test]
fn test_offering_restricts_slots() {
    let catalog = catalog_with(vec![course("A", 3, &[], &[], "everyfall")]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = desired(&["A"]);

    // The only fall slot within the horizon is slot 5.
    let (schedule, _) = run(&catalog, &no_groups(), &params(3, 6), &student, &calendar).unwrap();
    assert_eq!(schedule.term_of(catalog.index_of("A").unwrap()), Some(5));
}

#[test]
fn test_not_to_take_is_excluded() {
    let catalog = catalog_with(vec![
        course("A", 3, &[], &[], "alltimes"),
        course("B", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = vec![
        DesiredCourse {
            code: "A".to_owned(),
            terms: TermPref::AllTerms,
        },
        DesiredCourse {
            code: "B".to_owned(),
            terms: TermPref::NotToTake,
        },
    ];

    let (schedule, _) = run(&catalog, &no_groups(), &params(3, 4), &student, &calendar).unwrap();
    assert!(schedule.is_scheduled(catalog.index_of("A").unwrap()));
    assert!(!schedule.is_scheduled(catalog.index_of("B").unwrap()));
}

#[test]
fn test_unofferable_desired_course_is_infeasible() {
    let catalog = catalog_with(vec![course("B", 3, &[], &[], "-")]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = desired(&["B"]);

    let result = run(&catalog, &no_groups(), &params(3, 4), &student, &calendar);
    assert!(matches!(result, Err(SolveError::Infeasible)));
}

#[test]
fn test_summer_sessions_off() {
    // B is only offered in summer terms; with the summer term switched off
    // there is no slot left for it.
    let catalog = catalog_with(vec![
        course("A", 3, &[], &[], "alltimes"),
        course("B", 3, &[], &[], "everysummerterm"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = desired(&["B"]);
    student.st_off = true;

    let result = run(&catalog, &no_groups(), &params(3, 6), &student, &calendar);
    assert!(matches!(result, Err(SolveError::Infeasible)));

    student.st_off = false;
    let (schedule, _) = run(&catalog, &no_groups(), &params(3, 6), &student, &calendar).unwrap();
    assert_eq!(schedule.term_of(catalog.index_of("B").unwrap()), Some(4));
}

#[test]
fn test_summer_credit_window() {
    // Three 6-credit summer-only courses against a combined summer cap of 12:
    // all three together are infeasible, two of them fit.
    let summer_only = "S12024 S22024 ST2024";
    let catalog = catalog_with(vec![
        course("A", 6, &[], &[], summer_only),
        course("B", 6, &[], &[], summer_only),
        course("C", 6, &[], &[], summer_only),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = desired(&["A", "B", "C"]);

    let result = run(&catalog, &no_groups(), &params(18, 5), &student, &calendar);
    assert!(matches!(result, Err(SolveError::Infeasible)));

    student.desired = desired(&["A", "B"]);
    let (schedule, _) = run(&catalog, &no_groups(), &params(12, 5), &student, &calendar).unwrap();
    let summer_credits: u32 = (2..=4)
        .flat_map(|s| schedule.courses_in_term(s))
        .map(|i| catalog.course(i).credits)
        .sum();
    assert_eq!(summer_credits, 12);
}

#[test]
fn test_thesis_term_isolation() {
    // maxNumCrsDurThesis = 1: nothing else may share the thesis course's term.
    let catalog = catalog_with(vec![course("A", 3, &[], &[], "alltimes")]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = desired(&["THESIS", "A"]);

    let (schedule, _) = run(&catalog, &no_groups(), &params(6, 4), &student, &calendar).unwrap();
    let ta = schedule.term_of(catalog.index_of("A").unwrap()).unwrap();
    let tt = schedule.term_of(catalog.index_of("THESIS").unwrap()).unwrap();
    assert_ne!(ta, tt);
}

#[test]
fn test_level_gate_for_level5() {
    // E is level-5 gated: four L4 courses must be completed first.
    let mut courses: Vec<Course> = ["A", "B", "C", "D"]
        .iter()
        .map(|c| course(c, 3, &[], &[], "alltimes"))
        .collect();
    courses.push(course("E", 3, &[], &[], "alltimes"));
    courses.push(course("F", 3, &[], &[], "alltimes"));
    let catalog = catalog_with(courses);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups = GroupRegistry::new(vec![
        group("L4", &["A", "B", "C", "D"], "", ""),
        group("L5", &["E"], "", ""),
        group("L6", &["F"], "", ""),
    ])
    .unwrap();
    let mut student = student();
    student.desired = desired(&["E"]);

    let (schedule, _) = run(&catalog, &groups, &params(15, 6), &student, &calendar).unwrap();
    let te = schedule.term_of(catalog.index_of("E").unwrap()).unwrap();
    let l4_before = ["A", "B", "C", "D"]
        .iter()
        .filter(|c| {
            matches!(schedule.term_of(catalog.index_of(c).unwrap()), Some(t) if t < te)
        })
        .count();
    assert_eq!(l4_before, 4);
}

#[test]
fn test_honors_restriction() {
    let catalog = catalog_with(vec![
        course("A", 3, &[], &[], "alltimes"),
        course("H", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups = GroupRegistry::new(vec![group("HonorGroup", &["H"], "", "")]).unwrap();

    // A non-honors student never gets H into the plan.
    let (schedule, _) = run(&catalog, &groups, &params(3, 4), &student(), &calendar).unwrap();
    assert!(!schedule.is_scheduled(catalog.index_of("H").unwrap()));
    assert_eq!(schedule.credits_to_take(&catalog), 3);

    // An honors student may take it.
    let mut honors_student = student();
    honors_student.honors = true;
    honors_student.desired = desired(&["H"]);
    let (schedule, _) = run(&catalog, &groups, &params(3, 4), &honors_student, &calendar).unwrap();
    assert!(schedule.is_scheduled(catalog.index_of("H").unwrap()));
}

#[test]
fn test_ou_annual_budget_already_used() {
    // The OU budget for the running academic year is already exhausted, so
    // no OU course may land before the next fall term.
    let catalog = catalog_with(vec![
        course("O1", 3, &[], &[], "alltimes"),
        course("O2", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups = GroupRegistry::new(vec![group("OUFree", &["O1", "O2"], "2", "")]).unwrap();
    let mut student = student();
    student.desired = desired(&["O1"]);
    student.num_ou_this_year = 2;

    let (schedule, _) = run(&catalog, &groups, &params(3, 6), &student, &calendar).unwrap();
    let t = schedule.term_of(catalog.index_of("O1").unwrap()).unwrap();
    assert!(t >= 5, "OU course must wait for the next academic year, got {}", t);
}

#[test]
fn test_le_latest_term() {
    let catalog = catalog_with(vec![
        course("A", 3, &[], &[], "alltimes"),
        course("B", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups = GroupRegistry::new(vec![group("LE", &["A"], "", "")]).unwrap();
    let mut params = params(6, 4);
    params.max_le_term = 1;
    let mut student = student();
    student.desired = desired(&["A", "B"]);
    // keep both courses from sharing the first term
    student.max_courses_per_term = Some(1);

    let (schedule, _) = run(&catalog, &groups, &params, &student, &calendar).unwrap();
    assert_eq!(schedule.term_of(catalog.index_of("A").unwrap()), Some(1));
    let tb = schedule.term_of(catalog.index_of("B").unwrap()).unwrap();
    assert!(tb > 1);
}

#[test]
fn test_grade_weight_prefers_estimated_grades() {
    let mut a = course("A", 3, &[], &[], "alltimes");
    a.est_grade = 4.0;
    let b = course("B", 3, &[], &[], "alltimes");
    let catalog = catalog_with(vec![a, b]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.weights.gr = -1.0;

    let (schedule, _) = run(&catalog, &no_groups(), &params(3, 4), &student, &calendar).unwrap();
    assert!(schedule.is_scheduled(catalog.index_of("A").unwrap()));
    assert!(!schedule.is_scheduled(catalog.index_of("B").unwrap()));
}

#[test]
fn test_explicit_desired_terms() {
    let catalog = catalog_with(vec![
        course("A", 3, &[], &[], "alltimes"),
        course("B", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.desired = vec![DesiredCourse {
        code: "A".to_owned(),
        terms: TermPref::Explicit(vec!["FA2024".to_owned()]),
    }];

    let (schedule, _) = run(&catalog, &no_groups(), &params(3, 6), &student, &calendar).unwrap();
    // FA2024 is slot 5; everything else is forbidden for A.
    assert_eq!(schedule.term_of(catalog.index_of("A").unwrap()), Some(5));
}

#[test]
fn test_concentration_requirements() {
    let catalog = catalog_with(vec![
        course("AI301", 3, &[], &[], "alltimes"),
        course("AI302", 3, &[], &[], "alltimes"),
        course("DB301", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut conc = group("AI-core", &["AI301", "AI302"], "2", "");
    conc.is_concentration_area = true;
    let groups = GroupRegistry::new(vec![conc]).unwrap();

    // Without the concentration chosen, the cheapest 3 credits win.
    let (schedule, _) = run(&catalog, &groups, &params(3, 4), &student(), &calendar).unwrap();
    assert!(schedule.credits_to_take(&catalog) == 3);

    // With it chosen, both AI courses are forced into the plan.
    let mut student = student();
    student.concentration = "AI".to_owned();
    let (schedule, _) = run(&catalog, &groups, &params(3, 4), &student, &calendar).unwrap();
    assert!(schedule.is_scheduled(catalog.index_of("AI301").unwrap()));
    assert!(schedule.is_scheduled(catalog.index_of("AI302").unwrap()));
    assert!(!schedule.is_scheduled(catalog.index_of("DB301").unwrap()));
}

// ------------------------------------------------------------------------
// Model-structure checks (no solve): emitted constraint families

fn build_model(
    catalog: &Catalog,
    groups: &GroupRegistry,
    params: &Params,
    student: &StudentInput,
    calendar: &Calendar,
) -> crate::lp::MilpModel {
    ModelBuilder::new(catalog, groups, params, student, calendar)
        .build()
        .expect("model assembly should succeed")
        .0
}

fn has_constraint(model: &crate::lp::MilpModel, label: &str) -> bool {
    model.constraints().iter().any(|c| c.label == label)
}

#[test]
fn test_freshman_cap_emission() {
    let catalog = catalog_with(vec![course("A", 3, &[], &[], "alltimes")]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut params = params(3, 4);
    params.freshman_max_courses_per_term = 4;
    params.min_courses_for_sophomore = 8;

    let model = build_model(&catalog, &no_groups(), &params, &student(), &calendar);
    assert!(has_constraint(&model, "freshman_cap"));

    // An explicit student cap replaces the freshman default.
    let mut capped = student();
    capped.max_courses_per_term = Some(3);
    let model = build_model(&catalog, &no_groups(), &params, &capped, &calendar);
    assert!(!has_constraint(&model, "freshman_cap"));
    assert!(has_constraint(&model, "crs_cap_1"));
}

#[test]
fn test_per_term_bound_overrides_general_cap() {
    let catalog = catalog_with(vec![course("A", 3, &[], &[], "alltimes")]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.max_courses_per_term = Some(3);
    student
        .per_term_counts
        .insert(2, crate::TermCountBound::parse("<=1").unwrap());

    let model = build_model(&catalog, &no_groups(), &params(3, 4), &student, &calendar);
    assert!(has_constraint(&model, "crs_cap_1"));
    assert!(!has_constraint(&model, "crs_cap_2"));
    assert!(has_constraint(&model, "crs_bound_2"));
}

#[test]
fn test_at_most_group_skipped_when_budget_spent() {
    let catalog = catalog_with(vec![
        course("A", 3, &[], &[], "alltimes"),
        course("B", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups = GroupRegistry::new(vec![group("FREE", &["A", "B"], "-1", "")]).unwrap();

    let model = build_model(&catalog, &groups, &params(3, 4), &student(), &calendar);
    assert!(has_constraint(&model, "grp_FREE_max"));

    // One member already passed uses up the whole budget; the constraint is
    // dropped rather than emitted with a zero bound.
    let mut repeat = student();
    repeat.passed.insert("A".to_owned());
    let model = build_model(&catalog, &groups, &params(3, 4), &repeat, &calendar);
    assert!(!has_constraint(&model, "grp_FREE_max"));
}

#[test]
fn test_program_code_bonus_in_objective() {
    let catalog = catalog_with(vec![
        course("CS101", 3, &[], &[], "alltimes"),
        course("CS102", 3, &[], &[], "alltimes"),
        course("MA101", 3, &[], &[], "alltimes"),
    ]);
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let groups =
        GroupRegistry::new(vec![group("CSExceptions", &["CS102"], "", "")]).unwrap();
    let mut params = params(3, 4);
    params.program_codes_to_maximize = vec![crate::ProgramCodeBonus {
        code: "CS".to_owned(),
        exception_group: Some("CSExceptions".to_owned()),
    }];

    let (model, vars) = ModelBuilder::new(&catalog, &groups, &params, &student(), &calendar)
        .build()
        .unwrap();
    let coef = |code: &str| {
        let var = vars.taken[catalog.index_of(code).unwrap()];
        model
            .objective()
            .terms()
            .find(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .unwrap()
    };
    assert!((coef("CS101") - 2.999).abs() < 1e-9);
    // exception-group member and foreign-department course get no bonus
    assert!((coef("CS102") - 3.0).abs() < 1e-9);
    assert!((coef("MA101") - 3.0).abs() < 1e-9);
}

#[test]
fn test_session_off_emission() {
    let catalog = catalog_with(vec![course("A", 3, &[], &[], "alltimes")]);
    // FA2023 current: slots 2, 3, 4 are S1, S2, ST
    let calendar = Calendar::at_term(Season::Fall, 2023);
    let mut student = student();
    student.s1_off = true;
    student.st_off = true;

    let model = build_model(&catalog, &no_groups(), &params(3, 5), &student, &calendar);
    assert!(has_constraint(&model, "session_off_2"));
    assert!(!has_constraint(&model, "session_off_3"));
    assert!(has_constraint(&model, "session_off_4"));
    assert!(!has_constraint(&model, "session_off_5"));
}
