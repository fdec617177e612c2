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

//! Assembly of the degree-plan MILP from the catalog, the group registry, the
//! program parameters and one student's input.
//!
//! For every course `i` and slot `s` in `0..=Smax` there is a binary variable
//! `x_{i,s}` ("course i is taken in slot s"; slot 0 is historical) and a
//! binary `x_i` ("course i appears in the plan"), linked by
//! `sum_s x_{i,s} = x_i`. Two continuous auxiliaries complete the variable
//! set: `D` bounds the latest used slot and `DL` the maximum per-slot
//! difficulty load. The constraint families are emitted in a fixed order with
//! stable labels, so two runs over the same input produce byte-identical LP
//! artifacts.

use std::collections::{BTreeSet, HashSet};

use log::debug;

use crate::calendar::{Calendar, Season};
use crate::catalog::Catalog;
use crate::groups::{CountReq, CourseGroup, CreditReq, GroupKind, GroupRegistry};
use crate::lp::{sanitize_name, LinExpr, MilpModel, Sense, VarId};
use crate::{Params, StudentInput, TermPref};

/// Handles of the decision variables of one assembled model, used by the
/// solver driver to read the schedule back out of a solution.
pub struct PlanVars {
    /// `slot[i][s]`: course `i` is taken in slot `s` (`s` in `0..=Smax`)
    pub slot: Vec<Vec<VarId>>,
    /// `taken[i]`: course `i` appears anywhere in the plan
    pub taken: Vec<VarId>,
    /// Latest used slot (completion-time proxy `D`)
    pub completion: VarId,
    /// Maximum per-slot difficulty load (`DL`)
    pub load: VarId,
}

/// Builds the MILP for one solve. All referenced data is immutable for the
/// builder's lifetime; `build` runs to completion without touching the solver.
pub struct ModelBuilder<'a> {
    catalog: &'a Catalog,
    groups: &'a GroupRegistry,
    params: &'a Params,
    student: &'a StudentInput,
    calendar: &'a Calendar,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(
        catalog: &'a Catalog,
        groups: &'a GroupRegistry,
        params: &'a Params,
        student: &'a StudentInput,
        calendar: &'a Calendar,
    ) -> ModelBuilder<'a> {
        ModelBuilder {
            catalog,
            groups,
            params,
            student,
            calendar,
        }
    }

    /// Emit the complete model. Fails (before any solving) on integrity
    /// problems that cannot be expressed as constraints, e.g. an unknown
    /// thesis course or a malformed desired-term token.
    pub fn build(&self) -> Result<(MilpModel, PlanVars), String> {
        let mut model = MilpModel::new();
        let vars = self.declare_variables(&mut model);
        self.set_objective(&mut model, &vars);

        self.add_completion_bounds(&mut model, &vars);
        self.add_difficulty_bounds(&mut model, &vars);
        self.add_offering_bounds(&mut model, &vars);
        self.add_prerequisites(&mut model, &vars);
        self.add_corequisites(&mut model, &vars);
        self.add_level_gates(&mut model, &vars);
        self.add_total_credits(&mut model, &vars);
        self.add_le_term_bound(&mut model, &vars);
        self.add_credit_caps(&mut model, &vars);
        self.add_freshman_cap(&mut model, &vars);
        self.add_course_count_caps(&mut model, &vars);
        self.add_course_count_bounds(&mut model, &vars);
        self.add_thesis_cap(&mut model, &vars)?;
        self.add_summer_concurrency(&mut model, &vars);
        self.add_linking(&mut model, &vars);
        self.add_group_requirements(&mut model, &vars);
        self.add_passed(&mut model, &vars);
        self.add_desired(&mut model, &vars)?;
        self.add_session_toggles(&mut model, &vars);
        self.add_concentration(&mut model, &vars);
        self.add_capstone_gates(&mut model, &vars);
        self.add_soft_orders(&mut model, &vars);
        self.add_ou_annual_caps(&mut model, &vars);
        self.add_honors_restriction(&mut model, &vars);

        debug!(
            "Assembled model with {} variables and {} constraints.",
            model.num_variables(),
            model.num_constraints()
        );
        Ok((model, vars))
    }

    fn smax(&self) -> u32 {
        self.params.smax
    }

    /// Minimum slot distance a prerequisite must keep to slot `s`: summer-term
    /// courses overlap the two summer sessions before them, so their
    /// prerequisites must predate the whole summer.
    fn prereq_gap(&self, s: u32) -> u32 {
        if self.calendar.is_summer_term(s) {
            3
        } else {
            1
        }
    }

    /// The slots `1..=Smax` partitioned into cap windows: each non-summer slot
    /// alone, each maximal run of consecutive summer slots as one window.
    fn term_windows(&self) -> Vec<Vec<u32>> {
        let mut windows = Vec::new();
        let mut s = 1;
        while s <= self.smax() {
            if self.calendar.happens_during_summer(s) {
                let mut window = Vec::new();
                while s <= self.smax() && self.calendar.happens_during_summer(s) {
                    window.push(s);
                    s += 1;
                }
                windows.push(window);
            } else {
                windows.push(vec![s]);
                s += 1;
            }
        }
        windows
    }

    fn passed_indexes(&self) -> HashSet<usize> {
        self.student
            .passed
            .iter()
            .filter_map(|code| self.catalog.index_of(code))
            .collect()
    }

    fn member_indexes(&self, group: &CourseGroup) -> Vec<usize> {
        let mut seen = HashSet::new();
        group
            .members
            .iter()
            .filter_map(|code| self.catalog.index_of(code))
            .filter(|i| seen.insert(*i))
            .collect()
    }

    fn declare_variables(&self, model: &mut MilpModel) -> PlanVars {
        let smax = self.smax();
        let mut slot = Vec::with_capacity(self.catalog.len());
        let mut taken = Vec::with_capacity(self.catalog.len());
        for course in self.catalog.courses() {
            let code = sanitize_name(&course.code);
            slot.push(
                (0..=smax)
                    .map(|s| model.binary(format!("x_{}_{}", code, s)))
                    .collect(),
            );
            taken.push(model.binary(format!("x_{}", code)));
        }
        let completion = model.continuous("D".to_owned(), 0.0);
        let load = model.continuous("DL".to_owned(), 0.0);
        PlanVars {
            slot,
            taken,
            completion,
            load,
        }
    }

    /// Objective: `DN*D + DL*DL_max + sum_i c_i x_i` with
    /// `c_i = Cr*credits_i - program bonus + Gr*estimated grade`.
    fn set_objective(&self, model: &mut MilpModel, vars: &PlanVars) {
        let weights = &self.student.weights;
        let mut objective = LinExpr::new();
        objective.add_term(vars.completion, weights.dn);
        objective.add_term(vars.load, weights.dl);
        for course in self.catalog.courses() {
            let mut cost = weights.cr * course.credits as f64;
            for bonus in self.params.program_codes_to_maximize.iter() {
                if !course.code.starts_with(&bonus.code) {
                    continue;
                }
                let exempt = bonus
                    .exception_group
                    .as_ref()
                    .and_then(|name| self.groups.get(name))
                    .map_or(false, |g| g.members.contains(&course.code));
                if !exempt {
                    // last-resort bias toward home-department courses
                    cost -= 0.001;
                }
                break;
            }
            if course.est_grade >= self.params.min_grade_thres {
                cost += weights.gr * course.est_grade as f64;
            }
            objective.add_term(vars.taken[course.index], cost);
        }
        model.set_objective(objective);
    }

    /// Family 1: `s * x_{i,s} <= D`.
    fn add_completion_bounds(&self, model: &mut MilpModel, vars: &PlanVars) {
        for course in self.catalog.courses() {
            let code = sanitize_name(&course.code);
            for s in 1..=self.smax() {
                let mut expr = LinExpr::new();
                expr.add_term(vars.slot[course.index][s as usize], s as f64)
                    .add_term(vars.completion, -1.0);
                model.constrain(format!("comp_{}_{}", code, s), expr, Sense::Le, 0.0);
            }
        }
    }

    /// Family 2: per-slot difficulty load is bounded by `DL`.
    fn add_difficulty_bounds(&self, model: &mut MilpModel, vars: &PlanVars) {
        for s in 1..=self.smax() {
            let mut expr = LinExpr::new();
            for course in self.catalog.courses() {
                expr.add_term(vars.slot[course.index][s as usize], course.difficulty as f64);
            }
            expr.add_term(vars.load, -1.0);
            model.constrain(format!("dl_{}", s), expr, Sense::Le, 0.0);
        }
    }

    /// Family 3: a course may only occupy slots it is offered in.
    fn add_offering_bounds(&self, model: &mut MilpModel, vars: &PlanVars) {
        for course in self.catalog.courses() {
            let offered: BTreeSet<u32> = self
                .catalog
                .offering_terms(course, self.calendar, self.smax())
                .into_iter()
                .collect();
            let code = sanitize_name(&course.code);
            for s in 1..=self.smax() {
                if !offered.contains(&s) {
                    let mut expr = LinExpr::new();
                    expr.add_term(vars.slot[course.index][s as usize], 1.0);
                    model.constrain(format!("off_{}_{}", code, s), expr, Sense::Le, 0.0);
                }
            }
        }
    }

    /// Family 4: CNF prerequisites. For each clause, at least one disjunct
    /// must be completed at least `prereq_gap(s)` slots earlier.
    fn add_prerequisites(&self, model: &mut MilpModel, vars: &PlanVars) {
        for course in self.catalog.courses() {
            let code = sanitize_name(&course.code);
            for (k, clause) in course.prereqs.iter().enumerate() {
                for s in 1..=self.smax() {
                    let gap = self.prereq_gap(s);
                    if s < gap {
                        continue;
                    }
                    let mut expr = LinExpr::new();
                    expr.add_term(vars.slot[course.index][s as usize], 1.0);
                    for other in clause.iter() {
                        if let Some(j) = self.catalog.index_of(other) {
                            for t in 0..=(s - gap) {
                                expr.add_term(vars.slot[j][t as usize], -1.0);
                            }
                        }
                    }
                    model.constrain(format!("prereq_{}_{}_{}", code, k, s), expr, Sense::Le, 0.0);
                }
            }
        }
    }

    /// Family 5: co-requisites, like prerequisites but satisfiable in the
    /// same slot.
    fn add_corequisites(&self, model: &mut MilpModel, vars: &PlanVars) {
        for course in self.catalog.courses() {
            let code = sanitize_name(&course.code);
            for other in course.coreqs.iter() {
                let j = match self.catalog.index_of(other) {
                    Some(j) => j,
                    None => continue,
                };
                for s in 1..=self.smax() {
                    let mut expr = LinExpr::new();
                    expr.add_term(vars.slot[course.index][s as usize], 1.0);
                    for t in 0..=s {
                        expr.add_term(vars.slot[j][t as usize], -1.0);
                    }
                    model.constrain(
                        format!("coreq_{}_{}_{}", code, sanitize_name(other), s),
                        expr,
                        Sense::Le,
                        0.0,
                    );
                }
            }
        }
    }

    /// Families 6-8: level gates. Four L4 courses before any L5 course, all
    /// L4 and four L5 courses before any L6 course.
    fn add_level_gates(&self, model: &mut MilpModel, vars: &PlanVars) {
        let l4: Vec<usize> = match self.groups.level_band("L4") {
            Some(g) => self.member_indexes(g),
            None => return,
        };
        let l5_band: Vec<usize> = self
            .groups
            .level_band("L5")
            .map(|g| self.member_indexes(g))
            .unwrap_or_default();
        let mut l5_gated = Vec::new();
        let mut seen = HashSet::new();
        for group in self.groups.level5_groups() {
            for i in self.member_indexes(group) {
                if seen.insert(i) {
                    l5_gated.push(i);
                }
            }
        }
        let l6: Vec<usize> = self
            .groups
            .level_band("L6")
            .map(|g| self.member_indexes(g))
            .unwrap_or_default();

        let gate = |model: &mut MilpModel,
                        label: &str,
                        targets: &[usize],
                        need: f64,
                        sources: &[usize]| {
            for &i in targets {
                let code = sanitize_name(&self.catalog.course(i).code);
                for s in 1..=self.smax() {
                    let gap = self.prereq_gap(s);
                    if s < gap {
                        continue;
                    }
                    let mut expr = LinExpr::new();
                    expr.add_term(vars.slot[i][s as usize], need);
                    for &j in sources {
                        for t in 0..=(s - gap) {
                            expr.add_term(vars.slot[j][t as usize], -1.0);
                        }
                    }
                    model.constrain(format!("{}_{}_{}", label, code, s), expr, Sense::Le, 0.0);
                }
            }
        };

        gate(model, "l5gate", &l5_gated, 4.0, &l4);
        gate(model, "l6l4gate", &l6, l4.len() as f64, &l4);
        gate(model, "l6l5gate", &l6, 4.0, &l5_band);
    }

    /// Family 9: total scheduled credits reach the graduation minimum.
    fn add_total_credits(&self, model: &mut MilpModel, vars: &PlanVars) {
        let mut expr = LinExpr::new();
        for course in self.catalog.courses() {
            expr.add_term(vars.taken[course.index], course.credits as f64);
        }
        model.constrain("total_credits".to_owned(), expr, Sense::Ge, self.params.tc as f64);
    }

    /// Family 10: LE (distribution) courses cannot be postponed past
    /// `MaxLETerm`.
    fn add_le_term_bound(&self, model: &mut MilpModel, vars: &PlanVars) {
        for group in self
            .groups
            .iter()
            .filter(|g| g.kind == GroupKind::Distribution && g.name.starts_with("LE"))
        {
            for i in self.member_indexes(group) {
                let code = sanitize_name(&self.catalog.course(i).code);
                for s in (self.params.max_le_term + 1)..=self.smax() {
                    let mut expr = LinExpr::new();
                    expr.add_term(vars.slot[i][s as usize], 1.0);
                    model.constrain(format!("le_{}_{}", code, s), expr, Sense::Eq, 0.0);
                }
            }
        }
    }

    /// Family 11: per-slot credit caps; a summer's three sessions share one
    /// combined cap.
    fn add_credit_caps(&self, model: &mut MilpModel, vars: &PlanVars) {
        let honors = self.student.honors;
        for window in self.term_windows() {
            let summer = self.calendar.happens_during_summer(window[0]);
            let mut expr = LinExpr::new();
            for &s in window.iter() {
                for course in self.catalog.courses() {
                    expr.add_term(vars.slot[course.index][s as usize], course.credits as f64);
                }
            }
            let (label, cap) = if summer {
                (
                    format!("summer_cmax_{}", window[0]),
                    self.params.summer_cmax(honors),
                )
            } else {
                (format!("cmax_{}", window[0]), self.params.cmax(honors))
            };
            model.constrain(label, expr, Sense::Le, cap as f64);
        }
    }

    /// Family 12: freshmen get a default course cap in their first term when
    /// the student did not set an own cap.
    fn add_freshman_cap(&self, model: &mut MilpModel, vars: &PlanVars) {
        if self.params.freshman_max_courses_per_term == 0
            || self.student.max_courses_per_term.is_some()
            || self.student.passed.len() as u32 >= self.params.min_courses_for_sophomore
            || self.smax() < 1
        {
            return;
        }
        let mut expr = LinExpr::new();
        for course in self.catalog.courses() {
            expr.add_term(vars.slot[course.index][1], 1.0);
        }
        model.constrain(
            "freshman_cap".to_owned(),
            expr,
            Sense::Le,
            self.params.freshman_max_courses_per_term as f64,
        );
    }

    /// Family 13: the student's general per-term course cap, skipped for
    /// slots with an explicit per-term bound.
    fn add_course_count_caps(&self, model: &mut MilpModel, vars: &PlanVars) {
        let cap = match self.student.max_courses_per_term {
            Some(cap) => cap,
            None => return,
        };
        for s in 1..=self.smax() {
            if self.student.per_term_counts.contains_key(&s) {
                continue;
            }
            let mut expr = LinExpr::new();
            for course in self.catalog.courses() {
                expr.add_term(vars.slot[course.index][s as usize], 1.0);
            }
            model.constrain(format!("crs_cap_{}", s), expr, Sense::Le, cap as f64);
        }
    }

    /// Family 14: explicit per-term course-count bounds.
    fn add_course_count_bounds(&self, model: &mut MilpModel, vars: &PlanVars) {
        for (&s, bound) in self.student.per_term_counts.iter() {
            if s < 1 || s > self.smax() {
                continue;
            }
            let mut expr = LinExpr::new();
            for course in self.catalog.courses() {
                expr.add_term(vars.slot[course.index][s as usize], 1.0);
            }
            model.constrain(format!("crs_bound_{}", s), expr, bound.sense, bound.n as f64);
        }
    }

    /// Family 15: in a slot holding the thesis course, at most
    /// `maxNumCrsDurThesis - 1` other courses fit.
    fn add_thesis_cap(&self, model: &mut MilpModel, vars: &PlanVars) -> Result<(), String> {
        let theta = self
            .catalog
            .index_of(&self.params.thesis_course_code)
            .ok_or_else(|| {
                format!(
                    "Thesis course '{}' is not in the catalog",
                    self.params.thesis_course_code
                )
            })?;
        let sigma = (self.student.max_courses_during_thesis - 1) as f64;
        let big_m = self.params.cmax(self.student.honors) as f64;
        for s in 1..=self.smax() {
            let mut expr = LinExpr::new();
            for course in self.catalog.courses() {
                if course.index != theta {
                    expr.add_term(vars.slot[course.index][s as usize], 1.0);
                }
            }
            expr.add_term(vars.slot[theta][s as usize], big_m - sigma);
            model.constrain(format!("thesis_{}", s), expr, Sense::Le, big_m);
        }
        Ok(())
    }

    /// Family 16: the summer term overlaps both short sessions, so the course
    /// count of S1+ST and of S2+ST is capped.
    fn add_summer_concurrency(&self, model: &mut MilpModel, vars: &PlanVars) {
        let cap = self.params.summer_conc_n_max as f64;
        for s in 1..=self.smax().saturating_sub(2) {
            if self.calendar.season_of(s) != Season::Summer1 {
                continue;
            }
            let mut first = LinExpr::new();
            let mut second = LinExpr::new();
            for course in self.catalog.courses() {
                first
                    .add_term(vars.slot[course.index][s as usize], 1.0)
                    .add_term(vars.slot[course.index][(s + 2) as usize], 1.0);
                second
                    .add_term(vars.slot[course.index][(s + 1) as usize], 1.0)
                    .add_term(vars.slot[course.index][(s + 2) as usize], 1.0);
            }
            model.constrain(format!("summer_conc_a_{}", s), first, Sense::Le, cap);
            model.constrain(format!("summer_conc_b_{}", s), second, Sense::Le, cap);
        }
    }

    /// Family 17: slot variables link to the per-course selection variable.
    fn add_linking(&self, model: &mut MilpModel, vars: &PlanVars) {
        for course in self.catalog.courses() {
            let mut expr = LinExpr::new();
            for s in 0..=self.smax() {
                expr.add_term(vars.slot[course.index][s as usize], 1.0);
            }
            expr.add_term(vars.taken[course.index], -1.0);
            model.constrain(
                format!("link_{}", sanitize_name(&course.code)),
                expr,
                Sense::Eq,
                0.0,
            );
        }
    }

    /// Family 18: distribution-group requirements (concentration, capstone,
    /// soft-order, OU, honors and level bands have their own families).
    fn add_group_requirements(&self, model: &mut MilpModel, vars: &PlanVars) {
        let passed = self.passed_indexes();
        for group in self
            .groups
            .iter()
            .filter(|g| g.kind == GroupKind::Distribution && !g.is_concentration_area)
        {
            let members = self.member_indexes(group);
            let name = sanitize_name(&group.name);
            let num_passed = members.iter().filter(|i| passed.contains(*i)).count() as u32;
            match group.count {
                CountReq::AtLeast(n) => {
                    let mut expr = LinExpr::new();
                    for &i in members.iter() {
                        expr.add_term(vars.taken[i], 1.0);
                    }
                    model.constrain(format!("grp_{}", name), expr, Sense::Ge, n as f64);
                }
                CountReq::Exactly(n) => {
                    let remaining = n.saturating_sub(num_passed);
                    let mut expr = LinExpr::new();
                    for &i in members.iter().filter(|i| !passed.contains(*i)) {
                        expr.add_term(vars.taken[i], 1.0);
                    }
                    model.constrain(format!("grp_{}_x", name), expr, Sense::Eq, remaining as f64);
                }
                CountReq::PerSemesterAtMost(n) => {
                    for window in self.term_windows() {
                        let mut expr = LinExpr::new();
                        for &s in window.iter() {
                            for &i in members.iter() {
                                expr.add_term(vars.slot[i][s as usize], 1.0);
                            }
                        }
                        model.constrain(
                            format!("grp_{}_{}", name, window[0]),
                            expr,
                            Sense::Le,
                            n as f64,
                        );
                    }
                }
                CountReq::AtMostWithPassed(n) => {
                    // the cap may be used up by passed courses already
                    if n > num_passed {
                        let mut expr = LinExpr::new();
                        for &i in members.iter().filter(|i| !passed.contains(*i)) {
                            expr.add_term(vars.taken[i], 1.0);
                        }
                        model.constrain(
                            format!("grp_{}_max", name),
                            expr,
                            Sense::Le,
                            (n - num_passed) as f64,
                        );
                    }
                }
                CountReq::None => {}
            }
            match group.credits {
                CreditReq::AtLeast(cr) => {
                    let mut expr = LinExpr::new();
                    for &i in members.iter() {
                        expr.add_term(vars.taken[i], self.catalog.course(i).credits as f64);
                    }
                    model.constrain(format!("grp_{}_cr", name), expr, Sense::Ge, cr as f64);
                }
                // minimum-disciplines semantics is declared upstream but never
                // exercised; no constraint until the rule is confirmed
                CreditReq::MinDisciplines(_) | CreditReq::None => {}
            }
        }
    }

    /// Family 19: slot 0 holds exactly the passed courses.
    fn add_passed(&self, model: &mut MilpModel, vars: &PlanVars) {
        for course in self.catalog.courses() {
            let code = sanitize_name(&course.code);
            let mut expr = LinExpr::new();
            expr.add_term(vars.slot[course.index][0], 1.0);
            if self.student.passed.contains(&course.code) {
                model.constrain(format!("passed_{}", code), expr, Sense::Eq, 1.0);
            } else {
                model.constrain(format!("hist_{}", code), expr, Sense::Eq, 0.0);
            }
        }
    }

    /// Family 20: desired courses are forced into the plan, restricted to
    /// their allowed slots; NOT-TO-TAKE entries are excluded.
    fn add_desired(&self, model: &mut MilpModel, vars: &PlanVars) -> Result<(), String> {
        for entry in self.student.desired.iter() {
            let i = match self.catalog.index_of(&entry.code) {
                Some(i) => i,
                None => continue,
            };
            let code = sanitize_name(&entry.code);
            let allowed = self.allowed_terms(&entry.terms)?;
            let mut force = LinExpr::new();
            force.add_term(vars.taken[i], 1.0);
            if allowed.len() as u32 == self.smax() {
                model.constrain(format!("desired_{}", code), force, Sense::Eq, 1.0);
            } else if allowed.is_empty() {
                model.constrain(format!("desired_{}", code), force, Sense::Eq, 0.0);
            } else {
                model.constrain(format!("desired_{}", code), force, Sense::Eq, 1.0);
                for s in 1..=self.smax() {
                    if !allowed.contains(&s) {
                        let mut expr = LinExpr::new();
                        expr.add_term(vars.slot[i][s as usize], 1.0);
                        model.constrain(format!("desired_{}_{}", code, s), expr, Sense::Eq, 0.0);
                    }
                }
            }
        }
        Ok(())
    }

    /// Expand a term preference into the set of allowed slots.
    fn allowed_terms(&self, pref: &TermPref) -> Result<BTreeSet<u32>, String> {
        let smax = self.smax();
        Ok(match pref {
            TermPref::AllTerms => (1..=smax).collect(),
            TermPref::NotToTake => BTreeSet::new(),
            TermPref::AllOtherTerms => (2..=smax).collect(),
            TermPref::Explicit(tokens) => {
                let mut allowed = BTreeSet::new();
                for token in tokens.iter() {
                    let s = self.calendar.term_no(token)?;
                    if s == 0 || s > smax {
                        log::warn!(
                            "Desired term {} lies outside the planning horizon; ignored.",
                            token
                        );
                    } else {
                        allowed.insert(s);
                    }
                }
                allowed
            }
        })
    }

    /// Family 21: switched-off summer sessions take no courses at all.
    fn add_session_toggles(&self, model: &mut MilpModel, vars: &PlanVars) {
        for s in 1..=self.smax() {
            let off = match self.calendar.season_of(s) {
                Season::Summer1 => self.student.s1_off,
                Season::Summer2 => self.student.s2_off,
                Season::SummerTerm => self.student.st_off,
                _ => false,
            };
            if off {
                let mut expr = LinExpr::new();
                for course in self.catalog.courses() {
                    expr.add_term(vars.slot[course.index][s as usize], 1.0);
                }
                model.constrain(format!("session_off_{}", s), expr, Sense::Le, 0.0);
            }
        }
    }

    /// Family 22: requirements of the chosen concentration's groups.
    fn add_concentration(&self, model: &mut MilpModel, vars: &PlanVars) {
        for group in self.groups.concentration_groups(&self.student.concentration) {
            let members = self.member_indexes(group);
            let name = sanitize_name(&group.name);
            if let CountReq::AtLeast(n) = group.count {
                let mut expr = LinExpr::new();
                for &i in members.iter() {
                    expr.add_term(vars.taken[i], 1.0);
                }
                model.constrain(format!("conc_{}", name), expr, Sense::Ge, n as f64);
            }
            if let CreditReq::AtLeast(cr) = group.credits {
                let mut expr = LinExpr::new();
                for &i in members.iter() {
                    expr.add_term(vars.taken[i], self.catalog.course(i).credits as f64);
                }
                model.constrain(format!("conc_{}_cr", name), expr, Sense::Ge, cr as f64);
            }
        }
    }

    /// Family 23: capstone gates. The capstone course needs a credit total
    /// and a number of concentration courses completed strictly before it.
    fn add_capstone_gates(&self, model: &mut MilpModel, vars: &PlanVars) {
        for group in self.groups.capstones() {
            let kappa = match group.members.first().and_then(|c| self.catalog.index_of(c)) {
                Some(i) => i,
                None => continue,
            };
            let credit_gate = match group.credits {
                CreditReq::AtLeast(cr) => cr,
                _ => 0,
            };
            let count_gate = match group.count {
                CountReq::AtLeast(n) => n,
                _ => 0,
            };
            let conc_members: Vec<usize> = {
                let mut seen = HashSet::new();
                self.groups
                    .concentration_groups(&self.student.concentration)
                    .flat_map(|g| self.member_indexes(g))
                    .filter(|i| *i != kappa && seen.insert(*i))
                    .collect()
            };
            for s in 1..=self.smax() {
                let gap = self.prereq_gap(s);
                if s < gap {
                    continue;
                }
                if credit_gate > 0 {
                    let mut expr = LinExpr::new();
                    expr.add_term(vars.slot[kappa][s as usize], credit_gate as f64);
                    for course in self.catalog.courses() {
                        if course.index == kappa {
                            continue;
                        }
                        for t in 0..=(s - gap) {
                            expr.add_term(
                                vars.slot[course.index][t as usize],
                                -(course.credits as f64),
                            );
                        }
                    }
                    model.constrain(format!("capstone_cr_{}", s), expr, Sense::Le, 0.0);
                }
                if count_gate > 0 && !conc_members.is_empty() {
                    let mut expr = LinExpr::new();
                    expr.add_term(vars.slot[kappa][s as usize], count_gate as f64);
                    for &j in conc_members.iter() {
                        for t in 0..=(s - gap) {
                            expr.add_term(vars.slot[j][t as usize], -1.0);
                        }
                    }
                    model.constrain(format!("capstone_n_{}", s), expr, Sense::Le, 0.0);
                }
            }
        }
    }

    /// Family 24: soft-order pairs. If both are scheduled, the first precedes
    /// the second within the configured distance.
    fn add_soft_orders(&self, model: &mut MilpModel, vars: &PlanVars) {
        for group in self.groups.soft_orders() {
            let (a, b) = match (
                group.members.first().and_then(|c| self.catalog.index_of(c)),
                group.members.get(1).and_then(|c| self.catalog.index_of(c)),
            ) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let distance = match group.count {
                CountReq::AtLeast(n) => n,
                _ => 0,
            };
            let name = sanitize_name(&group.name);
            for s in 1..=self.smax() {
                let lo = if distance > 0 {
                    s.saturating_sub(distance)
                } else {
                    0
                };
                let mut expr = LinExpr::new();
                expr.add_term(vars.slot[b][s as usize], 1.0);
                for t in lo..s {
                    expr.add_term(vars.slot[a][t as usize], -1.0);
                }
                expr.add_term(vars.taken[a], 1.0);
                model.constrain(format!("softorder_{}_{}", name, s), expr, Sense::Le, 1.0);
            }
        }
    }

    /// Family 25: OU courses are capped per academic year (each fall through
    /// the following summer term), with the current year's already-taken OU
    /// courses reducing the first window's budget.
    fn add_ou_annual_caps(&self, model: &mut MilpModel, vars: &PlanVars) {
        for group in self.groups.ou_groups() {
            let cap = match group.count {
                CountReq::AtLeast(n) => n,
                _ => continue,
            };
            let members = self.member_indexes(group);
            let name = sanitize_name(&group.name);
            for s in 1..=self.smax() {
                if !self.calendar.is_fall_term(s) {
                    continue;
                }
                let hi = (s + 4).min(self.smax());
                let mut expr = LinExpr::new();
                for t in s..=hi {
                    for &j in members.iter() {
                        expr.add_term(vars.slot[j][t as usize], 1.0);
                    }
                }
                model.constrain(format!("ou_{}_{}", name, s), expr, Sense::Le, cap as f64);
            }
            if self.smax() >= 1 && !self.calendar.is_fall_term(1) {
                let hi = (self.calendar.next_fall_term(1) - 1).min(self.smax());
                let budget = cap.saturating_sub(self.student.num_ou_this_year);
                let mut expr = LinExpr::new();
                for t in 1..=hi {
                    for &j in members.iter() {
                        expr.add_term(vars.slot[j][t as usize], 1.0);
                    }
                }
                model.constrain(format!("ou_{}_y1", name), expr, Sense::Le, budget as f64);
            }
        }
    }

    /// Family 26: non-honors students may not take honors-only courses.
    fn add_honors_restriction(&self, model: &mut MilpModel, vars: &PlanVars) {
        if self.student.honors {
            return;
        }
        let group = match self.groups.honor_group() {
            Some(g) => g,
            None => return,
        };
        for i in self.member_indexes(group) {
            let course = self.catalog.course(i);
            if self.student.passed.contains(&course.code) {
                continue;
            }
            let mut expr = LinExpr::new();
            expr.add_term(vars.taken[i], 1.0);
            model.constrain(
                format!("honors_{}", sanitize_name(&course.code)),
                expr,
                Sense::Eq,
                0.0,
            );
        }
    }
}

#[cfg(test)]
mod tests;
