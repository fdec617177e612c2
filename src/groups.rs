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

//! Typed course groups. The group files encode several distinct kinds of
//! degree rule in one record, discriminated by a name prefix and by the
//! textual form of the count and credit expressions; the loader classifies
//! them into [`GroupKind`], [`CountReq`] and [`CreditReq`] so the model
//! builder can match on what a group means instead of re-parsing sentinels.

use crate::catalog::Catalog;

/// What a group is, derived from its name prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupKind {
    /// A plain distribution requirement (also concentration-area groups,
    /// which bind only when their concentration is chosen)
    Distribution,
    /// `capstone*`: a single capstone course with credit/concentration gates
    Capstone,
    /// `softorder*`: an ordered pair with an optional maximum term distance
    SoftOrder,
    /// `OU*`: a per-academic-year cap on courses from the member list
    OuAnnual,
    /// `HonorGroup`: members are off limits for non-honors students
    Honors,
    /// `L4`, `L5`, `L6` and `L5-*`: level bands driving the level gates
    LevelBand,
}

/// Course-count requirement of a group, from the textual count expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountReq {
    None,
    /// Bare positive integer: at least this many members must be taken
    AtLeast(u32),
    /// `=N`: exactly N of the remaining-to-take members (passed members
    /// decrement N, floored at 0)
    Exactly(u32),
    /// `<=N`: at most N members may share one term
    PerSemesterAtMost(u32),
    /// `-N`: at most N members net of the already-passed ones
    AtMostWithPassed(u32),
}

/// Credit requirement of a group, from the textual credits expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreditReq {
    None,
    /// At least this many credits from member courses
    AtLeast(u32),
    /// Negative value in the file: at least this many distinct disciplines.
    /// Parsed and validated, but currently not turned into a constraint (the
    /// rule is declared but unexercised upstream).
    MinDisciplines(u32),
}

impl CountReq {
    /// Parse a count expression: empty or `0` means none, `N` at-least,
    /// `=N` exactly, `<=N` a per-semester cap, `-N` at-most-net-of-passed.
    pub fn parse(expr: &str) -> Result<CountReq, String> {
        let expr = expr.trim();
        if expr.is_empty() || expr == "0" {
            return Ok(CountReq::None);
        }
        let parse_num = |num: &str| -> Result<u32, String> {
            num.trim()
                .parse()
                .map_err(|_| format!("Unrecognized count expression '{}'", expr))
        };
        if let Some(rest) = expr.strip_prefix("<=") {
            Ok(CountReq::PerSemesterAtMost(parse_num(rest)?))
        } else if let Some(rest) = expr.strip_prefix('=') {
            Ok(CountReq::Exactly(parse_num(rest)?))
        } else if let Some(rest) = expr.strip_prefix('-') {
            Ok(CountReq::AtMostWithPassed(parse_num(rest)?))
        } else {
            Ok(CountReq::AtLeast(parse_num(expr)?))
        }
    }
}

impl CreditReq {
    /// Parse a credits expression: empty or `0` means none, positive at-least,
    /// negative a minimum-disciplines requirement.
    pub fn parse(expr: &str) -> Result<CreditReq, String> {
        let expr = expr.trim();
        if expr.is_empty() || expr == "0" {
            return Ok(CreditReq::None);
        }
        let n: i64 = expr
            .parse()
            .map_err(|_| format!("Unrecognized credits expression '{}'", expr))?;
        if n < 0 {
            Ok(CreditReq::MinDisciplines((-n) as u32))
        } else {
            Ok(CreditReq::AtLeast(n as u32))
        }
    }
}

/// A typed course group.
#[derive(Clone, Debug)]
pub struct CourseGroup {
    /// Unique group name; its prefix selects the [`GroupKind`]
    pub name: String,
    /// Marks groups belonging to a concentration area
    pub is_concentration_area: bool,
    /// Member course codes. Order is significant only for soft-order groups
    pub members: Vec<String>,
    pub count: CountReq,
    pub credits: CreditReq,
    pub kind: GroupKind,
}

impl CourseGroup {
    pub fn new(
        name: String,
        is_concentration_area: bool,
        members: Vec<String>,
        count: CountReq,
        credits: CreditReq,
    ) -> CourseGroup {
        let kind = classify(&name);
        CourseGroup {
            name,
            is_concentration_area,
            members,
            count,
            credits,
            kind,
        }
    }
}

fn classify(name: &str) -> GroupKind {
    if name.starts_with("capstone") {
        GroupKind::Capstone
    } else if name.starts_with("softorder") {
        GroupKind::SoftOrder
    } else if name.starts_with("OU") {
        GroupKind::OuAnnual
    } else if name == "HonorGroup" {
        GroupKind::Honors
    } else if name == "L4" || name == "L5" || name == "L6" || name.starts_with("L5-") {
        GroupKind::LevelBand
    } else {
        GroupKind::Distribution
    }
}

/// The read-only registry of all course groups.
#[derive(Clone, Debug, Default)]
pub struct GroupRegistry {
    groups: Vec<CourseGroup>,
}

impl GroupRegistry {
    pub fn new(groups: Vec<CourseGroup>) -> Result<GroupRegistry, String> {
        let mut seen = std::collections::HashSet::new();
        for group in groups.iter() {
            if !seen.insert(group.name.clone()) {
                return Err(format!("Duplicate group name '{}'", group.name));
            }
        }
        Ok(GroupRegistry { groups })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseGroup> {
        self.groups.iter()
    }

    pub fn get(&self, name: &str) -> Option<&CourseGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Members of the `L4`/`L5`/`L6` level band, if present.
    pub fn level_band(&self, name: &str) -> Option<&CourseGroup> {
        self.groups
            .iter()
            .find(|g| g.kind == GroupKind::LevelBand && g.name == name)
    }

    /// All groups that gate level-5 courses: `L5` itself and every `L5-*`.
    pub fn level5_groups(&self) -> impl Iterator<Item = &CourseGroup> {
        self.groups
            .iter()
            .filter(|g| g.kind == GroupKind::LevelBand && (g.name == "L5" || g.name.starts_with("L5-")))
    }

    pub fn honor_group(&self) -> Option<&CourseGroup> {
        self.groups.iter().find(|g| g.kind == GroupKind::Honors)
    }

    pub fn capstones(&self) -> impl Iterator<Item = &CourseGroup> {
        self.groups.iter().filter(|g| g.kind == GroupKind::Capstone)
    }

    pub fn soft_orders(&self) -> impl Iterator<Item = &CourseGroup> {
        self.groups.iter().filter(|g| g.kind == GroupKind::SoftOrder)
    }

    pub fn ou_groups(&self) -> impl Iterator<Item = &CourseGroup> {
        self.groups.iter().filter(|g| g.kind == GroupKind::OuAnnual)
    }

    /// Groups carrying the chosen concentration's requirements.
    pub fn concentration_groups<'a>(
        &'a self,
        concentration: &'a str,
    ) -> impl Iterator<Item = &'a CourseGroup> {
        self.groups.iter().filter(move |g| {
            g.is_concentration_area && !concentration.is_empty() && g.name.starts_with(concentration)
        })
    }

    /// Check the structural group invariants and that every member code
    /// exists in the catalog.
    pub fn validate(&self, catalog: &Catalog) -> Result<(), String> {
        for group in self.groups.iter() {
            for code in group.members.iter() {
                if catalog.get(code).is_none() {
                    return Err(format!(
                        "Group '{}' references unknown course '{}'",
                        group.name, code
                    ));
                }
            }
            match group.kind {
                GroupKind::Capstone if group.members.len() != 1 => {
                    return Err(format!(
                        "Capstone group '{}' must have exactly one member, has {}",
                        group.name,
                        group.members.len()
                    ));
                }
                GroupKind::SoftOrder if group.members.len() != 2 => {
                    return Err(format!(
                        "Soft-order group '{}' must have exactly two members, has {}",
                        group.name,
                        group.members.len()
                    ));
                }
                _ => {}
            }
        }
        for band in ["L4", "L5", "L6"] {
            if self.level_band(band).is_none() {
                return Err(format!("Required level band '{}' is missing", band));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(name: &str, members: &[&str], count: &str, credits: &str) -> CourseGroup {
        CourseGroup::new(
            name.to_owned(),
            false,
            members.iter().map(|m| (*m).to_owned()).collect(),
            CountReq::parse(count).unwrap(),
            CreditReq::parse(credits).unwrap(),
        )
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(group("HUM", &[], "", "").kind, GroupKind::Distribution);
        assert_eq!(group("capstoneCS", &["X"], "", "").kind, GroupKind::Capstone);
        assert_eq!(
            group("softorder1", &["A", "B"], "", "").kind,
            GroupKind::SoftOrder
        );
        assert_eq!(group("OUFree", &[], "", "").kind, GroupKind::OuAnnual);
        assert_eq!(group("HonorGroup", &[], "", "").kind, GroupKind::Honors);
        for name in ["L4", "L5", "L6", "L5-AI"] {
            assert_eq!(group(name, &[], "", "").kind, GroupKind::LevelBand);
        }
        // L5x is not a band name
        assert_eq!(group("L5x", &[], "", "").kind, GroupKind::Distribution);
    }

    #[test]
    fn test_count_expression_forms() {
        assert_eq!(CountReq::parse("").unwrap(), CountReq::None);
        assert_eq!(CountReq::parse("0").unwrap(), CountReq::None);
        assert_eq!(CountReq::parse("3").unwrap(), CountReq::AtLeast(3));
        assert_eq!(CountReq::parse("=2").unwrap(), CountReq::Exactly(2));
        assert_eq!(
            CountReq::parse("<=1").unwrap(),
            CountReq::PerSemesterAtMost(1)
        );
        assert_eq!(
            CountReq::parse("-4").unwrap(),
            CountReq::AtMostWithPassed(4)
        );
        assert!(CountReq::parse("x").is_err());
    }

    #[test]
    fn test_credit_expression_forms() {
        assert_eq!(CreditReq::parse("").unwrap(), CreditReq::None);
        assert_eq!(CreditReq::parse("12").unwrap(), CreditReq::AtLeast(12));
        assert_eq!(
            CreditReq::parse("-3").unwrap(),
            CreditReq::MinDisciplines(3)
        );
        assert!(CreditReq::parse("many").is_err());
    }

    #[test]
    fn test_registry_validation() {
        use crate::catalog::{Catalog, Course, OfferingSpec};
        let mk = |code: &str| Course {
            index: 0,
            code: code.to_owned(),
            title: code.to_owned(),
            synonyms: Vec::new(),
            credits: 3,
            prereqs: Vec::new(),
            coreqs: std::collections::BTreeSet::new(),
            offering: OfferingSpec::default(),
            display_name: None,
            difficulty: 0,
            est_grade: 0.0,
        };
        let catalog = Catalog::new(vec![mk("A"), mk("B"), mk("C")]).unwrap();

        let bands = || {
            vec![
                group("L4", &["A"], "", ""),
                group("L5", &["B"], "", ""),
                group("L6", &["C"], "", ""),
            ]
        };

        let registry = GroupRegistry::new(bands()).unwrap();
        assert!(registry.validate(&catalog).is_ok());

        let mut groups = bands();
        groups.push(group("HUM", &["NOPE"], "2", ""));
        let registry = GroupRegistry::new(groups).unwrap();
        assert!(registry.validate(&catalog).is_err());

        let mut groups = bands();
        groups.push(group("capstoneX", &["A", "B"], "", ""));
        let registry = GroupRegistry::new(groups).unwrap();
        assert!(registry.validate(&catalog).is_err());

        let mut groups = bands();
        groups.push(group("softorderX", &["A"], "", ""));
        let registry = GroupRegistry::new(groups).unwrap();
        assert!(registry.validate(&catalog).is_err());

        // missing L6
        let registry = GroupRegistry::new(vec![
            group("L4", &["A"], "", ""),
            group("L5", &["B"], "", ""),
        ])
        .unwrap();
        assert!(registry.validate(&catalog).is_err());
    }

    #[test]
    fn test_concentration_lookup() {
        let mut ai = group("AI-core", &["A"], "2", "");
        ai.is_concentration_area = true;
        let mut ai2 = group("AI-electives", &["B"], "1", "");
        ai2.is_concentration_area = true;
        let other = group("AI-unrelated", &["C"], "1", "");
        let registry = GroupRegistry::new(vec![ai, ai2, other]).unwrap();
        let names: Vec<&str> = registry
            .concentration_groups("AI")
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, vec!["AI-core", "AI-electives"]);
        assert_eq!(registry.concentration_groups("").count(), 0);
    }
}
