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

//! Term calendar: the single source of truth for mapping term tokens (e.g.
//! `FA2023`) to planning-slot numbers and back, and for classifying slots into
//! seasons.
//!
//! Slot 0 denotes "already passed"; slot `s >= 1` is the s-th term after the
//! current one. The academic year cycles through five seasons in fixed order:
//! Spring, Summer 1, Summer 2, Summer Term, Fall. Every constraint family that
//! cares about summer sessions speaks in these slot numbers, so the offset
//! arithmetic lives here and nowhere else.

use chrono::{Datelike, NaiveDate};

/// The five seasons of an academic year, in their yearly order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer1,
    Summer2,
    SummerTerm,
    Fall,
}

impl Season {
    /// Position of the season in the five-season cycle.
    pub fn cycle_pos(self) -> i64 {
        match self {
            Season::Spring => 0,
            Season::Summer1 => 1,
            Season::Summer2 => 2,
            Season::SummerTerm => 3,
            Season::Fall => 4,
        }
    }

    fn from_cycle_pos(pos: i64) -> Season {
        match pos.rem_euclid(5) {
            0 => Season::Spring,
            1 => Season::Summer1,
            2 => Season::Summer2,
            3 => Season::SummerTerm,
            _ => Season::Fall,
        }
    }

    /// Two-letter code used in term tokens.
    pub fn code(self) -> &'static str {
        match self {
            Season::Spring => "SP",
            Season::Summer1 => "S1",
            Season::Summer2 => "S2",
            Season::SummerTerm => "ST",
            Season::Fall => "FA",
        }
    }

    pub fn from_code(code: &str) -> Option<Season> {
        match code {
            "SP" => Some(Season::Spring),
            "S1" => Some(Season::Summer1),
            "S2" => Some(Season::Summer2),
            "ST" => Some(Season::SummerTerm),
            "FA" => Some(Season::Fall),
            _ => None,
        }
    }

    /// True for S1, S2 and ST.
    pub fn is_summer_session(self) -> bool {
        matches!(self, Season::Summer1 | Season::Summer2 | Season::SummerTerm)
    }
}

/// Parse a term token of the form `FA2023` into its season and calendar year.
pub fn parse_term_token(token: &str) -> Result<(Season, i32), String> {
    if token.len() != 6 {
        return Err(format!("Malformed term token '{}'", token));
    }
    let season = Season::from_code(&token[..2])
        .ok_or_else(|| format!("Unknown season code in term token '{}'", token))?;
    let year: i32 = token[2..]
        .parse()
        .map_err(|_| format!("Malformed year in term token '{}'", token))?;
    Ok((season, year))
}

/// Term calendar anchored at a current date.
///
/// Internally a term is its absolute index `year * 5 + season position`; all
/// slot numbers are offsets from the current term's absolute index.
#[derive(Clone, Copy, Debug)]
pub struct Calendar {
    current_abs: i64,
}

impl Calendar {
    /// Derive the current term from a calendar date.
    ///
    /// Jan 1-5 still belongs to the previous year's fall term; spring runs
    /// Jan 6 - May 31, the summer sessions split June (S1), July (S2) and
    /// August (ST), and fall runs Sep 1 - Dec 31.
    pub fn from_date(date: NaiveDate) -> Calendar {
        let (season, year) = match date.month() {
            1 if date.day() <= 5 => (Season::Fall, date.year() - 1),
            1..=5 => (Season::Spring, date.year()),
            6 => (Season::Summer1, date.year()),
            7 => (Season::Summer2, date.year()),
            8 => (Season::SummerTerm, date.year()),
            _ => (Season::Fall, date.year()),
        };
        Calendar::at_term(season, year)
    }

    /// Calendar whose current term is the given season/year. Useful for tests
    /// and reproducible runs.
    pub fn at_term(season: Season, year: i32) -> Calendar {
        Calendar {
            current_abs: year as i64 * 5 + season.cycle_pos(),
        }
    }

    pub fn current_season(&self) -> Season {
        Season::from_cycle_pos(self.current_abs)
    }

    pub fn current_year(&self) -> i32 {
        self.current_abs.div_euclid(5) as i32
    }

    /// Slot number of a term token. Returns 0 for tokens at or before the
    /// current term (i.e. already passed), the positive offset otherwise.
    pub fn term_no(&self, token: &str) -> Result<u32, String> {
        let (season, year) = parse_term_token(token)?;
        let abs = year as i64 * 5 + season.cycle_pos();
        let offset = abs - self.current_abs;
        if offset <= 0 {
            Ok(0)
        } else {
            Ok(offset as u32)
        }
    }

    /// Term token for a slot number (the inverse of [`Calendar::term_no`] for
    /// slots `>= 1`).
    pub fn term_name(&self, n: u32) -> String {
        let abs = self.current_abs + n as i64;
        format!(
            "{}{}",
            Season::from_cycle_pos(abs).code(),
            abs.div_euclid(5)
        )
    }

    /// Season of a slot number.
    pub fn season_of(&self, n: u32) -> Season {
        Season::from_cycle_pos(self.current_abs + n as i64)
    }

    /// True iff slot `n` is the summer term (ST).
    pub fn is_summer_term(&self, n: u32) -> bool {
        self.season_of(n) == Season::SummerTerm
    }

    /// True iff slot `n` falls in any summer session (S1, S2 or ST).
    pub fn happens_during_summer(&self, n: u32) -> bool {
        self.season_of(n).is_summer_session()
    }

    /// True iff slot `n` is a fall term.
    pub fn is_fall_term(&self, n: u32) -> bool {
        self.season_of(n) == Season::Fall
    }

    /// The first fall slot at or after `n`.
    pub fn next_fall_term(&self, n: u32) -> u32 {
        (n..n + 5)
            .find(|m| self.is_fall_term(*m))
            .expect("a fall term occurs in any five consecutive slots")
    }
}
