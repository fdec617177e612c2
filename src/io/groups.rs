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

//! Reader for `*.grp` course-group files.
//!
//! A group file has two significant lines (plus optional `#` comments):
//! the group record `name ; isConcentration ; countExpr ; creditsExpr` and
//! the semicolon-separated member codes.

use std::io::Read;
use std::path::Path;

use log::debug;

use crate::groups::{CountReq, CourseGroup, CreditReq, GroupRegistry};

/// Read a single group file. `source` names the file in error messages.
pub fn read_group<R: Read>(mut reader: R, source: &str) -> Result<CourseGroup, String> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| format!("Could not read group file {}: {}", source, e))?;

    let mut lines = super::significant_lines(&text);
    let (_, head) = lines
        .next()
        .ok_or_else(|| format!("{}: missing group record line", source))?;
    let (_, member_line) = lines
        .next()
        .ok_or_else(|| format!("{}: missing member line", source))?;

    let fields = super::split_fields(head);
    if fields.len() != 4 {
        return Err(format!(
            "{}: expected 'name ; isConcentration ; countExpr ; creditsExpr', got {} fields",
            source,
            fields.len()
        ));
    }
    let name = fields[0];
    if name.is_empty() {
        return Err(format!("{}: empty group name", source));
    }
    let is_concentration_area = match fields[1].to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" | "" => false,
        other => {
            return Err(format!(
                "{}: invalid isConcentration flag '{}'",
                source, other
            ))
        }
    };
    let count = CountReq::parse(fields[2]).map_err(|e| format!("{}: {}", source, e))?;
    let credits = CreditReq::parse(fields[3]).map_err(|e| format!("{}: {}", source, e))?;

    let members: Vec<String> = super::split_fields(member_line)
        .into_iter()
        .filter(|code| !code.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(CourseGroup::new(
        name.to_owned(),
        is_concentration_area,
        members,
        count,
        credits,
    ))
}

/// Read every `*.grp` file in a directory (sorted by file name, for a stable
/// registry order) into a group registry.
pub fn read_group_dir(dir: &Path) -> Result<GroupRegistry, String> {
    let mut paths: Vec<std::path::PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| format!("Could not read group directory {}: {}", dir.display(), e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "grp"))
        .collect();
    paths.sort();

    let mut groups = Vec::with_capacity(paths.len());
    for path in paths {
        let file = std::fs::File::open(&path)
            .map_err(|e| format!("Could not open group file {}: {}", path.display(), e))?;
        groups.push(read_group(file, &path.display().to_string())?);
    }
    debug!("Read {} group files from {}.", groups.len(), dir.display());
    GroupRegistry::new(groups)
}
