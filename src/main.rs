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

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, error, info, warn};

use degopt::calendar::Calendar;
use degopt::model::ModelBuilder;
use degopt::solution::format_schedule;
use degopt::solver::{self, SolveError};
use degopt::{io, ObjectiveWeights, StudentInput, TermCountBound};

fn main() {
    // Setup logging & parse command line arguments
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!(
        "This is the degree-plan optimizer (degopt), version {}",
        option_env!("CARGO_PKG_VERSION").unwrap_or("unknown")
    );
    let args = parse_cli_args();

    if args.get_one::<String>("OUTPUT").is_none() && !args.get_flag("print") {
        warn!("No OUTPUT file and no --print option given. The schedule will not be exported anywhere.");
    }

    let data_dir = PathBuf::from(args.get_one::<String>("DATA").unwrap());

    // Derive the current term
    let date = match args.get_one::<String>("date") {
        Some(raw) => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap_or_else(|e| {
            error!("Could not parse --date {}: {}", raw, e);
            std::process::exit(exitcode::USAGE)
        }),
        None => chrono::Local::now().date_naive(),
    };
    let calendar = Calendar::from_date(date);
    info!(
        "Current term is {}{}.",
        calendar.current_season().code(),
        calendar.current_year()
    );

    // Load program parameters, catalog and groups
    let params_path = data_dir.join("params.props");
    let params = io::params::read(open_input(&params_path)).unwrap_or_else(|e| {
        error!("Could not read {}: {}", params_path.display(), e);
        std::process::exit(exitcode::DATAERR)
    });

    let courses_path = data_dir.join("cls.csv");
    let mut catalog = io::courses::read(
        open_input(&courses_path),
        params.course_csv_file_header.as_deref(),
    )
    .unwrap_or_else(|e| {
        error!("Could not read {}: {}", courses_path.display(), e);
        std::process::exit(exitcode::DATAERR)
    });

    let grades_path = resolve_path(&args, "grades", &data_dir, "estimated_grades.txt");
    if grades_path.is_file() {
        let grades = io::courses::read_estimated_grades(
            open_input(&grades_path),
            params.min_grade_thres,
        )
        .unwrap_or_else(|e| {
            error!("Could not read {}: {}", grades_path.display(), e);
            std::process::exit(exitcode::DATAERR)
        });
        if let Err(e) = catalog.apply_estimated_grades(&grades) {
            error!("Could not apply estimated grades: {}", e);
            std::process::exit(exitcode::DATAERR)
        }
    }

    if let Err(e) = catalog.validate() {
        error!("Catalog integrity error: {}", e);
        std::process::exit(exitcode::DATAERR)
    }

    let groups = io::groups::read_group_dir(&data_dir).unwrap_or_else(|e| {
        error!("Could not read course groups: {}", e);
        std::process::exit(exitcode::DATAERR)
    });
    if let Err(e) = groups.validate(&catalog) {
        error!("Group integrity error: {}", e);
        std::process::exit(exitcode::DATAERR)
    }

    // In debug build: Check consistency of imported data
    if cfg!(debug_assertions) {
        io::assert_data_consistency(&catalog, &groups);
    }

    info!(
        "Found {} courses and {} course groups for planning over {} terms.",
        catalog.len(),
        groups.len(),
        params.smax
    );

    // Per-student input
    let passed_path = resolve_path(&args, "passed", &data_dir, "passedcourses.txt");
    let passed = if passed_path.is_file() {
        io::student::read_passed(open_input(&passed_path)).unwrap_or_else(|e| {
            error!("Could not read {}: {}", passed_path.display(), e);
            std::process::exit(exitcode::DATAERR)
        })
    } else {
        debug!("No passed-courses file at {}.", passed_path.display());
        Default::default()
    };

    let desired_path = resolve_path(&args, "desired", &data_dir, "desiredcourses.txt");
    let desired = if desired_path.is_file() {
        io::student::read_desired(open_input(&desired_path)).unwrap_or_else(|e| {
            error!("Could not read {}: {}", desired_path.display(), e);
            std::process::exit(exitcode::DATAERR)
        })
    } else {
        debug!("No desired-courses file at {}.", desired_path.display());
        Vec::new()
    };

    let weights = parse_weights(args.get_one::<String>("weights").unwrap()).unwrap_or_else(|e| {
        error!("Could not parse --weights: {}", e);
        std::process::exit(exitcode::USAGE)
    });
    let per_term_counts = parse_term_counts(&args).unwrap_or_else(|e| {
        error!("Could not parse --term-count: {}", e);
        std::process::exit(exitcode::USAGE)
    });

    let student = StudentInput {
        passed,
        desired,
        per_term_counts,
        honors: args.get_flag("honors"),
        s1_off: args.get_flag("no_s1"),
        s2_off: args.get_flag("no_s2"),
        st_off: args.get_flag("no_st"),
        max_courses_per_term: args.get_one::<u32>("max_courses").copied(),
        max_courses_during_thesis: *args.get_one::<u32>("thesis_max").unwrap(),
        concentration: args
            .get_one::<String>("concentration")
            .cloned()
            .unwrap_or_default(),
        num_ou_this_year: *args.get_one::<u32>("ou_taken").unwrap(),
        weights,
    }
    .validated(&catalog)
    .unwrap_or_else(|e| {
        error!("Invalid student input: {}", e);
        std::process::exit(exitcode::DATAERR)
    });

    if params.smax == 0 {
        warn!("Smax is 0; no future terms are available for planning.");
    }

    // Assemble and solve the model
    let builder = ModelBuilder::new(&catalog, &groups, &params, &student, &calendar);
    let (model, vars) = builder.build().unwrap_or_else(|e| {
        error!("Could not assemble the model: {}", e);
        std::process::exit(exitcode::DATAERR)
    });

    let model_path = PathBuf::from(args.get_one::<String>("model_out").unwrap());
    let solution_path = PathBuf::from(args.get_one::<String>("solution_out").unwrap());
    match solver::solve(&model, &vars, Some(&model_path), Some(&solution_path)) {
        Ok((schedule, stats)) => {
            info!("Finished solving the degree plan. {}", stats);
            info!(
                "Credits so far: {}; credits planned: {} (graduation minimum {}).",
                schedule.credits_taken_so_far(&catalog),
                schedule.credits_to_take(&catalog),
                params.tc
            );

            if let Some(outpath) = args.get_one::<String>("OUTPUT") {
                debug!("Opening output file {} ...", outpath);
                match File::create(outpath) {
                    Err(e) => error!("Could not open output file {}: {}.", outpath, e),
                    Ok(file) => match io::write_schedule(file, &schedule) {
                        Ok(_) => debug!("Schedule written to {}.", outpath),
                        Err(e) => error!("Could not write schedule to {}: {}.", outpath, e),
                    },
                }
            }

            if args.get_flag("print") {
                print!(
                    "The schedule is:\n{}",
                    format_schedule(&schedule, &catalog, &calendar, params.smax)
                );
            }
        }
        Err(SolveError::Infeasible) => {
            warn!("Model infeasible or unsolvable: no schedule satisfies all constraints.");
            std::process::exit(1);
        }
        Err(e) => {
            error!("Solving failed: {}", e);
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn open_input(path: &Path) -> File {
    debug!("Opening input file {} ...", path.display());
    File::open(path).unwrap_or_else(|e| {
        error!("Could not open input file {}: {}", path.display(), e);
        std::process::exit(exitcode::NOINPUT)
    })
}

/// Path of an optional per-student file: the explicit argument if given, the
/// conventional file in the data directory otherwise.
fn resolve_path(args: &clap::ArgMatches, key: &str, data_dir: &Path, default_name: &str) -> PathBuf {
    args.get_one::<String>(key)
        .map(PathBuf::from)
        .unwrap_or_else(|| data_dir.join(default_name))
}

/// Parse the `DN,DL,Cr,Gr` objective weight tuple.
fn parse_weights(raw: &str) -> Result<ObjectiveWeights, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        return Err(format!("expected DN,DL,Cr,Gr, got '{}'", raw));
    }
    let parse =
        |p: &str| -> Result<f64, String> { p.parse().map_err(|_| format!("invalid weight '{}'", p)) };
    Ok(ObjectiveWeights {
        dn: parse(parts[0])?,
        dl: parse(parts[1])?,
        cr: parse(parts[2])?,
        gr: parse(parts[3])?,
    })
}

/// Parse repeated `--term-count TERM=EXPR` arguments.
fn parse_term_counts(args: &clap::ArgMatches) -> Result<BTreeMap<u32, TermCountBound>, String> {
    let mut counts = BTreeMap::new();
    if let Some(values) = args.get_many::<String>("term_count") {
        for value in values {
            let (term, expr) = value
                .split_once('=')
                .ok_or_else(|| format!("expected TERM=EXPR, got '{}'", value))?;
            let term: u32 = term
                .trim()
                .parse()
                .map_err(|_| format!("invalid term number '{}'", term))?;
            counts.insert(term, TermCountBound::parse(expr)?);
        }
    }
    Ok(counts)
}

/// Helper function to construct and execute parser for command line options
fn parse_cli_args() -> clap::ArgMatches {
    clap::command!()
        .arg(
            clap::Arg::new("date")
                .long("date")
                .value_name("YYYY-MM-DD")
                .help(
                    "Use this date instead of today to derive the current term. Useful for \
                     reproducible runs and tests.",
                ),
        )
        .arg(
            clap::Arg::new("passed")
                .long("passed")
                .value_name("FILE")
                .help("Passed-courses file (default: DATA/passedcourses.txt)"),
        )
        .arg(
            clap::Arg::new("desired")
                .long("desired")
                .value_name("FILE")
                .help("Desired-courses file (default: DATA/desiredcourses.txt)"),
        )
        .arg(
            clap::Arg::new("grades")
                .long("grades")
                .value_name("FILE")
                .help("Estimated-grades file (default: DATA/estimated_grades.txt)"),
        )
        .arg(
            clap::Arg::new("honors")
                .long("honors")
                .help("Plan with the honors credit caps and honors-only courses unlocked")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("concentration")
                .short('k')
                .long("concentration")
                .value_name("NAME")
                .help("Chosen concentration area"),
        )
        .arg(
            clap::Arg::new("no_s1")
                .long("no-s1")
                .help("Do not schedule anything in first summer sessions")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("no_s2")
                .long("no-s2")
                .help("Do not schedule anything in second summer sessions")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("no_st")
                .long("no-st")
                .help("Do not schedule anything in summer terms")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("max_courses")
                .short('m')
                .long("max-courses")
                .value_name("N")
                .help("General per-term course cap")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            clap::Arg::new("thesis_max")
                .long("thesis-max")
                .value_name("N")
                .help("Number of courses allowed in the thesis term (incl. the thesis)")
                .default_value("1")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            clap::Arg::new("ou_taken")
                .long("ou-taken")
                .value_name("N")
                .help("OU courses already taken in the current academic year")
                .default_value("0")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            clap::Arg::new("term_count")
                .short('t')
                .long("term-count")
                .value_name("TERM=EXPR")
                .help(
                    "Course-count bound for a single term, e.g. 2=3 or '3=<=2'. May be given \
                     multiple times; overrides --max-courses for that term.",
                )
                .action(clap::ArgAction::Append),
        )
        .arg(
            clap::Arg::new("weights")
                .short('w')
                .long("weights")
                .value_name("DN,DL,CR,GR")
                .help("Objective weights for completion time, difficulty load, credits and grades")
                .default_value("1,1,1,0"),
        )
        .arg(
            clap::Arg::new("model_out")
                .long("model-out")
                .value_name("FILE")
                .help("Where to write the assembled model in LP format")
                .default_value("model.lp"),
        )
        .arg(
            clap::Arg::new("solution_out")
                .long("solution-out")
                .value_name("FILE")
                .help("Where to write the solver's variable values (name=value lines)")
                .default_value("solution.txt"),
        )
        .arg(
            clap::Arg::new("print")
                .short('p')
                .long("print")
                .help("Print the calculated schedule to stdout in a human readable format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("DATA")
                .help("Directory holding params.props, cls.csv and the *.grp files")
                .required(true)
                .index(1),
        )
        .arg(
            clap::Arg::new("OUTPUT")
                .help("Sets the output file for the JSON schedule")
                .index(2),
        )
        .get_matches()
}
