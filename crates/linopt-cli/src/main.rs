use clap::{Parser, Subcommand, ValueEnum};
use linopt_solver::{
    ConstraintOp, IterationObserver, LpProblem, Method, Penalty, Phase, Snapshot, Solution, SolutionStatus, Solver, Termination,
    VarKind,
};
use log::debug;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "linopt")]
#[command(about = "Solve linear programs with the simplex, Big-M and two-phase methods", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem and print the outcome
    Solve {
        /// JSON file describing the problem
        file: PathBuf,
        /// Solution method
        #[arg(short, long, value_enum, default_value_t = MethodArg::TwoPhase)]
        method: MethodArg,
        /// Fixed Big-M penalty (scaled from the input when omitted)
        #[arg(short, long)]
        penalty: Option<f64>,
        /// Print every tableau
        #[arg(short, long)]
        steps: bool,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Check a problem file for errors
    Check {
        /// JSON file describing the problem
        file: PathBuf,
    },
    /// Solve with Big-M and two-phase and compare the results
    Compare {
        /// JSON file describing the problem
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Simplex,
    BigM,
    TwoPhase,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Simplex => Method::Simplex,
            MethodArg::BigM => Method::BigM,
            MethodArg::TwoPhase => Method::TwoPhase,
        }
    }
}

/// Prints each tableau as the solver hands it over.
struct TablePrinter;

impl IterationObserver for TablePrinter {
    fn on_snapshot(&mut self, phase: Phase, index: usize, snapshot: &Snapshot) {
        println!("{} - iteration {}", phase, index);
        print_tableau(phase, snapshot);
        if let (Some(entering), Some(leaving)) = (snapshot.entering(), snapshot.leaving()) {
            println!("  {} enters, {} leaves", entering, leaving);
        }
        println!();
    }

    fn on_phase_end(&mut self, phase: Phase, termination: Termination) {
        println!("{} ended: {:?}", phase, termination);
        println!();
    }
}

fn fmt_num(x: f64) -> String {
    if x.abs() < 5e-5 { format!("{:.4}", 0.0) } else { format!("{:.4}", x) }
}

fn print_tableau(phase: Phase, snapshot: &Snapshot) {
    let tableau = &snapshot.tableau;
    let width = 12;

    let mut header = format!("{:>6}", "VB");
    for var in tableau.variables() {
        header.push_str(&format!("{:>width$}", var.name));
    }
    header.push_str(&format!("{:>width$}", "RHS"));
    println!("{}", header);

    let z_name = if phase == Phase::PhaseOne { "W" } else { "Z" };
    let names = snapshot.basis_names();
    for (i, row) in tableau.rows().iter().enumerate() {
        let label = if i == 0 { z_name } else { names[i - 1].as_str() };
        let mut line = format!("{:>6}", label);
        for v in row {
            line.push_str(&format!("{:>width$}", fmt_num(*v)));
        }
        println!("{}", line);
    }
}

fn load_problem(file: &Path) -> LpProblem {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    let problem: LpProblem = match serde_json::from_str(&source) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = problem.validate() {
        eprintln!("Invalid problem: {}", e);
        std::process::exit(1);
    }
    debug!("loaded {} variables, {} constraints", problem.num_variables(), problem.num_constraints());
    problem
}

fn print_solution(problem: &LpProblem, solution: &Solution) {
    println!("Method: {}", solution.method);
    println!("Status: {}", solution.status);
    match solution.status {
        SolutionStatus::Optimal => {
            println!("{} Z = {}", problem.objective.sense, fmt_num(solution.objective_value));
            println!();
            println!("Variables:");
            for (name, value) in problem.variables.iter().zip(&solution.values) {
                println!("  {:10} {:>12}", name, fmt_num(*value));
            }
            if !solution.auxiliary.is_empty() {
                println!();
                println!("Slack / surplus:");
                for v in &solution.auxiliary {
                    let kind = if v.kind == VarKind::Slack { "slack" } else { "surplus" };
                    println!("  {:10} {:>12}  ({})", v.name, fmt_num(v.value), kind);
                }
            }
            println!();
            println!("Pivots: {}", solution.iterations());
        }
        SolutionStatus::Infeasible => {
            println!("No solution exists that satisfies all constraints.");
        }
        SolutionStatus::Unbounded => {
            println!("The problem has no finite optimal solution.");
        }
    }
}

fn main() {
    env_logger::builder().parse_env("LINOPT_LOG").init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            file,
            method,
            penalty,
            steps,
            format,
        } => {
            let problem = load_problem(&file);
            let solver = Solver::new().with_penalty(penalty.map_or(Penalty::Auto, Penalty::Fixed));

            let result = if steps && format != "json" {
                println!("{}", problem);
                println!();
                solver.solve_with(&problem, method.into(), &mut TablePrinter)
            } else {
                solver.solve(&problem, method.into())
            };

            let solution = match result {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Solve error: {}", e);
                    std::process::exit(1);
                }
            };

            if format == "json" {
                match serde_json::to_string_pretty(&solution) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        eprintln!("Error writing JSON: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                print_solution(&problem, &solution);
            }

            if !solution.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Check { file } => {
            let problem = load_problem(&file);
            let rows = problem.normalized_constraints();
            let count = |op: ConstraintOp| rows.iter().filter(|c| c.op == op).count();
            let slack = count(ConstraintOp::Le);
            let surplus = count(ConstraintOp::Ge);
            let artificial = surplus + count(ConstraintOp::Eq);

            println!("✓ {} is valid", file.display());
            println!("{}", problem);
            println!();
            println!("  {} decision variables", problem.num_variables());
            println!("  {} constraints", problem.num_constraints());
            println!("  {} slack, {} surplus, {} artificial", slack, surplus, artificial);
            if artificial == 0 {
                println!("  solvable with the plain simplex method");
            } else {
                println!("  needs the Big-M or two-phase method");
            }
        }
        Commands::Compare { file } => {
            let problem = load_problem(&file);
            let solver = Solver::new();

            let mut results = Vec::new();
            for method in [Method::BigM, Method::TwoPhase] {
                match solver.solve(&problem, method) {
                    Ok(s) => {
                        println!(
                            "{:10} {:10} Z = {:>12}  x = [{}]",
                            method.to_string(),
                            s.status.to_string(),
                            fmt_num(s.objective_value),
                            s.values.iter().map(|v| fmt_num(*v)).collect::<Vec<_>>().join(", ")
                        );
                        results.push(s);
                    }
                    Err(e) => {
                        eprintln!("{} failed: {}", method, e);
                        std::process::exit(1);
                    }
                }
            }

            if results[0].agrees_with(&results[1], 1e-4) {
                println!("✓ methods agree");
            } else {
                println!("✗ methods disagree");
                std::process::exit(1);
            }
        }
    }
}
