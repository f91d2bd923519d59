//! Value-iteration command - Solve a grid world with known dynamics

use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use crate::{
    cli::{
        config::OutputArgs,
        output::{print_kv, print_section, print_stats_table, write_json},
    },
    config::ValueIterationSettings,
    export,
    gridworld::Environment,
    pipeline::{MetricsObserver, MetricsSummary},
    ports::{Observer, SweepEvent},
    render,
    value_iteration::{StoppingRule, ValueIterationReport, ValueIterationSolver},
};

#[derive(Parser, Debug)]
pub struct ValueIterationArgs {
    /// Settings file: grid rows, then gamma and epsilon
    pub settings: PathBuf,

    /// Stopping rule (contraction: Δ < ε(1−γ)/γ, absolute: Δ < ε)
    #[arg(long, default_value_t = StoppingRule::ContractionBound)]
    pub stopping: StoppingRule,

    /// Print every value snapshot, not just the final one
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Serialize)]
struct ValueIterationSummaryFile<'a> {
    settings: String,
    report: &'a ValueIterationReport,
    metrics: MetricsSummary,
}

/// Prints each value snapshot to stdout
struct SnapshotPrinter<'env> {
    env: &'env Environment,
}

impl Observer for SnapshotPrinter<'_> {
    fn on_sweep(&mut self, event: &SweepEvent<'_>) -> crate::Result<()> {
        println!("\nIteration {}", event.iteration);
        print!("{}", render::values(self.env, event.values));
        println!("Delta: {:.8}", event.delta);
        Ok(())
    }
}

pub fn execute(args: ValueIterationArgs) -> Result<()> {
    let settings = ValueIterationSettings::load(&args.settings).with_context(|| {
        format!(
            "Failed to load value-iteration settings from {}",
            args.settings.display()
        )
    })?;
    let env = settings.environment()?;
    let config = settings.solver_config().with_stopping(args.stopping);

    print_section("Value iteration");
    print_stats_table(&[
        ("Grid", format!("{} x {}", env.rows(), env.cols())),
        ("Discount", format!("{}", config.gamma)),
        ("Tolerance", format!("{}", config.epsilon)),
        ("Stopping rule", config.stopping.to_string()),
        ("Threshold", format!("{:.8}", config.threshold())),
    ]);
    println!();
    print!("{}", render::grid(&env, Some(env.start())));

    let mut metrics = MetricsObserver::new();
    let report = {
        let mut observers = args.output.observers(&env)?;
        observers.push(Box::new(&mut metrics));
        if args.verbose {
            observers.push(Box::new(SnapshotPrinter { env: &env }));
        }
        let mut solver = ValueIterationSolver::new(&env, config)?;
        solver.solve(&mut observers)?
    };

    print_section("Values");
    print!("{}", render::values(&env, &report.values));
    print_kv("Rounds", &report.rounds.to_string());
    print_kv("Final delta", &format!("{:.8}", report.final_delta));

    print_section("Optimal policy");
    print!("{}", render::policy(&env, &report.policy));

    if let Some(path) = &args.output.csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
        export::write_values_csv(BufWriter::new(file), &env, &report.values, &report.policy)?;
        println!("\nValues written to {}", path.display());
    }

    if let Some(path) = &args.output.summary {
        let summary = ValueIterationSummaryFile {
            settings: args.settings.display().to_string(),
            report: &report,
            metrics: metrics.summary(),
        };
        write_json(path, &summary)?;
        println!("Summary written to {}", path.display());
    }

    Ok(())
}
