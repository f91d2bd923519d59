//! Q-learning command - Learn a grid world from simulated episodes

use std::{fs::File, io::BufWriter, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use serde::Serialize;

use crate::{
    cli::{
        config::OutputArgs,
        output::{print_kv, print_section, print_stats_table, print_subsection, write_json},
    },
    config::QLearningSettings,
    export,
    pipeline::{MetricsObserver, MetricsSummary},
    q_learning::{
        QLearningConfig, QLearningReport, QLearningSolver, SavedQLearning,
        config::{DEFAULT_EPSILON_DECAY, DEFAULT_INITIAL_EPSILON},
    },
    render,
};

#[derive(Parser, Debug)]
pub struct QLearningArgs {
    /// Settings file: grid rows, then gamma, alpha and the episode count
    pub settings: PathBuf,

    /// Initial exploration rate
    #[arg(long, default_value_t = DEFAULT_INITIAL_EPSILON)]
    pub epsilon: f64,

    /// Multiplicative exploration decay applied after every action
    #[arg(long, default_value_t = DEFAULT_EPSILON_DECAY)]
    pub epsilon_decay: f64,

    /// Random seed for reproducibility (drawn from the OS when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Cut episodes off after this many steps
    #[arg(long, value_name = "N")]
    pub max_steps: Option<usize>,

    /// Save the trained Q-table (MessagePack)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub outputs: OutputArgs,
}

#[derive(Debug, Serialize)]
struct QLearningSummaryFile<'a> {
    settings: String,
    seed: u64,
    config: &'a QLearningConfig,
    report: &'a QLearningReport,
    metrics: MetricsSummary,
}

pub fn execute(args: QLearningArgs) -> Result<()> {
    let settings = QLearningSettings::load(&args.settings).with_context(|| {
        format!(
            "Failed to load Q-learning settings from {}",
            args.settings.display()
        )
    })?;
    let env = settings.environment()?;
    let mut config = settings
        .solver_config()
        .with_initial_epsilon(args.epsilon)
        .with_epsilon_decay(args.epsilon_decay);
    if let Some(max_steps) = args.max_steps {
        config = config.with_max_steps_per_episode(max_steps);
    }
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());

    print_section("Q-learning");
    print_stats_table(&[
        ("Grid", format!("{} x {}", env.rows(), env.cols())),
        ("Discount", format!("{}", config.gamma)),
        ("Learning rate", format!("{}", config.alpha)),
        ("Episodes", config.episodes.to_string()),
        ("Epsilon", format!("{} (decay {})", config.initial_epsilon, config.epsilon_decay)),
        ("Seed", seed.to_string()),
    ]);
    println!();
    print!("{}", render::grid(&env, Some(env.start())));

    let mut metrics = MetricsObserver::new();
    let report = {
        let mut observers = args.outputs.observers(&env)?;
        observers.push(Box::new(&mut metrics));
        let mut solver = QLearningSolver::seeded(&env, config, seed)?;
        solver.train(&mut observers)?
    };
    let stats = metrics.summary();

    print_section("Training results");
    print_kv("Total steps", &report.total_steps.to_string());
    print_kv("Final epsilon", &format!("{:.6}", report.final_epsilon));
    print_kv(
        "Reached terminal",
        &format!("{}/{}", stats.terminal_episodes, stats.episodes),
    );
    print_kv("Average return", &format!("{:.4}", stats.avg_return));
    print_kv(
        "Last 100 return",
        &format!("{:.4}", metrics.recent_return(100)),
    );

    print_subsection("Q-values");
    print!("{}", render::q_values(&env, &report.q_table));

    print_section("Learned policy");
    print!("{}", render::policy(&env, &report.policy));

    if let Some(path) = &args.output {
        SavedQLearning::from_report(&env, config, Some(seed), &report)
            .save_to_file(path)?;
        println!("\nQ-table saved to {}", path.display());
    }

    if let Some(path) = &args.outputs.csv {
        let file = File::create(path)
            .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
        export::write_q_table_csv(BufWriter::new(file), &env, &report.q_table)?;
        println!("Q-values written to {}", path.display());
    }

    if let Some(path) = &args.outputs.summary {
        let summary = QLearningSummaryFile {
            settings: args.settings.display().to_string(),
            seed,
            config: &config,
            report: &report,
            metrics: stats,
        };
        write_json(path, &summary)?;
        println!("Summary written to {}", path.display());
    }

    Ok(())
}
