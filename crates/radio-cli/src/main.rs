//! Command-line driver: train, evaluate and compare radiotherapy policies.

mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use radio_agent::baselines::{self, NO_TREATMENT_HORIZON};
use radio_agent::{EvaluationReport, FixedSchedule, TabularAgent};
use radio_core::{
    AgentConfig, DiscretizationMode, EvaluationConfig, ModelConfig, RewardMode, RunConfig,
    TrainingSchedule,
};
use radio_world::ScalarModel;
use std::path::PathBuf;
use tracing::info;

/// Rows seeded with a preference for 2 Gy when run without arguments
const DEFAULT_SEEDED_STATES: usize = 250;

#[derive(Parser, Debug)]
#[command(name = "radio-rl", version, about)]
struct Cli {
    /// Training epochs (0 skips training)
    #[arg(requires_all = ["reward_mode", "discretization", "cancer_stages", "healthy_stages"])]
    epochs: Option<usize>,

    /// Reward shaping: d (dose penalized), n (no terminal bonus) or a digit k
    /// (cancer kills minus k times healthy losses)
    reward_mode: Option<char>,

    /// State binning: o (logarithmic) or i (linear)
    discretization: Option<char>,

    cancer_stages: Option<usize>,

    healthy_stages: Option<usize>,

    /// Q-table file, saved after training or loaded with `l`
    q_table_path: Option<PathBuf>,

    /// `l` loads the Q-table before running
    load: Option<char>,

    /// Seed of the model and agent RNGs
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Greedy episodes in the final evaluation
    #[arg(long)]
    eval_episodes: Option<usize>,

    /// Episodes in the per-fraction dose report
    #[arg(long)]
    variability_episodes: Option<usize>,

    /// Greedy episodes printed fraction by fraction before evaluating
    #[arg(long, default_value_t = 0)]
    verbose_episodes: usize,

    /// Also run the fixed-schedule baselines
    #[arg(long)]
    baselines: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig> {
        let defaults = AgentConfig::default();
        let reward_mode = match self.reward_mode {
            Some(tag) => RewardMode::from_char(tag)?,
            None => RewardMode::default(),
        };
        let discretization = match self.discretization {
            Some(tag) => DiscretizationMode::from_char(tag)?,
            None => DiscretizationMode::default(),
        };

        let mut evaluation = EvaluationConfig::default();
        if let Some(episodes) = self.eval_episodes {
            evaluation.episodes = episodes;
        }
        if let Some(episodes) = self.variability_episodes {
            evaluation.variability_episodes = episodes;
        }

        let config = RunConfig {
            model: ModelConfig {
                seed: self.seed,
                reward_mode,
                ..Default::default()
            },
            agent: AgentConfig {
                cancer_stages: self.cancer_stages.unwrap_or(defaults.cancer_stages),
                healthy_stages: self.healthy_stages.unwrap_or(defaults.healthy_stages),
                discretization,
                seed: self.seed,
                ..defaults
            },
            schedule: TrainingSchedule {
                epochs: self.epochs.unwrap_or(0),
                ..Default::default()
            },
            evaluation,
        };
        config.validate()?;
        Ok(config)
    }

    fn loads_table(&self) -> bool {
        self.load == Some('l')
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.json)?;

    let config = cli.run_config().context("invalid arguments")?;
    info!(
        epochs = config.schedule.epochs,
        reward_mode = %config.model.reward_mode.as_char(),
        cancer_stages = config.agent.cancer_stages,
        healthy_stages = config.agent.healthy_stages,
        "Starting radio-rl"
    );

    let mut env = ScalarModel::new(config.model.clone())?;
    let mut agent = TabularAgent::new(config.agent.clone())?;

    if cli.epochs.is_none() {
        agent.seed_values(DEFAULT_SEEDED_STATES, 1, 1.0);
    }
    if let Some(path) = cli.q_table_path.as_ref().filter(|_| cli.loads_table()) {
        agent
            .load_q(path)
            .with_context(|| format!("failed to load Q-table from {}", path.display()))?;
    }

    if config.schedule.epochs > 0 {
        let curve = agent.run(&mut env, &config.schedule);
        print!("{}", render_training_curve(&curve, cli.json)?);
        if let Some(path) = cli.q_table_path.as_ref().filter(|_| !cli.loads_table()) {
            agent
                .save_q(path)
                .with_context(|| format!("failed to save Q-table to {}", path.display()))?;
        }
    }

    let discount = config.evaluation.discount;
    if cli.verbose_episodes > 0 {
        let report = agent.test(&mut env, cli.verbose_episodes, true, discount, false);
        print_report(&report, cli.json)?;
    }

    let report = agent.test(&mut env, config.evaluation.episodes, false, discount, true);
    print_report(&report, cli.json)?;

    let variability = agent.treatment_var(&mut env, config.evaluation.variability_episodes);
    print_report(&variability, cli.json)?;

    if cli.baselines {
        run_baselines(&mut env, config.evaluation.episodes, cli.json)?;
    }

    Ok(())
}

fn run_baselines(env: &mut ScalarModel, episodes: usize, json: bool) -> Result<()> {
    let growth = baselines::no_treatment(env, NO_TREATMENT_HORIZON);
    if json {
        println!("{}", serde_json::to_string_pretty(&growth)?);
    } else {
        println!("No treatment");
        for sample in &growth {
            println!(
                "Time: {} Healthy cells: {} Cancer cells: {}",
                sample.hour, sample.healthy, sample.cancer
            );
        }
    }

    for (schedule, average) in baselines::test_suite(env) {
        if json {
            println!(
                "{}",
                serde_json::json!({ "schedule": schedule, "average_reward": average })
            );
        } else {
            println!("{}\nAverage reward {}", schedule, average);
        }
    }

    let report = baselines::evaluate_schedule(env, FixedSchedule::Baseline, episodes);
    if !json {
        println!("{}", FixedSchedule::Baseline);
    }
    print_report(&report, json)
}

fn print_report<T>(report: &T, json: bool) -> Result<()>
where
    T: std::fmt::Display + serde::Serialize,
{
    print!("{}", render_report(report, json)?);
    Ok(())
}

fn render_report<T>(report: &T, json: bool) -> Result<String>
where
    T: std::fmt::Display + serde::Serialize,
{
    if json {
        Ok(format!("{}\n", serde_json::to_string_pretty(report)?))
    } else {
        Ok(report.to_string())
    }
}

/// Reports of the initial test (epoch 0) and of every training epoch
fn render_training_curve(reports: &[EvaluationReport], json: bool) -> Result<String> {
    if json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(reports)?));
    }

    let mut out = String::new();
    for (epoch, report) in reports.iter().enumerate() {
        out.push_str(&format!("Epoch {}\n", epoch));
        out.push_str(&render_report(report, false)?);
    }
    Ok(out)
}
