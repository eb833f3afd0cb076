//! Tabular Q-learning agent choosing radiation doses.

use crate::discretize::Discretizer;
use crate::q_table::QTable;
use crate::report::{
    EpisodeLog, EpisodeRecord, EvaluationAccumulator, EvaluationReport, StepLog,
    TreatmentVariability,
};
use radio_core::{AgentConfig, Result, TrainingSchedule};
use radio_world::ScalarModel;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Decision slots recorded per episode by [`TabularAgent::treatment_var`]
pub const MAX_FRACTIONS: usize = 100;

pub struct TabularAgent {
    config: AgentConfig,
    discretizer: Discretizer,
    q_table: QTable,
    rng: ChaCha8Rng,
}

impl TabularAgent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            discretizer: Discretizer::from_config(&config),
            q_table: QTable::new(config.cancer_stages, config.healthy_stages, config.actions),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    /// Current Q-table row of the model
    pub fn state(&self, env: &ScalarModel) -> usize {
        self.discretizer
            .state(env.cancer_count(), env.healthy_count())
    }

    /// Epsilon-greedy choice; ties between maxima go to the lowest action
    pub fn choose_action(&mut self, state: usize, epsilon: f64) -> usize {
        if self.rng.gen::<f64>() < epsilon {
            self.rng.gen_range(0..self.config.actions)
        } else {
            self.q_table.argmax(state)
        }
    }

    /// Overwrite a single Q-value
    pub fn change_val(&mut self, state: usize, action: usize, value: f64) {
        self.q_table.set(state, action, value);
    }

    /// Warm start: give `action` the value `value` in the first `states` rows
    pub fn seed_values(&mut self, states: usize, action: usize, value: f64) {
        for state in 0..states.min(self.q_table.num_states()) {
            self.q_table.set(state, action, value);
        }
    }

    /// One-step Q-learning for `steps` decisions, resetting the model at
    /// the end of every episode while budget remains
    #[instrument(skip(self, env))]
    pub fn train(
        &mut self,
        env: &mut ScalarModel,
        steps: usize,
        alpha: f64,
        epsilon: f64,
        discount: f64,
    ) {
        env.reset();
        let mut remaining = steps;
        let mut episodes = 1;

        while remaining > 0 {
            let mut episode_steps = 0;
            while !env.in_terminal_state() && remaining > 0 {
                let state = self.state(env);
                let action = self.choose_action(state, epsilon);
                let reward = env.act(action);
                let next_state = self.state(env);

                // No terminal masking: the successor row is used as is.
                let target = reward + discount * self.q_table.max_value(next_state);
                let value = (1.0 - alpha) * self.q_table.get(state, action) + alpha * target;
                self.q_table.set(state, action, value);
                remaining -= 1;
                episode_steps += 1;
            }
            if episode_steps == 0 {
                warn!(
                    outcome = %env.termination(),
                    remaining,
                    "Episode ended during warm-up, nothing left to train on"
                );
                break;
            }
            if remaining > 0 {
                env.reset();
                episodes += 1;
            }
        }

        debug!(steps, episodes, "Training pass complete");
    }

    /// Greedy rollouts of `episodes` episodes.
    ///
    /// The squared TD error is reported for diagnosis only; the table is not
    /// updated. With `eval`, clinical outcome statistics are gathered too.
    #[instrument(skip(self, env))]
    pub fn test(
        &mut self,
        env: &mut ScalarModel,
        episodes: usize,
        verbose: bool,
        discount: f64,
        eval: bool,
    ) -> EvaluationReport {
        let mut acc = EvaluationAccumulator::new(eval);

        for _ in 0..episodes {
            env.reset();
            let initial_healthy = env.healthy_count();
            let mut total_reward = 0.0;
            let mut error = 0.0;
            let mut fractions = 0u32;
            let mut dose = 0u32;
            let mut steps = Vec::new();

            while !env.in_terminal_state() {
                let state = self.state(env);
                let action = self.choose_action(state, 0.0);
                let reward = env.act(action);
                let next_state = self.state(env);

                let target = reward + discount * self.q_table.max_value(next_state);
                error += (target - self.q_table.get(state, action)).powi(2);

                fractions += 1;
                dose += action as u32 + 1;
                total_reward += reward;
                if verbose {
                    steps.push(StepLog {
                        dose: action as u32 + 1,
                        reward,
                    });
                }
            }

            let outcome = env.termination();
            acc.record(&EpisodeRecord {
                total_reward,
                td_error: Some(error / fractions as f64),
                fractions,
                dose,
                duration: fractions * env.config().hours_per_fraction,
                survival: env.healthy_count() as f64 / initial_healthy as f64,
                outcome,
            });
            if verbose {
                acc.record_log(EpisodeLog { steps, outcome });
            }
        }

        let report = acc.finish();
        info!(
            event = "evaluation",
            episodes,
            average_score = report.average_score,
            mse = report.mse,
            tcp = report.outcome.map(|o| o.tcp),
            "Evaluation complete"
        );
        report
    }

    /// Dose chosen at each fraction over `count` greedy episodes
    #[instrument(skip(self, env))]
    pub fn treatment_var(&mut self, env: &mut ScalarModel, count: usize) -> TreatmentVariability {
        let mut doses = vec![vec![0u32; MAX_FRACTIONS]; count];

        for row in doses.iter_mut() {
            env.reset();
            let mut fraction = 0;
            while !env.in_terminal_state() {
                let state = self.state(env);
                let action = self.choose_action(state, 0.0);
                env.act(action);

                if fraction < MAX_FRACTIONS {
                    row[fraction] = action as u32 + 1;
                } else if fraction == MAX_FRACTIONS {
                    warn!(
                        max_fractions = MAX_FRACTIONS,
                        "Episode outlasted the dose buffer, later fractions are not recorded"
                    );
                }
                fraction += 1;
            }
        }

        TreatmentVariability::from_doses(&doses, MAX_FRACTIONS)
    }

    /// Alternate training and greedy testing for `schedule.epochs` epochs,
    /// annealing alpha and epsilon linearly from their start to end values.
    ///
    /// Returns the report of the initial test followed by one per epoch.
    #[instrument(skip(self, env, schedule), fields(epochs = schedule.epochs))]
    pub fn run(&mut self, env: &mut ScalarModel, schedule: &TrainingSchedule) -> Vec<EvaluationReport> {
        let mut reports = Vec::with_capacity(schedule.epochs + 1);
        reports.push(self.test(env, schedule.test_episodes, false, schedule.discount, false));

        let (alpha_change, epsilon_change) = if schedule.epochs > 1 {
            let intervals = (schedule.epochs - 1) as f64;
            (
                (schedule.alpha_start - schedule.alpha_end) / intervals,
                (schedule.epsilon_start - schedule.epsilon_end) / intervals,
            )
        } else {
            (0.0, 0.0)
        };
        let mut alpha = schedule.alpha_start;
        let mut epsilon = schedule.epsilon_start;

        for epoch in 0..schedule.epochs {
            info!(epoch = epoch + 1, alpha, epsilon, "Epoch {}", epoch + 1);
            self.train(env, schedule.train_steps, alpha, epsilon, schedule.discount);
            reports.push(self.test(env, schedule.test_episodes, false, schedule.discount, false));
            alpha -= alpha_change;
            epsilon -= epsilon_change;
        }

        reports
    }

    pub fn save_q(&self, path: impl AsRef<Path>) -> Result<()> {
        self.q_table.save(path)
    }

    /// Fails without touching the table if the stored dimensions differ
    pub fn load_q(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.q_table.load(path)
    }
}
