use std::path::PathBuf;

use anyhow::anyhow;
use clap::Parser;
use satellite_tasking::env::{EpisodeController, TerminationReason};
use satellite_tasking::export::trace::{self, TraceStep};

#[path = "common/scenario.rs"]
mod scenario;

/// Roll out one episode with a fixed action sequence and report every step.
#[derive(Parser, Debug)]
#[command(author, version, about = "Episode rollout with a scripted policy")]
struct Cli {
    #[command(flatten)]
    scenario: scenario::ScenarioArgs,

    /// Action ids to cycle through (defaults to the whole catalog in order)
    #[arg(long, value_delimiter = ',')]
    actions: Vec<usize>,

    /// Stop after this many steps even if the episode continues
    #[arg(long, default_value_t = 500)]
    max_steps: usize,

    /// Optional JSON trace output path
    #[arg(long)]
    trace: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    scenario::init_logging();
    let cli = Cli::parse();
    let loaded = cli.scenario.load()?;
    let name = loaded.satellite.name.clone();
    let time_limit_s = loaded.env.time_limit_s;

    let mut controller = EpisodeController::new(loaded.satellite, loaded.env, &loaded.locations)?;
    let catalog_len = controller.catalog().len();
    let sequence: Vec<usize> = if cli.actions.is_empty() {
        (0..catalog_len).collect()
    } else {
        cli.actions.clone()
    };
    if let Some(bad) = sequence.iter().find(|id| **id >= catalog_len) {
        return Err(anyhow!(
            "action {bad} is out of range (catalog has {catalog_len} actions)"
        ));
    }

    controller.reset(cli.scenario.seed)?;
    let epoch = controller
        .params()
        .map(|params| params.epoch)
        .ok_or_else(|| anyhow!("episode was not initialized"))?;
    println!(
        "{name}: seed {}, epoch {}, {catalog_len} actions",
        cli.scenario.seed,
        scenario::utc_at(epoch, 0.0)
    );

    let mut steps: Vec<TraceStep> = Vec::new();
    let mut total_reward = 0.0;
    let mut ended = None;
    for (index, action_id) in sequence.iter().cycle().take(cli.max_steps).enumerate() {
        let outcome = controller.step(*action_id)?;
        let kind = controller
            .catalog()
            .get(*action_id)
            .map(|spec| spec.kind.to_string())
            .unwrap_or_default();
        let snapshot = controller
            .snapshot()
            .ok_or_else(|| anyhow!("episode was not initialized"))?;
        let state = &snapshot.state;
        total_reward += outcome.reward;
        println!(
            "step {:>4} {:<10} t={:>8.1}s dt={:>6.1}s reward={:>7.2} data={:.3} charge={:.3} wheels={:.0}rpm{}",
            index,
            kind,
            outcome.info.sim_time,
            outcome.info.d_ts,
            outcome.reward,
            state.stored_data_fraction,
            state.stored_charge_fraction,
            state.max_wheel_speed_rpm(),
            if outcome.info.action.window_closed_early { " (window closed)" } else { "" },
        );
        steps.push(TraceStep {
            step: index as u64,
            action_id: *action_id,
            action: kind,
            start_s: outcome.info.action.start_time,
            duration_s: outcome.info.d_ts,
            reward: outcome.reward,
            stored_data_fraction: state.stored_data_fraction,
            stored_charge_fraction: state.stored_charge_fraction,
            max_wheel_speed_rpm: state.max_wheel_speed_rpm(),
            pointing_error_deg: state.pointing_error_deg,
            in_eclipse: state.in_eclipse,
            window_closed_early: outcome.info.action.window_closed_early,
            terminated: outcome.terminated,
            truncated: outcome.truncated,
            termination_reason: outcome.info.termination_reason.map(describe),
        });
        if outcome.terminated || outcome.truncated {
            ended = outcome.info.termination_reason;
            break;
        }
    }

    match ended {
        Some(reason) => println!("episode ended: {}", describe(reason)),
        None => println!("episode still running after {} steps", steps.len()),
    }
    println!("total reward {total_reward:.2}");

    if let Some(path) = &cli.trace {
        let epoch_utc = scenario::utc_at(epoch, 0.0);
        trace::write_trace(
            path,
            &trace::Metadata {
                satellite: &name,
                seed: cli.scenario.seed,
                epoch_utc: &epoch_utc,
                time_limit_s,
            },
            &steps,
        )?;
        log::info!("trace written to {}", path.display());
    }
    Ok(())
}

fn describe(reason: TerminationReason) -> String {
    match reason {
        TerminationReason::HardViolation(violation) => violation.to_string(),
        TerminationReason::TimeLimit => "time limit".to_string(),
        TerminationReason::IntegrationFailure => "integration failure".to_string(),
    }
}
