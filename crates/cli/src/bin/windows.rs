use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use satellite_tasking::core::time::hours_to_seconds;
use satellite_tasking::dynamics::LocationKind;
use satellite_tasking::env::EpisodeController;
use satellite_tasking::export::windows as export_windows;

#[path = "common/scenario.rs"]
mod scenario;

/// Forecast opportunity windows for every ground location and write them as CSV.
#[derive(Parser, Debug)]
#[command(author, version, about = "Opportunity window forecaster")]
struct Cli {
    #[command(flatten)]
    scenario: scenario::ScenarioArgs,

    /// Forecast horizon in hours (defaults to the env config)
    #[arg(long)]
    hours: Option<f64>,

    /// Windows per location
    #[arg(long, default_value_t = 3)]
    count: usize,

    /// Output CSV path (`-` for stdout)
    #[arg(long, default_value = "-")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    scenario::init_logging();
    let cli = Cli::parse();
    let mut loaded = cli.scenario.load()?;
    if let Some(hours) = cli.hours {
        loaded.env.forecast.horizon_s = hours_to_seconds(hours);
    }

    let mut controller =
        EpisodeController::new(loaded.satellite, loaded.env, &loaded.locations)?;
    controller.reset(cli.scenario.seed)?;
    let epoch = controller
        .params()
        .map(|params| params.epoch)
        .ok_or_else(|| anyhow::anyhow!("episode was not initialized"))?;
    let forecaster = controller
        .forecaster()
        .ok_or_else(|| anyhow::anyhow!("episode was not initialized"))?;

    let mut writer = export_windows::writer_for_path(&cli.output)?;
    export_windows::write_header(writer.as_mut())?;
    let mut total = 0usize;
    for (id, location) in forecaster.locations().iter().enumerate() {
        let kind = match location.kind {
            LocationKind::Station => "station",
            LocationKind::Target => "target",
        };
        for window in forecaster.windows(id, 0.0, cli.count)? {
            let open_utc = scenario::utc_at(epoch, window.open_time);
            let close_utc = scenario::utc_at(epoch, window.close_time);
            export_windows::Record {
                location_id: id,
                location: &location.name,
                kind,
                open_s: window.open_time,
                close_s: window.close_time,
                open_utc: &open_utc,
                close_utc: &close_utc,
            }
            .write_to(writer.as_mut())?;
            total += 1;
        }
    }
    writer.flush()?;
    log::info!(
        "wrote {total} windows for {} locations",
        forecaster.locations().len()
    );
    Ok(())
}
