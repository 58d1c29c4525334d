use std::{
    fs,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use boids3d_lib::{
    birdwatcher::Birdwatcher,
    bounds::WorldBounds,
    math_helpers::positional_variance,
    options::{Boundary, RunOptions, TuningKnobs, UpdateMode},
    simulation::Simulation,
};
use clap_serde_derive::{clap::Parser, ClapSerde};
use glam::Vec3;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod cliargs;
use cliargs::{Args, Config};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("boids3d_app=info".parse()?)
                .add_directive("boids3d_lib=info".parse()?),
        )
        .init();

    // Parse whole args with clap
    let mut args = Args::parse();
    let config = load_config(&mut args)?;
    let effective = serde_yaml::to_string(&config)?;
    debug!(config = %effective, "effective configuration");

    let run_options = get_run_options(&config)?;
    let mut simulation = Simulation::new(&run_options)?;
    let mut bird_watcher = Birdwatcher::new(config.sample_rate);

    info!(
        boids = run_options.init_boids,
        predator = run_options.predator_on,
        ticks = config.ticks,
        "flock released"
    );

    let frame_time = (config.fps > 0).then(|| Duration::from_secs(1) / config.fps);

    for _ in 0..config.ticks {
        let started = Instant::now();

        simulation.step(&run_options)?;
        bird_watcher.watch(&simulation, &run_options);

        if config.report_every > 0 && simulation.tick() % config.report_every == 0 {
            report(&simulation);
        }

        // pace ticks like a display refresh would
        if let Some(frame_time) = frame_time {
            if let Some(rest) = frame_time.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
    }

    if config.report_every == 0 || simulation.tick() % config.report_every != 0 {
        report(&simulation);
    }

    if config.dump {
        println!("{}", serde_json::to_string_pretty(bird_watcher.last_frame())?);
    }

    Ok(())
}

/// Config file values, overridden by whatever was given on the command line
fn load_config(args: &mut Args) -> Result<Config> {
    let path: &Path = &args.config_path;

    let Ok(text) = fs::read_to_string(path) else {
        // If there is no config file return only config parsed from clap
        return Ok(Config::from(&mut args.config));
    };

    let file_config: <Config as ClapSerde>::Opt = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => toml::from_str(&text)
            .with_context(|| format!("error in configuration file {}", path.display()))?,
        _ => serde_yaml::from_str(&text)
            .with_context(|| format!("error in configuration file {}", path.display()))?,
    };

    Ok(Config::from(file_config).merge(&mut args.config))
}

fn get_run_options(config: &Config) -> Result<RunOptions> {
    let boundary = match config.boundary.as_str() {
        "reflective" => Boundary::Reflective {
            near_threshold: config.near_threshold,
            probe_length: config.probe_length,
        },
        "clamp" => Boundary::Clamp {
            jitter: config.jitter,
        },
        other => bail!("unknown boundary policy {other:?}, expected reflective or clamp"),
    };

    let update_mode = match config.update_mode.as_str() {
        "deferred" => UpdateMode::Deferred,
        "immediate" => UpdateMode::Immediate,
        other => bail!("unknown update mode {other:?}, expected deferred or immediate"),
    };

    let mut run_options = RunOptions {
        init_boids: config.no_boids,
        spawn_half_extent: config.spawn_half_extent,
        predator_on: !config.no_predator,
        seed: (config.seed != 0).then_some(config.seed),
        min_speed: config.min_speed,
        speed_modulation_on: !config.plain_clamp,
        predator_avoid_radius: config.predator_avoid_radius,
        predator_pursuit_weight: config.predator_pursuit,
        bounds: WorldBounds::new(Vec3::new(config.world_x, config.world_y, config.world_z)),
        boundary,
        update_mode,
        ..Default::default()
    };

    apply_knobs(
        &mut run_options,
        TuningKnobs {
            separation: config.separation,
            cohesion: config.cohesion,
            alignment: config.alignment,
            speed: config.speed,
        },
    )?;

    run_options.validate()?;

    Ok(run_options)
}

/// [`RunOptions::tune`], refusing to quietly lower an explicitly set minimum speed
fn apply_knobs(run_options: &mut RunOptions, knobs: TuningKnobs) -> Result<()> {
    let max_speed = knobs.clamped().speed;
    if run_options.min_speed > max_speed {
        bail!(
            "--min_speed {} is above the maximum speed {max_speed}, lower it or raise --speed",
            run_options.min_speed
        );
    }

    run_options.tune(knobs);

    Ok(())
}

fn report(simulation: &Simulation) {
    let flock = simulation.flock().view();
    let n = flock.len().max(1) as f32;

    let spread = positional_variance(flock.iter().map(|b| b.position));
    let mean_speed = flock.iter().map(|b| b.speed).sum::<f32>() / n;
    let wall_clearance = flock
        .iter()
        .map(|b| simulation.bounds().distance_to_boundary(b.position))
        .fold(f32::INFINITY, f32::min);
    let predator_clearance = simulation.predator().map(|p| {
        flock
            .iter()
            .map(|b| b.position.distance(p.position))
            .fold(f32::INFINITY, f32::min)
    });

    info!(
        tick = simulation.tick(),
        spread,
        mean_speed,
        wall_clearance,
        predator_clearance = ?predator_clearance,
        "flock"
    );
}

#[cfg(test)]
mod tests {
    use boids3d_lib::options::{RunOptions, TuningKnobs};

    use super::apply_knobs;

    #[test]
    fn min_speed_above_max_is_an_error() {
        let mut run_options = RunOptions {
            min_speed: 0.5,
            ..Default::default()
        };
        let knobs = TuningKnobs {
            speed: 0.2,
            ..run_options.knobs()
        };

        assert!(apply_knobs(&mut run_options, knobs).is_err());
        // nothing was applied
        assert_eq!(run_options.min_speed, 0.5);
        assert_eq!(run_options.max_speed, RunOptions::default().max_speed);
    }

    #[test]
    fn knobs_within_range_apply() {
        let mut run_options = RunOptions::default();
        let knobs = TuningKnobs {
            separation: 1.,
            speed: 0.3,
            ..run_options.knobs()
        };

        apply_knobs(&mut run_options, knobs).unwrap();

        assert_eq!(run_options.separation_radius, 1.);
        assert_eq!(run_options.max_speed, 0.3);
        assert_eq!(run_options.min_speed, 0.01);
        assert_eq!(run_options.validate(), Ok(()));
    }
}
