use clap_serde_derive::{
    clap::{self, Parser},
    serde::Serialize,
    ClapSerde,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
/// Headless host loop for the 3D boids flocking engine.
pub struct Args {
    /// Config file, YAML or TOML (by extension)
    #[arg(short, long = "config", default_value = "boids3d.yaml")]
    pub config_path: std::path::PathBuf,

    /// Rest of arguments
    #[command(flatten)]
    pub config: <Config as ClapSerde>::Opt,
}

#[derive(ClapSerde, Serialize)]
/// Programatic configuration
///
/// Uses defaults, which can be overwritten by specifying a filepath for the `-c` or `--config` arg option
pub struct Config {
    #[default(50)]
    #[arg(short = 'n', long)]
    /// number of boids
    pub no_boids: usize,

    #[default(600)]
    #[arg(short = 't', long)]
    /// number of ticks to run
    pub ticks: u64,

    #[default(0)]
    #[arg(long)]
    /// ticks per second, 0 runs as fast as possible
    pub fps: u32,

    #[default(4)]
    #[arg(short = 'r', long)]
    /// ratio of ticks/sample_rate, e,g, 4 = sample every 4th tick
    pub sample_rate: u64,

    #[default(60)]
    #[arg(long)]
    /// log flock statistics every n ticks, 0 = never
    pub report_every: u64,

    #[default(0)]
    #[arg(short = 's', long)]
    /// RNG seed, 0 draws one from entropy
    pub seed: u64,

    #[default(false)]
    #[arg(long)]
    /// run without a predator
    pub no_predator: bool,

    #[default("reflective".to_owned())]
    #[arg(short = 'b', long)]
    /// boundary policy, reflective or clamp
    pub boundary: String,

    #[default("deferred".to_owned())]
    #[arg(short = 'u', long)]
    /// update mode, deferred or immediate
    pub update_mode: String,

    #[default(false)]
    #[arg(long)]
    /// clamp speed into range instead of slowing down near threats
    pub plain_clamp: bool,

    #[default(0.5)]
    #[arg(long = "separation")]
    /// separation radius, [0.1, 3]
    pub separation: f32,
    #[default(1.)]
    #[arg(long = "cohesion")]
    /// cohesion radius, [0.1, 5]
    pub cohesion: f32,
    #[default(0.25)]
    #[arg(long = "alignment")]
    /// centring weight, [-1, 1]
    pub alignment: f32,
    #[default(0.1)]
    #[arg(long = "speed")]
    /// maximum speed, [0.1, 5]
    pub speed: f32,
    #[default(0.01)]
    #[arg(long = "min_speed")]
    pub min_speed: f32,

    #[default(7.)]
    #[arg(long = "avoid_radius")]
    /// predator avoidance radius
    pub predator_avoid_radius: f32,
    #[default(0.)]
    #[arg(long = "pursuit")]
    /// predator pursuit weight, 0 = wander
    pub predator_pursuit: f32,

    #[default(5.)]
    #[arg(long = "spawn")]
    /// half extent of the spawn cube
    pub spawn_half_extent: f32,
    #[default(30.)]
    #[arg(long = "world_x")]
    pub world_x: f32,
    #[default(15.)]
    #[arg(long = "world_y")]
    pub world_y: f32,
    #[default(15.)]
    #[arg(long = "world_z")]
    pub world_z: f32,

    #[default(10.)]
    #[arg(long = "near")]
    /// reflective policy, distance to a wall at which to reflect
    pub near_threshold: f32,
    #[default(15.)]
    #[arg(long = "probe")]
    /// reflective policy, how far ahead to look for walls
    pub probe_length: f32,
    #[default(0.5)]
    #[arg(long = "jitter")]
    /// clamp policy, noise added to a flipped heading
    pub jitter: f32,

    #[default(false)]
    #[arg(long)]
    /// print the last sampled frame as JSON
    pub dump: bool,
}
