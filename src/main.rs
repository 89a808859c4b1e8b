use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use glam::{Vec3, Vec4};

use crate::asset_pipeline::building_generator::{write_building, BuildingParameters};
use crate::config::{parse_color, parse_vec3, PickMode, ViewerConfig};
use crate::math::plane::Plane;
use crate::scene_graph::ClassificationMode;

mod asset_pipeline;
mod camera;
mod config;
mod material;
mod math;
mod model;
mod rendering;
mod scene_graph;
mod ui;
mod viewer;
mod window;

#[derive(Parser, Debug)]
#[command(name = "bimview", version, about = "Layered glTF building viewer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open a glTF or GLB file in the viewer
    View(ViewArgs),
    /// Write a procedural two-LOD building as GLB
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Model to load
    asset: PathBuf,

    /// What a click on a node does
    #[arg(long, value_enum, default_value_t = PickMode::default())]
    pick_mode: PickMode,

    /// How nodes are sorted into layers and detail levels
    #[arg(long, value_enum, default_value_t = ClassificationMode::default())]
    classification: ClassificationMode,

    /// Distance each node moves when exploding
    #[arg(long, default_value_t = 2.0)]
    explode_step: f32,

    /// Ignore hidden nodes when picking
    #[arg(long)]
    skip_hidden_when_picking: bool,

    /// Point light position as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    light_position: Option<Vec3>,

    /// Surface color as r,g,b[,a]
    #[arg(long, value_parser = parse_color)]
    base_color: Option<Vec4>,

    /// Color of a highlighted node as r,g,b[,a]
    #[arg(long, value_parser = parse_color)]
    highlight_color: Option<Vec4>,

    /// Color of the selection outline as r,g,b[,a]
    #[arg(long, value_parser = parse_color)]
    outline_color: Option<Vec4>,

    /// Height above which clipping cuts geometry away
    #[arg(long, allow_hyphen_values = true)]
    clip_height: Option<f32>,
}

impl ViewArgs {
    fn into_config(self) -> ViewerConfig {
        let defaults = ViewerConfig::default();

        ViewerConfig {
            asset_path: self.asset,
            light_position: self.light_position.unwrap_or(defaults.light_position),
            base_color: self.base_color.unwrap_or(defaults.base_color),
            highlight_color: self.highlight_color.unwrap_or(defaults.highlight_color),
            outline_color: self.outline_color.unwrap_or(defaults.outline_color),
            explode_step: self.explode_step,
            clipping_plane: self
                .clip_height
                .map_or(defaults.clipping_plane, Plane::keep_below),
            pick_mode: self.pick_mode,
            classification: self.classification,
            pick_hidden_nodes: !self.skip_hidden_when_picking,
        }
    }
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Output path
    output: PathBuf,

    #[arg(long, default_value_t = 5)]
    floors: u32,

    /// Leave out the semantic and LOD tags, leaving only node names to classify by
    #[arg(long)]
    no_metadata: bool,
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    match Cli::parse().command {
        Command::View(args) => window::run(args.into_config()),
        Command::Generate(args) => write_building(
            &args.output,
            &BuildingParameters {
                floors: args.floors,
                with_metadata: !args.no_metadata,
                ..Default::default()
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn view_config(args: &[&str]) -> ViewerConfig {
        let mut argv = vec!["bimview", "view", "tower.glb"];
        argv.extend_from_slice(args);

        match Cli::try_parse_from(argv).unwrap().command {
            Command::View(args) => args.into_config(),
            Command::Generate(_) => panic!("parsed as generate"),
        }
    }

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn view_defaults_match_config_defaults() {
        let config = view_config(&[]);
        let defaults = ViewerConfig::default();

        assert_eq!(config.asset_path, PathBuf::from("tower.glb"));
        assert_eq!(config.light_position, defaults.light_position);
        assert_eq!(config.base_color, defaults.base_color);
        assert_eq!(config.clipping_plane, defaults.clipping_plane);
        assert_eq!(config.pick_mode, PickMode::Outline);
        assert!(config.pick_hidden_nodes);
    }

    #[test]
    fn view_overrides_reach_the_config() {
        let config = view_config(&[
            "--light-position",
            "-5,20,5",
            "--base-color",
            "0.2,0.4,0.6",
            "--highlight-color",
            "0,1,0,1",
            "--clip-height",
            "3.5",
            "--pick-mode",
            "highlight",
            "--skip-hidden-when-picking",
        ]);

        assert_eq!(config.light_position, Vec3::new(-5.0, 20.0, 5.0));
        assert_eq!(config.base_color, Vec4::new(0.2, 0.4, 0.6, 1.0));
        assert_eq!(config.highlight_color, Vec4::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(config.clipping_plane, Plane::keep_below(3.5));
        assert_eq!(config.pick_mode, PickMode::Highlight);
        assert!(!config.pick_hidden_nodes);
    }

    #[test]
    fn malformed_color_is_rejected() {
        assert!(Cli::try_parse_from(["bimview", "view", "a.glb", "--base-color", "red"]).is_err());
    }
}
