//! Terrain viewer - generates a terrain from a RON config and displays it
//!
//! Controls:
//! - Space: regenerate with the current settings
//! - R: new random noise and prop seeds
//! - N: cycle the noise algorithm
//! - M: toggle the raw noise map preview
//! - P: re-scatter props with a new seed
//! - C: clear props

mod preview;
mod props;
mod terrain;

use std::path::PathBuf;

use bevy::prelude::*;
use bevy::window::WindowResolution;

/// Where the generation config is read from at startup.
#[derive(Resource, Debug, Clone)]
pub struct ConfigPath(pub PathBuf);

/// Get the asset path - for bundled macOS apps, use path relative to executable
fn get_asset_path() -> PathBuf {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                return bundled_assets;
            }
        }
    }
    // Fall back to default "assets" folder (for development)
    PathBuf::from("assets")
}

fn main() {
    // An explicit config path on the command line wins over the bundled one
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| get_asset_path().join("terrain.ron"));

    let mut app = App::new();

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Terrain Viewer".to_string(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    }));

    app.insert_resource(ConfigPath(config_path));

    app.add_plugins(terrain::TerrainPlugin);
    app.add_plugins(props::PropsPlugin);
    app.add_plugins(preview::NoisePreviewPlugin);

    app.run();
}
