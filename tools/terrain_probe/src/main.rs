//! Headless terrain probe.
//!
//! Runs one generation pass from a RON config (default `viewer/assets/terrain.ron`)
//! and logs a summary of the height field, mesh and prop placement, then exits.
//!
//! Usage: `terrain_probe [config.ron]`

use std::path::PathBuf;

use bevy::app::AppExit;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use terrain_gen::{generate_terrain, GeneratedTerrain, GenerationConfig, PropDefinition};

// -----------------------------------------------------------------------------
// Probe state
// -----------------------------------------------------------------------------

#[derive(Resource)]
struct ProbeConfig {
    config_path: PathBuf,
}

/// Everything worth knowing about one run, in loggable form.
#[derive(Debug, Clone, PartialEq)]
struct ProbeReport {
    width: usize,
    height: usize,
    height_range: (f32, f32),
    vertices: usize,
    triangles: usize,
    /// (prop name, placements) in catalog order
    props: Vec<(String, usize)>,
    max_props: usize,
}

impl ProbeReport {
    fn new(terrain: &GeneratedTerrain, catalog: &[PropDefinition], max_props: usize) -> Self {
        let counts = terrain.placement_counts(catalog.len());
        Self {
            width: terrain.heights.width(),
            height: terrain.heights.height(),
            height_range: terrain.heights.min_max(),
            vertices: terrain.mesh.vertex_count(),
            triangles: terrain.mesh.triangle_count(),
            props: catalog
                .iter()
                .zip(counts)
                .map(|(def, count)| (def.name.clone(), count))
                .collect(),
            max_props,
        }
    }

    fn total_props(&self) -> usize {
        self.props.iter().map(|(_, count)| count).sum()
    }

    /// Placement may run one past the limit before it notices
    fn over_limit(&self) -> bool {
        self.total_props() > self.max_props + 1
    }
}

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("viewer/assets/terrain.ron"));

    let mut app = App::new();

    // No window or renderer, just the schedule and logging
    app.add_plugins((MinimalPlugins, LogPlugin::default()));

    app.insert_resource(ProbeConfig { config_path });

    app.add_systems(Update, run_probe);

    app.run();
}

fn run_probe(config: Res<ProbeConfig>, mut app_exit: MessageWriter<AppExit>) {
    let settings = match GenerationConfig::load(&config.config_path) {
        Ok(settings) => settings,
        Err(e) => {
            warn!("{e}; probing default settings instead");
            GenerationConfig::default()
        }
    };

    let terrain = match generate_terrain(&settings) {
        Ok(terrain) => terrain,
        Err(e) => {
            error!("Generation failed: {e}");
            app_exit.write(AppExit::error());
            return;
        }
    };

    let settings = settings.sanitized();
    let report = ProbeReport::new(&terrain, &settings.props, settings.max_props);
    log_report(&settings, &report);

    if report.over_limit() {
        error!(
            "Placed {} props, more than the limit of {} allows",
            report.total_props(),
            report.max_props
        );
        app_exit.write(AppExit::error());
        return;
    }

    app_exit.write(AppExit::Success);
}

fn log_report(settings: &GenerationConfig, report: &ProbeReport) {
    info!(
        "Map {}x{}, {:?} noise (seed {}, {} octaves)",
        report.width, report.height, settings.algorithm, settings.noise.seed, settings.noise.octaves
    );
    info!(
        "Heights {:.3}..{:.3}, multiplier {}",
        report.height_range.0, report.height_range.1, settings.height_multiplier
    );
    info!(
        "Mesh: {} vertices, {} triangles",
        report.vertices, report.triangles
    );
    for (name, count) in &report.props {
        info!("  {name}: {count}");
    }
    info!(
        "Props: {} placed (limit {}, seed {})",
        report.total_props(),
        report.max_props,
        settings.prop_seed
    );
}
