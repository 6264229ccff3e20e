//! Canvas Widgets - interactive controls on a canvas
//!
//! Entry point for the application.

use std::f64::consts::TAU;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use canvas_widgets::app::WidgetHost;
use canvas_widgets::persistence::load_from_file;
use canvas_widgets::{ManagerResult, Placement, WidgetManager};

#[derive(Parser, Debug)]
#[command(name = "canvas-widgets", version)]
struct Cli {
    /// Layout JSON to load at startup; also where "Save layout" writes.
    #[arg(long)]
    layout: Option<PathBuf>,

    /// Populate the canvas with a few sample widgets and an animation.
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Transmission destination (js, ajax, relay, node).
    #[arg(long)]
    sends_to: Option<String>,

    /// Endpoint for relay destinations, as host:port.
    #[arg(long)]
    endpoint: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut manager = WidgetManager::headless();

    if let Some(path) = cli.layout.as_deref().filter(|p| p.exists()) {
        let layout = load_from_file(path)
            .with_context(|| format!("failed to load layout {}", path.display()))?;
        layout
            .apply_to(&mut manager)
            .with_context(|| format!("failed to apply layout {}", path.display()))?;
    }

    if cli.demo {
        populate_demo(&mut manager).context("failed to build demo widgets")?;
    }

    if let Some(name) = cli.sends_to.as_deref() {
        manager
            .sends_to(name, cli.endpoint.as_deref())
            .with_context(|| format!("invalid destination '{name}'"))?;
    }

    let host = WidgetHost::new(manager, cli.layout);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 640.0])
            .with_title("Canvas Widgets"),
        ..Default::default()
    };

    eframe::run_native(
        "Canvas Widgets",
        options,
        Box::new(|_cc| Ok(Box::new(host))),
    )
    .map_err(|err| anyhow::anyhow!("window error: {err}"))
}

/// A small page: two dials, a slider, a button, and a dial swept by an
/// animation callback.
fn populate_demo(manager: &mut WidgetManager) -> ManagerResult<()> {
    manager.create("dial", &Placement::at(40.0, 40.0))?;
    manager.create("dial", &Placement::at(140.0, 40.0))?;
    manager.create("slider", &Placement::at(260.0, 20.0).with_size(30.0, 140.0))?;
    manager.create("button", &Placement::at(330.0, 40.0))?;
    manager.create("dial", &Placement::at(40.0, 180.0).with_name("lfo"))?;
    manager.set_property("showLabels", json!(true));

    let mut phase = 0.0_f64;
    manager.add_animation(move |widgets| {
        phase = (phase + 0.01) % 1.0;
        let lfo = widgets
            .get_mut("lfo")
            .ok_or_else(|| anyhow::anyhow!("lfo dial missing"))?;
        lfo.set_value(&json!(0.5 + 0.5 * (phase * TAU).sin()));
        lfo.draw();
        Ok(())
    });
    Ok(())
}
