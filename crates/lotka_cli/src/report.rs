//! Analysis runs: compute with `lotka_core`, then hand the results to `render`.

use crate::config::AnalysisConfig;
use crate::render::{self, Component, Marker, MarkerShape, PhaseCurve, PhaseOverlay};
use anyhow::{Context, Result};
use lotka_core::equilibrium::{
    analyze_equilibria, equilibrium_points, linearized_period, nullclines, EquilibriumReport,
};
use lotka_core::integrate::{simulate, Trajectory};
use lotka_core::model::{ModelParameters, State};
use lotka_core::sweep::{run_sweep, Sweep, SweptParameter};
use std::path::{Path, PathBuf};

/// Directory receiving the rendered images.
pub struct Outputs {
    dir: PathBuf,
}

impl Outputs {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

/// Artifact name for a run started at an equilibrium, e.g. `lv_phase_plane_eq_20_10.png`.
pub fn equilibrium_file_name(prefix: &str, point: State) -> String {
    format!("{prefix}_eq_{:.0}_{:.0}.png", point.prey, point.predator)
}

fn standard_overlay(params: &ModelParameters, initial: State) -> Result<PhaseOverlay> {
    let [origin, coexistence] = equilibrium_points(params)?;
    Ok(PhaseOverlay {
        markers: vec![
            Marker {
                label: "Initial condition at t0".into(),
                point: initial,
                shape: MarkerShape::Triangle,
            },
            Marker {
                label: "Equilibrium (0, 0)".into(),
                point: origin,
                shape: MarkerShape::Cross,
            },
            Marker {
                label: "Equilibrium (γ/δ, α/β)".into(),
                point: coexistence,
                shape: MarkerShape::Circle,
            },
        ],
        nullclines: Some(nullclines(params)?),
    })
}

fn render_pair(
    trajectory: &Trajectory,
    params: &ModelParameters,
    initial: State,
    time_series_path: &Path,
    phase_plane_path: &Path,
) -> Result<()> {
    render::time_series(
        trajectory,
        "Predator-Prey Dynamics (Lotka-Volterra)",
        time_series_path,
    )
    .with_context(|| format!("Failed to render {}", time_series_path.display()))?;

    let curve = PhaseCurve {
        label: "Trajectory".into(),
        trajectory,
    };
    render::phase_plane(
        &[curve],
        &standard_overlay(params, initial)?,
        "Phase Plane",
        phase_plane_path,
    )
    .with_context(|| format!("Failed to render {}", phase_plane_path.display()))?;

    println!("  ✓ {}", time_series_path.display());
    println!("  ✓ {}", phase_plane_path.display());
    Ok(())
}

/// Base run: one time series and one phase plane.
pub fn run_simulation(config: &AnalysisConfig, outputs: &Outputs) -> Result<()> {
    println!("📈 Simulating base parameters");
    print_parameters(&config.params);

    let trajectory = simulate(
        &config.params,
        config.initial_state,
        config.span,
        config.n_points,
        &config.integration,
    )
    .context("Base simulation failed")?;

    let stats = trajectory.stats();
    println!(
        "  • {} samples over [{}, {}] ({} accepted / {} rejected steps, {} evaluations)",
        trajectory.len(),
        config.span.start,
        config.span.end,
        stats.accepted_steps,
        stats.rejected_steps,
        stats.evaluations
    );
    if let Some(end) = trajectory.final_state() {
        println!("  • Final state: X = {:.4}, Y = {:.4}", end.prey, end.predator);
    }

    render_pair(
        &trajectory,
        &config.params,
        config.initial_state,
        &outputs.path("lv_time_series_1.png"),
        &outputs.path("lv_phase_plane_1.png"),
    )
}

/// Sensitivity sweep over alpha and gamma; all runs are computed before any rendering.
pub fn run_sensitivity(config: &AnalysisConfig, outputs: &Outputs) -> Result<()> {
    let plan = config.sweep_plan();
    println!(
        "🔀 Sensitivity sweep: {} α variants, {} γ variants",
        plan.alphas.len(),
        plan.gammas.len()
    );
    let sweep = run_sweep(&plan).context("Sensitivity sweep failed")?;
    render_sweep(&sweep, outputs)
}

fn render_sweep(sweep: &Sweep, outputs: &Outputs) -> Result<()> {
    let panels = [
        (
            SweptParameter::Alpha,
            Component::Prey,
            "Sensitivity: varying α (prey)",
            "lv_sens_alpha.png",
            "lv_phase_plane_var_alpha.png",
        ),
        (
            SweptParameter::Gamma,
            Component::Predator,
            "Sensitivity: varying γ (predators)",
            "lv_sens_gamma.png",
            "lv_phase_plane_var_gamma.png",
        ),
    ];

    for (parameter, component, title, series_file, phase_file) in panels {
        let runs = sweep.runs(parameter);
        if runs.is_empty() {
            println!("  • no {} variants, skipping", parameter.symbol());
            continue;
        }

        let series_path = outputs.path(series_file);
        render::sweep_time_series(runs, component, title, &series_path)
            .with_context(|| format!("Failed to render {}", series_path.display()))?;

        let curves: Vec<PhaseCurve<'_>> = runs
            .iter()
            .map(|run| PhaseCurve {
                label: format!("Trajectory: {}", run.label()),
                trajectory: &run.trajectory,
            })
            .collect();
        let phase_path = outputs.path(phase_file);
        render::phase_plane(&curves, &PhaseOverlay::default(), "Phase Plane", &phase_path)
            .with_context(|| format!("Failed to render {}", phase_path.display()))?;

        println!("  ✓ {}", series_path.display());
        println!("  ✓ {}", phase_path.display());
    }
    Ok(())
}

/// Equilibrium table plus runs started exactly at each equilibrium.
pub fn run_equilibria(config: &AnalysisConfig, outputs: &Outputs, json: bool) -> Result<()> {
    let reports = analyze_equilibria(&config.params).context("Equilibrium analysis failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!("⚖️  Equilibria");
        for (i, report) in reports.iter().enumerate() {
            print_equilibrium(i, report);
        }
        if let Some(period) = linearized_period(&config.params) {
            println!("  • Small-oscillation period: {period:.4}");
        }
    }

    for report in &reports {
        let point = report.state;
        let trajectory = simulate(
            &config.params,
            point,
            config.equilibria.span,
            config.equilibria.n_points,
            &config.integration,
        )
        .with_context(|| format!("Simulation from equilibrium {point:?} failed"))?;

        let drift = trajectory
            .samples()
            .map(|(_, s)| (s.prey - point.prey).abs().max((s.predator - point.predator).abs()))
            .fold(0.0f64, f64::max);
        if !json {
            println!(
                "  • Max drift from ({:.0}, {:.0}): {drift:.3e}",
                point.prey, point.predator
            );
        }

        render_pair(
            &trajectory,
            &config.params,
            point,
            &outputs.path(&equilibrium_file_name("lv_time_series", point)),
            &outputs.path(&equilibrium_file_name("lv_phase_plane", point)),
        )?;
    }
    Ok(())
}

/// Everything the reference analysis produces.
pub fn run_report(config: &AnalysisConfig, outputs: &Outputs) -> Result<()> {
    run_simulation(config, outputs)?;
    println!();
    run_sensitivity(config, outputs)?;
    println!();
    run_equilibria(config, outputs, false)
}

fn print_parameters(params: &ModelParameters) {
    println!(
        "  • α = {}, β = {}, γ = {}, δ = {}",
        params.alpha(),
        params.beta(),
        params.gamma(),
        params.delta()
    );
}

fn print_equilibrium(index: usize, report: &EquilibriumReport) {
    println!(
        "  E{index} = ({}, {}) -> (dX/dt, dY/dt) = ({:.6}, {:.6})",
        report.state.prey, report.state.predator, report.residual.prey, report.residual.predator
    );
    let [l1, l2] = report.eigenvalues;
    println!(
        "      eigenvalues {:.4}{:+.4}i, {:.4}{:+.4}i: {}",
        l1.re,
        l1.im,
        l2.re,
        l2.im,
        report.kind.label()
    );
}
