//! PNG rendering of trajectories with plotters.

use anyhow::Result;
use lotka_core::equilibrium::Nullclines;
use lotka_core::integrate::Trajectory;
use lotka_core::model::State;
use lotka_core::sweep::SweepRun;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

const TIME_SERIES_SIZE: (u32, u32) = (1440, 720);
const PHASE_PLANE_SIZE: (u32, u32) = (880, 880);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Prey,
    Predator,
}

impl Component {
    pub fn axis_label(&self) -> &'static str {
        match self {
            Component::Prey => "Prey (X)",
            Component::Predator => "Predators (Y)",
        }
    }

    fn series<'a>(&self, trajectory: &'a Trajectory) -> &'a [f64] {
        match self {
            Component::Prey => trajectory.prey(),
            Component::Predator => trajectory.predator(),
        }
    }
}

/// A labelled `(X, Y)` path for the phase plane.
pub struct PhaseCurve<'a> {
    pub label: String,
    pub trajectory: &'a Trajectory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Triangle,
    Cross,
    Circle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub label: String,
    pub point: State,
    pub shape: MarkerShape,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseOverlay {
    pub markers: Vec<Marker>,
    pub nullclines: Option<Nullclines>,
}

/// Prey and predator populations against time.
pub fn time_series(trajectory: &Trajectory, title: &str, path: &Path) -> Result<()> {
    let x_range = padded_range(trajectory.times().iter().copied());
    let y_range = padded_range(
        trajectory
            .prey()
            .iter()
            .chain(trajectory.predator().iter())
            .copied(),
    );

    let root = BitMapBackend::new(path, TIME_SERIES_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Population")
        .draw()?;

    for (i, component) in [Component::Prey, Component::Predator].into_iter().enumerate() {
        let color = Palette99::pick(i).mix(0.9);
        let points = trajectory
            .times()
            .iter()
            .copied()
            .zip(component.series(trajectory).iter().copied());
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(component.axis_label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// One component of every sweep run against time, one line per varied value.
pub fn sweep_time_series(
    runs: &[SweepRun],
    component: Component,
    title: &str,
    path: &Path,
) -> Result<()> {
    let x_range = padded_range(runs.iter().flat_map(|r| r.trajectory.times().iter().copied()));
    let y_range = padded_range(
        runs.iter()
            .flat_map(|r| component.series(&r.trajectory).iter().copied()),
    );

    let root = BitMapBackend::new(path, TIME_SERIES_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc(component.axis_label())
        .draw()?;

    for (i, run) in runs.iter().enumerate() {
        let color = Palette99::pick(i).mix(0.9);
        let points = run
            .trajectory
            .times()
            .iter()
            .copied()
            .zip(component.series(&run.trajectory).iter().copied());
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(run.label())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Predators against prey for each curve, with optional point markers and nullclines.
pub fn phase_plane(
    curves: &[PhaseCurve<'_>],
    overlay: &PhaseOverlay,
    title: &str,
    path: &Path,
) -> Result<()> {
    let marker_points = || overlay.markers.iter().map(|m| m.point);
    let x_range = padded_range(
        curves
            .iter()
            .flat_map(|c| c.trajectory.prey().iter().copied())
            .chain(marker_points().map(|p| p.prey)),
    );
    let y_range = padded_range(
        curves
            .iter()
            .flat_map(|c| c.trajectory.predator().iter().copied())
            .chain(marker_points().map(|p| p.predator)),
    );

    let root = BitMapBackend::new(path, PHASE_PLANE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(16)
        .x_label_area_size(48)
        .y_label_area_size(64)
        .build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc(Component::Prey.axis_label())
        .y_desc(Component::Predator.axis_label())
        .draw()?;

    if let Some(lines) = overlay.nullclines {
        let guide = BLACK.mix(0.25);
        let mut segments = Vec::new();
        if y_range.contains(&lines.prey_level) {
            segments.push(vec![
                (x_range.start, lines.prey_level),
                (x_range.end, lines.prey_level),
            ]);
        }
        if x_range.contains(&lines.predator_level) {
            segments.push(vec![
                (lines.predator_level, y_range.start),
                (lines.predator_level, y_range.end),
            ]);
        }
        if !segments.is_empty() {
            chart
                .draw_series(segments.into_iter().map(|s| PathElement::new(s, guide)))?
                .label("Nullclines")
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], guide));
        }
    }

    for (i, curve) in curves.iter().enumerate() {
        let color = Palette99::pick(i).mix(0.9);
        let points = curve
            .trajectory
            .prey()
            .iter()
            .copied()
            .zip(curve.trajectory.predator().iter().copied());
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))?
            .label(curve.label.clone())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    for marker in &overlay.markers {
        let at = (marker.point.prey, marker.point.predator);
        match marker.shape {
            MarkerShape::Triangle => {
                chart
                    .draw_series(std::iter::once(TriangleMarker::new(at, 10, RED.filled())))?
                    .label(marker.label.clone())
                    .legend(|(x, y)| TriangleMarker::new((x + 10, y), 6, RED.filled()));
            }
            MarkerShape::Cross => {
                chart
                    .draw_series(std::iter::once(Cross::new(at, 8, BLACK.stroke_width(2))))?
                    .label(marker.label.clone())
                    .legend(|(x, y)| Cross::new((x + 10, y), 5, BLACK.stroke_width(2)));
            }
            MarkerShape::Circle => {
                chart
                    .draw_series(std::iter::once(Circle::new(at, 7, GREEN.filled())))?
                    .label(marker.label.clone())
                    .legend(|(x, y)| Circle::new((x + 10, y), 5, GREEN.filled()));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Range covering all finite `values` with a 5% margin. Flat data gets a unit margin so
/// runs resting on an equilibrium still produce a drawable axis.
pub(crate) fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    let width = hi - lo;
    let pad = if width > 1e-9 * hi.abs().max(1.0) {
        0.05 * width
    } else {
        (0.1 * hi.abs()).max(1.0)
    };
    (lo - pad)..(hi + pad)
}
