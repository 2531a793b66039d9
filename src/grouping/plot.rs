// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Diagnostic plots of a grouping. Plotting is an optional feature; nothing
//! here affects the grouping itself.

use std::path::Path;

use super::{Grouper, PlotError};

/// Draw the original positions of a grouper's points, coloured by cluster and
/// sized by flux, with crosses at the shifted positions. The grouper must have
/// been run.
#[cfg(not(feature = "plotting"))]
pub fn plot_grouping(_grouper: &Grouper, _output: &Path) -> Result<(), PlotError> {
    Err(PlotError::NoPlottingFeature)
}

/// Draw the original positions of a grouper's points, coloured by cluster and
/// sized by flux, with crosses at the shifted positions. The grouper must have
/// been run.
#[cfg(feature = "plotting")]
pub fn plot_grouping(grouper: &Grouper, output: &Path) -> Result<(), PlotError> {
    use log::debug;
    use plotters::prelude::*;

    /// The number of pixels along each side of the plot.
    const PIXELS: u32 = 1600;

    let groups = grouper.grouping()?;
    let shifted = grouper.shifted_positions()?;
    let points = grouper.points();
    let fluxes = grouper.fluxes();
    debug!("Plotting {} groups to {}", groups.len(), output.display());

    let (x_range, y_range) = {
        let (mut x_min, mut x_max, mut y_min, mut y_max) = (
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
        );
        for p in points.iter().chain(shifted.iter()) {
            x_min = x_min.min(p[0]);
            x_max = x_max.max(p[0]);
            y_min = y_min.min(p[1]);
            y_max = y_max.max(p[1]);
        }
        if points.is_empty() {
            (-1.0..1.0, -1.0..1.0)
        } else {
            // Pad by the look distance so the markers aren't on the edges.
            let pad = grouper.params().look_distance;
            (x_min - pad..x_max + pad, y_min - pad..y_max + pad)
        }
    };
    let max_flux = fluxes.iter().copied().fold(0.0, f64::max);

    let root = BitMapBackend::new(output, (PIXELS, PIXELS)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| PlotError::Draw(e.to_string()))?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("{} sources in {} groups", points.len(), groups.len()),
            ("sans-serif", 40),
        )
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)
        .map_err(|e| PlotError::Draw(e.to_string()))?;
    chart
        .configure_mesh()
        .light_line_style(&WHITE)
        .draw()
        .map_err(|e| PlotError::Draw(e.to_string()))?;

    for (i_group, members) in groups.iter().enumerate() {
        let colour = Palette99::pick(i_group);
        chart
            .draw_series(members.iter().map(|&i| {
                let size = if max_flux > 0.0 {
                    3 + (12.0 * (fluxes[i] / max_flux).sqrt()) as i32
                } else {
                    3
                };
                Circle::new((points[i][0], points[i][1]), size, colour.filled())
            }))
            .map_err(|e| PlotError::Draw(e.to_string()))?;
        chart
            .draw_series(
                members
                    .iter()
                    .map(|&i| Cross::new((shifted[i][0], shifted[i][1]), 4, BLACK.stroke_width(1))),
            )
            .map_err(|e| PlotError::Draw(e.to_string()))?;
    }

    root.present()
        .map_err(|e| PlotError::Draw(e.to_string()))?;
    Ok(())
}
