// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Grouping of sky-model sources into calibration directions.
//!
//! Every source is moved once towards the kernel-weighted, flux-weighted centre
//! of its neighbourhood (a single mean-shift step that only ever looks at the
//! *original* positions). Sources whose shifted positions end up within the
//! grouping distance of each other are put into the same cluster; this
//! relation is closed transitively, so a chain of close sources forms one
//! cluster.
//!
//! All distance comparisons are inclusive (`<=`) and use no epsilon, so the
//! result is a deterministic function of the inputs.

mod error;
mod plot;

pub use error::{GroupingError, PlotError};
pub use plot::plot_grouping;

use log::{debug, trace, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_GROUPING_DISTANCE, DEFAULT_KERNEL_SIZE, DEFAULT_LOOK_DISTANCE};

/// An (x, y) position, e.g. (RA, Dec) in degrees.
pub type Position = [f64; 2];

/// Euclidean distance between two positions.
#[inline]
pub(crate) fn distance(a: Position, b: Position) -> f64 {
    (a[0] - b[0]).hypot(a[1] - b[1])
}

/// The three distances that control grouping. All must be positive and
/// finite. Typically `grouping_distance <= kernel_size <= look_distance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupingParams {
    /// Only sources within this distance of a source contribute to its shift.
    pub look_distance: f64,

    /// The bandwidth of the Gaussian-like weighting kernel.
    pub kernel_size: f64,

    /// Shifted sources within this distance of each other are merged.
    pub grouping_distance: f64,
}

impl Default for GroupingParams {
    fn default() -> Self {
        Self {
            look_distance: DEFAULT_LOOK_DISTANCE,
            kernel_size: DEFAULT_KERNEL_SIZE,
            grouping_distance: DEFAULT_GROUPING_DISTANCE,
        }
    }
}

impl GroupingParams {
    /// Check that all distances are usable. Unusual orderings of the distances
    /// are allowed, but generate a warning.
    pub fn validate(&self) -> Result<(), GroupingError> {
        for (name, value) in [
            ("look_distance", self.look_distance),
            ("kernel_size", self.kernel_size),
            ("grouping_distance", self.grouping_distance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GroupingError::BadDistance { name, value });
            }
        }

        if self.kernel_size > self.look_distance {
            warn!(
                "Grouping kernel size ({}) is larger than the look distance ({}); the kernel will be truncated",
                self.kernel_size, self.look_distance
            );
        }
        if self.grouping_distance > self.kernel_size {
            warn!(
                "Grouping distance ({}) is larger than the kernel size ({})",
                self.grouping_distance, self.kernel_size
            );
        }

        Ok(())
    }
}

/// A group of sources, identified by their indices into the [Grouper]'s input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Indices of the members, ascending.
    pub members: Vec<usize>,

    /// The flux-weighted mean of the members' original positions. If every
    /// member has zero flux, this is the unweighted mean.
    pub centroid: Position,

    /// The summed flux of all members.
    pub flux: f64,
}

/// Clusters flux-weighted points. Construct with [Grouper::new], call
/// [Grouper::run] once, then read the results with [Grouper::grouping] or
/// [Grouper::clusters].
#[derive(Debug, Clone)]
pub struct Grouper {
    points: Vec<Position>,
    fluxes: Vec<f64>,
    params: GroupingParams,

    /// Populated by `run`.
    shifted: Option<Vec<Position>>,
    groups: Option<Vec<Vec<usize>>>,
}

impl Grouper {
    pub fn new(
        points: Vec<Position>,
        fluxes: Vec<f64>,
        params: GroupingParams,
    ) -> Result<Grouper, GroupingError> {
        if points.len() != fluxes.len() {
            return Err(GroupingError::LengthMismatch {
                num_points: points.len(),
                num_fluxes: fluxes.len(),
            });
        }
        params.validate()?;
        if let Some(index) = points
            .iter()
            .position(|p| !p[0].is_finite() || !p[1].is_finite())
        {
            return Err(GroupingError::BadPosition {
                index,
                x: points[index][0],
                y: points[index][1],
            });
        }
        if let Some(index) = fluxes.iter().position(|f| !f.is_finite() || *f < 0.0) {
            return Err(GroupingError::BadFlux {
                index,
                flux: fluxes[index],
            });
        }

        Ok(Grouper {
            points,
            fluxes,
            params,
            shifted: None,
            groups: None,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn params(&self) -> GroupingParams {
        self.params
    }

    pub fn points(&self) -> &[Position] {
        &self.points
    }

    pub fn fluxes(&self) -> &[f64] {
        &self.fluxes
    }

    /// Shift every point and merge the shifted points into clusters. Calling
    /// this more than once does nothing.
    pub fn run(&mut self) {
        if self.groups.is_some() {
            debug!("Grouper has already run");
            return;
        }

        debug!(
            "Grouping {} points (look distance {}, kernel size {}, grouping distance {})",
            self.points.len(),
            self.params.look_distance,
            self.params.kernel_size,
            self.params.grouping_distance
        );
        let shifted = self.shift();
        let groups = merge_close(&shifted, self.params.grouping_distance);
        debug!(
            "Grouped {} points into {} clusters",
            self.points.len(),
            groups.len()
        );
        self.shifted = Some(shifted);
        self.groups = Some(groups);
    }

    /// One synchronous shift pass. Only points inside an x-sorted window of
    /// half-width `look_distance` are considered, and each point's weighted
    /// sums are accumulated serially in index order, so the result doesn't
    /// depend on how rayon schedules the work.
    fn shift(&self) -> Vec<Position> {
        let GroupingParams {
            look_distance,
            kernel_size,
            ..
        } = self.params;

        let order = x_order(&self.points);
        let xs: Vec<f64> = order.iter().map(|&i| self.points[i][0]).collect();

        self.points
            .par_iter()
            .map(|&p| {
                let start = xs.partition_point(|&x| p[0] - x > look_distance);
                let end = xs.partition_point(|&x| x - p[0] <= look_distance);
                let mut neighbours = order[start..end].to_vec();
                neighbours.sort_unstable();

                let mut weight_sum = 0.0;
                let mut x_sum = 0.0;
                let mut y_sum = 0.0;
                for j in neighbours {
                    let q = self.points[j];
                    let d = distance(p, q);
                    if d > look_distance {
                        continue;
                    }
                    let weight = self.fluxes[j] * (-(d / kernel_size).powi(2)).exp();
                    weight_sum += weight;
                    x_sum += weight * q[0];
                    y_sum += weight * q[1];
                }

                // Only possible if every neighbour has zero flux.
                if weight_sum > 0.0 {
                    [x_sum / weight_sum, y_sum / weight_sum]
                } else {
                    p
                }
            })
            .collect()
    }

    /// The positions of the points after the shift pass.
    pub fn shifted_positions(&self) -> Result<&[Position], GroupingError> {
        self.shifted.as_deref().ok_or(GroupingError::NotRun)
    }

    /// The clusters as lists of point indices. Every index appears exactly once.
    /// Indices within a cluster are ascending and clusters are ordered by their
    /// first index.
    pub fn grouping(&self) -> Result<Vec<Vec<usize>>, GroupingError> {
        self.groups.clone().ok_or(GroupingError::NotRun)
    }

    /// The cluster index of every point.
    pub fn assignments(&self) -> Result<Vec<usize>, GroupingError> {
        let groups = self.groups.as_ref().ok_or(GroupingError::NotRun)?;
        let mut assignments = vec![0; self.points.len()];
        for (i_group, group) in groups.iter().enumerate() {
            for &i in group {
                assignments[i] = i_group;
            }
        }
        Ok(assignments)
    }

    /// The clusters, along with their centroids and total fluxes.
    pub fn clusters(&self) -> Result<Vec<Cluster>, GroupingError> {
        let groups = self.groups.as_ref().ok_or(GroupingError::NotRun)?;
        Ok(groups
            .iter()
            .map(|members| {
                let flux: f64 = members.iter().map(|&i| self.fluxes[i]).sum();
                let centroid = if flux > 0.0 {
                    let (x, y) = members.iter().fold((0.0, 0.0), |(x, y), &i| {
                        let f = self.fluxes[i];
                        (x + f * self.points[i][0], y + f * self.points[i][1])
                    });
                    [x / flux, y / flux]
                } else {
                    let n = members.len() as f64;
                    let (x, y) = members.iter().fold((0.0, 0.0), |(x, y), &i| {
                        (x + self.points[i][0], y + self.points[i][1])
                    });
                    [x / n, y / n]
                };
                Cluster {
                    members: members.clone(),
                    centroid,
                    flux,
                }
            })
            .collect())
    }
}

/// Disjoint-set forest over point indices.
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            // Path halving.
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (a, b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        match self.rank[a].cmp(&self.rank[b]) {
            std::cmp::Ordering::Less => self.parent[a] = b,
            std::cmp::Ordering::Greater => self.parent[b] = a,
            std::cmp::Ordering::Equal => {
                self.parent[b] = a;
                self.rank[a] += 1;
            }
        }
    }
}

/// Point indices sorted by x coordinate, ties by index.
fn x_order(positions: &[Position]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..positions.len()).collect();
    order.sort_by(|&a, &b| positions[a][0].total_cmp(&positions[b][0]).then(a.cmp(&b)));
    order
}

/// Join every pair of positions within `max_distance` (inclusive) of each
/// other and return the connected components.
///
/// Positions are swept in order of x; once the x separation alone exceeds
/// `max_distance`, no later position can be close enough. The components
/// don't depend on the sweep order.
fn merge_close(positions: &[Position], max_distance: f64) -> Vec<Vec<usize>> {
    let n = positions.len();
    let mut set = DisjointSet::new(n);

    let order = x_order(positions);
    for (i_sorted, &i) in order.iter().enumerate() {
        for &j in &order[i_sorted + 1..] {
            if positions[j][0] - positions[i][0] > max_distance {
                break;
            }
            if distance(positions[i], positions[j]) <= max_distance {
                trace!("Merging points {i} and {j}");
                set.union(i, j);
            }
        }
    }

    // Collect the components, keyed by each one's smallest member. Iterating
    // in index order keeps members ascending and clusters ordered by first
    // member.
    let mut root_to_group: Vec<Option<usize>> = vec![None; n];
    let mut groups: Vec<Vec<usize>> = vec![];
    for i in 0..n {
        let root = set.find(i);
        match root_to_group[root] {
            Some(g) => groups[g].push(i),
            None => {
                root_to_group[root] = Some(groups.len());
                groups.push(vec![i]);
            }
        }
    }
    groups
}
