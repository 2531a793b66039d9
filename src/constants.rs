// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

Distances are in the units of the input positions; for sky models these are
degrees.
 */

/// Sources further apart than this don't affect each other's shift.
pub const DEFAULT_LOOK_DISTANCE: f64 = 0.2;

/// The bandwidth of the grouping kernel.
pub const DEFAULT_KERNEL_SIZE: f64 = 0.1;

/// Shifted sources closer than this are grouped together.
pub const DEFAULT_GROUPING_DISTANCE: f64 = 0.03;

/// Patches with a total flux density below this [Jy] are not used as
/// calibrators.
pub const DEFAULT_MIN_CALIBRATOR_FLUX: f64 = 1.0;

/// Patch sizes are increased by this factor so that the outermost members
/// aren't right on the edge.
pub const PATCH_SIZE_PADDING: f64 = 1.2;

/// The extension of a pipeline's walker ledger file when the pipeline file
/// doesn't name one, e.g. "PiLL.toml" uses "PiLL.walker".
pub const DEFAULT_WALKER_EXTENSION: &str = "walker";
