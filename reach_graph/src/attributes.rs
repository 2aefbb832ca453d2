// Copyright 2026 Catchment Engine contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

/// Static, immutable-after-construction geometry and sediment attributes of a reach.
///
/// None of these fields are interpreted by the scheduling engine: they are opaque payload
/// that is carried through to the [`crate::ReachSnapshot`] handed to the driver.
#[derive(Clone, Debug, PartialEq)]
pub struct ReachAttributes {
    pub length: f64,
    pub width: f64,
    pub bank_slope: f64,
    pub suspended_solids_concentration: f64,
    pub organic_matter_content: f64,
    pub bulk_density: f64,
    pub porosity: f64,
    pub centroid_x: f64,
    pub centroid_y: f64,
}

impl Default for ReachAttributes {
    fn default() -> Self {
        ReachAttributes {
            length: 0.0,
            width: 0.0,
            bank_slope: 0.0,
            suspended_solids_concentration: 0.0,
            organic_matter_content: 0.0,
            bulk_density: 0.0,
            porosity: 0.0,
            centroid_x: 0.0,
            centroid_y: 0.0,
        }
    }
}
