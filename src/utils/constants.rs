// src/utils/constants.rs

/// Interaction scores are logged on a fixed engagement scale.
pub const RATING_SCALE_MIN: f64 = 0.0;
pub const RATING_SCALE_MAX: f64 = 3.0;

/// Divisor applied to the raw category-overlap count (plus the location
/// bonus). Overlaps larger than the divisor saturate above 1.0 rather than
/// being clamped.
pub const CONTENT_OVERLAP_DIVISOR: f64 = 3.0;

/// Content scores live in [0,1]; multiplying by the rating ceiling puts them
/// on the same numeric range as predictor output before blending.
pub const CONTENT_RESCALE: f64 = RATING_SCALE_MAX;

/// Default blend-weight sweep grid.
pub const DEFAULT_ALPHA_MIN: f64 = 0.1;
pub const DEFAULT_ALPHA_MAX: f64 = 0.9;
pub const DEFAULT_ALPHA_STEP: f64 = 0.1;

/// Default length of a ranked recommendation list.
pub const DEFAULT_TOP_K: usize = 10;
