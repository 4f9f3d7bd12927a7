//! Nearest-point hit testing over a clipped Voronoi subdivision.

pub(crate) mod voronoi;
