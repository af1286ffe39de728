//! Configuration types for the layout engines.
//!
//! This module provides configuration structures that control spacing and
//! placement behavior. All types implement [`serde::Deserialize`] for
//! flexible loading from external sources.
//!
//! Property setters validate eagerly and reject invalid values with
//! [`LayoutError::Config`], so a bad configuration never reaches a layout
//! pass. Configurations loaded through serde should be checked once with
//! their `validate()` method.

use serde::Deserialize;

use crate::error::LayoutError;

fn check_spacing(property: &str, value: f32) -> Result<(), LayoutError> {
    if !value.is_finite() || value < 0.0 {
        return Err(LayoutError::new_config_error(
            property,
            format_args!("spacing must be a finite non-negative number, got {value}"),
        ));
    }
    Ok(())
}

/// Spacing configuration for the layered driver.
///
/// `layer_spacing` is the minimum perpendicular distance between adjacent
/// layers; individual gaps may grow when a delegate's layer-space hook asks
/// for more room. `column_spacing` is the distance covered by one column
/// unit along the lateral axis.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayeredConfig {
    layer_spacing: f32,
    column_spacing: f32,
    reduce_passes: usize,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self {
            layer_spacing: 50.0,
            column_spacing: 25.0,
            reduce_passes: 4,
        }
    }
}

impl LayeredConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the minimum distance between adjacent layers.
    pub fn layer_spacing(&self) -> f32 {
        self.layer_spacing
    }

    /// Returns the lateral distance covered by one column unit.
    pub fn column_spacing(&self) -> f32 {
        self.column_spacing
    }

    /// Returns the number of crossing-reduction sweep pairs the default
    /// reducer runs.
    pub fn reduce_passes(&self) -> usize {
        self.reduce_passes
    }

    /// Set the minimum distance between adjacent layers.
    pub fn set_layer_spacing(&mut self, spacing: f32) -> Result<&mut Self, LayoutError> {
        check_spacing("layer_spacing", spacing)?;
        self.layer_spacing = spacing;
        Ok(self)
    }

    /// Set the lateral distance covered by one column unit.
    ///
    /// Zero is rejected: column units would collapse and every vertex in a
    /// layer would land on the same coordinate.
    pub fn set_column_spacing(&mut self, spacing: f32) -> Result<&mut Self, LayoutError> {
        check_spacing("column_spacing", spacing)?;
        if spacing == 0.0 {
            return Err(LayoutError::new_config_error(
                "column_spacing",
                "spacing must be positive",
            ));
        }
        self.column_spacing = spacing;
        Ok(self)
    }

    /// Set the number of crossing-reduction sweep pairs.
    pub fn set_reduce_passes(&mut self, passes: usize) -> Result<&mut Self, LayoutError> {
        if passes == 0 {
            return Err(LayoutError::new_config_error(
                "reduce_passes",
                "at least one pass is required",
            ));
        }
        self.reduce_passes = passes;
        Ok(self)
    }

    /// Check every field of a deserialized configuration.
    pub fn validate(&self) -> Result<(), LayoutError> {
        check_spacing("layer_spacing", self.layer_spacing)?;
        check_spacing("column_spacing", self.column_spacing)?;
        if self.column_spacing == 0.0 {
            return Err(LayoutError::new_config_error(
                "column_spacing",
                "spacing must be positive",
            ));
        }
        if self.reduce_passes == 0 {
            return Err(LayoutError::new_config_error(
                "reduce_passes",
                "at least one pass is required",
            ));
        }
        Ok(())
    }
}

/// Spacing configuration for lane-constrained layouts.
///
/// `lane_spacing` is measured in column units between adjacent lane
/// corridors. `link_spacing` is the per-link routing distance used by the
/// overlap estimator when reserving perpendicular space.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    lane_spacing: i32,
    link_spacing: f32,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            lane_spacing: 1,
            link_spacing: 4.0,
        }
    }
}

impl LaneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of empty columns between adjacent lanes.
    pub fn lane_spacing(&self) -> i32 {
        self.lane_spacing
    }

    /// Returns the routing distance reserved per parallel link.
    pub fn link_spacing(&self) -> f32 {
        self.link_spacing
    }

    /// Set the number of empty columns between adjacent lanes.
    pub fn set_lane_spacing(&mut self, spacing: i32) -> Result<&mut Self, LayoutError> {
        if spacing < 0 {
            return Err(LayoutError::new_config_error(
                "lane_spacing",
                format_args!("spacing must be non-negative, got {spacing}"),
            ));
        }
        self.lane_spacing = spacing;
        Ok(self)
    }

    /// Set the routing distance reserved per parallel link.
    pub fn set_link_spacing(&mut self, spacing: f32) -> Result<&mut Self, LayoutError> {
        check_spacing("link_spacing", spacing)?;
        self.link_spacing = spacing;
        Ok(self)
    }

    /// Check every field of a deserialized configuration.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.lane_spacing < 0 {
            return Err(LayoutError::new_config_error(
                "lane_spacing",
                "spacing must be non-negative",
            ));
        }
        check_spacing("link_spacing", self.link_spacing)
    }
}

/// Which side of the main layout the side block is placed on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum Side {
    Top,
    #[default]
    Bottom,
    Left,
    Right,
}

/// How the side block is aligned along its placement edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum SideAlignment {
    /// Anchored to the near edge of the main bounds.
    #[default]
    Start,
    /// Centered on the main bounds.
    Center,
}

/// Placement configuration for the composite orchestrator's side block.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompositeConfig {
    side: Side,
    alignment: SideAlignment,
    gap_width: f32,
    gap_height: f32,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            side: Side::Bottom,
            alignment: SideAlignment::Start,
            gap_width: 20.0,
            gap_height: 20.0,
        }
    }
}

impl CompositeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns which side of the main bounds the side block occupies.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the side block's alignment along the placement edge.
    pub fn alignment(&self) -> SideAlignment {
        self.alignment
    }

    /// Returns the horizontal gap between main and side bounds.
    pub fn gap_width(&self) -> f32 {
        self.gap_width
    }

    /// Returns the vertical gap between main and side bounds.
    pub fn gap_height(&self) -> f32 {
        self.gap_height
    }

    /// Set which side of the main bounds the side block occupies.
    pub fn set_side(&mut self, side: Side) -> &mut Self {
        self.side = side;
        self
    }

    /// Set the side block's alignment along the placement edge.
    pub fn set_alignment(&mut self, alignment: SideAlignment) -> &mut Self {
        self.alignment = alignment;
        self
    }

    /// Set the gap between the main bounds and the side block.
    pub fn set_gap(&mut self, width: f32, height: f32) -> Result<&mut Self, LayoutError> {
        check_spacing("gap_width", width)?;
        check_spacing("gap_height", height)?;
        self.gap_width = width;
        self.gap_height = height;
        Ok(self)
    }

    /// Check every field of a deserialized configuration.
    pub fn validate(&self) -> Result<(), LayoutError> {
        check_spacing("gap_width", self.gap_width)?;
        check_spacing("gap_height", self.gap_height)
    }
}

/// Row-wrapping configuration for the grid sub-layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    wrap_count: usize,
    spacing_width: f32,
    spacing_height: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            wrap_count: 4,
            spacing_width: 20.0,
            spacing_height: 20.0,
        }
    }
}

impl GridConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of items placed per row.
    pub fn wrap_count(&self) -> usize {
        self.wrap_count
    }

    /// Returns the horizontal spacing between grid cells.
    pub fn spacing_width(&self) -> f32 {
        self.spacing_width
    }

    /// Returns the vertical spacing between grid rows.
    pub fn spacing_height(&self) -> f32 {
        self.spacing_height
    }

    /// Set the number of items placed per row.
    pub fn set_wrap_count(&mut self, count: usize) -> Result<&mut Self, LayoutError> {
        if count == 0 {
            return Err(LayoutError::new_config_error(
                "wrap_count",
                "at least one item per row is required",
            ));
        }
        self.wrap_count = count;
        Ok(self)
    }

    /// Set the spacing between grid cells.
    pub fn set_spacing(&mut self, width: f32, height: f32) -> Result<&mut Self, LayoutError> {
        check_spacing("spacing_width", width)?;
        check_spacing("spacing_height", height)?;
        self.spacing_width = width;
        self.spacing_height = height;
        Ok(self)
    }

    /// Check every field of a deserialized configuration.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.wrap_count == 0 {
            return Err(LayoutError::new_config_error(
                "wrap_count",
                "at least one item per row is required",
            ));
        }
        check_spacing("spacing_width", self.spacing_width)?;
        check_spacing("spacing_height", self.spacing_height)
    }
}

/// Spacing configuration for genogram pair fusion.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenogramConfig {
    spouse_spacing: f32,
}

impl Default for GenogramConfig {
    fn default() -> Self {
        Self {
            spouse_spacing: 30.0,
        }
    }
}

impl GenogramConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the gap left between the two members of a fused pair.
    pub fn spouse_spacing(&self) -> f32 {
        self.spouse_spacing
    }

    /// Set the gap left between the two members of a fused pair.
    pub fn set_spouse_spacing(&mut self, spacing: f32) -> Result<&mut Self, LayoutError> {
        check_spacing("spouse_spacing", spacing)?;
        self.spouse_spacing = spacing;
        Ok(self)
    }

    /// Check every field of a deserialized configuration.
    pub fn validate(&self) -> Result<(), LayoutError> {
        check_spacing("spouse_spacing", self.spouse_spacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_spacing_is_rejected() {
        let mut config = LayeredConfig::new();
        assert!(config.set_layer_spacing(-1.0).is_err());
        assert!(config.set_layer_spacing(f32::NAN).is_err());
        assert!(config.set_layer_spacing(12.5).is_ok());
    }

    #[test]
    fn test_zero_column_spacing_is_rejected() {
        let mut config = LayeredConfig::new();
        assert!(config.set_column_spacing(0.0).is_err());
    }

    #[test]
    fn test_lane_config_defaults_validate() {
        assert!(LaneConfig::default().validate().is_ok());
        let mut config = LaneConfig::new();
        assert!(config.set_lane_spacing(-2).is_err());
    }

    #[test]
    fn test_grid_wrap_count_must_be_positive() {
        let mut config = GridConfig::new();
        assert!(config.set_wrap_count(0).is_err());
        assert!(config.set_wrap_count(3).is_ok());
        assert_eq!(config.wrap_count(), 3);
    }

    #[test]
    fn test_composite_defaults_use_twenty_unit_gap() {
        let config = CompositeConfig::default();
        assert_eq!(config.side(), Side::Bottom);
        assert_eq!(config.alignment(), SideAlignment::Start);
        assert_eq!(config.gap_width(), 20.0);
        assert_eq!(config.gap_height(), 20.0);
    }
}
