//! Grid layout for flake starting positions.
//!
//! Flakes start on a grid above the container: as many columns as fit the
//! width, as many rows as the count needs. A partial last row is spread evenly
//! across the width instead of packing left, so sparse counts still look
//! balanced.

use crate::config::FlakeSize;
use glam::Vec2;

/// Rows and columns for one flake count and container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub count: usize,
    pub columns: usize,
    pub rows: usize,
    pub column_width: f32,
    pub row_height: f32,
    /// Shift applied to every row so the grid starts above the container.
    pub vertical_offset: f32,
    container_width: f32,
    flake_width: f32,
}

impl GridLayout {
    /// Compute the grid.
    ///
    /// With cannons only a fifth of the grid height is lifted above the
    /// container, since flakes reach their slot by blasting rather than by
    /// falling in from the top.
    pub fn new(
        count: usize,
        container: Vec2,
        flake: FlakeSize,
        vertical_spacing: f32,
        has_cannons: bool,
    ) -> Self {
        let row_height = flake.height + vertical_spacing;
        if count == 0 || container.x <= 0.0 {
            if count > 0 {
                log::warn!("container width {} leaves no room for flakes", container.x);
            }
            return Self {
                count: 0,
                columns: 0,
                rows: 0,
                column_width: 0.0,
                row_height,
                vertical_offset: vertical_spacing - 20.0,
                container_width: container.x,
                flake_width: flake.width,
            };
        }

        let width = container.x;
        let horizontal_spacing = (width / count as f32 - flake.width).max(0.0);
        let column_width = flake.width + horizontal_spacing;
        let columns = if column_width > 0.0 {
            ((width / column_width).floor() as usize).clamp(1, count)
        } else {
            count
        };
        let rows = count.div_ceil(columns);
        let lift = if has_cannons { 0.2 } else { 1.0 };
        let vertical_offset = -(rows as f32) * row_height * lift + vertical_spacing - 20.0;

        Self {
            count,
            columns,
            rows,
            column_width,
            row_height,
            vertical_offset,
            container_width: width,
            flake_width: flake.width,
        }
    }

    /// Items on the last row.
    pub fn last_row_len(&self) -> usize {
        if self.count == 0 {
            return 0;
        }
        self.count - (self.rows - 1) * self.columns
    }

    /// Grid position of flake `index`, before the vertical offset.
    pub fn position(&self, index: usize) -> Vec2 {
        if self.columns == 0 {
            return Vec2::ZERO;
        }
        let row = index / self.columns;
        let y = row as f32 * self.row_height;

        let last_row_len = self.last_row_len();
        if row + 1 == self.rows && last_row_len < self.columns {
            let items = last_row_len as f32;
            let spacing = (self.container_width - items * self.flake_width) / (items + 1.0);
            let slot = (index - row * self.columns) as f32;
            return Vec2::new(spacing + slot * (self.flake_width + spacing), y);
        }

        Vec2::new((index % self.columns) as f32 * self.column_width, y)
    }

    /// Positions for every flake.
    pub fn positions(&self) -> Vec<Vec2> {
        (0..self.count).map(|i| self.position(i)).collect()
    }
}
