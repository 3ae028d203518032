//! Square score matrix indexed by agent id.
//!
//! Row `i`, column `j` holds what agent `i` would gain from allying with
//! agent `j`. The matrix always spans the whole population, inactive
//! agents included, so an [`AgentId`] indexes it directly; cells of
//! inactive agents and the diagonal stay zero.

use alliance_types::AgentId;

/// Errors raised by matrix access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MatrixError {
    /// A row or column index lies outside the matrix.
    #[error("cell ({row}, {column}) is outside a {size}x{size} matrix")]
    OutOfBounds {
        /// Requested row.
        row: usize,
        /// Requested column.
        column: usize,
        /// Matrix dimension.
        size: usize,
    },

    /// Two matrices that must share a dimension do not.
    #[error("matrix shape mismatch: expected {expected}x{expected}, got {actual}x{actual}")]
    ShapeMismatch {
        /// Required dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },
}

/// A dense `size x size` matrix of non-negative scores, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreMatrix {
    size: usize,
    cells: Vec<f64>,
}

impl ScoreMatrix {
    /// An all-zero matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            cells: vec![0.0; size.saturating_mul(size)],
        }
    }

    /// Dimension of the matrix.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Check that the matrix is `expected x expected`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] otherwise.
    pub const fn require_size(&self, expected: usize) -> Result<(), MatrixError> {
        if self.size == expected {
            Ok(())
        } else {
            Err(MatrixError::ShapeMismatch {
                expected,
                actual: self.size,
            })
        }
    }

    fn offset(&self, row: usize, column: usize) -> Result<usize, MatrixError> {
        if row < self.size && column < self.size {
            row.checked_mul(self.size)
                .and_then(|base| base.checked_add(column))
                .ok_or(MatrixError::OutOfBounds {
                    row,
                    column,
                    size: self.size,
                })
        } else {
            Err(MatrixError::OutOfBounds {
                row,
                column,
                size: self.size,
            })
        }
    }

    /// Value at `(row, column)`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::OutOfBounds`] for an index outside the matrix.
    pub fn get(&self, row: AgentId, column: AgentId) -> Result<f64, MatrixError> {
        let offset = self.offset(row.index(), column.index())?;
        self.cells
            .get(offset)
            .copied()
            .ok_or(MatrixError::OutOfBounds {
                row: row.index(),
                column: column.index(),
                size: self.size,
            })
    }

    /// Overwrite `(row, column)`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::OutOfBounds`] for an index outside the matrix.
    pub fn set(&mut self, row: AgentId, column: AgentId, value: f64) -> Result<(), MatrixError> {
        let offset = self.offset(row.index(), column.index())?;
        let size = self.size;
        let cell = self.cells.get_mut(offset).ok_or(MatrixError::OutOfBounds {
            row: row.index(),
            column: column.index(),
            size,
        })?;
        *cell = value;
        Ok(())
    }

    /// Zero every cell in row `id` and column `id`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::OutOfBounds`] if `id` is outside the matrix.
    pub fn clear_agent(&mut self, id: AgentId) -> Result<(), MatrixError> {
        for other in 0..self.size {
            self.set(id, AgentId(other), 0.0)?;
            self.set(AgentId(other), id, 0.0)?;
        }
        Ok(())
    }

    /// Largest value in the matrix, `0` for an empty matrix.
    pub fn max(&self) -> f64 {
        self.cells.iter().copied().fold(0.0, f64::max)
    }

    /// Every cell whose value equals `value`, in row-major order.
    pub fn cells_equal_to(&self, value: f64) -> Vec<(AgentId, AgentId)> {
        let size = self.size;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.total_cmp(&value).is_eq())
            .filter_map(|(offset, _)| {
                let row = offset.checked_div(size)?;
                let column = offset.checked_rem(size)?;
                Some((AgentId(row), AgentId(column)))
            })
            .collect()
    }

    /// Iterate over `(row, column, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, AgentId, f64)> + '_ {
        let size = self.size;
        self.cells.iter().enumerate().filter_map(move |(offset, &value)| {
            let row = offset.checked_div(size)?;
            let column = offset.checked_rem(size)?;
            Some((AgentId(row), AgentId(column), value))
        })
    }
}
