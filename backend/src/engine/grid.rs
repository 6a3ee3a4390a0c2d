/// The shared claim board: a square grid where each cell is either unclaimed
/// or owned by a player color. Dimensions are fixed at construction.
#[derive(Clone, Debug)]
pub struct Grid {
    size: usize,
    cells: Vec<Option<String>>,
}

impl Grid {
    /// Create an empty `size x size` grid with every cell unclaimed.
    pub fn new(size: usize) -> Self {
        Grid {
            size,
            cells: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns true if (x, y) lies on the board.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if self.in_bounds(x, y) {
            Some(y as usize * self.size + x as usize)
        } else {
            None
        }
    }

    /// Owner color of the cell at (x, y). `None` when unclaimed or off the board.
    pub fn owner(&self, x: i32, y: i32) -> Option<&str> {
        let idx = self.index(x, y)?;
        self.cells.get(idx)?.as_deref()
    }

    /// Set the owner of (x, y) to `color`, overwriting any previous owner.
    /// Off-board coordinates are ignored. Returns whether a cell was written.
    pub fn claim(&mut self, x: i32, y: i32, color: &str) -> bool {
        let Some(idx) = self.index(x, y) else {
            return false;
        };
        match self.cells.get_mut(idx) {
            Some(cell) => {
                *cell = Some(color.to_string());
                true
            }
            None => false,
        }
    }

    /// Claim every on-board cell of the square block of the given radius
    /// centred on (cx, cy). Returns how many cells were written.
    pub fn claim_block(&mut self, cx: i32, cy: i32, radius: i32, color: &str) -> usize {
        let mut claimed = 0;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if self.claim(cx.saturating_add(dx), cy.saturating_add(dy), color) {
                    claimed += 1;
                }
            }
        }
        claimed
    }

    /// Number of cells currently owned by `color`.
    pub fn count(&self, color: &str) -> u32 {
        self.cells
            .iter()
            .filter(|cell| cell.as_deref() == Some(color))
            .count() as u32
    }

    /// Clamp a coordinate into `[0, size)`.
    pub fn clamp_coord(&self, v: i32) -> i32 {
        let max = self.size.saturating_sub(1).min(i32::MAX as usize) as i32;
        v.clamp(0, max)
    }

    /// Row-major wire form: one row per y, one owner string per x,
    /// with `""` for unclaimed cells.
    pub fn rows(&self) -> Vec<Vec<String>> {
        if self.size == 0 {
            return Vec::new();
        }
        self.cells
            .chunks(self.size)
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
