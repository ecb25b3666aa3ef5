//! Reel Layer Controller — standard and independent board layers
//!
//! Both layers live in one slot arena indexed by `(layer, reel, row)`.
//! Exactly one layer is active; every reel of the inactive layer is
//! spin-locked so only the active layer can spin.

use rf_stage::{ReelLayer, SymbolPosition};

use crate::config::GridSpec;
use crate::symbols::{LockOutcome, LockState, SymbolRef};

/// Symbol copied from the standard layer and locked on entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeededSymbol {
    pub position: SymbolPosition,
    pub symbol: String,
}

/// Result of an `activate` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerChange {
    /// Requested layer was already active
    Unchanged,
    /// Visibility swapped; `seeded` lists trigger symbols locked by the copy
    Swapped {
        layer: ReelLayer,
        seeded: Vec<SeededSymbol>,
    },
}

#[derive(Debug, Clone)]
struct BoardStorage {
    slots: Vec<SymbolRef>,
    reel_spin_locked: Vec<bool>,
    active: ReelLayer,
    independent_seeded: bool,
}

/// Owns both board layers and switches which one is visible
#[derive(Debug, Clone)]
pub struct ReelLayerController {
    grid: GridSpec,
    trigger_symbols: Vec<String>,
    storage: Option<BoardStorage>,
}

impl ReelLayerController {
    /// Create a controller; slot storage is established by `load_standard`
    pub fn new(grid: GridSpec, trigger_symbols: Vec<String>) -> Self {
        Self {
            grid,
            trigger_symbols,
            storage: None,
        }
    }

    pub fn grid(&self) -> GridSpec {
        self.grid
    }

    pub fn is_initialized(&self) -> bool {
        self.storage.is_some()
    }

    /// Total slots on one layer
    pub fn total_slots(&self) -> usize {
        self.grid.total_positions()
    }

    /// Layer currently visible (standard before initialization)
    pub fn active_layer(&self) -> ReelLayer {
        self.storage
            .as_ref()
            .map(|s| s.active)
            .unwrap_or(ReelLayer::Standard)
    }

    fn layer_len(&self) -> usize {
        self.grid.total_positions()
    }

    fn index(&self, layer: ReelLayer, reel: usize, row: usize) -> Option<usize> {
        if !self.grid.contains(reel, row) {
            return None;
        }
        Some(layer.index() * self.layer_len() + reel * self.grid.rows as usize + row)
    }

    fn reel_index(&self, layer: ReelLayer, reel: usize) -> usize {
        layer.index() * self.grid.reels as usize + reel
    }

    fn position(&self, slot_index: usize) -> SymbolPosition {
        let rows = self.grid.rows as usize;
        let local = slot_index % self.layer_len();
        SymbolPosition::new((local / rows) as u8, (local % rows) as u8)
    }

    /// Write a standard spin result (`grid[reel][row]`) onto the standard layer
    ///
    /// The first call establishes slot storage for both layers. While the
    /// independent layer is active the standard layer is frozen and the call
    /// is ignored.
    pub fn load_standard(&mut self, symbols: &[Vec<String>]) {
        if self.storage.is_none() {
            let mut reel_spin_locked = vec![false; self.grid.reels as usize * 2];
            let independent_start = self.reel_index(ReelLayer::Independent, 0);
            for locked in &mut reel_spin_locked[independent_start..] {
                *locked = true;
            }
            self.storage = Some(BoardStorage {
                slots: vec![SymbolRef::blank(); self.layer_len() * 2],
                reel_spin_locked,
                active: ReelLayer::Standard,
                independent_seeded: false,
            });
        }

        if self.active_layer() != ReelLayer::Standard {
            log::warn!("standard spin result ignored while the independent layer is active");
            return;
        }

        for reel in 0..self.grid.reels as usize {
            for row in 0..self.grid.rows as usize {
                let name = symbols.get(reel).and_then(|r| r.get(row));
                if let (Some(idx), Some(storage)) =
                    (self.index(ReelLayer::Standard, reel, row), self.storage.as_mut())
                {
                    storage.slots[idx] = match name {
                        Some(n) => SymbolRef::new(n.clone()),
                        None => SymbolRef::blank(),
                    };
                }
            }
        }
    }

    /// Make `layer` the visible, spinnable layer
    ///
    /// Entering the independent layer for the first time in a session copies
    /// trigger symbols verbatim (locked) and blanks every other slot. Returning
    /// to the standard layer writes the independent symbols back and blanks the
    /// independent layer for the next activation.
    ///
    /// # Panics
    ///
    /// Panics if called before `load_standard` has established slot storage.
    pub fn activate(&mut self, layer: ReelLayer) -> LayerChange {
        let Some(current) = self.storage.as_ref().map(|s| s.active) else {
            panic!("reel layers activated before the board was initialized");
        };
        if current == layer {
            return LayerChange::Unchanged;
        }

        let seeded = match layer {
            ReelLayer::Independent => self.copy_into_independent(),
            ReelLayer::Standard => {
                self.copy_into_standard();
                Vec::new()
            }
        };

        let reels = self.grid.reels as usize;
        let active_start = self.reel_index(layer, 0);
        let inactive_start = self.reel_index(layer.other(), 0);
        if let Some(storage) = self.storage.as_mut() {
            for locked in &mut storage.reel_spin_locked[active_start..active_start + reels] {
                *locked = false;
            }
            for locked in &mut storage.reel_spin_locked[inactive_start..inactive_start + reels] {
                *locked = true;
            }
            storage.active = layer;
        }

        log::debug!("reel layer swapped to {:?}", layer);
        LayerChange::Swapped { layer, seeded }
    }

    fn copy_into_independent(&mut self) -> Vec<SeededSymbol> {
        let len = self.layer_len();
        let offset = ReelLayer::Independent.index() * len;
        let mut seeded = Vec::new();
        let positions: Vec<SymbolPosition> = (0..len).map(|i| self.position(i)).collect();
        let trigger_symbols = &self.trigger_symbols;

        let Some(storage) = self.storage.as_mut() else {
            return seeded;
        };
        if storage.independent_seeded {
            return seeded;
        }

        for (i, position) in positions.into_iter().enumerate() {
            let standard_name = storage.slots[i].name.clone();
            let target = &mut storage.slots[offset + i];
            target.reset();
            if let Some(name) = standard_name.filter(|n| trigger_symbols.iter().any(|t| t == n)) {
                target.lock(name.clone());
                seeded.push(SeededSymbol {
                    position,
                    symbol: name,
                });
            }
        }
        storage.independent_seeded = true;
        seeded
    }

    fn copy_into_standard(&mut self) {
        let len = self.layer_len();
        let offset = ReelLayer::Independent.index() * len;
        let Some(storage) = self.storage.as_mut() else {
            return;
        };
        for i in 0..len {
            if let Some(name) = storage.slots[offset + i].name.clone() {
                storage.slots[i] = SymbolRef::new(name);
            }
            storage.slots[offset + i].reset();
        }
        storage.independent_seeded = false;
    }

    /// Slot on a layer
    pub fn slot(&self, layer: ReelLayer, reel: usize, row: usize) -> Option<&SymbolRef> {
        let idx = self.index(layer, reel, row)?;
        self.storage.as_ref().map(|s| &s.slots[idx])
    }

    /// Whether a reel of a layer is barred from spinning
    pub fn is_reel_spin_locked(&self, layer: ReelLayer, reel: usize) -> bool {
        if reel >= self.grid.reels as usize {
            return true;
        }
        let idx = self.reel_index(layer, reel);
        self.storage
            .as_ref()
            .map(|s| s.reel_spin_locked[idx])
            .unwrap_or(true)
    }

    /// Whether the slot would spin on the next respin
    pub fn is_slot_spinnable(&self, reel: usize, row: usize) -> bool {
        let layer = self.active_layer();
        !self.is_reel_spin_locked(layer, reel)
            && self
                .slot(layer, reel, row)
                .is_some_and(|s| !s.is_locked())
    }

    /// Lock a landed symbol on the independent layer
    pub fn lock_symbol(&mut self, reel: usize, row: usize, name: &str) -> LockOutcome {
        let Some(idx) = self.index(ReelLayer::Independent, reel, row) else {
            return LockOutcome::OutOfBounds;
        };
        match self.storage.as_mut() {
            Some(storage) => storage.slots[idx].lock(name),
            None => LockOutcome::OutOfBounds,
        }
    }

    /// Resolve a locked independent slot; returns whether it changed state
    pub fn resolve_slot(&mut self, reel: usize, row: usize) -> bool {
        let Some(idx) = self.index(ReelLayer::Independent, reel, row) else {
            return false;
        };
        self.storage
            .as_mut()
            .is_some_and(|s| s.slots[idx].resolve())
    }

    /// Terminate every running anticipation loop, returning their positions
    pub fn stop_all_loops(&mut self) -> Vec<SymbolPosition> {
        let len = self.layer_len();
        let offset = ReelLayer::Independent.index() * len;
        let mut stopped = Vec::new();
        let positions: Vec<SymbolPosition> = (0..len).map(|i| self.position(i)).collect();
        if let Some(storage) = self.storage.as_mut() {
            for (i, position) in positions.into_iter().enumerate() {
                if storage.slots[offset + i].stop_loop() {
                    stopped.push(position);
                }
            }
        }
        stopped
    }

    /// Independent slots in a given lock state, reel-major order
    pub fn positions_in_state(&self, state: LockState) -> Vec<SymbolPosition> {
        let len = self.layer_len();
        let offset = ReelLayer::Independent.index() * len;
        let Some(storage) = self.storage.as_ref() else {
            return Vec::new();
        };
        (0..len)
            .filter(|i| storage.slots[offset + i].state() == state)
            .map(|i| self.position(i))
            .collect()
    }

    /// Locked slots on the independent layer
    pub fn locked_count(&self) -> usize {
        let len = self.layer_len();
        let offset = ReelLayer::Independent.index() * len;
        self.storage
            .as_ref()
            .map(|s| s.slots[offset..offset + len].iter().filter(|x| x.is_locked()).count())
            .unwrap_or(0)
    }

    /// Every independent slot is locked
    pub fn is_blackout(&self) -> bool {
        self.is_initialized() && self.locked_count() == self.total_slots()
    }

    /// Symbol names of a layer as `[reel][row]`
    pub fn layer_symbols(&self, layer: ReelLayer) -> Vec<Vec<Option<String>>> {
        (0..self.grid.reels as usize)
            .map(|reel| {
                (0..self.grid.rows as usize)
                    .map(|row| self.slot(layer, reel, row).and_then(|s| s.name.clone()))
                    .collect()
            })
            .collect()
    }
}
