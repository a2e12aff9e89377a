use std::cell::RefCell;
use std::rc::Rc;

use crate::cell::Cell;

/// Hooks for a presentation layer that mirrors the registry.
///
/// Called after a cell enters the registry and after it leaves it.
pub trait PopulationObserver {
    fn on_cell_added(&mut self, _cell: &Cell) {}

    fn on_cell_removed(&mut self, _cell: &Cell) {}
}

// Lets the host keep a handle on an observer it registered.
impl<T: PopulationObserver> PopulationObserver for Rc<RefCell<T>> {
    fn on_cell_added(&mut self, cell: &Cell) {
        self.borrow_mut().on_cell_added(cell);
    }

    fn on_cell_removed(&mut self, cell: &Cell) {
        self.borrow_mut().on_cell_removed(cell);
    }
}
