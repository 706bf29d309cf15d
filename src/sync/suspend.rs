//! Interrupt-suspension scope guard.
//!
//! Shared state between the main loop and an interrupt handler is guarded
//! by suspending the one interrupt source whose handler can mutate it.
//! A global interrupt disable would be a hammer: it adds latency to every
//! unrelated source for the duration of the critical section.
//!
//! The guard saves the current enable state on entry and restores it on
//! drop, so critical sections nest and a section entered with the source
//! already disabled leaves it disabled.

use crate::hal::InterruptLine;

/// RAII guard holding one interrupt source disabled.
///
/// # Example
/// ```ignore
/// {
///     let _int = Suspended::new(&mut self.int_line);
///     // handler for this source cannot run here
/// } // prior enable state restored
/// ```
pub struct Suspended<'a, L: InterruptLine> {
    line: &'a mut L,
    was_enabled: bool,
}

impl<'a, L: InterruptLine> Suspended<'a, L> {
    /// Disable the source, remembering its current state.
    pub fn new(line: &'a mut L) -> Self {
        let was_enabled = line.is_enabled();
        line.disable();
        Self { line, was_enabled }
    }
}

impl<L: InterruptLine> Drop for Suspended<'_, L> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.line.enable();
        }
    }
}
