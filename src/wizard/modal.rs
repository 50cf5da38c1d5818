/// Open/closed state of the connect modal.
///
/// With `always_open` the modal ignores close requests; the host still
/// owns the initial value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModalState {
    open: bool,
    always_open: bool,
}

impl ModalState {
    pub fn new(open: bool, always_open: bool) -> Self {
        Self {
            open: open || always_open,
            always_open,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn always_open(&self) -> bool {
        self.always_open
    }

    /// Request a change. Returns true if the state actually changed.
    pub fn set_open(&mut self, open: bool) -> bool {
        if self.always_open || self.open == open {
            return false;
        }
        self.open = open;
        true
    }
}
