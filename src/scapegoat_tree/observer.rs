use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// Identifies a listener registered with
/// [`ScapegoatTree::on_unbalanced`](crate::ScapegoatTree::on_unbalanced).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut() + Send>;

/// Imbalance listeners, notified in registration order.
pub(crate) struct Listeners {
    next: u64,
    entries: Vec<(ListenerId, Listener)>,
}

impl Listeners {
    pub(crate) const fn new() -> Self {
        Self {
            next: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next);
        self.next += 1;
        self.entries.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub(crate) fn notify(&mut self) {
        for (_, listener) in &mut self.entries {
            listener();
        }
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("len", &self.entries.len()).finish()
    }
}
