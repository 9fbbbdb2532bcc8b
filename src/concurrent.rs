use parking_lot::Mutex;
use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::Notify;

struct QueueState<T> {
    items: VecDeque<T>,
    /// Pushed but not yet acknowledged: queued plus in flight.
    pending: usize,
    closed: bool,
}

/// Multi-consumer FIFO with in-flight accounting.
///
/// Each pushed item is handed out by [`WorkQueue::pop`] exactly once, wrapped in a
/// [`Ticket`]. The queue counts as drained only once every ticket has been dropped.
pub struct WorkQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Notify,
    drained: Notify,
}

impl<T> WorkQueue<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(QueueState { items: VecDeque::new(), pending: 0, closed: false }),
            available: Notify::new(),
            drained: Notify::new(),
        })
    }

    pub fn from_items<I: IntoIterator<Item = T>>(items: I) -> Arc<Self> {
        let queue = Self::new();
        for item in items {
            queue.push(item);
        }
        queue
    }

    /// Returns false if the queue is already closed; the item is dropped in that case.
    pub fn push(&self, item: T) -> bool {
        {
            let mut st = self.state.lock();
            if st.closed {
                return false;
            }
            st.items.push_back(item);
            st.pending += 1;
        }
        self.available.notify_one();
        true
    }

    /// No further pushes. Idle consumers wake up and see `None` once the queue is empty.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_waiters();
    }

    /// Number of items queued or in flight.
    pub fn pending(&self) -> usize {
        self.state.lock().pending
    }

    pub fn is_drained(&self) -> bool {
        self.pending() == 0
    }

    /// Wait for the next item. Returns `None` once the queue is closed and empty.
    pub async fn pop(self: &Arc<Self>) -> Option<Ticket<T>> {
        loop {
            let notified = self.available.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let mut st = self.state.lock();
                if let Some(item) = st.items.pop_front() {
                    let more = !st.items.is_empty();
                    drop(st);
                    if more {
                        // hand the wakeup on in case ours consumed a permit meant for another waiter
                        self.available.notify_one();
                    }
                    return Some(Ticket { item, queue: Arc::clone(self) });
                }
                if st.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    /// Resolves once nothing is queued and every handed-out ticket was acknowledged.
    pub async fn wait_until_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_drained() {
                return;
            }
            notified.await;
        }
    }

    fn acknowledge(&self) {
        let now_drained = {
            let mut st = self.state.lock();
            st.pending = st.pending.saturating_sub(1);
            st.pending == 0
        };
        if now_drained {
            self.drained.notify_waiters();
        }
    }
}

/// An item taken from a [`WorkQueue`]. Dropping it marks the item complete.
pub struct Ticket<T> {
    item: T,
    queue: Arc<WorkQueue<T>>,
}

impl<T> Ticket<T> {
    pub fn item(&self) -> &T {
        &self.item
    }
}

impl<T> Deref for Ticket<T> {
    type Target = T;
    fn deref(&self) -> &T {
        self.item()
    }
}

impl<T> Drop for Ticket<T> {
    fn drop(&mut self) {
        self.queue.acknowledge();
    }
}
