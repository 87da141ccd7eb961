use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct TimerEntry<T> {
    delay_seconds: f32,
    elapsed_seconds: f32,
    repeat: bool,
    paused: bool,
    task: T,
}

/// Cooperative scheduler. Nothing fires between calls to [`advance`];
/// firing order is handle order, serialized with all other events.
///
/// [`advance`]: TimerService::advance
#[derive(Debug, Default)]
pub struct TimerService<T> {
    next_handle: u64,
    entries: BTreeMap<TimerHandle, TimerEntry<T>>,
}

impl<T: Clone> TimerService<T> {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn schedule(&mut self, delay_seconds: f32, repeat: bool, task: T) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.saturating_add(1);
        self.entries.insert(
            handle,
            TimerEntry {
                delay_seconds: delay_seconds.max(0.0),
                elapsed_seconds: 0.0,
                repeat,
                paused: false,
                task,
            },
        );
        handle
    }

    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&handle).is_some()
    }

    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !predicate(&entry.task));
        before - self.entries.len()
    }

    pub fn pause(&mut self, handle: TimerHandle) -> bool {
        match self.entries.get_mut(&handle) {
            Some(entry) => {
                entry.paused = true;
                true
            }
            None => false,
        }
    }

    pub fn resume(&mut self, handle: TimerHandle) -> bool {
        match self.entries.get_mut(&handle) {
            Some(entry) => {
                entry.paused = false;
                true
            }
            None => false,
        }
    }

    /// A paused timer is not active; it exists but will not fire.
    pub fn is_active(&self, handle: TimerHandle) -> bool {
        self.entries
            .get(&handle)
            .map_or(false, |entry| !entry.paused)
    }

    pub fn elapsed(&self, handle: TimerHandle) -> Option<f32> {
        self.entries.get(&handle).map(|entry| entry.elapsed_seconds)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Accumulates `dt_seconds` into every running timer and returns the
    /// tasks that came due, in handle order. One-shot timers are removed;
    /// repeating timers keep their overshoot. At most one firing per timer
    /// per call.
    pub fn advance(&mut self, dt_seconds: f32) -> Vec<(TimerHandle, T)> {
        let mut fired = Vec::new();
        let mut finished = Vec::new();

        for (handle, entry) in self.entries.iter_mut() {
            if entry.paused {
                continue;
            }
            entry.elapsed_seconds += dt_seconds;
            if entry.elapsed_seconds < entry.delay_seconds {
                continue;
            }
            fired.push((*handle, entry.task.clone()));
            if entry.repeat {
                entry.elapsed_seconds -= entry.delay_seconds;
            } else {
                finished.push(*handle);
            }
        }

        for handle in finished {
            self.entries.remove(&handle);
        }

        fired
    }
}
