/// Opaque identifier of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

/// Deferred and recurring work, delivered back to the owner as task values.
///
/// Nothing runs on its own: the owner polls `due` from its event loop and
/// dispatches whatever comes back.
pub trait Scheduler<T> {
    /// Run `task` once, `delay_ms` after `now_ms`
    fn schedule_once(&mut self, task: T, delay_ms: u64, now_ms: u64) -> TaskHandle;
    /// Run `task` on every poll until cancelled
    fn schedule_recurring(&mut self, task: T) -> TaskHandle;
    fn cancel(&mut self, handle: TaskHandle);
    fn is_scheduled(&self, handle: TaskHandle) -> bool;
    fn pending(&self) -> usize;
    /// Collect tasks due at `now_ms`. One-shot tasks are removed, deadline order first.
    fn due(&mut self, now_ms: u64) -> Vec<(TaskHandle, T)>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Kind {
    Once { deadline_ms: u64 },
    Recurring,
}

#[derive(Debug, Clone)]
struct Entry<T> {
    handle: TaskHandle,
    kind: Kind,
    task: T,
}

/// Cooperative scheduler driven by the caller's tick loop
#[derive(Debug, Clone)]
pub struct DeadlineScheduler<T> {
    next_id: u64,
    entries: Vec<Entry<T>>,
}

impl<T> DeadlineScheduler<T> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn next_handle(&mut self) -> TaskHandle {
        self.next_id += 1;
        TaskHandle(self.next_id)
    }
}

impl<T> Default for DeadlineScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Scheduler<T> for DeadlineScheduler<T> {
    fn schedule_once(&mut self, task: T, delay_ms: u64, now_ms: u64) -> TaskHandle {
        let handle = self.next_handle();
        self.entries.push(Entry {
            handle,
            kind: Kind::Once {
                deadline_ms: now_ms.saturating_add(delay_ms),
            },
            task,
        });
        handle
    }

    fn schedule_recurring(&mut self, task: T) -> TaskHandle {
        let handle = self.next_handle();
        self.entries.push(Entry {
            handle,
            kind: Kind::Recurring,
            task,
        });
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.entries.retain(|e| e.handle != handle);
    }

    fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    fn pending(&self) -> usize {
        self.entries.len()
    }

    fn due(&mut self, now_ms: u64) -> Vec<(TaskHandle, T)> {
        let mut once: Vec<(u64, TaskHandle, T)> = Vec::new();
        let mut recurring: Vec<(TaskHandle, T)> = Vec::new();

        self.entries.retain(|e| match e.kind {
            Kind::Once { deadline_ms } if deadline_ms <= now_ms => {
                once.push((deadline_ms, e.handle, e.task.clone()));
                false
            }
            Kind::Once { .. } => true,
            Kind::Recurring => {
                recurring.push((e.handle, e.task.clone()));
                true
            }
        });

        once.sort_by_key(|(deadline, handle, _)| (*deadline, handle.0));
        once.into_iter()
            .map(|(_, handle, task)| (handle, task))
            .chain(recurring)
            .collect()
    }
}
