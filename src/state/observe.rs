// src/state/observe.rs
//
// Most-recent-value plumbing shared by all view models: a cancellation scope
// for screen-lifetime tasks, and derived/combined channels built on top of
// tokio's watch primitives.
use async_trait::async_trait;
use futures::future::select_all;
use log::debug;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;

// ===== Scope

/// Owns every async task started for one screen instance. Dropping the scope
/// aborts all of them; nothing spawned here outlives it.
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    tasks: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl ScopeInner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().unwrap();
        if self.closed.load(Ordering::SeqCst) {
            // Scope already torn down: the work is dropped, not spawned.
            return;
        }
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(tokio::spawn(fut));
    }

    fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap();
        self.closed.store(true, Ordering::SeqCst);
        for handle in tasks.drain(..) {
            handle.abort();
        }
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ScopeInner {
                tasks: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Detached handle for spawning into this scope. Spawns become no-ops
    /// once the scope has shut down.
    pub fn handle(&self) -> ScopeHandle {
        ScopeHandle { inner: Arc::downgrade(&self.inner) }
    }

    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.inner.spawn(fut);
    }

    pub fn shutdown(&self) {
        self.inner.shutdown();
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.inner.shutdown();
    }
}

#[derive(Clone)]
pub struct ScopeHandle {
    inner: Weak<ScopeInner>,
}

impl ScopeHandle {
    pub fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Some(inner) = self.inner.upgrade() {
            inner.spawn(fut);
        }
    }
}

// ===== Signals

/// Change notification from one observable input. `changed` resolves when a
/// new value is available and returns false once the source is gone for good.
#[async_trait]
pub trait Signal: Send {
    async fn changed(&mut self) -> bool;
}

#[async_trait]
impl<T: Send + Sync> Signal for watch::Receiver<T> {
    async fn changed(&mut self) -> bool {
        watch::Receiver::changed(self).await.is_ok()
    }
}

/// Boxes a watch receiver as an erased input signal for [`combine`].
pub fn signal<T: Send + Sync + 'static>(rx: watch::Receiver<T>) -> Box<dyn Signal> {
    Box::new(rx)
}

// ===== StateChannel

/// Published view-state channel. The combine driver starts on the first
/// subscription, the watch channel itself caches the last value for late
/// subscribers, and with no subscribers the driver parks without recomputing
/// anything. Until the driver's first pass, subscribers observe the
/// construction-time default.
pub struct StateChannel<T> {
    core: Arc<ChannelCore<T>>,
}

struct ChannelCore<T> {
    tx: watch::Sender<T>,
    wake: Notify,
    start: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl<T: Clone + Send + Sync + 'static> StateChannel<T> {
    pub fn subscribe(&self) -> watch::Receiver<T> {
        let rx = self.core.tx.subscribe();
        let start = self.core.start.lock().unwrap().take();
        if let Some(start) = start {
            start();
        }
        self.core.wake.notify_one();
        rx
    }

    /// Last published value without subscribing.
    pub fn latest(&self) -> T {
        self.core.tx.borrow().clone()
    }
}

/// Builds the view-state channel for a set of input signals.
///
/// The driver is level-triggered: whenever any single input reports a change
/// it re-reads the latest value of every input (the compute closure borrows
/// its own receiver clones) and publishes a freshly assembled record. A
/// compute closure may persist a derived value back into one of the local
/// selection signals; gate that write with `send_if_modified` so the loop
/// settles after a single extra pass.
pub fn combine<T, F>(
    scope: &Scope,
    initial: T,
    inputs: Vec<Box<dyn Signal>>,
    compute: F,
) -> StateChannel<T>
where
    T: Clone + Send + Sync + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let (tx, bootstrap_rx) = watch::channel(initial);
    drop(bootstrap_rx);
    let core = Arc::new(ChannelCore { tx, wake: Notify::new(), start: Mutex::new(None) });

    let handle = scope.handle();
    let driver_core = Arc::downgrade(&core);
    *core.start.lock().unwrap() = Some(Box::new(move || {
        if let Some(core) = driver_core.upgrade() {
            handle.spawn(drive(core, inputs, compute));
        }
    }));

    StateChannel { core }
}

enum DriverWake {
    Unsubscribed,
    InputChanged { index: usize, alive: bool },
}

async fn drive<T, F>(core: Arc<ChannelCore<T>>, mut inputs: Vec<Box<dyn Signal>>, mut compute: F)
where
    T: Clone + Send + Sync + 'static,
    F: FnMut() -> T + Send + 'static,
{
    loop {
        if core.tx.receiver_count() == 0 {
            // No screen is watching: pause until the next subscription.
            core.wake.notified().await;
            continue;
        }

        core.tx.send_replace(compute());

        if inputs.is_empty() {
            debug!("state driver: all inputs gone, stopping");
            return;
        }

        let wake = {
            let changes = select_all(inputs.iter_mut().map(|input| input.changed()));
            tokio::select! {
                _ = core.tx.closed() => DriverWake::Unsubscribed,
                (alive, index, _) = changes => DriverWake::InputChanged { index, alive },
            }
        };
        if let DriverWake::InputChanged { index, alive: false } = wake {
            inputs.remove(index);
        }
    }
}

// ===== Derived channels

/// Projects one watch channel through a pure function. The forwarding task
/// stops as soon as the returned receiver is dropped.
pub fn map<S, U, F>(scope: &ScopeHandle, mut src: watch::Receiver<S>, project: F) -> watch::Receiver<U>
where
    S: Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    F: Fn(&S) -> U + Send + 'static,
{
    let (tx, rx) = watch::channel(project(&src.borrow()));
    scope.spawn(async move {
        loop {
            let changed = tokio::select! {
                _ = tx.closed() => return,
                res = src.changed() => res.is_ok(),
            };
            if !changed {
                // Source gone; hold the last projection.
                return;
            }
            let next = project(&src.borrow_and_update());
            tx.send_replace(next);
        }
    });
    rx
}

enum SwitchWake {
    Downstream,
    Outer(bool),
    Inner(bool),
}

/// Re-subscribing derivation: whenever the outer selection changes, the
/// query channel picked by `select` replaces the previous one and only the
/// new query is tracked from then on.
pub fn switch<S, U, F>(scope: &ScopeHandle, mut outer: watch::Receiver<S>, select: F) -> watch::Receiver<U>
where
    S: Send + Sync + 'static,
    U: Clone + Send + Sync + 'static,
    F: Fn(&S) -> watch::Receiver<U> + Send + 'static,
{
    let mut inner = select(&outer.borrow());
    let (tx, rx) = watch::channel(inner.borrow_and_update().clone());
    scope.spawn(async move {
        loop {
            let wake = tokio::select! {
                _ = tx.closed() => SwitchWake::Downstream,
                res = outer.changed() => SwitchWake::Outer(res.is_ok()),
                res = inner.changed() => SwitchWake::Inner(res.is_ok()),
            };
            match wake {
                SwitchWake::Downstream | SwitchWake::Outer(false) => return,
                SwitchWake::Outer(true) => {
                    inner = select(&outer.borrow_and_update());
                    let next = inner.borrow_and_update().clone();
                    tx.send_replace(next);
                }
                SwitchWake::Inner(true) => {
                    let next = inner.borrow_and_update().clone();
                    tx.send_replace(next);
                }
                SwitchWake::Inner(false) => {
                    // The selected query died; sit on its last value until
                    // the selection moves on or the subscriber leaves.
                    let resumed = tokio::select! {
                        _ = tx.closed() => false,
                        res = outer.changed() => res.is_ok(),
                    };
                    if !resumed {
                        return;
                    }
                    inner = select(&outer.borrow_and_update());
                    let next = inner.borrow_and_update().clone();
                    tx.send_replace(next);
                }
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time::timeout;

    async fn wait_until<T: Clone>(
        rx: &mut watch::Receiver<T>,
        pred: impl Fn(&T) -> bool,
    ) -> T {
        timeout(Duration::from_secs(2), async {
            loop {
                {
                    let current = rx.borrow_and_update();
                    if pred(&current) {
                        return current.clone();
                    }
                }
                rx.changed().await.expect("channel closed while waiting");
            }
        })
        .await
        .expect("timed out waiting for state")
    }

    #[tokio::test]
    async fn test_combined_state_reflects_latest_of_every_input() {
        let scope = Scope::new();
        let (a_tx, a_rx) = watch::channel(1u32);
        let (b_tx, b_rx) = watch::channel("one".to_string());

        let (mut a_read, mut b_read) = (a_rx.clone(), b_rx.clone());
        let state = combine(
            &scope,
            (0u32, String::new()),
            vec![signal(a_rx), signal(b_rx)],
            move || (*a_read.borrow_and_update(), b_read.borrow_and_update().clone()),
        );

        let mut rx = state.subscribe();
        wait_until(&mut rx, |s| s == &(1, "one".to_string())).await;

        a_tx.send(2).unwrap();
        wait_until(&mut rx, |s| s == &(2, "one".to_string())).await;

        b_tx.send("two".to_string()).unwrap();
        a_tx.send(3).unwrap();
        wait_until(&mut rx, |s| s == &(3, "two".to_string())).await;
    }

    #[tokio::test]
    async fn test_default_visible_before_first_combination() {
        let scope = Scope::new();
        let (_a_tx, a_rx) = watch::channel(41u32);
        let mut a_read = a_rx.clone();
        let state = combine(&scope, 0u32, vec![signal(a_rx)], move || {
            *a_read.borrow_and_update() + 1
        });

        assert_eq!(state.latest(), 0);
        let mut rx = state.subscribe();
        // The driver has not run yet on this (current-thread) runtime.
        assert_eq!(*rx.borrow(), 0);
        wait_until(&mut rx, |s| *s == 42).await;
    }

    #[tokio::test]
    async fn test_driver_starts_lazily_and_pauses_without_subscribers() {
        let scope = Scope::new();
        let computed = Arc::new(AtomicUsize::new(0));
        let (a_tx, a_rx) = watch::channel(0u32);

        let counter = Arc::clone(&computed);
        let mut a_read = a_rx.clone();
        let state = combine(&scope, 0u32, vec![signal(a_rx)], move || {
            counter.fetch_add(1, Ordering::SeqCst);
            *a_read.borrow_and_update()
        });

        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(computed.load(Ordering::SeqCst), 0, "must not compute before first subscriber");

        let mut rx = state.subscribe();
        wait_until(&mut rx, |s| *s == 0).await;
        let after_first = computed.load(Ordering::SeqCst);
        assert!(after_first >= 1);

        drop(rx);
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        a_tx.send(7).unwrap();
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(
            computed.load(Ordering::SeqCst),
            after_first,
            "must not recompute while unsubscribed"
        );

        // A late subscriber still gets a fresh combination of the latest values.
        let mut rx = state.subscribe();
        wait_until(&mut rx, |s| *s == 7).await;
    }

    #[tokio::test]
    async fn test_scope_teardown_cancels_pending_work() {
        let scope = Scope::new();
        let fired = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&fired);
        scope.spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            flag.store(true, Ordering::SeqCst);
        });
        drop(scope);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(!fired.load(Ordering::SeqCst), "no callback may fire after teardown");
    }

    #[tokio::test]
    async fn test_scope_handle_is_inert_after_shutdown() {
        let scope = Scope::new();
        let handle = scope.handle();
        scope.shutdown();

        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        handle.spawn(async move {
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_map_tracks_source() {
        let scope = Scope::new();
        let (tx, rx) = watch::channel(2u32);
        let mut doubled = map(&scope.handle(), rx, |n| n * 2);

        assert_eq!(*doubled.borrow(), 4);
        tx.send(5).unwrap();
        wait_until(&mut doubled, |n| *n == 10).await;
    }

    #[tokio::test]
    async fn test_switch_resubscribes_on_selection_change() {
        let scope = Scope::new();
        let (first_tx, first_rx) = watch::channel("first:a".to_string());
        let (second_tx, second_rx) = watch::channel("second:a".to_string());
        let (selector_tx, selector_rx) = watch::channel(0usize);

        let sources = [first_rx, second_rx];
        let mut switched = switch(&scope.handle(), selector_rx, move |i| sources[*i].clone());
        assert_eq!(*switched.borrow(), "first:a");

        first_tx.send("first:b".to_string()).unwrap();
        wait_until(&mut switched, |v| v == "first:b").await;

        selector_tx.send(1).unwrap();
        wait_until(&mut switched, |v| v == "second:a").await;

        // The abandoned query no longer feeds the derived channel.
        first_tx.send("first:c".to_string()).unwrap();
        second_tx.send("second:b".to_string()).unwrap();
        wait_until(&mut switched, |v| v == "second:b").await;
        assert_eq!(*switched.borrow(), "second:b");
    }

    #[tokio::test]
    async fn test_feedback_write_back_settles() {
        let scope = Scope::new();
        let computed = Arc::new(AtomicUsize::new(0));
        let (local_tx, local_rx) = watch::channel(0u32);
        let local_tx = Arc::new(local_tx);
        let (_src_tx, src_rx) = watch::channel(9u32);

        let counter = Arc::clone(&computed);
        let write_back = Arc::clone(&local_tx);
        let mut src_read = src_rx.clone();
        let mut local_read = local_rx.clone();
        let state = combine(
            &scope,
            0u32,
            vec![signal(src_rx), signal(local_rx)],
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let derived = *src_read.borrow_and_update();
                write_back.send_if_modified(|cur| {
                    if *cur != derived {
                        *cur = derived;
                        true
                    } else {
                        false
                    }
                });
                *local_read.borrow_and_update()
            },
        );

        let mut rx = state.subscribe();
        wait_until(&mut rx, |v| *v == 9).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let settled = computed.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(computed.load(Ordering::SeqCst), settled, "feedback loop must converge");
    }
}
