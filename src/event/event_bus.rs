use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::RwLock;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use anyhow::Result;
use futures::FutureExt;
use log::error;

use crate::subscriber::Subscriber;

type AsyncSubscriber<E> =
    Box<dyn Fn(E) -> Pin<Box<dyn Future<Output = Result<()>> + Send>> + Send + Sync>;
type Registry<E> = RwLock<Vec<Arc<Registration<E>>>>;

tokio::task_local! {
    static PUBLISHING: ();
}

struct Registration<E> {
    id: u64,
    active: AtomicBool,
    callback: AsyncSubscriber<E>,
}

/// Outcome of a single [`EventBus::publish`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Ordered registry of subscribers for events of type `E`.
///
/// Subscribers are called one after another in registration order. The
/// registry is copied before delivery, so a subscriber may register or
/// unregister anyone (itself included) from inside its callback: new
/// registrations only see the next event, and a registration removed
/// mid-delivery is not called if it has not been reached yet.
pub struct EventBus<E> {
    subscribers: Arc<Registry<E>>,
    next_id: AtomicU64,
}

impl<E> EventBus<E>
where
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register_callback<F, Fut>(&self, callback: F) -> Subscription
    where
        F: Fn(E) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let wrapped_sub: AsyncSubscriber<E> = Box::new(move |event| Box::pin(callback(event)));
        let registration = Arc::new(Registration {
            id,
            active: AtomicBool::new(true),
            callback: wrapped_sub,
        });

        self.subscribers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(registration.clone());

        let registry: Weak<Registry<E>> = Arc::downgrade(&self.subscribers);
        Subscription::new(id, move || {
            registration.active.store(false, Ordering::SeqCst);
            if let Some(registry) = registry.upgrade() {
                registry
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .retain(|reg| reg.id != id);
            }
        })
    }

    pub fn register_subscriber<S>(&self, subscriber: Arc<S>) -> Subscription
    where
        S: Subscriber<E> + Send + Sync + 'static,
    {
        self.register_callback(move |event: E| {
            let h = subscriber.clone();
            async move { h.callback(event).await }
        })
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Delivers `event` to every current subscriber, in registration order.
    ///
    /// A subscriber that returns an error or panics is logged and skipped;
    /// the remaining subscribers still receive the event.
    pub async fn publish(&self, event: E) -> PublishReport {
        let subs: Vec<Arc<Registration<E>>> = self
            .subscribers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        PUBLISHING
            .scope((), async move {
                let mut report = PublishReport::default();
                for sub in subs {
                    if !sub.active.load(Ordering::SeqCst) {
                        continue;
                    }
                    match Self::deliver(&sub, event.clone()).await {
                        Ok(()) => report.delivered += 1,
                        Err(e) => {
                            error!("Subscriber #{} failed to handle event: {e:#}", sub.id);
                            report.failed += 1;
                        }
                    }
                }
                report
            })
            .await
    }

    async fn deliver(sub: &Registration<E>, event: E) -> Result<()> {
        let fut = std::panic::catch_unwind(AssertUnwindSafe(|| (sub.callback)(event)))
            .map_err(|_| anyhow::anyhow!("subscriber panicked"))?;

        AssertUnwindSafe(fut)
            .catch_unwind()
            .await
            .map_err(|_| anyhow::anyhow!("subscriber panicked"))?
    }
}

impl<E> Default for EventBus<E>
where
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Whether the current task is inside [`EventBus::publish`].
pub fn is_publishing() -> bool {
    PUBLISHING.try_with(|_| ()).is_ok()
}

/// Handle to a registration on an [`EventBus`].
///
/// Dropping the handle keeps the registration alive; call
/// [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    id: u64,
    unsubscribe: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    fn new(id: u64, unsubscribe: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            id,
            unsubscribe: Box::new(unsubscribe),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes exactly this registration. Safe to call more than once.
    pub fn unsubscribe(&self) {
        (self.unsubscribe)()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    type Ready = futures::future::Ready<Result<()>>;

    fn recorder(
        log: &Arc<Mutex<Vec<String>>>,
        name: &'static str,
    ) -> impl Fn(u32) -> Ready + Send + Sync + 'static {
        let log = log.clone();
        move |event: u32| {
            log.lock().unwrap().push(format!("{name}:{event}"));
            futures::future::ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_publish_in_registration_order() {
        let bus = EventBus::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.register_callback(recorder(&log, "a"));
        bus.register_callback(recorder(&log, "b"));
        bus.register_callback(recorder(&log, "c"));

        let report = bus.publish(1).await;

        assert_eq!(report.delivered, 3);
        assert_eq!(*log.lock().unwrap(), vec!["a:1", "b:1", "c:1"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        let a = bus.register_callback(recorder(&log, "a"));
        bus.register_callback(recorder(&log, "b"));

        a.unsubscribe();
        a.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(7).await;
        assert_eq!(*log.lock().unwrap(), vec!["b:7"]);
    }

    #[tokio::test]
    async fn test_failing_and_panicking_subscribers_are_isolated() {
        let bus = EventBus::<u32>::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        bus.register_callback(|_| async { Err::<(), _>(anyhow::anyhow!("boom")) });
        bus.register_callback(|_: u32| -> Ready { panic!("subscriber panic") });
        bus.register_callback(|_| async {
            let fail = true;
            if fail {
                panic!("async subscriber panic");
            }
            Ok::<(), anyhow::Error>(())
        });
        bus.register_callback(recorder(&log, "ok"));

        let report = bus.publish(3).await;

        assert_eq!(report, PublishReport { delivered: 1, failed: 3 });
        assert_eq!(*log.lock().unwrap(), vec!["ok:3"]);
    }

    #[tokio::test]
    async fn test_is_publishing_only_inside_publish() {
        let bus = EventBus::<u32>::new();
        let seen = Arc::new(AtomicBool::new(false));
        let seen_clone = seen.clone();

        bus.register_callback(move |_| {
            seen_clone.store(is_publishing(), Ordering::SeqCst);
            async { Ok::<(), anyhow::Error>(()) }
        });

        assert!(!is_publishing());
        bus.publish(1).await;
        assert!(seen.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_unsubscribe_after_bus_dropped() {
        let bus = EventBus::<u32>::new();
        let sub = bus.register_callback(|_| async { Ok::<(), anyhow::Error>(()) });
        drop(bus);

        sub.unsubscribe();
    }
}
