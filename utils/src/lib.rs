use std::{
    pin::Pin,
    task::{Context, Poll},
    time::SystemTime,
};

use futures::Stream;
use pin_project::{pin_project, pinned_drop};

pub trait OptionInspectNone<T> {
    fn inspect_none(self, inspector_function: impl FnOnce()) -> Self;
}

impl<T> OptionInspectNone<T> for Option<T> {
    fn inspect_none(self, inspector_function: impl FnOnce()) -> Self {
        match &self {
            Some(_) => (),
            None => inspector_function(),
        }
        self
    }
}

pub fn get_epoch_time_in_ms() -> u64 {
    let start = SystemTime::now();
    let since_the_epoch = start
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("SystemTime before UNIX EPOCH");
    since_the_epoch.as_millis() as u64
}

/// A [`Stream`] wrapper that runs a custom action when dropped.
///
/// The wrapper adds no buffering; items are pulled from the inner stream
/// only when the consumer polls.
#[pin_project(PinnedDrop)]
pub struct StreamGuard<S, F>
where
    S: Stream,
    F: FnOnce(),
{
    #[pin]
    stream: S,
    on_drop: Option<F>,
}

impl<S, F> StreamGuard<S, F>
where
    S: Stream,
    F: FnOnce(),
{
    pub fn new(stream: S, on_drop: F) -> Self {
        Self {
            stream,
            on_drop: Some(on_drop),
        }
    }
}

impl<S, F> Stream for StreamGuard<S, F>
where
    S: Stream,
    F: FnOnce(),
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().stream.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.stream.size_hint()
    }
}

#[pinned_drop]
impl<S, F> PinnedDrop for StreamGuard<S, F>
where
    S: Stream,
    F: FnOnce(),
{
    fn drop(mut self: Pin<&mut Self>) {
        self.project().on_drop.take().expect(
            "No on_drop function in StreamGuard, was drop called twice or constructed wrongly?",
        )()
    }
}

/// A convenience extension for creating a [`StreamGuard`] via a method.
pub trait GuardStreamExt: Stream + Sized {
    /// Wraps the [`Stream`], running the given closure upon being dropped.
    fn guard<F>(self, on_drop: F) -> StreamGuard<Self, F>
    where
        F: FnOnce();
}

impl<S> GuardStreamExt for S
where
    S: Stream + Sized,
{
    fn guard<F>(self, on_drop: F) -> StreamGuard<Self, F>
    where
        F: FnOnce(),
    {
        StreamGuard::new(self, on_drop)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use futures::{stream, StreamExt};

    use super::*;

    #[tokio::test]
    async fn guard_runs_after_completion() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_clone = dropped.clone();
        {
            let mut guarded = stream::iter(0..3).guard(move || {
                dropped_clone.fetch_add(1, Ordering::SeqCst);
            });
            while guarded.next().await.is_some() {}
        }
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn guard_runs_on_early_drop() {
        let dropped = Arc::new(AtomicUsize::new(0));
        let dropped_clone = dropped.clone();
        {
            let mut guarded = stream::iter(0..100).guard(move || {
                dropped_clone.fetch_add(1, Ordering::SeqCst);
            });
            let _ = guarded.next().await;
        }
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn guarded_stream_pulls_on_demand() {
        let pulled = Arc::new(AtomicUsize::new(0));
        let pulled_clone = pulled.clone();
        let source = stream::iter(0..100).inspect(move |_| {
            pulled_clone.fetch_add(1, Ordering::SeqCst);
        });
        let mut guarded = source.guard(|| {});
        let _ = guarded.next().await;
        let _ = guarded.next().await;
        assert_eq!(pulled.load(Ordering::SeqCst), 2);
    }
}
