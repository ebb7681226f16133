//! Result handoff between workers and the collector.
//!
//! A rendezvous: a publish completes only once the collector has taken the
//! value and acknowledged it. tokio has no zero-capacity channel, so each offer
//! travels with a oneshot acknowledgement and the publisher waits on that
//! instead of on buffer space. Both sides poll cancellation first; once
//! cancellation is observable the collector takes nothing, and a publisher
//! whose offer was not acknowledged reports `Dropped`.

use tokio::sync::{mpsc, oneshot};

use crate::runtime::cancel::CancellationToken;

/// Outcome of a publish attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Publish {
    /// The collector took the value.
    Delivered,
    /// Cancellation (or a closed collector) won the race; the value is gone.
    Dropped,
}

type Offer<T> = (T, oneshot::Sender<()>);

/// Create a connected publisher/receiver pair.
pub fn channel<T: Send>() -> (Publisher<T>, Receiver<T>) {
    let (tx, rx) = mpsc::channel(1);
    (Publisher { tx }, Receiver { rx })
}

#[derive(Debug)]
pub struct Publisher<T> {
    tx: mpsc::Sender<Offer<T>>,
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T: Send> Publisher<T> {
    /// Hand `value` to the collector, waiting until it is taken or `token` is
    /// cancelled.
    pub async fn publish(&self, value: T, token: &CancellationToken) -> Publish {
        let permit = tokio::select! {
            biased;
            _ = token.cancelled() => return Publish::Dropped,
            permit = self.tx.reserve() => permit,
        };
        let Ok(permit) = permit else {
            return Publish::Dropped;
        };
        if token.is_cancelled() {
            return Publish::Dropped;
        }

        let (ack, mut acked) = oneshot::channel();
        permit.send((value, ack));

        tokio::select! {
            biased;
            _ = token.cancelled() => match acked.try_recv() {
                // Taken just before cancellation became visible here.
                Ok(()) => Publish::Delivered,
                Err(_) => Publish::Dropped,
            },
            result = &mut acked => match result {
                Ok(()) => Publish::Delivered,
                Err(_) => Publish::Dropped,
            },
        }
    }
}

#[derive(Debug)]
pub struct Receiver<T> {
    rx: mpsc::Receiver<Offer<T>>,
}

impl<T: Send> Receiver<T> {
    /// Next result, or `None` once `token` is cancelled or every publisher is gone.
    pub async fn next(&mut self, token: &CancellationToken) -> Option<T> {
        loop {
            let (value, ack) = tokio::select! {
                biased;
                _ = token.cancelled() => return None,
                offer = self.rx.recv() => offer?,
            };
            if token.is_cancelled() {
                return None;
            }
            // A failed ack means the publisher already gave up on this value.
            if ack.send(()).is_ok() {
                return Some(value);
            }
        }
    }
}
