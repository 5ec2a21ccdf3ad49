//! Task orchestration primitive for the Dispatcher's event loop.
//!
//! The Dispatcher needs to "wait for whichever stream produces a message
//! next" without losing already-consumed header bytes when a read is
//! abandoned mid-flight (an `AsyncBufRead` is not cancel-safe across
//! `Content-Length` header lines). Rather than reconstruct a borrowed
//! future per stream every loop iteration — which would require dropping
//! (and thereby corrupting) any read in progress — each stream gets a
//! detached task that owns its half of the connection and feeds decoded
//! items back through one channel as they complete. That is "one
//! outstanding read-task per stream", just implemented as a
//! persistent producer rather than a future rebuilt on every wakeup.

use std::future::Future;
use tokio::sync::mpsc;

/// Many-producers, one-consumer pump.
pub struct TaskPump<T> {
	tx: mpsc::Sender<T>,
	rx: mpsc::Receiver<T>,
}

impl<T: Send + 'static> TaskPump<T> {
	pub fn new(capacity: usize) -> Self {
		let (tx, rx) = mpsc::channel(capacity);
		TaskPump { tx, rx }
	}

	/// Spawns a detached task that drives `build(sender)` to completion.
	/// The producer pushes zero or more items through `sender` and returns
	/// when its stream is exhausted (EOF, error, or told to stop).
	pub fn spawn_producer<F, Fut>(&self, build: F)
	where
		F: FnOnce(mpsc::Sender<T>) -> Fut,
		Fut: Future<Output = ()> + Send + 'static,
	{
		let fut = build(self.tx.clone());
		tokio::spawn(async move {
			fut.await;
			tracing::debug!("task pump producer exited");
		});
	}

	/// Waits for the next item pushed by any live producer.
	pub async fn recv(&mut self) -> Option<T> {
		self.rx.recv().await
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn fans_in_from_multiple_producers_preserving_per_producer_order() {
		let mut pump: TaskPump<(&'static str, u32)> = TaskPump::new(8);

		pump.spawn_producer(|tx| async move {
			for n in 0..3 {
				tx.send(("a", n)).await.ok();
			}
		});
		pump.spawn_producer(|tx| async move {
			for n in 0..3 {
				tx.send(("b", n)).await.ok();
			}
		});

		let mut seen_a = Vec::new();
		let mut seen_b = Vec::new();
		for _ in 0..6 {
			let (tag, n) = pump.recv().await.unwrap();
			match tag {
				"a" => seen_a.push(n),
				"b" => seen_b.push(n),
				_ => unreachable!(),
			}
		}
		assert_eq!(seen_a, vec![0, 1, 2]);
		assert_eq!(seen_b, vec![0, 1, 2]);
	}

	#[tokio::test]
	async fn producer_completion_does_not_close_the_pump() {
		let mut pump: TaskPump<u32> = TaskPump::new(1);
		pump.spawn_producer(|tx| async move {
			tx.send(1).await.ok();
		});
		assert_eq!(pump.recv().await, Some(1));
		// the pump itself still holds a sender clone, so a second producer
		// spawned later can still deliver.
		pump.spawn_producer(|tx| async move {
			tx.send(2).await.ok();
		});
		assert_eq!(pump.recv().await, Some(2));
	}
}
