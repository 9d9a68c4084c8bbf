// Tests for mutation debouncing

use blockscope_core::scheduler::{MutationDebouncer, MutationEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_burst_collapses_into_one_batch() {
    let (tx, mut rx) = mpsc::channel(16);
    let debouncer = MutationDebouncer::new(Duration::from_millis(500));

    tokio::spawn(async move {
        for i in 0..3 {
            tx.send(MutationEvent::new(&format!("childList {}", i)))
                .await
                .unwrap();
            sleep(Duration::from_millis(100)).await;
        }
        sleep(Duration::from_secs(2)).await;
        tx.send(MutationEvent::new("attributes")).await.unwrap();
    });

    assert_eq!(debouncer.next_batch(&mut rx).await, Some(3));
    assert_eq!(debouncer.next_batch(&mut rx).await, Some(1));
    assert_eq!(debouncer.next_batch(&mut rx).await, None);
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_yields_nothing() {
    let (tx, mut rx) = mpsc::channel::<MutationEvent>(1);
    drop(tx);
    let debouncer = MutationDebouncer::new(Duration::from_millis(500));

    assert_eq!(debouncer.next_batch(&mut rx).await, None);
}
