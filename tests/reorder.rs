use linepipe::chunk::ResultChunk;
use linepipe::collect::Reorderer;
use linepipe::error::{Error, Result};
use linepipe::pipeline::cancel::CancelToken;
use linepipe::pipeline::pipe::Pipe;
use linepipe::pipeline::state::{PipelineState, StateCell};
use tokio::sync::mpsc;

fn ok(id: u64) -> ResultChunk<u64> {
    ResultChunk::new(id, vec![id])
}

fn failed(id: u64) -> ResultChunk<u64> {
    ResultChunk::failed(id, vec![id], Error::pipeline("boom"))
}

async fn reorder(arrivals: Vec<ResultChunk<u64>>, state: StateCell) -> Result<Vec<ResultChunk<u64>>> {
    reorder_with(arrivals, state, CancelToken::new()).await
}

/// Feed `arrivals` into a reorderer and return what comes out.
async fn reorder_with(
    arrivals: Vec<ResultChunk<u64>>,
    state: StateCell,
    cancel: CancelToken,
) -> Result<Vec<ResultChunk<u64>>> {
    let (tx_in, rx_in) = mpsc::channel(arrivals.len().max(1));
    let (tx_out, mut rx_out) = mpsc::channel(arrivals.len().max(1) + 1);

    for chunk in arrivals {
        tx_in.send(chunk).await.expect("reorderer input open");
    }
    drop(tx_in);

    Reorderer::new(state)
        .process(rx_in, tx_out, 1, cancel)
        .await?;

    let mut out = Vec::new();
    while let Some(chunk) = rx_out.recv().await {
        out.push(chunk);
    }
    Ok(out)
}

fn ids(chunks: &[ResultChunk<u64>]) -> Vec<u64> {
    chunks.iter().map(|c| c.id).collect()
}

#[tokio::test]
async fn out_of_order_arrivals_leave_in_order() -> Result<()> {
    let state = StateCell::new();
    let out = reorder(vec![ok(2), ok(0), ok(3), ok(1), ok(4)], state.clone()).await?;

    assert_eq!(ids(&out), vec![0, 1, 2, 3, 4]);
    assert_eq!(state.get(), PipelineState::Finished);
    Ok(())
}

#[tokio::test]
async fn terminal_waits_for_predecessors() -> Result<()> {
    let state = StateCell::new();
    let out = reorder(vec![ok(3), failed(1), ok(2), ok(0)], state.clone()).await?;

    assert_eq!(ids(&out), vec![0, 1]);
    assert!(out[0].is_ok());
    assert!(out[1].err.is_some());
    assert_eq!(state.get(), PipelineState::Finished);
    Ok(())
}

#[tokio::test]
async fn lowest_error_wins() -> Result<()> {
    let out = reorder(vec![failed(2), ok(1), failed(1), ok(0)], StateCell::new()).await;
    let out = out?;
    // ok(1) and failed(1) share an id; the failure arrived after it was
    // buffered and takes precedence.
    assert_eq!(ids(&out), vec![0, 1]);
    assert!(out[1].err.is_some());
    Ok(())
}

#[tokio::test]
async fn leftovers_flush_ascending_on_exhaustion() -> Result<()> {
    let out = reorder(vec![ok(3), ok(1), ok(0), ok(5)], StateCell::new()).await?;
    assert_eq!(ids(&out), vec![0, 1, 3, 5]);
    Ok(())
}

#[tokio::test]
async fn error_as_first_chunk_is_delivered_alone() -> Result<()> {
    let out = reorder(vec![ok(1), failed(0), ok(2)], StateCell::new()).await?;
    assert_eq!(ids(&out), vec![0]);
    assert!(out[0].err.is_some());
    Ok(())
}

#[tokio::test]
async fn gone_consumer_finishes_quietly() -> Result<()> {
    let state = StateCell::new();
    let (tx_in, rx_in) = mpsc::channel(4);
    let (tx_out, rx_out) = mpsc::channel::<ResultChunk<u64>>(1);
    drop(rx_out);

    tx_in.send(ok(0)).await.expect("input open");
    tx_in.send(ok(1)).await.expect("input open");
    drop(tx_in);

    let cancel = CancelToken::new();
    Reorderer::new(state.clone())
        .process(rx_in, tx_out, 1, cancel.clone())
        .await?;
    assert!(state.is_finished());
    assert!(cancel.is_cancelled(), "upstream should be told to stop");
    Ok(())
}

#[tokio::test]
async fn terminal_chunk_cancels_upstream() -> Result<()> {
    let cancel = CancelToken::new();
    let out = reorder_with(vec![ok(0), failed(1), ok(2)], StateCell::new(), cancel.clone()).await?;

    assert_eq!(ids(&out), vec![0, 1]);
    assert!(cancel.is_cancelled());
    Ok(())
}

#[tokio::test]
async fn clean_exhaustion_leaves_token_alone() -> Result<()> {
    let cancel = CancelToken::new();
    let out = reorder_with(vec![ok(1), ok(0)], StateCell::new(), cancel.clone()).await?;

    assert_eq!(ids(&out), vec![0, 1]);
    assert!(!cancel.is_cancelled());
    Ok(())
}

#[tokio::test]
async fn observed_cancel_moves_to_draining() -> Result<()> {
    let state = StateCell::new();
    let cancel = CancelToken::new();
    let (tx_in, rx_in) = mpsc::channel::<ResultChunk<u64>>(4);
    let (tx_out, mut rx_out) = mpsc::channel(4);

    let task = tokio::spawn({
        let state = state.clone();
        let cancel = cancel.clone();
        async move { Reorderer::new(state).process(rx_in, tx_out, 1, cancel).await }
    });

    tx_in.send(ok(0)).await.expect("input open");
    assert_eq!(rx_out.recv().await.map(|c| c.id), Some(0));
    assert_eq!(state.get(), PipelineState::Running);

    cancel.cancel();
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while state.get() == PipelineState::Running {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("reorderer did not observe the cancel");
    assert_eq!(state.get(), PipelineState::Draining);

    tx_in
        .send(ResultChunk::failed(1, vec![], Error::Cancelled))
        .await
        .expect("input open");
    let last = rx_out.recv().await.expect("terminal chunk");
    assert!(last.is_cancelled());
    assert!(rx_out.recv().await.is_none());
    task.await??;
    assert_eq!(state.get(), PipelineState::Finished);
    Ok(())
}

#[test]
fn state_transitions_happen_once() {
    let state = StateCell::new();
    assert_eq!(state.get(), PipelineState::Running);
    assert!(state.begin_draining());
    assert!(!state.begin_draining());
    assert_eq!(state.get(), PipelineState::Draining);
    assert!(state.finish());
    assert!(!state.finish());
    assert!(!state.begin_draining());
    assert_eq!(state.get(), PipelineState::Finished);
}
