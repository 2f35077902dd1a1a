use std::sync::Arc;

use slideforge_pipeline::Pipeline;
use slideforge_queue::JobQueueReceiver;
use slideforge_store::JobStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};

/// The single-consumer job worker (C5). Dequeues job ids, attaches each
/// to a tracing span, and drives the pipeline to completion. Any
/// uncaught pipeline error is folded into `status = failed`; it is
/// never re-raised, so one bad job cannot stop the loop. See spec §4.5.
pub async fn run(
    mut receiver: JobQueueReceiver,
    pipeline: Arc<Pipeline>,
    store: Arc<JobStore>,
    cancellation: CancellationToken,
) {
    info!("job worker started");

    while let Some(job_id) = receiver.dequeue(&cancellation).await {
        let span = info_span!("job", job_id = %job_id);
        async {
            info!("job started");
            if let Err(err) = pipeline.run(&job_id, &cancellation).await {
                if matches!(err, slideforge_pipeline::PipelineError::Cancelled) {
                    info!("job cancelled by shutdown");
                    return;
                }
                error!(error = %err, "job failed");
                let message = err.to_string();
                if let Err(store_err) = store
                    .update(&job_id, move |s| {
                        s.status = slideforge_common::JobStatus::Failed;
                        s.step = None;
                        s.error = Some(message.clone());
                    })
                    .await
                {
                    error!(error = %store_err, "failed to record job failure");
                }
            } else {
                info!("job succeeded");
            }
        }
        .instrument(span)
        .await;
    }

    info!("job worker stopped");
}
