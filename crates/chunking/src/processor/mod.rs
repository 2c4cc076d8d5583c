//! Bounded-concurrency execution of per-chunk transforms.
//!
//! A transform is any async function `Fn(Chunk) -> Future<Output = Result<T, E>>`.
//! Its failures (errors and panics alike) are data: they become failed
//! [`ProcessedChunk`] records and never abort the run. Only control-path
//! problems, such as an invalid batch size or a batch callback returning an
//! error, surface as `Err`.

pub mod factories;
mod retry;

pub use retry::splice_retries;

use crate::chunk::Chunk;
use agentcore_core::{AppError, AppResult, ProcessorConfig};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of one transform call on one chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedChunk<T> {
    /// The chunk the transform was applied to
    pub original_chunk: Chunk,

    /// Transform output, `None` on failure
    pub processed_content: Option<T>,

    pub success: bool,

    /// Set exactly when `success` is false
    pub error_message: Option<String>,

    /// Wall-clock duration of the transform call
    pub processing_time_ms: f64,
}

impl<T> ProcessedChunk<T> {
    pub fn succeeded(chunk: Chunk, content: T, processing_time_ms: f64) -> Self {
        Self {
            original_chunk: chunk,
            processed_content: Some(content),
            success: true,
            error_message: None,
            processing_time_ms,
        }
    }

    /// A failure record; an empty message is replaced so that failures
    /// always carry a reason.
    pub fn failed(chunk: Chunk, message: impl Into<String>, processing_time_ms: f64) -> Self {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = format!("transform failed on chunk {} without a message", chunk.id);
        }
        Self {
            original_chunk: chunk,
            processed_content: None,
            success: false,
            error_message: Some(message),
            processing_time_ms,
        }
    }

    pub fn chunk_id(&self) -> &str {
        &self.original_chunk.id
    }
}

/// Outcome of one processing run, in input order.
///
/// `A` is the type of the aggregated value and defaults to the per-chunk
/// output type.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkProcessingResult<T, A = T> {
    pub processed_chunks: Vec<ProcessedChunk<T>>,
    pub successful_count: usize,
    pub failed_count: usize,

    /// Wall-clock duration of the whole run
    pub total_processing_time_ms: f64,

    /// Set by [`ChunkProcessor::aggregate`]
    pub aggregated_result: Option<A>,
}

impl<T> ChunkProcessingResult<T> {
    pub fn new(processed_chunks: Vec<ProcessedChunk<T>>, total_processing_time_ms: f64) -> Self {
        let mut result = Self {
            processed_chunks,
            successful_count: 0,
            failed_count: 0,
            total_processing_time_ms,
            aggregated_result: None,
        };
        result.recount();
        result
    }
}

impl<T, A> ChunkProcessingResult<T, A> {
    /// Recompute the success and failure counts from `processed_chunks`.
    pub fn recount(&mut self) {
        self.successful_count = self.processed_chunks.iter().filter(|p| p.success).count();
        self.failed_count = self.processed_chunks.len() - self.successful_count;
    }

    /// Chunks whose latest attempt failed, in input order.
    pub fn failed_chunks(&self) -> Vec<Chunk> {
        self.processed_chunks
            .iter()
            .filter(|p| !p.success)
            .map(|p| p.original_chunk.clone())
            .collect()
    }

    /// Outputs of successful chunks, in input order.
    pub fn successful_contents(&self) -> Vec<&T> {
        self.processed_chunks
            .iter()
            .filter(|p| p.success)
            .filter_map(|p| p.processed_content.as_ref())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_count == 0
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("transform panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("transform panicked: {}", s)
    } else {
        "transform panicked".to_string()
    }
}

fn no_progress<T>(_completed: usize, _total: usize, _latest: &ProcessedChunk<T>) {}

/// Apply `transform` to one chunk, turning errors and panics into failures.
async fn run_one<F, Fut, T, E>(transform: &F, chunk: Chunk) -> ProcessedChunk<T>
where
    F: Fn(Chunk) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let started = Instant::now();
    let input = chunk.clone();
    let outcome = AssertUnwindSafe(async move { transform(input).await })
        .catch_unwind()
        .await;
    let took = elapsed_ms(started);

    match outcome {
        Ok(Ok(content)) => ProcessedChunk::succeeded(chunk, content, took),
        Ok(Err(e)) => {
            tracing::warn!("Failed to process chunk {}: {}", chunk.id, e);
            ProcessedChunk::failed(chunk, e.to_string(), took)
        }
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!("Failed to process chunk {}: {}", chunk.id, message);
            ProcessedChunk::failed(chunk, message, took)
        }
    }
}

/// Runs transforms over chunks sequentially, in parallel, in batches or
/// with retries.
#[derive(Debug, Clone)]
pub struct ChunkProcessor {
    config: ProcessorConfig,
}

impl ChunkProcessor {
    /// Create a processor running at most `max_workers` transforms at once.
    pub fn new(max_workers: usize) -> AppResult<Self> {
        Self::from_config(ProcessorConfig {
            max_workers,
            ..Default::default()
        })
    }

    /// Create a processor from validated configuration.
    pub fn from_config(config: ProcessorConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn max_workers(&self) -> usize {
        self.config.max_workers
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process chunks one at a time in input order.
    pub async fn process_sequential<F, Fut, T, E>(
        &self,
        chunks: &[Chunk],
        transform: F,
    ) -> ChunkProcessingResult<T>
    where
        F: Fn(Chunk) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.process_sequential_with_progress(chunks, transform, no_progress::<T>)
            .await
    }

    /// Process chunks one at a time; `on_progress(completed, total, latest)`
    /// runs after each chunk, in input order.
    pub async fn process_sequential_with_progress<F, Fut, T, E, P>(
        &self,
        chunks: &[Chunk],
        transform: F,
        mut on_progress: P,
    ) -> ChunkProcessingResult<T>
    where
        F: Fn(Chunk) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        P: FnMut(usize, usize, &ProcessedChunk<T>),
    {
        tracing::info!("Processing {} chunks sequentially", chunks.len());
        let started = Instant::now();
        let total = chunks.len();

        let mut processed = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            let outcome = run_one(&transform, chunk.clone()).await;
            on_progress(i + 1, total, &outcome);
            processed.push(outcome);
        }

        let result = ChunkProcessingResult::new(processed, elapsed_ms(started));
        tracing::info!(
            "Sequential processing completed: {}/{} successful",
            result.successful_count,
            total
        );
        result
    }

    /// Process chunks concurrently, at most `max_workers` at a time.
    ///
    /// Results are stored in input order whatever order they complete in.
    pub async fn process_parallel<F, Fut, T, E>(
        &self,
        chunks: &[Chunk],
        transform: F,
    ) -> ChunkProcessingResult<T>
    where
        F: Fn(Chunk) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.run_parallel(chunks, Arc::new(transform), &mut no_progress::<T>)
            .await
    }

    /// Like [`process_parallel`](Self::process_parallel), with
    /// `on_progress(completed, total, latest)` called once per completion in
    /// completion order.
    pub async fn process_parallel_with_progress<F, Fut, T, E, P>(
        &self,
        chunks: &[Chunk],
        transform: F,
        mut on_progress: P,
    ) -> ChunkProcessingResult<T>
    where
        F: Fn(Chunk) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        P: FnMut(usize, usize, &ProcessedChunk<T>),
    {
        self.run_parallel(chunks, Arc::new(transform), &mut on_progress)
            .await
    }

    async fn run_parallel<F, Fut, T, E, P>(
        &self,
        chunks: &[Chunk],
        transform: Arc<F>,
        on_progress: &mut P,
    ) -> ChunkProcessingResult<T>
    where
        F: Fn(Chunk) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        P: FnMut(usize, usize, &ProcessedChunk<T>),
    {
        tracing::info!(
            "Processing {} chunks in parallel (max_workers={})",
            chunks.len(),
            self.config.max_workers
        );
        let started = Instant::now();
        let total = chunks.len();
        let permits = Arc::new(Semaphore::new(self.config.max_workers));

        let mut tasks = JoinSet::new();
        for (index, chunk) in chunks.iter().cloned().enumerate() {
            let permits = permits.clone();
            let transform = transform.clone();
            tasks.spawn(async move {
                // The semaphore is never closed, so acquiring cannot fail
                let _permit = permits.acquire_owned().await.ok();
                (index, run_one(transform.as_ref(), chunk).await)
            });
        }

        let mut slots: Vec<Option<ProcessedChunk<T>>> = (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => {
                    completed += 1;
                    on_progress(completed, total, &outcome);
                    slots[index] = Some(outcome);
                }
                Err(e) => tracing::error!("Chunk task did not complete: {}", e),
            }
        }

        let processed: Vec<ProcessedChunk<T>> = slots
            .into_iter()
            .zip(chunks)
            .map(|(slot, chunk)| {
                slot.unwrap_or_else(|| {
                    ProcessedChunk::failed(chunk.clone(), "chunk task did not complete", 0.0)
                })
            })
            .collect();

        let result = ChunkProcessingResult::new(processed, elapsed_ms(started));
        tracing::info!(
            "Parallel processing completed: {}/{} successful",
            result.successful_count,
            total
        );
        result
    }

    /// Process consecutive batches of `batch_size` chunks, each batch in
    /// parallel and batches one after another.
    ///
    /// `on_batch(batch_result, batch_number)` runs after each batch with
    /// 1-based batch numbers. Returning `Err` from it stops the run and the
    /// error is returned. A zero `batch_size` is a configuration error.
    pub async fn process_streaming<F, Fut, T, E, B>(
        &self,
        chunks: &[Chunk],
        transform: F,
        batch_size: usize,
        mut on_batch: B,
    ) -> AppResult<ChunkProcessingResult<T>>
    where
        F: Fn(Chunk) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        B: FnMut(&ChunkProcessingResult<T>, usize) -> AppResult<()>,
    {
        if batch_size == 0 {
            return Err(AppError::Config(
                "batch_size must be greater than zero".to_string(),
            ));
        }

        tracing::info!(
            "Processing {} chunks in streaming batches of {}",
            chunks.len(),
            batch_size
        );
        let started = Instant::now();
        let transform = Arc::new(transform);
        let batch_count = chunks.len().div_ceil(batch_size);

        let mut processed = Vec::with_capacity(chunks.len());
        for (i, batch) in chunks.chunks(batch_size).enumerate() {
            tracing::info!("Processing batch {}/{}", i + 1, batch_count);
            let batch_result = self
                .run_parallel(batch, transform.clone(), &mut no_progress::<T>)
                .await;
            on_batch(&batch_result, i + 1)?;
            processed.extend(batch_result.processed_chunks);
        }

        let result = ChunkProcessingResult::new(processed, elapsed_ms(started));
        tracing::info!(
            "Streaming processing completed: {}/{} successful",
            result.successful_count,
            chunks.len()
        );
        Ok(result)
    }

    /// Streaming with the configured batch size.
    pub async fn process_streaming_batches<F, Fut, T, E, B>(
        &self,
        chunks: &[Chunk],
        transform: F,
        on_batch: B,
    ) -> AppResult<ChunkProcessingResult<T>>
    where
        F: Fn(Chunk) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
        B: FnMut(&ChunkProcessingResult<T>, usize) -> AppResult<()>,
    {
        self.process_streaming(chunks, transform, self.config.batch_size, on_batch)
            .await
    }

    /// Process in parallel, then re-run failed chunks up to `max_retries`
    /// times, waiting `retry_delay` before each round.
    ///
    /// Retried outcomes replace the failed entries with the same chunk id.
    /// A chunk that never succeeds keeps the error of its last attempt.
    pub async fn process_with_retry<F, Fut, T, E>(
        &self,
        chunks: &[Chunk],
        transform: F,
        max_retries: u32,
        retry_delay: Duration,
    ) -> ChunkProcessingResult<T>
    where
        F: Fn(Chunk) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        tracing::info!(
            "Processing {} chunks with retry (max_retries={})",
            chunks.len(),
            max_retries
        );
        let started = Instant::now();
        let transform = Arc::new(transform);
        let mut result = self
            .run_parallel(chunks, transform.clone(), &mut no_progress::<T>)
            .await;

        for attempt in 1..=max_retries {
            let failed = result.failed_chunks();
            if failed.is_empty() {
                break;
            }

            tracing::info!(
                "Retry attempt {}/{} for {} failed chunks",
                attempt,
                max_retries,
                failed.len()
            );
            if !retry_delay.is_zero() {
                tokio::time::sleep(retry_delay).await;
            }

            let retried = self
                .run_parallel(&failed, transform.clone(), &mut no_progress::<T>)
                .await;
            result = ChunkProcessingResult::new(
                splice_retries(result.processed_chunks, retried.processed_chunks),
                0.0,
            );
        }

        result.total_processing_time_ms = elapsed_ms(started);
        tracing::info!(
            "Processing with retry completed: {}/{} successful",
            result.successful_count,
            chunks.len()
        );
        result
    }

    /// Retry with the configured `max_retries` and `retry_delay_ms`.
    pub async fn process_with_configured_retry<F, Fut, T, E>(
        &self,
        chunks: &[Chunk],
        transform: F,
    ) -> ChunkProcessingResult<T>
    where
        F: Fn(Chunk) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        self.process_with_retry(
            chunks,
            transform,
            self.config.max_retries,
            self.config.retry_delay(),
        )
        .await
    }

    /// Combine the successful outputs, in input order, into
    /// `aggregated_result`. The aggregate may have a different type from
    /// the per-chunk outputs, and any earlier aggregate is discarded.
    ///
    /// `aggregated_result` stays unset when no chunk succeeded. If
    /// `aggregation` fails or panics, the failure is logged and
    /// `aggregated_result` stays unset too.
    pub fn aggregate<T, A, R, E, G>(
        &self,
        result: ChunkProcessingResult<T, A>,
        aggregation: G,
    ) -> ChunkProcessingResult<T, R>
    where
        T: Clone,
        E: Display,
        G: FnOnce(Vec<T>) -> Result<R, E>,
    {
        let ChunkProcessingResult {
            processed_chunks,
            successful_count,
            failed_count,
            total_processing_time_ms,
            ..
        } = result;
        let mut result = ChunkProcessingResult {
            processed_chunks,
            successful_count,
            failed_count,
            total_processing_time_ms,
            aggregated_result: None,
        };

        let contents: Vec<T> = result.successful_contents().into_iter().cloned().collect();
        if contents.is_empty() {
            tracing::debug!("No successful results to aggregate");
            return result;
        }

        let count = contents.len();
        match std::panic::catch_unwind(AssertUnwindSafe(|| aggregation(contents))) {
            Ok(Ok(aggregated)) => {
                result.aggregated_result = Some(aggregated);
                tracing::info!("Aggregated {} successful results", count);
            }
            Ok(Err(e)) => tracing::error!("Aggregation failed: {}", e),
            Err(payload) => {
                tracing::error!("Aggregation failed: {}", panic_message(payload.as_ref()))
            }
        }
        result
    }
}
