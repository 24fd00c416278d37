//! Async access to a [`MathJax`] instance living on its own thread.
//!
//! The engine is not `Send`, so the instance is built on a dedicated worker
//! thread and every call is shipped to it as a job. Jobs run one at a time in
//! submission order. Once the last [`MathJaxWorker`] handle is dropped, jobs
//! still in the queue resolve to `InstanceDeallocated` without running, and the
//! thread exits when the queue is empty.

use std::future::Future;
use std::sync::Arc;
use std::thread;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::info;

use mj_core::{
    AsciiMathInputProcessorOptions, CallResponse, FunctionDescriptor, MathJaxError, MathJaxResult,
    Metadata, MmlInputProcessorOptions, TexInputProcessorOptions,
};

use crate::arguments::{ChtmlArguments, MmlArguments, SvgArguments};
use crate::instance::{MathJax, MathJaxOptions};

const WORKER_THREAD_NAME: &str = "mathjax-worker";

/// `None` means every handle was dropped before the job was reached.
type Job = Box<dyn FnOnce(Option<&mut MathJax>) + Send + 'static>;

struct WorkerHandle {
    jobs: mpsc::UnboundedSender<Job>,
}

#[derive(Clone)]
pub struct MathJaxWorker {
    inner: Arc<WorkerHandle>,
    metadata: Metadata,
}

impl MathJaxWorker {
    /// Starts the worker thread and builds the instance on it.
    ///
    /// Construction errors come back here and the thread stops.
    pub async fn spawn(options: MathJaxOptions) -> MathJaxResult<Self> {
        let (jobs, mut queue) = mpsc::unbounded_channel::<Job>();
        let inner = Arc::new(WorkerHandle { jobs });
        let owner = Arc::downgrade(&inner);
        let (ready, built) = oneshot::channel::<MathJaxResult<Metadata>>();

        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let mut mathjax = match MathJax::new(options) {
                    Ok(mathjax) => {
                        let _ = ready.send(Ok(mathjax.metadata().clone()));
                        mathjax
                    }
                    Err(error) => {
                        let _ = ready.send(Err(error));
                        return;
                    }
                };
                info!("mathjax worker started");

                while let Some(job) = queue.blocking_recv() {
                    if owner.strong_count() > 0 {
                        job(Some(&mut mathjax));
                    } else {
                        job(None);
                    }
                }
                info!("mathjax worker stopped");
            })
            .map_err(|error| MathJaxError::EngineCreationFailed(error.to_string()))?;

        let metadata = built.await.map_err(|_| {
            MathJaxError::EngineCreationFailed("worker exited during startup".to_string())
        })??;
        Ok(Self { inner, metadata })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Queues `work` now and returns a future for its result.
    ///
    /// The future does not borrow the worker, so the caller may drop every
    /// handle before awaiting it.
    pub fn submit<T, E, F>(&self, work: F) -> impl Future<Output = Result<T, E>> + Send + 'static
    where
        T: Send + 'static,
        E: From<MathJaxError> + Send + 'static,
        F: FnOnce(&mut MathJax) -> Result<T, E> + Send + 'static,
    {
        let (done, completion) = oneshot::channel::<Result<T, E>>();
        let job: Job = Box::new(move |mathjax| {
            let outcome = match mathjax {
                Some(mathjax) => work(mathjax),
                None => Err(MathJaxError::InstanceDeallocated.into()),
            };
            let _ = done.send(outcome);
        });
        // A closed queue drops the job and its sender, which resolves below.
        let _ = self.inner.jobs.send(job);

        async move {
            completion
                .await
                .unwrap_or_else(|_| Err(MathJaxError::InstanceDeallocated.into()))
        }
    }

    pub async fn run<T, E, F>(&self, work: F) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<MathJaxError> + Send + 'static,
        F: FnOnce(&mut MathJax) -> Result<T, E> + Send + 'static,
    {
        self.submit(work).await
    }

    pub async fn convert(
        &self,
        descriptor: &'static FunctionDescriptor,
        input: impl Into<String>,
        extra_arguments: Vec<Value>,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.convert(descriptor, &input, &extra_arguments))
            .await
    }

    pub async fn convert_batch(
        &self,
        descriptor: &'static FunctionDescriptor,
        inputs: Vec<String>,
        extra_arguments: Vec<Value>,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.convert_batch(descriptor, &inputs, &extra_arguments))
            .await
    }

    pub async fn tex2chtml(
        &self,
        input: impl Into<String>,
        arguments: ChtmlArguments,
        input_options: TexInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.tex2chtml(&input, &arguments, &input_options))
            .await
    }

    pub async fn tex2chtml_batch(
        &self,
        inputs: Vec<String>,
        arguments: ChtmlArguments,
        input_options: TexInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.tex2chtml_batch(&inputs, &arguments, &input_options))
            .await
    }

    pub async fn mml2chtml(
        &self,
        input: impl Into<String>,
        arguments: ChtmlArguments,
        input_options: MmlInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.mml2chtml(&input, &arguments, &input_options))
            .await
    }

    pub async fn mml2chtml_batch(
        &self,
        inputs: Vec<String>,
        arguments: ChtmlArguments,
        input_options: MmlInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.mml2chtml_batch(&inputs, &arguments, &input_options))
            .await
    }

    pub async fn am2chtml(
        &self,
        input: impl Into<String>,
        arguments: ChtmlArguments,
        input_options: AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.am2chtml(&input, &arguments, &input_options))
            .await
    }

    pub async fn am2chtml_batch(
        &self,
        inputs: Vec<String>,
        arguments: ChtmlArguments,
        input_options: AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.am2chtml_batch(&inputs, &arguments, &input_options))
            .await
    }

    pub async fn tex2svg(
        &self,
        input: impl Into<String>,
        arguments: SvgArguments,
        input_options: TexInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.tex2svg(&input, &arguments, &input_options))
            .await
    }

    pub async fn tex2svg_batch(
        &self,
        inputs: Vec<String>,
        arguments: SvgArguments,
        input_options: TexInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.tex2svg_batch(&inputs, &arguments, &input_options))
            .await
    }

    pub async fn mml2svg(
        &self,
        input: impl Into<String>,
        arguments: SvgArguments,
        input_options: MmlInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.mml2svg(&input, &arguments, &input_options))
            .await
    }

    pub async fn mml2svg_batch(
        &self,
        inputs: Vec<String>,
        arguments: SvgArguments,
        input_options: MmlInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.mml2svg_batch(&inputs, &arguments, &input_options))
            .await
    }

    pub async fn tex2mml(
        &self,
        input: impl Into<String>,
        arguments: MmlArguments,
        input_options: TexInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.tex2mml(&input, &arguments, &input_options))
            .await
    }

    pub async fn tex2mml_batch(
        &self,
        inputs: Vec<String>,
        arguments: MmlArguments,
        input_options: TexInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.tex2mml_batch(&inputs, &arguments, &input_options))
            .await
    }

    pub async fn am2mml(
        &self,
        input: impl Into<String>,
        arguments: MmlArguments,
        input_options: AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<String> {
        let input = input.into();
        self.run(move |mathjax| mathjax.am2mml(&input, &arguments, &input_options))
            .await
    }

    pub async fn am2mml_batch(
        &self,
        inputs: Vec<String>,
        arguments: MmlArguments,
        input_options: AsciiMathInputProcessorOptions,
    ) -> MathJaxResult<Vec<CallResponse>> {
        self.run(move |mathjax| mathjax.am2mml_batch(&inputs, &arguments, &input_options))
            .await
    }
}

#[cfg(test)]
mod worker_tests {
    use super::*;

    use std::sync::mpsc as std_mpsc;

    use mj_core::OutputFormat;
    use mj_runtime::DirectoryBundleLocator;

    fn options() -> MathJaxOptions {
        MathJaxOptions::new(
            mj_test_fixtures::lockfile_path(),
            Arc::new(DirectoryBundleLocator::new(mj_test_fixtures::bundles_dir())),
        )
    }

    #[tokio::test]
    async fn spawn_reports_construction_failure() {
        let mut options = options();
        options.lockfile_path = mj_test_fixtures::mismatched_lockfile_path();
        let error = MathJaxWorker::spawn(options)
            .await
            .err()
            .expect("mismatched version should fail");
        assert_eq!(error.code(), "MJ_VERSION_MISMATCH");
    }

    #[tokio::test]
    async fn jobs_run_in_submission_order_on_the_worker_thread() {
        let worker = MathJaxWorker::spawn(options()).await.expect("worker should start");
        assert_eq!(worker.metadata().version, "3.2.2");

        let pending = (0..5)
            .map(|index| {
                worker.submit(move |_: &mut MathJax| {
                    let name = thread::current().name().map(str::to_string);
                    Ok::<_, MathJaxError>((index, name))
                })
            })
            .collect::<Vec<_>>();

        for (expected, job) in pending.into_iter().enumerate() {
            let (index, name) = job.await.expect("job should run");
            assert_eq!(index, expected);
            assert_eq!(name.as_deref(), Some(WORKER_THREAD_NAME));
        }
    }

    #[tokio::test]
    async fn typed_wrappers_convert_on_the_worker() {
        let worker = MathJaxWorker::spawn(options()).await.expect("worker should start");
        let svg = worker
            .tex2svg("x^2", SvgArguments::default(), TexInputProcessorOptions::default())
            .await
            .expect("tex2svg should succeed");
        assert!(svg.contains("<svg"));

        let responses = worker
            .am2mml_batch(
                vec!["a".to_string(), "b".to_string()],
                MmlArguments::default(),
                AsciiMathInputProcessorOptions::default(),
            )
            .await
            .expect("batch should dispatch");
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(CallResponse::is_ok));

        let loaded = worker
            .run(|mathjax| Ok::<_, MathJaxError>(mathjax.loaded_formats()))
            .await
            .expect("run should succeed");
        assert_eq!(loaded, vec![OutputFormat::Mml, OutputFormat::Svg]);
    }

    #[tokio::test]
    async fn queued_job_fails_once_every_handle_is_dropped() {
        let worker = MathJaxWorker::spawn(options()).await.expect("worker should start");
        let (started_tx, started_rx) = std_mpsc::channel::<()>();
        let (release_tx, release_rx) = std_mpsc::channel::<()>();

        let blocking = worker.submit(move |_: &mut MathJax| {
            let _ = started_tx.send(());
            let _ = release_rx.recv();
            Ok::<_, MathJaxError>("finished")
        });
        let queued = worker.submit(|_: &mut MathJax| Ok::<_, MathJaxError>("should not run"));

        started_rx.recv().expect("first job should start");
        drop(worker);
        release_tx.send(()).expect("release first job");

        assert_eq!(blocking.await, Ok("finished"));
        assert_eq!(queued.await, Err(MathJaxError::InstanceDeallocated));
    }

    #[tokio::test]
    async fn work_errors_pass_through_unchanged() {
        let worker = MathJaxWorker::spawn(options()).await.expect("worker should start");
        let error = worker
            .run(|_: &mut MathJax| Err::<(), _>(MathJaxError::MissingResponse))
            .await
            .expect_err("work error should surface");
        assert_eq!(error, MathJaxError::MissingResponse);
    }
}
