//! An in-order execution queue for device work.
//!
//! A [`ComputeStream`] owns a `rayon` thread pool that plays the role of the compute device, plus one worker thread that drains
//! submitted jobs in submission order. Jobs submitted to the same stream never overlap, and neither do kernels started with
//! [`ComputeStream::run`]. Nothing orders the jobs of two different streams; callers that need such an order must
//! [`ComputeStream::synchronize`] explicitly.

use crossbeam::channel::{self, Sender};
use parking_lot::{Condvar, Mutex};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type StreamJob = Box<dyn FnOnce() + Send + 'static>;

pub struct ComputeStream {
    pool: Arc<ThreadPool>,
    jobs: Option<Sender<StreamJob>>,
    in_flight: Arc<InFlight>,
    /// Held by whoever is executing on the device: the worker for an enqueued job, or the caller of [`ComputeStream::run`].
    executing: Arc<Mutex<()>>,
    worker: Option<JoinHandle<()>>,
}

impl ComputeStream {
    /// Creates a stream whose device has `num_threads` workers. Zero lets `rayon` pick the number of threads.
    pub fn new(num_threads: usize) -> Result<Self, WorkerError> {
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .thread_name(|i| format!("gneiss-compute-{}", i))
                .build()?,
        );
        let in_flight = Arc::new(InFlight::default());
        let (jobs, job_rx) = channel::unbounded::<StreamJob>();

        let worker_pool = pool.clone();
        let worker_in_flight = in_flight.clone();
        let executing = Arc::new(Mutex::new(()));
        let worker_executing = executing.clone();
        let worker = thread::Builder::new()
            .name("gneiss-stream".to_owned())
            .spawn(move || {
                for job in job_rx.iter() {
                    let _executing = worker_executing.lock();
                    let result = panic::catch_unwind(AssertUnwindSafe(|| worker_pool.install(job)));
                    if result.is_err() {
                        log::error!("Compute stream job panicked; continuing with the next job");
                    }
                    worker_in_flight.complete_one();
                }
            })?;

        Ok(Self {
            pool,
            jobs: Some(jobs),
            in_flight,
            executing,
            worker: Some(worker),
        })
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Submits `job` without waiting for it. Jobs run one at a time, in submission order.
    pub fn enqueue(&self, job: impl FnOnce() + Send + 'static) {
        self.in_flight.begin_one();
        let sent = match self.jobs.as_ref() {
            Some(jobs) => jobs.send(Box::new(job)).is_ok(),
            None => false,
        };
        if !sent {
            log::error!("Compute stream worker is gone; dropping job");
            self.in_flight.complete_one();
        }
    }

    /// Blocks the calling thread until every job enqueued so far has finished.
    pub fn synchronize(&self) {
        self.in_flight.wait_idle();
    }

    /// Runs `f` on the device after all previously enqueued jobs have finished, and returns its result.
    ///
    /// Unlike [`enqueue`](Self::enqueue), `f` may borrow from the caller, so the calling thread blocks until it completes. Jobs
    /// enqueued while `f` runs wait for it. `f` must not wait on this stream itself.
    pub fn run<R: Send>(&self, f: impl FnOnce() -> R + Send) -> R {
        self.synchronize();
        let _executing = self.executing.lock();
        self.pool.install(f)
    }
}

impl Drop for ComputeStream {
    fn drop(&mut self) {
        // Closing the channel lets the worker finish the remaining jobs and exit.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Compute stream worker panicked");
            }
        }
    }
}

#[derive(Default)]
struct InFlight {
    count: Mutex<usize>,
    idle: Condvar,
}

impl InFlight {
    fn begin_one(&self) {
        *self.count.lock() += 1;
    }

    fn complete_one(&self) {
        let mut count = self.count.lock();
        *count -= 1;
        if *count == 0 {
            self.idle.notify_all();
        }
    }

    fn wait_idle(&self) {
        let mut count = self.count.lock();
        while *count > 0 {
            self.idle.wait(&mut count);
        }
    }
}

/// A single `u32` written by device code and read back by the host.
///
/// Reading it back is a hard synchronization point: [`copy_to_host`](Self::copy_to_host) waits for the whole stream.
#[derive(Debug, Default)]
pub struct DeviceScalar {
    value: AtomicU32,
}

impl DeviceScalar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Device-side write.
    #[inline]
    pub fn store(&self, value: u32) {
        self.value.store(value, Ordering::Release);
    }

    pub fn copy_to_host(&self, stream: &ComputeStream) -> u32 {
        stream.synchronize();
        self.value.load(Ordering::Acquire)
    }
}

/// Failure to start one of the background workers.
#[derive(Debug)]
pub enum WorkerError {
    ThreadPool(ThreadPoolBuildError),
    Spawn(io::Error),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::ThreadPool(e) => write!(f, "failed to build compute thread pool: {}", e),
            WorkerError::Spawn(e) => write!(f, "failed to spawn worker thread: {}", e),
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkerError::ThreadPool(e) => Some(e),
            WorkerError::Spawn(e) => Some(e),
        }
    }
}

impl From<ThreadPoolBuildError> for WorkerError {
    fn from(e: ThreadPoolBuildError) -> Self {
        WorkerError::ThreadPool(e)
    }
}

impl From<io::Error> for WorkerError {
    fn from(e: io::Error) -> Self {
        WorkerError::Spawn(e)
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
