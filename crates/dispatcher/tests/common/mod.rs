#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fifo_core::{FifoError, FifoResult, ProcessResponse, WorkItem};
use fifo_dispatcher::{Backlog, DispatchSettings, ProcessingClient};
use tokio::time::Instant;

/// 模拟处理服务对单次尝试的回应
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reply {
    Success,
    Failure,
    Reject,
    Hang,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub id: String,
    pub attempt: u32,
    pub at: Instant,
}

type Script = Box<dyn Fn(&WorkItem) -> Reply + Send + Sync>;

/// 按脚本回应的处理客户端，记录每次调用和并发峰值
pub struct ScriptedClient {
    latency: Duration,
    script: Script,
    calls: Mutex<Vec<Call>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedClient {
    pub fn new(
        latency: Duration,
        script: impl Fn(&WorkItem) -> Reply + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            latency,
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }

    pub fn always(reply: Reply) -> Arc<Self> {
        Self::new(Duration::from_millis(10), move |_| reply)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, id: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|call| call.id == id).collect()
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessingClient for ScriptedClient {
    async fn process(&self, item: &WorkItem) -> FifoResult<ProcessResponse> {
        self.calls.lock().unwrap().push(Call {
            id: item.id.clone(),
            attempt: item.attempt(),
            at: Instant::now(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _in_flight = InFlight(&self.in_flight);
        self.peak.fetch_max(current, Ordering::SeqCst);

        let reply = (self.script)(item);
        let latency = if reply == Reply::Hang {
            Duration::from_secs(3600)
        } else {
            self.latency
        };
        tokio::time::sleep(latency).await;

        match reply {
            Reply::Success => Ok(ProcessResponse::succeeded(1, 0.01, 0.01, current)),
            Reply::Failure => Err(FifoError::RemoteFailure(
                "Simulated processing failure".to_string(),
            )),
            Reply::Reject => Err(FifoError::Rejected {
                status: 422,
                message: "invalid payload".to_string(),
            }),
            Reply::Hang => unreachable!("hanging request outlived its timeout"),
        }
    }
}

pub fn backlog(ids: &[&str]) -> Backlog {
    ids.iter().map(|id| WorkItem::bare(*id)).collect()
}

pub fn settings(max_concurrent: usize, max_retries: u32) -> DispatchSettings {
    DispatchSettings {
        max_concurrent,
        max_retries,
        request_timeout: Duration::from_secs(15),
        retry_delay: Duration::ZERO,
    }
}
