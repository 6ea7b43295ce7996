#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Error, anyhow};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use claim::{
    CaptureBackend, ClaimAck, ClaimEndpoint, ClaimRequest, ClaimServices, Detector,
    EndpointError, Frame, FrameSource, ItemReference,
};
use registry::StudentDirectory;

pub const FRAME: &[u8] = b"\xff\xd8\xff\xe0face";

pub struct FakeCamera {
    pub stops: Arc<AtomicUsize>,
    pub broken: bool,
}

impl FakeCamera {
    pub fn new() -> Self {
        Self {
            stops: Arc::new(AtomicUsize::new(0)),
            broken: false,
        }
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

struct FakeFeed {
    stops: Arc<AtomicUsize>,
}

impl FrameSource for FakeFeed {
    fn latest_frame(&self) -> Option<Frame> {
        Some(Frame::jpeg(FRAME))
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

impl CaptureBackend for FakeCamera {
    fn open(&self) -> Result<Box<dyn FrameSource>, Error> {
        if self.broken {
            return Err(anyhow!("camera access denied"));
        }

        Ok(Box::new(FakeFeed {
            stops: self.stops.clone(),
        }))
    }
}

/// Reports a face from the `present_from`-th call on (1-based). `None` never does.
pub struct ScriptedDetector {
    pub ready: AtomicBool,
    pub present_from: Option<usize>,
    pub fail_every_call: bool,
    pub calls: AtomicUsize,
}

impl ScriptedDetector {
    pub fn present_from(call: usize) -> Self {
        Self {
            ready: AtomicBool::new(true),
            present_from: Some(call),
            fail_every_call: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn never() -> Self {
        Self {
            ready: AtomicBool::new(true),
            present_from: None,
            fail_every_call: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Detector for ScriptedDetector {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn detect(&self, _frame: &Frame) -> Result<bool, Error> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if self.fail_every_call {
            return Err(anyhow!("model exploded"));
        }

        Ok(self.present_from.is_some_and(|from| call >= from))
    }
}

pub struct ScriptedEndpoint {
    pub latency: Duration,
    pub responses: Mutex<VecDeque<Result<ClaimAck, EndpointError>>>,
    pub requests: Mutex<Vec<(u64, ClaimRequest)>>,
}

impl ScriptedEndpoint {
    pub fn new(responses: Vec<Result<ClaimAck, EndpointError>>) -> Self {
        Self {
            latency: Duration::from_millis(50),
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ClaimEndpoint for ScriptedEndpoint {
    async fn submit_claim(
        &self,
        item: &ItemReference,
        request: &ClaimRequest,
    ) -> Result<ClaimAck, EndpointError> {
        self.requests
            .lock()
            .unwrap()
            .push((item.id, request.clone()));

        tokio::time::sleep(self.latency).await;

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EndpointError::Transport("no scripted response".to_string())))
    }
}

pub fn ack(claim_id: &str) -> Result<ClaimAck, EndpointError> {
    Ok(ClaimAck {
        claim_id: Some(claim_id.to_string()),
        timestamp: Some(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()),
    })
}

pub fn directory() -> Arc<StudentDirectory> {
    Arc::new(StudentDirectory::from_csv(
        "number,last,first\n2021001,Reyes,Ana\n2021002,Cruz,Ben\n",
    ))
}

pub fn item() -> ItemReference {
    ItemReference {
        id: 7,
        name: "Blue umbrella".to_string(),
        location: "Library".to_string(),
    }
}

pub fn services(
    camera: &Arc<FakeCamera>,
    detector: &Arc<ScriptedDetector>,
    endpoint: &Arc<ScriptedEndpoint>,
) -> ClaimServices {
    ClaimServices {
        camera: camera.clone(),
        detector: detector.clone(),
        directory: directory(),
        endpoint: endpoint.clone(),
    }
}
