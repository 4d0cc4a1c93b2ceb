//! 进程内的脚本化后端：按模板排队预设回复，并记录每次请求

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;

use crate::generator::types::OperationKind;
use crate::llm::{BackendTimeout, GenerationBackend, GenerationRequest};

#[derive(Debug, Clone)]
enum Reply {
    Output(Value),
    Failure(String),
    Timeout(u64),
}

/// 脚本化后端
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<HashMap<&'static str, VecDeque<Reply>>>,
    gates: Mutex<HashMap<&'static str, Arc<Semaphore>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 为操作排队一个原始JSON回复（不做任何校验）
    pub fn reply(&self, kind: OperationKind, output: Value) -> &Self {
        self.push(kind, Reply::Output(output))
    }

    /// 为操作排队一次后端失败
    pub fn fail(&self, kind: OperationKind, message: &str) -> &Self {
        self.push(kind, Reply::Failure(message.to_string()))
    }

    /// 为操作排队一次超时
    pub fn time_out(&self, kind: OperationKind, seconds: u64) -> &Self {
        self.push(kind, Reply::Timeout(seconds))
    }

    /// 挂起该操作的后续调用，直到release
    pub fn hold(&self, kind: OperationKind) {
        lock(&self.gates).insert(kind.template_id(), Arc::new(Semaphore::new(0)));
    }

    /// 放行一次被挂起的调用
    pub fn release(&self, kind: OperationKind) {
        if let Some(gate) = lock(&self.gates).get(kind.template_id()) {
            gate.add_permits(1);
        }
    }

    /// 所有已收到的请求（按到达顺序）
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }

    /// 某操作已收到的请求
    pub fn requests_for(&self, kind: OperationKind) -> Vec<GenerationRequest> {
        lock(&self.requests)
            .iter()
            .filter(|r| r.template_id == kind.template_id())
            .cloned()
            .collect()
    }

    fn push(&self, kind: OperationKind, reply: Reply) -> &Self {
        lock(&self.replies)
            .entry(kind.template_id())
            .or_default()
            .push_back(reply);
        self
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn invoke(&self, request: &GenerationRequest) -> Result<Value> {
        lock(&self.requests).push(request.clone());

        let gate = lock(&self.gates)
            .iter()
            .find(|(id, _)| **id == request.template_id)
            .map(|(_, gate)| gate.clone());
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }

        let reply = lock(&self.replies)
            .iter_mut()
            .find(|(id, _)| **id == request.template_id)
            .and_then(|(_, queue)| queue.pop_front());

        match reply {
            Some(Reply::Output(value)) => Ok(value),
            Some(Reply::Failure(message)) => Err(anyhow!(message)),
            Some(Reply::Timeout(seconds)) => Err(BackendTimeout { seconds }.into()),
            None => Err(anyhow!(
                "no scripted reply for template {}",
                request.template_id
            )),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
