//! Test doubles shared by unit tests across modules.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::error::LessonError;
use crate::llm::{LlmResponse, PlanGenerator};
use crate::orchestrator::Confirm;
use crate::store::Slot;

#[derive(Debug, Default)]
struct SlotState {
    value: Option<String>,
    writes: usize,
    fail: bool,
}

/// In-memory slot. Clones share state so a test can keep a handle after
/// handing the slot to a store.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    state: Arc<Mutex<SlotState>>,
}

impl MemorySlot {
    pub fn with_value(value: &str) -> Self {
        let slot = Self::default();
        slot.state.lock().unwrap().value = Some(value.to_string());
        slot
    }

    pub fn value(&self) -> Option<String> {
        self.state.lock().unwrap().value.clone()
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail = fail;
    }
}

impl Slot for MemorySlot {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.value())
    }

    fn write(&mut self, value: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail {
            bail!("disk full");
        }
        state.value = Some(value.to_string());
        state.writes += 1;
        Ok(())
    }
}

/// Generator returning a canned raw reply and recording every prompt it is
/// sent. Prompt building and cleanup go through the shared `generate` path.
#[derive(Clone)]
pub struct StubGenerator {
    reply: Result<String, LessonError>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing(err: LessonError) -> Self {
        Self {
            reply: Err(err),
            prompts: Arc::default(),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanGenerator for StubGenerator {
    fn model(&self) -> &str {
        "stub"
    }

    async fn complete(&self, prompt: &str) -> Result<LlmResponse, LessonError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map(|text| LlmResponse {
            text,
            input_tokens: 10,
            output_tokens: 20,
        })
    }
}

/// Answers every confirmation with a fixed choice and remembers the prompts.
#[derive(Debug, Default)]
pub struct FixedConfirm {
    answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedConfirm {
    pub fn yes() -> Self {
        Self {
            answer: true,
            prompts: Mutex::default(),
        }
    }

    pub fn no() -> Self {
        Self::default()
    }
}

impl Confirm for FixedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}
