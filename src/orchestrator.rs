//! Top-level controller tying upload, generation and the plan store together.
//!
//! Every state-changing operation takes `&mut self`, so only one extraction
//! or generation can be in flight for a session at a time.

use std::time::Instant;

use tracing::{info, warn};

use crate::error::LessonError;
use crate::extract::{self, UploadedFile};
use crate::instrumentation::{GenerationLog, RunLogger};
use crate::llm::{GeneratedPlan, GenerationRequest, PlanGenerator, DEFAULT_DURATION};
use crate::store::{LessonPlan, PlanStore, Slot};

const MISSING_FILE: &str = "Vui lòng tải lên một tệp mẫu.";
const MISSING_FIELDS: &str = "Vui lòng điền đầy đủ các thông tin: Môn học, Lớp, và Tên bài học.";
const CLEAR_ALL_PROMPT: &str =
    "Bạn có chắc chắn muốn xóa TẤT CẢ các giáo án đã lưu không? Hành động này không thể hoàn tác.";

/// User confirmation for irreversible actions.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    ExtractingFile,
    GeneratingPlan,
    Error,
}

/// The fields a teacher fills in before generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanForm {
    pub subject: String,
    pub grade: String,
    pub topic: String,
    pub duration: String,
}

impl Default for PlanForm {
    fn default() -> Self {
        Self {
            subject: String::new(),
            grade: String::new(),
            topic: String::new(),
            duration: DEFAULT_DURATION.to_string(),
        }
    }
}

pub struct Orchestrator<G: PlanGenerator, S: Slot> {
    generator: G,
    store: PlanStore<S>,
    run_logger: Option<RunLogger>,
    uploaded: Option<UploadedFile>,
    form: PlanForm,
    phase: Phase,
    last_error: Option<String>,
}

impl<G: PlanGenerator, S: Slot> Orchestrator<G, S> {
    pub fn new(generator: G, store: PlanStore<S>) -> Self {
        Self {
            generator,
            store,
            run_logger: None,
            uploaded: None,
            form: PlanForm::default(),
            phase: Phase::Idle,
            last_error: None,
        }
    }

    pub fn with_run_logger(mut self, run_logger: RunLogger) -> Self {
        self.run_logger = Some(run_logger);
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_extracting(&self) -> bool {
        self.phase == Phase::ExtractingFile
    }

    pub fn is_generating(&self) -> bool {
        self.phase == Phase::GeneratingPlan
    }

    /// A UI disables its generate trigger while this is true.
    pub fn is_busy(&self) -> bool {
        self.is_extracting() || self.is_generating()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn uploaded_file(&self) -> Option<&UploadedFile> {
        self.uploaded.as_ref()
    }

    pub fn form(&self) -> &PlanForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut PlanForm {
        &mut self.form
    }

    pub fn plans(&self) -> &[LessonPlan] {
        self.store.plans()
    }

    pub fn selected_plan(&self) -> Option<&LessonPlan> {
        self.store.selected()
    }

    /// Replaces the current upload with the text of a new file.
    pub async fn upload(
        &mut self,
        name: &str,
        declared_type: &str,
        bytes: Vec<u8>,
    ) -> Result<&UploadedFile, LessonError> {
        self.last_error = None;
        self.uploaded = None;
        self.phase = Phase::ExtractingFile;

        let file_name = name.to_string();
        let mime = declared_type.to_string();
        let extracted =
            tokio::task::spawn_blocking(move || extract::extract(&file_name, &mime, &bytes))
                .await
                .unwrap_or_else(|e| Err(LessonError::extraction(name, e)));

        match extracted {
            Ok(text) => {
                self.phase = Phase::Idle;
                let file = self.uploaded.insert(UploadedFile {
                    name: name.to_string(),
                    extracted_text: text,
                });
                Ok(&*file)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Validates the form, calls the generator and stores the result as a
    /// new, selected plan.
    pub async fn generate(&mut self) -> Result<LessonPlan, LessonError> {
        let request = match self.validated_request() {
            Ok(request) => request,
            Err(e) => {
                self.phase = Phase::Idle;
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        self.last_error = None;
        self.phase = Phase::GeneratingPlan;
        info!(topic = %request.topic, subject = %request.subject, grade = %request.grade, "generating lesson plan");

        let started = Instant::now();
        let result = self.generator.generate(&request).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        let outcome = match &result {
            Ok(generated) => {
                let plan = self.store.create(&request.topic, &generated.text);
                self.store.select(&plan.id);
                self.phase = Phase::Idle;
                Ok(plan)
            }
            Err(e) => Err(e.clone()),
        };

        self.log_run(&request, result.as_ref().ok(), outcome.as_ref(), latency_ms);

        outcome.map_err(|e| self.fail(e))
    }

    pub fn select_plan(&mut self, id: &str) {
        self.store.select(id);
    }

    pub fn rename_plan(&mut self, id: &str, new_name: &str) -> bool {
        self.store.rename(id, new_name)
    }

    /// Deletes after confirmation. Returns whether a plan was removed.
    pub fn delete_plan(&mut self, id: &str, confirm: &dyn Confirm) -> bool {
        let Some(plan) = self.store.get(id) else {
            return false;
        };
        let prompt = format!("Bạn có chắc muốn xóa giáo án \"{}\" không?", plan.name);
        if !confirm.confirm(&prompt) {
            return false;
        }
        self.store.delete(id).is_some()
    }

    /// Empties the collection after confirmation.
    pub fn clear_plans(&mut self, confirm: &dyn Confirm) -> bool {
        if self.store.is_empty() || !confirm.confirm(CLEAR_ALL_PROMPT) {
            return false;
        }
        self.store.clear();
        true
    }

    fn validated_request(&self) -> Result<GenerationRequest, LessonError> {
        let file = self
            .uploaded
            .as_ref()
            .ok_or_else(|| LessonError::Validation(MISSING_FILE.to_string()))?;

        let subject = self.form.subject.trim();
        let grade = self.form.grade.trim();
        let topic = self.form.topic.trim();
        if subject.is_empty() || grade.is_empty() || topic.is_empty() {
            return Err(LessonError::Validation(MISSING_FIELDS.to_string()));
        }

        let duration = match self.form.duration.trim() {
            "" => DEFAULT_DURATION,
            d => d,
        };

        Ok(GenerationRequest {
            topic: topic.to_string(),
            subject: subject.to_string(),
            grade: grade.to_string(),
            duration: duration.to_string(),
            template_content: file.extracted_text.clone(),
        })
    }

    fn fail(&mut self, err: LessonError) -> LessonError {
        warn!(error = %err, "operation failed");
        self.phase = Phase::Error;
        self.last_error = Some(err.to_string());
        err
    }

    fn log_run(
        &self,
        request: &GenerationRequest,
        generated: Option<&GeneratedPlan>,
        outcome: Result<&LessonPlan, &LessonError>,
        latency_ms: u64,
    ) {
        let Some(logger) = &self.run_logger else {
            return;
        };

        let entry = GenerationLog {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            model: self.generator.model().to_string(),
            subject: request.subject.clone(),
            grade: request.grade.clone(),
            topic: request.topic.clone(),
            duration: request.duration.clone(),
            template_chars: request.template_content.chars().count(),
            latency_ms,
            input_tokens: generated.map(|g| g.input_tokens).unwrap_or(0),
            output_tokens: generated.map(|g| g.output_tokens).unwrap_or(0),
            plan_id: outcome.ok().map(|p| p.id.clone()),
            plan_chars: outcome.ok().map(|p| p.content.chars().count()).unwrap_or(0),
            error: outcome.err().map(|e| e.to_string()),
        };

        if let Err(e) = logger.write(&entry) {
            warn!(error = %e, "failed to write generation log");
        }
    }
}
