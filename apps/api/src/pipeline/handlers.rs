use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::RenderedPdf;
use crate::pipeline::{CustomizationOutcome, Interaction};
use crate::state::AppState;

pub const MISSING_INPUT: &str = "Upload resume and enter job description to get started";

/// Fields accepted by the multipart endpoints.
#[derive(Debug, Default)]
pub struct ResumeForm {
    pub resume: Option<Bytes>,
    pub job_description: String,
    pub notes: String,
    pub edited_html: Option<String>,
}

impl ResumeForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ResumeForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "resume" => {
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::Validation(format!("Invalid resume upload: {e}")))?;
                    if !data.is_empty() {
                        form.resume = Some(data);
                    }
                }
                "job_description" | "notes" | "edited_html" => {
                    let text = field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
                    match name.as_str() {
                        "job_description" => form.job_description = text,
                        "notes" => form.notes = text,
                        _ => form.edited_html = Some(text),
                    }
                }
                // Unknown fields are ignored.
                _ => {}
            }
        }
        Ok(form)
    }

    /// Both a resume and a non-blank job description are required to start.
    pub fn require_inputs(&self) -> Result<Bytes, AppError> {
        match &self.resume {
            Some(document) if !self.job_description.trim().is_empty() => Ok(document.clone()),
            _ => Err(AppError::Validation(MISSING_INPUT.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub html: String,
    #[serde(default)]
    pub interaction_id: Option<Uuid>,
}

fn pdf_response(pdf: RenderedPdf) -> Response {
    (
        [
            (header::CONTENT_TYPE, RenderedPdf::MIME_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", RenderedPdf::FILE_NAME),
            ),
        ],
        pdf.bytes,
    )
        .into_response()
}

/// POST /api/v1/resumes/customize
pub async fn handle_customize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CustomizationOutcome>, AppError> {
    let form = ResumeForm::from_multipart(multipart).await?;
    let document = form.require_inputs()?;

    let mut interaction = Interaction::new();
    info!(interaction = %interaction.id, "Customizing {} byte resume", document.len());
    let outcome = state
        .pipeline
        .customize(&mut interaction, document, &form.job_description, &form.notes)
        .await?;
    Ok(Json(outcome))
}

/// POST /api/v1/resumes/render
pub async fn handle_render(
    State(state): State<AppState>,
    Json(req): Json<RenderRequest>,
) -> Result<Response, AppError> {
    if req.html.trim().is_empty() {
        return Err(AppError::Validation("html must not be empty".to_string()));
    }

    let mut interaction = Interaction::resume_edit(req.interaction_id);
    let pdf = state.pipeline.render(&mut interaction, req.html).await?;
    Ok(pdf_response(pdf))
}

/// POST /api/v1/resumes/generate
pub async fn handle_generate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = ResumeForm::from_multipart(multipart).await?;
    let document = form.require_inputs()?;

    let mut interaction = Interaction::new();
    let pdf = state
        .pipeline
        .run(
            &mut interaction,
            document,
            &form.job_description,
            &form.notes,
            form.edited_html,
        )
        .await?;
    Ok(pdf_response(pdf))
}
