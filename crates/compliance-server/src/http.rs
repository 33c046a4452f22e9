//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use compliance_core::commands::{
    role_options_for, AddIbcPersonnel, AddPublicationAuthor, AddTeamMember,
    ChangePublicationStatus, ConfirmCertificateBatch, CreateIbcApplication, CreatePublication,
    ProcessCertificateBatch, RemovePublicationAuthor, RemoveTeamMember, SaveBoardMember,
    SaveBuilding, SaveCertificationModule, SaveResearchActivity, SaveRoom, SaveScientist,
    StatusChange, TransitionIbcApplication,
};
use compliance_core::team::RoleOptions;
use compliance_core::{
    ibc_workflow, publication_workflow, CertificateCandidate, CertificationMatrix, Command,
    ComplianceError, TransitionOption, Workflow, WorkflowState,
};
use compliance_domain::{
    new_id, BoardRole, Building, CertificationModule, IbcApplication, IbcBoardMember,
    IbcPersonnel, ManuscriptHistory, PdfImportRecord, ProjectMember, Publication,
    PublicationAuthor, ResearchActivity, Room, Scientist,
};

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = Result<T, ApiError>;
type Created<T> = (StatusCode, Json<T>);

fn not_found(what: impl std::fmt::Display) -> ApiError {
    ApiError::from(ComplianceError::NotFound(what.to_string()))
}

/// Overlay a JSON object onto a record and read the record back
fn merge<T>(base: &T, patch: Map<String, Value>) -> ApiResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut value = serde_json::to_value(base)?;
    if let Value::Object(fields) = &mut value {
        fields.extend(patch);
    }
    Ok(serde_json::from_value(value)?)
}

/// Build a new record from a request body. The id always comes from `template`.
fn create_from<T>(template: T, mut body: Map<String, Value>) -> ApiResult<T>
where
    T: Serialize + DeserializeOwned,
{
    body.remove("id");
    merge(&template, body)
}

/// Next statuses from the current one, with what each requires
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionsResponse<S: Serialize> {
    pub current: S,
    pub terminal: bool,
    pub options: Vec<TransitionOption<S>>,
}

fn transitions<S: WorkflowState + Serialize>(workflow: &Workflow<S>, current: S) -> TransitionsResponse<S> {
    TransitionsResponse {
        current,
        terminal: workflow.is_terminal(current),
        options: workflow.options(current),
    }
}

// ==================== System ====================

pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": compliance_core::version(),
    }))
}

// ==================== Scientists ====================

pub async fn list_scientists(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Scientist>>> {
    state.with_repo(|repo| repo.list_scientists()).map(Json)
}

pub async fn get_scientist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Scientist>> {
    state
        .with_repo(|repo| repo.get_scientist(&id))?
        .map(Json)
        .ok_or_else(|| not_found(format!("Scientist {}", id)))
}

pub async fn create_scientist(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<Scientist>> {
    let scientist = create_from(
        Scientist {
            id: new_id(),
            ..Default::default()
        },
        body,
    )?;
    let scientist = state.with_repo(|repo| SaveScientist { scientist }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(scientist)))
}

pub async fn update_scientist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut patch): Json<Map<String, Value>>,
) -> ApiResult<Json<Scientist>> {
    patch.remove("id");
    state
        .with_repo(|repo| -> ApiResult<Scientist> {
            let existing = repo
                .get_scientist(&id)?
                .ok_or_else(|| not_found(format!("Scientist {}", id)))?;
            let scientist = merge(&existing, patch)?;
            Ok(SaveScientist { scientist }.execute(repo)?)
        })
        .map(Json)
}

// ==================== Research Activities ====================

pub async fn list_research_activities(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ResearchActivity>>> {
    state.with_repo(|repo| repo.list_research_activities()).map(Json)
}

pub async fn get_research_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResearchActivity>> {
    state
        .with_repo(|repo| repo.get_research_activity(&id))?
        .map(Json)
        .ok_or_else(|| not_found(format!("Research activity {}", id)))
}

pub async fn create_research_activity(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<ResearchActivity>> {
    let activity = create_from(ResearchActivity::new("", ""), body)?;
    let activity = state.with_repo(|repo| SaveResearchActivity { activity }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ProjectMember>>> {
    state
        .with_repo(|repo| {
            if repo.get_research_activity(&id)?.is_none() {
                return Err(ComplianceError::NotFound(format!("Research activity {}", id)));
            }
            repo.list_members(&id)
        })
        .map(Json)
}

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut request): Json<AddTeamMember>,
) -> ApiResult<Created<ProjectMember>> {
    request.research_activity_id = id;
    let member = state.with_repo(|repo| request.execute(repo))?;
    Ok((StatusCode::CREATED, Json(member)))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((id, member_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.with_repo(|repo| {
        RemoveTeamMember {
            research_activity_id: id,
            member_id,
        }
        .execute(repo)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleOptionsQuery {
    pub scientist_id: String,
}

pub async fn member_role_options(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<RoleOptionsQuery>,
) -> ApiResult<Json<RoleOptions>> {
    state
        .with_repo(|repo| role_options_for(repo, &id, &query.scientist_id))
        .map(Json)
}

// ==================== IBC ====================

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

pub async fn list_ibc_applications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<Vec<IbcApplication>>> {
    state
        .with_repo(|repo| repo.list_ibc_applications(query.status.as_deref()))
        .map(Json)
}

pub async fn get_ibc_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<IbcApplication>> {
    state
        .with_repo(|repo| repo.get_ibc_application(&id))?
        .map(Json)
        .ok_or_else(|| not_found(format!("IBC application {}", id)))
}

pub async fn create_ibc_application(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<IbcApplication>> {
    let application = create_from(IbcApplication::new("", ""), body)?;
    let application = state.with_repo(|repo| CreateIbcApplication { application }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(application)))
}

/// PATCH body: `{"status", "comment", "reviewerIds", "user"}`
pub async fn transition_ibc_application(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut request): Json<TransitionIbcApplication>,
) -> ApiResult<Json<IbcApplication>> {
    request.application_id = id;
    tracing::debug!(application = %request.application_id, to = %request.to, "IBC transition requested");
    state.with_repo(|repo| request.execute(repo)).map(Json)
}

pub async fn ibc_transitions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TransitionsResponse<compliance_domain::IbcStatus>>> {
    let app = state
        .with_repo(|repo| repo.get_ibc_application(&id))?
        .ok_or_else(|| not_found(format!("IBC application {}", id)))?;
    Ok(Json(transitions(ibc_workflow(), app.status)))
}

pub async fn list_personnel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<IbcPersonnel>>> {
    state.with_repo(|repo| repo.list_personnel(&id)).map(Json)
}

pub async fn add_personnel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut request): Json<AddIbcPersonnel>,
) -> ApiResult<Created<IbcPersonnel>> {
    request.application_id = id;
    let personnel = state.with_repo(|repo| request.execute(repo))?;
    Ok((StatusCode::CREATED, Json(personnel)))
}

pub async fn list_board_members(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<IbcBoardMember>>> {
    state.with_repo(|repo| repo.list_board_members()).map(Json)
}

pub async fn create_board_member(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<IbcBoardMember>> {
    let member = create_from(
        IbcBoardMember {
            id: new_id(),
            scientist_id: String::new(),
            role: BoardRole::Member,
            expertise: Vec::new(),
            is_active: true,
            term_end_date: None,
        },
        body,
    )?;
    let member = state.with_repo(|repo| SaveBoardMember { member }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(member)))
}

// ==================== Publications ====================

pub async fn list_publications(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Publication>>> {
    state.with_repo(|repo| repo.list_publications()).map(Json)
}

pub async fn get_publication(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Publication>> {
    state
        .with_repo(|repo| repo.get_publication(&id))?
        .map(Json)
        .ok_or_else(|| not_found(format!("Publication {}", id)))
}

pub async fn create_publication(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<Publication>> {
    let publication = create_from(Publication::new(""), body)?;
    let publication = state.with_repo(|repo| CreatePublication { publication }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(publication)))
}

pub async fn list_authors(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<PublicationAuthor>>> {
    state.with_repo(|repo| repo.list_authors(&id)).map(Json)
}

pub async fn add_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut request): Json<AddPublicationAuthor>,
) -> ApiResult<Created<PublicationAuthor>> {
    request.publication_id = id;
    let author = state.with_repo(|repo| request.execute(repo))?;
    Ok((StatusCode::CREATED, Json(author)))
}

pub async fn remove_author(
    State(state): State<Arc<AppState>>,
    Path((id, scientist_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state.with_repo(|repo| {
        RemovePublicationAuthor {
            publication_id: id,
            scientist_id,
        }
        .execute(repo)
    })?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH body: `{"status", "fields": {name: value}, "changedBy"}`
pub async fn change_publication_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut request): Json<ChangePublicationStatus>,
) -> ApiResult<Json<StatusChange>> {
    request.publication_id = id;
    state.with_repo(|repo| request.execute(repo)).map(Json)
}

pub async fn publication_transitions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<TransitionsResponse<compliance_domain::PublicationStatus>>> {
    let publication = state
        .with_repo(|repo| repo.get_publication(&id))?
        .ok_or_else(|| not_found(format!("Publication {}", id)))?;
    Ok(Json(transitions(publication_workflow(), publication.status)))
}

pub async fn publication_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ManuscriptHistory>>> {
    state
        .with_repo(|repo| {
            if repo.get_publication(&id)?.is_none() {
                return Err(ComplianceError::NotFound(format!("Publication {}", id)));
            }
            repo.history_for(&id)
        })
        .map(Json)
}

// ==================== Facilities ====================

pub async fn list_buildings(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Building>>> {
    state.with_repo(|repo| repo.list_buildings()).map(Json)
}

pub async fn create_building(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<Building>> {
    let building = create_from(Building::new(""), body)?;
    let building = state.with_repo(|repo| SaveBuilding { building }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(building)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomQuery {
    pub building_id: Option<String>,
}

pub async fn list_rooms(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RoomQuery>,
) -> ApiResult<Json<Vec<Room>>> {
    state
        .with_repo(|repo| repo.list_rooms(query.building_id.as_deref()))
        .map(Json)
}

pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Room>> {
    state
        .with_repo(|repo| repo.get_room(&id))?
        .map(Json)
        .ok_or_else(|| not_found(format!("Room {}", id)))
}

pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<Room>> {
    let room = create_from(Room::new("", ""), body)?;
    let room = state.with_repo(|repo| SaveRoom { room }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(room)))
}

pub async fn update_room(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut patch): Json<Map<String, Value>>,
) -> ApiResult<Json<Room>> {
    patch.remove("id");
    state
        .with_repo(|repo| -> ApiResult<Room> {
            let existing = repo
                .get_room(&id)?
                .ok_or_else(|| not_found(format!("Room {}", id)))?;
            let room = merge(&existing, patch)?;
            Ok(SaveRoom { room }.execute(repo)?)
        })
        .map(Json)
}

// ==================== Certifications ====================

pub async fn list_modules(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CertificationModule>>> {
    state.with_repo(|repo| repo.list_modules()).map(Json)
}

pub async fn create_module(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<Created<CertificationModule>> {
    let module = create_from(CertificationModule::new(""), body)?;
    let module = state.with_repo(|repo| SaveCertificationModule { module }.execute(repo))?;
    Ok((StatusCode::CREATED, Json(module)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixQuery {
    /// Defaults to today (UTC)
    pub as_of: Option<NaiveDate>,
}

pub async fn certification_matrix(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatrixQuery>,
) -> ApiResult<Json<CertificationMatrix>> {
    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let window = state.config.certification.expiring_window_days;
    state
        .with_repo(|repo| -> compliance_core::Result<CertificationMatrix> {
            Ok(CertificationMatrix::build(
                &repo.list_scientists()?,
                &repo.list_modules()?,
                &repo.list_certificates()?,
                today,
                window,
            ))
        })
        .map(Json)
}

#[derive(Debug, Serialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<CertificateCandidate>,
}

pub async fn process_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProcessCertificateBatch>,
) -> ApiResult<Json<CandidatesResponse>> {
    let candidates = state.with_repo(|repo| request.execute(repo))?;
    Ok(Json(CandidatesResponse { candidates }))
}

pub async fn confirm_batch(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfirmCertificateBatch>,
) -> ApiResult<Created<Vec<PdfImportRecord>>> {
    let records = state.with_repo(|repo| request.execute(repo))?;
    Ok((StatusCode::CREATED, Json(records)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    50
}

pub async fn import_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<PdfImportRecord>>> {
    state
        .with_repo(|repo| repo.list_import_records(query.limit))
        .map(Json)
}
