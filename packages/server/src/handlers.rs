//! HTTP handler functions for the disaster report API.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use disaster_report_incident_models::Incident;
use disaster_report_server_models::{
    ApiError, ApiHealth, CreateIncidentRequest, IncidentQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}

/// `GET /api/incidents`
///
/// Lists incidents newest first, filtered by the optional `types`,
/// `severities`, `startDate` and `endDate` parameters.
pub async fn list_incidents(
    state: web::Data<AppState>,
    query: web::Query<Vec<(String, String)>>,
) -> HttpResponse {
    let params = IncidentQueryParams::from_pairs(&query);
    let filters = params.to_filter_criteria();

    let incidents = state.incidents.list(&filters);
    log::debug!("Listing {} incidents for {params:?}", incidents.len());

    HttpResponse::Ok().json(incidents)
}

/// `POST /api/incidents`
///
/// Validates the report, assigns an id and timestamp, and stores it.
pub async fn create_incident(
    state: web::Data<AppState>,
    body: web::Json<CreateIncidentRequest>,
) -> HttpResponse {
    let Some(draft) = body.into_inner().into_draft() else {
        return HttpResponse::BadRequest().json(ApiError::new("Missing required fields"));
    };

    let new_incident = match draft.validate() {
        Ok(new_incident) => new_incident,
        Err(e) => {
            log::debug!("Rejected incident: {e}");
            return HttpResponse::BadRequest().json(ApiError::new(e.to_string()));
        }
    };

    let incident = Incident::from_new(new_incident, uuid::Uuid::new_v4().to_string(), Utc::now());

    match state.incidents.insert(incident.clone()) {
        Ok(()) => {
            log::info!(
                "Created {} incident {} ({})",
                incident.incident_type,
                incident.id,
                incident.severity
            );
            HttpResponse::Created().json(incident)
        }
        Err(e) => {
            log::error!("Failed to create incident: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Failed to create incident"))
        }
    }
}
