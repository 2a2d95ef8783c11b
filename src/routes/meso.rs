//! Meso routes
//!
//! Every route sits behind the auth middleware and only ever touches mesos
//! owned by the caller. Someone else's meso reads as not found.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    middleware,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{AuthMiddleware, AuthUser, TokenCodec};
use crate::database::models::{exercises_named, Day, Meso, MesoUpdate, NewMeso, Week};
use crate::routes::error::ApiError;
use crate::server::AppState;

/// Body of `POST /client-services/meso`: a name and the first week's days
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MesoCreateRequest {
    pub name: String,
    pub monday: Option<Day>,
    pub tuesday: Option<Day>,
    pub wednesday: Option<Day>,
    pub thursday: Option<Day>,
    pub friday: Option<Day>,
    pub saturday: Option<Day>,
    pub sunday: Option<Day>,
}

impl MesoCreateRequest {
    fn into_new_meso(self) -> Result<NewMeso, ApiError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }

        let days = [
            ("monday", self.monday),
            ("tuesday", self.tuesday),
            ("wednesday", self.wednesday),
            ("thursday", self.thursday),
            ("friday", self.friday),
            ("saturday", self.saturday),
            ("sunday", self.sunday),
        ];
        missing.extend(days.iter().filter(|(_, day)| day.is_none()).map(|(key, _)| *key));
        if !missing.is_empty() {
            return Err(ApiError::missing_keys(&missing));
        }

        let [monday, tuesday, wednesday, thursday, friday, saturday, sunday] =
            days.map(|(_, day)| day.unwrap_or_default());
        let week = Week {
            monday,
            tuesday,
            wednesday,
            thursday,
            friday,
            saturday,
            sunday,
        };

        let weeks = vec![week];
        if !exercises_named(&weeks) {
            return Err(ApiError::missing_keys(&["exercise"]));
        }

        Ok(NewMeso {
            name: self.name.trim().to_string(),
            weeks,
        })
    }
}

/// Body of `PUT /client-services/meso`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct MesoUpdateRequest {
    pub name: Option<String>,
    pub weeks: Option<Vec<Week>>,
}

impl MesoUpdateRequest {
    fn into_update(self) -> Result<MesoUpdate, ApiError> {
        if let Some(weeks) = &self.weeks {
            if !exercises_named(weeks) {
                return Err(ApiError::missing_keys(&["exercise"]));
            }
        }

        Ok(MesoUpdate {
            name: self
                .name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            weeks: self.weeks,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MesoIdQuery {
    #[serde(rename = "mesoUUID")]
    pub meso_uuid: Option<String>,
}

impl MesoIdQuery {
    fn meso_id(&self) -> Result<Uuid, ApiError> {
        let raw = self
            .meso_uuid
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .ok_or_else(|| ApiError::BadRequest("missing mesoUUID".to_string()))?;

        Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("invalid mesoUUID: {}", raw)))
    }
}

#[derive(Debug, Deserialize)]
pub struct TopQuery {
    pub count: Option<String>,
}

impl TopQuery {
    fn count(&self) -> Result<i64, ApiError> {
        self.count
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|count| *count > 0)
            .ok_or_else(|| ApiError::BadRequest("invalid number of mesos".to_string()))
    }
}

pub async fn create_meso(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<MesoCreateRequest>, JsonRejection>,
) -> Result<Json<Meso>, ApiError> {
    let Json(request) = payload?;
    let meso = state.mesos.create_meso(user.id, request.into_new_meso()?).await?;

    tracing::info!(uuid = %user.id, meso_uuid = %meso.id, "Created meso");
    Ok(Json(meso))
}

pub async fn read_meso(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<MesoIdQuery>, QueryRejection>,
) -> Result<Json<Meso>, ApiError> {
    let Query(query) = query?;
    let meso = state.mesos.read_meso(user.id, query.meso_id()?).await?;
    Ok(Json(meso))
}

pub async fn read_top_mesos(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<TopQuery>, QueryRejection>,
) -> Result<Json<Vec<Meso>>, ApiError> {
    let Query(query) = query?;
    let mesos = state.mesos.read_recent_mesos(user.id, query.count()?).await?;
    Ok(Json(mesos))
}

pub async fn update_meso(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<MesoIdQuery>, QueryRejection>,
    payload: Result<Json<MesoUpdateRequest>, JsonRejection>,
) -> Result<Json<Meso>, ApiError> {
    let Query(query) = query?;
    let meso_id = query.meso_id()?;
    let Json(request) = payload?;

    let meso = state
        .mesos
        .update_meso(user.id, meso_id, request.into_update()?)
        .await?;
    Ok(Json(meso))
}

pub async fn delete_meso(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<MesoIdQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let meso_id = query.meso_id()?;
    state.mesos.delete_meso(user.id, meso_id).await?;

    Ok(Json(json!({
        "message": format!("successfully deleted meso: {}", meso_id)
    })))
}

pub fn create_meso_routes(codec: Arc<TokenCodec>) -> Router<AppState> {
    Router::new()
        .route(
            "/client-services/meso",
            get(read_meso)
                .post(create_meso)
                .put(update_meso)
                .delete(delete_meso),
        )
        .route("/client-services/meso/top", get(read_top_mesos))
        .route_layer(middleware::from_fn_with_state(
            codec,
            AuthMiddleware::validate_token,
        ))
}

#[cfg(test)]
mod tests {
    use crate::server::testing::*;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    const MESO: &str = "/client-services/meso";

    fn empty_day() -> Value {
        json!({ "Lifts": [] })
    }

    fn create_body(name: &str) -> Value {
        json!({
            "Name": name,
            "Monday": { "Lifts": [{ "exercise": "squat", "sets": 3, "weight": 225.5, "reps": 5 }] },
            "Tuesday": empty_day(),
            "Wednesday": { "Lifts": [{ "exercise": "bench", "sets": 4, "reps": 8 }] },
            "Thursday": empty_day(),
            "Friday": empty_day(),
            "Saturday": empty_day(),
            "Sunday": empty_day(),
        })
    }

    async fn created(app: &axum::Router, token: &str, name: &str) -> String {
        let (status, body) = send(app, Method::POST, MESO, Some(token), Some(create_body(name))).await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["UUID"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_meso_lifecycle() {
        let (app, _, _) = test_app();
        let token = signed_up(&app, "alice").await;

        let (status, body) = send(&app, Method::POST, MESO, Some(&token), Some(create_body("Block A"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Name"], "Block A");
        assert_eq!(body["Weeks"].as_array().unwrap().len(), 1);
        assert_eq!(body["Weeks"][0]["Monday"]["Lifts"][0]["exercise"], "squat");
        assert_eq!(body["Weeks"][0]["Monday"]["Lifts"][0]["weight"], 225.5);
        let id = body["UUID"].as_str().unwrap().to_string();

        let uri = format!("{}?mesoUUID={}", MESO, id);
        let (status, body) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["UUID"], id);

        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "Name": "Block B" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Name"], "Block B");
        assert_eq!(body["Weeks"][0]["Wednesday"]["Lifts"][0]["exercise"], "bench");

        let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], format!("successfully deleted meso: {}", id));

        let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_weeks_and_blank_name() {
        let (app, _, _) = test_app();
        let token = signed_up(&app, "alice").await;
        let id = created(&app, &token, "Block A").await;
        let uri = format!("{}?mesoUUID={}", MESO, id);

        let week = json!({
            "Monday": { "Lifts": [{ "exercise": "press" }] },
            "Tuesday": empty_day(),
            "Wednesday": empty_day(),
            "Thursday": empty_day(),
            "Friday": empty_day(),
            "Saturday": empty_day(),
            "Sunday": empty_day(),
        });
        let (status, body) = send(
            &app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "Name": "  ", "Weeks": [week.clone(), week] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Name"], "Block A");
        assert_eq!(body["Weeks"].as_array().unwrap().len(), 2);
        assert_eq!(body["Weeks"][1]["Monday"]["Lifts"][0]["exercise"], "press");
    }

    #[tokio::test]
    async fn test_create_reports_missing_keys() {
        let (app, _, _) = test_app();
        let token = signed_up(&app, "alice").await;

        let (status, body) = send(
            &app,
            Method::POST,
            MESO,
            Some(&token),
            Some(json!({ "Monday": empty_day() })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"],
            "request is missing the following keys: name, tuesday, wednesday, thursday, friday, saturday, sunday"
        );

        let mut blank_lift = create_body("Block A");
        blank_lift["Friday"] = json!({ "Lifts": [{ "exercise": "" }] });
        let (status, body) = send(&app, Method::POST, MESO, Some(&token), Some(blank_lift)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "request is missing the following keys: exercise");
    }

    #[tokio::test]
    async fn test_meso_id_is_required_and_parsed() {
        let (app, _, _) = test_app();
        let token = signed_up(&app, "alice").await;

        let (status, body) = send(&app, Method::GET, MESO, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing mesoUUID");

        let (status, _) = send(&app, Method::DELETE, &format!("{}?mesoUUID=", MESO), Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::GET,
            &format!("{}?mesoUUID=not-a-uuid", MESO),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid mesoUUID: not-a-uuid");
    }

    #[tokio::test]
    async fn test_top_mesos_most_recent_first() {
        let (app, _, _) = test_app();
        let token = signed_up(&app, "alice").await;
        let first = created(&app, &token, "First").await;
        let second = created(&app, &token, "Second").await;
        let third = created(&app, &token, "Third").await;

        // touching the first moves it to the front
        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("{}?mesoUUID={}", MESO, first),
            Some(&token),
            Some(json!({ "Name": "First again" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/client-services/meso/top?count=2", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["UUID"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![first.as_str(), third.as_str()]);

        let (_, body) = send(&app, Method::GET, "/client-services/meso/top?count=10", Some(&token), None).await;
        assert_eq!(body.as_array().unwrap().len(), 3);
        assert_eq!(body[2]["UUID"], second);
    }

    #[tokio::test]
    async fn test_top_rejects_bad_count() {
        let (app, _, _) = test_app();
        let token = signed_up(&app, "alice").await;

        for uri in [
            "/client-services/meso/top",
            "/client-services/meso/top?count=0",
            "/client-services/meso/top?count=-3",
            "/client-services/meso/top?count=many",
        ] {
            let (status, body) = send(&app, Method::GET, uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"], "invalid number of mesos", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_mesos_are_scoped_to_owner() {
        let (app, _, _) = test_app();
        let alice = signed_up(&app, "alice").await;
        let bob = signed_up(&app, "bob").await;
        let id = created(&app, &alice, "Alice's block").await;
        let uri = format!("{}?mesoUUID={}", MESO, id);

        let (status, _) = send(&app, Method::GET, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::PUT, &uri, Some(&bob), Some(json!({ "Name": "mine" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = send(&app, Method::GET, "/client-services/meso/top?count=5", Some(&bob), None).await;
        assert_eq!(body, json!([]));

        let (status, body) = send(&app, Method::GET, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["Name"], "Alice's block");
    }

    #[tokio::test]
    async fn test_deleting_user_removes_their_mesos() {
        let (app, _, _) = test_app();
        let token = signed_up(&app, "alice").await;
        created(&app, &token, "Block A").await;

        let (status, _) = send(&app, Method::DELETE, "/client-services/user", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, Method::GET, "/client-services/meso/top?count=5", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
