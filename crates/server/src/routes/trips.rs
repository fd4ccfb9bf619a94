//! Trip history and saved-trip handlers.

use actix_web::{delete as delete_route, get, post, web};
use tripbuddy_core::api::{
    DeleteTripRequest, DeleteTripResponse, IncomingTrip, TripHistory, TripWriteRequest, TripWriteResponse,
};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn write_parts(body: TripWriteRequest) -> ApiResult<(String, IncomingTrip)> {
    match (body.user_id.filter(|u| !u.trim().is_empty()), body.trip_data) {
        (Some(user_id), Some(trip)) => Ok((user_id, trip)),
        _ => Err(ApiError::BadRequest("User ID and trip data are required.".into())),
    }
}

#[get("/history/{user_id}")]
pub async fn history(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<web::Json<TripHistory>> {
    let trips = state.trips.history(&path.into_inner()).await?;
    Ok(web::Json(TripHistory { count: trips.len(), trips }))
}

#[post("/trip/add")]
pub async fn add(state: web::Data<AppState>, body: web::Json<TripWriteRequest>) -> ApiResult<web::Json<TripWriteResponse>> {
    let (user_id, trip) = write_parts(body.into_inner())?;
    let trip = state.trips.add(&user_id, trip).await?;
    Ok(web::Json(TripWriteResponse {
        success: true,
        trip,
        created: true,
        message: "Trip added successfully".into(),
    }))
}

/// Idempotent on `(userId, tripData.id)`: a repeated sync returns the stored record.
#[post("/trip/sync")]
pub async fn sync(state: web::Data<AppState>, body: web::Json<TripWriteRequest>) -> ApiResult<web::Json<TripWriteResponse>> {
    let (user_id, trip) = write_parts(body.into_inner())?;
    let (trip, created) = state.trips.sync(&user_id, trip).await?;
    let message = if created { "Trip synced successfully" } else { "Trip already synced" };
    Ok(web::Json(TripWriteResponse { success: true, trip, created, message: message.into() }))
}

#[delete_route("/trip/{trip_id}")]
pub async fn delete(
    state: web::Data<AppState>, path: web::Path<String>, body: Option<web::Json<DeleteTripRequest>>,
) -> ApiResult<web::Json<DeleteTripResponse>> {
    let trip_id = path.into_inner();
    let user_id = body
        .and_then(|b| b.into_inner().user_id)
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Trip ID and User ID are required.".into()))?;

    state.trips.delete(&user_id, &trip_id).await?;
    Ok(web::Json(DeleteTripResponse { success: true, message: "Trip deleted successfully".into() }))
}
