//! Inventory handlers.
//!
//! Browsing (`/inv/type`, `/inv/detail`, `/inv/getInventory`) is public; the
//! management screens and every write are mounted behind the staff gate.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{Datelike, Utc};
use motors_core::models::{Classification, Vehicle};
use motors_core::store::StoreError;
use motors_core::validation::{
    ClassificationInput, VehicleInput, VehicleRef, parse_id, validate_classification,
    validate_vehicle,
};
use serde_json::json;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::FormOrJson;
use crate::middleware::identity::CurrentIdentity;
use crate::middleware::negotiate::ResponseFormat;
use crate::services::session::Session;
use crate::views::Page;

/// Staff landing page.
pub const MANAGEMENT: &str = "/inv/";

fn classification_id(raw: &str) -> AppResult<i32> {
    parse_id(raw).ok_or_else(|| AppError::Validation("Invalid classification id.".into()))
}

fn inventory_id(raw: &str) -> AppResult<i32> {
    parse_id(raw).ok_or_else(|| AppError::Validation("Invalid vehicle id.".into()))
}

fn vehicle_not_found() -> AppError {
    AppError::NotFound("Sorry, that vehicle could not be found.".into())
}

async fn load_vehicle(state: &AppState, inv_id: i32) -> AppResult<Vehicle> {
    state
        .inventory
        .vehicle(inv_id)
        .await?
        .ok_or_else(vehicle_not_found)
}

/// Form values echoed back into a form, including every raw field.
fn vehicle_sticky(input: &VehicleInput) -> serde_json::Value {
    serde_json::to_value(input).unwrap_or_default()
}

fn vehicle_form_values(vehicle: &Vehicle) -> serde_json::Value {
    json!({
        "inv_id": vehicle.inv_id,
        "classification_id": vehicle.classification_id,
        "inv_make": vehicle.make,
        "inv_model": vehicle.model,
        "inv_year": vehicle.year,
        "inv_description": vehicle.description,
        "inv_image": vehicle.image,
        "inv_thumbnail": vehicle.thumbnail,
        "inv_price": vehicle.price,
        "inv_miles": vehicle.miles,
        "inv_color": vehicle.color,
    })
}

/// Success for a staff write: JSON acknowledgement or notice plus redirect.
fn done(session: &Session, format: ResponseFormat, message: String, extra: serde_json::Value) -> Response {
    match format {
        ResponseFormat::Json => {
            let mut body = json!({ "ok": true, "message": message });
            if let (Some(body), serde_json::Value::Object(extra)) = (body.as_object_mut(), extra) {
                body.extend(extra);
            }
            Json(body).into_response()
        }
        ResponseFormat::Html => {
            session.push_notice(message);
            Redirect::to(MANAGEMENT).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Public browsing
// ---------------------------------------------------------------------------

/// `GET /inv/type/{classification_id}`
pub async fn by_classification(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let classification_id = classification_id(&raw_id)?;
    let vehicles = state.inventory.vehicles_by_classification(classification_id).await?;

    let name = match vehicles.first() {
        Some(v) => Some(v.classification_name.clone()),
        None => state
            .inventory
            .classifications()
            .await?
            .into_iter()
            .find(|c| c.classification_id == classification_id)
            .map(|c| c.classification_name),
    };
    let Some(name) = name else {
        return Err(AppError::NotFound("That classification does not exist.".into()));
    };

    Ok(Page::new(format!("{name} vehicles"))
        .notices(session.take_notices())
        .data(json!({
            "classification_id": classification_id,
            "classification_name": name,
            "vehicles": vehicles,
        }))
        .render(format))
}

/// `GET /inv/detail/{inv_id}`
pub async fn detail(
    State(state): State<AppState>,
    current: CurrentIdentity,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let inv_id = inventory_id(&raw_id)?;
    let vehicle = load_vehicle(&state, inv_id).await?;
    let is_favorite = match current.identity() {
        Some(identity) => state.favorites.contains(identity.sub, inv_id).await?,
        None => false,
    };

    Ok(Page::new(vehicle.title())
        .notices(session.take_notices())
        .data(json!({
            "vehicle": vehicle,
            "is_favorite": is_favorite,
            "logged_in": current.is_authenticated(),
        }))
        .render(format))
}

/// `GET /inv/getInventory/{classification_id}` — vehicles as JSON.
pub async fn inventory_json(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Vec<Vehicle>>> {
    let classification_id = classification_id(&raw_id)?;
    Ok(Json(
        state.inventory.vehicles_by_classification(classification_id).await?,
    ))
}

// ---------------------------------------------------------------------------
// Staff management
// ---------------------------------------------------------------------------

/// `GET /inv/`
pub async fn management(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
) -> AppResult<Response> {
    let classifications = state.inventory.classifications().await?;
    Ok(Page::new("Vehicle Management")
        .notices(session.take_notices())
        .data(json!({ "classifications": classifications }))
        .render(format))
}

/// `GET /inv/add-classification`
pub async fn add_classification_page(session: Session, format: ResponseFormat) -> Response {
    Page::new("Add New Classification")
        .notices(session.take_notices())
        .data(json!({ "classification_name": "" }))
        .render(format)
}

/// `POST /inv/add-classification`
pub async fn add_classification(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    FormOrJson(input): FormOrJson<ClassificationInput>,
) -> AppResult<Response> {
    let form_page = |status: StatusCode, errors: Vec<String>| {
        Page::new("Add New Classification")
            .status(status)
            .errors(errors)
            .data(json!({ "classification_name": input.classification_name.trim() }))
            .render(format)
    };

    let name = match validate_classification(&input) {
        Ok(name) => name,
        Err(errors) => return Ok(form_page(StatusCode::BAD_REQUEST, errors.messages())),
    };

    match state.inventory.add_classification(&name).await {
        Ok(classification) => Ok(done(
            &session,
            format,
            format!("Classification \"{}\" added.", classification.classification_name),
            json!({ "classification": classification }),
        )),
        Err(e @ StoreError::DuplicateClassification(_)) => {
            let message = AppError::from(e).public_message().to_string();
            Ok(form_page(StatusCode::CONFLICT, vec![message]))
        }
        Err(e) => Err(e.into()),
    }
}

async fn vehicle_form_page(
    state: &AppState,
    title: String,
    status: StatusCode,
    errors: Vec<String>,
    values: serde_json::Value,
    format: ResponseFormat,
) -> AppResult<Response> {
    let classifications: Vec<Classification> = state.inventory.classifications().await?;
    Ok(Page::new(title)
        .status(status)
        .errors(errors)
        .data(json!({ "classifications": classifications, "vehicle": values }))
        .render(format))
}

/// `GET /inv/add-inventory`
pub async fn add_inventory_page(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
) -> AppResult<Response> {
    let classifications = state.inventory.classifications().await?;
    Ok(Page::new("Add New Vehicle")
        .notices(session.take_notices())
        .data(json!({
            "classifications": classifications,
            "vehicle": vehicle_sticky(&VehicleInput {
                inv_image: "/images/vehicles/no-image.png".into(),
                inv_thumbnail: "/images/vehicles/no-image-tn.png".into(),
                ..VehicleInput::default()
            }),
        }))
        .render(format))
}

/// `POST /inv/add-inventory`
pub async fn add_inventory(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    FormOrJson(input): FormOrJson<VehicleInput>,
) -> AppResult<Response> {
    let title = "Add New Vehicle".to_string();
    let form = match validate_vehicle(&input, Utc::now().year()) {
        Ok(form) => form,
        Err(errors) => {
            return vehicle_form_page(
                &state,
                title,
                StatusCode::BAD_REQUEST,
                errors.messages(),
                vehicle_sticky(&input),
                format,
            )
            .await;
        }
    };

    match state.inventory.add_vehicle(&form).await {
        Ok(vehicle) => Ok(done(
            &session,
            format,
            format!("Added {}.", vehicle.title()),
            json!({ "vehicle": vehicle }),
        )),
        Err(StoreError::NotFound(_)) => {
            vehicle_form_page(
                &state,
                title,
                StatusCode::BAD_REQUEST,
                vec!["Classification is invalid.".into()],
                vehicle_sticky(&input),
                format,
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /inv/edit/{inv_id}`
pub async fn edit_page(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let vehicle = load_vehicle(&state, inventory_id(&raw_id)?).await?;
    let classifications = state.inventory.classifications().await?;
    Ok(Page::new(format!("Edit {} {}", vehicle.make, vehicle.model))
        .notices(session.take_notices())
        .data(json!({
            "classifications": classifications,
            "vehicle": vehicle_form_values(&vehicle),
        }))
        .render(format))
}

/// `POST /inv/update`
pub async fn update_inventory(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    FormOrJson(input): FormOrJson<VehicleInput>,
) -> AppResult<Response> {
    let inv_id = inventory_id(&input.inv_id)?;
    let title = format!("Edit {} {}", input.inv_make.trim(), input.inv_model.trim());

    let form = match validate_vehicle(&input, Utc::now().year()) {
        Ok(form) => form,
        Err(errors) => {
            return vehicle_form_page(
                &state,
                title,
                StatusCode::BAD_REQUEST,
                errors.messages(),
                vehicle_sticky(&input),
                format,
            )
            .await;
        }
    };

    match state.inventory.update_vehicle(inv_id, &form).await {
        Ok(Some(vehicle)) => Ok(done(
            &session,
            format,
            format!("The {} {} was successfully updated.", vehicle.make, vehicle.model),
            json!({ "vehicle": vehicle }),
        )),
        Ok(None) => Err(vehicle_not_found()),
        Err(StoreError::NotFound(_)) => {
            vehicle_form_page(
                &state,
                title,
                StatusCode::BAD_REQUEST,
                vec!["Classification is invalid.".into()],
                vehicle_sticky(&input),
                format,
            )
            .await
        }
        Err(e) => Err(e.into()),
    }
}

/// `GET /inv/delete/{inv_id}` — confirmation view.
pub async fn delete_page(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    Path(raw_id): Path<String>,
) -> AppResult<Response> {
    let vehicle = load_vehicle(&state, inventory_id(&raw_id)?).await?;
    Ok(Page::new(format!("Delete {} {}", vehicle.make, vehicle.model))
        .notices(session.take_notices())
        .data(json!({ "vehicle": vehicle_form_values(&vehicle) }))
        .render(format))
}

/// `POST /inv/delete`
pub async fn delete_inventory(
    State(state): State<AppState>,
    session: Session,
    format: ResponseFormat,
    FormOrJson(input): FormOrJson<VehicleRef>,
) -> AppResult<Response> {
    let inv_id = inventory_id(&input.inv_id)?;
    if state.inventory.delete_vehicle(inv_id).await? {
        tracing::info!(inv_id, "vehicle deleted");
        return Ok(done(
            &session,
            format,
            "The vehicle was successfully deleted.".into(),
            json!({ "inv_id": inv_id }),
        ));
    }

    match format {
        ResponseFormat::Json => Err(vehicle_not_found()),
        ResponseFormat::Html => {
            session.push_notice("Sorry, the delete failed.");
            Ok(Redirect::to(&format!("/inv/delete/{inv_id}")).into_response())
        }
    }
}
