//! JSON REST API for Satchel.
//!
//! Exposes an axum [`Router`] backed by any
//! [`satchel_core::store::SchoolStore`]. Transport concerns (bind address,
//! static files, tracing middleware) are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", satchel_api::api_router(store.clone()))
//! ```

pub mod categories;
pub mod category_needs;
pub mod devices;
pub mod error;
pub mod forms;
pub mod import;
pub mod needs;
pub mod profile;
pub mod pupil_categories;
pub mod pupils;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use satchel_core::store::SchoolStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SchoolStore + 'static,
{
  Router::new()
    // Pupils
    .route("/pupils", get(pupils::list::<S>).post(pupils::create::<S>))
    .route("/pupils/search", get(pupils::search::<S>))
    .route("/pupils/upload", post(import::upload_csv::<S>))
    .route("/pupils/profile", get(profile::get_profile::<S>))
    .route(
      "/pupils/{id}",
      get(pupils::get_one::<S>)
        .put(pupils::update::<S>)
        .patch(pupils::update_partial::<S>)
        .delete(pupils::delete_one::<S>),
    )
    // Forms
    .route("/forms", get(forms::list::<S>).post(forms::create::<S>))
    .route("/forms/{id}", get(forms::get_one::<S>))
    // Needs
    .route("/needs", get(needs::list::<S>).post(needs::create::<S>))
    .route(
      "/needs/{id}",
      get(needs::get_one::<S>)
        .put(needs::update::<S>)
        .delete(needs::delete_one::<S>),
    )
    .route("/needs/{id}/categories", get(needs::categories::<S>))
    .route("/needs/{id}/devices", get(needs::devices::<S>))
    // Categories
    .route(
      "/categories",
      get(categories::list::<S>).post(categories::create::<S>),
    )
    .route(
      "/categories/{id}",
      get(categories::get_one::<S>)
        .put(categories::update::<S>)
        .delete(categories::delete_one::<S>),
    )
    .route("/categories/{id}/needs", get(categories::needs::<S>))
    // Category-need membership
    .route("/category-needs", post(category_needs::add::<S>))
    .route(
      "/category-needs/{categoryId}/{needId}",
      delete(category_needs::remove::<S>),
    )
    // Pupil categories, overrides, and the effective-needs resolution
    .route(
      "/pupil-categories/assign-category",
      post(pupil_categories::assign::<S>),
    )
    .route(
      "/pupil-categories/{pupilId}/categories",
      get(pupil_categories::list::<S>),
    )
    .route(
      "/pupil-categories/{pupilId}/categories/{categoryId}",
      delete(pupil_categories::remove::<S>),
    )
    .route(
      "/pupil-categories/{pupilId}/effective-needs",
      get(pupil_categories::effective_needs::<S>),
    )
    .route(
      "/pupil-categories/{pupilId}/need-overrides",
      get(pupil_categories::list_overrides::<S>),
    )
    .route(
      "/pupil-categories/need-override",
      post(pupil_categories::add_override::<S>),
    )
    .route(
      "/pupil-categories/need-override/{overrideId}",
      axum::routing::put(pupil_categories::update_override::<S>)
        .delete(pupil_categories::remove_override::<S>),
    )
    // Devices
    .route(
      "/devices",
      get(devices::list::<S>).post(devices::create::<S>),
    )
    .route("/devices/unassigned", get(devices::unassigned::<S>))
    .route(
      "/devices/{id}",
      get(devices::get_one::<S>)
        .put(devices::update::<S>)
        .delete(devices::delete_one::<S>),
    )
    .route("/need-devices", post(devices::assign_to_need::<S>))
    .route(
      "/need-devices/{needId}/{deviceId}",
      delete(devices::remove_from_need::<S>),
    )
    .with_state(store)
}

#[cfg(test)]
mod tests;
