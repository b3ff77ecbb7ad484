use crate::api::types::Response;
use crate::app::Engine;
use crate::services::responses::validator::Submission;
use actix_web::{get, post, web, HttpResponse};

#[get("/{slug}")]
pub async fn get_public_form(engine: web::Data<Engine>, slug: web::Path<String>) -> Response {
    let form = engine.resolve_public_form(&slug).await?;

    Ok(HttpResponse::Ok().json(form))
}

#[post("/{slug}/responses")]
pub async fn submit_responses(
    engine: web::Data<Engine>,
    slug: web::Path<String>,
    submission: web::Json<Submission>,
) -> Response {
    let receipt = engine.submit_responses(&slug, &submission).await?;

    Ok(HttpResponse::Created().json(receipt))
}
