use crate::api::types::Response;
use crate::app::Engine;
use actix_web::{get, web, HttpResponse};
use charybdis::types::Uuid;
use serde::Deserialize;

#[derive(Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[get("/{id}/responses")]
pub async fn get_responses(engine: web::Data<Engine>, id: web::Path<Uuid>, page: web::Query<PageParams>) -> Response {
    let page = engine.list_responses(id.into_inner(), page.limit, page.offset).await?;

    Ok(HttpResponse::Ok().json(page))
}

#[get("/{id}/responses/{response_id}")]
pub async fn get_response(engine: web::Data<Engine>, ids: web::Path<(Uuid, Uuid)>) -> Response {
    let (form_id, response_id) = ids.into_inner();
    let response = engine.get_response(form_id, response_id).await?;

    Ok(HttpResponse::Ok().json(response))
}
