use crate::api::types::Response;
use crate::app::Engine;
use crate::models::block::tree::FlowPayload;
use actix_web::{get, put, web, HttpResponse};
use charybdis::types::Uuid;

#[put("/{id}/flow")]
pub async fn update_flow(engine: web::Data<Engine>, id: web::Path<Uuid>, payload: web::Json<FlowPayload>) -> Response {
    let tree = payload.into_inner().into_tree(engine.config().max_flow_depth)?;
    let update = engine.reconcile_flow(id.into_inner(), &tree).await?;

    Ok(HttpResponse::Ok().json(update))
}

#[get("/{id}/flow")]
pub async fn get_flow(engine: web::Data<Engine>, id: web::Path<Uuid>) -> Response {
    let flow = engine.get_flow(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(flow))
}
