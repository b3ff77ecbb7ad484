use crate::api::types::Response;
use crate::app::Engine;
use crate::errors::FormflowError;
use actix_web::{delete, get, patch, post, web, HttpResponse};
use charybdis::types::Uuid;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFormParams {
    pub title: String,

    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PublishParams {
    #[serde(default)]
    pub custom_slug: Option<String>,
}

impl PublishParams {
    /// An empty body publishes without a custom slug; anything else must be a valid params object.
    pub fn from_body(body: &[u8]) -> Result<Self, FormflowError> {
        if body.trim_ascii().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_slice(body).map_err(|e| FormflowError::ValidationError(("body".to_string(), e.to_string())))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptingParams {
    #[serde(alias = "acceptingResponses")]
    pub accepting: bool,
}

#[post("")]
pub async fn create_form(engine: web::Data<Engine>, params: web::Json<CreateFormParams>) -> Response {
    let form = engine.create_form(&params.title, &params.description).await?;

    Ok(HttpResponse::Created().json(form))
}

#[get("/{id}")]
pub async fn get_form(engine: web::Data<Engine>, id: web::Path<Uuid>) -> Response {
    let form = engine.get_form(id.into_inner()).await?;

    Ok(HttpResponse::Ok().json(form))
}

#[delete("/{id}")]
pub async fn delete_form(engine: web::Data<Engine>, id: web::Path<Uuid>) -> Response {
    engine.delete_form(id.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

#[patch("/{id}/publish")]
pub async fn publish_form(
    engine: web::Data<Engine>,
    id: web::Path<Uuid>,
    body: web::Bytes,
) -> Response {
    let params = PublishParams::from_body(&body)?;
    let slugs = engine.publish(id.into_inner(), params.custom_slug.as_deref()).await?;

    Ok(HttpResponse::Ok().json(slugs))
}

#[patch("/{id}/accepting_responses")]
pub async fn set_accepting_responses(
    engine: web::Data<Engine>,
    id: web::Path<Uuid>,
    params: web::Json<AcceptingParams>,
) -> Response {
    let id = id.into_inner();
    engine.set_accepting(id, params.accepting).await?;

    Ok(HttpResponse::Ok().json(json!({
        "id": id,
        "acceptingResponses": params.accepting,
    })))
}
