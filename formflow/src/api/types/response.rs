use crate::errors::FormflowError;
use actix_web::HttpResponse;

pub type Response = Result<HttpResponse, FormflowError>;
