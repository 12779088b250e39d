//! Generic CRUD controller.
//!
//! | Method | id  | Action  | Success |
//! |--------|-----|---------|---------|
//! | GET    | no  | list    | 200     |
//! | GET    | yes | fetch   | 200     |
//! | POST   | no  | create  | 201     |
//! | PUT    | yes | update  | 200     |
//! | DELETE | yes | delete  | 204     |
//!
//! Anything else is 405. Each action is a single repository call, so an
//! update racing a delete of the same id either lands first or finds nothing.

use std::sync::Arc;

use http::{Method, StatusCode};
use serde::Serialize;

use crate::controllers::{parse_resource_id, Controller};
use crate::error::HandlerError;
use crate::message::codec::is_json;
use crate::message::{Request, Response};
use crate::model::Entity;
use crate::repository::Repository;

pub struct ResourceController<E: Entity> {
    repository: Arc<dyn Repository<E>>,
}

impl<E: Entity> ResourceController<E> {
    pub fn new(repository: Arc<dyn Repository<E>>) -> Self {
        Self { repository }
    }

    fn list(&self) -> Result<Response, HandlerError> {
        let records = self.repository.find_all()?;
        json_response(StatusCode::OK, &records)
    }

    fn fetch(&self, id: u64) -> Result<Response, HandlerError> {
        let record = self
            .repository
            .find_by_id(id)?
            .ok_or(HandlerError::NotFound {
                resource: E::KIND,
                id,
            })?;
        json_response(StatusCode::OK, &record)
    }

    fn create(&self, request: &Request) -> Result<Response, HandlerError> {
        let record = decode::<E>(request)?;
        if record.id().is_some() {
            return Err(HandlerError::bad_request(format!(
                "{} id is assigned by the server and must not be supplied",
                E::KIND
            )));
        }
        let saved = self.repository.save(record)?;
        tracing::debug!(resource = E::RESOURCE, id = ?saved.id(), "Record created");
        json_response(StatusCode::CREATED, &saved)
    }

    fn update(&self, id: u64, request: &Request) -> Result<Response, HandlerError> {
        let record = decode::<E>(request)?;
        if let Some(body_id) = record.id() {
            if body_id != id {
                return Err(HandlerError::bad_request(format!(
                    "body id {body_id} does not match path id {id}"
                )));
            }
        }
        let saved = self
            .repository
            .replace(id, record)?
            .ok_or(HandlerError::NotFound {
                resource: E::KIND,
                id,
            })?;
        json_response(StatusCode::OK, &saved)
    }

    fn delete(&self, id: u64) -> Result<Response, HandlerError> {
        if !self.repository.delete_by_id(id)? {
            return Err(HandlerError::NotFound {
                resource: E::KIND,
                id,
            });
        }
        tracing::debug!(resource = E::RESOURCE, id, "Record deleted");
        Ok(Response::empty(StatusCode::NO_CONTENT))
    }
}

impl<E: Entity> Controller for ResourceController<E> {
    fn handle(&self, request: &Request) -> Result<Response, HandlerError> {
        let id = parse_resource_id(request)?;
        let method = request.method();

        match id {
            None if *method == Method::GET => self.list(),
            Some(id) if *method == Method::GET => self.fetch(id),
            None if *method == Method::POST => self.create(request),
            Some(id) if *method == Method::PUT => self.update(id, request),
            Some(id) if *method == Method::DELETE => self.delete(id),
            _ => Err(HandlerError::MethodNotAllowed {
                method: method.clone(),
                path: request.path().to_string(),
            }),
        }
    }
}

fn decode<E: Entity>(request: &Request) -> Result<E, HandlerError> {
    if !is_json(request) {
        return Err(HandlerError::bad_request("expected an application/json body"));
    }
    if !request.has_body() {
        return Err(HandlerError::bad_request(format!(
            "a {} body is required",
            E::KIND
        )));
    }
    serde_json::from_slice(request.body())
        .map_err(|e| HandlerError::bad_request(format!("invalid {} body: {e}", E::KIND)))
}

fn json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> Result<Response, HandlerError> {
    let body = serde_json::to_vec(value).map_err(HandlerError::Serialization)?;
    Ok(Response::json(status, body))
}
