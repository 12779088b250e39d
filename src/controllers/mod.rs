//! Controllers: one per resource.
//!
//! # Data Flow
//! ```text
//! Router (resource segment matched)
//!     → Controller::handle(&Request)
//!     → (method, id segment) dispatch
//!     → Repository<E> call
//!     → Response | HandlerError
//! ```

pub mod resource;

use crate::error::HandlerError;
use crate::message::{Request, Response};
use crate::model::{Console, Developer, Game, Genre, Publisher};

pub use resource::ResourceController;

/// Turns a parsed request for one resource into a response or a typed failure.
pub trait Controller: Send + Sync {
    fn handle(&self, request: &Request) -> Result<Response, HandlerError>;
}

pub type DeveloperController = ResourceController<Developer>;
pub type PublisherController = ResourceController<Publisher>;
pub type GenreController = ResourceController<Genre>;
pub type ConsoleController = ResourceController<Console>;
pub type GameController = ResourceController<Game>;

/// Parse the optional `{id}` segment of `/{resource}/{id}`.
///
/// More than two segments, or an id that is not a non-negative integer,
/// is a bad request.
pub fn parse_resource_id(request: &Request) -> Result<Option<u64>, HandlerError> {
    let mut segments = request.segments().skip(1);
    let id = segments.next();
    if segments.next().is_some() {
        return Err(HandlerError::bad_request(format!(
            "unexpected path {:?}, expected /{{resource}} or /{{resource}}/{{id}}",
            request.path()
        )));
    }

    id.map(|raw| {
        raw.parse::<u64>()
            .map_err(|_| HandlerError::bad_request(format!("invalid id {raw:?}")))
    })
    .transpose()
}
