mod handlers;
mod routes;
mod state;

pub use handlers::client_id;
pub use routes::create_router;
pub use state::AppState;
