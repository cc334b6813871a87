pub mod invite_handlers;
pub mod register_handlers;
