pub mod conversation_service;
pub mod health_service;
