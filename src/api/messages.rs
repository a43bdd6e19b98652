use crate::api::AppState;
use crate::api::dto::message::{CreateMessageRequest, ListMessagesParams, MessageResponse, MessagesResponse};
use crate::api::dto::page_request;
use crate::api::middleware::{JsonBody, PathParam, QueryParams};
use crate::domain::message::TimeWindow;
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

/// Appends a message to a conversation.
///
/// # Errors
/// Returns `AppError::NotFound` if the conversation does not exist.
pub async fn create_message(
    State(state): State<AppState>,
    PathParam(conversation_id): PathParam<Uuid>,
    JsonBody(payload): JsonBody<CreateMessageRequest>,
) -> Result<impl IntoResponse> {
    let message = state
        .conversation_service
        .create_message(conversation_id, payload.from_user_id, payload.message_content)
        .await?;

    Ok((StatusCode::CREATED, Json(MessageResponse::from(message))))
}

/// Lists a page of a conversation's messages, newest first.
///
/// `before` and `after` are exclusive RFC 3339 bounds on `createdAt`.
///
/// # Errors
/// Returns `AppError::NotFound` if the conversation does not exist.
/// Returns `AppError::InvalidArgument` if a bound is not a valid timestamp.
pub async fn list_messages(
    State(state): State<AppState>,
    PathParam(conversation_id): PathParam<Uuid>,
    QueryParams(params): QueryParams<ListMessagesParams>,
) -> Result<impl IntoResponse> {
    let page = page_request(params.page_number, params.page_size, state.config.pagination.default_message_page_size);
    let window = TimeWindow { before: params.before, after: params.after };

    let messages = state.conversation_service.list_messages(conversation_id, window, page).await?;
    Ok(Json(MessagesResponse { messages: messages.into_iter().map(Into::into).collect() }))
}
