use crate::api::AppState;
use crate::api::dto::conversation::{
    ConversationResponse, ConversationsResponse, CreateConversationRequest, FindConversationParams,
    SearchConversationsRequest,
};
use crate::api::dto::page_request;
use crate::api::middleware::{JsonBody, PathParam, QueryParams};
use crate::domain::conversation::NewConversation;
use crate::error::Result;
use crate::services::conversation_service::SearchQuery;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use uuid::Uuid;

/// Creates a conversation. PRIVATE requests for an existing member set return that conversation.
///
/// # Errors
/// Returns `AppError::InvalidArgument` if the member list is empty or contains a blank id.
pub async fn create_conversation(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateConversationRequest>,
) -> Result<impl IntoResponse> {
    let request = NewConversation::try_from(payload)?;
    let detail = state.conversation_service.create_conversation(request).await?;
    Ok((StatusCode::CREATED, Json(ConversationResponse::from(detail))))
}

/// Fetches a conversation together with one page of its newest messages.
///
/// # Errors
/// Returns `AppError::NotFound` if the conversation does not exist.
pub async fn find_conversation(
    State(state): State<AppState>,
    PathParam(conversation_id): PathParam<Uuid>,
    QueryParams(params): QueryParams<FindConversationParams>,
) -> Result<impl IntoResponse> {
    let page = page_request(
        params.message_page_number,
        params.message_page_size,
        state.config.pagination.default_message_page_size,
    );

    let detail = state.conversation_service.find_conversation(conversation_id, page).await?;
    Ok(Json(ConversationResponse::from(detail)))
}

/// Searches conversations that include any of the requested members.
///
/// # Errors
/// Returns `AppError::Database` if a query fails.
pub async fn search_conversations(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<SearchConversationsRequest>,
) -> Result<impl IntoResponse> {
    let limits = &state.config.pagination;
    let page = page_request(payload.page_number, payload.page_size, limits.default_page_size);
    let previews = page_request(None, payload.message_page_size, limits.default_message_page_size);

    let query = SearchQuery {
        conversation_type: payload.conversation_type,
        member_ids: payload.member_ids,
        term: payload.term,
        page,
        message_limit: previews.size(),
    };

    let details = state.conversation_service.search_conversations(query).await?;
    Ok(Json(ConversationsResponse { conversations: details.into_iter().map(Into::into).collect() }))
}
