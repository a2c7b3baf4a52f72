use super::{
    newtypes::{CommentId, MemeId, UserId},
    user::User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment as returned by the server, before its author is resolved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub author_id: UserId,
    pub meme_id: MemeId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: User,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateCommentParams {
    pub content: String,
}
