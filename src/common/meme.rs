use super::{
    comment::CommentView,
    newtypes::{MemeId, UserId},
    user::User,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A caption drawn on top of the meme picture. Order of captions is the stacking order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MemeText {
    pub content: String,
    pub x: f64,
    pub y: f64,
}

/// Meme as returned by the server, before its author is resolved.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meme {
    pub id: MemeId,
    pub author_id: UserId,
    pub picture_url: String,
    pub description: String,
    pub comments_count: String,
    pub texts: Vec<MemeText>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MemeView {
    #[serde(flatten)]
    pub meme: Meme,
    pub author: User,
    /// Comments are loaded lazily through a separate feed, this stays empty.
    pub comments: Vec<CommentView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemePicture {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CreateMemeParams {
    pub picture: MemePicture,
    pub description: String,
    pub texts: Vec<MemeText>,
}
