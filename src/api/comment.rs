use super::ApiClient;
use crate::{
    common::{
        comment::{Comment, CreateCommentParams},
        newtypes::MemeId,
        ListResponse,
    },
    errors::ApiResult,
};
use serde::Serialize;

#[derive(Serialize, Debug)]
struct PageParams {
    page: i32,
}

impl ApiClient {
    pub async fn get_meme_comments(
        &self,
        meme_id: &MemeId,
        page: i32,
    ) -> ApiResult<ListResponse<Comment>> {
        let res: ListResponse<Comment> = self
            .get(&format!("/memes/{meme_id}/comments"), Some(PageParams { page }))
            .await?;
        Ok(res.with_next_page(page))
    }

    pub async fn create_meme_comment(&self, meme_id: &MemeId, content: &str) -> ApiResult<Comment> {
        let params = CreateCommentParams {
            content: content.to_string(),
        };
        self.post(&format!("/memes/{meme_id}/comments"), &params)
            .await
    }
}
