use super::ApiClient;
use crate::{
    common::{
        meme::{CreateMemeParams, Meme},
        ListResponse,
    },
    errors::ApiResult,
};
use reqwest::multipart::{Form, Part};
use serde::Serialize;

#[derive(Serialize, Debug)]
struct PageParams {
    page: i32,
}

impl ApiClient {
    pub async fn get_memes(&self, page: i32) -> ApiResult<ListResponse<Meme>> {
        let res: ListResponse<Meme> = self.get("/memes", Some(PageParams { page })).await?;
        Ok(res.with_next_page(page))
    }

    pub async fn create_meme(&self, params: CreateMemeParams) -> ApiResult<Meme> {
        self.post_multipart("/memes", create_meme_form(params)?)
            .await
    }
}

/// Captions keep their order through the `Texts[i]` index. Coordinates are sent as
/// whole pixels.
fn create_meme_form(params: CreateMemeParams) -> ApiResult<Form> {
    let picture = Part::bytes(params.picture.data)
        .file_name(params.picture.file_name)
        .mime_str(&params.picture.mime_type)?;
    let mut form = Form::new()
        .part("Picture", picture)
        .text("Description", params.description);
    for (i, text) in params.texts.into_iter().enumerate() {
        form = form
            .text(format!("Texts[{i}][Content]"), text.content)
            .text(format!("Texts[{i}][X]"), (text.x.floor() as i64).to_string())
            .text(format!("Texts[{i}][Y]"), (text.y.floor() as i64).to_string());
    }
    Ok(form)
}
