use super::ApiClient;
use crate::{
    common::{
        newtypes::UserId,
        user::{LoginResponse, LoginUserParams, User},
        LOGIN_PATH,
    },
    errors::ApiResult,
};

impl ApiClient {
    /// Exchanges credentials for a bearer token. The token is not stored, see
    /// [crate::session::Authentication::authenticate].
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<LoginResponse> {
        let params = LoginUserParams {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.post(LOGIN_PATH, &params).await
    }

    pub async fn get_user_by_id(&self, id: &UserId) -> ApiResult<User> {
        self.get(&format!("/users/{id}"), None::<()>).await
    }
}
