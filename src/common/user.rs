use super::newtypes::UserId;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug)]
pub struct LoginUserParams {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct LoginResponse {
    pub jwt: String,
}

/// Public profile of a user, as returned by `/users/{id}`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub picture_url: String,
}
