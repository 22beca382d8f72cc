use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Editable user fields, as the backend names them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_usuario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_usuario: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub nome_usuario: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub tipo_usuario: String,
    #[serde(default)]
    pub data_cadastro: Option<String>,
}

/// Body for `POST /usuarios`; `dataCadastro` is the registration date.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub nome_usuario: String,
    pub email: String,
    pub tipo_usuario: String,
    pub data_cadastro: String,
}
