//! Applications endpoint.

use crate::client::{Client, Response};
use crate::context::Context;
use crate::error::{require, ApiError};
use crate::http::HttpMethod;
use crate::query::set_query_params;
use crate::types::{Application, ApplicationListOptions};

pub(crate) fn apps_path(group_id: &str) -> String {
    format!("groups/{group_id}/apps")
}

/// Operations on `groups/{groupId}/apps`. Obtained from [`Client::apps`].
#[derive(Debug, Clone, Copy)]
pub struct AppsService<'a> {
    client: &'a Client,
}

impl<'a> AppsService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Lists the applications of a group. Returns one page as sent by the
    /// server.
    pub fn list(
        &self,
        ctx: &Context,
        group_id: &str,
        options: Option<&ApplicationListOptions>,
    ) -> Result<(Vec<Application>, Response), ApiError> {
        require("groupId", group_id)?;

        let path = set_query_params(&apps_path(group_id), options);
        let request = self.client.new_request(HttpMethod::Get, &path)?;
        let (apps, response) = self.client.execute_json(ctx, request)?;
        Ok((apps.unwrap_or_default(), response))
    }
}
