//! Event trigger endpoints.
//!
//! All operations live under `groups/{groupId}/apps/{appId}/triggers`.
//! Group, app and trigger identifiers are checked before any request is
//! built.

use crate::apps::apps_path;
use crate::client::{Client, Response};
use crate::context::Context;
use crate::error::{require, ApiError};
use crate::http::HttpMethod;
use crate::types::{EventTrigger, EventTriggerRequest};

fn triggers_path(group_id: &str, app_id: &str) -> Result<String, ApiError> {
    require("groupId", group_id)?;
    require("appID", app_id)?;
    Ok(format!("{}/{app_id}/triggers", apps_path(group_id)))
}

fn trigger_path(group_id: &str, app_id: &str, trigger_id: &str) -> Result<String, ApiError> {
    let base = triggers_path(group_id, app_id)?;
    require("triggerID", trigger_id)?;
    Ok(format!("{base}/{trigger_id}"))
}

/// Operations on an app's event triggers. Obtained from
/// [`Client::event_triggers`].
#[derive(Debug, Clone, Copy)]
pub struct EventTriggersService<'a> {
    client: &'a Client,
}

impl<'a> EventTriggersService<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub fn list(
        &self,
        ctx: &Context,
        group_id: &str,
        app_id: &str,
    ) -> Result<(Vec<EventTrigger>, Response), ApiError> {
        let path = triggers_path(group_id, app_id)?;
        let request = self.client.new_request(HttpMethod::Get, &path)?;
        let (triggers, response) = self.client.execute_json(ctx, request)?;
        Ok((triggers.unwrap_or_default(), response))
    }

    pub fn get(
        &self,
        ctx: &Context,
        group_id: &str,
        app_id: &str,
        trigger_id: &str,
    ) -> Result<(EventTrigger, Response), ApiError> {
        let path = trigger_path(group_id, app_id, trigger_id)?;
        let request = self.client.new_request(HttpMethod::Get, &path)?;
        let (trigger, response) = self.client.execute_json(ctx, request)?;
        Ok((trigger.unwrap_or_default(), response))
    }

    pub fn create(
        &self,
        ctx: &Context,
        group_id: &str,
        app_id: &str,
        trigger: &EventTriggerRequest,
    ) -> Result<(EventTrigger, Response), ApiError> {
        let path = triggers_path(group_id, app_id)?;
        let request = self
            .client
            .new_request_with_body(HttpMethod::Post, &path, trigger)?;
        let (created, response) = self.client.execute_json(ctx, request)?;
        Ok((created.unwrap_or_default(), response))
    }

    /// Replaces a trigger's definition.
    pub fn update(
        &self,
        ctx: &Context,
        group_id: &str,
        app_id: &str,
        trigger_id: &str,
        trigger: &EventTriggerRequest,
    ) -> Result<(EventTrigger, Response), ApiError> {
        let path = trigger_path(group_id, app_id, trigger_id)?;
        let request = self
            .client
            .new_request_with_body(HttpMethod::Put, &path, trigger)?;
        let (updated, response) = self.client.execute_json(ctx, request)?;
        Ok((updated.unwrap_or_default(), response))
    }

    pub fn delete(
        &self,
        ctx: &Context,
        group_id: &str,
        app_id: &str,
        trigger_id: &str,
    ) -> Result<Response, ApiError> {
        let path = trigger_path(group_id, app_id, trigger_id)?;
        let request = self.client.new_request(HttpMethod::Delete, &path)?;
        self.client.execute(ctx, request)
    }
}
