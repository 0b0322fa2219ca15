//! Task Engine HTTP surface. The Metadata Store has no `list_tasks`, so
//! listing walks the IDs this API instance has seen returned from a
//! background operation (see [`ApiState::known_tasks`]).

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use drivemesh_core::domain::{CoreError, Task, TaskId, TaskStatus, TaskType};

use crate::error::ApiResult;
use crate::state::ApiState;

#[derive(Serialize)]
pub struct TaskView {
    pub id: String,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub progress: u8,
    pub result: Option<String>,
    pub error: Option<String>,
}

impl From<Task> for TaskView {
    fn from(t: Task) -> Self {
        Self {
            id: t.id().to_string(),
            task_type: t.task_type(),
            status: t.status().clone(),
            progress: t.progress(),
            result: t.result().map(str::to_string),
            error: t.error().map(str::to_string),
        }
    }
}

pub async fn list_tasks(State(state): State<ApiState>) -> ApiResult<Json<Vec<TaskView>>> {
    let mut tasks = Vec::with_capacity(state.known_tasks.len());
    for entry in state.known_tasks.iter() {
        if let Some(task) = state.store.get_task(entry.key()).await? {
            tasks.push(TaskView::from(task));
        }
    }
    Ok(Json(tasks))
}

pub async fn get_task(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskView>> {
    let id = TaskId::from_str(&id).map_err(CoreError::from)?;
    let task = state
        .store
        .get_task(&id)
        .await?
        .ok_or_else(|| CoreError::PathNotFound(id.to_string()))?;
    Ok(Json(task.into()))
}
