use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::alarms::AlarmSet;
use crate::api::types::{
    Ack, BatchAck, CommandAck, Envelope, NewRobot, Robot, RobotSnapshot, ScheduleAck,
    ScheduleParams, Statistics,
};
use crate::api::{ApiError, Identifier, RobotBackend};
use crate::batch::{self, BatchError, SerialRange};
use crate::pagination::{self, PageControl, PaginationManager};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("{0}")]
    Invalid(String),

    #[error("robot listing response has no pagination block")]
    MissingPagination,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl DashboardError {
    /// `success: false` from the backend, as opposed to a transport failure.
    pub fn is_rejection(&self) -> bool {
        match self {
            DashboardError::Api(e) => e.is_rejection(),
            DashboardError::Batch(BatchError::Api(e)) => e.is_rejection(),
            _ => false,
        }
    }
}

/// The interactive side of the dashboard: confirmation prompts and the
/// loading indicator.
pub trait Operator {
    fn confirm(&self, prompt: &str) -> bool;
    fn show_loading(&self, message: &str);
    fn hide_loading(&self);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    Cancelled,
    Completed(T),
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            Outcome::Cancelled => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum ListView {
    Empty {
        statistics: Statistics,
    },
    Page {
        robots: Vec<Robot>,
        statistics: Statistics,
        #[serde(skip)]
        controls: Vec<PageControl>,
        footer: String,
        current_page: u32,
        total_pages: u32,
        total_count: u64,
    },
}

impl ListView {
    pub fn statistics(&self) -> &Statistics {
        match self {
            ListView::Empty { statistics } | ListView::Page { statistics, .. } => statistics,
        }
    }
}

/// Builds the command target from optional id and serial arguments.
pub fn resolve_target(
    robot_id: Option<&str>,
    serial: Option<u32>,
) -> Result<Identifier, DashboardError> {
    Identifier::from_parts(robot_id, serial)
        .ok_or_else(|| DashboardError::Invalid("enter a robot id or serial number".to_string()))
}

pub fn validate_schedule(params: &ScheduleParams) -> Result<(), DashboardError> {
    let invalid = |msg: &str| Err(DashboardError::Invalid(msg.to_string()));
    if params.schedule_id == 0 {
        return invalid("schedule id must be between 1 and 255");
    }
    if params.weekday > 6 {
        return invalid("weekday must be between 0 (Sunday) and 6 (Saturday)");
    }
    if params.hour > 23 {
        return invalid("hour must be between 0 and 23");
    }
    if params.minute > 59 {
        return invalid("minute must be between 0 and 59");
    }
    if params.run_count == 0 {
        return invalid("run count must be between 1 and 255");
    }
    Ok(())
}

/// Application state for one dashboard session. Owns the pagination
/// bookkeeping and the last list view; every operation goes through it.
pub struct Dashboard<B, O> {
    backend: B,
    operator: O,
    pagination: PaginationManager,
    view: Option<ListView>,
}

impl<B: RobotBackend, O: Operator> Dashboard<B, O> {
    pub fn new(backend: B, operator: O, page_size: u32) -> Self {
        Self {
            backend,
            operator,
            pagination: PaginationManager::new(page_size),
            view: None,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn operator(&self) -> &O {
        &self.operator
    }

    pub fn pagination(&self) -> &PaginationManager {
        &self.pagination
    }

    pub fn pagination_mut(&mut self) -> &mut PaginationManager {
        &mut self.pagination
    }

    /// Last successfully loaded list view.
    pub fn view(&self) -> Option<&ListView> {
        self.view.as_ref()
    }

    async fn with_loading<T, F>(&self, message: &str, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        self.operator.show_loading(message);
        let out = fut.await;
        self.operator.hide_loading();
        out
    }

    pub async fn load_robots(&mut self) -> Result<&ListView, DashboardError> {
        let page = self.pagination.current_page();
        let page_size = self.pagination.page_size();
        let result = self
            .with_loading("loading robots", self.backend.list_robots(page, page_size))
            .await?;

        let pagination = result.pagination.ok_or(DashboardError::MissingPagination)?;
        self.pagination.update_pagination(&pagination);
        let statistics = result.statistics.unwrap_or_default();
        debug!(page, total = pagination.total, "robot list loaded");

        let view = if pagination.total == 0 {
            ListView::Empty { statistics }
        } else {
            ListView::Page {
                robots: result.data,
                statistics,
                controls: self.pagination.controls(),
                footer: self.pagination.render_controls(),
                current_page: self.pagination.current_page(),
                total_pages: self.pagination.total_pages(),
                total_count: self.pagination.total_count(),
            }
        };
        Ok(self.view.insert(view))
    }

    pub async fn go_to_page(&mut self, page: u32) -> Result<&ListView, DashboardError> {
        if page == 0 {
            return Err(DashboardError::Invalid("page numbers start at 1".to_string()));
        }
        self.pagination.go_to_page(page);
        self.load_robots().await
    }

    pub async fn change_page_size(&mut self, page_size: u32) -> Result<&ListView, DashboardError> {
        if !pagination::is_valid_page_size(page_size) {
            return Err(DashboardError::Invalid(format!(
                "page size must be one of {:?}",
                pagination::PAGE_SIZES
            )));
        }
        self.pagination.change_page_size(page_size);
        self.load_robots().await
    }

    /// Refresh after a successful mutation. A failed refresh does not undo
    /// the mutation's result.
    async fn refresh(&mut self) {
        if let Err(e) = self.load_robots().await {
            warn!("list refresh failed: {e}");
        }
    }

    pub async fn toggle_status(
        &mut self,
        robot_id: &str,
        currently_enabled: bool,
    ) -> Result<Outcome<Ack>, DashboardError> {
        let action = if currently_enabled { "disable" } else { "enable" };
        if !self.operator.confirm(&format!("{action} robot {robot_id}?")) {
            return Ok(Outcome::Cancelled);
        }
        let ack = self
            .with_loading(
                "updating status",
                self.backend.set_robot_enabled(robot_id, !currently_enabled),
            )
            .await?
            .ensure_success()?;
        info!(robot_id, enabled = !currently_enabled, "robot status changed");
        self.refresh().await;
        Ok(Outcome::Completed(ack))
    }

    /// The name may be empty; only the serial number is required.
    pub async fn add_robot(&mut self, name: &str, serial: u32) -> Result<Ack, DashboardError> {
        let name = name.trim();
        if serial == 0 {
            return Err(DashboardError::Invalid(
                "serial number must be a positive integer".to_string(),
            ));
        }
        let robot = NewRobot {
            robot_name: name.to_string(),
            serial_number: serial,
        };
        let ack = self
            .with_loading("adding robot", self.backend.add_robot(&robot))
            .await?
            .ensure_success()?;
        info!(serial, "robot added");
        self.refresh().await;
        Ok(ack)
    }

    pub async fn delete_robot(&mut self, robot_id: &str) -> Result<Outcome<Ack>, DashboardError> {
        if !self.operator.confirm(&format!("delete robot {robot_id}?")) {
            return Ok(Outcome::Cancelled);
        }
        let ack = self
            .with_loading("deleting robot", self.backend.delete_robot(robot_id))
            .await?
            .ensure_success()?;
        info!(robot_id, "robot deleted");
        self.refresh().await;
        Ok(Outcome::Completed(ack))
    }

    pub async fn view_robot(&self, robot_id: &str) -> Result<RobotSnapshot, DashboardError> {
        let snapshot = self
            .with_loading("loading robot data", self.backend.fetch_robot_data(robot_id))
            .await?;
        Ok(snapshot)
    }

    pub async fn batch_add(
        &mut self,
        start: Option<u32>,
        end: Option<u32>,
        prefix: &str,
    ) -> Result<Outcome<BatchAck>, DashboardError> {
        let range = SerialRange::new(start, end)?;
        let prompt = format!(
            "add {} robots with serial numbers {}-{}?",
            range.count(),
            range.start(),
            range.end()
        );
        if !self.operator.confirm(&prompt) {
            return Ok(Outcome::Cancelled);
        }
        let robots = batch::build_batch_robots(range, prefix);
        let ack = self
            .with_loading("adding robots", self.backend.batch_add(&robots))
            .await?
            .ensure_success()?;
        info!(count = ack.count, "batch add finished");
        self.refresh().await;
        Ok(Outcome::Completed(ack))
    }

    /// Resolves the range across every listing page at the current page
    /// size, then deletes the matches in one request.
    pub async fn batch_delete(
        &mut self,
        start: Option<u32>,
        end: Option<u32>,
    ) -> Result<Outcome<BatchAck>, DashboardError> {
        let range = SerialRange::new(start, end)?;
        let prompt = format!(
            "delete every robot with serial numbers {}-{}?",
            range.start(),
            range.end()
        );
        if !self.operator.confirm(&prompt) {
            return Ok(Outcome::Cancelled);
        }

        let page_size = self.pagination.page_size();
        let result = self
            .with_loading("deleting robots", async {
                let ids = batch::resolve_serial_range(&self.backend, range, page_size).await?;
                let ack = self.backend.batch_delete(&ids).await?;
                Ok::<_, DashboardError>(ack)
            })
            .await;

        let ack = result?.ensure_success()?;
        info!(count = ack.count, "batch delete finished");
        self.refresh().await;
        Ok(Outcome::Completed(ack))
    }

    pub async fn schedule_start(
        &self,
        target: &Identifier,
        params: &ScheduleParams,
    ) -> Result<Outcome<ScheduleAck>, DashboardError> {
        validate_schedule(params)?;
        let prompt = format!(
            "schedule start for {target}: schedule {}, weekday {}, {:02}:{:02}, {} run(s)?",
            params.schedule_id, params.weekday, params.hour, params.minute, params.run_count
        );
        if !self.operator.confirm(&prompt) {
            return Ok(Outcome::Cancelled);
        }
        let ack = self
            .with_loading(
                "sending schedule",
                self.backend.schedule_start(target, params),
            )
            .await?
            .ensure_success()?;
        info!(%target, schedule_id = params.schedule_id, "schedule sent");
        Ok(Outcome::Completed(ack))
    }

    pub async fn start(&self, target: &Identifier) -> Result<Outcome<CommandAck>, DashboardError> {
        if !self.operator.confirm(&format!("start {target} now?")) {
            return Ok(Outcome::Cancelled);
        }
        let ack = self
            .with_loading("sending start command", self.backend.start(target))
            .await?
            .ensure_success()?;
        info!(%target, "start command sent");
        Ok(Outcome::Completed(ack))
    }

    pub async fn time_sync(
        &self,
        target: &Identifier,
    ) -> Result<Outcome<CommandAck>, DashboardError> {
        if !self.operator.confirm(&format!("sync the clock of {target}?")) {
            return Ok(Outcome::Cancelled);
        }
        let ack = self
            .with_loading("sending time sync", self.backend.time_sync(target))
            .await?
            .ensure_success()?;
        info!(%target, "time sync sent");
        Ok(Outcome::Completed(ack))
    }

    pub async fn load_alarms(&self, target: &Identifier) -> Result<AlarmSet, DashboardError> {
        let state = self
            .with_loading("loading alarms", self.backend.get_alarms(target))
            .await?
            .ensure_success()?;
        Ok(AlarmSet::from_values(&state.values))
    }

    /// Writes all four fields at once. An empty set clears every alarm and
    /// asks for that explicitly.
    pub async fn set_alarms(
        &self,
        target: &Identifier,
        alarms: &AlarmSet,
    ) -> Result<Outcome<CommandAck>, DashboardError> {
        let values = alarms.to_values().map_err(DashboardError::Invalid)?;
        let prompt = if alarms.is_clear() {
            format!("no alarm bits selected: clear all alarms on {target}?")
        } else {
            format!("update alarm settings on {target}?")
        };
        if !self.operator.confirm(&prompt) {
            return Ok(Outcome::Cancelled);
        }
        let ack = self
            .with_loading("saving alarms", self.backend.set_alarms(target, &values))
            .await?
            .ensure_success()?;
        info!(%target, cleared = alarms.is_clear(), "alarm settings saved");
        Ok(Outcome::Completed(ack))
    }
}
