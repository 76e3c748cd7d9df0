use thiserror::Error;
use tracing::{debug, info};

use crate::api::types::{BatchRobot, Robot};
use crate::api::{ApiError, RobotBackend};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("start and end serial numbers are required and must be positive")]
    MissingBound,

    #[error("start serial {start} is greater than end serial {end}")]
    InvertedRange { start: u32, end: u32 },

    #[error("no robots found with serial numbers {start}-{end}")]
    NoMatches { start: u32, end: u32 },

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Inclusive serial-number range, validated before any request is made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialRange {
    start: u32,
    end: u32,
}

impl SerialRange {
    pub fn new(start: Option<u32>, end: Option<u32>) -> Result<Self, BatchError> {
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) if start > 0 && end > 0 => (start, end),
            _ => return Err(BatchError::MissingBound),
        };
        if start > end {
            return Err(BatchError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn count(&self) -> u64 {
        u64::from(self.end - self.start) + 1
    }

    pub fn contains(&self, serial: u32) -> bool {
        serial >= self.start && serial <= self.end
    }
}

/// One enabled robot per serial, named `prefix` followed by the serial.
pub fn build_batch_robots(range: SerialRange, prefix: &str) -> Vec<BatchRobot> {
    (range.start..=range.end)
        .map(|serial| BatchRobot {
            robot_name: format!("{prefix}{serial}"),
            serial_number: serial,
            enabled: true,
        })
        .collect()
}

/// Walks every page of the listing, one request at a time, and returns the
/// ids of robots whose serial falls inside `range`.
///
/// Stops after the server-reported last page, or as soon as a page comes
/// back without a pagination block.
pub async fn resolve_serial_range<B: RobotBackend>(
    backend: &B,
    range: SerialRange,
    page_size: u32,
) -> Result<Vec<String>, BatchError> {
    let mut robots: Vec<Robot> = Vec::new();
    let mut page = 1u32;

    loop {
        let result = backend.list_robots(page, page_size).await?;
        debug!(page, rows = result.data.len(), "fetched listing page");
        robots.extend(result.data);

        match result.pagination {
            Some(pagination) if page < pagination.total_pages => page += 1,
            _ => break,
        }
    }

    let ids: Vec<String> = robots
        .into_iter()
        .filter(|robot| range.contains(robot.serial_number))
        .map(|robot| robot.robot_id)
        .collect();

    if ids.is_empty() {
        return Err(BatchError::NoMatches {
            start: range.start,
            end: range.end,
        });
    }

    info!(
        pages = page,
        matched = ids.len(),
        "resolved serial range {}-{}",
        range.start,
        range.end
    );
    Ok(ids)
}
