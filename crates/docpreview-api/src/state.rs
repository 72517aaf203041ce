use crate::job_queue::JobQueue;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub job_queue: Arc<JobQueue>,
}
